// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Query model, batch statement AST, translation and parameter based
//! rewriting for set-based DML.

pub mod ast;
pub mod error;
pub mod query;
pub mod reconcile;
pub mod rewrite;
pub mod shape;
pub mod statement;
pub mod translate;

pub use ast::{Ast, Join, Node, NodeId, RowCount};
pub use error::{BindError, TranslateError};
pub use query::{BinaryOp, Expr, Query, QueryJoin, RowSource, Scope, UnaryOp};
pub use reconcile::{
	Action, ActionKind, CorrelatedPair, InsertShaper, PairState, ReconcilePolicy, Reconciler, UpdateExtractor,
};
pub use rewrite::expand;
pub use shape::{Assignment, InsertShape, MergeShape, Operation, Shape, UpdateShape};
pub use statement::{
	ConflictTarget, DeleteNode, ExpandedTable, MergeNode, Plan, SelectIntoNode, Statement, UpdateNode, UpsertNode,
	UpsertSource,
};
pub use translate::{SOURCE_ALIAS, SOURCE_ROOT_ALIAS, TARGET_ALIAS, translate};
