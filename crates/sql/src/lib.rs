// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! SQL text for batch DML plans, parameterized by dialect.

pub mod compiled;
pub mod dialect;
mod emit;

pub use compiled::{BoundStatement, CompiledSql, ParameterRef, SqlStatement};
pub use dialect::{ConflictStyle, DeleteJoin, Dialect, DialectKind, PostgreSql, SqlServer, Sqlite, UpdateJoin};
pub use emit::emit;
