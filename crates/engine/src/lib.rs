// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Batch set-based DML: compiles operations to SQL for a [`Connection`], or
//! reconciles them directly against a [`Store`].

#![cfg_attr(not(debug_assertions), deny(warnings))]

pub mod backend;
pub mod batch;
pub mod compiler;
pub mod config;
pub mod engine;
pub mod error;
mod in_process;
pub mod memory;

pub use backend::{Backend, ChangeSet, Connection, Store};
pub use batch::BatchQuery;
pub use compiler::{CompiledPlan, PlanCompiler};
pub use config::{DEFAULT_PLAN_CACHE_CAPACITY, EngineConfig};
pub use engine::{Engine, EngineBuilder, EngineConfigurator};
pub use error::EngineError;
pub use memory::MemoryStore;
pub use setdml_core::Result;
