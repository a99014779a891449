// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

#![cfg_attr(not(debug_assertions), deny(warnings))]

pub mod cancel;
pub mod error;
pub mod params;
pub mod row;
pub mod value;

pub use cancel::CancellationToken;
pub use error::{Error, ErrorKind, diagnostic::Diagnostic, diagnostic::IntoDiagnostic};
pub use params::{Param, Params};
pub use row::Row;
pub use value::{OrderedF64, Value, ValueKind};

pub type Result<T> = std::result::Result<T, Error>;
