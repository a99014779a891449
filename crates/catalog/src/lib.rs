// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

#![cfg_attr(not(debug_assertions), deny(warnings))]

mod catalog;
pub mod converter;
pub mod error;
pub mod mapping;

pub use catalog::{Catalog, MetadataProvider};
pub use converter::ValueConverter;
pub use error::CatalogError;
pub use mapping::{EntityMapping, EntityMappingBuilder};
pub use setdml_core::Result;
