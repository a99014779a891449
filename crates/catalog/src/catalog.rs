// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use dashmap::DashMap;
use setdml_core::Result;
use tracing::{instrument, warn};

use crate::{error::CatalogError, mapping::EntityMapping};

/// Read-only lookup of entity storage mappings. Implementations must be
/// idempotent: the same entity always resolves to the same mapping.
pub trait MetadataProvider: Send + Sync {
	fn mapping(&self, entity: &str) -> Result<Arc<EntityMapping>>;
}

impl<T: MetadataProvider + ?Sized> MetadataProvider for Arc<T> {
	fn mapping(&self, entity: &str) -> Result<Arc<EntityMapping>> {
		(**self).mapping(entity)
	}
}

/// In-memory [`MetadataProvider`] over registered mappings.
#[derive(Default)]
pub struct Catalog {
	mappings: DashMap<String, Arc<EntityMapping>>,
}

impl Catalog {
	pub fn new() -> Self {
		Self {
			mappings: DashMap::new(),
		}
	}

	pub fn with(self, mapping: EntityMapping) -> Self {
		self.register(mapping);
		self
	}

	/// Registers a mapping. The first registration of an entity wins.
	pub fn register(&self, mapping: EntityMapping) -> Arc<EntityMapping> {
		let entity = mapping.entity().to_string();
		if let Some(existing) = self.mappings.get(&entity) {
			warn!("Mapping for entity {} already registered, keeping the existing one", entity);
			return existing.value().clone();
		}
		self.mappings.entry(entity).or_insert_with(|| Arc::new(mapping)).value().clone()
	}

	pub fn len(&self) -> usize {
		self.mappings.len()
	}

	pub fn is_empty(&self) -> bool {
		self.mappings.is_empty()
	}
}

impl MetadataProvider for Catalog {
	#[instrument(name = "catalog::mapping::get", level = "trace", skip(self))]
	fn mapping(&self, entity: &str) -> Result<Arc<EntityMapping>> {
		match self.mappings.get(entity) {
			Some(mapping) => Ok(mapping.value().clone()),
			None => Err(CatalogError::EntityNotFound {
				entity: entity.to_string(),
			}
			.into()),
		}
	}
}
