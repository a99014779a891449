// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{ops::Deref, sync::Arc};

use setdml_catalog::MetadataProvider;
use setdml_core::{CancellationToken, ErrorKind, Params, Result};
use setdml_plan::{Operation, Query};
use tracing::instrument;

use crate::{
	backend::{Backend, Connection, Store},
	batch::BatchQuery,
	compiler::{CompiledPlan, PlanCompiler},
	config::EngineConfig,
	error::EngineError,
	in_process,
};

/// Configuration function applied to an [`EngineBuilder`] before it builds.
pub type EngineConfigurator = Box<dyn FnOnce(EngineBuilder) -> EngineBuilder + Send>;

pub struct Engine(Arc<EngineInner>);

pub struct EngineInner {
	config: EngineConfig,
	compiler: PlanCompiler,
	backend: Backend,
	shutdown: CancellationToken,
}

impl Clone for Engine {
	fn clone(&self) -> Self {
		Self(self.0.clone())
	}
}

impl Deref for Engine {
	type Target = EngineInner;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

impl Engine {
	pub fn builder() -> EngineBuilder {
		EngineBuilder::new()
	}

	pub fn config(&self) -> &EngineConfig {
		&self.config
	}

	pub fn compiler(&self) -> &PlanCompiler {
		&self.compiler
	}

	pub fn backend(&self) -> &Backend {
		&self.backend
	}

	/// Starts a batch operation over the rows of `query`.
	pub fn batch(&self, query: Query) -> BatchQuery<'_> {
		BatchQuery::new(self, query)
	}

	/// Cancels every in-flight asynchronous operation and rejects new ones.
	pub fn shutdown(&self) {
		tracing::debug!("engine shutdown requested");
		self.shutdown.cancel();
	}

	pub fn is_shutdown(&self) -> bool {
		self.shutdown.is_cancelled()
	}

	/// Compiles `operation` to SQL bound to `params` without executing it.
	pub fn compile(&self, query: &Query, operation: &Operation, params: &Params) -> Result<CompiledPlan> {
		self.compiler.compile(query, operation, params)
	}

	#[instrument(name = "engine::execute", level = "debug", skip_all, fields(operation = operation.name(), backend = self.backend.name()))]
	pub fn execute(&self, query: &Query, operation: &Operation, params: &Params) -> Result<u64> {
		self.shutdown.check()?;
		let result = match &self.backend {
			Backend::Sql(connection) => {
				let compiled = self.compiler.compile(query, operation, params)?;
				self.log(&compiled);
				connection.execute_all(&compiled.statements)
			}
			Backend::InProcess(store) => {
				let plan = self.compiler.plan(query, operation)?;
				in_process::run(
					store.as_ref(),
					self.compiler.metadata(),
					&plan,
					query,
					operation,
					params,
					&self.shutdown,
				)
			}
		};
		report(result)
	}

	#[instrument(name = "engine::execute_async", level = "debug", skip_all, fields(operation = operation.name(), backend = self.backend.name()))]
	pub async fn execute_async(
		&self,
		query: &Query,
		operation: &Operation,
		params: &Params,
		cancel: &CancellationToken,
	) -> Result<u64> {
		let cancel = cancel.linked(&self.shutdown);
		cancel.check()?;
		let result = match &self.backend {
			Backend::Sql(connection) => {
				let compiled = self.compiler.compile(query, operation, params)?;
				self.log(&compiled);
				connection.execute_all_async(&compiled.statements, &cancel).await
			}
			Backend::InProcess(store) => {
				let plan = self.compiler.plan(query, operation)?;
				in_process::run_async(
					store.as_ref(),
					self.compiler.metadata(),
					&plan,
					query,
					operation,
					params,
					&cancel,
				)
				.await
			}
		};
		report(result)
	}

	fn log(&self, compiled: &CompiledPlan) {
		if !self.config.log_sql {
			return;
		}
		for statement in &compiled.statements {
			tracing::debug!(
				sql = %statement.sql,
				parameters = statement.params.len(),
				cacheable = compiled.cacheable,
				"executing statement"
			);
		}
	}
}

fn report(result: Result<u64>) -> Result<u64> {
	match &result {
		Ok(affected) => tracing::debug!(affected, "batch applied"),
		Err(err) if err.kind() == ErrorKind::Cancelled => tracing::debug!("batch cancelled"),
		Err(_) => {}
	}
	result
}

pub struct EngineBuilder {
	config: EngineConfig,
	metadata: Option<Arc<dyn MetadataProvider>>,
	backend: Option<Backend>,
	configurators: Vec<EngineConfigurator>,
}

impl Default for EngineBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl EngineBuilder {
	pub fn new() -> Self {
		Self {
			config: EngineConfig::default(),
			metadata: None,
			backend: None,
			configurators: Vec::new(),
		}
	}

	pub fn with_config(mut self, config: EngineConfig) -> Self {
		self.config = config;
		self
	}

	pub fn dialect(mut self, dialect: setdml_sql::DialectKind) -> Self {
		self.config = self.config.dialect(dialect);
		self
	}

	pub fn plan_cache_capacity(mut self, capacity: usize) -> Self {
		self.config = self.config.plan_cache_capacity(capacity);
		self
	}

	pub fn log_sql(mut self, enabled: bool) -> Self {
		self.config = self.config.log_sql(enabled);
		self
	}

	pub fn metadata(mut self, metadata: impl MetadataProvider + 'static) -> Self {
		self.metadata = Some(Arc::new(metadata));
		self
	}

	pub fn shared_metadata(mut self, metadata: Arc<dyn MetadataProvider>) -> Self {
		self.metadata = Some(metadata);
		self
	}

	pub fn connection(mut self, connection: impl Connection + 'static) -> Self {
		self.backend = Some(Backend::sql(connection));
		self
	}

	pub fn store(mut self, store: impl Store + 'static) -> Self {
		self.backend = Some(Backend::in_process(store));
		self
	}

	pub fn backend(mut self, backend: Backend) -> Self {
		self.backend = Some(backend);
		self
	}

	/// Defers `configurator` until [`build`](Self::build); configurators run
	/// in registration order.
	pub fn with_configurator<F>(mut self, configurator: F) -> Self
	where
		F: FnOnce(EngineBuilder) -> EngineBuilder + Send + 'static,
	{
		self.configurators.push(Box::new(configurator));
		self
	}

	pub fn build(mut self) -> Result<Engine> {
		let configurators = std::mem::take(&mut self.configurators);
		let mut builder = self;
		for configurator in configurators {
			builder = configurator(builder);
		}
		if !builder.configurators.is_empty() {
			return builder.build();
		}

		let Some(metadata) = builder.metadata else {
			return Err(EngineError::MissingComponent {
				component: "metadata provider",
			}
			.into());
		};
		let Some(backend) = builder.backend else {
			return Err(EngineError::MissingComponent {
				component: "connection or store",
			}
			.into());
		};

		let config = builder.config;
		tracing::debug!(dialect = ?config.dialect, backend = backend.name(), "building engine");
		let compiler = PlanCompiler::new(metadata, config.dialect.dialect(), config.plan_cache_capacity);
		Ok(Engine(Arc::new(EngineInner {
			config,
			compiler,
			backend,
			shutdown: CancellationToken::new(),
		})))
	}
}

#[cfg(test)]
mod tests {
	use setdml_catalog::{Catalog, EntityMapping};
	use setdml_sql::DialectKind;

	use super::*;
	use crate::memory::MemoryStore;

	fn catalog() -> Catalog {
		Catalog::new().with(EntityMapping::builder("Item").column("Id").column("Val").key(&["Id"]).build().unwrap())
	}

	#[test]
	fn test_build_requires_metadata() {
		let err = Engine::builder().store(MemoryStore::new()).build().err().unwrap();
		assert_eq!(err.code, "CONFIG_002");
	}

	#[test]
	fn test_build_requires_backend() {
		let err = Engine::builder().metadata(catalog()).build().err().unwrap();
		assert_eq!(err.code, "CONFIG_002");
	}

	#[test]
	fn test_configurators_run_in_order() {
		let engine = Engine::builder()
			.metadata(catalog())
			.store(MemoryStore::new())
			.with_configurator(|b| b.dialect(DialectKind::Sqlite))
			.with_configurator(|b| b.dialect(DialectKind::SqlServer).plan_cache_capacity(4))
			.build()
			.unwrap();
		assert_eq!(engine.config().dialect, DialectKind::SqlServer);
		assert_eq!(engine.config().plan_cache_capacity, 4);
	}

	#[test]
	fn test_shutdown_rejects_new_operations() {
		let store = MemoryStore::new();
		store.create_table("Item");
		let engine = Engine::builder().metadata(catalog()).store(store).build().unwrap();
		engine.shutdown();
		assert!(engine.is_shutdown());

		let err = engine.execute(&Query::from_entity("Item"), &Operation::Delete, &Params::new()).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::Cancelled);
	}
}
