// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Lowers a declarative [`Query`] plus an [`Operation`] into a [`Plan`].

use std::sync::Arc;

use setdml_catalog::{EntityMapping, MetadataProvider, ValueConverter};
use setdml_core::Result;
use tracing::instrument;

use crate::{
	ast::{Ast, Join, Node, NodeId, RowCount},
	error::TranslateError,
	query::{Expr, Query, RowSource, Scope},
	shape::{InsertShape, MergeShape, Operation},
	statement::{Plan, Statement},
};

mod delete;
mod insert;
mod merge;
mod update;
mod upsert;

/// Alias of the table a statement modifies.
pub const TARGET_ALIAS: &str = "t";
/// Alias of the shaped source rows of an upsert or merge.
pub const SOURCE_ALIAS: &str = "s";
/// Alias of the root of a source query.
pub const SOURCE_ROOT_ALIAS: &str = "src";

#[instrument(name = "plan::translate", level = "trace", skip_all, fields(operation = operation.name()))]
pub fn translate(query: &Query, operation: &Operation, metadata: &dyn MetadataProvider) -> Result<Plan> {
	let mut translator = Translator::new(metadata);
	let statement = match operation {
		Operation::Delete => translator.delete(query)?,
		Operation::Update(shape) => translator.update(query, shape)?,
		Operation::InsertInto {
			target,
		} => translator.insert_into(query, target)?,
		Operation::Upsert {
			target,
			insert,
			update,
		} => translator.upsert(query, target, insert, update.as_ref())?,
		Operation::Merge {
			source,
			insert,
			update,
			delete_unmatched,
		} => translator.merge(query, source, insert, update, *delete_unmatched)?,
	};
	Ok(translator.finish(statement))
}

/// A row source placed in the arena.
#[derive(Clone)]
pub(crate) enum Binding {
	Entity {
		node: NodeId,
		mapping: Arc<EntityMapping>,
	},
	Local {
		node: NodeId,
		parameter: String,
		columns: Vec<String>,
	},
}

impl Binding {
	pub(crate) fn node(&self) -> NodeId {
		match self {
			Binding::Entity {
				node,
				..
			}
			| Binding::Local {
				node,
				..
			} => *node,
		}
	}
}

/// What a read of [`Scope::Inserted`] lowers to.
pub(crate) enum InsertedBinding {
	/// `excluded.<column>` inside an ON CONFLICT clause.
	Excluded {
		mapping: Arc<EntityMapping>,
		columns: Vec<String>,
	},
	/// A column of the shaped merge source.
	Source {
		node: NodeId,
		mapping: Arc<EntityMapping>,
		columns: Vec<String>,
	},
}

pub(crate) struct Scopes {
	operation: &'static str,
	row: Option<Binding>,
	joined: Vec<(String, Binding)>,
	existing: Option<Binding>,
	inserted: Option<InsertedBinding>,
}

impl Scopes {
	pub(crate) fn new(operation: &'static str) -> Self {
		Self {
			operation,
			row: None,
			joined: Vec::new(),
			existing: None,
			inserted: None,
		}
	}

	fn unsupported(&self, scope: impl Into<String>) -> TranslateError {
		TranslateError::UnsupportedScope {
			operation: self.operation,
			scope: scope.into(),
		}
	}

	/// Mapping and column a field reads, when it reads a mapped entity.
	fn entity_column(&self, expr: &Expr) -> Option<(Arc<EntityMapping>, String)> {
		let Expr::Field {
			scope,
			path,
		} = expr
		else {
			return None;
		};
		let binding = match scope {
			Scope::Row => self.row.as_ref(),
			Scope::Existing => self.existing.as_ref(),
			Scope::Joined(alias) => self.joined.iter().find(|(a, _)| a == alias).map(|(_, b)| b),
			Scope::Inserted => None,
		}?;
		match binding {
			Binding::Entity {
				mapping,
				..
			} => mapping.column_of(path).map(|column| (mapping.clone(), column.to_string())),
			Binding::Local {
				..
			} => None,
		}
	}
}

pub(crate) struct Translator<'a> {
	metadata: &'a dyn MetadataProvider,
	ast: Ast,
}

impl<'a> Translator<'a> {
	pub(crate) fn new(metadata: &'a dyn MetadataProvider) -> Self {
		Self {
			metadata,
			ast: Ast::new(),
		}
	}

	fn finish(mut self, statement: Statement) -> Plan {
		let result = self.ast.push(Node::AffectedRows);
		Plan {
			ast: self.ast,
			statement,
			result,
		}
	}

	pub(crate) fn bind(&mut self, source: &RowSource, alias: &str) -> Result<Binding> {
		match source {
			RowSource::Entity(entity) => {
				let mapping = self.metadata.mapping(entity)?;
				let node = self.ast.push(Node::Table {
					name: mapping.table().to_string(),
					schema: mapping.schema().map(str::to_string),
					alias: alias.to_string(),
				});
				Ok(Binding::Entity {
					node,
					mapping,
				})
			}
			RowSource::Local {
				parameter,
				columns,
			} => {
				let node = self.ast.push(Node::Values {
					parameter: parameter.clone(),
					columns: columns.clone(),
					converters: vec![None; columns.len()],
					rows: RowCount::Placeholder,
					alias: alias.to_string(),
				});
				Ok(Binding::Local {
					node,
					parameter: parameter.clone(),
					columns: columns.clone(),
				})
			}
		}
	}

	/// Binds the table an operation modifies; it must be a mapped entity.
	pub(crate) fn bind_target(
		&mut self,
		source: &RowSource,
		operation: &'static str,
	) -> Result<(Binding, Arc<EntityMapping>)> {
		match source {
			RowSource::Entity(_) => {
				let binding = self.bind(source, TARGET_ALIAS)?;
				let mapping = match &binding {
					Binding::Entity {
						mapping,
						..
					} => mapping.clone(),
					Binding::Local {
						..
					} => {
						return Err(TranslateError::LocalTarget {
							operation,
						}
						.into());
					}
				};
				Ok((binding, mapping))
			}
			RowSource::Local {
				..
			} => Err(TranslateError::LocalTarget {
				operation,
			}
			.into()),
		}
	}

	/// Binds every join source first so each `on` may read any alias.
	pub(crate) fn bind_joins(&mut self, query: &Query, scopes: &mut Scopes) -> Result<Vec<Join>> {
		let mut sources = Vec::with_capacity(query.joins.len());
		for join in &query.joins {
			let binding = self.bind(&join.source, &join.alias)?;
			sources.push(binding.node());
			scopes.joined.push((join.alias.clone(), binding));
		}

		let mut joins = Vec::with_capacity(sources.len());
		for (join, source) in query.joins.iter().zip(sources) {
			let on = self.lower(&join.on, scopes)?;
			joins.push(Join {
				source,
				on,
			});
		}
		Ok(joins)
	}

	pub(crate) fn lower_filter(&mut self, query: &Query, scopes: &Scopes) -> Result<Option<NodeId>> {
		query.filter.as_ref().map(|filter| self.lower(filter, scopes)).transpose()
	}

	/// Lowers a value assigned to `column`; constants are converted to their
	/// stored form.
	pub(crate) fn lower_assignment(
		&mut self,
		mapping: &EntityMapping,
		column: &str,
		expr: &Expr,
		scopes: &Scopes,
	) -> Result<NodeId> {
		match (expr, mapping.converter(column)) {
			(Expr::Constant(value), Some(converter)) => Ok(self.ast.push(Node::Constant(converter.to_storage(value)))),
			_ => self.lower(expr, scopes),
		}
	}

	pub(crate) fn lower(&mut self, expr: &Expr, scopes: &Scopes) -> Result<NodeId> {
		match expr {
			Expr::Constant(value) => Ok(self.ast.push(Node::Constant(value.clone()))),
			Expr::Parameter(name) => Ok(self.ast.push(Node::Parameter {
				name: name.clone(),
			})),
			Expr::Field {
				scope,
				path,
			} => self.field(scope, path, scopes),
			Expr::Binary {
				op,
				left,
				right,
			} => {
				let (left, right) = if op.is_comparison() {
					let converter = |e: &Expr| scopes.entity_column(e).and_then(|(m, c)| m.converter(&c).cloned());
					(
						self.lower_compared(left, converter(right), scopes)?,
						self.lower_compared(right, converter(left), scopes)?,
					)
				} else {
					(self.lower(left, scopes)?, self.lower(right, scopes)?)
				};
				Ok(self.ast.push(Node::Binary {
					op: *op,
					left,
					right,
				}))
			}
			Expr::Unary {
				op,
				operand,
			} => {
				let operand = self.lower(operand, scopes)?;
				Ok(self.ast.push(Node::Unary {
					op: *op,
					operand,
				}))
			}
			Expr::IsNull {
				operand,
				negated,
			} => {
				let operand = self.lower(operand, scopes)?;
				if self.ast.nullable(operand) {
					Ok(self.ast.push(Node::IsNull {
						operand,
						negated: *negated,
					}))
				} else {
					// a non-nullable operand is never NULL
					Ok(self.ast.push(Node::Truth(*negated)))
				}
			}
		}
	}

	/// A constant compared against a converted column is stored-form.
	fn lower_compared(&mut self, expr: &Expr, other: Option<ValueConverter>, scopes: &Scopes) -> Result<NodeId> {
		match (expr, other) {
			(Expr::Constant(value), Some(converter)) => Ok(self.ast.push(Node::Constant(converter.to_storage(value)))),
			_ => self.lower(expr, scopes),
		}
	}

	fn field(&mut self, scope: &Scope, path: &str, scopes: &Scopes) -> Result<NodeId> {
		match scope {
			Scope::Row => {
				let binding = scopes.row.clone().ok_or_else(|| scopes.unsupported("the row scope"))?;
				self.column(&binding, path)
			}
			Scope::Joined(alias) => {
				let binding = scopes
					.joined
					.iter()
					.find(|(a, _)| a == alias)
					.map(|(_, b)| b.clone())
					.ok_or_else(|| scopes.unsupported(format!("join `{}`", alias)))?;
				self.column(&binding, path)
			}
			Scope::Existing => {
				let binding = scopes.existing.clone().ok_or_else(|| scopes.unsupported("the existing row"))?;
				self.column(&binding, path)
			}
			Scope::Inserted => match &scopes.inserted {
				Some(InsertedBinding::Excluded {
					mapping,
					columns,
				}) => {
					let column = shaped_column(mapping, columns, path)?;
					let nullable = mapping.is_nullable(&column);
					Ok(self.ast.push(Node::Excluded {
						column,
						nullable,
					}))
				}
				Some(InsertedBinding::Source {
					node,
					mapping,
					columns,
				}) => {
					let column = shaped_column(mapping, columns, path)?;
					let nullable = mapping.is_nullable(&column);
					Ok(self.ast.push(Node::Column {
						source: *node,
						name: column,
						nullable,
					}))
				}
				None => Err(scopes.unsupported("the inserted row").into()),
			},
		}
	}

	fn column(&mut self, binding: &Binding, path: &str) -> Result<NodeId> {
		match binding {
			Binding::Entity {
				node,
				mapping,
			} => {
				let column = mapping.column_of(path).ok_or_else(|| unmapped(mapping, path))?;
				Ok(self.ast.push(Node::Column {
					source: *node,
					name: column.to_string(),
					nullable: mapping.is_nullable(column),
				}))
			}
			Binding::Local {
				node,
				parameter,
				columns,
			} => {
				if !columns.iter().any(|c| c == path) {
					return Err(TranslateError::UnknownLocalColumn {
						parameter: parameter.clone(),
						column: path.to_string(),
					}
					.into());
				}
				Ok(self.ast.push(Node::Column {
					source: *node,
					name: path.to_string(),
					nullable: true,
				}))
			}
		}
	}

	/// Column of `mapping` an assignment writes, rejecting store generated ones.
	pub(crate) fn assignable_column<'m>(mapping: &'m EntityMapping, property: &str) -> Result<&'m str> {
		let column = mapping.column_of(property).ok_or_else(|| unmapped(mapping, property))?;
		if mapping.is_store_generated(column) {
			return Err(TranslateError::StoreGeneratedAssignment {
				entity: mapping.entity().to_string(),
				column: column.to_string(),
			}
			.into());
		}
		Ok(column)
	}

	/// Binds the root, joins and filter of `query` and projects the insert
	/// shape over them as a `Select` aliased [`SOURCE_ALIAS`]. `columns` are
	/// the target columns of the shape, in assignment order.
	pub(crate) fn shaped_source(
		&mut self,
		query: &Query,
		mapping: &EntityMapping,
		shape: &InsertShape,
		columns: &[String],
		operation: &'static str,
	) -> Result<NodeId> {
		let root = self.bind(&query.root, SOURCE_ROOT_ALIAS)?;
		let mut scopes = Scopes::new(operation);
		scopes.row = Some(root.clone());
		let joins = self.bind_joins(query, &mut scopes)?;
		let predicate = self.lower_filter(query, &scopes)?;

		let mut selected = Vec::with_capacity(columns.len());
		for (column, assignment) in columns.iter().zip(shape.assignments()) {
			let value = self.lower_assignment(mapping, column, &assignment.value, &scopes)?;
			selected.push((column.clone(), value));
		}
		self.convert_local(&root, mapping, columns.iter().zip(shape.assignments().iter().map(|a| &a.value)));

		Ok(self.ast.push(Node::Select {
			alias: SOURCE_ALIAS.to_string(),
			columns: selected,
			from: root.node(),
			joins,
			predicate,
		}))
	}

	/// Local rows hold logical values. A local column copied straight into a
	/// converted target column is converted when its cells are bound.
	pub(crate) fn convert_local<'e>(
		&mut self,
		source: &Binding,
		mapping: &EntityMapping,
		assignments: impl Iterator<Item = (&'e String, &'e Expr)>,
	) {
		let Binding::Local {
			node,
			..
		} = source
		else {
			return;
		};
		let node = *node;
		for (column, expr) in assignments {
			let (Some(local), Some(converter)) = (expr.as_row_field(), mapping.converter(column)) else {
				continue;
			};
			if let Node::Values {
				columns,
				converters,
				..
			} = self.ast.get_mut(node)
			{
				if let Some(index) = columns.iter().position(|c| c == local) {
					if converters[index].is_none() {
						converters[index] = Some(converter.clone());
					}
				}
			}
		}
	}

	/// Lowers a conflict or matched update. Key columns are never reassigned;
	/// an update left without assignments means do nothing.
	pub(crate) fn matched_update(
		&mut self,
		mapping: &EntityMapping,
		shape: &MergeShape,
		scopes: &Scopes,
	) -> Result<Option<Vec<(String, NodeId)>>> {
		let mut set = Vec::new();
		for assignment in shape.assignments() {
			let column = mapping.column_of(&assignment.property).ok_or_else(|| unmapped(mapping, &assignment.property))?;
			if mapping.is_key_column(column) {
				continue;
			}
			let column = Self::assignable_column(mapping, &assignment.property)?.to_string();
			let value = self.lower_assignment(mapping, &column, &assignment.value, scopes)?;
			set.push((column, value));
		}
		Ok(if set.is_empty() {
			None
		} else {
			Some(set)
		})
	}
}

pub(crate) fn unmapped(mapping: &EntityMapping, property: &str) -> setdml_core::Error {
	TranslateError::UnmappedProperty {
		entity: mapping.entity().to_string(),
		property: property.to_string(),
	}
	.into()
}

fn shaped_column(mapping: &EntityMapping, columns: &[String], path: &str) -> Result<String> {
	let column = mapping.column_of(path).ok_or_else(|| unmapped(mapping, path))?;
	if !columns.iter().any(|c| c == column) {
		return Err(TranslateError::InsertedNotShaped {
			property: path.to_string(),
		}
		.into());
	}
	Ok(column.to_string())
}
