//! Resolved table metadata.
//!
//! [`TableMetadata`] is the only description of a table the statement builders
//! see. It is produced once (by hand, from a config file, or by whatever
//! discovery mechanism the host uses) and is immutable afterwards.
//!
//! # Example
//!
//! ```rust
//! use sqlmapper::metadata::{Column, LogicDelete, TableMetadata};
//!
//! let table = TableMetadata::builder("t_user")
//!     .key(Column::new("id", "id"))
//!     .column(Column::new("user_name", "userName").jdbc_type("VARCHAR"))
//!     .column(Column::new("age", "age"))
//!     .version(Column::new("version", "version"))
//!     .logic_delete(Column::new("deleted", "deleted"), LogicDelete::new("1", "0"))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(table.key_column(), Some("id"));
//! assert_eq!(table.columns().len(), 5);
//! ```

use crate::config::MapperConfig;
use crate::error::{MapperError, MapperResult};
use crate::ident::{Ident, validate_property};
use crate::param::ParamMeta;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

/// When a property takes part in an INSERT, SET or WHERE seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStrategy {
    /// Include when the property is present and not null.
    #[default]
    NotNull,
    /// Like `NotNull`, and also skip empty strings.
    NotEmpty,
    /// Always include, binding null when absent.
    Always,
    /// Never include.
    Never,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// One `ORDER BY` entry over a validated column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub column: Ident,
    pub direction: Direction,
}

impl OrderItem {
    pub fn new(column: &str, direction: Direction) -> MapperResult<Self> {
        Ok(Self {
            column: Ident::parse(column)?,
            direction,
        })
    }

    pub fn asc(column: &str) -> MapperResult<Self> {
        Self::new(column, Direction::Asc)
    }

    pub fn desc(column: &str) -> MapperResult<Self> {
        Self::new(column, Direction::Desc)
    }
}

impl fmt::Display for OrderItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.column, self.direction.as_sql())
    }
}

/// One mapped column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    column: String,
    property: String,
    meta: ParamMeta,
    primary_key: bool,
    version: bool,
    logic_delete: bool,
    insert_strategy: FieldStrategy,
    update_strategy: FieldStrategy,
    where_strategy: FieldStrategy,
}

impl Column {
    pub fn new(column: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            property: property.into(),
            meta: ParamMeta::default(),
            primary_key: false,
            version: false,
            logic_delete: false,
            insert_strategy: FieldStrategy::NotNull,
            update_strategy: FieldStrategy::NotNull,
            where_strategy: FieldStrategy::NotNull,
        }
    }

    pub fn jdbc_type(mut self, v: impl Into<String>) -> Self {
        self.meta.jdbc_type = Some(v.into());
        self
    }

    pub fn value_type(mut self, v: impl Into<String>) -> Self {
        self.meta.value_type = Some(v.into());
        self
    }

    pub fn type_handler(mut self, v: impl Into<String>) -> Self {
        self.meta.type_handler = Some(v.into());
        self
    }

    pub fn numeric_scale(mut self, scale: u32) -> Self {
        self.meta.numeric_scale = Some(scale);
        self
    }

    pub fn with_meta(mut self, meta: ParamMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn as_version(mut self) -> Self {
        self.version = true;
        self
    }

    pub fn as_logic_delete(mut self) -> Self {
        self.logic_delete = true;
        self
    }

    pub fn insert_strategy(mut self, s: FieldStrategy) -> Self {
        self.insert_strategy = s;
        self
    }

    pub fn update_strategy(mut self, s: FieldStrategy) -> Self {
        self.update_strategy = s;
        self
    }

    pub fn where_strategy(mut self, s: FieldStrategy) -> Self {
        self.where_strategy = s;
        self
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn meta(&self) -> &ParamMeta {
        &self.meta
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn is_version(&self) -> bool {
        self.version
    }

    pub fn is_logic_delete(&self) -> bool {
        self.logic_delete
    }

    pub fn insert(&self) -> FieldStrategy {
        self.insert_strategy
    }

    pub fn update(&self) -> FieldStrategy {
        self.update_strategy
    }

    pub fn where_seed(&self) -> FieldStrategy {
        self.where_strategy
    }

    /// `column AS property` when they differ, otherwise just the column.
    pub fn select_sql(&self) -> String {
        if self.column == self.property {
            self.column.clone()
        } else {
            format!("{} AS {}", self.column, self.property)
        }
    }
}

/// SQL literals of a logic delete column.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogicDelete {
    pub delete_value: String,
    pub not_delete_value: String,
}

impl LogicDelete {
    pub fn new(delete_value: impl Into<String>, not_delete_value: impl Into<String>) -> Self {
        Self {
            delete_value: delete_value.into(),
            not_delete_value: not_delete_value.into(),
        }
    }

    /// Use the global values from [`MapperConfig`].
    pub fn with_defaults(config: &MapperConfig) -> Self {
        Self::new(
            config.logic_delete_value.clone(),
            config.logic_not_delete_value.clone(),
        )
    }

    /// Predicate selecting live rows: `col = v`, or `col IS NULL` for a `null` literal.
    pub fn live_predicate(&self, column: &str) -> String {
        predicate(column, &self.not_delete_value)
    }

    /// Assignment marking a row deleted.
    pub fn delete_assignment(&self, column: &str) -> String {
        format!("{column} = {}", literal(&self.delete_value))
    }
}

fn is_null_literal(v: &str) -> bool {
    v.trim().eq_ignore_ascii_case("null")
}

fn literal(v: &str) -> &str {
    if is_null_literal(v) { "NULL" } else { v }
}

fn predicate(column: &str, value: &str) -> String {
    if is_null_literal(value) {
        format!("{column} IS NULL")
    } else {
        format!("{column} = {value}")
    }
}

/// Resolved, immutable description of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMetadata {
    table_name: String,
    columns: Vec<Column>,
    key: Option<usize>,
    version: Option<usize>,
    logic_delete: Option<(usize, LogicDelete)>,
    default_order: Vec<OrderItem>,
}

impl TableMetadata {
    pub fn builder(table_name: impl Into<String>) -> TableMetadataBuilder {
        TableMetadataBuilder::new(table_name)
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// All columns in declaration order, key included.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Non-key columns in declaration order.
    pub fn field_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| !c.is_primary_key())
    }

    pub fn key(&self) -> Option<&Column> {
        self.key.map(|i| &self.columns[i])
    }

    pub fn key_column(&self) -> Option<&str> {
        self.key().map(Column::column)
    }

    pub fn key_property(&self) -> Option<&str> {
        self.key().map(Column::property)
    }

    pub fn version(&self) -> Option<&Column> {
        self.version.map(|i| &self.columns[i])
    }

    pub fn logic_delete(&self) -> Option<(&Column, &LogicDelete)> {
        self.logic_delete
            .as_ref()
            .map(|(i, values)| (&self.columns[*i], values))
    }

    pub fn is_with_logic_delete(&self) -> bool {
        self.logic_delete.is_some()
    }

    /// `deleted = 0` style predicate, if logic delete is configured.
    pub fn logic_delete_predicate(&self) -> Option<String> {
        self.logic_delete()
            .map(|(col, values)| values.live_predicate(col.column()))
    }

    pub fn default_order(&self) -> &[OrderItem] {
        &self.default_order
    }

    pub fn column_by_property(&self, property: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.property() == property)
    }
}

/// Builder for [`TableMetadata`]; `build` validates every invariant.
#[derive(Debug, Clone)]
pub struct TableMetadataBuilder {
    table_name: String,
    columns: Vec<Column>,
    logic_delete: Option<LogicDelete>,
    default_order: Vec<(String, Direction)>,
}

impl TableMetadataBuilder {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            columns: Vec::new(),
            logic_delete: None,
            default_order: Vec::new(),
        }
    }

    /// Add a column as-is (flags are taken from the column).
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Add the primary key column.
    pub fn key(self, column: Column) -> Self {
        self.column(column.primary_key())
    }

    /// Add the optimistic-lock version column.
    pub fn version(self, column: Column) -> Self {
        self.column(column.as_version())
    }

    /// Add the logic delete column with its literals.
    pub fn logic_delete(mut self, column: Column, values: LogicDelete) -> Self {
        self.logic_delete = Some(values);
        self.column(column.as_logic_delete())
    }

    /// Literals for a column flagged with [`Column::as_logic_delete`].
    pub fn logic_delete_values(mut self, values: LogicDelete) -> Self {
        self.logic_delete = Some(values);
        self
    }

    /// Default ordering for list queries without an explicit wrapper order.
    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.default_order.push((column.into(), direction));
        self
    }

    pub fn build(self) -> MapperResult<TableMetadata> {
        let table_name = Ident::parse(&self.table_name)?.as_sql().to_string();

        let mut seen_columns = HashSet::new();
        let mut seen_properties = HashSet::new();
        let mut columns = Vec::with_capacity(self.columns.len());
        for mut column in self.columns {
            column.column = Ident::parse(&column.column)?.as_sql().to_string();
            validate_property(&column.property)?;
            if !seen_columns.insert(column.column.clone()) {
                return Err(MapperError::invalid_metadata(format!(
                    "table '{table_name}' declares column '{}' twice",
                    column.column
                )));
            }
            if !seen_properties.insert(column.property.clone()) {
                return Err(MapperError::invalid_metadata(format!(
                    "table '{table_name}' declares property '{}' twice",
                    column.property
                )));
            }
            let roles = [column.primary_key, column.version, column.logic_delete]
                .iter()
                .filter(|f| **f)
                .count();
            if roles > 1 {
                return Err(MapperError::invalid_metadata(format!(
                    "column '{}' of '{table_name}' has more than one role",
                    column.column
                )));
            }
            columns.push(column);
        }

        let key = single(&columns, Column::is_primary_key, "primary key", &table_name)?;
        let version = single(&columns, Column::is_version, "version", &table_name)?;
        let logic_index = single(&columns, Column::is_logic_delete, "logic delete", &table_name)?;

        let logic_delete = match (logic_index, self.logic_delete) {
            (Some(i), Some(values)) => Some((i, values)),
            (Some(i), None) => {
                return Err(MapperError::invalid_metadata(format!(
                    "logic delete column '{}' of '{table_name}' has no delete values",
                    columns[i].column
                )));
            }
            (None, Some(_)) => {
                return Err(MapperError::invalid_metadata(format!(
                    "table '{table_name}' has logic delete values but no logic delete column"
                )));
            }
            (None, None) => None,
        };

        let default_order = self
            .default_order
            .iter()
            .map(|(col, dir)| OrderItem::new(col, *dir))
            .collect::<MapperResult<Vec<_>>>()?;

        Ok(TableMetadata {
            table_name,
            columns,
            key,
            version,
            logic_delete,
            default_order,
        })
    }
}

fn single(
    columns: &[Column],
    pred: fn(&Column) -> bool,
    role: &str,
    table: &str,
) -> MapperResult<Option<usize>> {
    let mut found = None;
    for (i, column) in columns.iter().enumerate() {
        if pred(column) {
            if found.is_some() {
                return Err(MapperError::invalid_metadata(format!(
                    "table '{table}' declares more than one {role} column"
                )));
            }
            found = Some(i);
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_table() -> TableMetadata {
        TableMetadata::builder("t_user")
            .key(Column::new("id", "id"))
            .column(Column::new("user_name", "userName"))
            .version(Column::new("version", "version"))
            .logic_delete(Column::new("deleted", "deleted"), LogicDelete::new("1", "0"))
            .build()
            .unwrap()
    }

    #[test]
    fn resolves_roles() {
        let table = user_table();
        assert_eq!(table.key_column(), Some("id"));
        assert_eq!(table.key_property(), Some("id"));
        assert_eq!(table.version().map(Column::column), Some("version"));
        assert_eq!(table.logic_delete_predicate().as_deref(), Some("deleted = 0"));
        assert_eq!(table.field_columns().count(), 3);
    }

    #[test]
    fn rejects_two_keys() {
        let err = TableMetadata::builder("t")
            .key(Column::new("a", "a"))
            .key(Column::new("b", "b"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("more than one primary key"));
    }

    #[test]
    fn rejects_two_versions() {
        assert!(TableMetadata::builder("t")
            .version(Column::new("a", "a"))
            .version(Column::new("b", "b"))
            .build()
            .is_err());
    }

    #[test]
    fn rejects_duplicate_column_and_property() {
        assert!(TableMetadata::builder("t")
            .column(Column::new("a", "a"))
            .column(Column::new("a", "b"))
            .build()
            .is_err());
        assert!(TableMetadata::builder("t")
            .column(Column::new("a", "x"))
            .column(Column::new("b", "x"))
            .build()
            .is_err());
    }

    #[test]
    fn rejects_logic_delete_without_values() {
        let err = TableMetadata::builder("t")
            .column(Column::new("deleted", "deleted").as_logic_delete())
            .build()
            .unwrap_err();
        assert!(matches!(err, MapperError::InvalidMetadata(_)));
    }

    #[test]
    fn rejects_bad_identifiers() {
        assert!(TableMetadata::builder("t_user; --").build().is_err());
        assert!(TableMetadata::builder("t")
            .column(Column::new("name", "na-me"))
            .build()
            .is_err());
    }

    #[test]
    fn null_logic_delete_literal() {
        let values = LogicDelete::new("now()", "null");
        assert_eq!(values.live_predicate("deleted_at"), "deleted_at IS NULL");
        assert_eq!(values.delete_assignment("deleted_at"), "deleted_at = now()");
        let values = LogicDelete::new("NULL", "1");
        assert_eq!(values.delete_assignment("alive"), "alive = NULL");
    }

    #[test]
    fn select_alias_only_when_names_differ() {
        assert_eq!(Column::new("id", "id").select_sql(), "id");
        assert_eq!(Column::new("user_name", "userName").select_sql(), "user_name AS userName");
    }

    #[test]
    fn logic_delete_defaults_from_config() {
        let config = MapperConfig::new().with_logic_delete_values("Y", "N");
        let values = LogicDelete::with_defaults(&config);
        assert_eq!(values.live_predicate("del"), "del = N");
    }
}
