//! Statement builders.
//!
//! One [`StatementBuilder`] per [`MethodKind`]. A builder turns table metadata
//! into a [`StatementDescriptor`]: an immutable template plus the metadata of
//! every placeholder it uses. Descriptors are built once and rendered per call.
//!
//! ## Safe defaults
//!
//! - UPDATE requires at least one SET assignment at render time.
//! - UPDATE/DELETE require a WHERE clause unless
//!   [`MapperConfig::allow_unfiltered_writes`] is set.

pub mod delete;
pub mod insert;
pub mod select;
pub mod update;

pub use delete::{Delete, DeleteById};
pub use insert::Insert;
pub use select::{SelectById, SelectCount, SelectList, SelectObjs};
pub use update::{Update, UpdateById, UpdateByIdWithVersion};

use crate::config::{MapperConfig, PlaceholderStyle};
use crate::error::{MapperError, MapperResult};
use crate::metadata::{Column, TableMetadata};
use crate::node::SqlNode;
use crate::param::ParamMeta;
use crate::render::{BoundSql, Invocation, Renderer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Operation kinds the injector knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MethodKind {
    Insert,
    DeleteById,
    Delete,
    UpdateById,
    UpdateByIdWithVersion,
    Update,
    SelectById,
    SelectCount,
    SelectList,
    SelectObjs,
}

impl MethodKind {
    pub const ALL: [MethodKind; 10] = [
        MethodKind::Insert,
        MethodKind::DeleteById,
        MethodKind::Delete,
        MethodKind::UpdateById,
        MethodKind::UpdateByIdWithVersion,
        MethodKind::Update,
        MethodKind::SelectById,
        MethodKind::SelectCount,
        MethodKind::SelectList,
        MethodKind::SelectObjs,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MethodKind::Insert => "insert",
            MethodKind::DeleteById => "deleteById",
            MethodKind::Delete => "delete",
            MethodKind::UpdateById => "updateById",
            MethodKind::UpdateByIdWithVersion => "updateByIdWithVersion",
            MethodKind::Update => "update",
            MethodKind::SelectById => "selectById",
            MethodKind::SelectCount => "selectCount",
            MethodKind::SelectList => "selectList",
            MethodKind::SelectObjs => "selectObjs",
        }
    }

    pub fn requires_key(self) -> bool {
        matches!(
            self,
            MethodKind::DeleteById
                | MethodKind::UpdateById
                | MethodKind::UpdateByIdWithVersion
                | MethodKind::SelectById
        )
    }

    pub fn requires_version(self) -> bool {
        self == MethodKind::UpdateByIdWithVersion
    }

    /// The builder registered for this kind.
    pub fn builder(self) -> &'static dyn StatementBuilder {
        match self {
            MethodKind::Insert => &Insert,
            MethodKind::DeleteById => &DeleteById,
            MethodKind::Delete => &Delete,
            MethodKind::UpdateById => &UpdateById,
            MethodKind::UpdateByIdWithVersion => &UpdateByIdWithVersion,
            MethodKind::Update => &Update,
            MethodKind::SelectById => &SelectById,
            MethodKind::SelectCount => &SelectCount,
            MethodKind::SelectList => &SelectList,
            MethodKind::SelectObjs => &SelectObjs,
        }
    }
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MethodKind {
    type Err = MapperError;

    /// Accepts the camelCase name or its snake_case form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s.chars().filter(|c| *c != '_').collect();
        MethodKind::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(&folded))
            .ok_or_else(|| MapperError::UnknownStatement(format!("unknown method '{s}'")))
    }
}

/// SQL command type of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

/// What the execution engine should map the result to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultType {
    /// A single integer count.
    Count,
    /// Rows mapped to the entity.
    Entity,
    /// The first column of each row.
    Object,
    /// Affected row count.
    Affected,
}

/// Render-time checks a statement opts into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Checks {
    pub(crate) require_set: bool,
    pub(crate) require_columns: bool,
}

/// An injected statement: immutable template plus placeholder metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementDescriptor {
    id: String,
    method: MethodKind,
    statement_kind: StatementKind,
    result_type: ResultType,
    template: SqlNode,
    parameter_bindings: BTreeMap<String, ParamMeta>,
    checks: Checks,
    placeholder_style: PlaceholderStyle,
    allow_unfiltered_writes: bool,
}

impl StatementDescriptor {
    pub(crate) fn new(
        table: &TableMetadata,
        config: &MapperConfig,
        method: MethodKind,
        statement_kind: StatementKind,
        result_type: ResultType,
        template: SqlNode,
        checks: Checks,
    ) -> Self {
        let parameter_bindings = template
            .bound_params()
            .into_iter()
            .map(|p| (p.name(), p.meta.clone()))
            .collect();
        Self {
            id: format!("{}.{}", table.table_name(), method.name()),
            method,
            statement_kind,
            result_type,
            template,
            parameter_bindings,
            checks,
            placeholder_style: config.placeholder_style,
            allow_unfiltered_writes: config.allow_unfiltered_writes,
        }
    }

    /// `table.method`, e.g. `t_user.updateById`.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn method(&self) -> MethodKind {
        self.method
    }

    pub fn statement_kind(&self) -> StatementKind {
        self.statement_kind
    }

    pub fn result_type(&self) -> ResultType {
        self.result_type
    }

    pub fn template(&self) -> &SqlNode {
        &self.template
    }

    /// The template in script form: `#{..}` bound, `${..}` raw.
    pub fn sql_template(&self) -> String {
        self.template.to_string()
    }

    /// Placeholder name → type metadata for every tier-1 placeholder.
    pub fn parameter_bindings(&self) -> &BTreeMap<String, ParamMeta> {
        &self.parameter_bindings
    }

    /// Render the statement for one call.
    pub fn render(&self, invocation: &Invocation) -> MapperResult<BoundSql> {
        let mut renderer = Renderer::new(&self.id, self.placeholder_style, invocation);
        let sql = renderer.render(&self.template)?;
        let flags = renderer.flags;

        if self.checks.require_set && flags.set_rendered != Some(true) {
            return Err(MapperError::EmptySetFragment {
                statement: self.id.clone(),
            });
        }
        if self.checks.require_columns && flags.empty_list {
            return Err(MapperError::EmptyInsert {
                statement: self.id.clone(),
            });
        }
        let is_write = matches!(
            self.statement_kind,
            StatementKind::Update | StatementKind::Delete
        );
        if is_write && !flags.where_rendered && !self.allow_unfiltered_writes {
            return Err(MapperError::UnfilteredWrite {
                statement: self.id.clone(),
            });
        }

        let bound = renderer.finish(sql);
        #[cfg(feature = "tracing")]
        tracing::trace!(
            target: "sqlmapper.sql",
            statement = %self.id,
            param_count = bound.params.len(),
            sql = %bound.sql,
        );
        Ok(bound)
    }
}

/// Builds the descriptor of one operation kind.
pub trait StatementBuilder: Send + Sync {
    fn method(&self) -> MethodKind;

    fn build(
        &self,
        table: &TableMetadata,
        config: &MapperConfig,
    ) -> MapperResult<StatementDescriptor>;
}

pub(crate) fn require_key(table: &TableMetadata, method: MethodKind) -> MapperResult<&Column> {
    table
        .key()
        .ok_or_else(|| MapperError::missing_key(table.table_name(), method.name()))
}

pub(crate) fn require_version(table: &TableMetadata, method: MethodKind) -> MapperResult<&Column> {
    table
        .version()
        .ok_or_else(|| MapperError::missing_version(table.table_name(), method.name()))
}

#[cfg(test)]
mod tests;
