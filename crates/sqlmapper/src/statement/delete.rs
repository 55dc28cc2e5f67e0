//! DELETE builders.
//!
//! With logic delete configured both kinds become an UPDATE that assigns the
//! delete literal; only live rows match.

use super::{
    Checks, MethodKind, ResultType, StatementBuilder, StatementDescriptor, StatementKind,
    require_key,
};
use crate::clause::{self, VersionGuard};
use crate::config::MapperConfig;
use crate::error::MapperResult;
use crate::metadata::TableMetadata;
use crate::node::SqlNode;
use crate::param::ParamSource;

/// `DELETE FROM t`, or `UPDATE t SET deleted = <v>` under logic delete.
fn head(table: &TableMetadata) -> (StatementKind, Vec<SqlNode>) {
    match clause::logic_delete_set(table) {
        Some(set) => (
            StatementKind::Update,
            vec![SqlNode::text(format!("UPDATE {}", table.table_name())), set],
        ),
        None => (
            StatementKind::Delete,
            vec![SqlNode::text(format!("DELETE FROM {}", table.table_name()))],
        ),
    }
}

/// Wrapper-driven delete.
#[derive(Debug, Clone, Copy, Default)]
pub struct Delete;

impl StatementBuilder for Delete {
    fn method(&self) -> MethodKind {
        MethodKind::Delete
    }

    fn build(
        &self,
        table: &TableMetadata,
        config: &MapperConfig,
    ) -> MapperResult<StatementDescriptor> {
        let (kind, head) = head(table);
        let mut parts = vec![clause::sql_first()];
        parts.extend(head);
        parts.push(clause::sql_where_entity_wrapper(table));
        parts.push(clause::sql_comment());
        Ok(StatementDescriptor::new(
            table,
            config,
            self.method(),
            kind,
            ResultType::Affected,
            SqlNode::Seq(parts),
            Checks::default(),
        ))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteById;

impl StatementBuilder for DeleteById {
    fn method(&self) -> MethodKind {
        MethodKind::DeleteById
    }

    fn build(
        &self,
        table: &TableMetadata,
        config: &MapperConfig,
    ) -> MapperResult<StatementDescriptor> {
        require_key(table, self.method())?;
        let (kind, mut parts) = head(table);
        parts.extend(clause::sql_where_by_id(
            table,
            ParamSource::Id,
            VersionGuard::Off,
        ));
        Ok(StatementDescriptor::new(
            table,
            config,
            self.method(),
            kind,
            ResultType::Affected,
            SqlNode::Seq(parts),
            Checks::default(),
        ))
    }
}
