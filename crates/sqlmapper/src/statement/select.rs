//! SELECT builders.

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

fn from(table: &TableMetadata) -> SqlNode {
    SqlNode::text(format!("FROM {}", table.table_name()))
}

fn wrapper_select(table: &TableMetadata, config: &MapperConfig) -> SqlNode {
    SqlNode::Seq(vec![
        clause::sql_first(),
        SqlNode::text("SELECT"),
        clause::sql_select_columns(table),
        from(table),
        clause::sql_where_entity_wrapper_ordered(table, config.order_by_key_fallback),
        clause::sql_comment(),
    ])
}

/// `SELECT COUNT(..) FROM t [WHERE ..]`
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectCount;

impl StatementBuilder for SelectCount {
    fn method(&self) -> MethodKind {
        MethodKind::SelectCount
    }

    fn build(
        &self,
        table: &TableMetadata,
        config: &MapperConfig,
    ) -> MapperResult<StatementDescriptor> {
        let template = SqlNode::Seq(vec![
            clause::sql_first(),
            SqlNode::text("SELECT"),
            clause::sql_count(),
            from(table),
            clause::sql_where_entity_wrapper(table),
            clause::sql_comment(),
        ]);
        Ok(StatementDescriptor::new(
            table,
            config,
            self.method(),
            StatementKind::Select,
            ResultType::Count,
            template,
            Checks::default(),
        ))
    }
}

/// Wrapper-driven list query mapped to entities.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectList;

impl StatementBuilder for SelectList {
    fn method(&self) -> MethodKind {
        MethodKind::SelectList
    }

    fn build(
        &self,
        table: &TableMetadata,
        config: &MapperConfig,
    ) -> MapperResult<StatementDescriptor> {
        Ok(StatementDescriptor::new(
            table,
            config,
            self.method(),
            StatementKind::Select,
            ResultType::Entity,
            wrapper_select(table, config),
            Checks::default(),
        ))
    }
}

/// Like [`SelectList`] but only the first column of each row is returned.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectObjs;

impl StatementBuilder for SelectObjs {
    fn method(&self) -> MethodKind {
        MethodKind::SelectObjs
    }

    fn build(
        &self,
        table: &TableMetadata,
        config: &MapperConfig,
    ) -> MapperResult<StatementDescriptor> {
        Ok(StatementDescriptor::new(
            table,
            config,
            self.method(),
            StatementKind::Select,
            ResultType::Object,
            wrapper_select(table, config),
            Checks::default(),
        ))
    }
}

/// `SELECT <all columns> FROM t WHERE key = #{id}`
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectById;

impl StatementBuilder for SelectById {
    fn method(&self) -> MethodKind {
        MethodKind::SelectById
    }

    fn build(
        &self,
        table: &TableMetadata,
        config: &MapperConfig,
    ) -> MapperResult<StatementDescriptor> {
        require_key(table, self.method())?;
        let mut parts = vec![
            SqlNode::text("SELECT"),
            SqlNode::text(clause::all_select_columns(table)),
            from(table),
        ];
        parts.extend(clause::sql_where_by_id(
            table,
            ParamSource::Id,
            VersionGuard::Off,
        ));
        Ok(StatementDescriptor::new(
            table,
            config,
            self.method(),
            StatementKind::Select,
            ResultType::Entity,
            SqlNode::Seq(parts),
            Checks::default(),
        ))
    }
}
