//! UPDATE builders.
//!
//! All three fail at render time with
//! [`EmptySetFragment`](crate::error::MapperError::EmptySetFragment) when no
//! assignment survives its guard.

use super::{
    Checks, MethodKind, ResultType, StatementBuilder, StatementDescriptor, StatementKind,
    require_key, require_version,
};
use crate::clause::{self, VersionGuard};
use crate::config::MapperConfig;
use crate::error::MapperResult;
use crate::metadata::TableMetadata;
use crate::node::SqlNode;
use crate::param::ParamSource;

const CHECKS: Checks = Checks {
    require_set: true,
    require_columns: false,
};

fn update_by_id(
    table: &TableMetadata,
    config: &MapperConfig,
    method: MethodKind,
    version: VersionGuard,
) -> MapperResult<StatementDescriptor> {
    let key = require_key(table, method)?;
    let mut parts = vec![
        SqlNode::text(format!("UPDATE {}", table.table_name())),
        clause::sql_set(table, false),
    ];
    parts.extend(clause::sql_where_by_id(
        table,
        ParamSource::Entity(key.property().to_string()),
        version,
    ));
    Ok(StatementDescriptor::new(
        table,
        config,
        method,
        StatementKind::Update,
        ResultType::Affected,
        SqlNode::Seq(parts),
        CHECKS,
    ))
}

/// `UPDATE t SET <payload> [, ${ew.sqlSet}] [WHERE <wrapper>]`
#[derive(Debug, Clone, Copy, Default)]
pub struct Update;

impl StatementBuilder for Update {
    fn method(&self) -> MethodKind {
        MethodKind::Update
    }

    fn build(
        &self,
        table: &TableMetadata,
        config: &MapperConfig,
    ) -> MapperResult<StatementDescriptor> {
        let template = SqlNode::Seq(vec![
            clause::sql_first(),
            SqlNode::text(format!("UPDATE {}", table.table_name())),
            clause::sql_set(table, true),
            clause::sql_where_entity_wrapper(table),
            clause::sql_comment(),
        ]);
        Ok(StatementDescriptor::new(
            table,
            config,
            self.method(),
            StatementKind::Update,
            ResultType::Affected,
            template,
            CHECKS,
        ))
    }
}

/// Update by the payload's key. The version guard is added when the caller
/// supplies the pre-update version.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateById;

impl StatementBuilder for UpdateById {
    fn method(&self) -> MethodKind {
        MethodKind::UpdateById
    }

    fn build(
        &self,
        table: &TableMetadata,
        config: &MapperConfig,
    ) -> MapperResult<StatementDescriptor> {
        update_by_id(table, config, self.method(), VersionGuard::IfSupplied)
    }
}

/// Update by key that always carries `version = #{_version_original}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateByIdWithVersion;

impl StatementBuilder for UpdateByIdWithVersion {
    fn method(&self) -> MethodKind {
        MethodKind::UpdateByIdWithVersion
    }

    fn build(
        &self,
        table: &TableMetadata,
        config: &MapperConfig,
    ) -> MapperResult<StatementDescriptor> {
        require_key(table, self.method())?;
        require_version(table, self.method())?;
        update_by_id(table, config, self.method(), VersionGuard::Required)
    }
}
