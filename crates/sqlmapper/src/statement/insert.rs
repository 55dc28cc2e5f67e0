use super::{Checks, MethodKind, ResultType, StatementBuilder, StatementDescriptor, StatementKind};
use crate::clause;
use crate::config::MapperConfig;
use crate::error::MapperResult;
use crate::metadata::TableMetadata;
use crate::node::SqlNode;

/// `INSERT INTO t (<set columns>) VALUES (<bound values>)`
#[derive(Debug, Clone, Copy, Default)]
pub struct Insert;

impl StatementBuilder for Insert {
    fn method(&self) -> MethodKind {
        MethodKind::Insert
    }

    fn build(
        &self,
        table: &TableMetadata,
        config: &MapperConfig,
    ) -> MapperResult<StatementDescriptor> {
        let (columns, values) = clause::sql_insert_lists(table);
        let template = SqlNode::Seq(vec![
            SqlNode::Concat(vec![
                SqlNode::text(format!("INSERT INTO {} (", table.table_name())),
                columns,
                SqlNode::text(")"),
            ]),
            SqlNode::Concat(vec![SqlNode::text("VALUES ("), values, SqlNode::text(")")]),
        ]);
        Ok(StatementDescriptor::new(
            table,
            config,
            self.method(),
            StatementKind::Insert,
            ResultType::Affected,
            template,
            Checks {
                require_set: false,
                require_columns: true,
            },
        ))
    }
}
