//! Clause assembly.
//!
//! Pure functions turning [`TableMetadata`] into the named clause trees the
//! statement builders concatenate: projection, SET, WHERE, ORDER BY and the
//! raw prefix/comment slots. Nothing here looks at per-call values; the
//! guards in the returned trees do that at render time.

use crate::metadata::{Column, FieldStrategy, OrderItem, TableMetadata};
use crate::node::{Guard, Predicate, SqlNode};
use crate::param::{BoundParam, ParamSource, RawSlot};

/// How the version column takes part in a by-id WHERE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionGuard {
    /// No guard.
    Off,
    /// Guard only when the caller supplied the pre-update version.
    IfSupplied,
    /// Always guard; rendering fails without the pre-update version.
    Required,
}

fn raw_if_present(slot: RawSlot) -> SqlNode {
    SqlNode::when(Guard::Raw(slot), SqlNode::Raw(slot))
}

/// `${ew.sqlFirst}` if the wrapper has one.
pub fn sql_first() -> SqlNode {
    raw_if_present(RawSlot::SqlFirst)
}

/// `${ew.sqlComment}` if the wrapper has one.
pub fn sql_comment() -> SqlNode {
    raw_if_present(RawSlot::SqlComment)
}

/// `COUNT(${ew.sqlSelect})`, or `COUNT(*)`.
pub fn sql_count() -> SqlNode {
    SqlNode::Concat(vec![
        SqlNode::text("COUNT("),
        SqlNode::Choose {
            when: Guard::Raw(RawSlot::SqlSelect),
            then: Box::new(SqlNode::Raw(RawSlot::SqlSelect)),
            otherwise: Box::new(SqlNode::text("*")),
        },
        SqlNode::text(")"),
    ])
}

/// Every mapped column, key first, aliased to its property when the names differ.
pub fn all_select_columns(table: &TableMetadata) -> String {
    let key = table.key().into_iter();
    key.chain(table.field_columns())
        .map(Column::select_sql)
        .collect::<Vec<_>>()
        .join(", ")
}

/// `${ew.sqlSelect}`, or the full column list.
pub fn sql_select_columns(table: &TableMetadata) -> SqlNode {
    SqlNode::Choose {
        when: Guard::Raw(RawSlot::SqlSelect),
        then: Box::new(SqlNode::Raw(RawSlot::SqlSelect)),
        otherwise: Box::new(SqlNode::text(all_select_columns(table))),
    }
}

fn bind(column: &Column, source: ParamSource, strategy: FieldStrategy) -> SqlNode {
    SqlNode::Bind {
        param: BoundParam::new(source, column.meta().clone()),
        nullable: strategy == FieldStrategy::Always,
    }
}

/// `column = #{source}`.
fn equality(column: &Column, source: ParamSource, strategy: FieldStrategy) -> SqlNode {
    SqlNode::Concat(vec![
        SqlNode::text(format!("{} = ", column.column())),
        bind(column, source, strategy),
    ])
}

/// `column = #{source}` emitted only when the value passes `strategy`.
fn guarded_equality(column: &Column, source: ParamSource, strategy: FieldStrategy) -> SqlNode {
    SqlNode::when(
        Guard::Bound {
            source: source.clone(),
            strategy,
        },
        equality(column, source, strategy),
    )
}

/// Logic delete predicate as a WHERE item.
pub fn logic_delete_predicate(table: &TableMetadata) -> Option<Predicate> {
    table
        .logic_delete_predicate()
        .map(|p| Predicate::Node(SqlNode::text(p)))
}

/// `SET deleted = <delete value>` for logical deletes.
pub fn logic_delete_set(table: &TableMetadata) -> Option<SqlNode> {
    table.logic_delete().map(|(column, values)| {
        SqlNode::Set(vec![SqlNode::text(values.delete_assignment(column.column()))])
    })
}

/// Version equality bound to the caller's pre-update value.
pub fn version_guard(table: &TableMetadata, mode: VersionGuard) -> Option<Predicate> {
    let column = table.version()?;
    let node = equality(column, ParamSource::VersionOriginal, FieldStrategy::NotNull);
    match mode {
        VersionGuard::Off => None,
        VersionGuard::IfSupplied => Some(Predicate::Node(SqlNode::when(
            Guard::VersionOriginal,
            node,
        ))),
        VersionGuard::Required => Some(Predicate::Node(node)),
    }
}

/// Columns a wrapper seed may constrain: key first, then fields in order. The
/// logic delete column is excluded when logic delete is configured.
fn seed_columns(table: &TableMetadata) -> impl Iterator<Item = &Column> {
    table
        .key()
        .into_iter()
        .chain(table.field_columns())
        .filter(|c| !c.is_logic_delete())
}

/// WHERE for wrapper-driven statements.
///
/// Seed equalities (key first), logic delete, wrapper criteria, wrapper segment;
/// a tail segment follows the WHERE clause.
pub fn sql_where_entity_wrapper(table: &TableMetadata) -> SqlNode {
    SqlNode::Seq(vec![wrapper_where(table), SqlNode::SegmentTail])
}

/// Like [`sql_where_entity_wrapper`], with the tail segment merged into ORDER BY.
pub fn sql_where_entity_wrapper_ordered(table: &TableMetadata, key_fallback: bool) -> SqlNode {
    SqlNode::Seq(vec![wrapper_where(table), sql_order_by(table, key_fallback)])
}

fn wrapper_where(table: &TableMetadata) -> SqlNode {
    let mut preds = Vec::new();
    for column in seed_columns(table) {
        let strategy = if column.is_primary_key() {
            FieldStrategy::NotNull
        } else {
            column.where_seed()
        };
        if strategy == FieldStrategy::Never {
            continue;
        }
        preds.push(Predicate::Node(guarded_equality(
            column,
            ParamSource::Seed(column.property().to_string()),
            strategy,
        )));
    }
    preds.extend(logic_delete_predicate(table));
    preds.push(Predicate::Criteria);
    preds.push(Predicate::Segment);
    SqlNode::Where(preds)
}

/// WHERE for by-id statements: `key = #{source}` [AND version guard] [AND logic delete].
///
/// Returns `None` when the table has no key.
pub fn sql_where_by_id(
    table: &TableMetadata,
    key_source: ParamSource,
    version: VersionGuard,
) -> Option<SqlNode> {
    let key = table.key()?;
    let mut preds = vec![Predicate::Node(equality(
        key,
        key_source,
        FieldStrategy::NotNull,
    ))];
    preds.extend(version_guard(table, version));
    preds.extend(logic_delete_predicate(table));
    Some(SqlNode::Where(preds))
}

/// SET from the entity payload's set properties, in column order.
///
/// Key and logic delete columns are never assigned. With `with_wrapper_set`
/// the wrapper's raw SET text is appended.
pub fn sql_set(table: &TableMetadata, with_wrapper_set: bool) -> SqlNode {
    let mut items: Vec<SqlNode> = table
        .field_columns()
        .filter(|c| !c.is_logic_delete() && c.update() != FieldStrategy::Never)
        .map(|c| {
            guarded_equality(c, ParamSource::Entity(c.property().to_string()), c.update())
        })
        .collect();
    if with_wrapper_set {
        items.push(raw_if_present(RawSlot::SqlSet));
    }
    SqlNode::Set(items)
}

/// `(col, ...)` and `(#{et.prop}, ...)` over insertable set properties.
pub fn sql_insert_lists(table: &TableMetadata) -> (SqlNode, SqlNode) {
    let mut columns = Vec::new();
    let mut values = Vec::new();
    for column in table
        .columns()
        .iter()
        .filter(|c| c.insert() != FieldStrategy::Never)
    {
        let source = ParamSource::Entity(column.property().to_string());
        let guard = Guard::Bound {
            source: source.clone(),
            strategy: column.insert(),
        };
        columns.push(SqlNode::when(
            guard.clone(),
            SqlNode::text(column.column()),
        ));
        values.push(SqlNode::when(guard, bind(column, source, column.insert())));
    }
    (SqlNode::List(columns), SqlNode::List(values))
}

/// ORDER BY: wrapper order, else the table default, else key ascending.
///
/// Also emits the wrapper's tail segment; a tail with its own ORDER BY
/// suppresses the default.
pub fn sql_order_by(table: &TableMetadata, key_fallback: bool) -> SqlNode {
    let mut fallback = table.default_order().to_vec();
    if fallback.is_empty() && key_fallback {
        if let Some(key) = table.key_column() {
            if let Ok(item) = OrderItem::asc(key) {
                fallback.push(item);
            }
        }
    }
    SqlNode::OrderBy { fallback }
}
