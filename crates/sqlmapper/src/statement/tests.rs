use super::*;
use crate::config::PlaceholderStyle;
use crate::error::MapperError;
use crate::metadata::{Column, FieldStrategy, LogicDelete};
use crate::record::Record;
use crate::wrapper::ConditionWrapper;
use serde_json::json;

fn user_table() -> TableMetadata {
    TableMetadata::builder("t_user")
        .key(Column::new("id", "id").jdbc_type("BIGINT"))
        .column(Column::new("name", "name").jdbc_type("VARCHAR"))
        .column(Column::new("age", "age"))
        .build()
        .unwrap()
}

fn versioned_table() -> TableMetadata {
    TableMetadata::builder("t_user")
        .key(Column::new("id", "id"))
        .column(Column::new("name", "name"))
        .version(Column::new("v", "v"))
        .build()
        .unwrap()
}

fn soft_table() -> TableMetadata {
    TableMetadata::builder("t_user")
        .key(Column::new("id", "id"))
        .column(Column::new("name", "name"))
        .logic_delete(Column::new("deleted", "deleted"), LogicDelete::new("1", "0"))
        .build()
        .unwrap()
}

fn build(kind: MethodKind, table: &TableMetadata) -> StatementDescriptor {
    kind.builder().build(table, &MapperConfig::default()).unwrap()
}

#[test]
fn method_names_round_trip() {
    for kind in MethodKind::ALL {
        assert_eq!(kind.name().parse::<MethodKind>().unwrap(), kind);
        assert_eq!(kind.builder().method(), kind);
    }
    assert_eq!(
        "update_by_id_with_version".parse::<MethodKind>().unwrap(),
        MethodKind::UpdateByIdWithVersion
    );
    assert!(matches!(
        "upsert".parse::<MethodKind>(),
        Err(MapperError::UnknownStatement(_))
    ));
}

#[test]
fn count_on_soft_delete_table_without_wrapper() {
    let table = TableMetadata::builder("t_user")
        .key(Column::new("id", "id"))
        .logic_delete(Column::new("deleted", "deleted"), LogicDelete::new("0", "1"))
        .build()
        .unwrap();
    let stmt = build(MethodKind::SelectCount, &table);
    let out = stmt.render(&Invocation::new()).unwrap();
    assert_eq!(out.sql, "SELECT COUNT(*) FROM t_user WHERE deleted = 1");
    assert!(out.params.is_empty());
    assert_eq!(stmt.id(), "t_user.selectCount");
    assert_eq!(stmt.result_type(), ResultType::Count);
}

#[test]
fn count_with_custom_projection_and_raw_slots() {
    let stmt = build(MethodKind::SelectCount, &user_table());
    let ew = ConditionWrapper::new()
        .select("DISTINCT age")
        .first("/* hint */")
        .comment("-- audit")
        .apply("age > 10")
        .unwrap();
    let out = stmt.render(&Invocation::new().wrapper(ew)).unwrap();
    assert_eq!(
        out.sql,
        "/* hint */ SELECT COUNT(DISTINCT age) FROM t_user WHERE age > 10 -- audit"
    );
}

#[test]
fn blank_wrapper_renders_like_no_wrapper() {
    for kind in [MethodKind::SelectCount, MethodKind::SelectList] {
        let stmt = build(kind, &soft_table());
        let without = stmt.render(&Invocation::new()).unwrap();
        let blank = stmt
            .render(&Invocation::new().wrapper(ConditionWrapper::new()))
            .unwrap();
        assert_eq!(without, blank);
    }
}

#[test]
fn select_list_orders_by_key_by_default() {
    let stmt = build(MethodKind::SelectList, &user_table());
    let out = stmt.render(&Invocation::new()).unwrap();
    assert_eq!(out.sql, "SELECT id, name, age FROM t_user ORDER BY id ASC");

    let ew = ConditionWrapper::new()
        .eq("age", 3)
        .unwrap()
        .order_by_desc("name")
        .unwrap();
    let out = stmt.render(&Invocation::new().wrapper(ew)).unwrap();
    assert_eq!(
        out.sql,
        "SELECT id, name, age FROM t_user WHERE age = $1 ORDER BY name DESC"
    );
    assert_eq!(out.values(), vec![&json!(3)]);
}

#[test]
fn list_queries_merge_tail_with_default_order() {
    for kind in [MethodKind::SelectList, MethodKind::SelectObjs] {
        let stmt = build(kind, &versioned_table());
        let render = |tail: &str| {
            let ew = ConditionWrapper::new().apply(tail).unwrap();
            stmt.render(&Invocation::new().wrapper(ew)).unwrap().sql
        };
        assert_eq!(
            render("ORDER BY name DESC"),
            "SELECT id, name, v FROM t_user ORDER BY name DESC"
        );
        assert_eq!(
            render("LIMIT 10"),
            "SELECT id, name, v FROM t_user ORDER BY id ASC LIMIT 10"
        );
    }

    let stmt = build(MethodKind::SelectCount, &versioned_table());
    let ew = ConditionWrapper::new().apply("GROUP BY name").unwrap();
    let out = stmt.render(&Invocation::new().wrapper(ew)).unwrap();
    assert_eq!(out.sql, "SELECT COUNT(*) FROM t_user GROUP BY name");
}

#[test]
fn select_objs_uses_wrapper_projection() {
    let stmt = build(MethodKind::SelectObjs, &user_table());
    let ew = ConditionWrapper::new().select("name");
    let out = stmt.render(&Invocation::new().wrapper(ew)).unwrap();
    assert_eq!(out.sql, "SELECT name FROM t_user ORDER BY id ASC");
    assert_eq!(stmt.result_type(), ResultType::Object);
}

#[test]
fn select_by_id_binds_id() {
    let stmt = build(MethodKind::SelectById, &soft_table());
    let out = stmt.render(&Invocation::new().id(5)).unwrap();
    assert_eq!(
        out.sql,
        "SELECT id, name, deleted FROM t_user WHERE id = $1 AND deleted = 0"
    );
    assert_eq!(out.params[0].name, "id");

    let err = stmt.render(&Invocation::new()).unwrap_err();
    assert!(matches!(err, MapperError::MissingBinding { .. }));
}

#[test]
fn update_by_id_sets_only_supplied_fields() {
    let stmt = build(MethodKind::UpdateById, &user_table());
    let payload = Record::new().with("id", 1).with("name", "x");
    let out = stmt.render(&Invocation::new().entity(payload)).unwrap();
    assert_eq!(out.sql, "UPDATE t_user SET name = $1 WHERE id = $2");
    assert_eq!(out.values(), vec![&json!("x"), &json!(1)]);
    assert_eq!(out.params[0].meta.jdbc_type.as_deref(), Some("VARCHAR"));
}

#[test]
fn update_by_id_template_is_two_tier() {
    let stmt = build(MethodKind::UpdateById, &user_table());
    let template = stmt.sql_template();
    assert!(template.contains("#{et.name,jdbcType=VARCHAR}"));
    assert!(template.contains("#{et.id,jdbcType=BIGINT}"));
    assert!(!template.contains("${"));
    assert!(stmt.parameter_bindings().contains_key("et.age"));
}

#[test]
fn update_by_id_guards_pre_update_version() {
    let stmt = build(MethodKind::UpdateById, &versioned_table());
    let inv = Invocation::new()
        .entity(Record::new().with("id", 1).with("name", "x"))
        .expected_version("v", 3);
    let out = stmt.render(&inv).unwrap();
    assert_eq!(
        out.sql,
        "UPDATE t_user SET name = $1, v = $2 WHERE id = $3 AND v = $4"
    );
    assert_eq!(
        out.values(),
        vec![&json!("x"), &json!(4), &json!(1), &json!(3)]
    );
    assert_eq!(out.params[3].name, "_version_original");

    let out = stmt
        .render(&Invocation::new().entity(Record::new().with("id", 1).with("name", "x")))
        .unwrap();
    assert_eq!(out.sql, "UPDATE t_user SET name = $1 WHERE id = $2");
}

#[test]
fn version_advances_regardless_of_builder_order() {
    let stmt = build(MethodKind::UpdateByIdWithVersion, &versioned_table());
    let payload = Record::new().with("id", 1).with("name", "x");
    let entity_first = Invocation::new()
        .entity(payload.clone())
        .expected_version("v", 3);
    let version_first = Invocation::new()
        .expected_version("v", 3)
        .entity(payload);
    for inv in [entity_first, version_first] {
        let out = stmt.render(&inv).unwrap();
        assert_eq!(
            out.sql,
            "UPDATE t_user SET name = $1, v = $2 WHERE id = $3 AND v = $4"
        );
        assert_eq!(
            out.values(),
            vec![&json!("x"), &json!(4), &json!(1), &json!(3)]
        );
    }
}

#[test]
fn update_with_version_requires_expected_value() {
    let stmt = build(MethodKind::UpdateByIdWithVersion, &versioned_table());
    let inv = Invocation::new().entity(Record::new().with("id", 1).with("name", "x"));
    let err = stmt.render(&inv).unwrap_err();
    assert!(matches!(err, MapperError::MissingBinding { ref name, .. } if name == "_version_original"));
}

#[test]
fn empty_set_is_reported() {
    let stmt = build(MethodKind::UpdateById, &user_table());
    let err = stmt
        .render(&Invocation::new().entity(Record::new().with("id", 1)))
        .unwrap_err();
    assert!(err.is_empty_set());

    let stmt = build(MethodKind::Update, &user_table());
    let ew = ConditionWrapper::new().eq("id", 1).unwrap();
    let err = stmt.render(&Invocation::new().wrapper(ew)).unwrap_err();
    assert!(err.is_empty_set());
}

#[test]
fn update_merges_wrapper_set() {
    let stmt = build(MethodKind::Update, &soft_table());
    let ew = ConditionWrapper::new()
        .set_sql("name = upper(name)")
        .apply("id > 10")
        .unwrap();
    let out = stmt.render(&Invocation::new().wrapper(ew)).unwrap();
    assert_eq!(
        out.sql,
        "UPDATE t_user SET name = upper(name) WHERE deleted = 0 AND id > 10"
    );
}

#[test]
fn unfiltered_update_is_refused_by_default() {
    let stmt = build(MethodKind::Update, &user_table());
    let inv = Invocation::new().entity(Record::new().with("age", 1));
    let err = stmt.render(&inv).unwrap_err();
    assert!(matches!(err, MapperError::UnfilteredWrite { .. }));

    let config = MapperConfig::default().allow_unfiltered_writes();
    let stmt = Update.build(&user_table(), &config).unwrap();
    assert_eq!(stmt.render(&inv).unwrap().sql, "UPDATE t_user SET age = $1");
}

#[test]
fn physical_and_logical_deletes() {
    let stmt = build(MethodKind::DeleteById, &user_table());
    assert_eq!(stmt.statement_kind(), StatementKind::Delete);
    let out = stmt.render(&Invocation::new().id(7)).unwrap();
    assert_eq!(out.sql, "DELETE FROM t_user WHERE id = $1");

    let stmt = build(MethodKind::DeleteById, &soft_table());
    assert_eq!(stmt.statement_kind(), StatementKind::Update);
    let out = stmt.render(&Invocation::new().id(7)).unwrap();
    assert_eq!(
        out.sql,
        "UPDATE t_user SET deleted = 1 WHERE id = $1 AND deleted = 0"
    );

    let stmt = build(MethodKind::Delete, &soft_table());
    let ew = ConditionWrapper::new().entity(Record::new().with("name", "x"));
    let out = stmt.render(&Invocation::new().wrapper(ew)).unwrap();
    assert_eq!(
        out.sql,
        "UPDATE t_user SET deleted = 1 WHERE name = $1 AND deleted = 0"
    );

    let stmt = build(MethodKind::Delete, &user_table());
    let err = stmt.render(&Invocation::new()).unwrap_err();
    assert!(matches!(err, MapperError::UnfilteredWrite { .. }));
}

#[test]
fn insert_uses_set_properties() {
    let stmt = build(MethodKind::Insert, &user_table());
    let out = stmt
        .render(&Invocation::new().entity(Record::new().with("name", "x").with("age", 2)))
        .unwrap();
    assert_eq!(out.sql, "INSERT INTO t_user (name, age) VALUES ($1, $2)");

    let err = stmt
        .render(&Invocation::new().entity(Record::new()))
        .unwrap_err();
    assert!(matches!(err, MapperError::EmptyInsert { .. }));
}

#[test]
fn insert_always_strategy_binds_null() {
    let table = TableMetadata::builder("t")
        .key(Column::new("id", "id"))
        .column(Column::new("note", "note").insert_strategy(FieldStrategy::Always))
        .build()
        .unwrap();
    let stmt = build(MethodKind::Insert, &table);
    let out = stmt
        .render(&Invocation::new().entity(Record::new().with("id", 1)))
        .unwrap();
    assert_eq!(out.sql, "INSERT INTO t (id, note) VALUES ($1, $2)");
    assert_eq!(out.values(), vec![&json!(1), &serde_json::Value::Null]);
}

#[test]
fn keyless_table_rejects_by_id_methods() {
    let table = TableMetadata::builder("t_log")
        .column(Column::new("msg", "msg"))
        .build()
        .unwrap();
    for kind in MethodKind::ALL.into_iter().filter(|k| k.requires_key()) {
        let err = kind
            .builder()
            .build(&table, &MapperConfig::default())
            .unwrap_err();
        assert!(matches!(err, MapperError::MissingKeyColumn { .. }), "{kind}");
        assert!(err.is_bootstrap());
    }
}

#[test]
fn version_method_requires_version_column() {
    let err = UpdateByIdWithVersion
        .build(&user_table(), &MapperConfig::default())
        .unwrap_err();
    assert!(matches!(
        err,
        MapperError::MissingVersionColumn { ref table, ref method }
            if table == "t_user" && method == "updateByIdWithVersion"
    ));
}

#[test]
fn question_style_is_applied() {
    let config = MapperConfig::default().with_placeholder_style(PlaceholderStyle::Question);
    let stmt = SelectById.build(&user_table(), &config).unwrap();
    let out = stmt.render(&Invocation::new().id(1)).unwrap();
    assert_eq!(out.sql, "SELECT id, name, age FROM t_user WHERE id = ?");
}

#[test]
fn rendering_is_deterministic() {
    let stmt = build(MethodKind::SelectList, &soft_table());
    let ew = ConditionWrapper::new()
        .entity(Record::new().with("name", "x"))
        .apply("OR id > 3")
        .unwrap();
    let inv = Invocation::new().wrapper(ew);
    assert_eq!(stmt.render(&inv).unwrap(), stmt.render(&inv).unwrap());
    assert_eq!(
        stmt.sql_template(),
        build(MethodKind::SelectList, &soft_table()).sql_template()
    );
}
