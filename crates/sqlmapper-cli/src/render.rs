use crate::cli::RenderArgs;
use crate::config::ProjectConfig;
use anyhow::Context;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use sqlmapper::{
    BoundSql, ConditionWrapper, Direction, Invocation, MethodKind, Record, RegistryBuilder,
};

/// `--wrapper` JSON.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WrapperInput {
    pub entity: Option<Map<String, Value>>,
    pub criteria: Vec<CriterionInput>,
    pub segment: Option<String>,
    pub first: Option<String>,
    pub comment: Option<String>,
    pub set: Option<String>,
    pub select: Option<String>,
    /// `"column"` or `"column DESC"`.
    pub order_by: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CriterionInput {
    pub column: String,
    pub op: String,
    #[serde(default)]
    pub value: Value,
}

impl WrapperInput {
    pub fn into_wrapper(self) -> anyhow::Result<ConditionWrapper> {
        let mut ew = ConditionWrapper::new();
        if let Some(entity) = self.entity {
            ew = ew.entity(Record::from(entity));
        }
        for c in self.criteria {
            ew = apply_criterion(ew, c)?;
        }
        if let Some(segment) = self.segment {
            ew = ew.apply(segment)?;
        }
        if let Some(v) = self.first {
            ew = ew.first(v);
        }
        if let Some(v) = self.comment {
            ew = ew.comment(v);
        }
        if let Some(v) = self.set {
            ew = ew.set_sql(v);
        }
        if let Some(v) = self.select {
            ew = ew.select(v);
        }
        for entry in &self.order_by {
            let mut parts = entry.split_whitespace();
            let column = parts.next().context("order_by entries must not be empty")?;
            let direction = match parts.next() {
                Some(d) if d.eq_ignore_ascii_case("desc") => Direction::Desc,
                _ => Direction::Asc,
            };
            ew = ew.order_by(column, direction)?;
        }
        Ok(ew)
    }
}

fn apply_criterion(ew: ConditionWrapper, c: CriterionInput) -> anyhow::Result<ConditionWrapper> {
    let column = c.column.as_str();
    let ew = match c.op.to_ascii_lowercase().as_str() {
        "eq" | "=" => ew.eq(column, c.value)?,
        "ne" | "<>" | "!=" => ew.ne(column, c.value)?,
        "gt" | ">" => ew.gt(column, c.value)?,
        "ge" | ">=" => ew.ge(column, c.value)?,
        "lt" | "<" => ew.lt(column, c.value)?,
        "le" | "<=" => ew.le(column, c.value)?,
        "like" => ew.like(column, c.value)?,
        "not_like" => ew.not_like(column, c.value)?,
        "is_null" => ew.is_null(column)?,
        "is_not_null" => ew.is_not_null(column)?,
        "in" => {
            let Value::Array(values) = c.value else {
                anyhow::bail!("criterion 'in' on '{column}' requires an array value");
            };
            ew.in_list(column, values)?
        }
        other => anyhow::bail!("unknown criterion op: {other}"),
    };
    Ok(ew)
}

fn parse_json(flag: &str, raw: &str) -> anyhow::Result<Value> {
    serde_json::from_str(raw).with_context(|| format!("{flag} is not valid JSON"))
}

/// Build the invocation described by the render flags.
pub fn invocation(args: &RenderArgs, version_property: Option<&str>) -> anyhow::Result<Invocation> {
    let mut inv = Invocation::new();
    if let Some(raw) = &args.entity {
        let value = parse_json("--entity", raw)?;
        inv = inv.entity(Record::from_serialize(&value)?);
    }
    if let Some(raw) = &args.wrapper {
        let input: WrapperInput = serde_json::from_str(raw).context("--wrapper is not valid JSON")?;
        inv = inv.wrapper(input.into_wrapper()?);
    }
    if let Some(raw) = &args.id {
        inv = inv.id(parse_json("--id", raw)?);
    }
    if let Some(raw) = &args.expected_version {
        let Some(property) = version_property else {
            anyhow::bail!("--expected-version given but table '{}' has no version column", args.table);
        };
        inv = inv.expected_version(property, parse_json("--expected-version", raw)?);
    }
    Ok(inv)
}

pub fn format_bound(bound: &BoundSql) -> anyhow::Result<String> {
    let params: Vec<Value> = bound
        .params
        .iter()
        .map(|p| json!({ "name": p.name, "value": p.value }))
        .collect();
    let params = serde_json::to_string_pretty(&params)?;
    Ok(format!("{}\n{params}", bound.sql))
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    let project = ProjectConfig::load(args.config.clone())?;
    let snapshot = RegistryBuilder::new(project.file.mapper.clone())
        .tables(project.tables()?)
        .build()?;

    let kind: MethodKind = args.method.parse()?;
    let statements = snapshot
        .get(&args.table)
        .with_context(|| format!("table '{}' is not defined in {}", args.table, args.config.display()))?;
    let stmt = statements.statement(kind)?;

    let version_property = statements.table().version().map(|c| c.property());
    let inv = invocation(&args, version_property)?;
    let bound = stmt
        .render(&inv)
        .with_context(|| format!("failed to render {}", stmt.id()))?;

    println!("{}", format_bound(&bound)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args() -> RenderArgs {
        RenderArgs {
            config: PathBuf::from("sqlmapper.toml"),
            table: "t_user".into(),
            method: "updateById".into(),
            entity: None,
            wrapper: None,
            id: None,
            expected_version: None,
        }
    }

    #[test]
    fn wrapper_input_builds_wrapper() {
        let raw = r#"{
            "entity": {"name": "x"},
            "criteria": [{"column": "age", "op": ">=", "value": 18}, {"column": "role", "op": "in", "value": ["a"]}],
            "segment": "OR vip = true",
            "order_by": ["age desc"]
        }"#;
        let input: WrapperInput = serde_json::from_str(raw).unwrap();
        let ew = input.into_wrapper().unwrap();
        assert_eq!(ew.criteria().len(), 2);
        assert!(ew.empty_of_normal());
        assert_eq!(ew.order_items()[0].to_string(), "age DESC");
        assert!(ew.entity_seed().unwrap().is_set("name"));
    }

    #[test]
    fn bad_criteria_are_rejected() {
        let input: WrapperInput =
            serde_json::from_str(r#"{"criteria": [{"column": "a", "op": "between"}]}"#).unwrap();
        assert!(input.into_wrapper().is_err());
        let input: WrapperInput =
            serde_json::from_str(r#"{"criteria": [{"column": "a", "op": "in", "value": 1}]}"#)
                .unwrap();
        assert!(input.into_wrapper().is_err());
    }

    #[test]
    fn expected_version_needs_version_column() {
        let mut a = args();
        a.entity = Some(r#"{"id": 1}"#.into());
        a.expected_version = Some("3".into());
        assert!(invocation(&a, None).is_err());
        let inv = invocation(&a, Some("version")).unwrap();
        assert_eq!(
            inv.entity_value("version"),
            Some(&json!(4))
        );
    }

    #[test]
    fn invalid_json_is_reported_with_flag() {
        let mut a = args();
        a.id = Some("{".into());
        let err = invocation(&a, None).unwrap_err();
        assert!(err.to_string().contains("--id"));
    }
}
