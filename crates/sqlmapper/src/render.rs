//! Per-call rendering of statement templates.
//!
//! [`Invocation`] carries the call arguments; rendering a template against it
//! yields [`BoundSql`]: final SQL text with placeholders in the configured
//! [`PlaceholderStyle`] and the bound values in placeholder order.

use crate::config::PlaceholderStyle;
use crate::error::{MapperError, MapperResult};
use crate::metadata::{FieldStrategy, OrderItem};
use crate::node::{Guard, Predicate, SqlNode};
use crate::param::{BoundParam, ParamMeta, ParamSource, RawSlot};
use crate::record::Record;
use crate::wrapper::{ConditionWrapper, Criterion, Segment, SegmentShape};
use serde_json::Value;

/// Arguments of one statement call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Invocation {
    entity: Option<Record>,
    wrapper: Option<ConditionWrapper>,
    id: Option<Value>,
    expected_version: Option<Value>,
    /// Version property and its advanced value, applied when the payload leaves it unset.
    next_version: Option<(String, Value)>,
}

impl Invocation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entity payload (`et`) for insert/update.
    pub fn entity(mut self, entity: Record) -> Self {
        self.entity = Some(entity);
        self
    }

    pub fn wrapper(mut self, wrapper: ConditionWrapper) -> Self {
        self.wrapper = Some(wrapper);
        self
    }

    /// Id argument of select/delete by id.
    pub fn id(mut self, id: impl Into<Value>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Pre-update version for the optimistic-lock guard.
    ///
    /// `version_property` names the payload's version property. When the payload
    /// does not set it and the expected version is an integer, the payload's
    /// version reads as `expected + 1`. The payload may be supplied before or
    /// after this call.
    pub fn expected_version(mut self, version_property: &str, expected: impl Into<Value>) -> Self {
        let expected = expected.into();
        self.next_version = next_version(&expected).map(|next| (version_property.to_string(), next));
        self.expected_version = Some(expected);
        self
    }

    pub fn entity_payload(&self) -> Option<&Record> {
        self.entity.as_ref()
    }

    /// A payload property as statements see it, including an advanced version.
    pub fn entity_value(&self, property: &str) -> Option<&Value> {
        self.entity_container(property).flatten()
    }

    fn entity_container(&self, property: &str) -> Option<Option<&Value>> {
        let advanced = self
            .next_version
            .as_ref()
            .filter(|(p, _)| p == property)
            .map(|(_, v)| v);
        match (&self.entity, advanced) {
            (Some(e), _) => Some(e.get(property).or(advanced)),
            (None, Some(v)) => Some(Some(v)),
            (None, None) if self.next_version.is_some() => Some(None),
            (None, None) => None,
        }
    }

    pub fn condition(&self) -> Option<&ConditionWrapper> {
        self.wrapper.as_ref()
    }

    fn raw(&self, slot: RawSlot) -> Option<&str> {
        let ew = self.wrapper.as_ref()?;
        match slot {
            RawSlot::SqlSegment => ew.sql_segment().map(Segment::text),
            RawSlot::SqlFirst => ew.sql_first(),
            RawSlot::SqlComment => ew.sql_comment(),
            RawSlot::SqlSet => ew.sql_set(),
            RawSlot::SqlSelect => ew.sql_select(),
        }
    }

    /// `Some(container)` when the record the source reads from exists.
    fn container(&self, source: &ParamSource) -> Option<Option<&Value>> {
        match source {
            ParamSource::Entity(p) => self.entity_container(p),
            ParamSource::Seed(p) => self
                .wrapper
                .as_ref()
                .and_then(ConditionWrapper::entity_seed)
                .map(|e| e.get(p)),
            ParamSource::Id => Some(self.id.as_ref().filter(|v| !v.is_null())),
            ParamSource::VersionOriginal => {
                Some(self.expected_version.as_ref().filter(|v| !v.is_null()))
            }
        }
    }

    fn value(&self, source: &ParamSource) -> Option<&Value> {
        self.container(source).flatten()
    }
}

/// Integer versions advance by one; other types are left to the caller.
pub fn next_version(current: &Value) -> Option<Value> {
    if let Some(next) = current.as_i64().and_then(|i| i.checked_add(1)) {
        return Some(Value::from(next));
    }
    current.as_u64().and_then(|u| u.checked_add(1)).map(Value::from)
}

/// One bound value in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundValue {
    pub name: String,
    pub value: Value,
    pub meta: ParamMeta,
}

/// Rendered SQL plus bound values.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundSql {
    pub sql: String,
    pub params: Vec<BoundValue>,
}

impl BoundSql {
    pub fn values(&self) -> Vec<&Value> {
        self.params.iter().map(|p| &p.value).collect()
    }
}

/// How a rendered WHERE item attaches to its predecessor.
enum Emitted<'a> {
    /// Needs `AND` before it.
    Joined(String),
    /// Starts with its own connective.
    Led(&'a Segment),
}

/// Outcome flags the statement builders inspect after rendering.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct RenderFlags {
    pub(crate) set_rendered: Option<bool>,
    pub(crate) where_rendered: bool,
    pub(crate) empty_list: bool,
}

pub(crate) struct Renderer<'a> {
    statement: &'a str,
    style: PlaceholderStyle,
    inv: &'a Invocation,
    params: Vec<BoundValue>,
    criteria_seq: usize,
    pub(crate) flags: RenderFlags,
}

impl<'a> Renderer<'a> {
    pub(crate) fn new(statement: &'a str, style: PlaceholderStyle, inv: &'a Invocation) -> Self {
        Self {
            statement,
            style,
            inv,
            params: Vec::new(),
            criteria_seq: 0,
            flags: RenderFlags::default(),
        }
    }

    pub(crate) fn finish(self, sql: String) -> BoundSql {
        BoundSql {
            sql,
            params: self.params,
        }
    }

    fn test(&self, guard: &Guard) -> bool {
        match guard {
            Guard::WrapperPresent => self.inv.wrapper.is_some(),
            Guard::Bound { source, strategy } => match strategy {
                FieldStrategy::NotNull => self.inv.value(source).is_some(),
                FieldStrategy::NotEmpty => self
                    .inv
                    .value(source)
                    .is_some_and(|v| v.as_str() != Some("")),
                FieldStrategy::Always => self.inv.container(source).is_some(),
                FieldStrategy::Never => false,
            },
            Guard::Raw(slot) => self.inv.raw(*slot).is_some(),
            Guard::VersionOriginal => self.inv.value(&ParamSource::VersionOriginal).is_some(),
        }
    }

    fn placeholder(&mut self, name: String, display: String, value: Value, meta: ParamMeta) -> String {
        self.params.push(BoundValue {
            name,
            value,
            meta,
        });
        match self.style {
            PlaceholderStyle::Dollar => format!("${}", self.params.len()),
            PlaceholderStyle::Question => "?".to_string(),
            PlaceholderStyle::Named => display,
        }
    }

    fn bind(&mut self, param: &BoundParam, nullable: bool) -> MapperResult<String> {
        let value = match self.inv.value(&param.source) {
            Some(v) => v.clone(),
            None if nullable && self.inv.container(&param.source).is_some() => Value::Null,
            None => {
                return Err(MapperError::MissingBinding {
                    statement: self.statement.to_string(),
                    name: param.name(),
                });
            }
        };
        Ok(self.placeholder(param.name(), param.to_string(), value, param.meta.clone()))
    }

    fn bind_criterion_value(&mut self, value: &Value) -> String {
        self.criteria_seq += 1;
        let name = format!("ew.criteria.p{}", self.criteria_seq);
        let display = format!("#{{{name}}}");
        self.placeholder(name, display, value.clone(), ParamMeta::default())
    }

    fn criterion(&mut self, criterion: &Criterion) -> String {
        match criterion {
            Criterion::Compare { column, op, value } => {
                let ph = self.bind_criterion_value(value);
                format!("{column} {} {ph}", op.as_sql())
            }
            Criterion::IsNull(column) => format!("{column} IS NULL"),
            Criterion::IsNotNull(column) => format!("{column} IS NOT NULL"),
            Criterion::In { values, .. } if values.is_empty() => "1=0".to_string(),
            Criterion::In { column, values } => {
                let phs: Vec<String> = values
                    .iter()
                    .map(|v| self.bind_criterion_value(v))
                    .collect();
                format!("{column} IN ({})", phs.join(", "))
            }
        }
    }

    fn joined(&mut self, nodes: &[SqlNode], sep: &str) -> MapperResult<String> {
        let mut parts = Vec::with_capacity(nodes.len());
        for node in nodes {
            let s = self.render(node)?;
            if !s.is_empty() {
                parts.push(s);
            }
        }
        Ok(parts.join(sep))
    }

    fn render_where(&mut self, preds: &[Predicate]) -> MapperResult<String> {
        let inv = self.inv;
        let mut items: Vec<Emitted<'a>> = Vec::new();
        for pred in preds {
            match pred {
                Predicate::Node(node) => {
                    let s = self.render(node)?;
                    if !s.is_empty() {
                        items.push(Emitted::Joined(s));
                    }
                }
                Predicate::Criteria => {
                    if let Some(ew) = inv.wrapper.as_ref() {
                        for c in ew.criteria() {
                            let s = self.criterion(c);
                            items.push(Emitted::Joined(s));
                        }
                    }
                }
                Predicate::Segment => {
                    let segment = inv.wrapper.as_ref().and_then(ConditionWrapper::sql_segment);
                    if let Some(segment) = segment {
                        match segment.shape() {
                            SegmentShape::Normal => {
                                items.push(Emitted::Joined(segment.text().trim().to_string()));
                            }
                            SegmentShape::Connective(_) => items.push(Emitted::Led(segment)),
                            SegmentShape::Tail => {}
                        }
                    }
                }
            }
        }

        if items.is_empty() {
            return Ok(String::new());
        }
        self.flags.where_rendered = true;

        let mut out = String::from("WHERE ");
        for (i, item) in items.iter().enumerate() {
            match (i, item) {
                (0, Emitted::Joined(s)) => out.push_str(s),
                (0, Emitted::Led(segment)) => out.push_str(segment.without_connective()),
                (_, Emitted::Joined(s)) => {
                    out.push_str(" AND ");
                    out.push_str(s);
                }
                (_, Emitted::Led(segment)) => {
                    out.push(' ');
                    out.push_str(segment.text().trim());
                }
            }
        }
        Ok(out)
    }

    pub(crate) fn render(&mut self, node: &SqlNode) -> MapperResult<String> {
        match node {
            SqlNode::Text(s) => Ok(s.clone()),
            SqlNode::Bind { param, nullable } => self.bind(param, *nullable),
            SqlNode::Raw(slot) => Ok(self.inv.raw(*slot).unwrap_or_default().to_string()),
            SqlNode::Seq(nodes) => self.joined(nodes, " "),
            SqlNode::Concat(nodes) => self.joined(nodes, ""),
            SqlNode::List(nodes) => {
                let body = self.joined(nodes, ", ")?;
                self.flags.empty_list |= body.is_empty();
                Ok(body)
            }
            SqlNode::If(guard, node) => {
                if self.test(guard) {
                    self.render(node)
                } else {
                    Ok(String::new())
                }
            }
            SqlNode::Choose {
                when,
                then,
                otherwise,
            } => {
                if self.test(when) {
                    self.render(then)
                } else {
                    self.render(otherwise)
                }
            }
            SqlNode::Where(preds) => self.render_where(preds),
            SqlNode::Set(nodes) => {
                let body = self.joined(nodes, ", ")?;
                self.flags.set_rendered = Some(!body.is_empty());
                if body.is_empty() {
                    Ok(String::new())
                } else {
                    Ok(format!("SET {body}"))
                }
            }
            SqlNode::SegmentTail => Ok(self
                .tail()
                .map(|s| s.text().trim().to_string())
                .unwrap_or_default()),
            SqlNode::OrderBy { fallback } => Ok(self.render_order_by(fallback)),
        }
    }

    fn tail(&self) -> Option<&'a Segment> {
        let inv = self.inv;
        inv.wrapper
            .as_ref()
            .and_then(ConditionWrapper::sql_segment)
            .filter(|s| s.shape() == SegmentShape::Tail)
    }

    /// ORDER BY merged with the tail segment.
    ///
    /// Wrapper order items extend a tail's own ORDER BY; the fallback applies only
    /// when neither orders. Generated ordering goes before LIMIT/OFFSET/FETCH.
    fn render_order_by(&self, fallback: &[OrderItem]) -> String {
        let tail = self.tail();
        let own = tail.is_some_and(Segment::orders);
        let explicit = self
            .inv
            .wrapper
            .as_ref()
            .map(ConditionWrapper::order_items)
            .unwrap_or_default();
        let items: &[OrderItem] = match (explicit.is_empty(), own) {
            (false, _) => explicit,
            (true, true) => &[],
            (true, false) => fallback,
        };
        let items: Vec<String> = items.iter().map(ToString::to_string).collect();
        let (head, rest) = tail.map(Segment::split_tail).unwrap_or_default();

        let mut out = head.to_string();
        if !items.is_empty() {
            if own {
                out.push_str(", ");
            } else {
                if !out.is_empty() {
                    out.push(' ');
                }
                out.push_str("ORDER BY ");
            }
            out.push_str(&items.join(", "));
        }
        if !rest.is_empty() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(rest);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seed_eq(prop: &str) -> Predicate {
        let source = ParamSource::Seed(prop.into());
        Predicate::Node(SqlNode::when(
            Guard::Bound {
                source: source.clone(),
                strategy: FieldStrategy::NotNull,
            },
            SqlNode::Concat(vec![
                SqlNode::text(format!("{prop} = ")),
                SqlNode::bind(BoundParam::new(source, ParamMeta::default())),
            ]),
        ))
    }

    fn render(node: &SqlNode, inv: &Invocation) -> MapperResult<BoundSql> {
        let mut r = Renderer::new("t.test", PlaceholderStyle::Dollar, inv);
        let sql = r.render(node)?;
        Ok(r.finish(sql))
    }

    #[test]
    fn where_omitted_when_nothing_renders() {
        let node = SqlNode::Where(vec![seed_eq("name"), Predicate::Segment]);
        let out = render(&node, &Invocation::new()).unwrap();
        assert_eq!(out.sql, "");
        assert!(out.params.is_empty());
    }

    #[test]
    fn where_strips_leading_connective() {
        let node = SqlNode::Where(vec![seed_eq("name"), Predicate::Segment]);
        let ew = ConditionWrapper::new().apply("OR age > 10").unwrap();
        let out = render(&node, &Invocation::new().wrapper(ew)).unwrap();
        assert_eq!(out.sql, "WHERE age > 10");
    }

    #[test]
    fn where_keeps_connective_after_predicate() {
        let node = SqlNode::Where(vec![seed_eq("name"), Predicate::Segment]);
        let ew = ConditionWrapper::new()
            .entity(Record::new().with("name", "x"))
            .apply("OR age > 10")
            .unwrap();
        let out = render(&node, &Invocation::new().wrapper(ew)).unwrap();
        assert_eq!(out.sql, "WHERE name = $1 OR age > 10");
        assert_eq!(out.values(), vec![&json!("x")]);
    }

    #[test]
    fn criteria_are_bound() {
        let node = SqlNode::Where(vec![Predicate::Criteria]);
        let ew = ConditionWrapper::new()
            .ge("age", 18)
            .unwrap()
            .in_list("role", vec!["a", "b"])
            .unwrap()
            .in_list("tag", Vec::<i32>::new())
            .unwrap();
        let out = render(&node, &Invocation::new().wrapper(ew)).unwrap();
        assert_eq!(out.sql, "WHERE age >= $1 AND role IN ($2, $3) AND 1=0");
        assert_eq!(out.params[1].name, "ew.criteria.p2");
    }

    #[test]
    fn strict_bind_requires_value() {
        let node = SqlNode::bind(BoundParam::new(ParamSource::Id, ParamMeta::default()));
        let err = render(&node, &Invocation::new()).unwrap_err();
        assert!(matches!(err, MapperError::MissingBinding { ref name, .. } if name == "id"));
    }

    #[test]
    fn nullable_bind_binds_null() {
        let node = SqlNode::Bind {
            param: BoundParam::new(ParamSource::Entity("age".into()), ParamMeta::default()),
            nullable: true,
        };
        let out = render(&node, &Invocation::new().entity(Record::new())).unwrap();
        assert_eq!(out.values(), vec![&Value::Null]);
    }

    #[test]
    fn order_by_prefers_wrapper() {
        let node = SqlNode::OrderBy {
            fallback: vec![OrderItem::asc("id").unwrap()],
        };
        assert_eq!(render(&node, &Invocation::new()).unwrap().sql, "ORDER BY id ASC");
        let ew = ConditionWrapper::new().order_by_desc("age").unwrap();
        let out = render(&node, &Invocation::new().wrapper(ew)).unwrap();
        assert_eq!(out.sql, "ORDER BY age DESC");
    }

    #[test]
    fn order_by_merges_tail_segment() {
        let node = SqlNode::OrderBy {
            fallback: vec![OrderItem::asc("id").unwrap()],
        };
        let with_tail = |tail: &str| {
            let ew = ConditionWrapper::new().apply(tail).unwrap();
            render(&node, &Invocation::new().wrapper(ew)).unwrap().sql
        };
        assert_eq!(with_tail("ORDER BY name DESC"), "ORDER BY name DESC");
        assert_eq!(with_tail("LIMIT 10"), "ORDER BY id ASC LIMIT 10");
        assert_eq!(
            with_tail("GROUP BY id HAVING count(*) > 1"),
            "GROUP BY id HAVING count(*) > 1 ORDER BY id ASC"
        );
        assert_eq!(
            with_tail("ORDER BY name LIMIT 1"),
            "ORDER BY name LIMIT 1"
        );

        let ew = ConditionWrapper::new()
            .order_by_desc("age")
            .unwrap()
            .apply("ORDER BY name LIMIT 1")
            .unwrap();
        let out = render(&node, &Invocation::new().wrapper(ew)).unwrap();
        assert_eq!(out.sql, "ORDER BY name, age DESC LIMIT 1");
    }

    #[test]
    fn question_and_named_styles() {
        let node = SqlNode::Concat(vec![
            SqlNode::text("id = "),
            SqlNode::bind(BoundParam::new(
                ParamSource::Id,
                ParamMeta {
                    jdbc_type: Some("BIGINT".into()),
                    ..ParamMeta::default()
                },
            )),
        ]);
        let inv = Invocation::new().id(7);
        let mut r = Renderer::new("t", PlaceholderStyle::Question, &inv);
        assert_eq!(r.render(&node).unwrap(), "id = ?");
        let mut r = Renderer::new("t", PlaceholderStyle::Named, &inv);
        assert_eq!(r.render(&node).unwrap(), "id = #{id,jdbcType=BIGINT}");
    }

    #[test]
    fn expected_version_advances_payload() {
        let inv = Invocation::new()
            .entity(Record::new().with("name", "x"))
            .expected_version("version", 3);
        assert_eq!(inv.entity_value("version"), Some(&json!(4)));
        assert_eq!(inv.entity_payload().unwrap().get("version"), None);
        assert_eq!(inv.value(&ParamSource::VersionOriginal), Some(&json!(3)));

        let inv = Invocation::new()
            .entity(Record::new().with("version", 10))
            .expected_version("version", 3);
        assert_eq!(inv.entity_value("version"), Some(&json!(10)));
    }

    #[test]
    fn expected_version_survives_later_payload() {
        let inv = Invocation::new()
            .expected_version("version", 3)
            .entity(Record::new().with("name", "x"));
        assert_eq!(inv.entity_value("version"), Some(&json!(4)));
        assert_eq!(inv.entity_value("name"), Some(&json!("x")));

        let source = ParamSource::Entity("version".into());
        assert_eq!(inv.value(&source), Some(&json!(4)));
        let inv = Invocation::new().expected_version("version", 3);
        assert_eq!(inv.value(&source), Some(&json!(4)));
        assert_eq!(inv.container(&ParamSource::Entity("name".into())), Some(None));
    }

    #[test]
    fn next_version_only_for_integers() {
        assert_eq!(next_version(&json!(1)), Some(json!(2)));
        assert_eq!(next_version(&json!("2024-01-01")), None);
        assert_eq!(next_version(&json!(i64::MAX)), Some(json!(i64::MAX as u64 + 1)));
    }
}
