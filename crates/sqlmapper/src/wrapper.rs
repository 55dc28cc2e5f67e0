//! Per-call condition wrapper.
//!
//! A [`ConditionWrapper`] describes what one call adds on top of an injected
//! statement: an entity seed (equality predicates on its set properties),
//! structured criteria (bound values), a raw predicate segment, raw
//! first/comment/set/select texts and an explicit order.
//!
//! Structured input (seed, criteria, order columns) is always bound or
//! validated. The raw texts are spliced verbatim and are the caller's
//! responsibility.
//!
//! # Example
//!
//! ```rust
//! use sqlmapper::wrapper::{ConditionWrapper, SegmentShape};
//!
//! let ew = ConditionWrapper::new()
//!     .eq("status", "active").unwrap()
//!     .apply("OR age > 10").unwrap()
//!     .order_by_desc("created_at").unwrap();
//!
//! assert!(ew.empty_of_normal());
//! assert!(ew.non_empty_of_where());
//! ```

use crate::error::{MapperError, MapperResult};
use crate::ident::Ident;
use crate::metadata::{Direction, OrderItem};
use crate::record::Record;
use serde_json::Value;

/// Boolean connective leading a raw segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

impl Connective {
    pub fn as_sql(self) -> &'static str {
        match self {
            Connective::And => "AND",
            Connective::Or => "OR",
        }
    }
}

/// Classification of a raw segment.
///
/// Replaces the emptyOfNormal/nonEmptyOfNormal and emptyOfWhere/nonEmptyOfWhere
/// flag pairs with one tagged value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentShape {
    /// A plain predicate: joined to preceding predicates with AND.
    Normal,
    /// Starts with AND/OR: appended as-is.
    Connective(Connective),
    /// No predicate, only trailing clauses (GROUP BY, HAVING, ORDER BY, LIMIT):
    /// emitted after the WHERE clause.
    Tail,
}

/// A classified raw predicate segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    text: String,
    shape: SegmentShape,
}

impl Segment {
    /// Classify `text` by its leading token.
    pub fn classify(text: impl Into<String>) -> MapperResult<Self> {
        let text = text.into();
        let shape = classify(&text)?;
        Ok(Self { text, shape })
    }

    /// Build a segment with a caller-declared shape; the shape must agree with the text.
    pub fn with_shape(text: impl Into<String>, shape: SegmentShape) -> MapperResult<Self> {
        let segment = Self::classify(text)?;
        if segment.shape != shape {
            return Err(MapperError::invalid_wrapper(format!(
                "segment '{}' is {:?}, declared {:?}",
                segment.text, segment.shape, shape
            )));
        }
        Ok(segment)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn shape(&self) -> SegmentShape {
        self.shape
    }

    /// The text with a leading connective removed (unchanged for other shapes).
    pub fn without_connective(&self) -> &str {
        match self.shape {
            SegmentShape::Connective(c) => self.text.trim_start()[c.as_sql().len()..].trim_start(),
            SegmentShape::Normal | SegmentShape::Tail => self.text.trim(),
        }
    }

    /// Whether a tail segment carries its own ORDER BY.
    pub(crate) fn orders(&self) -> bool {
        self.shape == SegmentShape::Tail
            && word_spans(&self.text).windows(2).any(|w| {
                w[0].1.eq_ignore_ascii_case("ORDER") && w[1].1.eq_ignore_ascii_case("BY")
            })
    }

    /// The trimmed tail split before its first LIMIT, OFFSET or FETCH.
    pub(crate) fn split_tail(&self) -> (&str, &str) {
        let text = self.text.trim();
        let limit = word_spans(text).into_iter().find(|(_, w)| {
            ["LIMIT", "OFFSET", "FETCH"]
                .iter()
                .any(|k| w.eq_ignore_ascii_case(k))
        });
        match limit {
            Some((at, _)) => (text[..at].trim_end(), &text[at..]),
            None => (text, ""),
        }
    }
}

/// Byte offset and text of each word outside single-quoted literals.
fn word_spans(text: &str) -> Vec<(usize, &str)> {
    let mut spans = Vec::new();
    let mut start = None;
    let mut quoted = false;
    for (i, c) in text.char_indices() {
        let in_word = !quoted && (c.is_ascii_alphanumeric() || c == '_');
        if in_word {
            start.get_or_insert(i);
            continue;
        }
        if let Some(s) = start.take() {
            spans.push((s, &text[s..i]));
        }
        if c == '\'' {
            quoted = !quoted;
        }
    }
    if let Some(s) = start {
        spans.push((s, &text[s..]));
    }
    spans
}

/// Split the leading alphabetic word off `s`.
fn leading_word(s: &str) -> (&str, &str) {
    let end = s
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(s.len());
    s.split_at(end)
}

fn starts_word(rest: &str) -> bool {
    rest.chars()
        .next()
        .is_some_and(|c| c.is_whitespace() || c == '(')
}

fn classify(text: &str) -> MapperResult<SegmentShape> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(MapperError::invalid_wrapper("segment is blank"));
    }
    let (word, rest) = leading_word(trimmed);
    let upper = word.to_ascii_uppercase();
    match upper.as_str() {
        "AND" | "OR" if starts_word(rest) || rest.is_empty() => {
            if rest.trim().is_empty() {
                return Err(MapperError::invalid_wrapper(format!(
                    "segment '{trimmed}' is a bare connective"
                )));
            }
            let c = if upper == "AND" {
                Connective::And
            } else {
                Connective::Or
            };
            Ok(SegmentShape::Connective(c))
        }
        "GROUP" | "ORDER" if starts_word(rest) => {
            let (next, _) = leading_word(rest.trim_start());
            if next.eq_ignore_ascii_case("BY") {
                Ok(SegmentShape::Tail)
            } else {
                Ok(SegmentShape::Normal)
            }
        }
        "HAVING" | "LIMIT" if starts_word(rest) => Ok(SegmentShape::Tail),
        _ => Ok(SegmentShape::Normal),
    }
}

/// Comparison operator of a structured criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Like,
    NotLike,
}

impl CompareOp {
    pub fn as_sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Like => "LIKE",
            CompareOp::NotLike => "NOT LIKE",
        }
    }
}

/// A structured predicate whose values are always bound.
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    Compare {
        column: Ident,
        op: CompareOp,
        value: Value,
    },
    IsNull(Ident),
    IsNotNull(Ident),
    In {
        column: Ident,
        values: Vec<Value>,
    },
}

/// Per-call description of filters, raw fragments and ordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionWrapper {
    entity: Option<Record>,
    criteria: Vec<Criterion>,
    segment: Option<Segment>,
    sql_first: Option<String>,
    sql_comment: Option<String>,
    sql_set: Option<String>,
    sql_select: Option<String>,
    order_by: Vec<OrderItem>,
}

impl ConditionWrapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed equality predicates from the entity's set properties.
    pub fn entity(mut self, entity: Record) -> Self {
        self.entity = Some(entity);
        self
    }

    fn compare(mut self, column: &str, op: CompareOp, value: impl Into<Value>) -> MapperResult<Self> {
        self.criteria.push(Criterion::Compare {
            column: Ident::parse(column)?,
            op,
            value: value.into(),
        });
        Ok(self)
    }

    pub fn eq(self, column: &str, value: impl Into<Value>) -> MapperResult<Self> {
        self.compare(column, CompareOp::Eq, value)
    }

    pub fn ne(self, column: &str, value: impl Into<Value>) -> MapperResult<Self> {
        self.compare(column, CompareOp::Ne, value)
    }

    pub fn gt(self, column: &str, value: impl Into<Value>) -> MapperResult<Self> {
        self.compare(column, CompareOp::Gt, value)
    }

    pub fn ge(self, column: &str, value: impl Into<Value>) -> MapperResult<Self> {
        self.compare(column, CompareOp::Ge, value)
    }

    pub fn lt(self, column: &str, value: impl Into<Value>) -> MapperResult<Self> {
        self.compare(column, CompareOp::Lt, value)
    }

    pub fn le(self, column: &str, value: impl Into<Value>) -> MapperResult<Self> {
        self.compare(column, CompareOp::Le, value)
    }

    pub fn like(self, column: &str, value: impl Into<Value>) -> MapperResult<Self> {
        self.compare(column, CompareOp::Like, value)
    }

    pub fn not_like(self, column: &str, value: impl Into<Value>) -> MapperResult<Self> {
        self.compare(column, CompareOp::NotLike, value)
    }

    pub fn is_null(mut self, column: &str) -> MapperResult<Self> {
        self.criteria.push(Criterion::IsNull(Ident::parse(column)?));
        Ok(self)
    }

    pub fn is_not_null(mut self, column: &str) -> MapperResult<Self> {
        self.criteria.push(Criterion::IsNotNull(Ident::parse(column)?));
        Ok(self)
    }

    /// `column IN (...)`; an empty list matches nothing.
    pub fn in_list<T: Into<Value>>(mut self, column: &str, values: Vec<T>) -> MapperResult<Self> {
        self.criteria.push(Criterion::In {
            column: Ident::parse(column)?,
            values: values.into_iter().map(Into::into).collect(),
        });
        Ok(self)
    }

    /// Set the raw predicate segment (replaces any previous one).
    ///
    /// The text is spliced verbatim; never pass user input here.
    pub fn apply(mut self, segment: impl Into<String>) -> MapperResult<Self> {
        self.segment = Some(Segment::classify(segment)?);
        Ok(self)
    }

    /// Set an already classified segment.
    pub fn segment(mut self, segment: Segment) -> Self {
        self.segment = Some(segment);
        self
    }

    /// Raw text emitted before the statement (e.g. a hint or CTE).
    pub fn first(mut self, sql: impl Into<String>) -> Self {
        self.sql_first = Some(sql.into());
        self
    }

    /// Raw text emitted after the statement (e.g. a comment or `FOR UPDATE`).
    pub fn comment(mut self, sql: impl Into<String>) -> Self {
        self.sql_comment = Some(sql.into());
        self
    }

    /// Raw SET assignments appended to update statements.
    pub fn set_sql(mut self, sql: impl Into<String>) -> Self {
        self.sql_set = Some(sql.into());
        self
    }

    /// Raw projection replacing the default column list (or `*` in COUNT).
    pub fn select(mut self, sql: impl Into<String>) -> Self {
        self.sql_select = Some(sql.into());
        self
    }

    pub fn order_by(mut self, column: &str, direction: Direction) -> MapperResult<Self> {
        self.order_by.push(OrderItem::new(column, direction)?);
        Ok(self)
    }

    pub fn order_by_asc(self, column: &str) -> MapperResult<Self> {
        self.order_by(column, Direction::Asc)
    }

    pub fn order_by_desc(self, column: &str) -> MapperResult<Self> {
        self.order_by(column, Direction::Desc)
    }

    pub fn entity_seed(&self) -> Option<&Record> {
        self.entity.as_ref()
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn sql_segment(&self) -> Option<&Segment> {
        self.segment.as_ref()
    }

    pub fn sql_first(&self) -> Option<&str> {
        self.sql_first.as_deref()
    }

    pub fn sql_comment(&self) -> Option<&str> {
        self.sql_comment.as_deref()
    }

    pub fn sql_set(&self) -> Option<&str> {
        self.sql_set.as_deref()
    }

    pub fn sql_select(&self) -> Option<&str> {
        self.sql_select.as_deref()
    }

    pub fn order_items(&self) -> &[OrderItem] {
        &self.order_by
    }

    pub fn non_empty_of_entity(&self) -> bool {
        self.entity.as_ref().is_some_and(|e| !e.is_blank())
    }

    pub fn non_empty_of_normal(&self) -> bool {
        matches!(self.shape(), Some(SegmentShape::Normal))
    }

    pub fn empty_of_normal(&self) -> bool {
        matches!(
            self.shape(),
            Some(SegmentShape::Connective(_) | SegmentShape::Tail)
        )
    }

    pub fn non_empty_of_where(&self) -> bool {
        matches!(
            self.shape(),
            Some(SegmentShape::Normal | SegmentShape::Connective(_))
        )
    }

    pub fn empty_of_where(&self) -> bool {
        matches!(self.shape(), Some(SegmentShape::Tail))
    }

    fn shape(&self) -> Option<SegmentShape> {
        self.segment.as_ref().map(Segment::shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(text: &str) -> SegmentShape {
        Segment::classify(text).unwrap().shape()
    }

    #[test]
    fn classifies_connectives() {
        assert_eq!(shape("OR age > 10"), SegmentShape::Connective(Connective::Or));
        assert_eq!(shape("  and age > 10"), SegmentShape::Connective(Connective::And));
        assert_eq!(shape("AND(a = 1 OR b = 2)"), SegmentShape::Connective(Connective::And));
        assert_eq!(shape("age > 10"), SegmentShape::Normal);
    }

    #[test]
    fn connective_prefix_must_be_a_whole_word() {
        assert_eq!(shape("ORDER_ID = 5"), SegmentShape::Normal);
        assert_eq!(shape("order_count > 1"), SegmentShape::Normal);
        assert_eq!(shape("android = 1"), SegmentShape::Normal);
        assert_eq!(shape("OR_flag = 1"), SegmentShape::Normal);
    }

    #[test]
    fn classifies_tails() {
        assert_eq!(shape("ORDER BY id DESC"), SegmentShape::Tail);
        assert_eq!(shape("group by age"), SegmentShape::Tail);
        assert_eq!(shape("HAVING count(*) > 1"), SegmentShape::Tail);
        assert_eq!(shape("LIMIT 10"), SegmentShape::Tail);
        assert_eq!(shape("order_by_me = 1"), SegmentShape::Normal);
    }

    #[test]
    fn tail_ordering_and_limit_split() {
        let tail = Segment::classify("GROUP BY age ORDER BY age DESC LIMIT 5").unwrap();
        assert!(tail.orders());
        assert_eq!(tail.split_tail(), ("GROUP BY age ORDER BY age DESC", "LIMIT 5"));

        let tail = Segment::classify(" limit 10 offset 20 ").unwrap();
        assert!(!tail.orders());
        assert_eq!(tail.split_tail(), ("", "limit 10 offset 20"));

        let tail = Segment::classify("HAVING max(note) <> 'order by limit'").unwrap();
        assert!(!tail.orders());
        assert_eq!(tail.split_tail().1, "");

        assert!(!Segment::classify("sort_order = 1").unwrap().orders());
    }

    #[test]
    fn ambiguous_segments_are_flagged() {
        assert!(Segment::classify("").unwrap_err().is_invalid_wrapper());
        assert!(Segment::classify("   ").unwrap_err().is_invalid_wrapper());
        assert!(Segment::classify("AND").unwrap_err().is_invalid_wrapper());
        assert!(Segment::classify(" or  ").unwrap_err().is_invalid_wrapper());
    }

    #[test]
    fn declared_shape_must_match() {
        assert!(Segment::with_shape("age > 1", SegmentShape::Normal).is_ok());
        let err = Segment::with_shape("OR age > 1", SegmentShape::Normal).unwrap_err();
        assert!(err.is_invalid_wrapper());
    }

    #[test]
    fn strips_connective() {
        let segment = Segment::classify(" OR age > 10").unwrap();
        assert_eq!(segment.without_connective(), "age > 10");
        let segment = Segment::classify("age > 10 ").unwrap();
        assert_eq!(segment.without_connective(), "age > 10");
    }

    #[test]
    fn flag_pairs_are_exclusive() {
        let cases = ["age > 1", "OR age > 1", "GROUP BY age"];
        for text in cases {
            let ew = ConditionWrapper::new().apply(text).unwrap();
            assert_ne!(ew.empty_of_normal(), ew.non_empty_of_normal(), "{text}");
            assert_ne!(ew.empty_of_where(), ew.non_empty_of_where(), "{text}");
        }
        let ew = ConditionWrapper::new();
        assert!(!ew.empty_of_normal() && !ew.non_empty_of_normal());
    }

    #[test]
    fn order_columns_are_validated() {
        assert!(ConditionWrapper::new().order_by_asc("age; drop").is_err());
        let ew = ConditionWrapper::new().order_by_desc("age").unwrap();
        assert_eq!(ew.order_items()[0].to_string(), "age DESC");
    }

    #[test]
    fn criteria_columns_are_validated() {
        assert!(ConditionWrapper::new().eq("1=1 OR a", 1).is_err());
        let ew = ConditionWrapper::new().eq("a", 1).unwrap().is_null("b").unwrap();
        assert_eq!(ew.criteria().len(), 2);
    }

    #[test]
    fn entity_flag() {
        let ew = ConditionWrapper::new().entity(Record::new());
        assert!(!ew.non_empty_of_entity());
        let ew = ConditionWrapper::new().entity(Record::new().with("a", 1));
        assert!(ew.non_empty_of_entity());
    }
}
