//! Typed clause tree.
//!
//! Statement templates are trees of [`SqlNode`]s. Optional parts hang off
//! [`Guard`]s evaluated per call; predicate lists live in a smart
//! [`SqlNode::Where`] whose items say how they connect ([`Predicate`]). The
//! renderer in [`crate::render`] walks the tree, and `Display` prints the
//! two-tier template form (`#{..}` bound, `${..}` raw).

use crate::metadata::{FieldStrategy, OrderItem};
use crate::param::{BoundParam, ParamSource, RawSlot};
use std::fmt;

/// A per-call condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    /// A wrapper was supplied.
    WrapperPresent,
    /// The bound value exists under the column's strategy.
    Bound {
        source: ParamSource,
        strategy: FieldStrategy,
    },
    /// The wrapper supplies this raw text.
    Raw(RawSlot),
    /// The caller supplied the pre-update version.
    VersionOriginal,
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Guard::WrapperPresent => f.write_str("ew != null"),
            Guard::Bound { source, strategy } => {
                let name = source.name();
                match strategy {
                    FieldStrategy::NotNull => write!(f, "{name} != null"),
                    FieldStrategy::NotEmpty => write!(f, "{name} != null and {name} != ''"),
                    FieldStrategy::Always => match source {
                        ParamSource::Entity(_) => f.write_str("et != null"),
                        ParamSource::Seed(_) => f.write_str("ew.entity != null"),
                        ParamSource::Id | ParamSource::VersionOriginal => f.write_str("true"),
                    },
                    FieldStrategy::Never => f.write_str("false"),
                }
            }
            Guard::Raw(slot) => write!(f, "{} != null", slot.name()),
            Guard::VersionOriginal => {
                write!(f, "{} != null", ParamSource::VersionOriginal.name())
            }
        }
    }
}

/// One item of a smart WHERE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// A structured predicate, AND-joined to its predecessor. Renders to
    /// nothing when its guards fail.
    Node(SqlNode),
    /// The wrapper's structured criteria, each AND-joined and bound.
    Criteria,
    /// The wrapper's raw segment. Joined with AND when `Normal`, appended as-is
    /// when it starts with a connective, skipped when it is a tail.
    Segment,
}

/// A node of a statement template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlNode {
    /// Static SQL.
    Text(String),
    /// Tier-1 bound value. `nullable` binds NULL for an unset property instead
    /// of failing.
    Bind { param: BoundParam, nullable: bool },
    /// Tier-2 raw wrapper text.
    Raw(RawSlot),
    /// Children joined by single spaces; empty children are skipped.
    Seq(Vec<SqlNode>),
    /// Children concatenated without separators.
    Concat(Vec<SqlNode>),
    /// Children joined by `, `; empty children are skipped.
    List(Vec<SqlNode>),
    If(Guard, Box<SqlNode>),
    Choose {
        when: Guard,
        then: Box<SqlNode>,
        otherwise: Box<SqlNode>,
    },
    /// `WHERE` plus the rendered predicates, or nothing when none render.
    Where(Vec<Predicate>),
    /// `SET` plus the rendered assignments, or nothing when none render.
    Set(Vec<SqlNode>),
    /// The wrapper segment when it is a tail (GROUP BY/HAVING/ORDER BY/LIMIT).
    SegmentTail,
    /// The tail segment with ORDER BY merged in: wrapper order if given,
    /// otherwise `fallback` unless the tail already orders.
    OrderBy { fallback: Vec<OrderItem> },
}

impl SqlNode {
    pub fn text(s: impl Into<String>) -> Self {
        SqlNode::Text(s.into())
    }

    pub fn bind(param: BoundParam) -> Self {
        SqlNode::Bind {
            param,
            nullable: false,
        }
    }

    pub fn when(guard: Guard, node: SqlNode) -> Self {
        SqlNode::If(guard, Box::new(node))
    }

    pub fn is_empty(&self) -> bool {
        match self {
            SqlNode::Text(s) => s.is_empty(),
            SqlNode::Seq(v) | SqlNode::Concat(v) | SqlNode::List(v) | SqlNode::Set(v) => {
                v.iter().all(SqlNode::is_empty)
            }
            SqlNode::Where(v) => v.is_empty(),
            _ => false,
        }
    }

    /// Every bound parameter the template can reference, in template order.
    pub fn bound_params(&self) -> Vec<&BoundParam> {
        let mut out = Vec::new();
        self.collect_params(&mut out);
        out
    }

    fn collect_params<'a>(&'a self, out: &mut Vec<&'a BoundParam>) {
        match self {
            SqlNode::Bind { param, .. } => out.push(param),
            SqlNode::Seq(v) | SqlNode::Concat(v) | SqlNode::List(v) | SqlNode::Set(v) => {
                v.iter().for_each(|n| n.collect_params(out));
            }
            SqlNode::If(_, n) => n.collect_params(out),
            SqlNode::Choose {
                then, otherwise, ..
            } => {
                then.collect_params(out);
                otherwise.collect_params(out);
            }
            SqlNode::Where(preds) => {
                for p in preds {
                    if let Predicate::Node(n) = p {
                        n.collect_params(out);
                    }
                }
            }
            SqlNode::Text(_) | SqlNode::Raw(_) | SqlNode::SegmentTail | SqlNode::OrderBy { .. } => {}
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, nodes: &[SqlNode], sep: &str) -> fmt::Result {
    let mut first = true;
    for node in nodes.iter().filter(|n| !n.is_empty()) {
        if !first {
            f.write_str(sep)?;
        }
        first = false;
        write!(f, "{node}")?;
    }
    Ok(())
}

impl fmt::Display for SqlNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlNode::Text(s) => f.write_str(s),
            SqlNode::Bind { param, .. } => write!(f, "{param}"),
            SqlNode::Raw(slot) => write!(f, "{slot}"),
            SqlNode::Seq(v) => write_joined(f, v, " "),
            SqlNode::Concat(v) => write_joined(f, v, ""),
            SqlNode::List(v) => write_joined(f, v, ", "),
            SqlNode::If(guard, node) => write!(f, "<if test=\"{guard}\">{node}</if>"),
            SqlNode::Choose {
                when,
                then,
                otherwise,
            } => write!(
                f,
                "<choose><when test=\"{when}\">{then}</when><otherwise>{otherwise}</otherwise></choose>"
            ),
            SqlNode::Where(preds) => {
                f.write_str("<where>")?;
                for (i, p) in preds.iter().enumerate() {
                    match p {
                        Predicate::Node(n) => {
                            if i > 0 {
                                f.write_str(" AND ")?;
                            }
                            write!(f, "{n}")?;
                        }
                        Predicate::Criteria => f.write_str(" <criteria/>")?,
                        Predicate::Segment => write!(
                            f,
                            " <if test=\"ew.nonEmptyOfWhere\"><if test=\"ew.nonEmptyOfNormal\">AND </if>{}</if>",
                            RawSlot::SqlSegment
                        )?,
                    }
                }
                f.write_str("</where>")
            }
            SqlNode::Set(v) => {
                f.write_str("<set>")?;
                write_joined(f, v, ", ")?;
                f.write_str("</set>")
            }
            SqlNode::SegmentTail => write!(
                f,
                "<if test=\"ew.emptyOfWhere\">{}</if>",
                RawSlot::SqlSegment
            ),
            SqlNode::OrderBy { fallback } => {
                write!(f, "<orderBy tail=\"{}\"", RawSlot::SqlSegment)?;
                if !fallback.is_empty() {
                    let items: Vec<String> = fallback.iter().map(ToString::to_string).collect();
                    write!(f, " default=\"{}\"", items.join(", "))?;
                }
                f.write_str("/>")
            }
        }
    }
}
