//! The two placeholder tiers.
//!
//! - [`BoundParam`] (tier 1): a value bound through the driver. Every value derived
//!   from a known column or property goes through this type.
//! - [`RawSlot`] (tier 2): wrapper-supplied SQL text spliced verbatim. Only the
//!   wrapper's segment/first/comment/set/select texts can fill a raw slot, and the
//!   caller is responsible for their content.
//!
//! The types are disjoint: there is no way to splice a bound value as raw text or
//! to bind a raw slot.

use serde::Deserialize;
use std::fmt;

/// Type metadata attached to a bound placeholder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ParamMeta {
    pub jdbc_type: Option<String>,
    pub value_type: Option<String>,
    pub type_handler: Option<String>,
    pub numeric_scale: Option<u32>,
}

impl ParamMeta {
    pub fn is_empty(&self) -> bool {
        self.jdbc_type.is_none()
            && self.value_type.is_none()
            && self.type_handler.is_none()
            && self.numeric_scale.is_none()
    }

    fn write_options(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(v) = &self.jdbc_type {
            write!(f, ",jdbcType={v}")?;
        }
        if let Some(v) = &self.value_type {
            write!(f, ",valueType={v}")?;
        }
        if let Some(v) = &self.type_handler {
            write!(f, ",typeHandler={v}")?;
        }
        if let Some(v) = self.numeric_scale {
            write!(f, ",numericScale={v}")?;
        }
        Ok(())
    }
}

/// Where a bound value is read from at call time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamSource {
    /// A property of the entity payload (`et.<property>`).
    Entity(String),
    /// A property of the wrapper's entity seed (`ew.entity.<property>`).
    Seed(String),
    /// The id argument of by-id statements (`id`).
    Id,
    /// The caller-held pre-update version (`_version_original`).
    VersionOriginal,
}

impl ParamSource {
    /// Placeholder name as it appears in templates and bindings.
    pub fn name(&self) -> String {
        match self {
            ParamSource::Entity(p) => format!("et.{p}"),
            ParamSource::Seed(p) => format!("ew.entity.{p}"),
            ParamSource::Id => "id".to_string(),
            ParamSource::VersionOriginal => "_version_original".to_string(),
        }
    }
}

/// Tier-1 placeholder: a driver-bound value plus its type metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundParam {
    pub source: ParamSource,
    pub meta: ParamMeta,
}

impl BoundParam {
    pub fn new(source: ParamSource, meta: ParamMeta) -> Self {
        Self { source, meta }
    }

    pub fn name(&self) -> String {
        self.source.name()
    }
}

impl fmt::Display for BoundParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{{{}", self.source.name())?;
        self.meta.write_options(f)?;
        f.write_str("}")
    }
}

/// Tier-2 placeholder: wrapper text spliced verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawSlot {
    SqlSegment,
    SqlFirst,
    SqlComment,
    SqlSet,
    SqlSelect,
}

impl RawSlot {
    pub fn name(self) -> &'static str {
        match self {
            RawSlot::SqlSegment => "ew.sqlSegment",
            RawSlot::SqlFirst => "ew.sqlFirst",
            RawSlot::SqlComment => "ew.sqlComment",
            RawSlot::SqlSet => "ew.sqlSet",
            RawSlot::SqlSelect => "ew.sqlSelect",
        }
    }
}

impl fmt::Display for RawSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${{{}}}", self.name())
    }
}
