//! Mapper-wide settings shared by every injected statement.

use serde::Deserialize;

/// How bound placeholders appear in rendered SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderStyle {
    /// Postgres style: `$1, $2, ...`
    #[default]
    Dollar,
    /// JDBC/SQLite style: `?`
    Question,
    /// Named style, same as the template: `#{et.name,jdbcType=VARCHAR}`
    Named,
}

/// Configuration shared by every injected statement.
///
/// Logic delete values set here are the defaults picked up by
/// [`LogicDelete::with_defaults`](crate::metadata::LogicDelete::with_defaults).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Placeholder rendering for tier-1 bound values.
    pub placeholder_style: PlaceholderStyle,
    /// SQL literal marking a row as deleted.
    pub logic_delete_value: String,
    /// SQL literal marking a row as live.
    pub logic_not_delete_value: String,
    /// Allow UPDATE/DELETE statements that render without a WHERE clause.
    pub allow_unfiltered_writes: bool,
    /// Order list queries by the primary key when the table declares no default order.
    pub order_by_key_fallback: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            placeholder_style: PlaceholderStyle::Dollar,
            logic_delete_value: "1".to_string(),
            logic_not_delete_value: "0".to_string(),
            allow_unfiltered_writes: false,
            order_by_key_fallback: true,
        }
    }
}

impl MapperConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the placeholder style.
    pub fn with_placeholder_style(mut self, style: PlaceholderStyle) -> Self {
        self.placeholder_style = style;
        self
    }

    /// Set the global logic delete literals (deleted, not deleted).
    pub fn with_logic_delete_values(
        mut self,
        delete_value: impl Into<String>,
        not_delete_value: impl Into<String>,
    ) -> Self {
        self.logic_delete_value = delete_value.into();
        self.logic_not_delete_value = not_delete_value.into();
        self
    }

    /// Permit UPDATE/DELETE without WHERE.
    ///
    /// Disabled by default: such statements fail to render.
    pub fn allow_unfiltered_writes(mut self) -> Self {
        self.allow_unfiltered_writes = true;
        self
    }

    /// Do not fall back to `ORDER BY <key> ASC` for list queries.
    pub fn without_key_ordering(mut self) -> Self {
        self.order_by_key_fallback = false;
        self
    }
}
