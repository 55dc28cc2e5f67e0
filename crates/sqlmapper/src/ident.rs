//! Validated SQL identifiers and property names.
//!
//! Table and column names end up spliced into statement templates, so they are
//! validated once when metadata (or a wrapper's ORDER BY list) is built:
//!
//! - Unquoted parts must match `[A-Za-z_][A-Za-z0-9_$]*`
//! - Quoted parts allow any characters except NUL and escape `"` as `""`
//! - Parts may be dotted (`schema.table`)
//!
//! Property names are the keys used in bound placeholders (`#{et.name}`), so
//! they must be a single unquoted part.

use crate::error::{MapperError, MapperResult};
use std::fmt;

/// A part of a SQL identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdentPart {
    /// Unquoted identifier: must match `[A-Za-z_][A-Za-z0-9_$]*`.
    Unquoted(String),
    /// Quoted identifier: allows any characters except NUL.
    Quoted(String),
}

/// A SQL identifier (column, table, or schema name).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    parts: Vec<IdentPart>,
    sql: String,
}

impl Ident {
    /// Parse an identifier string, supporting dotted and quoted forms.
    pub fn parse(s: &str) -> MapperResult<Self> {
        if s.is_empty() {
            return Err(MapperError::invalid_ident("identifier cannot be empty"));
        }
        if s.contains('\0') {
            return Err(MapperError::invalid_ident(
                "identifier cannot contain NUL character",
            ));
        }

        let mut parts = Vec::new();
        let mut chars = s.chars().peekable();

        while chars.peek().is_some() {
            if !parts.is_empty() {
                match chars.next() {
                    Some('.') => {
                        if chars.peek().is_none() {
                            return Err(MapperError::invalid_ident(format!(
                                "trailing '.' in '{s}'"
                            )));
                        }
                    }
                    Some(c) => {
                        return Err(MapperError::invalid_ident(format!(
                            "expected '.' between parts of '{s}', got '{c}'"
                        )));
                    }
                    None => break,
                }
            }

            if chars.peek() == Some(&'"') {
                chars.next();
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('"') => {
                            if chars.peek() == Some(&'"') {
                                chars.next();
                                name.push('"');
                            } else {
                                break;
                            }
                        }
                        Some(c) => name.push(c),
                        None => {
                            return Err(MapperError::invalid_ident(format!(
                                "unclosed quoted identifier in '{s}'"
                            )));
                        }
                    }
                }
                if name.is_empty() {
                    return Err(MapperError::invalid_ident("empty quoted identifier"));
                }
                parts.push(IdentPart::Quoted(name));
                continue;
            }

            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                if c == '.' {
                    break;
                }
                let ok = if name.is_empty() {
                    c == '_' || c.is_ascii_alphabetic()
                } else {
                    c == '_' || c == '$' || c.is_ascii_alphanumeric()
                };
                if !ok {
                    return Err(MapperError::invalid_ident(format!(
                        "invalid character '{c}' in '{s}'"
                    )));
                }
                name.push(c);
                chars.next();
            }
            if name.is_empty() {
                return Err(MapperError::invalid_ident(format!(
                    "empty identifier segment in '{s}'"
                )));
            }
            parts.push(IdentPart::Unquoted(name));
        }

        let sql = render_parts(&parts);
        Ok(Self { parts, sql })
    }

    /// Identifier parts in order.
    pub fn parts(&self) -> &[IdentPart] {
        &self.parts
    }

    /// The identifier as it appears in SQL.
    pub fn as_sql(&self) -> &str {
        &self.sql
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

fn render_parts(parts: &[IdentPart]) -> String {
    let mut out = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            out.push('.');
        }
        match part {
            IdentPart::Unquoted(s) => out.push_str(s),
            IdentPart::Quoted(s) => {
                out.push('"');
                for ch in s.chars() {
                    if ch == '"' {
                        out.push_str("\"\"");
                    } else {
                        out.push(ch);
                    }
                }
                out.push('"');
            }
        }
    }
    out
}

/// Validate a property name used as a placeholder key.
pub fn validate_property(name: &str) -> MapperResult<()> {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => {
            return Err(MapperError::invalid_ident(format!(
                "invalid property name '{name}'"
            )));
        }
    }
    if chars.all(|c| c == '_' || c.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(MapperError::invalid_ident(format!(
            "invalid property name '{name}'"
        )))
    }
}
