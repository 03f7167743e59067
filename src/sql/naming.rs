//! Naming and escaping helpers
//!
//! The [`Shaper`] maps logical attribute names to the SQL expression that
//! reads them: `"alias"."column"` for own columns, `"join"."column"` for
//! references, and `->`/`->>` paths for JSON pointer and i18n attributes.

use crate::errors::{PlanError, PlanResult};
use crate::schema::{AttributeMeta, ColumnSource, EntitySpec};

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validates and double-quotes an identifier
pub fn quote_identifier(name: &str) -> PlanResult<String> {
    if !is_valid_identifier(name) {
        return Err(PlanError::InvalidIdentifier(name.to_string()));
    }
    Ok(format!("\"{}\"", name))
}

/// `"alias"."column"`
pub fn qualified(alias: &str, column: &str) -> PlanResult<String> {
    Ok(format!(
        "{}.{}",
        quote_identifier(alias)?,
        quote_identifier(column)?
    ))
}

/// Quotes a JSON object key as a string literal
fn json_key_literal(key: &str) -> PlanResult<String> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        return Err(PlanError::InvalidIdentifier(key.to_string()));
    }
    Ok(format!("'{}'", key))
}

/// Follows `path` inside a JSON column; the last step extracts text
pub fn json_pointer(base: &str, path: &[&str]) -> PlanResult<String> {
    let mut expr = base.to_string();
    for (i, key) in path.iter().enumerate() {
        let arrow = if i + 1 == path.len() { "->>" } else { "->" };
        expr.push_str(arrow);
        expr.push_str(&json_key_literal(key)?);
    }
    Ok(expr)
}

/// Escapes LIKE wildcards so user text matches literally (escape char `\`)
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Resolves attribute names of one entity to SQL expressions
#[derive(Debug, Clone, Copy)]
pub struct Shaper<'a> {
    entity: &'a EntitySpec,
    alias: &'a str,
    locale: &'a str,
}

impl<'a> Shaper<'a> {
    pub fn new(entity: &'a EntitySpec, alias: &'a str, locale: &'a str) -> Self {
        Self {
            entity,
            alias,
            locale,
        }
    }

    pub fn entity(&self) -> &'a EntitySpec {
        self.entity
    }

    pub fn alias(&self) -> &'a str {
        self.alias
    }

    pub fn locale(&self) -> &'a str {
        self.locale
    }

    /// Looks up an attribute and returns its metadata and SQL expression
    pub fn resolve(&self, name: &str) -> PlanResult<(&'a AttributeMeta, String)> {
        let attr = self.entity.attribute(name)?;
        Ok((attr, self.expression(attr)?))
    }

    pub fn expression(&self, attr: &AttributeMeta) -> PlanResult<String> {
        let owner = match &attr.source {
            ColumnSource::Own => self.alias,
            ColumnSource::Joined { alias } => alias.as_str(),
        };
        let column = qualified(owner, &attr.column)?;

        let mut path: Vec<&str> = attr.json_path.iter().map(String::as_str).collect();
        if attr.i18n {
            path.push(self.locale);
        }

        if path.is_empty() {
            Ok(column)
        } else {
            json_pointer(&column, &path)
        }
    }
}
