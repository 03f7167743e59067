//! Parameterized SQL fragments
//!
//! A fragment is a sequence of raw SQL text and bound values. Values are
//! only turned into placeholders when the final statement is rendered, so
//! fragments compiled independently (filter, permissions, keyset bounds)
//! can be composed without renumbering.

use serde_json::Value;

use crate::config::PlaceholderStyle;

#[derive(Debug, Clone, PartialEq)]
enum Part {
    Sql(String),
    Param(Value),
}

/// Composable SQL text with bound parameters
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fragment {
    parts: Vec<Part>,
}

/// A rendered statement or clause
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSql {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Fragment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fragment holding raw SQL text
    pub fn sql(text: impl Into<String>) -> Self {
        let mut fragment = Self::new();
        fragment.push_sql(&text.into());
        fragment
    }

    pub fn always_true() -> Self {
        Self::sql("TRUE")
    }

    pub fn always_false() -> Self {
        Self::sql("FALSE")
    }

    pub fn push_sql(&mut self, text: &str) -> &mut Self {
        if text.is_empty() {
            return self;
        }
        match self.parts.last_mut() {
            Some(Part::Sql(last)) => last.push_str(text),
            _ => self.parts.push(Part::Sql(text.to_string())),
        }
        self
    }

    pub fn push_param(&mut self, value: Value) -> &mut Self {
        self.parts.push(Part::Param(value));
        self
    }

    pub fn append(&mut self, other: Fragment) -> &mut Self {
        for part in other.parts {
            match part {
                Part::Sql(text) => {
                    self.push_sql(&text);
                }
                Part::Param(value) => {
                    self.push_param(value);
                }
            }
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn param_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|p| matches!(p, Part::Param(_)))
            .count()
    }

    /// Conjunction of fragments; the empty conjunction is `TRUE`
    pub fn all(fragments: Vec<Fragment>) -> Fragment {
        Self::join(fragments, " AND ", Self::always_true)
    }

    /// Disjunction of fragments; the empty disjunction is `FALSE`
    pub fn any(fragments: Vec<Fragment>) -> Fragment {
        Self::join(fragments, " OR ", Self::always_false)
    }

    fn join(mut fragments: Vec<Fragment>, separator: &str, identity: fn() -> Fragment) -> Fragment {
        match fragments.len() {
            0 => identity(),
            1 => fragments.remove(0),
            _ => {
                let mut joined = Fragment::new();
                for (i, fragment) in fragments.into_iter().enumerate() {
                    if i > 0 {
                        joined.push_sql(separator);
                    }
                    joined.push_sql("(");
                    joined.append(fragment);
                    joined.push_sql(")");
                }
                joined
            }
        }
    }

    /// Renders with placeholders numbered from 1
    pub fn render(&self, style: PlaceholderStyle) -> RenderedSql {
        let mut sql = String::new();
        let mut params = Vec::with_capacity(self.param_count());

        for part in &self.parts {
            match part {
                Part::Sql(text) => sql.push_str(text),
                Part::Param(value) => {
                    params.push(value.clone());
                    match style {
                        PlaceholderStyle::Numbered => {
                            sql.push('$');
                            sql.push_str(&params.len().to_string());
                        }
                        PlaceholderStyle::Question => sql.push('?'),
                    }
                }
            }
        }

        RenderedSql { sql, params }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn eq(column: &str, value: Value) -> Fragment {
        let mut f = Fragment::sql(format!("{} = ", column));
        f.push_param(value);
        f
    }

    #[test]
    fn test_render_numbered() {
        let f = Fragment::all(vec![eq("a", json!(1)), eq("b", json!("x"))]);
        let rendered = f.render(PlaceholderStyle::Numbered);
        assert_eq!(rendered.sql, "(a = $1) AND (b = $2)");
        assert_eq!(rendered.params, vec![json!(1), json!("x")]);
    }

    #[test]
    fn test_render_question() {
        let f = Fragment::any(vec![eq("a", json!(1)), eq("b", json!(2))]);
        assert_eq!(f.render(PlaceholderStyle::Question).sql, "(a = ?) OR (b = ?)");
    }

    #[test]
    fn test_identity_elements() {
        assert_eq!(Fragment::all(vec![]).render(PlaceholderStyle::Numbered).sql, "TRUE");
        assert_eq!(Fragment::any(vec![]).render(PlaceholderStyle::Numbered).sql, "FALSE");
    }

    #[test]
    fn test_single_child_not_wrapped() {
        let f = Fragment::all(vec![eq("a", json!(1))]);
        assert_eq!(f.render(PlaceholderStyle::Numbered).sql, "a = $1");
    }

    #[test]
    fn test_numbering_continues_across_appended_fragments() {
        let mut f = eq("a", json!(1));
        f.push_sql(" AND ");
        f.append(eq("b", json!(2)));
        let rendered = f.render(PlaceholderStyle::Numbered);
        assert_eq!(rendered.sql, "a = $1 AND b = $2");
        assert_eq!(f.param_count(), 2);
    }
}
