//! Ordering specification
//!
//! An order is a non-empty list of `{attribute, direction}` terms. Before
//! planning it is normalized against the entity: every attribute must exist
//! and the primary key is appended as the final tie-break when missing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::PlanResult;
use crate::schema::EntitySpec;
use crate::sql::Shaper;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    #[serde(rename = "ASC", alias = "asc")]
    Asc,
    #[serde(rename = "DESC", alias = "desc")]
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    pub fn reversed(&self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    /// NULL sorts below every value in both directions
    pub fn nulls_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "NULLS FIRST",
            SortDirection::Desc => "NULLS LAST",
        }
    }
}

/// One ordering column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTerm {
    pub attribute: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl OrderTerm {
    pub fn asc(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Ordered list of sort terms
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderSpec {
    terms: Vec<OrderTerm>,
}

impl OrderSpec {
    pub fn new(terms: Vec<OrderTerm>) -> Self {
        Self { terms }
    }

    pub fn terms(&self) -> &[OrderTerm] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|t| t.attribute.as_str())
    }

    /// Validates attributes, drops repeated terms and appends the primary key
    pub fn normalized(&self, entity: &EntitySpec) -> PlanResult<OrderSpec> {
        let mut terms: Vec<OrderTerm> = Vec::with_capacity(self.terms.len() + 1);
        for term in &self.terms {
            entity.attribute(&term.attribute)?;
            if !terms.iter().any(|t| t.attribute == term.attribute) {
                terms.push(term.clone());
            }
        }

        let pk = &entity.primary_key_attribute()?.name;
        if !terms.iter().any(|t| &t.attribute == pk) {
            terms.push(OrderTerm::asc(pk.clone()));
        }
        Ok(OrderSpec { terms })
    }

    /// Same columns with every direction flipped
    pub fn reversed(&self) -> OrderSpec {
        OrderSpec {
            terms: self
                .terms
                .iter()
                .map(|t| OrderTerm {
                    attribute: t.attribute.clone(),
                    direction: t.direction.reversed(),
                })
                .collect(),
        }
    }

    /// `ORDER BY` body, e.g.
    /// `"users"."user_name" ASC NULLS FIRST, "users"."id" ASC NULLS FIRST`
    pub fn to_sql(&self, shaper: &Shaper<'_>) -> PlanResult<String> {
        let columns = self
            .terms
            .iter()
            .map(|t| {
                let (_, expr) = shaper.resolve(&t.attribute)?;
                Ok(format!(
                    "{} {} {}",
                    expr,
                    t.direction.as_str(),
                    t.direction.nulls_sql()
                ))
            })
            .collect::<PlanResult<Vec<_>>>()?;
        Ok(columns.join(", "))
    }

    /// Values of the order columns in a result row keyed by attribute name
    pub fn tuple_of(&self, row: &Map<String, Value>) -> Vec<(String, Value)> {
        self.terms
            .iter()
            .map(|t| {
                let value = row.get(&t.attribute).cloned().unwrap_or(Value::Null);
                (t.attribute.clone(), value)
            })
            .collect()
    }
}

impl std::fmt::Display for OrderSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} {}", term.attribute, term.direction.as_str())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::AttributeMeta;
    use serde_json::json;

    fn users() -> EntitySpec {
        EntitySpec::new("User", "users", "id")
            .with_attribute(AttributeMeta::integer("id", "id"))
            .with_attribute(AttributeMeta::text("username", "user_name"))
            .with_attribute(AttributeMeta::timestamp("registeredAt", "registered_at"))
    }

    #[test]
    fn test_primary_key_appended() {
        let order = OrderSpec::new(vec![OrderTerm::desc("registeredAt")]);
        let normalized = order.normalized(&users()).unwrap();
        assert_eq!(normalized.to_string(), "registeredAt DESC, id ASC");
    }

    #[test]
    fn test_empty_order_defaults_to_primary_key() {
        let normalized = OrderSpec::default().normalized(&users()).unwrap();
        assert_eq!(normalized.terms(), &[OrderTerm::asc("id")]);
    }

    #[test]
    fn test_existing_primary_key_kept_in_place() {
        let order = OrderSpec::new(vec![OrderTerm::desc("id"), OrderTerm::asc("username")]);
        let normalized = order.normalized(&users()).unwrap();
        assert_eq!(normalized.to_string(), "id DESC, username ASC");
    }

    #[test]
    fn test_unknown_attribute_rejected() {
        let order = OrderSpec::new(vec![OrderTerm::asc("age")]);
        assert_eq!(
            order.normalized(&users()).unwrap_err().code(),
            "SEEK_ATTRIBUTE_NOT_FOUND"
        );
    }

    #[test]
    fn test_reversed_and_sql() {
        let spec = users();
        let order = OrderSpec::new(vec![OrderTerm::asc("username"), OrderTerm::asc("id")]);
        let shaper = Shaper::new(&spec, "users", "en");
        assert_eq!(
            order.reversed().to_sql(&shaper).unwrap(),
            "\"users\".\"user_name\" DESC NULLS LAST, \"users\".\"id\" DESC NULLS LAST"
        );
    }

    #[test]
    fn test_deserialize_directions() {
        let order: OrderSpec = serde_json::from_value(json!([
            {"attribute": "username", "direction": "DESC"},
            {"attribute": "id", "direction": "asc"},
            {"attribute": "registeredAt"}
        ]))
        .unwrap();
        assert_eq!(order.terms()[0].direction, SortDirection::Desc);
        assert_eq!(order.terms()[1].direction, SortDirection::Asc);
        assert_eq!(order.terms()[2].direction, SortDirection::Asc);
    }

    #[test]
    fn test_tuple_of_row() {
        let order = OrderSpec::new(vec![OrderTerm::asc("username"), OrderTerm::asc("id")]);
        let row = json!({"id": 65, "username": "amalia943", "email": "a@x"});
        let tuple = order.tuple_of(row.as_object().unwrap());
        assert_eq!(
            tuple,
            vec![
                ("username".to_string(), json!("amalia943")),
                ("id".to_string(), json!(65)),
            ]
        );
    }
}
