//! Entity and attribute metadata
//!
//! Produced by the entity layer, read-only to the planner. Each attribute
//! maps a logical name to a storage location plus the set of filter
//! operators it accepts.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::errors::{PlanError, PlanResult};
use crate::filter::Operator;

/// Storage type of an attribute, used to derive default capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    #[default]
    Text,
    Integer,
    Float,
    Boolean,
    Timestamp,
    Uuid,
    Json,
}

impl AttributeType {
    /// Operators accepted when an attribute declares no explicit set
    pub fn default_operators(&self) -> BTreeSet<Operator> {
        use Operator::*;

        let ops: &[Operator] = match self {
            AttributeType::Text => &[
                Eq,
                Ne,
                In,
                NotIn,
                Lt,
                Lte,
                Gt,
                Gte,
                Contains,
                StartsWith,
                EndsWith,
                NotContains,
                NotStartsWith,
                NotEndsWith,
                IsNull,
            ],
            AttributeType::Integer | AttributeType::Float | AttributeType::Timestamp => {
                &[Eq, Ne, In, NotIn, Lt, Lte, Gt, Gte, IsNull]
            }
            AttributeType::Uuid => &[Eq, Ne, In, NotIn, IsNull],
            AttributeType::Boolean => &[Eq, Ne, IsNull],
            AttributeType::Json => &[IsNull],
        };
        ops.iter().copied().collect()
    }
}

/// Where an attribute's column lives relative to the entity's own table
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ColumnSource {
    /// Column of the entity's table
    #[default]
    Own,
    /// Column reached through a declared join
    Joined { alias: String },
}

/// Metadata for one logical attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeMeta {
    /// Logical (API) name
    pub name: String,

    /// Physical column name
    pub column: String,

    #[serde(rename = "type", default)]
    pub attribute_type: AttributeType,

    /// Explicit capability set; derived from the type when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operators: Option<BTreeSet<Operator>>,

    #[serde(default)]
    pub source: ColumnSource,

    /// Keys followed inside a JSON column
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub json_path: Vec<String>,

    /// Value is a per-locale JSON object
    #[serde(default)]
    pub i18n: bool,
}

impl AttributeMeta {
    pub fn new(
        name: impl Into<String>,
        column: impl Into<String>,
        attribute_type: AttributeType,
    ) -> Self {
        Self {
            name: name.into(),
            column: column.into(),
            attribute_type,
            operators: None,
            source: ColumnSource::Own,
            json_path: Vec::new(),
            i18n: false,
        }
    }

    pub fn text(name: impl Into<String>, column: impl Into<String>) -> Self {
        Self::new(name, column, AttributeType::Text)
    }

    pub fn integer(name: impl Into<String>, column: impl Into<String>) -> Self {
        Self::new(name, column, AttributeType::Integer)
    }

    pub fn timestamp(name: impl Into<String>, column: impl Into<String>) -> Self {
        Self::new(name, column, AttributeType::Timestamp)
    }

    pub fn with_operators(mut self, operators: impl IntoIterator<Item = Operator>) -> Self {
        self.operators = Some(operators.into_iter().collect());
        self
    }

    pub fn joined(mut self, alias: impl Into<String>) -> Self {
        self.source = ColumnSource::Joined {
            alias: alias.into(),
        };
        self
    }

    pub fn with_json_path<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.json_path = path.into_iter().map(Into::into).collect();
        self
    }

    pub fn localized(mut self) -> Self {
        self.i18n = true;
        self
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.source, ColumnSource::Joined { .. })
    }

    pub fn is_json_pointer(&self) -> bool {
        !self.json_path.is_empty()
    }

    /// Checks the attribute's capability set
    pub fn supports(&self, op: Operator) -> bool {
        match &self.operators {
            Some(ops) => ops.contains(&op),
            None => self.attribute_type.default_operators().contains(&op),
        }
    }
}

/// A to-one join emitted as `LEFT JOIN`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinSpec {
    /// Alias referenced by joined attributes
    pub alias: String,
    /// Joined table
    pub table: String,
    /// Column of the entity's table
    pub local_column: String,
    /// Column of the joined table
    pub foreign_column: String,
}

/// Everything the planner needs to know about one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpec {
    pub name: String,
    pub table: String,
    /// Logical name of the unique tie-break attribute
    pub primary_key: String,
    pub attributes: Vec<AttributeMeta>,
    #[serde(default)]
    pub joins: Vec<JoinSpec>,
}

impl EntitySpec {
    pub fn new(
        name: impl Into<String>,
        table: impl Into<String>,
        primary_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            primary_key: primary_key.into(),
            attributes: Vec::new(),
            joins: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, attribute: AttributeMeta) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_join(mut self, join: JoinSpec) -> Self {
        self.joins.push(join);
        self
    }

    /// Resolves a logical attribute name
    pub fn attribute(&self, name: &str) -> PlanResult<&AttributeMeta> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| PlanError::attribute_not_found(&self.name, name))
    }

    pub fn primary_key_attribute(&self) -> PlanResult<&AttributeMeta> {
        self.attribute(&self.primary_key)
    }

    /// Checks internal consistency (unique names, known pk and join aliases)
    pub fn validate_structure(&self) -> Result<(), String> {
        let mut seen = BTreeSet::new();
        for attr in &self.attributes {
            if !seen.insert(attr.name.as_str()) {
                return Err(format!("duplicate attribute '{}'", attr.name));
            }
            if let ColumnSource::Joined { alias } = &attr.source {
                if !self.joins.iter().any(|j| &j.alias == alias) {
                    return Err(format!(
                        "attribute '{}' references undeclared join '{}'",
                        attr.name, alias
                    ));
                }
            }
        }
        if !seen.contains(self.primary_key.as_str()) {
            return Err(format!(
                "primary key '{}' is not a declared attribute",
                self.primary_key
            ));
        }
        Ok(())
    }
}
