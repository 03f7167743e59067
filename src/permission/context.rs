//! Caller context carried with each planning request
//!
//! Permission rules are resolved against this context: role checks are
//! decided statically, user attribute and lookup rules read the user id and
//! claims to build row predicates.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Who is asking
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerContext {
    /// The authenticated user's id (None if anonymous)
    #[serde(default)]
    pub user_id: Option<Value>,

    #[serde(default)]
    pub roles: BTreeSet<String>,

    /// Custom claims (e.g. from a token)
    #[serde(default)]
    pub claims: BTreeMap<String, Value>,

    /// Preferred locale for i18n attributes
    #[serde(default)]
    pub locale: Option<String>,

    /// Service role skips permission rules entirely
    #[serde(default)]
    pub service_role: bool,
}

impl CallerContext {
    /// Context for an authenticated user
    pub fn authenticated(user_id: impl Into<Value>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Default::default()
        }
    }

    /// Context for anonymous access
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Context for the service role (bypasses permission rules)
    pub fn service_role() -> Self {
        Self {
            service_role: true,
            ..Default::default()
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.claims.insert(name.into(), value.into());
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn can_bypass_permissions(&self) -> bool {
        self.service_role
    }
}
