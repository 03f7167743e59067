//! Page request parsing
//!
//! One request object carries everything a plan needs:
//!
//! ```json
//! {
//!   "entity": "User",
//!   "filter": {"username": {"$startsWith": "jo"}},
//!   "orderBy": [{"attribute": "username", "direction": "ASC"}],
//!   "permissions": [{"role": "admin"}, {"userAttribute": "ownerId"}],
//!   "caller": {"userId": 7, "roles": ["member"]},
//!   "first": 10,
//!   "after": "eyJVc2VyIjpbWyJ1c2VybmFtZSIsImpvZSJdLFsiaWQiLDNdXX0="
//! }
//! ```

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::filter::{parse_filter, FilterNode};
use crate::permission::{CallerContext, PermissionRule};
use crate::planner::{OrderSpec, PageRequest};

use super::errors::{CliError, CliResult};

#[derive(Debug, Clone)]
pub struct PageQuery {
    pub entity: String,
    pub filter: FilterNode,
    pub order: OrderSpec,
    pub permissions: Vec<PermissionRule>,
    pub caller: CallerContext,
    pub page: PageRequest,
}

impl PageQuery {
    pub fn from_value(request: &Value) -> CliResult<Self> {
        let object = request
            .as_object()
            .ok_or_else(|| CliError::request("request must be a JSON object"))?;

        let entity = object
            .get("entity")
            .and_then(Value::as_str)
            .ok_or_else(|| CliError::request("'entity' must be a string"))?
            .to_string();

        let filter = parse_filter(object.get("filter").unwrap_or(&Value::Null))?;

        Ok(Self {
            entity,
            filter,
            order: optional(object.get("orderBy"), "orderBy")?,
            permissions: optional(object.get("permissions"), "permissions")?,
            caller: optional(object.get("caller"), "caller")?,
            page: PageRequest::from_value(request)?,
        })
    }
}

fn optional<T: DeserializeOwned + Default>(value: Option<&Value>, name: &str) -> CliResult<T> {
    match value {
        None | Some(Value::Null) => Ok(T::default()),
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|e| CliError::request(format!("invalid '{}': {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_request() {
        let query = PageQuery::from_value(&json!({
            "entity": "Board",
            "filter": {"title": {"$contains": "road"}},
            "orderBy": [{"attribute": "title", "direction": "DESC"}],
            "permissions": [{"userAttribute": "ownerId"}],
            "caller": {"userId": 3},
            "last": 2,
            "offset": 1
        }))
        .unwrap();
        assert_eq!(query.entity, "Board");
        assert_eq!(query.order.len(), 1);
        assert_eq!(query.permissions.len(), 1);
        assert_eq!(query.caller.user_id, Some(json!(3)));
        assert_eq!(query.page.last, Some(2));
        assert_eq!(query.page.offset, Some(1));
    }

    #[test]
    fn test_minimal_request() {
        let query = PageQuery::from_value(&json!({"entity": "User"})).unwrap();
        assert!(query.order.is_empty());
        assert!(query.permissions.is_empty());
        assert_eq!(query.caller, CallerContext::anonymous());
        assert_eq!(query.filter, FilterNode::and(vec![]));
    }

    #[test]
    fn test_bad_requests() {
        let err = PageQuery::from_value(&json!({"filter": {}})).unwrap_err();
        assert_eq!(err.code(), "SEEK_CLI_INVALID_REQUEST");

        let err = PageQuery::from_value(&json!({"entity": "User", "filter": {"$xor": []}})).unwrap_err();
        assert_eq!(err.code(), "SEEK_UNKNOWN_OPERATOR");

        let err = PageQuery::from_value(&json!({"entity": "User", "first": "ten"})).unwrap_err();
        assert_eq!(err.code(), "SEEK_INVALID_PAGINATION_ARGS");

        let err = PageQuery::from_value(&json!({"entity": "User", "permissions": [{"nobody": 1}]}))
            .unwrap_err();
        assert_eq!(err.code(), "SEEK_CLI_INVALID_REQUEST");
    }
}
