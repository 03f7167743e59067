//! Shared fixtures for integration tests
//!
//! A small catalog (users, board members, boards, memberships and signups,
//! some still unconfirmed) plus a dataset stored by column name, the way a
//! real table would hold it.

#![allow(dead_code)]

use serde_json::{json, Map, Value};

use seekplan::executor::MemoryDatabase;
use seekplan::filter::parse_filter;
use seekplan::planner::{OrderSpec, OrderTerm, Page, PageRequest, PlannedQuery, QueryAssembler};
use seekplan::schema::{AttributeMeta, Catalog, EntitySpec};
use seekplan::{CallerContext, PermissionRule, PlannerConfig};

pub fn catalog() -> Catalog {
    Catalog::from_entities([
        EntitySpec::new("User", "users", "id")
            .with_attribute(AttributeMeta::integer("id", "id"))
            .with_attribute(AttributeMeta::text("username", "username"))
            .with_attribute(AttributeMeta::timestamp("registeredAt", "registered_at")),
        EntitySpec::new("BoardMember", "board_members", "id")
            .with_attribute(AttributeMeta::integer("id", "id"))
            .with_attribute(AttributeMeta::integer("boardId", "board_id"))
            .with_attribute(AttributeMeta::text("username", "username"))
            .with_attribute(AttributeMeta::text("role", "role")),
        EntitySpec::new("Board", "boards", "id")
            .with_attribute(AttributeMeta::integer("id", "id"))
            .with_attribute(AttributeMeta::text("name", "name"))
            .with_attribute(AttributeMeta::integer("ownerId", "owner_id")),
        EntitySpec::new("Membership", "memberships", "id")
            .with_attribute(AttributeMeta::integer("id", "id"))
            .with_attribute(AttributeMeta::integer("boardId", "board_id"))
            .with_attribute(AttributeMeta::integer("userId", "user_id")),
        EntitySpec::new("Signup", "signups", "id")
            .with_attribute(AttributeMeta::integer("id", "id"))
            .with_attribute(AttributeMeta::text("email", "email"))
            .with_attribute(AttributeMeta::timestamp("confirmedAt", "confirmed_at")),
    ])
    .unwrap()
}

fn user(id: i64, username: &str, registered_at: &str) -> Value {
    json!({"id": id, "username": username, "registered_at": registered_at})
}

pub fn database(catalog: &Catalog) -> MemoryDatabase<'_> {
    let mut db = MemoryDatabase::new(catalog);

    db.insert_all(
        "User",
        vec![
            user(1, "amalia943", "2020-01-05T10:00:00Z"),
            user(2, "bruno112", "2020-02-11T10:00:00Z"),
            user(3, "dana768", "2020-03-08T10:00:00Z"),
            user(4, "john456", "2020-04-21T10:00:00Z"),
            user(5, "joanna56", "2020-05-02T10:00:00Z"),
            user(6, "weston422", "2020-06-30T10:00:00Z"),
            user(7, "jo_ann256", "2020-07-14T10:00:00Z"),
            user(8, "kira301", "2020-08-01T10:00:00Z"),
            user(9, "jose356", "2020-09-09T10:00:00Z"),
            user(10, "zed999", "2020-10-10T10:00:00Z"),
            user(65, "amalia943", "2019-12-31T10:00:00Z"),
            user(66, "amalia943", "2021-01-01T10:00:00Z"),
            user(70, "ahmed200", "2021-02-02T10:00:00Z"),
        ],
    )
    .unwrap();

    let roles = [
        "editor", "viewer", "editor", "editor", "editor", "editor", "editor", "viewer", "editor",
        "editor",
    ];
    db.insert_all(
        "BoardMember",
        roles.iter().enumerate().map(|(i, role)| {
            json!({
                "id": i + 1,
                "board_id": 1,
                "username": format!("member{:02}", i + 1),
                "role": role,
            })
        }),
    )
    .unwrap();

    db.insert_all(
        "Board",
        vec![
            json!({"id": 1, "name": "roadmap", "owner_id": 7}),
            json!({"id": 2, "name": "hiring", "owner_id": 3}),
            json!({"id": 3, "name": "offsite", "owner_id": 3}),
            json!({"id": 4, "name": "budget", "owner_id": 9}),
        ],
    )
    .unwrap();

    db.insert_all(
        "Membership",
        vec![
            json!({"id": 1, "board_id": 1, "user_id": 7}),
            json!({"id": 2, "board_id": 3, "user_id": 7}),
            json!({"id": 3, "board_id": 2, "user_id": 3}),
        ],
    )
    .unwrap();

    db.insert_all(
        "Signup",
        vec![
            json!({"id": 1, "email": "ana@example.com", "confirmed_at": "2020-01-10T08:00:00Z"}),
            json!({"id": 2, "email": "ben@example.com", "confirmed_at": null}),
            json!({"id": 3, "email": "cleo@example.com", "confirmed_at": "2020-03-10T08:00:00Z"}),
            json!({"id": 4, "email": "dev@example.com", "confirmed_at": null}),
            json!({"id": 5, "email": "eli@example.com", "confirmed_at": "2020-02-10T08:00:00Z"}),
        ],
    )
    .unwrap();

    db
}

pub fn order(terms: &[(&str, bool)]) -> OrderSpec {
    OrderSpec::new(
        terms
            .iter()
            .map(|(attr, asc)| {
                if *asc {
                    OrderTerm::asc(*attr)
                } else {
                    OrderTerm::desc(*attr)
                }
            })
            .collect(),
    )
}

/// Plans a request; the filter is given in its JSON wire form
pub fn plan(
    catalog: &Catalog,
    entity: &str,
    filter: Value,
    order: &OrderSpec,
    rules: &[PermissionRule],
    page: &PageRequest,
    caller: &CallerContext,
) -> seekplan::PlanResult<PlannedQuery> {
    let config = PlannerConfig::default();
    let filter = parse_filter(&filter)?;
    QueryAssembler::new(catalog, &config).assemble(entity, &filter, order, rules, page, caller)
}

/// Plans and executes a request with no permission rules
pub fn fetch(
    db: &MemoryDatabase<'_>,
    catalog: &Catalog,
    entity: &str,
    filter: Value,
    order: &OrderSpec,
    page: &PageRequest,
) -> Page {
    let planned = plan(
        catalog,
        entity,
        filter,
        order,
        &[],
        page,
        &CallerContext::anonymous(),
    )
    .unwrap();
    db.run(&planned).unwrap()
}

pub fn column(page: &Page, attribute: &str) -> Vec<Value> {
    page.nodes().map(|n| n[attribute].clone()).collect()
}

pub fn ids(page: &Page) -> Vec<i64> {
    page.nodes()
        .map(|n: &Map<String, Value>| n["id"].as_i64().unwrap())
        .collect()
}
