//! Shared fixtures: an in-memory users table and its field set.

#![allow(dead_code)]

use std::sync::Arc;

use recordgrid_fields::{
    CastTextHooks, Declaration, EmailValidator, ExactHooks, Field, FieldSet, RequiredValidator,
    UniqueValidator, OPTIONS_IDENTIFIER,
};
use recordgrid_store::{EntityMapping, SqliteStore};

pub const USER: &str = "app::entity::User";
pub const CONTEXT: &str = "user_admin";

/// Store with three users: Ada (active, 36), Grace (active, 45), Linus (locked, 28).
pub fn user_store() -> Arc<SqliteStore> {
    let store = SqliteStore::open_in_memory()
        .expect("Failed to open in-memory store")
        .with_entity(EntityMapping::new(USER, "users"));
    store
        .execute_batch(
            "CREATE TABLE users (
                 id INTEGER PRIMARY KEY,
                 name TEXT NOT NULL,
                 email TEXT,
                 status TEXT,
                 age INTEGER
             );
             INSERT INTO users (name, email, status, age) VALUES
                 ('Ada', 'ada@example.com', 'active', 36),
                 ('Grace', 'grace@example.com', 'active', 45),
                 ('Linus', 'linus@example.org', 'locked', 28);",
        )
        .expect("Failed to create users table");
    Arc::new(store)
}

fn declared(field: Field, order: i32) -> Field {
    field.with_declaration(Declaration::for_entity("User").with_order(order))
}

/// Field pool for users, declared in a different order than it resolves.
pub fn user_fields() -> Vec<Field> {
    vec![
        declared(
            Field::new(OPTIONS_IDENTIFIER)
                .with_name("Options")
                .with_sortable(false)
                .with_render_in_form(false)
                .with_extended_search(false),
            99,
        ),
        declared(
            Field::new("email")
                .with_name("user.email")
                .with_validator(EmailValidator::new())
                .with_validator(UniqueValidator::new()),
            20,
        ),
        declared(
            Field::new("name")
                .with_name("user.name")
                .with_validator(RequiredValidator::new()),
            10,
        ),
        declared(
            Field::new("status")
                .with_name("user.status")
                .with_hooks(ExactHooks),
            30,
        ),
        declared(
            Field::new("age")
                .with_name("user.age")
                .with_hooks(CastTextHooks::default())
                .with_render_in_form(false),
            40,
        ),
    ]
}

pub fn user_set(store: &Arc<SqliteStore>) -> FieldSet {
    FieldSet::for_entity(USER, CONTEXT)
        .with_store(store.clone())
        .build(user_fields())
}
