//! Record store boundary for RecordGrid
//!
//! `recordgrid-store` defines everything the field and datatable layers need
//! from a persistence engine, and nothing more:
//!
//! - **[`Value`]**: the loosely typed value carried by records, submissions
//!   and query parameters
//! - **[`Record`]**: attribute access by field identifier; a missing
//!   attribute reads as "no value" and writes as a no-op
//! - **[`Query`]**: a cloneable AST of AND-ed filters, named parameters,
//!   ordering and a page window under a root alias
//! - **[`RecordStore`]**: executes queries and writes records
//! - **[`SqliteStore`]**: a rusqlite implementation with fully parameterized SQL
//!
//! ```rust,no_run
//! use recordgrid_store::{EntityMapping, Expr, RecordStore, SqliteStore, DEFAULT_ALIAS};
//!
//! # fn example() -> recordgrid_store::Result<()> {
//! let store = SqliteStore::open("app.db")?
//!     .with_entity(EntityMapping::new("app::entity::User", "users"));
//!
//! let mut query = store.create_query("app::entity::User", DEFAULT_ALIAS);
//! let param = query.next_parameter_name("search_name");
//! query.set_parameter(param.clone(), "%ada%");
//! query.and_where(Expr::like(query.column("name"), param));
//!
//! let total = store.count(&query.clone().select_count("id"))?;
//! let rows = store.fetch(&query)?;
//! # Ok(())
//! # }
//! ```

mod error;
pub mod query;
mod record;
pub mod sqlite;
mod store;
mod value;

pub use error::{Result, StoreError};
pub use query::{ColumnRef, Direction, Expr, Query, Selection, DEFAULT_ALIAS};
pub use record::{Record, RowRecord, DEFAULT_IDENTIFIER};
pub use sqlite::{EntityMapping, RenderedQuery, SqliteStore};
pub use store::{EntityMetadataProvider, RecordStore};
pub use value::Value;
