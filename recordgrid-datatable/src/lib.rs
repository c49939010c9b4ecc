//! Datatable engine for RecordGrid
//!
//! Serves the three request shapes of a record browser over a resolved
//! [`FieldSet`](recordgrid_fields::FieldSet):
//!
//! - **Tables**: [`DatatableEngine`] applies global and extended search,
//!   sorting and pagination, and renders one page of rows
//! - **Forms**: [`FormHandler`] prefills a form from a record and applies a
//!   validated submission through the record store
//! - **Search**: [`SearchHandler`] keeps extended search values per search id
//!
//! Request input arrives as a [`ParameterBag`]; responses are serde structs.
//! Rendering markup, sessions and locale catalogs stay outside: the handlers
//! return view bundles and talk to a [`Translator`] and a
//! [`SearchStateStore`].
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use recordgrid_datatable::{DatatableConfig, DatatableEngine, ParameterBag, RequestParams};
//! use recordgrid_fields::{Declaration, Field, FieldSet};
//! use recordgrid_store::{EntityMapping, SqliteStore};
//!
//! # fn example() -> recordgrid_datatable::Result<()> {
//! let store = Arc::new(
//!     SqliteStore::open("app.db")?.with_entity(EntityMapping::new("app::entity::User", "users")),
//! );
//! let set = FieldSet::for_entity("app::entity::User", "user_admin")
//!     .build(vec![Field::new("name").with_declaration(Declaration::for_entity("User"))]);
//!
//! let engine = DatatableEngine::new(store).with_config(DatatableConfig::load()?);
//! let request = RequestParams::get(ParameterBag::new().with("search", "ada"));
//! let response = engine.handle_request(&request, &set, None, None)?;
//! println!("{}", response.to_json());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod form;
pub mod params;
pub mod response;
pub mod search;
pub mod translator;

pub use config::{DatatableConfig, CONFIG_FILE_STEM, ENV_PREFIX};
pub use engine::DatatableEngine;
pub use error::{DatatableError, Result};
pub use form::{FormHandler, FormOptions, FormOutcome, FormResponse, FormView, DEFAULT_FORM_TEMPLATE};
pub use params::{clean_search_fields, Method, ParameterBag, RequestParams};
pub use response::{Column, Counts, DataRow, DatatableResponse, Head, SearchValue};
pub use search::{
    session_key, MemorySearchState, SearchHandler, SearchOutcome, SearchResponse,
    SearchStateStore, SearchView, DEFAULT_SEARCH_TEMPLATE, RESET_PARAMETER,
};
pub use translator::{CatalogTranslator, IdentityTranslator, Translator};
