//! Field registry, resolution and validation for RecordGrid
//!
//! `recordgrid-fields` describes the data attributes of an entity type and
//! decides which of them apply where. It knows nothing about request
//! parameters or responses; the datatable crate drives it.
//!
//! # Architecture
//!
//! - **Fields**: a [`Field`] combines display flags, a [`ValueBox`], an
//!   ordered validator chain and per-kind [`FieldHooks`]
//! - **Declarations**: plain `(entity, identifier, order)` data attached to a
//!   field or registered by key in a [`DeclarationRegistry`]
//! - **Resolution**: a [`FieldSet`] keeps the fields whose first matching
//!   declaration names the entity type or context, stably sorted by order
//! - **Validation**: fail-fast chains of stateless [`Validator`]s that report
//!   one structured error per failing field

pub mod declaration;
pub mod error;
pub mod field;
pub mod field_set;
pub mod hooks;
pub mod validator;
pub mod value_box;

pub use declaration::{short_name, Declaration, DeclarationProvider, DeclarationRegistry, InlineDeclarations};
pub use error::{FieldsError, Result};
pub use field::{Field, FieldError, FieldSetRef, DEFAULT_ORDER, OPTIONS_IDENTIFIER};
pub use field_set::{FieldSet, FieldSetBuilder, FieldSetFactory, ValidationReport};
pub use hooks::{like_expression, CastTextHooks, ExactHooks, FieldHooks, TextHooks};
pub use validator::{
    password_pair, CallbackValidator, EmailValidator, FieldSetScope, PasswordPolicyValidator,
    PasswordRequiredValidator, Rejection, RequiredValidator, StringLengthValidator,
    UniqueValidator, ValidationContext, Validator, ValidatorSettings, Verdict, DEFAULT_PRIORITY,
};
pub use value_box::{ListBox, StringBox, ValueBox, DEFAULT_BOX_TYPE};
