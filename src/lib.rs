//! Form state management: reducer-driven field values, validation errors and
//! required flags, field bindings for input elements, and a submit pipeline
//! that only calls back once every validator passes.

pub mod form;
pub mod prelude;

pub use form::{FormConfig, FormEngine, FormError, FormResult};
