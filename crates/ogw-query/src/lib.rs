//! Query Validator/Builder (component C5, spec.md §4.5): structural
//! validation of user-supplied NRQL-like domain queries, and a constructive
//! builder that assembles a canonical query from structured parameters.
//! The builder never emits anything the validator would reject (spec.md §8
//! round-trip property 10).

pub mod builder;
pub mod token;
pub mod validator;

pub use builder::{Filter, FilterOperator, Literal, QueryBuilder, Selector};
pub use validator::{validate, ValidatedQuery};
