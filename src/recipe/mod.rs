//! Recipe records and the flattener that derives them
//!
//! A fetched page embeds a state tree describing its recipe together with
//! complete state fragments for every related recipe shown on the page.
//! [`flatten`] turns one such tree into independent [`RecipeRecord`]s so the
//! related recipes never have to be fetched on their own.

mod flatten;
mod record;

pub use flatten::{flatten, CollectionShape, RelatedCollection, RELATED_COLLECTIONS};
pub use record::RecipeRecord;

use thiserror::Error;

/// Errors raised while flattening a decoded state tree
///
/// Every variant points at an unexpected upstream schema; the page that
/// produced it is recorded as failed rather than partially extracted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlattenError {
    #[error("{path}: expected an object")]
    NotAnObject { path: String },

    #[error("{path}: malformed related-recipe collection: {detail}")]
    MalformedCollection { path: String, detail: String },

    #[error("{path}: recipe is missing `{field}`")]
    MissingField { path: String, field: &'static str },
}
