//! Outcome definitions for a single frontier dispatch
//!
//! Every URL that passes the skip check ends in exactly one of these
//! outcomes, unless the run is aborted first.
use std::fmt;

/// Terminal outcome of dispatching one frontier URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The page yielded at least one recipe record
    Succeeded {
        /// Number of records derived from the page (its own plus related ones)
        records: usize,
    },

    /// The page produced nothing usable; the dispatched URL was recorded as failed
    Failed(FailureReason),
}

/// Why a dispatched URL ended up in `failed`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// HTTP 404 or 410, never retried
    NotFound { status: u16 },

    /// Every attempt failed with a retryable error
    RetriesExhausted { attempts: u32, last_error: String },

    /// The page was fetched but carries no recipe
    Absent(AbsenceReason),

    /// The embedded state could not be decoded or flattened
    Malformed(String),

    /// Flattening succeeded but produced no records
    NoRecords,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { status } => write!(f, "not found (HTTP {})", status),
            Self::RetriesExhausted {
                attempts,
                last_error,
            } => write!(f, "gave up after {} attempts: {}", attempts, last_error),
            Self::Absent(reason) => write!(f, "{}", reason),
            Self::Malformed(detail) => write!(f, "malformed payload: {}", detail),
            Self::NoRecords => write!(f, "no recipe records extracted"),
        }
    }
}

/// Why a fetched page has no recipe to extract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbsenceReason {
    /// The page title marks it as an error page
    ErrorPage,

    /// No script carries the embedded state
    NoEmbeddedState,

    /// The embedded state has no `recipe` node
    NoRecipe,

    /// The embedded state says the recipe does not exist
    RecipeNotFound,
}

impl fmt::Display for AbsenceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::ErrorPage => "error page",
            Self::NoEmbeddedState => "no embedded state found",
            Self::NoRecipe => "no recipe data in embedded state",
            Self::RecipeNotFound => "recipe not found",
        };
        f.write_str(text)
    }
}
