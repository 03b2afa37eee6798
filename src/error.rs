//! Domain error taxonomy.
//!
//! Every fallible operation in the chunk-store core returns [`Error`]. The
//! variants map onto the outcomes the tool layer reports: validation failures
//! are rejected before any external call, `NotFound`/`NotAuthorized`/`Expired`
//! after a lookup with no side effect, and `Unavailable` surfaces collaborator
//! outages verbatim with a remediation hint appended.

/// Errors produced by the chunk-store core and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed input — bad lore name, empty session id, missing chunk field.
    #[error("{0}")]
    Validation(String),

    /// A session, chunk, lore, or model was looked up and is absent.
    #[error("{0}")]
    NotFound(String),

    /// A mutation was attempted without an active REST session.
    #[error("{0}")]
    NotAuthorized(String),

    /// The REST session passed its expiry; it has been removed.
    #[error("{0}")]
    Expired(String),

    /// A collaborator endpoint (vector store, embedding model) is unreachable.
    #[error("{0}")]
    Unavailable(String),

    /// Anything else from the storage/transport plumbing.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Short machine-readable tag for logs and structured outcomes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::NotAuthorized(_) => "not_authorized",
            Self::Expired(_) => "expired",
            Self::Unavailable(_) => "unavailable",
            Self::Backend(_) => "backend",
        }
    }
}
