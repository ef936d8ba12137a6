//! Error taxonomy for the survey core

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by the survey core.
///
/// `NotFound` and `Validation` are client-facing; `Storage` wraps backend
/// failures and aborts the enclosing unit of work.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("validation failed: {reason}")]
    Validation {
        /// Identifier of the offending question, when one can be named.
        question_id: Option<String>,
        reason: String,
    },

    #[error("{context}")]
    Storage {
        context: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("too many requests")]
    RateLimited,
}

impl Error {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        Error::Validation {
            question_id: None,
            reason: reason.into(),
        }
    }

    pub fn validation_for(question_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Validation {
            question_id: Some(question_id.into()),
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }
}

/// Attach a context string to an sqlx error, mirroring anyhow's
/// `.with_context(|| ...)` call sites in repository code.
pub fn storage(context: impl Into<String>) -> impl FnOnce(sqlx::Error) -> Error {
    let context = context.into();
    move |source| Error::Storage { context, source }
}
