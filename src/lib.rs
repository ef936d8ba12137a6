//! Bilingual (TR/EN) customer survey platform core.
//!
//! Administrators design surveys (rating, choice, free-text and yes/no
//! questions), customers fill them out, administrators review and export the
//! responses. The heart of the crate is the reconciliation engine in
//! [`reconcile`], which synchronizes an edited survey tree against the
//! persisted one without destroying the identifiers stored answers point at.

pub mod cli;
pub mod error;
pub mod export;
pub mod model;
pub mod rate_limit;
pub mod reconcile;
pub mod seed;
pub mod service;
pub mod store;
pub mod submission;

pub use error::{Error, Result};
pub use service::SurveyService;
pub use store::Store;
