//! Repository layer for database operations

pub mod responses;
pub mod surveys;
