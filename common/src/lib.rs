// Re-export models
pub use crate::models::*;

pub mod models;
pub mod ordering;
pub mod pairing;
