//! Shared types for the domain kernel.

pub mod types;

pub use types::UniqueEntityId;
