//! Shared types used across all mistok crates.

pub mod types;

pub use types::PartyId;
