//! Durable stores: user profiles and consultation requests, SQLite-backed.
//!
//! The core consumes these only through the [`ProfileStore`] and
//! [`ConsultationStore`] traits; each call is an independent transaction,
//! no cross-call coordination is expected.

pub mod consultation;
pub mod db;
pub mod profile;

pub use {
    consultation::{ConsultationRow, ConsultationStore, SqliteConsultationStore},
    db::{connect, run_migrations},
    profile::{ProfileStore, SqliteProfileStore, UserProfile},
};
