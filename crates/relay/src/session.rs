//! The relay session table: a symmetric pairing of two party identities.
//!
//! Invariants, enforced by construction:
//! - at most one entry per identity (no party is in two sessions at once),
//! - presence of A↦B implies presence of B↦A, inserted and removed together,
//! - an identity is never paired with itself.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use mistok_common::PartyId;

use crate::error::{Error, Result};

/// Result of [`SessionTable::start`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartOutcome {
    /// The requested pair was already active; nothing changed.
    pub already_active: bool,
    /// Parties whose previous pairing was torn down to make room for the
    /// new one. The caller owes each of them an "ended" notification.
    pub displaced: Vec<PartyId>,
}

/// Transient, process-lifetime pairing table.
///
/// Both directions of a pairing must become visible (and vanish) as one
/// atomic step, so the whole map sits behind a single mutex. The guard is
/// never held across an await point; every operation is a short map edit.
#[derive(Debug, Default)]
pub struct SessionTable {
    inner: Mutex<HashMap<PartyId, PartyId>>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PartyId, PartyId>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Pair `initiator` with `peer`.
    ///
    /// Fails with [`Error::InvalidPairing`] when the two ids are equal and
    /// leaves the table untouched. Retrying an already-active pair is
    /// idempotent. If either party held a different pairing, that pairing is
    /// torn down first and the displaced counterparts are reported so they
    /// can be told their chat ended.
    pub fn start(&self, initiator: PartyId, peer: PartyId) -> Result<StartOutcome> {
        if initiator == peer {
            return Err(Error::InvalidPairing);
        }

        let mut map = self.lock();

        if map.get(&initiator) == Some(&peer) {
            return Ok(StartOutcome {
                already_active: true,
                displaced: Vec::new(),
            });
        }

        let mut displaced = Vec::new();
        for party in [initiator, peer] {
            if let Some(old) = map.remove(&party) {
                map.remove(&old);
                displaced.push(old);
            }
        }

        map.insert(initiator, peer);
        map.insert(peer, initiator);

        Ok(StartOutcome {
            already_active: false,
            displaced,
        })
    }

    /// Tear down the session `party` is in, returning the counterpart.
    ///
    /// Not being in a session is a normal state, not an error: the call is
    /// a no-op and returns `None`.
    pub fn end(&self, party: PartyId) -> Option<PartyId> {
        let mut map = self.lock();
        let counterpart = map.remove(&party)?;
        map.remove(&counterpart);
        Some(counterpart)
    }

    /// Pure lookup, no side effects.
    pub fn counterpart_of(&self, party: PartyId) -> Option<PartyId> {
        self.lock().get(&party).copied()
    }

    /// Number of entries (two per active pairing).
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
