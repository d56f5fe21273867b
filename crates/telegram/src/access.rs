//! Administrator classification.
//!
//! Membership in the static allow-list is the only authentication in the
//! system: an id either is an administrator or it is a regular user.

use mistok_common::PartyId;

/// Reason an administrator-only action was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDenied {
    NotAdministrator,
}

impl std::fmt::Display for AccessDenied {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAdministrator => write!(f, "caller is not an administrator"),
        }
    }
}

/// The configured administrator allow-list.
#[derive(Debug, Clone, Default)]
pub struct AdminRoster {
    admins: Vec<PartyId>,
}

impl AdminRoster {
    pub fn new(admins: Vec<PartyId>) -> Self {
        Self { admins }
    }

    pub fn is_admin(&self, party: PartyId) -> bool {
        self.admins.contains(&party)
    }

    /// Guard for administrator-only actions.
    pub fn check_admin(&self, party: PartyId) -> Result<(), AccessDenied> {
        if self.is_admin(party) {
            Ok(())
        } else {
            Err(AccessDenied::NotAdministrator)
        }
    }

    /// Broadcast targets, in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = PartyId> + '_ {
        self.admins.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.admins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.admins.is_empty()
    }
}
