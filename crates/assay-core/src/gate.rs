use std::collections::BTreeSet;
use std::fmt;

use crate::session::{Assignment, Identity, SessionStore};

/// Why an identity may not start a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    AlreadyUsed,
    AlreadyActive,
}

impl Denial {
    pub fn reason(&self) -> &'static str {
        match self {
            Denial::AlreadyUsed => "already_used",
            Denial::AlreadyActive => "already_active",
        }
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// Single-use admission over the consumed-identity set.
///
/// Per identity: `UNSEEN -> ACTIVE -> CONSUMED`. Only a full clear goes back.
/// Callers hold the ledger lock across `admit` and the assignment write that
/// follows it; the gate itself does no locking.
#[derive(Debug, Clone, Default)]
pub struct IdentityGate {
    used: BTreeSet<Identity>,
}

impl IdentityGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn admit(&self, identity: &Identity, sessions: &SessionStore) -> Result<(), Denial> {
        if self.used.contains(identity) {
            return Err(Denial::AlreadyUsed);
        }
        if sessions.contains(identity) {
            return Err(Denial::AlreadyActive);
        }
        Ok(())
    }

    /// Moves `identity` from active to used. Returns the dropped assignment,
    /// if there was one; the identity is marked used either way.
    pub fn consume(
        &mut self,
        identity: &Identity,
        sessions: &mut SessionStore,
    ) -> Option<Assignment> {
        self.used.insert(identity.clone());
        sessions.remove(identity)
    }

    /// Returns `true` if the identity was not already marked.
    pub fn mark_used(&mut self, identity: Identity) -> bool {
        self.used.insert(identity)
    }

    pub fn is_used(&self, identity: &Identity) -> bool {
        self.used.contains(identity)
    }

    pub fn used(&self) -> impl Iterator<Item = &Identity> {
        self.used.iter()
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    pub fn clear(&mut self) {
        self.used.clear();
    }
}
