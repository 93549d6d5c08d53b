use std::fmt;

use assay_crypto::SessionToken;
use assay_dsa::{IndexConflict, IndexedMap};

use crate::error::{LedgerError, Result};
use crate::gate::Denial;

/// Regeneration budget for the (practically impossible) 128-bit token collision.
const TOKEN_ATTEMPTS: usize = 4;

/// An 8-digit participant number, the natural key across all ledger state.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identity(String);

impl Identity {
    pub const LEN: usize = 8;

    /// Trims and validates. Only ASCII digits are accepted.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.len() != Self::LEN || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(LedgerError::validation(
                "Invalid 950 number (must be 8 digits)",
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The live record for one admitted identity. Dropped on submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub identity: Identity,
    pub resource: String,
    pub display_name: String,
    pub group: String,
    pub token: SessionToken,
}

/// Active assignments keyed by identity, with a token index alongside.
///
/// ## Invariant
/// One assignment per identity, one token per assignment, and the token index
/// is updated in the same call as the identity map (see [`IndexedMap`]).
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    live: IndexedMap<Identity, SessionToken, Assignment>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a fresh token and records the assignment under `identity`.
    pub fn create(
        &mut self,
        identity: Identity,
        resource: String,
        display_name: String,
        group: String,
    ) -> Result<SessionToken> {
        for _ in 0..TOKEN_ATTEMPTS {
            let token = SessionToken::generate()?;
            let assignment = Assignment {
                identity: identity.clone(),
                resource: resource.clone(),
                display_name: display_name.clone(),
                group: group.clone(),
                token: token.clone(),
            };
            match self.insert(assignment) {
                Ok(()) => return Ok(token),
                Err(IndexConflict::Secondary) => {
                    tracing::warn!("SessionStore: token collision, regenerating");
                }
                Err(IndexConflict::Key) => {
                    return Err(LedgerError::Conflict {
                        identity,
                        reason: Denial::AlreadyActive,
                    });
                }
            }
        }
        Err(LedgerError::Internal(
            "token source keeps repeating; refusing to issue".into(),
        ))
    }

    /// Inserts a fully formed assignment (restore path).
    pub fn insert(&mut self, assignment: Assignment) -> std::result::Result<(), IndexConflict> {
        let identity = assignment.identity.clone();
        let token = assignment.token.clone();
        self.live.insert(identity, token, assignment)
    }

    pub fn resolve(&self, token: &SessionToken) -> Result<&Assignment> {
        self.live
            .get_by_secondary(token)
            .map(|(_, assignment)| assignment)
            .ok_or(LedgerError::NotFound)
    }

    /// Idempotent: removing an absent identity is a no-op.
    pub fn remove(&mut self, identity: &Identity) -> Option<Assignment> {
        self.live.remove(identity)
    }

    pub fn get(&self, identity: &Identity) -> Option<&Assignment> {
        self.live.get(identity)
    }

    pub fn contains(&self, identity: &Identity) -> bool {
        self.live.contains_key(identity)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Assignment> {
        self.live.iter().map(|(_, _, assignment)| assignment)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn clear(&mut self) {
        self.live.clear();
    }
}
