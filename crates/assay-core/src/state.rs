use assay_crypto::SessionToken;
use assay_dsa::GroupAllocator;

use crate::error::{LedgerError, Result};
use crate::gate::IdentityGate;
use crate::persist::{Snapshot, StoredAssignment};
use crate::session::{Assignment, Identity, SessionStore};

/// The three mutually consistent tables: active assignments, used identities
/// and allocation counters.
///
/// Mutations are applied to a clone and swapped in only after the clone is
/// durable, so a value of this type is always a state that was (or will be)
/// on disk.
#[derive(Debug, Clone, Default)]
pub struct LedgerState {
    pub sessions: SessionStore,
    pub gate: IdentityGate,
    pub allocator: GroupAllocator,
}

impl LedgerState {
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty() && self.gate.is_empty() && self.allocator.is_empty()
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self> {
        let mut state = LedgerState {
            allocator: GroupAllocator::from_counts(snapshot.counts),
            ..LedgerState::default()
        };

        for raw in snapshot.used {
            state.gate.mark_used(corrupt_identity(&raw)?);
        }

        for (raw, stored) in snapshot.assignments {
            let identity = corrupt_identity(&raw)?;
            if state.gate.is_used(&identity) {
                // Submission reached the snapshot; the assignment is stale.
                continue;
            }
            let assignment = Assignment {
                identity,
                resource: stored.metal,
                display_name: stored.full_name,
                group: stored.period,
                token: SessionToken::from_wire(stored.token),
            };
            state.sessions.insert(assignment).map_err(|conflict| {
                LedgerError::Config(format!("snapshot holds duplicate {conflict} for {raw}"))
            })?;
        }

        Ok(state)
    }

    pub fn to_snapshot(&self) -> Snapshot {
        let mut snapshot = Snapshot {
            counts: self.allocator.counts().clone(),
            used: self.gate.used().map(|id| id.as_str().to_string()).collect(),
            ..Snapshot::default()
        };
        for assignment in self.sessions.iter() {
            snapshot.assignments.insert(
                assignment.identity.as_str().to_string(),
                StoredAssignment {
                    metal: assignment.resource.clone(),
                    full_name: assignment.display_name.clone(),
                    period: assignment.group.clone(),
                    token: assignment.token.as_str().to_string(),
                },
            );
        }
        snapshot
    }
}

fn corrupt_identity(raw: &str) -> Result<Identity> {
    Identity::parse(raw)
        .map_err(|_| LedgerError::Config(format!("snapshot holds malformed identity {raw:?}")))
}
