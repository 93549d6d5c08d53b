//! # assay-core: The Assignment Ledger
//!
//! Single-use identities, balanced resource allocation per group, and the
//! durable state that keeps both consistent:
//!
//! - [`IdentityGate`]: `UNSEEN -> ACTIVE -> CONSUMED` admission.
//! - [`SessionStore`]: token-indexed active assignments.
//! - [`ResultLedger`]: append-only results table.
//! - [`AssignmentLedger`]: login, submit and reset under one lock.

pub mod config;
pub mod engine;
pub mod error;
pub mod gate;
pub mod ledger;
pub mod persist;
pub mod registry;
pub mod session;
pub mod state;

pub use config::ServerConfig;
pub use engine::{
    Admission, AssignmentLedger, Credentials, Enrollment, LedgerStatus, LoginRequest,
};
pub use error::{LedgerError, Result};
pub use gate::{Denial, IdentityGate};
pub use ledger::ResultLedger;
pub use persist::{Snapshot, StateStore, write_atomic};
pub use registry::ResourceRegistry;
pub use session::{Assignment, Identity, SessionStore};
pub use state::LedgerState;

pub use assay_codec::{Outcome, ResultRecord, UiTrials};
pub use assay_crypto::{SessionToken, SharedSecret};
pub use assay_dsa::GroupCounts;
