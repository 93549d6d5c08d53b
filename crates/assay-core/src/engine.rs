use std::path::Path;

use assay_codec::{Outcome, ResultRecord, UiTrials};
use assay_crypto::{SessionToken, SharedSecret};
use assay_dsa::GroupCounts;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::Serialize;

use crate::config::{ServerConfig, RESULTS_FILE, SNAPSHOT_FILE};
use crate::error::{LedgerError, Result};
use crate::ledger::ResultLedger;
use crate::persist::StateStore;
use crate::registry::ResourceRegistry;
use crate::session::Identity;
use crate::state::LedgerState;

/// Login input as received from a client, before any validation.
#[derive(Debug, Clone, Default)]
pub struct LoginRequest {
    pub full_name: String,
    pub id950: String,
    pub period: String,
    pub password: String,
}

/// A validated enrollment. Constructing one never touches shared state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrollment {
    pub identity: Identity,
    pub display_name: String,
    pub group: String,
}

impl Enrollment {
    pub fn new(full_name: &str, id950: &str, period: &str) -> Result<Self> {
        let (id950, full_name, period) = (id950.trim(), full_name.trim(), period.trim());
        if id950.is_empty() || full_name.is_empty() || period.is_empty() {
            return Err(LedgerError::validation("Missing fields"));
        }
        Ok(Self {
            identity: Identity::parse(id950)?,
            display_name: full_name.to_string(),
            group: period.to_string(),
        })
    }
}

/// What a successful login hands back to the client.
#[derive(Debug, Clone)]
pub struct Admission {
    pub token: SessionToken,
    pub resource: String,
    pub trials: UiTrials,
}

/// Passwords for the two audiences: participants and the operator.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub app: SharedSecret,
    pub admin: SharedSecret,
}

impl Credentials {
    pub fn new(app: SharedSecret, admin: SharedSecret) -> Self {
        Self { app, admin }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.app_password.clone(), config.admin_secret().clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerStatus {
    pub active: usize,
    pub used: usize,
    pub resources: usize,
}

struct LedgerInner {
    state: LedgerState,
    results: ResultLedger,
    rng: Box<dyn RngCore + Send>,
}

/// The assignment ledger: single-use admission, balanced allocation and
/// durable bookkeeping behind one lock.
///
/// ## Concurrency
/// Every operation runs its whole read-decide-write sequence while holding
/// `inner`. Input validation and password checks happen before the lock is
/// taken. Disk writes happen while it is held, so a success return means the
/// effect is durable.
///
/// ## Durability
/// Login and reset stage a copy of [`LedgerState`], write it as one snapshot,
/// and only then swap it in; a failed write leaves memory untouched. Submit appends its result row first; that row is
/// authoritative and is replayed over the snapshot by [`AssignmentLedger::open`].
pub struct AssignmentLedger {
    inner: Mutex<LedgerInner>,
    store: StateStore,
    registry: ResourceRegistry,
    credentials: Credentials,
}

static_assertions::assert_impl_all!(AssignmentLedger: Send, Sync);

impl AssignmentLedger {
    /// Production entry point: paths, secrets and RNG seeding from `config`.
    pub fn bootstrap(config: &ServerConfig, registry: ResourceRegistry) -> Result<Self> {
        config.ensure_dirs()?;
        let rng: Box<dyn RngCore + Send> = match config.rng_seed {
            Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
            None => Box::new(StdRng::from_entropy()),
        };
        Self::open(
            config.state_dir(),
            registry,
            Credentials::from_config(config),
            rng,
        )
    }

    /// Loads the snapshot under `dir` and replays the result log over it.
    pub fn open(
        dir: &Path,
        registry: ResourceRegistry,
        credentials: Credentials,
        rng: Box<dyn RngCore + Send>,
    ) -> Result<Self> {
        let store = StateStore::new(dir.join(SNAPSHOT_FILE));
        let results = ResultLedger::open(dir.join(RESULTS_FILE))?;
        let mut state = LedgerState::from_snapshot(store.load()?)?;

        let mut replayed = 0usize;
        for record in results.records()? {
            let identity = match Identity::parse(&record.identity) {
                Ok(identity) => identity,
                Err(_) => {
                    tracing::warn!(row = %record.identity, "AssignmentLedger: skipping malformed result row");
                    continue;
                }
            };
            if state.gate.mark_used(identity.clone()) || state.sessions.contains(&identity) {
                state.gate.consume(&identity, &mut state.sessions);
                replayed += 1;
            }
        }
        if replayed > 0 {
            tracing::warn!(replayed, "AssignmentLedger: result log ahead of snapshot, reconciling");
            store.store(&state.to_snapshot())?;
        }

        tracing::info!(
            active = state.sessions.len(),
            used = state.gate.len(),
            "AssignmentLedger: opened {}",
            dir.display()
        );

        Ok(Self {
            inner: Mutex::new(LedgerInner {
                state,
                results,
                rng,
            }),
            store,
            registry,
            credentials,
        })
    }

    /// Admits an identity and assigns it the least-used resource of its group.
    pub fn login(&self, request: &LoginRequest) -> Result<Admission> {
        if !self.credentials.app.verify(&request.password) {
            return Err(LedgerError::Auth);
        }
        let enrollment = Enrollment::new(&request.full_name, &request.id950, &request.period)?;
        self.admit(enrollment)
    }

    /// Login without the password check, for callers that authenticated already.
    pub fn admit(&self, enrollment: Enrollment) -> Result<Admission> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        inner
            .state
            .gate
            .admit(&enrollment.identity, &inner.state.sessions)
            .map_err(|reason| {
                tracing::info!(identity = %enrollment.identity, %reason, "login refused");
                LedgerError::Conflict {
                    identity: enrollment.identity.clone(),
                    reason,
                }
            })?;

        let mut staged = inner.state.clone();
        let resource = staged
            .allocator
            .select(&enrollment.group, self.registry.labels(), &mut *inner.rng)
            .ok_or_else(|| LedgerError::Config("trial catalog has no resources".into()))?;
        let trials = self.registry.trials(&resource).ok_or_else(|| {
            LedgerError::Config(format!("resource {resource} missing from catalog"))
        })?;
        let token = staged.sessions.create(
            enrollment.identity.clone(),
            resource.clone(),
            enrollment.display_name,
            enrollment.group.clone(),
        )?;

        self.store.store(&staged.to_snapshot())?;
        inner.state = staged;

        tracing::info!(
            identity = %enrollment.identity,
            group = %enrollment.group,
            metal = %resource,
            "login admitted"
        );
        Ok(Admission {
            token,
            resource,
            trials,
        })
    }

    /// Finalizes the session behind `token` with `guess`.
    ///
    /// A second submit with the same token fails with [`LedgerError::NotFound`];
    /// callers should read that as "already finalized".
    pub fn submit(&self, token: &str, guess: &str) -> Result<Outcome> {
        let (token, guess) = (token.trim(), guess.trim());
        if token.is_empty() || guess.is_empty() {
            return Err(LedgerError::validation("Missing token or guess"));
        }
        let token = SessionToken::from_wire(token);

        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let assignment = inner.state.sessions.resolve(&token)?.clone();
        let outcome = Outcome::judge(guess, &assignment.resource);
        let record = ResultRecord {
            identity: assignment.identity.as_str().to_string(),
            display_name: assignment.display_name.clone(),
            guess: guess.to_string(),
            correct: assignment.resource.clone(),
            outcome,
            group: assignment.group.clone(),
        };

        inner.results.append(&record)?;

        // The row is committed; memory follows it even if the snapshot lags.
        inner
            .state
            .gate
            .consume(&assignment.identity, &mut inner.state.sessions);
        self.store.store(&inner.state.to_snapshot())?;

        tracing::info!(
            identity = %assignment.identity,
            group = %assignment.group,
            result = %outcome,
            "submission recorded"
        );
        Ok(outcome)
    }

    /// Clears assignments, used identities, counters and results in one step.
    pub fn reset(&self, password: &str, confirm: bool) -> Result<()> {
        self.authorize_admin(password)?;
        if !confirm {
            return Err(LedgerError::validation("Confirmation required"));
        }

        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        // Snapshot first: if the truncate then fails, replay of the surviving
        // rows still marks those identities used.
        let cleared = LedgerState::default();
        self.store.store(&cleared.to_snapshot())?;
        inner.results.truncate()?;
        inner.state = cleared;

        tracing::warn!("ledger reset: all assignments, identities and results cleared");
        Ok(())
    }

    pub fn authorize_admin(&self, password: &str) -> Result<()> {
        if self.credentials.admin.verify(password) {
            Ok(())
        } else {
            Err(LedgerError::Auth)
        }
    }

    /// Full results table as CSV bytes, read under the lock so no append is torn.
    pub fn export_results(&self, password: &str) -> Result<Vec<u8>> {
        self.authorize_admin(password)?;
        let guard = self.inner.lock();
        guard.results.export()
    }

    pub fn status(&self) -> LedgerStatus {
        let guard = self.inner.lock();
        LedgerStatus {
            active: guard.state.sessions.len(),
            used: guard.state.gate.len(),
            resources: self.registry.len(),
        }
    }

    pub fn counts(&self) -> GroupCounts {
        self.inner.lock().state.allocator.counts().clone()
    }

    pub fn is_active(&self, identity: &Identity) -> bool {
        self.inner.lock().state.sessions.contains(identity)
    }

    pub fn is_used(&self, identity: &Identity) -> bool {
        self.inner.lock().state.gate.is_used(identity)
    }

    pub fn results(&self) -> Result<Vec<ResultRecord>> {
        self.inner.lock().results.records()
    }
}
