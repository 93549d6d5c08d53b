use std::{
    env, fs,
    net::SocketAddr,
    path::{Path, PathBuf},
};

use assay_crypto::SharedSecret;
use serde::Deserialize;

use crate::error::{LedgerError, Result};

pub const DEFAULT_APP_PASSWORD: &str = "Chem123";
pub const DEFAULT_STATE_DIR: &str = "data";
pub const SNAPSHOT_FILE: &str = "ledger.json";
pub const RESULTS_FILE: &str = "results.csv";
pub const CATALOG_FILE: &str = "metals.json";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Tokio worker threads.
    pub threads: usize,
    pub state_dir: PathBuf,
    /// Trial catalog; defaults to `<state_dir>/metals.json`.
    pub catalog_path: Option<PathBuf>,
    pub app_password: SharedSecret,
    /// Operator password for reset and exports; falls back to `app_password` when unset.
    pub admin_password: Option<SharedSecret>,
    /// Fixed seed for the allocation tie-break. Unset means OS entropy.
    pub rng_seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
            threads: num_cpus::get(),
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            catalog_path: None,
            app_password: SharedSecret::new(DEFAULT_APP_PASSWORD),
            admin_password: None,
            rng_seed: None,
        }
    }
}

impl ServerConfig {
    /// Reads the optional TOML file, then applies process environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|err| {
            LedgerError::Config(format!("cannot read {}: {err}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|err| LedgerError::Config(format!("invalid config: {err}")))
    }

    /// Environment overrides. `lookup` is `std::env::var` in production.
    ///
    /// `ADMIN_PASSWORD` defaults to `APP_PASSWORD` when only the latter is set.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("APP_PASSWORD") {
            self.app_password = SharedSecret::new(value);
        }
        if let Some(value) = lookup("ADMIN_PASSWORD") {
            self.admin_password = Some(SharedSecret::new(value));
        }
        if let Some(value) = lookup("HOST") {
            self.host = value;
        }
        if let Some(value) = lookup("PORT") {
            self.port = parse_var("PORT", &value)?;
        }
        if let Some(value) = lookup("ASSAY_THREADS") {
            self.threads = parse_var("ASSAY_THREADS", &value)?;
        }
        if let Some(value) = lookup("ASSAY_STATE_DIR") {
            self.state_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("ASSAY_CATALOG") {
            self.catalog_path = Some(PathBuf::from(value));
        }
        if let Some(value) = lookup("ASSAY_RNG_SEED") {
            self.rng_seed = Some(parse_var("ASSAY_RNG_SEED", &value)?);
        }
        if self.threads == 0 {
            return Err(LedgerError::Config("threads must be at least 1".into()));
        }
        Ok(())
    }

    pub fn admin_secret(&self) -> &SharedSecret {
        self.admin_password.as_ref().unwrap_or(&self.app_password)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|err| LedgerError::Config(format!("invalid listen address: {err}")))
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.state_dir.join(SNAPSHOT_FILE)
    }

    pub fn results_path(&self) -> PathBuf {
        self.state_dir.join(RESULTS_FILE)
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.catalog_path
            .clone()
            .unwrap_or_else(|| self.state_dir.join(CATALOG_FILE))
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        if !self.state_dir.exists() {
            fs::create_dir_all(&self.state_dir)?;
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|err| LedgerError::Config(format!("{key}={value:?}: {err}")))
}
