use std::fs;
use std::path::Path;

use assay_codec::{decode_catalog, Catalog, TrialSheet, UiTrials};

use crate::error::{LedgerError, Result};

/// Read-only resource catalog loaded once at startup.
#[derive(Debug, Clone)]
pub struct ResourceRegistry {
    catalog: Catalog,
    labels: Vec<String>,
}

impl ResourceRegistry {
    /// Missing, unreadable or empty catalogs are fatal: nothing can be assigned.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|err| {
            LedgerError::Config(format!("missing trial catalog at {}: {err}", path.display()))
        })?;
        let catalog = decode_catalog(&bytes).map_err(|err| {
            LedgerError::Config(format!("invalid trial catalog {}: {err}", path.display()))
        })?;
        let registry = Self::from_catalog(catalog)?;
        tracing::info!(
            path = %path.display(),
            resources = registry.labels.len(),
            "ResourceRegistry: catalog loaded"
        );
        Ok(registry)
    }

    pub fn from_catalog(catalog: Catalog) -> Result<Self> {
        if catalog.is_empty() {
            return Err(LedgerError::Config("trial catalog has no resources".into()));
        }
        let labels = catalog.keys().cloned().collect();
        Ok(Self { catalog, labels })
    }

    /// Labels sorted by name; the candidate set for every allocation.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn sheet(&self, label: &str) -> Option<&TrialSheet> {
        self.catalog.get(label)
    }

    pub fn trials(&self, label: &str) -> Option<UiTrials> {
        self.sheet(label).map(UiTrials::from)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }
}
