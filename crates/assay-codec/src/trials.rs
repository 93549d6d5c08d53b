use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Result;

/// Trial catalog keyed by resource label (e.g. `"Zn"`).
pub type Catalog = BTreeMap<String, TrialSheet>;

/// Observations for one unknown metal as stored in the catalog file.
///
/// Values are carried verbatim; the service never interprets them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialSheet {
    #[serde(default = "blank")]
    pub hammer: Value,
    #[serde(default = "blank")]
    pub conductivity: Value,
    #[serde(default = "blank")]
    pub water: Value,
    #[serde(default = "blank")]
    pub crucible: Value,
    #[serde(default = "blank")]
    pub acid: Value,
    #[serde(default = "blank")]
    pub flame: Value,
    #[serde(default = "empty_object")]
    pub activity: Value,
}

/// Client-facing trial layout returned on login.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UiTrials {
    #[serde(rename = "Hammer")]
    pub hammer: Value,
    #[serde(rename = "Conductivity")]
    pub conductivity: Value,
    #[serde(rename = "Water")]
    pub water: Value,
    #[serde(rename = "Crucible")]
    pub crucible: Value,
    #[serde(rename = "HCl")]
    pub hcl: Value,
    #[serde(rename = "Flame")]
    pub flame: Value,
    #[serde(rename = "ActivitySeries")]
    pub activity_series: Value,
}

impl From<&TrialSheet> for UiTrials {
    fn from(sheet: &TrialSheet) -> Self {
        Self {
            hammer: sheet.hammer.clone(),
            conductivity: sheet.conductivity.clone(),
            water: sheet.water.clone(),
            crucible: sheet.crucible.clone(),
            hcl: sheet.acid.clone(),
            flame: sheet.flame.clone(),
            activity_series: sheet.activity.clone(),
        }
    }
}

pub fn decode_catalog(bytes: &[u8]) -> Result<Catalog> {
    Ok(serde_json::from_slice(bytes)?)
}

fn blank() -> Value {
    Value::String(String::new())
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}
