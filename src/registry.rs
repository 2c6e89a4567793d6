use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use crate::classify::ThresholdBand;
use crate::telemetry::ChannelSelector;

pub const OFFLINE_SENTINEL: &str = "OFFLINE";

/// Per-device entry as written in the registry document. Threshold and date
/// stay loosely typed so a bad entry surfaces when that device is processed
/// instead of failing the whole file.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceEntry {
    pub deployed_at: String,
    pub threshold: ThresholdValue,
    pub channel: ChannelSelector,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ThresholdValue {
    Number(f64),
    Text(String),
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("threshold {0:?} is not numeric")]
    Threshold(String),
    #[error("deployment date {0:?} is not YYYY-MM-DD")]
    DeployedAt(String),
}

/// Validated view of an entry, resolved fresh for every processing run.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceProfile {
    pub deployed_at: NaiveDate,
    pub band: ThresholdBand,
    pub channel: ChannelSelector,
}

impl DeviceEntry {
    pub fn is_offline(&self) -> bool {
        matches!(&self.threshold, ThresholdValue::Text(text) if text == OFFLINE_SENTINEL)
    }

    pub fn resolve_deployed_at(&self) -> Result<NaiveDate, ProfileError> {
        NaiveDate::parse_from_str(self.deployed_at.trim(), "%Y-%m-%d")
            .map_err(|_| ProfileError::DeployedAt(self.deployed_at.clone()))
    }

    pub fn resolve_band(&self) -> Result<ThresholdBand, ProfileError> {
        let threshold = match &self.threshold {
            ThresholdValue::Number(value) => *value,
            ThresholdValue::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| ProfileError::Threshold(text.clone()))?,
        };
        Ok(ThresholdBand::symmetric(threshold))
    }

    pub fn resolve(&self) -> Result<DeviceProfile, ProfileError> {
        Ok(DeviceProfile {
            deployed_at: self.resolve_deployed_at()?,
            band: self.resolve_band()?,
            channel: self.channel.clone(),
        })
    }
}

/// Registry document mapping device id to its entry. Loaded once per process
/// and passed by value into the batch entry points.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceRegistry(BTreeMap<String, DeviceEntry>);

impl DeviceRegistry {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read device registry {}", path.display()))?;
        let registry = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse device registry {}", path.display()))?;
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, device_id: &str) -> Option<&DeviceEntry> {
        self.0.get(device_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DeviceEntry)> {
        self.0.iter().map(|(id, entry)| (id.as_str(), entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn entry(value: serde_json::Value) -> DeviceEntry {
        serde_json::from_value(value).expect("test entry")
    }

    #[test]
    fn parses_both_threshold_and_channel_shapes() {
        let registry: DeviceRegistry = serde_json::from_value(json!({
            "HFLI001": {"deployed_at": "2025-01-17", "threshold": 0.39, "channel": 6},
            "JKFL001": {"deployed_at": "2025-02-14", "threshold": "0.10", "channel": "sZ"},
            "STMT001": {"deployed_at": "2025-01-05", "threshold": "OFFLINE", "channel": 6},
        }))
        .expect("registry");

        assert_eq!(registry.len(), 3);
        assert!(registry.get("STMT001").expect("entry").is_offline());
        assert!(!registry.get("HFLI001").expect("entry").is_offline());

        let profile = registry.get("JKFL001").expect("entry").resolve().expect("profile");
        assert_eq!(profile.band.positive, 0.10);
        assert_eq!(profile.band.negative, -0.10);
        assert_eq!(profile.channel, ChannelSelector::Name("sZ".to_string()));
    }

    #[test]
    fn unpadded_dates_resolve() {
        let entry = entry(json!({"deployed_at": "2025-1-7", "threshold": 0.2, "channel": 6}));
        let deployed = entry.resolve_deployed_at().expect("date");
        assert_eq!(deployed.to_string(), "2025-01-07");
    }

    #[test]
    fn bad_threshold_is_a_per_device_error() {
        let entry = entry(json!({"deployed_at": "2025-01-17", "threshold": "high", "channel": 6}));
        assert!(matches!(
            entry.resolve(),
            Err(ProfileError::Threshold(value)) if value == "high"
        ));
    }

    #[test]
    fn bad_date_is_a_per_device_error() {
        let entry = entry(json!({"deployed_at": "17/01/2025", "threshold": 0.39, "channel": 6}));
        assert!(matches!(entry.resolve(), Err(ProfileError::DeployedAt(_))));
    }

    #[test]
    fn loads_a_registry_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{"HFLI001": {{"deployed_at": "2025-01-17", "threshold": 0.39, "channel": 6}}}}"#
        )
        .expect("write");

        let registry = DeviceRegistry::load(file.path()).expect("load");
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("devices.json");
        assert!(DeviceRegistry::load(&missing).is_err());
    }
}
