// crates/iec61850-rs-scl/src/manager.rs

//! Keeps the loaded devices of an application by name.

use crate::error::{ParseWarning, SclError, WarningKind};
use crate::parser::{ParseReport, ValueMode, load_scl_from_path, load_scl_from_str};
use iec61850_rs::{Device, ModelError, default_device};
use log::{info, warn};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Default)]
pub struct ModelManager {
    devices: BTreeMap<String, Device>,
}

impl ModelManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a document and stores its devices.
    ///
    /// A device whose name is already held is not replaced; the rejection
    /// is appended to the returned report's warnings. The returned report's
    /// `devices` lists only the devices that were stored.
    ///
    /// # Errors
    /// Returns an `SclError` for a document that cannot be parsed at all.
    pub fn load_from_str(&mut self, xml_content: &str) -> Result<ParseReport, SclError> {
        let report = load_scl_from_str(xml_content)?;
        Ok(self.store(report))
    }

    /// Reads a file, parses it and stores its devices.
    ///
    /// # Errors
    /// See [`ModelManager::load_from_str`]; also fails when the file cannot
    /// be read.
    pub fn load_from_path(&mut self, path: impl AsRef<Path>, mode: ValueMode) -> Result<ParseReport, SclError> {
        let report = load_scl_from_path(path, mode)?;
        Ok(self.store(report))
    }

    fn store(&mut self, report: ParseReport) -> ParseReport {
        let ParseReport {
            devices,
            mut warnings,
        } = report;
        let mut stored = Vec::with_capacity(devices.len());
        for device in devices {
            if self.devices.contains_key(&device.name) {
                let warning = ParseWarning {
                    kind: WarningKind::DuplicateName,
                    context: "ModelManager".to_string(),
                    message: format!("device '{}' is already loaded; keeping the loaded one", device.name),
                };
                warn!("{}", warning);
                warnings.push(warning);
                continue;
            }
            info!("Storing device {}", device.name);
            self.devices.insert(device.name.clone(), device.clone());
            stored.push(device);
        }
        ParseReport {
            devices: stored,
            warnings,
        }
    }

    /// Builds and stores the built-in default device.
    ///
    /// # Errors
    /// Returns `ModelError::DuplicateName` if `name` is already held.
    pub fn create_default(&mut self, name: &str) -> Result<&Device, ModelError> {
        if self.devices.contains_key(name) {
            return Err(ModelError::DuplicateName {
                parent: "ModelManager".to_string(),
                name: name.to_string(),
            });
        }
        let device = default_device(name)?;
        info!("Created default device {}", name);
        Ok(self.devices.entry(name.to_string()).or_insert(device))
    }

    pub fn get(&self, name: &str) -> Option<&Device> {
        self.devices.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Device> {
        self.devices.get_mut(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Device> {
        self.devices.remove(name)
    }

    pub fn device_names(&self) -> impl Iterator<Item = &str> {
        self.devices.keys().map(String::as_str)
    }

    /// Leaf attribute addresses of one device; empty if it is not loaded.
    pub fn references(&self, name: &str) -> Vec<String> {
        self.devices
            .get(name)
            .map(Device::leaf_references)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<SCL>
          <IED name="IED1"><AccessPoint name="S1"><Server>
            <LDevice inst="LD0"><LN0 lnClass="LLN0" inst="" lnType="LLN0_T"/></LDevice>
          </Server></AccessPoint></IED>
          <DataTypeTemplates>
            <LNodeType id="LLN0_T" lnClass="LLN0"><DO name="Beh" type="ENS_T"/></LNodeType>
            <DOType id="ENS_T" cdc="ENS"><DA name="stVal" bType="Enum" fc="ST"/></DOType>
          </DataTypeTemplates>
        </SCL>"#;

    #[test]
    fn test_load_and_query() {
        let mut manager = ModelManager::new();
        let report = manager.load_from_str(DOC).unwrap();
        assert_eq!(report.devices.len(), 1);
        assert_eq!(manager.device_names().collect::<Vec<_>>(), ["IED1"]);
        assert_eq!(manager.references("IED1"), ["IED1LD0/LLN0.Beh.stVal"]);
        assert!(manager.references("nope").is_empty());
        assert!(manager.get_mut("IED1").is_some());
    }

    #[test]
    fn test_duplicate_device_is_rejected() {
        let mut manager = ModelManager::new();
        manager.load_from_str(DOC).unwrap();
        let again = manager.load_from_str(DOC).unwrap();
        assert!(again.devices.is_empty());
        assert_eq!(again.warnings.len(), 1);
        assert_eq!(again.warnings[0].kind, WarningKind::DuplicateName);
        assert_eq!(manager.device_names().count(), 1);
    }

    #[test]
    fn test_default_device_lifecycle() {
        let mut manager = ModelManager::new();
        let device = manager.create_default("SIM").unwrap();
        assert_eq!(device.name, "SIM");
        assert!(manager.create_default("SIM").is_err());
        assert!(!manager.references("SIM").is_empty());
        assert!(manager.remove("SIM").is_some());
        assert!(manager.get("SIM").is_none());
    }
}
