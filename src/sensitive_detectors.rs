//! Sensitive detector descriptors for the simulation geometry.
//!
//! Each descriptor maps a region of the detector description (matched by
//! volume name or substring) to the native sensitive detector class that
//! records hits there. The type-specific structs below only fix the native
//! class and fill in the standard parameters; they all produce a plain
//! [`SensitiveDetector`].

use crate::error::Result;
use crate::parameter::{Parameter, Parameters};
use crate::registry::Registry;

/// Module all the standard sensitive detectors are compiled into
pub const SD_MODULE: &str = "SimCore_SDs";

/// Configuration of one native sensitive detector
#[derive(Debug, Clone, PartialEq)]
pub struct SensitiveDetector {
    pub instance_name: String,
    pub class_name: String,
    pub module_name: String,
    pub parameters: Parameters,
}

impl SensitiveDetector {
    /// Describe a sensitive detector and load the module it is compiled into
    pub fn new(
        registry: &mut Registry,
        instance_name: &str,
        class_name: &str,
        module_name: &str,
    ) -> Result<Self> {
        registry.add_module(module_name)?;
        Ok(Self {
            instance_name: instance_name.to_string(),
            class_name: class_name.to_string(),
            module_name: module_name.to_string(),
            parameters: Parameters::new(),
        })
    }

    pub fn set(&mut self, key: &str, value: impl Into<Parameter>) -> &mut Self {
        self.parameters.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Parameter> {
        self.parameters.get(key)
    }

    /// Hit collection this detector fills, when it has one
    pub fn collection_name(&self) -> Option<&str> {
        self.get("collection_name").and_then(Parameter::as_str)
    }

    pub fn attributes(&self) -> Parameters {
        let mut attrs = Parameters::new();
        attrs.insert("class_name".to_string(), self.class_name.clone().into());
        attrs.insert("instance_name".to_string(), self.instance_name.clone().into());
        for (k, v) in &self.parameters {
            attrs.insert(k.clone(), v.clone());
        }
        attrs
    }
}

impl From<&SensitiveDetector> for Parameter {
    fn from(detector: &SensitiveDetector) -> Self {
        Parameter::Table(detector.attributes())
    }
}

impl From<SensitiveDetector> for Parameter {
    fn from(detector: SensitiveDetector) -> Self {
        Parameter::from(&detector)
    }
}

fn capitalize(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Tracker-hit equivalents on the scoring planes enclosing each subsystem
pub struct ScoringPlaneSd;

impl ScoringPlaneSd {
    pub const CLASS_NAME: &'static str = "simcore::ScoringPlaneSD";

    /// `subsystem` must match the `<subsystem>_sp` volumes of the geometry
    pub fn new(registry: &mut Registry, subsystem: &str) -> Result<SensitiveDetector> {
        let mut sd = SensitiveDetector::new(
            registry,
            &format!("{}_sp", subsystem),
            Self::CLASS_NAME,
            SD_MODULE,
        )?;
        sd.set(
            "collection_name",
            format!("{}ScoringPlaneHits", capitalize(subsystem)),
        );
        sd.set("match_substr", format!("sp_{}", subsystem.to_lowercase()));
        Ok(sd)
    }

    pub fn ecal(registry: &mut Registry) -> Result<SensitiveDetector> {
        Self::new(registry, "ecal")
    }

    pub fn hcal(registry: &mut Registry) -> Result<SensitiveDetector> {
        Self::new(registry, "hcal")
    }

    pub fn target(registry: &mut Registry) -> Result<SensitiveDetector> {
        Self::new(registry, "target")
    }

    pub fn magnet(registry: &mut Registry) -> Result<SensitiveDetector> {
        Self::new(registry, "magnet")
    }

    /// The tracker planes are named after the recoil tracker in the geometry
    pub fn tracker(registry: &mut Registry) -> Result<SensitiveDetector> {
        let mut sd = Self::new(registry, "tracker")?;
        sd.set("match_substr", "sp_recoil");
        Ok(sd)
    }
}

/// Recoil and tagging trackers
pub struct TrackerSd;

impl TrackerSd {
    pub const CLASS_NAME: &'static str = "simcore::TrackerSD";

    pub fn new(registry: &mut Registry, subsystem: &str, subdet_id: i64) -> Result<SensitiveDetector> {
        let mut sd = SensitiveDetector::new(
            registry,
            &format!("{}_TrackerSD", subsystem),
            Self::CLASS_NAME,
            SD_MODULE,
        )?;
        sd.set("subsystem", subsystem);
        sd.set("subdet_id", subdet_id);
        sd.set("collection_name", format!("{}SimHits", subsystem));
        Ok(sd)
    }

    pub fn tagger(registry: &mut Registry) -> Result<SensitiveDetector> {
        Self::new(registry, "Tagger", 1)
    }

    pub fn recoil(registry: &mut Registry) -> Result<SensitiveDetector> {
        Self::new(registry, "Recoil", 4)
    }
}

/// Hadronic calorimeter, with a Birks law estimate in the native class
pub struct HcalSd;

impl HcalSd {
    pub const CLASS_NAME: &'static str = "simcore::HcalSD";
    pub const DEFAULT_GDML_IDENTIFIERS: [&'static str; 2] = ["ScintBox", "scint_box"];

    pub fn new(registry: &mut Registry, gdml_identifiers: &[&str]) -> Result<SensitiveDetector> {
        let mut sd = SensitiveDetector::new(registry, "hcal_sd", Self::CLASS_NAME, SD_MODULE)?;
        sd.set("gdml_identifiers", gdml_identifiers.to_vec());
        Ok(sd)
    }

    pub fn standard(registry: &mut Registry) -> Result<SensitiveDetector> {
        Self::new(registry, &Self::DEFAULT_GDML_IDENTIFIERS)
    }
}

/// Electromagnetic calorimeter
pub struct EcalSd;

impl EcalSd {
    pub const CLASS_NAME: &'static str = "simcore::EcalSD";

    /// Hit contributions are saved and compressed by PDG ID by default
    pub fn new(registry: &mut Registry) -> Result<SensitiveDetector> {
        let mut sd = SensitiveDetector::new(registry, "ecal_sd", Self::CLASS_NAME, SD_MODULE)?;
        sd.set("enableHitContribs", true);
        sd.set("compressHitContribs", true);
        Ok(sd)
    }
}

/// Trigger scintillator pads, also used for hits inside the target
pub struct TrigScintSd;

impl TrigScintSd {
    pub const CLASS_NAME: &'static str = "simcore::TrigScintSD";

    /// `volume` names the logical volume(s) in the geometry to attach to
    pub fn new(registry: &mut Registry, module: i64, name: &str, volume: &str) -> Result<SensitiveDetector> {
        let mut sd = SensitiveDetector::new(
            registry,
            &format!("trig_scint_{}_sd", name),
            Self::CLASS_NAME,
            SD_MODULE,
        )?;
        sd.set("module_id", module);
        sd.set("volume_name", volume);

        let collection = if name == "Target" {
            format!("{}SimHits", name)
        } else {
            format!("TriggerPad{}SimHits", name)
        };
        sd.set("collection_name", collection);
        Ok(sd)
    }

    pub fn up(registry: &mut Registry) -> Result<SensitiveDetector> {
        Self::new(registry, 2, "Up", "trigger_pad_up_bar_volume")
    }

    pub fn tag(registry: &mut Registry) -> Result<SensitiveDetector> {
        Self::new(registry, 1, "Tagger", "trigger_pad_tag_bar_volume")
    }

    pub fn down(registry: &mut Registry) -> Result<SensitiveDetector> {
        Self::new(registry, 3, "Down", "trigger_pad_dn_bar_volume")
    }

    pub fn target(registry: &mut Registry) -> Result<SensitiveDetector> {
        Self::new(registry, 4, "Target", "target")
    }
}

/// Every sensitive detector of the standard geometry
pub fn standard_set(registry: &mut Registry) -> Result<Vec<SensitiveDetector>> {
    Ok(vec![
        ScoringPlaneSd::ecal(registry)?,
        ScoringPlaneSd::hcal(registry)?,
        ScoringPlaneSd::target(registry)?,
        ScoringPlaneSd::magnet(registry)?,
        ScoringPlaneSd::tracker(registry)?,
        TrackerSd::tagger(registry)?,
        TrackerSd::recoil(registry)?,
        HcalSd::standard(registry)?,
        EcalSd::new(registry)?,
        TrigScintSd::up(registry)?,
        TrigScintSd::tag(registry)?,
        TrigScintSd::down(registry)?,
        TrigScintSd::target(registry)?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    fn registry() -> Registry {
        let mut registry = Registry::with_install_prefix("/opt/ldmx");
        registry.create_process("sim").unwrap();
        registry
    }

    #[test]
    fn test_scoring_planes() {
        let mut registry = registry();
        let ecal = ScoringPlaneSd::ecal(&mut registry).unwrap();
        assert_eq!(ecal.instance_name, "ecal_sp");
        assert_eq!(ecal.collection_name(), Some("EcalScoringPlaneHits"));
        assert_eq!(ecal.get("match_substr").and_then(Parameter::as_str), Some("sp_ecal"));

        let tracker = ScoringPlaneSd::tracker(&mut registry).unwrap();
        assert_eq!(tracker.collection_name(), Some("TrackerScoringPlaneHits"));
        assert_eq!(tracker.get("match_substr").and_then(Parameter::as_str), Some("sp_recoil"));
        assert!(registry
            .process()
            .unwrap()
            .libraries
            .contains(&"/opt/ldmx/lib/libSimCore_SDs.so".to_string()));
    }

    #[test]
    fn test_trackers() {
        let mut registry = registry();
        let recoil = TrackerSd::recoil(&mut registry).unwrap();
        assert_eq!(recoil.instance_name, "Recoil_TrackerSD");
        assert_eq!(recoil.get("subdet_id"), Some(&Parameter::Int(4)));
        assert_eq!(recoil.collection_name(), Some("RecoilSimHits"));
    }

    #[test]
    fn test_trig_scint_collections() {
        let mut registry = registry();
        let up = TrigScintSd::up(&mut registry).unwrap();
        assert_eq!(up.instance_name, "trig_scint_Up_sd");
        assert_eq!(up.collection_name(), Some("TriggerPadUpSimHits"));
        let target = TrigScintSd::target(&mut registry).unwrap();
        assert_eq!(target.collection_name(), Some("TargetSimHits"));
    }

    #[test]
    fn test_calorimeters() {
        let mut registry = registry();
        let hcal = HcalSd::standard(&mut registry).unwrap();
        assert_eq!(
            hcal.get("gdml_identifiers"),
            Some(&Parameter::from(vec!["ScintBox", "scint_box"]))
        );
        let ecal = EcalSd::new(&mut registry).unwrap();
        assert_eq!(ecal.get("enableHitContribs"), Some(&Parameter::Bool(true)));
        assert_eq!(ecal.get("compressHitContribs"), Some(&Parameter::Bool(true)));
        assert_eq!(ecal.collection_name(), None);
    }

    #[test]
    fn test_standard_set_and_conversion() {
        let mut registry = registry();
        let detectors = standard_set(&mut registry).unwrap();
        assert_eq!(detectors.len(), 13);
        let as_param = Parameter::from(detectors);
        let first = &as_param.as_list().unwrap()[0];
        assert_eq!(
            first.as_table().unwrap()["class_name"].as_str(),
            Some(ScoringPlaneSd::CLASS_NAME)
        );
    }

    #[test]
    fn test_requires_process() {
        let mut registry = Registry::with_install_prefix("/opt/ldmx");
        assert!(matches!(
            EcalSd::new(&mut registry),
            Err(ConfigError::NoProcess { .. })
        ));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("hCAL"), "Hcal");
        assert_eq!(capitalize(""), "");
    }
}
