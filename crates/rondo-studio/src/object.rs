//! Mapped object variants and their named properties.

use crate::error::{Result, StudioError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Registry-wide object identifier. Zero is never assigned.
pub type ObjectId = u32;

/// Property names understood by the built-in object kinds.
pub mod property {
    pub const LEVEL: &str = "level";
    pub const PAN: &str = "pan";
    pub const CHANNELS: &str = "channels";
    pub const INSTRUMENT: &str = "instrument";
    pub const INPUT_CHANNEL: &str = "input_channel";
    pub const BUSS: &str = "buss";
    pub const MUTE: &str = "mute";

    pub const IDENTIFIER: &str = "identifier";
    pub const LABEL: &str = "label";
    pub const POSITION: &str = "position";
    pub const BYPASSED: &str = "bypassed";
    pub const PROGRAM: &str = "program";
    pub const PROGRAMS: &str = "programs";
    pub const CONFIGURATION: &str = "configuration";
}

/// Discriminant of [`MappedObjectKind`], used for create-by-type and first-of-type lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MappedObjectType {
    AudioFader,
    AudioBuss,
    AudioInput,
    PluginSlot,
}

/// Dynamically typed property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Number(f32),
    Text(String),
    List(Vec<String>),
}

impl PropertyValue {
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(l) => Some(l.as_slice()),
            _ => None,
        }
    }
}

impl From<f32> for PropertyValue {
    fn from(v: f32) -> Self {
        Self::Number(v)
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(l: Vec<String>) -> Self {
        Self::List(l)
    }
}

/// Level/pan strip shared by faders, busses and inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strip {
    /// Gain in dB.
    pub level: f32,
    /// -100 (left) ..= 100 (right).
    pub pan: f32,
    pub channels: u32,
    pub mute: bool,
}

impl Default for Strip {
    fn default() -> Self {
        Self {
            level: 0.0,
            pan: 0.0,
            channels: 2,
            mute: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioFader {
    pub strip: Strip,
    pub instrument: u32,
    pub input_channel: u32,
    pub buss: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioBuss {
    pub strip: Strip,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioInput {
    pub strip: Strip,
    pub input_channel: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginProgram {
    pub bank: u16,
    pub program: u16,
    pub name: String,
}

impl PluginProgram {
    /// Parse `bank:program:name`. The name may itself contain colons.
    fn parse(entry: &str) -> Option<Self> {
        let mut parts = entry.splitn(3, ':');
        let bank = parts.next()?.trim().parse().ok()?;
        let program = parts.next()?.trim().parse().ok()?;
        let name = parts.next()?.to_string();
        Some(Self {
            bank,
            program,
            name,
        })
    }

    fn format(&self) -> String {
        format!("{}:{}:{}", self.bank, self.program, self.name)
    }
}

/// An insert slot hosting one plugin instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginSlot {
    pub identifier: String,
    pub label: String,
    pub position: u32,
    pub instrument: u32,
    pub bypassed: bool,
    pub current_program: String,
    pub programs: Vec<PluginProgram>,
    /// Control port values keyed by port number.
    pub ports: BTreeMap<u64, f32>,
    /// Flattened key/value configuration pairs.
    pub configuration: Vec<(String, String)>,
}

impl PluginSlot {
    pub fn program(&self, bank: u16, program: u16) -> Option<&str> {
        self.programs
            .iter()
            .find(|p| p.bank == bank && p.program == program)
            .map(|p| p.name.as_str())
    }

    /// Packed `bank << 16 | program` of the first program with this name.
    pub fn program_by_name(&self, name: &str) -> Option<u64> {
        self.programs
            .iter()
            .find(|p| p.name == name)
            .map(|p| (u64::from(p.bank) << 16) | u64::from(p.program))
    }

    pub fn port(&self, port: u64) -> Option<f32> {
        self.ports.get(&port).copied()
    }

    pub fn set_port(&mut self, port: u64, value: f32) {
        self.ports.insert(port, value);
    }
}

/// Closed set of object variants held by the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MappedObjectKind {
    AudioFader(AudioFader),
    AudioBuss(AudioBuss),
    AudioInput(AudioInput),
    PluginSlot(PluginSlot),
}

impl MappedObjectKind {
    /// Default-initialised variant for `object_type`.
    pub fn default_for(object_type: MappedObjectType) -> Self {
        match object_type {
            MappedObjectType::AudioFader => Self::AudioFader(AudioFader::default()),
            MappedObjectType::AudioBuss => Self::AudioBuss(AudioBuss::default()),
            MappedObjectType::AudioInput => Self::AudioInput(AudioInput::default()),
            MappedObjectType::PluginSlot => Self::PluginSlot(PluginSlot::default()),
        }
    }

    pub fn object_type(&self) -> MappedObjectType {
        match self {
            Self::AudioFader(_) => MappedObjectType::AudioFader,
            Self::AudioBuss(_) => MappedObjectType::AudioBuss,
            Self::AudioInput(_) => MappedObjectType::AudioInput,
            Self::PluginSlot(_) => MappedObjectType::PluginSlot,
        }
    }

    fn strip(&self) -> Option<&Strip> {
        match self {
            Self::AudioFader(f) => Some(&f.strip),
            Self::AudioBuss(b) => Some(&b.strip),
            Self::AudioInput(i) => Some(&i.strip),
            Self::PluginSlot(_) => None,
        }
    }

    fn strip_mut(&mut self) -> Option<&mut Strip> {
        match self {
            Self::AudioFader(f) => Some(&mut f.strip),
            Self::AudioBuss(b) => Some(&mut b.strip),
            Self::AudioInput(i) => Some(&mut i.strip),
            Self::PluginSlot(_) => None,
        }
    }
}

/// A registry entry: an id, its variant and its signal-graph edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedObject {
    id: ObjectId,
    kind: MappedObjectKind,
    pub(crate) inputs: BTreeSet<ObjectId>,
    pub(crate) outputs: BTreeSet<ObjectId>,
}

impl MappedObject {
    pub(crate) fn new(id: ObjectId, kind: MappedObjectKind) -> Self {
        Self {
            id,
            kind,
            inputs: BTreeSet::new(),
            outputs: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn kind(&self) -> &MappedObjectKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut MappedObjectKind {
        &mut self.kind
    }

    pub fn object_type(&self) -> MappedObjectType {
        self.kind.object_type()
    }

    pub fn inputs(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.inputs.iter().copied()
    }

    pub fn outputs(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.outputs.iter().copied()
    }

    pub fn as_plugin_slot(&self) -> Option<&PluginSlot> {
        match &self.kind {
            MappedObjectKind::PluginSlot(slot) => Some(slot),
            _ => None,
        }
    }

    pub fn as_plugin_slot_mut(&mut self) -> Option<&mut PluginSlot> {
        match &mut self.kind {
            MappedObjectKind::PluginSlot(slot) => Some(slot),
            _ => None,
        }
    }


    /// Read a property by name.
    pub fn property(&self, name: &str) -> Result<PropertyValue> {
        let object_type = self.object_type();
        if let Some(strip) = self.kind.strip() {
            let v = match name {
                property::LEVEL => Some(strip.level),
                property::PAN => Some(strip.pan),
                property::CHANNELS => Some(strip.channels as f32),
                property::MUTE => Some(if strip.mute { 1.0 } else { 0.0 }),
                _ => None,
            };
            if let Some(v) = v {
                return Ok(PropertyValue::Number(v));
            }
        }

        let value = match (&self.kind, name) {
            (MappedObjectKind::AudioFader(f), property::INSTRUMENT) => {
                PropertyValue::Number(f.instrument as f32)
            }
            (MappedObjectKind::AudioFader(f), property::INPUT_CHANNEL) => {
                PropertyValue::Number(f.input_channel as f32)
            }
            (MappedObjectKind::AudioFader(f), property::BUSS) => PropertyValue::Number(f.buss as f32),
            (MappedObjectKind::AudioInput(i), property::INPUT_CHANNEL) => {
                PropertyValue::Number(i.input_channel as f32)
            }
            (MappedObjectKind::PluginSlot(s), property::IDENTIFIER) => s.identifier.as_str().into(),
            (MappedObjectKind::PluginSlot(s), property::LABEL) => s.label.as_str().into(),
            (MappedObjectKind::PluginSlot(s), property::PROGRAM) => s.current_program.as_str().into(),
            (MappedObjectKind::PluginSlot(s), property::POSITION) => {
                PropertyValue::Number(s.position as f32)
            }
            (MappedObjectKind::PluginSlot(s), property::INSTRUMENT) => {
                PropertyValue::Number(s.instrument as f32)
            }
            (MappedObjectKind::PluginSlot(s), property::BYPASSED) => {
                PropertyValue::Number(if s.bypassed { 1.0 } else { 0.0 })
            }
            (MappedObjectKind::PluginSlot(s), property::PROGRAMS) => {
                PropertyValue::List(s.programs.iter().map(PluginProgram::format).collect())
            }
            (MappedObjectKind::PluginSlot(s), property::CONFIGURATION) => PropertyValue::List(
                s.configuration
                    .iter()
                    .flat_map(|(k, v)| [k.clone(), v.clone()])
                    .collect(),
            ),
            _ => return Err(unknown(object_type, name)),
        };
        Ok(value)
    }

    /// Set a numeric property.
    pub fn set_property(&mut self, name: &str, value: f32) -> Result<()> {
        let object_type = self.object_type();
        if let Some(strip) = self.kind.strip_mut() {
            match name {
                property::LEVEL => {
                    strip.level = value;
                    return Ok(());
                }
                property::PAN => {
                    strip.pan = value.clamp(-100.0, 100.0);
                    return Ok(());
                }
                property::CHANNELS => {
                    strip.channels = value.max(1.0) as u32;
                    return Ok(());
                }
                property::MUTE => {
                    strip.mute = value != 0.0;
                    return Ok(());
                }
                _ => {}
            }
        }

        match (&mut self.kind, name) {
            (MappedObjectKind::AudioFader(f), property::INSTRUMENT) => f.instrument = value as u32,
            (MappedObjectKind::AudioFader(f), property::INPUT_CHANNEL) => {
                f.input_channel = value as u32
            }
            (MappedObjectKind::AudioFader(f), property::BUSS) => f.buss = value as u32,
            (MappedObjectKind::AudioInput(i), property::INPUT_CHANNEL) => {
                i.input_channel = value as u32
            }
            (MappedObjectKind::PluginSlot(s), property::POSITION) => s.position = value as u32,
            (MappedObjectKind::PluginSlot(s), property::INSTRUMENT) => s.instrument = value as u32,
            (MappedObjectKind::PluginSlot(s), property::BYPASSED) => s.bypassed = value != 0.0,
            _ => return Err(unknown(object_type, name)),
        }
        Ok(())
    }

    /// Set a string property.
    pub fn set_string_property(&mut self, name: &str, value: &str) -> Result<()> {
        let object_type = self.object_type();
        match (&mut self.kind, name) {
            (MappedObjectKind::PluginSlot(s), property::IDENTIFIER) => s.identifier = value.to_string(),
            (MappedObjectKind::PluginSlot(s), property::LABEL) => s.label = value.to_string(),
            (MappedObjectKind::PluginSlot(s), property::PROGRAM) => {
                s.current_program = value.to_string()
            }
            _ => return Err(unknown(object_type, name)),
        }
        Ok(())
    }

    /// Replace a list-valued property. The list is validated before anything is changed.
    pub fn set_property_list(&mut self, name: &str, values: &[String]) -> Result<()> {
        let object_type = self.object_type();
        match (&mut self.kind, name) {
            (MappedObjectKind::PluginSlot(s), property::PROGRAMS) => {
                let programs = values
                    .iter()
                    .map(|entry| {
                        PluginProgram::parse(entry).ok_or_else(|| StudioError::InvalidValue {
                            name: name.to_string(),
                            reason: format!("expected bank:program:name, got '{entry}'"),
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                s.programs = programs;
            }
            (MappedObjectKind::PluginSlot(s), property::CONFIGURATION) => {
                if values.len() % 2 != 0 {
                    return Err(StudioError::InvalidValue {
                        name: name.to_string(),
                        reason: format!("odd number of entries ({})", values.len()),
                    });
                }
                s.configuration = values
                    .chunks_exact(2)
                    .map(|kv| (kv[0].clone(), kv[1].clone()))
                    .collect();
            }
            _ => return Err(unknown(object_type, name)),
        }
        Ok(())
    }

    /// Read a list-valued property.
    pub fn property_list(&self, name: &str) -> Result<Vec<String>> {
        match self.property(name)? {
            PropertyValue::List(l) => Ok(l),
            _ => Err(unknown(self.object_type(), name)),
        }
    }
}

fn unknown(object_type: MappedObjectType, name: &str) -> StudioError {
    StudioError::UnknownProperty {
        object_type,
        name: name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot() -> MappedObject {
        MappedObject::new(1, MappedObjectKind::default_for(MappedObjectType::PluginSlot))
    }

    #[test]
    fn test_fader_numeric_properties() {
        let mut fader = MappedObject::new(1, MappedObjectKind::default_for(MappedObjectType::AudioFader));
        fader.set_property(property::LEVEL, -6.0).unwrap();
        fader.set_property(property::PAN, 250.0).unwrap();
        fader.set_property(property::INSTRUMENT, 1001.0).unwrap();

        assert_eq!(fader.property(property::LEVEL).unwrap(), PropertyValue::Number(-6.0));
        assert_eq!(fader.property(property::PAN).unwrap().as_f32(), Some(100.0));
        assert_eq!(fader.property(property::INSTRUMENT).unwrap().as_f32(), Some(1001.0));
        assert!(matches!(
            fader.set_property(property::BYPASSED, 1.0),
            Err(StudioError::UnknownProperty { .. })
        ));
    }

    #[test]
    fn test_buss_has_no_instrument() {
        let mut buss = MappedObject::new(2, MappedObjectKind::default_for(MappedObjectType::AudioBuss));
        assert!(buss.set_property(property::INSTRUMENT, 3.0).is_err());
        assert_eq!(buss.property(property::CHANNELS).unwrap().as_f32(), Some(2.0));
    }

    #[test]
    fn test_plugin_programs() {
        let mut obj = slot();
        obj.set_property_list(
            property::PROGRAMS,
            &["0:0:Init".to_string(), "1:5:Bright: Pad".to_string()],
        )
        .unwrap();

        let slot = obj.as_plugin_slot().unwrap();
        assert_eq!(slot.program(1, 5), Some("Bright: Pad"));
        assert_eq!(slot.program(2, 0), None);
        assert_eq!(slot.program_by_name("Bright: Pad"), Some((1 << 16) | 5));
        assert_eq!(slot.program_by_name("Missing"), None);

        let listed = obj.property_list(property::PROGRAMS).unwrap();
        assert_eq!(listed[1], "1:5:Bright: Pad");
    }

    #[test]
    fn test_invalid_list_leaves_state() {
        let mut obj = slot();
        obj.set_property_list(property::PROGRAMS, &["0:1:A".to_string()])
            .unwrap();
        let err = obj
            .set_property_list(property::PROGRAMS, &["0:1:A".to_string(), "junk".to_string()])
            .unwrap_err();
        assert!(matches!(err, StudioError::InvalidValue { .. }));
        assert_eq!(obj.as_plugin_slot().unwrap().programs.len(), 1);

        assert!(obj
            .set_property_list(property::CONFIGURATION, &["only-key".to_string()])
            .is_err());
    }

    #[test]
    fn test_slot_strings() {
        let mut obj = slot();
        obj.set_string_property(property::IDENTIFIER, "ladspa:cmt.so:delay")
            .unwrap();
        assert_eq!(
            obj.property(property::IDENTIFIER).unwrap().as_str(),
            Some("ladspa:cmt.so:delay")
        );
        assert!(obj.set_string_property(property::LEVEL, "loud").is_err());
    }
}
