//! The id-indexed registry.

use crate::error::{Result, StudioError};
use crate::object::{MappedObject, MappedObjectKind, MappedObjectType, ObjectId, PropertyValue};
use parking_lot::RwLock;
use std::collections::BTreeMap;

struct Inner {
    objects: BTreeMap<ObjectId, MappedObject>,
    next_id: ObjectId,
}

/// Flat registry of mapped objects.
///
/// Internally synchronised so the engine and the driver can both hold an
/// `Arc<Studio>`. Ids are handed out in increasing order starting at 1 and
/// are not reused until [`Studio::clear`].
pub struct Studio {
    inner: RwLock<Inner>,
}

impl Default for Studio {
    fn default() -> Self {
        Self::new()
    }
}

impl Studio {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                objects: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }

    /// Create a default-initialised object of `object_type`, returning its id.
    pub fn create(&self, object_type: MappedObjectType) -> ObjectId {
        self.insert(MappedObjectKind::default_for(object_type))
    }

    /// Register a fully built object, returning its id.
    pub fn insert(&self, kind: MappedObjectKind) -> ObjectId {
        let mut inner = self.inner.write();
        let id = inner.next_id;
        inner.next_id += 1;
        tracing::debug!(id, object_type = ?kind.object_type(), "created mapped object");
        inner.objects.insert(id, MappedObject::new(id, kind));
        id
    }

    /// Remove an object and every edge touching it.
    pub fn destroy(&self, id: ObjectId) -> bool {
        let mut inner = self.inner.write();
        let Some(removed) = inner.objects.remove(&id) else {
            return false;
        };
        for other in removed.inputs.iter().chain(removed.outputs.iter()) {
            if let Some(obj) = inner.objects.get_mut(other) {
                obj.inputs.remove(&id);
                obj.outputs.remove(&id);
            }
        }
        true
    }

    /// Snapshot of an object.
    pub fn get(&self, id: ObjectId) -> Option<MappedObject> {
        self.inner.read().objects.get(&id).cloned()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.inner.read().objects.contains_key(&id)
    }

    /// Run `f` against an object without cloning it.
    pub fn with<R>(&self, id: ObjectId, f: impl FnOnce(&MappedObject) -> R) -> Option<R> {
        self.inner.read().objects.get(&id).map(f)
    }

    pub fn with_mut<R>(&self, id: ObjectId, f: impl FnOnce(&mut MappedObject) -> R) -> Option<R> {
        self.inner.write().objects.get_mut(&id).map(f)
    }

    /// Lowest id of the given type.
    pub fn first_of_type(&self, object_type: MappedObjectType) -> Option<ObjectId> {
        self.inner
            .read()
            .objects
            .values()
            .find(|o| o.object_type() == object_type)
            .map(MappedObject::id)
    }

    pub fn ids_of_type(&self, object_type: MappedObjectType) -> Vec<ObjectId> {
        self.inner
            .read()
            .objects
            .values()
            .filter(|o| o.object_type() == object_type)
            .map(MappedObject::id)
            .collect()
    }

    pub fn property(&self, id: ObjectId, name: &str) -> Result<PropertyValue> {
        self.with(id, |o| o.property(name))
            .ok_or(StudioError::ObjectNotFound(id))?
    }

    pub fn set_property(&self, id: ObjectId, name: &str, value: f32) -> Result<()> {
        self.with_mut(id, |o| o.set_property(name, value))
            .ok_or(StudioError::ObjectNotFound(id))?
    }

    pub fn set_string_property(&self, id: ObjectId, name: &str, value: &str) -> Result<()> {
        self.with_mut(id, |o| o.set_string_property(name, value))
            .ok_or(StudioError::ObjectNotFound(id))?
    }

    pub fn set_property_list(&self, id: ObjectId, name: &str, values: &[String]) -> Result<()> {
        self.with_mut(id, |o| o.set_property_list(name, values))
            .ok_or(StudioError::ObjectNotFound(id))?
    }

    pub fn property_list(&self, id: ObjectId, name: &str) -> Result<Vec<String>> {
        self.with(id, |o| o.property_list(name))
            .ok_or(StudioError::ObjectNotFound(id))?
    }

    /// Add a directed edge `from -> to`.
    pub fn connect(&self, from: ObjectId, to: ObjectId) -> Result<()> {
        if from == to {
            return Err(StudioError::SelfConnection(from));
        }
        let mut inner = self.inner.write();
        for id in [from, to] {
            if !inner.objects.contains_key(&id) {
                return Err(StudioError::ObjectNotFound(id));
            }
        }
        if let Some(src) = inner.objects.get_mut(&from) {
            src.outputs.insert(to);
        }
        if let Some(dst) = inner.objects.get_mut(&to) {
            dst.inputs.insert(from);
        }
        Ok(())
    }

    /// Remove any edge between `a` and `b`, in either direction.
    pub fn disconnect(&self, a: ObjectId, b: ObjectId) -> Result<()> {
        let mut inner = self.inner.write();
        for id in [a, b] {
            if !inner.objects.contains_key(&id) {
                return Err(StudioError::ObjectNotFound(id));
            }
        }
        for (x, y) in [(a, b), (b, a)] {
            if let Some(obj) = inner.objects.get_mut(&x) {
                obj.inputs.remove(&y);
                obj.outputs.remove(&y);
            }
        }
        Ok(())
    }

    /// Remove every edge touching `id`.
    pub fn disconnect_all(&self, id: ObjectId) -> Result<()> {
        let peers: Vec<ObjectId> = self
            .with(id, |o| o.inputs().chain(o.outputs()).collect())
            .ok_or(StudioError::ObjectNotFound(id))?;
        for peer in peers {
            // Peers may have been destroyed concurrently; ignore those.
            let _ = self.disconnect(id, peer);
        }
        Ok(())
    }

    /// Program name for `(bank, program)` on a plugin slot.
    pub fn plugin_program(&self, slot: ObjectId, bank: u16, program: u16) -> Result<Option<String>> {
        self.with_slot(slot, |s| s.program(bank, program).map(str::to_string))
    }

    /// Packed `bank << 16 | program` for a program name on a plugin slot.
    pub fn plugin_program_by_name(&self, slot: ObjectId, name: &str) -> Result<Option<u64>> {
        self.with_slot(slot, |s| s.program_by_name(name))
    }

    pub fn set_port(&self, slot: ObjectId, port: u64, value: f32) -> Result<()> {
        let mut inner = self.inner.write();
        let obj = inner
            .objects
            .get_mut(&slot)
            .ok_or(StudioError::ObjectNotFound(slot))?;
        let actual = obj.object_type();
        let slot_state = obj.as_plugin_slot_mut().ok_or(StudioError::WrongType {
            id: slot,
            expected: MappedObjectType::PluginSlot,
            actual,
        })?;
        slot_state.set_port(port, value);
        Ok(())
    }

    pub fn port(&self, slot: ObjectId, port: u64) -> Result<Option<f32>> {
        self.with_slot(slot, |s| s.port(port))
    }

    fn with_slot<R>(&self, id: ObjectId, f: impl FnOnce(&crate::PluginSlot) -> R) -> Result<R> {
        let inner = self.inner.read();
        let obj = inner
            .objects
            .get(&id)
            .ok_or(StudioError::ObjectNotFound(id))?;
        obj.as_plugin_slot().map(f).ok_or(StudioError::WrongType {
            id,
            expected: MappedObjectType::PluginSlot,
            actual: obj.object_type(),
        })
    }

    /// Remove every object and restart id allocation.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.objects.clear();
        inner.next_id = 1;
    }

    pub fn len(&self) -> usize {
        self.inner.read().objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().objects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property;
    use proptest::prelude::*;

    #[test]
    fn test_create_assigns_fresh_ids() {
        let studio = Studio::new();
        let a = studio.create(MappedObjectType::AudioFader);
        let b = studio.create(MappedObjectType::AudioFader);
        assert_ne!(a, 0);
        assert!(b > a);
        assert!(studio.destroy(a));
        let c = studio.create(MappedObjectType::AudioBuss);
        assert!(c > b);
    }

    #[test]
    fn test_destroy_missing() {
        let studio = Studio::new();
        assert!(!studio.destroy(42));
    }

    #[test]
    fn test_first_of_type_is_lowest_id() {
        let studio = Studio::new();
        let _buss = studio.create(MappedObjectType::AudioBuss);
        let f1 = studio.create(MappedObjectType::AudioFader);
        let _f2 = studio.create(MappedObjectType::AudioFader);
        assert_eq!(studio.first_of_type(MappedObjectType::AudioFader), Some(f1));
        assert_eq!(studio.first_of_type(MappedObjectType::PluginSlot), None);
    }

    #[test]
    fn test_missing_object_property_access() {
        let studio = Studio::new();
        assert_eq!(
            studio.set_property(9, property::LEVEL, 1.0),
            Err(StudioError::ObjectNotFound(9))
        );
        assert!(studio.property_list(9, property::PROGRAMS).is_err());
    }

    #[test]
    fn test_connect_disconnect_edges() {
        let studio = Studio::new();
        let fader = studio.create(MappedObjectType::AudioFader);
        let buss = studio.create(MappedObjectType::AudioBuss);
        studio.connect(fader, buss).unwrap();

        let f = studio.get(fader).unwrap();
        assert_eq!(f.outputs().collect::<Vec<_>>(), vec![buss]);
        assert_eq!(studio.get(buss).unwrap().inputs().collect::<Vec<_>>(), vec![fader]);

        studio.disconnect(buss, fader).unwrap();
        assert_eq!(studio.get(fader).unwrap().outputs().count(), 0);
        assert_eq!(studio.connect(fader, fader), Err(StudioError::SelfConnection(fader)));
        assert_eq!(studio.connect(fader, 99), Err(StudioError::ObjectNotFound(99)));
    }

    #[test]
    fn test_destroy_removes_edges() {
        let studio = Studio::new();
        let input = studio.create(MappedObjectType::AudioInput);
        let fader = studio.create(MappedObjectType::AudioFader);
        let buss = studio.create(MappedObjectType::AudioBuss);
        studio.connect(input, fader).unwrap();
        studio.connect(fader, buss).unwrap();

        assert!(studio.destroy(fader));
        assert_eq!(studio.get(input).unwrap().outputs().count(), 0);
        assert_eq!(studio.get(buss).unwrap().inputs().count(), 0);
    }

    #[test]
    fn test_disconnect_all() {
        let studio = Studio::new();
        let fader = studio.create(MappedObjectType::AudioFader);
        let b1 = studio.create(MappedObjectType::AudioBuss);
        let b2 = studio.create(MappedObjectType::AudioBuss);
        studio.connect(fader, b1).unwrap();
        studio.connect(b2, fader).unwrap();

        studio.disconnect_all(fader).unwrap();
        let f = studio.get(fader).unwrap();
        assert_eq!(f.inputs().count() + f.outputs().count(), 0);
    }

    #[test]
    fn test_plugin_slot_ports_and_programs() {
        let studio = Studio::new();
        let slot = studio.create(MappedObjectType::PluginSlot);
        let fader = studio.create(MappedObjectType::AudioFader);

        studio.set_port(slot, 3, 0.75).unwrap();
        assert_eq!(studio.port(slot, 3), Ok(Some(0.75)));
        assert_eq!(studio.port(slot, 4), Ok(None));
        assert!(matches!(
            studio.set_port(fader, 3, 0.5),
            Err(StudioError::WrongType { .. })
        ));

        studio
            .set_property_list(slot, property::PROGRAMS, &["2:7:Strings".to_string()])
            .unwrap();
        assert_eq!(studio.plugin_program(slot, 2, 7), Ok(Some("Strings".to_string())));
        assert_eq!(studio.plugin_program_by_name(slot, "Strings"), Ok(Some((2 << 16) | 7)));
    }

    #[test]
    fn test_clear_restarts_ids() {
        let studio = Studio::new();
        studio.create(MappedObjectType::AudioFader);
        studio.create(MappedObjectType::AudioFader);
        studio.clear();
        assert!(studio.is_empty());
        assert_eq!(studio.create(MappedObjectType::AudioBuss), 1);
    }

    #[test]
    fn test_object_serializes() {
        let studio = Studio::new();
        let id = studio.create(MappedObjectType::AudioFader);
        studio.set_property(id, property::LEVEL, -3.0).unwrap();
        let json = serde_json::to_string(&studio.get(id).unwrap()).unwrap();
        let back: MappedObject = serde_json::from_str(&json).unwrap();
        assert_eq!(back.property(property::LEVEL).unwrap().as_f32(), Some(-3.0));
    }

    proptest! {
        #[test]
        fn prop_ids_unique(kinds in proptest::collection::vec(0u8..4, 1..40)) {
            let studio = Studio::new();
            let mut ids = Vec::new();
            for k in kinds {
                let ty = match k {
                    0 => MappedObjectType::AudioFader,
                    1 => MappedObjectType::AudioBuss,
                    2 => MappedObjectType::AudioInput,
                    _ => MappedObjectType::PluginSlot,
                };
                ids.push(studio.create(ty));
            }
            let mut sorted = ids.clone();
            sorted.dedup();
            prop_assert_eq!(sorted.len(), ids.len());
            prop_assert_eq!(studio.len(), ids.len());
        }
    }
}
