//! Mapped object operations, taken under the engine lock.
//!
//! Missing objects make every setter a logged no-op and every getter return
//! an empty value, so a stale id from the control side never fails a call.

use super::TransportEngine;
use crate::Result;
use rondo_studio::{MappedObjectType, ObjectId, PropertyValue};
use tracing::debug;

impl TransportEngine {
    pub fn create_mapped_object(&self, object_type: MappedObjectType) -> ObjectId {
        let _guard = self.lock();
        let id = self.studio.create(object_type);
        debug!(id, ?object_type, "mapped object created");
        id
    }

    pub fn destroy_mapped_object(&self, id: ObjectId) -> bool {
        let _guard = self.lock();
        self.studio.destroy(id)
    }

    pub fn mapped_object_id(&self, object_type: MappedObjectType) -> Option<ObjectId> {
        let _guard = self.lock();
        self.studio.first_of_type(object_type)
    }

    /// Connect `from` to `to`. Resynchronises playback when rolling.
    pub fn connect_mapped_objects(&self, from: ObjectId, to: ObjectId) -> bool {
        let _guard = self.lock();
        if let Err(e) = self.studio.connect(from, to) {
            debug!(from, to, error = %e, "connect failed");
            return false;
        }
        self.resync_after_graph_change();
        true
    }

    /// Remove any edge between `a` and `b`. Resynchronises playback when rolling.
    pub fn disconnect_mapped_objects(&self, a: ObjectId, b: ObjectId) -> bool {
        let _guard = self.lock();
        if let Err(e) = self.studio.disconnect(a, b) {
            debug!(a, b, error = %e, "disconnect failed");
            return false;
        }
        self.resync_after_graph_change();
        true
    }

    pub fn disconnect_mapped_object(&self, id: ObjectId) -> bool {
        let _guard = self.lock();
        if let Err(e) = self.studio.disconnect_all(id) {
            debug!(id, error = %e, "disconnect failed");
            return false;
        }
        self.resync_after_graph_change();
        true
    }

    fn resync_after_graph_change(&self) {
        let guard = self.lock();
        let time = {
            let st = guard.borrow();
            if !st.status.is_rolling() {
                return;
            }
            st.driver.sequencer_time()
        };
        debug!(%time, "signal graph changed while rolling");
        self.jump_to(time);
    }

    pub fn set_mapped_property(&self, id: ObjectId, name: &str, value: f32) {
        let _guard = self.lock();
        if let Err(e) = self.studio.set_property(id, name, value) {
            debug!(id, name, error = %e, "set property ignored");
        }
    }

    /// Apply parallel lists of ids, names and values. Stops at the shortest
    /// list; missing objects are skipped.
    pub fn set_mapped_properties(&self, ids: &[ObjectId], names: &[String], values: &[f32]) {
        let _guard = self.lock();
        for ((id, name), value) in ids.iter().zip(names).zip(values) {
            if let Err(e) = self.studio.set_property(*id, name, *value) {
                debug!(id, name = %name, error = %e, "batch property skipped");
            }
        }
    }

    pub fn set_mapped_property_string(&self, id: ObjectId, name: &str, value: &str) {
        let _guard = self.lock();
        if let Err(e) = self.studio.set_string_property(id, name, value) {
            debug!(id, name, error = %e, "set string property ignored");
        }
    }

    /// Replace a list property. Unlike the scalar setters this reports failure.
    pub fn set_mapped_property_list(&self, id: ObjectId, name: &str, values: &[String]) -> Result<()> {
        let _guard = self.lock();
        self.studio.set_property_list(id, name, values)?;
        Ok(())
    }

    pub fn mapped_property(&self, id: ObjectId, name: &str) -> Option<PropertyValue> {
        let _guard = self.lock();
        self.studio.property(id, name).ok()
    }

    pub fn property_list(&self, id: ObjectId, name: &str) -> Vec<String> {
        let _guard = self.lock();
        self.studio.property_list(id, name).unwrap_or_default()
    }

    /// Program name for `bank:program` on a plugin slot, empty when unknown.
    pub fn plugin_program(&self, slot: ObjectId, bank: u16, program: u16) -> String {
        let _guard = self.lock();
        self.studio
            .plugin_program(slot, bank, program)
            .ok()
            .flatten()
            .unwrap_or_default()
    }

    /// `bank << 16 | program` for a named program, 0 when unknown.
    pub fn plugin_program_by_name(&self, slot: ObjectId, name: &str) -> u64 {
        let _guard = self.lock();
        self.studio
            .plugin_program_by_name(slot, name)
            .ok()
            .flatten()
            .unwrap_or(0)
    }

    pub fn set_mapped_port(&self, slot: ObjectId, port: u64, value: f32) {
        let _guard = self.lock();
        if let Err(e) = self.studio.set_port(slot, port, value) {
            debug!(slot, port, error = %e, "set port ignored");
        }
    }

    pub fn mapped_port(&self, slot: ObjectId, port: u64) -> f32 {
        let _guard = self.lock();
        self.studio.port(slot, port).ok().flatten().unwrap_or(0.0)
    }

    /// Empty the studio and drop temporary monitor state.
    pub fn clear_studio(&self) {
        let _guard = self.lock();
        self.studio.clear();
        self.monitor.clear_temporaries();
        debug!("studio cleared");
    }
}
