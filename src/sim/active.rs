//! Priority-ordered index of the active devices.

use std::collections::{BTreeMap, HashMap};

/// Ordering key: priority first, then activation sequence, so equal
/// priorities keep their activation order.
type Slot = (i32, u64);

/// Derived view over the devices that are switched on.
///
/// Owned by the controller and updated in lockstep with each device's
/// `is_on` flag. Iteration yields ids from lowest to highest priority.
#[derive(Debug, Default, Clone)]
pub(crate) struct ActiveIndex {
    order: BTreeMap<Slot, String>,
    slots: HashMap<String, Slot>,
    next_seq: u64,
}

impl ActiveIndex {
    pub(crate) fn insert(&mut self, id: &str, priority: i32) {
        if self.slots.contains_key(id) {
            return;
        }
        let slot = (priority, self.next_seq);
        self.next_seq += 1;
        self.order.insert(slot, id.to_string());
        self.slots.insert(id.to_string(), slot);
    }

    pub(crate) fn remove(&mut self, id: &str) {
        if let Some(slot) = self.slots.remove(id) {
            self.order.remove(&slot);
        }
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.slots.contains_key(id)
    }

    /// Active ids, lowest priority first.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.values().map(String::as_str)
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    pub(crate) fn clear(&mut self) {
        self.order.clear();
        self.slots.clear();
    }
}
