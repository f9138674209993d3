//! Equipment-change detection capability.
//!
//! Each tracked entity owns a [`SlotArray`] of its equipment slots; the host
//! writes into it every tick and the container reports only real
//! transitions. What counts as "the same item" differs by host release, so
//! the equivalence function is supplied by the version adapter.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::CompatError;
use super::registry::CapabilityTable;
use super::version::VersionTag;
use crate::slots::SlotArray;

/// Value snapshot of one equipment slot. Carries only the fields that
/// participate in change detection; game mechanics never look at this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub material: String,
    pub amount: u32,
    #[serde(default)]
    pub durability: u32,
}

impl ItemSnapshot {
    pub fn new(material: impl Into<String>, amount: u32, durability: u32) -> Self {
        Self {
            material: material.into(),
            amount,
            durability,
        }
    }

    /// The empty slot sentinel the host uses for unequipped slots.
    pub fn empty() -> Self {
        Self::new("air", 0, 0)
    }

    pub fn is_empty(&self) -> bool {
        self.material == "air" || self.amount == 0
    }
}

/// Slot transition callback: `(old, new, slot index)`.
pub type SlotChangeFn = Box<dyn FnMut(&ItemSnapshot, &ItemSnapshot, usize) -> anyhow::Result<()> + Send>;

/// Capability contract for equipment-change detection.
pub trait EquipmentCompat: Send + Sync {
    /// Host release family this adapter targets, for logging.
    fn target(&self) -> &'static str;

    /// Builds the per-entity tracker, wired with this host version's item
    /// equivalence rules and the owning adapter's observer.
    fn create_tracker(&self, slot_count: usize, on_change: SlotChangeFn)
        -> SlotArray<ItemSnapshot>;
}

/// Adapter for hosts where item durability is part of item identity: losing
/// a durability point re-equips the "same" item and must not fire.
pub struct LegacyEquipment;

impl EquipmentCompat for LegacyEquipment {
    fn target(&self) -> &'static str {
        "1.13-1.20.4"
    }

    fn create_tracker(
        &self,
        slot_count: usize,
        on_change: SlotChangeFn,
    ) -> SlotArray<ItemSnapshot> {
        let mut tracker = SlotArray::with_equivalence(
            slot_count,
            ItemSnapshot::empty(),
            |a: &ItemSnapshot, b: &ItemSnapshot| {
                a.material == b.material && a.amount == b.amount && a.durability == b.durability
            },
        );
        tracker.observe(on_change);
        tracker
    }
}

/// Adapter for component-era hosts, where durability is a display component
/// and no longer part of item identity.
pub struct ModernEquipment;

impl EquipmentCompat for ModernEquipment {
    fn target(&self) -> &'static str {
        "1.20.5+"
    }

    fn create_tracker(
        &self,
        slot_count: usize,
        on_change: SlotChangeFn,
    ) -> SlotArray<ItemSnapshot> {
        let mut tracker = SlotArray::with_equivalence(
            slot_count,
            ItemSnapshot::empty(),
            |a: &ItemSnapshot, b: &ItemSnapshot| a.material == b.material && a.amount == b.amount,
        );
        tracker.observe(on_change);
        tracker
    }
}

/// Binding table for the equipment capability across supported host versions.
pub fn builtin_table() -> Result<CapabilityTable<dyn EquipmentCompat>, CompatError> {
    let mut table: CapabilityTable<dyn EquipmentCompat> = CapabilityTable::new("equipment");
    table.register(VersionTag::new(1, 13, 0), || Arc::new(LegacyEquipment))?;
    table.register(VersionTag::new(1, 20, 5), || Arc::new(ModernEquipment))?;
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn changes() -> (SlotChangeFn, Arc<Mutex<Vec<usize>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let on_change: SlotChangeFn = Box::new(move |_, _, index| {
            sink.lock().unwrap().push(index);
            Ok(())
        });
        (on_change, seen)
    }

    #[test]
    fn legacy_tracker_fires_on_durability_change() {
        let (on_change, seen) = changes();
        let mut tracker = LegacyEquipment.create_tracker(6, on_change);

        tracker.set(0, ItemSnapshot::new("iron_sword", 1, 250)).unwrap();
        tracker.set(0, ItemSnapshot::new("iron_sword", 1, 249)).unwrap();

        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn modern_tracker_ignores_durability() {
        let (on_change, seen) = changes();
        let mut tracker = ModernEquipment.create_tracker(6, on_change);

        tracker.set(0, ItemSnapshot::new("iron_sword", 1, 250)).unwrap();
        tracker.set(0, ItemSnapshot::new("iron_sword", 1, 249)).unwrap();

        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn builtin_table_covers_modern_hosts_by_fallback() {
        let table = builtin_table().unwrap();

        let legacy = table.resolve(VersionTag::new(1, 16, 5)).unwrap();
        assert_eq!(legacy.target(), "1.13-1.20.4");

        let modern = table.resolve(VersionTag::new(1, 21, 1)).unwrap();
        assert_eq!(modern.target(), "1.20.5+");
    }

    #[test]
    fn empty_slot_sentinel_is_not_a_transition() {
        let (on_change, seen) = changes();
        let mut tracker = LegacyEquipment.create_tracker(2, on_change);

        tracker.set(1, ItemSnapshot::empty()).unwrap();

        assert!(seen.lock().unwrap().is_empty());
    }
}
