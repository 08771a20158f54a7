use crate::entities::item::ItemId;
use crate::world::item_types::SlotPositions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InventorySlot {
    Head,
    Necklace,
    Backpack,
    Armor,
    RightHand,
    LeftHand,
    Legs,
    Feet,
    Ring,
    Ammo,
}

impl InventorySlot {
    const COUNT: usize = 10;

    /// Slot number as used by clients and cylinder indices (1-based).
    pub fn index(self) -> u32 {
        match self {
            InventorySlot::Head => 1,
            InventorySlot::Necklace => 2,
            InventorySlot::Backpack => 3,
            InventorySlot::Armor => 4,
            InventorySlot::RightHand => 5,
            InventorySlot::LeftHand => 6,
            InventorySlot::Legs => 7,
            InventorySlot::Feet => 8,
            InventorySlot::Ring => 9,
            InventorySlot::Ammo => 10,
        }
    }

    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            1 => Some(InventorySlot::Head),
            2 => Some(InventorySlot::Necklace),
            3 => Some(InventorySlot::Backpack),
            4 => Some(InventorySlot::Armor),
            5 => Some(InventorySlot::RightHand),
            6 => Some(InventorySlot::LeftHand),
            7 => Some(InventorySlot::Legs),
            8 => Some(InventorySlot::Feet),
            9 => Some(InventorySlot::Ring),
            10 => Some(InventorySlot::Ammo),
            _ => None,
        }
    }

    /// Slot-affinity bit an item needs to be dressed here.
    pub fn position_flag(self) -> SlotPositions {
        match self {
            InventorySlot::Head => SlotPositions::HEAD,
            InventorySlot::Necklace => SlotPositions::NECKLACE,
            InventorySlot::Backpack => SlotPositions::BACKPACK,
            InventorySlot::Armor => SlotPositions::ARMOR,
            InventorySlot::RightHand => SlotPositions::RIGHT,
            InventorySlot::LeftHand => SlotPositions::LEFT,
            InventorySlot::Legs => SlotPositions::LEGS,
            InventorySlot::Feet => SlotPositions::FEET,
            InventorySlot::Ring => SlotPositions::RING,
            InventorySlot::Ammo => SlotPositions::AMMO,
        }
    }

    fn offset(self) -> usize {
        self.index() as usize - 1
    }
}

pub const INVENTORY_SLOTS: [InventorySlot; 10] = [
    InventorySlot::Head,
    InventorySlot::Necklace,
    InventorySlot::Backpack,
    InventorySlot::Armor,
    InventorySlot::RightHand,
    InventorySlot::LeftHand,
    InventorySlot::Legs,
    InventorySlot::Feet,
    InventorySlot::Ring,
    InventorySlot::Ammo,
];

/// Body slots of one player; each slot references an item in the arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    slots: [Option<ItemId>; InventorySlot::COUNT],
}

impl Default for Inventory {
    fn default() -> Self {
        Self {
            slots: [None; InventorySlot::COUNT],
        }
    }
}

impl Inventory {
    pub fn slot(&self, slot: InventorySlot) -> Option<ItemId> {
        self.slots[slot.offset()]
    }

    pub fn set_slot(&mut self, slot: InventorySlot, item: Option<ItemId>) -> Option<ItemId> {
        std::mem::replace(&mut self.slots[slot.offset()], item)
    }

    pub fn take_slot(&mut self, slot: InventorySlot) -> Option<ItemId> {
        self.slots[slot.offset()].take()
    }

    pub fn slot_of(&self, item: ItemId) -> Option<InventorySlot> {
        INVENTORY_SLOTS
            .into_iter()
            .find(|slot| self.slot(*slot) == Some(item))
    }

    pub fn iter(&self) -> impl Iterator<Item = (InventorySlot, ItemId)> + '_ {
        INVENTORY_SLOTS
            .into_iter()
            .filter_map(|slot| self.slot(slot).map(|item| (slot, item)))
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_indices_roundtrip() {
        for slot in INVENTORY_SLOTS {
            assert_eq!(InventorySlot::from_index(slot.index()), Some(slot));
        }
        assert_eq!(InventorySlot::from_index(0), None);
        assert_eq!(InventorySlot::from_index(11), None);
    }

    #[test]
    fn set_slot_returns_previous_occupant() {
        let mut inventory = Inventory::default();
        let helmet = ItemId(10);
        let other = ItemId(11);
        assert_eq!(inventory.set_slot(InventorySlot::Head, Some(helmet)), None);
        assert_eq!(inventory.set_slot(InventorySlot::Head, Some(other)), Some(helmet));
        assert_eq!(inventory.slot_of(other), Some(InventorySlot::Head));
        assert_eq!(inventory.take_slot(InventorySlot::Head), Some(other));
        assert!(inventory.is_empty());
    }

    #[test]
    fn iter_lists_occupied_slots_in_order() {
        let mut inventory = Inventory::default();
        inventory.set_slot(InventorySlot::Ammo, Some(ItemId(3)));
        inventory.set_slot(InventorySlot::Head, Some(ItemId(1)));
        let occupied: Vec<_> = inventory.iter().collect();
        assert_eq!(
            occupied,
            vec![
                (InventorySlot::Head, ItemId(1)),
                (InventorySlot::Ammo, ItemId(3))
            ]
        );
    }
}
