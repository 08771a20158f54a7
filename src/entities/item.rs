use crate::world::cylinder::CylinderId;
use serde::Deserialize;
use std::sync::atomic::{AtomicU32, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u32);

static NEXT_ITEM_ID: AtomicU32 = AtomicU32::new(1);

impl ItemId {
    pub fn next() -> Self {
        let id = NEXT_ITEM_ID.fetch_add(1, Ordering::Relaxed);
        ItemId(id)
    }

    pub fn is_assigned(self) -> bool {
        self.0 != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct ItemTypeId(pub u16);

/// Broad category of an item type. Transforms inside one category keep the
/// item instance; transforms across categories replace it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Ground,
    Container,
    DepotChest,
    DepotLocker,
    Inbox,
    StoreInbox,
    Weapon,
    Armor,
    Consumable,
    Rune,
    #[default]
    Misc,
}

impl ItemKind {
    pub fn is_container(self) -> bool {
        matches!(
            self,
            ItemKind::Container
                | ItemKind::DepotChest
                | ItemKind::DepotLocker
                | ItemKind::Inbox
                | ItemKind::StoreInbox
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DecayState {
    #[default]
    Idle,
    Decaying,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ItemAttribute {
    /// Remaining lifetime in milliseconds.
    Duration(i64),
    Charges(u16),
    UniqueId(u16),
    ActionId(u16),
    Augmented,
    Imbuement(u16),
}

/// One item record in the world arena. `parent` is the only ownership edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub type_id: ItemTypeId,
    pub count: u16,
    pub parent: Option<CylinderId>,
    pub attributes: Vec<ItemAttribute>,
    pub decaying: DecayState,
}

impl Item {
    pub fn new(type_id: ItemTypeId, count: u16) -> Self {
        Self {
            id: ItemId::next(),
            type_id,
            count,
            parent: None,
            attributes: Vec::new(),
            decaying: DecayState::Idle,
        }
    }

    /// Fresh instance with the same type and attributes, no owner.
    pub fn clone_detached(&self, count: u16) -> Self {
        Self {
            id: ItemId::next(),
            type_id: self.type_id,
            count,
            parent: None,
            attributes: self.attributes.clone(),
            decaying: DecayState::Idle,
        }
    }

    pub fn stacks_with(&self, other: &Item) -> bool {
        self.id != other.id
            && self.type_id == other.type_id
            && same_attributes(&self.attributes, &other.attributes)
    }

    pub fn duration(&self) -> i64 {
        self.attributes
            .iter()
            .find_map(|attr| match attr {
                ItemAttribute::Duration(ms) => Some(*ms),
                _ => None,
            })
            .unwrap_or(0)
    }

    pub fn set_duration(&mut self, ms: i64) {
        self.attributes
            .retain(|attr| !matches!(attr, ItemAttribute::Duration(_)));
        if ms > 0 {
            self.attributes.push(ItemAttribute::Duration(ms));
        }
    }

    pub fn decrease_duration(&mut self, ms: i64) {
        let remaining = self.duration() - ms;
        self.set_duration(remaining.max(0));
    }

    pub fn charges(&self) -> Option<u16> {
        self.attributes.iter().find_map(|attr| match attr {
            ItemAttribute::Charges(charges) => Some(*charges),
            _ => None,
        })
    }

    pub fn set_charges(&mut self, charges: u16) {
        self.attributes
            .retain(|attr| !matches!(attr, ItemAttribute::Charges(_)));
        self.attributes.push(ItemAttribute::Charges(charges));
    }

    pub fn unique_id(&self) -> Option<u16> {
        self.attributes.iter().find_map(|attr| match attr {
            ItemAttribute::UniqueId(id) => Some(*id),
            _ => None,
        })
    }

    pub fn is_augmented(&self) -> bool {
        self.attributes
            .iter()
            .any(|attr| matches!(attr, ItemAttribute::Augmented))
    }

    pub fn has_imbuements(&self) -> bool {
        self.attributes
            .iter()
            .any(|attr| matches!(attr, ItemAttribute::Imbuement(_)))
    }

    /// Stack count for stackables, remaining charges for charged items.
    pub fn sub_type(&self, stackable: bool) -> u16 {
        if stackable {
            self.count
        } else {
            self.charges().unwrap_or(0)
        }
    }
}

/// Attribute lists compare as multisets.
fn same_attributes(left: &[ItemAttribute], right: &[ItemAttribute]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut left = left.to_vec();
    let mut right = right.to_vec();
    left.sort();
    right.sort();
    left == right
}
