use crate::config::ConfigError;
use crate::entities::item::{ItemKind, ItemTypeId};
use bitflags::bitflags;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

pub const ITEM_BROWSEFIELD: ItemTypeId = ItemTypeId(460);
pub const ITEM_REWARD_CONTAINER: ItemTypeId = ItemTypeId(19202);

bitflags! {
    /// Body slots an item may be dressed in.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct SlotPositions: u16 {
        const HEAD = 1 << 0;
        const NECKLACE = 1 << 1;
        const BACKPACK = 1 << 2;
        const ARMOR = 1 << 3;
        const RIGHT = 1 << 4;
        const LEFT = 1 << 5;
        const LEGS = 1 << 6;
        const FEET = 1 << 7;
        const RING = 1 << 8;
        const AMMO = 1 << 9;
        const DEPOT = 1 << 10;
        const TWO_HAND = 1 << 11;
        const HAND = Self::LEFT.bits() | Self::RIGHT.bits();
    }
}

impl SlotPositions {
    fn from_slot_name(name: &str) -> Option<Self> {
        let slot = match name.trim().to_ascii_lowercase().as_str() {
            "head" => SlotPositions::HEAD,
            "necklace" => SlotPositions::NECKLACE,
            "backpack" => SlotPositions::BACKPACK,
            "armor" | "body" => SlotPositions::ARMOR,
            "right" | "right_hand" => SlotPositions::RIGHT,
            "left" | "left_hand" => SlotPositions::LEFT,
            "hand" => SlotPositions::HAND,
            "two_hand" | "two-handed" => SlotPositions::TWO_HAND | SlotPositions::HAND,
            "legs" => SlotPositions::LEGS,
            "feet" => SlotPositions::FEET,
            "ring" => SlotPositions::RING,
            "ammo" => SlotPositions::AMMO,
            "depot" => SlotPositions::DEPOT,
            _ => return None,
        };
        Some(slot)
    }

    /// Slot affinity of an item type; a type without explicit slots can be
    /// held in either hand.
    pub fn parse(names: &[String]) -> Result<Self, String> {
        if names.is_empty() {
            return Ok(SlotPositions::HAND);
        }
        let mut slots = SlotPositions::empty();
        for name in names {
            let slot = SlotPositions::from_slot_name(name)
                .ok_or_else(|| format!("unknown slot {:?}", name))?;
            slots |= slot;
        }
        Ok(slots)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponType {
    #[default]
    None,
    Sword,
    Club,
    Axe,
    Shield,
    Distance,
    Wand,
    Ammo,
    Quiver,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemType {
    pub id: ItemTypeId,
    pub name: String,
    pub kind: ItemKind,
    pub stackable: bool,
    pub pickupable: bool,
    pub moveable: bool,
    pub weight: u32,
    pub capacity: u16,
    pub always_on_top: bool,
    pub block_solid: bool,
    pub store_item: bool,
    pub slots: SlotPositions,
    pub weapon_type: WeaponType,
    pub worth: u32,
    /// `Some(ItemTypeId(0))` removes the item once its duration runs out.
    pub decay_to: Option<ItemTypeId>,
    pub duration_secs: u32,
    pub charges: u16,
}

impl ItemType {
    pub fn is_container(&self) -> bool {
        self.kind.is_container()
    }

    pub fn has_sub_type(&self) -> bool {
        self.stackable || self.charges > 0
    }

    pub fn duration_ms(&self) -> i64 {
        i64::from(self.duration_secs) * 1000
    }
}

#[derive(Debug, Deserialize)]
struct ItemsFile {
    #[serde(default)]
    items: Vec<ItemTypeRecord>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct ItemTypeRecord {
    id: u16,
    name: String,
    #[serde(default)]
    kind: ItemKind,
    #[serde(default)]
    stackable: bool,
    #[serde(default = "default_true")]
    pickupable: bool,
    #[serde(default = "default_true")]
    moveable: bool,
    #[serde(default)]
    weight: u32,
    #[serde(default)]
    capacity: u16,
    #[serde(default)]
    always_on_top: bool,
    #[serde(default)]
    block_solid: bool,
    #[serde(default)]
    store_item: bool,
    #[serde(default)]
    slots: Vec<String>,
    #[serde(default)]
    weapon_type: WeaponType,
    #[serde(default)]
    worth: u32,
    #[serde(default)]
    decay_to: Option<u16>,
    #[serde(default)]
    duration_secs: u32,
    #[serde(default)]
    charges: u16,
}

impl ItemTypeRecord {
    fn into_item_type(self) -> Result<ItemType, ConfigError> {
        let slots = SlotPositions::parse(&self.slots).map_err(|reason| ConfigError::InvalidValue {
            field: format!("items[{}].slots", self.id),
            reason,
        })?;
        if self.kind.is_container() && self.capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: format!("items[{}].capacity", self.id),
                reason: "containers need a capacity".to_string(),
            });
        }
        Ok(ItemType {
            id: ItemTypeId(self.id),
            name: self.name,
            kind: self.kind,
            stackable: self.stackable,
            pickupable: self.pickupable,
            moveable: self.moveable,
            weight: self.weight,
            capacity: self.capacity,
            always_on_top: self.always_on_top,
            block_solid: self.block_solid,
            store_item: self.store_item,
            slots,
            weapon_type: self.weapon_type,
            worth: self.worth,
            decay_to: self.decay_to.map(ItemTypeId),
            duration_secs: self.duration_secs,
            charges: self.charges,
        })
    }
}

#[derive(Debug, Default, Clone)]
pub struct ItemTypeIndex {
    types: HashMap<ItemTypeId, ItemType>,
    /// Currency types ordered by worth, highest first.
    currency: Vec<(u32, ItemTypeId)>,
    unknown: ItemType,
}

impl ItemTypeIndex {
    pub fn get(&self, id: ItemTypeId) -> Option<&ItemType> {
        self.types.get(&id)
    }

    /// Like [`get`](Self::get) but falls back to an inert placeholder type.
    pub fn lookup(&self, id: ItemTypeId) -> &ItemType {
        self.types.get(&id).unwrap_or(&self.unknown)
    }

    pub fn insert(&mut self, item: ItemType) -> Result<(), ConfigError> {
        if self.types.contains_key(&item.id) {
            return Err(ConfigError::DuplicateItemType(item.id.0));
        }
        if item.worth > 0 {
            self.currency.push((item.worth, item.id));
            self.currency.sort_by(|a, b| b.0.cmp(&a.0));
        }
        self.types.insert(item.id, item);
        Ok(())
    }

    pub fn currency(&self) -> &[(u32, ItemTypeId)] {
        &self.currency
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let file: ItemsFile = serde_yaml::from_str(text)?;
        let mut index = ItemTypeIndex::default();
        for record in file.items {
            index.insert(record.into_item_type()?)?;
        }
        index.check_references()?;
        Ok(index)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    fn check_references(&self) -> Result<(), ConfigError> {
        for item in self.types.values() {
            if let Some(target) = item.decay_to {
                if target.0 != 0 && !self.types.contains_key(&target) {
                    return Err(ConfigError::UnknownReference {
                        from: item.id.0,
                        to: target.0,
                    });
                }
            }
        }
        Ok(())
    }
}
