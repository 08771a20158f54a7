use crate::entities::item::{Item, ItemId, ItemKind};
use crate::entities::player::PlayerId;
use crate::world::cylinder::{Cylinder, CylinderFlags, CylinderId, SlotIndex};
use crate::world::position::Position;
use crate::world::return_value::ReturnValue;
use crate::world::state::WorldState;

pub const MAX_TILE_ITEMS: usize = 0xFFFF;

/// One map field. Items are indexed ground first, then the always-on-top
/// segment, then the ordinary items with the most recent one first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tile {
    pub position: Position,
    ground: Option<ItemId>,
    top_items: Vec<ItemId>,
    down_items: Vec<ItemId>,
}

impl Tile {
    pub fn new(position: Position) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn ground(&self) -> Option<ItemId> {
        self.ground
    }

    pub fn has_ground(&self) -> bool {
        self.ground.is_some()
    }

    pub fn top_items(&self) -> &[ItemId] {
        &self.top_items
    }

    pub fn down_items(&self) -> &[ItemId] {
        &self.down_items
    }

    /// Most recently dropped ordinary item.
    pub fn top_down_item(&self) -> Option<ItemId> {
        self.down_items.first().copied()
    }

    pub fn items(&self) -> Vec<ItemId> {
        self.ground
            .iter()
            .chain(self.top_items.iter())
            .chain(self.down_items.iter())
            .copied()
            .collect()
    }

    pub fn item_count(&self) -> usize {
        usize::from(self.ground.is_some()) + self.top_items.len() + self.down_items.len()
    }

    fn has_block_solid(&self, world: &WorldState) -> bool {
        self.items()
            .into_iter()
            .filter_map(|id| world.item(id))
            .any(|item| world.item_type(item).block_solid)
    }

    pub(crate) fn place(&mut self, kind: ItemKind, always_on_top: bool, item: ItemId) {
        if kind == ItemKind::Ground && self.ground.is_none() {
            self.ground = Some(item);
        } else if always_on_top {
            self.top_items.push(item);
        } else {
            self.down_items.insert(0, item);
        }
    }

    /// Puts `item` back at a flat index it was removed from.
    pub(crate) fn place_at(&mut self, index: usize, always_on_top: bool, item: ItemId) {
        let offset = usize::from(self.ground.is_some());
        if always_on_top {
            let at = index.saturating_sub(offset).min(self.top_items.len());
            self.top_items.insert(at, item);
        } else {
            let at = index
                .saturating_sub(offset + self.top_items.len())
                .min(self.down_items.len());
            self.down_items.insert(at, item);
        }
    }

    pub(crate) fn remove(&mut self, item: ItemId) -> Option<usize> {
        let index = self.items().iter().position(|entry| *entry == item)?;
        if self.ground == Some(item) {
            self.ground = None;
        } else if let Some(at) = self.top_items.iter().position(|entry| *entry == item) {
            self.top_items.remove(at);
        } else if let Some(at) = self.down_items.iter().position(|entry| *entry == item) {
            self.down_items.remove(at);
        }
        Some(index)
    }

    pub(crate) fn replace_at(&mut self, index: usize, item: ItemId) -> Option<ItemId> {
        let offset = usize::from(self.ground.is_some());
        if offset == 1 && index == 0 {
            return self.ground.replace(item);
        }
        let index = index - offset;
        if let Some(slot) = self.top_items.get_mut(index) {
            return Some(std::mem::replace(slot, item));
        }
        let slot = self.down_items.get_mut(index - self.top_items.len())?;
        Some(std::mem::replace(slot, item))
    }
}

impl Cylinder for Tile {
    fn cylinder_id(&self) -> CylinderId {
        CylinderId::Tile(self.position)
    }

    fn query_add(
        &self,
        world: &WorldState,
        _index: SlotIndex,
        item: &Item,
        _count: u32,
        flags: CylinderFlags,
        _actor: Option<PlayerId>,
    ) -> ReturnValue {
        if self.item_count() >= MAX_TILE_ITEMS {
            return ReturnValue::NotPossible;
        }
        if flags.contains(CylinderFlags::NO_LIMIT) {
            return ReturnValue::NoError;
        }
        let item_type = world.item_type(item);
        if item_type.store_item {
            return ReturnValue::ItemCannotBeMovedHere;
        }
        if !self.has_ground() && item_type.kind != ItemKind::Ground {
            return ReturnValue::NotPossible;
        }
        if !flags.contains(CylinderFlags::IGNORE_BLOCK_ITEM) && self.has_block_solid(world) {
            return ReturnValue::NotEnoughRoom;
        }
        ReturnValue::NoError
    }

    fn query_max_count(
        &self,
        _world: &WorldState,
        _index: SlotIndex,
        _item: &Item,
        count: u32,
        _flags: CylinderFlags,
    ) -> (ReturnValue, u32) {
        (ReturnValue::NoError, count.max(1))
    }

    fn query_remove(
        &self,
        world: &WorldState,
        item: &Item,
        count: u32,
        flags: CylinderFlags,
        _actor: Option<PlayerId>,
    ) -> ReturnValue {
        if self.thing_index(world, item.id).is_none() {
            return ReturnValue::NotPossible;
        }
        let item_type = world.item_type(item);
        if count == 0 || (item_type.stackable && count > u32::from(item.count)) {
            return ReturnValue::NotPossible;
        }
        if !item_type.moveable && !flags.contains(CylinderFlags::IGNORE_NOT_MOVEABLE) {
            return ReturnValue::NotMoveable;
        }
        ReturnValue::NoError
    }

    fn query_destination(
        &self,
        _world: &WorldState,
        _index: &mut SlotIndex,
        _item: &Item,
        dest_item: &mut Option<ItemId>,
        _flags: &mut CylinderFlags,
    ) -> CylinderId {
        *dest_item = self.top_down_item();
        self.cylinder_id()
    }

    fn thing_index(&self, _world: &WorldState, item: ItemId) -> Option<u32> {
        self.items()
            .iter()
            .position(|entry| *entry == item)
            .map(|index| index as u32)
    }

    fn first_index(&self) -> u32 {
        0
    }

    fn last_index(&self, _world: &WorldState) -> u32 {
        self.item_count() as u32
    }

    fn thing(&self, _world: &WorldState, index: u32) -> Option<ItemId> {
        self.items().get(index as usize).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::test_support::{fixture_world, GOLD, GROUND, STORE_POTION, SWORD, LAMP, WALL};

    #[test]
    fn ordering_keeps_ground_then_top_then_newest_first() {
        let mut world = fixture_world();
        let position = Position { x: 200, y: 200, z: 7 };
        world.add_tile(position, Some(GROUND));
        let tile_id = CylinderId::Tile(position);
        let lamp = world.create_item(LAMP, 1).expect("lamp");
        let sword = world.create_item(SWORD, 1).expect("sword");
        let coins = world.create_item(GOLD, 5).expect("gold");
        world.add_thing(tile_id, SlotIndex::Wherever, sword);
        world.add_thing(tile_id, SlotIndex::Wherever, lamp);
        world.add_thing(tile_id, SlotIndex::Wherever, coins);

        let tile = world.tile(position).expect("tile");
        let items = tile.items();
        assert_eq!(items.len(), 4);
        assert_eq!(items[1], lamp);
        assert_eq!(items[2], coins);
        assert_eq!(items[3], sword);
        assert_eq!(tile.top_down_item(), Some(coins));
    }

    #[test]
    fn blocking_and_missing_ground_reject_items() {
        let mut world = fixture_world();
        let open = Position { x: 201, y: 200, z: 7 };
        let void = Position { x: 202, y: 200, z: 7 };
        world.add_tile(open, Some(GROUND));
        world.add_tile(void, None);
        let wall = world.create_item(WALL, 1).expect("wall");
        world.add_thing(CylinderId::Tile(open), SlotIndex::Wherever, wall);

        let sword = world.create_item(SWORD, 1).expect("sword");
        let sword = world.item(sword).expect("sword");
        let blocked = world.tile(open).expect("tile");
        let empty = world.tile(void).expect("tile");
        assert_eq!(
            blocked.query_add(&world, SlotIndex::Wherever, sword, 1, CylinderFlags::empty(), None),
            ReturnValue::NotEnoughRoom
        );
        assert!(blocked
            .query_add(&world, SlotIndex::Wherever, sword, 1, CylinderFlags::IGNORE_BLOCK_ITEM, None)
            .is_ok());
        assert_eq!(
            empty.query_add(&world, SlotIndex::Wherever, sword, 1, CylinderFlags::empty(), None),
            ReturnValue::NotPossible
        );
        assert!(empty
            .query_add(&world, SlotIndex::Wherever, sword, 1, CylinderFlags::NO_LIMIT, None)
            .is_ok());
    }

    #[test]
    fn store_items_stay_off_the_map() {
        let mut world = fixture_world();
        let position = Position { x: 203, y: 200, z: 7 };
        world.add_tile(position, Some(GROUND));
        let potion = world.create_item(STORE_POTION, 1).expect("potion");
        let potion = world.item(potion).expect("potion");
        let tile = world.tile(position).expect("tile");
        assert_eq!(
            tile.query_add(&world, SlotIndex::Wherever, potion, 1, CylinderFlags::empty(), None),
            ReturnValue::ItemCannotBeMovedHere
        );
        assert_eq!(
            tile.query_max_count(&world, SlotIndex::Wherever, potion, 0, CylinderFlags::empty()),
            (ReturnValue::NoError, 1)
        );
    }
}
