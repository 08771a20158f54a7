use crate::config::GameConfig;
use crate::entities::inventory::InventorySlot;
use crate::entities::item::{ItemId, ItemTypeId};
use crate::entities::player::PlayerId;
use crate::world::cylinder::{CylinderId, SlotIndex};
use crate::world::item_types::ItemTypeIndex;
use crate::world::position::Position;
use crate::world::state::WorldState;

pub const GROUND: ItemTypeId = ItemTypeId(102);
pub const WALL: ItemTypeId = ItemTypeId(1026);
pub const LAMP: ItemTypeId = ItemTypeId(2062);
pub const TORCH: ItemTypeId = ItemTypeId(2050);
pub const BURNT_TORCH: ItemTypeId = ItemTypeId(2051);
pub const GOLD: ItemTypeId = ItemTypeId(3031);
pub const PLATINUM: ItemTypeId = ItemTypeId(3035);
pub const CRYSTAL: ItemTypeId = ItemTypeId(3043);
pub const BAG: ItemTypeId = ItemTypeId(2853);
pub const BACKPACK: ItemTypeId = ItemTypeId(2854);
pub const QUIVER: ItemTypeId = ItemTypeId(35562);
pub const ARROW: ItemTypeId = ItemTypeId(3447);
pub const SWORD: ItemTypeId = ItemTypeId(3264);
pub const TWO_HANDED_SWORD: ItemTypeId = ItemTypeId(3265);
pub const BOW: ItemTypeId = ItemTypeId(3350);
pub const SHIELD: ItemTypeId = ItemTypeId(3412);
pub const HELMET: ItemTypeId = ItemTypeId(3355);
pub const ANVIL: ItemTypeId = ItemTypeId(2555);
pub const RUNE: ItemTypeId = ItemTypeId(3155);
pub const EMPTY_RUNE: ItemTypeId = ItemTypeId(3147);
pub const STORE_POTION: ItemTypeId = ItemTypeId(23373);
pub const STORE_BAG: ItemTypeId = ItemTypeId(23377);
pub const REWARD_CONTAINER: ItemTypeId = ItemTypeId(19202);

pub const TEMPLE: Position = Position { x: 100, y: 100, z: 7 };
pub const PLAYER_CAPACITY: u32 = 40_000;

const FIXTURE_ITEMS: &str = r#"
items:
  - { id: 102, name: grass, kind: ground, pickupable: false, moveable: false }
  - { id: 1026, name: stone wall, pickupable: false, moveable: false, block_solid: true }
  - { id: 2062, name: wall lamp, pickupable: false, moveable: false, always_on_top: true }
  - { id: 2050, name: lit torch, weight: 500, decay_to: 2051, duration_secs: 2 }
  - { id: 2051, name: burnt torch, weight: 400, decay_to: 0, duration_secs: 1 }
  - { id: 3031, name: gold coin, stackable: true, weight: 10, worth: 1 }
  - { id: 3035, name: platinum coin, stackable: true, weight: 10, worth: 100 }
  - { id: 3043, name: crystal coin, stackable: true, weight: 10, worth: 10000 }
  - { id: 2853, name: bag, kind: container, capacity: 8, weight: 800, slots: [backpack] }
  - { id: 2854, name: backpack, kind: container, capacity: 20, weight: 1800, slots: [backpack] }
  - { id: 35562, name: quiver, kind: container, capacity: 5, weight: 600, weapon_type: quiver, slots: [right] }
  - { id: 3447, name: arrow, stackable: true, weight: 70, weapon_type: ammo, slots: [ammo] }
  - { id: 3264, name: sword, kind: weapon, weight: 3500, weapon_type: sword }
  - { id: 3265, name: two handed sword, kind: weapon, weight: 7000, weapon_type: sword, slots: [two_hand] }
  - { id: 3350, name: bow, kind: weapon, weight: 3100, weapon_type: distance, slots: [two_hand] }
  - { id: 3412, name: wooden shield, kind: armor, weight: 4000, weapon_type: shield }
  - { id: 3355, name: leather helmet, kind: armor, weight: 2200, slots: [head] }
  - { id: 2555, name: anvil, weight: 500000 }
  - { id: 3155, name: sudden death rune, kind: rune, weight: 70, charges: 3 }
  - { id: 3147, name: blank rune, kind: rune, weight: 120 }
  - { id: 23373, name: store potion, store_item: true, weight: 180 }
  - { id: 23377, name: store bag, kind: container, capacity: 8, store_item: true, weight: 800 }
  - { id: 19202, name: reward container, kind: container, capacity: 30 }
  - { id: 460, name: browse field, kind: container, capacity: 30, pickupable: false, moveable: false }
  - { id: 3497, name: locker, kind: depot_locker, capacity: 19, pickupable: false, moveable: false }
  - { id: 14404, name: inbox, kind: inbox, capacity: 30, pickupable: false, moveable: false }
  - { id: 14405, name: market, pickupable: false, moveable: false }
  - { id: 23396, name: store inbox, kind: store_inbox, capacity: 20, pickupable: false, moveable: false }
"#;

pub fn fixture_items() -> ItemTypeIndex {
    ItemTypeIndex::from_yaml(FIXTURE_ITEMS).expect("fixture items")
}

/// World with default rules and a small patch of grass around the temple.
pub fn fixture_world() -> WorldState {
    let mut world = WorldState::new(GameConfig::default(), fixture_items());
    for dx in 0..3 {
        for dy in 0..3 {
            let position = Position {
                x: TEMPLE.x + dx,
                y: TEMPLE.y + dy,
                z: TEMPLE.z,
            };
            world.add_tile(position, Some(GROUND));
        }
    }
    world
}

pub fn spawn_player(world: &mut WorldState) -> PlayerId {
    world.login_player("Tester", TEMPLE, PLAYER_CAPACITY)
}

pub fn equip(world: &mut WorldState, player: PlayerId, slot: InventorySlot, item: ItemId) {
    world.add_thing(CylinderId::Player(player), SlotIndex::At(slot.index()), item);
}

/// Puts `count` loose swords into a depot box.
pub fn fill_depot(world: &mut WorldState, chest: ItemId, count: u32) {
    for _ in 0..count {
        let sword = world.create_item(SWORD, 1).expect("sword");
        world.add_thing(CylinderId::Container(chest), SlotIndex::Wherever, sword);
    }
}

impl WorldState {
    pub fn spawn_container_on_tile(&mut self, type_id: ItemTypeId) -> ItemId {
        let item = self.create_item(type_id, 1).expect("container type");
        self.add_thing(CylinderId::Tile(TEMPLE), SlotIndex::Wherever, item);
        item
    }

    pub fn spawn_on_tile(&mut self, type_id: ItemTypeId, count: u16) -> ItemId {
        let item = self.create_item(type_id, count).expect("item type");
        self.add_thing(CylinderId::Tile(TEMPLE), SlotIndex::Wherever, item);
        item
    }

    pub fn put_into(&mut self, container: ItemId, type_id: ItemTypeId, count: u16) -> ItemId {
        let item = self.create_item(type_id, count).expect("item type");
        self.add_thing(CylinderId::Container(container), SlotIndex::Wherever, item);
        item
    }
}
