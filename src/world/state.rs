use crate::config::GameConfig;
use crate::entities::container::{Container, ContainerKind};
use crate::entities::inventory::InventorySlot;
use crate::entities::item::{Item, ItemId, ItemKind, ItemTypeId};
use crate::entities::player::{Player, PlayerId};
use crate::world::browse::BrowseField;
use crate::world::cylinder::{Cylinder, CylinderId, CylinderLink, SlotIndex};
use crate::world::decay::DecayScheduler;
use crate::world::events::{MoveEvents, Notification, NotificationKind};
use crate::world::item_types::{ItemType, ItemTypeIndex};
use crate::world::position::Position;
use crate::world::tile::Tile;
use std::collections::HashMap;
use std::fmt;

/// The whole ownership tree. Items live in one arena keyed by [`ItemId`];
/// containers, tiles and players hold ids only, and `Item::parent` is the
/// single back edge.
pub struct WorldState {
    pub config: GameConfig,
    pub item_types: ItemTypeIndex,
    items: HashMap<ItemId, Item>,
    containers: HashMap<ItemId, Container>,
    tiles: HashMap<Position, Tile>,
    players: HashMap<PlayerId, Player>,
    next_player_id: u32,
    pub(crate) browse_fields: HashMap<Position, BrowseField>,
    pub(crate) decay: DecayScheduler,
    notifications: Vec<Notification>,
    pub(crate) move_events: Option<Box<dyn MoveEvents + Send>>,
}

impl fmt::Debug for WorldState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorldState")
            .field("items", &self.items.len())
            .field("containers", &self.containers.len())
            .field("tiles", &self.tiles.len())
            .field("players", &self.players.len())
            .field("browse_fields", &self.browse_fields.len())
            .finish_non_exhaustive()
    }
}

impl WorldState {
    pub fn new(config: GameConfig, item_types: ItemTypeIndex) -> Self {
        let decay = DecayScheduler::new(config.decay_interval_ms, config.decay_buckets);
        Self {
            config,
            item_types,
            items: HashMap::new(),
            containers: HashMap::new(),
            tiles: HashMap::new(),
            players: HashMap::new(),
            next_player_id: 1,
            browse_fields: HashMap::new(),
            decay,
            notifications: Vec::new(),
            move_events: None,
        }
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.get_mut(&id)
    }

    pub fn item_type(&self, item: &Item) -> &ItemType {
        self.item_types.lookup(item.type_id)
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn container(&self, id: ItemId) -> Option<&Container> {
        self.containers.get(&id)
    }

    pub fn container_mut(&mut self, id: ItemId) -> Option<&mut Container> {
        self.containers.get_mut(&id)
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn tile(&self, position: Position) -> Option<&Tile> {
        self.tiles.get(&position)
    }

    /// Creates the tile at `position`, optionally with a fresh ground item.
    pub fn add_tile(&mut self, position: Position, ground: Option<ItemTypeId>) {
        self.tiles.entry(position).or_insert_with(|| Tile::new(position));
        if let Some(ground) = ground.and_then(|type_id| self.create_item(type_id, 1)) {
            self.add_thing(CylinderId::Tile(position), SlotIndex::Wherever, ground);
        }
    }

    pub fn cylinder(&self, id: CylinderId) -> Option<&dyn Cylinder> {
        match id {
            CylinderId::Tile(position) => self.tiles.get(&position).map(|tile| tile as &dyn Cylinder),
            CylinderId::Container(item) => self
                .containers
                .get(&item)
                .map(|container| container as &dyn Cylinder),
            CylinderId::Player(player) => self
                .players
                .get(&player)
                .map(|player| player as &dyn Cylinder),
        }
    }

    /// Logical parent. Depot boxes and the inbox report the parent of their
    /// locker, which is `None` for a root locker.
    pub fn cylinder_parent(&self, cylinder: CylinderId) -> Option<CylinderId> {
        let CylinderId::Container(id) = cylinder else {
            return None;
        };
        let parent = self.item(id)?.parent?;
        let skips_locker = self
            .container(id)
            .map(|container| container.is_depot_chest() || container.is_inbox())
            .unwrap_or(false);
        if skips_locker {
            if let Some(locker) = parent.container() {
                let is_locker = matches!(
                    self.container(locker).map(|container| &container.kind),
                    Some(ContainerKind::DepotLocker { .. })
                );
                if is_locker {
                    return self.item(locker).and_then(|item| item.parent);
                }
            }
        }
        Some(parent)
    }

    /// Parent chain of `cylinder`, nearest first.
    pub fn ancestors(&self, cylinder: CylinderId) -> Vec<CylinderId> {
        let limit = self.items.len() + 1;
        let mut chain = Vec::new();
        let mut current = self.cylinder_parent(cylinder);
        while let Some(parent) = current {
            if chain.len() > limit {
                tracing::warn!(?cylinder, "parent chain does not terminate");
                break;
            }
            chain.push(parent);
            current = self.cylinder_parent(parent);
        }
        chain
    }

    /// Highest cylinder below the map: the carrying player, a container lying
    /// on a tile, or a root container such as a depot locker.
    pub fn top_parent(&self, cylinder: CylinderId) -> CylinderId {
        let mut current = cylinder;
        for _ in 0..=self.items.len() {
            match self.cylinder_parent(current) {
                None | Some(CylinderId::Tile(_)) => return current,
                Some(parent) => current = parent,
            }
        }
        current
    }

    /// Map position a cylinder is seen at, if it has one.
    pub fn cylinder_position(&self, cylinder: CylinderId) -> Option<Position> {
        match cylinder {
            CylinderId::Tile(position) => Some(position),
            CylinderId::Player(player) => self.player(player).map(|player| player.position),
            CylinderId::Container(id) => {
                if let Some(ContainerKind::BrowseField { position }) =
                    self.container(id).map(|container| &container.kind)
                {
                    return Some(*position);
                }
                let top = self.top_parent(cylinder);
                match top {
                    CylinderId::Player(_) | CylinderId::Tile(_) => self.cylinder_position(top),
                    CylinderId::Container(root) => {
                        if let Some(CylinderId::Tile(position)) = self.cylinder_parent(top) {
                            return Some(position);
                        }
                        match self.container(root).map(|container| &container.kind) {
                            Some(ContainerKind::DepotChest { owner: Some(owner), .. })
                            | Some(ContainerKind::DepotLocker { owner: Some(owner) }) => {
                                self.player(*owner).map(|player| player.position)
                            }
                            _ => None,
                        }
                    }
                }
            }
        }
    }

    pub fn is_removed(&self, item: ItemId) -> bool {
        self.item(item).map(|item| item.parent.is_none()).unwrap_or(true)
    }

    /// Units `item` contributes when counting its type, zero when `sub_type`
    /// does not match.
    pub fn count_by_type(&self, item: &Item, sub_type: Option<u16>) -> u32 {
        match sub_type {
            Some(wanted) if wanted != item.sub_type(self.item_type(item).stackable) => 0,
            _ => u32::from(item.count.max(1)),
        }
    }

    /// Weight of an item including everything nested inside it.
    pub fn item_weight(&self, id: ItemId) -> u32 {
        let Some(item) = self.item(id) else {
            return 0;
        };
        let item_type = self.item_type(item);
        let own = if item_type.stackable {
            item_type.weight.saturating_mul(u32::from(item.count))
        } else {
            item_type.weight
        };
        let nested: u32 = self
            .container(id)
            .map(|container| container.items().iter().map(|child| self.item_weight(*child)).sum())
            .unwrap_or(0);
        own.saturating_add(nested)
    }

    /// Builds a detached item of `type_id`. Unknown types yield `None`.
    pub fn create_item(&mut self, type_id: ItemTypeId, count: u16) -> Option<ItemId> {
        let item_type = self.item_types.get(type_id)?;
        let max_stack = u16::try_from(self.config.max_stack).unwrap_or(u16::MAX);
        let mut item = Item::new(type_id, 1);
        if item_type.stackable {
            item.count = count.clamp(1, max_stack);
        } else if item_type.charges > 0 {
            item.set_charges(if count > 1 { count } else { item_type.charges });
        }
        if item_type.duration_secs > 0 {
            item.set_duration(item_type.duration_ms());
        }

        let container = if item_type.is_container() {
            let capacity = u32::from(item_type.capacity);
            Some(match item_type.kind {
                ItemKind::DepotChest => (
                    ContainerKind::DepotChest {
                        owner: None,
                        max_items: self.config.max_depot_items,
                    },
                    capacity,
                    true,
                ),
                ItemKind::DepotLocker => (ContainerKind::DepotLocker { owner: None }, capacity, false),
                ItemKind::Inbox => (ContainerKind::Inbox, self.config.inbox_capacity, true),
                ItemKind::StoreInbox => (
                    ContainerKind::StoreInbox,
                    self.config.store_inbox_capacity,
                    true,
                ),
                _ => (ContainerKind::Generic, capacity, false),
            })
        } else {
            None
        };

        let id = item.id;
        if let Some((kind, capacity, paginated)) = container {
            self.containers
                .insert(id, Container::new(id, kind, capacity, paginated));
        }
        self.items.insert(id, item);
        Some(id)
    }

    /// Registers a container item with an explicit kind and capacity.
    pub fn create_container_item(
        &mut self,
        type_id: ItemTypeId,
        kind: ContainerKind,
        capacity: u32,
        paginated: bool,
    ) -> ItemId {
        let item = Item::new(type_id, 1);
        let id = item.id;
        self.items.insert(id, item);
        self.containers
            .insert(id, Container::new(id, kind, capacity, paginated));
        id
    }

    pub fn insert_item(&mut self, item: Item) -> ItemId {
        let id = item.id;
        self.items.insert(id, item);
        id
    }

    /// Browse fields are views; their physical owner is the tile.
    pub(crate) fn physical(&self, cylinder: CylinderId) -> CylinderId {
        if let CylinderId::Container(id) = cylinder {
            if let Some(ContainerKind::BrowseField { position }) =
                self.container(id).map(|container| &container.kind)
            {
                return CylinderId::Tile(*position);
            }
        }
        cylinder
    }

    /// Places a detached item. Containers take it on top, players into the
    /// slot named by `index`, tiles by rendering class.
    pub fn add_thing(&mut self, cylinder: CylinderId, index: SlotIndex, item: ItemId) {
        let cylinder = self.physical(cylinder);
        let Some(record) = self.items.get(&item) else {
            tracing::warn!(item = item.0, "add of unknown item");
            return;
        };
        let item_type = self.item_types.lookup(record.type_id);
        let (kind, always_on_top) = (item_type.kind, item_type.always_on_top);

        let placed = match cylinder {
            CylinderId::Tile(position) => match self.tiles.get_mut(&position) {
                Some(tile) => {
                    tile.place(kind, always_on_top, item);
                    true
                }
                None => false,
            },
            CylinderId::Container(id) => match self.containers.get_mut(&id) {
                Some(container) => {
                    container.insert_front(item);
                    true
                }
                None => false,
            },
            CylinderId::Player(player) => {
                let slot = index.position().and_then(InventorySlot::from_index);
                match (self.players.get_mut(&player), slot) {
                    (Some(player), Some(slot)) if player.inventory.slot(slot).is_none() => {
                        player.inventory.set_slot(slot, Some(item));
                        true
                    }
                    _ => false,
                }
            }
        };

        if placed {
            if let Some(record) = self.items.get_mut(&item) {
                record.parent = Some(cylinder);
            }
        } else {
            tracing::warn!(item = item.0, ?cylinder, ?index, "item could not be placed");
        }
    }

    /// Takes `count` units away. A partial stack keeps its place; anything
    /// else is detached and loses its parent.
    pub fn remove_thing(&mut self, cylinder: CylinderId, item: ItemId, count: u32) {
        let cylinder = self.physical(cylinder);
        let Some(record) = self.items.get(&item) else {
            return;
        };
        if record.parent != Some(cylinder) {
            tracing::warn!(item = item.0, ?cylinder, "remove from a cylinder that does not own the item");
            return;
        }
        let stackable = self.item_types.lookup(record.type_id).stackable;
        if stackable && count < u32::from(record.count) {
            if let Some(record) = self.items.get_mut(&item) {
                record.count -= count as u16;
            }
            return;
        }

        match cylinder {
            CylinderId::Tile(position) => {
                if let Some(tile) = self.tiles.get_mut(&position) {
                    tile.remove(item);
                }
            }
            CylinderId::Container(id) => {
                if let Some(container) = self.containers.get_mut(&id) {
                    container.remove_item(item);
                }
            }
            CylinderId::Player(player) => {
                if let Some(player) = self.players.get_mut(&player) {
                    if let Some(slot) = player.inventory.slot_of(item) {
                        player.inventory.take_slot(slot);
                    }
                }
            }
        }
        if let Some(record) = self.items.get_mut(&item) {
            record.parent = None;
        }
    }

    /// In-place change of type and sub type (stack count or charges).
    pub fn update_thing(&mut self, item: ItemId, type_id: ItemTypeId, count: u16) {
        let new_type = self.item_types.lookup(type_id);
        let (stackable, charged) = (new_type.stackable, new_type.charges > 0);
        let max_stack = u16::try_from(self.config.max_stack).unwrap_or(u16::MAX);
        if let Some(record) = self.items.get_mut(&item) {
            record.type_id = type_id;
            if stackable {
                record.count = count.clamp(1, max_stack);
            } else {
                record.count = 1;
                if charged {
                    record.set_charges(count);
                }
            }
        }
    }

    /// Puts `item` where the thing at `index` was and returns the detached
    /// previous occupant.
    pub fn replace_thing(&mut self, cylinder: CylinderId, index: u32, item: ItemId) -> Option<ItemId> {
        let cylinder = self.physical(cylinder);
        let previous = match cylinder {
            CylinderId::Tile(position) => self.tiles.get_mut(&position)?.replace_at(index as usize, item),
            CylinderId::Container(id) => self.containers.get_mut(&id)?.replace_at(index as usize, item),
            CylinderId::Player(player) => {
                let slot = InventorySlot::from_index(index)?;
                self.players.get_mut(&player)?.inventory.set_slot(slot, Some(item))
            }
        }?;
        if let Some(record) = self.items.get_mut(&previous) {
            record.parent = None;
        }
        if let Some(record) = self.items.get_mut(&item) {
            record.parent = Some(cylinder);
        }
        Some(previous)
    }

    /// Re-inserts a detached item at the exact index it was removed from.
    pub(crate) fn restore_thing(&mut self, cylinder: CylinderId, index: u32, item: ItemId) {
        let cylinder = self.physical(cylinder);
        let always_on_top = self
            .item(item)
            .map(|record| self.item_type(record).always_on_top)
            .unwrap_or(false);
        let restored = match cylinder {
            CylinderId::Tile(position) => match self.tiles.get_mut(&position) {
                Some(tile) => {
                    tile.place_at(index as usize, always_on_top, item);
                    true
                }
                None => false,
            },
            CylinderId::Container(id) => match self.containers.get_mut(&id) {
                Some(container) => {
                    container.insert_at(index as usize, item);
                    true
                }
                None => false,
            },
            CylinderId::Player(player) => {
                match (self.players.get_mut(&player), InventorySlot::from_index(index)) {
                    (Some(player), Some(slot)) => {
                        player.inventory.set_slot(slot, Some(item));
                        true
                    }
                    _ => false,
                }
            }
        };
        if restored {
            if let Some(record) = self.items.get_mut(&item) {
                record.parent = Some(cylinder);
            }
        }
    }

    pub fn post_add_notification(
        &mut self,
        cylinder: CylinderId,
        item: ItemId,
        old_parent: Option<CylinderId>,
        index: u32,
    ) {
        self.propagate(NotificationKind::Added, cylinder, item, old_parent, index);
    }

    pub fn post_remove_notification(
        &mut self,
        cylinder: CylinderId,
        item: ItemId,
        new_parent: Option<CylinderId>,
        index: u32,
    ) {
        self.propagate(NotificationKind::Removed, cylinder, item, new_parent, index);
    }

    fn propagate(
        &mut self,
        kind: NotificationKind,
        cylinder: CylinderId,
        item: ItemId,
        other: Option<CylinderId>,
        index: u32,
    ) {
        let mut current = cylinder;
        let mut link = CylinderLink::Owner;
        for _ in 0..self.containers.len() + 2 {
            self.notifications.push(Notification {
                cylinder: current,
                item,
                other,
                index,
                link,
                kind,
            });
            match self.notification_target(current) {
                Some((next, next_link)) => {
                    current = next;
                    link = next_link;
                }
                None => return,
            }
        }
    }

    fn notification_target(&self, cylinder: CylinderId) -> Option<(CylinderId, CylinderLink)> {
        let CylinderId::Container(id) = cylinder else {
            return None;
        };
        match &self.container(id)?.kind {
            ContainerKind::DepotLocker { .. } => None,
            ContainerKind::DepotChest { .. } | ContainerKind::Inbox => self
                .cylinder_parent(cylinder)
                .map(|parent| (parent, CylinderLink::Parent)),
            ContainerKind::StoreInbox => self
                .item(id)?
                .parent
                .filter(|parent| matches!(parent, CylinderId::Player(_)))
                .map(|player| (player, CylinderLink::TopParent)),
            ContainerKind::Generic | ContainerKind::BrowseField { .. } => {
                let top = self.top_parent(cylinder);
                match top {
                    CylinderId::Player(_) => Some((top, CylinderLink::TopParent)),
                    _ if top == cylinder => self
                        .cylinder_parent(cylinder)
                        .map(|parent| (parent, CylinderLink::Near)),
                    _ => Some((top, CylinderLink::Parent)),
                }
            }
        }
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Drops an item and all nested contents from the arena.
    pub fn release_item(&mut self, item: ItemId) {
        if let Some(parent) = self.item(item).and_then(|record| record.parent) {
            let count = self.item(item).map(|record| u32::from(record.count)).unwrap_or(1);
            self.remove_thing(parent, item, count);
        }
        let mut pending = vec![item];
        while let Some(id) = pending.pop() {
            if let Some(container) = self.containers.remove(&id) {
                pending.extend(container.items().iter().copied());
            }
            self.decay.forget(id);
            self.items.remove(&id);
        }
    }

    pub(crate) fn insert_player(&mut self, build: impl FnOnce(PlayerId) -> Player) -> PlayerId {
        let id = PlayerId(self.next_player_id);
        self.next_player_id += 1;
        self.players.insert(id, build(id));
        id
    }

    pub(crate) fn take_player(&mut self, id: PlayerId) -> Option<Player> {
        self.players.remove(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::depot::ITEM_INBOX;
    use crate::world::test_support::{equip, fixture_world, spawn_player, BACKPACK, BAG, GOLD, SWORD};

    #[test]
    fn top_parent_stops_below_the_map() {
        let mut world = fixture_world();
        let outer = world.spawn_container_on_tile(BACKPACK);
        let inner = world.create_item(BAG, 1).expect("bag");
        world.add_thing(CylinderId::Container(outer), SlotIndex::Wherever, inner);
        assert_eq!(world.top_parent(CylinderId::Container(inner)), CylinderId::Container(outer));
        assert_eq!(world.ancestors(CylinderId::Container(inner)).len(), 2);

        let player = spawn_player(&mut world);
        let carried = world.create_item(BACKPACK, 1).expect("backpack");
        equip(&mut world, player, InventorySlot::Backpack, carried);
        let pouch = world.create_item(BAG, 1).expect("bag");
        world.add_thing(CylinderId::Container(carried), SlotIndex::Wherever, pouch);
        assert_eq!(world.top_parent(CylinderId::Container(pouch)), CylinderId::Player(player));
    }

    #[test]
    fn depot_boxes_skip_their_locker() {
        let mut world = fixture_world();
        let player = spawn_player(&mut world);
        let locker = world.depot_locker(player).expect("locker");
        let chest = world.depot_chest(player, 0).expect("box");
        assert_eq!(
            world.item(chest).and_then(|item| item.parent),
            Some(CylinderId::Container(locker))
        );
        assert_eq!(world.cylinder_parent(CylinderId::Container(chest)), None);
        assert_eq!(world.top_parent(CylinderId::Container(chest)), CylinderId::Container(chest));
    }

    #[test]
    fn partial_removal_keeps_the_stack_in_place() {
        let mut world = fixture_world();
        let bag = world.spawn_container_on_tile(BAG);
        let coins = world.create_item(GOLD, 60).expect("gold");
        world.add_thing(CylinderId::Container(bag), SlotIndex::Wherever, coins);
        world.remove_thing(CylinderId::Container(bag), coins, 20);
        assert_eq!(world.item(coins).map(|item| item.count), Some(40));
        assert!(!world.is_removed(coins));
        world.remove_thing(CylinderId::Container(bag), coins, 40);
        assert!(world.is_removed(coins));
        assert!(world.container(bag).expect("bag").items().is_empty());
    }

    #[test]
    fn notifications_climb_to_the_carrier() {
        let mut world = fixture_world();
        let player = spawn_player(&mut world);
        let backpack = world.create_item(BACKPACK, 1).expect("backpack");
        equip(&mut world, player, InventorySlot::Backpack, backpack);
        let bag = world.create_item(BAG, 1).expect("bag");
        world.add_thing(CylinderId::Container(backpack), SlotIndex::Wherever, bag);
        world.drain_notifications();

        let sword = world.create_item(SWORD, 1).expect("sword");
        world.add_thing(CylinderId::Container(bag), SlotIndex::Wherever, sword);
        world.post_add_notification(CylinderId::Container(bag), sword, None, 0);
        let records = world.drain_notifications();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].link, CylinderLink::Owner);
        assert_eq!(records[1].cylinder, CylinderId::Player(player));
        assert_eq!(records[1].link, CylinderLink::TopParent);
    }

    #[test]
    fn notifications_from_a_ground_container_reach_the_tile() {
        let mut world = fixture_world();
        let bag = world.spawn_container_on_tile(BAG);
        let sword = world.create_item(SWORD, 1).expect("sword");
        world.add_thing(CylinderId::Container(bag), SlotIndex::Wherever, sword);
        world.drain_notifications();
        world.post_remove_notification(CylinderId::Container(bag), sword, None, 0);
        let records = world.drain_notifications();
        assert_eq!(records.len(), 2);
        assert!(matches!(records[1].cylinder, CylinderId::Tile(_)));
        assert_eq!(records[1].link, CylinderLink::Near);
        assert_eq!(records[1].kind, NotificationKind::Removed);
    }

    #[test]
    fn release_drops_nested_contents() {
        let mut world = fixture_world();
        let bag = world.spawn_container_on_tile(BAG);
        let sword = world.create_item(SWORD, 1).expect("sword");
        world.add_thing(CylinderId::Container(bag), SlotIndex::Wherever, sword);
        world.release_item(bag);
        assert!(world.item(bag).is_none());
        assert!(world.item(sword).is_none());
        assert!(world.container(bag).is_none());
    }

    #[test]
    fn factory_clamps_stacks_and_builds_containers() {
        let mut world = fixture_world();
        let coins = world.create_item(GOLD, 500).expect("gold");
        assert_eq!(world.item(coins).map(|item| item.count), Some(100));
        let inbox = world.create_item(ITEM_INBOX, 1).expect("inbox");
        let container = world.container(inbox).expect("container");
        assert!(container.is_inbox());
        assert!(container.has_pagination());
        assert!(world.create_item(ItemTypeId(9), 1).is_none());
    }

    #[test]
    fn weight_includes_contents() {
        let mut world = fixture_world();
        let bag = world.spawn_container_on_tile(BAG);
        let coins = world.create_item(GOLD, 10).expect("gold");
        world.add_thing(CylinderId::Container(bag), SlotIndex::Wherever, coins);
        let bag_weight = world.item(bag).map(|item| world.item_type(item).weight).expect("bag");
        let coin_weight = world.item(coins).map(|item| world.item_type(item).weight).expect("gold");
        assert_eq!(world.item_weight(bag), bag_weight + 10 * coin_weight);
    }
}
