use crate::entities::container::{Container, ContainerKind};
use crate::entities::item::{Item, ItemId, ItemTypeId};
use crate::entities::player::PlayerId;
use crate::world::cylinder::{CylinderFlags, CylinderId, SlotIndex};
use crate::world::return_value::ReturnValue;
use crate::world::state::WorldState;

pub const ITEM_LOCKER: ItemTypeId = ItemTypeId(3497);
pub const ITEM_MARKET: ItemTypeId = ItemTypeId(14405);
pub const ITEM_INBOX: ItemTypeId = ItemTypeId(14404);
pub const ITEM_STORE_INBOX: ItemTypeId = ItemTypeId(23396);
pub const ITEM_DEPOT_BOX_FIRST: ItemTypeId = ItemTypeId(22797);

const DEPOT_BOX_CAPACITY: u32 = 30;

pub fn depot_box_type(depot_id: u16) -> ItemTypeId {
    ItemTypeId(ITEM_DEPOT_BOX_FIRST.0.saturating_add(depot_id))
}

pub(crate) fn query_add_depot_chest(
    chest: &Container,
    world: &WorldState,
    index: SlotIndex,
    item: &Item,
    count: u32,
    flags: CylinderFlags,
    actor: Option<PlayerId>,
) -> ReturnValue {
    let ContainerKind::DepotChest { owner, max_items } = chest.kind else {
        return ReturnValue::NotPossible;
    };

    if !flags.contains(CylinderFlags::NO_LIMIT) {
        let mut add_count = 0u32;
        if world.item_type(item).stackable && u32::from(item.count) != count {
            add_count = 1;
        }
        if !already_in_depot(world, chest, owner, item) {
            add_count = match world.container(item.id) {
                Some(container) => container.holding_count(world) + 1,
                None => 1,
            };
        }

        // Owned boxes follow the owner's current account state.
        let (holding, ceiling) = match owner {
            Some(owner) => (world.depot_item_count(owner), world.max_depot_items(owner)),
            None => (chest.holding_count(world), max_items),
        };
        if holding + add_count > ceiling {
            return ReturnValue::DepotIsFull;
        }
    }

    chest.query_add_generic(world, index, item, count, flags, actor)
}

/// Whether `item` already counts against the same depot ceiling.
fn already_in_depot(
    world: &WorldState,
    chest: &Container,
    owner: Option<PlayerId>,
    item: &Item,
) -> bool {
    let Some(parent) = item.parent else {
        return false;
    };
    let Some(top) = world.top_parent(parent).container() else {
        return false;
    };
    if top == chest.id {
        return true;
    }
    match (owner, world.container(top).map(|container| &container.kind)) {
        (Some(owner), Some(ContainerKind::DepotChest { owner: Some(other), .. })) => *other == owner,
        _ => false,
    }
}

impl WorldState {
    /// Items stored across all depot boxes of `player`.
    pub fn depot_item_count(&self, player: PlayerId) -> u32 {
        let Some(state) = self.player(player) else {
            return 0;
        };
        state
            .depot_chests
            .values()
            .filter_map(|chest| self.container(*chest))
            .map(|chest| chest.holding_count(self))
            .sum()
    }

    pub fn max_depot_items(&self, player: PlayerId) -> u32 {
        match self.player(player) {
            Some(state) if state.premium => self.config.max_depot_items_premium,
            _ => self.config.max_depot_items,
        }
    }

    /// Depot box `depot_id` of `player`, created on first access.
    pub fn depot_chest(&mut self, player: PlayerId, depot_id: u16) -> Option<ItemId> {
        if depot_id >= self.config.depot_box_count {
            return None;
        }
        if let Some(existing) = self.player(player)?.depot_chests.get(&depot_id) {
            return Some(*existing);
        }
        let max_items = self.max_depot_items(player);
        let chest = self.create_container_item(
            depot_box_type(depot_id),
            ContainerKind::DepotChest {
                owner: Some(player),
                max_items,
            },
            DEPOT_BOX_CAPACITY,
            true,
        );
        self.player_mut(player)?.depot_chests.insert(depot_id, chest);
        Some(chest)
    }

    /// The player's depot locker: market placeholder, inbox and every depot
    /// box, in that order. Created on first access.
    pub fn depot_locker(&mut self, player: PlayerId) -> Option<ItemId> {
        if let Some(locker) = self.player(player)?.depot_locker {
            return Some(locker);
        }
        let inbox = self.player(player)?.inbox;
        let box_count = self.config.depot_box_count;
        let locker = self.create_container_item(
            ITEM_LOCKER,
            ContainerKind::DepotLocker {
                owner: Some(player),
            },
            u32::from(box_count) + 2,
            false,
        );

        let market = self.create_item(ITEM_MARKET, 1).unwrap_or_else(|| {
            let placeholder = Item::new(ITEM_MARKET, 1);
            let id = placeholder.id;
            self.insert_item(placeholder);
            id
        });
        self.internal_add_back(locker, market);
        self.internal_add_back(locker, inbox);
        for depot_id in 0..box_count {
            if let Some(chest) = self.depot_chest(player, depot_id) {
                self.internal_add_back(locker, chest);
            }
        }

        self.player_mut(player)?.depot_locker = Some(locker);
        tracing::debug!(player = player.0, locker = locker.0, "depot locker assigned");
        Some(locker)
    }

    fn internal_add_back(&mut self, container: ItemId, item: ItemId) {
        if let Some(target) = self.container_mut(container) {
            target.push_back(item);
        }
        if let Some(record) = self.item_mut(item) {
            record.parent = Some(CylinderId::Container(container));
        }
    }
}
