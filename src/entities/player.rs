use crate::entities::container::ContainerKind;
use crate::entities::depot::{ITEM_INBOX, ITEM_STORE_INBOX};
use crate::entities::inventory::{Inventory, InventorySlot, INVENTORY_SLOTS};
use crate::entities::item::{Item, ItemId};
use crate::world::cylinder::{Cylinder, CylinderFlags, CylinderId, SlotIndex};
use crate::world::item_types::{ItemType, SlotPositions, WeaponType};
use crate::world::position::Position;
use crate::world::return_value::ReturnValue;
use crate::world::state::WorldState;
use std::collections::{BTreeMap, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(pub u32);

/// A logged-in player as an owner of items: body slots, the store inbox it
/// carries, the mail inbox and the lazily assigned depot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub premium: bool,
    pub position: Position,
    /// Carry limit in weight units.
    pub capacity: u32,
    pub inventory: Inventory,
    pub inbox: ItemId,
    pub store_inbox: ItemId,
    pub depot_locker: Option<ItemId>,
    pub depot_chests: BTreeMap<u16, ItemId>,
    /// Item currently offered in a trade; it must stay where it is.
    pub trade_item: Option<ItemId>,
}

const BODY_SLOTS: SlotPositions = SlotPositions::HEAD
    .union(SlotPositions::NECKLACE)
    .union(SlotPositions::BACKPACK)
    .union(SlotPositions::ARMOR)
    .union(SlotPositions::LEGS)
    .union(SlotPositions::FEET)
    .union(SlotPositions::RING);

impl Player {
    pub fn new(
        id: PlayerId,
        name: impl Into<String>,
        position: Position,
        capacity: u32,
        inbox: ItemId,
        store_inbox: ItemId,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            premium: false,
            position,
            capacity,
            inventory: Inventory::default(),
            inbox,
            store_inbox,
            depot_locker: None,
            depot_chests: BTreeMap::new(),
            trade_item: None,
        }
    }

    pub fn inventory_weight(&self, world: &WorldState) -> u32 {
        let worn: u32 = self
            .inventory
            .iter()
            .map(|(_, item)| world.item_weight(item))
            .sum();
        worn + world.item_weight(self.store_inbox)
    }

    pub fn free_capacity(&self, world: &WorldState) -> u32 {
        self.capacity.saturating_sub(self.inventory_weight(world))
    }

    /// Whether `count` units of `item` fit under the carry limit. Items the
    /// player already carries always fit.
    pub fn has_capacity(&self, world: &WorldState, item: &Item, count: u32) -> bool {
        let carried = item
            .parent
            .map(|parent| world.top_parent(parent) == CylinderId::Player(self.id))
            .unwrap_or(false);
        if carried {
            return true;
        }
        let item_type = world.item_type(item);
        let mut weight = if world.container(item.id).is_some() {
            world.item_weight(item.id)
        } else {
            item_type.weight
        };
        if item_type.stackable {
            weight = weight.saturating_mul(count);
        }
        weight <= self.free_capacity(world)
    }

    fn slot_item<'a>(&self, world: &'a WorldState, slot: InventorySlot) -> Option<&'a Item> {
        self.inventory.slot(slot).and_then(|id| world.item(id))
    }

    fn right_hand_rule(
        &self,
        world: &WorldState,
        item: &Item,
        item_type: &ItemType,
        count: u32,
    ) -> ReturnValue {
        let left = self.slot_item(world, InventorySlot::LeftHand);
        let slots = item_type.slots;
        if !world.config.classic_equipment_slots {
            if !matches!(item_type.weapon_type, WeaponType::Shield | WeaponType::Quiver) {
                return ReturnValue::CannotBeDressed;
            }
            return match left {
                Some(left) => {
                    let left_type = world.item_type(left);
                    if (left_type.slots | slots).contains(SlotPositions::TWO_HAND)
                        && (left_type.weapon_type != WeaponType::Distance
                            || item_type.weapon_type != WeaponType::Quiver)
                    {
                        ReturnValue::BothHandsNeedToBeFree
                    } else {
                        ReturnValue::NoError
                    }
                }
                None => ReturnValue::NoError,
            };
        }

        if slots.contains(SlotPositions::TWO_HAND) {
            return match left {
                Some(left) if left.id != item.id => ReturnValue::BothHandsNeedToBeFree,
                _ => ReturnValue::NoError,
            };
        }
        match left {
            Some(left) => {
                let left_type = world.item_type(left);
                if left_type.slots.contains(SlotPositions::TWO_HAND) {
                    if left_type.weapon_type != WeaponType::Distance
                        || item_type.weapon_type != WeaponType::Quiver
                    {
                        return ReturnValue::DropTwoHandedItem;
                    }
                    return ReturnValue::NoError;
                }
                one_handed_pair(item, item_type, count, left, left_type)
            }
            None => ReturnValue::NoError,
        }
    }

    fn left_hand_rule(
        &self,
        world: &WorldState,
        item: &Item,
        item_type: &ItemType,
        count: u32,
    ) -> ReturnValue {
        let right = self.slot_item(world, InventorySlot::RightHand);
        let slots = item_type.slots;
        let weapon = item_type.weapon_type;
        if !world.config.classic_equipment_slots {
            if matches!(
                weapon,
                WeaponType::None | WeaponType::Shield | WeaponType::Ammo | WeaponType::Quiver
            ) {
                return ReturnValue::CannotBeDressed;
            }
            return match right {
                Some(right) if slots.contains(SlotPositions::TWO_HAND) => {
                    if weapon != WeaponType::Distance
                        || world.item_type(right).weapon_type != WeaponType::Quiver
                    {
                        ReturnValue::BothHandsNeedToBeFree
                    } else {
                        ReturnValue::NoError
                    }
                }
                _ => ReturnValue::NoError,
            };
        }

        if slots.contains(SlotPositions::TWO_HAND) {
            return match right {
                Some(right) if right.id != item.id => {
                    if weapon != WeaponType::Distance
                        || world.item_type(right).weapon_type != WeaponType::Quiver
                    {
                        ReturnValue::BothHandsNeedToBeFree
                    } else {
                        ReturnValue::NoError
                    }
                }
                _ => ReturnValue::NoError,
            };
        }
        match right {
            Some(right) => {
                let right_type = world.item_type(right);
                if right_type.slots.contains(SlotPositions::TWO_HAND) {
                    if weapon != WeaponType::Distance || right_type.weapon_type != WeaponType::Quiver {
                        return ReturnValue::DropTwoHandedItem;
                    }
                    return ReturnValue::NoError;
                }
                one_handed_pair(item, item_type, count, right, right_type)
            }
            None => ReturnValue::NoError,
        }
    }
}

/// Classic rule for two one-handed items: one weapon and one shield at most.
fn one_handed_pair(
    item: &Item,
    item_type: &ItemType,
    count: u32,
    other: &Item,
    other_type: &ItemType,
) -> ReturnValue {
    let mine = item_type.weapon_type;
    let theirs = other_type.weapon_type;
    if item.id == other.id && count == u32::from(item.count) {
        return ReturnValue::NoError;
    }
    if mine == WeaponType::Shield && theirs == WeaponType::Shield {
        return ReturnValue::CanOnlyUseOneShield;
    }
    let passive = |weapon: WeaponType| {
        matches!(
            weapon,
            WeaponType::None | WeaponType::Shield | WeaponType::Ammo | WeaponType::Quiver
        )
    };
    if passive(mine) || passive(theirs) {
        return ReturnValue::NoError;
    }
    ReturnValue::CanOnlyUseOneWeapon
}

impl Cylinder for Player {
    fn cylinder_id(&self) -> CylinderId {
        CylinderId::Player(self.id)
    }

    fn query_add(
        &self,
        world: &WorldState,
        index: SlotIndex,
        item: &Item,
        count: u32,
        flags: CylinderFlags,
        _actor: Option<PlayerId>,
    ) -> ReturnValue {
        if flags.contains(CylinderFlags::CHILD_IS_OWNER) {
            if flags.contains(CylinderFlags::NO_LIMIT) || self.has_capacity(world, item, count) {
                return ReturnValue::NoError;
            }
            return ReturnValue::NotEnoughCapacity;
        }

        let item_type = world.item_type(item);
        if !item_type.pickupable {
            return ReturnValue::CannotPickup;
        }
        if item_type.store_item {
            return ReturnValue::ItemCannotBeMovedHere;
        }

        let slots = item_type.slots;
        let affinity = if slots.intersects(BODY_SLOTS) {
            ReturnValue::CannotBeDressed
        } else if slots.contains(SlotPositions::TWO_HAND) {
            ReturnValue::PutThisObjectInBothHands
        } else if slots.intersects(SlotPositions::HAND) {
            if world.config.classic_equipment_slots {
                ReturnValue::PutThisObjectInYourHand
            } else {
                ReturnValue::CannotBeDressed
            }
        } else {
            ReturnValue::NotPossible
        };

        let slot = index.position().and_then(InventorySlot::from_index);
        let ret = match (index, slot) {
            (SlotIndex::Wherever, _) | (SlotIndex::At(0), _) => ReturnValue::NotEnoughRoom,
            (_, Some(InventorySlot::RightHand)) => {
                if slots.contains(SlotPositions::RIGHT) {
                    self.right_hand_rule(world, item, item_type, count)
                } else {
                    affinity
                }
            }
            (_, Some(InventorySlot::LeftHand)) => {
                if slots.contains(SlotPositions::LEFT) {
                    self.left_hand_rule(world, item, item_type, count)
                } else {
                    affinity
                }
            }
            (_, Some(InventorySlot::Ammo)) => {
                if slots.contains(SlotPositions::AMMO) || world.config.classic_equipment_slots {
                    ReturnValue::NoError
                } else {
                    affinity
                }
            }
            (_, Some(other)) => {
                if slots.contains(other.position_flag()) {
                    ReturnValue::NoError
                } else {
                    affinity
                }
            }
            (_, None) => ReturnValue::NotPossible,
        };

        if ret != ReturnValue::NoError && ret != ReturnValue::NotEnoughRoom {
            return ret;
        }
        if !self.has_capacity(world, item, count) {
            return ReturnValue::NotEnoughCapacity;
        }

        let occupant = slot.and_then(|slot| self.slot_item(world, slot));
        if let Some(occupant) = occupant {
            let occupant_type = world.item_type(occupant);
            if !occupant_type.stackable || occupant.type_id != item.type_id {
                if world.config.classic_equipment_slots {
                    return ReturnValue::NeedExchange;
                }
                let from_depot_or_body = item
                    .parent
                    .map(|parent| world.top_parent(parent))
                    .map(|top| match top {
                        CylinderId::Player(_) => true,
                        CylinderId::Container(id) => world
                            .container(id)
                            .map(|container| container.is_depot_chest())
                            .unwrap_or(false),
                        CylinderId::Tile(_) => false,
                    })
                    .unwrap_or(false);
                if from_depot_or_body {
                    return ReturnValue::NeedExchange;
                }
                return ReturnValue::NotEnoughRoom;
            }
        }
        ret
    }

    fn query_max_count(
        &self,
        world: &WorldState,
        index: SlotIndex,
        item: &Item,
        count: u32,
        flags: CylinderFlags,
    ) -> (ReturnValue, u32) {
        let max_stack = world.config.max_stack;
        let stackable = world.item_type(item).stackable;
        let own_count = u32::from(item.count);

        let max = match index {
            SlotIndex::Wherever => {
                let mut n = 0u32;
                for slot in INVENTORY_SLOTS {
                    let slot_index = SlotIndex::At(slot.index());
                    match self.slot_item(world, slot) {
                        Some(occupant) => {
                            if let Some(container) = world.container(occupant.id) {
                                let (_, room) = container.query_max_count(
                                    world,
                                    SlotIndex::Wherever,
                                    item,
                                    own_count,
                                    flags,
                                );
                                n += room;
                                for nested in container.items_recursive(world) {
                                    if let Some(sub) = world.container(nested) {
                                        let (_, room) = sub.query_max_count(
                                            world,
                                            SlotIndex::Wherever,
                                            item,
                                            own_count,
                                            flags,
                                        );
                                        n += room;
                                    }
                                }
                            } else if stackable
                                && item.stacks_with(occupant)
                                && u32::from(occupant.count) < max_stack
                            {
                                let remainder = max_stack - u32::from(occupant.count);
                                if self
                                    .query_add(world, slot_index, item, remainder, flags, None)
                                    .is_ok()
                                {
                                    n += remainder;
                                }
                            }
                        }
                        None => {
                            if self
                                .query_add(world, slot_index, item, own_count, flags, None)
                                .is_ok()
                            {
                                n += if stackable { max_stack } else { 1 };
                            }
                        }
                    }
                }
                n
            }
            _ => {
                let occupant = index
                    .position()
                    .and_then(|position| self.thing(world, position))
                    .and_then(|id| world.item(id));
                match occupant {
                    Some(dest) => {
                        if stackable && item.stacks_with(dest) && u32::from(dest.count) < max_stack {
                            max_stack - u32::from(dest.count)
                        } else {
                            0
                        }
                    }
                    None => {
                        if self.query_add(world, index, item, count, flags, None).is_ok() {
                            let max = if stackable { max_stack } else { 1 };
                            return (ReturnValue::NoError, max);
                        }
                        0
                    }
                }
            }
        };

        if max < count {
            (ReturnValue::NotEnoughRoom, max)
        } else {
            (ReturnValue::NoError, max)
        }
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
        world: &WorldState,
        index: &mut SlotIndex,
        item: &Item,
        dest_item: &mut Option<ItemId>,
        flags: &mut CylinderFlags,
    ) -> CylinderId {
        let this = self.cylinder_id();
        if matches!(*index, SlotIndex::Wherever | SlotIndex::At(0)) {
            *dest_item = None;
            let max_stack = world.config.max_stack;
            let auto_stack = !flags.contains(CylinderFlags::IGNORE_AUTO_STACK);
            let stackable = world.item_type(item).stackable;
            let own_count = u32::from(item.count);
            let mut containers = VecDeque::new();

            for slot in INVENTORY_SLOTS {
                let slot_index = SlotIndex::At(slot.index());
                match self.slot_item(world, slot) {
                    Some(occupant) => {
                        if Some(occupant.id) == self.trade_item || occupant.id == item.id {
                            continue;
                        }
                        if auto_stack
                            && stackable
                            && self
                                .query_add(world, slot_index, item, own_count, CylinderFlags::empty(), None)
                                .is_ok()
                            && item.stacks_with(occupant)
                            && u32::from(occupant.count) < max_stack
                        {
                            *index = slot_index;
                            *dest_item = Some(occupant.id);
                            return this;
                        }
                        if world.container(occupant.id).is_some() {
                            containers.push_back(occupant.id);
                        }
                    }
                    None => {
                        if self
                            .query_add(world, slot_index, item, own_count, *flags, None)
                            .is_ok()
                        {
                            *index = slot_index;
                            *dest_item = None;
                            return this;
                        }
                    }
                }
            }

            while let Some(container_id) = containers.pop_front() {
                let Some(container) = world.container(container_id) else {
                    continue;
                };
                let capacity = container.capacity();
                if !auto_stack || !stackable {
                    let mut free = capacity - capacity.min(container.size(world));
                    while free > 0 {
                        let candidate = SlotIndex::At(capacity - free);
                        if container
                            .query_add(world, candidate, item, own_count, *flags, None)
                            .is_ok()
                        {
                            *index = candidate;
                            *dest_item = None;
                            return CylinderId::Container(container_id);
                        }
                        free -= 1;
                    }
                    for nested in container.items() {
                        if world.container(*nested).is_some() {
                            containers.push_back(*nested);
                        }
                    }
                    continue;
                }

                let mut n = 0u32;
                for listed in container.items() {
                    if Some(*listed) == self.trade_item || *listed == item.id {
                        continue;
                    }
                    if let Some(candidate) = world.item(*listed) {
                        if item.stacks_with(candidate) && u32::from(candidate.count) < max_stack {
                            *index = SlotIndex::At(n);
                            *dest_item = Some(*listed);
                            return CylinderId::Container(container_id);
                        }
                    }
                    if world.container(*listed).is_some() {
                        containers.push_back(*listed);
                    }
                    n += 1;
                }
                if n < capacity
                    && container
                        .query_add(world, SlotIndex::At(n), item, own_count, *flags, None)
                        .is_ok()
                {
                    *index = SlotIndex::At(n);
                    *dest_item = None;
                    return CylinderId::Container(container_id);
                }
            }
            return this;
        }

        let occupant = index.position().and_then(|position| self.thing(world, position));
        *dest_item = occupant;
        if let Some(occupant) = occupant {
            if world.container(occupant).is_some() {
                *index = SlotIndex::Wherever;
                *dest_item = None;
                return CylinderId::Container(occupant);
            }
        }
        this
    }

    fn thing_index(&self, _world: &WorldState, item: ItemId) -> Option<u32> {
        self.inventory.slot_of(item).map(InventorySlot::index)
    }

    fn first_index(&self) -> u32 {
        InventorySlot::Head.index()
    }

    fn last_index(&self, _world: &WorldState) -> u32 {
        InventorySlot::Ammo.index() + 1
    }

    fn thing(&self, _world: &WorldState, index: u32) -> Option<ItemId> {
        InventorySlot::from_index(index).and_then(|slot| self.inventory.slot(slot))
    }
}

impl WorldState {
    /// Brings a player into the world with an empty body, a fresh mail inbox
    /// and a store inbox carried next to the equipment slots.
    pub fn login_player(&mut self, name: &str, position: Position, capacity: u32) -> PlayerId {
        let inbox = self.create_container_item(
            ITEM_INBOX,
            ContainerKind::Inbox,
            self.config.inbox_capacity,
            true,
        );
        let store_inbox = self.create_container_item(
            ITEM_STORE_INBOX,
            ContainerKind::StoreInbox,
            self.config.store_inbox_capacity,
            true,
        );
        let id = self.insert_player(|id| Player::new(id, name, position, capacity, inbox, store_inbox));
        if let Some(record) = self.item_mut(store_inbox) {
            record.parent = Some(CylinderId::Player(id));
        }
        tracing::info!(player = id.0, name, "player logged in");
        id
    }

    /// Tears a player down and releases everything it owned.
    pub fn logout_player(&mut self, id: PlayerId) -> Option<Player> {
        self.close_browse_fields_of(id);
        let player = self.take_player(id)?;
        let owned = player
            .inventory
            .iter()
            .map(|(_, item)| item)
            .chain([player.store_inbox, player.inbox])
            .chain(player.depot_locker)
            .chain(player.depot_chests.values().copied())
            .collect::<Vec<_>>();
        for item in owned {
            self.release_item(item);
        }
        tracing::info!(player = id.0, name = %player.name, "player logged out");
        Some(player)
    }
}
