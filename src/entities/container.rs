use crate::entities::item::{Item, ItemId, ItemTypeId};
use crate::entities::player::PlayerId;
use crate::world::cylinder::{Cylinder, CylinderFlags, CylinderId, SlotIndex};
use crate::world::item_types::WeaponType;
use crate::world::position::Position;
use crate::world::return_value::ReturnValue;
use crate::world::state::WorldState;
use std::borrow::Cow;
use std::collections::{BTreeMap, VecDeque};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerKind {
    Generic,
    /// One depot box of one player. The ceiling counts every item held in all
    /// of the owner's boxes.
    DepotChest {
        owner: Option<PlayerId>,
        max_items: u32,
    },
    DepotLocker {
        owner: Option<PlayerId>,
    },
    Inbox,
    StoreInbox,
    /// View over the items lying on a tile.
    BrowseField {
        position: Position,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub id: ItemId,
    pub kind: ContainerKind,
    capacity: u32,
    items: Vec<ItemId>,
    first_index: u32,
    paginated: bool,
    unlocked: bool,
}

impl Container {
    pub fn new(id: ItemId, kind: ContainerKind, capacity: u32, paginated: bool) -> Self {
        let unlocked = !matches!(
            kind,
            ContainerKind::Inbox | ContainerKind::BrowseField { .. }
        );
        Self {
            id,
            kind,
            capacity,
            items: Vec::new(),
            first_index: 0,
            paginated,
            unlocked,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn has_pagination(&self) -> bool {
        self.paginated
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    pub fn is_depot_chest(&self) -> bool {
        matches!(self.kind, ContainerKind::DepotChest { .. })
    }

    pub fn is_inbox(&self) -> bool {
        matches!(self.kind, ContainerKind::Inbox)
    }

    pub fn is_store_inbox(&self) -> bool {
        matches!(self.kind, ContainerKind::StoreInbox)
    }

    pub fn is_browse_field(&self) -> bool {
        matches!(self.kind, ContainerKind::BrowseField { .. })
    }

    /// Own item list, top first. Empty for browse fields.
    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    /// Item list as seen by queries; browse fields read the tile.
    pub fn view<'a>(&'a self, world: &'a WorldState) -> Cow<'a, [ItemId]> {
        match self.kind {
            ContainerKind::BrowseField { position } => {
                Cow::Owned(crate::world::browse::browse_items(world, position))
            }
            _ => Cow::Borrowed(&self.items),
        }
    }

    pub fn size(&self, world: &WorldState) -> u32 {
        self.view(world).len() as u32
    }

    pub fn is_empty(&self, world: &WorldState) -> bool {
        self.view(world).is_empty()
    }

    pub fn item_at(&self, world: &WorldState, index: u32) -> Option<ItemId> {
        self.view(world).get(index as usize).copied()
    }

    pub fn first_index(&self) -> u32 {
        self.first_index
    }

    pub fn set_first_index(&mut self, index: u32) {
        self.first_index = index.min(self.items.len() as u32);
    }

    /// Page of items starting at the pagination window.
    pub fn visible_items(&self, world: &WorldState) -> Vec<ItemId> {
        self.view(world)
            .iter()
            .skip(self.first_index as usize)
            .take(self.capacity as usize)
            .copied()
            .collect()
    }

    pub(crate) fn insert_front(&mut self, item: ItemId) {
        self.items.insert(0, item);
    }

    /// Appends below everything else; used when building containers.
    pub(crate) fn push_back(&mut self, item: ItemId) {
        self.items.push(item);
    }

    pub(crate) fn insert_at(&mut self, index: usize, item: ItemId) {
        let index = index.min(self.items.len());
        self.items.insert(index, item);
    }

    pub(crate) fn remove_item(&mut self, item: ItemId) -> Option<usize> {
        let index = self.items.iter().position(|entry| *entry == item)?;
        self.items.remove(index);
        Some(index)
    }

    pub(crate) fn replace_at(&mut self, index: usize, item: ItemId) -> Option<ItemId> {
        let slot = self.items.get_mut(index)?;
        Some(std::mem::replace(slot, item))
    }

    /// Number of items inside, nested contents included.
    pub fn holding_count(&self, world: &WorldState) -> u32 {
        self.items_recursive(world).len() as u32
    }

    /// Breadth-first walk over this container and every nested container.
    pub fn items_recursive(&self, world: &WorldState) -> Vec<ItemId> {
        let mut found = Vec::new();
        let mut pending: VecDeque<ItemId> = self.view(world).iter().copied().collect();
        while let Some(id) = pending.pop_front() {
            found.push(id);
            if let Some(sub) = world.container(id) {
                pending.extend(sub.items.iter().copied());
            }
        }
        found
    }

    pub fn is_holding_item(&self, world: &WorldState, item: ItemId) -> bool {
        self.items_recursive(world).contains(&item)
    }

    /// Units of `type_id` directly inside (not nested). `sub_type` filters by
    /// stack count or charges.
    pub fn item_type_count(
        &self,
        world: &WorldState,
        type_id: ItemTypeId,
        sub_type: Option<u16>,
    ) -> u32 {
        self.view(world)
            .iter()
            .filter_map(|id| world.item(*id))
            .filter(|item| item.type_id == type_id)
            .map(|item| world.count_by_type(item, sub_type))
            .sum()
    }

    pub fn all_item_type_count(&self, world: &WorldState) -> BTreeMap<ItemTypeId, u32> {
        let mut counts = BTreeMap::new();
        for item in self.view(world).iter().filter_map(|id| world.item(*id)) {
            *counts.entry(item.type_id).or_insert(0) += u32::from(item.count);
        }
        counts
    }

    pub(crate) fn query_add_generic(
        &self,
        world: &WorldState,
        index: SlotIndex,
        item: &Item,
        count: u32,
        flags: CylinderFlags,
        actor: Option<PlayerId>,
    ) -> ReturnValue {
        if flags.contains(CylinderFlags::CHILD_IS_OWNER) {
            return ReturnValue::NoError;
        }
        if !self.unlocked {
            return ReturnValue::NotPossible;
        }

        let item_type = world.item_type(item);
        if !item_type.pickupable {
            return ReturnValue::CannotPickup;
        }
        if item.id == self.id {
            return ReturnValue::ThisIsImpossible;
        }

        let own_type = world
            .item(self.id)
            .map(|own| world.item_type(own))
            .unwrap_or_else(|| world.item_types.lookup(ItemTypeId(0)));
        if own_type.weapon_type == WeaponType::Quiver && item_type.weapon_type != WeaponType::Ammo {
            return ReturnValue::QuiverAmmoOnly;
        }
        if item_type.store_item && !self.is_depot_chest() {
            return ReturnValue::ItemCannotBeMovedHere;
        }

        let parent = world.cylinder_parent(self.cylinder_id());
        if own_type.store_item {
            let inside_store_inbox = parent
                .and_then(CylinderId::container)
                .and_then(|id| world.container(id))
                .map(Container::is_store_inbox)
                .unwrap_or(false);
            if inside_store_inbox {
                if item_type.store_item {
                    return ReturnValue::ItemCannotBeMovedHere;
                }
                return ReturnValue::CannotMoveItemIsNotStoreItem;
            }
        }

        let no_limit = flags.contains(CylinderFlags::NO_LIMIT);
        for ancestor in world.ancestors(self.cylinder_id()) {
            if ancestor == CylinderId::Container(item.id) {
                return ReturnValue::ThisIsImpossible;
            }
            if !no_limit
                && ancestor
                    .container()
                    .and_then(|id| world.container(id))
                    .map(Container::is_inbox)
                    .unwrap_or(false)
            {
                return ReturnValue::ContainerNotEnoughRoom;
            }
        }
        if !no_limit
            && index == SlotIndex::Wherever
            && self.size(world) >= self.capacity
            && !self.paginated
        {
            return ReturnValue::ContainerNotEnoughRoom;
        }

        let top = world.top_parent(self.cylinder_id());
        if top == self.cylinder_id() {
            return ReturnValue::NoError;
        }
        match world.cylinder(top) {
            Some(owner) => owner.query_add(
                world,
                SlotIndex::Wherever,
                item,
                count,
                flags | CylinderFlags::CHILD_IS_OWNER,
                actor,
            ),
            None => ReturnValue::NotPossible,
        }
    }
}

impl Cylinder for Container {
    fn cylinder_id(&self) -> CylinderId {
        CylinderId::Container(self.id)
    }

    fn query_add(
        &self,
        world: &WorldState,
        index: SlotIndex,
        item: &Item,
        count: u32,
        flags: CylinderFlags,
        actor: Option<PlayerId>,
    ) -> ReturnValue {
        match self.kind {
            ContainerKind::DepotLocker { .. } => ReturnValue::NotEnoughRoom,
            ContainerKind::DepotChest { .. } => {
                crate::entities::depot::query_add_depot_chest(self, world, index, item, count, flags, actor)
            }
            ContainerKind::Inbox => crate::entities::inbox::query_add_inbox(self, world, item, flags),
            ContainerKind::StoreInbox => {
                crate::entities::inbox::query_add_store_inbox(self, world, item, flags)
            }
            ContainerKind::Generic | ContainerKind::BrowseField { .. } => {
                self.query_add_generic(world, index, item, count, flags, actor)
            }
        }
    }

    fn query_max_count(
        &self,
        world: &WorldState,
        index: SlotIndex,
        item: &Item,
        count: u32,
        flags: CylinderFlags,
    ) -> (ReturnValue, u32) {
        if flags.contains(CylinderFlags::NO_LIMIT) || self.paginated {
            return (ReturnValue::NoError, count.max(1));
        }

        let max_stack = world.config.max_stack;
        let free_slots = self.capacity.saturating_sub(self.size(world));
        if !world.item_type(item).stackable {
            if free_slots == 0 {
                return (ReturnValue::ContainerNotEnoughRoom, 0);
            }
            return (ReturnValue::NoError, free_slots);
        }

        let mut stack_room = 0u32;
        match index {
            SlotIndex::At(position) => {
                if let Some(dest) = self.item_at(world, position).and_then(|id| world.item(id)) {
                    let room = max_stack.saturating_sub(u32::from(dest.count));
                    if item.stacks_with(dest)
                        && room > 0
                        && self.query_add(world, index, item, count, flags, None).is_ok()
                    {
                        stack_room = room;
                    }
                }
            }
            _ => {
                let mut slot = 0u32;
                for dest in self.view(world).iter().filter_map(|id| world.item(*id)) {
                    let room = max_stack.saturating_sub(u32::from(dest.count));
                    if item.stacks_with(dest) && room > 0 {
                        let ret = self.query_add(world, SlotIndex::At(slot), item, count, flags, None);
                        slot += 1;
                        if ret.is_ok() {
                            stack_room += room;
                        }
                    }
                }
            }
        }

        let max = free_slots * max_stack + stack_room;
        if max < count {
            return (ReturnValue::ContainerNotEnoughRoom, max);
        }
        (ReturnValue::NoError, max)
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
        if !self.unlocked {
            *dest_item = None;
            return this;
        }

        match *index {
            SlotIndex::MoveUp => {
                *index = SlotIndex::Wherever;
                *dest_item = None;
                return world.cylinder_parent(this).unwrap_or(this);
            }
            SlotIndex::Wherever => {
                *dest_item = None;
            }
            SlotIndex::At(position) if position >= self.capacity => {
                // Clients drop into the grey area of a smaller container.
                *index = SlotIndex::Wherever;
                *dest_item = None;
            }
            SlotIndex::At(_) => {}
        }

        if let SlotIndex::At(position) = *index {
            if let Some(at) = self.item_at(world, position) {
                *dest_item = Some(at);
                if world.container(at).is_some() {
                    *index = SlotIndex::Wherever;
                    *dest_item = None;
                    return CylinderId::Container(at);
                }
            }
        }

        let max_stack = world.config.max_stack;
        let auto_stack = !flags.contains(CylinderFlags::IGNORE_AUTO_STACK);
        if auto_stack && world.item_type(item).stackable && item.parent != Some(this) {
            let dest_fits = dest_item
                .and_then(|id| world.item(id))
                .map(|dest| item.stacks_with(dest) && u32::from(dest.count) < max_stack)
                .unwrap_or(false);
            if dest_fits {
                return this;
            }
            for (position, id) in self.view(world).iter().enumerate() {
                let Some(candidate) = world.item(*id) else {
                    continue;
                };
                if item.stacks_with(candidate) && u32::from(candidate.count) < max_stack {
                    *dest_item = Some(*id);
                    *index = SlotIndex::At(position as u32);
                    return this;
                }
            }
        }
        this
    }

    fn thing_index(&self, world: &WorldState, item: ItemId) -> Option<u32> {
        self.view(world)
            .iter()
            .position(|entry| *entry == item)
            .map(|index| index as u32)
    }

    fn first_index(&self) -> u32 {
        0
    }

    fn last_index(&self, world: &WorldState) -> u32 {
        self.size(world)
    }

    fn thing(&self, world: &WorldState, index: u32) -> Option<ItemId> {
        self.item_at(world, index)
    }
}
