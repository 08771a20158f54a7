use crate::entities::container::ContainerKind;
use crate::entities::inventory::InventorySlot;
use crate::entities::item::{Item, ItemId};
use crate::entities::player::PlayerId;
use crate::world::cylinder::{CylinderFlags, CylinderId, SlotIndex};
use crate::world::events::MoveContext;
use crate::world::item_types::ITEM_REWARD_CONTAINER;
use crate::world::position::Position;
use crate::world::return_value::ReturnValue;
use crate::world::state::WorldState;

/// Everything `internal_move_item` needs to know about one move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveItemRequest {
    pub from: CylinderId,
    pub to: CylinderId,
    pub index: SlotIndex,
    pub item: ItemId,
    pub count: u32,
    pub flags: CylinderFlags,
    /// Player driving the move; scripted hooks only run for player moves.
    pub actor: Option<PlayerId>,
    /// Set when the move completes a trade of this item.
    pub trade_item: Option<ItemId>,
    pub from_position: Option<Position>,
    pub to_position: Option<Position>,
}

impl MoveItemRequest {
    pub fn new(from: CylinderId, to: CylinderId, index: SlotIndex, item: ItemId, count: u32) -> Self {
        Self {
            from,
            to,
            index,
            item,
            count,
            flags: CylinderFlags::empty(),
            actor: None,
            trade_item: None,
            from_position: None,
            to_position: None,
        }
    }

    pub fn with_flags(mut self, flags: CylinderFlags) -> Self {
        self.flags = flags;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveItemResult {
    pub ret: ReturnValue,
    /// The item now at the destination: the moved instance, a split-off
    /// remainder, or the stack it merged into.
    pub item: Option<ItemId>,
    pub moved: u32,
}

impl MoveItemResult {
    fn failed(ret: ReturnValue) -> Self {
        Self {
            ret,
            item: None,
            moved: 0,
        }
    }
}

/// Occupant taken out of the destination slot while a move is validated.
#[derive(Debug, Clone, Copy)]
struct PendingExchange {
    occupant: ItemId,
    count: u32,
    holder: CylinderId,
    index: u32,
}

impl WorldState {
    /// Moves `request.count` units of an item between two cylinders.
    ///
    /// Every check runs before the first physical change; an exchange with
    /// the destination occupant is undone at its exact index if a later check
    /// fails. A partial move returns the capping reason together with the
    /// moved amount.
    pub fn internal_move_item(&mut self, request: MoveItemRequest) -> MoveItemResult {
        let item = request.item;
        let from = self.physical(request.from);
        let Some(record) = self.item(item).cloned() else {
            return MoveItemResult::failed(ReturnValue::NotPossible);
        };
        if record.parent != Some(from) {
            tracing::warn!(item = item.0, ?from, "move source does not own the item");
            return MoveItemResult::failed(ReturnValue::NotPossible);
        }
        let stackable = self.item_type(&record).stackable;
        let count = if stackable { request.count } else { 1 };

        let mut to = self.physical(request.to);
        let context = move_context(&request, item, count, from, to, false);
        if let Some(context) = &context {
            let ret = self.fire_move_item(context);
            if !ret.is_ok() {
                return MoveItemResult::failed(ret);
            }
        }

        let mut index = request.index;
        let mut flags = request.flags;
        let mut dest_item = None;
        let mut layers = 0u32;
        loop {
            let Some(target) = self.cylinder(to) else {
                return MoveItemResult::failed(ReturnValue::NotPossible);
            };
            let next = self.physical(target.query_destination(
                self,
                &mut index,
                &record,
                &mut dest_item,
                &mut flags,
            ));
            if next == to {
                break;
            }
            layers += 1;
            if layers > self.config.max_destination_layers {
                tracing::warn!(item = item.0, ?to, layers, "destination lookup nested too deep");
                return MoveItemResult::failed(ReturnValue::NotPossible);
            }
            to = next;
        }

        if dest_item == Some(item) {
            return MoveItemResult {
                ret: ReturnValue::NoError,
                item: Some(item),
                moved: 0,
            };
        }
        if self.is_reward_container(to) || self.is_reward_container(from) {
            return MoveItemResult::failed(ReturnValue::NotPossible);
        }

        let mut exchange = None;
        let mut ret = self.query_add_to(to, index, &record, count, flags, request.actor);
        if ret == ReturnValue::NeedExchange {
            match self.begin_exchange(from, to, &record, dest_item, &request) {
                Ok(pending) => {
                    exchange = Some(pending);
                    dest_item = None;
                    ret = self.query_add_to(to, index, &record, count, flags, request.actor);
                }
                Err(reason) => return MoveItemResult::failed(reason),
            }
        }
        if !ret.is_ok() {
            self.rollback_exchange(exchange);
            return MoveItemResult::failed(ret);
        }

        let (max_ret, max) = match self.cylinder(to) {
            Some(target) => target.query_max_count(self, index, &record, count, flags),
            None => (ReturnValue::NotPossible, 0),
        };
        if !max_ret.is_ok() && max == 0 {
            self.rollback_exchange(exchange);
            return MoveItemResult::failed(max_ret);
        }
        let moving = if stackable { count.min(max) } else { 1 };

        let ret = match self.cylinder(from) {
            Some(source) => source.query_remove(self, &record, moving, flags, request.actor),
            None => ReturnValue::NotPossible,
        };
        if !ret.is_ok() {
            self.rollback_exchange(exchange);
            return MoveItemResult::failed(ret);
        }
        if let Err(reason) = self.check_trade(&request, to) {
            self.rollback_exchange(exchange);
            return MoveItemResult::failed(reason);
        }

        let from_index = self.cylinder(from).and_then(|source| source.thing_index(self, item));
        self.remove_thing(from, item, moving);
        let item_removed = self.is_removed(item);
        if let Some(pending) = exchange {
            self.finish_exchange(pending, from, from_index, &request);
        }

        let mut updated = None;
        let mut merged = 0u32;
        let merge_into = dest_item.filter(|dest| {
            stackable
                && self
                    .item(*dest)
                    .map(|dest| record.stacks_with(dest))
                    .unwrap_or(false)
        });
        if let Some((dest, dest_type, dest_count)) = merge_into
            .and_then(|dest| self.item(dest))
            .map(|dest| (dest.id, dest.type_id, u32::from(dest.count)))
        {
            merged = self.config.max_stack.saturating_sub(dest_count).min(moving);
            if merged > 0 {
                self.update_thing(dest, dest_type, (dest_count + merged) as u16);
                updated = Some(dest);
            }
        }

        let rest = moving - merged;
        let moved_item = if rest == 0 {
            if item_removed {
                self.release_item(item);
            }
            None
        } else if item_removed {
            if let Some(placed) = self.item_mut(item) {
                if stackable {
                    placed.count = rest as u16;
                }
            }
            Some(item)
        } else {
            Some(self.insert_item(record.clone_detached(rest as u16)))
        };

        if let Some(moved) = moved_item {
            self.add_thing(to, index, moved);
            if self.is_removed(moved) {
                tracing::warn!(item = moved.0, ?to, "destination refused a validated move");
                self.place_or_drop(from, moved);
            }
        }

        if let Some(from_index) = from_index {
            self.post_remove_notification(from, item, Some(to), from_index);
        }
        if let Some(moved) = moved_item {
            if let Some(owner) = self.item(moved).and_then(|placed| placed.parent) {
                let at = self.index_in(owner, moved);
                self.post_add_notification(owner, moved, Some(from), at);
            }
            self.start_decay(moved);
        }
        if let Some(updated) = updated {
            let at = self.index_in(to, updated);
            self.post_add_notification(to, updated, Some(from), at);
        }

        let result_item = moved_item.or(updated);
        if let Some(mut context) = context {
            context.item = result_item.unwrap_or(item);
            context.count = moving;
            context.to = to;
            self.fire_item_moved(&context);
        }

        MoveItemResult {
            ret: if max_ret.is_ok() { ReturnValue::NoError } else { max_ret },
            item: result_item,
            moved: moving,
        }
    }

    /// Player-driven move of `item` from wherever it is now. Fills in the
    /// positions the scripted hooks need.
    pub fn player_move_item(
        &mut self,
        actor: PlayerId,
        item: ItemId,
        to: CylinderId,
        index: SlotIndex,
        count: u32,
    ) -> MoveItemResult {
        let Some(from) = self.item(item).and_then(|record| record.parent) else {
            return MoveItemResult::failed(ReturnValue::NotPossible);
        };
        let trade_item = self.player(actor).and_then(|player| player.trade_item);
        let request = MoveItemRequest {
            actor: Some(actor),
            trade_item: trade_item.filter(|traded| *traded == item),
            from_position: self.cylinder_position(from),
            to_position: self.cylinder_position(to),
            ..MoveItemRequest::new(from, to, index, item, count)
        };
        self.internal_move_item(request)
    }

    /// Adds a detached item, merging into stacks where possible.
    ///
    /// Returns the result and the number of units that found no room. When
    /// that number is non-zero, `item` is still detached and holds exactly
    /// those units.
    pub fn internal_add_item(
        &mut self,
        to: CylinderId,
        item: ItemId,
        index: SlotIndex,
        flags: CylinderFlags,
    ) -> (ReturnValue, u32) {
        let to = self.physical(to);
        let Some(record) = self.item(item).cloned() else {
            return (ReturnValue::NotPossible, 0);
        };
        if record.parent.is_some() {
            tracing::warn!(item = item.0, "add of an item that still has an owner");
            return (ReturnValue::NotPossible, 0);
        }
        let count = u32::from(record.count);

        let mut index = index;
        let mut flags = flags;
        let mut dest_item = None;
        let Some(dest) = self.cylinder(to) else {
            return (ReturnValue::NotPossible, 0);
        };
        let target = self.physical(dest.query_destination(
            self,
            &mut index,
            &record,
            &mut dest_item,
            &mut flags,
        ));
        let ret = self.query_add_to(target, index, &record, count, flags, None);
        if !ret.is_ok() {
            return (ret, 0);
        }

        let (max_ret, max) = match self.cylinder(to) {
            Some(dest) => dest.query_max_count(self, SlotIndex::Wherever, &record, count, flags),
            None => (ReturnValue::NotPossible, 0),
        };
        let strict = target
            .container()
            .and_then(|id| self.item(id))
            .map(|holder| holder.type_id != ITEM_REWARD_CONTAINER)
            .unwrap_or(false);
        if !max_ret.is_ok() && strict {
            return (max_ret, 0);
        }

        let stackable = self.item_type(&record).stackable;
        let merge = dest_item
            .and_then(|id| self.item(id))
            .filter(|dest| stackable && record.stacks_with(dest))
            .map(|dest| (dest.id, dest.type_id, u32::from(dest.count)));
        if let Some((dest_id, dest_type, dest_count)) = merge {
            let m = count.min(max);
            let n = self.config.max_stack.saturating_sub(dest_count).min(m);
            let rest = m - n;
            if rest != count {
                if n > 0 {
                    self.update_thing(dest_id, dest_type, (dest_count + n) as u16);
                }
                return self.settle_remainder(to, item, &record, rest, count - m, flags);
            }
        }

        self.add_thing(target, index, item);
        if self.is_removed(item) {
            return (ReturnValue::NotPossible, 0);
        }
        let at = self.index_in(target, item);
        self.post_add_notification(target, item, None, at);
        self.start_decay(item);
        (ReturnValue::NoError, 0)
    }

    /// After a partial merge: places `rest` more units and leaves
    /// `leftover` (plus whatever did not fit) on the detached `item`.
    fn settle_remainder(
        &mut self,
        to: CylinderId,
        item: ItemId,
        record: &Item,
        rest: u32,
        leftover: u32,
        flags: CylinderFlags,
    ) -> (ReturnValue, u32) {
        match (rest, leftover) {
            (0, 0) => {
                self.release_item(item);
                (ReturnValue::NoError, 0)
            }
            (0, leftover) => {
                self.set_count(item, leftover);
                (ReturnValue::NoError, leftover)
            }
            (rest, 0) => {
                self.set_count(item, rest);
                let (ret, remainder) = self.internal_add_item(to, item, SlotIndex::Wherever, flags);
                (ReturnValue::NoError, if ret.is_ok() { remainder } else { rest })
            }
            (rest, leftover) => {
                self.set_count(item, leftover);
                let split = self.insert_item(record.clone_detached(rest as u16));
                let (ret, remainder) = self.internal_add_item(to, split, SlotIndex::Wherever, flags);
                let unplaced = if ret.is_ok() { remainder } else { rest };
                if unplaced > 0 {
                    self.release_item(split);
                    self.set_count(item, leftover + unplaced);
                }
                (ReturnValue::NoError, leftover + unplaced)
            }
        }
    }

    /// Removes `count` units (all when `None`) regardless of moveability.
    /// Depot lockers are permanent.
    pub fn internal_remove_item(
        &mut self,
        item: ItemId,
        count: Option<u32>,
        flags: CylinderFlags,
    ) -> ReturnValue {
        let Some(record) = self.item(item).cloned() else {
            return ReturnValue::NotPossible;
        };
        let Some(parent) = record.parent else {
            return ReturnValue::NotPossible;
        };
        if matches!(
            self.container(item).map(|container| &container.kind),
            Some(ContainerKind::DepotLocker { .. })
        ) {
            return ReturnValue::NotPossible;
        }
        let count = count.unwrap_or(u32::from(record.count));
        let Some(owner) = self.cylinder(parent) else {
            return ReturnValue::NotPossible;
        };
        let ret = owner.query_remove(
            self,
            &record,
            count,
            flags | CylinderFlags::IGNORE_NOT_MOVEABLE,
            None,
        );
        if !ret.is_ok() {
            return ret;
        }

        let index = owner.thing_index(self, item).unwrap_or(0);
        self.remove_thing(parent, item, count);
        let removed = self.is_removed(item);
        self.post_remove_notification(parent, item, None, index);
        if removed {
            self.release_item(item);
        }
        ReturnValue::NoError
    }

    /// Gives a detached item to a player: into `slot` when named, anywhere
    /// otherwise. Units that do not fit land on the player's tile; with
    /// `drop_on_map`, so does the whole item when nothing fits.
    pub fn internal_player_add_item(
        &mut self,
        player: PlayerId,
        item: ItemId,
        drop_on_map: bool,
        slot: Option<InventorySlot>,
    ) -> ReturnValue {
        let Some(position) = self.player(player).map(|state| state.position) else {
            return ReturnValue::NotPossible;
        };
        let index = slot
            .map(|slot| SlotIndex::At(slot.index()))
            .unwrap_or(SlotIndex::Wherever);
        let (mut ret, remainder) =
            self.internal_add_item(CylinderId::Player(player), item, index, CylinderFlags::empty());
        if remainder > 0 {
            let (dropped, _) = self.internal_add_item(
                CylinderId::Tile(position),
                item,
                SlotIndex::Wherever,
                CylinderFlags::NO_LIMIT,
            );
            if !dropped.is_ok() {
                tracing::warn!(item = item.0, player = player.0, "remainder could not be dropped");
                self.release_item(item);
            }
        } else if !ret.is_ok() && drop_on_map {
            ret = self
                .internal_add_item(
                    CylinderId::Tile(position),
                    item,
                    SlotIndex::Wherever,
                    CylinderFlags::NO_LIMIT,
                )
                .0;
        }
        ret
    }

    /// Puts an orphaned item back into `cylinder`, or onto the tile it is
    /// seen at, and releases it when neither has room.
    pub(crate) fn place_or_drop(&mut self, cylinder: CylinderId, item: ItemId) {
        let (ret, remainder) =
            self.internal_add_item(cylinder, item, SlotIndex::Wherever, CylinderFlags::NO_LIMIT);
        if ret.is_ok() && remainder == 0 {
            return;
        }
        if let Some(position) = self.cylinder_position(cylinder) {
            if self.tile(position).is_some() {
                let (ret, remainder) = self.internal_add_item(
                    CylinderId::Tile(position),
                    item,
                    SlotIndex::Wherever,
                    CylinderFlags::NO_LIMIT,
                );
                if ret.is_ok() && remainder == 0 {
                    return;
                }
            }
        }
        tracing::warn!(item = item.0, ?cylinder, "no room left anywhere, item released");
        self.release_item(item);
    }

    fn query_add_to(
        &self,
        cylinder: CylinderId,
        index: SlotIndex,
        item: &Item,
        count: u32,
        flags: CylinderFlags,
        actor: Option<PlayerId>,
    ) -> ReturnValue {
        match self.cylinder(cylinder) {
            Some(target) => target.query_add(self, index, item, count, flags, actor),
            None => ReturnValue::NotPossible,
        }
    }

    fn index_in(&self, cylinder: CylinderId, item: ItemId) -> u32 {
        self.cylinder(cylinder)
            .and_then(|owner| owner.thing_index(self, item))
            .unwrap_or(0)
    }

    fn set_count(&mut self, item: ItemId, count: u32) {
        if let Some(record) = self.item_mut(item) {
            record.count = count as u16;
        }
    }

    fn is_reward_container(&self, cylinder: CylinderId) -> bool {
        cylinder
            .container()
            .and_then(|id| self.item(id))
            .map(|holder| holder.type_id == ITEM_REWARD_CONTAINER)
            .unwrap_or(false)
    }

    /// Items offered in a trade, and containers holding them, stay put
    /// unless the trade itself moves them. A traded item never moves into
    /// itself.
    fn check_trade(&self, request: &MoveItemRequest, to: CylinderId) -> Result<(), ReturnValue> {
        if let Some(traded) = request.trade_item {
            let into_traded = to == CylinderId::Container(traded)
                || self.ancestors(to).contains(&CylinderId::Container(traded));
            if into_traded {
                return Err(ReturnValue::NotEnoughRoom);
            }
        }
        let item = request.item;
        let locked = self
            .players()
            .filter_map(|player| player.trade_item)
            .filter(|traded| Some(*traded) != request.trade_item)
            .any(|traded| {
                traded == item
                    || self
                        .container(item)
                        .map(|container| container.is_holding_item(self, traded))
                        .unwrap_or(false)
            });
        if locked {
            return Err(ReturnValue::NotPossible);
        }
        Ok(())
    }

    /// Validates that the destination occupant can take the moving item's
    /// place, then lifts it out of the destination.
    fn begin_exchange(
        &mut self,
        from: CylinderId,
        to: CylinderId,
        moving: &Item,
        occupant: Option<ItemId>,
        request: &MoveItemRequest,
    ) -> Result<PendingExchange, ReturnValue> {
        let occupant = occupant
            .and_then(|id| self.item(id))
            .cloned()
            .ok_or(ReturnValue::NotPossible)?;
        let count = u32::from(occupant.count);
        let source = self.cylinder(from).ok_or(ReturnValue::NotPossible)?;
        let source_index = source
            .thing_index(self, moving.id)
            .ok_or(ReturnValue::NotPossible)?;

        let slot_swap = matches!(from, CylinderId::Player(_));
        let ret = source.query_add(
            self,
            SlotIndex::At(source_index),
            &occupant,
            count,
            CylinderFlags::empty(),
            request.actor,
        );
        // The source slot is about to be vacated by the moving item.
        let ret = if slot_swap && ret == ReturnValue::NeedExchange {
            ReturnValue::NoError
        } else {
            ret
        };
        if !ret.is_ok() {
            return Err(ret);
        }
        if !slot_swap {
            let (ret, max) = source.query_max_count(
                self,
                SlotIndex::Wherever,
                &occupant,
                count,
                CylinderFlags::empty(),
            );
            if !ret.is_ok() && max == 0 {
                return Err(ret);
            }
        }

        let holder = self.cylinder(to).ok_or(ReturnValue::NotPossible)?;
        let ret = holder.query_remove(self, &occupant, count, CylinderFlags::empty(), request.actor);
        if !ret.is_ok() {
            return Err(ret);
        }
        let index = holder
            .thing_index(self, occupant.id)
            .ok_or(ReturnValue::NotPossible)?;

        if let Some(context) = move_context(request, occupant.id, count, to, from, true) {
            let ret = self.fire_move_item(&context);
            if !ret.is_ok() {
                return Err(ret);
            }
        }

        self.remove_thing(to, occupant.id, count);
        Ok(PendingExchange {
            occupant: occupant.id,
            count,
            holder: to,
            index,
        })
    }

    fn rollback_exchange(&mut self, exchange: Option<PendingExchange>) {
        if let Some(pending) = exchange {
            self.restore_thing(pending.holder, pending.index, pending.occupant);
        }
    }

    /// Puts the lifted occupant where the moving item used to be.
    fn finish_exchange(
        &mut self,
        pending: PendingExchange,
        from: CylinderId,
        from_index: Option<u32>,
        request: &MoveItemRequest,
    ) {
        let PendingExchange {
            occupant,
            count,
            holder,
            index,
        } = pending;
        let at = from_index.map(SlotIndex::At).unwrap_or(SlotIndex::Wherever);
        self.add_thing(from, at, occupant);
        if self.is_removed(occupant) {
            self.place_or_drop(from, occupant);
        }
        let Some(owner) = self.item(occupant).and_then(|record| record.parent) else {
            return;
        };
        self.post_remove_notification(holder, occupant, Some(owner), index);
        let new_index = self.index_in(owner, occupant);
        self.post_add_notification(owner, occupant, Some(holder), new_index);
        if let Some(context) = move_context(request, occupant, count, holder, owner, true) {
            self.fire_item_moved(&context);
        }
    }
}

/// Hook context for a player move with both ends on the map. `reverse`
/// swaps the positions for the exchanged occupant.
fn move_context(
    request: &MoveItemRequest,
    item: ItemId,
    count: u32,
    from: CylinderId,
    to: CylinderId,
    reverse: bool,
) -> Option<MoveContext> {
    let (from_position, to_position) = if reverse {
        (request.to_position?, request.from_position?)
    } else {
        (request.from_position?, request.to_position?)
    };
    Some(MoveContext {
        actor: request.actor?,
        item,
        count,
        from,
        to,
        from_position,
        to_position,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::cylinder::CylinderLink;
    use crate::world::events::{MoveEvents, NotificationKind};
    use crate::world::test_support::{
        equip, fill_depot, fixture_world, spawn_player, ANVIL, ARROW, BACKPACK, BAG, GOLD, HELMET,
        QUIVER, REWARD_CONTAINER, SWORD, TEMPLE,
    };
    use std::sync::{Arc, Mutex};

    fn count_of(world: &WorldState, item: ItemId) -> u16 {
        world.item(item).map(|record| record.count).unwrap_or(0)
    }

    fn gold_stacks(world: &WorldState, ids: &[ItemId]) -> Vec<ItemId> {
        ids.iter()
            .copied()
            .filter(|id| world.item(*id).map(|item| item.type_id) == Some(GOLD))
            .collect()
    }

    #[test]
    fn stacks_survive_a_round_trip_through_a_partly_full_bag() {
        let mut world = fixture_world();
        let bag = world.spawn_container_on_tile(BAG);
        world.put_into(bag, GOLD, 60);
        for _ in 0..3 {
            world.put_into(bag, SWORD, 1);
        }
        let piles = [
            world.spawn_on_tile(GOLD, 100),
            world.spawn_on_tile(GOLD, 100),
            world.spawn_on_tile(GOLD, 50),
        ];
        let everything = CylinderId::Tile(TEMPLE);
        assert_eq!(world.item_type_count(everything, GOLD, None), 310);

        for pile in piles {
            let count = u32::from(count_of(&world, pile));
            let result = world.internal_move_item(MoveItemRequest::new(
                CylinderId::Tile(TEMPLE),
                CylinderId::Container(bag),
                SlotIndex::Wherever,
                pile,
                count,
            ));
            assert_eq!(result.ret, ReturnValue::NoError);
        }
        let container = world.container(bag).expect("bag");
        assert_eq!(container.item_type_count(&world, GOLD, None), 310);
        assert!(container.items().len() <= container.capacity() as usize);
        let stacks = gold_stacks(&world, container.items());
        assert_eq!(stacks.len(), 4);
        assert!(stacks.iter().all(|id| count_of(&world, *id) <= 100));
        assert!(gold_stacks(&world, &world.tile(TEMPLE).expect("tile").items()).is_empty());

        for stack in stacks {
            let count = u32::from(count_of(&world, stack));
            let result = world.internal_move_item(MoveItemRequest::new(
                CylinderId::Container(bag),
                CylinderId::Tile(TEMPLE),
                SlotIndex::Wherever,
                stack,
                count,
            ));
            assert_eq!(result.ret, ReturnValue::NoError);
        }
        let container = world.container(bag).expect("bag");
        assert_eq!(container.item_type_count(&world, GOLD, None), 0);
        assert_eq!(container.items().len(), 3);
        assert_eq!(world.item_type_count(everything, GOLD, None), 310);
        let tile_items = world.tile(TEMPLE).expect("tile").items();
        assert!(gold_stacks(&world, &tile_items)
            .iter()
            .all(|id| count_of(&world, *id) <= 100));
    }

    #[test]
    fn overflow_of_a_merge_becomes_a_new_stack() {
        let mut world = fixture_world();
        let bag = world.spawn_container_on_tile(BAG);
        let stack = world.put_into(bag, GOLD, 90);
        let coins = world.spawn_on_tile(GOLD, 30);

        let result = world.internal_move_item(MoveItemRequest::new(
            CylinderId::Tile(TEMPLE),
            CylinderId::Container(bag),
            SlotIndex::Wherever,
            coins,
            30,
        ));
        assert_eq!(result.ret, ReturnValue::NoError);
        assert_eq!(result.moved, 30);
        assert_eq!(count_of(&world, stack), 100);
        assert_eq!(count_of(&world, coins), 20);
        let container = world.container(bag).expect("bag");
        assert_eq!(container.items(), &[coins, stack]);
        assert_eq!(container.item_type_count(&world, GOLD, None), 120);
    }

    #[test]
    fn partial_move_leaves_the_rest_behind() {
        let mut world = fixture_world();
        let bag = world.spawn_container_on_tile(BAG);
        let coins = world.spawn_on_tile(GOLD, 30);
        let result = world.internal_move_item(MoveItemRequest::new(
            CylinderId::Tile(TEMPLE),
            CylinderId::Container(bag),
            SlotIndex::Wherever,
            coins,
            10,
        ));
        assert!(result.ret.is_ok());
        let split = result.item.expect("split stack");
        assert_ne!(split, coins);
        assert_eq!(count_of(&world, coins), 20);
        assert_eq!(count_of(&world, split), 10);
        assert_eq!(world.item(split).and_then(|item| item.parent), Some(CylinderId::Container(bag)));

        let back = world.internal_move_item(MoveItemRequest::new(
            CylinderId::Container(bag),
            CylinderId::Tile(TEMPLE),
            SlotIndex::Wherever,
            split,
            10,
        ));
        assert!(back.ret.is_ok());
        assert_eq!(count_of(&world, coins), 30);
        assert!(world.item(split).is_none());
    }

    #[test]
    fn moving_onto_itself_changes_nothing() {
        let mut world = fixture_world();
        let bag = world.spawn_container_on_tile(BAG);
        let sword = world.put_into(bag, SWORD, 1);
        world.drain_notifications();
        let result = world.internal_move_item(MoveItemRequest::new(
            CylinderId::Container(bag),
            CylinderId::Container(bag),
            SlotIndex::At(0),
            sword,
            1,
        ));
        assert_eq!(result.ret, ReturnValue::NoError);
        assert_eq!(result.moved, 0);
        assert!(world.notifications().is_empty());
    }

    #[test]
    fn move_notifies_both_ends() {
        let mut world = fixture_world();
        let bag = world.spawn_container_on_tile(BAG);
        let sword = world.spawn_on_tile(SWORD, 1);
        world.drain_notifications();
        let result = world.internal_move_item(MoveItemRequest::new(
            CylinderId::Tile(TEMPLE),
            CylinderId::Container(bag),
            SlotIndex::Wherever,
            sword,
            1,
        ));
        assert!(result.ret.is_ok());
        let records = world.drain_notifications();
        assert_eq!(records[0].cylinder, CylinderId::Tile(TEMPLE));
        assert_eq!(records[0].kind, NotificationKind::Removed);
        assert!(records
            .iter()
            .any(|record| record.cylinder == CylinderId::Container(bag)
                && record.kind == NotificationKind::Added));
    }

    #[test]
    fn occupied_slot_swaps_with_the_source() {
        let mut world = fixture_world();
        let player = spawn_player(&mut world);
        let backpack = world.create_item(BACKPACK, 1).expect("backpack");
        equip(&mut world, player, InventorySlot::Backpack, backpack);
        let worn = world.create_item(HELMET, 1).expect("helmet");
        equip(&mut world, player, InventorySlot::Head, worn);
        let spare = world.put_into(backpack, HELMET, 1);
        world.drain_notifications();

        let result = world.internal_move_item(MoveItemRequest::new(
            CylinderId::Container(backpack),
            CylinderId::Player(player),
            SlotIndex::At(InventorySlot::Head.index()),
            spare,
            1,
        ));
        assert_eq!(result.ret, ReturnValue::NoError);
        let state = world.player(player).expect("player");
        assert_eq!(state.inventory.slot(InventorySlot::Head), Some(spare));
        assert_eq!(
            world.item(worn).and_then(|item| item.parent),
            Some(CylinderId::Container(backpack))
        );

        let records = world.drain_notifications();
        let owned = |cylinder: CylinderId, item: ItemId, kind: NotificationKind| {
            records.iter().any(|record| {
                record.link == CylinderLink::Owner
                    && record.cylinder == cylinder
                    && record.item == item
                    && record.kind == kind
            })
        };
        assert!(owned(CylinderId::Player(player), worn, NotificationKind::Removed));
        assert!(owned(CylinderId::Container(backpack), worn, NotificationKind::Added));
        assert!(owned(CylinderId::Container(backpack), spare, NotificationKind::Removed));
        assert!(owned(CylinderId::Player(player), spare, NotificationKind::Added));
    }

    #[test]
    fn failed_exchange_restores_the_occupant() {
        let mut world = fixture_world();
        let player = spawn_player(&mut world);
        let backpack = world.create_item(BACKPACK, 1).expect("backpack");
        equip(&mut world, player, InventorySlot::Backpack, backpack);
        let worn = world.create_item(HELMET, 1).expect("helmet");
        equip(&mut world, player, InventorySlot::Head, worn);
        let spare = world.put_into(backpack, HELMET, 1);
        if let Some(state) = world.player_mut(player) {
            state.trade_item = Some(spare);
        }
        world.drain_notifications();

        let result = world.internal_move_item(MoveItemRequest::new(
            CylinderId::Container(backpack),
            CylinderId::Player(player),
            SlotIndex::At(InventorySlot::Head.index()),
            spare,
            1,
        ));
        assert_eq!(result.ret, ReturnValue::NotPossible);
        let state = world.player(player).expect("player");
        assert_eq!(state.inventory.slot(InventorySlot::Head), Some(worn));
        assert_eq!(world.item(worn).and_then(|item| item.parent), Some(CylinderId::Player(player)));
        assert_eq!(
            world.item(spare).and_then(|item| item.parent),
            Some(CylinderId::Container(backpack))
        );
        assert!(world.notifications().is_empty());
    }

    #[test]
    fn occupant_that_cannot_take_the_source_place_blocks_the_move() {
        let mut world = fixture_world();
        let player = spawn_player(&mut world);
        let quiver = world.create_item(QUIVER, 1).expect("quiver");
        equip(&mut world, player, InventorySlot::RightHand, quiver);
        let sword = world.create_item(SWORD, 1).expect("sword");
        equip(&mut world, player, InventorySlot::Ammo, sword);
        let arrows = world.put_into(quiver, ARROW, 10);

        let result = world.internal_move_item(MoveItemRequest::new(
            CylinderId::Container(quiver),
            CylinderId::Player(player),
            SlotIndex::At(InventorySlot::Ammo.index()),
            arrows,
            10,
        ));
        assert_eq!(result.ret, ReturnValue::QuiverAmmoOnly);
        let state = world.player(player).expect("player");
        assert_eq!(state.inventory.slot(InventorySlot::Ammo), Some(sword));
        assert_eq!(count_of(&world, arrows), 10);
    }

    #[test]
    fn full_depot_refuses_new_items_but_not_internal_moves() {
        let mut world = fixture_world();
        world.config.max_depot_items = 2;
        let player = spawn_player(&mut world);
        let first = world.depot_chest(player, 0).expect("box");
        fill_depot(&mut world, first, 2);
        let sword = world.spawn_on_tile(SWORD, 1);

        let result = world.internal_move_item(MoveItemRequest::new(
            CylinderId::Tile(TEMPLE),
            CylinderId::Container(first),
            SlotIndex::Wherever,
            sword,
            1,
        ));
        assert_eq!(result.ret, ReturnValue::DepotIsFull);

        let second = world.depot_chest(player, 1).expect("box");
        let stored = world.container(first).expect("box").items()[0];
        let result = world.internal_move_item(MoveItemRequest::new(
            CylinderId::Container(first),
            CylinderId::Container(second),
            SlotIndex::Wherever,
            stored,
            1,
        ));
        assert_eq!(result.ret, ReturnValue::NoError);
        assert_eq!(world.depot_item_count(player), 2);
    }

    #[test]
    fn destination_nesting_is_bounded() {
        let mut world = fixture_world();
        let outer = world.spawn_container_on_tile(BACKPACK);
        let inner = world.put_into(outer, BAG, 1);
        let sword = world.spawn_on_tile(SWORD, 1);
        world.config.max_destination_layers = 0;

        let request = MoveItemRequest::new(
            CylinderId::Tile(TEMPLE),
            CylinderId::Container(outer),
            SlotIndex::At(0),
            sword,
            1,
        );
        assert_eq!(world.internal_move_item(request).ret, ReturnValue::NotPossible);
        assert_eq!(world.item(sword).and_then(|item| item.parent), Some(CylinderId::Tile(TEMPLE)));

        // One redirect, into the bag, is exactly what a limit of one allows.
        world.config.max_destination_layers = 1;
        assert!(world.internal_move_item(request).ret.is_ok());
        assert_eq!(
            world.item(sword).and_then(|item| item.parent),
            Some(CylinderId::Container(inner))
        );
    }

    #[test]
    fn reward_containers_are_closed_to_moves() {
        let mut world = fixture_world();
        let reward = world.spawn_container_on_tile(REWARD_CONTAINER);
        let sword = world.spawn_on_tile(SWORD, 1);
        let result = world.internal_move_item(MoveItemRequest::new(
            CylinderId::Tile(TEMPLE),
            CylinderId::Container(reward),
            SlotIndex::Wherever,
            sword,
            1,
        ));
        assert_eq!(result.ret, ReturnValue::NotPossible);
    }

    #[derive(Default)]
    struct Recorder {
        log: Arc<Mutex<Vec<(&'static str, ItemId)>>>,
        veto: bool,
    }

    impl MoveEvents for Recorder {
        fn on_move_item(&mut self, _world: &WorldState, context: &MoveContext) -> ReturnValue {
            self.log.lock().expect("lock").push(("before", context.item));
            if self.veto {
                ReturnValue::NotMoveable
            } else {
                ReturnValue::NoError
            }
        }

        fn on_item_moved(&mut self, _world: &WorldState, context: &MoveContext) {
            self.log.lock().expect("lock").push(("after", context.item));
        }
    }

    #[test]
    fn player_moves_run_the_hooks() {
        let mut world = fixture_world();
        let player = spawn_player(&mut world);
        let log = Arc::new(Mutex::new(Vec::new()));
        world.set_move_events(Box::new(Recorder {
            log: log.clone(),
            veto: false,
        }));
        let sword = world.spawn_on_tile(SWORD, 1);
        let result = world.player_move_item(
            player,
            sword,
            CylinderId::Player(player),
            SlotIndex::At(InventorySlot::RightHand.index()),
            1,
        );
        assert!(result.ret.is_ok());
        assert_eq!(log.lock().expect("lock").as_slice(), &[("before", sword), ("after", sword)]);
    }

    #[test]
    fn vetoed_moves_leave_the_item() {
        let mut world = fixture_world();
        let player = spawn_player(&mut world);
        world.set_move_events(Box::new(Recorder {
            veto: true,
            ..Recorder::default()
        }));
        let sword = world.spawn_on_tile(SWORD, 1);
        let result = world.player_move_item(
            player,
            sword,
            CylinderId::Player(player),
            SlotIndex::At(InventorySlot::RightHand.index()),
            1,
        );
        assert_eq!(result.ret, ReturnValue::NotMoveable);
        assert_eq!(world.item(sword).and_then(|item| item.parent), Some(CylinderId::Tile(TEMPLE)));
    }

    #[test]
    fn add_merges_then_places_the_overflow() {
        let mut world = fixture_world();
        let stack = world.spawn_on_tile(GOLD, 95);
        let coins = world.create_item(GOLD, 20).expect("gold");
        let (ret, remainder) = world.internal_add_item(
            CylinderId::Tile(TEMPLE),
            coins,
            SlotIndex::Wherever,
            CylinderFlags::empty(),
        );
        assert_eq!(ret, ReturnValue::NoError);
        assert_eq!(remainder, 0);
        assert_eq!(count_of(&world, stack), 100);
        assert_eq!(count_of(&world, coins), 15);
        assert_eq!(world.item(coins).and_then(|item| item.parent), Some(CylinderId::Tile(TEMPLE)));
    }

    #[test]
    fn add_to_a_full_container_leaves_the_item_detached() {
        let mut world = fixture_world();
        let bag = world.spawn_container_on_tile(BAG);
        for _ in 0..8 {
            world.put_into(bag, SWORD, 1);
        }
        let coins = world.create_item(GOLD, 20).expect("gold");
        let (ret, remainder) = world.internal_add_item(
            CylinderId::Container(bag),
            coins,
            SlotIndex::Wherever,
            CylinderFlags::empty(),
        );
        assert_eq!(ret, ReturnValue::ContainerNotEnoughRoom);
        assert_eq!(remainder, 0);
        assert!(world.is_removed(coins));
        assert_eq!(count_of(&world, coins), 20);
    }

    #[test]
    fn player_add_drops_what_cannot_be_carried() {
        let mut world = fixture_world();
        let player = spawn_player(&mut world);
        let anvil = world.create_item(ANVIL, 1).expect("anvil");
        assert_eq!(
            world.internal_player_add_item(player, anvil, false, None),
            ReturnValue::NotEnoughCapacity
        );
        assert!(world.is_removed(anvil));
        assert!(world.internal_player_add_item(player, anvil, true, None).is_ok());
        assert_eq!(world.item(anvil).and_then(|item| item.parent), Some(CylinderId::Tile(TEMPLE)));

        let sword = world.create_item(SWORD, 1).expect("sword");
        assert!(world
            .internal_player_add_item(player, sword, false, Some(InventorySlot::LeftHand))
            .is_ok());
        let state = world.player(player).expect("player");
        assert_eq!(state.inventory.slot(InventorySlot::LeftHand), Some(sword));
    }

    #[test]
    fn remove_takes_partial_stacks_and_spares_lockers() {
        let mut world = fixture_world();
        let coins = world.spawn_on_tile(GOLD, 50);
        assert!(world.internal_remove_item(coins, Some(20), CylinderFlags::empty()).is_ok());
        assert_eq!(count_of(&world, coins), 30);
        assert!(world.internal_remove_item(coins, None, CylinderFlags::empty()).is_ok());
        assert!(world.item(coins).is_none());

        let player = spawn_player(&mut world);
        let locker = world.depot_locker(player).expect("locker");
        let chest = world.depot_chest(player, 0).expect("box");
        assert_eq!(
            world.internal_remove_item(locker, None, CylinderFlags::empty()),
            ReturnValue::NotPossible
        );
        assert!(world.item(chest).is_some());
    }
}
