use crate::entities::item::{Item, ItemId};
use crate::entities::player::PlayerId;
use crate::world::position::Position;
use crate::world::return_value::ReturnValue;
use crate::world::state::WorldState;
use bitflags::bitflags;

bitflags! {
    /// Modifiers threaded through every query and transfer call.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct CylinderFlags: u32 {
        /// Skip capacity ceilings. Also marks a privileged system delivery
        /// (mail, store purchases).
        const NO_LIMIT = 1 << 0;
        const IGNORE_BLOCK_ITEM = 1 << 1;
        const IGNORE_BLOCK_CREATURE = 1 << 2;
        /// A nested container is asking its owner; only the owner-level
        /// limit (carried weight) is checked.
        const CHILD_IS_OWNER = 1 << 3;
        const PATHFINDING = 1 << 4;
        const IGNORE_FIELD_DAMAGE = 1 << 5;
        const IGNORE_NOT_MOVEABLE = 1 << 6;
        const IGNORE_AUTO_STACK = 1 << 7;
    }
}

/// Handle of anything that can own items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CylinderId {
    Tile(Position),
    Container(ItemId),
    Player(PlayerId),
}

impl CylinderId {
    pub fn container(self) -> Option<ItemId> {
        match self {
            CylinderId::Container(id) => Some(id),
            _ => None,
        }
    }

    pub fn player(self) -> Option<PlayerId> {
        match self {
            CylinderId::Player(id) => Some(id),
            _ => None,
        }
    }
}

pub const INDEX_MOVE_UP: u32 = 254;
pub const INDEX_WHEREVER: u32 = 255;

/// Placement index inside a cylinder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotIndex {
    Wherever,
    /// Container index 254: move one level up to the parent container.
    MoveUp,
    At(u32),
}

impl SlotIndex {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            INDEX_WHEREVER => SlotIndex::Wherever,
            INDEX_MOVE_UP => SlotIndex::MoveUp,
            other => SlotIndex::At(other),
        }
    }

    pub fn position(self) -> Option<u32> {
        match self {
            SlotIndex::At(index) => Some(index),
            _ => None,
        }
    }
}

/// How far a notification has travelled from the cylinder that changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CylinderLink {
    Owner,
    Parent,
    TopParent,
    Near,
}

/// Query side of the ownership contract.
///
/// Every method is free of side effects; physical changes go through the
/// `WorldState` mutators (`add_thing`, `remove_thing`, `update_thing`,
/// `replace_thing`) and the post-commit notifications, which dispatch on
/// [`CylinderId`].
pub trait Cylinder {
    fn cylinder_id(&self) -> CylinderId;

    fn query_add(
        &self,
        world: &WorldState,
        index: SlotIndex,
        item: &Item,
        count: u32,
        flags: CylinderFlags,
        actor: Option<PlayerId>,
    ) -> ReturnValue;

    /// Largest amount of `item` this cylinder can absorb at `index` right now.
    fn query_max_count(
        &self,
        world: &WorldState,
        index: SlotIndex,
        item: &Item,
        count: u32,
        flags: CylinderFlags,
    ) -> (ReturnValue, u32);

    fn query_remove(
        &self,
        world: &WorldState,
        item: &Item,
        count: u32,
        flags: CylinderFlags,
        actor: Option<PlayerId>,
    ) -> ReturnValue;

    /// Resolves the cylinder that actually receives `item`. May rewrite
    /// `index`, `dest_item` and `flags`; callers repeat until the returned
    /// handle equals this cylinder.
    fn query_destination(
        &self,
        world: &WorldState,
        index: &mut SlotIndex,
        item: &Item,
        dest_item: &mut Option<ItemId>,
        flags: &mut CylinderFlags,
    ) -> CylinderId;

    fn thing_index(&self, world: &WorldState, item: ItemId) -> Option<u32>;

    fn first_index(&self) -> u32;

    /// One past the last valid index.
    fn last_index(&self, world: &WorldState) -> u32;

    fn thing(&self, world: &WorldState, index: u32) -> Option<ItemId>;

    fn things(&self, world: &WorldState) -> Vec<ItemId> {
        (self.first_index()..self.last_index(world))
            .filter_map(|index| self.thing(world, index))
            .collect()
    }
}
