use crate::entities::item::ItemId;
use crate::entities::player::PlayerId;
use crate::world::cylinder::{CylinderId, CylinderLink};
use crate::world::position::Position;
use crate::world::return_value::ReturnValue;
use crate::world::state::WorldState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Added,
    Removed,
}

/// Post-commit record delivered to one cylinder on the parent chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notification {
    pub cylinder: CylinderId,
    pub item: ItemId,
    /// Previous owner for additions, new owner for removals.
    pub other: Option<CylinderId>,
    pub index: u32,
    pub link: CylinderLink,
    pub kind: NotificationKind,
}

/// A player-driven relocation between two real map positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveContext {
    pub actor: PlayerId,
    pub item: ItemId,
    pub count: u32,
    pub from: CylinderId,
    pub to: CylinderId,
    pub from_position: Position,
    pub to_position: Position,
}

/// Scripted reactions to item moves. A non-`NoError` result from
/// `on_move_item` cancels the move exactly like a failed query.
pub trait MoveEvents {
    fn on_move_item(&mut self, _world: &WorldState, _context: &MoveContext) -> ReturnValue {
        ReturnValue::NoError
    }

    fn on_item_moved(&mut self, _world: &WorldState, _context: &MoveContext) {}
}

impl WorldState {
    pub fn set_move_events(&mut self, events: Box<dyn MoveEvents + Send>) {
        self.move_events = Some(events);
    }

    pub(crate) fn fire_move_item(&mut self, context: &MoveContext) -> ReturnValue {
        let Some(mut events) = self.move_events.take() else {
            return ReturnValue::NoError;
        };
        let ret = events.on_move_item(self, context);
        self.move_events = Some(events);
        ret
    }

    pub(crate) fn fire_item_moved(&mut self, context: &MoveContext) {
        if let Some(mut events) = self.move_events.take() {
            events.on_item_moved(self, context);
            self.move_events = Some(events);
        }
    }
}
