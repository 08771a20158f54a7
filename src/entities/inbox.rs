use crate::entities::container::Container;
use crate::entities::item::Item;
use crate::world::cylinder::CylinderFlags;
use crate::world::return_value::ReturnValue;
use crate::world::state::WorldState;

/// Mail drop. Only privileged deliveries may place items here.
pub(crate) fn query_add_inbox(
    inbox: &Container,
    world: &WorldState,
    item: &Item,
    flags: CylinderFlags,
) -> ReturnValue {
    if !flags.contains(CylinderFlags::NO_LIMIT) {
        return ReturnValue::ContainerNotEnoughRoom;
    }
    if item.id == inbox.id {
        return ReturnValue::ThisIsImpossible;
    }
    if !world.item_type(item).pickupable {
        return ReturnValue::CannotPickup;
    }
    ReturnValue::NoError
}

/// Storefront delivery box. Accepts store items and empty store containers.
pub(crate) fn query_add_store_inbox(
    store_inbox: &Container,
    world: &WorldState,
    item: &Item,
    flags: CylinderFlags,
) -> ReturnValue {
    if item.id == store_inbox.id {
        return ReturnValue::ThisIsImpossible;
    }
    let item_type = world.item_type(item);
    if !item_type.pickupable {
        return ReturnValue::CannotPickup;
    }
    if !flags.contains(CylinderFlags::NO_LIMIT) {
        if !item_type.store_item {
            return ReturnValue::CannotMoveItemIsNotStoreItem;
        }
        let holds_items = world
            .container(item.id)
            .map(|container| !container.is_empty(world))
            .unwrap_or(false);
        if holds_items {
            return ReturnValue::ItemCannotBeMovedHere;
        }
    }
    ReturnValue::NoError
}
