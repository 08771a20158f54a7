use crate::entities::item::{DecayState, ItemId, ItemTypeId};
use crate::world::cylinder::{CylinderFlags, CylinderId, SlotIndex};
use crate::world::state::WorldState;

impl WorldState {
    /// Changes `item` into `new_type`, optionally with a new sub type.
    ///
    /// Returns the surviving item: the same id when the change happens in
    /// place, a fresh id when the item had to be replaced, `None` when the
    /// item is gone afterwards (used up or released).
    pub fn transform_item(
        &mut self,
        item: ItemId,
        new_type: ItemTypeId,
        new_count: Option<u16>,
    ) -> Option<ItemId> {
        let record = self.item(item)?.clone();
        let current = self.item_type(&record).clone();
        let current_sub_type = record.sub_type(current.stackable);

        if record.type_id == new_type
            && new_count.map_or(true, |count| count != 0 && count == current_sub_type)
        {
            return Some(item);
        }
        if record.is_augmented() || record.has_imbuements() {
            tracing::warn!(item = item.0, to = new_type.0, "refusing to transform an augmented item");
            return Some(item);
        }

        let cylinder = record.parent?;
        let Some(index) = self.cylinder(cylinder).and_then(|owner| owner.thing_index(self, item)) else {
            return Some(item);
        };
        let Some(target) = self.item_types.get(new_type).cloned() else {
            tracing::warn!(item = item.0, to = new_type.0, "transform into an unknown item type");
            return Some(item);
        };

        let carried_sub_type = if current.stackable {
            record.count
        } else {
            record.charges().unwrap_or(target.charges)
        };
        let next_count = match new_count {
            Some(count) if target.has_sub_type() => count,
            _ if current.kind != target.kind => {
                if target.charges > 0 {
                    target.charges
                } else {
                    1
                }
            }
            _ => carried_sub_type,
        };

        if current.always_on_top != target.always_on_top {
            // Rendering class changes, so the item has to leave and re-enter
            // its tile to land in the right segment.
            self.remove_thing(cylinder, item, u32::from(record.count));
            self.post_remove_notification(cylinder, item, Some(cylinder), index);
            self.change_type(item, new_type, next_count);
            if matches!(cylinder, CylinderId::Player(_)) {
                self.restore_thing(cylinder, index, item);
            } else {
                self.add_thing(cylinder, SlotIndex::Wherever, item);
            }
            let Some(owner) = self.item(item).and_then(|placed| placed.parent) else {
                self.release_item(item);
                return None;
            };
            let new_index = self
                .cylinder(owner)
                .and_then(|placed| placed.thing_index(self, item))
                .unwrap_or(index);
            self.post_add_notification(owner, item, Some(cylinder), new_index);
            self.start_decay(item);
            return Some(item);
        }

        if current.kind == target.kind {
            if new_count == Some(0) && (current.stackable || record.charges().is_some()) {
                if current.stackable {
                    self.remove_or_warn(item);
                    return None;
                }
                let leftover = if current.id == target.id {
                    current.decay_to
                } else {
                    Some(new_type)
                };
                return match leftover {
                    Some(next) if next.0 != 0 && next != new_type => {
                        self.replace_with_fresh(cylinder, index, item, next, None)
                    }
                    Some(next) if next.0 != 0 => self.transform_item(item, next, None),
                    _ => {
                        self.remove_or_warn(item);
                        None
                    }
                };
            }

            self.post_remove_notification(cylinder, item, Some(cylinder), index);
            self.change_type(item, new_type, next_count);
            self.post_add_notification(cylinder, item, Some(cylinder), index);
            self.start_decay(item);
            return Some(item);
        }

        self.replace_with_fresh(cylinder, index, item, new_type, new_count)
    }

    /// `update_thing` plus lifetime bookkeeping for the new type.
    fn change_type(&mut self, item: ItemId, new_type: ItemTypeId, count: u16) {
        self.update_thing(item, new_type, count);
        let lifetime = self.item_types.lookup(new_type).duration_ms();
        if let Some(record) = self.item_mut(item) {
            if lifetime > 0 && record.duration() <= 0 {
                record.set_duration(lifetime);
                record.decaying = DecayState::Idle;
            }
        }
    }

    fn replace_with_fresh(
        &mut self,
        cylinder: CylinderId,
        index: u32,
        item: ItemId,
        new_type: ItemTypeId,
        new_count: Option<u16>,
    ) -> Option<ItemId> {
        let fresh = self.create_item(new_type, new_count.unwrap_or(1))?;
        if self.replace_thing(cylinder, index, fresh).is_none() {
            tracing::warn!(item = item.0, ?cylinder, index, "replacement target vanished");
            self.release_item(fresh);
            return Some(item);
        }
        self.post_add_notification(cylinder, fresh, Some(cylinder), index);
        self.post_remove_notification(cylinder, item, Some(cylinder), index);
        self.release_item(item);
        self.start_decay(fresh);
        Some(fresh)
    }

    fn remove_or_warn(&mut self, item: ItemId) {
        let ret = self.internal_remove_item(item, None, CylinderFlags::empty());
        if !ret.is_ok() {
            tracing::warn!(item = item.0, %ret, "used up item could not be removed");
        }
    }
}
