use crate::entities::item::{ItemId, ItemTypeId};
use crate::world::cylinder::CylinderId;
use crate::world::state::WorldState;
use std::collections::VecDeque;

impl WorldState {
    /// First item of `type_id` directly in `cylinder`, then breadth-first
    /// through nested containers when `deep` is set. `sub_type` filters by
    /// stack count or charges.
    pub fn find_item_of_type(
        &self,
        cylinder: CylinderId,
        type_id: ItemTypeId,
        deep: bool,
        sub_type: Option<u16>,
    ) -> Option<ItemId> {
        let owner = self.cylinder(cylinder)?;
        let matches = |id: ItemId| {
            self.item(id)
                .map(|item| {
                    item.type_id == type_id
                        && sub_type.map_or(true, |wanted| {
                            item.sub_type(self.item_type(item).stackable) == wanted
                        })
                })
                .unwrap_or(false)
        };

        let mut containers = VecDeque::new();
        for index in owner.first_index()..owner.last_index(self) {
            let Some(id) = owner.thing(self, index) else {
                continue;
            };
            if matches(id) {
                return Some(id);
            }
            if deep && self.container(id).is_some() {
                containers.push_back(id);
            }
        }
        while let Some(container) = containers.pop_front() {
            let Some(container) = self.container(container) else {
                continue;
            };
            for id in container.items() {
                if matches(*id) {
                    return Some(*id);
                }
                if self.container(*id).is_some() {
                    containers.push_back(*id);
                }
            }
        }
        None
    }

    /// Units of `type_id` in `cylinder` and everything nested in it.
    pub fn item_type_count(
        &self,
        cylinder: CylinderId,
        type_id: ItemTypeId,
        sub_type: Option<u16>,
    ) -> u32 {
        let Some(owner) = self.cylinder(cylinder) else {
            return 0;
        };
        let mut total = 0;
        let mut pending: VecDeque<ItemId> = (owner.first_index()..owner.last_index(self))
            .filter_map(|index| owner.thing(self, index))
            .collect();
        while let Some(id) = pending.pop_front() {
            let Some(item) = self.item(id) else {
                continue;
            };
            if item.type_id == type_id {
                total += self.count_by_type(item, sub_type);
            }
            if let Some(container) = self.container(id) {
                pending.extend(container.items().iter().copied());
            }
        }
        total
    }
}
