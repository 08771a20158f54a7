use crate::entities::item::ItemId;
use crate::world::cylinder::{CylinderFlags, CylinderId, SlotIndex};
use crate::world::state::WorldState;
use std::collections::VecDeque;

impl WorldState {
    /// Worth of one item in gold, zero for anything that is not currency.
    pub fn item_worth(&self, item: ItemId) -> u64 {
        self.item(item)
            .map(|record| u64::from(self.item_type(record).worth) * u64::from(record.count))
            .unwrap_or(0)
    }

    /// Every currency stack reachable from `cylinder`, cheapest first. Equal
    /// worths keep discovery order.
    fn money_stacks(&self, cylinder: CylinderId) -> Vec<(u64, ItemId)> {
        let Some(owner) = self.cylinder(cylinder) else {
            return Vec::new();
        };
        let mut stacks = Vec::new();
        let mut containers = VecDeque::new();
        let mut visit = |id: ItemId, containers: &mut VecDeque<ItemId>| {
            if self.container(id).is_some() {
                containers.push_back(id);
            } else {
                let worth = self.item_worth(id);
                if worth > 0 {
                    stacks.push((worth, id));
                }
            }
        };

        for index in owner.first_index()..owner.last_index(self) {
            if let Some(id) = owner.thing(self, index) {
                visit(id, &mut containers);
            }
        }
        while let Some(container) = containers.pop_front() {
            let Some(container) = self.container(container) else {
                continue;
            };
            for id in container.items() {
                visit(*id, &mut containers);
            }
        }
        stacks.sort_by_key(|(worth, _)| *worth);
        stacks
    }

    pub fn money_count(&self, cylinder: CylinderId) -> u64 {
        self.money_stacks(cylinder).iter().map(|(worth, _)| worth).sum()
    }

    /// Takes `money` gold worth out of `cylinder`, spending small stacks
    /// first and paying change back into the same cylinder. Nothing is
    /// touched when the total is short.
    pub fn remove_money(&mut self, cylinder: CylinderId, money: u64, flags: CylinderFlags) -> bool {
        if money == 0 {
            return true;
        }
        let stacks = self.money_stacks(cylinder);
        let total: u64 = stacks.iter().map(|(worth, _)| worth).sum();
        if total < money {
            return false;
        }

        let mut owed = money;
        for (worth, item) in stacks {
            if worth < owed {
                self.spend(item, None, flags);
                owed -= worth;
                continue;
            }
            if worth > owed {
                let units = self.item(item).map(|record| u64::from(record.count)).unwrap_or(1);
                let unit_worth = worth / units.max(1);
                let spent_units = owed.div_ceil(unit_worth);
                let change = spent_units * unit_worth - owed;
                self.spend(item, Some(spent_units as u32), flags);
                self.add_money(cylinder, change, flags);
            } else {
                self.spend(item, None, flags);
            }
            break;
        }
        true
    }

    fn spend(&mut self, item: ItemId, count: Option<u32>, flags: CylinderFlags) {
        let ret = self.internal_remove_item(item, count, flags);
        if !ret.is_ok() {
            tracing::warn!(item = item.0, %ret, "currency could not be removed");
        }
    }

    /// Pays `money` gold worth into `cylinder` in the largest coins,
    /// dropping what does not fit onto the tile the cylinder is seen at.
    pub fn add_money(&mut self, cylinder: CylinderId, money: u64, flags: CylinderFlags) {
        if money == 0 {
            return;
        }
        let currency = self.item_types.currency().to_vec();
        let max_stack = u64::from(self.config.max_stack.max(1));
        let mut owed = money;
        for (worth, type_id) in currency {
            let worth = u64::from(worth);
            let mut coins = owed / worth;
            if coins == 0 {
                continue;
            }
            owed -= coins * worth;
            while coins > 0 {
                let count = coins.min(max_stack);
                coins -= count;
                let Some(stack) = self.create_item(type_id, count as u16) else {
                    break;
                };
                let (ret, remainder) =
                    self.internal_add_item(cylinder, stack, SlotIndex::Wherever, flags);
                if !ret.is_ok() || remainder > 0 {
                    self.drop_near(cylinder, stack);
                }
            }
        }
        if owed > 0 {
            tracing::warn!(owed, ?cylinder, "no coin small enough for the rest");
        }
    }

    fn drop_near(&mut self, cylinder: CylinderId, item: ItemId) {
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
        tracing::warn!(item = item.0, ?cylinder, "coins lost, no tile to drop them on");
        self.release_item(item);
    }
}
