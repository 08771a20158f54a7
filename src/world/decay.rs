use crate::entities::item::{DecayState, ItemId};
use crate::world::cylinder::CylinderFlags;
use crate::world::state::WorldState;
use std::collections::VecDeque;

/// Round-robin decay queues. One bucket is swept per interval, so every
/// decaying item is visited once per `interval * buckets` milliseconds.
#[derive(Debug)]
pub struct DecayScheduler {
    buckets: Vec<VecDeque<ItemId>>,
    last_bucket: usize,
    /// Items started since the last sweep, newest first.
    incoming: VecDeque<ItemId>,
    interval_ms: u64,
    elapsed_ms: u64,
}

impl Default for DecayScheduler {
    fn default() -> Self {
        Self::new(250, 4)
    }
}

impl DecayScheduler {
    pub fn new(interval_ms: u64, buckets: usize) -> Self {
        DecayScheduler {
            buckets: vec![VecDeque::new(); buckets.max(1)],
            last_bucket: 0,
            incoming: VecDeque::new(),
            interval_ms: interval_ms.max(1),
            elapsed_ms: 0,
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Time between two visits of the same bucket.
    pub fn span_ms(&self) -> i64 {
        (self.interval_ms * self.buckets.len() as u64) as i64
    }

    /// Items waiting in any bucket or in the incoming list.
    pub fn queued(&self) -> usize {
        self.incoming.len() + self.buckets.iter().map(VecDeque::len).sum::<usize>()
    }

    pub fn contains(&self, item: ItemId) -> bool {
        self.incoming.contains(&item) || self.buckets.iter().any(|bucket| bucket.contains(&item))
    }

    /// Drops every queued reference to `item`.
    pub fn forget(&mut self, item: ItemId) {
        self.incoming.retain(|entry| *entry != item);
        for bucket in &mut self.buckets {
            bucket.retain(|entry| *entry != item);
        }
    }
}

impl WorldState {
    /// Placed, has somewhere to decay to, a positive lifetime, and no
    /// unique id.
    pub fn can_decay(&self, item: ItemId) -> bool {
        let Some(record) = self.item(item) else {
            return false;
        };
        if record.parent.is_none() || record.unique_id().is_some() {
            return false;
        }
        let item_type = self.item_type(record);
        item_type.decay_to.is_some() && item_type.duration_secs > 0
    }

    pub fn start_decay(&mut self, item: ItemId) {
        if !self.can_decay(item) {
            return;
        }
        let Some(record) = self.item_mut(item) else {
            return;
        };
        if record.decaying == DecayState::Decaying {
            return;
        }
        if record.duration() > 0 {
            record.decaying = DecayState::Decaying;
            self.decay.incoming.push_front(item);
        } else {
            self.internal_decay_item(item);
        }
    }

    pub fn stop_decay(&mut self, item: ItemId) {
        self.decay.forget(item);
        if let Some(record) = self.item_mut(item) {
            record.decaying = DecayState::Idle;
        }
    }

    /// Turns an expired item into its decay target, or removes it when the
    /// target is zero.
    pub fn internal_decay_item(&mut self, item: ItemId) {
        let Some(record) = self.item(item) else {
            return;
        };
        match self.item_type(record).decay_to {
            Some(target) if target.0 != 0 => {
                if let Some(next) = self.transform_item(item, target, None) {
                    self.start_decay(next);
                }
            }
            _ => {
                let ret = self.internal_remove_item(item, None, CylinderFlags::empty());
                if !ret.is_ok() {
                    tracing::warn!(item = item.0, %ret, "decayed item could not be removed");
                }
            }
        }
    }

    /// Sweeps the next bucket, then files everything started since the last
    /// sweep.
    pub fn check_decay(&mut self) {
        let bucket_count = self.decay.buckets.len();
        let bucket = (self.decay.last_bucket + 1) % bucket_count;
        let span = self.decay.span_ms();
        let half_interval = (self.decay.interval_ms / 2) as i64;

        let queued = std::mem::take(&mut self.decay.buckets[bucket]);
        let mut kept = VecDeque::with_capacity(queued.len());
        for item in queued {
            if !self.can_decay(item) {
                if let Some(record) = self.item_mut(item) {
                    record.decaying = DecayState::Idle;
                }
                continue;
            }
            let Some(record) = self.item_mut(item) else {
                continue;
            };
            let duration = record.duration();
            let decrease = duration.min(span);
            record.decrease_duration(decrease);
            let remaining = duration - decrease;

            if remaining <= 0 {
                record.decaying = DecayState::Idle;
                self.internal_decay_item(item);
            } else if remaining < span {
                let offset = ((remaining + half_interval) / span) as usize;
                let next = (bucket + offset) % bucket_count;
                if next == bucket {
                    record.decaying = DecayState::Idle;
                    self.internal_decay_item(item);
                } else {
                    self.decay.buckets[next].push_back(item);
                }
            } else {
                kept.push_back(item);
            }
        }

        kept.extend(self.decay.buckets[bucket].drain(..));
        self.decay.buckets[bucket] = kept;
        self.decay.last_bucket = bucket;
        self.file_incoming_decay();
    }

    fn file_incoming_decay(&mut self) {
        let bucket_count = self.decay.buckets.len();
        let last = self.decay.last_bucket;
        let span = self.decay.span_ms();
        while let Some(item) = self.decay.incoming.pop_front() {
            let duration = self.item(item).map(|record| record.duration()).unwrap_or(0);
            let target = if duration >= span {
                last
            } else {
                (last + 1 + (duration / span) as usize) % bucket_count
            };
            self.decay.buckets[target].push_back(item);
        }
    }

    pub fn decay_interval_ms(&self) -> u64 {
        self.decay.interval_ms()
    }

    pub fn decay_queued(&self) -> usize {
        self.decay.queued()
    }

    /// Advances the decay clock, sweeping once per elapsed interval.
    pub fn tick_decay(&mut self, elapsed_ms: u64) {
        self.decay.elapsed_ms += elapsed_ms;
        while self.decay.elapsed_ms >= self.decay.interval_ms {
            self.decay.elapsed_ms -= self.decay.interval_ms;
            self.check_decay();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::item::ItemAttribute;
    use crate::world::test_support::{fixture_world, BURNT_TORCH, SWORD, TORCH};

    #[test]
    fn torch_burns_down_then_disappears() {
        let mut world = fixture_world();
        let torch = world.spawn_on_tile(TORCH, 1);
        world.start_decay(torch);
        assert!(world.decay.contains(torch));

        world.tick_decay(2000);
        assert_eq!(world.item(torch).map(|item| item.type_id), Some(TORCH));
        assert_eq!(world.item(torch).map(|item| item.duration()), Some(1000));

        world.tick_decay(250);
        let burnt = world.item(torch).expect("burnt torch");
        assert_eq!(burnt.type_id, BURNT_TORCH);
        assert_eq!(burnt.decaying, DecayState::Decaying);

        world.tick_decay(1000);
        assert!(world.item(torch).is_none());
        assert_eq!(world.decay.queued(), 0);
    }

    #[test]
    fn only_placed_decayable_items_are_queued() {
        let mut world = fixture_world();
        let loose = world.create_item(TORCH, 1).expect("torch");
        world.start_decay(loose);
        assert!(!world.decay.contains(loose));

        let sword = world.spawn_on_tile(SWORD, 1);
        world.start_decay(sword);
        assert!(!world.decay.contains(sword));

        let marked = world.spawn_on_tile(TORCH, 1);
        if let Some(record) = world.item_mut(marked) {
            record.attributes.push(ItemAttribute::UniqueId(1000));
        }
        world.start_decay(marked);
        assert!(!world.decay.contains(marked));
    }

    #[test]
    fn stopped_items_keep_their_remaining_time() {
        let mut world = fixture_world();
        let torch = world.spawn_on_tile(TORCH, 1);
        world.start_decay(torch);
        world.stop_decay(torch);
        assert_eq!(world.decay.queued(), 0);
        world.tick_decay(5000);
        let record = world.item(torch).expect("torch");
        assert_eq!(record.type_id, TORCH);
        assert_eq!(record.duration(), 2000);
        assert_eq!(record.decaying, DecayState::Idle);
    }

    #[test]
    fn released_items_leave_the_queue() {
        let mut world = fixture_world();
        let torch = world.spawn_on_tile(TORCH, 1);
        world.start_decay(torch);
        world.tick_decay(250);
        world.release_item(torch);
        assert_eq!(world.decay.queued(), 0);
        world.tick_decay(5000);
    }
}
