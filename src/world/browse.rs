use crate::entities::container::ContainerKind;
use crate::entities::item::ItemId;
use crate::entities::player::PlayerId;
use crate::world::item_types::ITEM_BROWSEFIELD;
use crate::world::position::Position;
use crate::world::state::WorldState;
use std::collections::BTreeSet;

/// Shared container view over one tile, alive while anyone looks at it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseField {
    pub container: ItemId,
    viewers: BTreeSet<PlayerId>,
}

impl BrowseField {
    pub fn viewers(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.viewers.iter().copied()
    }
}

/// Tile items a browse field shows: anything moveable plus containers.
pub fn browse_items(world: &WorldState, position: Position) -> Vec<ItemId> {
    let Some(tile) = world.tile(position) else {
        return Vec::new();
    };
    tile.items()
        .into_iter()
        .filter(|id| {
            world
                .item(*id)
                .map(|item| world.item_type(item).moveable || world.container(*id).is_some())
                .unwrap_or(false)
        })
        .collect()
}

impl WorldState {
    pub fn browse_field(&self, position: Position) -> Option<ItemId> {
        self.browse_fields.get(&position).map(|field| field.container)
    }

    /// Opens (or joins) the browse field of the tile at `position`.
    pub fn open_browse_field(&mut self, player: PlayerId, position: Position) -> Option<ItemId> {
        self.player(player)?;
        self.tile(position)?;
        if let Some(field) = self.browse_fields.get_mut(&position) {
            field.viewers.insert(player);
            return Some(field.container);
        }
        let container = self.create_container_item(
            ITEM_BROWSEFIELD,
            ContainerKind::BrowseField { position },
            self.config.browse_field_capacity,
            true,
        );
        self.browse_fields.insert(
            position,
            BrowseField {
                container,
                viewers: BTreeSet::from([player]),
            },
        );
        tracing::debug!(player = player.0, %position, "browse field opened");
        Some(container)
    }

    /// Leaves a browse field; the last viewer tears it down.
    pub fn close_browse_field(&mut self, player: PlayerId, position: Position) {
        let Some(field) = self.browse_fields.get_mut(&position) else {
            return;
        };
        field.viewers.remove(&player);
        if field.viewers.is_empty() {
            let container = field.container;
            self.browse_fields.remove(&position);
            self.release_item(container);
        }
    }

    pub(crate) fn close_browse_fields_of(&mut self, player: PlayerId) {
        let positions: Vec<Position> = self
            .browse_fields
            .iter()
            .filter(|(_, field)| field.viewers.contains(&player))
            .map(|(position, _)| *position)
            .collect();
        for position in positions {
            self.close_browse_field(player, position);
        }
    }
}
