//! Loot Engine: seeding map objects and one-time claims into inventories.

use chrono::{DateTime, Utc};
use rand::Rng;
use std::collections::HashSet;
use uuid::Uuid;

use crate::{
    error::Result,
    game::{
        board::{random_free_cells, Cell},
        state::GameState,
        types::{InventoryEntry, MapObject, ObjectType},
    },
};

/// Object kinds and the quantity each placed object carries.
pub const CATALOGUE: [(ObjectType, u32); 7] = [
    (ObjectType::Life, 1),
    (ObjectType::Ammo, 3),
    (ObjectType::Binoculars, 1),
    (ObjectType::Vest, 1),
    (ObjectType::Gas, 1),
    (ObjectType::Moto, 1),
    (ObjectType::Trap, 1),
];

/// Type and quantity of the `i`-th object in a seeding batch.
pub fn catalogue_entry(i: usize) -> (ObjectType, u32) {
    CATALOGUE[i % CATALOGUE.len()]
}

impl GameState {
    /// Places `count` objects on cells free of other unclaimed objects.
    pub fn seed_objects<R: Rng + ?Sized>(&mut self, rng: &mut R, count: usize) -> Result<usize> {
        let taken: HashSet<Cell> = self
            .objects
            .iter()
            .filter(|o| !o.is_claimed())
            .map(MapObject::cell)
            .collect();
        let cells = random_free_cells(rng, &taken, count)?;

        let game_id = self.game.id;
        self.objects
            .extend(cells.into_iter().enumerate().map(|(i, cell)| {
                let (object_type, qty) = catalogue_entry(i);
                MapObject {
                    id: Uuid::new_v4(),
                    game_id,
                    row: cell.row,
                    col: cell.col,
                    object_type,
                    qty,
                    claimed_by_player_id: None,
                    claimed_at: None,
                }
            }));
        Ok(count)
    }

    /// Claims the unclaimed object at `cell` for `player_id`, if any.
    ///
    /// A claimed object never changes hands again; a second player reaching
    /// the same cell finds nothing.
    pub fn claim_if_present(
        &mut self,
        player_id: Uuid,
        cell: Cell,
        now: DateTime<Utc>,
    ) -> Option<MapObject> {
        let obj = self
            .objects
            .iter_mut()
            .find(|o| !o.is_claimed() && o.cell() == cell)?;
        obj.claimed_by_player_id = Some(player_id);
        obj.claimed_at = Some(now);
        let claimed = obj.clone();

        *self
            .inventories
            .entry(player_id)
            .or_default()
            .entry(claimed.object_type)
            .or_insert(0) += claimed.qty;

        log::info!(
            "game {}: player {player_id} claimed {:?} x{} at ({}, {})",
            self.game.id,
            claimed.object_type,
            claimed.qty,
            cell.row,
            cell.col
        );
        Some(claimed)
    }

    /// Player inventory ordered by object type. Zero rows may appear.
    pub fn inventory(&self, player_id: Uuid) -> Vec<InventoryEntry> {
        self.inventories
            .get(&player_id)
            .map(|items| {
                items
                    .iter()
                    .map(|(object_type, qty)| InventoryEntry {
                        object_type: *object_type,
                        qty: *qty,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}
