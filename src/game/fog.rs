//! Fog Map Engine: each player's private view of the board.
//!
//! A map is materialised as one complete `CELL_COUNT` grid in a single
//! insert under the game lock, so callers observe either no map or a full one.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{CoreError, Result},
    game::{
        board::{all_cells, Cell, CELL_COUNT},
        state::GameState,
        types::{FogTile, TileState},
    },
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FogMap(Vec<TileState>);

impl FogMap {
    pub fn unknown() -> Self {
        FogMap(vec![TileState::Unknown; CELL_COUNT])
    }

    pub fn get(&self, cell: Cell) -> TileState {
        self.0[cell.index()]
    }

    fn set(&mut self, cell: Cell, state: TileState) {
        self.0[cell.index()] = state;
    }
}

impl GameState {
    /// Materialises the player's map if it does not exist yet.
    /// Returns `true` when this call created it.
    pub fn ensure_player_map(&mut self, player_id: Uuid) -> Result<bool> {
        self.seat(player_id)?;
        if self.fog.contains_key(&player_id) {
            return Ok(false);
        }
        self.fog.insert(player_id, FogMap::unknown());
        Ok(true)
    }

    /// Writes one cell of the player's map. Only the GM's own map is
    /// writable here; other players change their view by moving.
    pub fn set_tile(&mut self, player_id: Uuid, cell: Cell, state: TileState) -> Result<FogTile> {
        if !self.is_gm(player_id) {
            return Err(CoreError::NotAuthorized(
                "only the GM edits a map directly".into(),
            ));
        }
        if !cell.in_bounds() {
            return Err(CoreError::OutOfBounds {
                row: cell.row.into(),
                col: cell.col.into(),
            });
        }
        self.ensure_player_map(player_id)?;
        if let Some(map) = self.fog.get_mut(&player_id) {
            map.set(cell, state);
        }
        Ok(self.tile(player_id, cell, state))
    }

    /// All tiles of the player's map ordered by `(row, col)`; empty when
    /// the map has not been materialised.
    pub fn tiles(&self, player_id: Uuid) -> Vec<FogTile> {
        match self.fog.get(&player_id) {
            Some(map) => all_cells()
                .map(|cell| self.tile(player_id, cell, map.get(cell)))
                .collect(),
            None => Vec::new(),
        }
    }

    fn tile(&self, player_id: Uuid, cell: Cell, state: TileState) -> FogTile {
        FogTile {
            game_id: self.game.id,
            player_id,
            row: cell.row,
            col: cell.col,
            state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game_with(gm: Uuid, player: Uuid) -> GameState {
        let mut gs = GameState::new(Uuid::new_v4(), "ABCDE".into(), gm);
        gs.add_seat(gm, 3, 0, None);
        gs.add_seat(player, 3, 0, None);
        gs
    }

    #[test]
    fn ensure_creates_full_unknown_grid_once() {
        let (gm, p) = (Uuid::new_v4(), Uuid::new_v4());
        let mut gs = game_with(gm, p);
        assert!(gs.ensure_player_map(p).unwrap());
        assert!(!gs.ensure_player_map(p).unwrap());
        let tiles = gs.tiles(p);
        assert_eq!(tiles.len(), CELL_COUNT);
        assert!(tiles.iter().all(|t| t.state == TileState::Unknown));
        assert!(tiles
            .windows(2)
            .all(|w| (w[0].row, w[0].col) < (w[1].row, w[1].col)));
    }

    #[test]
    fn only_gm_writes_tiles() {
        let (gm, p) = (Uuid::new_v4(), Uuid::new_v4());
        let mut gs = game_with(gm, p);
        let cell = Cell { row: 2, col: 5 };
        assert!(matches!(
            gs.set_tile(p, cell, TileState::Empty),
            Err(CoreError::NotAuthorized(_))
        ));
        let t = gs.set_tile(gm, cell, TileState::Corpse).unwrap();
        assert_eq!((t.row, t.col, t.state), (2, 5, TileState::Corpse));
        assert_eq!(gs.tiles(gm)[cell.index()].state, TileState::Corpse);
    }

    #[test]
    fn map_requires_a_seat() {
        let mut gs = game_with(Uuid::new_v4(), Uuid::new_v4());
        assert!(matches!(
            gs.ensure_player_map(Uuid::new_v4()),
            Err(CoreError::NotInGame(_))
        ));
    }
}
