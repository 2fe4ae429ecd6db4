//! Per-game aggregate. Everything a game owns lives here and is mutated
//! only while the engine holds that game's lock.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::{
    error::{CoreError, Result},
    game::{
        board::{Cell, BOARD_SIZE},
        fog::FogMap,
        types::{Game, GamePhase, MapObject, MoveRequest, MoveStatus, ObjectType, Seat},
    },
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub game: Game,
    pub(crate) seats: BTreeMap<Uuid, Seat>,
    pub(crate) fog: BTreeMap<Uuid, FogMap>,
    pub(crate) objects: Vec<MapObject>,
    /// Every request ever made in this game, in submission order.
    pub(crate) moves: Vec<MoveRequest>,
    pub(crate) inventories: BTreeMap<Uuid, BTreeMap<ObjectType, u32>>,
    next_seq: u64,
    /// Bumped once per persisted mutation; orders snapshot writes.
    #[serde(default)]
    revision: u64,
}

impl GameState {
    pub fn new(id: Uuid, join_code: String, gm_id: Uuid) -> Self {
        GameState {
            game: Game {
                id,
                join_code,
                board_size: BOARD_SIZE,
                phase: GamePhase::Setup,
                gm_id,
                created_at: Utc::now(),
            },
            seats: BTreeMap::new(),
            fog: BTreeMap::new(),
            objects: Vec::new(),
            moves: Vec::new(),
            inventories: BTreeMap::new(),
            next_seq: 0,
            revision: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.game.id
    }

    pub fn phase(&self) -> GamePhase {
        self.game.phase
    }

    pub(crate) fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn bump_revision(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    pub fn is_gm(&self, player_id: Uuid) -> bool {
        self.game.gm_id == player_id
    }

    pub fn require_gm(&self, player_id: Uuid) -> Result<()> {
        if self.is_gm(player_id) {
            Ok(())
        } else {
            Err(CoreError::NotGm(self.game.id))
        }
    }

    /// Fails once the game has ended.
    pub fn require_open(&self) -> Result<()> {
        if self.game.phase == GamePhase::Ended {
            Err(CoreError::InvalidTransition(format!(
                "game {} has ended",
                self.game.id
            )))
        } else {
            Ok(())
        }
    }

    pub fn seat(&self, player_id: Uuid) -> Result<&Seat> {
        self.seats
            .get(&player_id)
            .ok_or(CoreError::NotInGame(self.game.id))
    }

    pub(crate) fn seat_mut(&mut self, player_id: Uuid) -> Result<&mut Seat> {
        let game_id = self.game.id;
        self.seats
            .get_mut(&player_id)
            .ok_or(CoreError::NotInGame(game_id))
    }

    /// Seats in join order.
    pub fn seats(&self) -> Vec<&Seat> {
        let mut seats: Vec<&Seat> = self.seats.values().collect();
        seats.sort_by_key(|s| s.seq);
        seats
    }

    /// Adds a seat; re-seating an existing member keeps their state.
    pub fn add_seat(&mut self, player_id: Uuid, lives: u32, bullets: u32, position: Option<Cell>) {
        if self.seats.contains_key(&player_id) {
            return;
        }
        let seq = self.next_seq();
        self.seats.insert(
            player_id,
            Seat {
                player_id,
                alive: lives > 0,
                lives,
                bullets,
                position,
                seq,
            },
        );
    }

    /// Drops a departed player's seat and closes their open requests.
    /// Inventory and fog map stay for the record.
    pub fn remove_seat(&mut self, player_id: Uuid) -> bool {
        let removed = self.seats.remove(&player_id).is_some();
        for m in self.moves.iter_mut().filter(|m| {
            m.player_id == player_id
                && matches!(m.status, MoveStatus::Pending | MoveStatus::Approved)
        }) {
            m.status = MoveStatus::Rejected;
        }
        removed
    }

    pub fn objects(&self) -> &[MapObject] {
        &self.objects
    }

    /// Move-request ids, for rebuilding the engine's request index.
    pub fn request_ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.moves.iter().map(|m| m.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seats_keep_join_order() {
        let mut gs = GameState::new(Uuid::new_v4(), "ABCDE".into(), Uuid::new_v4());
        let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        for id in &ids {
            gs.add_seat(*id, 3, 0, None);
        }
        gs.add_seat(ids[0], 1, 1, None);
        let order: Vec<Uuid> = gs.seats().iter().map(|s| s.player_id).collect();
        assert_eq!(order, ids);
        assert_eq!(gs.seat(ids[0]).unwrap().lives, 3);
    }

    #[test]
    fn ended_game_is_closed() {
        let mut gs = GameState::new(Uuid::new_v4(), "ABCDE".into(), Uuid::new_v4());
        assert!(gs.require_open().is_ok());
        gs.game.phase = GamePhase::Ended;
        assert!(matches!(
            gs.require_open(),
            Err(CoreError::InvalidTransition(_))
        ));
    }
}
