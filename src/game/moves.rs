//! Move-Request Workflow.
//!
//! ```text
//! pending ──► approved ──► applied
//!    └──────► rejected
//! ```
//! `rejected` and `applied` are terminal. A player holds at most one
//! `pending` request; submitting again overwrites it.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    error::{CoreError, Result},
    game::{
        board::Cell,
        state::GameState,
        types::{GamePhase, MapObject, MoveRequest, MoveStatus, Resolution},
    },
};

/// What one `apply_approved` batch did.
#[derive(Debug, Default, Clone)]
pub struct ApplyOutcome {
    pub applied: Vec<Uuid>,
    pub failed: Vec<(Uuid, CoreError)>,
    pub claims: Vec<MapObject>,
}

impl ApplyOutcome {
    pub fn count(&self) -> usize {
        self.applied.len()
    }
}

impl GameState {
    fn require_active(&self) -> Result<()> {
        match self.game.phase {
            GamePhase::Active => Ok(()),
            phase => Err(CoreError::InvalidTransition(format!(
                "game {} is {phase:?}, not active",
                self.game.id
            ))),
        }
    }

    /// Records (or overwrites) the player's pending request to `to`.
    pub fn request_move(
        &mut self,
        player_id: Uuid,
        to: Cell,
        max_distance: Option<u8>,
        now: DateTime<Utc>,
    ) -> Result<MoveRequest> {
        if self.is_gm(player_id) {
            return Err(CoreError::GmCannotRequest);
        }
        let seat = self.seat(player_id)?;
        if !to.in_bounds() {
            return Err(CoreError::OutOfBounds {
                row: to.row.into(),
                col: to.col.into(),
            });
        }
        if !seat.alive {
            return Err(CoreError::PlayerDead(player_id));
        }
        self.require_active()?;

        let from = seat.position;
        if let (Some(limit), Some(from)) = (max_distance, from) {
            if from.distance(to) > limit {
                return Err(CoreError::Validation(format!(
                    "target is more than {limit} cells away"
                )));
            }
        }

        let seq = self.next_seq();
        let game_id = self.game.id;
        let existing = self
            .moves
            .iter_mut()
            .find(|m| m.player_id == player_id && m.status == MoveStatus::Pending);

        let request = match existing {
            Some(m) => {
                m.from_row = from.map(|c| c.row);
                m.from_col = from.map(|c| c.col);
                m.to_row = to.row;
                m.to_col = to.col;
                m.created_at = now;
                m.seq = seq;
                m.clone()
            }
            None => {
                let m = MoveRequest {
                    id: Uuid::new_v4(),
                    game_id,
                    player_id,
                    from_row: from.map(|c| c.row),
                    from_col: from.map(|c| c.col),
                    to_row: to.row,
                    to_col: to.col,
                    status: MoveStatus::Pending,
                    created_at: now,
                    seq,
                };
                self.moves.push(m.clone());
                m
            }
        };
        Ok(request)
    }

    /// The player's most recent request, whatever its status.
    pub fn latest_request(&self, player_id: Uuid) -> Option<&MoveRequest> {
        self.moves
            .iter()
            .filter(|m| m.player_id == player_id)
            .max_by_key(|m| (m.created_at, m.seq))
    }

    /// Pending requests, oldest first.
    pub fn pending(&self) -> Vec<&MoveRequest> {
        self.ordered(MoveStatus::Pending)
    }

    fn ordered(&self, status: MoveStatus) -> Vec<&MoveRequest> {
        let mut out: Vec<&MoveRequest> =
            self.moves.iter().filter(|m| m.status == status).collect();
        out.sort_by_key(|m| (m.created_at, m.seq));
        out
    }

    pub fn request(&self, request_id: Uuid) -> Result<&MoveRequest> {
        self.moves
            .iter()
            .find(|m| m.id == request_id)
            .ok_or(CoreError::RequestNotFound(request_id))
    }

    /// `pending → approved | rejected`. Never touches positions.
    pub fn resolve(&mut self, request_id: Uuid, resolution: Resolution) -> Result<MoveRequest> {
        self.require_open()?;
        let m = self
            .moves
            .iter_mut()
            .find(|m| m.id == request_id)
            .ok_or(CoreError::RequestNotFound(request_id))?;
        if m.status != MoveStatus::Pending {
            return Err(CoreError::InvalidTransition(format!(
                "request {request_id} is {:?}, not pending",
                m.status
            )));
        }
        m.status = resolution.into();
        Ok(m.clone())
    }

    /// Applies every approved request in submission order.
    ///
    /// Each request is checked before anything is written, so a request
    /// either moves its player, becomes `applied` and claims loot, or is
    /// left `approved` untouched. Earlier claims win ties on a cell.
    pub fn apply_approved(&mut self, now: DateTime<Utc>) -> Result<ApplyOutcome> {
        self.require_active()?;

        let batch: Vec<(Uuid, Uuid, Cell)> = self
            .ordered(MoveStatus::Approved)
            .into_iter()
            .map(|m| (m.id, m.player_id, m.target()))
            .collect();

        let mut outcome = ApplyOutcome::default();
        for (request_id, player_id, to) in batch {
            match self.apply_one(request_id, player_id, to, now) {
                Ok(claim) => {
                    outcome.applied.push(request_id);
                    outcome.claims.extend(claim);
                }
                Err(e) => {
                    log::warn!(
                        "game {}: approved request {request_id} not applied: {e}",
                        self.game.id
                    );
                    outcome.failed.push((request_id, e));
                }
            }
        }
        Ok(outcome)
    }

    fn apply_one(
        &mut self,
        request_id: Uuid,
        player_id: Uuid,
        to: Cell,
        now: DateTime<Utc>,
    ) -> Result<Option<MapObject>> {
        if !to.in_bounds() {
            return Err(CoreError::OutOfBounds {
                row: to.row.into(),
                col: to.col.into(),
            });
        }
        let idx = self
            .moves
            .iter()
            .position(|m| m.id == request_id)
            .ok_or(CoreError::RequestNotFound(request_id))?;
        self.seat(player_id)?;

        // checks done; nothing below can fail
        self.seat_mut(player_id)?.position = Some(to);
        self.moves[idx].status = MoveStatus::Applied;
        Ok(self.claim_if_present(player_id, to, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_game() -> (GameState, Uuid, Uuid) {
        let gm = Uuid::new_v4();
        let p = Uuid::new_v4();
        let mut gs = GameState::new(Uuid::new_v4(), "ABCDE".into(), gm);
        gs.add_seat(gm, 3, 0, Some(Cell { row: 1, col: 1 }));
        gs.add_seat(p, 3, 0, Some(Cell { row: 1, col: 1 }));
        gs.game.phase = GamePhase::Active;
        (gs, gm, p)
    }

    #[test]
    fn second_request_overwrites_pending() {
        let (mut gs, _, p) = active_game();
        let a = gs
            .request_move(p, Cell { row: 2, col: 2 }, None, Utc::now())
            .unwrap();
        let b = gs
            .request_move(p, Cell { row: 5, col: 6 }, None, Utc::now())
            .unwrap();
        assert_eq!(a.id, b.id);
        let pending = gs.pending();
        assert_eq!(pending.len(), 1);
        assert_eq!((pending[0].to_row, pending[0].to_col), (5, 6));
    }

    #[test]
    fn gm_cannot_request() {
        let (mut gs, gm, _) = active_game();
        assert_eq!(
            gs.request_move(gm, Cell { row: 2, col: 2 }, None, Utc::now()),
            Err(CoreError::GmCannotRequest)
        );
    }

    #[test]
    fn distance_limit_applies_when_configured() {
        let (mut gs, _, p) = active_game();
        assert!(matches!(
            gs.request_move(p, Cell { row: 4, col: 4 }, Some(1), Utc::now()),
            Err(CoreError::Validation(_))
        ));
        assert!(gs
            .request_move(p, Cell { row: 2, col: 2 }, Some(1), Utc::now())
            .is_ok());
    }

    #[test]
    fn dead_player_cannot_request() {
        let (mut gs, _, p) = active_game();
        gs.seat_mut(p).unwrap().alive = false;
        assert_eq!(
            gs.request_move(p, Cell { row: 2, col: 2 }, None, Utc::now()),
            Err(CoreError::PlayerDead(p))
        );
    }

    #[test]
    fn resolve_only_from_pending() {
        let (mut gs, _, p) = active_game();
        let r = gs
            .request_move(p, Cell { row: 3, col: 3 }, None, Utc::now())
            .unwrap();
        gs.resolve(r.id, Resolution::Rejected).unwrap();
        assert!(matches!(
            gs.resolve(r.id, Resolution::Approved),
            Err(CoreError::InvalidTransition(_))
        ));
        assert_eq!(gs.request(r.id).unwrap().status, MoveStatus::Rejected);
        assert_eq!(gs.seat(p).unwrap().position, Some(Cell { row: 1, col: 1 }));
    }

    #[test]
    fn apply_skips_departed_player_and_continues() {
        let (mut gs, _, p) = active_game();
        let q = Uuid::new_v4();
        gs.add_seat(q, 3, 0, Some(Cell { row: 8, col: 8 }));
        let rp = gs
            .request_move(p, Cell { row: 2, col: 3 }, None, Utc::now())
            .unwrap();
        let rq = gs
            .request_move(q, Cell { row: 7, col: 7 }, None, Utc::now())
            .unwrap();
        gs.resolve(rp.id, Resolution::Approved).unwrap();
        gs.resolve(rq.id, Resolution::Approved).unwrap();
        // seat vanishes without the request being closed
        gs.seats.remove(&p);

        let out = gs.apply_approved(Utc::now()).unwrap();
        assert_eq!(out.applied, vec![rq.id]);
        assert_eq!(out.failed.len(), 1);
        assert_eq!(gs.request(rp.id).unwrap().status, MoveStatus::Approved);
        assert_eq!(gs.seat(q).unwrap().position, Some(Cell { row: 7, col: 7 }));
    }
}
