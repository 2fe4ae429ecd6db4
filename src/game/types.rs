use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::board::Cell;

/// Already-authenticated caller handed to every core operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// Opaque identity reference from the auth provider.
    pub identity: String,
    /// Whether this identity may create (and so administer) games.
    pub gm_eligible: bool,
}

impl Caller {
    pub fn player(identity: impl Into<String>) -> Self {
        Caller {
            identity: identity.into(),
            gm_eligible: false,
        }
    }

    pub fn gm(identity: impl Into<String>) -> Self {
        Caller {
            identity: identity.into(),
            gm_eligible: true,
        }
    }
}

/// Game life-cycle.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Setup,
    Active,
    Ended,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Game {
    pub id: Uuid,
    pub join_code: String,
    pub board_size: u8,
    pub phase: GamePhase,
    pub gm_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Identity-level player row kept by the directory.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: Uuid,
    pub identity_ref: String,
    /// Empty until set; never reassigned afterwards.
    pub name: String,
    pub game_id: Option<Uuid>,
    pub is_gm: bool,
    pub created_at: DateTime<Utc>,
}

/// Game-scoped state of one bound player.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Seat {
    pub player_id: Uuid,
    pub alive: bool,
    pub lives: u32,
    pub bullets: u32,
    pub position: Option<Cell>,
    pub seq: u64,
}

/// Full player record: profile joined with its seat (if bound).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: Uuid,
    pub identity_ref: String,
    pub game_id: Option<Uuid>,
    pub is_gm: bool,
    pub name: String,
    pub alive: bool,
    pub lives: u32,
    pub bullets: u32,
    pub row: Option<u8>,
    pub col: Option<u8>,
}

impl Player {
    pub fn from_parts(profile: &Profile, seat: Option<&Seat>) -> Self {
        let position = seat.and_then(|s| s.position);
        Player {
            id: profile.id,
            identity_ref: profile.identity_ref.clone(),
            game_id: profile.game_id,
            is_gm: profile.is_gm,
            name: profile.name.clone(),
            alive: seat.map_or(true, |s| s.alive),
            lives: seat.map_or(0, |s| s.lives),
            bullets: seat.map_or(0, |s| s.bullets),
            row: position.map(|c| c.row),
            col: position.map(|c| c.col),
        }
    }

    pub fn cell(&self) -> Option<Cell> {
        match (self.row, self.col) {
            (Some(row), Some(col)) => Some(Cell { row, col }),
            _ => None,
        }
    }
}

/// What one player has marked on their private map.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TileState {
    Unknown,
    Empty,
    Corpse,
    Blocked,
    Loot,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FogTile {
    pub game_id: Uuid,
    pub player_id: Uuid,
    pub row: u8,
    pub col: u8,
    pub state: TileState,
}

/// Loot kinds scattered on the board.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    Ammo,
    Binoculars,
    Vest,
    Gas,
    Moto,
    Trap,
    Life,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct MapObject {
    pub id: Uuid,
    pub game_id: Uuid,
    pub row: u8,
    pub col: u8,
    pub object_type: ObjectType,
    pub qty: u32,
    pub claimed_by_player_id: Option<Uuid>,
    pub claimed_at: Option<DateTime<Utc>>,
}

impl MapObject {
    pub fn cell(&self) -> Cell {
        Cell {
            row: self.row,
            col: self.col,
        }
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed_by_player_id.is_some()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct InventoryEntry {
    pub object_type: ObjectType,
    pub qty: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MoveStatus {
    Pending,
    Approved,
    Rejected,
    Applied,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct MoveRequest {
    pub id: Uuid,
    pub game_id: Uuid,
    pub player_id: Uuid,
    pub from_row: Option<u8>,
    pub from_col: Option<u8>,
    pub to_row: u8,
    pub to_col: u8,
    pub status: MoveStatus,
    pub created_at: DateTime<Utc>,
    /// Submission order inside the game; breaks `created_at` ties.
    pub seq: u64,
}

impl MoveRequest {
    pub fn target(&self) -> Cell {
        Cell {
            row: self.to_row,
            col: self.to_col,
        }
    }
}

/// GM verdict on a pending request.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Approved,
    Rejected,
}

impl From<Resolution> for MoveStatus {
    fn from(r: Resolution) -> Self {
        match r {
            Resolution::Approved => MoveStatus::Approved,
            Resolution::Rejected => MoveStatus::Rejected,
        }
    }
}

// ---------- operation results ----------

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CreatedGame {
    pub game_id: Uuid,
    pub join_code: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct JoinedGame {
    pub game_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StartSummary {
    pub players_count: usize,
    pub objects_count: usize,
}

/// Pending request joined with the requester's display name.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PendingMove {
    pub request_id: Uuid,
    pub player_id: Uuid,
    pub player_name: String,
    pub from_row: Option<u8>,
    pub from_col: Option<u8>,
    pub to_row: u8,
    pub to_col: u8,
    pub created_at: DateTime<Utc>,
}

/// Partial vitals update issued by the GM.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct VitalsUpdate {
    #[serde(default)]
    pub lives: Option<u32>,
    #[serde(default)]
    pub bullets: Option<u32>,
    #[serde(default)]
    pub alive: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PlayerInventory {
    pub player_id: Uuid,
    pub items: Vec<InventoryEntry>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Dashboard {
    pub game: Game,
    pub players: Vec<Player>,
    pub objects: Vec<MapObject>,
    pub inventories: Vec<PlayerInventory>,
}
