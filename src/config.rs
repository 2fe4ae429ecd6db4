//! Runtime configuration for the fog-of-war game server.

use once_cell::sync::Lazy;
use std::env;

use crate::game::board::Cell;

#[derive(Debug, Clone)]
pub struct Settings {
    /// Items seeded by `start_game` when the GM does not pass a count.
    pub default_item_count: u32,
    /// Lives given to a freshly bound seat.
    pub start_lives: u32,
    /// Bullets given to a freshly bound seat.
    pub start_bullets: u32,
    /// Length of generated join codes.
    pub join_code_len: usize,
    /// Refuse `join_game` while the player sits in another unfinished game.
    pub exclusive_membership: bool,
    /// Largest Chebyshev step a move request may cover (`None` = any cell).
    pub max_move_distance: Option<u8>,
    /// Where the GM is placed when a game is created.
    pub gm_start: Cell,
    /// Redis snapshot expiry (seconds).
    pub snapshot_ttl: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            default_item_count: 12,
            start_lives: 3,
            start_bullets: 0,
            join_code_len: 5,
            exclusive_membership: true,
            max_move_distance: None,
            gm_start: Cell { row: 1, col: 1 },
            snapshot_ttl: 86_400,
        }
    }
}

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

impl Settings {
    pub fn from_env() -> Self {
        let d = Settings::default();

        let exclusive_membership = env::var("EXCLUSIVE_MEMBERSHIP")
            .ok()
            .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no"))
            .unwrap_or(d.exclusive_membership);

        Settings {
            default_item_count: parsed("DEFAULT_ITEM_COUNT").unwrap_or(d.default_item_count),
            start_lives: parsed("START_LIVES").unwrap_or(d.start_lives),
            start_bullets: parsed("START_BULLETS").unwrap_or(d.start_bullets),
            join_code_len: parsed::<usize>("JOIN_CODE_LEN")
                .filter(|n| (4..=12).contains(n))
                .unwrap_or(d.join_code_len),
            exclusive_membership,
            max_move_distance: parsed::<u8>("MAX_MOVE_DISTANCE").filter(|n| *n > 0),
            gm_start: d.gm_start,
            snapshot_ttl: parsed("SNAPSHOT_TTL").unwrap_or(d.snapshot_ttl),
        }
    }
}

static SETTINGS: Lazy<Settings> = Lazy::new(Settings::from_env);

pub fn settings() -> &'static Settings {
    &SETTINGS
}
