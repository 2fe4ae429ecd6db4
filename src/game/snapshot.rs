//! Serializable per-game snapshot stored in Redis after every mutation.

use anyhow::Context;
use redis::{AsyncCommands, Client as RedisClient, Script};
use serde::{Deserialize, Serialize};
use tokio_retry::{
    strategy::{jitter, ExponentialBackoff},
    Retry,
};
use uuid::Uuid;

use crate::game::{directory::PlayerDirectory, state::GameState, types::Profile};

/// Key = `game:<game_id>:snap` (JSON)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub state: GameState,
    /// Profiles of every seated player, so names and bindings survive.
    pub profiles: Vec<Profile>,
}

impl Snapshot {
    pub fn capture(state: &GameState, directory: &PlayerDirectory) -> Self {
        let profiles = state
            .seats()
            .iter()
            .filter_map(|s| directory.get(s.player_id).ok())
            .collect();
        Snapshot {
            state: state.clone(),
            profiles,
        }
    }

    pub fn game_id(&self) -> Uuid {
        self.state.id()
    }

    pub fn revision(&self) -> u64 {
        self.state.revision()
    }
}

pub fn key(game_id: Uuid) -> String {
    format!("game:{game_id}:snap")
}

/// Revision of the snapshot currently stored under [`key`].
pub fn revision_key(game_id: Uuid) -> String {
    format!("game:{game_id}:rev")
}

/// Writes KEYS[1] (and its revision in KEYS[2]) only when ARGV[2] is newer
/// than the stored revision. Returns 1 when written, 0 when stale.
const SAVE_IF_NEWER: &str = r"
local stored = tonumber(redis.call('GET', KEYS[2]) or '0')
if tonumber(ARGV[2]) <= stored then
  return 0
end
redis.call('SET', KEYS[1], ARGV[1], 'EX', ARGV[3])
redis.call('SET', KEYS[2], ARGV[2], 'EX', ARGV[3])
return 1
";

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    client: RedisClient,
    ttl: u64,
}

impl SnapshotStore {
    pub fn new(client: RedisClient, ttl: u64) -> Self {
        SnapshotStore { client, ttl }
    }

    /// Writes the snapshot unless a newer revision is already stored,
    /// retrying transient Redis failures.
    pub async fn save(&self, snap: &Snapshot) -> anyhow::Result<()> {
        let json = serde_json::to_string(snap).context("encoding snapshot")?;
        let game_id = snap.game_id();
        let revision = snap.revision();
        let ttl = self.ttl;
        let script = Script::new(SAVE_IF_NEWER);
        let strategy = ExponentialBackoff::from_millis(10).map(jitter).take(3);

        let written: i64 = Retry::start(strategy, || {
            let client = self.client.clone();
            let script = script.clone();
            let json = json.clone();
            async move {
                let mut conn = client.get_multiplexed_async_connection().await?;
                script
                    .key(key(game_id))
                    .key(revision_key(game_id))
                    .arg(json)
                    .arg(revision)
                    .arg(ttl)
                    .invoke_async(&mut conn)
                    .await
            }
        })
        .await
        .with_context(|| format!("writing snapshot for game {game_id}"))?;

        if written == 0 {
            log::debug!("game {game_id}: snapshot r{revision} is stale, not written");
        }
        Ok(())
    }

    /// Loads every stored snapshot; undecodable entries are skipped.
    pub async fn load_all(&self) -> anyhow::Result<Vec<Snapshot>> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .context("connecting to redis")?;
        let keys: Vec<String> = conn.keys("game:*:snap").await.context("listing snapshots")?;

        let mut out = Vec::with_capacity(keys.len());
        for k in keys {
            let json: Option<String> = conn.get(&k).await.context("reading snapshot")?;
            match json.map(|j| serde_json::from_str::<Snapshot>(&j)) {
                Some(Ok(snap)) => out.push(snap),
                Some(Err(e)) => log::warn!("skipping corrupt snapshot {k}: {e}"),
                None => {}
            }
        }
        Ok(out)
    }

    pub async fn ping(&self) -> bool {
        match self.client.get_multiplexed_async_connection().await {
            Ok(mut conn) => conn.ping::<String>().await.is_ok(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::types::Caller;

    #[test]
    fn snapshot_json_roundtrip_keeps_state() {
        let dir = PlayerDirectory::new();
        let gm = dir.ensure(&Caller::gm("gm")).unwrap();
        let mut gs = GameState::new(Uuid::new_v4(), "ABCDE".into(), gm.id);
        gs.add_seat(gm.id, 3, 0, None);
        gs.ensure_player_map(gm.id).unwrap();

        gs.bump_revision();
        let snap = Snapshot::capture(&gs, &dir);
        assert_eq!(snap.revision(), 1);
        let back: Snapshot = serde_json::from_str(&serde_json::to_string(&snap).unwrap()).unwrap();
        assert_eq!(back.game_id(), gs.id());
        assert_eq!(back.revision(), 1);
        assert_eq!(back.profiles, vec![gm]);
        assert_eq!(back.state.tiles(back.profiles[0].id).len(), 64);
        assert_eq!(key(gs.id()), format!("game:{}:snap", gs.id()));
        assert_eq!(revision_key(gs.id()), format!("game:{}:rev", gs.id()));
    }
}
