//! Game Registry and the operation surface consumed by the transport.
//!
//! Every game-scoped mutation runs under that game's mutex, so a batch
//! apply, a start, or a move request observe one consistent state. Player
//! profiles live in the [`PlayerDirectory`] and are written per entry.
//! Lock order is always game → directory entry; no directory guard is held
//! across an await.

use chrono::Utc;
use dashmap::{mapref::entry::Entry, DashMap, DashSet};
use rand::Rng;
use std::{collections::HashSet, sync::Arc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    config::Settings,
    error::{CoreError, Result},
    game::{
        board::{random_free_cells, Cell, CELL_COUNT},
        dashboard,
        directory::PlayerDirectory,
        snapshot::{Snapshot, SnapshotStore},
        state::GameState,
        types::{
            Caller, CreatedGame, Dashboard, FogTile, Game, GamePhase, InventoryEntry, JoinedGame,
            MoveRequest, PendingMove, Player, Profile, Resolution, StartSummary, TileState,
            VitalsUpdate,
        },
    },
};

/// Characters a join code is drawn from.
pub const JOIN_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

const JOIN_CODE_ATTEMPTS: usize = 64;

/// Upper-cases and validates a user-typed join code.
pub fn normalize_join_code(raw: &str) -> Result<String> {
    let code = raw.trim().to_ascii_uppercase();
    if code.is_empty() {
        return Err(CoreError::Validation("join code is empty".into()));
    }
    if !code.bytes().all(|b| JOIN_CODE_ALPHABET.contains(&b)) {
        return Err(CoreError::Validation(
            "join code may only contain letters and digits".into(),
        ));
    }
    Ok(code)
}

fn random_join_code<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| JOIN_CODE_ALPHABET[rng.random_range(0..JOIN_CODE_ALPHABET.len())] as char)
        .collect()
}

type SharedState = Arc<Mutex<GameState>>;

pub struct Engine {
    settings: Settings,
    directory: PlayerDirectory,
    games: DashMap<Uuid, SharedState>,
    codes: DashMap<String, Uuid>,
    /// request id → game id
    requests: DashMap<Uuid, Uuid>,
    /// Games that reached `ended`; read while a directory entry is held.
    ended: DashSet<Uuid>,
    snapshots: Option<SnapshotStore>,
}

impl Engine {
    pub fn new(settings: Settings) -> Self {
        Engine {
            settings,
            directory: PlayerDirectory::new(),
            games: DashMap::new(),
            codes: DashMap::new(),
            requests: DashMap::new(),
            ended: DashSet::new(),
            snapshots: None,
        }
    }

    pub fn with_snapshots(mut self, store: SnapshotStore) -> Self {
        self.snapshots = Some(store);
        self
    }

    pub fn snapshot_store(&self) -> Option<&SnapshotStore> {
        self.snapshots.as_ref()
    }

    fn shared(&self, game_id: Uuid) -> Result<SharedState> {
        self.games
            .get(&game_id)
            .map(|e| e.value().clone())
            .ok_or(CoreError::GameNotFound)
    }

    /// Stamps a new revision and writes the snapshot. Callers hold the game
    /// lock across this call, so writes land in mutation order.
    async fn persist(&self, state: &mut GameState) {
        state.bump_revision();
        let Some(store) = &self.snapshots else {
            return;
        };
        let snap = Snapshot::capture(state, &self.directory);
        if let Err(e) = store.save(&snap).await {
            log::warn!("snapshot write failed: {e:?}");
        }
    }

    fn player_in(&self, state: &GameState, player_id: Uuid) -> Result<Player> {
        let profile = self.directory.get(player_id)?;
        Ok(Player::from_parts(&profile, state.seats.get(&player_id)))
    }

    /// Caller must be `player_id` or the GM of the game.
    fn require_self_or_gm(state: &GameState, me: &Profile, player_id: Uuid) -> Result<()> {
        if me.id == player_id || state.is_gm(me.id) {
            Ok(())
        } else {
            Err(CoreError::NotAuthorized(
                "only the player or the GM may see this map".into(),
            ))
        }
    }

    /// Removes a player's seat from the game they left, unless they have
    /// since been bound back to it. Ended games and the GM's own seat are
    /// left as they are.
    async fn leave(&self, player_id: Uuid, old_game: Uuid) {
        let Ok(shared) = self.shared(old_game) else {
            return;
        };
        let mut state = shared.lock().await;
        let still_there = self
            .directory
            .get(player_id)
            .map(|p| p.game_id == Some(old_game))
            .unwrap_or(false);
        if still_there || state.phase() == GamePhase::Ended || state.is_gm(player_id) {
            return;
        }
        if !state.remove_seat(player_id) {
            return;
        }
        log::info!("player {player_id} left game {old_game}");
        self.persist(&mut state).await;
    }

    /// Single-membership policy: may a player bound to `current` move on?
    /// Runs inside [`PlayerDirectory::bind`] under the player's entry.
    fn may_leave(&self, current: Uuid) -> Result<()> {
        if !self.settings.exclusive_membership
            || self.ended.contains(&current)
            || !self.games.contains_key(&current)
        {
            Ok(())
        } else {
            Err(CoreError::AlreadyInAnotherGame(current))
        }
    }

    // ───────────── Player Directory ─────────────

    /// Creates the caller's player row on first call; later calls return it.
    pub async fn ensure_player(&self, caller: &Caller) -> Result<Player> {
        let me = self.directory.ensure(caller)?;
        self.player_view(me).await
    }

    pub async fn set_name(&self, caller: &Caller, name: &str) -> Result<Player> {
        let me = self.directory.ensure(caller)?;
        let me = self.directory.set_name(me.id, name)?;
        self.player_view(me).await
    }

    async fn player_view(&self, profile: Profile) -> Result<Player> {
        match profile.game_id.and_then(|g| self.shared(g).ok()) {
            Some(shared) => {
                let state = shared.lock().await;
                Ok(Player::from_parts(&profile, state.seats.get(&profile.id)))
            }
            None => Ok(Player::from_parts(&profile, None)),
        }
    }

    // ───────────── Game Registry ─────────────

    pub async fn create_game(&self, caller: &Caller) -> Result<CreatedGame> {
        if !caller.gm_eligible {
            return Err(CoreError::NotAuthorized("caller may not create games".into()));
        }
        let me = self.directory.ensure(caller)?;

        let game_id = Uuid::new_v4();
        let join_code = {
            let mut rng = rand::rng();
            let mut claimed = None;
            for _ in 0..JOIN_CODE_ATTEMPTS {
                let candidate = random_join_code(&mut rng, self.settings.join_code_len);
                if let Entry::Vacant(v) = self.codes.entry(candidate.clone()) {
                    v.insert(game_id);
                    claimed = Some(candidate);
                    break;
                }
            }
            claimed.ok_or_else(|| CoreError::Internal("could not allocate a join code".into()))?
        };

        let mut state = GameState::new(game_id, join_code.clone(), me.id);
        state.add_seat(
            me.id,
            self.settings.start_lives,
            self.settings.start_bullets,
            Some(self.settings.gm_start),
        );
        let shared = Arc::new(Mutex::new(state));
        let mut guard = shared.lock().await;
        self.games.insert(game_id, shared.clone());

        let previous = match self
            .directory
            .bind(me.id, game_id, true, |old| self.may_leave(old))
        {
            Ok(previous) => previous,
            Err(e) => {
                // anyone already waiting on this lock must see a closed game
                guard.game.phase = GamePhase::Ended;
                self.games.remove(&game_id);
                self.codes.remove(&join_code);
                return Err(e);
            }
        };
        self.persist(&mut guard).await;
        drop(guard);

        if let Some(old) = previous {
            self.leave(me.id, old).await;
        }
        log::info!("game {game_id} created by {} (code {join_code})", me.id);
        Ok(CreatedGame { game_id, join_code })
    }

    pub async fn join_game(&self, caller: &Caller, join_code: &str) -> Result<JoinedGame> {
        let code = normalize_join_code(join_code)?;
        let game_id = self
            .codes
            .get(&code)
            .map(|e| *e.value())
            .ok_or(CoreError::GameNotFound)?;
        let me = self.directory.ensure(caller)?;
        if me.game_id == Some(game_id) {
            return Ok(JoinedGame { game_id });
        }

        let shared = self.shared(game_id)?;
        let mut state = shared.lock().await;
        state.require_open()?;
        let previous = self
            .directory
            .bind(me.id, game_id, false, |old| self.may_leave(old))?;
        state.add_seat(
            me.id,
            self.settings.start_lives,
            self.settings.start_bullets,
            None,
        );
        self.persist(&mut state).await;
        drop(state);

        if let Some(old) = previous {
            self.leave(me.id, old).await;
        }
        log::info!("player {} joined game {game_id}", me.id);
        Ok(JoinedGame { game_id })
    }

    /// `setup → active`: scatters non-GM players on distinct free cells and
    /// seeds `item_count` objects. The phase check makes a repeated call fail
    /// with `AlreadyActive` instead of seeding twice.
    pub async fn start_game(
        &self,
        caller: &Caller,
        game_id: Uuid,
        item_count: Option<u32>,
    ) -> Result<StartSummary> {
        let me = self.directory.ensure(caller)?;
        let shared = self.shared(game_id)?;
        let mut state = shared.lock().await;
        state.require_gm(me.id)?;
        match state.phase() {
            GamePhase::Setup => {}
            GamePhase::Active => return Err(CoreError::AlreadyActive(game_id)),
            GamePhase::Ended => {
                return Err(CoreError::InvalidTransition(format!(
                    "game {game_id} has ended"
                )))
            }
        }

        let item_count = item_count.unwrap_or(self.settings.default_item_count) as usize;
        if item_count > CELL_COUNT {
            return Err(CoreError::BoardFull {
                requested: item_count,
            });
        }
        let players: Vec<Uuid> = state
            .seats()
            .iter()
            .filter(|s| !state.is_gm(s.player_id))
            .map(|s| s.player_id)
            .collect();
        let taken: HashSet<Cell> = state
            .seat(me.id)
            .ok()
            .and_then(|s| s.position)
            .into_iter()
            .collect();

        let objects_count = {
            let mut rng = rand::rng();
            let cells = random_free_cells(&mut rng, &taken, players.len())?;
            for (pid, cell) in players.iter().zip(cells) {
                state.seat_mut(*pid)?.position = Some(cell);
            }
            state.seed_objects(&mut rng, item_count)?
        };
        state.game.phase = GamePhase::Active;

        self.persist(&mut state).await;

        log::info!(
            "game {game_id} started: {} players, {objects_count} objects",
            players.len()
        );
        Ok(StartSummary {
            players_count: players.len(),
            objects_count,
        })
    }

    pub async fn end_game(&self, caller: &Caller, game_id: Uuid) -> Result<Game> {
        let me = self.directory.ensure(caller)?;
        let shared = self.shared(game_id)?;
        let mut state = shared.lock().await;
        state.require_gm(me.id)?;
        state.require_open()?;
        state.game.phase = GamePhase::Ended;
        self.ended.insert(game_id);
        let game = state.game.clone();
        self.persist(&mut state).await;
        log::info!("game {game_id} ended");
        Ok(game)
    }

    pub async fn game(&self, game_id: Uuid) -> Result<Game> {
        Ok(self.shared(game_id)?.lock().await.game.clone())
    }

    // ───────────── Fog Map Engine ─────────────

    pub async fn ensure_player_map(
        &self,
        caller: &Caller,
        game_id: Uuid,
        player_id: Uuid,
    ) -> Result<()> {
        let me = self.directory.ensure(caller)?;
        let shared = self.shared(game_id)?;
        let mut state = shared.lock().await;
        Self::require_self_or_gm(&state, &me, player_id)?;
        if state.ensure_player_map(player_id)? {
            self.persist(&mut state).await;
        }
        Ok(())
    }

    /// Writes a tile of the caller's own map; only a GM may do this.
    pub async fn set_tile(
        &self,
        caller: &Caller,
        game_id: Uuid,
        player_id: Uuid,
        row: i32,
        col: i32,
        tile: TileState,
    ) -> Result<FogTile> {
        let me = self.directory.ensure(caller)?;
        let shared = self.shared(game_id)?;
        let mut state = shared.lock().await;
        if me.id != player_id {
            return Err(CoreError::NotAuthorized(
                "a map can only be edited by its owner".into(),
            ));
        }
        let cell = Cell::checked(row, col)?;
        let out = state.set_tile(player_id, cell, tile)?;
        self.persist(&mut state).await;
        Ok(out)
    }

    /// Tiles ordered by `(row, col)`. Materialises the map on first access.
    pub async fn get_tiles(
        &self,
        caller: &Caller,
        game_id: Uuid,
        player_id: Uuid,
    ) -> Result<Vec<FogTile>> {
        let me = self.directory.ensure(caller)?;
        let shared = self.shared(game_id)?;
        let mut state = shared.lock().await;
        Self::require_self_or_gm(&state, &me, player_id)?;
        let created = state.ensure_player_map(player_id)?;
        let tiles = state.tiles(player_id);
        if created {
            self.persist(&mut state).await;
        }
        Ok(tiles)
    }

    // ───────────── Loot Engine ─────────────

    pub async fn list_inventory(
        &self,
        caller: &Caller,
        game_id: Uuid,
        player_id: Uuid,
    ) -> Result<Vec<InventoryEntry>> {
        let me = self.directory.ensure(caller)?;
        let shared = self.shared(game_id)?;
        let state = shared.lock().await;
        if me.id != player_id && !state.is_gm(me.id) {
            return Err(CoreError::NotAuthorized(
                "inventories are private to their owner and the GM".into(),
            ));
        }
        state.seat(player_id)?;
        Ok(state.inventory(player_id))
    }

    // ───────────── Move-Request Workflow ─────────────

    pub async fn request_move(
        &self,
        caller: &Caller,
        game_id: Uuid,
        to_row: i32,
        to_col: i32,
    ) -> Result<MoveRequest> {
        let to = Cell::checked(to_row, to_col)?;
        let me = self.directory.ensure(caller)?;
        let shared = self.shared(game_id)?;
        let mut state = shared.lock().await;
        if me.game_id != Some(game_id) {
            return Err(CoreError::NotInGame(game_id));
        }
        let request =
            state.request_move(me.id, to, self.settings.max_move_distance, Utc::now())?;
        self.requests.insert(request.id, game_id);
        self.persist(&mut state).await;
        Ok(request)
    }

    /// The caller's latest request in this game, if any.
    pub async fn my_move(&self, caller: &Caller, game_id: Uuid) -> Result<Option<MoveRequest>> {
        let me = self.directory.ensure(caller)?;
        let shared = self.shared(game_id)?;
        let state = shared.lock().await;
        Ok(state.latest_request(me.id).cloned())
    }

    pub async fn list_pending(&self, caller: &Caller, game_id: Uuid) -> Result<Vec<PendingMove>> {
        let me = self.directory.ensure(caller)?;
        let shared = self.shared(game_id)?;
        let state = shared.lock().await;
        state.require_gm(me.id)?;

        state
            .pending()
            .into_iter()
            .map(|m| {
                let profile = self.directory.get(m.player_id)?;
                Ok(PendingMove {
                    request_id: m.id,
                    player_id: m.player_id,
                    player_name: profile.name,
                    from_row: m.from_row,
                    from_col: m.from_col,
                    to_row: m.to_row,
                    to_col: m.to_col,
                    created_at: m.created_at,
                })
            })
            .collect()
    }

    pub async fn resolve(
        &self,
        caller: &Caller,
        request_id: Uuid,
        resolution: Resolution,
    ) -> Result<MoveRequest> {
        let me = self.directory.ensure(caller)?;
        let game_id = self
            .requests
            .get(&request_id)
            .map(|e| *e.value())
            .ok_or(CoreError::RequestNotFound(request_id))?;
        let shared = self.shared(game_id)?;
        let mut state = shared.lock().await;
        state.require_gm(me.id)?;
        let out = state.resolve(request_id, resolution)?;
        self.persist(&mut state).await;
        Ok(out)
    }

    /// Applies all approved requests; returns how many were applied.
    pub async fn apply_approved(&self, caller: &Caller, game_id: Uuid) -> Result<usize> {
        let me = self.directory.ensure(caller)?;
        let shared = self.shared(game_id)?;
        let mut state = shared.lock().await;
        state.require_gm(me.id)?;
        let outcome = state.apply_approved(Utc::now())?;
        self.persist(&mut state).await;

        log::info!(
            "game {game_id}: applied {} moves ({} failed, {} claims)",
            outcome.count(),
            outcome.failed.len(),
            outcome.claims.len()
        );
        Ok(outcome.count())
    }

    /// GM placement: writes a player's position directly, bypassing the
    /// request queue, then runs the loot claim for the new cell.
    pub async fn force_move(
        &self,
        caller: &Caller,
        game_id: Uuid,
        player_id: Uuid,
        row: i32,
        col: i32,
    ) -> Result<Player> {
        let to = Cell::checked(row, col)?;
        let me = self.directory.ensure(caller)?;
        let shared = self.shared(game_id)?;
        let mut state = shared.lock().await;
        state.require_gm(me.id)?;
        state.require_open()?;
        state.seat_mut(player_id)?.position = Some(to);
        state.claim_if_present(player_id, to, Utc::now());
        let out = self.player_in(&state, player_id)?;
        self.persist(&mut state).await;
        Ok(out)
    }

    /// GM edit of lives / bullets / alive. Zero lives means dead.
    pub async fn set_vitals(
        &self,
        caller: &Caller,
        game_id: Uuid,
        player_id: Uuid,
        update: VitalsUpdate,
    ) -> Result<Player> {
        let me = self.directory.ensure(caller)?;
        let shared = self.shared(game_id)?;
        let mut state = shared.lock().await;
        state.require_gm(me.id)?;
        let seat = state.seat_mut(player_id)?;
        if let Some(lives) = update.lives {
            seat.lives = lives;
        }
        if let Some(bullets) = update.bullets {
            seat.bullets = bullets;
        }
        if let Some(alive) = update.alive {
            seat.alive = alive;
        }
        if seat.lives == 0 {
            seat.alive = false;
        }
        let out = self.player_in(&state, player_id)?;
        self.persist(&mut state).await;
        Ok(out)
    }

    // ───────────── Dashboard ─────────────

    pub async fn build_dashboard(&self, caller: &Caller, game_id: Uuid) -> Result<Dashboard> {
        let me = self.directory.ensure(caller)?;
        let shared = self.shared(game_id)?;
        let state = shared.lock().await;
        state.require_gm(me.id)?;
        dashboard::build(&state, &self.directory)
    }

    // ───────────── Snapshots ─────────────

    /// Re-installs a game loaded from the snapshot store.
    pub fn restore(&self, snap: Snapshot) {
        let game_id = snap.game_id();
        for profile in snap.profiles {
            self.directory.restore(profile);
        }
        for request_id in snap.state.request_ids() {
            self.requests.insert(request_id, game_id);
        }
        self.codes.insert(snap.state.game.join_code.clone(), game_id);
        if snap.state.phase() == GamePhase::Ended {
            self.ended.insert(game_id);
        }
        self.games.insert(game_id, Arc::new(Mutex::new(snap.state)));
    }

    pub fn game_count(&self) -> usize {
        self.games.len()
    }
}
