//! Room registry: matchmaking, the player→room index, and idle reaping.
//!
//! The room map and the index are locked independently, and neither lock is
//! ever held while a room lock is taken: the registry copies out the
//! `Arc<Room>` handles it needs, releases its own lock, and only then talks
//! to the rooms.
//!
//! The matchmaking mutex orders seat assignment against reaping. While it
//! is held the registry only touches open rooms, and only through their
//! state lock, which no room holds while waiting on a player. A stalled
//! client therefore never delays matchmaking elsewhere.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Weak};

use cardgrid_engine::CardCatalog;
use cardgrid_protocol::{PlayerId, RoomId};
use cardgrid_session::{IdSource, PlayerSession};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::{Clock, JoinOutcome, Room, RoomConfig, RoomError};

/// Creates and finds rooms and routes players to them.
pub struct RoomRegistry {
    config: RoomConfig,
    catalog: Arc<CardCatalog>,
    ids: Arc<dyn IdSource>,
    clock: Arc<dyn Clock>,
    /// Ordered by id, so iteration visits the oldest room first.
    rooms: Mutex<BTreeMap<RoomId, Arc<Room>>>,
    /// A player is in at most one room.
    index: Mutex<HashMap<PlayerId, RoomId>>,
    /// Serializes seat assignment so two arrivals never open two half-empty
    /// rooms, and so a room picked by the reaper is never joined.
    matchmaking: Mutex<()>,
}

impl RoomRegistry {
    pub fn new(
        config: RoomConfig,
        catalog: Arc<CardCatalog>,
        ids: Arc<dyn IdSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            catalog,
            ids,
            clock,
            rooms: Mutex::new(BTreeMap::new()),
            index: Mutex::new(HashMap::new()),
            matchmaking: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<CardCatalog> {
        &self.catalog
    }

    /// Seats the player in the oldest joinable room, or in a new one.
    ///
    /// When the room fills up, its start is scheduled after
    /// [`RoomConfig::start_delay`].
    pub async fn join_or_create(
        &self,
        session: Arc<PlayerSession>,
    ) -> Result<RoomId, RoomError> {
        let _matchmaking = self.matchmaking.lock().await;
        let player_id = session.id();

        if let Some(current) = self.index.lock().await.get(&player_id) {
            return Err(RoomError::AlreadyInRoom(player_id, *current));
        }

        let candidates: Vec<Arc<Room>> =
            self.rooms.lock().await.values().cloned().collect();
        for room in candidates.into_iter().filter(|room| room.is_open()) {
            match self.seat(&room, Arc::clone(&session)).await {
                Ok(()) => return Ok(room.id()),
                Err(e) => {
                    tracing::debug!(
                        room_id = %room.id(),
                        %player_id,
                        error = %e,
                        "room refused join, trying next"
                    );
                }
            }
        }

        let room_id = self.ids.next_room_id();
        let room = Arc::new(Room::new(
            room_id,
            self.config.clone(),
            Arc::clone(&self.catalog),
            Arc::clone(&self.clock),
        ));
        self.rooms.lock().await.insert(room_id, Arc::clone(&room));
        tracing::info!(%room_id, "room created");

        if let Err(e) = self.seat(&room, session).await {
            self.rooms.lock().await.remove(&room_id);
            return Err(e);
        }
        Ok(room_id)
    }

    /// Indexes the player, then joins. The index entry is rolled back if
    /// the room refuses.
    async fn seat(&self, room: &Arc<Room>, session: Arc<PlayerSession>) -> Result<(), RoomError> {
        let player_id = session.id();
        self.index.lock().await.insert(player_id, room.id());

        match room.join(session).await {
            Ok(JoinOutcome::Waiting) => Ok(()),
            Ok(JoinOutcome::Ready) => {
                self.schedule_start(room);
                Ok(())
            }
            Err(e) => {
                self.index.lock().await.remove(&player_id);
                Err(e)
            }
        }
    }

    fn schedule_start(&self, room: &Arc<Room>) {
        let room = Arc::clone(room);
        let delay = self.config.start_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = room.start_game().await {
                tracing::debug!(room_id = %room.id(), error = %e, "start skipped");
            }
        });
    }

    /// Routes a `play_card` action to the player's room.
    ///
    /// # Errors
    /// [`RoomError::Action`] when the room refused the play; the room has
    /// already told a seated player why. Any other error means the action
    /// never reached a room.
    pub async fn play_card(
        &self,
        player: PlayerId,
        card_name: &str,
        target_slot: i64,
    ) -> Result<(), RoomError> {
        let room = self.room_of(player).await?;
        room.handle_play_card(player, card_name, target_slot)
            .await
            .map_err(RoomError::Action)
    }

    /// Removes a disconnected player from the index and their room. A room
    /// left empty is dropped from the registry.
    ///
    /// Runs outside the matchmaking lock: an emptied room finishes itself,
    /// so a concurrent `join_or_create` moves on to another room.
    pub async fn disconnect(&self, player: PlayerId) -> Result<(), RoomError> {
        let room_id = self
            .index
            .lock()
            .await
            .remove(&player)
            .ok_or(RoomError::NotInAnyRoom(player))?;
        let room = self.rooms.lock().await.get(&room_id).cloned();
        let Some(room) = room else {
            // Already reaped.
            return Ok(());
        };

        let remaining = room.remove_player(player).await?;
        if remaining == 0 {
            {
                let mut rooms = self.rooms.lock().await;
                if rooms.get(&room_id).is_some_and(|r| Arc::ptr_eq(r, &room)) {
                    rooms.remove(&room_id);
                }
            }
            room.shutdown().await;
            tracing::info!(%room_id, "empty room removed");
        }
        Ok(())
    }

    /// Removes every room idle for at least [`RoomConfig::idle_timeout`],
    /// purges their players from the index, and closes their sessions.
    /// Returns the reaped room ids.
    ///
    /// Each room is re-checked and finished under its own lock, so a room
    /// touched after the sweep started survives.
    pub async fn reap_idle(&self) -> Vec<RoomId> {
        let idle = {
            let _matchmaking = self.matchmaking.lock().await;
            let now = self.clock.now();
            let rooms: Vec<Arc<Room>> = self.rooms.lock().await.values().cloned().collect();

            let mut idle = Vec::new();
            for room in rooms {
                if room.retire_if_idle(now, self.config.idle_timeout).await {
                    idle.push(room);
                }
            }
            if idle.is_empty() {
                return Vec::new();
            }

            let reaped: HashSet<RoomId> = idle.iter().map(|r| r.id()).collect();
            {
                let mut map = self.rooms.lock().await;
                for room_id in &reaped {
                    map.remove(room_id);
                }
            }
            self.index
                .lock()
                .await
                .retain(|_, room_id| !reaped.contains(room_id));
            idle
        };

        for room in &idle {
            room.shutdown().await;
            tracing::info!(room_id = %room.id(), "idle room reaped");
        }
        idle.iter().map(|r| r.id()).collect()
    }

    /// Spawns the background sweep, running every
    /// [`RoomConfig::reap_interval`]. The task ends once the registry is
    /// dropped.
    pub fn spawn_reaper(self: &Arc<Self>) -> JoinHandle<()> {
        let registry = Arc::downgrade(self);
        let period = self.config.reap_interval;
        tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let Some(registry) = Weak::upgrade(&registry) else {
                    break;
                };
                let reaped = registry.reap_idle().await;
                if !reaped.is_empty() {
                    tracing::debug!(count = reaped.len(), "reaper sweep finished");
                }
            }
        })
    }

    /// The room a player is indexed to.
    pub async fn player_room(&self, player: PlayerId) -> Option<RoomId> {
        self.index.lock().await.get(&player).copied()
    }

    pub async fn room(&self, room_id: RoomId) -> Option<Arc<Room>> {
        self.rooms.lock().await.get(&room_id).cloned()
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.len()
    }

    async fn room_of(&self, player: PlayerId) -> Result<Arc<Room>, RoomError> {
        let room_id = self
            .index
            .lock()
            .await
            .get(&player)
            .copied()
            .ok_or(RoomError::NotInAnyRoom(player))?;
        self.room(room_id).await.ok_or(RoomError::NotFound(room_id))
    }
}
