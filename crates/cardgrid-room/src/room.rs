//! A single match: two seats, one board, and the locks that serialize them.
//!
//! Room state lives behind `inner`, which is only ever held for bookkeeping
//! and never across a wait on a player's queue. Operations that message
//! players collect an `Outbox` under `inner`, release it, and then deliver
//! while holding `delivery`. `delivery` is always taken before `inner`, so
//! messages leave in the same order the actions were applied, and a client
//! that stopped reading stalls only the deliveries of its own room.
//!
//! Rooms never take registry locks.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use cardgrid_engine::{Board, CardCatalog, SlotId, check_win, resolve_shape};
use cardgrid_protocol::{
    Card, CardType, DamageType, GameMessage, ImpactType, PlayerId, RoomId,
};
use cardgrid_session::PlayerSession;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::{ActionError, Clock, RoomConfig, RoomError, RoomState};

/// `game_over` reason when a player completes a line.
pub const REASON_LINE: &str = "three_in_a_line";

/// `game_over` reason when the opponent disconnects mid-game.
pub const REASON_OPPONENT_LEFT: &str = "opponent_left";

/// Result of a successful [`Room::join`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Seated; the room still has free seats.
    Waiting,
    /// Seated and the room is now full. The caller schedules
    /// [`Room::start_game`] after the start delay.
    Ready,
}

/// A player's in-room state.
#[derive(Debug, Clone)]
pub struct Seat {
    session: Arc<PlayerSession>,
    hand: Vec<Card>,
    turn: bool,
}

impl Seat {
    fn new(session: Arc<PlayerSession>) -> Self {
        Self {
            session,
            hand: Vec::new(),
            turn: false,
        }
    }

    pub fn player_id(&self) -> PlayerId {
        self.session.id()
    }

    pub fn session(&self) -> &Arc<PlayerSession> {
        &self.session
    }

    pub fn hand(&self) -> &[Card] {
        &self.hand
    }

    pub fn has_turn(&self) -> bool {
        self.turn
    }
}

/// A snapshot of room metadata.
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub state: RoomState,
    pub player_count: usize,
    pub capacity: usize,
}

/// One isolated match.
pub struct Room {
    id: RoomId,
    config: RoomConfig,
    catalog: Arc<CardCatalog>,
    clock: Arc<dyn Clock>,
    /// Mirrors `RoomState::is_joinable` so matchmaking can skip rooms
    /// without locking them.
    open: AtomicBool,
    delivery: Mutex<()>,
    inner: Mutex<RoomInner>,
}

struct RoomInner {
    state: RoomState,
    /// Join order is turn order.
    seats: Vec<Seat>,
    board: Board,
    last_activity: Instant,
}

impl RoomInner {
    fn seat_index(&self, player: PlayerId) -> Option<usize> {
        self.seats.iter().position(|s| s.player_id() == player)
    }

    fn player_ids(&self) -> Vec<PlayerId> {
        self.seats.iter().map(Seat::player_id).collect()
    }

    fn active_player(&self) -> Option<PlayerId> {
        self.seats.iter().find(|s| s.turn).map(Seat::player_id)
    }

    fn transition(&mut self, room_id: RoomId, target: RoomState) {
        if !self.state.can_transition_to(target) {
            tracing::warn!(
                %room_id,
                from = %self.state,
                to = %target,
                "unexpected state transition"
            );
        }
        tracing::debug!(%room_id, from = %self.state, to = %target, "room state changed");
        self.state = target;
    }

    fn is_idle(&self, now: Instant, timeout: Duration) -> bool {
        now.saturating_duration_since(self.last_activity) >= timeout
    }

    fn game_state(&self) -> GameMessage {
        GameMessage::GameState {
            board_state: self.board.display_state(),
            active_player: self.active_player(),
        }
    }
}

/// Messages produced under the room lock, delivered after it is released.
#[derive(Default)]
struct Outbox(Vec<(Arc<PlayerSession>, GameMessage)>);

impl Outbox {
    fn send(&mut self, seat: &Seat, message: GameMessage) {
        self.0.push((Arc::clone(&seat.session), message));
    }

    fn broadcast(&mut self, seats: &[Seat], message: GameMessage) {
        for seat in seats {
            self.send(seat, message.clone());
        }
    }

    async fn deliver(self, room_id: RoomId) {
        for (session, message) in self.0 {
            if let Err(e) = session.enqueue(message).await {
                tracing::debug!(
                    %room_id,
                    player_id = %session.id(),
                    error = %e,
                    "dropping message"
                );
            }
        }
    }
}

impl std::fmt::Debug for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Room").field("id", &self.id).finish_non_exhaustive()
    }
}

impl Room {
    /// Creates an empty room waiting for players.
    pub fn new(
        id: RoomId,
        config: RoomConfig,
        catalog: Arc<CardCatalog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let last_activity = clock.now();
        Self {
            id,
            config,
            catalog,
            clock,
            open: AtomicBool::new(true),
            delivery: Mutex::new(()),
            inner: Mutex::new(RoomInner {
                state: RoomState::WaitingForPlayers,
                seats: Vec::new(),
                board: Board::new(),
                last_activity,
            }),
        }
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    /// `true` while the room accepts players. Lock-free; a stale `true` is
    /// caught by [`join`](Self::join).
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    pub async fn state(&self) -> RoomState {
        self.inner.lock().await.state
    }

    pub async fn info(&self) -> RoomInfo {
        let inner = self.inner.lock().await;
        RoomInfo {
            room_id: self.id,
            state: inner.state,
            player_count: inner.seats.len(),
            capacity: self.config.capacity,
        }
    }

    /// Seated players in join order.
    pub async fn player_ids(&self) -> Vec<PlayerId> {
        self.inner.lock().await.player_ids()
    }

    /// A copy of every seat, in join order.
    pub async fn seats(&self) -> Vec<Seat> {
        self.inner.lock().await.seats.clone()
    }

    /// A copy of the board.
    pub async fn board(&self) -> Board {
        self.inner.lock().await.board.clone()
    }

    pub async fn last_activity(&self) -> Instant {
        self.inner.lock().await.last_activity
    }

    /// `true` if nothing touched the room for at least `timeout` before
    /// `now`.
    pub async fn is_idle(&self, now: Instant, timeout: Duration) -> bool {
        self.inner.lock().await.is_idle(now, timeout)
    }

    /// Finishes the room if it is still idle, checked under the room lock so
    /// no action can slip in between the check and the close. Returns
    /// whether the room was retired; the caller then shuts it down.
    pub async fn retire_if_idle(&self, now: Instant, timeout: Duration) -> bool {
        let mut inner = self.inner.lock().await;
        if !inner.is_idle(now, timeout) {
            return false;
        }
        self.finish(&mut inner);
        true
    }

    /// Seats `session`. Filling the last seat moves the room to
    /// [`RoomState::Starting`].
    pub async fn join(&self, session: Arc<PlayerSession>) -> Result<JoinOutcome, RoomError> {
        let mut inner = self.inner.lock().await;
        let player_id = session.id();

        if !inner.state.is_joinable() {
            return Err(RoomError::InvalidState(self.id, inner.state));
        }
        if inner.seat_index(player_id).is_some() {
            return Err(RoomError::AlreadyInRoom(player_id, self.id));
        }
        if inner.seats.len() >= self.config.capacity {
            return Err(RoomError::RoomFull(self.id));
        }

        inner.seats.push(Seat::new(session));
        inner.last_activity = self.clock.now();
        tracing::info!(
            room_id = %self.id,
            %player_id,
            players = inner.seats.len(),
            "player joined"
        );

        if inner.seats.len() == self.config.capacity {
            self.transition(&mut inner, RoomState::Starting);
            Ok(JoinOutcome::Ready)
        } else {
            Ok(JoinOutcome::Waiting)
        }
    }

    /// Deals every hand, gives the first seat the turn, and sends each
    /// player `game_start`.
    ///
    /// # Errors
    /// [`RoomError::InvalidState`] unless the room is `Starting` with every
    /// seat filled, e.g. because a player left during the start delay.
    pub async fn start_game(&self) -> Result<(), RoomError> {
        let _delivery = self.delivery.lock().await;
        let mut outbox = Outbox::default();
        {
            let mut inner = self.inner.lock().await;
            if inner.state != RoomState::Starting || inner.seats.len() != self.config.capacity {
                return Err(RoomError::InvalidState(self.id, inner.state));
            }

            for (index, seat) in inner.seats.iter_mut().enumerate() {
                seat.hand = self.catalog.draw_hand(self.config.hand_size).await;
                seat.turn = index == 0;
            }
            self.transition(&mut inner, RoomState::InProgress);
            inner.last_activity = self.clock.now();

            for seat in &inner.seats {
                let message = GameMessage::GameStart {
                    cards_to_add: seat.hand.clone(),
                    your_turn: seat.turn,
                };
                outbox.send(seat, message);
            }
            tracing::info!(room_id = %self.id, players = ?inner.player_ids(), "game started");
        }
        outbox.deliver(self.id).await;
        Ok(())
    }

    /// Plays `card_name` from `player`'s hand onto `target_slot`.
    ///
    /// A rejected action sends `error` to the player (when seated) and
    /// leaves the room untouched apart from its activity stamp.
    pub async fn handle_play_card(
        &self,
        player: PlayerId,
        card_name: &str,
        target_slot: i64,
    ) -> Result<(), ActionError> {
        let _delivery = self.delivery.lock().await;
        let mut outbox = Outbox::default();
        let result = {
            let mut inner = self.inner.lock().await;
            self.play_card(&mut inner, &mut outbox, player, card_name, target_slot)
                .await
        };
        outbox.deliver(self.id).await;
        result
    }

    async fn play_card(
        &self,
        inner: &mut RoomInner,
        outbox: &mut Outbox,
        player: PlayerId,
        card_name: &str,
        target_slot: i64,
    ) -> Result<(), ActionError> {
        inner.last_activity = self.clock.now();

        let (seat_index, slot, card_index) =
            match validate_play(inner, player, card_name, target_slot) {
                Ok(checked) => checked,
                Err(e) => {
                    tracing::debug!(
                        room_id = %self.id,
                        %player,
                        %card_name,
                        target_slot,
                        reason = %e,
                        "play rejected"
                    );
                    if let Some(index) = inner.seat_index(player) {
                        outbox.send(&inner.seats[index], GameMessage::error(e.to_string()));
                    }
                    return Err(e);
                }
            };

        let card = inner.seats[seat_index].hand[card_index].clone();
        let mut effect = card.mark_effect.clone();
        effect.owner = Some(player);

        match (card.card_type, card.impact_type) {
            (CardType::Attack, ImpactType::Singular) => {
                inner.board.apply_effect(slot, effect);
            }
            (CardType::Attack, ImpactType::Multiple) => {
                let targets = resolve_shape(card.impact_shape, slot);
                inner.board.apply_damage(&targets, &effect);
                for target in targets {
                    inner.board.apply_effect(target, effect.clone());
                }
            }
            (CardType::Buff | CardType::Null, _) => {
                tracing::trace!(room_id = %self.id, card = %card.name, "card has no board effect");
            }
        }
        inner.board.remove_dead_marks();

        let played = inner.seats[seat_index].hand.remove(card_index);
        let replacement = self.catalog.draw().await;
        inner.seats[seat_index].hand.push(replacement.clone());

        let winner = check_win(&inner.board, &inner.player_ids());
        match &winner {
            Some(line) => {
                self.transition(inner, RoomState::Finished);
                for seat in &mut inner.seats {
                    seat.turn = false;
                }
                tracing::info!(
                    room_id = %self.id,
                    winner = %line.winner,
                    line = %line.kind,
                    "game won"
                );
            }
            None => {
                for seat in &mut inner.seats {
                    seat.turn = !seat.turn;
                }
            }
        }

        tracing::debug!(room_id = %self.id, %player, card = %played.name, %slot, "card played");

        let success = GameMessage::PlayCardSuccess {
            target_slot: slot.into_inner(),
            cards_to_remove: vec![played],
            cards_to_add: vec![replacement],
        };
        outbox.send(&inner.seats[seat_index], success);
        outbox.broadcast(&inner.seats, inner.game_state());

        if let Some(line) = winner {
            let over = GameMessage::GameOver {
                winner: Some(line.winner),
                reason: REASON_LINE.to_string(),
            };
            outbox.broadcast(&inner.seats, over);
        }
        Ok(())
    }

    /// Removes `player`'s seat and returns how many remain.
    ///
    /// Leaving an active room finishes it; the remaining player wins by
    /// default. A room left with no seats is finished too, so it can no
    /// longer be joined while the registry drops it.
    pub async fn remove_player(&self, player: PlayerId) -> Result<usize, RoomError> {
        let _delivery = self.delivery.lock().await;
        let mut outbox = Outbox::default();
        let remaining = {
            let mut inner = self.inner.lock().await;
            let index = inner
                .seat_index(player)
                .ok_or(RoomError::NotInRoom(player, self.id))?;
            inner.seats.remove(index);
            inner.last_activity = self.clock.now();

            tracing::info!(
                room_id = %self.id,
                player_id = %player,
                players = inner.seats.len(),
                "player left"
            );

            if inner.state.is_active() {
                self.transition(&mut inner, RoomState::Finished);
                for seat in &mut inner.seats {
                    seat.turn = false;
                }
                let over = GameMessage::GameOver {
                    winner: inner.seats.first().map(Seat::player_id),
                    reason: REASON_OPPONENT_LEFT.to_string(),
                };
                outbox.broadcast(&inner.seats, over);
            } else if inner.seats.is_empty() {
                self.finish(&mut inner);
            }
            inner.seats.len()
        };
        outbox.deliver(self.id).await;
        Ok(remaining)
    }

    /// Closes every seated session and empties the room.
    ///
    /// Takes only the state lock: closing a session also releases any
    /// delivery stuck on that player's full queue.
    pub async fn shutdown(&self) {
        let mut inner = self.inner.lock().await;
        self.finish(&mut inner);
        for seat in std::mem::take(&mut inner.seats) {
            seat.session.close().await;
        }
        tracing::info!(room_id = %self.id, "room shut down");
    }

    fn transition(&self, inner: &mut RoomInner, target: RoomState) {
        inner.transition(self.id, target);
        self.open.store(target.is_joinable(), Ordering::Release);
    }

    /// Forces `Finished` from any state.
    fn finish(&self, inner: &mut RoomInner) {
        inner.state = RoomState::Finished;
        self.open.store(false, Ordering::Release);
    }
}

/// Runs every precondition of a play in order and returns the acting seat,
/// the target slot, and the card's position in the hand.
fn validate_play(
    inner: &RoomInner,
    player: PlayerId,
    card_name: &str,
    target_slot: i64,
) -> Result<(usize, SlotId, usize), ActionError> {
    if inner.state != RoomState::InProgress {
        return Err(ActionError::NotInProgress(inner.state));
    }
    let seat_index = inner.seat_index(player).ok_or(ActionError::NotInRoom)?;
    let seat = &inner.seats[seat_index];
    if !seat.turn {
        return Err(ActionError::NotYourTurn);
    }
    let slot =
        SlotId::try_from(target_slot).map_err(|_| ActionError::InvalidSlot(target_slot))?;
    let card_index = seat
        .hand
        .iter()
        .position(|c| c.name == card_name)
        .ok_or_else(|| ActionError::CardNotInHand(card_name.to_string()))?;

    let card = &seat.hand[card_index];
    if card.impact_type == ImpactType::Singular
        && card.mark_effect.damage_type == DamageType::Place
        && inner.board.slot(slot).is_blocked()
    {
        return Err(ActionError::SlotBlocked(slot));
    }
    Ok((seat_index, slot, card_index))
}
