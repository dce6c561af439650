//! Integration tests for rooms and the registry, driven through in-memory
//! connections. Most tests use a catalog holding only Mark cards so every
//! hand is known; the blast tests script their draws instead.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cardgrid_engine::{CardCatalog, MARK, Roller, standard_cards};
use cardgrid_protocol::{Card, CardType, Codec, GameMessage, JsonCodec, PlayerId};
use cardgrid_room::{
    ActionError, REASON_LINE, REASON_OPPONENT_LEFT, RoomConfig, RoomError,
    RoomRegistry, RoomState, TokioClock,
};
use cardgrid_session::{PlayerSession, SequentialIds, SessionConfig};
use cardgrid_transport::memory::{self, MemoryPeer};
use cardgrid_transport::{Connection, ConnectionWriter, TransportError};

// =========================================================================
// Helpers
// =========================================================================

struct Client {
    id: PlayerId,
    session: Arc<PlayerSession>,
    peer: MemoryPeer,
}

impl Client {
    fn new(id: u64) -> Self {
        let (conn, peer) = memory::pair();
        let (_reader, writer) = conn.split();
        let id = PlayerId(id);
        let session =
            PlayerSession::spawn(id, "anon_player", writer, JsonCodec, &SessionConfig::default());
        Self { id, session, peer }
    }

    /// Next message; fails the test if the server hung up instead.
    async fn next(&mut self) -> GameMessage {
        let bytes = tokio::time::timeout(Duration::from_secs(5), self.peer.recv())
            .await
            .expect("timed out waiting for a message")
            .expect("connection closed");
        JsonCodec.decode(&bytes).unwrap()
    }

    /// Next message, which must be of `kind`.
    async fn expect(&mut self, kind: &str) -> GameMessage {
        let msg = self.next().await;
        assert_eq!(msg.kind(), kind, "unexpected message: {msg:?}");
        msg
    }

    fn assert_quiet(&mut self) {
        if let Some(bytes) = self.peer.try_recv() {
            let msg: GameMessage = JsonCodec.decode(&bytes).unwrap();
            panic!("unexpected message: {msg:?}");
        }
    }
}

fn standard(name: &str) -> Card {
    standard_cards()
        .into_iter()
        .find(|c| c.name == name)
        .unwrap()
}

fn mark_only_catalog() -> Arc<CardCatalog> {
    Arc::new(CardCatalog::from_cards(vec![standard(MARK)]).unwrap())
}

/// Hands out queued rolls, then 0.0 (which always lands on the first card).
#[derive(Debug)]
struct ScriptedRolls(Mutex<VecDeque<f64>>);

impl Roller for ScriptedRolls {
    fn roll(&self) -> f64 {
        self.0.lock().unwrap().pop_front().unwrap_or(0.0)
    }
}

/// Mark plus `other`, both at weight 0.5: a roll of 0.0 draws Mark and 0.9
/// draws `other`. Seats are dealt in join order, then each play draws one.
fn scripted_catalog(other: Card, rolls: &[f64]) -> Arc<CardCatalog> {
    let catalog = CardCatalog::from_cards(vec![standard(MARK), other])
        .unwrap()
        .with_roller(ScriptedRolls(Mutex::new(rolls.iter().copied().collect())));
    Arc::new(catalog)
}

fn registry_with_catalog(config: RoomConfig, catalog: Arc<CardCatalog>) -> Arc<RoomRegistry> {
    Arc::new(RoomRegistry::new(
        config,
        catalog,
        Arc::new(SequentialIds::new()),
        Arc::new(TokioClock),
    ))
}

fn registry_with(config: RoomConfig) -> Arc<RoomRegistry> {
    registry_with_catalog(config, mark_only_catalog())
}

fn registry() -> Arc<RoomRegistry> {
    registry_with(RoomConfig {
        start_delay: Duration::ZERO,
        ..RoomConfig::default()
    })
}

/// Seats two clients and consumes their `game_start`.
async fn started_game(registry: &RoomRegistry) -> (Client, Client) {
    let mut p1 = Client::new(1);
    let mut p2 = Client::new(2);
    registry.join_or_create(Arc::clone(&p1.session)).await.unwrap();
    registry.join_or_create(Arc::clone(&p2.session)).await.unwrap();
    p1.expect("game_start").await;
    p2.expect("game_start").await;
    (p1, p2)
}

/// Plays a Mark and drains the resulting success/state messages.
async fn play_mark(registry: &RoomRegistry, actor: &mut Client, other: &mut Client, slot: i64) {
    registry.play_card(actor.id, MARK, slot).await.unwrap();
    actor.expect("play_card_success").await;
    actor.expect("game_state").await;
    other.expect("game_state").await;
}

/// Plays `card` and returns the `game_state` that followed.
async fn play_and_observe(
    registry: &RoomRegistry,
    actor: &mut Client,
    other: &mut Client,
    card: &str,
    slot: i64,
) -> GameMessage {
    registry.play_card(actor.id, card, slot).await.unwrap();
    let GameMessage::PlayCardSuccess { cards_to_remove, .. } =
        actor.expect("play_card_success").await
    else {
        unreachable!()
    };
    assert_eq!(cards_to_remove[0].name, card);
    let state = actor.expect("game_state").await;
    assert_eq!(other.expect("game_state").await, state);
    state
}

fn occupied_slots(state: &GameMessage) -> Vec<u8> {
    let GameMessage::GameState { board_state, .. } = state else {
        panic!("not a game_state: {state:?}");
    };
    board_state.iter().map(|m| m.slot).collect()
}

async fn turn_holders(registry: &RoomRegistry, player: PlayerId) -> Vec<PlayerId> {
    let room_id = registry.player_room(player).await.unwrap();
    let room = registry.room(room_id).await.unwrap();
    room.seats()
        .await
        .iter()
        .filter(|s| s.has_turn())
        .map(|s| s.player_id())
        .collect()
}

// =========================================================================
// Matchmaking
// =========================================================================

#[tokio::test]
async fn test_two_players_share_a_room_and_third_gets_a_new_one() {
    let registry = registry();
    let p1 = Client::new(1);
    let p2 = Client::new(2);
    let p3 = Client::new(3);

    let r1 = registry.join_or_create(Arc::clone(&p1.session)).await.unwrap();
    let r2 = registry.join_or_create(Arc::clone(&p2.session)).await.unwrap();
    let r3 = registry.join_or_create(Arc::clone(&p3.session)).await.unwrap();

    assert_eq!(r1, r2);
    assert_ne!(r1, r3);
    assert_eq!(registry.room_count().await, 2);
    assert_eq!(registry.player_room(p3.id).await, Some(r3));
}

#[tokio::test]
async fn test_join_twice_is_rejected() {
    let registry = registry();
    let p1 = Client::new(1);
    let room_id = registry.join_or_create(Arc::clone(&p1.session)).await.unwrap();

    let result = registry.join_or_create(Arc::clone(&p1.session)).await;

    assert!(matches!(
        result,
        Err(RoomError::AlreadyInRoom(pid, rid)) if pid == p1.id && rid == room_id
    ));
    assert_eq!(registry.room_count().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_arrivals_fill_rooms_pairwise() {
    let registry = registry();
    let clients: Vec<Client> = (1..=6).map(Client::new).collect();

    let joins: Vec<_> = clients
        .iter()
        .map(|c| {
            let registry = Arc::clone(&registry);
            let session = Arc::clone(&c.session);
            tokio::spawn(async move { registry.join_or_create(session).await })
        })
        .collect();
    for join in joins {
        join.await.unwrap().unwrap();
    }

    assert_eq!(registry.room_count().await, 3);
    for client in &clients {
        let room_id = registry.player_room(client.id).await.unwrap();
        let info = registry.room(room_id).await.unwrap().info().await;
        assert_eq!(info.player_count, 2);
    }
}

// =========================================================================
// Game start
// =========================================================================

#[tokio::test]
async fn test_game_start_deals_hands_and_first_turn() {
    let registry = registry();
    let mut p1 = Client::new(1);
    let mut p2 = Client::new(2);
    registry.join_or_create(Arc::clone(&p1.session)).await.unwrap();
    registry.join_or_create(Arc::clone(&p2.session)).await.unwrap();

    let GameMessage::GameStart { cards_to_add, your_turn } = p1.expect("game_start").await else {
        unreachable!()
    };
    assert_eq!(cards_to_add.len(), 3);
    assert!(cards_to_add.iter().all(|c| c.name == MARK));
    assert!(your_turn);

    let GameMessage::GameStart { your_turn, .. } = p2.expect("game_start").await else {
        unreachable!()
    };
    assert!(!your_turn);

    let room_id = registry.player_room(p1.id).await.unwrap();
    let room = registry.room(room_id).await.unwrap();
    assert_eq!(room.state().await, RoomState::InProgress);
    assert_eq!(turn_holders(&registry, p1.id).await, vec![p1.id]);
}

#[tokio::test(start_paused = true)]
async fn test_start_waits_for_start_delay() {
    let registry = registry_with(RoomConfig::default());
    let mut p1 = Client::new(1);
    let p2 = Client::new(2);
    let room_id = registry.join_or_create(Arc::clone(&p1.session)).await.unwrap();
    registry.join_or_create(Arc::clone(&p2.session)).await.unwrap();

    let room = registry.room(room_id).await.unwrap();
    assert_eq!(room.state().await, RoomState::Starting);
    tokio::task::yield_now().await;
    p1.assert_quiet();

    tokio::time::sleep(Duration::from_millis(500)).await;
    p1.expect("game_start").await;
    assert_eq!(room.state().await, RoomState::InProgress);
}

#[tokio::test(start_paused = true)]
async fn test_leaving_during_start_delay_finishes_room() {
    let registry = registry_with(RoomConfig::default());
    let mut p1 = Client::new(1);
    let p2 = Client::new(2);
    let room_id = registry.join_or_create(Arc::clone(&p1.session)).await.unwrap();
    registry.join_or_create(Arc::clone(&p2.session)).await.unwrap();

    registry.disconnect(p2.id).await.unwrap();

    let GameMessage::GameOver { winner, reason } = p1.expect("game_over").await else {
        unreachable!()
    };
    assert_eq!(winner, Some(p1.id));
    assert_eq!(reason, REASON_OPPONENT_LEFT);

    tokio::time::sleep(Duration::from_secs(1)).await;
    p1.assert_quiet();
    let room = registry.room(room_id).await.unwrap();
    assert_eq!(room.state().await, RoomState::Finished);
}

// =========================================================================
// Playing cards
// =========================================================================

#[tokio::test]
async fn test_play_then_out_of_turn_play_is_rejected() {
    let registry = registry();
    let (mut p1, mut p2) = started_game(&registry).await;

    registry.play_card(p1.id, MARK, 4).await.unwrap();

    let GameMessage::PlayCardSuccess { target_slot, cards_to_remove, cards_to_add } =
        p1.expect("play_card_success").await
    else {
        unreachable!()
    };
    assert_eq!(target_slot, 4);
    assert_eq!(cards_to_remove.len(), 1);
    assert_eq!(cards_to_add.len(), 1);

    let GameMessage::GameState { board_state, active_player } = p1.expect("game_state").await
    else {
        unreachable!()
    };
    assert_eq!(board_state.len(), 1);
    assert_eq!(board_state[0].slot, 4);
    assert_eq!(board_state[0].effect.owner, Some(p1.id));
    assert_eq!(active_player, Some(p2.id));
    p2.expect("game_state").await;

    let result = registry.play_card(p1.id, MARK, 0).await;
    assert!(matches!(result, Err(RoomError::Action(ActionError::NotYourTurn))));
    assert_eq!(p1.expect("error").await, GameMessage::error("not your turn"));
    p2.assert_quiet();

    let room = registry.room(registry.player_room(p1.id).await.unwrap()).await.unwrap();
    assert_eq!(room.board().await.display_state().len(), 1);
}

#[tokio::test]
async fn test_out_of_range_slots_are_rejected_without_mutation() {
    let registry = registry();
    let (mut p1, _p2) = started_game(&registry).await;
    let room = registry.room(registry.player_room(p1.id).await.unwrap()).await.unwrap();
    let hand_before = room.seats().await[0].hand().to_vec();

    for slot in [9, -1] {
        let result = registry.play_card(p1.id, MARK, slot).await;
        assert!(matches!(
            result,
            Err(RoomError::Action(ActionError::InvalidSlot(s))) if s == slot
        ));
        p1.expect("error").await;
    }

    assert!(room.board().await.display_state().is_empty());
    assert_eq!(room.seats().await[0].hand(), hand_before.as_slice());
    assert_eq!(turn_holders(&registry, p1.id).await, vec![p1.id]);
}

#[tokio::test]
async fn test_card_not_in_hand_is_rejected() {
    let registry = registry();
    let (mut p1, _p2) = started_game(&registry).await;

    let result = registry.play_card(p1.id, "Bomb", 4).await;

    assert!(matches!(
        result,
        Err(RoomError::Action(ActionError::CardNotInHand(name))) if name == "Bomb"
    ));
    p1.expect("error").await;
}

#[tokio::test]
async fn test_mark_on_blocked_slot_is_rejected() {
    let registry = registry();
    let (mut p1, mut p2) = started_game(&registry).await;
    play_mark(&registry, &mut p1, &mut p2, 4).await;

    let result = registry.play_card(p2.id, MARK, 4).await;

    assert!(matches!(
        result,
        Err(RoomError::Action(ActionError::SlotBlocked(_)))
    ));
    p2.expect("error").await;
    assert_eq!(turn_holders(&registry, p1.id).await, vec![p2.id]);
}

#[tokio::test]
async fn test_exactly_one_turn_holder_after_every_play() {
    let registry = registry();
    let (mut p1, mut p2) = started_game(&registry).await;

    // p1 ends on 0,2,3 and p2 on 1,4,5: no line for either.
    let moves = [0, 1, 2, 4, 3, 5];
    for (i, slot) in moves.into_iter().enumerate() {
        let (actor, other) = if i % 2 == 0 {
            (&mut p1, &mut p2)
        } else {
            (&mut p2, &mut p1)
        };
        play_mark(&registry, actor, other, slot).await;

        let expected = if i % 2 == 0 { p2.id } else { p1.id };
        assert_eq!(turn_holders(&registry, p1.id).await, vec![expected]);
    }
}

#[tokio::test]
async fn test_row_win_finishes_room() {
    let registry = registry();
    let (mut p1, mut p2) = started_game(&registry).await;

    play_mark(&registry, &mut p1, &mut p2, 0).await;
    play_mark(&registry, &mut p2, &mut p1, 3).await;
    play_mark(&registry, &mut p1, &mut p2, 1).await;
    play_mark(&registry, &mut p2, &mut p1, 4).await;

    registry.play_card(p1.id, MARK, 2).await.unwrap();
    p1.expect("play_card_success").await;
    let GameMessage::GameState { active_player, .. } = p1.expect("game_state").await else {
        unreachable!()
    };
    assert_eq!(active_player, None);
    let over = p1.expect("game_over").await;
    assert_eq!(
        over,
        GameMessage::GameOver {
            winner: Some(p1.id),
            reason: REASON_LINE.to_string(),
        }
    );
    p2.expect("game_state").await;
    assert_eq!(p2.expect("game_over").await, over);

    let room = registry.room(registry.player_room(p1.id).await.unwrap()).await.unwrap();
    assert_eq!(room.state().await, RoomState::Finished);
    assert!(turn_holders(&registry, p1.id).await.is_empty());

    let result = registry.play_card(p2.id, MARK, 8).await;
    assert!(matches!(
        result,
        Err(RoomError::Action(ActionError::NotInProgress(RoomState::Finished)))
    ));
}

#[tokio::test]
async fn test_play_without_room_is_not_routed() {
    let registry = registry();

    let result = registry.play_card(PlayerId(42), MARK, 0).await;

    assert!(matches!(result, Err(RoomError::NotInAnyRoom(PlayerId(42)))));
}

#[tokio::test]
async fn test_bomb_clears_its_radius_and_passes_the_turn() {
    let catalog = scripted_catalog(standard("Bomb"), &[0.0, 0.0, 0.0, 0.0, 0.0, 0.9]);
    let registry = registry_with_catalog(
        RoomConfig {
            start_delay: Duration::ZERO,
            ..RoomConfig::default()
        },
        catalog,
    );
    let (mut p1, mut p2) = started_game(&registry).await;

    play_mark(&registry, &mut p1, &mut p2, 0).await;
    play_mark(&registry, &mut p2, &mut p1, 8).await;
    play_mark(&registry, &mut p1, &mut p2, 6).await;
    play_mark(&registry, &mut p2, &mut p1, 7).await;
    play_mark(&registry, &mut p1, &mut p2, 2).await;

    // Radius of slot 1 is {0,1,2,3,4,5}.
    let state = play_and_observe(&registry, &mut p2, &mut p1, "Bomb", 1).await;

    assert_eq!(occupied_slots(&state), vec![6, 7, 8]);
    let GameMessage::GameState { active_player, .. } = &state else {
        unreachable!()
    };
    assert_eq!(*active_player, Some(p1.id));
    assert_eq!(turn_holders(&registry, p1.id).await, vec![p1.id]);

    // The cleared slot takes a new mark.
    play_mark(&registry, &mut p1, &mut p2, 0).await;
}

#[tokio::test]
async fn test_dynamite_clears_row_and_column() {
    let catalog = scripted_catalog(standard("Dynamite"), &[0.0, 0.0, 0.0, 0.0, 0.0, 0.9]);
    let registry = registry_with_catalog(
        RoomConfig {
            start_delay: Duration::ZERO,
            ..RoomConfig::default()
        },
        catalog,
    );
    let (mut p1, mut p2) = started_game(&registry).await;

    play_mark(&registry, &mut p1, &mut p2, 0).await;
    play_mark(&registry, &mut p2, &mut p1, 8).await;
    play_mark(&registry, &mut p1, &mut p2, 2).await;
    play_mark(&registry, &mut p2, &mut p1, 7).await;
    play_mark(&registry, &mut p1, &mut p2, 4).await;

    // Row 1 and column 0 through slot 3 are {0,3,4,5,6}.
    let state = play_and_observe(&registry, &mut p2, &mut p1, "Dynamite", 3).await;

    assert_eq!(occupied_slots(&state), vec![2, 7, 8]);
    let room_id = registry.player_room(p1.id).await.unwrap();
    let board = registry.room(room_id).await.unwrap().board().await;
    assert!(board.slots()[3].is_empty(), "blast effects are not left behind");
    assert_eq!(turn_holders(&registry, p1.id).await, vec![p1.id]);
}

#[tokio::test]
async fn test_null_card_changes_nothing_but_the_turn() {
    let blank = Card {
        name: "Blank".into(),
        rarity: 0.5,
        ..standard("Default")
    };
    assert_eq!(blank.card_type, CardType::Null);
    let registry = registry_with_catalog(
        RoomConfig {
            start_delay: Duration::ZERO,
            ..RoomConfig::default()
        },
        scripted_catalog(blank, &[0.9]),
    );
    let (mut p1, mut p2) = started_game(&registry).await;
    play_mark(&registry, &mut p1, &mut p2, 0).await;
    play_mark(&registry, &mut p2, &mut p1, 8).await;

    let state = play_and_observe(&registry, &mut p1, &mut p2, "Blank", 4).await;

    assert_eq!(occupied_slots(&state), vec![0, 8]);
    assert_eq!(turn_holders(&registry, p1.id).await, vec![p2.id]);
}

// =========================================================================
// Disconnects
// =========================================================================

#[tokio::test]
async fn test_mid_game_disconnect_notifies_opponent() {
    let registry = registry();
    let (p1, mut p2) = started_game(&registry).await;
    let room_id = registry.player_room(p1.id).await.unwrap();

    registry.disconnect(p1.id).await.unwrap();

    assert_eq!(
        p2.expect("game_over").await,
        GameMessage::GameOver {
            winner: Some(p2.id),
            reason: REASON_OPPONENT_LEFT.to_string(),
        }
    );
    assert_eq!(registry.player_room(p1.id).await, None);
    assert_eq!(registry.player_room(p2.id).await, Some(room_id));
    let room = registry.room(room_id).await.unwrap();
    assert_eq!(room.state().await, RoomState::Finished);

    registry.disconnect(p2.id).await.unwrap();
    assert_eq!(registry.room_count().await, 0);
}

#[tokio::test]
async fn test_last_player_leaving_removes_room() {
    let registry = registry();
    let p1 = Client::new(1);
    registry.join_or_create(Arc::clone(&p1.session)).await.unwrap();

    registry.disconnect(p1.id).await.unwrap();

    assert_eq!(registry.room_count().await, 0);
    assert!(matches!(
        registry.disconnect(p1.id).await,
        Err(RoomError::NotInAnyRoom(_))
    ));
}

// =========================================================================
// Stalled clients
// =========================================================================

/// A connection whose peer never reads: every write hangs.
struct StalledWriter;

impl ConnectionWriter for StalledWriter {
    async fn send(&mut self, _data: &[u8]) -> Result<(), TransportError> {
        std::future::pending().await
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

#[tokio::test]
async fn test_stalled_client_does_not_block_other_rooms() {
    let registry = registry();
    let stalled_id = PlayerId(1);
    let stalled = PlayerSession::spawn(
        stalled_id,
        "stalled",
        StalledWriter,
        JsonCodec,
        &SessionConfig {
            outbound_capacity: 1,
            ..SessionConfig::default()
        },
    );
    let mut p2 = Client::new(2);
    registry.join_or_create(Arc::clone(&stalled)).await.unwrap();
    registry.join_or_create(Arc::clone(&p2.session)).await.unwrap();
    p2.expect("game_start").await;

    // Each rejection queues an error the stalled client never drains.
    let spammer = {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move {
            for _ in 0..5 {
                let _ = registry.play_card(stalled_id, MARK, 99).await;
            }
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!spammer.is_finished(), "stalled client should be backed up");

    // Matchmaking elsewhere carries on.
    let mut p3 = Client::new(3);
    let mut p4 = Client::new(4);
    let joined = tokio::time::timeout(Duration::from_secs(2), async {
        let a = registry.join_or_create(Arc::clone(&p3.session)).await.unwrap();
        let b = registry.join_or_create(Arc::clone(&p4.session)).await.unwrap();
        (a, b)
    })
    .await
    .expect("matchmaking stalled behind another room");
    assert_eq!(joined.0, joined.1);
    p3.expect("game_start").await;
    p4.expect("game_start").await;
    play_mark(&registry, &mut p3, &mut p4, 4).await;

    // Closing the stalled session, as the connection handler does on
    // hang-up, frees its room.
    stalled.close().await;
    tokio::time::timeout(Duration::from_secs(2), registry.disconnect(stalled_id))
        .await
        .expect("disconnect stalled behind a full queue")
        .unwrap();
    assert_eq!(
        p2.expect("game_over").await,
        GameMessage::GameOver {
            winner: Some(p2.id),
            reason: REASON_OPPONENT_LEFT.to_string(),
        }
    );
    tokio::time::timeout(Duration::from_secs(2), spammer)
        .await
        .expect("queued plays should drain once the session closed")
        .unwrap();
}

// =========================================================================
// Reaping
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_reap_idle_removes_only_idle_rooms() {
    let registry = registry_with(RoomConfig::default());
    let (mut p1, mut p2) = {
        let mut p1 = Client::new(1);
        let mut p2 = Client::new(2);
        registry.join_or_create(Arc::clone(&p1.session)).await.unwrap();
        registry.join_or_create(Arc::clone(&p2.session)).await.unwrap();
        p1.expect("game_start").await;
        p2.expect("game_start").await;
        (p1, p2)
    };
    let mut p3 = Client::new(3);
    let lonely = registry.join_or_create(Arc::clone(&p3.session)).await.unwrap();
    let busy = registry.player_room(p1.id).await.unwrap();

    tokio::time::advance(Duration::from_secs(9 * 60)).await;
    // A rejected action still counts as activity.
    let _ = registry.play_card(p2.id, MARK, 0).await;
    p2.expect("error").await;
    tokio::time::advance(Duration::from_secs(2 * 60)).await;

    let reaped = registry.reap_idle().await;

    assert_eq!(reaped, vec![lonely]);
    assert_eq!(registry.room_count().await, 1);
    assert!(registry.room(busy).await.is_some());
    assert_eq!(registry.player_room(p3.id).await, None);
    assert_eq!(registry.player_room(p1.id).await, Some(busy));
    assert!(p3.session.is_closed().await);
    assert!(p3.peer.recv().await.is_none());

    play_mark(&registry, &mut p1, &mut p2, 4).await;
}

#[tokio::test(start_paused = true)]
async fn test_reaper_task_sweeps_on_interval() {
    let registry = registry_with(RoomConfig::default());
    let reaper = registry.spawn_reaper();
    let p1 = Client::new(1);
    registry.join_or_create(Arc::clone(&p1.session)).await.unwrap();

    tokio::time::sleep(Duration::from_secs(9 * 60 + 30)).await;
    assert_eq!(registry.room_count().await, 1);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(registry.room_count().await, 0);
    assert_eq!(registry.player_room(p1.id).await, None);

    reaper.abort();
}

#[tokio::test(start_paused = true)]
async fn test_idle_check_is_repeated_under_the_room_lock() {
    let registry = registry_with(RoomConfig::default());
    let idle_timeout = registry.config().idle_timeout;
    let p1 = Client::new(1);
    let room_id = registry.join_or_create(Arc::clone(&p1.session)).await.unwrap();
    let room = registry.room(room_id).await.unwrap();

    tokio::time::advance(Duration::from_secs(11 * 60)).await;
    let sweep_started = tokio::time::Instant::now();
    assert!(room.is_idle(sweep_started, idle_timeout).await);

    // Touched after the sweep looked: it must survive.
    let _ = registry.play_card(p1.id, MARK, 0).await;
    assert!(!room.retire_if_idle(sweep_started, idle_timeout).await);
    assert!(room.is_open());

    tokio::time::advance(Duration::from_secs(11 * 60)).await;
    assert!(room.retire_if_idle(tokio::time::Instant::now(), idle_timeout).await);
    assert!(!room.is_open());

    // A retired room refuses players, so matchmaking opens a fresh one.
    let p2 = Client::new(2);
    assert!(matches!(
        room.join(Arc::clone(&p2.session)).await,
        Err(RoomError::InvalidState(_, RoomState::Finished))
    ));
    let fresh = registry.join_or_create(Arc::clone(&p2.session)).await.unwrap();
    assert_ne!(fresh, room_id);
}

#[tokio::test(start_paused = true)]
async fn test_reaped_room_leaves_no_index_entries() {
    let registry = registry_with(RoomConfig::default());
    let p1 = Client::new(1);
    let reaped_room = registry.join_or_create(Arc::clone(&p1.session)).await.unwrap();

    tokio::time::advance(Duration::from_secs(11 * 60)).await;
    assert_eq!(registry.reap_idle().await, vec![reaped_room]);

    let p2 = Client::new(2);
    let room_id = registry.join_or_create(Arc::clone(&p2.session)).await.unwrap();
    assert_ne!(room_id, reaped_room);
    assert_eq!(registry.player_room(p1.id).await, None);
    assert_eq!(registry.player_room(p2.id).await, Some(room_id));
    assert!(registry.room(room_id).await.is_some());
    assert!(matches!(
        registry.disconnect(p1.id).await,
        Err(RoomError::NotInAnyRoom(_))
    ));
}
