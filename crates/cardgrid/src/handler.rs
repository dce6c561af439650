//! Per-connection handler: seat the player, then route their actions.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Split the connection; the write half goes to a new player session
//!   2. Matchmake the player into a room
//!   3. Loop: receive bytes → decode a `PlayerMessage` → route to the room
//!
//! Leaving the loop for any reason (clean close, read error, early return)
//! drops the guard, which removes the player and closes their session.

use std::sync::Arc;

use cardgrid_protocol::{Codec, GameMessage, PlayerId, PlayerMessage};
use cardgrid_room::{ActionError, RoomError, RoomRegistry};
use cardgrid_session::PlayerSession;
use cardgrid_transport::{Connection, ConnectionReader};

use crate::CardgridError;
use crate::server::ServerState;

/// Drop guard that closes a player's session and removes them from their
/// room when the handler exits.
///
/// `Drop` is synchronous, so the async cleanup runs in a spawned task.
struct DisconnectGuard {
    player_id: PlayerId,
    session: Arc<PlayerSession>,
    registry: Arc<RoomRegistry>,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        let player_id = self.player_id;
        let session = Arc::clone(&self.session);
        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            // Closing first frees any room delivery waiting on this
            // player's queue, so the seat can be removed.
            session.close().await;
            if let Err(e) = registry.disconnect(player_id).await {
                tracing::debug!(%player_id, error = %e, "disconnect cleanup");
            }
            tracing::info!(%player_id, "player disconnected");
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<Conn, C>(
    conn: Conn,
    state: Arc<ServerState<C>>,
) -> Result<(), CardgridError>
where
    Conn: Connection,
    C: Codec,
{
    let conn_id = conn.id();
    let (mut reader, writer) = conn.split();

    let player_id = state.ids.next_player_id();
    let session = PlayerSession::spawn(
        player_id,
        state.session_config.default_name.clone(),
        writer,
        state.codec.clone(),
        &state.session_config,
    );
    tracing::info!(%conn_id, %player_id, "player connected");

    let _guard = DisconnectGuard {
        player_id,
        session: Arc::clone(&session),
        registry: Arc::clone(&state.registry),
    };

    let room_id = state.registry.join_or_create(Arc::clone(&session)).await?;
    tracing::debug!(%player_id, %room_id, "player seated");

    loop {
        let data = match reader.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::debug!(%player_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "recv error");
                break;
            }
        };

        let msg: PlayerMessage = match state.codec.decode(&data) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "dropping undecodable message");
                continue;
            }
        };

        match msg {
            PlayerMessage::PlayCard {
                card_name,
                target_slot,
            } => {
                let result = state
                    .registry
                    .play_card(player_id, &card_name, target_slot)
                    .await;
                if let Err(e) = result {
                    if !reported_by_room(&e) {
                        tracing::debug!(%player_id, error = %e, "action not routed");
                        session.enqueue(GameMessage::error(e.to_string())).await?;
                    }
                }
            }
            PlayerMessage::Unhandled => {
                tracing::trace!(%player_id, "ignoring unhandled action");
            }
        }
    }

    // _guard drops here → disconnect fires.
    Ok(())
}

/// `true` when the room already sent the player an `error` for `e`.
fn reported_by_room(e: &RoomError) -> bool {
    matches!(e, RoomError::Action(action) if *action != ActionError::NotInRoom)
}
