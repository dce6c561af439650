//! `CardgridServer` builder and accept loop.
//!
//! This is the entry point for running a Cardgrid game server. It ties
//! together all the layers: transport → session → room registry.

use std::sync::Arc;

use cardgrid_engine::CardCatalog;
use cardgrid_protocol::{Codec, JsonCodec};
use cardgrid_room::{Clock, RoomConfig, RoomRegistry, TokioClock};
use cardgrid_session::{IdSource, SequentialIds, SessionConfig};
use cardgrid_transport::{Transport, TransportError, WebSocketTransport};

use crate::handler::handle_connection;
use crate::{CardgridError, ServerConfig};

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) registry: Arc<RoomRegistry>,
    pub(crate) ids: Arc<dyn IdSource>,
    pub(crate) session_config: SessionConfig,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Cardgrid server.
///
/// # Example
///
/// ```rust,no_run
/// use cardgrid::prelude::*;
///
/// # async fn run() -> Result<(), CardgridError> {
/// let server = CardgridServer::builder()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct CardgridServerBuilder {
    config: ServerConfig,
    catalog: Option<Arc<CardCatalog>>,
    ids: Option<Arc<dyn IdSource>>,
    clock: Option<Arc<dyn Clock>>,
}

impl CardgridServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::from_config(ServerConfig::default())
    }

    /// Starts from an existing configuration, e.g.
    /// [`ServerConfig::from_env`].
    pub fn from_config(config: ServerConfig) -> Self {
        Self {
            config,
            catalog: None,
            ids: None,
            clock: None,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.config.room = config;
        self
    }

    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.config.session = config;
        self
    }

    /// Replaces the standard card set.
    pub fn catalog(mut self, catalog: Arc<CardCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn ids(mut self, ids: Arc<dyn IdSource>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Binds the WebSocket listener and builds the server with `JsonCodec`.
    pub async fn build(
        self,
    ) -> Result<CardgridServer<WebSocketTransport, JsonCodec>, CardgridError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;
        Ok(self.build_with(transport, JsonCodec))
    }

    /// Builds the server on any transport and codec.
    pub fn build_with<T, C>(self, transport: T, codec: C) -> CardgridServer<T, C>
    where
        T: Transport,
        C: Codec,
    {
        let catalog = self
            .catalog
            .unwrap_or_else(|| Arc::new(CardCatalog::standard()));
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(SequentialIds::new()));
        let clock = self.clock.unwrap_or_else(|| Arc::new(TokioClock));

        let registry = Arc::new(RoomRegistry::new(
            self.config.room,
            catalog,
            Arc::clone(&ids),
            clock,
        ));

        CardgridServer {
            transport,
            state: Arc::new(ServerState {
                registry,
                ids,
                session_config: self.config.session,
                codec,
            }),
        }
    }
}

impl Default for CardgridServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A Cardgrid game server, ready to accept connections.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct CardgridServer<T: Transport, C: Codec> {
    transport: T,
    state: Arc<ServerState<C>>,
}

impl CardgridServer<WebSocketTransport, JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> CardgridServerBuilder {
        CardgridServerBuilder::new()
    }
}

impl<C: Codec> CardgridServer<WebSocketTransport, C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }
}

impl<T, C> CardgridServer<T, C>
where
    T: Transport,
    C: Codec,
{
    /// The registry this server routes players through.
    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.state.registry
    }

    /// Runs the reaper and the accept loop.
    ///
    /// Each accepted connection gets its own handler task. Returns once the
    /// transport reports its listener closed; other accept failures are
    /// logged and skipped.
    pub async fn run(mut self) -> Result<(), CardgridError> {
        let reaper = self.state.registry.spawn_reaper();
        tracing::info!("Cardgrid server running");

        let result = loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(TransportError::ListenerClosed) => {
                    tracing::info!("listener closed, stopping accept loop");
                    break Ok(());
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        };

        reaper.abort();
        result
    }
}
