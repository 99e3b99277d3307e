//! WebSocket Gateway Server
//!
//! Accepts controller connections, gives each one a device id and turns its
//! frames into gateway events for the session. Outbound device messages are
//! written back as JSON text frames.

use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::stream::SplitStream;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio_tungstenite::{accept_async, tungstenite::Message, WebSocketStream};
use tracing::{debug, error, info, instrument, warn};

use crate::core::ids::DeviceId;
use crate::core::numbering::next_number;
use crate::network::actor::{SessionClosed, SessionHandle};
use crate::network::protocol::{DeviceFrame, DeviceMessage, GatewayEvent};

/// Default bind port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default connection limit.
pub const DEFAULT_MAX_CONNECTIONS: usize = 64;

/// Per-device outbound queue length.
pub const OUTBOUND_BUFFER: usize = 64;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent controllers.
    pub max_connections: usize,
    /// Server version string.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Gateway server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// The session is gone.
    #[error("Session error: {0}")]
    Session(#[from] SessionClosed),
}

/// The controller gateway.
pub struct GameServer {
    /// Server configuration.
    config: ServerConfig,
    /// Session every controller joins.
    session: SessionHandle,
    /// Device ids in use.
    devices: Arc<RwLock<BTreeSet<DeviceId>>>,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Create a gateway feeding `session`.
    pub fn new(config: ServerConfig, session: SessionHandle) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            session,
            devices: Arc::new(RwLock::new(BTreeSet::new())),
            shutdown_tx,
        }
    }

    /// Bind to the configured address and serve until shutdown.
    pub async fn run(&self) -> Result<(), GameServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        self.serve(listener).await
    }

    /// Serve connections from an already bound listener until shutdown.
    #[instrument(skip(self, listener))]
    pub async fn serve(&self, listener: TcpListener) -> Result<(), GameServerError> {
        info!(
            "Controller gateway v{} listening on {}",
            self.config.version,
            listener.local_addr()?
        );

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let device = match self.reserve_device().await {
                                Some(device) => device,
                                None => {
                                    warn!("Connection limit reached, rejecting {}", addr);
                                    continue;
                                }
                            };

                            info!("New connection from {} as {}", addr, device);
                            self.handle_connection(stream, addr, device);
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Claim the smallest free device id, unless the gateway is full.
    async fn reserve_device(&self) -> Option<DeviceId> {
        let mut devices = self.devices.write().await;
        if devices.len() >= self.config.max_connections {
            return None;
        }

        let id = next_number(devices.iter().filter_map(|d| u32::try_from(d.get()).ok()));
        let device = DeviceId(i32::try_from(id).ok()?);
        devices.insert(device);
        Some(device)
    }

    /// Run a reserved connection on its own task and release the id afterwards.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr, device: DeviceId) {
        let devices = self.devices.clone();
        let session = self.session.clone();
        let shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            match serve_device(stream, device, &session, shutdown_rx).await {
                Ok(()) => info!("{} disconnected", device),
                Err(e) => warn!("{} from {} dropped: {}", device, addr, e),
            }
            devices.write().await.remove(&device);
        });
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Number of connected controllers.
    pub async fn connection_count(&self) -> usize {
        self.devices.read().await.len()
    }
}

type DeviceStream = SplitStream<WebSocketStream<TcpStream>>;

/// Handshake, join the session, then pump frames until the device leaves.
async fn serve_device(
    stream: TcpStream,
    device: DeviceId,
    session: &SessionHandle,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), GameServerError> {
    let ws_stream = accept_async(stream).await?;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (msg_tx, mut msg_rx) = mpsc::channel::<DeviceMessage>(OUTBOUND_BUFFER);

    session.connect(device, msg_tx).await?;
    debug!("{} joined session {}", device, session.session_id());

    // Spawn message sender task
    let sender_task = tokio::spawn(async move {
        while let Some(msg) = msg_rx.recv().await {
            let text = match msg.to_json() {
                Ok(t) => t,
                Err(e) => {
                    error!("Failed to serialize message: {}", e);
                    continue;
                }
            };
            if ws_sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let outcome = read_frames(device, session, &mut ws_receiver, &mut shutdown_rx).await;
    sender_task.abort();

    let left = session.dispatch(GatewayEvent::Disconnect(device)).await;
    outcome?;
    left?;
    Ok(())
}

/// Forward inbound frames to the session until close, error or shutdown.
async fn read_frames(
    device: DeviceId,
    session: &SessionHandle,
    ws_receiver: &mut DeviceStream,
    shutdown_rx: &mut broadcast::Receiver<()>,
) -> Result<(), GameServerError> {
    loop {
        tokio::select! {
            msg = ws_receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let frame = match DeviceFrame::from_json(&text) {
                            Ok(frame) => frame,
                            Err(e) => {
                                debug!("Invalid frame from {}: {}", device, e);
                                continue;
                            }
                        };
                        session.dispatch(frame.into_gateway_event(device)).await?;
                    }
                    Some(Ok(Message::Close(_))) | None => return Ok(()),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!("WebSocket error from {}: {}", device, e);
                        return Ok(());
                    }
                }
            }
            _ = shutdown_rx.recv() => return Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::avatar::HeadlessWorld;
    use crate::lobby::display::TextDisplay;
    use crate::lobby::session::{SessionConfig, SessionController, SessionPhase};
    use crate::network::actor::spawn_session;
    use crate::network::gateway::ChannelGateway;
    use std::time::Duration;
    use tokio_tungstenite::connect_async;

    fn test_session() -> SessionHandle {
        let controller = SessionController::new(
            SessionConfig { countdown_time: 0, ..Default::default() },
            ChannelGateway::new(),
            TextDisplay::new(),
            HeadlessWorld::new(),
        );
        spawn_session(controller).0
    }

    async fn next_message<S>(stream: &mut S) -> DeviceMessage
    where
        S: futures_util::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
    {
        loop {
            let frame = tokio::time::timeout(Duration::from_secs(5), stream.next())
                .await
                .expect("timed out")
                .expect("stream ended")
                .expect("websocket error");
            if let Message::Text(text) = frame {
                return DeviceMessage::from_json(&text).unwrap();
            }
        }
    }

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), DEFAULT_PORT);
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
    }

    #[tokio::test]
    async fn test_server_creation() {
        let server = GameServer::new(ServerConfig::default(), test_session());
        assert_eq!(server.connection_count().await, 0);
        server.shutdown();
    }

    #[tokio::test]
    async fn test_controllers_join_and_start() {
        let session = test_session();
        let server = Arc::new(GameServer::new(ServerConfig::default(), session.clone()));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let serving = server.clone();
        tokio::spawn(async move { serving.serve(listener).await });

        let url = format!("ws://{}", addr);
        let (mut first, _) = connect_async(url.as_str()).await.unwrap();
        assert_eq!(next_message(&mut first).await, DeviceMessage::Team { value: "blue".into() });

        let (mut second, _) = connect_async(url.as_str()).await.unwrap();
        assert_eq!(next_message(&mut second).await, DeviceMessage::Team { value: "green".into() });
        assert_eq!(server.connection_count().await, 2);

        let ready = r#"{"kind":"custom_device_state","data":{"isPlayerReady":true}}"#;
        first.send(Message::Text("not json".into())).await.unwrap();
        first.send(Message::Text(ready.into())).await.unwrap();
        second.send(Message::Text(ready.into())).await.unwrap();

        assert_eq!(next_message(&mut first).await, DeviceMessage::Lock);
        assert_eq!(next_message(&mut first).await, DeviceMessage::Start);
        assert_eq!(next_message(&mut second).await, DeviceMessage::Lock);
        assert_eq!(next_message(&mut second).await, DeviceMessage::Start);

        let snapshot = session.snapshot().await.unwrap();
        assert_eq!(snapshot.phase, SessionPhase::Started);
        assert_eq!(snapshot.player_count, 2);

        server.shutdown();
    }

    async fn start_server(config: ServerConfig, session: SessionHandle) -> (Arc<GameServer>, String) {
        let server = Arc::new(GameServer::new(config, session));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        let serving = server.clone();
        tokio::spawn(async move { serving.serve(listener).await });
        (server, url)
    }

    #[tokio::test]
    async fn test_connection_limit_holds_under_concurrent_connects() {
        let session = test_session();
        let config = ServerConfig { max_connections: 1, ..Default::default() };
        let (server, url) = start_server(config, session.clone()).await;

        let (a, b, c) = tokio::join!(
            connect_async(url.as_str()),
            connect_async(url.as_str()),
            connect_async(url.as_str()),
        );
        let mut admitted: Vec<_> = [a, b, c].into_iter().filter_map(Result::ok).map(|(ws, _)| ws).collect();
        assert_eq!(admitted.len(), 1);

        assert_eq!(next_message(&mut admitted[0]).await, DeviceMessage::Team { value: "blue".into() });
        assert_eq!(server.connection_count().await, 1);
        assert_eq!(session.snapshot().await.unwrap().player_count, 1);

        server.shutdown();
    }

    #[tokio::test]
    async fn test_closed_session_releases_device() {
        let (session, task) = spawn_session(SessionController::new(
            SessionConfig::default(),
            ChannelGateway::new(),
            TextDisplay::new(),
            HeadlessWorld::new(),
        ));
        session.shutdown().await.unwrap();
        task.await.unwrap();
        let (server, url) = start_server(ServerConfig::default(), session).await;

        let (mut ws, _) = connect_async(url.as_str()).await.unwrap();
        let next = tokio::time::timeout(Duration::from_secs(5), ws.next()).await.unwrap();
        assert!(!matches!(next, Some(Ok(Message::Text(_)))));

        for _ in 0..100 {
            if server.connection_count().await == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(server.connection_count().await, 0);

        server.shutdown();
    }
}
