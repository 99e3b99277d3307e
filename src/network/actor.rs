//! Session Actor
//!
//! Owns one [`SessionController`] on a dedicated task. Gateway events and
//! countdown ticks are funneled through a single loop, so every mutation of
//! the registry and roster runs to completion before the next one starts,
//! in arrival order.
//!
//! The countdown timer lives in the same loop. Events that arrive between two
//! ticks are processed before the next tick fires, and dropping the timer is
//! the only way to cancel it.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::core::ids::DeviceId;
use crate::game::avatar::GameWorld;
use crate::lobby::display::LobbyDisplay;
use crate::lobby::session::{LobbySnapshot, SessionController, SessionPhase};
use crate::network::gateway::{DeviceLinks, Gateway};
use crate::network::protocol::{DeviceMessage, GatewayEvent, SessionEvent};

/// Mailbox capacity for a session.
pub const SESSION_CHANNEL_BUFFER: usize = 256;

/// Interval between countdown ticks.
pub const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// The session task has stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("session {0} is closed")]
pub struct SessionClosed(pub Uuid);

/// Messages accepted by the session task.
#[derive(Debug)]
enum SessionCommand {
    /// Route outbound messages for a device before it is announced.
    Link {
        device: DeviceId,
        outbound: mpsc::Sender<DeviceMessage>,
    },
    /// A validated gateway event.
    Event(SessionEvent),
    /// Report the current state.
    Snapshot {
        respond_to: oneshot::Sender<LobbySnapshot>,
    },
    /// Stop the task.
    Shutdown,
}

/// Cloneable handle to a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionCommand>,
    session_id: Uuid,
}

impl SessionHandle {
    /// Session identifier.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Announce a new device whose outbound messages go to `outbound`.
    pub async fn connect(
        &self,
        device: DeviceId,
        outbound: mpsc::Sender<DeviceMessage>,
    ) -> Result<(), SessionClosed> {
        self.send(SessionCommand::Link { device, outbound }).await?;
        self.send(SessionCommand::Event(SessionEvent::Connect(device))).await
    }

    /// Validate and enqueue a raw gateway event.
    ///
    /// Events that carry nothing the session consumes are dropped here.
    pub async fn dispatch(&self, event: GatewayEvent) -> Result<(), SessionClosed> {
        let device = event.device();
        match SessionEvent::from_gateway(event) {
            Some(event) => self.send(SessionCommand::Event(event)).await,
            None => {
                debug!("Dropping state change without ready flag from {}", device);
                Ok(())
            }
        }
    }

    /// Fetch the current state.
    pub async fn snapshot(&self) -> Result<LobbySnapshot, SessionClosed> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::Snapshot { respond_to: tx }).await?;
        rx.await.map_err(|_| SessionClosed(self.session_id))
    }

    /// Ask the session task to stop. Any running countdown is cancelled.
    pub async fn shutdown(&self) -> Result<(), SessionClosed> {
        self.send(SessionCommand::Shutdown).await
    }

    async fn send(&self, command: SessionCommand) -> Result<(), SessionClosed> {
        self.sender
            .send(command)
            .await
            .map_err(|_| SessionClosed(self.session_id))
    }
}

/// Start the session task.
///
/// The task ends on [`SessionHandle::shutdown`] or when every handle is
/// dropped, and returns the controller for inspection.
pub fn spawn_session<G, D, W>(
    controller: SessionController<G, D, W>,
) -> (SessionHandle, JoinHandle<SessionController<G, D, W>>)
where
    G: Gateway + DeviceLinks + Send + 'static,
    D: LobbyDisplay + Send + 'static,
    W: GameWorld + Send + 'static,
{
    let (sender, receiver) = mpsc::channel(SESSION_CHANNEL_BUFFER);
    let session_id = controller.id();

    let actor = SessionActor {
        controller,
        receiver,
        countdown: None,
    };
    let task = tokio::spawn(actor.run());

    (SessionHandle { sender, session_id }, task)
}

struct SessionActor<G, D, W> {
    controller: SessionController<G, D, W>,
    receiver: mpsc::Receiver<SessionCommand>,
    countdown: Option<Interval>,
}

impl<G, D, W> SessionActor<G, D, W>
where
    G: Gateway + DeviceLinks,
    D: LobbyDisplay,
    W: GameWorld,
{
    #[instrument(skip(self), fields(session = %self.controller.id()))]
    async fn run(mut self) -> SessionController<G, D, W> {
        info!("Session task started");

        loop {
            tokio::select! {
                biased;

                command = self.receiver.recv() => {
                    match command {
                        Some(SessionCommand::Shutdown) | None => break,
                        Some(command) => self.apply(command),
                    }
                }
                _ = next_tick(&mut self.countdown) => {
                    let transition = self.controller.tick();
                    self.on_transition(transition);
                }
            }
        }

        if self.countdown.take().is_some() {
            info!("Countdown cancelled by shutdown");
        }
        info!("Session task stopped in {:?}", self.controller.phase());
        self.controller
    }

    fn apply(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Link { device, outbound } => {
                self.controller.gateway_mut().attach(device, outbound);
            }
            SessionCommand::Event(event) => {
                let left = match &event {
                    SessionEvent::Disconnect(device) => Some(*device),
                    _ => None,
                };

                let transition = self.controller.handle(event);
                self.on_transition(transition);

                if let Some(device) = left {
                    self.controller.gateway_mut().detach(device);
                }
            }
            SessionCommand::Snapshot { respond_to } => {
                let _ = respond_to.send(self.controller.snapshot());
            }
            SessionCommand::Shutdown => {}
        }
    }

    fn on_transition(&mut self, transition: Option<SessionPhase>) {
        match transition {
            Some(SessionPhase::CountingDown) => {
                let mut timer = interval(COUNTDOWN_TICK);
                timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
                self.countdown = Some(timer);
            }
            Some(SessionPhase::Started) => {
                self.countdown = None;
            }
            Some(SessionPhase::Lobby) | None => {}
        }
    }
}

/// Wait for the next countdown tick, or forever if no countdown is armed.
async fn next_tick(countdown: &mut Option<Interval>) {
    match countdown {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
