//! Network Layer
//!
//! Everything between controller devices and the lobby state machine:
//! wire format, the outbound gateway seam, the session task and the
//! WebSocket gateway server.

pub mod actor;
pub mod gateway;
pub mod protocol;
pub mod server;

pub use actor::{spawn_session, SessionClosed, SessionHandle};
pub use gateway::{ChannelGateway, DeviceLinks, Gateway, MemoryGateway, Outbound};
pub use protocol::{DeviceFrame, DeviceMessage, GatewayEvent, SessionEvent};
pub use server::{GameServer, GameServerError, ServerConfig};
