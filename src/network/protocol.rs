//! Protocol Messages
//!
//! Wire format between controller devices and the session.
//! Inbound payloads arrive as loosely-typed JSON and are validated here into
//! [`SessionEvent`]s; nothing past this module sees a `serde_json::Value`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::ids::DeviceId;
use crate::game::input::ControllerInput;
use crate::lobby::error::LobbyError;

/// Field of the custom device state carrying readiness.
pub const READY_FIELD: &str = "isPlayerReady";

// =============================================================================
// SESSION -> DEVICE MESSAGES
// =============================================================================

/// Messages sent from the session to controller devices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceMessage {
    /// Team color assigned to the receiving device.
    Team {
        /// Team color label.
        value: String,
    },

    /// Readiness is frozen; a countdown is about to run.
    Lock,

    /// Seconds remaining before the game starts.
    Countdown {
        /// Seconds remaining.
        value: u32,
    },

    /// The game has started.
    Start,
}

impl DeviceMessage {
    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

// =============================================================================
// GATEWAY -> SESSION EVENTS
// =============================================================================

/// Raw events as delivered by a messaging gateway.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayEvent {
    /// A device connected.
    Connect(DeviceId),
    /// A device disconnected.
    Disconnect(DeviceId),
    /// A device published new custom state.
    CustomDeviceStateChange(DeviceId, Value),
    /// A device sent a message.
    Message(DeviceId, Value),
}

impl GatewayEvent {
    /// Device the event concerns.
    pub fn device(&self) -> DeviceId {
        match self {
            GatewayEvent::Connect(d)
            | GatewayEvent::Disconnect(d)
            | GatewayEvent::CustomDeviceStateChange(d, _)
            | GatewayEvent::Message(d, _) => *d,
        }
    }
}

/// Validated events consumed by the session controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A device connected.
    Connect(DeviceId),
    /// A device disconnected.
    Disconnect(DeviceId),
    /// A device reported its ready flag.
    ///
    /// `Err` carries an unparsable value; the flag must be left as is.
    ReadyChanged {
        /// Reporting device.
        device: DeviceId,
        /// Parsed flag.
        ready: Result<bool, LobbyError>,
    },
    /// Per-tick controller input.
    Input {
        /// Sending device.
        device: DeviceId,
        /// Normalized button state.
        input: ControllerInput,
    },
}

impl SessionEvent {
    /// Validate a gateway event.
    ///
    /// Returns `None` for state changes that do not carry a ready flag.
    pub fn from_gateway(event: GatewayEvent) -> Option<Self> {
        match event {
            GatewayEvent::Connect(device) => Some(SessionEvent::Connect(device)),
            GatewayEvent::Disconnect(device) => Some(SessionEvent::Disconnect(device)),
            GatewayEvent::CustomDeviceStateChange(device, data) => {
                parse_ready(&data).map(|ready| SessionEvent::ReadyChanged { device, ready })
            }
            GatewayEvent::Message(device, data) => Some(SessionEvent::Input {
                device,
                input: ControllerInput::from_payload(&data),
            }),
        }
    }
}

/// Extract the ready flag from a custom device state payload.
///
/// Accepts JSON booleans and the strings `"true"`/`"false"` in any case with
/// surrounding whitespace. Returns `None` when the field is absent or null.
pub fn parse_ready(data: &Value) -> Option<Result<bool, LobbyError>> {
    let field = data.get(READY_FIELD)?;

    let parsed = match field {
        Value::Null => return None,
        Value::Bool(b) => Ok(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(LobbyError::MalformedPayload(format!(
                "{} = {:?}",
                READY_FIELD, s
            ))),
        },
        other => Err(LobbyError::MalformedPayload(format!(
            "{} = {}",
            READY_FIELD, other
        ))),
    };

    Some(parsed)
}

// =============================================================================
// WEBSOCKET FRAMES
// =============================================================================

/// Text frame sent by a controller over the WebSocket gateway.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum DeviceFrame {
    /// Replace the device's custom state.
    CustomDeviceState(Value),
    /// Send a message to the session.
    Message(Value),
}

impl DeviceFrame {
    /// Deserialize from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Attach the sending device.
    pub fn into_gateway_event(self, device: DeviceId) -> GatewayEvent {
        match self {
            DeviceFrame::CustomDeviceState(data) => GatewayEvent::CustomDeviceStateChange(device, data),
            DeviceFrame::Message(data) => GatewayEvent::Message(device, data),
        }
    }
}
