//! Messaging Gateway
//!
//! Outbound half of the controller gateway. The session addresses devices
//! through [`Gateway`]; delivery failures are the gateway's concern and never
//! surface to the session.

use std::collections::BTreeMap;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::core::ids::DeviceId;
use crate::network::protocol::DeviceMessage;

/// Outbound side of a messaging gateway.
pub trait Gateway {
    /// Send to one device.
    fn send(&mut self, device: DeviceId, message: DeviceMessage);

    /// Send to every connected device.
    fn broadcast(&mut self, message: DeviceMessage);
}

/// Gateways whose per-device delivery routes are managed by the session owner.
pub trait DeviceLinks {
    /// Route messages for `device` into `outbound`.
    fn attach(&mut self, device: DeviceId, outbound: mpsc::Sender<DeviceMessage>);

    /// Stop routing messages to `device`. Returns true if it was attached.
    fn detach(&mut self, device: DeviceId) -> bool;
}

/// A message as it left the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Point-to-point send.
    To(DeviceId, DeviceMessage),
    /// Broadcast.
    All(DeviceMessage),
}

/// Gateway that records every outbound message in order.
#[derive(Debug, Default, Clone)]
pub struct MemoryGateway {
    outbox: Vec<Outbound>,
}

impl MemoryGateway {
    /// Create an empty gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything sent so far.
    pub fn outbox(&self) -> &[Outbound] {
        &self.outbox
    }

    /// Broadcasts only, in order.
    pub fn broadcasts(&self) -> Vec<&DeviceMessage> {
        self.outbox
            .iter()
            .filter_map(|o| match o {
                Outbound::All(msg) => Some(msg),
                Outbound::To(..) => None,
            })
            .collect()
    }

    /// Messages addressed to `device`, in order.
    pub fn sent_to(&self, device: DeviceId) -> Vec<&DeviceMessage> {
        self.outbox
            .iter()
            .filter_map(|o| match o {
                Outbound::To(d, msg) if *d == device => Some(msg),
                _ => None,
            })
            .collect()
    }

    /// Drain the outbox.
    pub fn take(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.outbox)
    }
}

impl Gateway for MemoryGateway {
    fn send(&mut self, device: DeviceId, message: DeviceMessage) {
        self.outbox.push(Outbound::To(device, message));
    }

    fn broadcast(&mut self, message: DeviceMessage) {
        self.outbox.push(Outbound::All(message));
    }
}

// =============================================================================
// CHANNEL GATEWAY
// =============================================================================

/// Gateway that hands messages to per-device channels.
///
/// Each connection task owns the receiving end and writes to its socket.
#[derive(Debug, Default)]
pub struct ChannelGateway {
    devices: BTreeMap<DeviceId, mpsc::Sender<DeviceMessage>>,
}

impl ChannelGateway {
    /// Create a gateway with no devices.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of attached devices.
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    fn deliver(device: DeviceId, sender: &mpsc::Sender<DeviceMessage>, message: DeviceMessage) {
        match sender.try_send(message) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(msg)) => {
                warn!("Outbound queue full for {}, dropping {:?}", device, msg);
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("{} already closed", device);
            }
        }
    }
}

impl DeviceLinks for ChannelGateway {
    fn attach(&mut self, device: DeviceId, outbound: mpsc::Sender<DeviceMessage>) {
        self.devices.insert(device, outbound);
    }

    fn detach(&mut self, device: DeviceId) -> bool {
        self.devices.remove(&device).is_some()
    }
}

impl Gateway for ChannelGateway {
    fn send(&mut self, device: DeviceId, message: DeviceMessage) {
        match self.devices.get(&device) {
            Some(sender) => Self::deliver(device, sender, message),
            None => debug!("No channel for {}, dropping {:?}", device, message),
        }
    }

    fn broadcast(&mut self, message: DeviceMessage) {
        for (device, sender) in &self.devices {
            Self::deliver(*device, sender, message.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_gateway_records_in_order() {
        let mut gateway = MemoryGateway::new();
        gateway.send(DeviceId(1), DeviceMessage::Team { value: "blue".into() });
        gateway.broadcast(DeviceMessage::Lock);

        assert_eq!(gateway.outbox().len(), 2);
        assert_eq!(gateway.broadcasts(), vec![&DeviceMessage::Lock]);
        assert_eq!(gateway.sent_to(DeviceId(1)).len(), 1);
        assert!(gateway.sent_to(DeviceId(2)).is_empty());

        assert_eq!(gateway.take().len(), 2);
        assert!(gateway.outbox().is_empty());
    }

    #[tokio::test]
    async fn test_channel_gateway_routes_messages() {
        let mut gateway = ChannelGateway::new();
        let (tx1, mut rx1) = mpsc::channel(4);
        let (tx2, mut rx2) = mpsc::channel(4);
        gateway.attach(DeviceId(1), tx1);
        gateway.attach(DeviceId(2), tx2);

        gateway.send(DeviceId(2), DeviceMessage::Team { value: "green".into() });
        gateway.broadcast(DeviceMessage::Start);

        assert_eq!(rx1.recv().await, Some(DeviceMessage::Start));
        assert_eq!(rx2.recv().await, Some(DeviceMessage::Team { value: "green".into() }));
        assert_eq!(rx2.recv().await, Some(DeviceMessage::Start));

        assert!(gateway.detach(DeviceId(1)));
        assert_eq!(gateway.device_count(), 1);
    }

    #[test]
    fn test_channel_gateway_drops_when_full() {
        let mut gateway = ChannelGateway::new();
        let (tx, _rx) = mpsc::channel(1);
        gateway.attach(DeviceId(1), tx);

        gateway.send(DeviceId(1), DeviceMessage::Lock);
        // Second message does not fit and must not panic
        gateway.send(DeviceId(1), DeviceMessage::Start);
        gateway.send(DeviceId(7), DeviceMessage::Start);
    }
}
