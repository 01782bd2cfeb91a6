//! Application callbacks invoked by the responder's frame dispatch.
//!
//! Every method has a no-op default, so an implementation only overrides the
//! events it cares about. Hooks run synchronously inside dispatch: a slow hook
//! delays every subsequent frame on the bus.
use crate::protocol::transport::network::Bus;

/// How telecommand frames addressed to this node are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TelecommandMode {
    /// Each frame is a complete command, passed to `received_telecommand`.
    #[default]
    Frame,
    /// Frames are fragments reassembled into packets, passed to `received_packet`.
    Packet,
}

/// Callbacks for the events a responder reacts to.
pub trait ResponderHooks {
    /// Telecommand delivery path used by this deployment.
    fn telecommand_mode(&self) -> TelecommandMode {
        TelecommandMode::Frame
    }

    /// Controller heartbeat observed.
    fn received_heartbeat(&mut self) {}

    /// SYNC broadcast.
    fn received_sync(&mut self) {}

    /// Spacecraft elapsed time broadcast, raw frame payload.
    fn received_scet(&mut self, _data: &[u8]) {}

    /// UTC time broadcast, raw frame payload.
    fn received_utc(&mut self, _data: &[u8]) {}

    /// Single-frame telecommand (`TelecommandMode::Frame`).
    fn received_telecommand(&mut self, _data: &[u8]) {}

    /// Reassembled packet (`TelecommandMode::Packet`) and the node id it was
    /// addressed to.
    fn received_packet(&mut self, _data: &[u8], _node_id: u8) {}

    /// The network now listens and transmits on `bus`.
    fn on_bus_switch(&mut self, _bus: Bus) {}
}

/// Responder without application callbacks.
impl ResponderHooks for () {}
