//! SpaceCAN responder: node identity, lifecycle, frame dispatch, and the
//! telemetry API.
//!
//! Lifecycle:
//!
//! ```text
//! Disconnected --connect--> Connected --start--> Running
//!      ^                      |   ^                 |
//!      +-----disconnect-------+   +------stop-------+
//! ```
use crate::{
    config::ResponderConfig,
    error::{ConfigError, NetworkError, ResponderError},
    protocol::{
        node::{
            heartbeat::{HeartbeatConsumer, HeartbeatEvent},
            hooks::{ResponderHooks, TelecommandMode},
        },
        transport::{
            can_frame::CanFrame,
            can_id::CanId,
            network::{Bus, Network},
            packet::{assembler::PacketAssembler, Packet},
            traits::can_bus::CanBus,
            ID_HEARTBEAT, ID_SCET, ID_SYNC, ID_TC, ID_UTC, MAX_FRAME_PAYLOAD,
        },
    },
};
use embassy_time::Duration;

#[cfg(feature = "defmt")]
use crate::protocol::transport::packet::assembler::StallCheck;

/// Lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResponderState {
    Disconnected,
    /// Channels bound, reception halted.
    Connected,
    Running,
}

/// Responder node.
pub struct Responder<C: CanBus, H: ResponderHooks> {
    /// Own node id, `1..=127`.
    node_id: u8,
    /// Redundant bus pair.
    network: Network<C>,
    /// Present only when a heartbeat period is configured.
    heartbeat: Option<HeartbeatConsumer>,
    /// Single-slot reassembly for packet telecommands.
    assembler: PacketAssembler,
    /// Application callbacks.
    hooks: H,
    state: ResponderState,
    /// Period of the runner's housekeeping tick.
    housekeeping_period: Option<Duration>,
}

impl<C: CanBus, H: ResponderHooks> Responder<C, H>
where
    C::Error: core::fmt::Debug,
{
    /// Validate `config` and build a disconnected responder.
    ///
    /// Fails immediately on an invalid node id, an unsupported interface, or
    /// invalid timing values.
    pub fn new(
        config: &ResponderConfig,
        channel_a: C,
        channel_b: C,
        hooks: H,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let heartbeat = config.heartbeat_settings().map(HeartbeatConsumer::new);
        let heartbeat_period = heartbeat.as_ref().map(HeartbeatConsumer::period);
        let stall_timeout = config.packet_stall_timeout();

        // Housekeeping follows the heartbeat period; the stall timeout is
        // rounded up to a whole number of periods.
        let housekeeping_period = heartbeat_period.or(stall_timeout);
        let assembler = match (stall_timeout, housekeeping_period) {
            (Some(timeout), Some(period)) => {
                let ticks = timeout.as_ticks().div_ceil(period.as_ticks().max(1));
                PacketAssembler::with_stall_limit(ticks.clamp(1, u32::MAX as u64) as u32)
            }
            _ => PacketAssembler::new(),
        };

        let network = Network::new(
            config.node_id,
            channel_a,
            config.channel_a.clone(),
            channel_b,
            config.channel_b.clone(),
        );

        Ok(Self {
            node_id: config.node_id,
            network,
            heartbeat,
            assembler,
            hooks,
            state: ResponderState::Disconnected,
            housekeeping_period,
        })
    }

    /// Load the configuration from a JSON file and build the responder.
    #[cfg(feature = "std")]
    pub fn from_file(
        path: impl AsRef<std::path::Path>,
        channel_a: C,
        channel_b: C,
        hooks: H,
    ) -> Result<Self, ConfigError> {
        let config = ResponderConfig::from_file(path)?;
        Self::new(&config, channel_a, channel_b, hooks)
    }

    //==================================================================================Lifecycle
    /// Bind both channels with this node's receive filters.
    pub fn connect(&mut self) -> Result<(), ResponderError<C::Error>> {
        self.expect_state(ResponderState::Disconnected, "connect")?;
        self.network.connect()?;
        self.state = ResponderState::Connected;

        #[cfg(feature = "defmt")]
        defmt::info!("Responder {} connected", self.node_id);
        Ok(())
    }

    /// Start reception, then heartbeat monitoring.
    pub fn start(&mut self) -> Result<(), ResponderError<C::Error>> {
        self.expect_state(ResponderState::Connected, "start")?;
        self.network.start()?;
        if let Some(heartbeat) = &mut self.heartbeat {
            heartbeat.start();
        }
        self.state = ResponderState::Running;

        #[cfg(feature = "defmt")]
        defmt::info!("Responder {} running on bus {}", self.node_id, self.network.selected_bus());
        Ok(())
    }

    /// Stop heartbeat monitoring, then reception.
    pub fn stop(&mut self) -> Result<(), ResponderError<C::Error>> {
        self.expect_state(ResponderState::Running, "stop")?;
        if let Some(heartbeat) = &mut self.heartbeat {
            heartbeat.stop();
        }
        self.network.stop();
        self.state = ResponderState::Connected;
        Ok(())
    }

    /// Release both channels. Any partial packet is dropped.
    pub fn disconnect(&mut self) -> Result<(), ResponderError<C::Error>> {
        self.expect_state(ResponderState::Connected, "disconnect")?;
        self.assembler.reset();
        self.state = ResponderState::Disconnected;
        self.network.disconnect()?;

        #[cfg(feature = "defmt")]
        defmt::info!("Responder {} disconnected", self.node_id);
        Ok(())
    }

    fn expect_state(
        &self,
        expected: ResponderState,
        operation: &'static str,
    ) -> Result<(), ResponderError<C::Error>> {
        if self.state == expected {
            Ok(())
        } else {
            Err(ResponderError::InvalidState {
                state: self.state,
                operation,
            })
        }
    }

    //==================================================================================Bus switch
    /// Stop the network, flip to the other bus, restart it, and notify
    /// `on_bus_switch`.
    ///
    /// Takes `&mut self`, so no transmission can overlap the switch.
    pub fn switch_bus(&mut self) -> Result<Bus, ResponderError<C::Error>> {
        if self.state == ResponderState::Disconnected {
            return Err(ResponderError::InvalidState {
                state: self.state,
                operation: "switch bus",
            });
        }
        let bus = self.network.switch_bus()?;
        self.hooks.on_bus_switch(bus);
        Ok(bus)
    }

    //==================================================================================Dispatch
    /// Route one inbound frame to the matching hook.
    ///
    /// Frames outside the accepted set (including telecommands for other nodes)
    /// are dropped silently.
    pub fn frame_received(&mut self, frame: &CanFrame) {
        let func_id = frame.func_id();
        let node_id = frame.node_id();

        match func_id {
            ID_HEARTBEAT => {
                if let Some(heartbeat) = &mut self.heartbeat {
                    heartbeat.received();
                }
                self.hooks.received_heartbeat();
            }
            ID_SYNC => self.hooks.received_sync(),
            ID_SCET => self.hooks.received_scet(frame.payload()),
            ID_UTC => self.hooks.received_utc(frame.payload()),
            ID_TC if node_id == self.node_id => match self.hooks.telecommand_mode() {
                TelecommandMode::Frame => self.hooks.received_telecommand(frame.payload()),
                TelecommandMode::Packet => {
                    if let Some(packet) = self.assembler.process_frame(frame) {
                        self.hooks.received_packet(packet.as_bytes(), node_id);
                    }
                }
            },
            _ => {
                #[cfg(feature = "defmt")]
                defmt::trace!("Dropping frame {:#X}", frame.id.raw());
            }
        }
    }

    /// Wait for the next frame on the selected bus.
    pub async fn next_frame(&mut self) -> Result<CanFrame, NetworkError<C::Error>> {
        self.network.recv().await
    }

    //==================================================================================Housekeeping
    /// One housekeeping period elapsed: evaluate heartbeat liveness (switching
    /// buses when required) and age the partial packet.
    pub fn housekeeping_tick(&mut self) -> Result<Option<HeartbeatEvent>, ResponderError<C::Error>> {
        let event = self.heartbeat.as_mut().map(HeartbeatConsumer::tick);

        match event {
            Some(HeartbeatEvent::SwitchBus) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Heartbeat lost, switching bus");
                self.switch_bus()?;
            }
            Some(HeartbeatEvent::Exhausted) => {
                #[cfg(feature = "defmt")]
                defmt::error!("Heartbeat lost and bus switch budget exhausted");
            }
            #[cfg(feature = "defmt")]
            Some(HeartbeatEvent::Missed { count }) => {
                defmt::debug!("Heartbeat missed ({})", count);
            }
            _ => {}
        }

        match self.assembler.tick() {
            #[cfg(feature = "defmt")]
            StallCheck::Discarded { bytes } => {
                defmt::warn!("Discarding stalled packet ({} bytes)", bytes);
            }
            _ => {}
        }

        Ok(event)
    }

    /// Period at which `housekeeping_tick` must be called, `None` when neither
    /// heartbeat monitoring nor a stall timeout is configured.
    pub fn housekeeping_period(&self) -> Option<Duration> {
        self.housekeeping_period
    }

    //==================================================================================Telemetry
    /// Send up to eight bytes as one telemetry frame from this node.
    pub async fn send_telemetry(&mut self, data: &[u8]) -> Result<(), ResponderError<C::Error>> {
        if data.len() > MAX_FRAME_PAYLOAD {
            return Err(ResponderError::PayloadTooLong { len: data.len() });
        }
        if self.state == ResponderState::Disconnected {
            return Err(ResponderError::InvalidState {
                state: self.state,
                operation: "send telemetry",
            });
        }
        let frame = CanFrame::new(CanId::telemetry(self.node_id), data);
        self.network.send(&frame).await?;
        Ok(())
    }

    /// Split `packet` and send every chunk as telemetry, in order. The first
    /// failing frame aborts the packet.
    pub async fn send_packet(&mut self, packet: &Packet) -> Result<(), ResponderError<C::Error>> {
        for chunk in packet.split() {
            self.send_telemetry(chunk.as_slice()).await?;
        }
        Ok(())
    }

    //==================================================================================Accessors
    pub fn node_id(&self) -> u8 {
        self.node_id
    }

    pub fn state(&self) -> ResponderState {
        self.state
    }

    pub fn selected_bus(&self) -> Bus {
        self.network.selected_bus()
    }

    pub fn network(&self) -> &Network<C> {
        &self.network
    }

    /// Heartbeat consumer, `None` when monitoring is disabled.
    pub fn heartbeat(&self) -> Option<&HeartbeatConsumer> {
        self.heartbeat.as_ref()
    }

    /// Mutable heartbeat consumer, e.g. to reset the switch budget.
    pub fn heartbeat_mut(&mut self) -> Option<&mut HeartbeatConsumer> {
        self.heartbeat.as_mut()
    }

    pub fn assembler(&self) -> &PacketAssembler {
        &self.assembler
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }
}
