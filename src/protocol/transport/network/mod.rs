//! Redundant dual-channel network: owns bus A and bus B, keeps exactly one of
//! them selected, and routes every reception and transmission through it.
use alloc::string::String;

use crate::error::NetworkError;
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::can_id::{CanFilter, CanId};
use crate::protocol::transport::traits::can_bus::CanBus;

//==================================================================================BUS
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// One of the two redundant physical channels.
pub enum Bus {
    A,
    B,
}

impl Bus {
    /// The redundant counterpart.
    pub const fn other(self) -> Self {
        match self {
            Bus::A => Bus::B,
            Bus::B => Bus::A,
        }
    }
}

//==================================================================================NETWORK
/// Channel handle paired with the interface name it binds to.
struct Channel<C> {
    name: String,
    driver: C,
}

/// Dual-channel network.
///
/// Reception starts on bus A unless a switch happened before `start`.
/// Frames are pulled by the owner through [`Network::recv`]; nothing is read
/// from the unselected channel.
pub struct Network<C: CanBus> {
    node_id: u8,
    channel_a: Channel<C>,
    channel_b: Channel<C>,
    selected: Bus,
    connected: bool,
    receiving: bool,
}

impl<C: CanBus> Network<C> {
    pub fn new(
        node_id: u8,
        channel_a: C,
        channel_a_name: impl Into<String>,
        channel_b: C,
        channel_b_name: impl Into<String>,
    ) -> Self {
        Self {
            node_id,
            channel_a: Channel {
                name: channel_a_name.into(),
                driver: channel_a,
            },
            channel_b: Channel {
                name: channel_b_name.into(),
                driver: channel_b,
            },
            selected: Bus::A,
            connected: false,
            receiving: false,
        }
    }

    /// Filters accepted by a responder: the four broadcasts plus telecommands
    /// addressed to `node_id`.
    pub const fn receive_filters(node_id: u8) -> [CanFilter; 5] {
        [
            CanFilter::exact(CanId::heartbeat()),
            CanFilter::exact(CanId::sync()),
            CanFilter::exact(CanId::scet()),
            CanFilter::exact(CanId::utc()),
            CanFilter::exact(CanId::telecommand(node_id)),
        ]
    }

    /// Bind both channels and install the receive filters on each.
    ///
    /// If bus B fails, bus A is released again so the network stays unbound.
    pub fn connect(&mut self) -> Result<(), NetworkError<C::Error>> {
        let filters = Self::receive_filters(self.node_id);

        Self::bind(&mut self.channel_a, Bus::A, &filters)?;
        if let Err(err) = Self::bind(&mut self.channel_b, Bus::B, &filters) {
            self.channel_a.driver.disconnect().ok();
            return Err(err);
        }

        #[cfg(feature = "defmt")]
        defmt::info!("Network connected for node {}", self.node_id);

        self.connected = true;
        Ok(())
    }

    fn bind(
        channel: &mut Channel<C>,
        bus: Bus,
        filters: &[CanFilter],
    ) -> Result<(), NetworkError<C::Error>> {
        channel
            .driver
            .connect(&channel.name)
            .map_err(|e| NetworkError::Connect(bus, e))?;
        channel
            .driver
            .set_filters(filters)
            .map_err(|e| NetworkError::Filter(bus, e))
    }

    /// Tear down both channels. Both are released even if the first one fails;
    /// the first error is reported.
    pub fn disconnect(&mut self) -> Result<(), NetworkError<C::Error>> {
        self.receiving = false;
        self.connected = false;

        let result_a = self
            .channel_a
            .driver
            .disconnect()
            .map_err(|e| NetworkError::Disconnect(Bus::A, e));
        let result_b = self
            .channel_b
            .driver
            .disconnect()
            .map_err(|e| NetworkError::Disconnect(Bus::B, e));

        result_a.and(result_b)
    }

    /// Begin reception on the selected bus.
    pub fn start(&mut self) -> Result<(), NetworkError<C::Error>> {
        if !self.connected {
            return Err(NetworkError::NotConnected);
        }
        self.receiving = true;
        Ok(())
    }

    /// Halt reception on the selected bus. The channel binding is kept.
    pub fn stop(&mut self) {
        self.receiving = false;
    }

    /// Stop, flip to the other bus, and restart if reception was active.
    ///
    /// Returns the newly selected bus.
    pub fn switch_bus(&mut self) -> Result<Bus, NetworkError<C::Error>> {
        let was_receiving = self.receiving;
        if was_receiving {
            self.stop();
        }

        self.selected = self.selected.other();

        if was_receiving {
            self.start()?;
        }

        #[cfg(feature = "defmt")]
        defmt::warn!("Bus switched to {}", self.selected);

        Ok(self.selected)
    }

    /// Transmit on the selected bus. Driver failures are propagated as-is,
    /// never retried here.
    pub async fn send(&mut self, frame: &CanFrame) -> Result<(), NetworkError<C::Error>> {
        if !self.connected {
            return Err(NetworkError::NotConnected);
        }
        let bus = self.selected;
        self.driver_mut(bus)
            .send(frame)
            .await
            .map_err(|e| NetworkError::Send(bus, e))
    }

    /// Wait for the next frame on the selected bus.
    pub async fn recv(&mut self) -> Result<CanFrame, NetworkError<C::Error>> {
        if !self.receiving {
            return Err(NetworkError::NotRunning);
        }
        let bus = self.selected;
        self.driver_mut(bus)
            .recv()
            .await
            .map_err(|e| NetworkError::Receive(bus, e))
    }

    /// Currently selected bus, whether or not reception is active.
    pub fn selected_bus(&self) -> Bus {
        self.selected
    }

    /// Bus being listened to, `None` while stopped.
    pub fn active_bus(&self) -> Option<Bus> {
        self.receiving.then_some(self.selected)
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn is_receiving(&self) -> bool {
        self.receiving
    }

    /// Interface name bound to `bus`.
    pub fn channel_name(&self, bus: Bus) -> &str {
        match bus {
            Bus::A => &self.channel_a.name,
            Bus::B => &self.channel_b.name,
        }
    }

    fn driver_mut(&mut self, bus: Bus) -> &mut C {
        match bus {
            Bus::A => &mut self.channel_a.driver,
            Bus::B => &mut self.channel_b.driver,
        }
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
