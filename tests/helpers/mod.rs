// Test doubles simulating the two CAN channels, the timer and the
// application hooks during integration tests.
use spacecan::protocol::node::hooks::{ResponderHooks, TelecommandMode};
use spacecan::protocol::transport::{
    can_frame::CanFrame,
    can_id::{CanFilter, CanId},
    network::Bus,
    traits::{can_bus::CanBus, space_can_timer::SpaceCanTimer},
};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)]
pub enum MockError {
    Refused,
    Closed,
}

#[derive(Default)]
#[allow(dead_code)]
/// Driver-side state shared with the host probe.
pub struct ChannelState {
    pub bound_to: Option<String>,
    pub filters: Vec<CanFilter>,
    pub sent: Vec<CanFrame>,
    pub fail_connect: bool,
    pub fail_send: bool,
}

/// In-memory CAN channel reproducing the `CanBus` trait behavior, including
/// acceptance filtering.
pub struct MockChannel {
    state: Arc<Mutex<ChannelState>>,
    rx: mpsc::UnboundedReceiver<CanFrame>,
}

#[derive(Clone)]
#[allow(dead_code)]
/// Host side of a mock channel: injects frames and inspects the driver.
pub struct ChannelProbe {
    state: Arc<Mutex<ChannelState>>,
    tx: mpsc::UnboundedSender<CanFrame>,
}

#[allow(dead_code)]
impl MockChannel {
    /// Construct a channel and its host probe.
    pub fn create() -> (Self, ChannelProbe) {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = Arc::new(Mutex::new(ChannelState::default()));
        (
            Self {
                state: state.clone(),
                rx,
            },
            ChannelProbe { state, tx },
        )
    }
}

impl CanBus for MockChannel {
    type Error = MockError;

    fn connect(&mut self, channel: &str) -> Result<(), Self::Error> {
        let mut state = self.state.lock().unwrap();
        if state.fail_connect {
            return Err(MockError::Refused);
        }
        state.bound_to = Some(channel.to_string());
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), Self::Error> {
        let mut state = self.state.lock().unwrap();
        state.bound_to = None;
        state.filters.clear();
        Ok(())
    }

    fn set_filters(&mut self, filters: &[CanFilter]) -> Result<(), Self::Error> {
        self.state.lock().unwrap().filters = filters.to_vec();
        Ok(())
    }

    async fn send<'a>(&'a mut self, frame: &'a CanFrame) -> Result<(), Self::Error> {
        let mut state = self.state.lock().unwrap();
        if state.fail_send {
            return Err(MockError::Refused);
        }
        state.sent.push(*frame);
        Ok(())
    }

    async fn recv<'a>(&'a mut self) -> Result<CanFrame, Self::Error> {
        loop {
            let frame = self.rx.recv().await.ok_or(MockError::Closed)?;
            let accepted = self
                .state
                .lock()
                .unwrap()
                .filters
                .iter()
                .any(|filter| filter.matches(frame.id));
            if accepted {
                return Ok(frame);
            }
        }
    }
}

#[allow(dead_code)]
impl ChannelProbe {
    /// Put a frame on the wire.
    pub fn inject(&self, id: CanId, payload: &[u8]) {
        self.tx.send(CanFrame::new(id, payload)).unwrap();
    }

    pub fn sent(&self) -> Vec<CanFrame> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn bound_to(&self) -> Option<String> {
        self.state.lock().unwrap().bound_to.clone()
    }

    pub fn filters(&self) -> Vec<CanFilter> {
        self.state.lock().unwrap().filters.clone()
    }

    pub fn set_fail_connect(&self, fail: bool) {
        self.state.lock().unwrap().fail_connect = fail;
    }

    pub fn set_fail_send(&self, fail: bool) {
        self.state.lock().unwrap().fail_send = fail;
    }
}

/// Timer based on `tokio::time::sleep` to drive housekeeping in tests.
#[allow(dead_code)]
pub struct MockTimer;

impl SpaceCanTimer for MockTimer {
    async fn delay_ms<'a>(&'a mut self, millis: u32) {
        sleep(Duration::from_millis(millis as u64)).await;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(dead_code)]
pub enum HookEvent {
    Heartbeat,
    Sync,
    Scet(Vec<u8>),
    Utc(Vec<u8>),
    Telecommand(Vec<u8>),
    Packet(Vec<u8>, u8),
    BusSwitch(Bus),
}

/// Hooks recording every callback, observable while a runner owns them.
#[derive(Clone, Default)]
#[allow(dead_code)]
pub struct RecordingHooks {
    pub mode: TelecommandMode,
    events: Arc<Mutex<Vec<HookEvent>>>,
}

#[allow(dead_code)]
impl RecordingHooks {
    pub fn packets() -> Self {
        Self {
            mode: TelecommandMode::Packet,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<HookEvent> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: HookEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl ResponderHooks for RecordingHooks {
    fn telecommand_mode(&self) -> TelecommandMode {
        self.mode
    }

    fn received_heartbeat(&mut self) {
        self.record(HookEvent::Heartbeat);
    }

    fn received_sync(&mut self) {
        self.record(HookEvent::Sync);
    }

    fn received_scet(&mut self, data: &[u8]) {
        self.record(HookEvent::Scet(data.to_vec()));
    }

    fn received_utc(&mut self, data: &[u8]) {
        self.record(HookEvent::Utc(data.to_vec()));
    }

    fn received_telecommand(&mut self, data: &[u8]) {
        self.record(HookEvent::Telecommand(data.to_vec()));
    }

    fn received_packet(&mut self, data: &[u8], node_id: u8) {
        self.record(HookEvent::Packet(data.to_vec(), node_id));
    }

    fn on_bus_switch(&mut self, bus: Bus) {
        self.record(HookEvent::BusSwitch(bus));
    }
}
