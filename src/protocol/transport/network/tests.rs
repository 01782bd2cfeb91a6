//! Network tests: binding, filters, bus selection, and switch ordering.
use super::*;
use alloc::collections::VecDeque;
use alloc::vec::Vec;
use futures_util::FutureExt;

/// Recording channel double; `recv` pops queued frames.
#[derive(Default)]
struct RecordingBus {
    bound_to: Option<String>,
    filters: Vec<CanFilter>,
    sent: Vec<CanFrame>,
    inbox: VecDeque<CanFrame>,
    refuse_connect: bool,
}

impl CanBus for RecordingBus {
    type Error = &'static str;

    fn connect(&mut self, channel: &str) -> Result<(), Self::Error> {
        if self.refuse_connect {
            return Err("no such device");
        }
        self.bound_to = Some(channel.into());
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), Self::Error> {
        self.bound_to = None;
        Ok(())
    }

    fn set_filters(&mut self, filters: &[CanFilter]) -> Result<(), Self::Error> {
        self.filters = filters.to_vec();
        Ok(())
    }

    async fn send<'a>(&'a mut self, frame: &'a CanFrame) -> Result<(), Self::Error> {
        if self.bound_to.is_none() {
            return Err("down");
        }
        self.sent.push(*frame);
        Ok(())
    }

    async fn recv(&mut self) -> Result<CanFrame, Self::Error> {
        self.inbox.pop_front().ok_or("empty")
    }
}

fn network() -> Network<RecordingBus> {
    Network::new(
        5,
        RecordingBus::default(),
        "can0",
        RecordingBus::default(),
        "can1",
    )
}

#[test]
/// Both channels are bound to their own interface with identical filters.
fn test_connect_binds_both_channels() {
    let mut network = network();
    network.connect().unwrap();

    assert!(network.is_connected());
    assert_eq!(network.channel_a.driver.bound_to.as_deref(), Some("can0"));
    assert_eq!(network.channel_b.driver.bound_to.as_deref(), Some("can1"));
    assert_eq!(network.channel_a.driver.filters, network.channel_b.driver.filters);
}

#[test]
/// Filters accept the broadcasts and only this node's telecommands.
fn test_receive_filters() {
    let filters = Network::<RecordingBus>::receive_filters(5);
    let accepts = |id: CanId| filters.iter().any(|f| f.matches(id));

    assert!(accepts(CanId::heartbeat()));
    assert!(accepts(CanId::sync()));
    assert!(accepts(CanId::scet()));
    assert!(accepts(CanId::utc()));
    assert!(accepts(CanId::telecommand(5)));
    assert!(!accepts(CanId::telecommand(6)));
    assert!(!accepts(CanId::telemetry(5)));
}

#[test]
/// A failure on bus B releases bus A again.
fn test_connect_failure_rolls_back() {
    let mut network = network();
    network.channel_b.driver.refuse_connect = true;

    let result = network.connect();
    assert!(matches!(result, Err(NetworkError::Connect(Bus::B, "no such device"))));
    assert!(!network.is_connected());
    assert!(network.channel_a.driver.bound_to.is_none());
}

#[test]
/// Starting requires a bound network.
fn test_start_requires_connect() {
    let mut network = network();
    assert!(matches!(network.start(), Err(NetworkError::NotConnected)));
    assert_eq!(network.active_bus(), None);

    network.connect().unwrap();
    network.start().unwrap();
    assert_eq!(network.active_bus(), Some(Bus::A));
}

#[test]
/// Switching alternates between the two buses and keeps reception active.
fn test_switch_alternates() {
    let mut network = network();
    network.connect().unwrap();
    network.start().unwrap();

    assert_eq!(network.switch_bus().unwrap(), Bus::B);
    assert_eq!(network.active_bus(), Some(Bus::B));
    assert_eq!(network.switch_bus().unwrap(), Bus::A);
    assert_eq!(network.active_bus(), Some(Bus::A));
}

#[test]
/// A switch while stopped only changes the selection.
fn test_switch_while_stopped() {
    let mut network = network();
    network.connect().unwrap();

    assert_eq!(network.switch_bus().unwrap(), Bus::B);
    assert_eq!(network.active_bus(), None);

    network.start().unwrap();
    assert_eq!(network.active_bus(), Some(Bus::B));
}

#[test]
/// Transmissions always go through the selected bus.
fn test_send_uses_selected_bus() {
    let mut network = network();
    network.connect().unwrap();
    network.start().unwrap();

    let frame = CanFrame::new(CanId::telemetry(5), &[1]);
    network.send(&frame).now_or_never().unwrap().unwrap();
    network.switch_bus().unwrap();
    network.send(&frame).now_or_never().unwrap().unwrap();
    network.send(&frame).now_or_never().unwrap().unwrap();

    assert_eq!(network.channel_a.driver.sent.len(), 1);
    assert_eq!(network.channel_b.driver.sent.len(), 2);
}

#[test]
/// Driver send failures are surfaced with the bus they happened on.
fn test_send_failure_propagates() {
    let mut network = network();
    network.connect().unwrap();
    network.channel_a.driver.bound_to = None;

    let frame = CanFrame::new(CanId::telemetry(5), &[1]);
    let result = network.send(&frame).now_or_never().unwrap();
    assert!(matches!(result, Err(NetworkError::Send(Bus::A, "down"))));
}

#[test]
/// Reception only reads the selected channel, and only while started.
fn test_recv_reads_selected_bus() {
    let mut network = network();
    network.connect().unwrap();
    let frame = CanFrame::new(CanId::sync(), &[]);
    network.channel_b.driver.inbox.push_back(frame);

    let stopped = network.recv().now_or_never().unwrap();
    assert!(matches!(stopped, Err(NetworkError::NotRunning)));

    network.start().unwrap();
    let on_a = network.recv().now_or_never().unwrap();
    assert!(matches!(on_a, Err(NetworkError::Receive(Bus::A, "empty"))));

    network.switch_bus().unwrap();
    let on_b = network.recv().now_or_never().unwrap().unwrap();
    assert_eq!(on_b, frame);
}

#[test]
fn test_disconnect_releases_both() {
    let mut network = network();
    network.connect().unwrap();
    network.start().unwrap();
    network.disconnect().unwrap();

    assert!(!network.is_connected());
    assert!(!network.is_receiving());
    assert!(network.channel_a.driver.bound_to.is_none());
    assert!(network.channel_b.driver.bound_to.is_none());
}
