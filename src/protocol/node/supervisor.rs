//! Responder supervisor built on top of [`Responder`].
//!
//! It drives reception, the housekeeping tick (heartbeat liveness and packet
//! stall detection) and queued commands from a single loop, and optionally
//! offers a handle (`ResponderHandle`) so other tasks can queue telemetry,
//! packets, or a bus switch.
//!
//! Firmware provides a pre-allocated [`embassy_sync::channel::Channel`] when it
//! needs the handle. Commands are executed between two frames, never during a
//! bus switch.

use core::fmt::Debug;
use core::future::pending;

use embassy_sync::{
    blocking_mutex::raw::CriticalSectionRawMutex,
    channel::{Channel, Sender},
};
use embassy_time::Duration;
use futures_util::{future::select, future::Either, pin_mut};

use crate::error::{NetworkError, ResponderHandleError, ResponderRunError};
use crate::protocol::node::hooks::ResponderHooks;
use crate::protocol::node::responder::{Responder, ResponderState};
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::packet::Packet;
use crate::protocol::transport::traits::can_bus::CanBus;
use crate::protocol::transport::traits::space_can_timer::SpaceCanTimer;
use crate::protocol::transport::MAX_FRAME_PAYLOAD;

/// Service assembling the supervisor components.
pub struct ResponderService<'a, C: CanBus, T: SpaceCanTimer, H: ResponderHooks, const CMD_CAP: usize>
where
    C::Error: Debug,
{
    responder: Responder<C, H>,
    timer: T,
    command_channel: Option<&'a Channel<CriticalSectionRawMutex, ResponderCommand, CMD_CAP>>,
}

impl<'a, C, T, H, const CMD_CAP: usize> ResponderService<'a, C, T, H, CMD_CAP>
where
    C: CanBus,
    C::Error: Debug,
    T: SpaceCanTimer,
    H: ResponderHooks,
{
    /// Wrap a responder. It must be started before the runner is driven.
    pub fn new(
        responder: Responder<C, H>,
        timer: T,
        command_channel: Option<&'a Channel<CriticalSectionRawMutex, ResponderCommand, CMD_CAP>>,
    ) -> Self {
        Self {
            responder,
            timer,
            command_channel,
        }
    }

    /// Split into handle/runner components.
    pub fn into_parts(self) -> ResponderServiceParts<'a, C, T, H, CMD_CAP> {
        let handle = self.command_channel.map(|channel| ResponderHandle {
            sender: channel.sender(),
        });
        ResponderServiceParts {
            handle,
            runner: ResponderRunner {
                responder: self.responder,
                timer: self.timer,
                command_channel: self.command_channel,
            },
        }
    }
}

/// Bundle returned by [`ResponderService::into_parts`].
pub struct ResponderServiceParts<'a, C, T, H, const CMD_CAP: usize>
where
    C: CanBus,
    C::Error: Debug,
    T: SpaceCanTimer,
    H: ResponderHooks,
{
    pub handle: Option<ResponderHandle<'a, CMD_CAP>>,
    pub runner: ResponderRunner<'a, C, T, H, CMD_CAP>,
}

/// What woke the runner.
enum RunnerEvent<E: Debug> {
    Tick,
    Frame(Result<CanFrame, NetworkError<E>>),
    Command(ResponderCommand),
}

/// Runner that drives the responder loop.
pub struct ResponderRunner<'a, C, T, H, const CMD_CAP: usize>
where
    C: CanBus,
    C::Error: Debug,
    T: SpaceCanTimer,
    H: ResponderHooks,
{
    responder: Responder<C, H>,
    timer: T,
    command_channel: Option<&'a Channel<CriticalSectionRawMutex, ResponderCommand, CMD_CAP>>,
}

impl<'a, C, T, H, const CMD_CAP: usize> ResponderRunner<'a, C, T, H, CMD_CAP>
where
    C: CanBus,
    C::Error: Debug,
    T: SpaceCanTimer,
    H: ResponderHooks,
{
    /// Run until a fatal error.
    ///
    /// A receive failure on the selected bus is only fatal without heartbeat
    /// monitoring; otherwise the bus is left alone until the next tick so the
    /// heartbeat consumer can fail over to the other bus.
    pub async fn drive(mut self) -> Result<(), ResponderRunError<C::Error>> {
        if self.responder.state() != ResponderState::Running {
            return Err(ResponderRunError::NotRunning);
        }

        let period_ms = self.responder.housekeeping_period().map(tick_millis);
        let monitored = self.responder.heartbeat().is_some();
        let command_channel = self.command_channel;

        loop {
            let tick = housekeeping_tick(&mut self.timer, period_ms);
            pin_mut!(tick);
            let mut bus_healthy = true;

            loop {
                let event = {
                    let frame = next_frame(&mut self.responder, bus_healthy);
                    let command = next_command(command_channel);
                    pin_mut!(frame);
                    pin_mut!(command);

                    match select(tick.as_mut(), select(frame, command)).await {
                        Either::Left(_) => RunnerEvent::Tick,
                        Either::Right((Either::Left((frame, _)), _)) => RunnerEvent::Frame(frame),
                        Either::Right((Either::Right((command, _)), _)) => {
                            RunnerEvent::Command(command)
                        }
                    }
                };

                match event {
                    RunnerEvent::Tick => {
                        self.responder.housekeeping_tick()?;
                        break;
                    }
                    RunnerEvent::Frame(Ok(frame)) => self.responder.frame_received(&frame),
                    RunnerEvent::Frame(Err(err)) => {
                        if !monitored {
                            return Err(err.into());
                        }
                        #[cfg(feature = "defmt")]
                        defmt::warn!(
                            "Receive failure on bus {}, waiting for heartbeat failover",
                            self.responder.selected_bus()
                        );
                        bus_healthy = false;
                    }
                    RunnerEvent::Command(command) => {
                        let switched = matches!(command, ResponderCommand::SwitchBus);
                        handle_command(&mut self.responder, command).await?;
                        if switched {
                            bus_healthy = true;
                        }
                    }
                }
            }
        }
    }

    pub fn responder(&self) -> &Responder<C, H> {
        &self.responder
    }
}

/// Whole milliseconds covering `period`; a tick never fires early.
fn tick_millis(period: Duration) -> u32 {
    period.as_micros().div_ceil(1000).clamp(1, u32::MAX as u64) as u32
}

async fn housekeeping_tick<T: SpaceCanTimer>(timer: &mut T, period_ms: Option<u32>) {
    match period_ms {
        Some(millis) => timer.delay_ms(millis).await,
        None => pending().await,
    }
}

async fn next_frame<C: CanBus, H: ResponderHooks>(
    responder: &mut Responder<C, H>,
    bus_healthy: bool,
) -> Result<CanFrame, NetworkError<C::Error>> {
    if !bus_healthy {
        return pending().await;
    }
    responder.next_frame().await
}

async fn next_command<const CMD_CAP: usize>(
    channel: Option<&Channel<CriticalSectionRawMutex, ResponderCommand, CMD_CAP>>,
) -> ResponderCommand {
    match channel {
        Some(channel) => channel.receive().await,
        None => pending().await,
    }
}

/// Transmission handle (optional).
pub struct ResponderHandle<'a, const CMD_CAP: usize> {
    sender: Sender<'a, CriticalSectionRawMutex, ResponderCommand, CMD_CAP>,
}

impl<'a, const CMD_CAP: usize> ResponderHandle<'a, CMD_CAP> {
    /// Queue one telemetry frame.
    pub async fn send_telemetry(&self, data: &[u8]) -> Result<(), ResponderHandleError> {
        if data.len() > MAX_FRAME_PAYLOAD {
            return Err(ResponderHandleError::PayloadTooLong { len: data.len() });
        }
        let mut payload = [0u8; MAX_FRAME_PAYLOAD];
        payload[..data.len()].copy_from_slice(data);

        self.sender
            .send(ResponderCommand::SendTelemetry {
                len: data.len(),
                payload,
            })
            .await;
        Ok(())
    }

    /// Queue a packet; its frames are sent back to back.
    pub async fn send_packet(&self, packet: Packet) {
        self.sender.send(ResponderCommand::SendPacket(packet)).await;
    }

    /// Queue an operator-requested bus switch.
    pub async fn switch_bus(&self) {
        self.sender.send(ResponderCommand::SwitchBus).await;
    }
}

/// Commands queued by producer tasks.
#[derive(Clone, Debug)]
pub enum ResponderCommand {
    SendTelemetry {
        len: usize,
        payload: [u8; MAX_FRAME_PAYLOAD],
    },
    SendPacket(Packet),
    SwitchBus,
}

async fn handle_command<C: CanBus, H: ResponderHooks>(
    responder: &mut Responder<C, H>,
    command: ResponderCommand,
) -> Result<(), ResponderRunError<C::Error>>
where
    C::Error: Debug,
{
    match command {
        ResponderCommand::SendTelemetry { len, payload } => {
            responder.send_telemetry(&payload[..len]).await?
        }
        ResponderCommand::SendPacket(packet) => responder.send_packet(&packet).await?,
        ResponderCommand::SwitchBus => {
            responder.switch_bus()?;
        }
    }
    Ok(())
}
