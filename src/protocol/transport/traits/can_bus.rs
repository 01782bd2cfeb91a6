//! Minimal abstraction for one asynchronous CAN bus channel. Allows the
//! library to plug into various implementations (socket driver, embedded HAL,
//! in-memory test double, etc.).
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::can_id::CanFilter;
use futures_util::Future;

/// Contract to bind, filter, send and receive on a single CAN channel.
///
/// The network owns two of these (bus A and bus B) and only polls the
/// selected one.
pub trait CanBus {
    type Error: core::fmt::Debug;
    /// Bind the driver to the named channel (e.g. `"can0"`).
    fn connect(&mut self, channel: &str) -> Result<(), Self::Error>;
    /// Release the channel.
    fn disconnect(&mut self) -> Result<(), Self::Error>;
    /// Replace the acceptance filters; frames matching none of them are
    /// dropped by the driver.
    fn set_filters(&mut self, filters: &[CanFilter]) -> Result<(), Self::Error>;
    /// Emit a frame on the bus. Asynchronous to accommodate non-blocking drivers.
    fn send<'a>(
        &'a mut self,
        frame: &'a CanFrame,
    ) -> impl Future<Output = Result<(), Self::Error>> + 'a;
    /// Retrieve the next available frame. Asynchronously waits until data arrives.
    fn recv<'a>(
        &'a mut self,
    ) -> impl core::future::Future<Output = Result<CanFrame, Self::Error>> + 'a;
}
