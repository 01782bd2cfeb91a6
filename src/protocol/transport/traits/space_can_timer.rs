//! Asynchronous timer abstraction driving the heartbeat and reassembly
//! housekeeping period.

/// Timer trait abstraction; must remain thread-safe when applicable.
pub trait SpaceCanTimer {
    /// Asynchronously wait for `millis` milliseconds.
    fn delay_ms<'a>(
        &'a mut self,
        millis: u32,
    ) -> impl core::future::Future<Output = ()> + 'a;
}
