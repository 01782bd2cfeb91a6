//! Responder node logic: controller liveness tracking, application hooks,
//! frame dispatch, and the runner/handle split for multi-task firmware.
pub mod heartbeat;
pub mod hooks;
pub mod responder;
pub mod supervisor;
