//! Heartbeat consumer: detects loss of the controller and asks for a bus
//! switch after too many consecutive silent periods.
//!
//! The consumer is a pure state machine. The runner calls [`HeartbeatConsumer::tick`]
//! once per period and the dispatch path calls [`HeartbeatConsumer::received`]
//! for every heartbeat frame; both run on the same event loop, so no update
//! can be lost between them.
use crate::config::HeartbeatSettings;
use embassy_time::Duration;

/// Monitoring state.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum MonitorState {
    Idle,
    Monitoring,
}

/// Outcome of one period tick.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HeartbeatEvent {
    /// Consumer not started; nothing evaluated.
    Idle,
    /// A heartbeat arrived during the elapsed period.
    Alive,
    /// Period elapsed in silence, threshold not reached yet.
    Missed { count: u32 },
    /// Threshold reached and budget available: the caller must switch buses.
    SwitchBus,
    /// Threshold reached but the switch budget is spent. Terminal until the
    /// budget is reset.
    Exhausted,
}

/// Liveness tracker for the controller heartbeat.
#[derive(Debug, Clone)]
pub struct HeartbeatConsumer {
    settings: HeartbeatSettings,
    state: MonitorState,
    miss_count: u32,
    switch_count: u32,
    received_since_tick: bool,
}

impl HeartbeatConsumer {
    pub fn new(settings: HeartbeatSettings) -> Self {
        Self {
            settings,
            state: MonitorState::Idle,
            miss_count: 0,
            switch_count: 0,
            received_since_tick: false,
        }
    }

    /// Begin monitoring. The miss count restarts from zero; the switch count
    /// is kept across restarts.
    pub fn start(&mut self) {
        self.state = MonitorState::Monitoring;
        self.miss_count = 0;
        self.received_since_tick = false;
    }

    pub fn stop(&mut self) {
        self.state = MonitorState::Idle;
    }

    /// Heartbeat frame observed.
    pub fn received(&mut self) {
        self.miss_count = 0;
        self.received_since_tick = true;
    }

    /// Evaluate the elapsed period.
    pub fn tick(&mut self) -> HeartbeatEvent {
        if self.state == MonitorState::Idle {
            return HeartbeatEvent::Idle;
        }

        if core::mem::take(&mut self.received_since_tick) {
            self.miss_count = 0;
            return HeartbeatEvent::Alive;
        }

        self.miss_count = self.miss_count.saturating_add(1);
        if self.miss_count < self.settings.max_miss_heartbeat {
            return HeartbeatEvent::Missed {
                count: self.miss_count,
            };
        }

        if self.switch_allowed() {
            self.switch_count += 1;
            self.miss_count = 0;
            HeartbeatEvent::SwitchBus
        } else {
            HeartbeatEvent::Exhausted
        }
    }

    // `Some(0)` forbids switching; only `None` is unlimited.
    fn switch_allowed(&self) -> bool {
        match self.settings.max_bus_switch {
            None => true,
            Some(max) => self.switch_count < max,
        }
    }

    /// Give the consumer a fresh switch budget (operator intervention).
    pub fn reset_switch_budget(&mut self) {
        self.switch_count = 0;
        self.miss_count = 0;
    }

    pub fn miss_count(&self) -> u32 {
        self.miss_count
    }

    pub fn switch_count(&self) -> u32 {
        self.switch_count
    }

    pub fn is_monitoring(&self) -> bool {
        self.state == MonitorState::Monitoring
    }

    pub fn period(&self) -> Duration {
        self.settings.period
    }

    pub fn settings(&self) -> &HeartbeatSettings {
        &self.settings
    }
}
