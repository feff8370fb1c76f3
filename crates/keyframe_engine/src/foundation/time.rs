//! Tick-based timing
//!
//! The game advances in fixed ticks, so timers count ticks rather than
//! seconds.

/// Countdown that is ready when it reaches zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cooldown {
    period: u32,
    remaining: u32,
}

impl Cooldown {
    /// Ready cooldown that re-arms for `period` ticks
    pub fn new(period: u32) -> Self {
        Self { period, remaining: 0 }
    }

    /// Ticks left before ready
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Ticks used by [`Cooldown::trigger`]
    pub fn period(&self) -> u32 {
        self.period
    }

    /// No ticks left
    pub fn is_ready(&self) -> bool {
        self.remaining == 0
    }

    /// Re-arm for the full period
    pub fn trigger(&mut self) {
        self.remaining = self.period;
    }

    /// Re-arm for an explicit number of ticks
    pub fn trigger_for(&mut self, ticks: u32) {
        self.remaining = ticks;
    }

    /// Trigger if ready; returns whether it fired
    pub fn try_trigger(&mut self) -> bool {
        let ready = self.is_ready();
        if ready {
            self.trigger();
        }
        ready
    }

    /// Count one tick down, stopping at zero
    pub fn tick(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }
}
