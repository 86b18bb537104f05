//! Simulated player
//!
//! The terminal has no embedded video player, so `studytube play` runs a
//! clock that advances at a chosen speed from the resume position. It
//! reports position the same way a real player would.

use tokio::time::Instant;

use studytube_core::PlaybackSource;

/// A player clock running from `offset` seconds at `speed`x
#[derive(Debug)]
pub struct SimulatedPlayer {
    started: Instant,
    offset: f64,
    speed: f64,
    duration: f64,
}

impl SimulatedPlayer {
    pub fn new(offset: f64, duration: f64, speed: f64) -> Self {
        Self {
            started: Instant::now(),
            offset: offset.clamp(0.0, duration.max(0.0)),
            speed,
            duration,
        }
    }

    /// Reached the end of the video
    pub fn has_ended(&self) -> bool {
        self.duration > 0.0 && self.current_time() >= self.duration
    }
}

impl PlaybackSource for SimulatedPlayer {
    fn current_time(&self) -> f64 {
        let elapsed = self.started.elapsed().as_secs_f64() * self.speed;
        (self.offset + elapsed).min(self.duration)
    }

    fn duration(&self) -> f64 {
        self.duration
    }
}
