use crate::animation::ease::triangle;
use crate::foundation::math::Rng64;

/// Random blink scheduling bounds, in seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlinkTiming {
    /// Shortest wait between blinks.
    pub min_delay: f64,
    /// Longest wait between blinks.
    pub max_delay: f64,
    /// Shortest blink.
    pub min_duration: f64,
    /// Longest blink.
    pub max_duration: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Phase {
    Waiting { remaining: f64 },
    Closing { elapsed: f64, duration: f64 },
}

/// Eye blink cycle: wait a random delay, then close and reopen over a random duration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Blink {
    timing: BlinkTiming,
    phase: Phase,
}

impl Blink {
    /// Start waiting for the first blink.
    pub fn new(timing: BlinkTiming, rng: &mut Rng64) -> Self {
        Self {
            timing,
            phase: Phase::Waiting {
                remaining: rng.next_range(timing.min_delay, timing.max_delay),
            },
        }
    }

    /// Whether the eyes are mid-blink.
    pub fn is_blinking(&self) -> bool {
        matches!(self.phase, Phase::Closing { .. })
    }

    /// Vertical eye scale: 1 when open, down to 0 halfway through a blink.
    pub fn eye_scale(&self) -> f64 {
        match self.phase {
            Phase::Waiting { .. } => 1.0,
            Phase::Closing { elapsed, duration } => {
                1.0 - triangle(elapsed / duration.max(f64::EPSILON))
            }
        }
    }

    /// Advance by `dt` seconds.
    pub fn tick(&mut self, dt: f64, rng: &mut Rng64) {
        let t = self.timing;
        self.phase = match self.phase {
            Phase::Waiting { remaining } if remaining - dt <= 0.0 => Phase::Closing {
                elapsed: dt - remaining,
                duration: rng.next_range(t.min_duration, t.max_duration),
            },
            Phase::Waiting { remaining } => Phase::Waiting {
                remaining: remaining - dt,
            },
            Phase::Closing { elapsed, duration } if elapsed + dt >= duration => Phase::Waiting {
                remaining: rng.next_range(t.min_delay, t.max_delay),
            },
            Phase::Closing { elapsed, duration } => Phase::Closing {
                elapsed: elapsed + dt,
                duration,
            },
        };
    }
}
