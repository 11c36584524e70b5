use std::time::Duration;

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Sprite frame indices visited by one blink: open, half, closed, half, open.
pub const BLINK_FRAMES: [usize; 5] = [0, 1, 2, 1, 0];

/// Hold duration for each frame of the sequence.
pub const BLINK_HOLDS: [Duration; 5] = [
    Duration::from_millis(80),
    Duration::from_millis(60),
    Duration::from_millis(50),
    Duration::from_millis(60),
    Duration::from_millis(80),
];

/// Candidate idle waits between blinks, and their weights. Short waits
/// dominate, which is what makes the spacing read as natural.
pub const IDLE_DELAY_SECS: [u64; 5] = [1, 2, 3, 4, 5];
pub const IDLE_DELAY_WEIGHTS: [f64; 5] = [0.45, 0.25, 0.20, 0.08, 0.02];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkPhase {
    Idle,
    Blinking,
}

/// State of the ambient blink cycle. Owned solely by the character surface;
/// nothing else may schedule competing frame changes. Only the idle wait is
/// randomized — the frame sequence and holds are fixed.
#[derive(Debug)]
pub struct BlinkCycle {
    phase: BlinkPhase,
    step: usize,
    frame: usize,
    delays: WeightedIndex<f64>,
    rng: StdRng,
}

impl BlinkCycle {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic cycle for tests: the idle delays are the only sampled
    /// quantity.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            phase: BlinkPhase::Idle,
            step: 0,
            frame: BLINK_FRAMES[0],
            delays: WeightedIndex::new(IDLE_DELAY_WEIGHTS).expect("static blink weights"),
            rng,
        }
    }

    pub fn phase(&self) -> BlinkPhase {
        self.phase
    }

    /// Sprite frame to show right now (eyes-open while idle).
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Sample the next idle wait from the discrete delay distribution.
    pub fn sample_idle_delay(&mut self) -> Duration {
        let idx = self.delays.sample(&mut self.rng);
        Duration::from_secs(IDLE_DELAY_SECS[idx])
    }

    /// Enter the blinking phase. Returns the first frame and its hold.
    pub fn begin(&mut self) -> (usize, Duration) {
        self.phase = BlinkPhase::Blinking;
        self.step = 0;
        self.frame = BLINK_FRAMES[0];
        (self.frame, BLINK_HOLDS[0])
    }

    /// Advance to the next frame of the sequence, or return `None` when the
    /// blink is finished and the cycle is back in the idle phase.
    pub fn advance(&mut self) -> Option<(usize, Duration)> {
        if self.phase != BlinkPhase::Blinking {
            return None;
        }
        self.step += 1;
        if self.step >= BLINK_FRAMES.len() {
            self.phase = BlinkPhase::Idle;
            self.step = 0;
            self.frame = BLINK_FRAMES[0];
            return None;
        }
        self.frame = BLINK_FRAMES[self.step];
        Some((self.frame, BLINK_HOLDS[self.step]))
    }

    /// Abandon any in-flight blink, e.g. when the error path restarts the
    /// chain from the idle phase.
    pub fn reset(&mut self) {
        self.phase = BlinkPhase::Idle;
        self.step = 0;
        self.frame = BLINK_FRAMES[0];
    }
}

impl Default for BlinkCycle {
    fn default() -> Self {
        Self::new()
    }
}
