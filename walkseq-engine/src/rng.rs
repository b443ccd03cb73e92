//! Small PCG-style generator used by the pattern generator.
//!
//! Pattern generation is randomized on purpose; this only needs to be cheap,
//! allocation-free and seedable for tests.

use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub struct PatternRng {
    state: u64,
}

impl PatternRng {
    pub fn new(seed: u64) -> Self {
        let mut rng = Self {
            state: seed ^ 0x9E37_79B9_7F4A_7C15,
        };
        // Discard the first output so nearby seeds diverge
        rng.next_u32();
        rng
    }

    /// Seed from the wall clock.
    pub fn from_clock() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(12345);
        Self::new(nanos)
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.state >> 32) as u32
    }

    /// Uniform in [0, 1).
    pub fn next_float(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }

    /// Uniform in [0, n). Returns 0 for n <= 0.
    pub fn next_int(&mut self, n: i32) -> i32 {
        if n <= 0 {
            return 0;
        }
        ((self.next_u32() as u64 * n as u64) >> 32) as i32
    }

    pub fn next_bool(&mut self) -> bool {
        self.next_u32() & 0x8000_0000 != 0
    }

    /// +1 or -1 with equal probability.
    pub fn next_sign(&mut self) -> i32 {
        if self.next_bool() {
            1
        } else {
            -1
        }
    }
}
