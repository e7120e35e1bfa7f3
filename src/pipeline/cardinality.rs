//! Approximate distinct counting (HyperLogLog)
//!
//! Opt-in companion to the exact actor set kept by `ItemAggregate`. It never
//! replaces the exact count; it is exposed separately so the two can be
//! compared at scale.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub const MIN_PRECISION: u8 = 4;
pub const MAX_PRECISION: u8 = 16;

/// HyperLogLog sketch with `2^precision` one-byte registers
#[derive(Debug, Clone)]
pub struct HyperLogLog {
    precision: u8,
    registers: Vec<u8>,
}

impl HyperLogLog {
    /// Create an empty sketch. Precision is clamped to `4..=16`.
    pub fn new(precision: u8) -> Self {
        let precision = precision.clamp(MIN_PRECISION, MAX_PRECISION);
        Self {
            precision,
            registers: vec![0; 1 << precision],
        }
    }

    pub fn precision(&self) -> u8 {
        self.precision
    }

    pub fn insert<T: Hash + ?Sized>(&mut self, value: &T) {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        let hash = hasher.finish();

        let index = (hash >> (64 - self.precision)) as usize;
        // Remaining bits, left-aligned; the sentinel bit caps the run length
        let rest = (hash << self.precision) | (1 << (self.precision - 1));
        let rank = rest.leading_zeros() as u8 + 1;

        if rank > self.registers[index] {
            self.registers[index] = rank;
        }
    }

    /// Estimated number of distinct values inserted
    pub fn estimate(&self) -> u64 {
        let m = self.registers.len() as f64;
        let alpha = match self.registers.len() {
            16 => 0.673,
            32 => 0.697,
            64 => 0.709,
            _ => 0.7213 / (1.0 + 1.079 / m),
        };

        let mut sum = 0.0;
        let mut zeros = 0usize;
        for &register in &self.registers {
            sum += 2f64.powi(-(register as i32));
            if register == 0 {
                zeros += 1;
            }
        }

        let raw = alpha * m * m / sum;

        // Small-range correction (linear counting)
        let estimate = if raw <= 2.5 * m && zeros > 0 {
            m * (m / zeros as f64).ln()
        } else {
            raw
        };

        estimate.round() as u64
    }

    /// Relative standard error of `estimate()` (1.04 / sqrt(m))
    pub fn standard_error(&self) -> f64 {
        1.04 / (self.registers.len() as f64).sqrt()
    }
}
