//! PCG XSH-RR 64-to-32 pseudo-random number generator, ported from the
//! upstream `math::random::rng` implementation so that per-worker render
//! streams are bit-for-bit reproducible given the same seed.

use rand::{RngCore, SeedableRng};

const MULTIPLIER: u64 = 6364136223846793005;
const INCREMENT: u64 = 1442695040888963407;
const INV_UINT_MAX: f64 = 1.0 / (u32::MAX as f64);

#[inline(always)]
fn rotate32(value: u32, rotate: u32) -> u32 {
    value.rotate_right(rotate & 31)
}

/// A PCG32 (XSH-RR) stream. Implements `rand::RngCore`/`SeedableRng` so it
/// can be used anywhere the `rand` crate's distributions and convenience
/// methods (`gen_range`, etc.) are expected, while keeping the exact
/// bit-stepping of the upstream generator.
#[derive(Debug, Clone)]
pub struct Pcg32 {
    state: u64,
}

impl Pcg32 {
    pub fn new(seed: u64) -> Self {
        let mut rng = Self {
            state: seed.wrapping_add(INCREMENT),
        };
        // The reference implementation burns one step at construction time
        // so that a seed of 0 does not yield a degenerate first output.
        rng.next_u32();
        rng
    }

    #[inline]
    fn step(&mut self) -> u32 {
        let old_state = self.state;
        let count = (old_state >> 59) as u32;
        self.state = old_state
            .wrapping_mul(MULTIPLIER)
            .wrapping_add(INCREMENT);
        let xored = old_state ^ (old_state >> 18);
        rotate32((xored >> 27) as u32, count)
    }

    /// Uniform `f64` in `[0, 1)`, matching the reference `next_uf`
    /// normalization (`0` maps to `0.0`, otherwise `(n - 1) * INV_UINT_MAX`).
    pub fn next_uf(&mut self) -> f64 {
        let n = self.step();
        if n == 0 {
            0.0
        } else {
            (n - 1) as f64 * INV_UINT_MAX
        }
    }
}

impl RngCore for Pcg32 {
    fn next_u32(&mut self) -> u32 {
        self.step()
    }

    fn next_u64(&mut self) -> u64 {
        let hi = self.step() as u64;
        let lo = self.step() as u64;
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        let mut chunks = dest.chunks_exact_mut(4);
        for chunk in &mut chunks {
            chunk.copy_from_slice(&self.step().to_le_bytes());
        }
        let rem = chunks.into_remainder();
        if !rem.is_empty() {
            let bytes = self.step().to_le_bytes();
            rem.copy_from_slice(&bytes[..rem.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for Pcg32 {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u64::from_le_bytes(seed))
    }

    fn seed_from_u64(seed: u64) -> Self {
        Self::new(seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_produces_same_stream() {
        let mut a = Pcg32::new(42);
        let mut b = Pcg32::new(42);
        for _ in 0..16 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = Pcg32::new(1);
        let mut b = Pcg32::new(2);
        let seq_a: Vec<u32> = (0..8).map(|_| a.next_u32()).collect();
        let seq_b: Vec<u32> = (0..8).map(|_| b.next_u32()).collect();
        assert_ne!(seq_a, seq_b);
    }

    #[test]
    fn next_uf_stays_in_unit_interval() {
        let mut rng = Pcg32::new(7);
        for _ in 0..10_000 {
            let u = rng.next_uf();
            assert!((0.0..1.0).contains(&u));
        }
    }
}
