//! Seeded linear congruential generator used wherever the game needs chance.

const RNG_MULTIPLIER: u64 = 1_103_515_245;
const RNG_INCREMENT: u64 = 12_345;
const RNG_MASK: u64 = 0x7fff_ffff;
const RNG_MODULUS: f64 = 2_147_483_648.0;

/// 31-bit linear congruential generator.
///
/// For a given seed and call sequence the produced values are bit-identical
/// on every platform, which is what makes replays and batch comparisons
/// meaningful. The generator is an explicit handle: callers own it and pass
/// it to whatever needs randomness.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lcg {
    state: u64,
}

impl Lcg {
    /// Creates a generator whose current value is `seed`.
    #[must_use]
    pub const fn new(seed: u32) -> Self {
        Self { state: seed as u64 }
    }

    /// Resets the current value to `seed`.
    pub fn reseed(&mut self, seed: u32) {
        self.state = u64::from(seed);
    }

    /// Current internal value, useful for checkpointing a stream.
    #[must_use]
    pub fn state(&self) -> u64 {
        self.state
    }

    /// Advances the generator and returns the new 31-bit value.
    pub fn next_u31(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(RNG_MULTIPLIER)
            .wrapping_add(RNG_INCREMENT)
            & RNG_MASK;
        self.state as u32
    }

    /// Advances the generator and returns a value in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u31()) / RNG_MODULUS
    }

    /// Returns `floor(next() * (high - low)) + low`, a value in `[low, high)`
    /// whenever `low < high`.
    pub fn next_int(&mut self, low: i64, high: i64) -> i64 {
        let span = high.saturating_sub(low) as f64;
        (self.next_f64() * span).floor() as i64 + low
    }

    /// Uniform index into a collection of `len` items.
    pub fn next_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let index = (self.next_f64() * len as f64).floor() as usize;
        Some(index.min(len - 1))
    }

    /// Picks one element uniformly, or `None` for an empty slice.
    pub fn choice<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        let index = self.next_index(items.len())?;
        items.get(index)
    }
}
