//! Random byte sources for `RND Vx, byte`.
use rand::{
    rngs::{StdRng, ThreadRng},
    Rng,
};

/// Supplier of uniformly distributed bytes.
pub trait RandomSource {
    fn random_byte(&mut self) -> u8;
}

impl RandomSource for StdRng {
    #[inline]
    fn random_byte(&mut self) -> u8 {
        self.gen::<u8>()
    }
}

impl RandomSource for ThreadRng {
    #[inline]
    fn random_byte(&mut self) -> u8 {
        self.gen::<u8>()
    }
}

/// Deterministic source that cycles through a fixed list of bytes.
///
/// An empty list always yields zero.
#[derive(Debug, Clone)]
pub struct FixedSequence {
    bytes: Vec<u8>,
    cursor: usize,
}

impl FixedSequence {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            cursor: 0,
        }
    }
}

impl RandomSource for FixedSequence {
    fn random_byte(&mut self) -> u8 {
        if self.bytes.is_empty() {
            return 0;
        }
        let byte = self.bytes[self.cursor];
        self.cursor = (self.cursor + 1) % self.bytes.len();
        byte
    }
}
