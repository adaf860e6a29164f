/// Deterministic linear-congruential generator. The constants are fixed so a
/// given seed yields the same terrain everywhere.
const MULTIPLIER: u64 = 9301;
const INCREMENT: u64 = 49297;
const MODULUS: u64 = 233280;

#[derive(Clone, Debug)]
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub fn new(seed: u32) -> Self {
        Self { state: seed as u64 }
    }

    /// Next value in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        self.state = (self.state * MULTIPLIER + INCREMENT) % MODULUS;
        self.state as f64 / MODULUS as f64
    }

    /// Uniform index in [0, max].
    pub fn index_inclusive(&mut self, max: usize) -> usize {
        (self.next_f64() * (max + 1) as f64).floor() as usize
    }
}
