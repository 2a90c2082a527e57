//! Random sources for world generation
//!
//! Every consumer draws from its own named stream derived from one master
//! ChaCha generator, so adding a consumer never shifts another one's draws.

use std::collections::HashMap;

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub struct RngManager {
    master: ChaCha8Rng,
    streams: HashMap<String, ChaCha8Rng>,
}

impl RngManager {
    pub fn new(seed: u64) -> Self {
        Self {
            master: ChaCha8Rng::seed_from_u64(seed),
            streams: HashMap::new(),
        }
    }

    /// Unseeded manager; draws differ on every run
    pub fn from_entropy() -> Self {
        Self {
            master: ChaCha8Rng::from_entropy(),
            streams: HashMap::new(),
        }
    }

    /// Seeded when `seed` is given, entropy otherwise
    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::new(seed),
            None => Self::from_entropy(),
        }
    }

    pub fn stream(&mut self, name: &str) -> StreamRng<'_> {
        let master = &mut self.master;
        let entry = self.streams.entry(name.to_string()).or_insert_with(|| {
            let mut seed_bytes = [0u8; 8];
            master.fill_bytes(&mut seed_bytes);
            ChaCha8Rng::seed_from_u64(u64::from_le_bytes(seed_bytes))
        });
        StreamRng { inner: entry }
    }
}

pub struct StreamRng<'a> {
    inner: &'a mut ChaCha8Rng,
}

impl RngCore for StreamRng<'_> {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.inner.try_fill_bytes(dest)
    }
}

/// Helper draws shared by the generators
pub trait RngExt {
    /// Uniform value in `[min, max)`; returns `min` for an empty range
    fn random_f64(&mut self, min: f64, max: f64) -> f64;
    /// `true` with the given probability
    fn random_bool(&mut self, probability: f64) -> bool;
    /// Uniform element of a slice, `None` when it is empty
    fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T>;
}

impl<R: Rng> RngExt for R {
    fn random_f64(&mut self, min: f64, max: f64) -> f64 {
        self.gen::<f64>() * (max - min) + min
    }

    fn random_bool(&mut self, probability: f64) -> bool {
        self.gen::<f64>() < probability
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            None
        } else {
            items.get(self.gen_range(0..items.len()))
        }
    }
}
