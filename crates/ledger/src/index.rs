//! Oracle index sources
//!
//! Indices are a coarse sharding key: each oracle holds three, each status
//! request is sent to one. How they are drawn is injected so fairness can be
//! tested and upgraded without touching the consensus rules.

use flightsure_core::Address;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Source of pseudo-random indices in `0..bound`
pub trait IndexSource: Send {
    /// Draw one index for `caller`
    fn draw(&mut self, caller: &Address, bound: u8) -> u8;
}

/// Which built-in source a configuration selects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IndexSourceKind {
    /// Hash of caller and a running nonce (predictable by the caller)
    #[default]
    Hash,

    /// Seedable CSPRNG-backed draw
    Entropy,
}

impl IndexSourceKind {
    pub fn build(self, seed: Option<u64>) -> Box<dyn IndexSource> {
        match self {
            IndexSourceKind::Hash => Box::new(HashIndexSource::new()),
            IndexSourceKind::Entropy => match seed {
                Some(seed) => Box::new(RngIndexSource::seeded(seed)),
                None => Box::new(RngIndexSource::from_entropy()),
            },
        }
    }
}

/// SHA-256 over (caller, nonce), reduced modulo the bound
///
/// Anyone who knows the nonce can predict the next index.
#[derive(Debug, Default)]
pub struct HashIndexSource {
    nonce: u64,
}

impl HashIndexSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IndexSource for HashIndexSource {
    fn draw(&mut self, caller: &Address, bound: u8) -> u8 {
        let mut hasher = Sha256::new();
        hasher.update(caller.as_str().as_bytes());
        hasher.update(self.nonce.to_be_bytes());
        self.nonce = self.nonce.wrapping_add(1);

        let digest = hasher.finalize();
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        (u64::from_be_bytes(head) % u64::from(bound.max(1))) as u8
    }
}

/// Draws from a `StdRng`
pub struct RngIndexSource {
    rng: StdRng,
}

impl RngIndexSource {
    /// Reproducible source
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl IndexSource for RngIndexSource {
    fn draw(&mut self, _caller: &Address, bound: u8) -> u8 {
        self.rng.gen_range(0..bound.max(1))
    }
}

/// Replays a fixed list of indices, cycling when exhausted
#[derive(Debug, Clone)]
pub struct SequenceIndexSource {
    values: Vec<u8>,
    position: usize,
}

impl SequenceIndexSource {
    pub fn new(values: impl Into<Vec<u8>>) -> Self {
        Self {
            values: values.into(),
            position: 0,
        }
    }
}

impl IndexSource for SequenceIndexSource {
    fn draw(&mut self, _caller: &Address, bound: u8) -> u8 {
        if self.values.is_empty() {
            return 0;
        }
        let value = self.values[self.position % self.values.len()];
        self.position += 1;
        value % bound.max(1)
    }
}

/// Draw three distinct indices for one oracle
///
/// Falls back to the lowest unused index if the source keeps repeating
/// itself, so a degenerate source cannot stall registration. `bound` must
/// be at least 3 for the fallback to stay in range; ledger configs are
/// checked for that at deployment.
pub fn draw_distinct(source: &mut dyn IndexSource, caller: &Address, bound: u8) -> [u8; 3] {
    let max_attempts = 16 * usize::from(bound.max(1));
    let mut picked: Vec<u8> = Vec::with_capacity(3);

    for _ in 0..max_attempts {
        if picked.len() == 3 {
            break;
        }
        let index = source.draw(caller, bound);
        if !picked.contains(&index) {
            picked.push(index);
        }
    }

    let mut fallback = 0u8;
    while picked.len() < 3 {
        if !picked.contains(&fallback) {
            picked.push(fallback);
        }
        fallback = fallback.wrapping_add(1);
    }

    [picked[0], picked[1], picked[2]]
}
