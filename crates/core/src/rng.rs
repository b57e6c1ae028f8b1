//! RNG module - tile type sources
//!
//! The grid never reaches for global randomness. Generation and refill draw
//! tile kinds from an injected [`TileSource`], which makes every board and
//! every cascade reproducible from a seed.
//!
//! - [`SimpleRng`]: small LCG used by the seeded source
//! - [`SeededTileSource`]: uniform kinds from a [`SimpleRng`]
//! - [`ScriptedTileSource`]: replays a fixed kind sequence (fixtures and tests)

use crate::types::TileKind;

/// Simple LCG (Linear Congruential Generator) RNG
/// Uses constants from Numerical Recipes
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u32) -> Self {
        // Avoid 0 seed which would produce all zeros
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u32
    pub fn next_u32(&mut self) -> u32 {
        // LCG formula: (a * state + c) mod m
        // Using Numerical Recipes constants: a=1664525, c=1013904223, m=2^32
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Generate random value in range [0, max)
    ///
    /// Scales by the high bits: the low bits of a power-of-two LCG cycle with
    /// a short period (bit 0 simply alternates).
    pub fn next_range(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        ((self.next_u32() as u64 * max as u64) >> 32) as u32
    }

    /// Current internal state (re-seeding with it continues the sequence)
    pub fn state(&self) -> u32 {
        self.state
    }
}

/// Supplier of tile kinds from a finite alphabet of size K.
pub trait TileSource {
    /// Alphabet size K; kinds are `0..K`.
    fn kinds(&self) -> u8;

    /// Uniform index in `[0, bound)`. `bound` is always at least 1.
    fn next_index(&mut self, bound: usize) -> usize;

    /// Uniform kind over the whole alphabet.
    fn next_kind(&mut self) -> TileKind {
        let k = self.kinds().max(1) as usize;
        TileKind(self.next_index(k) as u8)
    }

    /// Uniform pick among `candidates`. Returns `None` for an empty slice.
    fn pick(&mut self, candidates: &[TileKind]) -> Option<TileKind> {
        if candidates.is_empty() {
            return None;
        }
        candidates.get(self.next_index(candidates.len())).copied()
    }
}

impl<S: TileSource + ?Sized> TileSource for Box<S> {
    fn kinds(&self) -> u8 {
        (**self).kinds()
    }

    fn next_index(&mut self, bound: usize) -> usize {
        (**self).next_index(bound)
    }

    fn next_kind(&mut self) -> TileKind {
        (**self).next_kind()
    }

    fn pick(&mut self, candidates: &[TileKind]) -> Option<TileKind> {
        (**self).pick(candidates)
    }
}

/// Seeded uniform tile source
#[derive(Debug, Clone)]
pub struct SeededTileSource {
    kinds: u8,
    rng: SimpleRng,
}

impl SeededTileSource {
    pub fn new(kinds: u8, seed: u32) -> Self {
        Self {
            kinds,
            rng: SimpleRng::new(seed),
        }
    }

    /// Get the current RNG state (for continuing the sequence elsewhere)
    pub fn seed(&self) -> u32 {
        self.rng.state()
    }
}

impl TileSource for SeededTileSource {
    fn kinds(&self) -> u8 {
        self.kinds
    }

    fn next_index(&mut self, bound: usize) -> usize {
        self.rng.next_range(bound.max(1) as u32) as usize
    }
}

/// Replays a fixed sequence of kinds, cycling when it runs out.
///
/// `next_kind` returns the script in order, reduced modulo the alphabet so a
/// script can never name a kind outside `0..K`. `pick` takes the scripted kind
/// when it is among the candidates and otherwise falls back to the first
/// candidate, so a script can describe an exact board through safe
/// generation.
#[derive(Debug, Clone)]
pub struct ScriptedTileSource {
    kinds: u8,
    script: Vec<TileKind>,
    cursor: usize,
}

impl ScriptedTileSource {
    pub fn new(kinds: u8, script: impl IntoIterator<Item = u8>) -> Self {
        Self {
            kinds,
            script: script.into_iter().map(TileKind).collect(),
            cursor: 0,
        }
    }

    fn advance(&mut self) -> Option<TileKind> {
        if self.script.is_empty() {
            return None;
        }
        let kind = self.script[self.cursor % self.script.len()];
        self.cursor += 1;
        Some(kind)
    }

    /// Number of kinds consumed so far.
    pub fn consumed(&self) -> usize {
        self.cursor
    }
}

impl TileSource for ScriptedTileSource {
    fn kinds(&self) -> u8 {
        self.kinds
    }

    fn next_index(&mut self, bound: usize) -> usize {
        self.advance().map(|k| k.index() % bound.max(1)).unwrap_or(0)
    }

    fn next_kind(&mut self) -> TileKind {
        let k = self.kinds.max(1);
        self.advance()
            .map(|kind| TileKind(kind.0 % k))
            .unwrap_or_default()
    }

    fn pick(&mut self, candidates: &[TileKind]) -> Option<TileKind> {
        let first = *candidates.first()?;
        let scripted = self.advance().unwrap_or(first);
        Some(if candidates.contains(&scripted) {
            scripted
        } else {
            first
        })
    }
}
