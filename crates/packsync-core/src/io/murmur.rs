//! CurseForge-style `MurmurHash2` fingerprints.
//!
//! The fingerprint is 32-bit `MurmurHash2` with seed 1, computed over the input
//! with tab, newline, carriage return and space bytes removed. The length
//! mixed into the seed is the stripped length, so the whole input must be
//! seen before the digest can start.

const M: u32 = 0x5bd1_e995;
const R: u32 = 24;
const SEED: u32 = 1;

fn is_stripped(b: u8) -> bool {
    matches!(b, 9 | 10 | 13 | 32)
}

/// Incremental fingerprint state. Buffers the stripped bytes.
#[derive(Debug, Clone, Default)]
pub struct Murmur2 {
    buf: Vec<u8>,
}

impl Murmur2 {
    /// Empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed more input.
    pub fn update(&mut self, data: &[u8]) {
        self.buf.extend(data.iter().copied().filter(|b| !is_stripped(*b)));
    }

    /// Compute the fingerprint.
    pub fn finalize(self) -> u32 {
        murmur2(&self.buf, SEED)
    }
}

/// Plain 32-bit `MurmurHash2` (no stripping).
pub fn murmur2(data: &[u8], seed: u32) -> u32 {
    let mut h = seed ^ (data.len() as u32);

    let mut chunks = data.chunks_exact(4);
    for chunk in &mut chunks {
        let mut k = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        k = k.wrapping_mul(M);
        k ^= k >> R;
        k = k.wrapping_mul(M);
        h = h.wrapping_mul(M);
        h ^= k;
    }

    let rest = chunks.remainder();
    if rest.len() >= 3 {
        h ^= u32::from(rest[2]) << 16;
    }
    if rest.len() >= 2 {
        h ^= u32::from(rest[1]) << 8;
    }
    if let Some(&first) = rest.first() {
        h ^= u32::from(first);
        h = h.wrapping_mul(M);
    }

    h ^= h >> 13;
    h = h.wrapping_mul(M);
    h ^= h >> 15;
    h
}
