//! Sequence-pair encoding and decoding of rectangle packings.
//!
//! A sequence pair is two permutations of block indices that together encode
//! a unique non-overlapping packing: block `a` is left of block `b` when `a`
//! precedes `b` in both sequences, and below `b` when `a` follows `b` in the
//! positive sequence but precedes it in the negative one. [`SequencePair::pack`]
//! decodes the pair into concrete coordinates with a per-axis sweep.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Two permutations of `0..n` encoding a rectangle packing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencePair {
    /// The positive sequence.
    pub pos: Vec<usize>,
    /// The negative sequence.
    pub neg: Vec<usize>,
}

/// Decoded coordinates and bounding dimensions for a sequence pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Packing {
    /// Lower-left x per block.
    pub xs: Vec<f64>,
    /// Lower-left y per block.
    pub ys: Vec<f64>,
    /// Overall bounding width.
    pub width: f64,
    /// Overall bounding height.
    pub height: f64,
}

impl Packing {
    /// Returns the bounding-box area of the packing.
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

impl SequencePair {
    /// Creates the identity pair over `n` blocks.
    pub fn identity(n: usize) -> Self {
        Self {
            pos: (0..n).collect(),
            neg: (0..n).collect(),
        }
    }

    /// Creates a uniformly random pair over `n` blocks.
    pub fn random(n: usize, rng: &mut StdRng) -> Self {
        let mut pair = Self::identity(n);
        pair.pos.shuffle(rng);
        pair.neg.shuffle(rng);
        pair
    }

    /// Returns the number of blocks encoded.
    pub fn len(&self) -> usize {
        self.pos.len()
    }

    /// Returns whether the pair encodes zero blocks.
    pub fn is_empty(&self) -> bool {
        self.pos.is_empty()
    }

    /// Swaps two positions in the positive sequence.
    pub fn swap_pos(&mut self, i: usize, j: usize) {
        self.pos.swap(i, j);
    }

    /// Swaps two positions in the negative sequence.
    pub fn swap_neg(&mut self, i: usize, j: usize) {
        self.neg.swap(i, j);
    }

    /// Swaps the same two positions in both sequences.
    pub fn swap_both(&mut self, i: usize, j: usize) {
        self.pos.swap(i, j);
        self.neg.swap(i, j);
    }

    /// Decodes the pair into coordinates for blocks of the given dimensions.
    ///
    /// `dims[b]` is the `(width, height)` of block `b`. The X sweep walks the
    /// positive sequence forward; the Y sweep walks it in reverse to flip the
    /// packing direction. Ties propagate on strict `>` only: downstream
    /// perturb/restore bookkeeping relies on this decode being deterministic
    /// for a given pair.
    pub fn pack(&self, dims: &[(f64, f64)]) -> Packing {
        let n = self.pos.len();
        debug_assert_eq!(dims.len(), n);
        let mut xs = vec![0.0; n];
        let mut ys = vec![0.0; n];
        if n == 0 {
            return Packing {
                xs,
                ys,
                width: 0.0,
                height: 0.0,
            };
        }

        // Position of each block in the negative sequence.
        let mut neg_index = vec![0usize; n];
        for (i, &b) in self.neg.iter().enumerate() {
            neg_index[b] = i;
        }

        let mut length = vec![0.0f64; n];
        for &b in &self.pos {
            let p = neg_index[b];
            xs[b] = length[p];
            let t = xs[b] + dims[b].0;
            for slot in length.iter_mut().skip(p) {
                if t > *slot {
                    *slot = t;
                } else {
                    break;
                }
            }
        }
        let width = length[n - 1];

        length.iter_mut().for_each(|slot| *slot = 0.0);
        for &b in self.pos.iter().rev() {
            let p = neg_index[b];
            ys[b] = length[p];
            let t = ys[b] + dims[b].1;
            for slot in length.iter_mut().skip(p) {
                if t > *slot {
                    *slot = t;
                } else {
                    break;
                }
            }
        }
        let height = length[n - 1];

        Packing {
            xs,
            ys,
            width,
            height,
        }
    }
}
