//! The Farfalle construction: a keyed, parallelisable pseudo-random
//! function.
//!
//! Farfalle compresses a sequence of input strings into a `b`-bit
//! accumulator (each block whitened with a rolled key and permuted with
//! `p_c`), then expands the accumulator through `p_d`/`p_e` into an output
//! stream whitened with a rolled key derivative. Four permutations and two
//! rolling functions parameterise the construction; instances fix them at
//! construction time.
//!
//! The block index keeps advancing across the strings of a sequence, with
//! a one-block gap between consecutive strings, so the sequence
//! `("A", "B")` and the single string `"AB"` compress differently.

use crate::bits::{BitString, BitStrings, Blocks};
use crate::Permutation;

/// A rolling function: derives the whitening value for block index `i`
/// from the master state `k`.
///
/// Rolling functions are deterministic and stateless; instances define the
/// actual derivation (typically a lightweight lane recurrence on the
/// permutation state).
pub trait RollingFunction {
    /// Returns `roll^i(k)`, a state of the same width as `k`.
    fn roll(&self, k: &BitString, i: usize) -> BitString;
}

/// The degenerate rolling function: every index maps to `k` itself.
///
/// Useful for testing and for analysing the construction; real instances
/// derive distinct values per index.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityRollingFunction;

impl RollingFunction for IdentityRollingFunction {
    fn roll(&self, k: &BitString, _i: usize) -> BitString {
        k.clone()
    }
}

/// The Farfalle pseudo-random function `F(K, Mseq, n, q)`.
///
/// Immutable once constructed; a single instance may serve many callers.
/// Keys are passed per call, so the same instance computes under any
/// number of keys.
#[derive(Clone)]
pub struct Farfalle<P, RC, RE> {
    p_b: P,
    p_c: P,
    p_d: P,
    p_e: P,
    roll_c: RC,
    roll_e: RE,
}

impl<P, RC, RE> Farfalle<P, RC, RE>
where
    P: Permutation,
    RC: RollingFunction,
    RE: RollingFunction,
{
    /// Returns a Farfalle instance over the four permutations and two
    /// rolling functions.
    ///
    /// # Panics
    ///
    /// Panics if the permutations do not all share one width, or if that
    /// width is not a multiple of 8.
    pub fn new(p_b: P, p_c: P, p_d: P, p_e: P, roll_c: RC, roll_e: RE) -> Farfalle<P, RC, RE> {
        let b = p_b.width();
        assert!(b % 8 == 0, "the permutation width must be a multiple of 8");
        assert!(
            p_c.width() == b && p_d.width() == b && p_e.width() == b,
            "all four permutations must share one width"
        );
        Farfalle { p_b, p_c, p_d, p_e, roll_c, roll_e }
    }

    /// The permutation width `b` in bits.
    pub fn width(&self) -> usize {
        self.p_b.width()
    }

    fn permuted(p: &P, s: &BitString) -> BitString {
        let mut state = s.clone();
        p.apply(state.as_mut_bytes());
        state
    }

    /// Evaluates the PRF: `n` output bits at offset `q` of the stream
    /// defined by `key` and the message sequence `mseq`.
    ///
    /// Pure: equal inputs give equal outputs. `n = 0` yields the empty
    /// string, and an empty sequence is accepted (the compression phase is
    /// skipped).
    ///
    /// # Panics
    ///
    /// Panics if the key is not shorter than the permutation width.
    pub fn eval(&self, key: &BitString, mseq: &BitStrings, n: usize, q: usize) -> BitString {
        let b = self.width();
        assert!(key.len() + 1 <= b, "the key must be shorter than the permutation width");

        // key schedule
        let k = Self::permuted(&self.p_b, &key.concat(&BitString::pad10(b, key.len())));

        // compression: one accumulator, block index advancing by mu + 1
        // per message to leave a gap between consecutive messages
        let mut acc = BitString::zeroes(b);
        let mut index = 0usize;
        for m in mseq.iter() {
            let mu = (m.len() + b) / b;
            let extended = m.concat(&BitString::pad10(mu * b, m.len()));
            let blocks = Blocks::new(&extended, b);
            for i in 0..mu {
                let whitened = &blocks.get(i) ^ &self.roll_c.roll(&k, index + i);
                acc = &acc ^ &Self::permuted(&self.p_c, &whitened);
            }
            index += mu + 1;
        }

        // expansion
        let k_prime = self.roll_c.roll(&k, index);
        let y = Self::permuted(&self.p_d, &acc);
        let mut stream = BitString::new();
        let mut j = 0;
        while b * j < n + q {
            let block = &Self::permuted(&self.p_e, &self.roll_e.roll(&y, j)) ^ &k_prime;
            stream = stream.concat(&block);
            j += 1;
        }
        stream.substring(q, n)
    }
}
