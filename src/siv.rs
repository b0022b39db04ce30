//! Farfalle-SIV: deterministic authenticated encryption.
//!
//! The tag is the PRF of the plaintext (with the metadata as context), and
//! the keystream is the PRF of that tag: a synthetic IV. Identical
//! `(K, A, P)` triples produce identical `(C, T)` pairs, which is the
//! point of the mode; anything that must not leak message equality needs a
//! nonce-based mode instead.

use zeroize::Zeroize;

use crate::bits::{BitString, BitStrings};
use crate::farfalle::{Farfalle, RollingFunction};
use crate::Permutation;

/// The Farfalle-SIV mode. Stateless: the key is passed per call.
#[derive(Clone)]
pub struct FarfalleSiv<P, RC, RE> {
    f: Farfalle<P, RC, RE>,
    t: usize,
}

impl<P, RC, RE> FarfalleSiv<P, RC, RE>
where
    P: Permutation,
    RC: RollingFunction,
    RE: RollingFunction,
{
    /// Returns the mode over `f` with `t`-bit tags.
    pub fn new(f: Farfalle<P, RC, RE>, t: usize) -> FarfalleSiv<P, RC, RE> {
        FarfalleSiv { f, t }
    }

    /// Encrypts `plaintext` under `metadata`, returning ciphertext and tag.
    pub fn wrap(&self, key: &BitString, metadata: &BitString, plaintext: &BitString) -> (BitString, BitString) {
        let mut seq = BitStrings::from(metadata.clone());
        seq.push(plaintext.clone());
        let tag = self.f.eval(key, &seq, self.t, 0);

        let mut seq = BitStrings::from(metadata.clone());
        seq.push(tag.clone());
        let c = plaintext ^ &self.f.eval(key, &seq, plaintext.len(), 0);
        (c, tag)
    }

    /// Decrypts `ciphertext` and verifies `tag` in constant time; `None`
    /// on mismatch (with the candidate plaintext wiped).
    pub fn unwrap(
        &self,
        key: &BitString,
        metadata: &BitString,
        ciphertext: &BitString,
        tag: &BitString,
    ) -> Option<BitString> {
        let mut seq = BitStrings::from(metadata.clone());
        seq.push(tag.clone());
        let mut p = ciphertext ^ &self.f.eval(key, &seq, ciphertext.len(), 0);

        let mut seq = BitStrings::from(metadata.clone());
        seq.push(p.clone());
        let tag_prime = self.f.eval(key, &seq, self.t, 0);

        if bool::from(tag_prime.ct_eq(tag)) {
            Some(p)
        } else {
            p.zeroize();
            None
        }
    }
}
