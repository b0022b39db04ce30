//! The Ketje instances of MonkeyWrap.
//!
//! Ketje is MonkeyWrap over Keccak-p with round counts
//! `(n_start, n_step, n_stride) = (12, 1, 6)` and a payload rate chosen
//! per instance. This module wraps the bit-granular [`MonkeyWrap`] API in
//! a byte-oriented one, which is what callers almost always want.

use crate::bits::BitString;
use crate::keccak::KeccakIter;
use crate::monkey::MonkeyWrap;

const N_START: usize = 12;
const N_STEP: usize = 1;
const N_STRIDE: usize = 6;

/// A Ketje authenticated encryption session.
///
/// Construct an instance, [`initialize`](Ketje::initialize) it with a key
/// and nonce, then [`wrap`](Ketje::wrap) or [`unwrap`](Ketje::unwrap) a
/// sequence of messages. Sender and receiver each hold their own session.
#[derive(Clone)]
pub struct Ketje {
    wrap: MonkeyWrap<KeccakIter>,
}

impl Ketje {
    /// Returns a Ketje session over Keccak-p\[width\] with payload rate
    /// `rho` bits.
    ///
    /// # Panics
    ///
    /// Panics if the width is not one of 200/400/800/1600 or if
    /// `rho + 4` exceeds it.
    pub fn new(width: usize, rho: usize) -> Ketje {
        Ketje { wrap: MonkeyWrap::new(KeccakIter::new(width), rho, N_START, N_STEP, N_STRIDE) }
    }

    /// Ketje Jr: Keccak-p\[200\] with ρ=16.
    pub fn jr() -> Ketje {
        Ketje::new(200, 16)
    }

    /// Ketje Sr: Keccak-p\[400\] with ρ=32.
    pub fn sr() -> Ketje {
        Ketje::new(400, 32)
    }

    /// Ketje Minor: Keccak-p\[800\] with ρ=128.
    pub fn minor() -> Ketje {
        Ketje::new(800, 128)
    }

    /// Ketje Major: Keccak-p\[1600\] with ρ=256.
    pub fn major() -> Ketje {
        Ketje::new(1600, 256)
    }

    /// The permutation width in bits.
    pub fn width(&self) -> usize {
        self.wrap.width()
    }

    /// Binds the session to a key and nonce.
    ///
    /// # Panics
    ///
    /// Panics if `8 * (key.len() + nonce.len()) + 18` exceeds the
    /// permutation width.
    pub fn initialize(&mut self, key: &[u8], nonce: &[u8]) {
        self.wrap.initialize(&BitString::from_bytes(key), &BitString::from_bytes(nonce));
    }

    /// Encrypts `plaintext` under associated data `ad`, returning the
    /// ciphertext and a tag of `ell` bits.
    ///
    /// # Panics
    ///
    /// Panics if `ell` is not a multiple of 8 (a restriction of the byte
    /// interface, not of the mode), or if the session is not initialized.
    pub fn wrap(&mut self, ad: &[u8], plaintext: &[u8], ell: usize) -> (Vec<u8>, Vec<u8>) {
        assert!(ell % 8 == 0, "this interface restricts the tag length to a multiple of 8");
        let (c, t) = self.wrap.wrap(
            &BitString::from_bytes(ad),
            &BitString::from_bytes(plaintext),
            ell,
        );
        (c.into_bytes(), t.into_bytes())
    }

    /// Decrypts `ciphertext` under associated data `ad` and verifies
    /// `tag`; returns the plaintext, or `None` on authentication failure
    /// (which poisons the session).
    ///
    /// # Panics
    ///
    /// Panics if the session is not initialized or already failed.
    pub fn unwrap(&mut self, ad: &[u8], ciphertext: &[u8], tag: &[u8]) -> Option<Vec<u8>> {
        self.wrap
            .unwrap(
                &BitString::from_bytes(ad),
                &BitString::from_bytes(ciphertext),
                &BitString::from_bytes(tag),
            )
            .map(BitString::into_bytes)
    }
}
