//! The Keyak instances of the Motorist.
//!
//! Keyak is the Motorist driven by Keccak-p\[b, 12\], with the lane size
//! derived from the width (`W = max(b/25, 8)`) and the key delivered as a
//! byte-level key pack inside the secret-and-unique value.

use zeroize::Zeroize;

use crate::bits::enc8;
use crate::keccak::KeccakP;
use crate::motorist::{Motorist, Phase};

/// Packs `key` into `l` bytes: a length prefix, the key, a 0x01 delimiter,
/// and zero padding.
///
/// # Panics
///
/// Panics if the key and its two framing bytes do not fit in `l` bytes.
fn keypack(key: &[u8], l: usize) -> Vec<u8> {
    assert!(key.len() + 2 <= l, "the key does not fit in the key pack");
    let mut packed = Vec::with_capacity(l);
    packed.push(enc8(l));
    packed.extend_from_slice(key);
    packed.push(0x01);
    packed.resize(l, 0x00);
    packed
}

/// A Keyak authenticated encryption session.
///
/// Construct an instance, key it with [`start_engine`](Keyak::start_engine),
/// then process messages with [`wrap`](Keyak::wrap). Sender and receiver
/// each hold their own session and stay in lock-step.
pub struct Keyak {
    motorist: Motorist<KeccakP>,
    w: usize,
    c: usize,
}

impl Keyak {
    /// Returns a Keyak over Keccak-p\[b, nr\] with parallelism `pi`,
    /// capacity `c` bits, and tag length `tau` bits.
    ///
    /// # Panics
    ///
    /// Panics if `b` is not a supported Keccak-p width or the derived
    /// rates do not fit it.
    pub fn new(b: usize, nr: usize, pi: usize, c: usize, tau: usize) -> Keyak {
        let w = (b / 25).max(8);
        Keyak { motorist: Motorist::new(KeccakP::new(b, nr), pi, w, c, tau), w, c }
    }

    /// River Keyak: b=800, Π=1.
    pub fn river() -> Keyak {
        Keyak::new(800, 12, 1, 256, 128)
    }

    /// Lake Keyak: b=1600, Π=1. The primary recommendation.
    pub fn lake() -> Keyak {
        Keyak::new(1600, 12, 1, 256, 128)
    }

    /// Sea Keyak: b=1600, Π=2.
    pub fn sea() -> Keyak {
        Keyak::new(1600, 12, 2, 256, 128)
    }

    /// Ocean Keyak: b=1600, Π=4.
    pub fn ocean() -> Keyak {
        Keyak::new(1600, 12, 4, 256, 128)
    }

    /// Lunar Keyak: b=1600, Π=8.
    pub fn lunar() -> Keyak {
        Keyak::new(1600, 12, 8, 256, 128)
    }

    /// The current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.motorist.phase()
    }

    /// Keys the session with `key` and `nonce`: the key pack and nonce are
    /// concatenated into the secret-and-unique value and injected into
    /// every piston.
    ///
    /// See [`Motorist::start_engine`] for the `tag_flag`, `decrypt`, and
    /// `forget` semantics and the failure behaviour.
    ///
    /// # Panics
    ///
    /// Panics if the key does not fit the key pack
    /// (`(W/8)·⌈(c + 9)/W⌉` bytes), or outside [`Phase::Ready`].
    pub fn start_engine(
        &mut self,
        key: &[u8],
        nonce: &[u8],
        tag_flag: bool,
        tag: &mut Vec<u8>,
        decrypt: bool,
        forget: bool,
    ) -> bool {
        let lk = self.w / 8 * ((self.c + 9 + self.w - 1) / self.w);
        let mut suv = keypack(key, lk);
        suv.extend_from_slice(nonce);
        let ok = self.motorist.start_engine(&suv, tag_flag, tag, decrypt, forget);
        suv.zeroize();
        ok
    }

    /// Processes one message; see [`Motorist::wrap`].
    pub fn wrap(
        &mut self,
        input: &[u8],
        output: &mut Vec<u8>,
        ad: &[u8],
        tag: &mut Vec<u8>,
        decrypt: bool,
        forget: bool,
    ) -> bool {
        self.motorist.wrap(input, output, ad, tag, decrypt, forget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // varied but reproducible byte strings, one per (length, seed) pair
    fn material(len: usize, seed: u8) -> Vec<u8> {
        (0..len)
            .map(|i| seed.wrapping_add(161u8.wrapping_mul(len as u8)).wrapping_add(i as u8))
            .collect()
    }

    fn keyed_pair(mut make: impl FnMut() -> Keyak, key: &[u8], nonce: &[u8], forget: bool) -> (Keyak, Keyak) {
        let mut enc = make();
        let mut dec = make();
        let mut tag = Vec::new();
        assert!(enc.start_engine(key, nonce, true, &mut tag, false, forget));
        assert!(dec.start_engine(key, nonce, true, &mut tag, true, forget));
        (enc, dec)
    }

    fn round_trip(enc: &mut Keyak, dec: &mut Keyak, ad: &[u8], plaintext: &[u8], forget: bool) {
        let (mut c, mut t) = (Vec::new(), Vec::new());
        assert!(enc.wrap(plaintext, &mut c, ad, &mut t, false, forget));
        assert_eq!(c.len(), plaintext.len());
        assert_eq!(t.len(), 16);

        let mut p = Vec::new();
        assert!(dec.wrap(&c, &mut p, ad, &mut t, true, forget));
        assert_eq!(p, plaintext);
    }

    #[test]
    fn lake_round_trip() {
        let (mut enc, mut dec) = keyed_pair(Keyak::lake, &material(16, 0x12), &material(150, 0x45), false);
        round_trip(&mut enc, &mut dec, b"ABC", b"DEF", false);
        // the session chains: a second message still round-trips
        round_trip(&mut enc, &mut dec, b"GHI", b"JKL", false);
    }

    #[test]
    fn river_round_trip() {
        let (mut enc, mut dec) = keyed_pair(Keyak::river, &material(16, 0x23), &material(58, 0x56), false);
        round_trip(&mut enc, &mut dec, &material(30, 0xab), &material(200, 0xcd), false);
    }

    #[test]
    fn parallel_instances_round_trip() {
        for make in [Keyak::sea as fn() -> Keyak, Keyak::ocean, Keyak::lunar] {
            let (mut enc, mut dec) = keyed_pair(make, &material(16, 0x34), &material(100, 0x67), false);
            // long enough that every piston sees several stripes
            round_trip(&mut enc, &mut dec, &material(700, 0x11), &material(4000, 0x22), false);
            round_trip(&mut enc, &mut dec, b"", &material(10, 0x33), false);
            round_trip(&mut enc, &mut dec, &material(10, 0x44), b"", false);
        }
    }

    #[test]
    fn forget_round_trip() {
        let (mut enc, mut dec) = keyed_pair(Keyak::lake, &material(16, 0x12), &material(150, 0x45), true);
        round_trip(&mut enc, &mut dec, b"ABC", b"DEF", true);
    }

    #[test]
    fn startup_without_tag() {
        let mut enc = Keyak::lake();
        let mut dec = Keyak::lake();
        let mut empty = Vec::new();
        assert!(enc.start_engine(&material(16, 9), b"n", false, &mut empty, false, false));
        assert!(empty.is_empty());
        assert!(dec.start_engine(&material(16, 9), b"n", false, &mut Vec::new(), true, false));
        round_trip(&mut enc, &mut dec, b"ad", b"body", false);
    }

    #[test]
    fn tampered_tag_fails_and_discards_output() {
        let (mut enc, mut dec) = keyed_pair(Keyak::sea, &material(16, 0x77), &material(32, 0x88), false);
        let (mut c, mut t) = (Vec::new(), Vec::new());
        assert!(enc.wrap(b"sensitive", &mut c, b"ad", &mut t, false, false));
        t[15] ^= 0x01;
        let mut p = Vec::new();
        assert!(!dec.wrap(&c, &mut p, b"ad", &mut t, true, false));
        assert!(p.is_empty());
        assert_eq!(dec.phase(), Phase::Failed);
    }

    #[test]
    fn different_nonces_give_different_streams() {
        let (mut enc1, _) = keyed_pair(Keyak::lake, &material(16, 1), b"nonce one", false);
        let (mut enc2, _) = keyed_pair(Keyak::lake, &material(16, 1), b"nonce two", false);
        let (mut c1, mut t1) = (Vec::new(), Vec::new());
        let (mut c2, mut t2) = (Vec::new(), Vec::new());
        assert!(enc1.wrap(b"same plaintext", &mut c1, b"", &mut t1, false, false));
        assert!(enc2.wrap(b"same plaintext", &mut c2, b"", &mut t2, false, false));
        assert_ne!(c1, c2);
        assert_ne!(t1, t2);
    }

    #[test]
    #[should_panic(expected = "does not fit")]
    fn oversized_key_is_rejected() {
        let mut k = Keyak::lake();
        let _ = k.start_engine(&material(60, 1), b"", true, &mut Vec::new(), false, false);
    }
}
