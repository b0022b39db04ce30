//! Farfalle-WBC: a tweakable wide-block cipher, and its authenticated
//! mode WBC-AE.
//!
//! WBC enciphers a whole message as one block through a four-round
//! Feistel-like network: two cheap `H` legs on the outside (their output
//! capped at `b` bits) and two full-width `G` legs on the inside, with the
//! tweak `W` mixed into both `G` legs. The split of the input into left
//! and right halves is a function of the length alone.
//!
//! WBC-AE enciphers `P || 0^t` and checks the `t` redundancy bits on
//! deciphering, turning the wide-block cipher into deterministic
//! authenticated encryption.

use subtle::Choice;
use zeroize::Zeroize;

use crate::bits::{BitString, BitStrings};
use crate::farfalle::{Farfalle, RollingFunction};
use crate::Permutation;

/// The Farfalle-WBC tweakable wide-block cipher.
///
/// `H` is the short-output instance used by the outer legs, `G` the
/// long-output instance used by the inner legs; `l` is the split
/// granularity in bits. Stateless: the key is passed per call.
#[derive(Clone)]
pub struct FarfalleWbc<P, RC, RE> {
    h: Farfalle<P, RC, RE>,
    g: Farfalle<P, RC, RE>,
    l: usize,
}

impl<P, RC, RE> FarfalleWbc<P, RC, RE>
where
    P: Permutation,
    RC: RollingFunction,
    RE: RollingFunction,
{
    /// Returns the mode over the two Farfalle instances with split
    /// granularity `l`.
    ///
    /// # Panics
    ///
    /// Panics if `l == 0` or the two instances have different widths.
    pub fn new(h: Farfalle<P, RC, RE>, g: Farfalle<P, RC, RE>, l: usize) -> FarfalleWbc<P, RC, RE> {
        assert!(l > 0, "the split granularity must be positive");
        assert!(h.width() == g.width(), "H and G must share one width");
        FarfalleWbc { h, g, l }
    }

    /// The permutation width `b` in bits.
    pub fn width(&self) -> usize {
        self.h.width()
    }

    /// The length of the left half for an `n`-bit input.
    ///
    /// Short inputs (up to `2b − (l + 2)` bits) split near the middle at
    /// `l` granularity; longer inputs get a left half sized so the right
    /// half is a power-of-two number of `b`-bit blocks, which balances the
    /// `G` legs.
    pub fn split(&self, n: usize) -> usize {
        let b = self.width();
        if n <= 2 * b - (self.l + 2) {
            self.l * ((n + self.l) / (2 * self.l))
        } else {
            let q = (n + self.l + 1 + b) / b;
            let mut tx = 1;
            while (tx << 1) < q {
                tx <<= 1;
            }
            (q - tx) * b - self.l
        }
    }

    /// Enciphers `p` under `key` and tweak `w`.
    pub fn encipher(&self, key: &BitString, w: &BitString, p: &BitString) -> BitString {
        let b = self.width();
        let n_l = self.split(p.len());
        let mut left = p.substring(0, n_l);
        let mut right = p.substring(n_l, p.len() - n_l);

        let hv = self.h.eval(key, &BitStrings::from(left.with_bit(0)), b.min(right.len()), 0);
        right = &right ^ &hv.concat(&BitString::zeroes(right.len() - hv.len()));
        left = &left ^ &self.g.eval(key, &tweaked(w, &right.with_bit(1)), left.len(), 0);
        right = &right ^ &self.g.eval(key, &tweaked(w, &left.with_bit(0)), right.len(), 0);
        let hv = self.h.eval(key, &BitStrings::from(right.with_bit(1)), b.min(left.len()), 0);
        left = &left ^ &hv.concat(&BitString::zeroes(left.len() - hv.len()));

        left.concat(&right)
    }

    /// Deciphers `c` under `key` and tweak `w`; the inverse of
    /// [`encipher`](FarfalleWbc::encipher).
    pub fn decipher(&self, key: &BitString, w: &BitString, c: &BitString) -> BitString {
        let b = self.width();
        let n_l = self.split(c.len());
        let mut left = c.substring(0, n_l);
        let mut right = c.substring(n_l, c.len() - n_l);

        let hv = self.h.eval(key, &BitStrings::from(right.with_bit(1)), b.min(left.len()), 0);
        left = &left ^ &hv.concat(&BitString::zeroes(left.len() - hv.len()));
        right = &right ^ &self.g.eval(key, &tweaked(w, &left.with_bit(0)), right.len(), 0);
        left = &left ^ &self.g.eval(key, &tweaked(w, &right.with_bit(1)), left.len(), 0);
        let hv = self.h.eval(key, &BitStrings::from(left.with_bit(0)), b.min(right.len()), 0);
        right = &right ^ &hv.concat(&BitString::zeroes(right.len() - hv.len()));

        left.concat(&right)
    }
}

/// The `G`-leg input sequence: the tweak, then the half with its frame bit.
fn tweaked(w: &BitString, half: &BitString) -> BitStrings {
    let mut seq = BitStrings::from(w.clone());
    seq.push(half.clone());
    seq
}

/// Farfalle-WBC-AE: deterministic authenticated encryption built on
/// [`FarfalleWbc`] with `t` bits of redundancy.
#[derive(Clone)]
pub struct FarfalleWbcAe<P, RC, RE> {
    wbc: FarfalleWbc<P, RC, RE>,
    t: usize,
}

impl<P, RC, RE> FarfalleWbcAe<P, RC, RE>
where
    P: Permutation,
    RC: RollingFunction,
    RE: RollingFunction,
{
    /// Returns the mode with `t` redundancy bits.
    pub fn new(h: Farfalle<P, RC, RE>, g: Farfalle<P, RC, RE>, t: usize, l: usize) -> FarfalleWbcAe<P, RC, RE> {
        FarfalleWbcAe { wbc: FarfalleWbc::new(h, g, l), t }
    }

    /// Encrypts: enciphers `p || 0^t` with the metadata as tweak. The
    /// ciphertext is `t` bits longer than the plaintext and carries the
    /// authentication within itself.
    pub fn wrap(&self, key: &BitString, metadata: &BitString, p: &BitString) -> BitString {
        self.wbc.encipher(key, metadata, &p.concat(&BitString::zeroes(self.t)))
    }

    /// Decrypts and authenticates; returns the plaintext, or `None` when
    /// the redundancy bits do not come out as zero.
    ///
    /// The redundancy check is constant-time, and the remaining Feistel
    /// legs run regardless of its outcome. When the right half is at least
    /// `b + t` bits the check happens on the right half directly after the
    /// second leg (the final `H` leg cannot touch its last `t` bits);
    /// otherwise it happens on the full deciphered string.
    ///
    /// # Panics
    ///
    /// Panics if `c` is shorter than the redundancy length.
    pub fn unwrap(&self, key: &BitString, metadata: &BitString, c: &BitString) -> Option<BitString> {
        assert!(c.len() >= self.t, "the ciphertext is shorter than the redundancy");
        let b = self.wbc.width();
        let n_l = self.wbc.split(c.len());
        let n_r = c.len() - n_l;
        let mut left = c.substring(0, n_l);
        let mut right = c.substring(n_l, n_r);

        let hv = self.wbc.h.eval(key, &BitStrings::from(right.with_bit(1)), b.min(left.len()), 0);
        left = &left ^ &hv.concat(&BitString::zeroes(left.len() - hv.len()));
        right = &right ^ &self.wbc.g.eval(key, &tweaked(metadata, &left.with_bit(0)), right.len(), 0);

        let ok: Choice;
        if n_r >= b + self.t {
            // the last t bits of the right half are already final
            ok = right
                .substring(n_r - self.t, self.t)
                .ct_eq(&BitString::zeroes(self.t));
            left = &left ^ &self.wbc.g.eval(key, &tweaked(metadata, &right.with_bit(1)), left.len(), 0);
            let hv = self.wbc.h.eval(key, &BitStrings::from(left.with_bit(0)), b, 0);
            right = &right ^ &hv.concat(&BitString::zeroes(n_r - b));
        } else {
            left = &left ^ &self.wbc.g.eval(key, &tweaked(metadata, &right.with_bit(1)), left.len(), 0);
            let hv = self.wbc.h.eval(key, &BitStrings::from(left.with_bit(0)), b.min(n_r), 0);
            right = &right ^ &hv.concat(&BitString::zeroes(n_r - b.min(n_r)));
            ok = left
                .concat(&right)
                .substring(c.len() - self.t, self.t)
                .ct_eq(&BitString::zeroes(self.t));
        }

        let mut p = left.concat(&right);
        p.truncate(c.len() - self.t);
        if bool::from(ok) {
            Some(p)
        } else {
            p.zeroize();
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::farfalle::IdentityRollingFunction;
    use crate::keccak::KeccakP;

    type Wbc = FarfalleWbc<KeccakP, IdentityRollingFunction, IdentityRollingFunction>;
    type WbcAe = FarfalleWbcAe<KeccakP, IdentityRollingFunction, IdentityRollingFunction>;

    const B: usize = 800;
    const L: usize = 8;

    fn farfalle(rounds: usize) -> Farfalle<KeccakP, IdentityRollingFunction, IdentityRollingFunction> {
        let p = KeccakP::new(B, rounds);
        Farfalle::new(p, p, p, p, IdentityRollingFunction, IdentityRollingFunction)
    }

    fn wbc() -> Wbc {
        FarfalleWbc::new(farfalle(4), farfalle(6), L)
    }

    fn wbc_ae(t: usize) -> WbcAe {
        FarfalleWbcAe::new(farfalle(4), farfalle(6), t, L)
    }

    fn pattern(bits: usize) -> BitString {
        let mut s = BitString::from_bytes(&vec![0xb5; (bits + 7) / 8]);
        s.truncate(bits);
        s
    }

    #[test]
    fn split_balances_short_inputs() {
        let wbc = wbc();
        assert_eq!(wbc.split(0), 0);
        assert_eq!(wbc.split(2 * L), L);
        // splits stay within the input and are multiples of nothing in
        // the long regime, but always leave a non-negative right half
        for n in 0..4 * B {
            let n_l = wbc.split(n);
            assert!(n_l <= n, "split({n}) = {n_l} exceeds the input");
        }
    }

    #[test]
    fn round_trip_across_the_split_boundary() {
        let wbc = wbc();
        let key = BitString::from_bytes(&[0x2a; 16]);
        let w = BitString::from_bytes(b"tweak");
        // 2b - (l + 2) is the boundary between the two split regimes
        let boundary = 2 * B - (L + 2);
        for n in [0, 1, 7, 8, L, 3 * L, B, boundary - 1, boundary, boundary + 1, boundary + 2, 3 * B] {
            let p = pattern(n);
            let c = wbc.encipher(&key, &w, &p);
            assert_eq!(c.len(), n);
            assert_eq!(wbc.decipher(&key, &w, &c), p, "length {n}");
        }
    }

    #[test]
    fn tweak_changes_the_ciphertext() {
        let wbc = wbc();
        let key = BitString::from_bytes(&[0x2a; 16]);
        let p = pattern(3 * B);
        let c1 = wbc.encipher(&key, &BitString::from_bytes(b"one"), &p);
        let c2 = wbc.encipher(&key, &BitString::from_bytes(b"two"), &p);
        assert_ne!(c1, c2);
    }

    #[test]
    fn wbc_ae_round_trip() {
        let ae = wbc_ae(128);
        let key = BitString::from_bytes(&[0x77; 16]);
        let a = BitString::from_bytes(b"metadata");
        for n in [0, 1, 64, 800, 2 * B, 3 * B + 5] {
            let p = pattern(n);
            let c = ae.wrap(&key, &a, &p);
            assert_eq!(c.len(), n + 128);
            assert_eq!(ae.unwrap(&key, &a, &c), Some(p), "length {n}");
        }
    }

    #[test]
    fn wbc_ae_detects_single_bit_tampering() {
        let ae = wbc_ae(128);
        let key = BitString::from_bytes(&[0x77; 16]);
        let a = BitString::from_bytes(b"metadata");
        // both redundancy-check regimes: a long and a short ciphertext
        for n in [16, 3 * B] {
            let p = pattern(n);
            let c = ae.wrap(&key, &a, &p);
            for i in [0, n / 2, c.len() - 1] {
                let mask = BitString::zeroes(i).with_bit(1).concat(&BitString::zeroes(c.len() - i - 1));
                assert_eq!(ae.unwrap(&key, &a, &(&c ^ &mask)), None, "length {n}, bit {i}");
            }
        }
    }

    #[test]
    fn wbc_ae_binds_the_metadata() {
        let ae = wbc_ae(128);
        let key = BitString::from_bytes(&[0x77; 16]);
        let c = ae.wrap(&key, &BitString::from_bytes(b"meta"), &pattern(100));
        assert_eq!(ae.unwrap(&key, &BitString::from_bytes(b"mole"), &c), None);
    }
}
