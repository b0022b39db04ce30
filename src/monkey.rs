//! The MonkeyDuplex construction and the MonkeyWrap authenticated
//! encryption mode.
//!
//! MonkeyDuplex keeps a `width`-bit state and exposes three duplexing
//! calls: `start` fills the state from an initial input, while `step` and
//! `stride` absorb a padded block into the outer `r` bits and squeeze
//! output after permuting. `stride` uses a higher round count than `step`
//! and serves as the stronger separator between messages.
//!
//! MonkeyWrap builds authenticated encryption on top: associated data and
//! plaintext are cut into `ρ`-bit blocks, each absorbed with two trailing
//! frame bits identifying its role, so an attacker cannot move a block
//! between the associated-data and plaintext positions.

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::bits::{BitString, Blocks, BlocksMut};
use crate::IterablePermutation;

/// The MonkeyDuplex construction over an iterable permutation.
#[derive(Clone, ZeroizeOnDrop)]
pub struct MonkeyDuplex<F: IterablePermutation> {
    #[zeroize(skip)]
    f: F,
    #[zeroize(skip)]
    r: usize,
    #[zeroize(skip)]
    n_start: usize,
    #[zeroize(skip)]
    n_step: usize,
    #[zeroize(skip)]
    n_stride: usize,
    s: BitString,
}

impl<F: IterablePermutation> MonkeyDuplex<F> {
    /// Returns a new duplex object with rate `r` and the round counts for
    /// the three operations. The state is undefined until [`start`] is
    /// called.
    ///
    /// [`start`]: MonkeyDuplex::start
    ///
    /// # Panics
    ///
    /// Panics if the permutation width is not a multiple of 8, if
    /// `r <= 2` or `r >= width`, or if `n_step >= n_stride`.
    pub fn new(f: F, r: usize, n_start: usize, n_step: usize, n_stride: usize) -> MonkeyDuplex<F> {
        let width = f.width();
        assert!(width % 8 == 0, "the permutation width must be a multiple of 8");
        assert!(r > 2, "r must be greater than 2");
        assert!(r < width, "r must be less than the permutation width");
        assert!(n_step < n_stride, "n_step must be less than n_stride");
        MonkeyDuplex { f, r, n_start, n_step, n_stride, s: BitString::new() }
    }

    /// The permutation width in bits.
    pub fn width(&self) -> usize {
        self.f.width()
    }

    /// The rate in bits.
    pub fn rate(&self) -> usize {
        self.r
    }

    /// Overwrites the state with `input || pad10*1` and applies `n_start`
    /// rounds.
    ///
    /// # Panics
    ///
    /// Panics if `input` is longer than the width minus 2.
    pub fn start(&mut self, input: &BitString) {
        let width = self.f.width();
        assert!(
            input.len() + 2 <= width,
            "the start input must be at most the permutation width minus 2 bits"
        );
        self.s = input.concat(&BitString::pad101(width, input.len()));
        self.f.apply(self.s.as_mut_bytes(), self.n_start);
    }

    fn duplex(&mut self, sigma: &BitString, ell: usize, rounds: usize) -> BitString {
        assert!(self.s.len() == self.f.width(), "start must be called first");
        assert!(ell <= self.r, "ell must be at most r");
        assert!(sigma.len() + 2 <= self.r, "sigma must be at most r minus 2 bits");
        let pad = sigma
            .concat(&BitString::pad101(self.r, sigma.len()))
            .concat(&BitString::zeroes(self.f.width() - self.r));
        self.s = &self.s ^ &pad;
        self.f.apply(self.s.as_mut_bytes(), rounds);
        self.s.substring(0, ell)
    }

    /// Absorbs `sigma` (padded to the rate) and returns the first `ell`
    /// bits of the state after `n_step` rounds.
    ///
    /// # Panics
    ///
    /// Panics before [`start`](MonkeyDuplex::start), if `ell > r`, or if
    /// `sigma` is longer than `r - 2` bits.
    pub fn step(&mut self, sigma: &BitString, ell: usize) -> BitString {
        self.duplex(sigma, ell, self.n_step)
    }

    /// Like [`step`](MonkeyDuplex::step), but applies `n_stride` rounds.
    /// Used exactly once per message as the strong separator before the
    /// tag is squeezed.
    ///
    /// # Panics
    ///
    /// Same conditions as [`step`](MonkeyDuplex::step).
    pub fn stride(&mut self, sigma: &BitString, ell: usize) -> BitString {
        self.duplex(sigma, ell, self.n_stride)
    }
}

/// The MonkeyWrap mode of use for authenticated encryption.
///
/// A session is created with [`new`](MonkeyWrap::new), bound to a key and
/// nonce with [`initialize`](MonkeyWrap::initialize), and then processes a
/// sequence of messages with [`wrap`](MonkeyWrap::wrap) or
/// [`unwrap`](MonkeyWrap::unwrap). Sender and receiver each run their own
/// session with the same key, nonce, and message order.
#[derive(Clone)]
pub struct MonkeyWrap<F: IterablePermutation> {
    rho: usize,
    duplex: MonkeyDuplex<F>,
    ready: bool,
    failed: bool,
}

impl<F: IterablePermutation> MonkeyWrap<F> {
    /// Returns a new MonkeyWrap session with payload rate `rho`. The
    /// underlying duplex rate is `rho + 4`: two frame bits per block plus
    /// the two bits `pad10*1` reserves.
    ///
    /// # Panics
    ///
    /// Panics if `rho + 4` exceeds the permutation width, or on any of the
    /// [`MonkeyDuplex::new`] conditions.
    pub fn new(f: F, rho: usize, n_start: usize, n_step: usize, n_stride: usize) -> MonkeyWrap<F> {
        assert!(rho + 4 <= f.width(), "rho must be at most the permutation width minus 4");
        MonkeyWrap {
            rho,
            duplex: MonkeyDuplex::new(f, rho + 4, n_start, n_step, n_stride),
            ready: false,
            failed: false,
        }
    }

    /// The permutation width in bits.
    pub fn width(&self) -> usize {
        self.duplex.width()
    }

    /// The payload rate `rho` in bits.
    pub fn rho(&self) -> usize {
        self.rho
    }

    /// Binds the session to a key and nonce: the duplex is started from
    /// `keypack(K, |K| + 16) || N`. Must be called before the first wrap
    /// or unwrap, and begins a fresh session when called again.
    ///
    /// # Panics
    ///
    /// Panics if the key length is not a multiple of 8, or if
    /// `|K| + 18` (resp. `|K| + |N| + 18`) exceeds the permutation width.
    pub fn initialize(&mut self, key: &BitString, nonce: &BitString) {
        let width = self.duplex.width();
        assert!(key.len() + 18 <= width, "the key must be at most the permutation width minus 18 bits");
        assert!(key.len() % 8 == 0, "the key length must be a multiple of 8");
        assert!(
            key.len() + nonce.len() + 18 <= width,
            "the nonce must be at most the permutation width minus the key length and 18 bits"
        );
        self.duplex.start(&BitString::keypack(key, key.len() + 16).concat(nonce));
        self.ready = true;
        self.failed = false;
    }

    /// Encrypts `body` under associated data `ad` and returns the
    /// ciphertext and an `ell`-bit tag.
    ///
    /// Every `ρ`-bit block is absorbed with two frame bits: `00` for a
    /// non-final associated-data block, `01` for the final one, `11` for a
    /// plaintext block with more to come, and `10` for the final plaintext
    /// block, which is absorbed by a stride. Tags longer than `ρ` bits are
    /// extended by absorbing a single 0 bit per extra step.
    ///
    /// # Panics
    ///
    /// Panics if the session is not initialized or a previous unwrap
    /// failed.
    pub fn wrap(&mut self, ad: &BitString, body: &BitString, ell: usize) -> (BitString, BitString) {
        assert!(self.ready, "the session must be initialized before wrapping");
        assert!(!self.failed, "the session failed authentication and must not be reused");

        let a = Blocks::new(ad, self.rho);
        let b = Blocks::new(body, self.rho);
        let mut ciphertext = BitString::new();
        {
            let mut c = BlocksMut::new(&mut ciphertext, self.rho);
            for i in 0..a.len() - 1 {
                self.duplex.step(&a.get(i).with_bit(0).with_bit(0), 0);
            }
            let mut z = self.duplex.step(&a.get(a.len() - 1).with_bit(0).with_bit(1), b.block_len(0));
            c.set(0, &(&b.get(0) ^ &z));
            for i in 0..b.len() - 1 {
                z = self.duplex.step(&b.get(i).with_bit(1).with_bit(1), b.block_len(i + 1));
                c.set(i + 1, &(&b.get(i + 1) ^ &z));
            }
        }
        let mut tag = self.duplex.stride(&b.get(b.len() - 1).with_bit(1).with_bit(0), self.rho);
        while tag.len() < ell {
            tag = tag.concat(&self.duplex.step(&BitString::from_bit(0), self.rho));
        }
        tag.truncate(ell);

        (ciphertext, tag)
    }

    /// Decrypts `ciphertext` under associated data `ad` and verifies
    /// `tag`, returning the plaintext on success.
    ///
    /// The tag comparison is constant-time. On mismatch the recovered
    /// plaintext is wiped, `None` is returned, and the session is poisoned:
    /// any further call panics (re-[`initialize`](MonkeyWrap::initialize)
    /// with a fresh nonce to start over).
    ///
    /// # Panics
    ///
    /// Panics if the session is not initialized or a previous unwrap
    /// failed.
    pub fn unwrap(&mut self, ad: &BitString, ciphertext: &BitString, tag: &BitString) -> Option<BitString> {
        assert!(self.ready, "the session must be initialized before unwrapping");
        assert!(!self.failed, "the session failed authentication and must not be reused");

        let a = Blocks::new(ad, self.rho);
        let c = Blocks::new(ciphertext, self.rho);
        let mut body = BitString::new();
        let mut tag_prime;
        {
            let mut b = BlocksMut::new(&mut body, self.rho);
            for i in 0..a.len() - 1 {
                self.duplex.step(&a.get(i).with_bit(0).with_bit(0), 0);
            }
            let mut z = self.duplex.step(&a.get(a.len() - 1).with_bit(0).with_bit(1), c.block_len(0));
            b.set(0, &(&c.get(0) ^ &z));
            for i in 0..c.len() - 1 {
                z = self.duplex.step(&b.get(i).with_bit(1).with_bit(1), c.block_len(i + 1));
                b.set(i + 1, &(&c.get(i + 1) ^ &z));
            }
            tag_prime = self.duplex.stride(&b.get(c.len() - 1).with_bit(1).with_bit(0), self.rho);
        }
        while tag_prime.len() < tag.len() {
            tag_prime = tag_prime.concat(&self.duplex.step(&BitString::from_bit(0), self.rho));
        }
        tag_prime.truncate(tag.len());

        if bool::from(tag_prime.ct_eq(tag)) {
            Some(body)
        } else {
            body.zeroize();
            self.failed = true;
            None
        }
    }
}
