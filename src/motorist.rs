//! The Motorist: the parallel-sponge engine underlying Keyak.
//!
//! A Motorist drives Π pistons, each holding one permutation state.
//! Input bytes are dealt to the pistons round-robin, a stripe of up to
//! `Rs` bytes per piston per turn, with associated data injected into the
//! remaining `Ra - Rs` bytes (or the whole `Ra` bytes when there is no
//! plaintext). Four reserved bytes above `Ra` record, per permutation
//! call, how far the crypt and inject ranges were filled; that bookkeeping
//! is the mode's padding and domain separation, so its byte layout must
//! match the Keyak definition byte for byte to interoperate.
//!
//! The *knot* ties parallel pistons together: a chaining value is squeezed
//! from every piston and re-injected into all of them. A knot is made
//! before every tag when Π > 1, and on request ("forget") it also provides
//! forward secrecy, since the pre-knot state cannot be recomputed from the
//! post-knot state.

use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::bits::enc8;
use crate::Permutation;

/// One sponge state plus the cursor bookkeeping of the Motorist.
#[derive(Clone, ZeroizeOnDrop)]
struct Piston<P: Permutation> {
    #[zeroize(skip)]
    f: P,
    state: Vec<u8>,
    /// Crypt rate in bytes.
    #[zeroize(skip)]
    rs: usize,
    /// Absorb rate in bytes; the four marker bytes live at `ra..ra + 4`.
    #[zeroize(skip)]
    ra: usize,
    #[zeroize(skip)]
    omega_c: usize,
    #[zeroize(skip)]
    omega_i: usize,
}

// Marker byte offsets relative to `ra`.
const EOM: usize = 0;
const CRYPT_END: usize = 1;
const INJECT_START: usize = 2;
const INJECT_END: usize = 3;

impl<P: Permutation> Piston<P> {
    fn new(f: P, rs: usize, ra: usize) -> Piston<P> {
        let b = f.width();
        assert!(b % 8 == 0, "the permutation width must be a multiple of 8");
        assert!((b - 32) / 8 < 248, "the permutation width is too large for 8-bit markers");
        assert!(rs <= ra, "Rs must not exceed Ra");
        assert!(ra <= (b - 32) / 8, "Ra must leave room for the marker bytes");
        Piston { state: vec![0; b / 8], f, rs, ra, omega_c: 0, omega_i: 0 }
    }

    /// Encrypts (or decrypts) bytes from `input` into `output` until the
    /// crypt rate is full or the input runs out, then marks how far it
    /// got. Leaves the inject cursor at `rs` so a following inject starts
    /// above the crypt range.
    fn crypt(&mut self, input: &mut &[u8], output: &mut Vec<u8>, decrypt: bool) {
        while !input.is_empty() && self.omega_c < self.rs {
            let x = input[0];
            *input = &input[1..];
            output.push(self.state[self.omega_c] ^ x);
            if decrypt {
                self.state[self.omega_c] = x;
            } else {
                self.state[self.omega_c] ^= x;
            }
            self.omega_c += 1;
        }
        self.state[self.ra + CRYPT_END] ^= enc8(self.omega_c);
        self.omega_c = 0;
        self.omega_i = self.rs;
    }

    /// Absorbs bytes from `x` into the inject range, marking where the
    /// injection started and ended.
    fn inject(&mut self, x: &mut &[u8]) {
        self.state[self.ra + INJECT_START] ^= enc8(self.omega_i);
        while !x.is_empty() && self.omega_i < self.ra {
            self.state[self.omega_i] ^= x[0];
            *x = &x[1..];
            self.omega_i += 1;
        }
        self.state[self.ra + INJECT_END] ^= enc8(self.omega_i);
        self.omega_c = 0;
        self.omega_i = 0;
    }

    /// Applies the permutation.
    fn spark(&mut self) {
        self.f.apply(&mut self.state);
    }

    /// Marks end-of-message with the tag length (0xFF for an empty tag),
    /// sparks, and appends `l` state bytes to `tag`. Leaves the crypt
    /// cursor at `l` so a following crypt skips the tag bytes.
    fn get_tag(&mut self, tag: &mut Vec<u8>, l: usize) {
        assert!(l <= self.rs, "the requested tag is too long");
        self.state[self.ra + EOM] ^= if l == 0 { 0xff } else { enc8(l) };
        self.spark();
        tag.extend_from_slice(&self.state[..l]);
        self.omega_c = l;
    }
}

/// The engine deals bytes round-robin over the pistons.
#[derive(Clone)]
struct Engine<P: Permutation> {
    pistons: Vec<Piston<P>>,
}

impl<P: Permutation + Clone> Engine<P> {
    fn new(f: P, pi: usize, rs: usize, ra: usize) -> Engine<P> {
        assert!(pi >= 1, "the degree of parallelism must be at least 1");
        Engine { pistons: (0..pi).map(|_| Piston::new(f.clone(), rs, ra)).collect() }
    }

    /// One turn: crypt a stripe into every piston (when there is input),
    /// inject a stripe of associated data into every piston, and spark
    /// them all if anything remains for the next turn.
    fn wrap(&mut self, input: &mut &[u8], output: &mut Vec<u8>, ad: &mut &[u8], decrypt: bool) {
        if !input.is_empty() {
            for piston in &mut self.pistons {
                piston.crypt(input, output, decrypt);
            }
        }
        for piston in &mut self.pistons {
            piston.inject(ad);
        }
        if !input.is_empty() || !ad.is_empty() {
            for piston in &mut self.pistons {
                piston.spark();
            }
        }
    }

    /// Appends `lens[i]` tag bytes from piston `i` to `tag`.
    fn get_tags(&mut self, tag: &mut Vec<u8>, lens: &[usize]) {
        for (piston, &l) in self.pistons.iter_mut().zip(lens) {
            piston.get_tag(tag, l);
        }
    }

    /// Injects the same `x` into every piston, interleaving sparks when
    /// `x` spans several inject stripes. With `diversify`, `(enc8(Π),
    /// enc8(i))` is appended per piston, making the piston states distinct
    /// from the start.
    fn inject_collective(&mut self, x: &[u8], diversify: bool) {
        let pi = self.pistons.len();
        let mut copies = vec![x.to_vec(); pi];
        if diversify {
            for (i, y) in copies.iter_mut().enumerate() {
                y.push(enc8(pi));
                y.push(enc8(i));
            }
        }
        let mut cursors: Vec<&[u8]> = copies.iter().map(|y| y.as_slice()).collect();
        while !cursors[0].is_empty() {
            for (piston, cursor) in self.pistons.iter_mut().zip(cursors.iter_mut()) {
                piston.inject(cursor);
            }
            if !cursors[0].is_empty() {
                for piston in &mut self.pistons {
                    piston.spark();
                }
            }
        }
        drop(cursors);
        for y in &mut copies {
            y.zeroize();
        }
    }
}

/// The lifecycle of a [`Motorist`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Constructed; waiting for [`Motorist::start_engine`].
    Ready,
    /// Keyed; processing messages.
    Riding,
    /// A tag failed to verify; the session is dead.
    Failed,
}

/// The Motorist engine: Π pistons, a three-phase lifecycle, and tag
/// handling.
pub struct Motorist<P: Permutation> {
    engine: Engine<P>,
    pi: usize,
    /// Chaining-value length in bits (`c` rounded up to whole lanes).
    cprime: usize,
    tau: usize,
    phase: Phase,
}

impl<P: Permutation + Clone> Motorist<P> {
    /// Returns a Motorist over `pi` copies of `f`, with lane size `w`
    /// bits, capacity `c` bits, and tag length `tau` bits.
    ///
    /// The crypt rate is `(w/8)·⌊(b − max(c, 32))/w⌋` bytes and the
    /// absorb rate `(w/8)·⌊(b − 32)/w⌋` bytes.
    ///
    /// # Panics
    ///
    /// Panics when the rates do not fit the permutation width (see
    /// [`Phase`] for the lifecycle).
    pub fn new(f: P, pi: usize, w: usize, c: usize, tau: usize) -> Motorist<P> {
        let b = f.width();
        let rs = w / 8 * ((b - c.max(32)) / w);
        let ra = w / 8 * ((b - 32) / w);
        let cprime = w * ((c + w - 1) / w);
        Motorist {
            engine: Engine::new(f, pi, rs, ra),
            pi,
            cprime,
            tau,
            phase: Phase::Ready,
        }
    }

    /// The current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Keys the engine: injects the secret-and-unique value `suv`
    /// (key pack plus nonce) into all pistons with diversification, makes
    /// a knot when `forget` is set, and handles the startup tag.
    ///
    /// With `tag_flag`, a `τ/8`-byte startup tag is produced into `tag`
    /// (encrypting) or verified against it (decrypting). Returns `false`
    /// and moves to [`Phase::Failed`] on verification failure.
    ///
    /// # Panics
    ///
    /// Panics unless the phase is [`Phase::Ready`].
    pub fn start_engine(
        &mut self,
        suv: &[u8],
        tag_flag: bool,
        tag: &mut Vec<u8>,
        decrypt: bool,
        forget: bool,
    ) -> bool {
        assert!(self.phase == Phase::Ready, "the phase must be ready to start the engine");
        self.engine.inject_collective(suv, true);
        if forget {
            self.make_knot();
        }
        self.phase = Phase::Riding;
        self.handle_tag(tag_flag, tag, decrypt)
    }

    /// Processes one message: drains `input` (encrypting into `output`,
    /// or decrypting when `decrypt` is set) and `ad`, knots when `Π > 1`
    /// or `forget` is set, and produces or verifies the `τ/8`-byte tag.
    ///
    /// On a tag mismatch the output is wiped, the phase becomes
    /// [`Phase::Failed`], and `false` is returned.
    ///
    /// # Panics
    ///
    /// Panics unless the phase is [`Phase::Riding`].
    pub fn wrap(
        &mut self,
        mut input: &[u8],
        output: &mut Vec<u8>,
        mut ad: &[u8],
        tag: &mut Vec<u8>,
        decrypt: bool,
        forget: bool,
    ) -> bool {
        assert!(self.phase == Phase::Riding, "the phase must be riding to wrap");
        loop {
            self.engine.wrap(&mut input, output, &mut ad, decrypt);
            if input.is_empty() && ad.is_empty() {
                break;
            }
        }
        if self.pi > 1 || forget {
            self.make_knot();
        }
        let ok = self.handle_tag(true, tag, decrypt);
        if !ok {
            output.zeroize();
        }
        ok
    }

    /// Squeezes a `c'/8`-byte chaining value from every piston and
    /// re-injects it into all of them.
    fn make_knot(&mut self) {
        let mut knot = Vec::with_capacity(self.pi * self.cprime / 8);
        self.engine.get_tags(&mut knot, &vec![self.cprime / 8; self.pi]);
        self.engine.inject_collective(&knot, false);
        knot.zeroize();
    }

    /// Produces or verifies a tag. Without `tag_flag` the pistons still
    /// mark end-of-message and spark, so the state evolves identically
    /// whether or not a tag is emitted.
    fn handle_tag(&mut self, tag_flag: bool, tag: &mut Vec<u8>, decrypt: bool) -> bool {
        let mut tag_prime = Vec::new();
        if !tag_flag {
            self.engine.get_tags(&mut tag_prime, &vec![0; self.pi]);
            return true;
        }
        let mut lens = vec![0; self.pi];
        lens[0] = self.tau / 8;
        self.engine.get_tags(&mut tag_prime, &lens);
        if !decrypt {
            tag.clear();
            tag.extend_from_slice(&tag_prime);
        } else if tag.len() != tag_prime.len() || !bool::from(tag_prime.ct_eq(&tag[..])) {
            self.phase = Phase::Failed;
            return false;
        }
        true
    }
}
