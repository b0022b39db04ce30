//! Sponge-based authenticated encryption over the Keccak-p permutation family.
//!
//! This crate implements the three families of modes designed around the
//! Keccak-p permutations:
//!
//! 1. [`MonkeyDuplex`] and [`MonkeyWrap`], the duplex construction and
//!    authenticated encryption mode used by [`Ketje`] (instances
//!    [`Ketje::jr`], [`Ketje::sr`], [`Ketje::minor`], [`Ketje::major`]).
//! 2. [`Motorist`], the parallel-sponge engine used by [`Keyak`] (instances
//!    [`Keyak::river`], [`Keyak::lake`], [`Keyak::sea`], [`Keyak::ocean`],
//!    [`Keyak::lunar`]).
//! 3. [`Farfalle`], the keyed parallel PRF, with its session mode
//!    [`FarfalleSae`], its deterministic mode [`FarfalleSiv`], and the
//!    wide-block ciphers [`FarfalleWbc`] and [`FarfalleWbcAe`].
//!
//! The modes never look inside the permutation: they drive it through the
//! [`Permutation`] and [`IterablePermutation`] traits below, and the
//! [`keccak`](crate::keccak) module provides carriers for
//! Keccak-p\[200\]..Keccak-p\[1600\] backed by the external `keccak` crate.
//!
//! Inputs and outputs are bit-granular [`BitString`]s; the modes honour
//! the padding and frame-bit disciplines of the published schemes exactly.
//! Tag comparisons on the authentication boundary are constant-time, and
//! authentication failures never release plaintext.

pub mod bits;
pub mod farfalle;
pub mod keccak;
pub mod ketje;
pub mod keyak;
pub mod monkey;
pub mod motorist;
pub mod sae;
pub mod siv;
pub mod wbc;

mod fuzzing;

pub use crate::bits::{BitString, BitStrings, Blocks, BlocksMut};
pub use crate::farfalle::{Farfalle, IdentityRollingFunction, RollingFunction};
pub use crate::keccak::{KeccakIter, KeccakP};
pub use crate::ketje::Ketje;
pub use crate::keyak::Keyak;
pub use crate::monkey::{MonkeyDuplex, MonkeyWrap};
pub use crate::motorist::{Motorist, Phase};
pub use crate::sae::FarfalleSae;
pub use crate::siv::FarfalleSiv;
pub use crate::wbc::{FarfalleWbc, FarfalleWbcAe};

/// A permutation bijectively maps all states of a fixed bit width to states
/// of the same width.
///
/// The state is a `width() / 8`-byte buffer, little-endian within each lane
/// per the Keccak convention. Implementations mutate it in place and must
/// not retain references to it.
pub trait Permutation {
    /// The width of the permutation in bits; always a multiple of 8.
    fn width(&self) -> usize;

    /// Permute the given `width() / 8`-byte state.
    fn apply(&self, state: &mut [u8]);
}

/// A permutation family indexed by a round count.
///
/// Where [`Permutation`] fixes the number of rounds once, an iterable
/// permutation chooses it per call. [`MonkeyDuplex`] relies on this to use
/// different round counts for its `start`, `step`, and `stride` operations.
pub trait IterablePermutation {
    /// The width of the permutation in bits; always a multiple of 8.
    fn width(&self) -> usize;

    /// Apply `rounds` rounds of the permutation to the given
    /// `width() / 8`-byte state.
    fn apply(&self, state: &mut [u8], rounds: usize);
}
