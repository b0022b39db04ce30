//! Keccak-p permutation carriers.
//!
//! Widths 200, 400, 800, and 1600 are supported, with lane sizes
//! u8/u16/u32/u64 and little-endian lane encoding. The 1600-bit width is
//! delegated to the external `keccak` crate, whose `keccak_p` works on the
//! `[u64; 25]` state; the reduced widths use the in-tree round function
//! below, which is the same permutation with lane-width rotations and
//! truncated round constants.
//!
//! Keccak-p\[b, n\] applies the *last* `n` rounds of Keccak-f\[b\], so
//! `KeccakP::new(1600, 24)` is Keccak-f\[1600\] and `KeccakP::new(1600, 12)`
//! is the KangarooTwelve permutation.

use std::ops::{BitAnd, BitXor, BitXorAssign, Not};

use byteorder::{ByteOrder, LittleEndian};

use crate::{IterablePermutation, Permutation};

/// The round count of Keccak-f\[width\], i.e. `12 + 2 * log2(width / 25)`.
///
/// # Panics
///
/// Panics for widths other than 200, 400, 800, or 1600.
fn max_rounds(width: usize) -> usize {
    match width {
        200 => 18,
        400 => 20,
        800 => 22,
        1600 => 24,
        _ => panic!("unsupported Keccak-p width {width}"),
    }
}

/// The Keccak round constants. Reduced-width instances use the first
/// `12 + 2 * log2(w)` entries, truncated to the lane width.
const ROUND_CONSTANTS: [u64; 24] = [
    0x0000000000000001,
    0x0000000000008082,
    0x800000000000808a,
    0x8000000080008000,
    0x000000000000808b,
    0x0000000080000001,
    0x8000000080008081,
    0x8000000000008009,
    0x000000000000008a,
    0x0000000000000088,
    0x0000000080008009,
    0x000000008000000a,
    0x000000008000808b,
    0x800000000000008b,
    0x8000000000008089,
    0x8000000000008003,
    0x8000000000008002,
    0x8000000000000080,
    0x000000000000800a,
    0x800000008000000a,
    0x8000000080008081,
    0x8000000000008080,
    0x0000000080000001,
    0x8000000080008008,
];

/// Rotation offsets for the rho step, in the lane order of [`PI_LANES`].
const RHO_OFFSETS: [u32; 24] = [
    1, 3, 6, 10, 15, 21, 28, 36, 45, 55, 2, 14, 27, 41, 56, 8, 25, 43, 62, 18, 39, 61, 20, 44,
];

/// The lane cycle walked by the combined rho-and-pi step.
const PI_LANES: [usize; 24] = [
    10, 7, 11, 17, 18, 3, 5, 16, 8, 21, 24, 4, 15, 23, 19, 13, 12, 2, 20, 14, 22, 9, 6, 1,
];

/// A lane of a reduced-width Keccak state (the external `keccak` crate
/// covers the 64-bit lanes of Keccak-p\[1600\]).
trait Lane:
    Copy + Default + BitAnd<Output = Self> + BitXor<Output = Self> + BitXorAssign + Not<Output = Self>
{
    /// The round count of Keccak-f for this lane size.
    const ROUNDS: usize;

    /// Rotates left by `n` mod the lane width (rho offsets run up to 62).
    fn rotate(self, n: u32) -> Self;

    /// Truncates a 64-bit round constant to the lane width.
    fn truncate_rc(rc: u64) -> Self;
}

macro_rules! impl_lane {
    ($t:ty, $rounds:expr) => {
        impl Lane for $t {
            const ROUNDS: usize = $rounds;

            fn rotate(self, n: u32) -> Self {
                self.rotate_left(n % <$t>::BITS)
            }

            fn truncate_rc(rc: u64) -> Self {
                rc as $t
            }
        }
    };
}

impl_lane!(u8, 18);
impl_lane!(u16, 20);
impl_lane!(u32, 22);

/// Applies the last `rounds` rounds of Keccak-f to a reduced-width lane
/// array: theta, rho-and-pi, chi, iota per round.
fn keccak_p_lanes<L: Lane>(lanes: &mut [L; 25], rounds: usize) {
    debug_assert!(rounds <= L::ROUNDS);
    for &rc in &ROUND_CONSTANTS[L::ROUNDS - rounds..L::ROUNDS] {
        // theta
        let mut parity = [L::default(); 5];
        for x in 0..5 {
            for y in 0..5 {
                parity[x] ^= lanes[x + 5 * y];
            }
        }
        for x in 0..5 {
            let d = parity[(x + 4) % 5] ^ parity[(x + 1) % 5].rotate(1);
            for y in 0..5 {
                lanes[x + 5 * y] ^= d;
            }
        }

        // rho and pi, walking the lane cycle starting from (1, 0)
        let mut last = lanes[1];
        for (&offset, &lane) in RHO_OFFSETS.iter().zip(&PI_LANES) {
            let tmp = lanes[lane];
            lanes[lane] = last.rotate(offset);
            last = tmp;
        }

        // chi
        for y in 0..5 {
            let mut row = [L::default(); 5];
            row.copy_from_slice(&lanes[5 * y..5 * y + 5]);
            for x in 0..5 {
                lanes[5 * y + x] = row[x] ^ (!row[(x + 1) % 5] & row[(x + 2) % 5]);
            }
        }

        // iota
        lanes[0] ^= L::truncate_rc(rc);
    }
}

/// Applies `rounds` rounds of Keccak-p\[width\] to a byte-addressed state.
fn permute(width: usize, rounds: usize, state: &mut [u8]) {
    debug_assert_eq!(state.len(), width / 8);
    match width {
        200 => {
            let mut lanes = [0u8; 25];
            lanes.copy_from_slice(state);
            keccak_p_lanes(&mut lanes, rounds);
            state.copy_from_slice(&lanes);
        }
        400 => {
            let mut lanes = [0u16; 25];
            LittleEndian::read_u16_into(state, &mut lanes);
            keccak_p_lanes(&mut lanes, rounds);
            LittleEndian::write_u16_into(&lanes, state);
        }
        800 => {
            let mut lanes = [0u32; 25];
            LittleEndian::read_u32_into(state, &mut lanes);
            keccak_p_lanes(&mut lanes, rounds);
            LittleEndian::write_u32_into(&lanes, state);
        }
        1600 => {
            let mut lanes = [0u64; 25];
            LittleEndian::read_u64_into(state, &mut lanes);
            keccak::keccak_p(&mut lanes, rounds);
            LittleEndian::write_u64_into(&lanes, state);
        }
        _ => unreachable!(),
    }
}

/// Keccak-p\[width, rounds\] with a fixed round count.
#[derive(Clone, Copy, Debug)]
pub struct KeccakP {
    width: usize,
    rounds: usize,
}

impl KeccakP {
    /// Returns the Keccak-p permutation of the given width and round count.
    ///
    /// # Panics
    ///
    /// Panics if the width is not one of 200/400/800/1600 or if `rounds`
    /// exceeds the Keccak-f round count for that width.
    pub fn new(width: usize, rounds: usize) -> KeccakP {
        assert!(
            rounds <= max_rounds(width),
            "Keccak-p[{width}] supports at most {} rounds",
            max_rounds(width)
        );
        KeccakP { width, rounds }
    }

    /// Returns Keccak-f\[width\], i.e. Keccak-p with the full round count.
    pub fn full(width: usize) -> KeccakP {
        KeccakP::new(width, max_rounds(width))
    }

    /// The round count.
    pub fn rounds(&self) -> usize {
        self.rounds
    }
}

impl Permutation for KeccakP {
    fn width(&self) -> usize {
        self.width
    }

    fn apply(&self, state: &mut [u8]) {
        permute(self.width, self.rounds, state);
    }
}

/// The Keccak-p\[width\] family with the round count chosen per call.
#[derive(Clone, Copy, Debug)]
pub struct KeccakIter {
    width: usize,
}

impl KeccakIter {
    /// Returns the iterable Keccak-p permutation of the given width.
    ///
    /// # Panics
    ///
    /// Panics if the width is not one of 200/400/800/1600.
    pub fn new(width: usize) -> KeccakIter {
        max_rounds(width);
        KeccakIter { width }
    }
}

impl IterablePermutation for KeccakIter {
    fn width(&self) -> usize {
        self.width
    }

    fn apply(&self, state: &mut [u8], rounds: usize) {
        assert!(
            rounds <= max_rounds(self.width),
            "Keccak-p[{}] supports at most {} rounds",
            self.width,
            max_rounds(self.width)
        );
        permute(self.width, rounds, state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keccak_f1600_kat() {
        // test vector produced by XKCP rev 2a8d2311a830ab3037f8c7ef2511e5c7cc032127
        let mut state = [0u8; 200];
        KeccakP::full(1600).apply(&mut state);
        assert_eq!(
            state,
            [
                0xe7, 0xdd, 0xe1, 0x40, 0x79, 0x8f, 0x25, 0xf1, 0x8a, 0x47, 0xc0, 0x33, 0xf9, 0xcc,
                0xd5, 0x84, 0xee, 0xa9, 0x5a, 0xa6, 0x1e, 0x26, 0x98, 0xd5, 0x4d, 0x49, 0x80, 0x6f,
                0x30, 0x47, 0x15, 0xbd, 0x57, 0xd0, 0x53, 0x62, 0x05, 0x4e, 0x28, 0x8b, 0xd4, 0x6f,
                0x8e, 0x7f, 0x2d, 0xa4, 0x97, 0xff, 0xc4, 0x47, 0x46, 0xa4, 0xa0, 0xe5, 0xfe, 0x90,
                0x76, 0x2e, 0x19, 0xd6, 0x0c, 0xda, 0x5b, 0x8c, 0x9c, 0x05, 0x19, 0x1b, 0xf7, 0xa6,
                0x30, 0xad, 0x64, 0xfc, 0x8f, 0xd0, 0xb7, 0x5a, 0x93, 0x30, 0x35, 0xd6, 0x17, 0x23,
                0x3f, 0xa9, 0x5a, 0xeb, 0x03, 0x21, 0x71, 0x0d, 0x26, 0xe6, 0xa6, 0xa9, 0x5f, 0x55,
                0xcf, 0xdb, 0x16, 0x7c, 0xa5, 0x81, 0x26, 0xc8, 0x47, 0x03, 0xcd, 0x31, 0xb8, 0x43,
                0x9f, 0x56, 0xa5, 0x11, 0x1a, 0x2f, 0xf2, 0x01, 0x61, 0xae, 0xd9, 0x21, 0x5a, 0x63,
                0xe5, 0x05, 0xf2, 0x70, 0xc9, 0x8c, 0xf2, 0xfe, 0xbe, 0x64, 0x11, 0x66, 0xc4, 0x7b,
                0x95, 0x70, 0x36, 0x61, 0xcb, 0x0e, 0xd0, 0x4f, 0x55, 0x5a, 0x7c, 0xb8, 0xc8, 0x32,
                0xcf, 0x1c, 0x8a, 0xe8, 0x3e, 0x8c, 0x14, 0x26, 0x3a, 0xae, 0x22, 0x79, 0x0c, 0x94,
                0xe4, 0x09, 0xc5, 0xa2, 0x24, 0xf9, 0x41, 0x18, 0xc2, 0x65, 0x04, 0xe7, 0x26, 0x35,
                0xf5, 0x16, 0x3b, 0xa1, 0x30, 0x7f, 0xe9, 0x44, 0xf6, 0x75, 0x49, 0xa2, 0xec, 0x5c,
                0x7b, 0xff, 0xf1, 0xea,
            ]
        );
    }

    #[test]
    fn keccak_p1600_12_kat() {
        // test vector produced by XKCP rev 2a8d2311a830ab3037f8c7ef2511e5c7cc032127
        let mut state = [0u8; 200];
        KeccakP::new(1600, 12).apply(&mut state);
        assert_eq!(
            state,
            [
                0x17, 0x86, 0xa7, 0xb9, 0x38, 0x54, 0x5e, 0x8e, 0x1e, 0xd0, 0x59, 0xf2, 0x50, 0x6a,
                0xcd, 0xd9, 0x35, 0x1f, 0xa9, 0x52, 0xc6, 0xe7, 0xb8, 0x87, 0xc5, 0xe0, 0xe4, 0xcd,
                0x67, 0xe0, 0x93, 0x10, 0x45, 0x5a, 0xd9, 0xf2, 0x90, 0xab, 0x33, 0xb0, 0x45, 0x1a,
                0xdd, 0xa8, 0x72, 0x2f, 0xa7, 0xe0, 0x9c, 0x2f, 0x67, 0x14, 0xaa, 0x80, 0x37, 0xc5,
                0x1d, 0x07, 0x51, 0x00, 0xf5, 0x47, 0xdd, 0x3e, 0xcc, 0x8a, 0x17, 0x0c, 0x31, 0x1d,
                0xa3, 0xb3, 0xa0, 0xaa, 0x57, 0x92, 0xa5, 0x86, 0xb5, 0x79, 0x9b, 0xf9, 0xb1, 0xb3,
                0x3d, 0x7c, 0x4a, 0xbc, 0x93, 0x67, 0x8a, 0xe6, 0x63, 0x40, 0x87, 0x68, 0x66, 0x25,
                0x0e, 0x2e, 0x33, 0x03, 0x6c, 0x5c, 0xda, 0x30, 0xf0, 0xb9, 0x02, 0x12, 0xaa, 0x9c,
                0x9f, 0x7a, 0xcf, 0x2b, 0x78, 0x9a, 0x3b, 0x5f, 0x23, 0x79, 0xae, 0x61, 0xe0, 0xc1,
                0x36, 0xe5, 0xec, 0x87, 0x3c, 0xb7, 0x18, 0xb6, 0xe9, 0x6d, 0xc2, 0x8a, 0x91, 0x70,
                0xf1, 0xd1, 0xbe, 0x2a, 0xb7, 0x24, 0xed, 0xda, 0x53, 0xbd, 0xab, 0x6a, 0x5a, 0xe1,
                0x2e, 0x2c, 0x6a, 0x41, 0xc1, 0xbf, 0xaf, 0x52, 0x09, 0xb9, 0x36, 0xe0, 0xcf, 0xc6,
                0xd7, 0x60, 0x70, 0xdc, 0x17, 0x36, 0x50, 0x45, 0xe4, 0x7a, 0x9f, 0xc2, 0xb2, 0x11,
                0x56, 0x62, 0x7a, 0x64, 0x30, 0x2c, 0xdb, 0x71, 0x36, 0xd4, 0x1c, 0xa0, 0x2c, 0x22,
                0x76, 0x0d, 0xfd, 0xcf,
            ]
        );
    }

    // The in-tree round function is generic over the lane; instantiating
    // it with 64-bit lanes lets the KAT-verified external crate pin it
    // down on the one width they share.
    impl Lane for u64 {
        const ROUNDS: usize = 24;

        fn rotate(self, n: u32) -> Self {
            self.rotate_left(n % u64::BITS)
        }

        fn truncate_rc(rc: u64) -> Self {
            rc
        }
    }

    #[test]
    fn in_tree_round_function_matches_the_external_crate() {
        for rounds in [24, 12, 7, 1] {
            let mut ours = [0u64; 25];
            for (i, lane) in ours.iter_mut().enumerate() {
                *lane = (i as u64).wrapping_mul(0x9e3779b97f4a7c15);
            }
            let mut theirs = ours;
            keccak_p_lanes(&mut ours, rounds);
            keccak::keccak_p(&mut theirs, rounds);
            assert_eq!(ours, theirs, "{rounds} rounds");
        }
    }

    #[test]
    fn reduced_width_permutations_mix_the_state() {
        for width in [200, 400, 800] {
            let mut state = vec![0u8; width / 8];
            KeccakP::full(width).apply(&mut state);
            assert_ne!(state, vec![0u8; width / 8], "width {width}");

            let mut one = vec![0u8; width / 8];
            let mut two = vec![0u8; width / 8];
            KeccakIter::new(width).apply(&mut one, 1);
            KeccakIter::new(width).apply(&mut two, 2);
            assert_ne!(one, two, "width {width}");
        }
    }

    #[test]
    fn iterable_matches_fixed_round_carrier() {
        let mut a = [0x5au8; 100];
        let mut b = [0x5au8; 100];
        KeccakP::new(800, 6).apply(&mut a);
        KeccakIter::new(800).apply(&mut b, 6);
        assert_eq!(a, b);
    }

    #[test]
    #[should_panic(expected = "unsupported Keccak-p width")]
    fn rejects_unsupported_width() {
        let _ = KeccakP::full(1000);
    }

    #[test]
    #[should_panic(expected = "at most 18 rounds")]
    fn rejects_round_count_above_keccak_f() {
        let _ = KeccakP::new(200, 19);
    }
}
