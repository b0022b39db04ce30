//! Bit strings, padding, and block views.
//!
//! [`BitString`] is the substrate every mode in this crate is built on: an
//! owned bit vector of arbitrary length with bit-exact concatenation, XOR,
//! substring extraction, and the `pad10*` / `pad10*1` padding rules. Bits
//! are ordered LSB-first within each byte, the Keccak convention, so a
//! byte-aligned bit string and its byte representation agree.
//!
//! [`Blocks`] and [`BlocksMut`] expose a bit string as a sequence of
//! fixed-size blocks without copying; writing through a [`BlocksMut`]
//! overwrites (and may extend) the backing string.

use std::fmt;
use std::ops::{BitXor, Index};

use subtle::{Choice, ConstantTimeEq};
use zeroize::Zeroize;

/// Encodes `x` on 8 bits.
///
/// # Panics
///
/// Panics if `x > 255`.
pub fn enc8(x: usize) -> u8 {
    assert!(x <= 255, "the integer {x} cannot be encoded on 8 bits");
    x as u8
}

/// An owned string of bits.
///
/// The backing storage always holds exactly `(len + 7) / 8` bytes and any
/// bits of the last byte beyond `len` are zero, so equality of two bit
/// strings is equality of length and storage regardless of how either was
/// constructed.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct BitString {
    len: usize,
    bytes: Vec<u8>,
}

impl BitString {
    /// Returns the empty bit string.
    pub fn new() -> BitString {
        BitString::default()
    }

    /// Returns a bit string holding the single bit `bit`.
    ///
    /// # Panics
    ///
    /// Panics if `bit` is not 0 or 1.
    pub fn from_bit(bit: u8) -> BitString {
        assert!(bit <= 1, "bit must be 0 or 1");
        BitString { len: 1, bytes: vec![bit] }
    }

    /// Returns the `8 * bytes.len()`-bit string with the given contents.
    pub fn from_bytes(bytes: &[u8]) -> BitString {
        BitString { len: bytes.len() * 8, bytes: bytes.to_vec() }
    }

    /// Returns `len` bits of the repeated byte `byte`.
    pub fn repeat(byte: u8, len: usize) -> BitString {
        let mut s = BitString { len, bytes: vec![byte; (len + 7) / 8] };
        s.mask_last();
        s
    }

    /// Returns `len` zero bits.
    pub fn zeroes(len: usize) -> BitString {
        BitString::repeat(0x00, len)
    }

    /// Returns `len` one bits.
    pub fn ones(len: usize) -> BitString {
        BitString::repeat(0xff, len)
    }

    /// The length in bits.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the string has no bits.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns bit `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`.
    pub fn bit(&self, i: usize) -> u8 {
        assert!(i < self.len, "bit index out of range");
        (self.bytes[i / 8] >> (i % 8)) & 1
    }

    /// The backing bytes, `(len + 7) / 8` of them; unused bits of the last
    /// byte are zero.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the string and returns its backing bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        // Manual move because Drop wipes the buffer.
        let mut s = self;
        std::mem::take(&mut s.bytes)
    }

    /// The backing bytes, mutably.
    ///
    /// # Panics
    ///
    /// Panics if the length is not a multiple of 8: the caller could
    /// otherwise set bits beyond the declared length and break the
    /// canonical-form invariant.
    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        assert!(self.len % 8 == 0, "cannot borrow the bytes of a bit string with a partial last byte");
        &mut self.bytes
    }

    /// Zeroes the bits of the last byte beyond `len`.
    fn mask_last(&mut self) {
        if self.len % 8 != 0 {
            self.bytes[self.len / 8] &= (1u8 << (self.len % 8)) - 1;
        }
    }

    /// Returns `self || other`, shifting `other` into the last partial byte
    /// when `self.len()` is not a multiple of 8.
    pub fn concat(&self, other: &BitString) -> BitString {
        let mut out = BitString::zeroes(self.len + other.len);
        out.bytes[..self.bytes.len()].copy_from_slice(&self.bytes);
        if self.len % 8 == 0 {
            out.overwrite(self.len, other);
        } else {
            let shift = self.len % 8;
            let mut c = self.len / 8;
            let mut carry = out.bytes[c] & ((1u8 << shift) - 1);
            for &b in &other.bytes {
                out.bytes[c] = carry | (b << shift);
                c += 1;
                carry = b >> (8 - shift);
            }
            if c < out.bytes.len() {
                out.bytes[c] = carry;
            }
            out.mask_last();
        }
        out
    }

    /// Returns `self || bit`.
    ///
    /// # Panics
    ///
    /// Panics if `bit` is not 0 or 1.
    pub fn with_bit(&self, bit: u8) -> BitString {
        assert!(bit <= 1, "bit must be 0 or 1");
        let mut out = self.clone();
        out.bytes.resize((out.len + 8) / 8, 0);
        out.bytes[out.len / 8] |= bit << (out.len % 8);
        out.len += 1;
        out
    }

    /// Returns `size` bits starting at bit `index`; the result is clamped
    /// to the end of the string (and is empty when `index >= self.len()`).
    pub fn substring(&self, index: usize, size: usize) -> BitString {
        if index >= self.len {
            return BitString::new();
        }
        let size = size.min(self.len - index);
        let mut out = BitString::zeroes(size);
        let start = index / 8;
        let shift = index % 8;
        if shift == 0 {
            out.bytes.copy_from_slice(&self.bytes[start..start + (size + 7) / 8]);
        } else {
            for (i, b) in out.bytes.iter_mut().enumerate() {
                let mut v = self.bytes[start + i] >> shift;
                if let Some(&hi) = self.bytes.get(start + i + 1) {
                    v |= hi << (8 - shift);
                }
                *b = v;
            }
        }
        out.mask_last();
        out
    }

    /// Shortens the string to `len` bits in place; a no-op when `len` is
    /// not smaller than the current length.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }
        self.len = len;
        self.bytes.truncate((len + 7) / 8);
        self.mask_last();
    }

    /// Overwrites the bits starting at `index` with `s`, extending the
    /// string when `index + s.len()` reaches past the current end.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a multiple of 8.
    pub fn overwrite(&mut self, index: usize, s: &BitString) {
        assert!(index % 8 == 0, "overwrite only supports byte-aligned indices");
        if index + s.len > self.len {
            self.len = index + s.len;
            self.bytes.resize((self.len + 7) / 8, 0);
        }
        let full = s.len / 8;
        self.bytes[index / 8..index / 8 + full].copy_from_slice(&s.bytes[..full]);
        if s.len % 8 != 0 {
            let mask = (1u8 << (s.len % 8)) - 1;
            let dst = &mut self.bytes[index / 8 + full];
            *dst = (*dst & !mask) | (s.bytes[full] & mask);
        }
        self.mask_last();
    }

    /// Compares two bit strings in constant time.
    ///
    /// The lengths are public: strings of different lengths short-circuit
    /// to "not equal", and only the contents are compared without
    /// data-dependent branches.
    pub fn ct_eq(&self, other: &BitString) -> Choice {
        if self.len != other.len {
            return Choice::from(0);
        }
        self.bytes.ct_eq(&other.bytes)
    }

    /// The multi-rate padding `pad10*`: a 1 bit followed by the smallest
    /// number of 0 bits that brings a message of `mlen` bits to a multiple
    /// of the rate `r`.
    ///
    /// # Panics
    ///
    /// Panics if `r == 0`.
    pub fn pad10(r: usize, mlen: usize) -> BitString {
        assert!(r > 0, "r must be positive");
        BitString::from_bit(1).concat(&BitString::zeroes(r - 1 - (mlen % r)))
    }

    /// The multi-rate padding `pad10*1`: a 1 bit, the smallest number of 0
    /// bits, and a final 1 bit bringing a message of `mlen` bits to a
    /// multiple of the rate `r`. Always at least two bits long.
    ///
    /// # Panics
    ///
    /// Panics if `r == 0`.
    pub fn pad101(r: usize, mlen: usize) -> BitString {
        assert!(r > 0, "r must be positive");
        BitString::from_bit(1)
            .concat(&BitString::zeroes((2 * r - 2 - (mlen % r)) % r))
            .with_bit(1)
    }

    /// Packs the key `k` into an `l`-bit block: a one-byte length prefix
    /// (`l / 8`), the key, and `pad10*` filling the remainder. Makes keys
    /// of different lengths injective under injection into a state.
    ///
    /// # Panics
    ///
    /// Panics if `l == 0`, `l` is not a multiple of 8, or the key and its
    /// 9 bits of framing do not fit in `l` bits.
    pub fn keypack(k: &BitString, l: usize) -> BitString {
        assert!(l > 0, "the key pack length must be positive");
        assert!(l % 8 == 0, "the key pack length must be a multiple of 8");
        assert!(k.len() + 9 <= l, "the key does not fit in the key pack");
        BitString::from_bytes(&[enc8(l / 8)])
            .concat(k)
            .concat(&BitString::pad10(l - 8, k.len()))
    }
}

impl BitXor for &BitString {
    type Output = BitString;

    /// # Panics
    ///
    /// Panics if the two strings have different lengths.
    fn bitxor(self, rhs: &BitString) -> BitString {
        assert!(self.len == rhs.len, "cannot xor two bit strings of different size");
        let bytes = self.bytes.iter().zip(&rhs.bytes).map(|(a, b)| a ^ b).collect();
        BitString { len: self.len, bytes }
    }
}

impl fmt::Debug for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitString({} bits", self.len)?;
        if !self.bytes.is_empty() {
            write!(f, ", 0x")?;
            for b in &self.bytes {
                write!(f, "{b:02x}")?;
            }
        }
        write!(f, ")")
    }
}

impl Zeroize for BitString {
    fn zeroize(&mut self) {
        self.bytes.zeroize();
        self.len = 0;
    }
}

impl Drop for BitString {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

/// An ordered sequence of bit strings, as consumed by the Farfalle
/// compression layer.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct BitStrings(Vec<BitString>);

impl BitStrings {
    /// Returns the empty sequence.
    pub fn new() -> BitStrings {
        BitStrings::default()
    }

    /// The number of strings in the sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the sequence holds no strings.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Appends `m` at the end of the sequence. Sequences are chronological:
    /// the oldest entry (e.g. a session nonce) sits at index 0.
    pub fn push(&mut self, m: BitString) {
        self.0.push(m);
    }

    /// Iterates over the strings in order.
    pub fn iter(&self) -> std::slice::Iter<'_, BitString> {
        self.0.iter()
    }
}

impl From<BitString> for BitStrings {
    fn from(m: BitString) -> BitStrings {
        BitStrings(vec![m])
    }
}

impl From<Vec<BitString>> for BitStrings {
    fn from(v: Vec<BitString>) -> BitStrings {
        BitStrings(v)
    }
}

impl Index<usize> for BitStrings {
    type Output = BitString;

    fn index(&self, i: usize) -> &BitString {
        &self.0[i]
    }
}

impl Zeroize for BitStrings {
    fn zeroize(&mut self) {
        for s in &mut self.0 {
            s.zeroize();
        }
        self.0.clear();
    }
}

/// A read-only view of a bit string as a sequence of `r`-bit blocks.
///
/// A view always exposes at least one block, even over the empty string;
/// the last block may be shorter than `r` bits.
pub struct Blocks<'a> {
    bits: &'a BitString,
    r: usize,
}

impl<'a> Blocks<'a> {
    /// Views `bits` as `r`-bit blocks.
    ///
    /// # Panics
    ///
    /// Panics if `r == 0`.
    pub fn new(bits: &'a BitString, r: usize) -> Blocks<'a> {
        assert!(r > 0, "r must be positive");
        Blocks { bits, r }
    }

    /// The number of blocks; at least 1.
    pub fn len(&self) -> usize {
        if self.bits.len() > 0 {
            (self.bits.len() + self.r - 1) / self.r
        } else {
            1
        }
    }

    /// Returns `true` if the view covers an empty string (it still exposes
    /// one zero-length block).
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// The apparent size of block `i`: `r` bits, or less for a block
    /// reaching past the end of the string (0 when entirely past it).
    pub fn block_len(&self, i: usize) -> usize {
        self.r.min(self.bits.len().saturating_sub(i * self.r))
    }

    /// Copies block `i` out of the backing string.
    pub fn get(&self, i: usize) -> BitString {
        self.bits.substring(i * self.r, self.r)
    }
}

/// A mutable view of a bit string as a sequence of `r`-bit blocks.
///
/// Writing to a block overwrites the backing string at the block's offset;
/// writing past the current end extends it.
pub struct BlocksMut<'a> {
    bits: &'a mut BitString,
    r: usize,
}

impl<'a> BlocksMut<'a> {
    /// Views `bits` as mutable `r`-bit blocks.
    ///
    /// # Panics
    ///
    /// Panics if `r == 0`.
    pub fn new(bits: &'a mut BitString, r: usize) -> BlocksMut<'a> {
        assert!(r > 0, "r must be positive");
        BlocksMut { bits, r }
    }

    /// The number of blocks; at least 1.
    pub fn len(&self) -> usize {
        if self.bits.len() > 0 {
            (self.bits.len() + self.r - 1) / self.r
        } else {
            1
        }
    }

    /// Returns `true` if the view covers an empty string.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// The apparent size of block `i`.
    pub fn block_len(&self, i: usize) -> usize {
        self.r.min(self.bits.len().saturating_sub(i * self.r))
    }

    /// Copies block `i` out of the backing string.
    pub fn get(&self, i: usize) -> BitString {
        self.bits.substring(i * self.r, self.r)
    }

    /// Writes `s` into block `i`.
    ///
    /// # Panics
    ///
    /// Panics if `s` is longer than the block size, or if the block offset
    /// `i * r` is not byte-aligned.
    pub fn set(&mut self, i: usize, s: &BitString) {
        assert!(s.len() <= self.r, "string size must be less than or equal to block size");
        self.bits.overwrite(i * self.r, s);
    }
}
