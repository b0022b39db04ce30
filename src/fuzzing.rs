#![cfg(test)]

use proptest::collection::vec;
use proptest::prelude::*;

use crate::bits::{BitString, BitStrings};
use crate::farfalle::{Farfalle, IdentityRollingFunction};
use crate::keccak::{KeccakIter, KeccakP};
use crate::monkey::MonkeyWrap;
use crate::siv::FarfalleSiv;
use crate::wbc::FarfalleWbc;

fn arb_bits(max_bytes: usize) -> impl Strategy<Value = BitString> {
    (vec(any::<u8>(), 0..max_bytes), 0usize..8).prop_map(|(bytes, cut)| {
        let mut s = BitString::from_bytes(&bytes);
        s.truncate((bytes.len() * 8).saturating_sub(cut));
        s
    })
}

fn farfalle(rounds: usize) -> Farfalle<KeccakP, IdentityRollingFunction, IdentityRollingFunction> {
    let p = KeccakP::new(200, rounds);
    Farfalle::new(p, p, p, p, IdentityRollingFunction, IdentityRollingFunction)
}

proptest! {
    #[test]
    fn substring_of_full_length_is_identity(a in arb_bits(64)) {
        prop_assert_eq!(a.substring(0, a.len()), a);
    }

    #[test]
    fn concat_with_empty_is_identity(a in arb_bits(64)) {
        prop_assert_eq!(a.concat(&BitString::new()), a.clone());
        prop_assert_eq!(BitString::new().concat(&a), a);
    }

    #[test]
    fn concat_is_associative(a in arb_bits(24), b in arb_bits(24), c in arb_bits(24)) {
        prop_assert_eq!(a.concat(&b).concat(&c), a.concat(&b.concat(&c)));
    }

    #[test]
    fn concat_lengths_add_and_substrings_recover(a in arb_bits(32), b in arb_bits(32)) {
        let joined = a.concat(&b);
        prop_assert_eq!(joined.len(), a.len() + b.len());
        prop_assert_eq!(joined.substring(0, a.len()), a.clone());
        prop_assert_eq!(joined.substring(a.len(), b.len()), b);
    }

    #[test]
    fn padding_aligns_any_message_length(r in 1usize..64, mlen in 0usize..256) {
        let p10 = BitString::pad10(r, mlen);
        prop_assert_eq!((mlen + p10.len()) % r, 0);
        prop_assert_eq!(p10.bit(0), 1);

        let p101 = BitString::pad101(r, mlen);
        prop_assert!(p101.len() >= 2);
        prop_assert_eq!((mlen + p101.len()) % r, 0);
        prop_assert_eq!(p101.bit(0), 1);
        prop_assert_eq!(p101.bit(p101.len() - 1), 1);
    }

    #[test]
    fn monkey_wrap_round_trips(
        key in vec(any::<u8>(), 12..=22),
        ad in arb_bits(40),
        body in arb_bits(40),
        ell in 0usize..160,
    ) {
        let key = BitString::from_bytes(&key);
        let nonce = BitString::zeroes(200 - 18 - key.len());

        let mut sender = MonkeyWrap::new(KeccakIter::new(200), 16, 12, 1, 6);
        sender.initialize(&key, &nonce);
        let (c, t) = sender.wrap(&ad, &body, ell);
        prop_assert_eq!(c.len(), body.len());
        prop_assert_eq!(t.len(), ell);

        let mut receiver = MonkeyWrap::new(KeccakIter::new(200), 16, 12, 1, 6);
        receiver.initialize(&key, &nonce);
        prop_assert_eq!(receiver.unwrap(&ad, &c, &t), Some(body));
    }

    #[test]
    fn siv_round_trips(
        key in vec(any::<u8>(), 0..24),
        a in arb_bits(32),
        p in arb_bits(48),
    ) {
        let siv = FarfalleSiv::new(farfalle(4), 64);
        let key = BitString::from_bytes(&key);
        let (c, t) = siv.wrap(&key, &a, &p);
        prop_assert_eq!(siv.unwrap(&key, &a, &c, &t), Some(p));
    }

    #[test]
    fn wbc_deciphers_what_it_enciphers(
        key in vec(any::<u8>(), 0..24),
        w in arb_bits(16),
        n in 0usize..600,
    ) {
        let wbc = FarfalleWbc::new(farfalle(4), farfalle(4), 8);
        let key = BitString::from_bytes(&key);
        let p = BitString::ones(n);
        let c = wbc.encipher(&key, &w, &p);
        prop_assert_eq!(c.len(), n);
        prop_assert_eq!(wbc.decipher(&key, &w, &c), p);
    }

    #[test]
    fn farfalle_stream_is_consistent_across_offsets(
        key in vec(any::<u8>(), 0..24),
        m in arb_bits(32),
        n in 0usize..300,
        q in 0usize..300,
    ) {
        let f = farfalle(4);
        let key = BitString::from_bytes(&key);
        let mseq = BitStrings::from(m);
        let stream = f.eval(&key, &mseq, n + q, 0);
        prop_assert_eq!(f.eval(&key, &mseq, n, q), stream.substring(q, n));
    }
}
