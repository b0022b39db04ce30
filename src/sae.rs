//! Farfalle-SAE: session-supporting authenticated encryption.
//!
//! A session is bound to a nonce at construction and keeps a history of
//! everything it has processed; each tag authenticates the whole session
//! so far, not just the current message. The receiver side verifies the
//! startup tag during construction, so an unauthenticated session can
//! never come into existence.

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::bits::{BitString, BitStrings};
use crate::farfalle::{Farfalle, RollingFunction};
use crate::Permutation;

/// A Farfalle-SAE session.
///
/// Built by [`sender`](FarfalleSae::sender) or
/// [`receiver`](FarfalleSae::receiver); never shared between the two
/// endpoints (each holds its own copy and mutates it in lock-step).
#[derive(ZeroizeOnDrop)]
pub struct FarfalleSae<P, RC, RE> {
    #[zeroize(skip)]
    f: Farfalle<P, RC, RE>,
    #[zeroize(skip)]
    t: usize,
    #[zeroize(skip)]
    offset: usize,
    key: BitString,
    history: BitStrings,
    failed: bool,
}

impl<P, RC, RE> FarfalleSae<P, RC, RE>
where
    P: Permutation,
    RC: RollingFunction,
    RE: RollingFunction,
{
    /// Starts a session: history is the nonce alone, and the startup tag
    /// authenticates it.
    fn start(
        f: Farfalle<P, RC, RE>,
        t: usize,
        l: usize,
        key: &BitString,
        nonce: &BitString,
    ) -> (FarfalleSae<P, RC, RE>, BitString) {
        assert!(l > 0, "the block length must be positive");
        // keystream offset: the first l * ceil(t / l) stream bits are
        // reserved for the tag
        let offset = l * ((t + l - 1) / l);
        let history = BitStrings::from(nonce.clone());
        let tag = f.eval(key, &history, t, 0);
        let session = FarfalleSae { f, t, offset, key: key.clone(), history, failed: false };
        (session, tag)
    }

    /// Starts a sending session; returns it together with the startup tag
    /// to transmit.
    pub fn sender(
        f: Farfalle<P, RC, RE>,
        t: usize,
        l: usize,
        key: &BitString,
        nonce: &BitString,
    ) -> (FarfalleSae<P, RC, RE>, BitString) {
        Self::start(f, t, l, key, nonce)
    }

    /// Starts a receiving session, verifying the transmitted startup tag
    /// in constant time. Returns `None` (and no session at all) when the
    /// tag does not match.
    pub fn receiver(
        f: Farfalle<P, RC, RE>,
        t: usize,
        l: usize,
        key: &BitString,
        nonce: &BitString,
        tag: &BitString,
    ) -> Option<FarfalleSae<P, RC, RE>> {
        let (session, tag_prime) = Self::start(f, t, l, key, nonce);
        if bool::from(tag_prime.ct_eq(tag)) {
            Some(session)
        } else {
            None
        }
    }

    /// Appends this message to the history: metadata with frame bit 0,
    /// ciphertext with frame bit 1. A message with no plaintext records
    /// its metadata even when empty, so that wholly empty messages still
    /// advance the session.
    fn record(&mut self, metadata: &BitString, ciphertext: &BitString) {
        if metadata.len() > 0 || ciphertext.len() == 0 {
            self.history.push(metadata.with_bit(0));
        }
        if ciphertext.len() > 0 {
            self.history.push(ciphertext.with_bit(1));
        }
    }

    /// Encrypts `plaintext` under `metadata`, returning the ciphertext and
    /// a tag over the whole session history.
    ///
    /// # Panics
    ///
    /// Panics if the session already failed authentication.
    pub fn wrap(&mut self, metadata: &BitString, plaintext: &BitString) -> (BitString, BitString) {
        assert!(!self.failed, "the session failed authentication and must not be reused");
        let c = plaintext ^ &self.f.eval(&self.key, &self.history, plaintext.len(), self.offset);
        self.record(metadata, &c);
        let tag = self.f.eval(&self.key, &self.history, self.t, 0);
        (c, tag)
    }

    /// Decrypts `ciphertext` under `metadata` and verifies `tag` in
    /// constant time. On mismatch the plaintext is wiped, the session is
    /// poisoned, and `None` is returned.
    ///
    /// # Panics
    ///
    /// Panics if the session already failed authentication.
    pub fn unwrap(
        &mut self,
        metadata: &BitString,
        ciphertext: &BitString,
        tag: &BitString,
    ) -> Option<BitString> {
        assert!(!self.failed, "the session failed authentication and must not be reused");
        let mut p = ciphertext ^ &self.f.eval(&self.key, &self.history, ciphertext.len(), self.offset);
        self.record(metadata, ciphertext);
        let tag_prime = self.f.eval(&self.key, &self.history, self.t, 0);
        if bool::from(tag_prime.ct_eq(tag)) {
            Some(p)
        } else {
            p.zeroize();
            self.failed = true;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::farfalle::IdentityRollingFunction;
    use crate::keccak::KeccakP;

    type Sae = FarfalleSae<KeccakP, IdentityRollingFunction, IdentityRollingFunction>;

    fn instance() -> Farfalle<KeccakP, IdentityRollingFunction, IdentityRollingFunction> {
        let p = KeccakP::new(800, 6);
        Farfalle::new(p, p, p, p, IdentityRollingFunction, IdentityRollingFunction)
    }

    const T: usize = 128;
    const L: usize = 800;

    fn key() -> BitString {
        BitString::from_bytes(&[0x55; 16])
    }

    fn nonce() -> BitString {
        BitString::from_bytes(b"session nonce")
    }

    fn pair() -> (Sae, Sae) {
        let (tx, t0) = FarfalleSae::sender(instance(), T, L, &key(), &nonce());
        let rx = FarfalleSae::receiver(instance(), T, L, &key(), &nonce(), &t0)
            .expect("startup tag must verify");
        (tx, rx)
    }

    #[test]
    fn startup_tag_mismatch_yields_no_session() {
        let (_, t0) = FarfalleSae::sender(instance(), T, L, &key(), &nonce());
        let bad = &t0 ^ &BitString::from_bit(1).concat(&BitString::zeroes(t0.len() - 1));
        assert!(FarfalleSae::receiver(instance(), T, L, &key(), &nonce(), &bad).is_none());
        assert!(FarfalleSae::receiver(instance(), T, L, &key(), &BitString::from_bytes(b"other"), &t0).is_none());
    }

    #[test]
    fn session_round_trip_over_three_messages() {
        let (mut tx, mut rx) = pair();
        let messages: [(&[u8], &[u8]); 3] = [(b"meta one", b"body one"), (b"", b"body two"), (b"meta only", b"")];
        for (a, p) in messages {
            let a = BitString::from_bytes(a);
            let p = BitString::from_bytes(p);
            let (c, t) = tx.wrap(&a, &p);
            assert_eq!(c.len(), p.len());
            assert_eq!(rx.unwrap(&a, &c, &t), Some(p));
        }
    }

    #[test]
    fn tags_bind_the_whole_history() {
        let (mut tx1, _) = pair();
        let (mut tx2, _) = pair();
        let a = BitString::from_bytes(b"a");
        // same second message, different first message: tags differ
        tx1.wrap(&a, &BitString::from_bytes(b"first"));
        tx2.wrap(&a, &BitString::from_bytes(b"FIRST"));
        let (_, t1) = tx1.wrap(&a, &BitString::from_bytes(b"second"));
        let (_, t2) = tx2.wrap(&a, &BitString::from_bytes(b"second"));
        assert_ne!(t1, t2);
    }

    #[test]
    fn replayed_message_fails() {
        let (mut tx, mut rx) = pair();
        let a = BitString::from_bytes(b"a");
        let (c, t) = tx.wrap(&a, &BitString::from_bytes(b"once"));
        assert!(rx.unwrap(&a, &c, &t).is_some());
        // the history advanced, so the same (C, T) no longer verifies
        let (_, mut rx2) = pair();
        assert!(rx2.unwrap(&a, &c, &t).is_some());
        assert!(rx2.unwrap(&a, &c, &t).is_none());
    }

    #[test]
    fn tampered_tag_fails_and_poisons() {
        let (mut tx, mut rx) = pair();
        let a = BitString::from_bytes(b"a");
        let (c, t) = tx.wrap(&a, &BitString::from_bytes(b"payload"));
        let bad = &t ^ &BitString::from_bit(1).concat(&BitString::zeroes(t.len() - 1));
        assert!(rx.unwrap(&a, &c, &bad).is_none());
    }

    #[test]
    #[should_panic(expected = "must not be reused")]
    fn poisoned_session_rejects_further_calls() {
        let (mut tx, mut rx) = pair();
        let a = BitString::from_bytes(b"a");
        let (c, t) = tx.wrap(&a, &BitString::from_bytes(b"payload"));
        let bad = &t ^ &BitString::from_bit(1).concat(&BitString::zeroes(t.len() - 1));
        assert!(rx.unwrap(&a, &c, &bad).is_none());
        let _ = rx.unwrap(&a, &c, &t);
    }

    #[test]
    fn metadata_and_ciphertext_roles_are_separated() {
        // swapping the roles of identical bytes must not verify
        let (mut tx, mut rx) = pair();
        let x = BitString::from_bytes(b"same");
        let (c, t) = tx.wrap(&x, &x);
        assert!(rx.unwrap(&c, &x, &t).is_none());
    }
}
