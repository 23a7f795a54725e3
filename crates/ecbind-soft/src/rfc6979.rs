//! RFC6979 nonce generation (HMAC-SHA256 DRBG, section 3.2).
//!
//! Seeded with `key32 || msg32 || data32`, where `data32` is the optional extra
//! entropy passed through the nonce function's `data` pointer. Attempt `n`
//! returns the `n`-th output of the generator (counting from zero), so a signer
//! that rejects a nonce asks again with `attempt + 1`.

use ::rfc6979::HmacDrbg;
use sha2::Sha256;
use zeroize::Zeroize;

/// The nonce for `attempt`, optionally mixing in 32 bytes of extra entropy.
pub(crate) fn nonce(
    msg32: &[u8; 32],
    key32: &[u8; 32],
    extra: Option<&[u8; 32]>,
    attempt: u32,
) -> [u8; 32] {
    let extra: &[u8] = match extra {
        Some(data) => data,
        None => &[],
    };
    let mut drbg = HmacDrbg::<Sha256>::new(key32, msg32, extra);

    let mut candidate = [0u8; 32];
    drbg.fill_bytes(&mut candidate);
    for _ in 0..attempt {
        candidate.zeroize();
        drbg.fill_bytes(&mut candidate);
    }
    candidate
}

#[cfg(test)]
mod tests {
    use sha2::Digest;

    use super::*;

    fn key_one() -> [u8; 32] {
        let mut key = [0u8; 32];
        key[31] = 1;
        key
    }

    #[test]
    fn matches_published_secp256k1_vector() {
        // d = 1, m = "Satoshi Nakamoto"
        let mut msg = [0u8; 32];
        msg.copy_from_slice(&Sha256::digest(b"Satoshi Nakamoto"));
        let k = nonce(&msg, &key_one(), None, 0);
        assert_eq!(
            hex::encode(k),
            "8f8a276c19f4149656b280621e358cce24f5f52542772691ee69063b74f15d15"
        );
    }

    #[test]
    fn attempts_produce_distinct_nonces() {
        let msg = [0x07; 32];
        let first = nonce(&msg, &key_one(), None, 0);
        let second = nonce(&msg, &key_one(), None, 1);
        let third = nonce(&msg, &key_one(), None, 2);

        assert_ne!(first, second);
        assert_ne!(second, third);
    }

    #[test]
    fn attempt_n_continues_the_same_stream() {
        let msg = [0x55; 32];
        let mut drbg = HmacDrbg::<Sha256>::new(&key_one(), &msg, &[]);
        let mut out = [0u8; 32];
        drbg.fill_bytes(&mut out);
        assert_eq!(out, nonce(&msg, &key_one(), None, 0));
        drbg.fill_bytes(&mut out);
        drbg.fill_bytes(&mut out);
        assert_eq!(out, nonce(&msg, &key_one(), None, 2));
    }

    #[test]
    fn extra_entropy_changes_the_nonce() {
        let msg = [0x01; 32];
        let plain = nonce(&msg, &key_one(), None, 0);
        let mixed = nonce(&msg, &key_one(), Some(&[0xAA; 32]), 0);
        assert_ne!(plain, mixed);
    }

    #[test]
    fn deterministic() {
        let msg = [0x33; 32];
        assert_eq!(nonce(&msg, &key_one(), None, 5), nonce(&msg, &key_one(), None, 5));
    }
}
