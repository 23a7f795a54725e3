//! Curve operations behind the C entry points.
//!
//! Safe Rust over `k256` arithmetic. Every function returns `None` (or
//! `false`) where the native library reports failure with `0`.

use k256::{
    FieldBytes, ProjectivePoint, PublicKey, Scalar, U256,
    ecdsa::Signature,
    elliptic_curve::{
        PrimeField, ops::Reduce, point::AffineCoordinates, scalar::IsHigh, sec1::ToEncodedPoint,
    },
};

/// Result codes of `secp256k1_ecdsa_verify`.
pub(crate) const VERIFY_VALID: i32 = 1;
pub(crate) const VERIFY_INVALID: i32 = 0;
pub(crate) const VERIFY_BAD_PUBKEY: i32 = -1;
pub(crate) const VERIFY_BAD_SIGNATURE: i32 = -2;

/// An ECDSA signature with its recovery id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RawSignature {
    pub r: Scalar,
    pub s: Scalar,
    /// Bit 0: R.y is odd. Bit 1: R.x overflowed the group order.
    pub recid: u8,
}

impl RawSignature {
    /// 64-byte `r || s` encoding.
    pub fn to_compact(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&self.r.to_repr());
        out[32..].copy_from_slice(&self.s.to_repr());
        out
    }

    /// Minimal DER encoding.
    pub fn to_der(&self) -> Option<Vec<u8>> {
        let signature = Signature::from_scalars(self.r.to_repr(), self.s.to_repr()).ok()?;
        Some(signature.to_der().as_bytes().to_vec())
    }
}

/// Big-endian encoding of a scalar.
pub(crate) fn scalar_bytes(scalar: &Scalar) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&scalar.to_repr());
    out
}

/// Parse a secret key: a non-zero scalar below the group order.
pub(crate) fn parse_secret_key(bytes: &[u8; 32]) -> Option<Scalar> {
    let scalar = Option::<Scalar>::from(Scalar::from_repr(FieldBytes::from(*bytes)))?;
    (!bool::from(scalar.is_zero())).then_some(scalar)
}

/// Parse a tweak: any scalar below the group order, zero included.
pub(crate) fn parse_tweak(bytes: &[u8; 32]) -> Option<Scalar> {
    Option::<Scalar>::from(Scalar::from_repr(FieldBytes::from(*bytes)))
}

/// Message hash interpreted as a scalar, reduced modulo the group order.
pub(crate) fn message_scalar(msg32: &[u8; 32]) -> Scalar {
    <Scalar as Reduce<U256>>::reduce_bytes(&FieldBytes::from(*msg32))
}

/// Parse a SEC1 public key (33 or 65 bytes). Rejects the point at infinity.
pub(crate) fn parse_public_key(bytes: &[u8]) -> Option<ProjectivePoint> {
    PublicKey::from_sec1_bytes(bytes).ok().map(|key| key.to_projective())
}

/// SEC1 encoding of a point, `None` for the point at infinity.
pub(crate) fn serialize_point(point: &ProjectivePoint, compressed: bool) -> Option<Vec<u8>> {
    if *point == ProjectivePoint::IDENTITY {
        return None;
    }
    Some(point.to_affine().to_encoded_point(compressed).as_bytes().to_vec())
}

/// Sign with an explicit nonce `k`.
///
/// Returns `None` when `k` yields `r == 0` or `s == 0`; the caller retries with
/// the next nonce. The signature is normalized to low S and the recovery id
/// adjusted to match.
pub(crate) fn sign(seckey: &Scalar, msg: &Scalar, k: &Scalar) -> Option<RawSignature> {
    let point = (ProjectivePoint::GENERATOR * *k).to_affine();
    let x = point.x();
    let r = <Scalar as Reduce<U256>>::reduce_bytes(&x);
    if bool::from(r.is_zero()) {
        return None;
    }

    let mut recid = u8::from(bool::from(point.y_is_odd()));
    if r.to_repr() != x {
        recid |= 2;
    }

    let k_inv = Option::<Scalar>::from(k.invert())?;
    let mut s = k_inv * (*msg + r * *seckey);
    if bool::from(s.is_zero()) {
        return None;
    }

    if bool::from(s.is_high()) {
        s = -s;
        recid ^= 1;
    }

    Some(RawSignature { r, s, recid })
}

/// Verify `(r, s)` against a public key. High-S signatures are accepted.
pub(crate) fn verify(msg: &Scalar, r: &Scalar, s: &Scalar, pubkey: &ProjectivePoint) -> bool {
    if bool::from(r.is_zero()) || bool::from(s.is_zero()) {
        return false;
    }
    let Some(s_inv) = Option::<Scalar>::from(s.invert()) else {
        return false;
    };

    let u1 = *msg * s_inv;
    let u2 = *r * s_inv;
    let sum = ProjectivePoint::GENERATOR * u1 + *pubkey * u2;
    if sum == ProjectivePoint::IDENTITY {
        return false;
    }

    <Scalar as Reduce<U256>>::reduce_bytes(&sum.to_affine().x()) == *r
}

/// Verify a DER signature, producing the native result code.
pub(crate) fn verify_der(msg32: &[u8; 32], der: &[u8], pubkey: &[u8]) -> i32 {
    let Some(point) = parse_public_key(pubkey) else {
        return VERIFY_BAD_PUBKEY;
    };
    let Ok(signature) = Signature::from_der(der) else {
        return VERIFY_BAD_SIGNATURE;
    };

    let r: Scalar = *signature.r();
    let s: Scalar = *signature.s();
    if verify(&message_scalar(msg32), &r, &s, &point) { VERIFY_VALID } else { VERIFY_INVALID }
}

/// Recover the public key from a compact signature.
///
/// Recovery ids with bit 1 set (R.x at or above the group order) are not
/// supported and fail; they occur with negligible probability.
pub(crate) fn recover(msg32: &[u8; 32], sig64: &[u8; 64], recid: u8) -> Option<ProjectivePoint> {
    if recid > 1 {
        return None;
    }

    let mut r_bytes = [0u8; 32];
    r_bytes.copy_from_slice(&sig64[..32]);
    let mut s_bytes = [0u8; 32];
    s_bytes.copy_from_slice(&sig64[32..]);

    let r = parse_secret_key(&r_bytes)?;
    let s = parse_secret_key(&s_bytes)?;

    let mut encoded = [0u8; 33];
    encoded[0] = 0x02 | recid;
    encoded[1..].copy_from_slice(&r_bytes);
    let big_r = parse_public_key(&encoded)?;

    let r_inv = Option::<Scalar>::from(r.invert())?;
    let z = message_scalar(msg32);
    let q = (big_r * s - ProjectivePoint::GENERATOR * z) * r_inv;

    (q != ProjectivePoint::IDENTITY).then_some(q)
}

/// `seckey + tweak`, `None` if the tweak overflows or the sum is zero.
pub(crate) fn privkey_tweak_add(seckey: &[u8; 32], tweak: &[u8; 32]) -> Option<[u8; 32]> {
    let d = parse_secret_key(seckey)?;
    let t = parse_tweak(tweak)?;
    let sum = d + t;
    if bool::from(sum.is_zero()) {
        return None;
    }
    Some(scalar_bytes(&sum))
}

/// `seckey * tweak`, `None` if the tweak is zero or overflows.
pub(crate) fn privkey_tweak_mul(seckey: &[u8; 32], tweak: &[u8; 32]) -> Option<[u8; 32]> {
    let d = parse_secret_key(seckey)?;
    let t = parse_secret_key(tweak)?;
    Some(scalar_bytes(&(d * t)))
}

/// `pubkey + tweak * G`, encoded like the input.
pub(crate) fn pubkey_tweak_add(pubkey: &[u8], tweak: &[u8; 32]) -> Option<Vec<u8>> {
    let q = parse_public_key(pubkey)?;
    let t = parse_tweak(tweak)?;
    serialize_point(&(q + ProjectivePoint::GENERATOR * t), pubkey.len() == 33)
}

/// `pubkey * tweak`, encoded like the input.
pub(crate) fn pubkey_tweak_mul(pubkey: &[u8], tweak: &[u8; 32]) -> Option<Vec<u8>> {
    let q = parse_public_key(pubkey)?;
    let t = parse_secret_key(tweak)?;
    serialize_point(&(q * t), pubkey.len() == 33)
}

/// Public key for a secret key.
pub(crate) fn pubkey_create(seckey: &[u8; 32], compressed: bool) -> Option<Vec<u8>> {
    let d = parse_secret_key(seckey)?;
    serialize_point(&(ProjectivePoint::GENERATOR * d), compressed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> [u8; 32] {
        let mut key = [0u8; 32];
        key[31] = byte;
        key
    }

    #[test]
    fn zero_and_order_are_invalid_secret_keys() {
        assert!(parse_secret_key(&[0u8; 32]).is_none());
        assert!(parse_secret_key(&[0xFF; 32]).is_none());
        assert!(parse_secret_key(&key(1)).is_some());
    }

    #[test]
    fn generator_is_public_key_of_one() {
        let pubkey = pubkey_create(&key(1), true).unwrap();
        assert_eq!(
            hex::encode(pubkey),
            "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        );
    }

    #[test]
    fn sign_then_verify_and_recover() {
        let d = parse_secret_key(&key(7)).unwrap();
        let z = message_scalar(&[0x42; 32]);
        let k = parse_secret_key(&key(99)).unwrap();

        let signature = sign(&d, &z, &k).unwrap();
        assert!(!bool::from(signature.s.is_high()), "signatures are low-S");

        let q = ProjectivePoint::GENERATOR * d;
        assert!(verify(&z, &signature.r, &signature.s, &q));

        let recovered = recover(&[0x42; 32], &signature.to_compact(), signature.recid).unwrap();
        assert_eq!(recovered, q);
    }

    #[test]
    fn high_s_still_verifies() {
        let d = parse_secret_key(&key(7)).unwrap();
        let z = message_scalar(&[0x11; 32]);
        let k = parse_secret_key(&key(5)).unwrap();
        let signature = sign(&d, &z, &k).unwrap();

        let q = ProjectivePoint::GENERATOR * d;
        assert!(verify(&z, &signature.r, &-signature.s, &q));
    }

    #[test]
    fn verify_der_reports_bad_inputs() {
        let pubkey = pubkey_create(&key(3), true).unwrap();
        assert_eq!(verify_der(&[0u8; 32], &[0x30, 0x00], &pubkey), VERIFY_BAD_SIGNATURE);
        assert_eq!(verify_der(&[0u8; 32], &[0x30, 0x00], &[0x02; 10]), VERIFY_BAD_PUBKEY);
    }

    #[test]
    fn tweak_add_overflow_fails() {
        assert!(privkey_tweak_add(&key(1), &[0xFF; 32]).is_none());
    }

    #[test]
    fn tweak_add_matches_point_addition() {
        let tweaked = privkey_tweak_add(&key(2), &key(3)).unwrap();
        assert_eq!(tweaked, key(5));

        let pubkey = pubkey_create(&key(2), true).unwrap();
        let tweaked_pub = pubkey_tweak_add(&pubkey, &key(3)).unwrap();
        assert_eq!(tweaked_pub, pubkey_create(&key(5), true).unwrap());
    }

    #[test]
    fn tweak_mul_matches_point_multiplication() {
        assert_eq!(privkey_tweak_mul(&key(2), &key(3)).unwrap(), key(6));

        let pubkey = pubkey_create(&key(2), false).unwrap();
        let tweaked_pub = pubkey_tweak_mul(&pubkey, &key(3)).unwrap();
        assert_eq!(tweaked_pub, pubkey_create(&key(6), false).unwrap());
        assert!(pubkey_tweak_mul(&pubkey, &[0u8; 32]).is_none());
    }
}
