use crate::concat_slices;
use ark_ec::AffineRepr;
use ark_std::Zero;
use digest::Digest;
use num_bigint::BigUint;

/// Hashes the concatenation of the given byte strings and interprets the digest as a big-endian
/// integer. This is how every Fiat-Shamir challenge of the CL scheme is computed.
pub fn hash_to_int<D, I, B>(chunks: I) -> BigUint
where
    D: Digest,
    I: IntoIterator<Item = B>,
    B: AsRef<[u8]>,
{
    let mut hasher = D::new();
    for c in chunks {
        hasher.update(c.as_ref());
    }
    BigUint::from_bytes_be(&hasher.finalize())
}

/// Hash bytes to a point on the curve. Returns as Projective coordinates. This is vulnerable to
/// timing attack and is only used when input is public anyway like when generating setup
/// parameters.
pub fn projective_group_elem_from_try_and_incr<G: AffineRepr, D: Digest>(bytes: &[u8]) -> G::Group {
    let mut hash = D::digest(bytes);
    let mut j = 1u64;
    loop {
        if let Some(g) = G::from_random_bytes(&hash) {
            let g = g.mul_by_cofactor_to_group();
            if !g.is_zero() {
                return g;
            }
        }
        hash = D::digest(&concat_slices!(bytes, b"-attempt-", j.to_le_bytes()));
        j += 1;
    }
}

/// Same as [`projective_group_elem_from_try_and_incr`] but returns Affine coordinates.
pub fn affine_group_elem_from_try_and_incr<G: AffineRepr, D: Digest>(bytes: &[u8]) -> G {
    projective_group_elem_from_try_and_incr::<G, D>(bytes).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::{G1Affine, G2Affine};
    use sha2::{Sha256, Sha512};

    #[test]
    fn hashing() {
        let a = hash_to_int::<Sha256, _, _>([b"abc".as_slice(), b"def".as_slice()]);
        let b = hash_to_int::<Sha256, _, _>([b"abcdef"]);
        assert_eq!(a, b);
        assert!(a.bits() <= 256);
        assert_ne!(a, hash_to_int::<Sha256, _, _>([b"abcdeg"]));

        let g1 = affine_group_elem_from_try_and_incr::<G1Affine, Sha512>(b"test : g1");
        let g2 = affine_group_elem_from_try_and_incr::<G2Affine, Sha512>(b"test : g2");
        assert!(!g1.is_zero() && !g2.is_zero());
        assert!(g1.is_on_curve() && g1.is_in_correct_subgroup_assuming_on_curve());
        assert_eq!(
            g1,
            affine_group_elem_from_try_and_incr::<G1Affine, Sha512>(b"test : g1")
        );
    }
}
