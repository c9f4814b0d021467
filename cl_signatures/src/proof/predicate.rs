//! Proof that a hidden attribute `m` satisfies `m >= b`, `m > b`, `m <= b` or `m < b`.
//!
//! The predicate is turned into `Δ >= 0` where `Δ = σ*m + k` with `σ = ±1`, then `Δ` is written as
//! a sum of 4 squares `u_0^2 + u_1^2 + u_2^2 + u_3^2` (Lagrange). The prover commits to each `u_i`
//! as `T_i = z^{u_i} * s^{r_i}` and to `Δ` as `T_Δ = z^Δ * s^{r_Δ}` and proves in zero knowledge that
//! - it knows the openings of all commitments,
//! - `T_Δ` commits to `σ*m + k` where `m` is the same attribute as in the equality proof, since the
//!   response for `m` is shared,
//! - `T_Δ = prod(T_i^{u_i}) * s^α` for some `α`, i.e. the committed `Δ` is the sum of the squares.

use crate::{
    constants::{ALPHA_TILDE_BITS, FOUR_SQUARES, R_TILDE_BITS, U_TILDE_BITS, V_PRIME_BITS},
    error::CLError,
    setup::PrimaryPublicKey,
};
use anoncreds_utils::{
    bn::{mod_exp, mod_pow, rand_bits, to_bytes},
    serde_utils::DecimalString,
};
use ark_std::{
    fmt,
    rand::RngCore,
    string::{String, ToString},
    vec::Vec,
};
use num_bigint::{BigInt, BigUint};
use num_integer::Roots;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredicateType {
    #[serde(rename = ">=")]
    GE,
    #[serde(rename = ">")]
    GT,
    #[serde(rename = "<=")]
    LE,
    #[serde(rename = "<")]
    LT,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    pub attr_name: String,
    pub p_type: PredicateType,
    pub value: i32,
}

impl fmt::Display for PredicateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::GE => ">=",
            Self::GT => ">",
            Self::LE => "<=",
            Self::LT => "<",
        })
    }
}

impl Predicate {
    pub fn new(attr_name: impl Into<String>, p_type: PredicateType, value: i32) -> Self {
        Self {
            attr_name: attr_name.into(),
            p_type,
            value,
        }
    }

    /// Whether `Δ` is added or subtracted
    fn is_less(&self) -> bool {
        matches!(self.p_type, PredicateType::LE | PredicateType::LT)
    }

    /// `k` of `Δ = σ*m + k`
    fn delta_offset(&self) -> BigInt {
        let b = BigInt::from(self.value);
        match self.p_type {
            PredicateType::GE => -b,
            PredicateType::GT => -b - 1,
            PredicateType::LE => b,
            PredicateType::LT => b - 1,
        }
    }

    /// `σ*m`
    fn signed(&self, m: &BigUint) -> BigInt {
        let m = BigInt::from(m.clone());
        if self.is_less() {
            -m
        } else {
            m
        }
    }

    /// `Δ` for the given attribute value, negative when the predicate doesn't hold
    pub fn delta(&self, m: &BigUint) -> BigInt {
        self.signed(m) + self.delta_offset()
    }

    pub fn is_satisfied(&self, m: &BigUint) -> bool {
        self.delta(m) >= BigInt::from(0u8)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.attr_name, self.p_type, self.value)
    }
}

/// `[a, b, c, d]` with `a^2 + b^2 + c^2 + d^2 = n`. Larger squares are tried first so the search
/// usually ends after a few steps.
pub fn four_squares(n: u128) -> Option<[u128; FOUR_SQUARES]> {
    for a in (0..=n.sqrt()).rev() {
        let rem = n - a * a;
        for b in (0..=rem.sqrt().min(a)).rev() {
            if let Some((c, d)) = two_squares(rem - b * b, b) {
                return Some([a, b, c, d]);
            }
        }
    }
    None
}

/// `(c, d)` with `c^2 + d^2 = n` and `d <= c <= max`
fn two_squares(n: u128, max: u128) -> Option<(u128, u128)> {
    let mut c = n.sqrt().min(max);
    while c * c >= n - c * c {
        let d = n - c * c;
        let d_root = d.sqrt();
        if d_root * d_root == d {
            return Some((c, d_root));
        }
        if c == 0 {
            break;
        }
        c -= 1;
    }
    None
}

/// Commitments and randomness of a predicate proof, before the challenge is known
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PredicateProtocol {
    predicate: Predicate,
    u: Vec<BigUint>,
    r: Vec<BigUint>,
    r_delta: BigUint,
    t: Vec<BigUint>,
    t_delta: BigUint,
    u_tilde: Vec<BigUint>,
    r_tilde: Vec<BigUint>,
    r_delta_tilde: BigUint,
    alpha_tilde: BigUint,
    tau: Vec<BigUint>,
}

/// Proof of a single predicate about an attribute hidden by the equality proof
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeProof {
    #[serde_as(as = "Vec<DecimalString>")]
    pub u: Vec<BigUint>,
    #[serde_as(as = "Vec<DecimalString>")]
    pub r: Vec<BigUint>,
    #[serde_as(as = "DecimalString")]
    pub r_delta: BigUint,
    /// Response for the attribute, equals the one in the equality proof
    #[serde_as(as = "DecimalString")]
    pub mj: BigUint,
    #[serde_as(as = "DecimalString")]
    pub alpha: BigInt,
    #[serde_as(as = "Vec<DecimalString>")]
    pub t: Vec<BigUint>,
    #[serde_as(as = "DecimalString")]
    pub t_delta: BigUint,
    pub predicate: Predicate,
}

impl PredicateProtocol {
    /// `m` is the attribute's value and `m_tilde` the randomness used for it in the equality proof
    pub fn init<R: RngCore>(
        rng: &mut R,
        pk: &PrimaryPublicKey,
        predicate: Predicate,
        m: &BigUint,
        m_tilde: &BigUint,
    ) -> Result<Self, CLError> {
        let delta = predicate.delta(m);
        if delta < BigInt::from(0u8) {
            return Err(CLError::PredicateNotSatisfied(predicate.to_string()));
        }
        let delta_u128 = delta
            .to_u128()
            .ok_or_else(|| CLError::PredicateValueOutOfRange(predicate.to_string()))?;
        let squares = four_squares(delta_u128)
            .ok_or_else(|| CLError::PredicateValueOutOfRange(predicate.to_string()))?;
        let delta = delta.magnitude().clone();

        let commit = |v: &BigUint, r: &BigUint| -> Result<BigUint, CLError> {
            Ok((mod_pow(&pk.z, v, &pk.n)? * mod_pow(&pk.s, r, &pk.n)?) % &pk.n)
        };

        let mut u = Vec::with_capacity(FOUR_SQUARES);
        let mut r = Vec::with_capacity(FOUR_SQUARES);
        let mut t = Vec::with_capacity(FOUR_SQUARES);
        let mut u_tilde = Vec::with_capacity(FOUR_SQUARES);
        let mut r_tilde = Vec::with_capacity(FOUR_SQUARES);
        let mut tau = Vec::with_capacity(FOUR_SQUARES + 2);
        for s in squares {
            let u_i = BigUint::from(s);
            let r_i = rand_bits(rng, V_PRIME_BITS);
            t.push(commit(&u_i, &r_i)?);
            u.push(u_i);
            r.push(r_i);

            let u_tilde_i = rand_bits(rng, U_TILDE_BITS);
            let r_tilde_i = rand_bits(rng, R_TILDE_BITS);
            tau.push(commit(&u_tilde_i, &r_tilde_i)?);
            u_tilde.push(u_tilde_i);
            r_tilde.push(r_tilde_i);
        }
        let r_delta = rand_bits(rng, V_PRIME_BITS);
        let t_delta = commit(&delta, &r_delta)?;

        let r_delta_tilde = rand_bits(rng, R_TILDE_BITS);
        let tau_delta = (mod_exp(&pk.z, &predicate.signed(m_tilde), &pk.n)?
            * mod_pow(&pk.s, &r_delta_tilde, &pk.n)?)
            % &pk.n;
        tau.push(tau_delta);

        let alpha_tilde = rand_bits(rng, ALPHA_TILDE_BITS);
        let mut q = mod_pow(&pk.s, &alpha_tilde, &pk.n)?;
        for (t_i, u_tilde_i) in t.iter().zip(u_tilde.iter()) {
            q = (q * mod_pow(t_i, u_tilde_i, &pk.n)?) % &pk.n;
        }
        tau.push(q);

        Ok(Self {
            predicate,
            u,
            r,
            r_delta,
            t,
            t_delta,
            u_tilde,
            r_tilde,
            r_delta_tilde,
            alpha_tilde,
            tau,
        })
    }

    /// Commitments `T_0..T_3, T_Δ`
    pub fn c_list(&self) -> Vec<Vec<u8>> {
        self.t
            .iter()
            .chain([&self.t_delta])
            .map(to_bytes)
            .collect()
    }

    pub fn tau_list(&self) -> Vec<Vec<u8>> {
        self.tau.iter().map(to_bytes).collect()
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// `mj` is the response for the attribute from the equality proof
    pub fn gen_proof(self, challenge: &BigUint, mj: BigUint) -> GeProof {
        let u = self
            .u
            .iter()
            .zip(self.u_tilde)
            .map(|(u_i, u_tilde_i)| challenge * u_i + u_tilde_i)
            .collect();
        let r = self
            .r
            .iter()
            .zip(self.r_tilde)
            .map(|(r_i, r_tilde_i)| challenge * r_i + r_tilde_i)
            .collect();
        let r_delta = challenge * &self.r_delta + self.r_delta_tilde;
        let urproduct = self
            .u
            .iter()
            .zip(self.r.iter())
            .fold(BigUint::from(0u8), |acc, (u_i, r_i)| acc + u_i * r_i);
        let alpha = BigInt::from(self.alpha_tilde)
            + BigInt::from(challenge.clone())
                * (BigInt::from(self.r_delta) - BigInt::from(urproduct));
        GeProof {
            u,
            r,
            r_delta,
            mj,
            alpha,
            t: self.t,
            t_delta: self.t_delta,
            predicate: self.predicate,
        }
    }
}

impl GeProof {
    pub fn c_list(&self) -> Vec<Vec<u8>> {
        self.t
            .iter()
            .chain([&self.t_delta])
            .map(to_bytes)
            .collect()
    }

    /// Recompute the commitments of the prover from the responses
    pub fn verify_and_get_tau_list(
        &self,
        pk: &PrimaryPublicKey,
        challenge: &BigUint,
    ) -> Result<Vec<Vec<u8>>, CLError> {
        if self.u.len() != FOUR_SQUARES || self.r.len() != FOUR_SQUARES || self.t.len() != FOUR_SQUARES
        {
            return Err(CLError::MalformedProof);
        }
        let minus_c = -BigInt::from(challenge.clone());
        let mut tau = Vec::with_capacity(FOUR_SQUARES + 2);
        for ((u_i, r_i), t_i) in self.u.iter().zip(self.r.iter()).zip(self.t.iter()) {
            let tau_i = (mod_pow(&pk.z, u_i, &pk.n)? * mod_pow(&pk.s, r_i, &pk.n)?) % &pk.n;
            tau.push((tau_i * mod_exp(t_i, &minus_c, &pk.n)?) % &pk.n);
        }
        let t_delta_inv_c = mod_exp(&self.t_delta, &minus_c, &pk.n)?;

        let z_exp = self.predicate.signed(&self.mj)
            + BigInt::from(challenge.clone()) * self.predicate.delta_offset();
        let tau_delta = (mod_exp(&pk.z, &z_exp, &pk.n)? * mod_pow(&pk.s, &self.r_delta, &pk.n)?)
            % &pk.n;
        tau.push((tau_delta * &t_delta_inv_c) % &pk.n);

        let mut q = mod_exp(&pk.s, &self.alpha, &pk.n)?;
        for (t_i, u_i) in self.t.iter().zip(self.u.iter()) {
            q = (q * mod_pow(t_i, u_i, &pk.n)?) % &pk.n;
        }
        tau.push((q * t_delta_inv_c) % &pk.n);

        Ok(tau.iter().map(to_bytes).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn squares() {
        for n in [0u128, 1, 2, 3, 7, 15, 28, 112, 1 << 20, 999_999_937, u32::MAX as u128] {
            let [a, b, c, d] = four_squares(n).unwrap();
            assert_eq!(a * a + b * b + c * c + d * d, n, "{}", n);
        }
        let n = (i32::MAX as u128) * 2 + 1;
        let [a, b, c, d] = four_squares(n).unwrap();
        assert_eq!(a * a + b * b + c * c + d * d, n);
    }

    #[test]
    fn deltas() {
        let m = BigUint::from(28u8);
        let cases = [
            (PredicateType::GE, 18, true, 10),
            (PredicateType::GE, 28, true, 0),
            (PredicateType::GE, 29, false, -1),
            (PredicateType::GT, 27, true, 0),
            (PredicateType::GT, 28, false, -1),
            (PredicateType::LE, 28, true, 0),
            (PredicateType::LE, 30, true, 2),
            (PredicateType::LE, 27, false, -1),
            (PredicateType::LT, 29, true, 0),
            (PredicateType::LT, 28, false, -1),
            (PredicateType::GE, -5, true, 33),
        ];
        for (p_type, value, satisfied, delta) in cases {
            let p = Predicate::new("age", p_type, value);
            assert_eq!(p.is_satisfied(&m), satisfied, "{}", p);
            assert_eq!(p.delta(&m), BigInt::from(delta), "{}", p);
        }
        assert_eq!(Predicate::new("age", PredicateType::GE, 18).to_string(), "age >= 18");
    }
}
