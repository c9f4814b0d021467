//! Serde adapters for types which don't implement serde themselves: arkworks objects and
//! arbitrary precision integers.
//!
//! - arkworks objects are written with their compressed canonical encoding, as a hex string for
//!   human readable formats like JSON and as raw bytes otherwise.
//! - integers are written as decimal strings, the representation AnonCreds objects use on the wire.

use ark_serialize::{CanonicalDeserialize, CanonicalSerialize, SerializationError};
use ark_std::{
    collections::BTreeMap,
    fmt, io,
    str::FromStr,
    string::{String, ToString},
    vec::Vec,
};
use num_bigint::{BigInt, BigUint};
use serde::{
    de::{self, MapAccess, SeqAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};
use serde_with::{DeserializeAs, SerializeAs};

pub type ArkObjectBytes = AsCanonical;

pub struct AsCanonical;

impl<T: CanonicalSerialize> SerializeAs<T> for AsCanonical {
    fn serialize_as<S: Serializer>(x: &T, serializer: S) -> Result<S::Ok, S::Error> {
        let mut bytes = Vec::with_capacity(x.compressed_size());
        x.serialize_compressed(&mut bytes)
            .map_err(serde::ser::Error::custom)?;
        if serializer.is_human_readable() {
            serializer.serialize_str(&hex::encode(bytes))
        } else {
            serializer.serialize_bytes(&bytes)
        }
    }
}

impl<'de, T: CanonicalDeserialize> DeserializeAs<'de, T> for AsCanonical {
    fn deserialize_as<D: Deserializer<'de>>(deserializer: D) -> Result<T, D::Error> {
        let bytes = if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            hex::decode(s).map_err(de::Error::custom)?
        } else {
            deserializer.deserialize_byte_buf(BytesVisitor)?
        };
        T::deserialize_compressed(bytes.as_slice()).map_err(de::Error::custom)
    }
}

struct BytesVisitor;

impl<'de> Visitor<'de> for BytesVisitor {
    type Value = Vec<u8>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a byte array")
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
        Ok(v.to_vec())
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Self::Value, E> {
        Ok(v)
    }

    // Some binary formats write bytes as a sequence of integers
    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut v = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(b) = seq.next_element::<u8>()? {
            v.push(b);
        }
        Ok(v)
    }
}

#[derive(Serialize)]
#[serde(remote = "SerializationError")]
pub enum ArkSerializationError {
    /// During serialization, we didn't have enough space to write extra info.
    NotEnoughSpace,
    /// During serialization, the data was invalid.
    InvalidData,
    /// During serialization, non-empty flags were given where none were
    /// expected.
    UnexpectedFlags,
    /// During serialization, we countered an I/O error.
    #[serde(serialize_with = "io_error_string")]
    IoError(io::Error),
}

fn io_error_string<S: Serializer>(error: &io::Error, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&error.to_string())
}

/// Writes an integer as a decimal string and reads it from a decimal string. A JSON number is
/// accepted when reading as long as it fits in 64 bits.
pub struct DecimalString;

impl SerializeAs<BigUint> for DecimalString {
    fn serialize_as<S: Serializer>(x: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&x.to_str_radix(10))
    }
}

impl<'de> DeserializeAs<'de, BigUint> for DecimalString {
    fn deserialize_as<D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        deserializer.deserialize_any(DecimalVisitor)
    }
}

impl SerializeAs<BigInt> for DecimalString {
    fn serialize_as<S: Serializer>(x: &BigInt, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&x.to_str_radix(10))
    }
}

impl<'de> DeserializeAs<'de, BigInt> for DecimalString {
    fn deserialize_as<D: Deserializer<'de>>(deserializer: D) -> Result<BigInt, D::Error> {
        let s = String::deserialize(deserializer)?;
        BigInt::from_str(&s).map_err(de::Error::custom)
    }
}

struct DecimalVisitor;

impl<'de> Visitor<'de> for DecimalVisitor {
    type Value = BigUint;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a non-negative integer as a decimal string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        BigUint::from_str(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(BigUint::from(v))
    }
}

/// A map from names to integers. Written as a map of decimal strings. Read from either such a map
/// or a sequence of `[name, value]` pairs, the other shape some implementations emit.
pub struct NamedIntegers;

impl SerializeAs<BTreeMap<String, BigUint>> for NamedIntegers {
    fn serialize_as<S: Serializer>(
        x: &BTreeMap<String, BigUint>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(x.len()))?;
        for (k, v) in x {
            map.serialize_entry(k, &v.to_str_radix(10))?;
        }
        map.end()
    }
}

impl<'de> DeserializeAs<'de, BTreeMap<String, BigUint>> for NamedIntegers {
    fn deserialize_as<D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<String, BigUint>, D::Error> {
        deserializer.deserialize_any(NamedIntegersVisitor)
    }
}

struct NamedIntegersVisitor;

/// One entry of the pair shape or one value of the map shape
struct Decimal(BigUint);

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DecimalVisitor).map(Decimal)
    }
}

impl<'de> Visitor<'de> for NamedIntegersVisitor {
    type Value = BTreeMap<String, BigUint>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of names to decimal strings or a list of [name, decimal string]")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = BTreeMap::new();
        while let Some((k, v)) = access.next_entry::<String, Decimal>()? {
            if map.insert(k, v.0).is_some() {
                return Err(de::Error::custom("duplicate name"));
            }
        }
        Ok(map)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut map = BTreeMap::new();
        while let Some((k, v)) = seq.next_element::<(String, Decimal)>()? {
            if map.insert(k, v.0).is_some() {
                return Err(de::Error::custom("duplicate name"));
            }
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::{Fr, G1Affine};
    use ark_std::{
        rand::{rngs::StdRng, SeedableRng},
        UniformRand,
    };
    use serde_with::serde_as;

    #[serde_as]
    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        #[serde_as(as = "ArkObjectBytes")]
        f: Fr,
        #[serde_as(as = "ArkObjectBytes")]
        g: G1Affine,
        #[serde_as(as = "DecimalString")]
        n: BigUint,
        #[serde_as(as = "DecimalString")]
        i: BigInt,
        #[serde_as(as = "NamedIntegers")]
        m: BTreeMap<String, BigUint>,
    }

    #[test]
    fn json_shapes() {
        let mut rng = StdRng::seed_from_u64(0u64);
        let mut m = BTreeMap::new();
        m.insert("age".to_string(), BigUint::from(28u8));
        m.insert("master_secret".to_string(), BigUint::from(u128::MAX));
        let s = Sample {
            f: Fr::rand(&mut rng),
            g: G1Affine::rand(&mut rng),
            n: BigUint::from(12345678901234567890u64) * 1000u32,
            i: BigInt::from(-42),
            m,
        };
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["n"], "12345678901234567890000");
        assert_eq!(json["i"], "-42");
        assert_eq!(json["m"]["age"], "28");
        assert!(json["g"].is_string());
        let back: Sample = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(back, s);

        // Pair shape of the map is read into the same value
        let mut pairs = json.clone();
        pairs["m"] = serde_json::json!([
            ["age", "28"],
            ["master_secret", u128::MAX.to_string()]
        ]);
        let back: Sample = serde_json::from_value(pairs).unwrap();
        assert_eq!(back, s);

        let mut dup = json;
        dup["m"] = serde_json::json!([["age", "28"], ["age", "29"]]);
        assert!(serde_json::from_value::<Sample>(dup).is_err());
    }
}
