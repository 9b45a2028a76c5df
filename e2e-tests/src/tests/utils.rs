//! Fixtures and builders shared by the end-to-end tests

// Field arithmetic is modular and cannot overflow.
#![allow(clippy::arithmetic_side_effects)]

use std::path::PathBuf;

use anyhow::Result;
use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use circuit::{AbiField, AbiType, AbiVisibility, Artifact, CircuitBuilder};
use serde_json::Value;

/// Seed for the development keys used throughout the tests
pub const SEED: u64 = 0x5eed;

/// Path of a file under `fixtures/`
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name)
}

/// Load an artifact fixture
pub fn load_artifact(name: &str) -> Result<Artifact> {
    Ok(Artifact::from_file(fixture_path(name))?)
}

/// Load an input document fixture
pub fn load_inputs(name: &str) -> Result<Value> {
    let text = std::fs::read_to_string(fixture_path(name))?;
    Ok(serde_json::from_str(&text)?)
}

/// Knowledge of a preimage under a cubic map: `x^3 + x + 5 == out`, with
/// `out` public and the result `x + out` returned
pub fn cubic_artifact() -> Result<Artifact> {
    let mut b = CircuitBuilder::new();
    let x = b.add_parameter("x", AbiType::Field, AbiVisibility::Private)?[0];
    let out = b.add_parameter("out", AbiType::Field, AbiVisibility::Public)?[0];
    let x2 = b.mul(x, x);
    let x3 = b.mul(x2, x);
    let lhs = b.linear(&[(Fr::from(1u64), x3), (Fr::from(1u64), x)], Fr::from(5u64));
    b.assert_equal(lhs, out);
    let ret = b.add(x, out);
    b.set_return(vec![ret], AbiType::Field);
    Ok(b.build_artifact("cubic")?)
}

/// Work bound on burn secrets: `mimc7(secret, 2)` must fit in this many bits
pub const POW_BITS: u32 = 250;

/// Proof of burn: for a private `secret`, return the burn address
/// `mimc7(secret, 0)` and the nullifier `mimc7(secret, 1)`, and require
/// `mimc7(secret, 2)` to fit in [`POW_BITS`] bits
pub fn burn_artifact() -> Result<Artifact> {
    let mut b = CircuitBuilder::new();
    let secret = b.add_parameter("secret", AbiType::Field, AbiVisibility::Private)?[0];
    let address = b.mimc7_with_key(secret, Fr::from(0u64));
    let nullifier = b.mimc7_with_key(secret, Fr::from(1u64));
    let work = b.mimc7_with_key(secret, Fr::from(2u64));
    b.range(work, POW_BITS);
    let field = |name: &str| AbiField {
        name: name.to_owned(),
        typ: AbiType::Field,
    };
    b.set_return(
        vec![address, nullifier],
        AbiType::Struct {
            path: String::from("burn::Burn"),
            fields: vec![field("address"), field("nullifier")],
        },
    );
    Ok(b.build_artifact("burn")?)
}

/// First secret from `start` upwards whose work hash fits in `max_bits`,
/// or exceeds it when `fits` is false
pub fn find_secret(start: u64, max_bits: u32, fits: bool) -> Fr {
    let mut secret = Fr::from(start);
    loop {
        let bits = circuit::mimc7(secret, Fr::from(2u64)).into_bigint().num_bits();
        if (bits <= max_bits) == fits {
            return secret;
        }
        secret += Fr::from(1u64);
    }
}

/// A constraint `A * B = C` over Circom wire ids
pub struct R1csConstraint {
    /// `(wire, coefficient)` pairs of A
    pub a: Vec<(u32, u64)>,
    /// `(wire, coefficient)` pairs of B
    pub b: Vec<(u32, u64)>,
    /// `(wire, coefficient)` pairs of C
    pub c: Vec<(u32, u64)>,
}

/// Encode a binary R1CS file with a header and a constraint section
pub fn encode_r1cs(
    num_wires: u32,
    num_pub_out: u32,
    num_pub_in: u32,
    num_prv_in: u32,
    constraints: &[R1csConstraint],
) -> Vec<u8> {
    let mut header = Vec::new();
    header.extend_from_slice(&32u32.to_le_bytes());
    header.extend_from_slice(&Fr::MODULUS.to_bytes_le());
    for v in [num_wires, num_pub_out, num_pub_in, num_prv_in] {
        header.extend_from_slice(&v.to_le_bytes());
    }
    header.extend_from_slice(&u64::from(num_wires).to_le_bytes());
    header.extend_from_slice(&u32::try_from(constraints.len()).unwrap_or(u32::MAX).to_le_bytes());

    let mut body = Vec::new();
    for constraint in constraints {
        for lc in [&constraint.a, &constraint.b, &constraint.c] {
            body.extend_from_slice(&u32::try_from(lc.len()).unwrap_or(u32::MAX).to_le_bytes());
            for (wire, coefficient) in lc {
                body.extend_from_slice(&wire.to_le_bytes());
                body.extend_from_slice(&types::fr_to_le_bytes(&Fr::from(*coefficient)));
            }
        }
    }

    let mut out = Vec::new();
    out.extend_from_slice(b"r1cs");
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&2u32.to_le_bytes());
    for (section_type, section) in [(1u32, &header), (2u32, &body)] {
        out.extend_from_slice(&section_type.to_le_bytes());
        out.extend_from_slice(&(section.len() as u64).to_le_bytes());
        out.extend_from_slice(section);
    }
    out
}

/// Circom-layout witness: the constant one followed by `values`
pub fn circom_witness(values: &[u64]) -> Vec<u8> {
    std::iter::once(1u64)
        .chain(values.iter().copied())
        .flat_map(|v| types::fr_to_le_bytes(&Fr::from(v)))
        .collect()
}
