//! ABI-driven input encoding
//!
//! Turns the JSON input object into the initial witness: each parameter is
//! flattened into field elements following its [`AbiType`] and written to
//! the wires the ABI assigns it. Return values are decoded the other way.

use ark_bn254::Fr;
use circuit::{Abi, AbiType, IntegerSign};
use num_bigint::{BigInt, Sign};
use num_traits::{One, Zero};
use serde_json::{Map, Value};
use types::{Witness, WitnessMap, field_from_bigint, fr_to_bigint, fr_to_hex, parse_bigint};

/// Errors raised while encoding inputs or decoding return values
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// The input document is not a JSON object
    #[error("inputs must be a JSON object")]
    NotAnObject,
    /// A parameter has no value
    #[error("missing input for parameter `{0}`")]
    MissingParameter(String),
    /// A key does not name any parameter or struct member
    #[error("unexpected input `{0}`")]
    UnexpectedParameter(String),
    /// A value has the wrong JSON shape for its type
    #[error("input `{path}` should be {expected}")]
    TypeMismatch {
        /// Dotted/indexed path of the value
        path: String,
        /// Description of the expected shape
        expected: String,
    },
    /// A number or numeric string could not be parsed
    #[error("invalid number for `{path}`: {value}")]
    InvalidNumber {
        /// Path of the value
        path: String,
        /// Offending text
        value: String,
    },
    /// A value does not fit its declared type
    #[error("value {value} of `{path}` does not fit {typ}")]
    OutOfRange {
        /// Path of the value
        path: String,
        /// Offending value
        value: String,
        /// Declared type
        typ: String,
    },
    /// An array or string has the wrong length
    #[error("input `{path}` has length {actual}, expected {expected}")]
    LengthMismatch {
        /// Path of the value
        path: String,
        /// Declared length
        expected: u32,
        /// Supplied length
        actual: usize,
    },
    /// The input text is not valid JSON
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

fn mismatch(path: &str, expected: &str) -> InputError {
    InputError::TypeMismatch {
        path: path.to_string(),
        expected: expected.to_string(),
    }
}

/// Encode the input object into the initial witness
pub fn encode_inputs(abi: &Abi, inputs: &Value) -> Result<WitnessMap, InputError> {
    let object = inputs.as_object().ok_or(InputError::NotAnObject)?;

    if let Some(unknown) = object
        .keys()
        .find(|k| !abi.parameters.iter().any(|p| &p.name == *k))
    {
        return Err(InputError::UnexpectedParameter(unknown.clone()));
    }

    let mut witness = WitnessMap::new();
    for (parameter, wires) in abi.layout() {
        let value = object
            .get(&parameter.name)
            .ok_or_else(|| InputError::MissingParameter(parameter.name.clone()))?;
        let encoded = encode_value(&parameter.name, &parameter.typ, value)?;
        for (wire, element) in wires.zip(encoded) {
            witness.insert(Witness(wire), element);
        }
    }
    Ok(witness)
}

/// Flatten a single value of the given type, in wire order
pub fn encode_value(path: &str, typ: &AbiType, value: &Value) -> Result<Vec<Fr>, InputError> {
    let mut out = Vec::with_capacity(typ.field_count() as usize);
    // (path, type, value) triples; children are pushed in reverse so that
    // popping preserves declaration order
    let mut stack: Vec<(String, &AbiType, &Value)> = vec![(path.to_string(), typ, value)];

    while let Some((path, typ, value)) = stack.pop() {
        match typ {
            AbiType::Field => {
                let n = parse_number(&path, value)?;
                let element = field_from_bigint(&n).map_err(|_| InputError::OutOfRange {
                    path: path.clone(),
                    value: n.to_string(),
                    typ: String::from("field"),
                })?;
                out.push(element);
            }
            AbiType::Boolean => {
                let bit = match value {
                    Value::Bool(b) => *b,
                    Value::Number(_) | Value::String(_) => {
                        let n = parse_number(&path, value)?;
                        if n.is_zero() {
                            false
                        } else if n.is_one() {
                            true
                        } else {
                            return Err(mismatch(&path, "a boolean"));
                        }
                    }
                    _ => return Err(mismatch(&path, "a boolean")),
                };
                out.push(Fr::from(bit));
            }
            AbiType::Integer { sign, width } => {
                let n = parse_number(&path, value)?;
                out.push(encode_integer(&path, n, *sign, *width)?);
            }
            AbiType::Array { length, typ } => {
                let items = value
                    .as_array()
                    .ok_or_else(|| mismatch(&path, "an array"))?;
                if items.len() != *length as usize {
                    return Err(InputError::LengthMismatch {
                        path,
                        expected: *length,
                        actual: items.len(),
                    });
                }
                for (idx, item) in items.iter().enumerate().rev() {
                    stack.push((format!("{}[{}]", path, idx), typ, item));
                }
            }
            AbiType::String { length } => {
                let s = value.as_str().ok_or_else(|| mismatch(&path, "a string"))?;
                if s.len() != *length as usize {
                    return Err(InputError::LengthMismatch {
                        path,
                        expected: *length,
                        actual: s.len(),
                    });
                }
                out.extend(s.bytes().map(|b| Fr::from(u64::from(b))));
            }
            AbiType::Struct { fields, .. } => {
                let object = value
                    .as_object()
                    .ok_or_else(|| mismatch(&path, "an object"))?;
                if let Some(unknown) = object
                    .keys()
                    .find(|k| !fields.iter().any(|f| &f.name == *k))
                {
                    return Err(InputError::UnexpectedParameter(format!(
                        "{}.{}",
                        path, unknown
                    )));
                }
                for field in fields.iter().rev() {
                    let nested = format!("{}.{}", path, field.name);
                    let member = object
                        .get(&field.name)
                        .ok_or_else(|| InputError::MissingParameter(nested.clone()))?;
                    stack.push((nested, &field.typ, member));
                }
            }
        }
    }
    Ok(out)
}

/// Parse a JSON number or a decimal / `0x` hex string
fn parse_number(path: &str, value: &Value) -> Result<BigInt, InputError> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_u64() {
                Ok(BigInt::from(i))
            } else if let Some(i) = n.as_i64() {
                Ok(BigInt::from(i))
            } else {
                Err(InputError::InvalidNumber {
                    path: path.to_string(),
                    value: n.to_string(),
                })
            }
        }
        Value::String(s) => parse_bigint(s).ok_or_else(|| InputError::InvalidNumber {
            path: path.to_string(),
            value: s.clone(),
        }),
        _ => Err(mismatch(path, "a number")),
    }
}

/// Range-check an integer and map it to a field element; negative values
/// of signed types use two's complement over `width` bits
fn encode_integer(path: &str, n: BigInt, sign: IntegerSign, width: u32) -> Result<Fr, InputError> {
    let out_of_range = || InputError::OutOfRange {
        path: path.to_string(),
        value: n.to_string(),
        typ: format!("{:?} integer of width {}", sign, width).to_lowercase(),
    };
    let modulus = BigInt::one() << width;
    let encoded = match sign {
        IntegerSign::Unsigned => {
            if n.sign() == Sign::Minus || n >= modulus {
                return Err(out_of_range());
            }
            n.clone()
        }
        IntegerSign::Signed => {
            let half = BigInt::one() << width.saturating_sub(1);
            if n >= half || n < -half {
                return Err(out_of_range());
            }
            if n.sign() == Sign::Minus {
                modulus + &n
            } else {
                n.clone()
            }
        }
    };
    field_from_bigint(&encoded).map_err(|_| out_of_range())
}

/// Decode field elements back into a JSON value of the given type.
///
/// Fields are rendered as hex strings; integers as JSON numbers when they
/// fit in 64 bits and as decimal strings otherwise.
pub fn decode_value(typ: &AbiType, values: &[Fr]) -> Result<Value, InputError> {
    let mut cursor = values.iter();
    let decoded = decode_from(typ, &mut cursor)?;
    if cursor.next().is_some() {
        return Err(mismatch("return", "fully consumed by its type"));
    }
    Ok(decoded)
}

fn decode_from<'a>(
    typ: &AbiType,
    values: &mut impl Iterator<Item = &'a Fr>,
) -> Result<Value, InputError> {
    let mut next = || {
        values
            .next()
            .copied()
            .ok_or_else(|| mismatch("return", "long enough for its type"))
    };
    Ok(match typ {
        AbiType::Field => Value::String(fr_to_hex(&next()?)),
        AbiType::Boolean => {
            let v = fr_to_bigint(&next()?);
            Value::Bool(!v.is_zero())
        }
        AbiType::Integer { sign, width } => {
            let raw = BigInt::from(fr_to_bigint(&next()?));
            let value = match sign {
                IntegerSign::Signed if raw >= BigInt::one() << width.saturating_sub(1) => {
                    raw - (BigInt::one() << *width)
                }
                _ => raw,
            };
            match (i64::try_from(&value), u64::try_from(&value)) {
                (_, Ok(u)) => Value::from(u),
                (Ok(i), _) => Value::from(i),
                _ => Value::String(value.to_string()),
            }
        }
        AbiType::Array { length, typ } => {
            let mut items = Vec::with_capacity(*length as usize);
            for _ in 0..*length {
                items.push(decode_from(typ, values)?);
            }
            Value::Array(items)
        }
        AbiType::String { length } => {
            let mut bytes = Vec::with_capacity(*length as usize);
            for _ in 0..*length {
                let v = fr_to_bigint(&next()?);
                let byte = u8::try_from(&v).map_err(|_| mismatch("return", "a byte string"))?;
                bytes.push(byte);
            }
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        }
        AbiType::Struct { fields, .. } => {
            let mut object = Map::new();
            for field in fields {
                object.insert(field.name.clone(), decode_from(&field.typ, values)?);
            }
            Value::Object(object)
        }
    })
}
