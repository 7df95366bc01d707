use std::iter;

use ethereum_types::H160;
use itertools::Itertools;

use super::{AbiError, AbiType, AbiValue, WORD_SIZE};
use crate::address::Address;
use crate::numeric::I256;
use crate::utils::{left_pad, right_pad_to_word};
use crate::U256;

/// Selector of the `Error(string)` revert payload.
const REVERT_ERROR_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];
/// Selector of the `Panic(uint256)` revert payload.
const REVERT_PANIC_SELECTOR: [u8; 4] = [0x4e, 0x48, 0x7b, 0x71];

fn uint_word(value: U256) -> [u8; WORD_SIZE] {
    let mut word = [0; WORD_SIZE];
    value.to_big_endian(&mut word);
    word
}

fn usize_word(value: usize) -> [u8; WORD_SIZE] {
    uint_word(U256::from(value))
}

pub fn encode_parameters(types: &[AbiType], values: &[AbiValue]) -> Result<Vec<u8>, AbiError> {
    //! Encode values according to their declared types.
    //!
    //! The result has no function selector: TRON contract calls carry the
    //! textual signature separately.
    if types.len() != values.len() {
        return Err(AbiError::ArityMismatch {
            context: "parameters".to_string(),
            expected: types.len(),
            got: values.len(),
        });
    }
    let types: Vec<&AbiType> = types.iter().collect();
    encode_sequence(&types, values)
}

fn sequence_head_size(types: &[&AbiType]) -> Result<usize, AbiError> {
    types.iter().try_fold(0usize, |total, ty| {
        total.checked_add(ty.head_size()?).ok_or_else(|| {
            AbiError::UnsupportedAbiType(format!("({})", types.iter().join(",")))
        })
    })
}

fn encode_sequence(types: &[&AbiType], values: &[AbiValue]) -> Result<Vec<u8>, AbiError> {
    let head_size = sequence_head_size(types)?;
    let mut head = vec![];
    let mut tail = vec![];
    for (ty, value) in types.iter().zip(values) {
        let encoded = encode_value(ty, value)?;
        if ty.is_dynamic() {
            head.extend_from_slice(&usize_word(head_size + tail.len()));
            tail.extend(encoded);
        } else {
            head.extend(encoded);
        }
    }
    head.extend(tail);
    Ok(head)
}

fn encode_dynamic_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut out = usize_word(bytes.len()).to_vec();
    out.extend(right_pad_to_word(bytes));
    out
}

fn encode_items(
    ty: &AbiType,
    inner: &AbiType,
    expected: Option<usize>,
    items: &[AbiValue],
) -> Result<Vec<u8>, AbiError> {
    if let Some(expected) = expected {
        if items.len() != expected {
            return Err(AbiError::ArityMismatch {
                context: ty.to_string(),
                expected,
                got: items.len(),
            });
        }
    }
    let types: Vec<&AbiType> = iter::repeat(inner).take(items.len()).collect();
    encode_sequence(&types, items)
}

fn encode_value(ty: &AbiType, value: &AbiValue) -> Result<Vec<u8>, AbiError> {
    let encoded = match (ty, value) {
        (AbiType::Address, AbiValue::Address(address)) => {
            left_pad::<WORD_SIZE>(address.identifier().as_bytes())
                .ok_or_else(|| AbiError::mismatch(ty, address))?
                .to_vec()
        }
        (AbiType::Bool, AbiValue::Bool(b)) => usize_word(usize::from(*b)).to_vec(),
        (AbiType::Uint(bits), AbiValue::Uint(v)) => {
            if v.bits() > *bits {
                return Err(AbiError::mismatch(ty, v));
            }
            uint_word(*v).to_vec()
        }
        (AbiType::TrcToken, AbiValue::Uint(v)) => uint_word(*v).to_vec(),
        (AbiType::Int(bits), AbiValue::Int(v)) => {
            if !v.fits_in_bits(*bits) {
                return Err(AbiError::mismatch(ty, v));
            }
            uint_word(v.into_raw()).to_vec()
        }
        (AbiType::FixedBytes(size), AbiValue::FixedBytes(bytes)) => {
            if bytes.len() != *size || *size > WORD_SIZE {
                return Err(AbiError::mismatch(ty, bytes));
            }
            right_pad_to_word(bytes)
        }
        (AbiType::Bytes, AbiValue::Bytes(bytes)) => encode_dynamic_bytes(bytes),
        (AbiType::String, AbiValue::String(s)) => encode_dynamic_bytes(s.as_bytes()),
        (AbiType::Array(inner), AbiValue::Array(items)) => {
            let mut out = usize_word(items.len()).to_vec();
            out.extend(encode_items(ty, inner, None, items)?);
            out
        }
        (AbiType::FixedArray(inner, size), AbiValue::Array(items)) => {
            encode_items(ty, inner, Some(*size), items)?
        }
        (AbiType::Tuple(types), AbiValue::Tuple(items)) => {
            if types.len() != items.len() {
                return Err(AbiError::ArityMismatch {
                    context: ty.to_string(),
                    expected: types.len(),
                    got: items.len(),
                });
            }
            let types: Vec<&AbiType> = types.iter().collect();
            encode_sequence(&types, items)?
        }
        _ => return Err(AbiError::mismatch(ty, value)),
    };
    Ok(encoded)
}

pub fn decode_parameters(types: &[AbiType], data: &[u8]) -> Result<Vec<AbiValue>, AbiError> {
    //! Decode values of given types.
    //!
    //! Truncated data, out-of-range offsets and non-canonical padding are
    //! rejected with [`AbiError::InvalidData`]. Signed integers narrower than
    //! 256 bits must be sign-extended to the full word: `0x..00ff` is not a
    //! valid `int8`, `0xff..ff` is `-1`.
    let types: Vec<&AbiType> = types.iter().collect();
    decode_sequence(&types, data)
}

fn read_word(data: &[u8], offset: usize) -> Result<&[u8], AbiError> {
    offset
        .checked_add(WORD_SIZE)
        .and_then(|end| data.get(offset..end))
        .ok_or_else(|| {
            AbiError::InvalidData(format!(
                "need 32 bytes at offset {offset}, have {}",
                data.len()
            ))
        })
}

fn read_usize(data: &[u8], offset: usize) -> Result<usize, AbiError> {
    let value = U256::from_big_endian(read_word(data, offset)?);
    if value > U256::from(data.len()) {
        return Err(AbiError::InvalidData(format!(
            "offset or length {value} exceeds data size {}",
            data.len()
        )));
    }
    Ok(value.as_usize())
}

fn decode_sequence(types: &[&AbiType], data: &[u8]) -> Result<Vec<AbiValue>, AbiError> {
    let mut offset = 0;
    let mut values = Vec::with_capacity(types.len());
    for ty in types {
        let start = if ty.is_dynamic() {
            read_usize(data, offset)?
        } else {
            offset
        };
        let payload = data.get(start..).ok_or_else(|| {
            AbiError::InvalidData(format!("offset {start} exceeds data size {}", data.len()))
        })?;
        values.push(decode_value(ty, payload)?);
        offset += ty.head_size()?;
    }
    Ok(values)
}

fn decode_dynamic_bytes(data: &[u8]) -> Result<&[u8], AbiError> {
    let len = read_usize(data, 0)?;
    data.get(WORD_SIZE..WORD_SIZE + len).ok_or_else(|| {
        AbiError::InvalidData(format!("byte string of length {len} is truncated"))
    })
}

fn decode_items(inner: &AbiType, count: usize, data: &[u8]) -> Result<Vec<AbiValue>, AbiError> {
    let needed = count
        .checked_mul(inner.head_size()?)
        .filter(|&needed| needed <= data.len() && count <= data.len())
        .is_some();
    if !needed {
        return Err(AbiError::InvalidData(format!(
            "{count} items of {inner} do not fit into {} bytes",
            data.len()
        )));
    }
    let types: Vec<&AbiType> = iter::repeat(inner).take(count).collect();
    decode_sequence(&types, data)
}

fn decode_value(ty: &AbiType, data: &[u8]) -> Result<AbiValue, AbiError> {
    let dirty = || AbiError::InvalidData(format!("non-canonical {ty} word"));
    let value = match ty {
        AbiType::Address => {
            let word = read_word(data, 0)?;
            if word[..12].iter().any(|&b| b != 0) {
                return Err(dirty());
            }
            AbiValue::Address(Address::from_identifier(H160::from_slice(&word[12..])))
        }
        AbiType::Bool => match U256::from_big_endian(read_word(data, 0)?) {
            v if v.is_zero() => AbiValue::Bool(false),
            v if v == U256::one() => AbiValue::Bool(true),
            _ => return Err(dirty()),
        },
        AbiType::Uint(bits) => {
            let value = U256::from_big_endian(read_word(data, 0)?);
            if value.bits() > *bits {
                return Err(dirty());
            }
            AbiValue::Uint(value)
        }
        AbiType::TrcToken => AbiValue::Uint(U256::from_big_endian(read_word(data, 0)?)),
        AbiType::Int(bits) => {
            let value = I256::from_raw(U256::from_big_endian(read_word(data, 0)?));
            if !value.fits_in_bits(*bits) {
                return Err(dirty());
            }
            AbiValue::Int(value)
        }
        AbiType::FixedBytes(size) => {
            let word = read_word(data, 0)?;
            if *size > WORD_SIZE {
                return Err(AbiError::UnsupportedAbiType(ty.to_string()));
            }
            if word[*size..].iter().any(|&b| b != 0) {
                return Err(dirty());
            }
            AbiValue::FixedBytes(word[..*size].to_vec())
        }
        AbiType::Bytes => AbiValue::Bytes(decode_dynamic_bytes(data)?.to_vec()),
        AbiType::String => {
            let bytes = decode_dynamic_bytes(data)?;
            AbiValue::String(
                String::from_utf8(bytes.to_vec())
                    .map_err(|e| AbiError::InvalidData(format!("invalid UTF-8 string: {e}")))?,
            )
        }
        AbiType::Array(inner) => {
            let count = read_usize(data, 0)?;
            AbiValue::Array(decode_items(inner, count, &data[WORD_SIZE..])?)
        }
        AbiType::FixedArray(inner, size) => AbiValue::Array(decode_items(inner, *size, data)?),
        AbiType::Tuple(types) => {
            let types: Vec<&AbiType> = types.iter().collect();
            AbiValue::Tuple(decode_sequence(&types, data)?)
        }
    };
    Ok(value)
}

pub fn decode_revert_reason(data: &[u8]) -> Option<String> {
    //! Extract a human-readable reason from revert output.
    //!
    //! Understands `Error(string)` and `Panic(uint256)` payloads.
    let (selector, body) = (data.get(..4)?, data.get(4..)?);
    if selector == REVERT_ERROR_SELECTOR {
        match decode_parameters(&[AbiType::String], body).ok()?.pop()? {
            AbiValue::String(reason) => Some(reason),
            _ => None,
        }
    } else if selector == REVERT_PANIC_SELECTOR {
        let code = U256::from_big_endian(body.get(..WORD_SIZE)?);
        Some(format!("panic code {code:#x}"))
    } else {
        None
    }
}
