use std::fmt;
use std::str::FromStr;

use itertools::Itertools;

use super::{AbiError, WORD_SIZE};

/// Declared type of a contract parameter.
///
/// Parsed once from its textual form; encoding and decoding then dispatch
/// on the variant instead of inspecting strings.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AbiType {
    /// 20-byte address (prefixed with `0x41` on the TRON side).
    Address,
    /// Boolean.
    Bool,
    /// Unsigned integer of given bit width.
    Uint(usize),
    /// Signed integer of given bit width.
    Int(usize),
    /// `bytesN`, `1 <= N <= 32`.
    FixedBytes(usize),
    /// Dynamic byte string.
    Bytes,
    /// Dynamic UTF-8 string.
    String,
    /// TRC-10 token id, encoded as `uint256`.
    TrcToken,
    /// `T[]`.
    Array(Box<AbiType>),
    /// `T[k]`.
    FixedArray(Box<AbiType>, usize),
    /// `(T1,T2,...)`.
    Tuple(Vec<AbiType>),
}

impl AbiType {
    pub fn is_dynamic(&self) -> bool {
        //! Does this type store its payload out of line?
        match self {
            Self::Bytes | Self::String | Self::Array(_) => true,
            Self::FixedArray(inner, _) => inner.is_dynamic(),
            Self::Tuple(items) => items.iter().any(Self::is_dynamic),
            _ => false,
        }
    }

    pub fn head_size(&self) -> Result<usize, AbiError> {
        //! Number of bytes this type takes in the head of an enclosing encoding.
        //!
        //! Dynamic types take one offset word; static tuples and fixed arrays
        //! are laid out inline. Fails with [`AbiError::UnsupportedAbiType`]
        //! when the inline size does not fit into `usize`.
        if self.is_dynamic() {
            return Ok(WORD_SIZE);
        }
        let too_large = || AbiError::UnsupportedAbiType(self.to_string());
        match self {
            Self::FixedArray(inner, size) => inner
                .head_size()?
                .checked_mul(*size)
                .ok_or_else(too_large),
            Self::Tuple(items) => items.iter().try_fold(0usize, |total, item| {
                total.checked_add(item.head_size()?).ok_or_else(too_large)
            }),
            _ => Ok(WORD_SIZE),
        }
    }

    pub(crate) fn with_components(ty: &str, components: &[AbiType]) -> Result<Self, AbiError> {
        //! Resolve a JSON-style `tuple`/`tuple[]` declaration.
        match ty.strip_prefix("tuple") {
            Some(suffix) => format!("({}){suffix}", components.iter().join(",")).parse(),
            None => ty.parse(),
        }
    }

    fn parse_elementary(s: &str) -> Result<Self, AbiError> {
        let unsupported = || AbiError::UnsupportedAbiType(s.to_string());
        let width = |digits: &str, max: usize, step: usize| -> Result<usize, AbiError> {
            let n: usize = digits.parse().map_err(|_| unsupported())?;
            if n == 0 || n > max || n % step != 0 || digits.starts_with('0') {
                return Err(unsupported());
            }
            Ok(n)
        };
        match s {
            "address" => Ok(Self::Address),
            "bool" => Ok(Self::Bool),
            "string" => Ok(Self::String),
            "bytes" => Ok(Self::Bytes),
            "byte" => Ok(Self::FixedBytes(1)),
            "uint" => Ok(Self::Uint(256)),
            "int" => Ok(Self::Int(256)),
            "trcToken" => Ok(Self::TrcToken),
            _ => {
                if let Some(digits) = s.strip_prefix("uint") {
                    width(digits, 256, 8).map(Self::Uint)
                } else if let Some(digits) = s.strip_prefix("int") {
                    width(digits, 256, 8).map(Self::Int)
                } else if let Some(digits) = s.strip_prefix("bytes") {
                    width(digits, 32, 1).map(Self::FixedBytes)
                } else {
                    Err(unsupported())
                }
            }
        }
    }
}

/// Split a tuple body at top-level commas.
fn split_components(body: &str) -> Result<Vec<&str>, AbiError> {
    if body.trim().is_empty() {
        return Ok(vec![]);
    }
    let mut parts = vec![];
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in body.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| AbiError::UnsupportedAbiType(body.to_string()))?
            }
            ',' if depth == 0 => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(AbiError::UnsupportedAbiType(body.to_string()));
    }
    parts.push(&body[start..]);
    Ok(parts)
}

impl FromStr for AbiType {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let unsupported = || AbiError::UnsupportedAbiType(s.to_string());
        if let Some(without_bracket) = s.strip_suffix(']') {
            let open = without_bracket.rfind('[').ok_or_else(unsupported)?;
            let inner: AbiType = without_bracket[..open].parse()?;
            let size = &without_bracket[open + 1..];
            if size.is_empty() {
                return Ok(Self::Array(Box::new(inner)));
            }
            let size: usize = size.parse().map_err(|_| unsupported())?;
            if size == 0 {
                return Err(unsupported());
            }
            let ty = Self::FixedArray(Box::new(inner), size);
            ty.head_size().map_err(|_| unsupported())?;
            return Ok(ty);
        }
        if let Some(body) = s.strip_prefix('(').and_then(|b| b.strip_suffix(')')) {
            let ty = split_components(body)?
                .into_iter()
                .map(str::parse)
                .collect::<Result<_, _>>()
                .map(Self::Tuple)?;
            ty.head_size().map_err(|_| unsupported())?;
            return Ok(ty);
        }
        Self::parse_elementary(s)
    }
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address => f.write_str("address"),
            Self::Bool => f.write_str("bool"),
            Self::Uint(bits) => write!(f, "uint{bits}"),
            Self::Int(bits) => write!(f, "int{bits}"),
            Self::FixedBytes(size) => write!(f, "bytes{size}"),
            Self::Bytes => f.write_str("bytes"),
            Self::String => f.write_str("string"),
            Self::TrcToken => f.write_str("trcToken"),
            Self::Array(inner) => write!(f, "{inner}[]"),
            Self::FixedArray(inner, size) => write!(f, "{inner}[{size}]"),
            Self::Tuple(items) => write!(f, "({})", items.iter().join(",")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> AbiType {
        s.parse().unwrap()
    }

    #[test]
    fn test_elementary() {
        assert_eq!(parse("uint"), AbiType::Uint(256));
        assert_eq!(parse("int8"), AbiType::Int(8));
        assert_eq!(parse("bytes32"), AbiType::FixedBytes(32));
        assert_eq!(parse("trcToken"), AbiType::TrcToken);
        for bad in ["uint7", "uint264", "uint08", "bytes33", "bytes0", "fixed", "tuple", "", "function"] {
            assert_eq!(
                bad.parse::<AbiType>().unwrap_err(),
                AbiError::UnsupportedAbiType(bad.to_string()),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_arrays_and_tuples() {
        assert_eq!(
            parse("uint256[2][]"),
            AbiType::Array(Box::new(AbiType::FixedArray(Box::new(AbiType::Uint(256)), 2)))
        );
        assert_eq!(
            parse("(address,(bool,string)[])[3]"),
            AbiType::FixedArray(
                Box::new(AbiType::Tuple(vec![
                    AbiType::Address,
                    AbiType::Array(Box::new(AbiType::Tuple(vec![
                        AbiType::Bool,
                        AbiType::String
                    ])))
                ])),
                3
            )
        );
        assert_eq!(parse("()"), AbiType::Tuple(vec![]));
        assert!("uint256[0]".parse::<AbiType>().is_err());
        assert!("(uint256".parse::<AbiType>().is_err());
        assert!("(uint256))".parse::<AbiType>().is_err());
    }

    #[test]
    fn test_display_round_trip() {
        for text in ["uint8", "bytes4[]", "(address,uint256)[2]", "((int16,bool),string)"] {
            assert_eq!(parse(text).to_string(), text);
        }
        assert_eq!(parse("uint").to_string(), "uint256");
    }

    #[test]
    fn test_classification() {
        assert!(!parse("uint256").is_dynamic());
        assert!(parse("string").is_dynamic());
        assert!(parse("uint8[]").is_dynamic());
        assert!(!parse("uint8[3]").is_dynamic());
        assert!(parse("string[3]").is_dynamic());
        assert!(!parse("(uint8,bool)").is_dynamic());
        assert!(parse("(uint8,bytes)").is_dynamic());
        assert_eq!(parse("uint8[3]").head_size().unwrap(), 96);
        assert_eq!(parse("(uint8,(bool,address))").head_size().unwrap(), 96);
        assert_eq!(parse("string[3]").head_size().unwrap(), 32);
    }

    #[test]
    fn test_oversized_static_types() {
        for bad in [
            "uint256[576460752303423488]",
            "uint8[4294967296][4294967296]",
            "(uint256[288230376151711744],uint256[288230376151711744])",
        ] {
            assert_eq!(
                bad.parse::<AbiType>().unwrap_err(),
                AbiError::UnsupportedAbiType(bad.to_string()),
                "{bad}"
            );
        }
        let built = AbiType::FixedArray(Box::new(AbiType::Uint(256)), usize::MAX);
        assert!(matches!(
            built.head_size(),
            Err(AbiError::UnsupportedAbiType(_))
        ));
        assert_eq!(parse("string[576460752303423488]").head_size().unwrap(), 32);
    }

    #[test]
    fn test_components() {
        let components = vec![AbiType::Address, AbiType::Uint(256)];
        assert_eq!(
            AbiType::with_components("tuple[]", &components).unwrap(),
            AbiType::Array(Box::new(AbiType::Tuple(components.clone())))
        );
        assert_eq!(
            AbiType::with_components("uint8", &[]).unwrap(),
            AbiType::Uint(8)
        );
    }
}
