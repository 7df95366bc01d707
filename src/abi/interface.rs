use itertools::Itertools;
use serde::Deserialize;
use serde_json::Value;

use super::{decode_parameters, encode_parameters, AbiError, AbiType, AbiValue};
use crate::utils::keccak;

/// Named parameter of a function, constructor or event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Param {
    /// Parameter name, possibly empty.
    pub name: String,
    /// Declared type.
    pub ty: AbiType,
}

impl Param {
    /// Create a parameter.
    pub fn new(name: &str, ty: AbiType) -> Self {
        Self {
            name: name.to_string(),
            ty,
        }
    }
}

/// How a function interacts with contract state.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StateMutability {
    /// Reads nothing from state.
    Pure,
    /// Reads state, never modifies it.
    View,
    /// Modifies state, rejects attached value.
    NonPayable,
    /// Modifies state, accepts attached value.
    Payable,
}

impl StateMutability {
    fn parse(text: &str) -> Result<Self, AbiError> {
        match text.to_ascii_lowercase().as_str() {
            "pure" => Ok(Self::Pure),
            "view" => Ok(Self::View),
            "nonpayable" => Ok(Self::NonPayable),
            "payable" => Ok(Self::Payable),
            _ => Err(AbiError::InvalidInterface(format!(
                "unknown state mutability {text:?}"
            ))),
        }
    }

    pub fn is_read_only(&self) -> bool {
        //! `view` and `pure` functions are executed as constant calls.
        matches!(self, Self::Pure | Self::View)
    }
}

fn types_of(params: &[Param]) -> Vec<AbiType> {
    params.iter().map(|p| p.ty.clone()).collect()
}

fn check_arity(context: &str, params: &[Param], args: &[AbiValue]) -> Result<(), AbiError> {
    if params.len() != args.len() {
        return Err(AbiError::ArityMismatch {
            context: context.to_string(),
            expected: params.len(),
            got: args.len(),
        });
    }
    Ok(())
}

/// Callable contract function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionDescriptor {
    /// Function name without parameters.
    pub name: String,
    /// Declared parameters.
    pub inputs: Vec<Param>,
    /// Declared return values.
    pub outputs: Vec<Param>,
    /// Mutability, normalized from `stateMutability` or legacy flags.
    pub state_mutability: StateMutability,
}

impl FunctionDescriptor {
    pub fn from_signature(signature: &str) -> Result<Self, AbiError> {
        //! Build a descriptor from a textual signature like
        //! `transfer(address,uint256)`.
        //!
        //! Such descriptor has no outputs and is considered non-payable.
        let invalid = || AbiError::InvalidInterface(format!("bad function signature {signature:?}"));
        let open = signature.find('(').ok_or_else(invalid)?;
        let name = signature[..open].trim();
        if name.is_empty() {
            return Err(invalid());
        }
        let inputs = match signature[open..].parse::<AbiType>() {
            Ok(AbiType::Tuple(types)) => types.into_iter().map(|ty| Param::new("", ty)).collect(),
            Ok(_) => return Err(invalid()),
            Err(e) => return Err(e),
        };
        Ok(Self {
            name: name.to_string(),
            inputs,
            outputs: vec![],
            state_mutability: StateMutability::NonPayable,
        })
    }

    pub fn signature(&self) -> String {
        //! Canonical signature: `name(type1,type2,...)`.
        //!
        //! This exact text is what TRON nodes expect as `function_selector`.
        format!("{}({})", self.name, self.inputs.iter().map(|p| &p.ty).join(","))
    }

    pub fn selector(&self) -> [u8; 4] {
        //! First 4 bytes of Keccak-256 of the signature.
        let hash = keccak(self.signature());
        [hash[0], hash[1], hash[2], hash[3]]
    }

    pub fn is_read_only(&self) -> bool {
        //! `view` and `pure` functions are answered by a constant call.
        self.state_mutability.is_read_only()
    }

    pub fn input_types(&self) -> Vec<AbiType> {
        //! Parameter types in declaration order.
        types_of(&self.inputs)
    }

    pub fn output_types(&self) -> Vec<AbiType> {
        //! Return types in declaration order.
        types_of(&self.outputs)
    }

    pub fn encode_input(&self, args: &[AbiValue]) -> Result<Vec<u8>, AbiError> {
        //! Encode call arguments, without selector.
        check_arity(&self.name, &self.inputs, args)?;
        encode_parameters(&self.input_types(), args)
    }

    pub fn decode_input(&self, data: &[u8]) -> Result<Vec<AbiValue>, AbiError> {
        //! Decode call data. A leading selector is skipped if it matches.
        let body = match data.get(..4) {
            Some(prefix) if prefix == self.selector() && data.len() % 32 == 4 => &data[4..],
            _ => data,
        };
        decode_parameters(&self.input_types(), body)
    }

    pub fn decode_output(&self, data: &[u8]) -> Result<Vec<AbiValue>, AbiError> {
        //! Decode a `constant_result` entry into return values.
        decode_parameters(&self.output_types(), data)
    }
}

/// Contract constructor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstructorDescriptor {
    /// Declared parameters.
    pub inputs: Vec<Param>,
    /// `Payable` if the deployment may carry TRX.
    pub state_mutability: StateMutability,
}

impl ConstructorDescriptor {
    pub fn is_payable(&self) -> bool {
        //! May the deployment carry a call value?
        self.state_mutability == StateMutability::Payable
    }

    pub fn encode_input(&self, args: &[AbiValue]) -> Result<Vec<u8>, AbiError> {
        //! Encode constructor arguments, appended to bytecode on deployment.
        check_arity("constructor", &self.inputs, args)?;
        encode_parameters(&types_of(&self.inputs), args)
    }
}

/// Event parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventParam {
    /// Parameter name, may be empty.
    pub name: String,
    /// Declared type.
    pub ty: AbiType,
    /// Stored in a log topic instead of data.
    pub indexed: bool,
}

/// Contract event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventDescriptor {
    /// Event name.
    pub name: String,
    /// Declared parameters, indexed and not.
    pub inputs: Vec<EventParam>,
    /// Anonymous events have no signature topic.
    pub anonymous: bool,
}

impl EventDescriptor {
    pub fn signature(&self) -> String {
        //! Canonical signature: `Name(type1,type2,...)`.
        format!("{}({})", self.name, self.inputs.iter().map(|p| &p.ty).join(","))
    }

    pub fn topic(&self) -> [u8; 32] {
        //! First log topic of a non-anonymous event.
        keccak(self.signature())
    }

    pub fn decode_data(&self, data: &[u8]) -> Result<Vec<AbiValue>, AbiError> {
        //! Decode non-indexed parameters from log data.
        let types: Vec<AbiType> = self
            .inputs
            .iter()
            .filter(|p| !p.indexed)
            .map(|p| p.ty.clone())
            .collect();
        decode_parameters(&types, data)
    }
}

#[derive(Deserialize)]
struct RawParam {
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    ty: String,
    #[serde(default)]
    components: Vec<RawParam>,
    #[serde(default)]
    indexed: bool,
}

impl RawParam {
    fn abi_type(&self) -> Result<AbiType, AbiError> {
        let components = self
            .components
            .iter()
            .map(Self::abi_type)
            .collect::<Result<Vec<_>, _>>()?;
        AbiType::with_components(&self.ty, &components)
    }

    fn param(&self) -> Result<Param, AbiError> {
        Ok(Param::new(&self.name, self.abi_type()?))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntry {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    inputs: Vec<RawParam>,
    #[serde(default)]
    outputs: Vec<RawParam>,
    state_mutability: Option<String>,
    constant: Option<bool>,
    payable: Option<bool>,
    #[serde(default)]
    anonymous: bool,
}

impl RawEntry {
    fn mutability(&self) -> Result<StateMutability, AbiError> {
        if let Some(text) = &self.state_mutability {
            return StateMutability::parse(text);
        }
        Ok(match (self.constant, self.payable) {
            (Some(true), _) => StateMutability::View,
            (_, Some(true)) => StateMutability::Payable,
            _ => StateMutability::NonPayable,
        })
    }

    fn params(raw: &[RawParam]) -> Result<Vec<Param>, AbiError> {
        raw.iter().map(RawParam::param).collect()
    }
}

/// Parsed contract interface.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContractAbi {
    /// Functions in declaration order, overloads included.
    pub functions: Vec<FunctionDescriptor>,
    /// Constructor, if declared.
    pub constructor: Option<ConstructorDescriptor>,
    /// Events in declaration order.
    pub events: Vec<EventDescriptor>,
}

impl ContractAbi {
    pub fn from_json(text: &str) -> Result<Self, AbiError> {
        //! Parse a JSON interface.
        let value: Value =
            serde_json::from_str(text).map_err(|e| AbiError::InvalidInterface(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, AbiError> {
        //! Parse a JSON interface value.
        //!
        //! Accepts a plain entry list (compiler output) as well as the
        //! `{"entrys": [...]}` object returned by `wallet/getcontract`.
        //! Entry `type` and `stateMutability` are case-insensitive; legacy
        //! `constant`/`payable` flags are honored when `stateMutability`
        //! is absent. Fallback, receive and error entries are skipped.
        let entries = match value {
            Value::Object(mut map) => map.remove("entrys").unwrap_or(Value::Null),
            other => other,
        };
        let entries: Vec<RawEntry> = serde_json::from_value(entries)
            .map_err(|e| AbiError::InvalidInterface(e.to_string()))?;

        let mut abi = Self::default();
        for entry in entries {
            let kind = entry
                .kind
                .as_deref()
                .unwrap_or("function")
                .to_ascii_lowercase();
            match kind.as_str() {
                "function" => abi.functions.push(FunctionDescriptor {
                    name: entry.name.clone(),
                    inputs: RawEntry::params(&entry.inputs)?,
                    outputs: RawEntry::params(&entry.outputs)?,
                    state_mutability: entry.mutability()?,
                }),
                "constructor" => {
                    abi.constructor = Some(ConstructorDescriptor {
                        inputs: RawEntry::params(&entry.inputs)?,
                        state_mutability: entry.mutability()?,
                    })
                }
                "event" => abi.events.push(EventDescriptor {
                    name: entry.name.clone(),
                    inputs: entry
                        .inputs
                        .iter()
                        .map(|p| {
                            Ok(EventParam {
                                name: p.name.clone(),
                                ty: p.abi_type()?,
                                indexed: p.indexed,
                            })
                        })
                        .collect::<Result<_, AbiError>>()?,
                    anonymous: entry.anonymous,
                }),
                "fallback" | "receive" | "error" => {}
                other => {
                    return Err(AbiError::InvalidInterface(format!(
                        "unknown entry type {other:?}"
                    )))
                }
            }
        }
        Ok(abi)
    }

    pub fn function(&self, name_or_signature: &str) -> Result<&FunctionDescriptor, AbiError> {
        //! Find a function by name or by full signature.
        //!
        //! A bare name must be unambiguous; use the full signature to pick
        //! one of several overloads.
        let unknown = || AbiError::UnknownFunction(name_or_signature.to_string());
        if name_or_signature.contains('(') {
            let wanted = FunctionDescriptor::from_signature(name_or_signature)?.signature();
            return self
                .functions
                .iter()
                .find(|f| f.signature() == wanted)
                .ok_or_else(unknown);
        }
        let mut candidates = self.functions.iter().filter(|f| f.name == name_or_signature);
        match (candidates.next(), candidates.next()) {
            (Some(function), None) => Ok(function),
            (Some(_), Some(_)) => Err(AbiError::InvalidInterface(format!(
                "function name {name_or_signature:?} is overloaded, use the full signature"
            ))),
            _ => Err(unknown()),
        }
    }

    pub fn function_for_call(
        &self,
        name_or_signature: &str,
        arg_count: usize,
    ) -> Result<&FunctionDescriptor, AbiError> {
        //! Find a function that accepts `arg_count` arguments.
        //!
        //! Overloads with the same name are disambiguated by arity.
        if name_or_signature.contains('(') {
            let function = self.function(name_or_signature)?;
            if function.inputs.len() != arg_count {
                return Err(AbiError::ArityMismatch {
                    context: function.signature(),
                    expected: function.inputs.len(),
                    got: arg_count,
                });
            }
            return Ok(function);
        }
        let named: Vec<&FunctionDescriptor> = self
            .functions
            .iter()
            .filter(|f| f.name == name_or_signature)
            .collect();
        let first = named
            .first()
            .ok_or_else(|| AbiError::UnknownFunction(name_or_signature.to_string()))?;
        named
            .iter()
            .find(|f| f.inputs.len() == arg_count)
            .copied()
            .ok_or_else(|| AbiError::ArityMismatch {
                context: name_or_signature.to_string(),
                expected: first.inputs.len(),
                got: arg_count,
            })
    }

    pub fn event(&self, name: &str) -> Option<&EventDescriptor> {
        //! First event called `name`.
        self.events.iter().find(|e| e.name == name)
    }
}
