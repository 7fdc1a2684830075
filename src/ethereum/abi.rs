//! Call specifications derived from a contract ABI, plus the conversions between
//! JSON arguments, alloy's dynamic ABI values and typed Rust outputs.

use alloy::{
    dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt, Word},
    json_abi::{Function, JsonAbi, Param, StateMutability},
    primitives::{Address, Bytes, B256, I256, U256},
};
use anyhow::{anyhow, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;

use super::ContractError;

/// One callable ABI function. Immutable once derived from the ABI table.
#[derive(Debug, Clone)]
pub struct CallSpec {
    name: String,
    is_constant: bool,
    function: Function,
}

impl CallSpec {
    pub fn from_function(function: &Function) -> Self {
        Self {
            name: function.name.clone(),
            is_constant: matches!(
                function.state_mutability,
                StateMutability::View | StateMutability::Pure
            ),
            function: function.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Constant functions are served by a read call and never wait for a receipt.
    pub fn is_constant(&self) -> bool {
        self.is_constant
    }

    pub fn inputs(&self) -> &[Param] {
        &self.function.inputs
    }

    pub fn outputs(&self) -> &[Param] {
        &self.function.outputs
    }

    pub fn signature(&self) -> String {
        self.function.signature()
    }

    pub fn encode_input(&self, args: &[DynSolValue]) -> Result<Bytes, ContractError> {
        if args.len() != self.function.inputs.len() {
            return Err(ContractError::abi(
                &self.name,
                format!(
                    "expected {} arguments, got {}. Expected parameters: [{}]",
                    self.function.inputs.len(),
                    args.len(),
                    describe_params(&self.function.inputs)
                ),
            ));
        }

        self.function
            .abi_encode_input(args)
            .map(Bytes::from)
            .map_err(|e| ContractError::abi(&self.name, format!("failed to encode inputs: {e}")))
    }

    pub fn decode_output(&self, data: &[u8]) -> Result<Vec<DynSolValue>, ContractError> {
        if data.is_empty() && !self.function.outputs.is_empty() {
            return Err(ContractError::abi(&self.name, "call returned no data"));
        }

        self.function
            .abi_decode_output(data, false)
            .map_err(|e| ContractError::abi(&self.name, format!("failed to decode output: {e}")))
    }

    /// Parses JSON arguments positionally against this function's inputs.
    pub fn json_args(&self, args: &[Value]) -> Result<Vec<DynSolValue>, ContractError> {
        json_to_dyn_sol_values(&self.name, &self.function.inputs, args)
    }
}

/// All functions of one contract, keyed by name.
///
/// Overloaded names keep the first declaration, which matches the order
/// solc writes them in.
#[derive(Debug, Clone, Default)]
pub struct MethodTable {
    by_name: HashMap<String, CallSpec>,
}

impl MethodTable {
    pub fn from_abi(abi: &JsonAbi) -> Self {
        let mut by_name = HashMap::new();
        for function in abi.functions() {
            by_name
                .entry(function.name.clone())
                .or_insert_with(|| CallSpec::from_function(function));
        }
        Self { by_name }
    }

    pub fn get(&self, name: &str) -> Option<&CallSpec> {
        self.by_name.get(name)
    }

    pub fn resolve(&self, contract: &str, name: &str) -> Result<CallSpec, ContractError> {
        self.get(name)
            .cloned()
            .ok_or_else(|| ContractError::UnknownMethod {
                contract: contract.to_string(),
                method: name.to_string(),
            })
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

fn describe_params(params: &[Param]) -> String {
    params
        .iter()
        .map(|param| format!("{} {}", param.ty, param.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Converts positional JSON values into ABI values for `params`.
pub fn json_to_dyn_sol_values(
    method: &str,
    params: &[Param],
    args: &[Value],
) -> Result<Vec<DynSolValue>, ContractError> {
    if args.len() != params.len() {
        return Err(ContractError::abi(
            method,
            format!(
                "parameter count mismatch: expected {} parameters, got {}. Expected parameters: [{}]",
                params.len(),
                args.len(),
                describe_params(params)
            ),
        ));
    }

    params
        .iter()
        .zip(args)
        .enumerate()
        .map(|(i, (param, arg))| {
            json_to_dyn_sol_value(arg, &param.ty).map_err(|e| {
                ContractError::abi(
                    method,
                    format!(
                        "invalid parameter #{} ('{}' of type '{}'): {}",
                        i + 1,
                        param.name,
                        param.ty,
                        e
                    ),
                )
            })
        })
        .collect()
}

fn type_bits(ty: &str, prefix: &str) -> Result<usize> {
    let bits = &ty[prefix.len()..];
    if bits.is_empty() {
        return Ok(256);
    }
    let bits: usize = bits
        .parse()
        .map_err(|_| anyhow!("Invalid integer type: {}", ty))?;
    if bits == 0 || bits > 256 || bits % 8 != 0 {
        return Err(anyhow!("Invalid integer type: {}", ty));
    }
    Ok(bits)
}

fn parse_uint(value: &Value) -> Result<U256> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(U256::from)
            .ok_or_else(|| anyhow!("Invalid uint value: {}", n)),
        Value::String(s) => super::utils::validate_hex_value(s),
        Value::Object(_) => super::params::big_number_value(value)
            .ok_or_else(|| anyhow!("Object is not a big number: {}", value)),
        _ => Err(anyhow!("Uint must be a number or string")),
    }
}

fn parse_int(value: &Value) -> Result<I256> {
    match value {
        Value::Number(n) => {
            let n = n
                .as_i64()
                .ok_or_else(|| anyhow!("Invalid int value: {}", n))?;
            I256::from_dec_str(&n.to_string()).map_err(|e| anyhow!("Invalid int value: {}", e))
        }
        Value::String(s) => I256::from_dec_str(s.trim())
            .or_else(|_| I256::from_str(s.trim()))
            .map_err(|_| anyhow!("Invalid int string: {}", s)),
        _ => Err(anyhow!("Int must be a number or string")),
    }
}

fn parse_hex_bytes(value: &Value) -> Result<Vec<u8>> {
    let hex_str = value
        .as_str()
        .ok_or_else(|| anyhow!("Bytes must be a hex string"))?;
    hex::decode(hex_str.trim_start_matches("0x")).map_err(|_| anyhow!("Invalid hex string: {}", hex_str))
}

/// Convert JSON value to DynSolValue based on expected Solidity type
pub fn json_to_dyn_sol_value(value: &Value, sol_type: &str) -> Result<DynSolValue> {
    match sol_type {
        "address" => {
            let addr_str = value
                .as_str()
                .ok_or_else(|| anyhow!("Address must be a string"))?;
            Ok(DynSolValue::Address(super::utils::validate_address(addr_str)?))
        }
        ty if ty.ends_with("[]") => {
            let array = value
                .as_array()
                .ok_or_else(|| anyhow!("Array parameter must be an array"))?;
            let element_type = &ty[..ty.len() - 2];
            let elements = array
                .iter()
                .map(|element| json_to_dyn_sol_value(element, element_type))
                .collect::<Result<Vec<_>>>()?;
            Ok(DynSolValue::Array(elements))
        }
        ty if ty.starts_with("uint") => Ok(DynSolValue::Uint(parse_uint(value)?, type_bits(ty, "uint")?)),
        ty if ty.starts_with("int") => Ok(DynSolValue::Int(parse_int(value)?, type_bits(ty, "int")?)),
        "string" => {
            let s = value
                .as_str()
                .ok_or_else(|| anyhow!("String parameter must be a string"))?;
            Ok(DynSolValue::String(s.to_string()))
        }
        "bool" => {
            let b = value
                .as_bool()
                .ok_or_else(|| anyhow!("Bool parameter must be a boolean"))?;
            Ok(DynSolValue::Bool(b))
        }
        "bytes" => Ok(DynSolValue::Bytes(parse_hex_bytes(value)?)),
        ty if ty.starts_with("bytes") => {
            let size: usize = ty[5..]
                .parse()
                .map_err(|_| anyhow!("Invalid fixed bytes type: {}", ty))?;
            if size == 0 || size > 32 {
                return Err(anyhow!("Invalid fixed bytes type: {}", ty));
            }
            let bytes = parse_hex_bytes(value)?;
            if bytes.len() > size {
                return Err(anyhow!("Value is longer than {} bytes", size));
            }
            let mut word = [0u8; 32];
            word[..bytes.len()].copy_from_slice(&bytes);
            Ok(DynSolValue::FixedBytes(Word::from(word), size))
        }
        _ => Err(anyhow!("Unsupported Solidity type: {}", sol_type)),
    }
}

/// Convert DynSolValue array to JSON
pub fn dyn_sol_values_to_json(values: &[DynSolValue]) -> Value {
    if values.len() == 1 {
        dyn_sol_value_to_json(&values[0])
    } else {
        Value::Array(values.iter().map(dyn_sol_value_to_json).collect())
    }
}

/// Convert single DynSolValue to JSON
pub fn dyn_sol_value_to_json(value: &DynSolValue) -> Value {
    match value {
        DynSolValue::Address(addr) => Value::String(format!("0x{:x}", addr)),
        DynSolValue::Uint(num, _) => Value::String(num.to_string()),
        DynSolValue::Int(num, _) => Value::String(num.to_string()),
        DynSolValue::Bool(b) => Value::Bool(*b),
        DynSolValue::String(s) => Value::String(s.clone()),
        DynSolValue::Bytes(bytes) => Value::String(format!("0x{}", hex::encode(bytes))),
        DynSolValue::FixedBytes(word, size) => {
            Value::String(format!("0x{}", hex::encode(&word[..*size])))
        }
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) | DynSolValue::Tuple(items) => {
            Value::Array(items.iter().map(dyn_sol_value_to_json).collect())
        }
        other => Value::String(format!("{:?}", other)),
    }
}

/// Sequential typed access to a function's decoded outputs.
pub struct OutputReader<'a> {
    method: &'a str,
    values: std::slice::Iter<'a, DynSolValue>,
    position: usize,
}

impl<'a> OutputReader<'a> {
    pub fn new(method: &'a str, values: &'a [DynSolValue]) -> Self {
        Self {
            method,
            values: values.iter(),
            position: 0,
        }
    }

    fn next(&mut self, expected: &str) -> Result<&'a DynSolValue, ContractError> {
        self.position += 1;
        self.values.next().ok_or_else(|| {
            ContractError::abi(
                self.method,
                format!("missing output #{} ({})", self.position, expected),
            )
        })
    }

    fn mismatch(&self, expected: &str, found: &DynSolValue) -> ContractError {
        ContractError::abi(
            self.method,
            format!(
                "output #{} should be {}, found {:?}",
                self.position, expected, found
            ),
        )
    }

    pub fn uint(&mut self) -> Result<U256, ContractError> {
        match self.next("uint")? {
            DynSolValue::Uint(value, _) => Ok(*value),
            other => Err(self.mismatch("uint", other)),
        }
    }

    pub fn int(&mut self) -> Result<I256, ContractError> {
        match self.next("int")? {
            DynSolValue::Int(value, _) => Ok(*value),
            other => Err(self.mismatch("int", other)),
        }
    }

    pub fn address(&mut self) -> Result<Address, ContractError> {
        match self.next("address")? {
            DynSolValue::Address(value) => Ok(*value),
            other => Err(self.mismatch("address", other)),
        }
    }

    pub fn bool(&mut self) -> Result<bool, ContractError> {
        match self.next("bool")? {
            DynSolValue::Bool(value) => Ok(*value),
            other => Err(self.mismatch("bool", other)),
        }
    }

    pub fn string(&mut self) -> Result<String, ContractError> {
        match self.next("string")? {
            DynSolValue::String(value) => Ok(value.clone()),
            other => Err(self.mismatch("string", other)),
        }
    }

    pub fn bytes32(&mut self) -> Result<B256, ContractError> {
        match self.next("bytes32")? {
            DynSolValue::FixedBytes(word, 32) => Ok(*word),
            other => Err(self.mismatch("bytes32", other)),
        }
    }
}
