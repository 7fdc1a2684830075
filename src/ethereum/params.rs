//! Call options and the split between positional arguments and a trailing
//! options object.

use alloy::{
    network::TransactionBuilder,
    primitives::{Address, Bytes, U256},
    rpc::types::TransactionRequest,
};
use anyhow::{anyhow, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::utils;

/// Options attached to a call or transaction (`from`, `value`, `gas`, ...).
///
/// Unknown keys are kept in `extra` so a merge never loses anything the
/// caller supplied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TxOptions {
    pub from: Option<Address>,
    pub value: Option<U256>,
    pub gas: Option<u64>,
    pub gas_price: Option<u128>,
    pub nonce: Option<u64>,
    pub data: Option<Bytes>,
    pub extra: BTreeMap<String, Value>,
}

impl TxOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    pub fn value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }

    pub fn gas(mut self, gas: u64) -> Self {
        self.gas = Some(gas);
        self
    }

    pub fn gas_price(mut self, gas_price: u128) -> Self {
        self.gas_price = Some(gas_price);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Returns `defaults` overridden key-by-key by `self`.
    pub fn merged_onto(&self, defaults: &TxOptions) -> TxOptions {
        let mut extra = defaults.extra.clone();
        extra.extend(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())));

        TxOptions {
            from: self.from.or(defaults.from),
            value: self.value.or(defaults.value),
            gas: self.gas.or(defaults.gas),
            gas_price: self.gas_price.or(defaults.gas_price),
            nonce: self.nonce.or(defaults.nonce),
            data: self.data.clone().or_else(|| defaults.data.clone()),
            extra,
        }
    }

    /// Parses a plain JSON options object. Accepts both `gas` and `gasLimit`,
    /// and `gasPrice`/`gas_price`.
    pub fn from_json(object: &Map<String, Value>) -> Result<Self> {
        let mut options = TxOptions::default();

        for (key, value) in object {
            match key.as_str() {
                "from" => {
                    let from = value
                        .as_str()
                        .ok_or_else(|| anyhow!("'from' must be an address string"))?;
                    options.from = Some(utils::validate_address(from)?);
                }
                "value" => options.value = Some(json_quantity(key, value)?),
                "gas" | "gasLimit" | "gas_limit" => {
                    options.gas = Some(json_quantity(key, value)?.try_into().map_err(|_| {
                        anyhow!("'{}' does not fit in 64 bits", key)
                    })?)
                }
                "gasPrice" | "gas_price" => {
                    options.gas_price = Some(json_quantity(key, value)?.try_into().map_err(
                        |_| anyhow!("'{}' does not fit in 128 bits", key),
                    )?)
                }
                "nonce" => {
                    options.nonce = Some(json_quantity(key, value)?.try_into().map_err(|_| {
                        anyhow!("'nonce' does not fit in 64 bits")
                    })?)
                }
                "data" => {
                    let data = value
                        .as_str()
                        .ok_or_else(|| anyhow!("'data' must be a hex string"))?;
                    let bytes = hex::decode(data.trim_start_matches("0x"))
                        .map_err(|_| anyhow!("Invalid hex string for 'data': {}", data))?;
                    options.data = Some(bytes.into());
                }
                _ => {
                    options.extra.insert(key.clone(), value.clone());
                }
            }
        }

        Ok(options)
    }

    /// Copies the options onto a request. `data` is left to the caller since it
    /// conflicts with encoded call input.
    pub fn apply(&self, mut request: TransactionRequest) -> TransactionRequest {
        if let Some(from) = self.from {
            request = request.with_from(from);
        }
        if let Some(value) = self.value {
            request = request.with_value(value);
        }
        if let Some(gas) = self.gas {
            request = request.with_gas_limit(gas);
        }
        if let Some(gas_price) = self.gas_price {
            request = request.with_gas_price(gas_price);
        }
        if let Some(nonce) = self.nonce {
            request = request.with_nonce(nonce);
        }
        request
    }
}

fn json_quantity(key: &str, value: &Value) -> Result<U256> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(U256::from)
            .ok_or_else(|| anyhow!("'{}' must be a non-negative integer", key)),
        Value::String(s) => utils::validate_hex_value(s),
        Value::Object(_) => {
            big_number_value(value).ok_or_else(|| anyhow!("'{}' is not a numeric value", key))
        }
        _ => Err(anyhow!("'{}' must be a number or numeric string", key)),
    }
}

/// Extracts the value of a serialized big-integer wrapper.
///
/// Recognizes the ethers.js shapes (`{"_hex": ..}`, `{"type": "BigNumber", "hex": ..}`)
/// and the bignumber.js internal shape (`{"s": 1, "e": .., "c": [..]}`).
pub fn big_number_value(value: &Value) -> Option<U256> {
    let object = value.as_object()?;

    if let Some(hex) = object.get("_hex").and_then(Value::as_str) {
        return utils::validate_hex_value(hex).ok();
    }

    if object.get("type").and_then(Value::as_str) == Some("BigNumber") {
        let hex = object.get("hex").and_then(Value::as_str)?;
        return utils::validate_hex_value(hex).ok();
    }

    if object.len() == 3 {
        let sign = object.get("s").and_then(Value::as_i64)?;
        let exponent = object.get("e").and_then(Value::as_u64)?;
        let coefficient = object.get("c").and_then(Value::as_array)?;
        if sign < 0 {
            return None;
        }
        return bignumber_js_coefficient(exponent, coefficient);
    }

    None
}

// bignumber.js stores base-1e14 limbs; the first limb carries the leading digits.
fn bignumber_js_coefficient(exponent: u64, limbs: &[Value]) -> Option<U256> {
    let mut digits = String::new();
    for (i, limb) in limbs.iter().enumerate() {
        let limb = limb.as_u64()?;
        if i == 0 {
            digits.push_str(&limb.to_string());
        } else {
            digits.push_str(&format!("{:014}", limb));
        }
    }

    let wanted = usize::try_from(exponent).ok()?.checked_add(1)?;
    if digits.len() > wanted {
        // fractional part present; not an integer quantity
        if digits[wanted..].chars().any(|c| c != '0') {
            return None;
        }
        digits.truncate(wanted);
    }
    while digits.len() < wanted {
        digits.push('0');
    }
    U256::from_str_radix(&digits, 10).ok()
}

pub fn is_big_number(value: &Value) -> bool {
    big_number_value(value).is_some()
}

/// A trailing argument is an options bag only if it is a key-value object that
/// is not a wrapped numeric value.
pub fn is_options_object(value: &Value) -> bool {
    value.is_object() && !is_big_number(value)
}

/// Pops a trailing options object off `args` and merges it onto `defaults`.
pub fn split_options(mut args: Vec<Value>, defaults: &TxOptions) -> Result<(Vec<Value>, TxOptions)> {
    let call_site = if args.last().is_some_and(is_options_object) {
        match args.pop() {
            Some(Value::Object(object)) => TxOptions::from_json(&object)?,
            _ => TxOptions::default(),
        }
    } else {
        TxOptions::default()
    };

    Ok((args, call_site.merged_onto(defaults)))
}
