//! E.164 phone validation and carrier resolution for mobile-money numbers.
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::MobileNetwork;

pub const DEFAULT_COUNTRY_CODE: &str = "256";
pub const DEFAULT_NETWORK_PREFIXES: &str = "MTN:76,77,78,39;AIRTEL:70,74,75,20";
/// Length of the subscriber number that follows the country code.
pub const NATIONAL_NUMBER_LENGTH: usize = 9;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PhoneError {
    #[error("Phone number must be in the format +{country_code} followed by 9 digits")]
    InvalidFormat { country_code: String },
    #[error("Phone number prefix {0} does not belong to a supported mobile network")]
    UnsupportedNetwork(String),
    #[error("Invalid network prefix configuration: {0}")]
    InvalidPrefixConfig(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkPrefix {
    pub prefix: String,
    pub network: MobileNetwork,
}

/// A validated mobile number and the network it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MobileNumber {
    pub e164: String,
    pub national: String,
    pub network: MobileNetwork,
}

impl MobileNumber {
    /// The number without the leading `+`, as the gateways expect it.
    pub fn msisdn(&self) -> &str {
        self.e164.trim_start_matches('+')
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhonePolicy {
    pub country_code: String,
    pub prefixes: Vec<NetworkPrefix>,
}

impl Default for PhonePolicy {
    fn default() -> Self {
        let prefixes = parse_network_prefixes(DEFAULT_NETWORK_PREFIXES).unwrap_or_default();
        Self { country_code: DEFAULT_COUNTRY_CODE.to_string(), prefixes }
    }
}

impl PhonePolicy {
    pub fn new<S: Into<String>>(country_code: S, prefixes: Vec<NetworkPrefix>) -> Self {
        Self { country_code: country_code.into(), prefixes }
    }

    /// Validates that `phone` is `+<country code><9 digits>` and resolves its carrier from the leading digits of the
    /// national number.
    pub fn parse(&self, phone: &str) -> Result<MobileNumber, PhoneError> {
        let invalid = || PhoneError::InvalidFormat { country_code: self.country_code.clone() };
        let e164 = Regex::new(r"^\+(\d+)$").map_err(|_| invalid())?;
        let phone = phone.trim();
        let digits = e164.captures(phone).and_then(|c| c.get(1)).map(|m| m.as_str()).ok_or_else(invalid)?;
        let national = digits.strip_prefix(self.country_code.as_str()).ok_or_else(invalid)?;
        if national.len() != NATIONAL_NUMBER_LENGTH {
            return Err(invalid());
        }
        let network = self
            .prefixes
            .iter()
            .find(|p| national.starts_with(p.prefix.as_str()))
            .map(|p| p.network)
            .ok_or_else(|| PhoneError::UnsupportedNetwork(national.chars().take(2).collect()))?;
        Ok(MobileNumber { e164: phone.to_string(), national: national.to_string(), network })
    }
}

/// Parses a prefix table of the form `MTN:76,77,78;AIRTEL:70,75`.
pub fn parse_network_prefixes(s: &str) -> Result<Vec<NetworkPrefix>, PhoneError> {
    let mut result = Vec::new();
    for group in s.split(';').map(str::trim).filter(|g| !g.is_empty()) {
        let (network, prefixes) =
            group.split_once(':').ok_or_else(|| PhoneError::InvalidPrefixConfig(format!("missing ':' in '{group}'")))?;
        let network =
            MobileNetwork::from_str(network).map_err(|e| PhoneError::InvalidPrefixConfig(e.to_string()))?;
        for prefix in prefixes.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            if !prefix.chars().all(|c| c.is_ascii_digit()) {
                return Err(PhoneError::InvalidPrefixConfig(format!("'{prefix}' is not a numeric prefix")));
            }
            result.push(NetworkPrefix { prefix: prefix.to_string(), network });
        }
    }
    if result.is_empty() {
        return Err(PhoneError::InvalidPrefixConfig("no prefixes configured".into()));
    }
    Ok(result)
}
