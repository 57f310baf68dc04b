use std::fmt;

use alloy_primitives::{Address, Bytes, TxHash, U256};
use serde::{Deserialize, Serialize};

use crate::{FlowError, Result};

/// Recipient share of a pool. `uint128` on chain.
pub type UnitWeight = u128;

/// Parse an address in canonical `0x` + 40 hex digit form.
///
/// Checksum casing is not enforced; anything else (missing prefix, wrong
/// length, non-hex) is rejected.
pub fn parse_address(text: &str) -> Option<Address> {
    let hex_part = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X"))?;
    if hex_part.len() != 40 || !hex_part.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    hex_part.parse::<Address>().ok()
}

/// One parsed recipient line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    /// 1-based line number in the source text
    pub line: usize,
    /// Address token as entered (validated later)
    pub address: String,
    /// Unit weight
    pub units: UnitWeight,
}

impl Recipient {
    /// Resolve the address token, reporting the source line on failure.
    pub fn resolve_address(&self) -> Result<Address> {
        parse_address(&self.address).ok_or_else(|| {
            FlowError::format(self.line, format!("invalid address '{}'", self.address))
        })
    }
}

/// Ordered recipients, in input order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientList {
    recipients: Vec<Recipient>,
}

impl RecipientList {
    pub fn new(recipients: Vec<Recipient>) -> Self {
        Self { recipients }
    }

    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recipient> {
        self.recipients.iter()
    }

    /// Address tokens, parallel to [`RecipientList::units`]
    pub fn addresses(&self) -> Vec<&str> {
        self.recipients.iter().map(|r| r.address.as_str()).collect()
    }

    /// Unit weights, parallel to [`RecipientList::addresses`]
    pub fn units(&self) -> Vec<UnitWeight> {
        self.recipients.iter().map(|r| r.units).collect()
    }

    /// Sum of all units, `None` on overflow
    pub fn total_units(&self) -> Option<UnitWeight> {
        self.recipients
            .iter()
            .try_fold(0u128, |acc, r| acc.checked_add(r.units))
    }

    /// Resolve every address token, failing on the first malformed line.
    pub fn resolve_addresses(&self) -> Result<Vec<Address>> {
        self.recipients.iter().map(Recipient::resolve_address).collect()
    }
}

impl<'a> IntoIterator for &'a RecipientList {
    type Item = &'a Recipient;
    type IntoIter = std::slice::Iter<'a, Recipient>;

    fn into_iter(self) -> Self::IntoIter {
        self.recipients.iter()
    }
}

/// Opaque parameter blob produced by the rewards macro.
///
/// Handed from the parameter call to the forwarder untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroCallParams(Bytes);

impl MacroCallParams {
    pub fn new(bytes: Bytes) -> Self {
        Self(bytes)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl fmt::Display for MacroCallParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

/// Validity of a pool reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PoolValidity {
    #[default]
    Unknown,
    Valid,
    Invalid,
}

/// Result of inspecting one pool address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolInspection {
    /// The exact pool text this inspection targeted
    pub pool_text: String,
    pub validity: PoolValidity,
    /// Reward token the pool streams
    pub token: Option<Address>,
    /// Caller's balance of `token`, in smallest units
    pub balance: Option<U256>,
}

impl PoolInspection {
    pub fn invalid(pool_text: impl Into<String>) -> Self {
        Self {
            pool_text: pool_text.into(),
            validity: PoolValidity::Invalid,
            token: None,
            balance: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validity == PoolValidity::Valid
    }
}

/// Confirmed transaction outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    /// Receipt status (false = reverted)
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipient(line: usize, address: &str, units: u128) -> Recipient {
        Recipient { line, address: address.to_string(), units }
    }

    #[test]
    fn test_parse_address_canonical() {
        let addr = parse_address("0xFD0268E33111565dE546af2675351A4b1587F89F").unwrap();
        assert_eq!(
            addr.to_string().to_lowercase(),
            "0xfd0268e33111565de546af2675351a4b1587f89f"
        );
    }

    #[test]
    fn test_parse_address_ignores_checksum_case() {
        assert!(parse_address("0xfd0268e33111565de546af2675351a4b1587f89f").is_some());
        assert!(parse_address("0xFD0268E33111565DE546AF2675351A4B1587F89F").is_some());
    }

    #[test]
    fn test_parse_address_rejects_malformed() {
        assert!(parse_address("").is_none());
        assert!(parse_address("0xabc").is_none());
        assert!(parse_address("fd0268e33111565de546af2675351a4b1587f89f").is_none());
        assert!(parse_address("0xzz0268e33111565de546af2675351a4b1587f89f").is_none());
        assert!(parse_address("0xfd0268e33111565de546af2675351a4b1587f89f00").is_none());
    }

    #[test]
    fn test_recipient_list_parallel_views() {
        let list = RecipientList::new(vec![
            recipient(1, "0xabc", 100),
            recipient(2, "0xdef", 200),
        ]);

        assert_eq!(list.addresses(), vec!["0xabc", "0xdef"]);
        assert_eq!(list.units(), vec![100, 200]);
        assert_eq!(list.total_units(), Some(300));
    }

    #[test]
    fn test_total_units_overflow() {
        let list = RecipientList::new(vec![
            recipient(1, "0xabc", u128::MAX),
            recipient(2, "0xdef", 1),
        ]);
        assert_eq!(list.total_units(), None);
    }

    #[test]
    fn test_resolve_addresses_reports_line() {
        let list = RecipientList::new(vec![
            recipient(1, "0x1111111111111111111111111111111111111111", 1),
            recipient(4, "0xabc", 1),
        ]);

        match list.resolve_addresses() {
            Err(FlowError::Format { line, .. }) => assert_eq!(line, 4),
            other => panic!("expected format error, got {:?}", other),
        }
    }

    #[test]
    fn test_macro_params_display() {
        let params = MacroCallParams::new(Bytes::from(vec![0xde, 0xad]));
        assert_eq!(params.to_string(), "0xdead");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_invalid_inspection_clears_fields() {
        let inspection = PoolInspection::invalid("0xabc");
        assert_eq!(inspection.validity, PoolValidity::Invalid);
        assert!(inspection.token.is_none());
        assert!(inspection.balance.is_none());
        assert!(!inspection.is_valid());
    }
}
