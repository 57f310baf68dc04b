//! Recipient text parsing
//!
//! Input is one recipient per line in the form `address,units`. Blank
//! lines are skipped. Address tokens are kept as entered; they are
//! validated when the parameter call is assembled.

use crate::{FlowError, Recipient, RecipientList, Result, UnitWeight};

/// Parse free-form recipient text into an ordered list.
pub fn parse_recipients(text: &str) -> Result<RecipientList> {
    let mut recipients = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        if raw.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = raw.split(',').map(str::trim).collect();
        let (address, units) = match fields.as_slice() {
            [address, units] if !address.is_empty() && !units.is_empty() => (*address, *units),
            _ => {
                return Err(FlowError::format(
                    line,
                    "expected exactly two comma-separated fields: address,units",
                ))
            }
        };

        recipients.push(Recipient {
            line,
            address: address.to_string(),
            units: parse_units(line, units)?,
        });
    }

    Ok(RecipientList::new(recipients))
}

fn parse_units(line: usize, text: &str) -> Result<UnitWeight> {
    if !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FlowError::format(
            line,
            format!("units '{}' is not a non-negative integer", text),
        ));
    }
    text.parse::<UnitWeight>()
        .map_err(|_| FlowError::format(line, format!("units '{}' exceeds 128 bits", text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preserves_order() {
        let list = parse_recipients("0xabc,100\n0xdef,200").unwrap();
        let pairs: Vec<(&str, u128)> = list.iter().map(|r| (r.address.as_str(), r.units)).collect();
        assert_eq!(pairs, vec![("0xabc", 100), ("0xdef", 200)]);
    }

    #[test]
    fn test_missing_units_fails_on_first_line() {
        let err = parse_recipients("0xabc\n0xdef,200").unwrap_err();
        assert!(matches!(err, FlowError::Format { line: 1, .. }));
    }

    #[test]
    fn test_blank_lines_skipped_but_counted() {
        let list = parse_recipients("\n  \n0xabc, 5 \n\n0xdef ,6\n").unwrap();
        assert_eq!(list.len(), 2);
        let lines: Vec<usize> = list.iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![3, 5]);
    }

    #[test]
    fn test_whitespace_trimmed() {
        let list = parse_recipients("   0xabc   ,   42   ").unwrap();
        let r = list.iter().next().unwrap();
        assert_eq!(r.address, "0xabc");
        assert_eq!(r.units, 42);
    }

    #[test]
    fn test_three_fields_rejected() {
        let err = parse_recipients("0xabc,1\n0xdef,2,3").unwrap_err();
        assert!(matches!(err, FlowError::Format { line: 2, .. }));
    }

    #[test]
    fn test_empty_field_rejected() {
        assert!(matches!(
            parse_recipients(",100").unwrap_err(),
            FlowError::Format { line: 1, .. }
        ));
        assert!(matches!(
            parse_recipients("0xabc,").unwrap_err(),
            FlowError::Format { line: 1, .. }
        ));
    }

    #[test]
    fn test_negative_and_fractional_units_rejected() {
        assert!(parse_recipients("0xabc,-1").is_err());
        assert!(parse_recipients("0xabc,1.5").is_err());
        assert!(parse_recipients("0xabc,+1").is_err());
        assert!(parse_recipients("0xabc,1e3").is_err());
    }

    #[test]
    fn test_units_128_bit_bound() {
        let max = u128::MAX.to_string();
        let list = parse_recipients(&format!("0xabc,{}", max)).unwrap();
        assert_eq!(list.units(), vec![u128::MAX]);

        let over = "340282366920938463463374607431768211456"; // 2^128
        let err = parse_recipients(&format!("0xabc,{}", over)).unwrap_err();
        assert!(err.to_string().contains("exceeds 128 bits"));
    }

    #[test]
    fn test_duplicates_passed_through() {
        let list = parse_recipients("0xabc,1\n0xabc,2").unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.units(), vec![1, 2]);
    }

    #[test]
    fn test_empty_input_is_empty_list() {
        assert!(parse_recipients("").unwrap().is_empty());
        assert!(parse_recipients("\n\n").unwrap().is_empty());
    }

    #[test]
    fn test_crlf_input() {
        let list = parse_recipients("0xabc,1\r\n0xdef,2\r\n").unwrap();
        assert_eq!(list.units(), vec![1, 2]);
    }
}
