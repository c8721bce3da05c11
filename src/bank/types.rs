//! Types used throughout the ledger.
use serde::{Deserialize, Serialize, de};

/// Decimal precision for monetary values.
/// This is used to convert floating-point values to fixed-point representation.
pub const DECIMAL_PRECISION: f64 = 10000.0;

/// Customer ID type, formatted as `CUST####`.
pub type CustomerId = String;

/// Account number type, formatted as `ACC######`.
pub type AccountNumber = String;

/// Money type, representing a fixed-point monetary value.
pub type Money = i64;

/// Formats the `n`-th customer identifier.
pub fn customer_id(n: usize) -> CustomerId {
    format!("CUST{n:04}")
}

/// Formats the `n`-th account number.
pub fn account_number(n: usize) -> AccountNumber {
    format!("ACC{n:06}")
}

/// Converts a decimal value into fixed-point money, rounding to the nearest unit.
///
/// Returns `None` for non-finite values and values that do not fit a `Money` once scaled.
pub fn money_from_f64(value: f64) -> Option<Money> {
    let scaled = (value * DECIMAL_PRECISION).round();
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive
    if scaled.is_finite() && scaled >= Money::MIN as f64 && scaled < Money::MAX as f64 {
        Some(scaled as Money)
    } else {
        None
    }
}

/// Converts fixed-point money back into a decimal value.
pub fn money_to_f64(money: Money) -> f64 {
    money as f64 / DECIMAL_PRECISION
}

/// Parses a decimal string such as `"12.5"` into fixed-point money.
pub fn parse_money(text: &str) -> Option<Money> {
    let value: f64 = text.trim().parse().ok()?;
    money_from_f64(value)
}

pub(crate) fn serialize_money<S>(money: &Money, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    money_to_f64(*money).serialize(serializer)
}

pub(crate) fn deserialize_money<'de, D>(deserializer: D) -> Result<Money, D::Error>
where
    D: de::Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    money_from_f64(value)
        .ok_or_else(|| de::Error::custom(format!("amount {value} is out of range")))
}

/// Custom deserializer for optional monetary values, used by CSV input where the column
/// may be empty.
pub(crate) fn deserialize_optional_money<'de, D>(
    deserializer: D,
) -> Result<Option<Money>, D::Error>
where
    D: de::Deserializer<'de>,
{
    let value: Option<f64> = Option::deserialize(deserializer)?;
    value
        .map(|value| {
            money_from_f64(value)
                .ok_or_else(|| de::Error::custom(format!("amount {value} is out of range")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_formatting() {
        assert_eq!(customer_id(1), "CUST0001");
        assert_eq!(account_number(42), "ACC000042");
    }

    #[test]
    fn test_money_conversion_rounds() {
        assert_eq!(money_from_f64(0.29), Some(2900));
        assert_eq!(money_from_f64(500.0), Some(5_000_000));
        assert_eq!(money_to_f64(12_345), 1.2345);
    }

    #[test]
    fn test_parse_money() {
        assert_eq!(parse_money(" 10.5 "), Some(105_000));
        assert_eq!(parse_money("abc"), None);
        assert_eq!(parse_money("inf"), None);
        assert_eq!(parse_money("1e30"), None);
    }

    #[test]
    fn test_money_out_of_range() {
        assert_eq!(money_from_f64(f64::NAN), None);
        assert_eq!(money_from_f64(f64::INFINITY), None);
        assert_eq!(money_from_f64(f64::NEG_INFINITY), None);
        assert_eq!(money_from_f64(1e300), None);
        assert_eq!(money_from_f64(-1e300), None);
        // largest whole amount that still fits once scaled
        assert_eq!(money_from_f64(900_000_000_000_000.0), Some(9_000_000_000_000_000_000));
    }
}
