//! Project-specific utilities live here.

pub mod openapi;

use std::str::FromStr;

use anyhow::anyhow;
use rust_decimal::Decimal;

use crate::error::ShopError;

/// Formats a shared log prefix for project logs.
pub fn log_prefix(module: &str) -> String {
    format!("bookshop::{module}")
}

/// Parse a decimal stored as TEXT.
pub fn parse_decimal(column: &str, raw: &str) -> Result<Decimal, ShopError> {
    Decimal::from_str(raw)
        .map_err(|err| ShopError::Internal(anyhow!("malformed decimal in {column}: {raw:?} ({err})")))
}

/// Trimmed text, or `None` when blank.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `validator` check for strings that must contain a non-whitespace character.
pub fn not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(validator::ValidationError::new("blank").with_message("must not be blank".into()));
    }
    Ok(())
}

/// Upper bound on a catalog price.
pub const MAX_PRICE: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// `validator` check for prices: between zero and [`MAX_PRICE`].
pub fn price_in_range(value: &Decimal) -> Result<(), validator::ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(validator::ValidationError::new("range").with_message("must not be negative".into()));
    }
    if *value > MAX_PRICE {
        return Err(validator::ValidationError::new("range")
            .with_message(format!("must not exceed {MAX_PRICE}").into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimals_keep_their_scale() {
        let price = parse_decimal("price", "10.50").unwrap();
        assert_eq!(price.to_string(), "10.50");
        assert!(parse_decimal("price", "ten").is_err());
    }

    #[test]
    fn blank_strings_are_rejected() {
        assert!(not_blank("  ").is_err());
        assert!(not_blank("Main St 1").is_ok());
        assert_eq!(non_blank(Some("  ".to_string())), None);
        assert_eq!(non_blank(Some(" x ".to_string())), Some("x".to_string()));
    }

    #[test]
    fn prices_outside_the_range_are_rejected() {
        assert!(price_in_range(&Decimal::new(-1, 2)).is_err());
        assert!(price_in_range(&Decimal::ZERO).is_ok());
        assert!(price_in_range(&Decimal::new(1999, 2)).is_ok());
        assert!(price_in_range(&MAX_PRICE).is_ok());
        assert!(price_in_range(&(MAX_PRICE + Decimal::new(1, 2))).is_err());
        assert!(price_in_range(&Decimal::MAX).is_err());
    }

    #[test]
    fn log_prefix_is_namespaced() {
        assert_eq!(log_prefix("orders"), "bookshop::orders");
    }
}
