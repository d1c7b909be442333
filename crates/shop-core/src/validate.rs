//! Input checks shared by the services. All run before any store call.

use crate::error::{ShopError, ShopResult};

/// Largest quantity a single cart line may carry
pub const MAX_QUANTITY: i64 = u32::MAX as i64;

/// Require a present, non-blank text field; returns it trimmed
pub fn required<'a>(value: Option<&'a str>, field: &str) -> ShopResult<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ShopError::validation(format!(
            "Missing required field: {}.",
            field
        ))),
    }
}

/// Validate a `local@domain.tld` address and normalize it to lowercase
pub fn email(value: &str) -> ShopResult<String> {
    let invalid = || ShopError::validation("Invalid email format.");

    if value.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = value.rsplit_once('@').ok_or_else(invalid)?;
    if local.is_empty() {
        return Err(invalid());
    }

    let (host, tld) = domain.rsplit_once('.').ok_or_else(invalid)?;
    if host.is_empty() || tld.is_empty() {
        return Err(invalid());
    }

    Ok(value.to_lowercase())
}

/// Require a positive integer quantity
pub fn quantity(value: Option<i64>) -> ShopResult<i64> {
    match value {
        None => Err(ShopError::validation("Missing required field: quantity.")),
        Some(q) if (1..=MAX_QUANTITY).contains(&q) => Ok(q),
        Some(_) => Err(ShopError::validation(
            "quantity must be a positive integer.",
        )),
    }
}
