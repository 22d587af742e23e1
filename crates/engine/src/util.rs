//! Internal helpers for input validation.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation so every operation rejects the same inputs the same way.

use crate::{EngineError, Money, ResultEngine};

/// Trim a required text field, rejecting blank values.
pub(crate) fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidArgument(format!(
            "{label} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

/// Same as [`normalize_required_text`] for optional patch fields.
pub(crate) fn normalize_optional_text(
    value: Option<&str>,
    label: &str,
) -> ResultEngine<Option<String>> {
    value
        .map(|value| normalize_required_text(value, label))
        .transpose()
}

/// Largest amount a single expense may carry: 1 000 000 000.00.
///
/// Keeps claim sheet totals far inside the range of the store's integer sum.
pub(crate) const MAX_EXPENSE_AMOUNT: Money = Money::new(100_000_000_000);

/// Expense amounts must be strictly positive and at most
/// [`MAX_EXPENSE_AMOUNT`].
pub(crate) fn validate_amount(amount: Money) -> ResultEngine<()> {
    if !amount.is_positive() {
        return Err(EngineError::InvalidAmount(format!(
            "amount must be positive, got {amount}"
        )));
    }
    if amount > MAX_EXPENSE_AMOUNT {
        return Err(EngineError::InvalidAmount(format!(
            "amount must not exceed {MAX_EXPENSE_AMOUNT}, got {amount}"
        )));
    }
    Ok(())
}
