//! Seal-code gate in front of a reading.
//!
//! The gate only filters casual access: any six digits adding up to
//! [`SEAL_DIGIT_SUM`] open it.

use crate::error::{ValidationError, ACCESS_CODE_LEN};

pub const SEAL_DIGIT_SUM: u32 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// Fewer than six digits so far; nothing was checked.
    Incomplete,
    Unlocked,
    /// Six digits with the wrong sum. The entry has been cleared.
    Rejected,
}

/// Checks a code entry. Partial entries are never validated against the seal.
pub fn check_code(entry: &str) -> Result<GateOutcome, ValidationError> {
    let mut sum = 0;
    let mut len = 0;
    for ch in entry.chars() {
        let digit = ch.to_digit(10).ok_or(ValidationError::CodeNotNumeric)?;
        sum += digit;
        len += 1;
    }

    if len > ACCESS_CODE_LEN {
        return Err(ValidationError::CodeTooLong);
    }
    if len < ACCESS_CODE_LEN {
        return Ok(GateOutcome::Incomplete);
    }
    if sum == SEAL_DIGIT_SUM {
        Ok(GateOutcome::Unlocked)
    } else {
        Ok(GateOutcome::Rejected)
    }
}
