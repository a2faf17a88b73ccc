use crate::error::CustomErrorCode;
use anchor_lang::prelude::*;

/// `floor(a * b / denom)` in u128; a zero denominator yields zero.
pub fn mul_div(a: u64, b: u64, denom: u64) -> Result<u64> {
    if denom == 0 {
        return Ok(0);
    }
    let num = (a as u128)
        .checked_mul(b as u128)
        .ok_or_else(|| error!(CustomErrorCode::MathOverflow))?;
    u64::try_from(num / denom as u128).map_err(|_| error!(CustomErrorCode::MathOverflow))
}

pub fn checked_add(a: u64, b: u64) -> Result<u64> {
    a.checked_add(b).ok_or_else(|| error!(CustomErrorCode::MathOverflow))
}

pub fn checked_sub(a: u64, b: u64) -> Result<u64> {
    a.checked_sub(b).ok_or_else(|| error!(CustomErrorCode::MathOverflow))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floors_and_handles_zero_denominator() {
        assert_eq!(mul_div(10, 6, 10).unwrap(), 6);
        assert_eq!(mul_div(11, 40, 80).unwrap(), 5);
        assert_eq!(mul_div(5, 5, 0).unwrap(), 0);
        assert_eq!(mul_div(u64::MAX, 2, 2).unwrap(), u64::MAX);
        assert!(mul_div(u64::MAX, 2, 1).is_err());
    }
}
