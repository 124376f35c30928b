//! Conversions between human-readable decimals and WAD fractions
//!
//! Risk parameters are usually written as "0.75" or "1.08"; these helpers
//! turn them into exact WAD integers and refuse anything that would lose
//! precision.

use anchor_lang::prelude::*;
use rust_decimal::Decimal;
use crate::errors::RiskError;
use super::safe_math::checked_mul;

/// Number of fractional digits carried by a WAD value
const WAD_DECIMALS: u32 = 18;

/// Convert a non-negative decimal to a WAD-scaled integer
///
/// `0.7` → `700_000_000_000_000_000`. Fails with `InvalidDecimal` for
/// negative values or values with more than 18 fractional digits.
pub fn to_wad(value: Decimal) -> Result<u128> {
    require!(!value.is_sign_negative(), RiskError::InvalidDecimal);

    let value = value.normalize();
    let scale = value.scale();
    require!(scale <= WAD_DECIMALS, RiskError::InvalidDecimal);

    let mantissa = u128::try_from(value.mantissa()).map_err(|_| RiskError::InvalidDecimal)?;
    checked_mul(mantissa, 10u128.pow(WAD_DECIMALS - scale))
}

/// Convert a WAD-scaled integer back into a decimal
///
/// Fails with `InvalidDecimal` above the 96-bit mantissa `Decimal` carries.
pub fn from_wad(value: u128) -> Result<Decimal> {
    let mantissa = i128::try_from(value).map_err(|_| RiskError::InvalidDecimal)?;
    let decimal = Decimal::try_from_i128_with_scale(mantissa, WAD_DECIMALS)
        .map_err(|_| RiskError::InvalidDecimal)?;
    Ok(decimal.normalize())
}

/// Render a WAD value for log lines: `1.08` when it fits a decimal, the raw
/// integer otherwise
pub fn display_wad(value: u128) -> String {
    match from_wad(value) {
        Ok(decimal) => decimal.to_string(),
        Err(_) => format!("{value}e-18"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::WAD;
    use crate::errors::assert_risk_err;

    #[test]
    fn test_to_wad() {
        assert_eq!(to_wad(Decimal::new(7, 1)).unwrap(), WAD * 7 / 10);
        assert_eq!(to_wad(Decimal::new(108, 2)).unwrap(), WAD * 108 / 100);
        assert_eq!(to_wad(Decimal::ONE).unwrap(), WAD);
        assert_eq!(to_wad(Decimal::ZERO).unwrap(), 0);
        // trailing zeros beyond 18 digits are fine once normalized
        assert_eq!(to_wad(Decimal::new(5_000, 20)).unwrap(), 50);
    }

    #[test]
    fn test_to_wad_rejects_lossy_values() {
        assert_risk_err(to_wad(Decimal::new(-1, 0)), RiskError::InvalidDecimal);
        assert_risk_err(to_wad(Decimal::new(1, 19)), RiskError::InvalidDecimal);
    }

    #[test]
    fn test_display_wad() {
        assert_eq!(display_wad(WAD * 108 / 100), "1.08");
        assert_eq!(display_wad(WAD / 50), "0.02");
        assert_eq!(display_wad(u128::MAX), format!("{}e-18", u128::MAX));
    }

    #[test]
    fn test_from_wad() {
        assert_eq!(from_wad(WAD / 2).unwrap(), Decimal::new(5, 1));
        assert_eq!(from_wad(WAD * 3).unwrap(), Decimal::new(3, 0));
    }
}
