//! Bonding curve pricing.
//!
//! Linear: with k = reserve_ratio * 10_000, price(s) = s / k, so the cost of
//! moving the supply from s0 to s1 is (s1^2 - s0^2) / (2k).
//!
//! Quadratic: with r = reserve_ratio / 10_000, buying `a` tokens at supply `s`
//! costs r * (s * a + a^2 / 2) and selling them returns r * (s * a - a^2 / 2).
//! The ratio is applied as a fraction and truncation happens once, at the end.
//!
//! All math runs on u128 with checked operations.

use crate::accounts::CurveShape;
use crate::constants::{BPS_DENOMINATOR, MAX_RESERVE_RATIO};
use crate::error::{SdkError, SdkResult};

/// Reject a reserve ratio outside (0, 10_000] basis points.
pub fn validate_reserve_ratio(reserve_ratio: u16) -> SdkResult<()> {
    if reserve_ratio == 0 || reserve_ratio > MAX_RESERVE_RATIO {
        return Err(SdkError::InvalidCurveParameters(format!(
            "reserve ratio must be in (0, {MAX_RESERVE_RATIO}] basis points, got {reserve_ratio}"
        )));
    }
    Ok(())
}

fn curve_constant(reserve_ratio: u16) -> SdkResult<u128> {
    validate_reserve_ratio(reserve_ratio)?;
    Ok(reserve_ratio as u128 * BPS_DENOMINATOR as u128)
}

fn square(x: u128) -> SdkResult<u128> {
    x.checked_mul(x).ok_or(SdkError::ArithmeticOverflow)
}

/// Cost in lamports of buying `amount` tokens at `current_supply`.
pub fn buy_cost(amount: u64, reserve_ratio: u16, current_supply: u64) -> SdkResult<u128> {
    let k = curve_constant(reserve_ratio)?;
    let s0 = current_supply as u128;
    let s1 = s0
        .checked_add(amount as u128)
        .ok_or(SdkError::ArithmeticOverflow)?;

    let area = square(s1)?
        .checked_sub(square(s0)?)
        .ok_or(SdkError::ArithmeticOverflow)?;
    let denominator = k.checked_mul(2).ok_or(SdkError::ArithmeticOverflow)?;
    Ok(area / denominator)
}

/// Lamports returned for selling `amount` tokens at `current_supply`.
pub fn sell_reward(amount: u64, reserve_ratio: u16, current_supply: u64) -> SdkResult<u128> {
    if amount > current_supply {
        return Err(SdkError::InsufficientSupply {
            amount,
            supply: current_supply,
        });
    }
    let k = curve_constant(reserve_ratio)?;
    let s0 = current_supply as u128;
    let s1 = s0 - amount as u128;

    let area = square(s0)?
        .checked_sub(square(s1)?)
        .ok_or(SdkError::ArithmeticOverflow)?;
    let denominator = k.checked_mul(2).ok_or(SdkError::ArithmeticOverflow)?;
    Ok(area / denominator)
}

/// Marginal price at `current_supply`, truncated.
pub fn spot_price(current_supply: u64, reserve_ratio: u16) -> SdkResult<u128> {
    let k = curve_constant(reserve_ratio)?;
    Ok(current_supply as u128 / k)
}

/// Cost of buying `amount` tokens at `current_supply` on the quadratic curve.
pub fn quadratic_buy_cost(amount: u64, reserve_ratio: u16, current_supply: u64) -> SdkResult<u128> {
    validate_reserve_ratio(reserve_ratio)?;
    let a = amount as u128;
    let s = current_supply as u128;

    // 2sa + a^2
    let area = s
        .checked_mul(a)
        .and_then(|v| v.checked_mul(2))
        .and_then(|v| v.checked_add(a.checked_mul(a)?))
        .ok_or(SdkError::ArithmeticOverflow)?;
    quadratic_scale(area, reserve_ratio)
}

/// Lamports returned for selling `amount` tokens at `current_supply` on the
/// quadratic curve.
pub fn quadratic_sell_reward(amount: u64, reserve_ratio: u16, current_supply: u64) -> SdkResult<u128> {
    if amount > current_supply {
        return Err(SdkError::InsufficientSupply {
            amount,
            supply: current_supply,
        });
    }
    validate_reserve_ratio(reserve_ratio)?;
    let a = amount as u128;
    let s = current_supply as u128;

    // 2sa - a^2, non-negative because a <= s
    let area = s
        .checked_mul(a)
        .and_then(|v| v.checked_mul(2))
        .and_then(|v| v.checked_sub(a.checked_mul(a)?))
        .ok_or(SdkError::ArithmeticOverflow)?;
    quadratic_scale(area, reserve_ratio)
}

fn quadratic_scale(area: u128, reserve_ratio: u16) -> SdkResult<u128> {
    let scaled = area
        .checked_mul(reserve_ratio as u128)
        .ok_or(SdkError::ArithmeticOverflow)?;
    Ok(scaled / (2 * BPS_DENOMINATOR as u128))
}

/// Buy cost on the curve named by `shape`.
pub fn curve_buy_cost(
    shape: CurveShape,
    amount: u64,
    reserve_ratio: u16,
    current_supply: u64,
) -> SdkResult<u128> {
    match shape {
        CurveShape::Linear => buy_cost(amount, reserve_ratio, current_supply),
        CurveShape::Quadratic => quadratic_buy_cost(amount, reserve_ratio, current_supply),
    }
}

/// Sell reward on the curve named by `shape`.
pub fn curve_sell_reward(
    shape: CurveShape,
    amount: u64,
    reserve_ratio: u16,
    current_supply: u64,
) -> SdkResult<u128> {
    match shape {
        CurveShape::Linear => sell_reward(amount, reserve_ratio, current_supply),
        CurveShape::Quadratic => quadratic_sell_reward(amount, reserve_ratio, current_supply),
    }
}

/// Marginal price on the curve named by `shape`, truncated. The quadratic
/// curve's marginal price is `supply * reserve_ratio / 10_000`.
pub fn curve_spot_price(shape: CurveShape, current_supply: u64, reserve_ratio: u16) -> SdkResult<u128> {
    match shape {
        CurveShape::Linear => spot_price(current_supply, reserve_ratio),
        CurveShape::Quadratic => {
            validate_reserve_ratio(reserve_ratio)?;
            Ok(current_supply as u128 * reserve_ratio as u128 / BPS_DENOMINATOR as u128)
        }
    }
}

/// Native reserve the pool must hold at creation:
/// `initial_price * (initial_supply / 10^decimals) * reserve_ratio / 10_000`.
///
/// The supply is converted to whole tokens first. A decimals value whose power
/// of ten exceeds u128 leaves zero whole tokens.
pub fn initial_reserve_requirement(
    initial_price: u64,
    initial_supply: u64,
    reserve_ratio: u16,
    token_decimals: u8,
) -> SdkResult<u128> {
    if initial_price == 0 {
        return Err(SdkError::InvalidCurveParameters(
            "initial price must be greater than zero".to_string(),
        ));
    }
    if initial_supply == 0 {
        return Err(SdkError::InvalidCurveParameters(
            "initial supply must be greater than zero".to_string(),
        ));
    }
    validate_reserve_ratio(reserve_ratio)?;

    let whole_tokens = match 10u128.checked_pow(token_decimals as u32) {
        Some(scale) => initial_supply as u128 / scale,
        None => 0,
    };

    let reserve = (initial_price as u128)
        .checked_mul(whole_tokens)
        .and_then(|v| v.checked_mul(reserve_ratio as u128))
        .ok_or(SdkError::ArithmeticOverflow)?;
    Ok(reserve / BPS_DENOMINATOR as u128)
}
