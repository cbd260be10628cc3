//! Liquidity amount functions
//! Provides functions for computing liquidity amounts from token amounts and
//! prices, and the three-region split of a liquidity change into token
//! amounts.
use super::big_num::{U128, U256};
use super::fixed_point_64;
use super::full_math::{MulDiv, Upcast256};
use super::sqrt_price_math;
use super::tick_math;
use crate::error::ErrorCode;

/// Computes the amount of liquidity received for a given amount of token A and price range
/// Calculates ΔL = Δx (√P_upper x √P_lower)/(√P_upper - √P_lower)
pub fn get_liquidity_for_amount_a(
    mut sqrt_price_a_x64: u128,
    mut sqrt_price_b_x64: u128,
    amount_a: u64,
) -> Result<u128, ErrorCode> {
    // sqrt_price_a_x64 should hold the smaller value
    if sqrt_price_a_x64 > sqrt_price_b_x64 {
        std::mem::swap(&mut sqrt_price_a_x64, &mut sqrt_price_b_x64);
    };
    let intermediate = U256::from(sqrt_price_a_x64)
        .mul_div_floor(
            U256::from(sqrt_price_b_x64),
            U256::from(fixed_point_64::Q64),
        )
        .unwrap();

    let liquidity = U256::from(amount_a)
        .mul_div_floor(
            intermediate,
            U256::from(sqrt_price_b_x64 - sqrt_price_a_x64),
        )
        .unwrap();
    if liquidity > U128::MAX.as_u256() {
        return Err(ErrorCode::LiquidityOverflow);
    }
    Ok(liquidity.as_u128())
}

/// Computes the amount of liquidity received for a given amount of token B and price range
/// Calculates ΔL = Δy / (√P_upper - √P_lower)
pub fn get_liquidity_for_amount_b(
    mut sqrt_price_a_x64: u128,
    mut sqrt_price_b_x64: u128,
    amount_b: u64,
) -> Result<u128, ErrorCode> {
    // sqrt_price_a_x64 should hold the smaller value
    if sqrt_price_a_x64 > sqrt_price_b_x64 {
        std::mem::swap(&mut sqrt_price_a_x64, &mut sqrt_price_b_x64);
    };

    let liquidity = U256::from(amount_b)
        .mul_div_floor(
            U256::from(fixed_point_64::Q64),
            U256::from(sqrt_price_b_x64 - sqrt_price_a_x64),
        )
        .unwrap();
    if liquidity > U128::MAX.as_u256() {
        return Err(ErrorCode::LiquidityOverflow);
    }
    Ok(liquidity.as_u128())
}

/// Computes the liquidity minted by a fixed amount of one token, given the
/// current pool price and the prices at the range boundaries.
///
/// Fixing token A above the range (or token B below it) cannot mint
/// liquidity, so those combinations are rejected.
pub fn get_liquidity_from_single_amount(
    sqrt_price_x64: u128,
    mut sqrt_price_a_x64: u128,
    mut sqrt_price_b_x64: u128,
    amount: u64,
    is_token_a: bool,
) -> Result<u128, ErrorCode> {
    // sqrt_price_a_x64 should hold the smaller value
    if sqrt_price_a_x64 > sqrt_price_b_x64 {
        std::mem::swap(&mut sqrt_price_a_x64, &mut sqrt_price_b_x64);
    };

    if is_token_a {
        if sqrt_price_x64 <= sqrt_price_a_x64 {
            get_liquidity_for_amount_a(sqrt_price_a_x64, sqrt_price_b_x64, amount)
        } else if sqrt_price_x64 < sqrt_price_b_x64 {
            get_liquidity_for_amount_a(sqrt_price_x64, sqrt_price_b_x64, amount)
        } else {
            Err(ErrorCode::InvalidDeltaLiquidity)
        }
    } else if sqrt_price_x64 >= sqrt_price_b_x64 {
        get_liquidity_for_amount_b(sqrt_price_a_x64, sqrt_price_b_x64, amount)
    } else if sqrt_price_x64 > sqrt_price_a_x64 {
        get_liquidity_for_amount_b(sqrt_price_a_x64, sqrt_price_x64, amount)
    } else {
        Err(ErrorCode::InvalidDeltaLiquidity)
    }
}

/// Computes the token A and token B amounts bound to (or released by) a
/// liquidity change over `[tick_lower, tick_upper)`.
///
/// Three regions: current tick below the range puts the whole change in
/// token A, inside the range splits it at the current price, above the range
/// puts it all in token B. `round_up` is true when the caller owes the pool
/// (adding liquidity) and false when the pool pays out (removing).
pub fn get_delta_amounts(
    tick_current: i32,
    sqrt_price_x64: u128,
    tick_lower: i32,
    tick_upper: i32,
    liquidity_delta: u128,
    round_up: bool,
) -> Result<(u64, u64), ErrorCode> {
    let sqrt_price_lower_x64 = tick_math::get_sqrt_price_at_tick(tick_lower)?;
    let sqrt_price_upper_x64 = tick_math::get_sqrt_price_at_tick(tick_upper)?;

    if tick_current < tick_lower {
        Ok((
            sqrt_price_math::get_amount_a_delta_unsigned(
                sqrt_price_lower_x64,
                sqrt_price_upper_x64,
                liquidity_delta,
                round_up,
            )?,
            0,
        ))
    } else if tick_current < tick_upper {
        Ok((
            sqrt_price_math::get_amount_a_delta_unsigned(
                sqrt_price_x64,
                sqrt_price_upper_x64,
                liquidity_delta,
                round_up,
            )?,
            sqrt_price_math::get_amount_b_delta_unsigned(
                sqrt_price_lower_x64,
                sqrt_price_x64,
                liquidity_delta,
                round_up,
            )?,
        ))
    } else {
        Ok((
            0,
            sqrt_price_math::get_amount_b_delta_unsigned(
                sqrt_price_lower_x64,
                sqrt_price_upper_x64,
                liquidity_delta,
                round_up,
            )?,
        ))
    }
}
