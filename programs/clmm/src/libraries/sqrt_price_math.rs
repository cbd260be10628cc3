//! Helper functions to find price changes for a change in token supply and
//! vice versa. Prices move along `√P`, token A amounts along `L/√P` and token
//! B amounts along `L·√P`; every rounding direction favours pool solvency.
use super::big_num::U256;
use super::fixed_point_64;
use super::full_math::MulDiv;
use super::unsafe_math::UnsafeMathTrait;
use crate::error::ErrorCode;

/// Gets the next sqrt price √P' given a delta of token A
///
/// Always round up because
/// 1. In the exact output case, token A supply decreases leading to price increase.
/// Move price up so that exact output is met.
/// 2. In the exact input case, token A supply increases leading to price decrease.
/// Do not round down to minimize price impact. We only need to meet input
/// change and not guarantee exact output.
///
/// # Formula
///
/// * `√P' = √P * L / (L + Δx * √P)`
pub fn get_next_sqrt_price_from_amount_a_rounding_up(
    sqrt_price_x64: u128,
    liquidity: u128,
    amount: u64,
    add: bool,
) -> u128 {
    // short circuit amount == 0 because the result is otherwise not
    // guaranteed to equal the input price
    if amount == 0 {
        return sqrt_price_x64;
    };
    let numerator_1 = U256::from(liquidity) << fixed_point_64::RESOLUTION;
    let product = U256::from(amount) * U256::from(sqrt_price_x64);

    if add {
        let denominator = numerator_1 + product;
        numerator_1
            .mul_div_ceil(U256::from(sqrt_price_x64), denominator)
            .unwrap()
            .as_u128()
    } else {
        // the denominator must not underflow; callers bound `amount` by the
        // delta to the target price
        assert!(numerator_1 > product);
        let denominator = numerator_1 - product;
        numerator_1
            .mul_div_ceil(U256::from(sqrt_price_x64), denominator)
            .unwrap()
            .as_u128()
    }
}

/// Gets the next sqrt price given a delta of token B
///
/// Always round down because
/// 1. In the exact output case, token B supply decreases leading to price decrease.
/// Move price down by rounding down so that exact output of token A is met.
/// 2. In the exact input case, token B supply increases leading to price increase.
///
/// # Formula
///
/// * `√P' = √P + Δy / L`
pub fn get_next_sqrt_price_from_amount_b_rounding_down(
    sqrt_price_x64: u128,
    liquidity: u128,
    amount: u64,
    add: bool,
) -> u128 {
    // if we are adding (subtracting), rounding down requires rounding the
    // quotient down (up)
    if add {
        let quotient = ((amount as u128) << fixed_point_64::RESOLUTION) / liquidity;
        sqrt_price_x64.checked_add(quotient).unwrap()
    } else {
        let numerator = (amount as u128) << fixed_point_64::RESOLUTION;
        let quotient = numerator / liquidity + ((numerator % liquidity > 0) as u128);
        assert!(sqrt_price_x64 > quotient);
        sqrt_price_x64 - quotient
    }
}

/// Gets the next sqrt price given an input amount of token A or token B
///
/// # Arguments
///
/// * `sqrt_price_x64` - The starting price `√P`, before accounting for the input amount
/// * `liquidity` - The amount of usable liquidity
/// * `amount_in` - How much of token A, or token B, is being swapped in
/// * `a_to_b` - Whether the amount in is token A or token B
pub fn get_next_sqrt_price_from_input(
    sqrt_price_x64: u128,
    liquidity: u128,
    amount_in: u64,
    a_to_b: bool,
) -> u128 {
    assert!(sqrt_price_x64 > 0);
    assert!(liquidity > 0);

    // round to make sure that we don't pass the target price
    if a_to_b {
        get_next_sqrt_price_from_amount_a_rounding_up(sqrt_price_x64, liquidity, amount_in, true)
    } else {
        get_next_sqrt_price_from_amount_b_rounding_down(sqrt_price_x64, liquidity, amount_in, true)
    }
}

/// Gets the next sqrt price given an output amount of token A or token B
pub fn get_next_sqrt_price_from_output(
    sqrt_price_x64: u128,
    liquidity: u128,
    amount_out: u64,
    a_to_b: bool,
) -> u128 {
    assert!(sqrt_price_x64 > 0);
    assert!(liquidity > 0);

    if a_to_b {
        get_next_sqrt_price_from_amount_b_rounding_down(sqrt_price_x64, liquidity, amount_out, false)
    } else {
        get_next_sqrt_price_from_amount_a_rounding_up(sqrt_price_x64, liquidity, amount_out, false)
    }
}

/// Gets the amount of token A between two prices, for a given amount of liquidity
///
/// # Formula
///
/// * `Δx = L * (1 / √P_lower - 1 / √P_upper)`
/// * i.e. `L * (√P_upper - √P_lower) / (√P_upper * √P_lower)`
pub fn get_amount_a_delta_unsigned(
    mut sqrt_price_a_x64: u128,
    mut sqrt_price_b_x64: u128,
    liquidity: u128,
    round_up: bool,
) -> Result<u64, ErrorCode> {
    // sqrt_price_a_x64 should hold the smaller value
    if sqrt_price_a_x64 > sqrt_price_b_x64 {
        std::mem::swap(&mut sqrt_price_a_x64, &mut sqrt_price_b_x64);
    };
    assert!(sqrt_price_a_x64 > 0);

    let numerator_1 = U256::from(liquidity) << fixed_point_64::RESOLUTION;
    let numerator_2 = U256::from(sqrt_price_b_x64 - sqrt_price_a_x64);

    let result = if round_up {
        U256::div_rounding_up(
            numerator_1
                .mul_div_ceil(numerator_2, U256::from(sqrt_price_b_x64))
                .unwrap(),
            U256::from(sqrt_price_a_x64),
        )
    } else {
        numerator_1
            .mul_div_floor(numerator_2, U256::from(sqrt_price_b_x64))
            .unwrap()
            / U256::from(sqrt_price_a_x64)
    };
    if result > U256::from(u64::MAX) {
        return Err(ErrorCode::MultiplicationOverflow);
    }
    Ok(result.as_u64())
}

/// Gets the amount of token B between two prices, for a given amount of liquidity
///
/// # Formula
///
/// * `Δy = L (√P_upper - √P_lower)`
pub fn get_amount_b_delta_unsigned(
    mut sqrt_price_a_x64: u128,
    mut sqrt_price_b_x64: u128,
    liquidity: u128,
    round_up: bool,
) -> Result<u64, ErrorCode> {
    // sqrt_price_a_x64 should hold the smaller value
    if sqrt_price_a_x64 > sqrt_price_b_x64 {
        std::mem::swap(&mut sqrt_price_a_x64, &mut sqrt_price_b_x64);
    };

    let result = if round_up {
        U256::from(liquidity).mul_div_ceil(
            U256::from(sqrt_price_b_x64 - sqrt_price_a_x64),
            U256::from(fixed_point_64::Q64),
        )
    } else {
        U256::from(liquidity).mul_div_floor(
            U256::from(sqrt_price_b_x64 - sqrt_price_a_x64),
            U256::from(fixed_point_64::Q64),
        )
    }
    .unwrap();
    if result > U256::from(u64::MAX) {
        return Err(ErrorCode::MultiplicationOverflow);
    }
    Ok(result.as_u64())
}
