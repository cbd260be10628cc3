//! Finds the result of a swap within a single tick range, i.e. between two
//! neighbouring initialized ticks.
use super::full_math::MulDiv;
use super::sqrt_price_math;
use crate::error::ErrorCode;
use crate::states::config::FEE_RATE_DENOMINATOR_VALUE;

/// Result of a swap step
#[derive(Default, Debug, PartialEq)]
pub struct SwapStep {
    /// The price after swapping the amount in/out, not to exceed the price target
    pub sqrt_price_next_x64: u128,

    /// The amount to be swapped in, of either token A or token B, based on the direction of the swap
    pub amount_in: u64,

    /// The amount to be received, of either token A or token B, based on the direction of the swap
    pub amount_out: u64,

    /// The amount of input that will be taken as a fee
    pub fee_amount: u64,
}

/// Computes the result of swapping some amount in, or amount out, given the
/// parameters of the swap.
///
/// The fee, plus amount in, will never exceed the amount remaining in an
/// exact-input swap. With zero liquidity the step is empty: the price jumps
/// to the target and no amounts change hands.
///
/// # Arguments
///
/// * `sqrt_price_current_x64` - The current sqrt price of the pool
/// * `sqrt_price_target_x64` - The price that cannot be exceeded, from which
///   the direction of the swap is inferred
/// * `liquidity` - The usable liquidity
/// * `amount_remaining` - How much input or output amount remains to be swapped in/out
/// * `fee_rate` - The fee taken from the input amount, in hundredths of a bip (10^-6)
/// * `by_amount_in` - Whether `amount_remaining` fixes the input or the output side
pub fn compute_swap_step(
    sqrt_price_current_x64: u128,
    sqrt_price_target_x64: u128,
    liquidity: u128,
    amount_remaining: u64,
    fee_rate: u32,
    by_amount_in: bool,
) -> Result<SwapStep, ErrorCode> {
    let mut swap_step = SwapStep::default();
    if liquidity == 0 {
        swap_step.sqrt_price_next_x64 = sqrt_price_target_x64;
        return Ok(swap_step);
    }
    let a_to_b = sqrt_price_current_x64 >= sqrt_price_target_x64;

    if by_amount_in {
        let amount_remaining_less_fee = amount_remaining
            .mul_div_floor(
                (FEE_RATE_DENOMINATOR_VALUE - fee_rate) as u64,
                FEE_RATE_DENOMINATOR_VALUE as u64,
            )
            .unwrap();
        // None means the full move does not fit in a u64, so the target is
        // unreachable with the remaining budget
        let amount_in_to_target = if a_to_b {
            sqrt_price_math::get_amount_a_delta_unsigned(
                sqrt_price_target_x64,
                sqrt_price_current_x64,
                liquidity,
                true,
            )
        } else {
            sqrt_price_math::get_amount_b_delta_unsigned(
                sqrt_price_current_x64,
                sqrt_price_target_x64,
                liquidity,
                true,
            )
        }
        .ok();

        match amount_in_to_target.filter(|required| amount_remaining_less_fee >= *required) {
            Some(amount_in) => {
                swap_step.amount_in = amount_in;
                swap_step.sqrt_price_next_x64 = sqrt_price_target_x64;
            }
            None => {
                swap_step.sqrt_price_next_x64 = sqrt_price_math::get_next_sqrt_price_from_input(
                    sqrt_price_current_x64,
                    liquidity,
                    amount_remaining_less_fee,
                    a_to_b,
                );
            }
        }
    } else {
        let amount_out_to_target = if a_to_b {
            sqrt_price_math::get_amount_b_delta_unsigned(
                sqrt_price_target_x64,
                sqrt_price_current_x64,
                liquidity,
                false,
            )
        } else {
            sqrt_price_math::get_amount_a_delta_unsigned(
                sqrt_price_current_x64,
                sqrt_price_target_x64,
                liquidity,
                false,
            )
        }
        .ok();

        match amount_out_to_target.filter(|available| amount_remaining >= *available) {
            Some(amount_out) => {
                swap_step.amount_out = amount_out;
                swap_step.sqrt_price_next_x64 = sqrt_price_target_x64;
            }
            None => {
                swap_step.sqrt_price_next_x64 = sqrt_price_math::get_next_sqrt_price_from_output(
                    sqrt_price_current_x64,
                    liquidity,
                    amount_remaining,
                    a_to_b,
                );
            }
        }
    }

    // whether we reached the target price for this tick range
    let max = sqrt_price_target_x64 == swap_step.sqrt_price_next_x64;

    // get the input / output amounts for the realised price move
    if a_to_b {
        // if max is reached for exact input case, entire amount_in is needed
        if !(max && by_amount_in) {
            swap_step.amount_in = sqrt_price_math::get_amount_a_delta_unsigned(
                swap_step.sqrt_price_next_x64,
                sqrt_price_current_x64,
                liquidity,
                true,
            )?;
        };
        // if max is reached for exact output case, entire amount_out is needed
        if !(max && !by_amount_in) {
            swap_step.amount_out = sqrt_price_math::get_amount_b_delta_unsigned(
                swap_step.sqrt_price_next_x64,
                sqrt_price_current_x64,
                liquidity,
                false,
            )?;
        };
    } else {
        if !(max && by_amount_in) {
            swap_step.amount_in = sqrt_price_math::get_amount_b_delta_unsigned(
                sqrt_price_current_x64,
                swap_step.sqrt_price_next_x64,
                liquidity,
                true,
            )?;
        };
        if !(max && !by_amount_in) {
            swap_step.amount_out = sqrt_price_math::get_amount_a_delta_unsigned(
                sqrt_price_current_x64,
                swap_step.sqrt_price_next_x64,
                liquidity,
                false,
            )?;
        };
    }

    // for exact output, cap the output amount to not exceed the remaining amount
    if !by_amount_in && swap_step.amount_out > amount_remaining {
        swap_step.amount_out = amount_remaining;
    }

    swap_step.fee_amount =
        if by_amount_in && swap_step.sqrt_price_next_x64 != sqrt_price_target_x64 {
            // we didn't reach the target, so take the remainder of the input as fee:
            // swap dust is granted as fee
            amount_remaining.checked_sub(swap_step.amount_in).unwrap()
        } else {
            // take pip percentage as fee
            swap_step
                .amount_in
                .mul_div_ceil(
                    fee_rate as u64,
                    (FEE_RATE_DENOMINATOR_VALUE - fee_rate) as u64,
                )
                .ok_or(ErrorCode::MultiplicationOverflow)?
        };

    Ok(swap_step)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::libraries::tick_math;

    #[test]
    fn exact_in_partial_step_within_range() {
        // single in-range step, 0.1% fee: 20 units of fee on a 20_000 input
        let step = compute_swap_step(
            1u128 << 64,
            tick_math::get_sqrt_price_at_tick(-10).unwrap(),
            1_000_000_000_000,
            20_000,
            1000,
            true,
        )
        .unwrap();
        assert_eq!(step.amount_in, 19_980);
        assert_eq!(step.fee_amount, 20);
        assert_eq!(step.amount_out, 19_979);
        assert_eq!(step.sqrt_price_next_x64, 18446743705143612388);
        assert!(step.sqrt_price_next_x64 < 1u128 << 64);
    }

    #[test]
    fn exact_in_step_reaching_target() {
        let target = tick_math::get_sqrt_price_at_tick(10).unwrap();
        let step =
            compute_swap_step(1u128 << 64, target, 1_000_000_000, 10_000_000, 1000, true).unwrap();
        assert_eq!(step.sqrt_price_next_x64, target);
        assert_eq!(step.amount_in, 500_101);
        assert_eq!(step.fee_amount, 501);
        assert_eq!(step.amount_out, 499_850);
    }

    #[test]
    fn exact_out_step_is_capped_by_remainder() {
        let target = tick_math::get_sqrt_price_at_tick(-10).unwrap();
        let step =
            compute_swap_step(1u128 << 64, target, 1_000_000_000_000, 10_000, 1000, false).unwrap();
        assert_eq!(step.amount_out, 10_000);
        assert!(step.sqrt_price_next_x64 > target);
        assert!(step.amount_in >= step.amount_out);
        // fee is charged on top of the input
        assert_eq!(
            step.fee_amount,
            step.amount_in.mul_div_ceil(1000, 999_000).unwrap()
        );
    }

    #[test]
    fn zero_liquidity_step_is_empty() {
        let target = tick_math::get_sqrt_price_at_tick(-100).unwrap();
        let step = compute_swap_step(1u128 << 64, target, 0, 55_555, 3000, true).unwrap();
        assert_eq!(
            step,
            SwapStep {
                sqrt_price_next_x64: target,
                amount_in: 0,
                amount_out: 0,
                fee_amount: 0,
            }
        );
    }

    #[test]
    fn dust_input_is_swallowed_by_fee() {
        // 1 unit of input rounds to zero net amount, the whole remainder
        // becomes fee and the price does not move
        let step = compute_swap_step(
            1u128 << 64,
            tick_math::get_sqrt_price_at_tick(-10).unwrap(),
            1_000_000_000_000,
            1,
            1000,
            true,
        )
        .unwrap();
        assert_eq!(step.amount_in, 0);
        assert_eq!(step.fee_amount, 1);
        assert_eq!(step.sqrt_price_next_x64, 1u128 << 64);
    }
}
