//! The swap state machine: multi-step traversal across initialized ticks
//! with amount and price limits, partner/protocol fee split, and two-phase
//! flash settlement.
//!
//! The traversal itself is pure: it reads the pool, accumulates every
//! mutation in a [`SwapPlan`] and commits only when the whole swap fits.
//! That keeps failed swaps all-or-nothing and lets the read-only simulation
//! share the exact production path.
use crate::error::ErrorCode;
use crate::instructions::check_not_paused;
use crate::libraries::full_math::MulDiv;
use crate::libraries::{liquidity_math, swap_math, tick_math};
use crate::states::config::{PARTNER_FEE_RATE_DENOMINATOR, PROTOCOL_FEE_RATE_DENOMINATOR};
use crate::states::events::{Event, EventSink};
use crate::states::pool::{PoolState, RewardInfo, SwapEvent, REWARD_NUM};
use crate::util::access_control::{AccessControl, FeeRegistry, PartnerRegistry};
use crate::util::system::Clock;
use crate::util::token::{Asset, Principal};

/// Debt created by a flash swap: the output assets leave the vault before the
/// input is paid, and only `repay_flash_swap` can settle the difference.
#[must_use = "the receipt must be settled with repay_flash_swap"]
#[derive(Debug)]
pub struct FlashSwapReceipt {
    pool_index: u64,
    a_to_b: bool,
    partner: String,
    pay_amount: u64,
    ref_fee_amount: u64,
    settled: bool,
}

impl FlashSwapReceipt {
    pub fn pool_index(&self) -> u64 {
        self.pool_index
    }

    pub fn a_to_b(&self) -> bool {
        self.a_to_b
    }

    /// Input-side amount owed to the pool, fees included.
    pub fn pay_amount(&self) -> u64 {
        self.pay_amount
    }

    /// Share of the protocol fee owed to the routing partner.
    pub fn ref_fee_amount(&self) -> u64 {
        self.ref_fee_amount
    }
}

impl Drop for FlashSwapReceipt {
    fn drop(&mut self) {
        debug_assert!(
            self.settled,
            "FlashSwapReceipt dropped without repay_flash_swap"
        );
    }
}

/// One segment of a swap traversal, for inspection and simulation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SwapStepResult {
    pub current_sqrt_price: u128,
    pub target_sqrt_price: u128,
    pub current_liquidity: u128,
    pub amount_in: u64,
    pub amount_out: u64,
    pub fee_amount: u64,
    pub remainder_amount: u64,
}

/// Outcome of a swap traversal.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SwapCalcResult {
    /// Input amount excluding fees
    pub amount_in: u64,
    /// Output amount
    pub amount_out: u64,
    /// Total fee charged on the input side
    pub fee_amount: u64,
    /// Protocol share kept by the pool (after the partner cut)
    pub protocol_fee: u64,
    /// Partner share carved out of the protocol fee
    pub ref_fee: u64,
    pub after_sqrt_price: u128,
    /// True when the traversal ran out of initialized ticks before
    /// exhausting the requested amount
    pub is_exceed: bool,
    pub steps: Vec<SwapStepResult>,
}

// Deferred mutation of a crossed tick.
struct TickCross {
    tick: i32,
    fee_growth_outside_a_x64: u128,
    fee_growth_outside_b_x64: u128,
    reward_growths_outside_x64: [u128; REWARD_NUM],
}

// Everything a successful traversal writes back to the pool.
struct SwapPlan {
    result: SwapCalcResult,
    a_to_b: bool,
    sqrt_price_x64: u128,
    tick: i32,
    liquidity: u128,
    fee_growth_global_x64: u128,
    crossings: Vec<TickCross>,
    reward_infos: [RewardInfo; REWARD_NUM],
    now: u64,
}

/// Swaps against the pool, releasing the output immediately and returning a
/// receipt for the input debt. The output asset, the (empty) input-side
/// asset and the receipt must all be settled by `repay_flash_swap` within
/// the same atomic operation.
#[allow(clippy::too_many_arguments)]
pub fn flash_swap(
    pool: &mut PoolState,
    access_control: &dyn AccessControl,
    fee_registry: &dyn FeeRegistry,
    partners: &dyn PartnerRegistry,
    clock: &dyn Clock,
    events: &mut dyn EventSink,
    swap_from: Principal,
    partner: &str,
    a_to_b: bool,
    by_amount_in: bool,
    amount: u64,
    sqrt_price_limit_x64: u128,
) -> Result<(Asset, Asset, FlashSwapReceipt), ErrorCode> {
    check_not_paused(pool, access_control)?;

    let ref_fee_rate = partners.partner_ref_fee_rate(partner);
    if ref_fee_rate > PARTNER_FEE_RATE_DENOMINATOR {
        return Err(ErrorCode::InvalidFeeRate);
    }
    let protocol_fee_rate = fee_registry.protocol_fee_rate();
    if protocol_fee_rate > PROTOCOL_FEE_RATE_DENOMINATOR {
        return Err(ErrorCode::InvalidFeeRate);
    }

    let plan = compute_swap(
        pool,
        a_to_b,
        by_amount_in,
        amount,
        sqrt_price_limit_x64,
        protocol_fee_rate,
        ref_fee_rate,
        clock.now_seconds(),
    )?;
    if plan.result.is_exceed {
        return Err(ErrorCode::NotEnoughLiquidity);
    }

    let pay_amount = plan
        .result
        .amount_in
        .checked_add(plan.result.fee_amount)
        .ok_or(ErrorCode::MultiplicationOverflow)?;
    let ref_fee_amount = plan.result.ref_fee;
    let amount_out = plan.result.amount_out;
    let total_fee = plan.result.fee_amount;

    commit_swap(pool, plan)?;

    let (asset_a, asset_b) = if a_to_b {
        (Asset::zero(pool.token_a), pool.withdraw_b(amount_out)?)
    } else {
        (pool.withdraw_a(amount_out)?, Asset::zero(pool.token_b))
    };

    events.emit(Event::Swap(SwapEvent {
        a_to_b,
        pool: pool.index,
        swap_from,
        partner: partner.to_string(),
        amount_in: pay_amount,
        amount_out,
        ref_amount: ref_fee_amount,
        fee_amount: total_fee,
        vault_a_amount: pool.vault_a,
        vault_b_amount: pool.vault_b,
    }));

    Ok((
        asset_a,
        asset_b,
        FlashSwapReceipt {
            pool_index: pool.index,
            a_to_b,
            partner: partner.to_string(),
            pay_amount,
            ref_fee_amount,
            settled: false,
        },
    ))
}

/// Settles a flash swap: the input-side asset must match the receipt's pay
/// amount exactly; the partner's ref fee is carved off the top and the rest
/// lands in the pool vault. The output-side asset must be empty.
pub fn repay_flash_swap(
    pool: &mut PoolState,
    partners: &mut dyn PartnerRegistry,
    asset_a: Asset,
    asset_b: Asset,
    mut receipt: FlashSwapReceipt,
) -> Result<(), ErrorCode> {
    // a failed settlement aborts the whole host operation, so the receipt is
    // defused up front; the drop guard is for receipts nobody tried to repay
    receipt.settled = true;
    if receipt.pool_index != pool.index {
        return Err(ErrorCode::InvariantViolated);
    }
    let (mut asset_in, asset_out) = if receipt.a_to_b {
        (asset_a, asset_b)
    } else {
        (asset_b, asset_a)
    };
    if asset_in.amount() != receipt.pay_amount {
        return Err(ErrorCode::AmountIncorrect);
    }
    asset_out.destroy_zero()?;

    let ref_fee = asset_in.extract(receipt.ref_fee_amount)?;
    if ref_fee.amount() > 0 {
        partners.receive_ref_fee(&receipt.partner, ref_fee);
    } else {
        ref_fee.destroy_zero()?;
    }
    if receipt.a_to_b {
        pool.deposit_a(asset_in)?;
    } else {
        pool.deposit_b(asset_in)?;
    }
    Ok(())
}

/// Read-only swap simulation: runs the production traversal against the
/// current pool state without committing anything. Instead of aborting when
/// the tick range is exhausted it reports `is_exceed`.
pub fn calculate_swap_result(
    pool: &PoolState,
    fee_registry: &dyn FeeRegistry,
    a_to_b: bool,
    by_amount_in: bool,
    amount: u64,
) -> Result<SwapCalcResult, ErrorCode> {
    let sqrt_price_limit_x64 = if a_to_b {
        tick_math::MIN_SQRT_PRICE_X64
    } else {
        tick_math::MAX_SQRT_PRICE_X64
    };
    let plan = compute_swap(
        pool,
        a_to_b,
        by_amount_in,
        amount,
        sqrt_price_limit_x64,
        fee_registry.protocol_fee_rate(),
        0,
        pool.reward_last_updated_at,
    )?;
    Ok(plan.result)
}

// Traversal preview with explicit rates, for the test fixtures: identical to
// what an immediately following flash_swap will commit.
#[cfg(test)]
#[allow(clippy::too_many_arguments)]
pub(crate) fn preview_swap(
    pool: &PoolState,
    a_to_b: bool,
    by_amount_in: bool,
    amount: u64,
    sqrt_price_limit_x64: u128,
    protocol_fee_rate: u64,
    ref_fee_rate: u64,
    now: u64,
) -> Result<SwapCalcResult, ErrorCode> {
    compute_swap(
        pool,
        a_to_b,
        by_amount_in,
        amount,
        sqrt_price_limit_x64,
        protocol_fee_rate,
        ref_fee_rate,
        now,
    )
    .map(|plan| plan.result)
}

#[allow(clippy::too_many_arguments)]
fn compute_swap(
    pool: &PoolState,
    a_to_b: bool,
    by_amount_in: bool,
    amount: u64,
    sqrt_price_limit_x64: u128,
    protocol_fee_rate: u64,
    ref_fee_rate: u64,
    now: u64,
) -> Result<SwapPlan, ErrorCode> {
    if amount == 0 {
        return Err(ErrorCode::AmountIncorrect);
    }
    if a_to_b {
        if sqrt_price_limit_x64 >= pool.sqrt_price_x64
            || sqrt_price_limit_x64 < tick_math::MIN_SQRT_PRICE_X64
        {
            return Err(ErrorCode::WrongSqrtPriceLimit);
        }
    } else if sqrt_price_limit_x64 <= pool.sqrt_price_x64
        || sqrt_price_limit_x64 > tick_math::MAX_SQRT_PRICE_X64
    {
        return Err(ErrorCode::WrongSqrtPriceLimit);
    }

    // emissions settle before any liquidity can change hands
    let reward_infos = pool.updated_reward_infos(now)?;

    let mut result = SwapCalcResult::default();
    let mut amount_remaining = amount;
    let mut sqrt_price_x64 = pool.sqrt_price_x64;
    let mut tick = pool.tick_current;
    let mut liquidity = pool.liquidity;
    let mut fee_growth_global_x64 = if a_to_b {
        pool.fee_growth_global_a_x64
    } else {
        pool.fee_growth_global_b_x64
    };
    let mut protocol_fee_total: u64 = 0;
    let mut crossings: Vec<TickCross> = Vec::new();

    while amount_remaining > 0 && sqrt_price_x64 != sqrt_price_limit_x64 {
        #[cfg(feature = "enable-log")]
        log::debug!(
            "step begin, remaining: {}, sqrt_price: {}, tick: {}, liquidity: {}",
            amount_remaining,
            sqrt_price_x64,
            tick,
            liquidity
        );

        let next_tick = match pool.tick_table.next_initialized_tick(tick, a_to_b) {
            Some(state) => state,
            None => {
                result.is_exceed = true;
                break;
            }
        };
        let (next_tick_index, sqrt_price_next_tick_x64) = (next_tick.tick, next_tick.sqrt_price_x64);

        let target_sqrt_price_x64 = if a_to_b {
            sqrt_price_limit_x64.max(sqrt_price_next_tick_x64)
        } else {
            sqrt_price_limit_x64.min(sqrt_price_next_tick_x64)
        };

        let step = swap_math::compute_swap_step(
            sqrt_price_x64,
            target_sqrt_price_x64,
            liquidity,
            amount_remaining,
            pool.fee_rate,
            by_amount_in,
        )?;

        let consumed = if by_amount_in {
            step.amount_in
                .checked_add(step.fee_amount)
                .ok_or(ErrorCode::MultiplicationOverflow)?
        } else {
            step.amount_out
        };
        amount_remaining = amount_remaining
            .checked_sub(consumed)
            .ok_or(ErrorCode::RemainderUnderflow)?;
        result.amount_in = result
            .amount_in
            .checked_add(step.amount_in)
            .ok_or(ErrorCode::MultiplicationOverflow)?;
        result.amount_out = result
            .amount_out
            .checked_add(step.amount_out)
            .ok_or(ErrorCode::MultiplicationOverflow)?;
        result.fee_amount = result
            .fee_amount
            .checked_add(step.fee_amount)
            .ok_or(ErrorCode::MultiplicationOverflow)?;

        // fee split: protocol rounds up, the partner cut comes out of the
        // protocol share, LPs get the rest
        let mut protocol_fee = step
            .fee_amount
            .mul_div_ceil(protocol_fee_rate, PROTOCOL_FEE_RATE_DENOMINATOR)
            .ok_or(ErrorCode::MultiplicationOverflow)?;
        let liquidity_fee = step.fee_amount - protocol_fee;
        let ref_fee = protocol_fee
            .mul_div_floor(ref_fee_rate, PARTNER_FEE_RATE_DENOMINATOR)
            .ok_or(ErrorCode::MultiplicationOverflow)?;
        protocol_fee -= ref_fee;
        protocol_fee_total = protocol_fee_total.wrapping_add(protocol_fee);
        result.ref_fee = result
            .ref_fee
            .checked_add(ref_fee)
            .ok_or(ErrorCode::MultiplicationOverflow)?;
        if liquidity_fee > 0 && liquidity > 0 {
            fee_growth_global_x64 =
                fee_growth_global_x64.wrapping_add(((liquidity_fee as u128) << 64) / liquidity);
        }

        result.steps.push(SwapStepResult {
            current_sqrt_price: sqrt_price_x64,
            target_sqrt_price: target_sqrt_price_x64,
            current_liquidity: liquidity,
            amount_in: step.amount_in,
            amount_out: step.amount_out,
            fee_amount: step.fee_amount,
            remainder_amount: amount_remaining,
        });

        let sqrt_price_start_x64 = sqrt_price_x64;
        sqrt_price_x64 = step.sqrt_price_next_x64;

        if sqrt_price_x64 == sqrt_price_next_tick_x64 {
            // crossing: flip the outside accumulators against the running
            // globals (wrapping) and shift the active liquidity
            let fee_growth_global_a_x64 = if a_to_b {
                fee_growth_global_x64
            } else {
                pool.fee_growth_global_a_x64
            };
            let fee_growth_global_b_x64 = if a_to_b {
                pool.fee_growth_global_b_x64
            } else {
                fee_growth_global_x64
            };
            let mut reward_growths_outside_x64 = next_tick.reward_growths_outside_x64;
            for i in 0..REWARD_NUM {
                if reward_infos[i].initialized() {
                    reward_growths_outside_x64[i] = reward_infos[i]
                        .growth_global_x64
                        .wrapping_sub(reward_growths_outside_x64[i]);
                }
            }
            crossings.push(TickCross {
                tick: next_tick_index,
                fee_growth_outside_a_x64: fee_growth_global_a_x64
                    .wrapping_sub(next_tick.fee_growth_outside_a_x64),
                fee_growth_outside_b_x64: fee_growth_global_b_x64
                    .wrapping_sub(next_tick.fee_growth_outside_b_x64),
                reward_growths_outside_x64,
            });

            let mut liquidity_net = next_tick.liquidity_net;
            if a_to_b {
                liquidity_net = liquidity_net
                    .checked_neg()
                    .ok_or(ErrorCode::InvariantViolated)?;
            }
            liquidity = liquidity_math::add_delta(liquidity, liquidity_net)?;

            tick = if a_to_b {
                next_tick_index - 1
            } else {
                next_tick_index
            };
        } else if sqrt_price_x64 != sqrt_price_start_x64 {
            // recompute only when the price moved; a fee-swallowed step must
            // not pull the tick back onto a boundary it already crossed
            tick = tick_math::get_tick_at_sqrt_price(sqrt_price_x64)?;
        }

        #[cfg(feature = "enable-log")]
        log::debug!(
            "step end, amount_in: {}, amount_out: {}, fee: {}, sqrt_price: {}, tick: {}",
            step.amount_in,
            step.amount_out,
            step.fee_amount,
            sqrt_price_x64,
            tick
        );
    }

    result.protocol_fee = protocol_fee_total;
    result.after_sqrt_price = sqrt_price_x64;

    Ok(SwapPlan {
        result,
        a_to_b,
        sqrt_price_x64,
        tick,
        liquidity,
        fee_growth_global_x64,
        crossings,
        reward_infos,
        now,
    })
}

fn commit_swap(pool: &mut PoolState, plan: SwapPlan) -> Result<(), ErrorCode> {
    for crossing in &plan.crossings {
        let tick = pool
            .tick_table
            .get_mut(crossing.tick)
            .ok_or(ErrorCode::InvariantViolated)?;
        tick.fee_growth_outside_a_x64 = crossing.fee_growth_outside_a_x64;
        tick.fee_growth_outside_b_x64 = crossing.fee_growth_outside_b_x64;
        tick.reward_growths_outside_x64 = crossing.reward_growths_outside_x64;
    }
    pool.sqrt_price_x64 = plan.sqrt_price_x64;
    pool.tick_current = plan.tick;
    pool.liquidity = plan.liquidity;
    if plan.a_to_b {
        pool.fee_growth_global_a_x64 = plan.fee_growth_global_x64;
        pool.protocol_fees_token_a = pool
            .protocol_fees_token_a
            .wrapping_add(plan.result.protocol_fee);
    } else {
        pool.fee_growth_global_b_x64 = plan.fee_growth_global_x64;
        pool.protocol_fees_token_b = pool
            .protocol_fees_token_b
            .wrapping_add(plan.result.protocol_fee);
    }
    pool.commit_reward_infos(plan.reward_infos, plan.now);
    Ok(())
}


#[cfg(test)]
mod fuzz_tests {
    use super::*;
    use crate::libraries::tick_math;
    use crate::util::testing::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn in_range_swaps_conserve_amounts_and_price_bounds(
            amount in 1u64..5_000_000,
            a_to_b in proptest::bool::ANY,
        ) {
            let mut env = TestEnv::new();
            env.fee_registry.protocol_fee_rate = 2_000;
            env.partners.set_rate("", 2_500);
            let mut pool = env.new_pool(1, 1u128 << 64);
            let position_index = env.open_position(&mut pool, -1000, 1000).unwrap();
            env.add_liquidity(&mut pool, position_index, 1_000_000_000_000).unwrap();

            let limit = if a_to_b {
                tick_math::MIN_SQRT_PRICE_X64
            } else {
                tick_math::MAX_SQRT_PRICE_X64
            };
            let result = env.flash_swap(&mut pool, a_to_b, true, amount, limit).unwrap();

            // an exact-input swap that never saturates consumes everything
            prop_assert_eq!(result.amount_in + result.fee_amount, amount);
            prop_assert!(result.protocol_fee + result.ref_fee <= result.fee_amount);
            prop_assert!(!result.is_exceed);

            // the tick stays consistent with the price, boundary inclusive
            // right after a downward cross
            prop_assert!(pool.sqrt_price_x64 >= tick_math::MIN_SQRT_PRICE_X64);
            prop_assert!(pool.sqrt_price_x64 <= tick_math::MAX_SQRT_PRICE_X64);
            let floor = tick_math::get_sqrt_price_at_tick(pool.tick_current).unwrap();
            let ceiling = tick_math::get_sqrt_price_at_tick(pool.tick_current + 1).unwrap();
            prop_assert!(floor <= pool.sqrt_price_x64 && pool.sqrt_price_x64 <= ceiling);
        }

        #[test]
        fn exact_out_swaps_deliver_the_requested_amount(
            amount in 1u64..2_000_000,
            a_to_b in proptest::bool::ANY,
        ) {
            let mut env = TestEnv::new();
            let mut pool = env.new_pool(1, 1u128 << 64);
            let position_index = env.open_position(&mut pool, -500, 500).unwrap();
            env.add_liquidity(&mut pool, position_index, 500_000_000_000).unwrap();

            let limit = if a_to_b {
                tick_math::MIN_SQRT_PRICE_X64
            } else {
                tick_math::MAX_SQRT_PRICE_X64
            };
            let result = env.flash_swap(&mut pool, a_to_b, false, amount, limit).unwrap();
            prop_assert_eq!(result.amount_out, amount);
            // rounding always favours the pool: the input covers the output
            // at the realised price or better
            prop_assert!(result.amount_in + result.fee_amount > result.amount_out);
        }

        #[test]
        fn simulation_always_matches_execution(
            amount in 1u64..3_000_000,
            a_to_b in proptest::bool::ANY,
        ) {
            let mut env = TestEnv::new();
            let mut pool = env.new_pool(1, 1u128 << 64);
            let position_index = env.open_position(&mut pool, -800, 800).unwrap();
            env.add_liquidity(&mut pool, position_index, 800_000_000_000).unwrap();

            let simulated =
                calculate_swap_result(&pool, &env.fee_registry, a_to_b, true, amount).unwrap();
            let limit = if a_to_b {
                tick_math::MIN_SQRT_PRICE_X64
            } else {
                tick_math::MAX_SQRT_PRICE_X64
            };
            let executed = env.flash_swap(&mut pool, a_to_b, true, amount, limit).unwrap();
            prop_assert_eq!(simulated, executed);
        }
    }
}
