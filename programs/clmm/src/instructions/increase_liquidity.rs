use crate::error::ErrorCode;
use crate::instructions::{check_not_paused, check_position_holder};
use crate::libraries::{liquidity_amounts, liquidity_math, tick_math};
use crate::states::events::{Event, EventSink};
use crate::states::pool::PoolState;
use crate::states::position::AddLiquidityEvent;
use crate::util::access_control::{AccessControl, PositionNft};
use crate::util::system::Clock;
use crate::util::token::{Asset, Principal};

/// Debt created by an `add_liquidity` call. The only way to discharge it is
/// `repay_add_liquidity` within the same atomic operation; letting the value
/// drop trips a debug assertion.
#[must_use = "the receipt must be settled with repay_add_liquidity"]
#[derive(Debug)]
pub struct AddLiquidityReceipt {
    pool_index: u64,
    amount_a: u64,
    amount_b: u64,
    settled: bool,
}

impl AddLiquidityReceipt {
    pub fn pool_index(&self) -> u64 {
        self.pool_index
    }

    /// The token A and token B amounts the caller owes the pool.
    pub fn amounts(&self) -> (u64, u64) {
        (self.amount_a, self.amount_b)
    }
}

impl Drop for AddLiquidityReceipt {
    fn drop(&mut self) {
        debug_assert!(
            self.settled,
            "AddLiquidityReceipt dropped without repay_add_liquidity"
        );
    }
}

/// Commits `delta_liquidity` to a position and returns the receipt carrying
/// the token amounts owed to the pool.
pub fn add_liquidity(
    pool: &mut PoolState,
    access_control: &dyn AccessControl,
    nft: &dyn PositionNft,
    clock: &dyn Clock,
    events: &mut dyn EventSink,
    user: Principal,
    position_index: u64,
    delta_liquidity: u128,
) -> Result<AddLiquidityReceipt, ErrorCode> {
    check_not_paused(pool, access_control)?;
    check_position_holder(nft, pool, position_index, &user)?;
    if delta_liquidity == 0 {
        return Err(ErrorCode::InvalidDeltaLiquidity);
    }
    increase_liquidity(pool, clock, events, position_index, delta_liquidity)
}

/// Commits liquidity bought by a fixed amount of one token: the liquidity is
/// inverted from `amount`, the other side follows from it.
#[allow(clippy::too_many_arguments)]
pub fn add_liquidity_fix_token(
    pool: &mut PoolState,
    access_control: &dyn AccessControl,
    nft: &dyn PositionNft,
    clock: &dyn Clock,
    events: &mut dyn EventSink,
    user: Principal,
    position_index: u64,
    amount: u64,
    fix_amount_a: bool,
) -> Result<AddLiquidityReceipt, ErrorCode> {
    check_not_paused(pool, access_control)?;
    check_position_holder(nft, pool, position_index, &user)?;
    if amount == 0 {
        return Err(ErrorCode::InvalidDeltaLiquidity);
    }

    let position = pool.position(position_index)?;
    let delta_liquidity = liquidity_amounts::get_liquidity_from_single_amount(
        pool.sqrt_price_x64,
        tick_math::get_sqrt_price_at_tick(position.tick_lower_index)?,
        tick_math::get_sqrt_price_at_tick(position.tick_upper_index)?,
        amount,
        fix_amount_a,
    )?;
    if delta_liquidity == 0 {
        return Err(ErrorCode::LiquidityZero);
    }

    let mut receipt = increase_liquidity(pool, clock, events, position_index, delta_liquidity)?;
    // the fixed side pays exactly the requested amount; rounding dust on that
    // side stays with the pool
    if fix_amount_a {
        debug_assert!(receipt.amount_a <= amount);
        receipt.amount_a = amount;
    } else {
        debug_assert!(receipt.amount_b <= amount);
        receipt.amount_b = amount;
    }
    Ok(receipt)
}

/// Settles an add-liquidity receipt. Both assets must match the receipt
/// amounts exactly; they are deposited into the pool vaults.
pub fn repay_add_liquidity(
    pool: &mut PoolState,
    asset_a: Asset,
    asset_b: Asset,
    mut receipt: AddLiquidityReceipt,
) -> Result<(), ErrorCode> {
    // a failed settlement aborts the whole host operation, so the receipt is
    // defused up front; the drop guard is for receipts nobody tried to repay
    receipt.settled = true;
    if receipt.pool_index != pool.index {
        return Err(ErrorCode::InvariantViolated);
    }
    if asset_a.amount() != receipt.amount_a || asset_b.amount() != receipt.amount_b {
        return Err(ErrorCode::AmountIncorrect);
    }
    pool.deposit_a(asset_a)?;
    pool.deposit_b(asset_b)?;
    Ok(())
}

fn increase_liquidity(
    pool: &mut PoolState,
    clock: &dyn Clock,
    events: &mut dyn EventSink,
    position_index: u64,
    delta_liquidity: u128,
) -> Result<AddLiquidityReceipt, ErrorCode> {
    if delta_liquidity > i128::MAX as u128 {
        return Err(ErrorCode::LiquidityOverflow);
    }
    // settle emissions first so the new liquidity does not earn for the past
    pool.update_reward_infos(clock.now_seconds())?;
    // accruals are measured against the prior liquidity
    pool.refresh_position(position_index)?;

    let position = pool.position(position_index)?;
    let (tick_lower_index, tick_upper_index) =
        (position.tick_lower_index, position.tick_upper_index);

    let (amount_a, amount_b) = liquidity_amounts::get_delta_amounts(
        pool.tick_current,
        pool.sqrt_price_x64,
        tick_lower_index,
        tick_upper_index,
        delta_liquidity,
        true,
    )?;

    let position = pool.position_mut(position_index)?;
    position.liquidity = position
        .liquidity
        .checked_add(delta_liquidity)
        .ok_or(ErrorCode::LiquidityOverflow)?;

    let reward_growths = pool.reward_growths();
    pool.tick_table.modify(
        tick_lower_index,
        tick_upper_index,
        delta_liquidity as i128,
        pool.tick_current,
        pool.fee_growth_global_a_x64,
        pool.fee_growth_global_b_x64,
        reward_growths,
    )?;

    if tick_lower_index <= pool.tick_current && pool.tick_current < tick_upper_index {
        pool.liquidity = liquidity_math::add_delta(pool.liquidity, delta_liquidity as i128)?;
    }

    events.emit(Event::AddLiquidity(AddLiquidityEvent {
        pool: pool.index,
        tick_lower: tick_lower_index,
        tick_upper: tick_upper_index,
        liquidity: delta_liquidity,
        amount_a,
        amount_b,
        index: position_index,
    }));

    Ok(AddLiquidityReceipt {
        pool_index: pool.index,
        amount_a,
        amount_b,
        settled: false,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::util::testing::*;

    #[test]
    fn add_liquidity_in_range_charges_both_sides() {
        let mut env = TestEnv::new();
        let mut pool = env.new_pool(1, 1u128 << 64);
        let position_index = env.open_position(&mut pool, -10, 10).unwrap();

        let receipt = add_liquidity(
            &mut pool,
            &env.access_control,
            &env.nft,
            &env.clock,
            &mut env.events,
            env.user,
            position_index,
            1_000_000_000_000,
        )
        .unwrap();
        assert_eq!(receipt.amounts(), (499_850_035, 499_850_035));
        assert_eq!(pool.liquidity, 1_000_000_000_000);
        assert_eq!(pool.tick_table.get(-10).unwrap().liquidity_net, 1_000_000_000_000);

        let (amount_a, amount_b) = receipt.amounts();
        let (token_a, token_b) = (pool.token_a, pool.token_b);
        repay_add_liquidity(
            &mut pool,
            Asset::new(token_a, amount_a),
            Asset::new(token_b, amount_b),
            receipt,
        )
        .unwrap();
        assert_eq!(pool.vault_a, 499_850_035);
        assert_eq!(pool.vault_b, 499_850_035);
    }

    #[test]
    fn out_of_range_liquidity_does_not_activate() {
        let mut env = TestEnv::new();
        let mut pool = env.new_pool(1, 1u128 << 64);
        let position_index = env.open_position(&mut pool, 100, 200).unwrap();
        env.add_liquidity(&mut pool, position_index, 1_000_000).unwrap();
        assert_eq!(pool.liquidity, 0);
        // all committed above the current price, so the debt is token A only
        assert_eq!(pool.vault_b, 0);
        assert!(pool.vault_a > 0);
    }

    #[test]
    fn repay_must_match_exactly() {
        let mut env = TestEnv::new();
        let mut pool = env.new_pool(1, 1u128 << 64);
        let position_index = env.open_position(&mut pool, -10, 10).unwrap();
        let receipt = add_liquidity(
            &mut pool,
            &env.access_control,
            &env.nft,
            &env.clock,
            &mut env.events,
            env.user,
            position_index,
            1_000_000,
        )
        .unwrap();
        let (amount_a, amount_b) = receipt.amounts();
        let (token_a, token_b) = (pool.token_a, pool.token_b);
        assert_eq!(
            repay_add_liquidity(
                &mut pool,
                Asset::new(token_a, amount_a - 1),
                Asset::new(token_b, amount_b),
                receipt,
            )
            .unwrap_err(),
            ErrorCode::AmountIncorrect
        );
    }

    #[test]
    #[should_panic(expected = "dropped without repay_add_liquidity")]
    fn dropping_a_receipt_trips_the_guard() {
        let mut env = TestEnv::new();
        let mut pool = env.new_pool(1, 1u128 << 64);
        let position_index = env.open_position(&mut pool, -10, 10).unwrap();
        let receipt = add_liquidity(
            &mut pool,
            &env.access_control,
            &env.nft,
            &env.clock,
            &mut env.events,
            env.user,
            position_index,
            1_000_000,
        )
        .unwrap();
        drop(receipt);
    }

    #[test]
    fn fix_token_charges_the_fixed_side_exactly() {
        let mut env = TestEnv::new();
        let mut pool = env.new_pool(1, 1u128 << 64);
        let position_index = env.open_position(&mut pool, -10, 10).unwrap();
        let receipt = add_liquidity_fix_token(
            &mut pool,
            &env.access_control,
            &env.nft,
            &env.clock,
            &mut env.events,
            env.user,
            position_index,
            499_850_035,
            true,
        )
        .unwrap();
        let (amount_a, amount_b) = receipt.amounts();
        assert_eq!(amount_a, 499_850_035);
        assert!(amount_b <= 499_850_035);
        // the ceil-rounded deposit buys a hair more than the round liquidity
        let position_liquidity = pool.position(position_index).unwrap().liquidity;
        assert_eq!(position_liquidity, 1_000_000_000_014);
        let (token_a, token_b) = (pool.token_a, pool.token_b);
        repay_add_liquidity(
            &mut pool,
            Asset::new(token_a, amount_a),
            Asset::new(token_b, amount_b),
            receipt,
        )
        .unwrap();
    }

    #[test]
    fn zero_delta_is_rejected() {
        let mut env = TestEnv::new();
        let mut pool = env.new_pool(1, 1u128 << 64);
        let position_index = env.open_position(&mut pool, -10, 10).unwrap();
        assert_eq!(
            add_liquidity(
                &mut pool,
                &env.access_control,
                &env.nft,
                &env.clock,
                &mut env.events,
                env.user,
                position_index,
                0,
            )
            .unwrap_err(),
            ErrorCode::InvalidDeltaLiquidity
        );
    }
}
