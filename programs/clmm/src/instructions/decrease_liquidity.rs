use crate::error::ErrorCode;
use crate::instructions::{check_not_paused, check_position_holder};
use crate::libraries::{liquidity_amounts, liquidity_math};
use crate::states::events::{Event, EventSink};
use crate::states::pool::PoolState;
use crate::states::position::RemoveLiquidityEvent;
use crate::util::access_control::{AccessControl, PositionNft};
use crate::util::system::Clock;
use crate::util::token::{Asset, Principal};

/// Withdraws `delta_liquidity` from a position, returning the freed token
/// amounts. Tick records are dropped (and their directory bits cleared) when
/// their last endpoint goes away. Accrued fees stay on the position until
/// collected.
#[allow(clippy::too_many_arguments)]
pub fn remove_liquidity(
    pool: &mut PoolState,
    access_control: &dyn AccessControl,
    nft: &dyn PositionNft,
    clock: &dyn Clock,
    events: &mut dyn EventSink,
    user: Principal,
    position_index: u64,
    delta_liquidity: u128,
) -> Result<(Asset, Asset), ErrorCode> {
    check_not_paused(pool, access_control)?;
    check_position_holder(nft, pool, position_index, &user)?;
    if delta_liquidity == 0 {
        return Err(ErrorCode::InvalidDeltaLiquidity);
    }
    if delta_liquidity > i128::MAX as u128 {
        return Err(ErrorCode::LiquidityUnderflow);
    }

    pool.update_reward_infos(clock.now_seconds())?;
    pool.refresh_position(position_index)?;

    let position = pool.position(position_index)?;
    let (tick_lower_index, tick_upper_index) =
        (position.tick_lower_index, position.tick_upper_index);
    if position.liquidity < delta_liquidity {
        return Err(ErrorCode::LiquidityUnderflow);
    }

    let (amount_a, amount_b) = liquidity_amounts::get_delta_amounts(
        pool.tick_current,
        pool.sqrt_price_x64,
        tick_lower_index,
        tick_upper_index,
        delta_liquidity,
        false,
    )?;

    let position = pool.position_mut(position_index)?;
    position.liquidity -= delta_liquidity;

    let reward_growths = pool.reward_growths();
    pool.tick_table.modify(
        tick_lower_index,
        tick_upper_index,
        -(delta_liquidity as i128),
        pool.tick_current,
        pool.fee_growth_global_a_x64,
        pool.fee_growth_global_b_x64,
        reward_growths,
    )?;

    if tick_lower_index <= pool.tick_current && pool.tick_current < tick_upper_index {
        pool.liquidity = liquidity_math::add_delta(pool.liquidity, -(delta_liquidity as i128))?;
    }

    let asset_a = pool.withdraw_a(amount_a)?;
    let asset_b = pool.withdraw_b(amount_b)?;

    events.emit(Event::RemoveLiquidity(RemoveLiquidityEvent {
        pool: pool.index,
        tick_lower: tick_lower_index,
        tick_upper: tick_upper_index,
        liquidity: delta_liquidity,
        amount_a,
        amount_b,
        index: position_index,
    }));

    Ok((asset_a, asset_b))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::util::testing::*;

    #[test]
    fn add_then_remove_round_trips_amounts() {
        let mut env = TestEnv::new();
        let mut pool = env.new_pool(1, 1u128 << 64);
        let position_index = env.open_position(&mut pool, -10, 10).unwrap();
        let (in_a, in_b) = env
            .add_liquidity(&mut pool, position_index, 1_000_000_000_000)
            .unwrap();

        let (out_a, out_b) = env
            .remove_liquidity(&mut pool, position_index, 1_000_000_000_000)
            .unwrap();
        // removal rounds down: at most one unit less per side
        assert!(in_a - out_a <= 1);
        assert!(in_b - out_b <= 1);
        assert_eq!(pool.position(position_index).unwrap().liquidity, 0);
        assert_eq!(pool.liquidity, 0);
        assert!(pool.tick_table.is_empty());
    }

    #[test]
    fn partial_removal_keeps_tick_records() {
        let mut env = TestEnv::new();
        let mut pool = env.new_pool(1, 1u128 << 64);
        let position_index = env.open_position(&mut pool, -10, 10).unwrap();
        env.add_liquidity(&mut pool, position_index, 1_000_000).unwrap();
        env.remove_liquidity(&mut pool, position_index, 400_000).unwrap();
        assert_eq!(pool.position(position_index).unwrap().liquidity, 600_000);
        assert_eq!(pool.liquidity, 600_000);
        assert_eq!(pool.tick_table.get(-10).unwrap().liquidity_gross, 600_000);
    }

    #[test]
    fn shared_ticks_survive_until_the_last_position() {
        let mut env = TestEnv::new();
        let mut pool = env.new_pool(1, 1u128 << 64);
        let first = env.open_position(&mut pool, -10, 10).unwrap();
        let second = env.open_position(&mut pool, 10, 20).unwrap();
        env.add_liquidity(&mut pool, first, 1_000).unwrap();
        env.add_liquidity(&mut pool, second, 2_000).unwrap();

        // tick 10 is the upper endpoint of one position and the lower of another
        assert_eq!(pool.tick_table.get(10).unwrap().liquidity_gross, 3_000);
        assert_eq!(pool.tick_table.get(10).unwrap().liquidity_net, 1_000);

        env.remove_all_liquidity(&mut pool, first).unwrap();
        assert_eq!(pool.tick_table.get(10).unwrap().liquidity_gross, 2_000);
        assert_eq!(pool.tick_table.get(10).unwrap().liquidity_net, 2_000);

        env.remove_all_liquidity(&mut pool, second).unwrap();
        assert!(pool.tick_table.get(10).is_none());
    }

    #[test]
    fn removing_more_than_held_is_rejected() {
        let mut env = TestEnv::new();
        let mut pool = env.new_pool(1, 1u128 << 64);
        let position_index = env.open_position(&mut pool, -10, 10).unwrap();
        env.add_liquidity(&mut pool, position_index, 1_000).unwrap();
        assert_eq!(
            env.remove_liquidity(&mut pool, position_index, 1_001)
                .unwrap_err(),
            ErrorCode::LiquidityUnderflow
        );
    }
}
