use crate::error::ErrorCode;
use crate::libraries::tick_math;
use crate::states::pool::PoolState;
use crate::util::access_control::AccessControl;
use crate::util::token::Principal;

/// Re-initializes the pool price. Only possible while the pool is unused:
/// no positions, no initialized ticks and no active liquidity.
pub fn reset_sqrt_price(
    pool: &mut PoolState,
    access_control: &dyn AccessControl,
    caller: Principal,
    sqrt_price_x64: u128,
) -> Result<(), ErrorCode> {
    if !access_control.allow_reset_initial_price(&caller) {
        return Err(ErrorCode::NoPrivilege);
    }
    if !pool.positions.is_empty() || !pool.tick_table.is_empty() || pool.liquidity != 0 {
        return Err(ErrorCode::PoolLiquidityIsNotZero);
    }
    if sqrt_price_x64 < tick_math::MIN_SQRT_PRICE_X64
        || sqrt_price_x64 > tick_math::MAX_SQRT_PRICE_X64
    {
        return Err(ErrorCode::InvalidSqrtPrice);
    }
    pool.sqrt_price_x64 = sqrt_price_x64;
    pool.tick_current = tick_math::get_tick_at_sqrt_price(sqrt_price_x64)?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::util::testing::*;

    #[test]
    fn reset_only_while_unused() {
        let mut env = TestEnv::new();
        let mut pool = env.new_pool(1, 1u128 << 64);
        let target = tick_math::get_sqrt_price_at_tick(100).unwrap();
        reset_sqrt_price(&mut pool, &env.access_control, env.admin, target).unwrap();
        assert_eq!(pool.sqrt_price_x64, target);
        assert_eq!(pool.tick_current, 100);

        let position_index = env.open_position(&mut pool, -10, 10).unwrap();
        assert_eq!(
            reset_sqrt_price(&mut pool, &env.access_control, env.admin, 1u128 << 64).unwrap_err(),
            ErrorCode::PoolLiquidityIsNotZero
        );
        env.close_position(&mut pool, position_index).unwrap();
        reset_sqrt_price(&mut pool, &env.access_control, env.admin, 1u128 << 64).unwrap();
        assert_eq!(pool.tick_current, 0);
    }

    #[test]
    fn reset_requires_the_role() {
        let mut env = TestEnv::new();
        let mut pool = env.new_pool(1, 1u128 << 64);
        assert_eq!(
            reset_sqrt_price(&mut pool, &env.access_control, env.user, 1u128 << 64).unwrap_err(),
            ErrorCode::NoPrivilege
        );
    }
}
