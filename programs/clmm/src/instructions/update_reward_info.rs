use crate::error::ErrorCode;
use crate::states::pool::PoolState;
use crate::util::system::Clock;

/// Public poke that settles the reward growth accumulators up to now.
/// Callable by anyone; every state-mutating operation performs the same
/// settlement implicitly.
pub fn update_reward_info(pool: &mut PoolState, clock: &dyn Clock) -> Result<(), ErrorCode> {
    pool.update_reward_infos(clock.now_seconds())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::util::testing::*;
    use crate::util::token::TokenId;

    #[test]
    fn poke_settles_growth() {
        let mut env = TestEnv::new();
        let mut pool = env.new_pool(1, 1u128 << 64);
        let position_index = env.open_position(&mut pool, -10, 10).unwrap();
        env.add_liquidity(&mut pool, position_index, 100).unwrap();
        env.init_reward(&mut pool, TokenId::new([5; 32]), 1u128 << 64, 1_000_000);

        env.clock.advance(50);
        update_reward_info(&mut pool, &env.clock).unwrap();
        assert_eq!(pool.reward_infos[0].growth_global_x64, (50u128 << 64) / 100);

        // a second poke at the same timestamp is a no-op
        update_reward_info(&mut pool, &env.clock).unwrap();
        assert_eq!(pool.reward_infos[0].growth_global_x64, (50u128 << 64) / 100);
    }
}
