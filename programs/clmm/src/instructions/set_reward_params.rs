use crate::error::ErrorCode;
use crate::instructions::check_not_paused;
use crate::libraries::big_num::U256;
use crate::states::events::{Event, EventSink};
use crate::states::pool::{PoolState, UpdateEmissionEvent, DAY_SECONDS, REWARD_NUM};
use crate::util::access_control::AccessControl;
use crate::util::system::Clock;
use crate::util::token::Principal;

/// Sets the emission rate of a rewarder slot. Only the slot authority may
/// change it, and the slot vault must hold at least one day of emissions at
/// the new rate so raising the rate cannot promise tokens the pool lacks.
#[allow(clippy::too_many_arguments)]
pub fn set_reward_emission(
    pool: &mut PoolState,
    access_control: &dyn AccessControl,
    clock: &dyn Clock,
    events: &mut dyn EventSink,
    caller: Principal,
    rewarder_index: usize,
    emissions_per_second_x64: u128,
) -> Result<(), ErrorCode> {
    check_not_paused(pool, access_control)?;
    if rewarder_index >= REWARD_NUM || !pool.reward_infos[rewarder_index].initialized() {
        return Err(ErrorCode::InvalidRewardIndex);
    }
    if pool.reward_infos[rewarder_index].authority != caller {
        return Err(ErrorCode::RewardAuthError);
    }

    // settle growth at the old rate before the new one takes effect
    pool.update_reward_infos(clock.now_seconds())?;

    let slot = &pool.reward_infos[rewarder_index];
    let day_emission = (U256::from(emissions_per_second_x64) * U256::from(DAY_SECONDS)) >> 64;
    if day_emission > U256::from(slot.vault) {
        return Err(ErrorCode::RewardAmountInsufficient);
    }

    let slot = &mut pool.reward_infos[rewarder_index];
    slot.emissions_per_second_x64 = emissions_per_second_x64;

    events.emit(Event::UpdateEmission(UpdateEmissionEvent {
        pool: pool.index,
        rewarder_index,
        token: pool.reward_infos[rewarder_index].token,
        emissions_per_second_x64,
    }));
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::util::testing::*;
    use crate::util::token::TokenId;

    #[test]
    fn emission_needs_a_day_of_balance() {
        let mut env = TestEnv::new();
        let mut pool = env.new_pool(1, 1u128 << 64);
        let token = TokenId::new([5; 32]);
        env.init_reward(&mut pool, token, 0, 0);
        // one token per second needs 86_400 in the vault
        assert_eq!(
            set_reward_emission(
                &mut pool,
                &env.access_control,
                &env.clock,
                &mut env.events,
                env.admin,
                0,
                1u128 << 64,
            )
            .unwrap_err(),
            ErrorCode::RewardAmountInsufficient
        );

        env.fund_reward(&mut pool, token, 86_400);
        set_reward_emission(
            &mut pool,
            &env.access_control,
            &env.clock,
            &mut env.events,
            env.admin,
            0,
            1u128 << 64,
        )
        .unwrap();
        assert_eq!(pool.reward_infos[0].emissions_per_second_x64, 1u128 << 64);
        assert!(matches!(
            env.events.last().unwrap(),
            Event::UpdateEmission(e) if e.rewarder_index == 0
        ));
    }

    #[test]
    fn only_the_slot_authority_may_set_emission() {
        let mut env = TestEnv::new();
        let mut pool = env.new_pool(1, 1u128 << 64);
        env.init_reward(&mut pool, TokenId::new([5; 32]), 0, 1_000_000);
        assert_eq!(
            set_reward_emission(
                &mut pool,
                &env.access_control,
                &env.clock,
                &mut env.events,
                env.user,
                0,
                1,
            )
            .unwrap_err(),
            ErrorCode::RewardAuthError
        );
    }

    #[test]
    fn emission_change_settles_the_old_rate_first() {
        let mut env = TestEnv::new();
        let mut pool = env.new_pool(1, 1u128 << 64);
        let position_index = env.open_position(&mut pool, -10, 10).unwrap();
        env.add_liquidity(&mut pool, position_index, 1_000).unwrap();
        let token = TokenId::new([5; 32]);
        env.init_reward(&mut pool, token, 10u128 << 64, 10_000_000);

        env.clock.advance(5);
        set_reward_emission(
            &mut pool,
            &env.access_control,
            &env.clock,
            &mut env.events,
            env.admin,
            0,
            0,
        )
        .unwrap();
        // five seconds at ten per second over 1_000 liquidity
        assert_eq!(
            pool.reward_infos[0].growth_global_x64,
            (5 * 10u128 << 64) / 1_000
        );
    }
}
