use crate::error::ErrorCode;
use crate::instructions::check_not_paused;
use crate::states::pool::PoolState;
use crate::util::access_control::AccessControl;
use crate::util::system::Clock;
use crate::util::token::{Principal, TokenId};

/// Claims the next free rewarder slot for `token` and hands emission control
/// to `authority`. Slots are permanent once claimed; emissions start at zero
/// and are raised through `set_reward_emission`.
pub fn initialize_reward(
    pool: &mut PoolState,
    access_control: &dyn AccessControl,
    clock: &dyn Clock,
    caller: Principal,
    token: TokenId,
    authority: Principal,
) -> Result<usize, ErrorCode> {
    check_not_paused(pool, access_control)?;
    if !access_control.is_protocol_authority(&caller) {
        return Err(ErrorCode::NoPrivilege);
    }
    if token == TokenId::ZERO {
        return Err(ErrorCode::InvalidRewardIndex);
    }
    if pool.reward_infos.iter().any(|slot| slot.token == token) {
        return Err(ErrorCode::InvalidRewardIndex);
    }

    pool.update_reward_infos(clock.now_seconds())?;

    let rewarder_index = pool
        .reward_infos
        .iter()
        .position(|slot| !slot.initialized())
        .ok_or(ErrorCode::InvalidRewardIndex)?;
    let slot = &mut pool.reward_infos[rewarder_index];
    slot.token = token;
    slot.authority = authority;
    #[cfg(feature = "enable-log")]
    log::debug!("initialized rewarder {} with token {:?}", rewarder_index, token);
    Ok(rewarder_index)
}

/// Funds the rewarder slot holding `asset`'s token. Anyone may deposit;
/// emission-rate changes are bounded by the funded balance.
pub fn deposit_reward(pool: &mut PoolState, asset: crate::util::token::Asset) -> Result<usize, ErrorCode> {
    let rewarder_index = pool
        .reward_infos
        .iter()
        .position(|slot| slot.initialized() && slot.token == asset.token())
        .ok_or(ErrorCode::InvalidRewardIndex)?;
    let slot = &mut pool.reward_infos[rewarder_index];
    slot.vault = slot
        .vault
        .checked_add(asset.amount())
        .ok_or(ErrorCode::MultiplicationOverflow)?;
    Ok(rewarder_index)
}
