use crate::error::ErrorCode;
use crate::instructions::{check_not_paused, check_position_holder};
use crate::states::events::{Event, EventSink};
use crate::states::pool::{PoolState, REWARD_NUM};
use crate::states::position::CollectRewardEvent;
use crate::util::access_control::{AccessControl, PositionNft};
use crate::util::system::Clock;
use crate::util::token::{Asset, Principal};

/// Pays out the accrued rewards of one rewarder slot to the position holder.
#[allow(clippy::too_many_arguments)]
pub fn collect_reward(
    pool: &mut PoolState,
    access_control: &dyn AccessControl,
    nft: &dyn PositionNft,
    clock: &dyn Clock,
    events: &mut dyn EventSink,
    user: Principal,
    position_index: u64,
    rewarder_index: usize,
    recalculate: bool,
) -> Result<Asset, ErrorCode> {
    check_not_paused(pool, access_control)?;
    check_position_holder(nft, pool, position_index, &user)?;
    if rewarder_index >= REWARD_NUM || !pool.reward_infos[rewarder_index].initialized() {
        return Err(ErrorCode::InvalidRewardIndex);
    }

    if recalculate {
        pool.update_reward_infos(clock.now_seconds())?;
        pool.refresh_position(position_index)?;
    }

    let amount = pool.position(position_index)?.reward_infos[rewarder_index].amount_owed;
    // nothing is mutated until the payout is known to be covered
    let slot_vault = pool.reward_infos[rewarder_index].vault;
    let remaining = slot_vault
        .checked_sub(amount)
        .ok_or(ErrorCode::RewardAmountInsufficient)?;

    pool.position_mut(position_index)?.reward_infos[rewarder_index].amount_owed = 0;
    pool.reward_infos[rewarder_index].vault = remaining;
    let asset = Asset::new(pool.reward_infos[rewarder_index].token, amount);

    events.emit(Event::CollectReward(CollectRewardEvent {
        index: position_index,
        user,
        pool: pool.index,
        rewarder_index,
        amount,
    }));
    Ok(asset)
}
