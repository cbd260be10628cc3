use crate::error::ErrorCode;
use crate::states::events::{Event, EventSink};
use crate::states::pool::{AcceptRewardAuthEvent, PoolState, TransferRewardAuthEvent, REWARD_NUM};
use crate::util::token::Principal;

/// Starts a two-phase handover of a rewarder authority. The current
/// authority names a successor; nothing changes until the successor accepts.
pub fn transfer_reward_authority(
    pool: &mut PoolState,
    events: &mut dyn EventSink,
    caller: Principal,
    rewarder_index: usize,
    new_authority: Principal,
) -> Result<(), ErrorCode> {
    if rewarder_index >= REWARD_NUM || !pool.reward_infos[rewarder_index].initialized() {
        return Err(ErrorCode::InvalidRewardIndex);
    }
    let slot = &mut pool.reward_infos[rewarder_index];
    if slot.authority != caller {
        return Err(ErrorCode::RewardAuthError);
    }
    slot.pending_authority = Some(new_authority);

    events.emit(Event::TransferRewardAuth(TransferRewardAuthEvent {
        pool: pool.index,
        rewarder_index,
        old_authority: caller,
        new_authority,
    }));
    Ok(())
}

/// Completes the handover: the named successor claims the slot and the
/// pending entry is cleared.
pub fn accept_reward_authority(
    pool: &mut PoolState,
    events: &mut dyn EventSink,
    caller: Principal,
    rewarder_index: usize,
) -> Result<(), ErrorCode> {
    if rewarder_index >= REWARD_NUM || !pool.reward_infos[rewarder_index].initialized() {
        return Err(ErrorCode::InvalidRewardIndex);
    }
    let slot = &mut pool.reward_infos[rewarder_index];
    if slot.pending_authority != Some(caller) {
        return Err(ErrorCode::RewardAuthError);
    }
    slot.authority = caller;
    slot.pending_authority = None;

    events.emit(Event::AcceptRewardAuth(AcceptRewardAuthEvent {
        pool: pool.index,
        rewarder_index,
        authority: caller,
    }));
    Ok(())
}
