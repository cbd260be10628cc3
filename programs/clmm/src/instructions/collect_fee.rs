use crate::error::ErrorCode;
use crate::instructions::{check_not_paused, check_position_holder};
use crate::states::events::{Event, EventSink};
use crate::states::pool::PoolState;
use crate::states::position::CollectFeeEvent;
use crate::util::access_control::{AccessControl, PositionNft};
use crate::util::token::{Asset, Principal};

/// Pays out the fees owed to a position. With `recalculate` the position is
/// refreshed against the current growth accumulators first; without it only
/// the amounts settled by an earlier refresh are paid.
#[allow(clippy::too_many_arguments)]
pub fn collect_fee(
    pool: &mut PoolState,
    access_control: &dyn AccessControl,
    nft: &dyn PositionNft,
    events: &mut dyn EventSink,
    user: Principal,
    position_index: u64,
    recalculate: bool,
) -> Result<(Asset, Asset), ErrorCode> {
    check_not_paused(pool, access_control)?;
    check_position_holder(nft, pool, position_index, &user)?;

    if recalculate {
        pool.refresh_position_fees(position_index)?;
    }

    let position = pool.position(position_index)?;
    let amount_a = position.token_fees_owed_a;
    let amount_b = position.token_fees_owed_b;
    // nothing is mutated until both payouts are known to be covered
    if pool.vault_a < amount_a || pool.vault_b < amount_b {
        return Err(ErrorCode::InvariantViolated);
    }

    let position = pool.position_mut(position_index)?;
    position.token_fees_owed_a = 0;
    position.token_fees_owed_b = 0;
    let asset_a = pool.withdraw_a(amount_a)?;
    let asset_b = pool.withdraw_b(amount_b)?;

    events.emit(Event::CollectFee(CollectFeeEvent {
        index: position_index,
        user,
        pool: pool.index,
        amount_a,
        amount_b,
    }));
    Ok((asset_a, asset_b))
}
