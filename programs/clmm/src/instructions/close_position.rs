use crate::error::ErrorCode;
use crate::instructions::{check_not_paused, check_position_holder};
use crate::states::events::{Event, EventSink};
use crate::states::pool::PoolState;
use crate::states::position::ClosePositionEvent;
use crate::util::access_control::{AccessControl, PositionNft};
use crate::util::token::Principal;

/// Closes a position and burns its NFT. The position must hold no liquidity
/// and no uncollected fees or rewards.
pub fn close_position(
    pool: &mut PoolState,
    access_control: &dyn AccessControl,
    nft: &mut dyn PositionNft,
    events: &mut dyn EventSink,
    user: Principal,
    position_index: u64,
) -> Result<(), ErrorCode> {
    check_not_paused(pool, access_control)?;
    check_position_holder(nft, pool, position_index, &user)?;

    let position = pool.position(position_index)?;
    if !position.is_empty() {
        return Err(ErrorCode::PoolLiquidityIsNotZero);
    }

    pool.positions.remove(&position_index);
    nft.burn(pool.index, position_index);

    events.emit(Event::ClosePosition(ClosePositionEvent {
        user,
        pool: pool.index,
        index: position_index,
    }));
    Ok(())
}
