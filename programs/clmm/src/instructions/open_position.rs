use crate::error::ErrorCode;
use crate::instructions::check_not_paused;
use crate::states::events::{Event, EventSink};
use crate::states::pool::PoolState;
use crate::states::position::{OpenPositionEvent, PositionState};
use crate::states::tick;
use crate::util::access_control::{AccessControl, PositionNft};
use crate::util::token::Principal;

/// Opens an empty position over `[tick_lower, tick_upper)` and mints its NFT
/// to the caller. Liquidity is committed separately through `add_liquidity`.
pub fn open_position(
    pool: &mut PoolState,
    access_control: &dyn AccessControl,
    nft: &mut dyn PositionNft,
    events: &mut dyn EventSink,
    user: Principal,
    tick_lower_index: i32,
    tick_upper_index: i32,
) -> Result<u64, ErrorCode> {
    check_not_paused(pool, access_control)?;
    tick::check_ticks_order(tick_lower_index, tick_upper_index)?;
    tick::check_tick_boundary(tick_lower_index, pool.tick_spacing)?;
    tick::check_tick_boundary(tick_upper_index, pool.tick_spacing)?;

    let position_index = pool.position_seq;
    pool.position_seq += 1;
    pool.positions.insert(
        position_index,
        PositionState::new(position_index, tick_lower_index, tick_upper_index),
    );
    nft.mint(&user, pool.index, position_index);

    events.emit(Event::OpenPosition(OpenPositionEvent {
        user,
        pool: pool.index,
        tick_lower: tick_lower_index,
        tick_upper: tick_upper_index,
        index: position_index,
    }));
    Ok(position_index)
}
