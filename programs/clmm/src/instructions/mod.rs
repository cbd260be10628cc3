pub mod admin;
pub mod close_position;
pub mod collect_fee;
pub mod collect_reward;
pub mod create_pool;
pub mod decrease_liquidity;
pub mod increase_liquidity;
pub mod initialize_reward;
pub mod open_position;
pub mod set_reward_params;
pub mod swap;
pub mod transfer_reward_authority;
pub mod update_reward_info;

pub use admin::*;
pub use close_position::*;
pub use collect_fee::*;
pub use collect_reward::*;
pub use create_pool::*;
pub use decrease_liquidity::*;
pub use increase_liquidity::*;
pub use initialize_reward::*;
pub use open_position::*;
pub use set_reward_params::*;
pub use swap::*;
pub use transfer_reward_authority::*;
pub use update_reward_info::*;

use crate::error::ErrorCode;
use crate::states::pool::PoolState;
use crate::util::access_control::{AccessControl, PositionNft};
use crate::util::token::Principal;

/// Every state-mutating operation is rejected while the pool or the whole
/// protocol is paused.
pub(crate) fn check_not_paused(
    pool: &PoolState,
    access_control: &dyn AccessControl,
) -> Result<(), ErrorCode> {
    if pool.paused || access_control.is_protocol_paused() {
        return Err(ErrorCode::PoolIsPaused);
    }
    Ok(())
}

/// Position operations are authorised by holding the position's NFT.
pub(crate) fn check_position_holder(
    nft: &dyn PositionNft,
    pool: &PoolState,
    position_index: u64,
    user: &Principal,
) -> Result<(), ErrorCode> {
    match nft.holder_of(pool.index, position_index) {
        Some(holder) if holder == *user => Ok(()),
        _ => Err(ErrorCode::PositionOwnerError),
    }
}
