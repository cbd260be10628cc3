use crate::error::ErrorCode;
use crate::states::pool::PoolState;
use crate::util::access_control::AccessControl;
use crate::util::token::Principal;

/// Replaces the metadata URI of the pool's position collection.
pub fn update_pool_uri(
    pool: &mut PoolState,
    access_control: &dyn AccessControl,
    caller: Principal,
    uri: String,
) -> Result<(), ErrorCode> {
    if !access_control.allow_set_position_uri(&caller) {
        return Err(ErrorCode::NoPrivilege);
    }
    pool.uri = uri;
    Ok(())
}
