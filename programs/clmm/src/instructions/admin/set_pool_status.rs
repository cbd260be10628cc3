use crate::error::ErrorCode;
use crate::states::pool::PoolState;
use crate::util::access_control::AccessControl;
use crate::util::token::Principal;

/// Pool-level pause switch. While paused, every state-mutating operation on
/// the pool fails with `PoolIsPaused`.
pub fn set_pool_status(
    pool: &mut PoolState,
    access_control: &dyn AccessControl,
    caller: Principal,
    paused: bool,
) -> Result<(), ErrorCode> {
    if !access_control.is_protocol_authority(&caller) {
        return Err(ErrorCode::NoPrivilege);
    }
    pool.paused = paused;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::util::testing::*;

    #[test]
    fn pause_round_trip() {
        let mut env = TestEnv::new();
        let mut pool = env.new_pool(1, 1u128 << 64);
        set_pool_status(&mut pool, &env.access_control, env.admin, true).unwrap();
        assert!(pool.paused);
        assert_eq!(
            env.open_position(&mut pool, -10, 10).unwrap_err(),
            ErrorCode::PoolIsPaused
        );
        set_pool_status(&mut pool, &env.access_control, env.admin, false).unwrap();
        assert!(!pool.paused);
        assert_eq!(
            set_pool_status(&mut pool, &env.access_control, env.user, true).unwrap_err(),
            ErrorCode::NoPrivilege
        );
    }
}
