use crate::error::ErrorCode;
use crate::states::config::MAX_FEE_RATE;
use crate::states::events::{Event, EventSink};
use crate::states::pool::{PoolState, UpdateFeeRateEvent};
use crate::util::access_control::AccessControl;
use crate::util::token::Principal;

/// Changes the pool trade fee rate.
pub fn update_fee_rate(
    pool: &mut PoolState,
    access_control: &dyn AccessControl,
    events: &mut dyn EventSink,
    caller: Principal,
    fee_rate: u32,
) -> Result<(), ErrorCode> {
    if !access_control.is_protocol_authority(&caller) {
        return Err(ErrorCode::NoPrivilege);
    }
    if fee_rate > MAX_FEE_RATE {
        return Err(ErrorCode::InvalidFeeRate);
    }
    let old_fee_rate = pool.fee_rate;
    pool.fee_rate = fee_rate;

    events.emit(Event::UpdateFeeRate(UpdateFeeRateEvent {
        pool: pool.index,
        old_fee_rate,
        new_fee_rate: fee_rate,
    }));
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::util::testing::*;

    #[test]
    fn fee_rate_is_bounded() {
        let mut env = TestEnv::new();
        let mut pool = env.new_pool(1, 1u128 << 64);
        update_fee_rate(&mut pool, &env.access_control, &mut env.events, env.admin, 10_000)
            .unwrap();
        assert_eq!(pool.fee_rate, 10_000);
        assert_eq!(
            update_fee_rate(
                &mut pool,
                &env.access_control,
                &mut env.events,
                env.admin,
                MAX_FEE_RATE + 1
            )
            .unwrap_err(),
            ErrorCode::InvalidFeeRate
        );
        assert_eq!(
            update_fee_rate(&mut pool, &env.access_control, &mut env.events, env.user, 1)
                .unwrap_err(),
            ErrorCode::NoPrivilege
        );
    }
}
