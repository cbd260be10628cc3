use crate::error::ErrorCode;
use crate::states::events::{Event, EventSink};
use crate::states::pool::{CollectProtocolFeeEvent, PoolState};
use crate::util::access_control::AccessControl;
use crate::util::token::{Asset, Principal};

/// Drains the accrued protocol share of trade fees into assets for the
/// protocol treasury.
pub fn collect_protocol_fee(
    pool: &mut PoolState,
    access_control: &dyn AccessControl,
    events: &mut dyn EventSink,
    caller: Principal,
) -> Result<(Asset, Asset), ErrorCode> {
    if !access_control.is_protocol_fee_claim_authority(&caller) {
        return Err(ErrorCode::NoPrivilege);
    }
    let amount_a = pool.protocol_fees_token_a;
    let amount_b = pool.protocol_fees_token_b;
    if pool.vault_a < amount_a || pool.vault_b < amount_b {
        return Err(ErrorCode::InvariantViolated);
    }
    pool.protocol_fees_token_a = 0;
    pool.protocol_fees_token_b = 0;
    let asset_a = pool.withdraw_a(amount_a)?;
    let asset_b = pool.withdraw_b(amount_b)?;

    events.emit(Event::CollectProtocolFee(CollectProtocolFeeEvent {
        pool: pool.index,
        amount_a,
        amount_b,
    }));
    Ok((asset_a, asset_b))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::util::testing::*;

    #[test]
    fn drains_and_zeroes_the_counters() {
        let mut env = TestEnv::new();
        let mut pool = env.new_pool(1, 1u128 << 64);
        pool.vault_a = 500;
        pool.vault_b = 700;
        pool.protocol_fees_token_a = 120;
        pool.protocol_fees_token_b = 340;

        let (asset_a, asset_b) =
            collect_protocol_fee(&mut pool, &env.access_control, &mut env.events, env.admin)
                .unwrap();
        assert_eq!(asset_a.amount(), 120);
        assert_eq!(asset_b.amount(), 340);
        assert_eq!(pool.protocol_fees_token_a, 0);
        assert_eq!(pool.protocol_fees_token_b, 0);
        assert_eq!(pool.vault_a, 380);
        discard(asset_a);
        discard(asset_b);
    }

    #[test]
    fn requires_the_claim_authority() {
        let mut env = TestEnv::new();
        let mut pool = env.new_pool(1, 1u128 << 64);
        assert_eq!(
            collect_protocol_fee(&mut pool, &env.access_control, &mut env.events, env.user)
                .unwrap_err(),
            ErrorCode::NoPrivilege
        );
    }
}
