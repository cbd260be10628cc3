use crate::error::ErrorCode;
use crate::libraries::tick_math;
use crate::states::config::MAX_FEE_RATE;
use crate::states::events::{Event, EventSink};
use crate::states::pool::{CreatePoolEvent, PoolState};
use crate::util::access_control::{AccessControl, FeeRegistry, PositionNft};
use crate::util::system::Clock;
use crate::util::token::{Principal, TokenId, TokenRegistry};

/// Creates a pool for the given token pair with an initial price. The trade
/// fee rate is bound to the tick spacing through the fee-tier registry, and
/// the position collection for the pool is created on the NFT side.
#[allow(clippy::too_many_arguments)]
pub fn create_pool(
    access_control: &dyn AccessControl,
    fee_registry: &dyn FeeRegistry,
    token_registry: &dyn TokenRegistry,
    nft: &mut dyn PositionNft,
    clock: &dyn Clock,
    events: &mut dyn EventSink,
    creator: Principal,
    pool_index: u64,
    token_a: TokenId,
    token_b: TokenId,
    tick_spacing: u32,
    sqrt_price_x64: u128,
    uri: String,
) -> Result<PoolState, ErrorCode> {
    if access_control.is_protocol_paused() {
        return Err(ErrorCode::PoolIsPaused);
    }
    if !access_control.is_pool_create_authority(&creator) {
        return Err(ErrorCode::NoPrivilege);
    }
    if token_a == token_b {
        return Err(ErrorCode::SameTokenType);
    }
    if sqrt_price_x64 < tick_math::MIN_SQRT_PRICE_X64
        || sqrt_price_x64 > tick_math::MAX_SQRT_PRICE_X64
    {
        return Err(ErrorCode::InvalidSqrtPrice);
    }
    let fee_rate = fee_registry
        .fee_rate_for_spacing(tick_spacing)
        .ok_or(ErrorCode::InvalidFeeRate)?;
    if fee_rate > MAX_FEE_RATE {
        return Err(ErrorCode::InvalidFeeRate);
    }

    let pool = PoolState::new(
        pool_index,
        token_a,
        token_b,
        tick_spacing,
        fee_rate,
        sqrt_price_x64,
        uri,
        clock.now_seconds(),
    )?;

    let collection_name = format!(
        "{}-{}[{}]",
        token_registry.symbol(token_a),
        token_registry.symbol(token_b),
        tick_spacing
    );
    nft.create_collection(pool_index, &collection_name);

    events.emit(Event::CreatePool(CreatePoolEvent {
        creator,
        pool_address: pool_index,
        collection_name,
        token_a,
        token_b,
        tick_spacing,
    }));
    Ok(pool)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::util::testing::*;

    #[test]
    fn pool_creation_checks_pair_and_price() {
        let mut env = TestEnv::new();
        let token = TokenId::new([1; 32]);
        assert_eq!(
            create_pool(
                &env.access_control,
                &env.fee_registry,
                &env.token_registry,
                &mut env.nft,
                &env.clock,
                &mut env.events,
                env.admin,
                1,
                token,
                token,
                10,
                1u128 << 64,
                String::new(),
            )
            .unwrap_err(),
            ErrorCode::SameTokenType
        );

        assert_eq!(
            create_pool(
                &env.access_control,
                &env.fee_registry,
                &env.token_registry,
                &mut env.nft,
                &env.clock,
                &mut env.events,
                env.admin,
                1,
                token,
                TokenId::new([2; 32]),
                10,
                tick_math::MAX_SQRT_PRICE_X64 + 1,
                String::new(),
            )
            .unwrap_err(),
            ErrorCode::InvalidSqrtPrice
        );
    }

    #[test]
    fn pool_creation_reads_the_fee_tier() {
        let mut env = TestEnv::new();
        let pool = create_pool(
            &env.access_control,
            &env.fee_registry,
            &env.token_registry,
            &mut env.nft,
            &env.clock,
            &mut env.events,
            env.admin,
            7,
            TokenId::new([1; 32]),
            TokenId::new([2; 32]),
            10,
            1u128 << 64,
            "ipfs://pool".to_string(),
        )
        .unwrap();
        assert_eq!(pool.fee_rate, 2500);
        assert_eq!(pool.tick_current, 0);
        assert_eq!(pool.position_seq, 1);
        match env.events.last().unwrap() {
            Event::CreatePool(event) => {
                assert_eq!(event.pool_address, 7);
                assert_eq!(event.tick_spacing, 10);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn unknown_spacing_has_no_fee_tier() {
        let mut env = TestEnv::new();
        assert_eq!(
            create_pool(
                &env.access_control,
                &env.fee_registry,
                &env.token_registry,
                &mut env.nft,
                &env.clock,
                &mut env.events,
                env.admin,
                1,
                TokenId::new([1; 32]),
                TokenId::new([2; 32]),
                12345,
                1u128 << 64,
                String::new(),
            )
            .unwrap_err(),
            ErrorCode::InvalidFeeRate
        );
    }
}
