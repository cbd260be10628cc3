//! The pool state: price, active liquidity, growth accumulators, vault
//! balances, rewarders, and the position and tick tables.
use crate::error::ErrorCode;
use crate::libraries::big_num::U256;
use crate::libraries::full_math::MulDiv;
use crate::libraries::tick_math;
use crate::states::position::PositionState;
use crate::states::tick::{self, TickTable};
use crate::util::token::{Asset, Principal, TokenId};
use std::collections::BTreeMap;

/// Number of reward slots per pool
pub const REWARD_NUM: usize = 3;

/// Emission changes must be backed by at least one day of reward balance
pub const DAY_SECONDS: u64 = 86_400;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PoolState {
    /// Index of the pool within the factory, also its address for events
    pub index: u64,

    /// Token pair of the pool
    pub token_a: TokenId,
    pub token_b: TokenId,

    /// The minimum number of ticks between initialized ticks
    pub tick_spacing: u32,

    /// The trade fee, in hundredths of a bip (10^-6)
    pub fee_rate: u32,

    /// The currently in range liquidity available to the pool.
    pub liquidity: u128,

    /// The current price of the pool as a sqrt(token_b/token_a) Q64.64 value
    pub sqrt_price_x64: u128,

    /// The current tick of the pool, i.e. according to the last tick transition that was run.
    pub tick_current: i32,

    /// The fee growth as a Q64.64 number, i.e. fees of token A and token B
    /// collected per unit of liquidity for the entire life of the pool.
    /// These accumulators wrap.
    pub fee_growth_global_a_x64: u128,
    pub fee_growth_global_b_x64: u128,

    /// The amounts of token A and token B that are owed to the protocol.
    pub protocol_fees_token_a: u64,
    pub protocol_fees_token_b: u64,

    /// Balances of the pool-owned vaults
    pub vault_a: u64,
    pub vault_b: u64,

    /// Reward slots; once a slot is initialized it is permanent
    pub reward_infos: [RewardInfo; REWARD_NUM],

    /// Last time the reward growth accumulators were settled
    pub reward_last_updated_at: u64,

    /// Positions keyed by their sequence number
    pub positions: BTreeMap<u64, PositionState>,

    /// Next position sequence number, monotone and starting at 1
    pub position_seq: u64,

    /// Tick records and directory
    pub tick_table: TickTable,

    /// Pool-level pause switch
    pub paused: bool,

    /// Metadata URI of the pool's position collection
    pub uri: String,
}

impl PoolState {
    pub fn new(
        index: u64,
        token_a: TokenId,
        token_b: TokenId,
        tick_spacing: u32,
        fee_rate: u32,
        sqrt_price_x64: u128,
        uri: String,
        now: u64,
    ) -> Result<Self, ErrorCode> {
        let tick_current = tick_math::get_tick_at_sqrt_price(sqrt_price_x64)?;
        Ok(PoolState {
            index,
            token_a,
            token_b,
            tick_spacing,
            fee_rate,
            liquidity: 0,
            sqrt_price_x64,
            tick_current,
            reward_last_updated_at: now,
            positions: BTreeMap::new(),
            position_seq: 1,
            tick_table: TickTable::new(tick_spacing),
            paused: false,
            uri,
            ..Default::default()
        })
    }

    pub fn position(&self, position_index: u64) -> Result<&PositionState, ErrorCode> {
        self.positions
            .get(&position_index)
            .ok_or(ErrorCode::PositionNotExist)
    }

    pub fn position_mut(&mut self, position_index: u64) -> Result<&mut PositionState, ErrorCode> {
        self.positions
            .get_mut(&position_index)
            .ok_or(ErrorCode::PositionNotExist)
    }

    /// Computes the reward state after settling emissions up to `now`,
    /// without committing it. Swaps carry the result through the whole
    /// traversal and commit only on success.
    pub fn updated_reward_infos(
        &self,
        now: u64,
    ) -> Result<[RewardInfo; REWARD_NUM], ErrorCode> {
        if now < self.reward_last_updated_at {
            return Err(ErrorCode::InvalidTime);
        }
        let mut next_reward_infos = self.reward_infos.clone();
        if now == self.reward_last_updated_at || self.liquidity == 0 {
            return Ok(next_reward_infos);
        }
        let time_delta = now - self.reward_last_updated_at;
        for reward_info in next_reward_infos.iter_mut() {
            if !reward_info.initialized() || reward_info.emissions_per_second_x64 == 0 {
                continue;
            }
            let growth_delta = U256::from(time_delta)
                .mul_div_floor(
                    U256::from(reward_info.emissions_per_second_x64),
                    U256::from(self.liquidity),
                )
                .ok_or(ErrorCode::MultiplicationOverflow)?;
            // the growth accumulator wraps by design
            reward_info.growth_global_x64 = reward_info
                .growth_global_x64
                .wrapping_add(growth_delta.low_u128());
        }
        Ok(next_reward_infos)
    }

    /// Settles reward emissions up to `now`. Called at the start of every
    /// state-mutating operation, before any liquidity changes.
    pub fn update_reward_infos(&mut self, now: u64) -> Result<(), ErrorCode> {
        let next_reward_infos = self.updated_reward_infos(now)?;
        self.commit_reward_infos(next_reward_infos, now);
        Ok(())
    }

    pub fn commit_reward_infos(&mut self, infos: [RewardInfo; REWARD_NUM], now: u64) {
        self.reward_infos = infos;
        self.reward_last_updated_at = now;
        #[cfg(feature = "enable-log")]
        log::debug!(
            "settled rewards, growth_globals: {:?}, liquidity: {}",
            self.reward_growths(),
            self.liquidity
        );
    }

    pub fn reward_growths(&self) -> [u128; REWARD_NUM] {
        let mut reward_growths = [0u128; REWARD_NUM];
        for i in 0..REWARD_NUM {
            reward_growths[i] = self.reward_infos[i].growth_global_x64;
        }
        reward_growths
    }

    /// Refreshes fee and reward accruals of a position against the current
    /// growth accumulators, moving its snapshots forward.
    pub fn refresh_position(&mut self, position_index: u64) -> Result<(), ErrorCode> {
        let position = self
            .positions
            .get_mut(&position_index)
            .ok_or(ErrorCode::PositionNotExist)?;
        let (fee_growth_inside_a_x64, fee_growth_inside_b_x64) = tick::get_fee_growth_inside(
            self.tick_table.get(position.tick_lower_index),
            self.tick_table.get(position.tick_upper_index),
            position.tick_lower_index,
            position.tick_upper_index,
            self.tick_current,
            self.fee_growth_global_a_x64,
            self.fee_growth_global_b_x64,
        );
        let reward_growths_inside_x64 = tick::get_reward_growths_inside(
            self.tick_table.get(position.tick_lower_index),
            self.tick_table.get(position.tick_upper_index),
            position.tick_lower_index,
            position.tick_upper_index,
            self.tick_current,
            &self.reward_infos,
        );
        position.update_fees(fee_growth_inside_a_x64, fee_growth_inside_b_x64)?;
        position.update_rewards(reward_growths_inside_x64)?;
        Ok(())
    }

    /// Refreshes only the fee accruals of a position.
    pub fn refresh_position_fees(&mut self, position_index: u64) -> Result<(), ErrorCode> {
        let position = self
            .positions
            .get_mut(&position_index)
            .ok_or(ErrorCode::PositionNotExist)?;
        let (fee_growth_inside_a_x64, fee_growth_inside_b_x64) = tick::get_fee_growth_inside(
            self.tick_table.get(position.tick_lower_index),
            self.tick_table.get(position.tick_upper_index),
            position.tick_lower_index,
            position.tick_upper_index,
            self.tick_current,
            self.fee_growth_global_a_x64,
            self.fee_growth_global_b_x64,
        );
        position.update_fees(fee_growth_inside_a_x64, fee_growth_inside_b_x64)
    }

    pub fn withdraw_a(&mut self, amount: u64) -> Result<Asset, ErrorCode> {
        self.vault_a = self
            .vault_a
            .checked_sub(amount)
            .ok_or(ErrorCode::InvariantViolated)?;
        Ok(Asset::new(self.token_a, amount))
    }

    pub fn withdraw_b(&mut self, amount: u64) -> Result<Asset, ErrorCode> {
        self.vault_b = self
            .vault_b
            .checked_sub(amount)
            .ok_or(ErrorCode::InvariantViolated)?;
        Ok(Asset::new(self.token_b, amount))
    }

    pub fn deposit_a(&mut self, asset: Asset) -> Result<(), ErrorCode> {
        if asset.token() != self.token_a {
            return Err(ErrorCode::AmountIncorrect);
        }
        self.vault_a = self
            .vault_a
            .checked_add(asset.amount())
            .ok_or(ErrorCode::MultiplicationOverflow)?;
        Ok(())
    }

    pub fn deposit_b(&mut self, asset: Asset) -> Result<(), ErrorCode> {
        if asset.token() != self.token_b {
            return Err(ErrorCode::AmountIncorrect);
        }
        self.vault_b = self
            .vault_b
            .checked_add(asset.amount())
            .ok_or(ErrorCode::MultiplicationOverflow)?;
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RewardInfo {
    /// Reward token; a zero id marks the slot uninitialized
    pub token: TokenId,
    /// The owner that has permission to set the emission rate
    pub authority: Principal,
    /// Set by `transfer_reward_authority`, cleared by `accept_reward_authority`
    pub pending_authority: Option<Principal>,
    /// Q64.64 number of tokens emitted per second for the whole pool
    pub emissions_per_second_x64: u128,
    /// Q64.64 total tokens earned per unit of liquidity since emissions
    /// started; wraps
    pub growth_global_x64: u128,
    /// Balance of the reward token held by the pool
    pub vault: u64,
}

impl RewardInfo {
    /// Returns true if this reward slot is initialized.
    /// Once initialized, a slot cannot transition back to uninitialized.
    pub fn initialized(&self) -> bool {
        self.token != TokenId::ZERO
    }
}

/// Emitted when a pool is created and initialized with a starting price
#[derive(Clone, Debug, PartialEq)]
pub struct CreatePoolEvent {
    pub creator: Principal,
    pub pool_address: u64,
    pub collection_name: String,
    pub token_a: TokenId,
    pub token_b: TokenId,
    pub tick_spacing: u32,
}

/// Emitted when a swap is performed against a pool
#[derive(Clone, Debug, PartialEq)]
pub struct SwapEvent {
    pub a_to_b: bool,
    pub pool: u64,
    pub swap_from: Principal,
    pub partner: String,
    pub amount_in: u64,
    pub amount_out: u64,
    pub ref_amount: u64,
    pub fee_amount: u64,
    pub vault_a_amount: u64,
    pub vault_b_amount: u64,
}

/// Emitted when the collected protocol fees are withdrawn
#[derive(Clone, Debug, PartialEq)]
pub struct CollectProtocolFeeEvent {
    pub pool: u64,
    pub amount_a: u64,
    pub amount_b: u64,
}

/// Emitted when the pool trade fee rate changes
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateFeeRateEvent {
    pub pool: u64,
    pub old_fee_rate: u32,
    pub new_fee_rate: u32,
}

/// Emitted when a rewarder's emission rate changes
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateEmissionEvent {
    pub pool: u64,
    pub rewarder_index: usize,
    pub token: TokenId,
    pub emissions_per_second_x64: u128,
}

/// Emitted when a rewarder authority handover starts
#[derive(Clone, Debug, PartialEq)]
pub struct TransferRewardAuthEvent {
    pub pool: u64,
    pub rewarder_index: usize,
    pub old_authority: Principal,
    pub new_authority: Principal,
}

/// Emitted when a rewarder authority handover completes
#[derive(Clone, Debug, PartialEq)]
pub struct AcceptRewardAuthEvent {
    pub pool: u64,
    pub rewarder_index: usize,
    pub authority: Principal,
}

#[cfg(test)]
mod test {
    use super::*;

    fn pool_with_reward(liquidity: u128, emissions_per_second_x64: u128) -> PoolState {
        let mut pool = PoolState::new(
            1,
            TokenId::new([1; 32]),
            TokenId::new([2; 32]),
            1,
            1000,
            1u128 << 64,
            String::new(),
            1_000,
        )
        .unwrap();
        pool.liquidity = liquidity;
        pool.reward_infos[0].token = TokenId::new([9; 32]);
        pool.reward_infos[0].emissions_per_second_x64 = emissions_per_second_x64;
        pool
    }

    #[test]
    fn reward_growth_accrues_per_unit_of_liquidity() {
        let mut pool = pool_with_reward(1_000, 500u128 << 64);
        pool.update_reward_infos(1_010).unwrap();
        // 10 seconds of 500 tokens/second over 1_000 liquidity
        assert_eq!(pool.reward_infos[0].growth_global_x64, 5u128 << 64);
        assert_eq!(pool.reward_last_updated_at, 1_010);
    }

    #[test]
    fn reward_growth_skips_when_no_liquidity() {
        let mut pool = pool_with_reward(0, 500u128 << 64);
        pool.update_reward_infos(2_000).unwrap();
        assert_eq!(pool.reward_infos[0].growth_global_x64, 0);
        // the clock still advances so idle spans never emit retroactively
        assert_eq!(pool.reward_last_updated_at, 2_000);
    }

    #[test]
    fn clock_running_backwards_is_rejected() {
        let mut pool = pool_with_reward(1, 1);
        assert_eq!(pool.update_reward_infos(999), Err(ErrorCode::InvalidTime));
    }

    #[test]
    fn vault_withdraw_is_bounded_by_balance() {
        let mut pool = pool_with_reward(0, 0);
        pool.vault_a = 50;
        let asset = pool.withdraw_a(30).unwrap();
        assert_eq!(asset.amount(), 30);
        assert_eq!(pool.vault_a, 20);
        assert!(pool.withdraw_a(21).is_err());
        pool.deposit_a(asset).unwrap();
        assert_eq!(pool.vault_a, 50);
    }
}
