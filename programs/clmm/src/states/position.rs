use crate::error::ErrorCode;
use crate::libraries::big_num::U256;
use crate::libraries::full_math::mul_shr;
use crate::states::pool::REWARD_NUM;
use crate::util::token::Principal;

/// State of a liquidity position over `[tick_lower_index, tick_upper_index)`
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PositionState {
    /// Sequence number of the position within its pool
    pub index: u64,

    /// The lower bound tick of the position
    pub tick_lower_index: i32,

    /// The upper bound tick of the position
    pub tick_upper_index: i32,

    /// The amount of liquidity owned by this position
    pub liquidity: u128,

    /// The token A fee growth inside the range as of the last refresh
    pub fee_growth_inside_a_last_x64: u128,

    /// The token B fee growth inside the range as of the last refresh
    pub fee_growth_inside_b_last_x64: u128,

    /// The fees owed to the position owner in token A, as of the last refresh
    pub token_fees_owed_a: u64,

    /// The fees owed to the position owner in token B, as of the last refresh
    pub token_fees_owed_b: u64,

    /// Per-rewarder accrual state
    pub reward_infos: [PositionRewardInfo; REWARD_NUM],
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PositionRewardInfo {
    /// Q64.64
    pub growth_inside_last_x64: u128,
    pub amount_owed: u64,
}

impl PositionState {
    pub fn new(index: u64, tick_lower_index: i32, tick_upper_index: i32) -> Self {
        PositionState {
            index,
            tick_lower_index,
            tick_upper_index,
            ..Default::default()
        }
    }

    /// Settles fee accruals against fresh growth-inside values and moves the
    /// snapshots forward. The growth difference wraps; the owed additions are
    /// checked and must be collected before they overflow.
    pub fn update_fees(
        &mut self,
        fee_growth_inside_a_x64: u128,
        fee_growth_inside_b_x64: u128,
    ) -> Result<(), ErrorCode> {
        let delta_a = fee_growth_inside_a_x64.wrapping_sub(self.fee_growth_inside_a_last_x64);
        let delta_b = fee_growth_inside_b_x64.wrapping_sub(self.fee_growth_inside_b_last_x64);

        self.token_fees_owed_a = self
            .token_fees_owed_a
            .checked_add(accrued_amount(self.liquidity, delta_a).ok_or(ErrorCode::FeeOverflow)?)
            .ok_or(ErrorCode::FeeOverflow)?;
        self.token_fees_owed_b = self
            .token_fees_owed_b
            .checked_add(accrued_amount(self.liquidity, delta_b).ok_or(ErrorCode::FeeOverflow)?)
            .ok_or(ErrorCode::FeeOverflow)?;

        self.fee_growth_inside_a_last_x64 = fee_growth_inside_a_x64;
        self.fee_growth_inside_b_last_x64 = fee_growth_inside_b_x64;
        Ok(())
    }

    /// Settles reward accruals for every slot, as `update_fees` does for fees.
    pub fn update_rewards(
        &mut self,
        reward_growths_inside_x64: [u128; REWARD_NUM],
    ) -> Result<(), ErrorCode> {
        for i in 0..REWARD_NUM {
            let growth_inside_x64 = reward_growths_inside_x64[i];
            let delta = growth_inside_x64.wrapping_sub(self.reward_infos[i].growth_inside_last_x64);

            self.reward_infos[i].amount_owed = self.reward_infos[i]
                .amount_owed
                .checked_add(accrued_amount(self.liquidity, delta).ok_or(ErrorCode::RewardOverflow)?)
                .ok_or(ErrorCode::RewardOverflow)?;
            self.reward_infos[i].growth_inside_last_x64 = growth_inside_x64;
        }
        Ok(())
    }

    /// A position may be closed only when nothing is left to withdraw.
    pub fn is_empty(&self) -> bool {
        self.liquidity == 0
            && self.token_fees_owed_a == 0
            && self.token_fees_owed_b == 0
            && self.reward_infos.iter().all(|r| r.amount_owed == 0)
    }
}

// floor(liquidity * growth_delta / 2^64), None when it exceeds u64
fn accrued_amount(liquidity: u128, growth_delta_x64: u128) -> Option<u64> {
    let amount = mul_shr(liquidity, growth_delta_x64, 64);
    if amount > U256::from(u64::MAX) {
        None
    } else {
        Some(amount.as_u64())
    }
}

/// Emitted when a position is opened
#[derive(Clone, Debug, PartialEq)]
pub struct OpenPositionEvent {
    pub user: Principal,
    pub pool: u64,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub index: u64,
}

/// Emitted when a position is closed
#[derive(Clone, Debug, PartialEq)]
pub struct ClosePositionEvent {
    pub user: Principal,
    pub pool: u64,
    pub index: u64,
}

/// Emitted when liquidity is added to a position
#[derive(Clone, Debug, PartialEq)]
pub struct AddLiquidityEvent {
    pub pool: u64,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: u128,
    pub amount_a: u64,
    pub amount_b: u64,
    pub index: u64,
}

/// Emitted when liquidity is removed from a position
#[derive(Clone, Debug, PartialEq)]
pub struct RemoveLiquidityEvent {
    pub pool: u64,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: u128,
    pub amount_a: u64,
    pub amount_b: u64,
    pub index: u64,
}

/// Emitted when accrued swap fees are collected for a position
#[derive(Clone, Debug, PartialEq)]
pub struct CollectFeeEvent {
    pub index: u64,
    pub user: Principal,
    pub pool: u64,
    pub amount_a: u64,
    pub amount_b: u64,
}

/// Emitted when accrued rewards are collected for a position
#[derive(Clone, Debug, PartialEq)]
pub struct CollectRewardEvent {
    pub index: u64,
    pub user: Principal,
    pub pool: u64,
    pub rewarder_index: usize,
    pub amount: u64,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fee_accrual_floors_through_mul_shr() {
        let mut position = PositionState::new(1, -10, 10);
        position.liquidity = 1_000_000_000;
        // growth of 1.5 in Q64.64 per unit of liquidity
        let growth = (3u128 << 64) / 2;
        position.update_fees(growth, 0).unwrap();
        assert_eq!(position.token_fees_owed_a, 1_500_000_000);
        assert_eq!(position.token_fees_owed_b, 0);
        assert_eq!(position.fee_growth_inside_a_last_x64, growth);

        // refreshing against an unchanged snapshot accrues nothing
        position.update_fees(growth, 0).unwrap();
        assert_eq!(position.token_fees_owed_a, 1_500_000_000);
    }

    #[test]
    fn wrapped_growth_delta_stays_exact() {
        let mut position = PositionState::new(1, -10, 10);
        position.liquidity = u64::MAX as u128;
        position.fee_growth_inside_a_last_x64 = u128::MAX - (1u128 << 63);
        // the global accumulator wrapped past zero; the difference modulo
        // 2^128 is one full unit of growth
        position.update_fees((1u128 << 63) - 1, 0).unwrap();
        assert_eq!(position.token_fees_owed_a, u64::MAX);
    }

    #[test]
    fn owed_overflow_is_reported() {
        let mut position = PositionState::new(1, -10, 10);
        position.liquidity = u64::MAX as u128;
        position.token_fees_owed_a = u64::MAX;
        assert_eq!(
            position.update_fees(1u128 << 64, 0),
            Err(ErrorCode::FeeOverflow)
        );
    }

    #[test]
    fn reward_accrual_per_slot() {
        let mut position = PositionState::new(1, -10, 10);
        position.liquidity = 500;
        position
            .update_rewards([2u128 << 64, 0, 1u128 << 63])
            .unwrap();
        assert_eq!(position.reward_infos[0].amount_owed, 1000);
        assert_eq!(position.reward_infos[1].amount_owed, 0);
        assert_eq!(position.reward_infos[2].amount_owed, 250);
    }

    #[test]
    fn empty_check_covers_all_claims() {
        let mut position = PositionState::new(1, -10, 10);
        assert!(position.is_empty());
        position.token_fees_owed_b = 1;
        assert!(!position.is_empty());
        position.token_fees_owed_b = 0;
        position.reward_infos[2].amount_owed = 1;
        assert!(!position.is_empty());
    }
}
