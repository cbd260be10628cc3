use thiserror::Error;

/// Convenience alias used across the engine.
pub type Result<T> = core::result::Result<T, ErrorCode>;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    #[error("tick must be within the tick range and a multiple of tick spacing")]
    InvalidTick,
    #[error("sqrt_price_x64 out of range")]
    InvalidSqrtPrice,
    #[error("fee rate exceeds the maximum")]
    InvalidFeeRate,
    #[error("timestamp must not move backwards")]
    InvalidTime,
    #[error("the two tokens of a pool must differ")]
    SameTokenType,
    #[error("settlement amount does not match the receipt")]
    AmountIncorrect,
    #[error("amount in above limit")]
    AmountInAboveLimit,
    #[error("amount out below limit")]
    AmountOutBelowLimit,
    #[error("liquidity amount must not be zero")]
    LiquidityZero,
    #[error("liquidity add overflow")]
    LiquidityOverflow,
    #[error("liquidity sub delta must be smaller than before")]
    LiquidityUnderflow,
    #[error("not enough initialized ticks to fill the swap")]
    NotEnoughLiquidity,
    #[error("swap remainder underflow")]
    RemainderUnderflow,
    #[error("wrong sqrt price limit for the swap direction")]
    WrongSqrtPriceLimit,
    #[error("position does not exist")]
    PositionNotExist,
    #[error("caller does not hold the position")]
    PositionOwnerError,
    #[error("pool is paused")]
    PoolIsPaused,
    #[error("remove liquidity, collect fees owed and rewards first")]
    PoolLiquidityIsNotZero,
    #[error("invalid delta liquidity")]
    InvalidDeltaLiquidity,
    #[error("invalid reward index")]
    InvalidRewardIndex,
    #[error("reward vault does not cover the amount")]
    RewardAmountInsufficient,
    #[error("caller is not the rewarder authority")]
    RewardAuthError,
    #[error("fee owed overflow, collect fees first")]
    FeeOverflow,
    #[error("reward owed overflow, collect rewards first")]
    RewardOverflow,
    #[error("multiplication overflow")]
    MultiplicationOverflow,
    #[error("division by zero")]
    DivByZero,
    #[error("this entry point is disabled")]
    FuncDisabled,
    #[error("caller lacks the required authority")]
    NoPrivilege,
    #[error("internal invariant violated")]
    InvariantViolated,
}
