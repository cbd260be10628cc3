//! Concentrated liquidity AMM pool engine.
//!
//! Deterministic, integer-only pool state machine: Q64.64 tick and price
//! math, the multi-step swap traversal with partner/protocol fee split,
//! per-position fee and reward accounting over wrapping growth accumulators,
//! a three-slot reward emission engine, and a sparse tick directory.
//!
//! The engine is host-agnostic. Everything protocol-level — access control,
//! fee tiers, partner rates, the position NFT wrapper, token metadata and the
//! clock — is consumed through the traits in [`util`], and state changes are
//! reported through the [`states::events::EventSink`] the caller supplies.
//! Flash swaps and liquidity deposits settle through must-use receipts whose
//! only consumers are the matching `repay_*` calls.

pub mod error;
pub mod instructions;
pub mod libraries;
pub mod states;
pub mod util;

pub use error::ErrorCode;
pub use instructions::*;
pub use states::events::{Event, EventSink};
pub use states::pool::{PoolState, RewardInfo, REWARD_NUM};
pub use states::position::PositionState;
pub use util::access_control::{AccessControl, FeeRegistry, PartnerRegistry, PositionNft};
pub use util::system::Clock;
pub use util::token::{Asset, Principal, TokenId, TokenRegistry};
