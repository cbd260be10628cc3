//! Capability predicates and registries the engine consumes from its
//! collaborators. The engine holds no global mutable state of its own; all
//! protocol-level configuration flows through these traits.
use crate::util::token::{Asset, Principal};

/// Role checks plus the protocol-level pause switch.
pub trait AccessControl {
    fn is_protocol_authority(&self, principal: &Principal) -> bool;
    fn is_pool_create_authority(&self, principal: &Principal) -> bool;
    fn is_protocol_fee_claim_authority(&self, principal: &Principal) -> bool;
    fn allow_reset_initial_price(&self, principal: &Principal) -> bool;
    fn allow_set_position_uri(&self, principal: &Principal) -> bool;
    fn is_protocol_paused(&self) -> bool;
}

/// Fee tiers keyed by tick spacing, and the protocol share of trade fees.
pub trait FeeRegistry {
    /// Trade fee rate for the tick spacing, in hundredths of a bip (10^-6)
    fn fee_rate_for_spacing(&self, tick_spacing: u32) -> Option<u32>;
    /// Protocol share of every trade fee, over a denominator of 10_000
    fn protocol_fee_rate(&self) -> u64;
}

/// Named third parties earning a share of protocol fees on trades they route.
pub trait PartnerRegistry {
    /// Partner share of the protocol fee, over a denominator of 10_000
    fn partner_ref_fee_rate(&self, name: &str) -> u64;
    fn receive_ref_fee(&mut self, name: &str, asset: Asset);
}

/// The position-NFT wrapper. The engine authorises position operations by
/// checking that the caller currently holds the position's token.
pub trait PositionNft {
    fn create_collection(&mut self, pool_index: u64, collection_name: &str);
    fn mint(&mut self, owner: &Principal, pool_index: u64, position_index: u64);
    fn burn(&mut self, pool_index: u64, position_index: u64);
    fn position_name(&self, pool_index: u64, position_index: u64) -> String;
    fn holder_of(&self, pool_index: u64, position_index: u64) -> Option<Principal>;
}
