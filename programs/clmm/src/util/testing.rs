//! In-memory collaborators and pool fixtures for the unit tests.
use crate::error::ErrorCode;
use crate::instructions;
use crate::instructions::swap::{preview_swap, SwapCalcResult};
use crate::states::events::Event;
use crate::states::pool::PoolState;
use crate::util::access_control::{AccessControl, FeeRegistry, PartnerRegistry, PositionNft};
use crate::util::system::Clock;
use crate::util::token::{Asset, Principal, TokenId, TokenRegistry};
use std::cell::Cell;
use std::collections::HashMap;

pub struct TestAccessControl {
    pub admin: Principal,
    pub protocol_paused: bool,
}

impl AccessControl for TestAccessControl {
    fn is_protocol_authority(&self, principal: &Principal) -> bool {
        *principal == self.admin
    }
    fn is_pool_create_authority(&self, _principal: &Principal) -> bool {
        true
    }
    fn is_protocol_fee_claim_authority(&self, principal: &Principal) -> bool {
        *principal == self.admin
    }
    fn allow_reset_initial_price(&self, principal: &Principal) -> bool {
        *principal == self.admin
    }
    fn allow_set_position_uri(&self, principal: &Principal) -> bool {
        *principal == self.admin
    }
    fn is_protocol_paused(&self) -> bool {
        self.protocol_paused
    }
}

pub struct TestFeeRegistry {
    pub tiers: HashMap<u32, u32>,
    pub protocol_fee_rate: u64,
}

impl FeeRegistry for TestFeeRegistry {
    fn fee_rate_for_spacing(&self, tick_spacing: u32) -> Option<u32> {
        self.tiers.get(&tick_spacing).copied()
    }
    fn protocol_fee_rate(&self) -> u64 {
        self.protocol_fee_rate
    }
}

#[derive(Default)]
pub struct TestPartnerRegistry {
    rates: HashMap<String, u64>,
    received: HashMap<String, u64>,
}

impl TestPartnerRegistry {
    pub fn set_rate(&mut self, name: &str, rate: u64) {
        self.rates.insert(name.to_string(), rate);
    }

    pub fn received(&self, name: &str) -> u64 {
        self.received.get(name).copied().unwrap_or(0)
    }
}

impl PartnerRegistry for TestPartnerRegistry {
    fn partner_ref_fee_rate(&self, name: &str) -> u64 {
        self.rates.get(name).copied().unwrap_or(0)
    }
    fn receive_ref_fee(&mut self, name: &str, asset: Asset) {
        *self.received.entry(name.to_string()).or_insert(0) += asset.amount();
        discard(asset);
    }
}

#[derive(Default)]
pub struct TestNft {
    holders: HashMap<(u64, u64), Principal>,
    collections: HashMap<u64, String>,
}

impl PositionNft for TestNft {
    fn create_collection(&mut self, pool_index: u64, collection_name: &str) {
        self.collections
            .insert(pool_index, collection_name.to_string());
    }
    fn mint(&mut self, owner: &Principal, pool_index: u64, position_index: u64) {
        self.holders.insert((pool_index, position_index), *owner);
    }
    fn burn(&mut self, pool_index: u64, position_index: u64) {
        self.holders.remove(&(pool_index, position_index));
    }
    fn position_name(&self, pool_index: u64, position_index: u64) -> String {
        format!("Pool {} Position {}", pool_index, position_index)
    }
    fn holder_of(&self, pool_index: u64, position_index: u64) -> Option<Principal> {
        self.holders.get(&(pool_index, position_index)).copied()
    }
}

pub struct TestTokenRegistry;

impl TokenRegistry for TestTokenRegistry {
    fn symbol(&self, token: TokenId) -> String {
        format!("TK{}", token.0[0])
    }
}

pub struct TestClock {
    now: Cell<u64>,
}

impl TestClock {
    pub fn advance(&self, seconds: u64) {
        self.now.set(self.now.get() + seconds);
    }
}

impl Clock for TestClock {
    fn now_seconds(&self) -> u64 {
        self.now.get()
    }
}

/// Consumes a must-use asset a test does not track further.
pub fn discard(asset: Asset) {
    let _ = asset.amount();
}

pub struct TestEnv {
    pub access_control: TestAccessControl,
    pub fee_registry: TestFeeRegistry,
    pub partners: TestPartnerRegistry,
    pub token_registry: TestTokenRegistry,
    pub nft: TestNft,
    pub clock: TestClock,
    pub events: Vec<Event>,
    pub admin: Principal,
    pub user: Principal,
    next_pool_index: u64,
}

impl TestEnv {
    pub fn new() -> Self {
        let admin = Principal::new([0xAA; 32]);
        let mut tiers = HashMap::new();
        tiers.insert(1, 1_000);
        tiers.insert(2, 500);
        tiers.insert(10, 2_500);
        tiers.insert(60, 10_000);
        tiers.insert(200, 20_000);
        TestEnv {
            access_control: TestAccessControl {
                admin,
                protocol_paused: false,
            },
            fee_registry: TestFeeRegistry {
                tiers,
                protocol_fee_rate: 0,
            },
            partners: TestPartnerRegistry::default(),
            token_registry: TestTokenRegistry,
            nft: TestNft::default(),
            clock: TestClock {
                now: Cell::new(1_700_000_000),
            },
            events: Vec::new(),
            admin,
            user: Principal::new([0xBB; 32]),
            next_pool_index: 1,
        }
    }

    pub fn new_pool(&mut self, tick_spacing: u32, sqrt_price_x64: u128) -> PoolState {
        let pool_index = self.next_pool_index;
        self.next_pool_index += 1;
        instructions::create_pool(
            &self.access_control,
            &self.fee_registry,
            &self.token_registry,
            &mut self.nft,
            &self.clock,
            &mut self.events,
            self.admin,
            pool_index,
            TokenId::new([1; 32]),
            TokenId::new([2; 32]),
            tick_spacing,
            sqrt_price_x64,
            String::new(),
        )
        .expect("test pool")
    }

    pub fn open_position(
        &mut self,
        pool: &mut PoolState,
        tick_lower_index: i32,
        tick_upper_index: i32,
    ) -> Result<u64, ErrorCode> {
        instructions::open_position(
            pool,
            &self.access_control,
            &mut self.nft,
            &mut self.events,
            self.user,
            tick_lower_index,
            tick_upper_index,
        )
    }

    pub fn close_position(
        &mut self,
        pool: &mut PoolState,
        position_index: u64,
    ) -> Result<(), ErrorCode> {
        instructions::close_position(
            pool,
            &self.access_control,
            &mut self.nft,
            &mut self.events,
            self.user,
            position_index,
        )
    }

    /// Adds liquidity and settles the receipt with freshly minted user funds.
    pub fn add_liquidity(
        &mut self,
        pool: &mut PoolState,
        position_index: u64,
        delta_liquidity: u128,
    ) -> Result<(u64, u64), ErrorCode> {
        let receipt = instructions::add_liquidity(
            pool,
            &self.access_control,
            &self.nft,
            &self.clock,
            &mut self.events,
            self.user,
            position_index,
            delta_liquidity,
        )?;
        let (amount_a, amount_b) = receipt.amounts();
        let (token_a, token_b) = (pool.token_a, pool.token_b);
        instructions::repay_add_liquidity(
            pool,
            Asset::new(token_a, amount_a),
            Asset::new(token_b, amount_b),
            receipt,
        )?;
        Ok((amount_a, amount_b))
    }

    pub fn remove_liquidity(
        &mut self,
        pool: &mut PoolState,
        position_index: u64,
        delta_liquidity: u128,
    ) -> Result<(u64, u64), ErrorCode> {
        let (asset_a, asset_b) = instructions::remove_liquidity(
            pool,
            &self.access_control,
            &self.nft,
            &self.clock,
            &mut self.events,
            self.user,
            position_index,
            delta_liquidity,
        )?;
        let amounts = (asset_a.amount(), asset_b.amount());
        discard(asset_a);
        discard(asset_b);
        Ok(amounts)
    }

    pub fn remove_all_liquidity(
        &mut self,
        pool: &mut PoolState,
        position_index: u64,
    ) -> Result<(), ErrorCode> {
        let liquidity = pool.position(position_index)?.liquidity;
        if liquidity > 0 {
            self.remove_liquidity(pool, position_index, liquidity)?;
        }
        Ok(())
    }

    /// Runs a flash swap end to end (execute, pay the debt, keep nothing) and
    /// returns the traversal details the committed swap was computed from.
    pub fn flash_swap(
        &mut self,
        pool: &mut PoolState,
        a_to_b: bool,
        by_amount_in: bool,
        amount: u64,
        sqrt_price_limit_x64: u128,
    ) -> Result<SwapCalcResult, ErrorCode> {
        self.flash_swap_with_partner(pool, "", a_to_b, by_amount_in, amount, sqrt_price_limit_x64)
    }

    pub fn flash_swap_with_partner(
        &mut self,
        pool: &mut PoolState,
        partner: &str,
        a_to_b: bool,
        by_amount_in: bool,
        amount: u64,
        sqrt_price_limit_x64: u128,
    ) -> Result<SwapCalcResult, ErrorCode> {
        let preview = preview_swap(
            pool,
            a_to_b,
            by_amount_in,
            amount,
            sqrt_price_limit_x64,
            self.fee_registry.protocol_fee_rate,
            self.partners.partner_ref_fee_rate(partner),
            self.clock.now_seconds(),
        )?;
        let (asset_a, asset_b, receipt) = instructions::flash_swap(
            pool,
            &self.access_control,
            &self.fee_registry,
            &self.partners,
            &self.clock,
            &mut self.events,
            self.user,
            partner,
            a_to_b,
            by_amount_in,
            amount,
            sqrt_price_limit_x64,
        )?;
        let pay_amount = receipt.pay_amount();
        let (token_in, zero_in, asset_out) = if a_to_b {
            (pool.token_a, asset_a, asset_b)
        } else {
            (pool.token_b, asset_b, asset_a)
        };
        zero_in.destroy_zero()?;
        discard(asset_out);
        let payment = Asset::new(token_in, pay_amount);
        let (repay_a, repay_b) = if a_to_b {
            (payment, Asset::zero(pool.token_b))
        } else {
            (Asset::zero(pool.token_a), payment)
        };
        instructions::repay_flash_swap(pool, &mut self.partners, repay_a, repay_b, receipt)?;
        Ok(preview)
    }

    /// Fixture shortcut: claims a slot and funds it without going through the
    /// authority and balance gates.
    pub fn init_reward(
        &mut self,
        pool: &mut PoolState,
        token: TokenId,
        emissions_per_second_x64: u128,
        vault: u64,
    ) {
        let slot = pool
            .reward_infos
            .iter_mut()
            .find(|slot| !slot.initialized())
            .expect("free reward slot");
        slot.token = token;
        slot.authority = self.admin;
        slot.emissions_per_second_x64 = emissions_per_second_x64;
        slot.vault = vault;
    }

    pub fn fund_reward(&mut self, pool: &mut PoolState, token: TokenId, amount: u64) {
        instructions::deposit_reward(pool, Asset::new(token, amount)).expect("reward slot");
    }
}
