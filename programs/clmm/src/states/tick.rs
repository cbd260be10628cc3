//! Tick records and the table that owns them together with the bit
//! directory, so that "bit set" and "record present" can never diverge.
use crate::error::ErrorCode;
use crate::libraries::{liquidity_math, tick_math};
use crate::states::pool::{RewardInfo, REWARD_NUM};
use crate::states::tick_bitmap::TickBitmap;
use std::collections::BTreeMap;

/// State of a single initialized price tick
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickState {
    /// The price tick
    pub tick: i32,

    /// The cached Q64.64 sqrt price at `tick`
    pub sqrt_price_x64: u128,

    /// Amount of net liquidity added (subtracted) when tick is crossed from left to right (right to left)
    pub liquidity_net: i128,
    /// The total position liquidity that references this tick
    pub liquidity_gross: u128,

    /// Fee growth per unit of liquidity on the _other_ side of this tick (relative to the current tick)
    /// only has relative meaning, not absolute — the value depends on when the tick is initialized
    pub fee_growth_outside_a_x64: u128,
    pub fee_growth_outside_b_x64: u128,

    /// Array of Q64.64
    pub reward_growths_outside_x64: [u128; REWARD_NUM],
}

impl TickState {
    fn new(
        tick: i32,
        tick_current: i32,
        fee_growth_global_a_x64: u128,
        fee_growth_global_b_x64: u128,
        reward_growths_x64: [u128; REWARD_NUM],
    ) -> Result<Self, ErrorCode> {
        let mut state = TickState {
            tick,
            sqrt_price_x64: tick_math::get_sqrt_price_at_tick(tick)?,
            ..Default::default()
        };
        // by convention, all growth before a tick was initialized happened
        // below the tick
        if tick <= tick_current {
            state.fee_growth_outside_a_x64 = fee_growth_global_a_x64;
            state.fee_growth_outside_b_x64 = fee_growth_global_b_x64;
            state.reward_growths_outside_x64 = reward_growths_x64;
        }
        Ok(state)
    }

    /// Updates the tick for a liquidity change at one of its position
    /// endpoints. When the lower (upper) tick is crossed left to right
    /// (right to left), liquidity must be added (removed), hence the sign of
    /// `liquidity_net` per endpoint side.
    pub fn update(&mut self, liquidity_delta: i128, upper: bool) -> Result<(), ErrorCode> {
        self.liquidity_gross = liquidity_math::add_delta(self.liquidity_gross, liquidity_delta)?;
        self.liquidity_net = if upper {
            self.liquidity_net.checked_sub(liquidity_delta)
        } else {
            self.liquidity_net.checked_add(liquidity_delta)
        }
        .ok_or(ErrorCode::LiquidityOverflow)?;
        Ok(())
    }

    /// Transitions this tick as the price moves across it, returning the
    /// liquidity delta to apply (positive when crossing left to right).
    ///
    /// The growth-outside accumulators flip to `global - outside`; the
    /// subtraction wraps by design, differences modulo 2^128 stay exact.
    pub fn cross(
        &mut self,
        fee_growth_global_a_x64: u128,
        fee_growth_global_b_x64: u128,
        reward_infos: &[RewardInfo; REWARD_NUM],
    ) -> i128 {
        self.fee_growth_outside_a_x64 =
            fee_growth_global_a_x64.wrapping_sub(self.fee_growth_outside_a_x64);
        self.fee_growth_outside_b_x64 =
            fee_growth_global_b_x64.wrapping_sub(self.fee_growth_outside_b_x64);

        for i in 0..REWARD_NUM {
            if !reward_infos[i].initialized() {
                continue;
            }
            self.reward_growths_outside_x64[i] = reward_infos[i]
                .growth_global_x64
                .wrapping_sub(self.reward_growths_outside_x64[i]);
        }

        self.liquidity_net
    }

    pub fn is_initialized(&self) -> bool {
        self.liquidity_gross != 0
    }
}

/// Retrieves the all time fee growth per unit of liquidity, inside a
/// position's tick boundaries.
///
/// Calculates `fr = fg - f_below(lower) - f_above(upper)`. A boundary tick
/// without a record behaves as if it were initialized right now, which makes
/// the first refresh of a new position well defined. All subtractions wrap.
pub fn get_fee_growth_inside(
    tick_lower: Option<&TickState>,
    tick_upper: Option<&TickState>,
    tick_lower_index: i32,
    tick_upper_index: i32,
    tick_current: i32,
    fee_growth_global_a_x64: u128,
    fee_growth_global_b_x64: u128,
) -> (u128, u128) {
    let (lower_outside_a, lower_outside_b) = fee_outside_or_seed(
        tick_lower,
        tick_lower_index,
        tick_current,
        fee_growth_global_a_x64,
        fee_growth_global_b_x64,
    );
    let (upper_outside_a, upper_outside_b) = fee_outside_or_seed(
        tick_upper,
        tick_upper_index,
        tick_current,
        fee_growth_global_a_x64,
        fee_growth_global_b_x64,
    );

    // calculate fee growth below
    let (fee_growth_below_a_x64, fee_growth_below_b_x64) = if tick_current >= tick_lower_index {
        (lower_outside_a, lower_outside_b)
    } else {
        (
            fee_growth_global_a_x64.wrapping_sub(lower_outside_a),
            fee_growth_global_b_x64.wrapping_sub(lower_outside_b),
        )
    };

    // calculate fee growth above
    let (fee_growth_above_a_x64, fee_growth_above_b_x64) = if tick_current < tick_upper_index {
        (upper_outside_a, upper_outside_b)
    } else {
        (
            fee_growth_global_a_x64.wrapping_sub(upper_outside_a),
            fee_growth_global_b_x64.wrapping_sub(upper_outside_b),
        )
    };

    (
        fee_growth_global_a_x64
            .wrapping_sub(fee_growth_below_a_x64)
            .wrapping_sub(fee_growth_above_a_x64),
        fee_growth_global_b_x64
            .wrapping_sub(fee_growth_below_b_x64)
            .wrapping_sub(fee_growth_above_b_x64),
    )
}

/// Calculates the reward growths inside of tick_lower and tick_upper based on
/// their positions relative to tick_current, with the same wrapping and
/// missing-record conventions as `get_fee_growth_inside`.
pub fn get_reward_growths_inside(
    tick_lower: Option<&TickState>,
    tick_upper: Option<&TickState>,
    tick_lower_index: i32,
    tick_upper_index: i32,
    tick_current: i32,
    reward_infos: &[RewardInfo; REWARD_NUM],
) -> [u128; REWARD_NUM] {
    let mut reward_growths_inside = [0; REWARD_NUM];

    for i in 0..REWARD_NUM {
        if !reward_infos[i].initialized() {
            continue;
        }
        let global = reward_infos[i].growth_global_x64;
        let lower_outside = reward_outside_or_seed(tick_lower, tick_lower_index, tick_current, i, global);
        let upper_outside = reward_outside_or_seed(tick_upper, tick_upper_index, tick_current, i, global);

        let reward_growths_below = if tick_current >= tick_lower_index {
            lower_outside
        } else {
            global.wrapping_sub(lower_outside)
        };

        let reward_growths_above = if tick_current < tick_upper_index {
            upper_outside
        } else {
            global.wrapping_sub(upper_outside)
        };

        reward_growths_inside[i] = global
            .wrapping_sub(reward_growths_below)
            .wrapping_sub(reward_growths_above);
    }

    reward_growths_inside
}

fn fee_outside_or_seed(
    tick: Option<&TickState>,
    tick_index: i32,
    tick_current: i32,
    fee_growth_global_a_x64: u128,
    fee_growth_global_b_x64: u128,
) -> (u128, u128) {
    match tick {
        Some(tick) => (tick.fee_growth_outside_a_x64, tick.fee_growth_outside_b_x64),
        None => {
            if tick_index <= tick_current {
                (fee_growth_global_a_x64, fee_growth_global_b_x64)
            } else {
                (0, 0)
            }
        }
    }
}

fn reward_outside_or_seed(
    tick: Option<&TickState>,
    tick_index: i32,
    tick_current: i32,
    slot: usize,
    growth_global_x64: u128,
) -> u128 {
    match tick {
        Some(tick) => tick.reward_growths_outside_x64[slot],
        None => {
            if tick_index <= tick_current {
                growth_global_x64
            } else {
                0
            }
        }
    }
}

/// Common checks for a valid tick input.
/// A tick is valid iff it lies within tick boundaries and it is a multiple
/// of tick spacing.
pub fn check_tick_boundary(tick: i32, tick_spacing: u32) -> Result<(), ErrorCode> {
    if !tick_math::is_valid_tick(tick, tick_spacing) {
        return Err(ErrorCode::InvalidTick);
    }
    Ok(())
}

/// The lower tick must be below the upper tick.
pub fn check_ticks_order(tick_lower_index: i32, tick_upper_index: i32) -> Result<(), ErrorCode> {
    if tick_lower_index >= tick_upper_index {
        return Err(ErrorCode::InvalidTick);
    }
    Ok(())
}

/// The pool's tick records plus the bit directory over them. All mutation
/// goes through this table so a set bit and a live record stay in lockstep.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickTable {
    tick_spacing: u32,
    ticks: BTreeMap<i32, TickState>,
    bitmap: TickBitmap,
}

impl TickTable {
    pub fn new(tick_spacing: u32) -> Self {
        TickTable {
            tick_spacing,
            ticks: BTreeMap::new(),
            bitmap: TickBitmap::default(),
        }
    }

    pub fn tick_spacing(&self) -> u32 {
        self.tick_spacing
    }

    pub fn get(&self, tick: i32) -> Option<&TickState> {
        self.ticks.get(&tick)
    }

    pub fn get_mut(&mut self, tick: i32) -> Option<&mut TickState> {
        self.ticks.get_mut(&tick)
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    /// Applies a liquidity change to both endpoints of a position range,
    /// creating records (and directory bits) on first use and dropping them
    /// when `liquidity_gross` returns to zero.
    pub fn modify(
        &mut self,
        tick_lower_index: i32,
        tick_upper_index: i32,
        liquidity_delta: i128,
        tick_current: i32,
        fee_growth_global_a_x64: u128,
        fee_growth_global_b_x64: u128,
        reward_growths_x64: [u128; REWARD_NUM],
    ) -> Result<(), ErrorCode> {
        for (tick_index, upper) in [(tick_lower_index, false), (tick_upper_index, true)] {
            if !self.ticks.contains_key(&tick_index) {
                if liquidity_delta <= 0 {
                    // removing liquidity from a tick that has no record
                    return Err(ErrorCode::InvariantViolated);
                }
                let state = TickState::new(
                    tick_index,
                    tick_current,
                    fee_growth_global_a_x64,
                    fee_growth_global_b_x64,
                    reward_growths_x64,
                )?;
                self.ticks.insert(tick_index, state);
                let offset = self.offset(tick_index);
                self.bitmap.set(offset);
            }
            let tick = self
                .ticks
                .get_mut(&tick_index)
                .ok_or(ErrorCode::InvariantViolated)?;
            tick.update(liquidity_delta, upper)?;
            if !tick.is_initialized() {
                self.ticks.remove(&tick_index);
                let offset = self.offset(tick_index);
                self.bitmap.clear(offset);
            }
        }
        Ok(())
    }

    /// The next initialized tick from `tick_current` in the swap direction:
    /// at or below the current tick for a-to-b, strictly above it for b-to-a.
    pub fn next_initialized_tick(&self, tick_current: i32, a_to_b: bool) -> Option<&TickState> {
        let offset = self.signed_offset(tick_current);
        let found = if a_to_b {
            self.bitmap.next_set_bit_le(offset)
        } else {
            self.bitmap.next_set_bit_ge(offset + 1)
        }?;
        let tick_index = self.tick_at_offset(found);
        self.ticks.get(&tick_index)
    }

    fn min_aligned_tick(&self) -> i32 {
        -((tick_math::MAX_TICK / self.tick_spacing as i32) * self.tick_spacing as i32)
    }

    fn offset(&self, tick: i32) -> u32 {
        debug_assert!(tick % self.tick_spacing as i32 == 0);
        ((tick - self.min_aligned_tick()) / self.tick_spacing as i32) as u32
    }

    /// Offset of the greatest aligned tick at or below `tick`; negative when
    /// `tick` lies below the least aligned tick.
    fn signed_offset(&self, tick: i32) -> i64 {
        (tick as i64 - self.min_aligned_tick() as i64).div_euclid(self.tick_spacing as i64)
    }

    fn tick_at_offset(&self, offset: u32) -> i32 {
        self.min_aligned_tick() + offset as i32 * self.tick_spacing as i32
    }
}
