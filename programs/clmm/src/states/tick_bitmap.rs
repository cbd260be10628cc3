//! Sparse directory over the initialized ticks of a pool.
//!
//! The aligned tick indices of a pool are shifted to start at zero and packed
//! into 1000-bit groups; each group is held in one `U1024` word keyed by its
//! group number. A bit is set iff a tick record exists at the corresponding
//! index, which gives O(1) per-bit next-set queries inside a group and an
//! ordered walk across allocated groups otherwise.
use crate::libraries::big_num::U1024;
use std::collections::BTreeMap;

/// Number of tick offsets tracked per directory group
pub const TICK_GROUP_SIZE: u32 = 1000;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickBitmap {
    groups: BTreeMap<i64, U1024>,
}

impl TickBitmap {
    pub fn set(&mut self, offset: u32) {
        let (group, bit) = Self::locate(offset);
        let word = self.groups.entry(group).or_insert_with(U1024::zero);
        *word = *word | (U1024::one() << bit);
    }

    pub fn clear(&mut self, offset: u32) {
        let (group, bit) = Self::locate(offset);
        if let Some(word) = self.groups.get_mut(&group) {
            *word = *word & !(U1024::one() << bit);
            // all-zero groups are reclaimed so directory walks skip them
            if word.is_zero() {
                self.groups.remove(&group);
            }
        }
    }

    pub fn is_set(&self, offset: u32) -> bool {
        let (group, bit) = Self::locate(offset);
        self.groups
            .get(&group)
            .map(|word| !(*word & (U1024::one() << bit)).is_zero())
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Greatest set bit at or below `from`, the a-to-b search direction.
    pub fn next_set_bit_le(&self, from: i64) -> Option<u32> {
        if from < 0 {
            return None;
        }
        let (group, bit) = Self::locate(from as u32);
        if let Some(word) = self.groups.get(&group) {
            let masked = *word & ((U1024::one() << (bit + 1)) - U1024::one());
            if !masked.is_zero() {
                return Some(Self::offset_at(group, masked.bits() as u32 - 1));
            }
        }
        self.groups
            .range(..group)
            .rev()
            .find(|(_, word)| !word.is_zero())
            .map(|(group, word)| Self::offset_at(*group, word.bits() as u32 - 1))
    }

    /// Least set bit at or above `from`, the b-to-a search direction.
    pub fn next_set_bit_ge(&self, from: i64) -> Option<u32> {
        let from = from.max(0);
        let (group, bit) = Self::locate(from as u32);
        if let Some(word) = self.groups.get(&group) {
            let masked = *word >> bit;
            if !masked.is_zero() {
                return Some(from as u32 + masked.trailing_zeros() as u32);
            }
        }
        self.groups
            .range(group + 1..)
            .find(|(_, word)| !word.is_zero())
            .map(|(group, word)| Self::offset_at(*group, word.trailing_zeros() as u32))
    }

    fn locate(offset: u32) -> (i64, usize) {
        (
            (offset / TICK_GROUP_SIZE) as i64,
            (offset % TICK_GROUP_SIZE) as usize,
        )
    }

    fn offset_at(group: i64, bit: u32) -> u32 {
        group as u32 * TICK_GROUP_SIZE + bit
    }
}
