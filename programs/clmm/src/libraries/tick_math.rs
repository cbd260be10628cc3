use crate::error::ErrorCode;
use crate::libraries::big_num::U256;

/// The minimum tick
pub const MIN_TICK: i32 = -443636;
/// The maximum tick
pub const MAX_TICK: i32 = -MIN_TICK;

/// The minimum value that can be returned from #get_sqrt_price_at_tick. Equivalent to get_sqrt_price_at_tick(MIN_TICK)
pub const MIN_SQRT_PRICE_X64: u128 = 4295048016;
/// The maximum value that can be returned from #get_sqrt_price_at_tick. Equivalent to get_sqrt_price_at_tick(MAX_TICK)
pub const MAX_SQRT_PRICE_X64: u128 = 79226673515401279992447579055;

const BIT_PRECISION: u32 = 14;

/// Calculates 1.0001^(tick/2) as a Q64.64 number representing
/// the square root of the ratio of the two assets (token_b/token_a).
///
/// The negative side multiplies Q64 factors `2^64 / 1.0001^(2^(i-1))`; the
/// positive side multiplies Q96 factors `2^96 * 1.0001^(2^(i-1))` and
/// normalises with a final `>> 32`, which keeps 64 fractional bits of
/// precision on both branches.
///
/// Throws if |tick| > MAX_TICK
pub fn get_sqrt_price_at_tick(tick: i32) -> Result<u128, ErrorCode> {
    let abs_tick = tick.unsigned_abs();
    if abs_tick > MAX_TICK as u32 {
        return Err(ErrorCode::InvalidTick);
    }
    if tick >= 0 {
        Ok(get_sqrt_price_at_positive_tick(abs_tick))
    } else {
        Ok(get_sqrt_price_at_negative_tick(abs_tick))
    }
}

fn get_sqrt_price_at_negative_tick(abs_tick: u32) -> u128 {
    // i = 0
    let mut ratio: u128 = if abs_tick & 0x1 != 0 {
        18445821805675392311
    } else {
        // 2^64
        18446744073709551616
    };
    // i = 1
    if abs_tick & 0x2 != 0 {
        ratio = (ratio * 18444899583751176498) >> 64
    };
    // i = 2
    if abs_tick & 0x4 != 0 {
        ratio = (ratio * 18443055278223354162) >> 64
    };
    // i = 3
    if abs_tick & 0x8 != 0 {
        ratio = (ratio * 18439367220385604838) >> 64
    };
    // i = 4
    if abs_tick & 0x10 != 0 {
        ratio = (ratio * 18431993317065449817) >> 64
    };
    // i = 5
    if abs_tick & 0x20 != 0 {
        ratio = (ratio * 18417254355718160513) >> 64
    };
    // i = 6
    if abs_tick & 0x40 != 0 {
        ratio = (ratio * 18387811781193591352) >> 64
    };
    // i = 7
    if abs_tick & 0x80 != 0 {
        ratio = (ratio * 18329067761203520168) >> 64
    };
    // i = 8
    if abs_tick & 0x100 != 0 {
        ratio = (ratio * 18212142134806087854) >> 64
    };
    // i = 9
    if abs_tick & 0x200 != 0 {
        ratio = (ratio * 17980523815641551639) >> 64
    };
    // i = 10
    if abs_tick & 0x400 != 0 {
        ratio = (ratio * 17526086738831147013) >> 64
    };
    // i = 11
    if abs_tick & 0x800 != 0 {
        ratio = (ratio * 16651378430235024244) >> 64
    };
    // i = 12
    if abs_tick & 0x1000 != 0 {
        ratio = (ratio * 15030750278693429944) >> 64
    };
    // i = 13
    if abs_tick & 0x2000 != 0 {
        ratio = (ratio * 12247334978882834399) >> 64
    };
    // i = 14
    if abs_tick & 0x4000 != 0 {
        ratio = (ratio * 8131365268884726200) >> 64
    };
    // i = 15
    if abs_tick & 0x8000 != 0 {
        ratio = (ratio * 3584323654723342297) >> 64
    };
    // i = 16
    if abs_tick & 0x10000 != 0 {
        ratio = (ratio * 696457651847595233) >> 64
    };
    // i = 17
    if abs_tick & 0x20000 != 0 {
        ratio = (ratio * 26294789957452057) >> 64
    };
    // i = 18
    if abs_tick & 0x40000 != 0 {
        ratio = (ratio * 37481735321082) >> 64
    };
    ratio
}

fn get_sqrt_price_at_positive_tick(abs_tick: u32) -> u128 {
    // i = 0
    let mut ratio: u128 = if abs_tick & 0x1 != 0 {
        79232123823359799118286999567
    } else {
        // 2^96
        79228162514264337593543950336
    };
    // i = 1
    if abs_tick & 0x2 != 0 {
        ratio = mul_shr_96(ratio, 79236085330515764027303304731)
    };
    // i = 2
    if abs_tick & 0x4 != 0 {
        ratio = mul_shr_96(ratio, 79244008939048815603706035061)
    };
    // i = 3
    if abs_tick & 0x8 != 0 {
        ratio = mul_shr_96(ratio, 79259858533276714757314932305)
    };
    // i = 4
    if abs_tick & 0x10 != 0 {
        ratio = mul_shr_96(ratio, 79291567232598584799939703904)
    };
    // i = 5
    if abs_tick & 0x20 != 0 {
        ratio = mul_shr_96(ratio, 79355022692464371645785046466)
    };
    // i = 6
    if abs_tick & 0x40 != 0 {
        ratio = mul_shr_96(ratio, 79482085999252804386437311141)
    };
    // i = 7
    if abs_tick & 0x80 != 0 {
        ratio = mul_shr_96(ratio, 79736823300114093921829183326)
    };
    // i = 8
    if abs_tick & 0x100 != 0 {
        ratio = mul_shr_96(ratio, 80248749790819932309965073892)
    };
    // i = 9
    if abs_tick & 0x200 != 0 {
        ratio = mul_shr_96(ratio, 81282483887344747381513967011)
    };
    // i = 10
    if abs_tick & 0x400 != 0 {
        ratio = mul_shr_96(ratio, 83390072131320151908154831281)
    };
    // i = 11
    if abs_tick & 0x800 != 0 {
        ratio = mul_shr_96(ratio, 87770609709833776024991924138)
    };
    // i = 12
    if abs_tick & 0x1000 != 0 {
        ratio = mul_shr_96(ratio, 97234110755111693312479820773)
    };
    // i = 13
    if abs_tick & 0x2000 != 0 {
        ratio = mul_shr_96(ratio, 119332217159966728226237229890)
    };
    // i = 14
    if abs_tick & 0x4000 != 0 {
        ratio = mul_shr_96(ratio, 179736315981702064433883588727)
    };
    // i = 15
    if abs_tick & 0x8000 != 0 {
        ratio = mul_shr_96(ratio, 407748233172238350107850275304)
    };
    // i = 16
    if abs_tick & 0x10000 != 0 {
        ratio = mul_shr_96(ratio, 2098478828474011932436660412517)
    };
    // i = 17
    if abs_tick & 0x20000 != 0 {
        ratio = mul_shr_96(ratio, 55581415166113811149459800483533)
    };
    // i = 18
    if abs_tick & 0x40000 != 0 {
        ratio = mul_shr_96(ratio, 38992368544603139932233054999993551)
    };
    ratio >> 32
}

// Q96 products of two ~2^115 factors need 256 bits
fn mul_shr_96(a: u128, b: u128) -> u128 {
    ((U256::from(a) * U256::from(b)) >> 96).as_u128()
}

/// Calculates the greatest tick value such that get_sqrt_price_at_tick(tick) <= sqrt_price_x64
/// Throws if sqrt_price_x64 is outside [MIN_SQRT_PRICE_X64, MAX_SQRT_PRICE_X64]
///
/// Formula: `i = log base(√1.0001) (√P)`
pub fn get_tick_at_sqrt_price(sqrt_price_x64: u128) -> Result<i32, ErrorCode> {
    if sqrt_price_x64 < MIN_SQRT_PRICE_X64 || sqrt_price_x64 > MAX_SQRT_PRICE_X64 {
        return Err(ErrorCode::InvalidSqrtPrice);
    }

    // Determine log_b(sqrt_ratio). First by calculating integer portion (msb)
    let msb: u32 = 128 - sqrt_price_x64.leading_zeros() - 1;
    let log2p_integer_x32 = (i128::from(msb) - 64) << 32;

    // get fractional value (r/2^msb), begin the iteration from bit 63 (0.5 in Q64.64)
    let mut bit: i128 = 0x8000_0000_0000_0000i128;
    let mut precision = 0;
    let mut log2p_fraction_x64 = 0;

    // Log2 iterative approximation for the fractional part
    // Go through each 2^(j) bit where j < 64 in a Q64.64 number
    // Append current bit value to fraction result if r^2 Q2.126 is more than 2
    let mut r = if msb >= 64 {
        sqrt_price_x64 >> (msb - 63)
    } else {
        sqrt_price_x64 << (63 - msb)
    };

    while bit > 0 && precision < BIT_PRECISION {
        r *= r;
        let is_r_more_than_two = (r >> 127) as u32;
        r >>= 63 + is_r_more_than_two;
        log2p_fraction_x64 += bit * i128::from(is_r_more_than_two);
        bit >>= 1;
        precision += 1;
    }
    let log2p_fraction_x32 = log2p_fraction_x64 >> 32;
    let log2p_x32 = log2p_integer_x32 + log2p_fraction_x32;

    // 14 bit refinement gives an error margin of 2^-14 / log2 (√1.0001) = 0.8461 < 1
    // Since tick is a decimal, an error under 1 is acceptable

    // Change of base rule: multiply with 2^32 / log2 (√1.0001)
    let log_sqrt_10001_x64 = log2p_x32 * 59543866431248i128;

    // tick - 0.01
    let tick_low = ((log_sqrt_10001_x64 - 184467440737095516i128) >> 64) as i32;

    // tick + (2^-14 / log2(√1.0001)) + 0.01
    let tick_high = ((log_sqrt_10001_x64 + 15793534762490258745i128) >> 64) as i32;

    Ok(if tick_low == tick_high {
        tick_low
    } else if get_sqrt_price_at_tick(tick_high)? <= sqrt_price_x64 {
        tick_high
    } else {
        tick_low
    })
}

/// A tick is usable as a position boundary iff it lies within the tick range
/// and is a multiple of the pool's tick spacing.
pub fn is_valid_tick(tick: i32, tick_spacing: u32) -> bool {
    tick >= MIN_TICK && tick <= MAX_TICK && tick % tick_spacing as i32 == 0
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    mod get_sqrt_price_at_tick_test {
        use super::*;

        #[test]
        fn check_get_sqrt_price_at_tick_at_min_or_max_tick() {
            assert_eq!(
                get_sqrt_price_at_tick(MIN_TICK).unwrap(),
                MIN_SQRT_PRICE_X64
            );
            assert_eq!(
                get_sqrt_price_at_tick(MAX_TICK).unwrap(),
                MAX_SQRT_PRICE_X64
            );
        }

        #[test]
        fn known_sqrt_prices() {
            // fixture ticks with independently computed Q64.64 square root prices
            for (tick, sqrt_price_x64) in [
                (-443636, 4295048016u128),
                (-435444, 6469134034u128),
                (-10, 18437523468038800957u128),
                (0, 18446744073709551616u128),
                (10, 18455969290605290427u128),
                (408332, 13561044167458152057771544136u128),
                (443636, 79226673515401279992447579055u128),
            ] {
                assert_eq!(get_sqrt_price_at_tick(tick).unwrap(), sqrt_price_x64);
                assert_eq!(get_tick_at_sqrt_price(sqrt_price_x64).unwrap(), tick);
            }
        }

        #[test]
        fn out_of_bound_ticks_rejected() {
            assert_eq!(
                get_sqrt_price_at_tick(MIN_TICK - 1),
                Err(ErrorCode::InvalidTick)
            );
            assert_eq!(
                get_sqrt_price_at_tick(MAX_TICK + 1),
                Err(ErrorCode::InvalidTick)
            );
        }
    }

    mod get_tick_at_sqrt_price_test {
        use super::*;

        #[test]
        fn out_of_bound_prices_rejected() {
            assert_eq!(
                get_tick_at_sqrt_price(MIN_SQRT_PRICE_X64 - 1),
                Err(ErrorCode::InvalidSqrtPrice)
            );
            assert_eq!(
                get_tick_at_sqrt_price(MAX_SQRT_PRICE_X64 + 1),
                Err(ErrorCode::InvalidSqrtPrice)
            );
        }

        #[test]
        fn round_trip_over_full_tick_range() {
            for tick in MIN_TICK..=MAX_TICK {
                let sqrt_price_x64 = get_sqrt_price_at_tick(tick).unwrap();
                assert_eq!(get_tick_at_sqrt_price(sqrt_price_x64).unwrap(), tick);
            }
        }
    }

    #[test]
    fn valid_tick_respects_spacing() {
        assert!(is_valid_tick(0, 10));
        assert!(is_valid_tick(-443630, 10));
        assert!(!is_valid_tick(15, 10));
        assert!(!is_valid_tick(MAX_TICK + 2, 2));
    }

    proptest! {
        #[test]
        fn tick_is_greatest_below_price(
            sqrt_price_x64 in MIN_SQRT_PRICE_X64..=MAX_SQRT_PRICE_X64
        ) {
            let tick = get_tick_at_sqrt_price(sqrt_price_x64).unwrap();
            prop_assert!(get_sqrt_price_at_tick(tick).unwrap() <= sqrt_price_x64);
            if tick < MAX_TICK {
                prop_assert!(sqrt_price_x64 < get_sqrt_price_at_tick(tick + 1).unwrap());
            }
        }

        #[test]
        fn sqrt_price_is_monotonic(tick in MIN_TICK..MAX_TICK) {
            prop_assert!(
                get_sqrt_price_at_tick(tick).unwrap() < get_sqrt_price_at_tick(tick + 1).unwrap()
            );
        }
    }
}
