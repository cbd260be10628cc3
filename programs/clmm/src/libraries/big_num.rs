//! Wide unsigned integers used throughout the math kit.
//!
//! `U128` is kept distinct from the native `u128` so that the widening
//! mul-div helpers can move between widths without intermediate casts.
use uint::construct_uint;

construct_uint! {
    pub struct U128(2);
}

construct_uint! {
    pub struct U256(4);
}

construct_uint! {
    pub struct U512(8);
}

construct_uint! {
    pub struct U1024(16);
}
