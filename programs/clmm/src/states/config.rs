//! Rate denominators and protocol-wide bounds. Runtime configuration (fee
//! tiers, authorities, partner rates) reaches the engine through the
//! collaborator traits in `util`.

/// Denominator of the pool trade fee, in hundredths of a bip (10^-6)
pub const FEE_RATE_DENOMINATOR_VALUE: u32 = 1_000_000;

/// Upper bound of the pool trade fee: 20%
pub const MAX_FEE_RATE: u32 = 200_000;

/// Denominator of the protocol share of the trade fee
pub const PROTOCOL_FEE_RATE_DENOMINATOR: u64 = 10_000;

/// Denominator of the partner share of the protocol fee
pub const PARTNER_FEE_RATE_DENOMINATOR: u64 = 10_000;
