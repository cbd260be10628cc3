//! Opaque identities and the linear `Asset` value that moves token amounts
//! between the pool vaults and the outside world.
use crate::error::ErrorCode;
use std::fmt;

/// Opaque identifier of a fungible token, resolved by the token registry
/// collaborator.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TokenId(pub [u8; 32]);

impl TokenId {
    pub const ZERO: TokenId = TokenId([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        TokenId(bytes)
    }
}

impl fmt::Debug for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenId({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

/// Opaque identifier of an account able to sign operations.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Principal(pub [u8; 32]);

impl Principal {
    pub fn new(bytes: [u8; 32]) -> Self {
        Principal(bytes)
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Principal({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

/// Resolves token metadata; provided by the hosting runtime.
pub trait TokenRegistry {
    fn symbol(&self, token: TokenId) -> String;
}

/// An amount of one token in flight. The value is linear: it is created by a
/// withdrawal (or by the host to represent user funds), and it disappears
/// only by being deposited, split down to zero and destroyed.
#[must_use = "assets carry funds and must be deposited or destroyed"]
#[derive(Debug, PartialEq, Eq)]
pub struct Asset {
    token: TokenId,
    amount: u64,
}

impl Asset {
    pub fn new(token: TokenId, amount: u64) -> Self {
        Asset { token, amount }
    }

    pub fn zero(token: TokenId) -> Self {
        Asset { token, amount: 0 }
    }

    pub fn token(&self) -> TokenId {
        self.token
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    /// Splits `amount` off into a new asset.
    pub fn extract(&mut self, amount: u64) -> Result<Asset, ErrorCode> {
        self.amount = self
            .amount
            .checked_sub(amount)
            .ok_or(ErrorCode::AmountIncorrect)?;
        Ok(Asset {
            token: self.token,
            amount,
        })
    }

    /// Consumes an asset that must hold nothing.
    pub fn destroy_zero(self) -> Result<(), ErrorCode> {
        if self.amount != 0 {
            return Err(ErrorCode::AmountIncorrect);
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn extract_splits_and_preserves_total() {
        let mut asset = Asset::new(TokenId::ZERO, 100);
        let part = asset.extract(40).unwrap();
        assert_eq!(part.amount(), 40);
        assert_eq!(asset.amount(), 60);
        assert_eq!(asset.extract(61), Err(ErrorCode::AmountIncorrect));
    }

    #[test]
    fn only_empty_assets_can_be_destroyed() {
        let mut asset = Asset::new(TokenId::ZERO, 1);
        let rest = asset.extract(1).unwrap();
        assert!(asset.destroy_zero().is_ok());
        assert_eq!(rest.destroy_zero(), Err(ErrorCode::AmountIncorrect));
    }
}
