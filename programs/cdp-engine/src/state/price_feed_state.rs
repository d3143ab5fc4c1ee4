use anchor_lang::prelude::*;
use pyth_solana_receiver_sdk::price_update::{Price, PriceUpdateV2};

use crate::{
    constants::TARGET_DECIMAL_PRECISION, errors::PriceFeedError, events::PriceUpdated,
    math::to_u64,
};

#[account]
#[derive(InitSpace, Default)]
pub struct PriceFeedState {
    pub pool_state: Pubkey,
    pub authority: Pubkey,
    pub pyth_feed_account: Pubkey,
    pub last_good_price: u64,
    pub bump: u8,
}

impl PriceFeedState {
    pub fn require_authority(&self, signer: &Pubkey) -> Result<()> {
        require_keys_eq!(*signer, self.authority, PriceFeedError::InvalidSigner);
        Ok(())
    }

    pub fn set_price(&mut self, new_price: u64) -> Result<u64> {
        require!(new_price > 0, PriceFeedError::ZeroPrice);
        self.last_good_price = new_price;
        emit!(PriceUpdated { price: new_price });
        Ok(new_price)
    }

    /// Pulls the latest price out of a Pyth price update and stores it.
    pub fn fetch_price(&mut self, pyth_feed_account: &PriceUpdateV2) -> Result<u64> {
        let pyth_price_message = pyth_feed_account
            .get_price_unchecked(&pyth_feed_account.price_message.feed_id)
            .map_err(|_| PriceFeedError::InvalidPythPrice)?;
        let price = normalize_pyth_price(&pyth_price_message)?;
        self.set_price(price)
    }

    /// Price held fixed for the duration of one instruction.
    pub fn get_price(&self) -> Result<u64> {
        require!(self.last_good_price > 0, PriceFeedError::ZeroPrice);
        Ok(self.last_good_price)
    }
}

/// Converts a Pyth `price * 10^exponent` into `TARGET_DECIMAL_PRECISION` fixed point.
pub fn normalize_pyth_price(msg: &Price) -> Result<u64> {
    require!(msg.price > 0, PriceFeedError::InvalidPythPrice);
    let price = msg.price as u128;
    let target = TARGET_DECIMAL_PRECISION as u128;

    let normalized = if msg.exponent >= 0 {
        let factor = 10u128
            .checked_pow(msg.exponent as u32)
            .ok_or(PriceFeedError::InvalidPythPrice)?;
        price
            .checked_mul(factor)
            .and_then(|p| p.checked_mul(target))
            .ok_or(PriceFeedError::InvalidPythPrice)?
    } else {
        let divisor = 10u128
            .checked_pow(msg.exponent.unsigned_abs())
            .ok_or(PriceFeedError::InvalidPythPrice)?;
        price
            .checked_mul(target)
            .ok_or(PriceFeedError::InvalidPythPrice)?
            / divisor
    };
    require!(normalized > 0, PriceFeedError::ZeroPrice);
    to_u64(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::assert_error_code;

    fn load_price_message(price: i64, exponent: i32) -> Price {
        Price {
            price,
            conf: 1,
            exponent,
            publish_time: 1,
        }
    }

    #[test]
    fn normalize_pyth_price_test() {
        // 130.12345678 with 8 decimals
        let msg = load_price_message(13_012_345_678, -8);
        assert_eq!(normalize_pyth_price(&msg).unwrap(), 130_123_456_780);

        let msg = load_price_message(2, 1);
        assert_eq!(normalize_pyth_price(&msg).unwrap(), 20 * TARGET_DECIMAL_PRECISION);

        let msg = load_price_message(1, -12);
        assert_error_code(normalize_pyth_price(&msg), PriceFeedError::ZeroPrice);

        let msg = load_price_message(-5, -8);
        assert_error_code(normalize_pyth_price(&msg), PriceFeedError::InvalidPythPrice);
    }

    #[test]
    fn set_price_rejects_zero() {
        let mut feed = PriceFeedState::default();
        assert!(feed.get_price().is_err());
        assert_error_code(feed.set_price(0), PriceFeedError::ZeroPrice);
        assert_eq!(feed.set_price(150).unwrap(), 150);
        assert_eq!(feed.get_price().unwrap(), 150);
    }

    #[test]
    fn only_authority_sets_price() {
        let feed = PriceFeedState {
            authority: Pubkey::new_unique(),
            ..Default::default()
        };
        assert!(feed.require_authority(&feed.authority.clone()).is_ok());
        assert_error_code(
            feed.require_authority(&Pubkey::new_unique()),
            PriceFeedError::InvalidSigner,
        );
    }
}
