use anchor_lang::prelude::*;

use crate::{
    errors::CollSurplusError,
    math::{safe_add, safe_sub},
};

use super::Trove;

/// Collateral owed to owners of troves closed by a capped liquidation or a full
/// redemption. Per-owner balances live on the trove; this holds the pool total.
#[account]
#[derive(InitSpace, Default, Debug, PartialEq, Eq)]
pub struct CollSurplusPool {
    pub pool_state: Pubkey,
    pub total_surplus: u64,
}

impl CollSurplusPool {
    pub fn init(&mut self, pool_state: Pubkey) {
        self.pool_state = pool_state;
        self.total_surplus = 0;
    }

    /// Credits `amount` to the trove owner's claimable balance. Never overwrites.
    pub fn account_surplus(&mut self, trove: &mut Trove, amount: u64) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        trove.account_surplus(amount)?;
        self.total_surplus = safe_add(self.total_surplus, amount)?;
        Ok(())
    }

    /// Zeroes the owner's balance and returns the amount to pay out.
    pub fn claim_coll(&mut self, trove: &mut Trove) -> Result<u64> {
        let amount = trove.clear_surplus()?;
        require!(
            amount <= self.total_surplus,
            CollSurplusError::NoCollAvailableToClaim
        );
        self.total_surplus = safe_sub(self.total_surplus, amount)?;
        Ok(amount)
    }
}
