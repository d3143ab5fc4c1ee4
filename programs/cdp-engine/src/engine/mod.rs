//! Per-asset accounting engine.
//!
//! Instruction handlers hydrate an [`AssetPool`] from the accounts they were given,
//! run one engine operation and write the touched state back. Tests drive the same
//! operations directly.

use std::collections::BTreeMap;

use anchor_lang::prelude::*;

use crate::{
    math::compute_cr,
    state::{CollSurplusPool, EpochScale, PoolState, StabilityPoolState, Trove},
};

pub mod borrower_operations;
pub mod liquidation;
pub mod redemption;
pub mod sorted_troves;
pub mod stability_pool;
pub mod trove_book;

#[cfg(test)]
pub mod test_utils;

pub use borrower_operations::*;
pub use redemption::*;
pub use stability_pool::*;
pub use trove_book::*;

/// Everything one collateral asset's accounting touches.
#[derive(Clone, Debug)]
pub struct AssetPool {
    pub pool_key: Pubkey,
    pub pool_state: PoolState,
    pub sp_state: StabilityPoolState,
    /// Running `S` sums by `(epoch, scale)`. A missing entry is zero.
    pub epoch_scales: BTreeMap<(u128, u128), EpochScale>,
    pub coll_surplus_pool: CollSurplusPool,
    pub book: TroveBook,
}

impl AssetPool {
    pub fn new(
        pool_key: Pubkey,
        pool_state: PoolState,
        sp_state: StabilityPoolState,
        coll_surplus_pool: CollSurplusPool,
        book: TroveBook,
    ) -> Self {
        Self {
            pool_key,
            pool_state,
            sp_state,
            epoch_scales: BTreeMap::new(),
            coll_surplus_pool,
            book,
        }
    }

    /// Runs `op` against a draft and keeps its changes only if it succeeds.
    pub fn atomically<T>(&mut self, op: impl FnOnce(&mut AssetPool) -> Result<T>) -> Result<T> {
        let mut draft = self.clone();
        let out = op(&mut draft)?;
        *self = draft;
        Ok(out)
    }

    pub fn epoch_scale(&self, epoch: u128, scale: u128) -> EpochScale {
        self.epoch_scales
            .get(&(epoch, scale))
            .cloned()
            .unwrap_or_default()
    }

    pub fn current_epoch_scale_key(&self) -> (u128, u128) {
        (self.sp_state.current_epoch, self.sp_state.current_scale)
    }

    pub fn check_recovery_mode(&self, price: u64) -> Result<bool> {
        self.pool_state.check_recovery_mode(price)
    }

    pub fn get_tcr(&self, price: u64) -> Result<u64> {
        self.pool_state.get_tcr(price)
    }

    pub fn get_entire_system_coll(&self) -> Result<u64> {
        self.pool_state.get_entire_coll()
    }

    pub fn get_entire_system_debt(&self) -> Result<u64> {
        self.pool_state.get_entire_debt()
    }

    /// ICR including unapplied redistribution rewards. An unknown owner has no debt.
    pub fn get_current_icr(&self, owner: &Pubkey, price: u64) -> Result<u64> {
        match self.book.get(owner) {
            Some(trove) => trove.get_current_icr(&self.pool_state, price),
            None => Ok(compute_cr(0, 0, price).unwrap_or(u64::MAX)),
        }
    }

    pub fn get_nominal_icr(&self, owner: &Pubkey) -> Result<u64> {
        self.book.trove(owner)?.get_nominal_icr(&self.pool_state)
    }

    pub fn get_pending_coll_reward(&self, owner: &Pubkey) -> Result<u64> {
        self.book
            .get(owner)
            .map_or(Ok(0), |t| t.get_pending_coll_reward(&self.pool_state))
    }

    pub fn get_pending_debt_reward(&self, owner: &Pubkey) -> Result<u64> {
        self.book
            .get(owner)
            .map_or(Ok(0), |t| t.get_pending_debt_reward(&self.pool_state))
    }

    pub fn get_entire_debt_and_coll(&self, owner: &Pubkey) -> Result<(u64, u64, u64, u64)> {
        match self.book.get(owner) {
            Some(trove) => trove.get_entire_debt_coll(&self.pool_state),
            None => Ok((0, 0, 0, 0)),
        }
    }

    /// Loads `owner`'s trove, creating an empty one for an owner never seen before.
    pub(crate) fn trove_entry(&mut self, owner: Pubkey) -> &mut Trove {
        self.book.entry(self.pool_key, owner)
    }
}
