use std::cmp;

use anchor_lang::prelude::*;

use crate::{
    errors::StabilityPoolError,
    events::{CollGainWithdrawn, UserDepositChanged},
    math::{safe_add, safe_sub},
    state::StabilityPoolDeposit,
};

use super::AssetPool;

impl AssetPool {
    /// Compounded deposit of `deposit` against the current product `P`.
    pub fn get_compounded_deposit(&self, deposit: &StabilityPoolDeposit) -> Result<u64> {
        deposit.get_compounded_deposit(&self.sp_state)
    }

    /// Collateral gained since the deposit's last snapshot, not yet moved to
    /// `claimable_coll`.
    pub fn get_depositor_coll_gain(&self, deposit: &StabilityPoolDeposit) -> Result<u64> {
        let first = self.epoch_scale(deposit.snapshots_epoch, deposit.snapshots_scale);
        let second = self.epoch_scale(deposit.snapshots_epoch, deposit.snapshots_scale + 1);
        deposit.get_depositor_coll_gain(&first, &second)
    }

    pub fn provide_to_sp(&mut self, deposit: &mut StabilityPoolDeposit, amount: u64) -> Result<()> {
        self.atomically(|pool| {
            let mut draft = deposit.clone();
            require!(amount > 0, StabilityPoolError::ZeroAmount);

            let compounded = pool.realize_deposit(&mut draft)?;
            pool.sp_state.increase_debt(amount)?;
            pool.snapshot_deposit(&mut draft, safe_add(compounded, amount)?);

            *deposit = draft;
            Ok(())
        })
    }

    /// Withdraws up to `amount` of the compounded deposit and returns what was taken.
    /// Blocked while the riskiest trove is below MCR; that trove must be loaded.
    pub fn withdraw_from_sp(
        &mut self,
        deposit: &mut StabilityPoolDeposit,
        amount: u64,
        price: u64,
    ) -> Result<u64> {
        self.atomically(|pool| {
            let mut draft = deposit.clone();
            draft.require_user_has_deposit()?;
            if let Some(last) = pool.book.last(&pool.pool_state) {
                let icr = pool
                    .book
                    .trove(&last)?
                    .get_current_icr(&pool.pool_state, price)?;
                require!(icr >= pool.pool_state.mcr, StabilityPoolError::TroveUnderColl);
            }

            let compounded = pool.realize_deposit(&mut draft)?;
            let withdrawn = cmp::min(amount, compounded);
            pool.sp_state.decrease_debt(withdrawn)?;
            pool.snapshot_deposit(&mut draft, safe_sub(compounded, withdrawn)?);

            *deposit = draft;
            Ok(withdrawn)
        })
    }

    /// Moves the depositor's pending gain into `claimable_coll` and pays all of it out.
    pub fn claim_from_sp(&mut self, deposit: &mut StabilityPoolDeposit) -> Result<u64> {
        self.atomically(|pool| {
            let mut draft = deposit.clone();
            let compounded = pool.realize_deposit(&mut draft)?;
            pool.snapshot_deposit(&mut draft, compounded);

            let amount = draft.claimable_coll;
            require!(amount > 0, StabilityPoolError::ZeroAmount);
            draft.claimable_coll = 0;

            *deposit = draft;
            Ok(amount)
        })
    }

    /// Credits the collateral gain to `claimable_coll` and returns the compounded
    /// deposit. The caller must re-snapshot the deposit afterwards.
    fn realize_deposit(&mut self, deposit: &mut StabilityPoolDeposit) -> Result<u64> {
        let coll_gain = self.get_depositor_coll_gain(deposit)?;
        let compounded = self.get_compounded_deposit(deposit)?;
        let debt_loss = safe_sub(deposit.initial_value, compounded)?;

        if coll_gain > 0 {
            deposit.claimable_coll = safe_add(deposit.claimable_coll, coll_gain)?;
            self.sp_state.decrease_coll(coll_gain)?;
        }
        emit!(CollGainWithdrawn {
            depositor: deposit.depositor,
            coll: coll_gain,
            debt_loss,
        });
        Ok(compounded)
    }

    fn snapshot_deposit(&self, deposit: &mut StabilityPoolDeposit, new_value: u64) {
        let (epoch, scale) = self.current_epoch_scale_key();
        let current = self.epoch_scale(epoch, scale);
        deposit.update_deposit_and_snapshot(&self.sp_state, &current, new_value);
        emit!(UserDepositChanged {
            depositor: deposit.depositor,
            new_deposit: new_value,
        });
    }
}
