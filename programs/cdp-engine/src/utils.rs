use crate::{
    engine::{AssetPool, TroveBook},
    errors::{BorrowerOpsError, ConfigError},
    state::{
        load_snapshot_epoch_scales, CollSurplusPool, EpochScale, PoolState,
        StabilityPoolDeposit, StabilityPoolState, Trove, TroveOwners,
    },
    ID,
};
use anchor_lang::prelude::*;

pub fn require_non_zero_redeem_amount(amount: u64) -> Result<()> {
    require!(amount > 0, BorrowerOpsError::ZeroRedeemAmount);
    Ok(())
}

pub fn require_non_zero_debt_change(debt_change: u64) -> Result<()> {
    require!(debt_change > 0, BorrowerOpsError::ZeroDebtChange);
    Ok(())
}

pub fn require_non_zero_adjustment(coll_change: u64, debt_change: u64) -> Result<()> {
    require!(
        coll_change != 0 || debt_change != 0,
        BorrowerOpsError::ZeroAdjustment
    );
    Ok(())
}

pub fn require_no_coll_withdrawal(coll_change: u64, is_coll_increase: bool) -> Result<()> {
    if !is_coll_increase {
        require!(coll_change == 0, BorrowerOpsError::RecoveryNoCollWithdraw);
    }
    Ok(())
}

pub fn require_new_icr_is_above_old_icr(new_icr: u64, old_icr: u64) -> Result<()> {
    require!(new_icr >= old_icr, BorrowerOpsError::NewICRLowerThanOldICR);
    Ok(())
}

/// Deserializes every trove passed in `remaining_accounts`. Each must be a trove of
/// `pool_state` owned by this program.
pub fn load_troves(remaining_accounts: &[AccountInfo<'_>], pool_state: &Pubkey) -> Result<Vec<Trove>> {
    let mut troves = Vec::with_capacity(remaining_accounts.len());
    for account in remaining_accounts {
        require_keys_eq!(*account.owner, ID, BorrowerOpsError::InvalidAccount);
        let data = account.try_borrow_data()?;
        let trove = Trove::try_deserialize(&mut data.as_ref())?;
        require_keys_eq!(trove.pool_state, *pool_state, ConfigError::PoolMismatch);
        troves.push(trove);
    }
    Ok(troves)
}

/// Writes the book's copy of each trove back into its account.
pub fn store_troves(remaining_accounts: &[AccountInfo<'_>], book: &TroveBook) -> Result<()> {
    for account in remaining_accounts {
        let mut data = account.try_borrow_mut_data()?;
        let owner = Trove::try_deserialize(&mut data.as_ref())?.owner;
        if let Some(trove) = book.get(&owner) {
            trove.try_serialize(&mut data.as_mut())?;
        }
    }
    Ok(())
}

/// Per-asset accounts an instruction hands to the engine. Accounts the instruction
/// does not carry are `None`; the engine sees them at their defaults and they are
/// never written back.
pub struct PoolAccounts<'a> {
    pub pool_key: Pubkey,
    pub pool_state: &'a mut PoolState,
    pub trove_owners: Option<&'a mut TroveOwners>,
    pub sp_state: Option<&'a mut StabilityPoolState>,
    pub current_epoch_scale: Option<&'a mut EpochScale>,
    pub coll_surplus_pool: Option<&'a mut CollSurplusPool>,
}

impl<'a> PoolAccounts<'a> {
    pub fn load(&self, trove_accounts: &[AccountInfo<'_>]) -> Result<AssetPool> {
        let owners = match self.trove_owners.as_deref() {
            Some(trove_owners) => {
                require_keys_eq!(
                    trove_owners.pool_state,
                    self.pool_key,
                    ConfigError::PoolMismatch
                );
                trove_owners.owners.clone()
            }
            None => vec![],
        };
        let troves = load_troves(trove_accounts, &self.pool_key)?;
        let book = TroveBook::new(troves, owners);
        let mut asset_pool = AssetPool::new(
            self.pool_key,
            self.pool_state.clone(),
            self.sp_state.as_deref().cloned().unwrap_or_default(),
            self.coll_surplus_pool.as_deref().cloned().unwrap_or_default(),
            book,
        );
        if let Some(epoch_scale) = self.current_epoch_scale.as_deref() {
            let key = asset_pool.current_epoch_scale_key();
            asset_pool.epoch_scales.insert(key, epoch_scale.clone());
        }
        Ok(asset_pool)
    }

    /// [`Self::load`] for stability pool instructions, which also need the sums at the
    /// deposit's snapshot.
    pub fn load_for_deposit(
        &self,
        sp_key: &Pubkey,
        epoch_scale_accounts: &[AccountInfo<'_>],
        trove_accounts: &[AccountInfo<'_>],
        deposit: &StabilityPoolDeposit,
    ) -> Result<AssetPool> {
        let mut asset_pool = self.load(trove_accounts)?;
        for (key, epoch_scale) in load_snapshot_epoch_scales(epoch_scale_accounts, sp_key, deposit)? {
            // The typed current account wins over a stale remaining-account copy
            asset_pool.epoch_scales.entry(key).or_insert(epoch_scale);
        }
        Ok(asset_pool)
    }

    /// Writes the engine's state back. The current epoch scale account keeps the
    /// `(epoch, scale)` it was loaded for, even if an offset rolled it over.
    pub fn store(&mut self, asset_pool: &AssetPool, trove_accounts: &[AccountInfo<'_>]) -> Result<()> {
        let loaded_key = self
            .sp_state
            .as_deref()
            .map(|sp_state| (sp_state.current_epoch, sp_state.current_scale));

        *self.pool_state = asset_pool.pool_state.clone();
        if let Some(trove_owners) = self.trove_owners.as_deref_mut() {
            trove_owners.owners = asset_pool.book.owners().to_vec();
        }
        if let Some(sp_state) = self.sp_state.as_deref_mut() {
            *sp_state = asset_pool.sp_state.clone();
        }
        if let (Some(epoch_scale), Some((epoch, scale))) =
            (self.current_epoch_scale.as_deref_mut(), loaded_key)
        {
            *epoch_scale = asset_pool.epoch_scale(epoch, scale);
        }
        if let Some(coll_surplus_pool) = self.coll_surplus_pool.as_deref_mut() {
            *coll_surplus_pool = asset_pool.coll_surplus_pool.clone();
        }
        store_troves(trove_accounts, &asset_pool.book)
    }
}

/// Splits a stability pool instruction's remaining accounts into the deposit's two
/// snapshot epoch scales and the troves that follow them.
pub fn split_deposit_accounts<'a, 'info>(
    remaining_accounts: &'a [AccountInfo<'info>],
) -> (&'a [AccountInfo<'info>], &'a [AccountInfo<'info>]) {
    remaining_accounts.split_at(remaining_accounts.len().min(2))
}
