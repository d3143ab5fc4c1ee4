use anchor_lang::prelude::*;

use crate::{
    errors::{BorrowerOpsError, CollSurplusError, MathError},
    events::{SurplusPoolCollBalanceUpdated, SurplusPoolCollSent, TroveSnapshotsUpdated},
    math::{compute_cr, compute_nominal_cr, safe_add, safe_sub},
};

use super::PoolState;

#[account]
#[derive(InitSpace, Default, Debug, PartialEq, Eq)]
pub struct Trove {
    pub pool_state: Pubkey,
    pub owner: Pubkey,
    pub debt: u64,
    pub coll: u64,
    pub stake: u64,
    pub snapshot_coll_reward: u128,
    pub snapshot_debt_reward: u128,
    pub surplus_balance: u64,
    pub status: TroveStatus,
    pub prev: Pubkey,
    pub next: Pubkey,
}

#[derive(
    AnchorSerialize, AnchorDeserialize, Copy, Clone, PartialEq, Eq, InitSpace, Default, Debug,
)]
pub enum TroveStatus {
    #[default]
    NonExistent,
    Active,
    ClosedByOwner,
    ClosedByLiquidation,
    ClosedByRedemption,
}

impl Trove {
    pub fn new(pool_state: Pubkey, owner: Pubkey) -> Self {
        Self {
            pool_state,
            owner,
            ..Default::default()
        }
    }

    pub fn activate(&mut self, coll: u64, debt: u64) {
        self.coll = coll;
        self.debt = debt;
        self.status = TroveStatus::Active;
        self.stake = 0;
        self.snapshot_coll_reward = 0;
        self.snapshot_debt_reward = 0;
    }

    pub fn is_active(&self) -> bool {
        self.status == TroveStatus::Active
    }

    pub fn get_new_trove_amounts(
        &self,
        coll_change: u64,
        is_coll_increase: bool,
        debt_change: u64,
        is_debt_increase: bool,
    ) -> Result<(u64, u64)> {
        let new_coll = if is_coll_increase {
            safe_add(self.coll, coll_change)?
        } else {
            require!(
                coll_change <= self.coll,
                BorrowerOpsError::CollateralWithdrawExceedBalance
            );
            self.coll - coll_change
        };

        let new_debt = if is_debt_increase {
            safe_add(self.debt, debt_change)?
        } else {
            safe_sub(self.debt, debt_change)?
        };
        Ok((new_coll, new_debt))
    }

    pub fn require_trove_not_active(&self) -> Result<()> {
        require!(!self.is_active(), BorrowerOpsError::TroveIsActive);
        Ok(())
    }

    pub fn require_trove_active(&self) -> Result<()> {
        require!(self.is_active(), BorrowerOpsError::TroveIsNotActive);
        Ok(())
    }

    pub fn has_pending_rewards(&self, pool_state: &PoolState) -> bool {
        if !self.is_active() {
            return false;
        }
        self.snapshot_coll_reward < pool_state.l_coll
            || self.snapshot_debt_reward < pool_state.l_debt
    }

    pub fn get_pending_coll_reward(&self, pool_state: &PoolState) -> Result<u64> {
        if !self.is_active() {
            return Ok(0);
        }
        pool_state.pending_reward(self.stake, pool_state.l_coll, self.snapshot_coll_reward)
    }

    pub fn get_pending_debt_reward(&self, pool_state: &PoolState) -> Result<u64> {
        if !self.is_active() {
            return Ok(0);
        }
        pool_state.pending_reward(self.stake, pool_state.l_debt, self.snapshot_debt_reward)
    }

    /// Returns `(debt, coll, pending_debt_reward, pending_coll_reward)` including
    /// unapplied redistribution rewards.
    pub fn get_entire_debt_coll(&self, pool_state: &PoolState) -> Result<(u64, u64, u64, u64)> {
        let pending_debt_reward = self.get_pending_debt_reward(pool_state)?;
        let pending_coll_reward = self.get_pending_coll_reward(pool_state)?;

        let debt = safe_add(self.debt, pending_debt_reward)?;
        let coll = safe_add(self.coll, pending_coll_reward)?;
        Ok((debt, coll, pending_debt_reward, pending_coll_reward))
    }

    pub fn get_current_amounts(&self, pool_state: &PoolState) -> Result<(u64, u64)> {
        let (debt, coll, _, _) = self.get_entire_debt_coll(pool_state)?;
        Ok((coll, debt))
    }

    pub fn get_nominal_icr(&self, pool_state: &PoolState) -> Result<u64> {
        let (current_coll, current_debt) = self.get_current_amounts(pool_state)?;
        Ok(compute_nominal_cr(current_coll, current_debt).ok_or(MathError::Overflow)?)
    }

    pub fn get_current_icr(&self, pool_state: &PoolState, price: u64) -> Result<u64> {
        let (current_coll, current_debt) = self.get_current_amounts(pool_state)?;
        Ok(compute_cr(current_coll, current_debt, price).ok_or(MathError::Overflow)?)
    }

    /// Materializes pending redistribution rewards into the stored coll and debt.
    pub fn apply_pending_rewards(&mut self, pool_state: &mut PoolState) -> Result<()> {
        if self.has_pending_rewards(pool_state) {
            let pending_coll_reward = self.get_pending_coll_reward(pool_state)?;
            let pending_debt_reward = self.get_pending_debt_reward(pool_state)?;

            self.coll = safe_add(self.coll, pending_coll_reward)?;
            self.debt = safe_add(self.debt, pending_debt_reward)?;

            self.update_reward_snapshot(pool_state);

            pool_state.move_pending_trove_rewards_to_active(pending_debt_reward, pending_coll_reward)?;
        }
        Ok(())
    }

    pub fn update_reward_snapshot(&mut self, pool_state: &PoolState) {
        self.snapshot_coll_reward = pool_state.l_coll;
        self.snapshot_debt_reward = pool_state.l_debt;
        emit!(TroveSnapshotsUpdated {
            l_coll: pool_state.l_coll,
            l_debt: pool_state.l_debt,
        });
    }

    pub fn update_stake_and_total_stakes(&mut self, pool_state: &mut PoolState) -> Result<u64> {
        let new_stake = pool_state.compute_new_stake(self.coll)?;
        let old_stake = self.stake;
        self.stake = new_stake;
        pool_state.update_total_stakes(old_stake, new_stake)?;
        Ok(new_stake)
    }

    pub fn remove_stake(&mut self, pool_state: &mut PoolState) -> Result<()> {
        pool_state.update_total_stakes(self.stake, 0)?;
        self.stake = 0;
        Ok(())
    }

    /// Zeroes the position. Sorted list and owners array removal is done by the caller.
    pub fn close(&mut self, closed_status: TroveStatus) {
        debug_assert!(
            closed_status != TroveStatus::NonExistent && closed_status != TroveStatus::Active
        );
        self.status = closed_status;
        self.coll = 0;
        self.debt = 0;
        self.snapshot_coll_reward = 0;
        self.snapshot_debt_reward = 0;
    }

    pub fn account_surplus(&mut self, amount: u64) -> Result<()> {
        self.surplus_balance = safe_add(self.surplus_balance, amount)?;

        emit!(SurplusPoolCollBalanceUpdated {
            account: self.owner,
            new_balance: self.surplus_balance
        });
        Ok(())
    }

    pub fn clear_surplus(&mut self) -> Result<u64> {
        let amount = self.surplus_balance;
        require!(amount > 0, CollSurplusError::NoCollAvailableToClaim);
        self.surplus_balance = 0;

        emit!(SurplusPoolCollBalanceUpdated {
            account: self.owner,
            new_balance: 0
        });
        emit!(SurplusPoolCollSent {
            amount,
            to: self.owner
        });
        Ok(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{constants::DECIMAL_PRECISION, state::PoolConfig};

    fn active_trove(coll: u64, debt: u64, stake: u64) -> Trove {
        let mut trove = Trove::new(Pubkey::new_unique(), Pubkey::new_unique());
        trove.activate(coll, debt);
        trove.stake = stake;
        trove
    }

    fn pool_state() -> PoolState {
        let mut pool_state = PoolState::default();
        let config = PoolConfig::default();
        pool_state.mcr = config.mcr;
        pool_state.ccr = config.ccr;
        pool_state
    }

    #[test]
    fn pending_rewards_follow_l_terms() {
        let mut pool_state = pool_state();
        let trove = active_trove(10, 10, 2 * DECIMAL_PRECISION);
        assert!(!trove.has_pending_rewards(&pool_state));

        pool_state.l_coll = 3 * DECIMAL_PRECISION as u128;
        assert!(trove.has_pending_rewards(&pool_state));
        assert_eq!(trove.get_pending_coll_reward(&pool_state).unwrap(), 6 * DECIMAL_PRECISION);
        assert_eq!(trove.get_pending_debt_reward(&pool_state).unwrap(), 0);

        // A debt-only delta still counts as pending
        pool_state.l_coll = 0;
        pool_state.l_debt = 1;
        assert!(trove.has_pending_rewards(&pool_state));
    }

    #[test]
    fn closed_trove_has_no_pending_rewards() {
        let mut pool_state = pool_state();
        let mut trove = active_trove(10, 10, 10);
        trove.close(TroveStatus::ClosedByOwner);
        pool_state.l_coll = 1_000;
        assert!(!trove.has_pending_rewards(&pool_state));
        assert_eq!(trove.get_pending_coll_reward(&pool_state).unwrap(), 0);
    }

    #[test]
    fn apply_pending_rewards_moves_default_pool_to_active() {
        let mut pool_state = pool_state();
        pool_state.l_coll = DECIMAL_PRECISION as u128 / 2;
        pool_state.l_debt = DECIMAL_PRECISION as u128;
        pool_state.liquidated_coll = 5;
        pool_state.closed_debt = 10;
        let mut trove = active_trove(100, 100, 10);

        trove.apply_pending_rewards(&mut pool_state).unwrap();
        assert_eq!((trove.coll, trove.debt), (105, 110));
        assert_eq!((pool_state.active_coll, pool_state.active_debt), (5, 10));
        assert_eq!((pool_state.liquidated_coll, pool_state.closed_debt), (0, 0));
        assert!(!trove.has_pending_rewards(&pool_state));
    }

    #[test]
    fn surplus_accumulates_and_claims_once() {
        let mut trove = active_trove(1, 1, 1);
        trove.account_surplus(5).unwrap();
        trove.account_surplus(7).unwrap();
        assert_eq!(trove.clear_surplus().unwrap(), 12);
        assert!(trove.clear_surplus().is_err());
    }

    #[test]
    fn withdraw_more_than_coll_fails() {
        let trove = active_trove(10, 10, 10);
        assert!(trove.get_new_trove_amounts(11, false, 0, false).is_err());
        assert_eq!(trove.get_new_trove_amounts(4, false, 3, true).unwrap(), (6, 13));
    }
}
