use crate::{
    constants::{
        CCR_DEFAULT, DECIMAL_PRECISION, GAS_COMPENSATION_DEFAULT, MCR_DEFAULT,
        MIN_NET_DEBT_DEFAULT, ONE_HUNDRED_PERCENT, PERCENT_DIVISOR_DEFAULT,
    },
    errors::{BorrowerOpsError, ConfigError, MathError},
    events::{LTermsUpdated, SystemSnapshotsUpdated, TotalStakesUpdated},
    math::{compute_cr, mul_div, safe_add, safe_add_u128, safe_sub, safe_sub_u128, to_u64},
};
use anchor_lang::prelude::*;

use super::{LiquidationTotals, LiquidationValues, StabilityPoolState};

#[account]
#[derive(InitSpace, Default, Debug)]
pub struct PoolState {
    pub creator: Pubkey,
    pub stablecoin: Pubkey,
    pub collateral: Pubkey,

    pub mcr: u64,
    pub ccr: u64,
    pub min_net_debt: u64,
    pub gas_compensation: u64,
    pub coll_gas_comp_percent_divisor: u64,

    // for redistribution rewards calculation
    pub total_stakes: u64,
    pub total_stakes_snapshot: u64,
    pub total_coll_snapshot: u64,
    pub l_coll: u128,
    pub l_debt: u128,
    pub last_coll_error_redistribution: u128,
    pub last_debt_error_redistribution: u128,

    // Default Pool
    pub liquidated_coll: u64,
    pub closed_debt: u64,

    // Active Pool
    pub active_coll: u64,
    pub active_debt: u64,

    // SortedTroves data, linked by owner key
    pub trove_size: u64,
    pub trove_head: Pubkey,
    pub trove_tail: Pubkey,

    // Bumps
    pub token_auth_bump: [u8; 1],
    pub stability_pool_bump: [u8; 1],
    pub coll_surplus_bump: [u8; 1],
    pub bump: [u8; 1],
}

/// Per-asset protocol parameters supplied at initialization.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    pub mcr: u64,
    pub ccr: u64,
    pub min_net_debt: u64,
    pub gas_compensation: u64,
    pub coll_gas_comp_percent_divisor: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            mcr: MCR_DEFAULT,
            ccr: CCR_DEFAULT,
            min_net_debt: MIN_NET_DEBT_DEFAULT,
            gas_compensation: GAS_COMPENSATION_DEFAULT,
            coll_gas_comp_percent_divisor: PERCENT_DIVISOR_DEFAULT,
        }
    }
}

impl PoolConfig {
    pub fn validate(&self) -> Result<()> {
        require!(self.mcr > ONE_HUNDRED_PERCENT, ConfigError::InvalidParameter);
        require!(self.ccr > self.mcr, ConfigError::InvalidParameter);
        require!(
            self.coll_gas_comp_percent_divisor > 0,
            ConfigError::InvalidParameter
        );
        Ok(())
    }
}

impl PoolState {
    pub fn init(
        &mut self,
        creator: Pubkey,
        stablecoin: Pubkey,
        collateral: Pubkey,
        config: &PoolConfig,
        token_auth_bump: [u8; 1],
        stability_pool_bump: [u8; 1],
        coll_surplus_bump: [u8; 1],
        bump: [u8; 1],
    ) -> Result<()> {
        config.validate()?;
        *self = PoolState {
            creator,
            stablecoin,
            collateral,
            mcr: config.mcr,
            ccr: config.ccr,
            min_net_debt: config.min_net_debt,
            gas_compensation: config.gas_compensation,
            coll_gas_comp_percent_divisor: config.coll_gas_comp_percent_divisor,
            token_auth_bump,
            stability_pool_bump,
            coll_surplus_bump,
            bump,
            ..Default::default()
        };
        Ok(())
    }

    pub fn require_at_least_min_net_debt(&self, net_debt: u64) -> Result<()> {
        require_gte!(
            net_debt,
            self.min_net_debt,
            BorrowerOpsError::DebtLessThanMin
        );
        Ok(())
    }

    pub fn require_more_than_one_trove_in_system(&self) -> Result<()> {
        require!(self.trove_size > 1, BorrowerOpsError::OnlyOneTrove);
        Ok(())
    }

    pub fn stability_pool_seeds<'a, 'b: 'a>(&'a self, key: &'b Pubkey) -> [&[u8]; 3] {
        [
            &b"stability"[..],
            key.as_ref(),
            self.stability_pool_bump.as_ref(),
        ]
    }

    pub fn token_auth_seeds<'a, 'b: 'a>(&'a self, key: &'b Pubkey) -> [&[u8]; 3] {
        [
            &b"token-authority"[..],
            key.as_ref(),
            self.token_auth_bump.as_ref(),
        ]
    }

    pub fn coll_surplus_seeds<'a, 'b: 'a>(&'a self, key: &'b Pubkey) -> [&[u8]; 3] {
        [
            &b"coll-surplus"[..],
            key.as_ref(),
            self.coll_surplus_bump.as_ref(),
        ]
    }

    pub fn get_composite_debt(&self, debt: u64) -> Result<u64> {
        safe_add(debt, self.gas_compensation)
    }

    pub fn get_net_debt(&self, debt: u64) -> Result<u64> {
        safe_sub(debt, self.gas_compensation)
    }

    pub fn get_coll_gas_compensation(&self, entire_coll: u64) -> u64 {
        entire_coll / self.coll_gas_comp_percent_divisor
    }

    pub fn get_entire_coll(&self) -> Result<u64> {
        safe_add(self.active_coll, self.liquidated_coll)
    }

    pub fn get_entire_debt(&self) -> Result<u64> {
        safe_add(self.active_debt, self.closed_debt)
    }

    pub fn get_tcr(&self, price: u64) -> Result<u64> {
        let entire_coll = self.get_entire_coll()?;
        let entire_debt = self.get_entire_debt()?;
        Ok(compute_cr(entire_coll, entire_debt, price).ok_or(MathError::Overflow)?)
    }

    pub fn check_recovery_mode(&self, price: u64) -> Result<bool> {
        let tcr = self.get_tcr(price)?;
        Ok(tcr < self.ccr)
    }

    pub fn check_potential_recovery_mode(
        &self,
        entire_system_coll: u64,
        entire_system_debt: u64,
        price: u64,
    ) -> Result<bool> {
        let tcr =
            compute_cr(entire_system_coll, entire_system_debt, price).ok_or(MathError::Overflow)?;
        Ok(tcr < self.ccr)
    }

    pub fn get_new_tcr_from_trove_change(
        &self,
        coll_change: u64,
        is_coll_increase: bool,
        debt_change: u64,
        is_debt_increase: bool,
        price: u64,
    ) -> Result<u64> {
        let mut total_coll = self.get_entire_coll()?;
        let mut total_debt = self.get_entire_debt()?;

        total_coll = if is_coll_increase {
            safe_add(total_coll, coll_change)?
        } else {
            safe_sub(total_coll, coll_change)?
        };

        total_debt = if is_debt_increase {
            safe_add(total_debt, debt_change)?
        } else {
            safe_sub(total_debt, debt_change)?
        };

        Ok(compute_cr(total_coll, total_debt, price).ok_or(MathError::Overflow)?)
    }

    /// Liquidation values for a trove in the MCR <= ICR < TCR band: the whole debt is
    /// offset and the seized collateral is capped at MCR times the debt's value.
    pub fn get_capped_offset_vals(
        &self,
        entire_trove_debt: u64,
        entire_trove_coll: u64,
        price: u64,
    ) -> Result<LiquidationValues> {
        let capped_coll_portion = mul_div(entire_trove_debt, self.mcr, price)?;
        let coll_gas_compensation = self.get_coll_gas_compensation(capped_coll_portion);

        Ok(LiquidationValues {
            entire_trove_debt,
            entire_trove_coll,
            coll_gas_compensation,
            debt_gas_compensation: self.gas_compensation,
            debt_to_offset: entire_trove_debt,
            coll_to_send_to_sp: safe_sub(capped_coll_portion, coll_gas_compensation)?,
            debt_to_redistribute: 0,
            coll_to_redistribute: 0,
            coll_surplus: safe_sub(entire_trove_coll, capped_coll_portion)?,
        })
    }

    pub fn require_icr_is_above_mcr(&self, new_icr: u64) -> Result<()> {
        require!(new_icr >= self.mcr, BorrowerOpsError::ICRLowerThanMCR);
        Ok(())
    }

    pub fn require_icr_is_above_ccr(&self, new_icr: u64) -> Result<()> {
        require!(new_icr >= self.ccr, BorrowerOpsError::ICRLowerThanCCR);
        Ok(())
    }

    pub fn require_new_tcr_is_above_ccr(&self, new_tcr: u64) -> Result<()> {
        require!(new_tcr >= self.ccr, BorrowerOpsError::TCRLowerThanCCR);
        Ok(())
    }

    pub fn require_tcr_over_mcr(&self, price: u64) -> Result<()> {
        require!(
            self.get_tcr(price)? >= self.mcr,
            BorrowerOpsError::TCRUnderMCR
        );
        Ok(())
    }

    pub fn require_valid_debt_repayment(&self, current_debt: u64, repayment: u64) -> Result<()> {
        require!(
            repayment <= self.get_net_debt(current_debt)?,
            BorrowerOpsError::InvalidDebtRepayment
        );
        Ok(())
    }

    pub fn increase_active_debt(&mut self, amount: u64) -> Result<()> {
        self.active_debt = safe_add(self.active_debt, amount)?;
        Ok(())
    }

    pub fn decrease_active_debt(&mut self, amount: u64) -> Result<()> {
        self.active_debt = safe_sub(self.active_debt, amount)?;
        Ok(())
    }

    pub fn increase_active_coll(&mut self, amount: u64) -> Result<()> {
        self.active_coll = safe_add(self.active_coll, amount)?;
        Ok(())
    }

    pub fn decrease_active_coll(&mut self, amount: u64) -> Result<()> {
        self.active_coll = safe_sub(self.active_coll, amount)?;
        Ok(())
    }

    pub fn move_pending_trove_rewards_to_active(
        &mut self,
        debt_amt: u64,
        coll_amt: u64,
    ) -> Result<()> {
        self.closed_debt = safe_sub(self.closed_debt, debt_amt)?;
        self.active_debt = safe_add(self.active_debt, debt_amt)?;
        self.liquidated_coll = safe_sub(self.liquidated_coll, coll_amt)?;
        self.active_coll = safe_add(self.active_coll, coll_amt)?;
        Ok(())
    }

    /// Moves the offset portion of a liquidation sequence out of the active pool and
    /// into the stability pool: debt is cancelled against deposits, collateral is
    /// credited to depositors.
    pub fn move_offset_to_stability_pool(
        &mut self,
        sp_state: &mut StabilityPoolState,
        totals: &LiquidationTotals,
    ) -> Result<()> {
        self.decrease_active_debt(totals.total_debt_to_offset)?;
        sp_state.decrease_debt(totals.total_debt_to_offset)?;

        self.decrease_active_coll(totals.total_coll_to_send_to_sp)?;
        sp_state.increase_coll(totals.total_coll_to_send_to_sp)?;
        Ok(())
    }

    pub fn update_total_stakes(&mut self, old_stake: u64, new_stake: u64) -> Result<()> {
        self.total_stakes = safe_add(safe_sub(self.total_stakes, old_stake)?, new_stake)?;
        emit!(TotalStakesUpdated {
            new_total_stakes: self.total_stakes
        });
        Ok(())
    }

    /// Stake for `coll` relative to the snapshot taken at the last liquidation, so that
    /// new stakes are not credited with rewards earned before they existed.
    pub fn compute_new_stake(&self, coll: u64) -> Result<u64> {
        if self.total_coll_snapshot == 0 {
            return Ok(coll);
        }
        require!(self.total_stakes_snapshot > 0, MathError::DivideByZero);
        mul_div(coll, self.total_stakes_snapshot, self.total_coll_snapshot)
    }

    pub fn redistribute_debt_and_coll(&mut self, debt: u64, coll: u64) -> Result<()> {
        if debt == 0 {
            return Ok(());
        }
        require!(self.total_stakes > 0, MathError::DivideByZero);
        let total_stakes = self.total_stakes as u128;

        // Carry the division remainders into the next redistribution
        let coll_numerator = safe_add_u128(
            (coll as u128) * (DECIMAL_PRECISION as u128),
            self.last_coll_error_redistribution,
        )?;
        let debt_numerator = safe_add_u128(
            (debt as u128) * (DECIMAL_PRECISION as u128),
            self.last_debt_error_redistribution,
        )?;

        let coll_reward_per_unit_staked = coll_numerator / total_stakes;
        let debt_reward_per_unit_staked = debt_numerator / total_stakes;

        self.last_coll_error_redistribution =
            coll_numerator - coll_reward_per_unit_staked * total_stakes;
        self.last_debt_error_redistribution =
            debt_numerator - debt_reward_per_unit_staked * total_stakes;

        self.l_coll = safe_add_u128(self.l_coll, coll_reward_per_unit_staked)?;
        self.l_debt = safe_add_u128(self.l_debt, debt_reward_per_unit_staked)?;

        emit!(LTermsUpdated {
            l_coll: self.l_coll,
            l_debt: self.l_debt
        });

        self.decrease_active_debt(debt)?;
        self.closed_debt = safe_add(self.closed_debt, debt)?;
        self.decrease_active_coll(coll)?;
        self.liquidated_coll = safe_add(self.liquidated_coll, coll)?;
        Ok(())
    }

    pub fn update_system_snapshots_exclude_coll_remainder(
        &mut self,
        coll_remainder: u64,
    ) -> Result<()> {
        self.total_stakes_snapshot = self.total_stakes;
        self.total_coll_snapshot = safe_add(
            safe_sub(self.active_coll, coll_remainder)?,
            self.liquidated_coll,
        )?;

        emit!(SystemSnapshotsUpdated {
            total_stakes_snapshot: self.total_stakes_snapshot,
            total_coll_snapshot: self.total_coll_snapshot
        });
        Ok(())
    }

    pub fn pending_reward(&self, stake: u64, l_term: u128, snapshot: u128) -> Result<u64> {
        let reward_per_unit_staked = safe_sub_u128(l_term, snapshot)?;
        if reward_per_unit_staked == 0 {
            return Ok(0);
        }
        let reward = (stake as u128)
            .checked_mul(reward_per_unit_staked)
            .ok_or(MathError::Overflow)?
            / (DECIMAL_PRECISION as u128);
        to_u64(reward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> PoolState {
        let mut pool_state = PoolState::default();
        pool_state
            .init(
                Pubkey::new_unique(),
                Pubkey::new_unique(),
                Pubkey::new_unique(),
                &PoolConfig::default(),
                [0],
                [0],
                [0],
                [0],
            )
            .unwrap();
        pool_state
    }

    #[test]
    fn init_rejects_bad_config() {
        let mut pool_state = PoolState::default();
        let config = PoolConfig {
            ccr: MCR_DEFAULT,
            ..Default::default()
        };
        assert!(pool_state
            .init(
                Pubkey::default(),
                Pubkey::default(),
                Pubkey::default(),
                &config,
                [0],
                [0],
                [0],
                [0]
            )
            .is_err());
    }

    #[test]
    fn recovery_mode_flips_below_ccr() {
        let mut pool_state = pool();
        pool_state.active_coll = 15 * DECIMAL_PRECISION;
        pool_state.active_debt = 1000 * DECIMAL_PRECISION;
        // TCR = 15 * 100 / 1000 = 150%
        assert!(!pool_state.check_recovery_mode(100 * DECIMAL_PRECISION).unwrap());
        assert!(pool_state.check_recovery_mode(99 * DECIMAL_PRECISION).unwrap());
    }

    #[test]
    fn capped_offset_vals_split_surplus() {
        let pool_state = pool();
        let vals = pool_state
            .get_capped_offset_vals(
                100 * DECIMAL_PRECISION,
                2 * DECIMAL_PRECISION,
                100 * DECIMAL_PRECISION,
            )
            .unwrap();
        // capped portion is 1.1 coll
        assert_eq!(vals.coll_gas_compensation, 1_100_000_000 / 200);
        assert_eq!(
            vals.coll_to_send_to_sp + vals.coll_gas_compensation,
            1_100_000_000
        );
        assert_eq!(vals.coll_surplus, 900_000_000);
        assert_eq!(vals.debt_to_redistribute, 0);
    }

    #[test]
    fn redistribution_carries_error() {
        let mut pool_state = pool();
        pool_state.total_stakes = 3;
        pool_state.active_coll = 10;
        pool_state.active_debt = 10;
        pool_state.redistribute_debt_and_coll(1, 1).unwrap();
        assert_eq!(pool_state.l_coll, 333_333_333);
        assert_eq!(pool_state.last_coll_error_redistribution, 1);
        assert_eq!(pool_state.liquidated_coll, 1);
        assert_eq!(pool_state.closed_debt, 1);
        pool_state.redistribute_debt_and_coll(2, 2).unwrap();
        assert_eq!(pool_state.l_coll, 1_000_000_000);
        assert_eq!(pool_state.last_coll_error_redistribution, 0);
    }

    #[test]
    fn redistribution_without_stakes_fails() {
        let mut pool_state = pool();
        pool_state.active_coll = 10;
        pool_state.active_debt = 10;
        assert!(pool_state.redistribute_debt_and_coll(1, 1).is_err());
    }
}
