use anchor_lang::prelude::*;

use crate::{
    constants::{DECIMAL_PRECISION, SCALE_FACTOR},
    errors::{MathError, StabilityPoolError},
    events::{
        EpochUpdated, PUpdated, SUpdated, ScaleUpdated, StabilityPoolCollBalanceUpdated,
        StabilityPoolDebtBalanceUpdated,
    },
    math::{safe_add, safe_add_u128, safe_sub},
};

use super::EpochScale;

#[account]
#[derive(InitSpace, Default, Debug)]
pub struct StabilityPoolState {
    pub pool_state: Pubkey,

    pub total_collateral: u64,
    pub total_deposits: u64,
    pub p: u128,
    pub current_scale: u128,
    pub current_epoch: u128,
    pub last_coll_error_offset: u128,
    pub last_debt_loss_error_offset: u128,
}

impl StabilityPoolState {
    pub fn init(&mut self, pool_state: Pubkey) {
        *self = StabilityPoolState {
            pool_state,
            p: DECIMAL_PRECISION.into(),
            ..Default::default()
        };
    }

    pub fn increase_debt(&mut self, amount: u64) -> Result<()> {
        self.total_deposits = safe_add(self.total_deposits, amount)?;
        emit!(StabilityPoolDebtBalanceUpdated {
            new_balance: self.total_deposits
        });
        Ok(())
    }

    pub fn decrease_debt(&mut self, amount: u64) -> Result<()> {
        self.total_deposits = safe_sub(self.total_deposits, amount)?;
        emit!(StabilityPoolDebtBalanceUpdated {
            new_balance: self.total_deposits
        });
        Ok(())
    }

    pub fn decrease_coll(&mut self, amount: u64) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        self.total_collateral = safe_sub(self.total_collateral, amount)?;
        emit!(StabilityPoolCollBalanceUpdated {
            new_balance: self.total_collateral
        });
        Ok(())
    }

    pub fn increase_coll(&mut self, amount: u64) -> Result<()> {
        self.total_collateral = safe_add(self.total_collateral, amount)?;
        emit!(StabilityPoolCollBalanceUpdated {
            new_balance: self.total_collateral
        });
        Ok(())
    }

    /// Returns `(coll_gain_per_unit_staked, debt_loss_per_unit_staked)` for an offset,
    /// feeding back the rounding error of the previous offset.
    pub fn compute_rewards_per_unit_staked(
        &mut self,
        coll_to_add: u64,
        debt_to_offset: u64,
    ) -> Result<(u128, u128)> {
        let total_deposits = self.total_deposits as u128;
        require!(total_deposits > 0, MathError::DivideByZero);
        require!(
            debt_to_offset <= self.total_deposits,
            StabilityPoolError::OffsetExceedsDeposits
        );

        let coll_numerator = safe_add_u128(
            (coll_to_add as u128) * (DECIMAL_PRECISION as u128),
            self.last_coll_error_offset,
        )?;

        let debt_loss_per_unit_staked = if debt_to_offset == self.total_deposits {
            // The whole pool is consumed; nothing left to carry
            self.last_debt_loss_error_offset = 0;
            DECIMAL_PRECISION as u128
        } else {
            let debt_loss_numerator = ((debt_to_offset as u128) * (DECIMAL_PRECISION as u128))
                .checked_sub(self.last_debt_loss_error_offset)
                .ok_or(MathError::Overflow)?;
            // Round up so that compounded deposits err in favour of the pool
            let debt_loss_per_unit_staked = debt_loss_numerator / total_deposits + 1;
            self.last_debt_loss_error_offset =
                debt_loss_per_unit_staked * total_deposits - debt_loss_numerator;
            debt_loss_per_unit_staked
        };

        let coll_gain_per_unit_staked = coll_numerator / total_deposits;
        self.last_coll_error_offset =
            coll_numerator - coll_gain_per_unit_staked * total_deposits;

        Ok((coll_gain_per_unit_staked, debt_loss_per_unit_staked))
    }

    pub fn update_reward_sum_and_product(
        &mut self,
        current_epoch_scale: &mut EpochScale,
        coll_gain_per_unit_staked: u128,
        debt_loss_per_unit_staked: u128,
    ) -> Result<()> {
        let decimal_precision = DECIMAL_PRECISION as u128;
        require!(
            debt_loss_per_unit_staked <= decimal_precision,
            StabilityPoolError::OffsetExceedsDeposits
        );
        // Zero when the pool was emptied, otherwise (1 - debt loss per unit staked)
        let new_product_factor = decimal_precision - debt_loss_per_unit_staked;

        // S is updated with the pre-offset P: a depositor's gain depends on their
        // deposit before this liquidation depleted it.
        let marginal_coll_gain = coll_gain_per_unit_staked
            .checked_mul(self.p)
            .ok_or(MathError::Overflow)?;
        current_epoch_scale.sum = safe_add_u128(current_epoch_scale.sum, marginal_coll_gain)?;
        emit!(SUpdated {
            s: current_epoch_scale.sum,
            epoch: self.current_epoch,
            scale: self.current_scale
        });

        let scaled_p = self
            .p
            .checked_mul(new_product_factor)
            .ok_or(MathError::Overflow)?
            / decimal_precision;

        let new_p = if new_product_factor == 0 {
            self.current_epoch += 1;
            emit!(EpochUpdated {
                current_epoch: self.current_epoch
            });
            self.current_scale = 0;
            emit!(ScaleUpdated {
                current_scale: self.current_scale
            });
            decimal_precision
        } else if scaled_p < SCALE_FACTOR.into() {
            self.current_scale += 1;
            emit!(ScaleUpdated {
                current_scale: self.current_scale
            });
            self.p
                .checked_mul(new_product_factor)
                .and_then(|v| v.checked_mul(SCALE_FACTOR.into()))
                .ok_or(MathError::Overflow)?
                / decimal_precision
        } else {
            scaled_p
        };

        require!(new_p > 0, MathError::Overflow);
        self.p = new_p;

        emit!(PUpdated { p: self.p });
        Ok(())
    }

    /// Cancels `debt_to_offset` against deposits and distributes `coll_to_add` to
    /// depositors. Must run before the deposits total is reduced.
    pub fn offset(
        &mut self,
        current_epoch_scale: &mut EpochScale,
        debt_to_offset: u64,
        coll_to_add: u64,
    ) -> Result<()> {
        if self.total_deposits == 0 || debt_to_offset == 0 {
            return Ok(());
        }
        let (coll_gain_per_unit_staked, debt_loss_per_unit_staked) =
            self.compute_rewards_per_unit_staked(coll_to_add, debt_to_offset)?;
        self.update_reward_sum_and_product(
            current_epoch_scale,
            coll_gain_per_unit_staked,
            debt_loss_per_unit_staked,
        )
    }
}
