use anchor_lang::prelude::*;

use crate::{
    constants::{DECIMAL_PRECISION, SCALE_FACTOR},
    errors::{MathError, StabilityPoolError},
    events::DepositSnapshotUpdated,
    math::{safe_add_u128, safe_sub_u128, to_u64},
};

use super::{EpochScale, StabilityPoolState};

#[account]
#[derive(InitSpace, Default, Debug, PartialEq, Eq)]
pub struct StabilityPoolDeposit {
    pub depositor: Pubkey,
    pub initial_value: u64,
    pub snapshots_s: u128,
    pub snapshots_p: u128,
    pub snapshots_scale: u128,
    pub snapshots_epoch: u128,
    pub claimable_coll: u64,
}

impl StabilityPoolDeposit {
    /// Collateral gain since the last snapshot. `first_epoch_scale` is the sum at the
    /// snapshot's (epoch, scale), `second_epoch_scale` the one at (epoch, scale + 1).
    pub fn get_depositor_coll_gain(
        &self,
        first_epoch_scale: &EpochScale,
        second_epoch_scale: &EpochScale,
    ) -> Result<u64> {
        if self.initial_value == 0 {
            return Ok(0);
        }

        // A gain that spans more than one scale change is negligible and ignored
        let first_portion = safe_sub_u128(first_epoch_scale.sum, self.snapshots_s)?;
        let second_portion = second_epoch_scale.sum / (SCALE_FACTOR as u128);

        let coll_gain = (self.initial_value as u128)
            .checked_mul(safe_add_u128(first_portion, second_portion)?)
            .ok_or(MathError::Overflow)?
            .checked_div(self.snapshots_p)
            .ok_or(MathError::DivideByZero)?
            / (DECIMAL_PRECISION as u128);
        to_u64(coll_gain)
    }

    pub fn get_compounded_deposit(&self, sp_state: &StabilityPoolState) -> Result<u64> {
        if self.initial_value == 0 {
            return Ok(0);
        }

        // Deposits made before a pool-emptying event have been fully cancelled
        if self.snapshots_epoch < sp_state.current_epoch {
            return Ok(0);
        }

        let scale_diff = safe_sub_u128(sp_state.current_scale, self.snapshots_scale)?;

        // More than one scale change shrinks the deposit by at least 1e-10
        let compounded_stake = if scale_diff == 0 {
            (self.initial_value as u128) * sp_state.p / self.snapshots_p
        } else if scale_diff == 1 {
            (self.initial_value as u128) * sp_state.p / self.snapshots_p / (SCALE_FACTOR as u128)
        } else {
            0
        };
        let compounded_stake = to_u64(compounded_stake)?;

        // Dust below a billionth of the initial deposit is treated as fully depleted
        if compounded_stake < self.initial_value / 1_000_000_000 {
            return Ok(0);
        }
        Ok(compounded_stake)
    }

    pub fn require_user_has_deposit(&self) -> Result<()> {
        require!(self.initial_value > 0, StabilityPoolError::ZeroDeposit);
        Ok(())
    }

    pub fn update_deposit_and_snapshot(
        &mut self,
        sp_state: &StabilityPoolState,
        current_epoch_scale: &EpochScale,
        new_value: u64,
    ) {
        self.initial_value = new_value;
        if new_value == 0 {
            self.snapshots_p = 0;
            self.snapshots_s = 0;
            self.snapshots_scale = 0;
            self.snapshots_epoch = 0;
        } else {
            self.snapshots_p = sp_state.p;
            self.snapshots_s = current_epoch_scale.sum;
            self.snapshots_scale = sp_state.current_scale;
            self.snapshots_epoch = sp_state.current_epoch;
        }
        emit!(DepositSnapshotUpdated {
            depositor: self.depositor,
            p: self.snapshots_p,
            s: self.snapshots_s,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deposit(sp_state: &StabilityPoolState, value: u64) -> StabilityPoolDeposit {
        let mut deposit = StabilityPoolDeposit {
            depositor: Pubkey::new_unique(),
            ..Default::default()
        };
        deposit.update_deposit_and_snapshot(sp_state, &EpochScale::default(), value);
        deposit
    }

    fn sp_state() -> StabilityPoolState {
        let mut sp_state = StabilityPoolState::default();
        sp_state.init(Pubkey::new_unique());
        sp_state
    }

    #[test]
    fn compounded_deposit_tracks_p() {
        let mut sp_state = sp_state();
        let d = deposit(&sp_state, 1_000);
        sp_state.p = DECIMAL_PRECISION as u128 / 4;
        assert_eq!(d.get_compounded_deposit(&sp_state).unwrap(), 250);

        sp_state.current_scale = 1;
        sp_state.p = DECIMAL_PRECISION as u128;
        assert_eq!(d.get_compounded_deposit(&sp_state).unwrap(), 0);

        sp_state.current_scale = 2;
        assert_eq!(d.get_compounded_deposit(&sp_state).unwrap(), 0);
    }

    #[test]
    fn epoch_change_wipes_deposit() {
        let mut sp_state = sp_state();
        let d = deposit(&sp_state, 1_000);
        sp_state.current_epoch = 1;
        assert_eq!(d.get_compounded_deposit(&sp_state).unwrap(), 0);
    }

    #[test]
    fn coll_gain_spans_one_scale() {
        let sp_state = sp_state();
        let d = deposit(&sp_state, 100);
        let first = EpochScale {
            sum: 2 * DECIMAL_PRECISION as u128 * DECIMAL_PRECISION as u128,
        };
        let second = EpochScale {
            sum: SCALE_FACTOR as u128 * DECIMAL_PRECISION as u128 * DECIMAL_PRECISION as u128,
        };
        // 100 * (2 + 1) per unit
        assert_eq!(d.get_depositor_coll_gain(&first, &second).unwrap(), 300);
    }

    #[test]
    fn zero_deposit_clears_snapshots() {
        let sp_state = sp_state();
        let mut d = deposit(&sp_state, 10);
        d.update_deposit_and_snapshot(&sp_state, &EpochScale::default(), 0);
        assert_eq!(d.snapshots_p, 0);
        assert_eq!(d.get_depositor_coll_gain(&EpochScale::default(), &EpochScale::default()).unwrap(), 0);
    }
}
