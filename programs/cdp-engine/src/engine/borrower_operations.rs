use anchor_lang::prelude::*;

use crate::{
    errors::{BorrowerOpsError, MathError},
    events::{Operation, TroveUpdated},
    math::{compute_cr, compute_nominal_cr, safe_sub},
    state::TroveStatus,
    utils::{
        require_new_icr_is_above_old_icr, require_no_coll_withdrawal,
        require_non_zero_adjustment, require_non_zero_debt_change,
    },
};

use super::AssetPool;

/// Sorted list neighbours suggested by the caller. A default key means "no hint".
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Hints {
    pub prev: Pubkey,
    pub next: Pubkey,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TroveAdjustment {
    pub coll_change: u64,
    pub is_coll_increase: bool,
    pub debt_change: u64,
    pub is_debt_increase: bool,
}

/// Amounts a closed trove hands back: the collateral to return and the debt to burn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClosedTrove {
    pub coll: u64,
    pub debt: u64,
}

impl AssetPool {
    /// Opens a trove for `owner` borrowing `debt_amount` against `coll`. The trove's
    /// recorded debt also carries the gas compensation reserve.
    pub fn open_trove(
        &mut self,
        owner: Pubkey,
        coll: u64,
        debt_amount: u64,
        hints: Hints,
        price: u64,
    ) -> Result<u64> {
        self.atomically(|pool| pool.open_trove_inner(owner, coll, debt_amount, hints, price))
    }

    fn open_trove_inner(
        &mut self,
        owner: Pubkey,
        coll: u64,
        debt_amount: u64,
        hints: Hints,
        price: u64,
    ) -> Result<u64> {
        let is_recovery_mode = self.pool_state.check_recovery_mode(price)?;
        self.trove_entry(owner).require_trove_not_active()?;

        self.pool_state.require_at_least_min_net_debt(debt_amount)?;
        let composite_debt = self.pool_state.get_composite_debt(debt_amount)?;

        let icr = compute_cr(coll, composite_debt, price).ok_or(MathError::Overflow)?;
        let nicr = compute_nominal_cr(coll, composite_debt).ok_or(MathError::Overflow)?;

        if is_recovery_mode {
            self.pool_state.require_icr_is_above_ccr(icr)?;
        } else {
            self.pool_state.require_icr_is_above_mcr(icr)?;
            let new_tcr = self.pool_state.get_new_tcr_from_trove_change(
                coll,
                true,
                composite_debt,
                true,
                price,
            )?;
            self.pool_state.require_new_tcr_is_above_ccr(new_tcr)?;
        }

        let trove = self.book.trove_mut(&owner)?;
        trove.activate(coll, composite_debt);
        trove.update_reward_snapshot(&self.pool_state);
        let stake = trove.update_stake_and_total_stakes(&mut self.pool_state)?;

        self.book
            .insert_sorted(&mut self.pool_state, owner, nicr, hints.prev, hints.next)?;
        self.book.add_owner(owner)?;

        self.pool_state.increase_active_coll(coll)?;
        self.pool_state.increase_active_debt(composite_debt)?;

        emit!(TroveUpdated {
            borrower: owner,
            debt: composite_debt,
            coll,
            stake,
            operation: Operation::OpenTrove
        });
        Ok(composite_debt)
    }

    pub fn adjust_trove(
        &mut self,
        owner: Pubkey,
        adjustment: TroveAdjustment,
        hints: Hints,
        price: u64,
    ) -> Result<()> {
        self.atomically(|pool| pool.adjust_trove_inner(owner, adjustment, hints, price))
    }

    fn adjust_trove_inner(
        &mut self,
        owner: Pubkey,
        adjustment: TroveAdjustment,
        hints: Hints,
        price: u64,
    ) -> Result<()> {
        let TroveAdjustment {
            coll_change,
            is_coll_increase,
            debt_change,
            is_debt_increase,
        } = adjustment;

        require_non_zero_adjustment(coll_change, debt_change)?;
        if is_debt_increase {
            require_non_zero_debt_change(debt_change)?;
        }
        let is_recovery_mode = self.pool_state.check_recovery_mode(price)?;
        if is_recovery_mode {
            require_no_coll_withdrawal(coll_change, is_coll_increase)?;
        }

        let trove = self.book.trove_mut(&owner)?;
        trove.require_trove_active()?;
        trove.apply_pending_rewards(&mut self.pool_state)?;

        if !is_debt_increase && debt_change > 0 {
            self.pool_state
                .require_valid_debt_repayment(trove.debt, debt_change)?;
        }

        let old_icr = compute_cr(trove.coll, trove.debt, price).ok_or(MathError::Overflow)?;
        let (new_coll, new_debt) =
            trove.get_new_trove_amounts(coll_change, is_coll_increase, debt_change, is_debt_increase)?;
        let new_icr = compute_cr(new_coll, new_debt, price).ok_or(MathError::Overflow)?;

        if is_recovery_mode {
            if is_debt_increase {
                self.pool_state.require_icr_is_above_ccr(new_icr)?;
                require_new_icr_is_above_old_icr(new_icr, old_icr)?;
            }
        } else {
            self.pool_state.require_icr_is_above_mcr(new_icr)?;
            let new_tcr = self.pool_state.get_new_tcr_from_trove_change(
                coll_change,
                is_coll_increase,
                debt_change,
                is_debt_increase,
                price,
            )?;
            self.pool_state.require_new_tcr_is_above_ccr(new_tcr)?;
        }
        if !is_debt_increase && debt_change > 0 {
            let net_debt = self.pool_state.get_net_debt(new_debt)?;
            self.pool_state.require_at_least_min_net_debt(net_debt)?;
        }

        trove.coll = new_coll;
        trove.debt = new_debt;
        let stake = trove.update_stake_and_total_stakes(&mut self.pool_state)?;

        if is_coll_increase {
            self.pool_state.increase_active_coll(coll_change)?;
        } else {
            self.pool_state.decrease_active_coll(coll_change)?;
        }
        if is_debt_increase {
            self.pool_state.increase_active_debt(debt_change)?;
        } else {
            self.pool_state.decrease_active_debt(debt_change)?;
        }

        let new_nicr = compute_nominal_cr(new_coll, new_debt).ok_or(MathError::Overflow)?;
        self.book
            .re_insert(&mut self.pool_state, owner, new_nicr, hints.prev, hints.next)?;

        emit!(TroveUpdated {
            borrower: owner,
            debt: new_debt,
            coll: new_coll,
            stake,
            operation: Operation::AdjustTrove
        });
        Ok(())
    }

    /// Closes `owner`'s trove. The returned debt includes the gas compensation reserve.
    pub fn close_trove(&mut self, owner: Pubkey, price: u64) -> Result<ClosedTrove> {
        self.atomically(|pool| pool.close_trove_inner(owner, price))
    }

    fn close_trove_inner(&mut self, owner: Pubkey, price: u64) -> Result<ClosedTrove> {
        require!(
            !self.pool_state.check_recovery_mode(price)?,
            BorrowerOpsError::InRecoveryMode
        );
        self.pool_state.require_more_than_one_trove_in_system()?;

        let trove = self.book.trove_mut(&owner)?;
        trove.require_trove_active()?;
        trove.apply_pending_rewards(&mut self.pool_state)?;

        let closed = ClosedTrove {
            coll: trove.coll,
            debt: trove.debt,
        };
        let new_tcr = self.pool_state.get_new_tcr_from_trove_change(
            closed.coll,
            false,
            closed.debt,
            false,
            price,
        )?;
        self.pool_state.require_new_tcr_is_above_ccr(new_tcr)?;

        trove.remove_stake(&mut self.pool_state)?;
        trove.close(TroveStatus::ClosedByOwner);
        self.book.remove_sorted(&mut self.pool_state, &owner)?;
        self.book.remove_owner(&owner)?;

        self.pool_state.decrease_active_coll(closed.coll)?;
        self.pool_state.decrease_active_debt(closed.debt)?;

        emit!(TroveUpdated {
            borrower: owner,
            debt: 0,
            coll: 0,
            stake: 0,
            operation: Operation::CloseTrove
        });
        Ok(closed)
    }

    /// Debt the owner must repay to close: everything except the gas reserve.
    pub fn get_close_repayment(&self, closed: &ClosedTrove) -> Result<u64> {
        safe_sub(closed.debt, self.pool_state.gas_compensation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        constants::DECIMAL_PRECISION,
        engine::test_utils::{TestPool, DEBT},
        errors::BorrowerOpsError,
        state::TroveStatus,
        test_utils::assert_error_code,
    };

    #[test]
    fn open_trove_records_composite_debt() {
        let mut t = TestPool::new();
        let owner = t.open_trove_with_icr(2 * DECIMAL_PRECISION, DEBT);
        let trove = t.pool.book.trove(&owner).unwrap();
        assert_eq!(trove.debt, DEBT + t.pool.pool_state.gas_compensation);
        assert_eq!(trove.stake, trove.coll);
        assert_eq!(t.pool.pool_state.total_stakes, trove.coll);
        assert_eq!(t.pool.pool_state.active_debt, trove.debt);
        assert_eq!(t.pool.book.index_of(&owner), Some(0));
        assert_eq!(t.pool.book.first(&t.pool.pool_state), Some(owner));
    }

    #[test]
    fn open_trove_rules() {
        let mut t = TestPool::new();
        let owner = Pubkey::new_unique();
        assert_error_code(
            t.pool
                .open_trove(owner, 100 * DECIMAL_PRECISION, DEBT / 10, Hints::default(), t.price),
            BorrowerOpsError::DebtLessThanMin,
        );
        // 1 coll at 200 against 200 debt
        assert_error_code(
            t.pool
                .open_trove(owner, DECIMAL_PRECISION, DEBT * 2, Hints::default(), t.price),
            BorrowerOpsError::ICRLowerThanMCR,
        );
        // ICR 120% alone would drag TCR below CCR
        let coll = t.coll_for_icr(1_200_000_000, DEBT);
        assert_error_code(
            t.pool.open_trove(owner, coll, DEBT, Hints::default(), t.price),
            BorrowerOpsError::TCRLowerThanCCR,
        );
        assert_eq!(t.pool.book.status_of(&owner), TroveStatus::NonExistent);

        t.open_trove_at(owner, 2 * DECIMAL_PRECISION, DEBT);
        assert_error_code(
            t.pool.open_trove(owner, coll, DEBT, Hints::default(), t.price),
            BorrowerOpsError::TroveIsActive,
        );
    }

    #[test]
    fn recovery_mode_open_needs_ccr() {
        let mut t = TestPool::new();
        t.open_trove_with_icr(1_600_000_000, DEBT);
        t.open_trove_with_icr(1_600_000_000, DEBT);
        t.set_price(t.price / 10 * 9);
        assert!(t.pool.check_recovery_mode(t.price).unwrap());

        let owner = Pubkey::new_unique();
        let coll = t.coll_for_icr(1_400_000_000, DEBT);
        assert_error_code(
            t.pool.open_trove(owner, coll, DEBT, Hints::default(), t.price),
            BorrowerOpsError::ICRLowerThanCCR,
        );
        let coll = t.coll_for_icr(1_600_000_000, DEBT);
        t.pool
            .open_trove(owner, coll, DEBT, Hints::default(), t.price)
            .unwrap();
    }

    #[test]
    fn adjust_trove_moves_totals_and_order() {
        let mut t = TestPool::new();
        let a = t.open_trove_with_icr(3 * DECIMAL_PRECISION, DEBT);
        let b = t.open_trove_with_icr(2 * DECIMAL_PRECISION, DEBT);
        assert_eq!(t.pool.book.first(&t.pool.pool_state), Some(a));

        let coll_before = t.pool.pool_state.active_coll;
        let add = 5 * DECIMAL_PRECISION;
        t.pool
            .adjust_trove(
                b,
                TroveAdjustment {
                    coll_change: add,
                    is_coll_increase: true,
                    ..Default::default()
                },
                Hints::default(),
                t.price,
            )
            .unwrap();
        assert_eq!(t.pool.pool_state.active_coll, coll_before + add);
        assert_eq!(t.pool.book.first(&t.pool.pool_state), Some(b));
        let b_trove = t.pool.book.trove(&b).unwrap();
        assert_eq!(b_trove.stake, b_trove.coll);

        // Repaying into the gas reserve is refused
        let debt = t.pool.book.trove(&a).unwrap().debt;
        assert_error_code(
            t.pool.adjust_trove(
                a,
                TroveAdjustment {
                    debt_change: debt,
                    ..Default::default()
                },
                Hints::default(),
                t.price,
            ),
            BorrowerOpsError::InvalidDebtRepayment,
        );
        assert_error_code(
            t.pool.adjust_trove(a, TroveAdjustment::default(), Hints::default(), t.price),
            BorrowerOpsError::ZeroAdjustment,
        );
    }

    #[test]
    fn recovery_mode_blocks_coll_withdrawal() {
        let mut t = TestPool::new();
        let a = t.open_trove_with_icr(1_600_000_000, DEBT);
        t.open_trove_with_icr(1_600_000_000, DEBT);
        t.set_price(t.price / 10 * 9);

        assert_error_code(
            t.pool.adjust_trove(
                a,
                TroveAdjustment {
                    coll_change: 1,
                    ..Default::default()
                },
                Hints::default(),
                t.price,
            ),
            BorrowerOpsError::RecoveryNoCollWithdraw,
        );
        // Borrowing more would lower the ICR below CCR
        assert_error_code(
            t.pool.adjust_trove(
                a,
                TroveAdjustment {
                    debt_change: DECIMAL_PRECISION,
                    is_debt_increase: true,
                    ..Default::default()
                },
                Hints::default(),
                t.price,
            ),
            BorrowerOpsError::ICRLowerThanCCR,
        );
    }

    #[test]
    fn close_trove_returns_everything() {
        let mut t = TestPool::new();
        let a = t.open_trove_with_icr(2 * DECIMAL_PRECISION, DEBT);
        let b = t.open_trove_with_icr(3 * DECIMAL_PRECISION, DEBT);
        let a_trove = t.pool.book.trove(&a).unwrap().clone();

        let closed = t.pool.close_trove(a, t.price).unwrap();
        assert_eq!(closed.coll, a_trove.coll);
        assert_eq!(closed.debt, a_trove.debt);
        assert_eq!(t.pool.get_close_repayment(&closed).unwrap(), DEBT);
        assert_eq!(t.pool.book.status_of(&a), TroveStatus::ClosedByOwner);
        assert_eq!(t.pool.pool_state.total_stakes, t.pool.book.trove(&b).unwrap().stake);
        assert_eq!(t.pool.book.owners(), &[b]);
        assert_eq!(t.pool.book.size(&t.pool.pool_state), 1);

        assert_error_code(
            t.pool.close_trove(b, t.price),
            BorrowerOpsError::OnlyOneTrove,
        );
    }
}
