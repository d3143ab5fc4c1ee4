use std::cmp;

use anchor_lang::prelude::*;

use crate::{
    constants::DECIMAL_PRECISION,
    errors::{BorrowerOpsError, MathError},
    events::{Operation, Redemption, TroveUpdated},
    math::{compute_nominal_cr, mul_div, safe_add, safe_sub},
    state::TroveStatus,
    utils::require_non_zero_redeem_amount,
};

use super::{AssetPool, Hints};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedemptionTotals {
    pub attempted_debt_amount: u64,
    /// Debt cancelled across all redeemed troves; burned from the redeemer.
    pub total_debt_to_redeem: u64,
    /// Collateral sent to the redeemer.
    pub total_coll_drawn: u64,
    /// Gas reserves of fully redeemed troves; burned from the gas compensation vault.
    pub total_debt_gas_to_burn: u64,
    /// Collateral left on fully redeemed troves, moved to the surplus pool.
    pub total_coll_surplus: u64,
}

#[derive(Default, Debug)]
struct SingleRedemptionValues {
    debt_lot: u64,
    coll_lot: u64,
    cancelled_partial: bool,
}

impl AssetPool {
    /// Exchanges `debt_amount` of debt tokens for collateral at face value, starting
    /// with the riskiest trove whose ICR is at least MCR. `max_iterations` of zero
    /// means no limit. `partial_hints` position the last, partially redeemed trove.
    pub fn redeem_collateral(
        &mut self,
        debt_amount: u64,
        max_iterations: u32,
        partial_hints: Hints,
        price: u64,
    ) -> Result<RedemptionTotals> {
        self.atomically(|pool| {
            pool.redeem_collateral_inner(debt_amount, max_iterations, partial_hints, price)
        })
    }

    fn redeem_collateral_inner(
        &mut self,
        debt_amount: u64,
        max_iterations: u32,
        partial_hints: Hints,
        price: u64,
    ) -> Result<RedemptionTotals> {
        require_non_zero_redeem_amount(debt_amount)?;
        self.pool_state.require_tcr_over_mcr(price)?;

        let mut totals = RedemptionTotals {
            attempted_debt_amount: debt_amount,
            ..Default::default()
        };
        let mut remaining = debt_amount;

        let mut current = self.book.last(&self.pool_state);
        while let Some(owner) = current {
            if self.book.trove(&owner)?.get_current_icr(&self.pool_state, price)?
                >= self.pool_state.mcr
            {
                break;
            }
            current = self.book.prev_of(&owner)?;
        }

        let mut iterations = 0;
        while let Some(owner) = current {
            if remaining == 0 || (max_iterations > 0 && iterations == max_iterations) {
                break;
            }
            iterations += 1;
            let prev = self.book.prev_of(&owner)?;

            self.book
                .trove_mut(&owner)?
                .apply_pending_rewards(&mut self.pool_state)?;
            let single =
                self.redeem_collateral_from_trove(owner, remaining, partial_hints, price, &mut totals)?;
            if single.cancelled_partial {
                break;
            }

            totals.total_debt_to_redeem = safe_add(totals.total_debt_to_redeem, single.debt_lot)?;
            totals.total_coll_drawn = safe_add(totals.total_coll_drawn, single.coll_lot)?;
            remaining = safe_sub(remaining, single.debt_lot)?;
            current = prev;
        }
        require!(totals.total_coll_drawn > 0, BorrowerOpsError::ZeroCollDrawn);

        emit!(Redemption {
            attempted_debt_amount: debt_amount,
            actual_debt_amount: totals.total_debt_to_redeem,
            coll_sent: totals.total_coll_drawn,
        });

        self.pool_state
            .decrease_active_debt(totals.total_debt_to_redeem)?;
        self.pool_state.decrease_active_coll(totals.total_coll_drawn)?;
        Ok(totals)
    }

    fn redeem_collateral_from_trove(
        &mut self,
        owner: Pubkey,
        max_debt_amount: u64,
        partial_hints: Hints,
        price: u64,
        totals: &mut RedemptionTotals,
    ) -> Result<SingleRedemptionValues> {
        let gas_compensation = self.pool_state.gas_compensation;
        let trove = self.book.trove_mut(&owner)?;

        // Never redeem into the gas reserve
        let debt_lot = cmp::min(max_debt_amount, safe_sub(trove.debt, gas_compensation)?);
        let coll_lot = mul_div(debt_lot, DECIMAL_PRECISION, price)?;

        let new_debt = safe_sub(trove.debt, debt_lot)?;
        let new_coll = safe_sub(trove.coll, coll_lot)?;

        if new_debt == gas_compensation {
            trove.remove_stake(&mut self.pool_state)?;
            trove.close(TroveStatus::ClosedByRedemption);
            self.coll_surplus_pool.account_surplus(trove, new_coll)?;

            self.book.remove_sorted(&mut self.pool_state, &owner)?;
            self.book.remove_owner(&owner)?;

            self.pool_state.decrease_active_debt(gas_compensation)?;
            self.pool_state.decrease_active_coll(new_coll)?;
            totals.total_debt_gas_to_burn =
                safe_add(totals.total_debt_gas_to_burn, gas_compensation)?;
            totals.total_coll_surplus = safe_add(totals.total_coll_surplus, new_coll)?;

            emit!(TroveUpdated {
                borrower: owner,
                debt: 0,
                coll: 0,
                stake: 0,
                operation: Operation::RedeemCollateral
            });
        } else {
            if self.pool_state.get_net_debt(new_debt)? < self.pool_state.min_net_debt {
                return Ok(SingleRedemptionValues {
                    cancelled_partial: true,
                    ..Default::default()
                });
            }

            trove.debt = new_debt;
            trove.coll = new_coll;
            let stake = trove.update_stake_and_total_stakes(&mut self.pool_state)?;

            let new_nicr = compute_nominal_cr(new_coll, new_debt).ok_or(MathError::Overflow)?;
            self.book.re_insert(
                &mut self.pool_state,
                owner,
                new_nicr,
                partial_hints.prev,
                partial_hints.next,
            )?;

            emit!(TroveUpdated {
                borrower: owner,
                debt: new_debt,
                coll: new_coll,
                stake,
                operation: Operation::RedeemCollateral
            });
        }

        Ok(SingleRedemptionValues {
            debt_lot,
            coll_lot,
            cancelled_partial: false,
        })
    }
}
