use std::collections::HashSet;

use anchor_lang::prelude::*;

use crate::{
    constants::ONE_HUNDRED_PERCENT,
    errors::{LiquidationError, MathError},
    events::{Liquidation, Operation, TroveLiquidated, TroveUpdated},
    math::{compute_cr, safe_sub},
    state::{LiquidationTotals, LiquidationValues, LocalVariablesLiquidationSequence, TroveStatus},
};

use super::AssetPool;

/// Outcome of considering one trove within a liquidation sequence.
enum Step {
    Liquidated(LiquidationValues),
    /// Not liquidatable now, but a later candidate may be.
    Skipped,
    /// No further candidate of a tail-first walk can be liquidated.
    Stop,
}

impl AssetPool {
    /// Liquidates a single active trove. Fails with `TroveNotActive` for an unknown or
    /// closed owner and with `NothingToLiquidate` if the trove is not liquidatable.
    pub fn liquidate(&mut self, owner: Pubkey, price: u64) -> Result<LiquidationTotals> {
        require!(
            self.book.status_of(&owner) == TroveStatus::Active,
            LiquidationError::TroveNotActive
        );
        self.batch_liquidate_troves(&[owner], price)
    }

    /// Walks up to `n` troves from the riskiest end of the sorted list, liquidating
    /// those the current system mode allows.
    pub fn liquidate_troves(&mut self, n: u64, price: u64) -> Result<LiquidationTotals> {
        self.atomically(|pool| {
            let mut vars = pool.start_sequence(price)?;
            let mut totals = LiquidationTotals::default();

            let mut current = pool.book.last(&pool.pool_state);
            let mut visited = 0;
            while let Some(owner) = current {
                if visited == n {
                    break;
                }
                visited += 1;
                // The owner is unlinked if liquidated
                let prev = pool.book.prev_of(&owner)?;
                match pool.try_liquidate(&mut vars, owner, price)? {
                    Step::Liquidated(single) => totals.add_liquidation_values(&single)?,
                    Step::Skipped => {}
                    Step::Stop => break,
                }
                current = prev;
            }

            pool.finish_sequence(&totals)?;
            Ok(totals)
        })
    }

    /// Liquidates the listed troves in the given order. Repeated owners, closed or
    /// unknown troves and troves that are not liquidatable are skipped.
    pub fn batch_liquidate_troves(
        &mut self,
        owners: &[Pubkey],
        price: u64,
    ) -> Result<LiquidationTotals> {
        require!(!owners.is_empty(), LiquidationError::EmptyTroveArray);

        self.atomically(|pool| {
            let mut vars = pool.start_sequence(price)?;
            let mut totals = LiquidationTotals::default();
            let mut seen = HashSet::with_capacity(owners.len());

            for owner in owners {
                if !seen.insert(*owner) {
                    continue;
                }
                if pool.book.status_of(owner) != TroveStatus::Active {
                    msg!("Skipping inactive trove {}", owner);
                    continue;
                }
                if let Step::Liquidated(single) = pool.try_liquidate(&mut vars, *owner, price)? {
                    totals.add_liquidation_values(&single)?;
                }
            }

            pool.finish_sequence(&totals)?;
            Ok(totals)
        })
    }

    /// Pays out `owner`'s collateral surplus and zeroes it.
    pub fn claim_coll_surplus(&mut self, owner: &Pubkey) -> Result<u64> {
        let trove = self.book.trove_mut(owner)?;
        self.coll_surplus_pool.claim_coll(trove)
    }

    fn start_sequence(&self, price: u64) -> Result<LocalVariablesLiquidationSequence> {
        let recovery_mode_at_start = self.pool_state.check_recovery_mode(price)?;
        Ok(LocalVariablesLiquidationSequence {
            remaining_debt_in_stab_pool: self.sp_state.total_deposits,
            icr: 0,
            recovery_mode_at_start,
            back_to_normal_mode: !recovery_mode_at_start,
            entire_system_debt: self.pool_state.get_entire_debt()?,
            entire_system_coll: self.pool_state.get_entire_coll()?,
        })
    }

    /// Applies the rules of the mode the sequence is in to `owner`. Recovery mode is
    /// re-evaluated from the running totals after every liquidation.
    fn try_liquidate(
        &mut self,
        vars: &mut LocalVariablesLiquidationSequence,
        owner: Pubkey,
        price: u64,
    ) -> Result<Step> {
        vars.icr = self.book.trove(&owner)?.get_current_icr(&self.pool_state, price)?;
        let mcr = self.pool_state.mcr;

        let single = if !vars.back_to_normal_mode {
            if vars.icr >= mcr && vars.remaining_debt_in_stab_pool == 0 {
                return Ok(Step::Stop);
            }
            let tcr = compute_cr(vars.entire_system_coll, vars.entire_system_debt, price)
                .ok_or(MathError::Overflow)?;
            self.liquidate_recovery_mode(owner, vars.icr, vars.remaining_debt_in_stab_pool, tcr, price)?
        } else if vars.icr < mcr {
            self.liquidate_normal_mode(owner, vars.remaining_debt_in_stab_pool)?
        } else {
            return Ok(Step::Stop);
        };

        let single = match single {
            Some(single) => single,
            None => return Ok(Step::Skipped),
        };
        vars.update(&single)?;
        vars.back_to_normal_mode = !self.pool_state.check_potential_recovery_mode(
            vars.entire_system_coll,
            vars.entire_system_debt,
            price,
        )?;
        Ok(Step::Liquidated(single))
    }

    fn liquidate_normal_mode(
        &mut self,
        owner: Pubkey,
        debt_in_stab_pool: u64,
    ) -> Result<Option<LiquidationValues>> {
        if self.pool_state.trove_size <= 1 {
            return Ok(None);
        }
        let (mut single, pending_debt, pending_coll) = self.entire_liquidation_values(&owner)?;
        let coll_to_liquidate = safe_sub(single.entire_trove_coll, single.coll_gas_compensation)?;
        single.offset_and_redistribute(coll_to_liquidate, debt_in_stab_pool)?;

        self.close_liquidated_trove(owner, pending_debt, pending_coll, 0)?;

        emit!(TroveLiquidated {
            borrower: owner,
            debt: single.entire_trove_debt,
            coll: single.entire_trove_coll,
            operation: Operation::LiquidateInNormalMode,
        });
        emit!(TroveUpdated {
            borrower: owner,
            debt: 0,
            coll: 0,
            stake: 0,
            operation: Operation::LiquidateInNormalMode,
        });
        Ok(Some(single))
    }

    fn liquidate_recovery_mode(
        &mut self,
        owner: Pubkey,
        icr: u64,
        debt_in_stab_pool: u64,
        tcr: u64,
        price: u64,
    ) -> Result<Option<LiquidationValues>> {
        if self.pool_state.trove_size <= 1 {
            return Ok(None);
        }
        let (mut single, pending_debt, pending_coll) = self.entire_liquidation_values(&owner)?;
        let coll_to_liquidate = safe_sub(single.entire_trove_coll, single.coll_gas_compensation)?;

        // ICR <= 100%: redistribute everything
        if icr <= ONE_HUNDRED_PERCENT {
            single.redistribute_all(coll_to_liquidate);
        // 100% < ICR < MCR: offset what the pool can take, redistribute the rest
        } else if icr < self.pool_state.mcr {
            single.offset_and_redistribute(coll_to_liquidate, debt_in_stab_pool)?;
        // MCR <= ICR < TCR: only when the pool absorbs the whole debt, at a capped rate
        } else if icr < tcr && single.entire_trove_debt <= debt_in_stab_pool {
            single = self.pool_state.get_capped_offset_vals(
                single.entire_trove_debt,
                single.entire_trove_coll,
                price,
            )?;
        } else {
            return Ok(None);
        }

        self.close_liquidated_trove(owner, pending_debt, pending_coll, single.coll_surplus)?;

        emit!(TroveLiquidated {
            borrower: owner,
            debt: single.entire_trove_debt,
            coll: safe_sub(single.entire_trove_coll, single.coll_surplus)?,
            operation: Operation::LiquidateInRecoveryMode,
        });
        emit!(TroveUpdated {
            borrower: owner,
            debt: 0,
            coll: 0,
            stake: 0,
            operation: Operation::LiquidateInRecoveryMode,
        });
        Ok(Some(single))
    }

    /// Entire debt and coll of `owner` with the gas compensation split off, plus the
    /// pending rewards that still sit in the default pool.
    fn entire_liquidation_values(&self, owner: &Pubkey) -> Result<(LiquidationValues, u64, u64)> {
        let (debt, coll, pending_debt, pending_coll) =
            self.book.trove(owner)?.get_entire_debt_coll(&self.pool_state)?;
        let single = LiquidationValues {
            entire_trove_debt: debt,
            entire_trove_coll: coll,
            coll_gas_compensation: self.pool_state.get_coll_gas_compensation(coll),
            debt_gas_compensation: self.pool_state.gas_compensation,
            ..Default::default()
        };
        Ok((single, pending_debt, pending_coll))
    }

    fn close_liquidated_trove(
        &mut self,
        owner: Pubkey,
        pending_debt: u64,
        pending_coll: u64,
        coll_surplus: u64,
    ) -> Result<()> {
        self.pool_state
            .move_pending_trove_rewards_to_active(pending_debt, pending_coll)?;

        let trove = self.book.trove_mut(&owner)?;
        trove.remove_stake(&mut self.pool_state)?;
        trove.close(TroveStatus::ClosedByLiquidation);
        self.coll_surplus_pool.account_surplus(trove, coll_surplus)?;

        self.book.remove_sorted(&mut self.pool_state, &owner)?;
        self.book.remove_owner(&owner)
    }

    /// Settles a sequence's totals against the pools: stability pool offset, then
    /// redistribution, surplus and gas compensation leave the active pool.
    fn finish_sequence(&mut self, totals: &LiquidationTotals) -> Result<()> {
        require!(
            totals.total_debt_in_sequence > 0,
            LiquidationError::NothingToLiquidate
        );

        let key = self.current_epoch_scale_key();
        let mut current_epoch_scale = self.epoch_scale(key.0, key.1);
        self.sp_state.offset(
            &mut current_epoch_scale,
            totals.total_debt_to_offset,
            totals.total_coll_to_send_to_sp,
        )?;
        self.epoch_scales.insert(key, current_epoch_scale);
        self.pool_state
            .move_offset_to_stability_pool(&mut self.sp_state, totals)?;

        self.pool_state.redistribute_debt_and_coll(
            totals.total_debt_to_redistribute,
            totals.total_coll_to_redistribute,
        )?;
        self.pool_state
            .decrease_active_coll(totals.total_coll_surplus)?;

        self.pool_state
            .update_system_snapshots_exclude_coll_remainder(totals.total_coll_gas_compensation)?;
        self.pool_state
            .decrease_active_coll(totals.total_coll_gas_compensation)?;

        emit!(Liquidation {
            debt: totals.total_debt_in_sequence,
            coll: totals.liquidated_coll()?,
            total_debt_compensation: totals.total_debt_gas_compensation,
            total_coll_compensation: totals.total_coll_gas_compensation,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        constants::DECIMAL_PRECISION,
        engine::{
            test_utils::{TestPool, DEBT, PRICE},
            Hints,
        },
        math::mul_div,
        test_utils::assert_error_code,
    };
    use proptest::prelude::*;

    const E9: u64 = DECIMAL_PRECISION;

    /// Two troves whose ICRs become 160% and 120% once the price halves, putting the
    /// system at TCR 140%.
    fn recovery_pool() -> (TestPool, Pubkey, Pubkey) {
        let mut t = TestPool::new();
        let safe = t.open_trove_with_icr(3_200_000_000, DEBT);
        let risky = t.open_trove_with_icr(2_400_000_000, DEBT);
        t.set_price(PRICE / 2);
        assert!(t.pool.check_recovery_mode(t.price).unwrap());
        (t, safe, risky)
    }

    fn assert_conserved(totals: &LiquidationTotals) {
        assert_eq!(
            totals.total_coll_in_sequence,
            totals.total_coll_to_send_to_sp
                + totals.total_coll_to_redistribute
                + totals.total_coll_surplus
                + totals.total_coll_gas_compensation
        );
        assert_eq!(
            totals.total_debt_in_sequence,
            totals.total_debt_to_offset + totals.total_debt_to_redistribute
        );
    }

    #[test]
    fn empty_pool_redistributes_underwater_trove() {
        let mut t = TestPool::new();
        t.open_trove(2 * E9, 160 * E9);
        t.open_trove(2_100_000_000, 160 * E9);
        let c = t.open_trove(2_200_000_000, 364 * E9);
        // 200%, 210% and 100% with the system at exactly 150%
        t.set_price(170 * E9);
        assert_eq!(t.icr(&c), E9);
        assert_eq!(t.pool.get_tcr(t.price).unwrap(), 1_500_000_000);

        let stake = t.pool.book.trove(&c).unwrap().stake;
        let total_stakes = t.pool.pool_state.total_stakes;
        let coll_gas = 2_200_000_000 / 200;

        let totals = t.pool.liquidate(c, t.price).unwrap();
        assert_conserved(&totals);
        assert_eq!(totals.total_debt_to_offset, 0);
        assert_eq!(totals.total_debt_to_redistribute, 374 * E9);
        assert_eq!(totals.total_coll_to_redistribute, 2_200_000_000 - coll_gas);

        assert_eq!(t.pool.pool_state.total_stakes, total_stakes - stake);
        assert_eq!(
            t.pool.pool_state.total_coll_snapshot,
            2 * E9 + 2_100_000_000 + (2_200_000_000 - coll_gas)
        );
        assert_eq!(t.pool.book.status_of(&c), TroveStatus::ClosedByLiquidation);
        assert_eq!(t.pool.book.owners_len(), 2);
        assert_eq!(t.pool.book.size(&t.pool.pool_state), 2);
    }

    #[test]
    fn liquidating_unknown_owner_changes_nothing() {
        let mut t = TestPool::new();
        t.open_trove_with_icr(2 * E9, DEBT);
        t.open_trove_with_icr(3 * E9, DEBT);
        t.set_price(PRICE / 4);
        let before = format!("{:?}", t.pool);

        assert_error_code(
            t.pool.liquidate(Pubkey::new_unique(), t.price),
            LiquidationError::TroveNotActive,
        );
        assert_eq!(format!("{:?}", t.pool), before);
    }

    #[test]
    fn normal_mode_offsets_against_stability_pool() {
        let mut t = TestPool::new();
        t.open_trove_with_icr(4 * E9, DEBT);
        let risky = t.open_trove_with_icr(2 * E9, DEBT);
        t.provide_to_sp(1_000 * E9);
        // risky falls to 105%, the system stays above CCR
        t.set_price(PRICE / 200 * 105);
        assert!(!t.pool.check_recovery_mode(t.price).unwrap());

        let risky_trove = t.pool.book.trove(&risky).unwrap().clone();
        let p_before = t.pool.sp_state.p;
        let totals = t.pool.liquidate(risky, t.price).unwrap();

        assert_conserved(&totals);
        assert_eq!(totals.total_debt_to_offset, risky_trove.debt);
        assert_eq!(totals.total_debt_to_redistribute, 0);
        assert_eq!(totals.total_coll_surplus, 0);
        assert_eq!(t.pool.sp_state.total_deposits, 1_000 * E9 - risky_trove.debt);
        assert_eq!(t.pool.sp_state.total_collateral, totals.total_coll_to_send_to_sp);
        assert!(t.pool.sp_state.p < p_before);
        assert_eq!(t.pool.pool_state.l_coll, 0);
    }

    #[test]
    fn partial_offset_redistributes_the_rest() {
        let mut t = TestPool::new();
        let safe = t.open_trove_with_icr(4 * E9, DEBT);
        let risky = t.open_trove_with_icr(2 * E9, DEBT);
        t.provide_to_sp(50 * E9);
        t.set_price(PRICE / 200 * 105);

        let totals = t.pool.liquidate(risky, t.price).unwrap();
        assert_conserved(&totals);
        assert_eq!(totals.total_debt_to_offset, 50 * E9);
        assert_eq!(totals.total_debt_to_redistribute, 60 * E9);
        // Pool emptied, a new epoch begins
        assert_eq!(t.pool.sp_state.total_deposits, 0);
        assert_eq!(t.pool.sp_state.current_epoch, 1);
        assert!(t.pool.pool_state.l_debt > 0);

        // The survivor carries the redistributed debt as a pending reward
        let pending = t.pool.get_pending_debt_reward(&safe).unwrap();
        assert!(60 * E9 - pending <= 3);
    }

    #[test]
    fn capped_liquidation_leaves_claimable_surplus() {
        let (mut t, safe, risky) = recovery_pool();
        t.provide_to_sp(500 * E9);
        let coll = t.pool.book.trove(&risky).unwrap().coll;
        let debt = t.pool.book.trove(&risky).unwrap().debt;
        let active_coll = t.pool.pool_state.active_coll;

        let totals = t.pool.liquidate(risky, t.price).unwrap();
        assert_conserved(&totals);

        // MCR times the debt's value
        let capped = mul_div(debt, t.pool.pool_state.mcr, t.price).unwrap();
        assert_eq!(totals.total_coll_gas_compensation + totals.total_coll_to_send_to_sp, capped);
        assert_eq!(totals.total_coll_surplus, coll - capped);
        assert_eq!(totals.total_debt_to_offset, debt);
        assert_eq!(t.pool.coll_surplus_pool.total_surplus, coll - capped);
        assert_eq!(t.pool.pool_state.active_coll, active_coll - coll);

        assert_eq!(t.pool.claim_coll_surplus(&risky).unwrap(), coll - capped);
        assert_error_code(
            t.pool.claim_coll_surplus(&risky),
            crate::errors::CollSurplusError::NoCollAvailableToClaim,
        );
        assert_eq!(t.pool.book.status_of(&safe), TroveStatus::Active);
    }

    #[test]
    fn capped_bucket_needs_the_whole_debt_covered() {
        let (mut t, _, risky) = recovery_pool();
        t.provide_to_sp(DEBT);
        assert_error_code(
            t.pool.liquidate(risky, t.price),
            LiquidationError::NothingToLiquidate,
        );
        assert_eq!(t.pool.book.status_of(&risky), TroveStatus::Active);
    }

    /// Opens `safe` and `edge` borrowing `safe_debt` and `DEBT`, then halves the price.
    /// Both ICRs halve exactly.
    fn halved_pool(safe_icr: u64, safe_debt: u64, edge_icr: u64) -> (TestPool, Pubkey, Pubkey) {
        let mut t = TestPool::new();
        let safe = t.open_trove_with_icr(safe_icr, safe_debt);
        let edge = t.open_trove_with_icr(edge_icr, DEBT);
        t.set_price(PRICE / 2);
        t.provide_to_sp(500 * E9);
        (t, safe, edge)
    }

    #[test]
    fn normal_mode_spares_trove_at_mcr() {
        let (mut t, _, edge) = halved_pool(4 * E9, 10 * DEBT, 2_200_000_000);
        assert!(!t.pool.check_recovery_mode(t.price).unwrap());
        assert_eq!(t.icr(&edge), t.pool.pool_state.mcr);

        assert_error_code(
            t.pool.liquidate(edge, t.price),
            LiquidationError::NothingToLiquidate,
        );
        assert_eq!(t.pool.book.status_of(&edge), TroveStatus::Active);
    }

    #[test]
    fn recovery_mode_caps_trove_at_mcr() {
        let (mut t, _, edge) = halved_pool(3_200_000_000, DEBT, 2_200_000_000);
        assert!(t.pool.check_recovery_mode(t.price).unwrap());
        assert_eq!(t.icr(&edge), t.pool.pool_state.mcr);
        let debt = t.pool.book.trove(&edge).unwrap().debt;

        let totals = t.pool.liquidate(edge, t.price).unwrap();
        assert_conserved(&totals);
        assert_eq!(totals.total_debt_to_offset, debt);
        assert_eq!(totals.total_debt_to_redistribute, 0);
        // Seized collateral is exactly MCR times the debt's value
        assert_eq!(totals.total_coll_surplus, 0);
        assert_eq!(t.pool.book.status_of(&edge), TroveStatus::ClosedByLiquidation);
    }

    #[test]
    fn recovery_mode_redistributes_trove_at_hundred_percent() {
        let (mut t, _, edge) = halved_pool(3_200_000_000, DEBT, 2 * E9);
        assert!(t.pool.check_recovery_mode(t.price).unwrap());
        assert_eq!(t.icr(&edge), ONE_HUNDRED_PERCENT);
        let debt = t.pool.book.trove(&edge).unwrap().debt;

        let totals = t.pool.liquidate(edge, t.price).unwrap();
        assert_conserved(&totals);
        assert_eq!(totals.total_debt_to_offset, 0);
        assert_eq!(totals.total_debt_to_redistribute, debt);
        assert_eq!(t.pool.sp_state.total_deposits, 500 * E9);
        assert_eq!(t.pool.book.status_of(&edge), TroveStatus::ClosedByLiquidation);
    }

    #[test]
    fn recovery_mode_skips_trove_at_tcr() {
        // Equal troves sit exactly at the system ratio
        let (mut t, _, edge) = halved_pool(2_800_000_000, DEBT, 2_800_000_000);
        assert!(t.pool.check_recovery_mode(t.price).unwrap());
        assert_eq!(t.icr(&edge), t.pool.get_tcr(t.price).unwrap());

        assert_error_code(
            t.pool.liquidate(edge, t.price),
            LiquidationError::NothingToLiquidate,
        );
        assert_eq!(t.pool.book.status_of(&edge), TroveStatus::Active);
    }

    #[test]
    fn sequence_walks_from_riskiest() {
        let mut t = TestPool::new();
        let safe = t.open_trove_with_icr(5 * E9, DEBT);
        let mid = t.open_trove_with_icr(3 * E9, DEBT);
        let worst = t.open_trove_with_icr(2 * E9, DEBT);
        let worse = t.open_trove_with_icr(2_100_000_000, DEBT);
        t.provide_to_sp(1_000 * E9);
        t.set_price(PRICE / 2);

        assert_error_code(
            t.pool.liquidate_troves(0, t.price),
            LiquidationError::NothingToLiquidate,
        );

        t.pool.liquidate_troves(1, t.price).unwrap();
        assert_eq!(t.pool.book.status_of(&worst), TroveStatus::ClosedByLiquidation);
        assert_eq!(t.pool.book.status_of(&worse), TroveStatus::Active);

        let totals = t.pool.liquidate_troves(10, t.price).unwrap();
        assert_eq!(totals.total_debt_in_sequence, DEBT + t.pool.pool_state.gas_compensation);
        assert_eq!(t.pool.book.status_of(&worse), TroveStatus::ClosedByLiquidation);
        assert_eq!(t.sorted_owners(), vec![safe, mid]);
    }

    #[test]
    fn recovery_sequence_stops_once_back_to_normal() {
        let mut t = TestPool::new();
        let safe = t.open_trove_with_icr(3_200_000_000, 990 * E9);
        let mid = t.open_trove_with_icr(2_600_000_000, DEBT);
        let worst = t.open_trove_with_icr(2_100_000_000, 990 * E9);
        t.provide_to_sp(2_000 * E9);
        t.set_price(PRICE / 2);
        assert!(t.pool.check_recovery_mode(t.price).unwrap());

        let totals = t.pool.liquidate_troves(10, t.price).unwrap();
        assert_eq!(totals.total_debt_in_sequence, 1_000 * E9);
        assert_eq!(t.pool.book.status_of(&worst), TroveStatus::ClosedByLiquidation);
        // 130% is below the TCR but the system left recovery mode first
        assert_eq!(t.pool.book.status_of(&mid), TroveStatus::Active);
        assert_eq!(t.pool.book.status_of(&safe), TroveStatus::Active);
        assert!(!t.pool.check_recovery_mode(t.price).unwrap());
    }

    #[test]
    fn last_trove_is_never_liquidated() {
        let mut t = TestPool::new();
        let a = t.open_trove_with_icr(2 * E9, DEBT);
        let b = t.open_trove_with_icr(3 * E9, DEBT);
        t.set_price(PRICE / 10);
        t.pool.liquidate_troves(10, t.price).unwrap();
        assert_eq!(t.pool.book.status_of(&a), TroveStatus::ClosedByLiquidation);
        assert_error_code(
            t.pool.liquidate(b, t.price),
            LiquidationError::NothingToLiquidate,
        );
    }

    #[test]
    fn batch_skips_duplicates_and_closed_troves() {
        let mut t = TestPool::new();
        t.open_trove_with_icr(6 * E9, DEBT);
        let closed = t.open_trove_with_icr(5 * E9, DEBT);
        let a = t.open_trove_with_icr(2 * E9, DEBT);
        let b = t.open_trove_with_icr(2_100_000_000, DEBT);
        t.pool.close_trove(closed, t.price).unwrap();
        t.provide_to_sp(150 * E9);
        t.set_price(PRICE / 2);

        let mut clean = t.pool.clone();
        let expected = clean.batch_liquidate_troves(&[b, a], t.price).unwrap();
        let totals = t
            .pool
            .batch_liquidate_troves(&[b, b, closed, Pubkey::new_unique(), a, b], t.price)
            .unwrap();
        assert_eq!(totals, expected);
        assert_eq!(
            format!("{:?}", t.pool.pool_state),
            format!("{:?}", clean.pool_state)
        );

        assert_error_code(
            t.pool.batch_liquidate_troves(&[], t.price),
            LiquidationError::EmptyTroveArray,
        );
    }

    #[test]
    fn accumulators_never_decrease() {
        let mut t = TestPool::new();
        let mut owners = vec![];
        for i in 0..6u64 {
            owners.push(t.open_trove_with_icr(2 * E9 + i * 150_000_000, DEBT + i * E9));
        }
        t.provide_to_sp(150 * E9);

        let mut last = (t.pool.pool_state.l_coll, t.pool.pool_state.l_debt);
        let mut last_p = (
            t.pool.sp_state.current_epoch,
            t.pool.sp_state.current_scale,
            t.pool.sp_state.p,
        );
        let mut price = t.price;
        for owner in owners.iter().take(5) {
            while t.icr(owner) >= t.pool.pool_state.mcr {
                price = price / 10 * 9;
                t.set_price(price);
            }
            let totals = t.pool.liquidate(*owner, t.price).unwrap();
            assert_conserved(&totals);

            let l = (t.pool.pool_state.l_coll, t.pool.pool_state.l_debt);
            assert!(l.0 >= last.0 && l.1 >= last.1);
            last = l;

            let p = (
                t.pool.sp_state.current_epoch,
                t.pool.sp_state.current_scale,
                t.pool.sp_state.p,
            );
            // P only grows back when a new epoch or scale starts
            assert!((p.0, p.1) > (last_p.0, last_p.1) || p.2 <= last_p.2);
            last_p = p;
        }
    }

    #[test]
    fn pending_rewards_match_redistributed_totals() {
        let mut t = TestPool::new();
        let survivors: Vec<Pubkey> = (0..4u64)
            .map(|i| t.open_trove_with_icr(4 * E9 + i * E9, DEBT + i * 7 * E9))
            .collect();
        let a = t.open_trove_with_icr(2 * E9, DEBT);
        let b = t.open_trove_with_icr(2_050_000_000, 3 * DEBT);
        t.set_price(PRICE / 2);

        t.pool.liquidate(a, t.price).unwrap();
        // b picked up part of a's debt and coll
        let (_, _, pending_debt, pending_coll) = t.pool.get_entire_debt_and_coll(&b).unwrap();
        assert!(pending_debt > 0 && pending_coll > 0);
        t.pool.liquidate(b, t.price).unwrap();

        let state = &t.pool.pool_state;
        let mut coll_rewards = 0;
        let mut debt_rewards = 0;
        for owner in &survivors {
            let trove = t.pool.book.trove(owner).unwrap();
            let coll_reward = (trove.stake as u128 * state.l_coll / E9 as u128) as u64;
            let debt_reward = (trove.stake as u128 * state.l_debt / E9 as u128) as u64;
            assert_eq!(t.pool.get_pending_coll_reward(owner).unwrap(), coll_reward);
            assert_eq!(t.pool.get_pending_debt_reward(owner).unwrap(), debt_reward);
            assert_eq!(
                t.icr(owner),
                compute_cr(trove.coll + coll_reward, trove.debt + debt_reward, t.price).unwrap()
            );
            coll_rewards += coll_reward;
            debt_rewards += debt_reward;
        }
        // Rounding only ever leaves dust in the default pool
        assert!(state.liquidated_coll >= coll_rewards && state.liquidated_coll - coll_rewards <= 100);
        assert!(state.closed_debt >= debt_rewards && state.closed_debt - debt_rewards <= 100);

        // Touching a survivor materializes exactly its pending reward
        let owner = survivors[0];
        let before = t.pool.get_entire_debt_and_coll(&owner).unwrap();
        t.pool
            .adjust_trove(
                owner,
                crate::engine::TroveAdjustment {
                    coll_change: 1,
                    is_coll_increase: true,
                    ..Default::default()
                },
                Hints::default(),
                t.price,
            )
            .unwrap();
        let trove = t.pool.book.trove(&owner).unwrap();
        assert_eq!((trove.debt, trove.coll), (before.0, before.1 + 1));
        assert_eq!(t.pool.get_pending_coll_reward(&owner).unwrap(), 0);
    }

    proptest! {
        #[test]
        fn troves_at_or_above_tcr_are_never_liquidated(
            deposits in prop_oneof![Just(0u64), 1..1_000_000 * E9],
            n in 1u64..5,
        ) {
            let (mut t, safe, _) = recovery_pool();
            if deposits > 0 {
                t.provide_to_sp(deposits);
            }
            prop_assert!(t.icr(&safe) >= t.pool.get_tcr(t.price).unwrap());

            // Only the risky trove may go
            match t.pool.liquidate_troves(n, t.price) {
                Ok(totals) => prop_assert!(totals.total_debt_in_sequence <= DEBT + 10 * E9),
                err => assert_error_code(err, LiquidationError::NothingToLiquidate),
            }
            prop_assert_eq!(t.pool.book.status_of(&safe), TroveStatus::Active);

            assert_error_code(
                t.pool.batch_liquidate_troves(&[safe], t.price),
                LiquidationError::NothingToLiquidate,
            );
            prop_assert_eq!(t.pool.book.status_of(&safe), TroveStatus::Active);
        }
    }
}
