use anchor_lang::prelude::*;

use crate::math::{mul_div, safe_add, safe_sub};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidationTotals {
    pub total_coll_in_sequence: u64,
    pub total_debt_in_sequence: u64,
    pub total_coll_gas_compensation: u64,
    pub total_debt_gas_compensation: u64,
    pub total_debt_to_offset: u64,
    pub total_coll_to_send_to_sp: u64,
    pub total_debt_to_redistribute: u64,
    pub total_coll_to_redistribute: u64,
    pub total_coll_surplus: u64,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidationValues {
    pub entire_trove_debt: u64,
    pub entire_trove_coll: u64,
    pub coll_gas_compensation: u64,
    pub debt_gas_compensation: u64,
    pub debt_to_offset: u64,
    pub coll_to_send_to_sp: u64,
    pub debt_to_redistribute: u64,
    pub coll_to_redistribute: u64,
    pub coll_surplus: u64,
}

#[derive(Default, Debug)]
pub struct LocalVariablesLiquidationSequence {
    pub remaining_debt_in_stab_pool: u64,
    pub icr: u64,
    pub recovery_mode_at_start: bool,
    pub back_to_normal_mode: bool,
    pub entire_system_debt: u64,
    pub entire_system_coll: u64,
}

impl LiquidationValues {
    /// Splits `coll` and the trove's entire debt between a stability pool offset of
    /// up to `debt_in_stab_pool` and redistribution of the rest.
    pub fn offset_and_redistribute(&mut self, coll: u64, debt_in_stab_pool: u64) -> Result<()> {
        if debt_in_stab_pool > 0 {
            self.debt_to_offset = std::cmp::min(self.entire_trove_debt, debt_in_stab_pool);
            self.coll_to_send_to_sp = mul_div(coll, self.debt_to_offset, self.entire_trove_debt)?;
            self.debt_to_redistribute = safe_sub(self.entire_trove_debt, self.debt_to_offset)?;
            self.coll_to_redistribute = safe_sub(coll, self.coll_to_send_to_sp)?;
        } else {
            self.debt_to_offset = 0;
            self.coll_to_send_to_sp = 0;
            self.debt_to_redistribute = self.entire_trove_debt;
            self.coll_to_redistribute = coll;
        }
        Ok(())
    }

    pub fn redistribute_all(&mut self, coll: u64) {
        self.debt_to_offset = 0;
        self.coll_to_send_to_sp = 0;
        self.debt_to_redistribute = self.entire_trove_debt;
        self.coll_to_redistribute = coll;
    }
}

impl LiquidationTotals {
    pub fn add_liquidation_values(&mut self, single_liquidation: &LiquidationValues) -> Result<()> {
        self.total_coll_gas_compensation = safe_add(
            self.total_coll_gas_compensation,
            single_liquidation.coll_gas_compensation,
        )?;
        self.total_debt_gas_compensation = safe_add(
            self.total_debt_gas_compensation,
            single_liquidation.debt_gas_compensation,
        )?;
        self.total_debt_in_sequence = safe_add(
            self.total_debt_in_sequence,
            single_liquidation.entire_trove_debt,
        )?;
        self.total_coll_in_sequence = safe_add(
            self.total_coll_in_sequence,
            single_liquidation.entire_trove_coll,
        )?;
        self.total_debt_to_offset =
            safe_add(self.total_debt_to_offset, single_liquidation.debt_to_offset)?;
        self.total_coll_to_send_to_sp = safe_add(
            self.total_coll_to_send_to_sp,
            single_liquidation.coll_to_send_to_sp,
        )?;
        self.total_debt_to_redistribute = safe_add(
            self.total_debt_to_redistribute,
            single_liquidation.debt_to_redistribute,
        )?;
        self.total_coll_to_redistribute = safe_add(
            self.total_coll_to_redistribute,
            single_liquidation.coll_to_redistribute,
        )?;
        self.total_coll_surplus =
            safe_add(self.total_coll_surplus, single_liquidation.coll_surplus)?;
        Ok(())
    }

    /// Collateral that left the system to depositors or redistribution, net of gas
    /// compensation and surplus.
    pub fn liquidated_coll(&self) -> Result<u64> {
        safe_sub(
            safe_sub(self.total_coll_in_sequence, self.total_coll_gas_compensation)?,
            self.total_coll_surplus,
        )
    }
}

impl LocalVariablesLiquidationSequence {
    /// Tracks the system totals as seen after `single_liquidation` without touching
    /// pool state, so recovery mode can be re-evaluated mid-sequence.
    pub fn update(&mut self, single_liquidation: &LiquidationValues) -> Result<()> {
        self.remaining_debt_in_stab_pool = safe_sub(
            self.remaining_debt_in_stab_pool,
            single_liquidation.debt_to_offset,
        )?;
        self.entire_system_debt =
            safe_sub(self.entire_system_debt, single_liquidation.debt_to_offset)?;
        self.entire_system_coll = safe_sub(
            safe_sub(
                safe_sub(
                    self.entire_system_coll,
                    single_liquidation.coll_to_send_to_sp,
                )?,
                single_liquidation.coll_gas_compensation,
            )?,
            single_liquidation.coll_surplus,
        )?;
        Ok(())
    }
}
