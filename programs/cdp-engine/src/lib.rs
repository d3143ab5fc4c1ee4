use anchor_lang::prelude::*;

declare_id!("CVGT8oK6mDzdr3cfXABSGZLuhAgLY5LBz1qpvQiCmwqQ");

mod constants;
mod engine;
mod errors;
mod events;
mod instructions;
mod math;
mod state;
mod utils;

#[cfg(test)]
mod test_utils;

use engine::{Hints, TroveAdjustment};
use instructions::*;
use state::PoolConfig;

#[program]
pub mod cdp_engine {
    use super::*;

    pub fn initialize(ctx: Context<Initialize>, config: PoolConfig) -> Result<()> {
        initialize_handler(ctx, config)
    }

    pub fn initialize_trove(ctx: Context<InitializeTrove>) -> Result<()> {
        initialize_trove_handler(ctx)
    }

    pub fn initialize_price_feed(ctx: Context<InitializePriceFeed>) -> Result<()> {
        initialize_price_feed_handler(ctx)
    }

    pub fn initialize_current_epoch_scale(ctx: Context<InitializeEpochScale>) -> Result<()> {
        initialize_current_epoch_scale_handler(ctx)
    }

    // Price feed
    pub fn set_price(ctx: Context<SetPrice>, new_price: u64) -> Result<()> {
        set_price_handler(ctx, new_price)
    }

    pub fn fetch_price(ctx: Context<FetchPrice>) -> Result<()> {
        fetch_price_handler(ctx)
    }

    // Borrower operations
    pub fn open_trove(
        ctx: Context<OpenTrove>,
        coll_amount: u64,
        debt_amount: u64,
        hints: Hints,
    ) -> Result<()> {
        open_trove_handler(ctx, coll_amount, debt_amount, hints)
    }

    pub fn adjust_trove(
        ctx: Context<AdjustTrove>,
        adjustment: TroveAdjustment,
        hints: Hints,
    ) -> Result<()> {
        adjust_trove_handler(ctx, adjustment, hints)
    }

    pub fn close_trove(ctx: Context<CloseTrove>) -> Result<()> {
        close_trove_handler(ctx)
    }

    pub fn claim_coll_surplus(ctx: Context<ClaimCollSurplus>) -> Result<()> {
        claim_coll_surplus_handler(ctx)
    }

    // Liquidations
    pub fn liquidate_trove(ctx: Context<Liquidate>, borrower: Pubkey) -> Result<()> {
        liquidate_trove_handler(ctx, borrower)
    }

    pub fn liquidate_troves(ctx: Context<Liquidate>, n: u64) -> Result<()> {
        liquidate_troves_handler(ctx, n)
    }

    pub fn batch_liquidate_troves(ctx: Context<Liquidate>, borrowers: Vec<Pubkey>) -> Result<()> {
        batch_liquidate_troves_handler(ctx, borrowers)
    }

    pub fn redeem_collateral(
        ctx: Context<RedeemCollateral>,
        debt_amount: u64,
        max_iterations: u32,
        partial_hints: Hints,
    ) -> Result<()> {
        redeem_collateral_handler(ctx, debt_amount, max_iterations, partial_hints)
    }

    // Stability Pool
    pub fn provide_to_sp(ctx: Context<ProvideToSP>, amount: u64) -> Result<()> {
        provide_to_sp_handler(ctx, amount)
    }

    pub fn withdraw_from_sp(ctx: Context<WithdrawFromSP>, amount: u64) -> Result<()> {
        withdraw_from_sp_handler(ctx, amount)
    }

    pub fn claim_from_sp(ctx: Context<ClaimFromSP>) -> Result<()> {
        claim_from_sp_handler(ctx)
    }

    // Views
    pub fn check_recovery_mode(ctx: Context<PoolView>) -> Result<bool> {
        check_recovery_mode_handler(ctx)
    }

    pub fn get_tcr(ctx: Context<PoolView>) -> Result<u64> {
        get_tcr_handler(ctx)
    }

    pub fn get_entire_system_coll(ctx: Context<PoolView>) -> Result<u64> {
        get_entire_system_coll_handler(ctx)
    }

    pub fn get_entire_system_debt(ctx: Context<PoolView>) -> Result<u64> {
        get_entire_system_debt_handler(ctx)
    }

    pub fn get_current_icr(ctx: Context<TroveView>) -> Result<u64> {
        get_current_icr_handler(ctx)
    }

    pub fn get_pending_coll_reward(ctx: Context<TroveView>) -> Result<u64> {
        get_pending_coll_reward_handler(ctx)
    }

    pub fn get_pending_debt_reward(ctx: Context<TroveView>) -> Result<u64> {
        get_pending_debt_reward_handler(ctx)
    }
}
