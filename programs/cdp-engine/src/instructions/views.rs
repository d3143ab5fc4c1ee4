use anchor_lang::prelude::*;

use crate::{
    engine::AssetPool,
    errors::ConfigError,
    state::{PoolState, PriceFeedState, Trove},
    utils::PoolAccounts,
};

/// Read-only accounts for the system-wide views. Nothing is written back.
#[derive(Accounts)]
pub struct PoolView<'info> {
    #[account()]
    pub pool_state: Box<Account<'info, PoolState>>,

    #[account(
        seeds = [
            b"price_feed",
            pool_state.key().as_ref()
        ],
        bump = price_feed_state.bump
    )]
    pub price_feed_state: Box<Account<'info, PriceFeedState>>,
}

#[derive(Accounts)]
pub struct TroveView<'info> {
    #[account()]
    pub pool_state: Box<Account<'info, PoolState>>,

    #[account(
        constraint = trove.pool_state == pool_state.key() @ ConfigError::PoolMismatch
    )]
    pub trove: Box<Account<'info, Trove>>,

    #[account(
        seeds = [
            b"price_feed",
            pool_state.key().as_ref()
        ],
        bump = price_feed_state.bump
    )]
    pub price_feed_state: Box<Account<'info, PriceFeedState>>,
}

fn view_pool(
    pool_key: Pubkey,
    pool_state: &mut PoolState,
    trove: Option<&Trove>,
) -> Result<AssetPool> {
    let mut asset_pool = PoolAccounts {
        pool_key,
        pool_state,
        trove_owners: None,
        sp_state: None,
        current_epoch_scale: None,
        coll_surplus_pool: None,
    }
    .load(&[])?;
    if let Some(trove) = trove {
        asset_pool.book.insert(trove.clone());
    }
    Ok(asset_pool)
}

impl<'info> PoolView<'info> {
    fn asset_pool(&mut self) -> Result<AssetPool> {
        view_pool(self.pool_state.key(), &mut self.pool_state, None)
    }
}

impl<'info> TroveView<'info> {
    fn asset_pool(&mut self) -> Result<AssetPool> {
        view_pool(self.pool_state.key(), &mut self.pool_state, Some(&**self.trove))
    }
}

pub fn check_recovery_mode_handler(ctx: Context<PoolView>) -> Result<bool> {
    let price = ctx.accounts.price_feed_state.get_price()?;
    ctx.accounts.asset_pool()?.check_recovery_mode(price)
}

pub fn get_tcr_handler(ctx: Context<PoolView>) -> Result<u64> {
    let price = ctx.accounts.price_feed_state.get_price()?;
    ctx.accounts.asset_pool()?.get_tcr(price)
}

pub fn get_entire_system_coll_handler(ctx: Context<PoolView>) -> Result<u64> {
    ctx.accounts.asset_pool()?.get_entire_system_coll()
}

pub fn get_entire_system_debt_handler(ctx: Context<PoolView>) -> Result<u64> {
    ctx.accounts.asset_pool()?.get_entire_system_debt()
}

pub fn get_current_icr_handler(ctx: Context<TroveView>) -> Result<u64> {
    let price = ctx.accounts.price_feed_state.get_price()?;
    let owner = ctx.accounts.trove.owner;
    ctx.accounts.asset_pool()?.get_current_icr(&owner, price)
}

pub fn get_pending_coll_reward_handler(ctx: Context<TroveView>) -> Result<u64> {
    let owner = ctx.accounts.trove.owner;
    ctx.accounts.asset_pool()?.get_pending_coll_reward(&owner)
}

pub fn get_pending_debt_reward_handler(ctx: Context<TroveView>) -> Result<u64> {
    let owner = ctx.accounts.trove.owner;
    ctx.accounts.asset_pool()?.get_pending_debt_reward(&owner)
}
