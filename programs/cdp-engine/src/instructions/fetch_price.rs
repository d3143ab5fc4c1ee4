use anchor_lang::prelude::*;
use pyth_solana_receiver_sdk::price_update::PriceUpdateV2;

use crate::{
    errors::PriceFeedError,
    state::{PoolState, PriceFeedState},
};

#[derive(Accounts)]
pub struct FetchPrice<'info> {
    #[account()]
    pub pool_state: Box<Account<'info, PoolState>>,

    #[account(
        mut,
        seeds = [
            b"price_feed",
            pool_state.key().as_ref()
        ],
        bump = price_feed_state.bump
    )]
    pub price_feed_state: Box<Account<'info, PriceFeedState>>,

    #[account(
        constraint = pyth_feed_account.key() == price_feed_state.pyth_feed_account @ PriceFeedError::PythWrongFeed
    )]
    pub pyth_feed_account: Box<Account<'info, PriceUpdateV2>>,
}

pub fn fetch_price_handler(ctx: Context<FetchPrice>) -> Result<()> {
    let price = ctx
        .accounts
        .price_feed_state
        .fetch_price(&ctx.accounts.pyth_feed_account)?;

    msg!("Price {}", price);
    Ok(())
}
