use anchor_lang::prelude::*;
use pyth_solana_receiver_sdk::price_update::PriceUpdateV2;

use crate::state::{PoolState, PriceFeedState};

#[derive(Accounts)]
pub struct InitializePriceFeed<'info> {
    #[account(
        constraint = pool_state.creator == creator.key()
    )]
    pub pool_state: Box<Account<'info, PoolState>>,

    #[account(
        init,
        payer = creator,
        space = 8 + PriceFeedState::INIT_SPACE,
        seeds = [
            b"price_feed",
            pool_state.key().as_ref()
        ],
        bump
    )]
    pub price_feed_state: Account<'info, PriceFeedState>,

    #[account()]
    pub pyth_feed_account: Account<'info, PriceUpdateV2>,

    #[account(mut)]
    pub creator: Signer<'info>,

    pub system_program: Program<'info, System>,
}

pub fn initialize_price_feed_handler(ctx: Context<InitializePriceFeed>) -> Result<()> {
    let price_feed_state = &mut ctx.accounts.price_feed_state;
    **price_feed_state = PriceFeedState {
        pool_state: ctx.accounts.pool_state.key(),
        authority: ctx.accounts.creator.key(),
        pyth_feed_account: ctx.accounts.pyth_feed_account.key(),
        last_good_price: 0,
        bump: ctx.bumps.price_feed_state,
    };

    let price = price_feed_state.fetch_price(&ctx.accounts.pyth_feed_account)?;
    msg!("Price {}", price);
    Ok(())
}
