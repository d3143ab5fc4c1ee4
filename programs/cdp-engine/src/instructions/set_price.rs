use anchor_lang::prelude::*;

use crate::state::{PoolState, PriceFeedState};

#[derive(Accounts)]
pub struct SetPrice<'info> {
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

    pub authority: Signer<'info>,
}

/// Overrides the stored price. Any signer may do so in `dev` builds.
pub fn set_price_handler(ctx: Context<SetPrice>, new_price: u64) -> Result<()> {
    let price_feed_state = &mut ctx.accounts.price_feed_state;
    if !cfg!(feature = "dev") {
        price_feed_state.require_authority(&ctx.accounts.authority.key())?;
    }
    price_feed_state.set_price(new_price)?;
    Ok(())
}
