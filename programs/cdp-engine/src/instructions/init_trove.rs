use crate::state::{PoolState, Trove};
use anchor_lang::prelude::*;

/// Creates the borrower's trove account for one asset. The trove stays
/// `NonExistent` until `open_trove`; the account is reused after it closes.
#[derive(Accounts)]
pub struct InitializeTrove<'info> {
    pub pool_state: Box<Account<'info, PoolState>>,

    #[account(
        init,
        payer = borrower,
        space = 8 + Trove::INIT_SPACE,
        seeds = [
            b"trove",
            pool_state.key().as_ref(),
            borrower.key().as_ref(),
        ],
        bump
    )]
    pub trove: Box<Account<'info, Trove>>,

    #[account(mut)]
    pub borrower: Signer<'info>,

    pub system_program: Program<'info, System>,
}

pub fn initialize_trove_handler(ctx: Context<InitializeTrove>) -> Result<()> {
    let trove = Trove::new(ctx.accounts.pool_state.key(), ctx.accounts.borrower.key());
    msg!("Trove account for {}", trove.owner);

    **ctx.accounts.trove = trove;
    Ok(())
}
