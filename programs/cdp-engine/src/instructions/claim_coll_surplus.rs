use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token::{Mint, Token, TokenAccount},
    token_2022::{transfer_checked, TransferChecked},
};

use crate::{
    state::{CollSurplusPool, PoolState, Trove},
    utils::PoolAccounts,
};

#[derive(Accounts)]
pub struct ClaimCollSurplus<'info> {
    #[account()]
    pub pool_state: Box<Account<'info, PoolState>>,

    #[account(
        mut,
        seeds = [
            b"trove",
            pool_state.key().as_ref(),
            borrower.key().as_ref(),
        ],
        bump
    )]
    pub trove: Box<Account<'info, Trove>>,

    #[account(
        mut,
        seeds = [
            b"coll-surplus",
            pool_state.key().as_ref(),
        ],
        bump
    )]
    pub coll_surplus_pool: Box<Account<'info, CollSurplusPool>>,

    #[account(
        constraint = collateral.key() == pool_state.collateral
    )]
    pub collateral: Box<Account<'info, Mint>>,

    #[account(
        mut,
        associated_token::mint = collateral,
        associated_token::authority = borrower,
    )]
    user_coll_ata: Box<Account<'info, TokenAccount>>,

    #[account(
        mut,
        associated_token::mint = collateral,
        associated_token::authority = coll_surplus_pool
    )]
    pub coll_surplus_vault: Box<Account<'info, TokenAccount>>,

    #[account(mut)]
    pub borrower: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

impl<'info> ClaimCollSurplus<'info> {
    pub fn pool_accounts(&mut self) -> PoolAccounts<'_> {
        PoolAccounts {
            pool_key: self.pool_state.key(),
            pool_state: &mut self.pool_state,
            trove_owners: None,
            sp_state: None,
            current_epoch_scale: None,
            coll_surplus_pool: Some(&mut **self.coll_surplus_pool),
        }
    }

    pub fn transfer_coll_out_ctx(&self) -> CpiContext<'_, '_, '_, 'info, TransferChecked<'info>> {
        let cpi_accounts = TransferChecked {
            from: self.coll_surplus_vault.to_account_info(),
            to: self.user_coll_ata.to_account_info(),
            authority: self.coll_surplus_pool.to_account_info(),
            mint: self.collateral.to_account_info(),
        };
        let cpi_program = self.token_program.to_account_info();
        CpiContext::new(cpi_program, cpi_accounts)
    }
}

pub fn claim_coll_surplus_handler(ctx: Context<ClaimCollSurplus>) -> Result<()> {
    let owner = ctx.accounts.borrower.key();

    let mut asset_pool = ctx.accounts.pool_accounts().load(&[])?;
    asset_pool.book.insert((**ctx.accounts.trove).clone());
    let amount = asset_pool.claim_coll_surplus(&owner)?;

    **ctx.accounts.trove = asset_pool.book.trove(&owner)?.clone();
    ctx.accounts.pool_accounts().store(&asset_pool, &[])?;

    move_token(ctx, amount)
}

pub fn move_token(ctx: Context<ClaimCollSurplus>, coll: u64) -> Result<()> {
    let pool_state = &ctx.accounts.pool_state;
    let pool_state_key = pool_state.key();
    let authority_seed = &pool_state.coll_surplus_seeds(&pool_state_key);

    transfer_checked(
        ctx.accounts
            .transfer_coll_out_ctx()
            .with_signer(&[&authority_seed[..]]),
        coll,
        ctx.accounts.collateral.decimals,
    )
}
