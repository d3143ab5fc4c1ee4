use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token::{Mint, Token, TokenAccount},
    token_2022::{burn, transfer_checked, Burn, TransferChecked},
};

use crate::{
    state::{PoolState, PriceFeedState, Trove, TroveOwners},
    utils::PoolAccounts,
};

#[derive(Accounts)]
pub struct CloseTrove<'info> {
    #[account(mut)]
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
            b"trove-owners",
            pool_state.key().as_ref(),
        ],
        bump
    )]
    pub trove_owners: Box<Account<'info, TroveOwners>>,

    #[account(
        mut,
        associated_token::mint = collateral,
        associated_token::authority = borrower,
    )]
    user_coll_ata: Box<Account<'info, TokenAccount>>,

    #[account(
        mut,
        associated_token::mint = stablecoin,
        associated_token::authority = borrower
    )]
    pub user_stablecoin_ata: Box<Account<'info, TokenAccount>>,

    /// CHECK: This account is not read or written
    #[account(
        seeds = [
            b"token-authority",
            pool_state.key().as_ref()
        ],
        bump
    )]
    pub token_authority: UncheckedAccount<'info>,

    #[account(
        mut,
        associated_token::mint = collateral,
        associated_token::authority = token_authority
    )]
    pub collateral_vault: Box<Account<'info, TokenAccount>>,

    #[account(
        mut,
        associated_token::mint = stablecoin,
        associated_token::authority = token_authority
    )]
    pub gas_compensation_vault: Box<Account<'info, TokenAccount>>,

    #[account(
        mut,
        constraint = stablecoin.key() == pool_state.stablecoin
    )]
    pub stablecoin: Box<Account<'info, Mint>>,

    #[account(
        constraint = collateral.key() == pool_state.collateral
    )]
    pub collateral: Box<Account<'info, Mint>>,

    #[account(
        seeds = [
            b"price_feed",
            pool_state.key().as_ref()
        ],
        bump = price_feed_state.bump
    )]
    pub price_feed_state: Box<Account<'info, PriceFeedState>>,

    #[account(mut)]
    pub borrower: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

impl<'info> CloseTrove<'info> {
    pub fn pool_accounts(&mut self) -> PoolAccounts<'_> {
        PoolAccounts {
            pool_key: self.pool_state.key(),
            pool_state: &mut self.pool_state,
            trove_owners: Some(&mut **self.trove_owners),
            sp_state: None,
            current_epoch_scale: None,
            coll_surplus_pool: None,
        }
    }

    pub fn burn_repayment_ctx(&self) -> CpiContext<'_, '_, '_, 'info, Burn<'info>> {
        let cpi_accounts = Burn {
            mint: self.stablecoin.to_account_info(),
            from: self.user_stablecoin_ata.to_account_info(),
            authority: self.borrower.to_account_info(),
        };
        let cpi_program = self.token_program.to_account_info();
        CpiContext::new(cpi_program, cpi_accounts)
    }

    pub fn burn_gas_compensation_ctx(&self) -> CpiContext<'_, '_, '_, 'info, Burn<'info>> {
        let cpi_accounts = Burn {
            mint: self.stablecoin.to_account_info(),
            from: self.gas_compensation_vault.to_account_info(),
            authority: self.token_authority.to_account_info(),
        };
        let cpi_program = self.token_program.to_account_info();
        CpiContext::new(cpi_program, cpi_accounts)
    }

    pub fn transfer_coll_out_ctx(&self) -> CpiContext<'_, '_, '_, 'info, TransferChecked<'info>> {
        let cpi_accounts = TransferChecked {
            from: self.collateral_vault.to_account_info(),
            to: self.user_coll_ata.to_account_info(),
            authority: self.token_authority.to_account_info(),
            mint: self.collateral.to_account_info(),
        };
        let cpi_program = self.token_program.to_account_info();
        CpiContext::new(cpi_program, cpi_accounts)
    }
}

/// Remaining accounts: the trove's current list neighbours.
pub fn close_trove_handler(ctx: Context<CloseTrove>) -> Result<()> {
    let price = ctx.accounts.price_feed_state.get_price()?;
    let borrower = ctx.accounts.borrower.key();

    let mut asset_pool = ctx.accounts.pool_accounts().load(ctx.remaining_accounts)?;
    asset_pool.book.insert((**ctx.accounts.trove).clone());

    let closed = asset_pool.close_trove(borrower, price)?;
    let repayment = asset_pool.get_close_repayment(&closed)?;

    **ctx.accounts.trove = asset_pool.book.trove(&borrower)?.clone();
    ctx.accounts
        .pool_accounts()
        .store(&asset_pool, ctx.remaining_accounts)?;

    let pool_state = &ctx.accounts.pool_state;
    let pool_state_key = pool_state.key();
    let authority_seed = &pool_state.token_auth_seeds(&pool_state_key);

    burn(ctx.accounts.burn_repayment_ctx(), repayment)?;
    burn(
        ctx.accounts
            .burn_gas_compensation_ctx()
            .with_signer(&[&authority_seed[..]]),
        pool_state.gas_compensation,
    )?;
    transfer_checked(
        ctx.accounts
            .transfer_coll_out_ctx()
            .with_signer(&[&authority_seed[..]]),
        closed.coll,
        ctx.accounts.collateral.decimals,
    )
}
