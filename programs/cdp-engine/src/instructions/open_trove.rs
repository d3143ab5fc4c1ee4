use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token::{Mint, Token, TokenAccount},
    token_2022::{mint_to, transfer_checked, MintTo, TransferChecked},
};

use crate::{
    engine::Hints,
    state::{PoolState, PriceFeedState, Trove, TroveOwners},
    utils::PoolAccounts,
};

#[derive(Accounts)]
pub struct OpenTrove<'info> {
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
    pub stablecoin_receive_account: Box<Account<'info, TokenAccount>>,

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

impl<'info> OpenTrove<'info> {
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

    pub fn transfer_coll_ctx(&self) -> CpiContext<'_, '_, '_, 'info, TransferChecked<'info>> {
        let cpi_accounts = TransferChecked {
            from: self.user_coll_ata.to_account_info(),
            to: self.collateral_vault.to_account_info(),
            authority: self.borrower.to_account_info(),
            mint: self.collateral.to_account_info(),
        };

        let cpi_program = self.token_program.to_account_info();

        CpiContext::new(cpi_program, cpi_accounts)
    }

    pub fn mint_stablecoin_to_user_ctx(&self) -> CpiContext<'_, '_, '_, 'info, MintTo<'info>> {
        let cpi_accounts = MintTo {
            mint: self.stablecoin.to_account_info(),
            to: self.stablecoin_receive_account.to_account_info(),
            authority: self.token_authority.to_account_info(),
        };

        let cpi_program = self.token_program.to_account_info();

        CpiContext::new(cpi_program, cpi_accounts)
    }

    pub fn mint_stablecoin_to_gas_compensation_ctx(
        &self,
    ) -> CpiContext<'_, '_, '_, 'info, MintTo<'info>> {
        let cpi_accounts = MintTo {
            mint: self.stablecoin.to_account_info(),
            to: self.gas_compensation_vault.to_account_info(),
            authority: self.token_authority.to_account_info(),
        };

        let cpi_program = self.token_program.to_account_info();

        CpiContext::new(cpi_program, cpi_accounts)
    }
}

/// Remaining accounts: the troves named by the hints, plus any trove the list walk
/// may pass through when the hints are stale.
pub fn open_trove_handler(
    ctx: Context<OpenTrove>,
    coll_amount: u64,
    debt_amount: u64,
    hints: Hints,
) -> Result<()> {
    let price = ctx.accounts.price_feed_state.get_price()?;
    let borrower = ctx.accounts.borrower.key();

    let mut asset_pool = ctx.accounts.pool_accounts().load(ctx.remaining_accounts)?;
    asset_pool.book.insert((**ctx.accounts.trove).clone());

    asset_pool.open_trove(borrower, coll_amount, debt_amount, hints, price)?;

    **ctx.accounts.trove = asset_pool.book.trove(&borrower)?.clone();
    ctx.accounts
        .pool_accounts()
        .store(&asset_pool, ctx.remaining_accounts)?;

    let pool_state = &ctx.accounts.pool_state;
    let pool_state_key = pool_state.key();
    let authority_seed = &pool_state.token_auth_seeds(&pool_state_key);

    transfer_checked(
        ctx.accounts.transfer_coll_ctx(),
        coll_amount,
        ctx.accounts.collateral.decimals,
    )?;
    mint_to(
        ctx.accounts
            .mint_stablecoin_to_user_ctx()
            .with_signer(&[&authority_seed[..]]),
        debt_amount,
    )?;
    mint_to(
        ctx.accounts
            .mint_stablecoin_to_gas_compensation_ctx()
            .with_signer(&[&authority_seed[..]]),
        pool_state.gas_compensation,
    )?;

    Ok(())
}
