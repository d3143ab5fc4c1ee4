use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token::{Mint, Token, TokenAccount},
    token_2022::{burn, mint_to, transfer_checked, Burn, MintTo, TransferChecked},
};

use crate::{
    engine::{Hints, TroveAdjustment},
    state::{PoolState, PriceFeedState, Trove, TroveOwners},
    utils::PoolAccounts,
};

#[derive(Accounts)]
pub struct AdjustTrove<'info> {
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

impl<'info> AdjustTrove<'info> {
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

    pub fn move_coll(&self, coll_change: u64, is_coll_increase: bool) -> Result<()> {
        if coll_change == 0 {
            return Ok(());
        }
        let cpi_program = self.token_program.to_account_info();

        if is_coll_increase {
            let cpi_accounts = TransferChecked {
                from: self.user_coll_ata.to_account_info(),
                to: self.collateral_vault.to_account_info(),
                authority: self.borrower.to_account_info(),
                mint: self.collateral.to_account_info(),
            };
            transfer_checked(
                CpiContext::new(cpi_program, cpi_accounts),
                coll_change,
                self.collateral.decimals,
            )
        } else {
            let pool_state_key = self.pool_state.key();
            let authority_seed = &self.pool_state.token_auth_seeds(&pool_state_key);
            let cpi_accounts = TransferChecked {
                from: self.collateral_vault.to_account_info(),
                to: self.user_coll_ata.to_account_info(),
                authority: self.token_authority.to_account_info(),
                mint: self.collateral.to_account_info(),
            };
            transfer_checked(
                CpiContext::new(cpi_program, cpi_accounts).with_signer(&[&authority_seed[..]]),
                coll_change,
                self.collateral.decimals,
            )
        }
    }

    pub fn move_debt(&self, debt_change: u64, is_debt_increase: bool) -> Result<()> {
        if debt_change == 0 {
            return Ok(());
        }
        let cpi_program = self.token_program.to_account_info();

        if is_debt_increase {
            let pool_state_key = self.pool_state.key();
            let authority_seed = &self.pool_state.token_auth_seeds(&pool_state_key);
            let cpi_accounts = MintTo {
                mint: self.stablecoin.to_account_info(),
                to: self.user_stablecoin_ata.to_account_info(),
                authority: self.token_authority.to_account_info(),
            };
            mint_to(
                CpiContext::new(cpi_program, cpi_accounts).with_signer(&[&authority_seed[..]]),
                debt_change,
            )
        } else {
            let cpi_accounts = Burn {
                mint: self.stablecoin.to_account_info(),
                from: self.user_stablecoin_ata.to_account_info(),
                authority: self.borrower.to_account_info(),
            };
            burn(CpiContext::new(cpi_program, cpi_accounts), debt_change)
        }
    }
}

pub fn adjust_trove_handler(
    ctx: Context<AdjustTrove>,
    adjustment: TroveAdjustment,
    hints: Hints,
) -> Result<()> {
    let price = ctx.accounts.price_feed_state.get_price()?;
    let borrower = ctx.accounts.borrower.key();

    let mut asset_pool = ctx.accounts.pool_accounts().load(ctx.remaining_accounts)?;
    asset_pool.book.insert((**ctx.accounts.trove).clone());

    asset_pool.adjust_trove(borrower, adjustment, hints, price)?;

    **ctx.accounts.trove = asset_pool.book.trove(&borrower)?.clone();
    ctx.accounts
        .pool_accounts()
        .store(&asset_pool, ctx.remaining_accounts)?;

    ctx.accounts
        .move_coll(adjustment.coll_change, adjustment.is_coll_increase)?;
    ctx.accounts
        .move_debt(adjustment.debt_change, adjustment.is_debt_increase)
}
