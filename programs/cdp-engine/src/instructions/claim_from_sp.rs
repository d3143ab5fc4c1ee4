use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token::{Mint, Token, TokenAccount},
    token_2022::{transfer_checked, TransferChecked},
};

use crate::{
    state::{EpochScale, PoolState, StabilityPoolDeposit, StabilityPoolState},
    utils::{split_deposit_accounts, PoolAccounts},
};

#[derive(Accounts)]
pub struct ClaimFromSP<'info> {
    #[account()]
    pub pool_state: Box<Account<'info, PoolState>>,

    #[account(
        mut,
        seeds = [
            b"stability",
            pool_state.key().as_ref(),
        ],
        bump
    )]
    pub stability_pool_state: Box<Account<'info, StabilityPoolState>>,

    #[account(
        mut,
        seeds = [
            b"sp-deposit",
            stability_pool_state.key().as_ref(),
            depositor.key().as_ref(),
        ],
        bump
    )]
    pub stability_pool_deposit: Box<Account<'info, StabilityPoolDeposit>>,

    #[account(
        mut,
        seeds = [
            b"epoch-scale",
            stability_pool_state.key().as_ref(),
            stability_pool_state.current_epoch.to_le_bytes().as_ref(),
            stability_pool_state.current_scale.to_le_bytes().as_ref(),
        ],
        bump
    )]
    pub current_epoch_scale: Box<Account<'info, EpochScale>>,

    #[account(
        constraint = collateral.key() == pool_state.collateral
    )]
    pub collateral: Box<Account<'info, Mint>>,

    #[account(
        mut,
        associated_token::mint = collateral,
        associated_token::authority = stability_pool_state
    )]
    pub sp_coll_vault: Box<Account<'info, TokenAccount>>,

    #[account(
        mut,
        associated_token::mint = collateral,
        associated_token::authority = depositor
    )]
    pub depositor_coll_ata: Box<Account<'info, TokenAccount>>,

    #[account(mut)]
    pub depositor: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

impl<'info> ClaimFromSP<'info> {
    pub fn pool_accounts(&mut self) -> PoolAccounts<'_> {
        PoolAccounts {
            pool_key: self.pool_state.key(),
            pool_state: &mut self.pool_state,
            trove_owners: None,
            sp_state: Some(&mut **self.stability_pool_state),
            current_epoch_scale: Some(&mut **self.current_epoch_scale),
            coll_surplus_pool: None,
        }
    }

    pub fn transfer_coll_out(&self, amount: u64) -> Result<()> {
        let pool_state = &self.pool_state;
        let pool_state_key = pool_state.key();
        let auth_seed = &pool_state.stability_pool_seeds(&pool_state_key);

        let cpi_accounts = TransferChecked {
            from: self.sp_coll_vault.to_account_info(),
            to: self.depositor_coll_ata.to_account_info(),
            authority: self.stability_pool_state.to_account_info(),
            mint: self.collateral.to_account_info(),
        };

        let cpi_program = self.token_program.to_account_info();

        transfer_checked(
            CpiContext::new(cpi_program, cpi_accounts).with_signer(&[&auth_seed[..]]),
            amount,
            self.collateral.decimals,
        )
    }
}

/// Remaining accounts: the epoch scales at the deposit's snapshot and one scale later.
pub fn claim_from_sp_handler(ctx: Context<ClaimFromSP>) -> Result<()> {
    let sp_key = ctx.accounts.stability_pool_state.key();
    let (epoch_scale_accounts, trove_accounts) = split_deposit_accounts(ctx.remaining_accounts);

    let mut deposit = (**ctx.accounts.stability_pool_deposit).clone();
    let mut asset_pool = ctx.accounts.pool_accounts().load_for_deposit(
        &sp_key,
        epoch_scale_accounts,
        trove_accounts,
        &deposit,
    )?;
    let claimed = asset_pool.claim_from_sp(&mut deposit)?;

    **ctx.accounts.stability_pool_deposit = deposit;
    ctx.accounts
        .pool_accounts()
        .store(&asset_pool, trove_accounts)?;

    msg!("Claimed {} collateral", claimed);
    ctx.accounts.transfer_coll_out(claimed)
}
