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
pub struct ProvideToSP<'info> {
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
        init_if_needed,
        payer = depositor,
        space = 8 + StabilityPoolDeposit::INIT_SPACE,
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
        constraint = stablecoin.key() == pool_state.stablecoin
    )]
    pub stablecoin: Box<Account<'info, Mint>>,

    #[account(
        mut,
        associated_token::mint = stablecoin,
        associated_token::authority = stability_pool_state
    )]
    pub sp_debt_vault: Box<Account<'info, TokenAccount>>,

    #[account(
        mut,
        associated_token::mint = stablecoin,
        associated_token::authority = depositor
    )]
    pub depositor_stablecoin_ata: Box<Account<'info, TokenAccount>>,

    #[account(mut)]
    pub depositor: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

impl<'info> ProvideToSP<'info> {
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

    pub fn transfer_debt_in(&self, amount: u64) -> Result<()> {
        let cpi_accounts = TransferChecked {
            from: self.depositor_stablecoin_ata.to_account_info(),
            to: self.sp_debt_vault.to_account_info(),
            authority: self.depositor.to_account_info(),
            mint: self.stablecoin.to_account_info(),
        };

        let cpi_program = self.token_program.to_account_info();

        transfer_checked(
            CpiContext::new(cpi_program, cpi_accounts),
            amount,
            self.stablecoin.decimals,
        )
    }
}

/// Remaining accounts: the epoch scales at the deposit's snapshot and one scale later.
pub fn provide_to_sp_handler(ctx: Context<ProvideToSP>, amount: u64) -> Result<()> {
    let sp_key = ctx.accounts.stability_pool_state.key();
    let (epoch_scale_accounts, trove_accounts) = split_deposit_accounts(ctx.remaining_accounts);

    let mut deposit = (**ctx.accounts.stability_pool_deposit).clone();
    // Freshly created by init_if_needed
    if deposit.depositor == Pubkey::default() {
        deposit.depositor = ctx.accounts.depositor.key();
    }

    let mut asset_pool = ctx.accounts.pool_accounts().load_for_deposit(
        &sp_key,
        epoch_scale_accounts,
        trove_accounts,
        &deposit,
    )?;
    asset_pool.provide_to_sp(&mut deposit, amount)?;

    **ctx.accounts.stability_pool_deposit = deposit;
    ctx.accounts
        .pool_accounts()
        .store(&asset_pool, trove_accounts)?;

    ctx.accounts.transfer_debt_in(amount)
}
