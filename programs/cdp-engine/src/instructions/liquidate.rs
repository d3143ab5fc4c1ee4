use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token::{Mint, Token, TokenAccount},
    token_2022::{burn, transfer_checked, Burn, TransferChecked},
};

use crate::{
    engine::AssetPool,
    state::{
        CollSurplusPool, EpochScale, LiquidationTotals, PoolState, PriceFeedState,
        StabilityPoolState, TroveOwners,
    },
    utils::PoolAccounts,
};

/// Accounts shared by the three liquidation entrypoints. Troves are passed as
/// remaining accounts: every trove that may be liquidated plus the list
/// neighbours they are unlinked from.
#[derive(Accounts)]
pub struct Liquidate<'info> {
    #[account(mut)]
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
            b"epoch-scale",
            stability_pool_state.key().as_ref(),
            stability_pool_state.current_epoch.to_le_bytes().as_ref(),
            stability_pool_state.current_scale.to_le_bytes().as_ref(),
        ],
        bump
    )]
    pub current_epoch_scale: Box<Account<'info, EpochScale>>,

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
        associated_token::authority = liquidator,
    )]
    liquidator_coll_ata: Box<Account<'info, TokenAccount>>,

    #[account(
        mut,
        associated_token::mint = stablecoin,
        associated_token::authority = liquidator,
    )]
    liquidator_stablecoin_ata: Box<Account<'info, TokenAccount>>,

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
        associated_token::mint = stablecoin,
        associated_token::authority = stability_pool_state
    )]
    pub sp_debt_vault: Box<Account<'info, TokenAccount>>,

    #[account(
        mut,
        associated_token::mint = collateral,
        associated_token::authority = stability_pool_state
    )]
    pub sp_coll_vault: Box<Account<'info, TokenAccount>>,

    #[account(
        mut,
        associated_token::mint = collateral,
        associated_token::authority = coll_surplus_pool
    )]
    pub coll_surplus_vault: Box<Account<'info, TokenAccount>>,

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
    pub liquidator: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

impl<'info> Liquidate<'info> {
    pub fn pool_accounts(&mut self) -> PoolAccounts<'_> {
        PoolAccounts {
            pool_key: self.pool_state.key(),
            pool_state: &mut self.pool_state,
            trove_owners: Some(&mut **self.trove_owners),
            sp_state: Some(&mut **self.stability_pool_state),
            current_epoch_scale: Some(&mut **self.current_epoch_scale),
            coll_surplus_pool: Some(&mut **self.coll_surplus_pool),
        }
    }

    fn transfer_coll_from_vault(&self, to: AccountInfo<'info>, coll_amt: u64) -> Result<()> {
        if coll_amt == 0 {
            return Ok(());
        }
        let pool_state = &self.pool_state;
        let pool_state_key = pool_state.key();
        let authority_seed = &pool_state.token_auth_seeds(&pool_state_key);

        let cpi_accounts = TransferChecked {
            from: self.collateral_vault.to_account_info(),
            to,
            authority: self.token_authority.to_account_info(),
            mint: self.collateral.to_account_info(),
        };
        let cpi_program = self.token_program.to_account_info();

        transfer_checked(
            CpiContext::new(cpi_program, cpi_accounts).with_signer(&[&authority_seed[..]]),
            coll_amt,
            self.collateral.decimals,
        )
    }

    pub fn send_gas_compensation(&self, debt_amt: u64, coll_amt: u64) -> Result<()> {
        if debt_amt > 0 {
            let pool_state = &self.pool_state;
            let pool_state_key = pool_state.key();
            let authority_seed = &pool_state.token_auth_seeds(&pool_state_key);

            let cpi_accounts = TransferChecked {
                from: self.gas_compensation_vault.to_account_info(),
                to: self.liquidator_stablecoin_ata.to_account_info(),
                authority: self.token_authority.to_account_info(),
                mint: self.stablecoin.to_account_info(),
            };
            let cpi_program = self.token_program.to_account_info();
            transfer_checked(
                CpiContext::new(cpi_program, cpi_accounts).with_signer(&[&authority_seed[..]]),
                debt_amt,
                self.stablecoin.decimals,
            )?;
        }

        self.transfer_coll_from_vault(self.liquidator_coll_ata.to_account_info(), coll_amt)
    }

    pub fn burn_debt_from_stability_pool(&self, debt_amt: u64) -> Result<()> {
        if debt_amt == 0 {
            return Ok(());
        }
        let pool_state = &self.pool_state;
        let pool_state_key = pool_state.key();
        let auth_seed = &pool_state.stability_pool_seeds(&pool_state_key);

        let cpi_accounts = Burn {
            mint: self.stablecoin.to_account_info(),
            from: self.sp_debt_vault.to_account_info(),
            authority: self.stability_pool_state.to_account_info(),
        };

        let cpi_program = self.token_program.to_account_info();
        burn(
            CpiContext::new(cpi_program, cpi_accounts).with_signer(&[&auth_seed[..]]),
            debt_amt,
        )
    }

    pub fn move_tokens(&self, totals: &LiquidationTotals) -> Result<()> {
        self.send_gas_compensation(
            totals.total_debt_gas_compensation,
            totals.total_coll_gas_compensation,
        )?;

        // Offset against the Stability Pool
        self.transfer_coll_from_vault(
            self.sp_coll_vault.to_account_info(),
            totals.total_coll_to_send_to_sp,
        )?;
        self.burn_debt_from_stability_pool(totals.total_debt_to_offset)?;

        self.transfer_coll_from_vault(
            self.coll_surplus_vault.to_account_info(),
            totals.total_coll_surplus,
        )
    }
}

pub fn liquidate_trove_handler(ctx: Context<Liquidate>, borrower: Pubkey) -> Result<()> {
    run_liquidation(ctx, |asset_pool, price| asset_pool.liquidate(borrower, price))
}

/// Remaining accounts must cover the `n + 1` riskiest troves.
pub fn liquidate_troves_handler(ctx: Context<Liquidate>, n: u64) -> Result<()> {
    run_liquidation(ctx, |asset_pool, price| asset_pool.liquidate_troves(n, price))
}

/// Owners whose troves are not passed in are treated as nonexistent and skipped.
pub fn batch_liquidate_troves_handler(
    ctx: Context<Liquidate>,
    borrowers: Vec<Pubkey>,
) -> Result<()> {
    run_liquidation(ctx, |asset_pool, price| {
        asset_pool.batch_liquidate_troves(&borrowers, price)
    })
}

fn run_liquidation(
    ctx: Context<Liquidate>,
    liquidate: impl FnOnce(&mut AssetPool, u64) -> Result<LiquidationTotals>,
) -> Result<()> {
    // One price for the whole call
    let price = ctx.accounts.price_feed_state.get_price()?;

    let mut asset_pool = ctx.accounts.pool_accounts().load(ctx.remaining_accounts)?;
    let totals = liquidate(&mut asset_pool, price)?;
    ctx.accounts
        .pool_accounts()
        .store(&asset_pool, ctx.remaining_accounts)?;

    msg!(
        "Liquidated debt {} coll {}",
        totals.total_debt_in_sequence,
        totals.total_coll_in_sequence
    );
    ctx.accounts.move_tokens(&totals)
}
