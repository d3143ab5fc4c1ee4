use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token::{Mint, Token, TokenAccount},
    token_2022::{burn, transfer_checked, Burn, TransferChecked},
};

use crate::{
    engine::{Hints, RedemptionTotals},
    state::{CollSurplusPool, PoolState, PriceFeedState, TroveOwners},
    utils::PoolAccounts,
};

#[derive(Accounts)]
pub struct RedeemCollateral<'info> {
    #[account(mut)]
    pub pool_state: Box<Account<'info, PoolState>>,

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
        associated_token::authority = redeemer,
    )]
    redeemer_coll_ata: Box<Account<'info, TokenAccount>>,

    #[account(
        mut,
        associated_token::mint = stablecoin,
        associated_token::authority = redeemer,
    )]
    redeemer_stablecoin_ata: Box<Account<'info, TokenAccount>>,

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
    pub redeemer: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

impl<'info> RedeemCollateral<'info> {
    pub fn pool_accounts(&mut self) -> PoolAccounts<'_> {
        PoolAccounts {
            pool_key: self.pool_state.key(),
            pool_state: &mut self.pool_state,
            trove_owners: Some(&mut **self.trove_owners),
            sp_state: None,
            current_epoch_scale: None,
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

    pub fn move_tokens(&self, totals: &RedemptionTotals) -> Result<()> {
        let cpi_program = self.token_program.to_account_info();

        let cpi_accounts = Burn {
            mint: self.stablecoin.to_account_info(),
            from: self.redeemer_stablecoin_ata.to_account_info(),
            authority: self.redeemer.to_account_info(),
        };
        burn(
            CpiContext::new(cpi_program.clone(), cpi_accounts),
            totals.total_debt_to_redeem,
        )?;

        // Gas reserves of troves the redemption closed
        if totals.total_debt_gas_to_burn > 0 {
            let pool_state = &self.pool_state;
            let pool_state_key = pool_state.key();
            let authority_seed = &pool_state.token_auth_seeds(&pool_state_key);
            let cpi_accounts = Burn {
                mint: self.stablecoin.to_account_info(),
                from: self.gas_compensation_vault.to_account_info(),
                authority: self.token_authority.to_account_info(),
            };
            burn(
                CpiContext::new(cpi_program, cpi_accounts).with_signer(&[&authority_seed[..]]),
                totals.total_debt_gas_to_burn,
            )?;
        }

        self.transfer_coll_from_vault(
            self.redeemer_coll_ata.to_account_info(),
            totals.total_coll_drawn,
        )?;
        self.transfer_coll_from_vault(
            self.coll_surplus_vault.to_account_info(),
            totals.total_coll_surplus,
        )
    }
}

/// Remaining accounts: the riskiest troves the walk may visit, their neighbours, and
/// the neighbours named by `partial_hints`.
pub fn redeem_collateral_handler(
    ctx: Context<RedeemCollateral>,
    debt_amount: u64,
    max_iterations: u32,
    partial_hints: Hints,
) -> Result<()> {
    let price = ctx.accounts.price_feed_state.get_price()?;

    let mut asset_pool = ctx.accounts.pool_accounts().load(ctx.remaining_accounts)?;
    let totals = asset_pool.redeem_collateral(debt_amount, max_iterations, partial_hints, price)?;
    ctx.accounts
        .pool_accounts()
        .store(&asset_pool, ctx.remaining_accounts)?;

    ctx.accounts.move_tokens(&totals)
}
