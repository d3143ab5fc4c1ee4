use crate::{
    constants::DEPLOYER,
    state::{CollSurplusPool, PoolConfig, PoolState, StabilityPoolState, TroveOwners},
};
use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token::{set_authority, spl_token::instruction::AuthorityType, Mint, SetAuthority, Token},
};

#[derive(Accounts)]
pub struct Initialize<'info> {
    #[account(
        init,
        payer = creator,
        space = 8 + PoolState::INIT_SPACE,
        seeds = [
            b"state",
            collateral.key().as_ref(),
        ],
        bump
    )]
    pub pool_state: Box<Account<'info, PoolState>>,

    #[account(
        init,
        payer = creator,
        space = 8 + StabilityPoolState::INIT_SPACE,
        seeds = [
            b"stability",
            pool_state.key().as_ref(),
        ],
        bump
    )]
    pub stability_pool_state: Box<Account<'info, StabilityPoolState>>,

    #[account(
        init,
        payer = creator,
        space = 8 + CollSurplusPool::INIT_SPACE,
        seeds = [
            b"coll-surplus",
            pool_state.key().as_ref(),
        ],
        bump
    )]
    pub coll_surplus_pool: Box<Account<'info, CollSurplusPool>>,

    #[account(
        init,
        payer = creator,
        space = 8 + TroveOwners::INIT_SPACE,
        seeds = [
            b"trove-owners",
            pool_state.key().as_ref(),
        ],
        bump
    )]
    pub trove_owners: Box<Account<'info, TroveOwners>>,

    #[account(
        mut,
        mint::authority = creator
    )]
    pub stablecoin: Box<Account<'info, Mint>>,

    #[account()]
    pub collateral: Box<Account<'info, Mint>>,

    #[account(
        mut,
        constraint = cfg!(feature = "dev") || creator.key() == DEPLOYER
    )]
    pub creator: Signer<'info>,

    /// CHECK: This account is not read or written
    #[account(
        seeds = [
            b"token-authority",
            pool_state.key().as_ref()
        ],
        bump
    )]
    pub token_authority: UncheckedAccount<'info>,

    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

impl<'info> Initialize<'info> {
    pub fn transfer_auth_ctx(&self) -> CpiContext<'_, '_, '_, 'info, SetAuthority<'info>> {
        let cpi_accounts = SetAuthority {
            account_or_mint: self.stablecoin.to_account_info(),
            current_authority: self.creator.to_account_info(),
        };

        let cpi_program = self.token_program.to_account_info();

        CpiContext::new(cpi_program, cpi_accounts)
    }
}

pub fn initialize_handler(ctx: Context<Initialize>, config: PoolConfig) -> Result<()> {
    let creator = ctx.accounts.creator.key();
    let stablecoin = ctx.accounts.stablecoin.key();
    let collateral = ctx.accounts.collateral.key();
    let token_authority = ctx.accounts.token_authority.key();
    let pool_key = ctx.accounts.pool_state.key();

    let token_auth_bump = ctx.bumps.token_authority;
    let stability_pool_bump = ctx.bumps.stability_pool_state;
    let coll_surplus_bump = ctx.bumps.coll_surplus_pool;
    let bump = ctx.bumps.pool_state;

    // The engine is the only minter of the debt token from here on
    set_authority(
        ctx.accounts.transfer_auth_ctx(),
        AuthorityType::MintTokens,
        Some(token_authority),
    )?;

    ctx.accounts.pool_state.init(
        creator,
        stablecoin,
        collateral,
        &config,
        [token_auth_bump],
        [stability_pool_bump],
        [coll_surplus_bump],
        [bump],
    )?;
    ctx.accounts.stability_pool_state.init(pool_key);
    ctx.accounts.coll_surplus_pool.init(pool_key);
    ctx.accounts.trove_owners.pool_state = pool_key;

    msg!(
        "Initialized pool {} mcr {} ccr {}",
        pool_key,
        config.mcr,
        config.ccr
    );
    Ok(())
}
