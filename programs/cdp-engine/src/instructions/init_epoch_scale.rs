use anchor_lang::prelude::*;

use crate::state::{EpochScale, StabilityPoolState};

/// Opens the `S` account for the stability pool's current (epoch, scale). Anyone may
/// pay for it once an offset has rolled the epoch or the scale.
#[derive(Accounts)]
pub struct InitializeEpochScale<'info> {
    pub stability_pool_state: Box<Account<'info, StabilityPoolState>>,

    #[account(
        init,
        payer = payer,
        space = 8 + EpochScale::INIT_SPACE,
        seeds = [
            b"epoch-scale",
            stability_pool_state.key().as_ref(),
            stability_pool_state.current_epoch.to_le_bytes().as_ref(),
            stability_pool_state.current_scale.to_le_bytes().as_ref(),
        ],
        bump
    )]
    pub current_epoch_scale: Box<Account<'info, EpochScale>>,

    #[account(mut)]
    pub payer: Signer<'info>,

    pub system_program: Program<'info, System>,
}

pub fn initialize_current_epoch_scale_handler(ctx: Context<InitializeEpochScale>) -> Result<()> {
    let sp_state = &ctx.accounts.stability_pool_state;
    **ctx.accounts.current_epoch_scale = EpochScale::default();

    msg!(
        "Opened sum for epoch {} scale {}",
        sp_state.current_epoch,
        sp_state.current_scale
    );
    Ok(())
}
