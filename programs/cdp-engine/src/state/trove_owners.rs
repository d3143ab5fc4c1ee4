use anchor_lang::prelude::*;

use crate::constants::MAX_TROVES;

/// Dense array of active trove owners for one asset.
#[account]
#[derive(InitSpace, Default, Debug)]
pub struct TroveOwners {
    pub pool_state: Pubkey,
    #[max_len(MAX_TROVES)]
    pub owners: Vec<Pubkey>,
}
