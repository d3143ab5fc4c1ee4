use anchor_lang::prelude::{
    borsh::{BorshDeserialize, BorshSerialize},
    *,
};

#[event]
pub struct TroveUpdated {
    pub borrower: Pubkey,
    pub debt: u64,
    pub coll: u64,
    pub stake: u64,
    pub operation: Operation,
}

#[event]
pub struct Liquidation {
    pub debt: u64,
    pub coll: u64,
    pub total_debt_compensation: u64,
    pub total_coll_compensation: u64,
}

#[event]
pub struct Redemption {
    pub attempted_debt_amount: u64,
    pub actual_debt_amount: u64,
    pub coll_sent: u64,
}

#[event]
pub struct TroveLiquidated {
    pub borrower: Pubkey,
    pub debt: u64,
    pub coll: u64,
    pub operation: Operation,
}

#[event]
pub struct TotalStakesUpdated {
    pub new_total_stakes: u64,
}

#[event]
pub struct SystemSnapshotsUpdated {
    pub total_stakes_snapshot: u64,
    pub total_coll_snapshot: u64,
}

#[event]
pub struct LTermsUpdated {
    pub l_coll: u128,
    pub l_debt: u128,
}

#[event]
pub struct TroveSnapshotsUpdated {
    pub l_coll: u128,
    pub l_debt: u128,
}

#[event]
pub struct TroveIndexUpdated {
    pub borrower: Pubkey,
    pub new_index: u64,
}

#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    OpenTrove,
    CloseTrove,
    AdjustTrove,
    LiquidateInNormalMode,
    LiquidateInRecoveryMode,
    RedeemCollateral,
}

// CollSurplusPool
#[event]
pub struct SurplusPoolCollBalanceUpdated {
    pub account: Pubkey,
    pub new_balance: u64,
}

#[event]
pub struct SurplusPoolCollSent {
    pub to: Pubkey,
    pub amount: u64,
}

// SortedTroves
#[event]
pub struct NodeAdded {
    pub owner: Pubkey,
    pub nicr: u64,
}

#[event]
pub struct NodeRemoved {
    pub owner: Pubkey,
}

// StabilityPool
#[event]
pub struct StabilityPoolDebtBalanceUpdated {
    pub new_balance: u64,
}

#[event]
pub struct StabilityPoolCollBalanceUpdated {
    pub new_balance: u64,
}

#[event]
pub struct UserDepositChanged {
    pub depositor: Pubkey,
    pub new_deposit: u64,
}

#[event]
pub struct CollGainWithdrawn {
    pub depositor: Pubkey,
    pub coll: u64,
    pub debt_loss: u64,
}

#[event]
pub struct DepositSnapshotUpdated {
    pub depositor: Pubkey,
    pub p: u128,
    pub s: u128,
}

#[event]
pub struct SUpdated {
    pub s: u128,
    pub epoch: u128,
    pub scale: u128,
}

#[event]
pub struct PUpdated {
    pub p: u128,
}

#[event]
pub struct EpochUpdated {
    pub current_epoch: u128,
}

#[event]
pub struct ScaleUpdated {
    pub current_scale: u128,
}

// PriceFeed
#[event]
pub struct PriceUpdated {
    pub price: u64,
}

// RewardRatePool
#[event]
pub struct RewardAdded {
    pub reward: u64,
}

#[event]
pub struct Staked {
    pub user: Pubkey,
    pub amount: u64,
}

#[event]
pub struct Withdrawn {
    pub user: Pubkey,
    pub amount: u64,
}

#[event]
pub struct RewardPaid {
    pub user: Pubkey,
    pub reward: u64,
}
