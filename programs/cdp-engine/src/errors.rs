use anchor_lang::prelude::*;

#[error_code]
pub enum BorrowerOpsError {
    #[msg("BorrowerOps: Trove's net debt must be greater than minimum")]
    DebtLessThanMin,
    #[msg("BorrowerOps: An operation that would result in ICR < MCR is not permitted")]
    ICRLowerThanMCR,
    #[msg("BorrowerOps: An operation that would result in TCR < CCR is not permitted")]
    TCRLowerThanCCR,
    #[msg("BorrowerOps: Operation must leave trove with ICR >= CCR")]
    ICRLowerThanCCR,
    #[msg("BorrowerOps: Cannot decrease your Trove's ICR in Recovery Mode")]
    NewICRLowerThanOldICR,
    #[msg("BorrowerOps: Trove is active")]
    TroveIsActive,
    #[msg("BorrowerOps: Trove does not exist or is closed")]
    TroveIsNotActive,
    #[msg("BorrowerOps: Debt increase requires non-zero debtChange")]
    ZeroDebtChange,
    #[msg("BorrowerOps: There must be either a collateral change or a debt change")]
    ZeroAdjustment,
    #[msg("BorrowerOps: Collateral withdraw exceed trove coll")]
    CollateralWithdrawExceedBalance,
    #[msg("BorrowerOps: Collateral withdrawal not permitted Recovery Mode")]
    RecoveryNoCollWithdraw,
    #[msg("BorrowerOps: Amount repaid must not be larger than the Trove's debt")]
    InvalidDebtRepayment,
    #[msg("BorrowerOps: Operation not permitted during Recovery Mode")]
    InRecoveryMode,
    #[msg("BorrowerOps: Only one trove in the system")]
    OnlyOneTrove,
    #[msg("BorrowerOps: Trove owners list is full")]
    TroveOwnersFull,
    #[msg("TroveManager: Cannot redeem when TCR < MCR")]
    TCRUnderMCR,
    #[msg("TroveManager: Amount must be greater than zero")]
    ZeroRedeemAmount,
    #[msg("TroveManager: Unable to redeem any amount")]
    ZeroCollDrawn,
    #[msg("Account not owned by program")]
    InvalidAccount,
}

#[error_code(offset = 7000)]
pub enum LiquidationError {
    #[msg("TroveManager: nothing to liquidate")]
    NothingToLiquidate,
    #[msg("TroveManager: Trove does not exist or is closed")]
    TroveNotActive,
    #[msg("TroveManager: Calldata address array must not be empty")]
    EmptyTroveArray,
}

#[error_code(offset = 7100)]
pub enum SortedTrovesError {
    #[msg("SortedTroves: NICR must be positive")]
    NICRZero,
    #[msg("SortedTroves: List already contains the node")]
    AlreadyContains,
    #[msg("SortedTroves: List does not contain the node")]
    NotContains,
    #[msg("SortedTroves: Trove account was not provided")]
    MissingTroveAccount,
}

#[error_code(offset = 7200)]
pub enum StabilityPoolError {
    #[msg("Invalid provided epoch scale")]
    InvalidEpochScale,
    #[msg("StabilityPool: User must have a non-zero deposit")]
    ZeroDeposit,
    #[msg("StabilityPool: Cannot withdraw while there are troves with ICR < MCR")]
    TroveUnderColl,
    #[msg("StabilityPool: Amount must be non-zero")]
    ZeroAmount,
    #[msg("StabilityPool: Debt offset exceeds total deposits")]
    OffsetExceedsDeposits,
}

#[error_code(offset = 7300)]
pub enum CollSurplusError {
    #[msg("CollSurplusPool: No collateral available to claim")]
    NoCollAvailableToClaim,
}

#[error_code(offset = 7400)]
pub enum PriceFeedError {
    #[msg("PriceFeed: pyth wrong feed")]
    PythWrongFeed,
    #[msg("PriceFeed: pyth price must be positive")]
    InvalidPythPrice,
    #[msg("PriceFeed: price must be non-zero")]
    ZeroPrice,
    #[msg("PriceFeed: Invalid signer")]
    InvalidSigner,
}

#[error_code(offset = 7500)]
pub enum RewardPoolError {
    #[msg("RewardPool: Cannot stake 0")]
    ZeroStake,
    #[msg("RewardPool: Cannot withdraw 0")]
    ZeroWithdraw,
    #[msg("RewardPool: Withdraw exceeds stake")]
    WithdrawExceedsStake,
}

#[error_code(offset = 7600)]
pub enum ConfigError {
    #[msg("Config: Invalid protocol parameter")]
    InvalidParameter,
    #[msg("Config: Pool state mismatch")]
    PoolMismatch,
}

#[error_code(offset = 7700)]
pub enum MathError {
    #[msg("Math: arithmetic overflow")]
    Overflow,
    #[msg("Math: division by zero")]
    DivideByZero,
}
