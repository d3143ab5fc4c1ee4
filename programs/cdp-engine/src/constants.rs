use anchor_lang::prelude::*;

use solana_program::pubkey;

pub const ONE_HUNDRED_PERCENT: u64 = 1_000_000_000;
pub const DECIMAL_PRECISION: u64 = 1_000_000_000;
pub const NICR_PRECISION: u64 = 100_000_000_000;

pub const SCALE_FACTOR: u64 = 100_000;

// Protocol parameter defaults
pub const MCR_DEFAULT: u64 = ONE_HUNDRED_PERCENT / 100 * 110; // 110%
pub const CCR_DEFAULT: u64 = ONE_HUNDRED_PERCENT / 100 * 150; // 150%
pub const GAS_COMPENSATION_DEFAULT: u64 = 10 * DECIMAL_PRECISION;
pub const MIN_NET_DEBT_DEFAULT: u64 = 90 * DECIMAL_PRECISION;
pub const PERCENT_DIVISOR_DEFAULT: u64 = 200; // 0.5%

// Trove owners array capacity per asset
pub const MAX_TROVES: usize = 250;

// Price feed
pub const TARGET_DECIMAL_PRECISION: u64 = 1_000_000_000;

// Reward rate pool
pub const REWARD_DURATION: u64 = 6 * 7 * 24 * 60 * 60; // 6 weeks

// Deployer
pub const DEPLOYER: Pubkey = pubkey!("FeXpuNQFuEg8q5KdimHkogXiCuMKfa8PwbeYKJSbqiVo");
