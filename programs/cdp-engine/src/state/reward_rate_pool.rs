use anchor_lang::prelude::*;

use crate::{
    constants::{DECIMAL_PRECISION, REWARD_DURATION},
    errors::{MathError, RewardPoolError},
    events::{RewardAdded, RewardPaid, Staked, Withdrawn},
    math::{safe_add, safe_add_u128, safe_sub, safe_sub_u128, to_u64},
};

/// Linear reward stream shared pro rata between stakers over `REWARD_DURATION`.
#[account]
#[derive(InitSpace, Default, Debug)]
pub struct RewardRatePool {
    pub reward_rate: u64,
    pub period_finish: u64,
    pub last_update_time: u64,
    pub reward_per_token_stored: u128,
    pub total_supply: u64,
}

#[account]
#[derive(InitSpace, Default, Debug)]
pub struct RewardRateStake {
    pub user: Pubkey,
    pub balance: u64,
    pub user_reward_per_token_paid: u128,
    pub rewards: u64,
}

impl RewardRatePool {
    pub fn last_time_reward_applicable(&self, now: u64) -> u64 {
        std::cmp::min(now, self.period_finish)
    }

    pub fn reward_per_token(&self, now: u64) -> Result<u128> {
        if self.total_supply == 0 {
            return Ok(self.reward_per_token_stored);
        }
        let elapsed = self
            .last_time_reward_applicable(now)
            .saturating_sub(self.last_update_time) as u128;
        let accrued = elapsed
            .checked_mul(self.reward_rate.into())
            .and_then(|v| v.checked_mul(DECIMAL_PRECISION.into()))
            .ok_or(MathError::Overflow)?
            / (self.total_supply as u128);
        safe_add_u128(self.reward_per_token_stored, accrued)
    }

    pub fn earned(&self, stake: &RewardRateStake, now: u64) -> Result<u64> {
        let delta = safe_sub_u128(self.reward_per_token(now)?, stake.user_reward_per_token_paid)?;
        let pending = (stake.balance as u128)
            .checked_mul(delta)
            .ok_or(MathError::Overflow)?
            / (DECIMAL_PRECISION as u128);
        safe_add(to_u64(pending)?, stake.rewards)
    }

    fn update_reward(&mut self, stake: Option<&mut RewardRateStake>, now: u64) -> Result<()> {
        self.reward_per_token_stored = self.reward_per_token(now)?;
        self.last_update_time = self.last_time_reward_applicable(now);
        if let Some(stake) = stake {
            stake.rewards = self.earned(stake, now)?;
            stake.user_reward_per_token_paid = self.reward_per_token_stored;
        }
        Ok(())
    }

    /// Starts a new reward period of `REWARD_DURATION`, folding in whatever is left
    /// of a running one.
    pub fn notify_reward_amount(&mut self, reward: u64, now: u64) -> Result<()> {
        self.update_reward(None, now)?;
        let total_reward = if now >= self.period_finish {
            reward
        } else {
            let remaining = self.period_finish - now;
            let leftover = remaining
                .checked_mul(self.reward_rate)
                .ok_or(MathError::Overflow)?;
            safe_add(reward, leftover)?
        };
        self.reward_rate = total_reward / REWARD_DURATION;
        self.last_update_time = now;
        self.period_finish = safe_add(now, REWARD_DURATION)?;
        emit!(RewardAdded { reward });
        Ok(())
    }

    pub fn stake(&mut self, stake: &mut RewardRateStake, amount: u64, now: u64) -> Result<()> {
        require!(amount > 0, RewardPoolError::ZeroStake);
        self.update_reward(Some(stake), now)?;
        self.total_supply = safe_add(self.total_supply, amount)?;
        stake.balance = safe_add(stake.balance, amount)?;
        emit!(Staked {
            user: stake.user,
            amount
        });
        Ok(())
    }

    pub fn withdraw(&mut self, stake: &mut RewardRateStake, amount: u64, now: u64) -> Result<()> {
        require!(amount > 0, RewardPoolError::ZeroWithdraw);
        require!(
            amount <= stake.balance,
            RewardPoolError::WithdrawExceedsStake
        );
        self.update_reward(Some(stake), now)?;
        self.total_supply = safe_sub(self.total_supply, amount)?;
        stake.balance -= amount;
        emit!(Withdrawn {
            user: stake.user,
            amount
        });
        Ok(())
    }

    pub fn claim_reward(&mut self, stake: &mut RewardRateStake, now: u64) -> Result<u64> {
        self.update_reward(Some(stake), now)?;
        let reward = stake.rewards;
        if reward > 0 {
            stake.rewards = 0;
            emit!(RewardPaid {
                user: stake.user,
                reward
            });
        }
        Ok(reward)
    }
}
