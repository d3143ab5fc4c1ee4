use std::collections::HashMap;

use anchor_lang::prelude::*;

use crate::{
    constants::DECIMAL_PRECISION,
    state::{CollSurplusPool, PoolConfig, PoolState, StabilityPoolDeposit, StabilityPoolState},
};

use super::{AssetPool, Hints, TroveBook};

pub const PRICE: u64 = 200 * DECIMAL_PRECISION;
pub const DEBT: u64 = 100 * DECIMAL_PRECISION;

/// An initialized pool with default parameters, driven through the real engine calls.
pub struct TestPool {
    pub pool: AssetPool,
    pub price: u64,
    pub deposits: HashMap<Pubkey, StabilityPoolDeposit>,
}

impl TestPool {
    pub fn new() -> Self {
        let pool_key = Pubkey::new_unique();
        let mut pool_state = PoolState::default();
        pool_state
            .init(
                Pubkey::new_unique(),
                Pubkey::new_unique(),
                Pubkey::new_unique(),
                &PoolConfig::default(),
                [0],
                [0],
                [0],
                [0],
            )
            .unwrap();
        let mut sp_state = StabilityPoolState::default();
        sp_state.init(pool_key);
        let mut coll_surplus_pool = CollSurplusPool::default();
        coll_surplus_pool.init(pool_key);

        Self {
            pool: AssetPool::new(
                pool_key,
                pool_state,
                sp_state,
                coll_surplus_pool,
                TroveBook::default(),
            ),
            price: PRICE,
            deposits: HashMap::new(),
        }
    }

    pub fn set_price(&mut self, price: u64) {
        self.price = price;
    }

    /// Smallest collateral giving a fresh trove borrowing `debt_amount` at least `icr`.
    pub fn coll_for_icr(&self, icr: u64, debt_amount: u64) -> u64 {
        let composite = (debt_amount + self.pool.pool_state.gas_compensation) as u128;
        let price = self.price as u128;
        ((icr as u128 * composite + price - 1) / price) as u64
    }

    pub fn open_trove(&mut self, coll: u64, debt_amount: u64) -> Pubkey {
        let owner = Pubkey::new_unique();
        self.pool
            .open_trove(owner, coll, debt_amount, Hints::default(), self.price)
            .unwrap();
        owner
    }

    pub fn open_trove_at(&mut self, owner: Pubkey, icr: u64, debt_amount: u64) {
        let coll = self.coll_for_icr(icr, debt_amount);
        self.pool
            .open_trove(owner, coll, debt_amount, Hints::default(), self.price)
            .unwrap();
    }

    pub fn open_trove_with_icr(&mut self, icr: u64, debt_amount: u64) -> Pubkey {
        let owner = Pubkey::new_unique();
        self.open_trove_at(owner, icr, debt_amount);
        owner
    }

    pub fn provide_to_sp(&mut self, amount: u64) -> Pubkey {
        let depositor = Pubkey::new_unique();
        let mut deposit = StabilityPoolDeposit {
            depositor,
            ..Default::default()
        };
        self.pool.provide_to_sp(&mut deposit, amount).unwrap();
        self.deposits.insert(depositor, deposit);
        depositor
    }

    pub fn deposit(&mut self, depositor: &Pubkey) -> &mut StabilityPoolDeposit {
        self.deposits.get_mut(depositor).unwrap()
    }

    pub fn icr(&self, owner: &Pubkey) -> u64 {
        self.pool.get_current_icr(owner, self.price).unwrap()
    }

    /// Active owners in sorted order, head first.
    pub fn sorted_owners(&self) -> Vec<Pubkey> {
        let mut out = vec![];
        let mut current = self.pool.book.first(&self.pool.pool_state);
        while let Some(owner) = current {
            out.push(owner);
            current = self.pool.book.next_of(&owner).unwrap();
        }
        out
    }
}
