use std::collections::HashMap;

use anchor_lang::prelude::*;

use crate::{
    constants::MAX_TROVES,
    errors::{BorrowerOpsError, SortedTrovesError},
    events::TroveIndexUpdated,
    state::{Trove, TroveStatus},
};

/// Troves of one asset, keyed by owner, together with the dense owners array.
///
/// On-chain only the troves an instruction passes in are present; asking for any
/// other trove fails with `MissingTroveAccount`.
#[derive(Clone, Debug, Default)]
pub struct TroveBook {
    troves: HashMap<Pubkey, Trove>,
    owners: Vec<Pubkey>,
    index: HashMap<Pubkey, usize>,
}

impl TroveBook {
    pub fn new(troves: impl IntoIterator<Item = Trove>, owners: Vec<Pubkey>) -> Self {
        let index = owners
            .iter()
            .enumerate()
            .map(|(i, owner)| (*owner, i))
            .collect();
        Self {
            troves: troves.into_iter().map(|t| (t.owner, t)).collect(),
            owners,
            index,
        }
    }

    pub fn insert(&mut self, trove: Trove) {
        self.troves.insert(trove.owner, trove);
    }

    pub fn entry(&mut self, pool_state: Pubkey, owner: Pubkey) -> &mut Trove {
        self.troves
            .entry(owner)
            .or_insert_with(|| Trove::new(pool_state, owner))
    }

    pub fn get(&self, owner: &Pubkey) -> Option<&Trove> {
        self.troves.get(owner)
    }

    pub fn get_mut(&mut self, owner: &Pubkey) -> Option<&mut Trove> {
        self.troves.get_mut(owner)
    }

    pub fn trove(&self, owner: &Pubkey) -> Result<&Trove> {
        self.troves
            .get(owner)
            .ok_or_else(|| error!(SortedTrovesError::MissingTroveAccount))
    }

    pub fn trove_mut(&mut self, owner: &Pubkey) -> Result<&mut Trove> {
        self.troves
            .get_mut(owner)
            .ok_or_else(|| error!(SortedTrovesError::MissingTroveAccount))
    }

    /// Status of `owner`'s trove; an unknown owner has no trove.
    pub fn status_of(&self, owner: &Pubkey) -> TroveStatus {
        self.troves
            .get(owner)
            .map(|t| t.status)
            .unwrap_or(TroveStatus::NonExistent)
    }

    pub fn troves(&self) -> impl Iterator<Item = &Trove> {
        self.troves.values()
    }

    pub fn owners(&self) -> &[Pubkey] {
        &self.owners
    }

    pub fn owners_len(&self) -> usize {
        self.owners.len()
    }

    pub fn index_of(&self, owner: &Pubkey) -> Option<usize> {
        self.index.get(owner).copied()
    }

    pub fn add_owner(&mut self, owner: Pubkey) -> Result<usize> {
        require!(
            self.owners.len() < MAX_TROVES,
            BorrowerOpsError::TroveOwnersFull
        );
        require!(
            !self.index.contains_key(&owner),
            BorrowerOpsError::TroveIsActive
        );
        let index = self.owners.len();
        self.owners.push(owner);
        self.index.insert(owner, index);
        emit!(TroveIndexUpdated {
            borrower: owner,
            new_index: index as u64
        });
        Ok(index)
    }

    /// Swap-removes `owner`, repointing the owner moved into its slot.
    pub fn remove_owner(&mut self, owner: &Pubkey) -> Result<()> {
        require!(self.owners.len() > 1, BorrowerOpsError::OnlyOneTrove);
        let index = self
            .index
            .remove(owner)
            .ok_or(BorrowerOpsError::TroveIsNotActive)?;

        self.owners.swap_remove(index);
        if let Some(moved) = self.owners.get(index) {
            self.index.insert(*moved, index);
            emit!(TroveIndexUpdated {
                borrower: *moved,
                new_index: index as u64
            });
        }
        Ok(())
    }
}
