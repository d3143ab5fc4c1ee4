use anchor_lang::prelude::*;

use crate::{
    errors::SortedTrovesError,
    events::{NodeAdded, NodeRemoved},
    state::PoolState,
};

use super::TroveBook;

fn link(key: Pubkey) -> Option<Pubkey> {
    if key == Pubkey::default() {
        None
    } else {
        Some(key)
    }
}

fn unlink(key: Option<Pubkey>) -> Pubkey {
    key.unwrap_or_default()
}

/// Doubly linked list of active troves ordered by nominal ICR, highest at the head.
/// Links are owner keys stored on the troves; head, tail and size live in `PoolState`.
impl TroveBook {
    pub fn size(&self, pool_state: &PoolState) -> u64 {
        pool_state.trove_size
    }

    pub fn first(&self, pool_state: &PoolState) -> Option<Pubkey> {
        link(pool_state.trove_head)
    }

    pub fn last(&self, pool_state: &PoolState) -> Option<Pubkey> {
        link(pool_state.trove_tail)
    }

    pub fn contains(&self, owner: &Pubkey) -> bool {
        self.get(owner).map(|t| t.is_active()).unwrap_or(false)
    }

    pub fn prev_of(&self, owner: &Pubkey) -> Result<Option<Pubkey>> {
        Ok(link(self.trove(owner)?.prev))
    }

    pub fn next_of(&self, owner: &Pubkey) -> Result<Option<Pubkey>> {
        Ok(link(self.trove(owner)?.next))
    }

    fn nicr_of(&self, owner: &Pubkey, pool_state: &PoolState) -> Result<u64> {
        self.trove(owner)?.get_nominal_icr(pool_state)
    }

    /// Whether `(prev, next)` brackets `nicr` at the right place in the list.
    pub fn valid_insert_position(
        &self,
        pool_state: &PoolState,
        nicr: u64,
        prev: Option<Pubkey>,
        next: Option<Pubkey>,
    ) -> Result<bool> {
        match (prev, next) {
            (None, None) => Ok(pool_state.trove_size == 0),
            (None, Some(next)) => Ok(self.first(pool_state) == Some(next)
                && nicr >= self.nicr_of(&next, pool_state)?),
            (Some(prev), None) => Ok(self.last(pool_state) == Some(prev)
                && nicr <= self.nicr_of(&prev, pool_state)?),
            (Some(prev), Some(next)) => Ok(self.next_of(&prev)? == Some(next)
                && self.nicr_of(&prev, pool_state)? >= nicr
                && nicr >= self.nicr_of(&next, pool_state)?),
        }
    }

    /// Walks from the head to the first node with a lower NICR.
    pub fn find_insert_position(
        &self,
        pool_state: &PoolState,
        nicr: u64,
    ) -> Result<(Option<Pubkey>, Option<Pubkey>)> {
        let mut prev = None;
        let mut current = self.first(pool_state);
        while let Some(owner) = current {
            if self.nicr_of(&owner, pool_state)? < nicr {
                break;
            }
            prev = current;
            current = self.next_of(&owner)?;
        }
        Ok((prev, current))
    }

    /// Resolves the caller's hints, falling back to a walk when they are stale.
    fn resolve_hints(
        &self,
        pool_state: &PoolState,
        nicr: u64,
        prev_hint: Pubkey,
        next_hint: Pubkey,
    ) -> Result<(Option<Pubkey>, Option<Pubkey>)> {
        let (prev, next) = (link(prev_hint), link(next_hint));
        let hints_known = prev.map_or(true, |p| self.contains(&p))
            && next.map_or(true, |n| self.contains(&n));
        if hints_known && self.valid_insert_position(pool_state, nicr, prev, next)? {
            return Ok((prev, next));
        }
        self.find_insert_position(pool_state, nicr)
    }

    pub fn insert_sorted(
        &mut self,
        pool_state: &mut PoolState,
        owner: Pubkey,
        nicr: u64,
        prev_hint: Pubkey,
        next_hint: Pubkey,
    ) -> Result<()> {
        require!(
            !self.contains_node(pool_state, &owner)?,
            SortedTrovesError::AlreadyContains
        );
        require!(nicr > 0, SortedTrovesError::NICRZero);

        let (prev, next) = self.resolve_hints(pool_state, nicr, prev_hint, next_hint)?;

        match prev {
            Some(prev) => self.trove_mut(&prev)?.next = owner,
            None => pool_state.trove_head = owner,
        }
        match next {
            Some(next) => self.trove_mut(&next)?.prev = owner,
            None => pool_state.trove_tail = owner,
        }
        let trove = self.trove_mut(&owner)?;
        trove.prev = unlink(prev);
        trove.next = unlink(next);
        pool_state.trove_size += 1;

        emit!(NodeAdded { owner, nicr });
        Ok(())
    }

    pub fn remove_sorted(&mut self, pool_state: &mut PoolState, owner: &Pubkey) -> Result<()> {
        require!(
            self.contains_node(pool_state, owner)?,
            SortedTrovesError::NotContains
        );
        let (prev, next) = {
            let trove = self.trove(owner)?;
            (link(trove.prev), link(trove.next))
        };

        match prev {
            Some(prev) => self.trove_mut(&prev)?.next = unlink(next),
            None => pool_state.trove_head = unlink(next),
        }
        match next {
            Some(next) => self.trove_mut(&next)?.prev = unlink(prev),
            None => pool_state.trove_tail = unlink(prev),
        }
        let trove = self.trove_mut(owner)?;
        trove.prev = Pubkey::default();
        trove.next = Pubkey::default();
        pool_state.trove_size -= 1;

        emit!(NodeRemoved { owner: *owner });
        Ok(())
    }

    pub fn re_insert(
        &mut self,
        pool_state: &mut PoolState,
        owner: Pubkey,
        new_nicr: u64,
        prev_hint: Pubkey,
        next_hint: Pubkey,
    ) -> Result<()> {
        self.remove_sorted(pool_state, &owner)?;
        self.insert_sorted(pool_state, owner, new_nicr, prev_hint, next_hint)
    }

    /// A node is linked in when it has a neighbour or is the sole head.
    fn contains_node(&self, pool_state: &PoolState, owner: &Pubkey) -> Result<bool> {
        let trove = self.trove(owner)?;
        Ok(trove.prev != Pubkey::default()
            || trove.next != Pubkey::default()
            || pool_state.trove_head == *owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{state::Trove, test_utils::assert_error_code};

    struct List {
        book: TroveBook,
        pool_state: PoolState,
    }

    impl List {
        fn new() -> Self {
            Self {
                book: TroveBook::default(),
                pool_state: PoolState::default(),
            }
        }

        /// Adds an active trove whose NICR is `coll * 1e11 / 1`.
        fn push(&mut self, coll: u64) -> Pubkey {
            let owner = Pubkey::new_unique();
            let mut trove = Trove::new(Pubkey::default(), owner);
            trove.activate(coll, 1);
            self.book.insert(trove);
            owner
        }

        fn nicr(&self, owner: &Pubkey) -> u64 {
            self.book
                .trove(owner)
                .unwrap()
                .get_nominal_icr(&self.pool_state)
                .unwrap()
        }

        fn insert(&mut self, owner: Pubkey, prev: Pubkey, next: Pubkey) -> Result<()> {
            let nicr = self.nicr(&owner);
            self.book
                .insert_sorted(&mut self.pool_state, owner, nicr, prev, next)
        }

        fn walk(&self) -> Vec<Pubkey> {
            let mut out = vec![];
            let mut current = self.book.first(&self.pool_state);
            while let Some(owner) = current {
                out.push(owner);
                current = self.book.next_of(&owner).unwrap();
            }
            out
        }
    }

    #[test]
    fn insert_keeps_descending_nicr() {
        let mut list = List::new();
        let a = list.push(5);
        let b = list.push(9);
        let c = list.push(1);
        let d = list.push(7);
        for owner in [a, b, c, d] {
            list.insert(owner, Pubkey::default(), Pubkey::default())
                .unwrap();
        }
        assert_eq!(list.walk(), vec![b, d, a, c]);
        assert_eq!(list.book.first(&list.pool_state), Some(b));
        assert_eq!(list.book.last(&list.pool_state), Some(c));
        assert_eq!(list.book.size(&list.pool_state), 4);
        assert_eq!(list.book.prev_of(&c).unwrap(), Some(a));
    }

    #[test]
    fn valid_hint_is_used_and_stale_hint_falls_back() {
        let mut list = List::new();
        let a = list.push(10);
        let b = list.push(2);
        list.insert(a, Pubkey::default(), Pubkey::default()).unwrap();
        list.insert(b, a, Pubkey::default()).unwrap();

        let c = list.push(5);
        assert!(list
            .book
            .valid_insert_position(&list.pool_state, 5 * 100_000_000_000, Some(a), Some(b))
            .unwrap());
        // Hint points past where c belongs
        list.insert(c, b, Pubkey::default()).unwrap();
        assert_eq!(list.walk(), vec![a, c, b]);
    }

    #[test]
    fn remove_relinks_neighbours() {
        let mut list = List::new();
        let owners: Vec<Pubkey> = [3, 2, 1].iter().map(|c| list.push(*c)).collect();
        for owner in &owners {
            list.insert(*owner, Pubkey::default(), Pubkey::default())
                .unwrap();
        }
        list.book
            .remove_sorted(&mut list.pool_state, &owners[1])
            .unwrap();
        assert_eq!(list.walk(), vec![owners[0], owners[2]]);
        assert_eq!(list.book.prev_of(&owners[2]).unwrap(), Some(owners[0]));

        list.book
            .remove_sorted(&mut list.pool_state, &owners[0])
            .unwrap();
        list.book
            .remove_sorted(&mut list.pool_state, &owners[2])
            .unwrap();
        assert_eq!(list.book.first(&list.pool_state), None);
        assert_eq!(list.book.last(&list.pool_state), None);
        assert_eq!(list.book.size(&list.pool_state), 0);

        assert_error_code(
            list.book.remove_sorted(&mut list.pool_state, &owners[2]),
            SortedTrovesError::NotContains,
        );
    }

    #[test]
    fn re_insert_moves_node() {
        let mut list = List::new();
        let a = list.push(3);
        let b = list.push(2);
        list.insert(a, Pubkey::default(), Pubkey::default()).unwrap();
        list.insert(b, Pubkey::default(), Pubkey::default()).unwrap();

        list.book.get_mut(&b).unwrap().coll = 4;
        let nicr = list.nicr(&b);
        list.book
            .re_insert(&mut list.pool_state, b, nicr, Pubkey::default(), a)
            .unwrap();
        assert_eq!(list.walk(), vec![b, a]);
    }

    #[test]
    fn duplicate_and_zero_inserts_fail() {
        let mut list = List::new();
        let a = list.push(3);
        list.insert(a, Pubkey::default(), Pubkey::default()).unwrap();
        assert_error_code(
            list.insert(a, Pubkey::default(), Pubkey::default()),
            SortedTrovesError::AlreadyContains,
        );

        let z = list.push(0);
        assert_error_code(
            list.insert(z, Pubkey::default(), Pubkey::default()),
            SortedTrovesError::NICRZero,
        );
    }

    #[test]
    fn walking_into_unloaded_trove_fails() {
        let mut list = List::new();
        let a = list.push(3);
        list.insert(a, Pubkey::default(), Pubkey::default()).unwrap();
        list.book.get_mut(&a).unwrap().next = Pubkey::new_unique();

        let b = list.push(1);
        assert_error_code(
            list.insert(b, Pubkey::default(), Pubkey::default()),
            SortedTrovesError::MissingTroveAccount,
        );
    }
}
