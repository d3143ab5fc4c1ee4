use anchor_lang::prelude::*;

use super::StabilityPoolDeposit;
use crate::{errors::StabilityPoolError, ID};

/// Running collateral gain sum `S` for one (epoch, scale) of the stability pool.
#[account]
#[derive(InitSpace, Default, Debug, PartialEq, Eq)]
pub struct EpochScale {
    pub sum: u128,
}

impl EpochScale {
    pub fn address(sp_state: &Pubkey, epoch: u128, scale: u128) -> Pubkey {
        Pubkey::find_program_address(
            &[
                b"epoch-scale",
                sp_state.as_ref(),
                epoch.to_le_bytes().as_ref(),
                scale.to_le_bytes().as_ref(),
            ],
            &ID,
        )
        .0
    }

    fn load(account: &AccountInfo<'_>) -> Result<Self> {
        if account.data_is_empty() {
            return Ok(EpochScale::default());
        }
        require_keys_eq!(*account.owner, ID, StabilityPoolError::InvalidEpochScale);
        let data = account.try_borrow_data()?;
        EpochScale::try_deserialize(&mut data.as_ref())
    }
}

/// Reads the two sums a deposit's gain is computed from, at the snapshot's
/// `(epoch, scale)` and one scale later, out of the first two remaining accounts.
/// Either may still be uninitialized.
pub fn load_snapshot_epoch_scales(
    remaining_accounts: &[AccountInfo<'_>],
    sp_state: &Pubkey,
    deposit: &StabilityPoolDeposit,
) -> Result<Vec<((u128, u128), EpochScale)>> {
    require!(
        remaining_accounts.len() >= 2,
        StabilityPoolError::InvalidEpochScale
    );
    let keys = [
        (deposit.snapshots_epoch, deposit.snapshots_scale),
        (deposit.snapshots_epoch, deposit.snapshots_scale + 1),
    ];

    keys.iter()
        .zip(remaining_accounts)
        .map(|(&(epoch, scale), account)| {
            require_keys_eq!(
                *account.key,
                EpochScale::address(sp_state, epoch, scale),
                StabilityPoolError::InvalidEpochScale
            );
            Ok(((epoch, scale), EpochScale::load(account)?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::assert_error_code;

    #[test]
    fn snapshot_epoch_scales_are_checked_and_loaded() {
        let sp_state = Pubkey::new_unique();
        let deposit = StabilityPoolDeposit {
            snapshots_epoch: 1,
            snapshots_scale: 2,
            ..Default::default()
        };
        let first_key = EpochScale::address(&sp_state, 1, 2);
        let second_key = EpochScale::address(&sp_state, 1, 3);

        let mut data = Vec::new();
        EpochScale { sum: 77 }.try_serialize(&mut data).unwrap();
        let (mut l0, mut l1) = (0u64, 0u64);
        let mut empty: Vec<u8> = vec![];
        let system = Pubkey::default();
        let accounts = [
            AccountInfo::new(&first_key, false, true, &mut l0, &mut data, &ID, false, 0),
            AccountInfo::new(&second_key, false, true, &mut l1, &mut empty, &system, false, 0),
        ];

        let loaded = load_snapshot_epoch_scales(&accounts, &sp_state, &deposit).unwrap();
        assert_eq!(loaded[0], ((1, 2), EpochScale { sum: 77 }));
        assert_eq!(loaded[1], ((1, 3), EpochScale::default()));

        assert_error_code(
            load_snapshot_epoch_scales(&accounts, &Pubkey::new_unique(), &deposit),
            StabilityPoolError::InvalidEpochScale,
        );
        assert_error_code(
            load_snapshot_epoch_scales(&accounts[..1], &sp_state, &deposit),
            StabilityPoolError::InvalidEpochScale,
        );
    }
}
