use crate::error::CustomErrorCode;
use anchor_lang::prelude::*;

#[allow(deprecated)]
use anchor_lang::solana_program::bpf_loader_upgradeable::{self, UpgradeableLoaderState};

pub fn program_data_address(program_id: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[program_id.as_ref()], &bpf_loader_upgradeable::id()).0
}

/// Pool administration is reserved for the program's upgrade authority.
pub fn validate_admin(program_data_account: &UncheckedAccount, admin: &Signer) -> Result<()> {
    require_keys_eq!(
        program_data_account.key(),
        program_data_address(&crate::id()),
        CustomErrorCode::InvalidProgramData
    );

    let program_data = program_data_account
        .try_borrow_data()
        .map_err(|_| CustomErrorCode::InvalidProgramData)?;
    let loader_state = bincode::deserialize::<UpgradeableLoaderState>(&program_data)
        .map_err(|_| CustomErrorCode::InvalidProgramData)?;

    let UpgradeableLoaderState::ProgramData {
        upgrade_authority_address,
        ..
    } = loader_state
    else {
        return Err(CustomErrorCode::InvalidProgramData.into());
    };
    let authority = upgrade_authority_address.ok_or(CustomErrorCode::NoUpgradeAuthority)?;
    require_keys_eq!(
        admin.key(),
        authority,
        CustomErrorCode::InvalidUpgradeAuthority
    );
    Ok(())
}
