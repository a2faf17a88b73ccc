use crate::account_structs::*;
use crate::error::*;
use crate::events::*;
use crate::guard::validate_admin;
use crate::math::checked_sub;
use crate::network::{self, DelegationProgram, StakingNetwork};
use crate::registry::WeightDelta;
use crate::state::{FIRST_BATCH_ID, MAX_EPOCH_CUTOFF_SLOTS, MAX_FEE_EXEMPT, MAX_WITHDRAW_DELAY};
use anchor_lang::prelude::*;
use anchor_lang::solana_program::epoch_schedule::EpochSchedule;
use anchor_spl::token::spl_token::instruction::AuthorityType;
use anchor_spl::token::{self, Burn, MintTo, Transfer};

fn validate_config(withdraw_delay: u64, epoch_cutoff_slots: u64) -> Result<()> {
    require!(
        withdraw_delay <= MAX_WITHDRAW_DELAY,
        CustomErrorCode::InvalidWithdrawDelay
    );
    let slots_per_epoch = EpochSchedule::get()?.slots_per_epoch;
    require!(
        epoch_cutoff_slots <= MAX_EPOCH_CUTOFF_SLOTS && epoch_cutoff_slots < slots_per_epoch,
        CustomErrorCode::InvalidEpochCutoff
    );
    Ok(())
}

// Hands a token account over to the vault authority PDA
fn take_ownership<'info>(
    token_program: AccountInfo<'info>,
    account: AccountInfo<'info>,
    current_authority: AccountInfo<'info>,
    vault_authority: Pubkey,
) -> Result<()> {
    token::set_authority(
        CpiContext::new(
            token_program,
            token::SetAuthority {
                account_or_mint: account,
                current_authority,
            },
        ),
        AuthorityType::AccountOwner,
        Some(vault_authority),
    )
}

pub fn initialize(
    ctx: Context<Initialize>,
    withdraw_delay: u64,
    epoch_cutoff_slots: u64,
    fee_recipient: Pubkey,
) -> Result<()> {
    validate_admin(&ctx.accounts.program_data, &ctx.accounts.signer)?;
    validate_config(withdraw_delay, epoch_cutoff_slots)?;
    require!(
        ctx.accounts.asset_mint.key() != ctx.accounts.share_mint.key(),
        CustomErrorCode::InvalidMint
    );

    let pool = &mut ctx.accounts.pool;
    pool.asset_mint = ctx.accounts.asset_mint.key();
    pool.share_mint = ctx.accounts.share_mint.key();
    pool.network_program = ctx.accounts.network_program.key();
    pool.fee_recipient = fee_recipient;
    pool.current_batch_id = FIRST_BATCH_ID;
    pool.withdraw_delay = withdraw_delay;
    pool.epoch_cutoff_slots = epoch_cutoff_slots;
    pool.management_fee.last_update = Clock::get()?.unix_timestamp;
    pool.bump = ctx.bumps.pool;

    ctx.accounts.registry.bump = ctx.bumps.registry;

    let first_batch = &mut ctx.accounts.first_batch;
    first_batch.id = FIRST_BATCH_ID;
    first_batch.bump = ctx.bumps.first_batch;

    // Only the program may move pooled assets or escrowed shares
    let vault_authority = ctx.accounts.vault_authority.key();
    if ctx.accounts.vault_token_account.owner == ctx.accounts.signer.key() {
        take_ownership(
            ctx.accounts.token_program.to_account_info(),
            ctx.accounts.vault_token_account.to_account_info(),
            ctx.accounts.signer.to_account_info(),
            vault_authority,
        )?;
    }
    if ctx.accounts.escrow_share_account.owner == ctx.accounts.signer.key() {
        take_ownership(
            ctx.accounts.token_program.to_account_info(),
            ctx.accounts.escrow_share_account.to_account_info(),
            ctx.accounts.signer.to_account_info(),
            vault_authority,
        )?;
    }

    msg!(
        "Pool initialized: asset {} share {} network {}",
        ctx.accounts.pool.asset_mint,
        ctx.accounts.pool.share_mint,
        ctx.accounts.pool.network_program
    );
    Ok(())
}

pub fn update_config(
    ctx: Context<UpdatePool>,
    withdraw_delay: u64,
    epoch_cutoff_slots: u64,
    fee_recipient: Pubkey,
) -> Result<()> {
    validate_admin(&ctx.accounts.program_data, &ctx.accounts.signer)?;
    validate_config(withdraw_delay, epoch_cutoff_slots)?;

    let pool = &mut ctx.accounts.pool;
    let old_withdraw_delay = pool.withdraw_delay;
    pool.withdraw_delay = withdraw_delay;
    pool.epoch_cutoff_slots = epoch_cutoff_slots;
    pool.fee_recipient = fee_recipient;

    emit!(ConfigUpdatedEvent {
        admin: ctx.accounts.signer.key(),
        old_withdraw_delay,
        new_withdraw_delay: withdraw_delay,
        epoch_cutoff_slots,
        fee_recipient,
    });
    Ok(())
}

pub fn set_management_fee(ctx: Context<UpdatePool>, bips: u16) -> Result<()> {
    validate_admin(&ctx.accounts.program_data, &ctx.accounts.signer)?;
    let now = Clock::get()?.unix_timestamp;
    let share_supply = ctx.accounts.share_mint.supply;

    let pool = &mut ctx.accounts.pool;
    pool.set_management_fee(bips, share_supply, now)?;

    emit!(FeeRateUpdatedEvent {
        admin: ctx.accounts.signer.key(),
        management_fee_bips: pool.management_fee.bips,
        exit_fee_bips: pool.exit_fee.bips,
    });
    Ok(())
}

pub fn set_exit_fee(ctx: Context<UpdatePool>, bips: u16) -> Result<()> {
    validate_admin(&ctx.accounts.program_data, &ctx.accounts.signer)?;

    let pool = &mut ctx.accounts.pool;
    pool.set_exit_fee(bips)?;

    emit!(FeeRateUpdatedEvent {
        admin: ctx.accounts.signer.key(),
        management_fee_bips: pool.management_fee.bips,
        exit_fee_bips: pool.exit_fee.bips,
    });
    Ok(())
}

pub fn update_fee_exempt(ctx: Context<UpdatePool>, owners: Vec<Pubkey>) -> Result<()> {
    validate_admin(&ctx.accounts.program_data, &ctx.accounts.signer)?;
    require!(
        owners.len() <= MAX_FEE_EXEMPT,
        CustomErrorCode::TooManyFeeExempt
    );

    let pool = &mut ctx.accounts.pool;
    pool.exit_fee_exempt = owners;

    msg!(
        "Exit fee exemptions updated. New count: {}",
        pool.exit_fee_exempt.len()
    );
    Ok(())
}

pub fn add_node(ctx: Context<ManageNodes>, node: Pubkey) -> Result<()> {
    validate_admin(&ctx.accounts.program_data, &ctx.accounts.signer)?;
    ctx.accounts.registry.add_node(node)?;

    emit!(NodeAddedEvent { node });
    Ok(())
}

pub fn update_weights(ctx: Context<ManageNodes>, deltas: Vec<WeightDelta>) -> Result<()> {
    validate_admin(&ctx.accounts.program_data, &ctx.accounts.signer)?;
    let registry = &mut ctx.accounts.registry;
    registry.update_weights(&deltas)?;

    emit!(WeightsUpdatedEvent {
        deltas,
        total_weight: registry.total_weight,
    });
    Ok(())
}

pub fn disable_node(ctx: Context<ManageNodes>, node: Pubkey) -> Result<()> {
    validate_admin(&ctx.accounts.program_data, &ctx.accounts.signer)?;
    ctx.accounts.registry.disable_node(&node)?;

    emit!(NodeDisabledEvent { node });
    Ok(())
}

pub fn remove_node(ctx: Context<ManageNodes>, node: Pubkey) -> Result<()> {
    validate_admin(&ctx.accounts.program_data, &ctx.accounts.signer)?;
    ctx.accounts.registry.remove_node(&node)?;

    emit!(NodeRemovedEvent { node });
    Ok(())
}

pub fn deposit(ctx: Context<Deposit>, assets: u64, min_shares: u64) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let share_supply = ctx.accounts.share_mint.supply;

    let shares = ctx.accounts.pool.deposit(
        &mut ctx.accounts.current_batch,
        assets,
        min_shares,
        share_supply,
        now,
    )?;

    let cpi_accounts = Transfer {
        from: ctx.accounts.user_asset_account.to_account_info(),
        to: ctx.accounts.vault_token_account.to_account_info(),
        authority: ctx.accounts.signer.to_account_info(),
    };
    token::transfer(
        CpiContext::new(ctx.accounts.token_program.to_account_info(), cpi_accounts),
        assets,
    )?;

    let seeds: &[&[u8]] = &[b"mint_authority", &[ctx.bumps.mint_authority]];
    let signer = &[&seeds[..]];
    let cpi_accounts = MintTo {
        mint: ctx.accounts.share_mint.to_account_info(),
        to: ctx.accounts.receiver_share_account.to_account_info(),
        authority: ctx.accounts.mint_authority.to_account_info(),
    };
    token::mint_to(
        CpiContext::new_with_signer(
            ctx.accounts.token_program.to_account_info(),
            cpi_accounts,
            signer,
        ),
        shares,
    )?;

    emit!(DepositEvent {
        user: ctx.accounts.signer.key(),
        batch_id: ctx.accounts.current_batch.id,
        assets,
        shares,
    });
    Ok(())
}

pub fn request_unlock(ctx: Context<RequestUnlock>, shares: u64, min_spot_value: u64) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let share_supply = ctx.accounts.share_mint.supply;

    let queue = &mut ctx.accounts.unlock_queue;
    if queue.owner == Pubkey::default() {
        queue.owner = ctx.accounts.signer.key();
        queue.bump = ctx.bumps.unlock_queue;
    }
    require_keys_eq!(
        queue.owner,
        ctx.accounts.signer.key(),
        CustomErrorCode::InvalidQueueOwner
    );

    let request = ctx.accounts.pool.request_unlock(
        &mut ctx.accounts.current_batch,
        &mut ctx.accounts.unlock_queue,
        shares,
        min_spot_value,
        share_supply,
        now,
    )?;

    // Gross shares sit in escrow until settlement burns them
    let cpi_accounts = Transfer {
        from: ctx.accounts.user_share_account.to_account_info(),
        to: ctx.accounts.escrow_share_account.to_account_info(),
        authority: ctx.accounts.signer.to_account_info(),
    };
    token::transfer(
        CpiContext::new(ctx.accounts.token_program.to_account_info(), cpi_accounts),
        request.shares,
    )?;

    emit!(UnlockRequestedEvent {
        user: ctx.accounts.signer.key(),
        batch_id: request.batch_id,
        shares: request.shares,
        spot_value: request.spot_value,
        exit_fee_bips: request.exit_fee_bips,
    });
    Ok(())
}

pub fn cancel_unlock_request(ctx: Context<CancelUnlockRequest>, index: u32) -> Result<()> {
    let request = ctx.accounts.pool.cancel_unlock_request(
        &mut ctx.accounts.current_batch,
        &mut ctx.accounts.unlock_queue,
        index as usize,
    )?;

    let seeds: &[&[u8]] = &[b"vault_authority", &[ctx.bumps.vault_authority]];
    let signer = &[&seeds[..]];
    let transfer_accounts = Transfer {
        from: ctx.accounts.escrow_share_account.to_account_info(),
        to: ctx.accounts.user_share_account.to_account_info(),
        authority: ctx.accounts.vault_authority.to_account_info(),
    };
    token::transfer(
        CpiContext::new_with_signer(
            ctx.accounts.token_program.to_account_info(),
            transfer_accounts,
            signer,
        ),
        request.shares,
    )?;

    emit!(UnlockCancelledEvent {
        user: ctx.accounts.signer.key(),
        batch_id: request.batch_id,
        shares: request.shares,
    });
    Ok(())
}

pub fn redeem(ctx: Context<Redeem>, index: u32) -> Result<()> {
    let epoch = network::current_epoch(ctx.accounts.pool.epoch_cutoff_slots)?;
    let batch_id = ctx.accounts.batch.id;

    let assets = ctx.accounts.pool.redeem(
        &ctx.accounts.batch,
        &mut ctx.accounts.unlock_queue,
        index as usize,
        epoch,
    )?;

    require!(
        ctx.accounts.vault_token_account.amount >= assets,
        CustomErrorCode::InsufficientVaultBalance
    );

    let seeds: &[&[u8]] = &[b"vault_authority", &[ctx.bumps.vault_authority]];
    let signer = &[&seeds[..]];
    let transfer_accounts = Transfer {
        from: ctx.accounts.vault_token_account.to_account_info(),
        to: ctx.accounts.receiver_asset_account.to_account_info(),
        authority: ctx.accounts.vault_authority.to_account_info(),
    };
    token::transfer(
        CpiContext::new_with_signer(
            ctx.accounts.token_program.to_account_info(),
            transfer_accounts,
            signer,
        ),
        assets,
    )?;

    emit!(RedeemEvent {
        user: ctx.accounts.signer.key(),
        receiver: ctx.accounts.receiver_asset_account.key(),
        batch_id,
        assets,
    });
    Ok(())
}

pub fn submit_batch<'info>(ctx: Context<'_, '_, 'info, 'info, SubmitBatch<'info>>) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let share_supply = ctx.accounts.share_mint.supply;

    let program = ctx.accounts.network_program.to_account_info();
    let authority = ctx.accounts.vault_authority.to_account_info();
    let vault = ctx.accounts.vault_token_account.to_account_info();
    let mut network = DelegationProgram {
        program: &program,
        authority: &authority,
        vault: &vault,
        node_accounts: ctx.remaining_accounts,
        authority_bump: ctx.bumps.vault_authority,
        epoch_cutoff_slots: ctx.accounts.pool.epoch_cutoff_slots,
    };

    let accounts = &mut *ctx.accounts;
    accounts.next_batch.id = accounts.pool.next_batch_id();
    accounts.next_batch.bump = ctx.bumps.next_batch;

    let settlement = accounts.pool.submit_batch(
        &mut accounts.registry,
        &mut accounts.current_batch,
        &mut accounts.next_batch,
        &mut network,
        share_supply,
        now,
    )?;

    if settlement.shares_to_burn > 0 {
        let seeds: &[&[u8]] = &[b"vault_authority", &[ctx.bumps.vault_authority]];
        let signer = &[&seeds[..]];
        let burn_accounts = Burn {
            mint: accounts.share_mint.to_account_info(),
            from: accounts.escrow_share_account.to_account_info(),
            authority: accounts.vault_authority.to_account_info(),
        };
        token::burn(
            CpiContext::new_with_signer(
                accounts.token_program.to_account_info(),
                burn_accounts,
                signer,
            ),
            settlement.shares_to_burn,
        )?;
    }

    emit!(BatchSubmittedEvent {
        batch_id: settlement.batch_id,
        bonded: settlement.bonded,
        unbonded: settlement.unbonded,
        dust: settlement.dust,
        shares_burned: settlement.shares_to_burn,
        activation_epoch: settlement.activation_epoch,
        total_pooled: accounts.pool.total_pooled,
    });
    Ok(())
}

pub fn force_unbond<'info>(
    ctx: Context<'_, '_, 'info, 'info, ForceUnbond<'info>>,
    node: Pubkey,
) -> Result<()> {
    validate_admin(&ctx.accounts.program_data, &ctx.accounts.signer)?;

    let program = ctx.accounts.network_program.to_account_info();
    let authority = ctx.accounts.vault_authority.to_account_info();
    let vault = ctx.accounts.vault_token_account.to_account_info();
    let mut network = DelegationProgram {
        program: &program,
        authority: &authority,
        vault: &vault,
        node_accounts: ctx.remaining_accounts,
        authority_bump: ctx.bumps.vault_authority,
        epoch_cutoff_slots: ctx.accounts.pool.epoch_cutoff_slots,
    };

    let amount = ctx
        .accounts
        .registry
        .node_mut(&node)?
        .force_unbond(&mut network)?;

    emit!(ForcedUnbondEvent { node, amount });
    Ok(())
}

pub fn release_withdrawals<'info>(
    ctx: Context<'_, '_, 'info, 'info, NodeOperation<'info>>,
    node: Pubkey,
    max_count: u8,
) -> Result<()> {
    let program = ctx.accounts.network_program.to_account_info();
    let authority = ctx.accounts.vault_authority.to_account_info();
    let vault = ctx.accounts.vault_token_account.to_account_info();
    let mut network = DelegationProgram {
        program: &program,
        authority: &authority,
        vault: &vault,
        node_accounts: ctx.remaining_accounts,
        authority_bump: ctx.bumps.vault_authority,
        epoch_cutoff_slots: ctx.accounts.pool.epoch_cutoff_slots,
    };

    let count = ctx
        .accounts
        .registry
        .node_mut(&node)?
        .release_withdrawals(max_count, &mut network)?;

    emit!(WithdrawalsReleasedEvent {
        node,
        count,
        forced_amount: 0,
    });
    Ok(())
}

pub fn release_forced<'info>(
    ctx: Context<'_, '_, 'info, 'info, NodeOperation<'info>>,
    node: Pubkey,
) -> Result<()> {
    let program = ctx.accounts.network_program.to_account_info();
    let authority = ctx.accounts.vault_authority.to_account_info();
    let vault = ctx.accounts.vault_token_account.to_account_info();
    let mut network = DelegationProgram {
        program: &program,
        authority: &authority,
        vault: &vault,
        node_accounts: ctx.remaining_accounts,
        authority_bump: ctx.bumps.vault_authority,
        epoch_cutoff_slots: ctx.accounts.pool.epoch_cutoff_slots,
    };

    let accounts = &mut *ctx.accounts;
    let amount = accounts
        .registry
        .node_mut(&node)?
        .release_forced(&mut network)?;
    accounts
        .pool
        .restake_returned(&mut accounts.current_batch, amount)?;

    emit!(WithdrawalsReleasedEvent {
        node,
        count: 0,
        forced_amount: amount,
    });
    Ok(())
}

pub fn harvest_rewards<'info>(
    ctx: Context<'_, '_, 'info, 'info, NodeOperation<'info>>,
    node: Pubkey,
) -> Result<()> {
    require!(
        ctx.accounts.registry.contains(&node),
        CustomErrorCode::NodeNotFound
    );
    let now = Clock::get()?.unix_timestamp;
    let share_supply = ctx.accounts.share_mint.supply;

    let program = ctx.accounts.network_program.to_account_info();
    let authority = ctx.accounts.vault_authority.to_account_info();
    let vault = ctx.accounts.vault_token_account.to_account_info();
    let mut network = DelegationProgram {
        program: &program,
        authority: &authority,
        vault: &vault,
        node_accounts: ctx.remaining_accounts,
        authority_bump: ctx.bumps.vault_authority,
        epoch_cutoff_slots: ctx.accounts.pool.epoch_cutoff_slots,
    };

    // Rewards only show up as a vault balance change
    let before = ctx.accounts.vault_token_account.amount;
    network.claim_rewards(&node)?;
    ctx.accounts.vault_token_account.reload()?;
    let amount = checked_sub(ctx.accounts.vault_token_account.amount, before)?;

    let accounts = &mut *ctx.accounts;
    accounts.pool.record_rewards(
        &mut accounts.current_batch,
        amount,
        share_supply,
        now,
    )?;

    emit!(RewardsHarvestedEvent {
        node,
        amount,
        total_pooled: accounts.pool.total_pooled,
    });
    Ok(())
}

pub fn claim_management_fees(ctx: Context<ClaimFees>) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let share_supply = ctx.accounts.share_mint.supply;
    let amount = ctx
        .accounts
        .pool
        .claim_management_fees(share_supply, now)?;

    let seeds: &[&[u8]] = &[b"mint_authority", &[ctx.bumps.mint_authority]];
    let signer = &[&seeds[..]];
    let cpi_accounts = MintTo {
        mint: ctx.accounts.share_mint.to_account_info(),
        to: ctx.accounts.recipient_share_account.to_account_info(),
        authority: ctx.accounts.mint_authority.to_account_info(),
    };
    token::mint_to(
        CpiContext::new_with_signer(
            ctx.accounts.token_program.to_account_info(),
            cpi_accounts,
            signer,
        ),
        amount,
    )?;

    emit!(FeesClaimedEvent {
        recipient: ctx.accounts.pool.fee_recipient,
        management_shares: amount,
        exit_shares: 0,
    });
    Ok(())
}

pub fn claim_exit_fees(ctx: Context<ClaimFees>) -> Result<()> {
    let amount = ctx.accounts.pool.claim_exit_fees()?;

    let seeds: &[&[u8]] = &[b"vault_authority", &[ctx.bumps.vault_authority]];
    let signer = &[&seeds[..]];
    let transfer_accounts = Transfer {
        from: ctx.accounts.escrow_share_account.to_account_info(),
        to: ctx.accounts.recipient_share_account.to_account_info(),
        authority: ctx.accounts.vault_authority.to_account_info(),
    };
    token::transfer(
        CpiContext::new_with_signer(
            ctx.accounts.token_program.to_account_info(),
            transfer_accounts,
            signer,
        ),
        amount,
    )?;

    emit!(FeesClaimedEvent {
        recipient: ctx.accounts.pool.fee_recipient,
        management_shares: 0,
        exit_shares: amount,
    });
    Ok(())
}
