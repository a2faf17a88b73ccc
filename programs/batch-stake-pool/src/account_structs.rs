use crate::error::*;
use crate::state::*;
use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

#[derive(Accounts)]
pub struct Initialize<'info> {
    #[account(
        init,
        payer = signer,
        space = Pool::LEN,
        seeds = [b"pool"],
        bump
    )]
    pub pool: Account<'info, Pool>,

    #[account(
        init,
        payer = signer,
        space = NodeRegistry::LEN,
        seeds = [b"registry"],
        bump
    )]
    pub registry: Account<'info, NodeRegistry>,

    #[account(
        init,
        payer = signer,
        space = BatchRecord::LEN,
        seeds = [b"batch", FIRST_BATCH_ID.to_le_bytes().as_ref()],
        bump
    )]
    pub first_batch: Account<'info, BatchRecord>,

    /// CHECK: This is a PDA that acts as vault authority, validated by seeds constraint.
    /// It owns the asset vault and the share escrow, and signs delegation calls.
    #[account(
        seeds = [b"vault_authority"],
        bump
    )]
    pub vault_authority: UncheckedAccount<'info>,

    /// CHECK: This is a PDA that acts as mint authority of the share mint, validated by seeds constraint
    #[account(
        seeds = [b"mint_authority"],
        bump
    )]
    pub mint_authority: UncheckedAccount<'info>,

    pub asset_mint: Account<'info, Mint>,

    #[account(
        constraint = share_mint.mint_authority == Some(mint_authority.key()).into() @ CustomErrorCode::InvalidMintAuthority
    )]
    pub share_mint: Account<'info, Mint>,

    /// Holds the pooled asset; handed over to vault_authority if the signer still owns it
    #[account(
        mut,
        constraint = vault_token_account.mint == asset_mint.key() @ CustomErrorCode::InvalidMint,
        constraint = (vault_token_account.owner == signer.key() || vault_token_account.owner == vault_authority.key()) @ CustomErrorCode::InvalidVaultAuthority
    )]
    pub vault_token_account: Account<'info, TokenAccount>,

    /// Holds shares of pending unlock requests and protocol exit fees
    #[account(
        mut,
        constraint = escrow_share_account.mint == share_mint.key() @ CustomErrorCode::InvalidMint,
        constraint = (escrow_share_account.owner == signer.key() || escrow_share_account.owner == vault_authority.key()) @ CustomErrorCode::InvalidVaultAuthority
    )]
    pub escrow_share_account: Account<'info, TokenAccount>,

    /// CHECK: Delegation program of the validating network, only stored
    #[account(executable)]
    pub network_program: UncheckedAccount<'info>,

    #[account(mut)]
    pub signer: Signer<'info>,

    /// CHECK: This is the program data account that contains the update authority
    pub program_data: UncheckedAccount<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct UpdatePool<'info> {
    #[account(
        mut,
        seeds = [b"pool"],
        bump = pool.bump
    )]
    pub pool: Account<'info, Pool>,

    #[account(
        constraint = share_mint.key() == pool.share_mint @ CustomErrorCode::InvalidMint
    )]
    pub share_mint: Account<'info, Mint>,

    /// CHECK: This is the program data account that contains the update authority
    pub program_data: UncheckedAccount<'info>,

    pub signer: Signer<'info>,
}

#[derive(Accounts)]
pub struct ManageNodes<'info> {
    #[account(
        mut,
        seeds = [b"registry"],
        bump = registry.bump
    )]
    pub registry: Account<'info, NodeRegistry>,

    /// CHECK: This is the program data account that contains the update authority
    pub program_data: UncheckedAccount<'info>,

    pub signer: Signer<'info>,
}

#[derive(Accounts)]
pub struct Deposit<'info> {
    #[account(
        mut,
        seeds = [b"pool"],
        bump = pool.bump
    )]
    pub pool: Account<'info, Pool>,

    #[account(
        mut,
        seeds = [b"batch", pool.current_batch_id.to_le_bytes().as_ref()],
        bump = current_batch.bump
    )]
    pub current_batch: Account<'info, BatchRecord>,

    #[account(
        mut,
        constraint = vault_token_account.mint == pool.asset_mint @ CustomErrorCode::InvalidMint,
        constraint = vault_token_account.owner == vault_authority.key() @ CustomErrorCode::InvalidVaultAuthority
    )]
    pub vault_token_account: Account<'info, TokenAccount>,

    /// CHECK: This is a PDA that acts as vault authority, validated by seeds constraint
    #[account(
        seeds = [b"vault_authority"],
        bump
    )]
    pub vault_authority: UncheckedAccount<'info>,

    #[account(
        mut,
        constraint = share_mint.key() == pool.share_mint @ CustomErrorCode::InvalidMint
    )]
    pub share_mint: Account<'info, Mint>,

    /// CHECK: This is a PDA that acts as mint authority, validated by seeds constraint
    #[account(
        seeds = [b"mint_authority"],
        bump,
        constraint = share_mint.mint_authority == Some(mint_authority.key()).into() @ CustomErrorCode::InvalidMintAuthority
    )]
    pub mint_authority: UncheckedAccount<'info>,

    pub signer: Signer<'info>,

    #[account(
        mut,
        constraint = user_asset_account.mint == pool.asset_mint @ CustomErrorCode::InvalidMint,
        constraint = user_asset_account.owner == signer.key() @ CustomErrorCode::InvalidTokenOwner
    )]
    pub user_asset_account: Account<'info, TokenAccount>,

    /// Receives the minted shares; may belong to anyone
    #[account(
        mut,
        constraint = receiver_share_account.mint == pool.share_mint @ CustomErrorCode::InvalidMint
    )]
    pub receiver_share_account: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
pub struct RequestUnlock<'info> {
    #[account(
        mut,
        seeds = [b"pool"],
        bump = pool.bump
    )]
    pub pool: Account<'info, Pool>,

    #[account(
        mut,
        seeds = [b"batch", pool.current_batch_id.to_le_bytes().as_ref()],
        bump = current_batch.bump
    )]
    pub current_batch: Account<'info, BatchRecord>,

    #[account(
        init_if_needed,
        payer = signer,
        space = UnlockQueue::LEN,
        seeds = [b"unlocks", signer.key().as_ref()],
        bump
    )]
    pub unlock_queue: Account<'info, UnlockQueue>,

    #[account(
        constraint = share_mint.key() == pool.share_mint @ CustomErrorCode::InvalidMint
    )]
    pub share_mint: Account<'info, Mint>,

    #[account(
        mut,
        constraint = user_share_account.mint == pool.share_mint @ CustomErrorCode::InvalidMint,
        constraint = user_share_account.owner == signer.key() @ CustomErrorCode::InvalidTokenOwner
    )]
    pub user_share_account: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = escrow_share_account.mint == pool.share_mint @ CustomErrorCode::InvalidMint,
        constraint = escrow_share_account.owner == vault_authority.key() @ CustomErrorCode::InvalidVaultAuthority
    )]
    pub escrow_share_account: Account<'info, TokenAccount>,

    /// CHECK: This is a PDA that acts as vault authority, validated by seeds constraint
    #[account(
        seeds = [b"vault_authority"],
        bump
    )]
    pub vault_authority: UncheckedAccount<'info>,

    #[account(mut)]
    pub signer: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct CancelUnlockRequest<'info> {
    #[account(
        mut,
        seeds = [b"pool"],
        bump = pool.bump
    )]
    pub pool: Account<'info, Pool>,

    #[account(
        mut,
        seeds = [b"batch", pool.current_batch_id.to_le_bytes().as_ref()],
        bump = current_batch.bump
    )]
    pub current_batch: Account<'info, BatchRecord>,

    #[account(
        mut,
        seeds = [b"unlocks", signer.key().as_ref()],
        bump = unlock_queue.bump,
        constraint = unlock_queue.owner == signer.key() @ CustomErrorCode::InvalidQueueOwner
    )]
    pub unlock_queue: Account<'info, UnlockQueue>,

    #[account(
        mut,
        constraint = user_share_account.mint == pool.share_mint @ CustomErrorCode::InvalidMint,
        constraint = user_share_account.owner == signer.key() @ CustomErrorCode::InvalidTokenOwner
    )]
    pub user_share_account: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = escrow_share_account.mint == pool.share_mint @ CustomErrorCode::InvalidMint,
        constraint = escrow_share_account.owner == vault_authority.key() @ CustomErrorCode::InvalidVaultAuthority
    )]
    pub escrow_share_account: Account<'info, TokenAccount>,

    /// CHECK: This is a PDA that acts as vault authority, validated by seeds constraint
    #[account(
        seeds = [b"vault_authority"],
        bump
    )]
    pub vault_authority: UncheckedAccount<'info>,

    pub signer: Signer<'info>,
    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
pub struct Redeem<'info> {
    #[account(
        seeds = [b"pool"],
        bump = pool.bump
    )]
    pub pool: Account<'info, Pool>,

    /// Batch of the redeemed request, matched by id in the handler
    pub batch: Account<'info, BatchRecord>,

    #[account(
        mut,
        seeds = [b"unlocks", signer.key().as_ref()],
        bump = unlock_queue.bump,
        constraint = unlock_queue.owner == signer.key() @ CustomErrorCode::InvalidQueueOwner
    )]
    pub unlock_queue: Account<'info, UnlockQueue>,

    #[account(
        mut,
        constraint = vault_token_account.mint == pool.asset_mint @ CustomErrorCode::InvalidMint,
        constraint = vault_token_account.owner == vault_authority.key() @ CustomErrorCode::InvalidVaultAuthority
    )]
    pub vault_token_account: Account<'info, TokenAccount>,

    /// CHECK: This is a PDA vault authority, validated by seeds and token account owner constraint
    #[account(
        seeds = [b"vault_authority"],
        bump
    )]
    pub vault_authority: UncheckedAccount<'info>,

    /// Receives the redeemed assets; may belong to anyone
    #[account(
        mut,
        constraint = receiver_asset_account.mint == pool.asset_mint @ CustomErrorCode::InvalidMint
    )]
    pub receiver_asset_account: Account<'info, TokenAccount>,

    pub signer: Signer<'info>,
    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
pub struct SubmitBatch<'info> {
    #[account(
        mut,
        seeds = [b"pool"],
        bump = pool.bump
    )]
    pub pool: Account<'info, Pool>,

    #[account(
        mut,
        seeds = [b"registry"],
        bump = registry.bump
    )]
    pub registry: Account<'info, NodeRegistry>,

    #[account(
        mut,
        seeds = [b"batch", pool.current_batch_id.to_le_bytes().as_ref()],
        bump = current_batch.bump
    )]
    pub current_batch: Account<'info, BatchRecord>,

    #[account(
        init,
        payer = signer,
        space = BatchRecord::LEN,
        seeds = [b"batch", pool.next_batch_id().to_le_bytes().as_ref()],
        bump
    )]
    pub next_batch: Account<'info, BatchRecord>,

    #[account(
        mut,
        constraint = share_mint.key() == pool.share_mint @ CustomErrorCode::InvalidMint
    )]
    pub share_mint: Account<'info, Mint>,

    #[account(
        mut,
        constraint = escrow_share_account.mint == pool.share_mint @ CustomErrorCode::InvalidMint,
        constraint = escrow_share_account.owner == vault_authority.key() @ CustomErrorCode::InvalidVaultAuthority
    )]
    pub escrow_share_account: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = vault_token_account.mint == pool.asset_mint @ CustomErrorCode::InvalidMint,
        constraint = vault_token_account.owner == vault_authority.key() @ CustomErrorCode::InvalidVaultAuthority
    )]
    pub vault_token_account: Account<'info, TokenAccount>,

    /// CHECK: This is a PDA that acts as vault authority, validated by seeds constraint
    #[account(
        seeds = [b"vault_authority"],
        bump
    )]
    pub vault_authority: UncheckedAccount<'info>,

    /// CHECK: Checked against the configured delegation program
    #[account(
        constraint = network_program.key() == pool.network_program @ CustomErrorCode::InvalidNetworkProgram
    )]
    pub network_program: UncheckedAccount<'info>,

    #[account(mut)]
    pub signer: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

/// Delegation calls against a single node. Node accounts travel in
/// remaining accounts.
#[derive(Accounts)]
pub struct NodeOperation<'info> {
    #[account(
        mut,
        seeds = [b"pool"],
        bump = pool.bump
    )]
    pub pool: Account<'info, Pool>,

    #[account(
        mut,
        seeds = [b"registry"],
        bump = registry.bump
    )]
    pub registry: Account<'info, NodeRegistry>,

    #[account(
        mut,
        seeds = [b"batch", pool.current_batch_id.to_le_bytes().as_ref()],
        bump = current_batch.bump
    )]
    pub current_batch: Account<'info, BatchRecord>,

    #[account(
        constraint = share_mint.key() == pool.share_mint @ CustomErrorCode::InvalidMint
    )]
    pub share_mint: Account<'info, Mint>,

    #[account(
        mut,
        constraint = vault_token_account.mint == pool.asset_mint @ CustomErrorCode::InvalidMint,
        constraint = vault_token_account.owner == vault_authority.key() @ CustomErrorCode::InvalidVaultAuthority
    )]
    pub vault_token_account: Account<'info, TokenAccount>,

    /// CHECK: This is a PDA that acts as vault authority, validated by seeds constraint
    #[account(
        seeds = [b"vault_authority"],
        bump
    )]
    pub vault_authority: UncheckedAccount<'info>,

    /// CHECK: Checked against the configured delegation program
    #[account(
        constraint = network_program.key() == pool.network_program @ CustomErrorCode::InvalidNetworkProgram
    )]
    pub network_program: UncheckedAccount<'info>,

    pub signer: Signer<'info>,
}

#[derive(Accounts)]
pub struct ForceUnbond<'info> {
    #[account(
        seeds = [b"pool"],
        bump = pool.bump
    )]
    pub pool: Account<'info, Pool>,

    #[account(
        mut,
        seeds = [b"registry"],
        bump = registry.bump
    )]
    pub registry: Account<'info, NodeRegistry>,

    #[account(
        mut,
        constraint = vault_token_account.mint == pool.asset_mint @ CustomErrorCode::InvalidMint,
        constraint = vault_token_account.owner == vault_authority.key() @ CustomErrorCode::InvalidVaultAuthority
    )]
    pub vault_token_account: Account<'info, TokenAccount>,

    /// CHECK: This is a PDA that acts as vault authority, validated by seeds constraint
    #[account(
        seeds = [b"vault_authority"],
        bump
    )]
    pub vault_authority: UncheckedAccount<'info>,

    /// CHECK: Checked against the configured delegation program
    #[account(
        constraint = network_program.key() == pool.network_program @ CustomErrorCode::InvalidNetworkProgram
    )]
    pub network_program: UncheckedAccount<'info>,

    /// CHECK: This is the program data account that contains the update authority
    pub program_data: UncheckedAccount<'info>,

    pub signer: Signer<'info>,
}

#[derive(Accounts)]
pub struct ClaimFees<'info> {
    #[account(
        mut,
        seeds = [b"pool"],
        bump = pool.bump
    )]
    pub pool: Account<'info, Pool>,

    #[account(
        mut,
        constraint = share_mint.key() == pool.share_mint @ CustomErrorCode::InvalidMint
    )]
    pub share_mint: Account<'info, Mint>,

    /// CHECK: This is a PDA that acts as mint authority, validated by seeds constraint
    #[account(
        seeds = [b"mint_authority"],
        bump,
        constraint = share_mint.mint_authority == Some(mint_authority.key()).into() @ CustomErrorCode::InvalidMintAuthority
    )]
    pub mint_authority: UncheckedAccount<'info>,

    #[account(
        mut,
        constraint = escrow_share_account.mint == pool.share_mint @ CustomErrorCode::InvalidMint,
        constraint = escrow_share_account.owner == vault_authority.key() @ CustomErrorCode::InvalidVaultAuthority
    )]
    pub escrow_share_account: Account<'info, TokenAccount>,

    /// CHECK: This is a PDA that acts as vault authority, validated by seeds constraint
    #[account(
        seeds = [b"vault_authority"],
        bump
    )]
    pub vault_authority: UncheckedAccount<'info>,

    #[account(
        mut,
        constraint = recipient_share_account.mint == pool.share_mint @ CustomErrorCode::InvalidMint,
        constraint = recipient_share_account.owner == pool.fee_recipient @ CustomErrorCode::InvalidFeeRecipient
    )]
    pub recipient_share_account: Account<'info, TokenAccount>,

    pub signer: Signer<'info>,
    pub token_program: Program<'info, Token>,
}
