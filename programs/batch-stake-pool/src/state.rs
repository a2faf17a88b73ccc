use anchor_lang::prelude::*;
use std::collections::BTreeMap;

pub const BIPS_DENOMINATOR: u64 = 10_000;
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

pub const MAX_MANAGEMENT_FEE_BIPS: u16 = 200; // 2% per year
pub const MAX_EXIT_FEE_BIPS: u16 = 500;
pub const MAX_FEE_EXEMPT: usize = 5;

pub const MAX_WITHDRAW_DELAY: u64 = 30; // epochs
pub const MAX_EPOCH_CUTOFF_SLOTS: u64 = 432_000;

pub const MAX_NODES: usize = 16;
pub const MAX_UNLOCK_REQUESTS: usize = 16;

/// Circular withdraw slots per node, indices `0..=254`.
pub const WITHDRAW_SLOT_CAPACITY: u8 = 255;
/// Reserved handle for the single forced unstake of a disabled node.
pub const FORCED_WITHDRAW_SLOT: u8 = 255;

pub const FIRST_BATCH_ID: u64 = 1;

#[account]
#[derive(Default)]
pub struct Pool {
    pub asset_mint: Pubkey,
    pub share_mint: Pubkey,
    pub network_program: Pubkey,
    pub fee_recipient: Pubkey,
    pub current_batch_id: u64,
    /// Assets owned by share holders: staked, in flight, or idle in the vault.
    pub total_pooled: u64,
    pub last_activation_epoch: u64,
    pub withdraw_delay: u64,
    pub epoch_cutoff_slots: u64,
    pub management_fee: ManagementFee,
    pub exit_fee: ExitFee,
    pub exit_fee_exempt: Vec<Pubkey>,
    pub bump: u8,
}

impl Pool {
    pub const LEN: usize = 8
        + 32 * 4
        + 8 * 5
        + ManagementFee::LEN
        + ExitFee::LEN
        + 4 + (32 * MAX_FEE_EXEMPT)
        + 1;

    pub fn next_batch_id(&self) -> u64 {
        self.current_batch_id.saturating_add(1)
    }

    pub fn is_fee_exempt(&self, owner: &Pubkey) -> bool {
        self.exit_fee_exempt.contains(owner)
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ManagementFee {
    pub bips: u16,
    /// Accrued but not yet minted shares.
    pub virtual_shares: u64,
    pub last_update: i64,
}

impl ManagementFee {
    pub const LEN: usize = 2 + 8 + 8;
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExitFee {
    pub bips: u16,
    /// Fee shares of unlock requests that can still be cancelled.
    pub escrow_shares: u64,
    /// Fee shares finalized by settlement, claimable by the protocol.
    pub protocol_shares: u64,
}

impl ExitFee {
    pub const LEN: usize = 2 + 8 + 8;
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WithdrawIdSummary {
    pub oldest: u8,
    pub size: u8,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Node {
    pub id: Pubkey,
    pub weight: u64,
    pub staked: u64,
    pub disabled: bool,
    pub withdrawals: WithdrawIdSummary,
    pub forced_pending: bool,
    pub forced_amount: u64,
}

impl Node {
    pub const LEN: usize = 32 + 8 + 8 + 1 + 2 + 1 + 8;

    pub fn new(id: Pubkey) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }
}

#[account]
#[derive(Default)]
pub struct NodeRegistry {
    pub nodes: Vec<Node>,
    /// Node id to slot in `nodes`, offset by one so that zero means absent.
    pub index: BTreeMap<Pubkey, u8>,
    pub total_weight: u64,
    pub bump: u8,
}

impl NodeRegistry {
    pub const LEN: usize = 8
        + 4 + (Node::LEN * MAX_NODES)
        + 4 + ((32 + 1) * MAX_NODES)
        + 8
        + 1;
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Batch {
    pub assets: u64,
    pub shares: u64,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchSubmission {
    pub submission_epoch: u64,
    /// Zero until the batch settles; every activation epoch is at least one.
    pub activation_epoch: u64,
}

impl BatchSubmission {
    pub fn is_settled(&self) -> bool {
        self.activation_epoch != 0
    }
}

#[account]
#[derive(Default)]
pub struct BatchRecord {
    pub id: u64,
    pub deposits: Batch,
    pub withdrawals: Batch,
    pub submission: BatchSubmission,
    pub bump: u8,
}

impl BatchRecord {
    pub const LEN: usize = 8 + 8 + 16 + 16 + 16 + 1;

    pub fn new(id: u64) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.deposits.assets == 0 && self.withdrawals.assets == 0
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UnlockRequest {
    /// Gross shares, fee included.
    pub shares: u64,
    pub spot_value: u64,
    pub batch_id: u64,
    pub exit_fee_bips: u16,
}

impl UnlockRequest {
    pub const LEN: usize = 8 + 8 + 8 + 2;
}

#[account]
#[derive(Default)]
pub struct UnlockQueue {
    pub owner: Pubkey,
    pub requests: Vec<UnlockRequest>,
    pub bump: u8,
}

impl UnlockQueue {
    pub const LEN: usize = 8 + 32 + 4 + (UnlockRequest::LEN * MAX_UNLOCK_REQUESTS) + 1;
}

/// Outcome of a batch submission, consumed by the instruction handler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Settlement {
    pub batch_id: u64,
    pub bonded: u64,
    pub unbonded: u64,
    pub dust: u64,
    pub shares_to_burn: u64,
    pub activation_epoch: u64,
}
