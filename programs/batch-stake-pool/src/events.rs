use crate::registry::WeightDelta;
use anchor_lang::prelude::*;

#[event]
pub struct DepositEvent {
    pub user: Pubkey,
    pub batch_id: u64,
    pub assets: u64,
    pub shares: u64,
}

#[event]
pub struct UnlockRequestedEvent {
    pub user: Pubkey,
    pub batch_id: u64,
    pub shares: u64,
    pub spot_value: u64,
    pub exit_fee_bips: u16,
}

#[event]
pub struct UnlockCancelledEvent {
    pub user: Pubkey,
    pub batch_id: u64,
    pub shares: u64,
}

#[event]
pub struct RedeemEvent {
    pub user: Pubkey,
    pub receiver: Pubkey,
    pub batch_id: u64,
    pub assets: u64,
}

#[event]
pub struct BatchSubmittedEvent {
    pub batch_id: u64,
    pub bonded: u64,
    pub unbonded: u64,
    pub dust: u64,
    pub shares_burned: u64,
    pub activation_epoch: u64,
    pub total_pooled: u64,
}

#[event]
pub struct NodeAddedEvent {
    pub node: Pubkey,
}

#[event]
pub struct NodeRemovedEvent {
    pub node: Pubkey,
}

#[event]
pub struct NodeDisabledEvent {
    pub node: Pubkey,
}

#[event]
pub struct WeightsUpdatedEvent {
    pub deltas: Vec<WeightDelta>,
    pub total_weight: u64,
}

#[event]
pub struct ForcedUnbondEvent {
    pub node: Pubkey,
    pub amount: u64,
}

#[event]
pub struct WithdrawalsReleasedEvent {
    pub node: Pubkey,
    pub count: u8,
    pub forced_amount: u64,
}

#[event]
pub struct RewardsHarvestedEvent {
    pub node: Pubkey,
    pub amount: u64,
    pub total_pooled: u64,
}

#[event]
pub struct FeesClaimedEvent {
    pub recipient: Pubkey,
    pub management_shares: u64,
    pub exit_shares: u64,
}

#[event]
pub struct FeeRateUpdatedEvent {
    pub admin: Pubkey,
    pub management_fee_bips: u16,
    pub exit_fee_bips: u16,
}

#[event]
pub struct ConfigUpdatedEvent {
    pub admin: Pubkey,
    pub old_withdraw_delay: u64,
    pub new_withdraw_delay: u64,
    pub epoch_cutoff_slots: u64,
    pub fee_recipient: Pubkey,
}
