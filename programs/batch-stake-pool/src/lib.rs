pub mod account_structs;
/// # batch stake pool - Pooled Liquid Staking
///
/// ## Business Process Flow
///
/// 1. Initial Setup:
///    - Admin creates the asset mint and a share mint owned by the mint authority PDA
///    - Admin initializes the pool with withdraw delay, epoch cutoff and fee recipient
///    - Vault and escrow token accounts are handed over to the vault authority PDA
///    - Admin registers delegation nodes and assigns their weights
///
/// 2. Batching:
///    a. Deposits:
///       - User deposits assets into the vault
///       - Shares are minted at the current price (after fee accrual)
///       - Assets are added to the open batch
///
///    b. Unlock requests:
///       - User moves shares into escrow, minus the exit fee snapshot
///       - The spot value is fixed at request time
///       - Requests can be cancelled while their batch is still open
///
/// 3. Settlement:
///    - Anyone submits the open batch once the previous one has activated
///    - Net deposits are bonded, deficits first then by weight
///    - Net withdrawals are unbonded, excess first then by remaining stake
///    - Rounding dust is carried into the next batch
///    - Escrowed shares are burned and exit fees become protocol shares
///
/// 4. Redemption:
///    - Once the batch activated and the withdraw delay passed, the stored
///      spot value is paid out of the vault
///
/// 5. Node maintenance:
///    - Completed unstakes are released per node in FIFO order
///    - Disabled nodes are force unbonded, their stake is re-bonded elsewhere
///    - Rewards are harvested into the pool, raising the share price
///
/// Security is maintained through PDAs (Program Derived Addresses) and strict
/// token authority controls. Administrative instructions require the program
/// upgrade authority.
pub mod allocator;
pub mod batch;
pub mod error;
pub mod events;
pub mod fees;
mod guard;
pub mod math;
pub mod network;
pub mod processor;
pub mod registry;
pub mod state;
pub mod withdraw_slots;

#[cfg(test)]
mod mock;

use account_structs::*;
use anchor_lang::prelude::*;
use registry::WeightDelta;

declare_id!("HdaUp12qA1FoMQCvapV68GANKrWWP5jsShtBm4J2oh48");

#[program]
pub mod batch_stake_pool {
    use super::*;

    /// Creates the pool, the node registry and the first batch:
    /// - withdraw_delay: Epochs after activation before requests can be redeemed
    /// - epoch_cutoff_slots: Trailing slots of an epoch that delay activation by one more epoch
    /// - fee_recipient: Owner of the share account receiving protocol fees
    pub fn initialize(
        ctx: Context<Initialize>,
        withdraw_delay: u64,
        epoch_cutoff_slots: u64,
        fee_recipient: Pubkey,
    ) -> Result<()> {
        processor::initialize(ctx, withdraw_delay, epoch_cutoff_slots, fee_recipient)
    }

    pub fn update_config(
        ctx: Context<UpdatePool>,
        withdraw_delay: u64,
        epoch_cutoff_slots: u64,
        fee_recipient: Pubkey,
    ) -> Result<()> {
        processor::update_config(ctx, withdraw_delay, epoch_cutoff_slots, fee_recipient)
    }

    /// Accrues the management fee at the old rate before switching.
    pub fn set_management_fee(ctx: Context<UpdatePool>, bips: u16) -> Result<()> {
        processor::set_management_fee(ctx, bips)
    }

    /// Pending unlock requests keep the rate they were created with.
    pub fn set_exit_fee(ctx: Context<UpdatePool>, bips: u16) -> Result<()> {
        processor::set_exit_fee(ctx, bips)
    }

    pub fn update_fee_exempt(ctx: Context<UpdatePool>, owners: Vec<Pubkey>) -> Result<()> {
        processor::update_fee_exempt(ctx, owners)
    }

    pub fn add_node(ctx: Context<ManageNodes>, node: Pubkey) -> Result<()> {
        processor::add_node(ctx, node)
    }

    pub fn update_weights(ctx: Context<ManageNodes>, deltas: Vec<WeightDelta>) -> Result<()> {
        processor::update_weights(ctx, deltas)
    }

    pub fn disable_node(ctx: Context<ManageNodes>, node: Pubkey) -> Result<()> {
        processor::disable_node(ctx, node)
    }

    /// Only nodes without weight, stake or pending withdrawals can be removed.
    /// Node order is not stable across removals.
    pub fn remove_node(ctx: Context<ManageNodes>, node: Pubkey) -> Result<()> {
        processor::remove_node(ctx, node)
    }

    /// Handles user deposits into the open batch:
    /// - Transfers assets to the pool vault
    /// - Mints shares at the current price to the receiver
    pub fn deposit(ctx: Context<Deposit>, assets: u64, min_shares: u64) -> Result<()> {
        processor::deposit(ctx, assets, min_shares)
    }

    /// Queues an unlock of `shares` in the open batch:
    /// - Moves the shares into escrow
    /// - Fixes the asset value and the exit fee rate at request time
    pub fn request_unlock(
        ctx: Context<RequestUnlock>,
        shares: u64,
        min_spot_value: u64,
    ) -> Result<()> {
        processor::request_unlock(ctx, shares, min_spot_value)
    }

    /// Returns escrowed shares while the request's batch is still open.
    /// The last request takes the place of the cancelled one.
    pub fn cancel_unlock_request(ctx: Context<CancelUnlockRequest>, index: u32) -> Result<()> {
        processor::cancel_unlock_request(ctx, index)
    }

    /// Pays out a request once its batch activated and the withdraw delay passed.
    pub fn redeem(ctx: Context<Redeem>, index: u32) -> Result<()> {
        processor::redeem(ctx, index)
    }

    /// Settles the open batch against the delegation network and opens the
    /// next one. Node accounts are passed as remaining accounts.
    pub fn submit_batch<'info>(ctx: Context<'_, '_, 'info, 'info, SubmitBatch<'info>>) -> Result<()> {
        processor::submit_batch(ctx)
    }

    pub fn force_unbond<'info>(
        ctx: Context<'_, '_, 'info, 'info, ForceUnbond<'info>>,
        node: Pubkey,
    ) -> Result<()> {
        processor::force_unbond(ctx, node)
    }

    pub fn release_withdrawals<'info>(
        ctx: Context<'_, '_, 'info, 'info, NodeOperation<'info>>,
        node: Pubkey,
        max_count: u8,
    ) -> Result<()> {
        processor::release_withdrawals(ctx, node, max_count)
    }

    /// Completes a forced unbond; the returned assets join the open batch.
    pub fn release_forced<'info>(
        ctx: Context<'_, '_, 'info, 'info, NodeOperation<'info>>,
        node: Pubkey,
    ) -> Result<()> {
        processor::release_forced(ctx, node)
    }

    pub fn harvest_rewards<'info>(
        ctx: Context<'_, '_, 'info, 'info, NodeOperation<'info>>,
        node: Pubkey,
    ) -> Result<()> {
        processor::harvest_rewards(ctx, node)
    }

    pub fn claim_management_fees(ctx: Context<ClaimFees>) -> Result<()> {
        processor::claim_management_fees(ctx)
    }

    pub fn claim_exit_fees(ctx: Context<ClaimFees>) -> Result<()> {
        processor::claim_exit_fees(ctx)
    }
}
