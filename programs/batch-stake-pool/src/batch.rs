use crate::allocator;
use crate::error::CustomErrorCode;
use crate::math::{checked_add, checked_sub, mul_div};
use crate::network::{EpochInfo, StakingNetwork};
use crate::state::*;
use anchor_lang::prelude::*;

impl Pool {
    /// Minted supply plus accrued but unminted management fee shares.
    pub fn total_shares(&self, share_supply: u64) -> Result<u64> {
        checked_add(share_supply, self.management_fee.virtual_shares)
    }

    pub fn convert_to_shares(&self, assets: u64, share_supply: u64) -> Result<u64> {
        let total_shares = self.total_shares(share_supply)?;
        if total_shares == 0 || self.total_pooled == 0 {
            return Ok(assets);
        }
        mul_div(assets, total_shares, self.total_pooled)
    }

    pub fn convert_to_assets(&self, shares: u64, share_supply: u64) -> Result<u64> {
        let total_shares = self.total_shares(share_supply)?;
        mul_div(shares, self.total_pooled, total_shares)
    }

    fn require_current(&self, batch: &BatchRecord) -> Result<()> {
        require!(
            batch.id == self.current_batch_id,
            CustomErrorCode::NotCurrentBatch
        );
        require!(
            !batch.submission.is_settled(),
            CustomErrorCode::BatchAlreadySettled
        );
        Ok(())
    }

    /// Books `assets` already moved into the vault; returns shares to mint.
    pub fn deposit(
        &mut self,
        batch: &mut BatchRecord,
        assets: u64,
        min_shares: u64,
        share_supply: u64,
        now: i64,
    ) -> Result<u64> {
        require!(assets > 0, CustomErrorCode::InvalidAmount);
        self.require_current(batch)?;
        self.update_fees(share_supply, now)?;

        let shares = self.convert_to_shares(assets, share_supply)?;
        require!(shares > 0, CustomErrorCode::InvalidAmount);
        require!(shares >= min_shares, CustomErrorCode::BelowMinimum);

        self.total_pooled = checked_add(self.total_pooled, assets)?;
        batch.deposits.assets = checked_add(batch.deposits.assets, assets)?;
        batch.deposits.shares = checked_add(batch.deposits.shares, shares)?;
        Ok(shares)
    }

    /// Records an unlock request; the caller escrows `shares` gross.
    pub fn request_unlock(
        &mut self,
        batch: &mut BatchRecord,
        queue: &mut UnlockQueue,
        shares: u64,
        min_spot_value: u64,
        share_supply: u64,
        now: i64,
    ) -> Result<UnlockRequest> {
        require!(shares > 0, CustomErrorCode::InvalidAmount);
        self.require_current(batch)?;
        require!(
            queue.requests.len() < MAX_UNLOCK_REQUESTS,
            CustomErrorCode::TooManyUnlockRequests
        );
        self.update_fees(share_supply, now)?;

        let exit_fee_bips = if self.is_fee_exempt(&queue.owner) {
            0
        } else {
            self.exit_fee.bips
        };
        let fee_shares = ExitFee::fee_shares(shares, exit_fee_bips)?;
        let net_shares = checked_sub(shares, fee_shares)?;
        let spot_value = self.convert_to_assets(net_shares, share_supply)?;
        require!(spot_value > 0, CustomErrorCode::InvalidAmount);
        require!(spot_value >= min_spot_value, CustomErrorCode::BelowMinimum);

        batch.withdrawals.assets = checked_add(batch.withdrawals.assets, spot_value)?;
        batch.withdrawals.shares = checked_add(batch.withdrawals.shares, net_shares)?;
        self.exit_fee.escrow(fee_shares)?;

        let request = UnlockRequest {
            shares,
            spot_value,
            batch_id: batch.id,
            exit_fee_bips,
        };
        queue.requests.push(request);
        Ok(request)
    }

    /// Reverses a request of the open batch using its snapshot fee rate; the
    /// caller returns the gross shares from escrow. Swap-removes the entry.
    pub fn cancel_unlock_request(
        &mut self,
        batch: &mut BatchRecord,
        queue: &mut UnlockQueue,
        index: usize,
    ) -> Result<UnlockRequest> {
        let request = *queue
            .requests
            .get(index)
            .ok_or(CustomErrorCode::InvalidIndex)?;
        require!(
            request.batch_id == self.current_batch_id,
            CustomErrorCode::NotCurrentBatch
        );
        require!(
            request.batch_id == batch.id,
            CustomErrorCode::BatchMismatch
        );
        self.require_current(batch)?;

        let fee_shares = ExitFee::fee_shares(request.shares, request.exit_fee_bips)?;
        let net_shares = checked_sub(request.shares, fee_shares)?;
        batch.withdrawals.assets = checked_sub(batch.withdrawals.assets, request.spot_value)?;
        batch.withdrawals.shares = checked_sub(batch.withdrawals.shares, net_shares)?;
        self.exit_fee.refund(fee_shares)?;

        queue.requests.swap_remove(index);
        Ok(request)
    }

    /// Removes a matured request and returns the asset amount owed.
    pub fn redeem(
        &self,
        batch: &BatchRecord,
        queue: &mut UnlockQueue,
        index: usize,
        epoch: EpochInfo,
    ) -> Result<u64> {
        let request = *queue
            .requests
            .get(index)
            .ok_or(CustomErrorCode::InvalidIndex)?;
        require!(
            request.batch_id == batch.id,
            CustomErrorCode::BatchMismatch
        );
        require!(
            batch.submission.is_settled(),
            CustomErrorCode::BatchNotSettled
        );
        let redeemable_at = checked_add(batch.submission.activation_epoch, self.withdraw_delay)?;
        require!(
            epoch.epoch >= redeemable_at,
            CustomErrorCode::WithdrawDelayNotElapsed
        );

        queue.requests.swap_remove(index);
        Ok(request.spot_value)
    }

    /// Settles `current`, opens `next` and moves the batch pointer. The
    /// caller burns `shares_to_burn` from escrow.
    pub fn submit_batch<N: StakingNetwork>(
        &mut self,
        registry: &mut NodeRegistry,
        current: &mut BatchRecord,
        next: &mut BatchRecord,
        network: &mut N,
        share_supply: u64,
        now: i64,
    ) -> Result<Settlement> {
        self.update_fees(share_supply, now)?;
        self.require_current(current)?;
        require!(
            next.id == self.next_batch_id(),
            CustomErrorCode::NotCurrentBatch
        );

        let epoch = network.current_epoch()?;
        require!(
            epoch.epoch >= self.last_activation_epoch,
            CustomErrorCode::BatchDelayNotElapsed
        );
        require!(!current.is_empty(), CustomErrorCode::EmptyBatch);

        let deposits = current.deposits.assets;
        let withdrawals = current.withdrawals.assets;
        let target_total = self.total_pooled.saturating_sub(withdrawals);

        let mut settlement = Settlement {
            batch_id: current.id,
            shares_to_burn: current.withdrawals.shares,
            ..Default::default()
        };

        if deposits > withdrawals {
            let requested = deposits - withdrawals;
            settlement.bonded = allocator::bond(registry, target_total, requested, network)?;
            settlement.dust = requested - settlement.bonded;
            next.deposits.assets = checked_add(next.deposits.assets, settlement.dust)?;
            self.total_pooled = checked_sub(self.total_pooled, withdrawals)?;
        } else if withdrawals > deposits {
            let requested = withdrawals - deposits;
            settlement.unbonded = allocator::unbond(registry, target_total, requested, network)?;
            settlement.dust = requested - settlement.unbonded;
            // the shortfall stays pooled until a later batch unbonds it
            next.withdrawals.assets = checked_add(next.withdrawals.assets, settlement.dust)?;
            self.total_pooled =
                checked_sub(self.total_pooled, withdrawals - settlement.dust)?;
        } else {
            self.total_pooled = checked_sub(self.total_pooled, withdrawals)?;
        }

        self.exit_fee.settle()?;

        settlement.activation_epoch = epoch.activation_epoch();
        current.submission = BatchSubmission {
            submission_epoch: epoch.epoch,
            activation_epoch: settlement.activation_epoch,
        };
        self.last_activation_epoch = settlement.activation_epoch;
        self.current_batch_id = next.id;

        msg!(
            "batch {} settled: bonded {} unbonded {} dust {} activates at {}",
            settlement.batch_id,
            settlement.bonded,
            settlement.unbonded,
            settlement.dust,
            settlement.activation_epoch
        );
        Ok(settlement)
    }

    /// Adds harvested rewards to the pool, raising the share price. The
    /// rewards join the open batch without shares so the next settlement
    /// bonds them.
    pub fn record_rewards(
        &mut self,
        batch: &mut BatchRecord,
        amount: u64,
        share_supply: u64,
        now: i64,
    ) -> Result<()> {
        require!(amount > 0, CustomErrorCode::NothingToClaim);
        self.require_current(batch)?;
        self.update_fees(share_supply, now)?;
        self.total_pooled = checked_add(self.total_pooled, amount)?;
        batch.deposits.assets = checked_add(batch.deposits.assets, amount)?;
        Ok(())
    }

    /// Credits assets returned by a forced unstake to the open batch so the
    /// next settlement re-bonds them.
    pub fn restake_returned(&self, batch: &mut BatchRecord, amount: u64) -> Result<()> {
        self.require_current(batch)?;
        batch.deposits.assets = checked_add(batch.deposits.assets, amount)?;
        Ok(())
    }
}
