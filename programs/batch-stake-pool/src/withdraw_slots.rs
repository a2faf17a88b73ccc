use crate::error::CustomErrorCode;
use crate::network::StakingNetwork;
use crate::state::{Node, WithdrawIdSummary, FORCED_WITHDRAW_SLOT, WITHDRAW_SLOT_CAPACITY};
use anchor_lang::prelude::*;

impl WithdrawIdSummary {
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn is_full(&self) -> bool {
        self.size == WITHDRAW_SLOT_CAPACITY
    }

    /// Reserves the next handle in FIFO order.
    pub fn allocate(&mut self) -> Result<u8> {
        require!(!self.is_full(), CustomErrorCode::WithdrawSlotsFull);
        let slot = ((self.oldest as u16 + self.size as u16) % WITHDRAW_SLOT_CAPACITY as u16) as u8;
        self.size += 1;
        Ok(slot)
    }

    /// Handles that `release(max_count)` would complete, oldest first.
    pub fn pending(&self, max_count: u8) -> impl Iterator<Item = u8> {
        let oldest = self.oldest as u16;
        (0..max_count.min(self.size) as u16)
            .map(move |offset| ((oldest + offset) % WITHDRAW_SLOT_CAPACITY as u16) as u8)
    }

    fn advance(&mut self, count: u8) {
        self.oldest = ((self.oldest as u16 + count as u16) % WITHDRAW_SLOT_CAPACITY as u16) as u8;
        self.size -= count;
    }
}

impl Node {
    /// Completes up to `max_count` pending unstakes. Any failed completion
    /// aborts before the summary moves.
    pub fn release_withdrawals<N: StakingNetwork>(
        &mut self,
        max_count: u8,
        network: &mut N,
    ) -> Result<u8> {
        require!(max_count > 0, CustomErrorCode::InvalidAmount);
        require!(!self.withdrawals.is_empty(), CustomErrorCode::NothingToClaim);

        let mut released = 0u8;
        for slot in self.withdrawals.pending(max_count) {
            network.claim_completed_unstake(&self.id, slot)?;
            released += 1;
        }
        self.withdrawals.advance(released);
        Ok(released)
    }

    /// Unstakes everything from a disabled node under the reserved handle.
    pub fn force_unbond<N: StakingNetwork>(&mut self, network: &mut N) -> Result<u64> {
        require!(self.disabled, CustomErrorCode::NodeNotDisabled);
        require!(!self.forced_pending, CustomErrorCode::ForcedWithdrawPending);
        require!(self.staked > 0, CustomErrorCode::NothingStaked);

        let amount = self.staked;
        network.unstake(&self.id, amount, FORCED_WITHDRAW_SLOT)?;
        self.staked = 0;
        self.forced_pending = true;
        self.forced_amount = amount;
        Ok(amount)
    }

    /// Completes the forced unstake and returns the amount that came back.
    pub fn release_forced<N: StakingNetwork>(&mut self, network: &mut N) -> Result<u64> {
        require!(self.forced_pending, CustomErrorCode::NoForcedWithdraw);
        network.claim_completed_unstake(&self.id, FORCED_WITHDRAW_SLOT)?;
        let amount = self.forced_amount;
        self.forced_pending = false;
        self.forced_amount = 0;
        Ok(amount)
    }

    pub fn has_pending_withdrawals(&self) -> bool {
        !self.withdrawals.is_empty() || self.forced_pending
    }
}
