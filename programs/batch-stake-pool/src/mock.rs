//! Test doubles for the delegation network and the share token.

use crate::error::CustomErrorCode;
use crate::network::{EpochInfo, StakingNetwork};
use anchor_lang::error::Error;
use anchor_lang::prelude::*;
use std::collections::HashMap;

pub fn error_code(err: Error) -> u32 {
    match err {
        Error::AnchorError(err) => err.error_code_number,
        Error::ProgramError(_) => u32::MAX,
    }
}

#[derive(Default)]
pub struct MockNetwork {
    pub epoch: EpochInfo,
    pub stakes: Vec<(Pubkey, u64)>,
    pub unstakes: Vec<(Pubkey, u64, u8)>,
    pub claims: Vec<(Pubkey, u8)>,
    pub reward_claims: Vec<Pubkey>,
    pub fail_stake: bool,
    pub fail_unstake: bool,
    pub fail_claim_slot: Option<u8>,
}

impl StakingNetwork for MockNetwork {
    fn stake(&mut self, node: &Pubkey, amount: u64) -> Result<()> {
        require!(!self.fail_stake, CustomErrorCode::NetworkCallFailed);
        self.stakes.push((*node, amount));
        Ok(())
    }

    fn unstake(&mut self, node: &Pubkey, amount: u64, slot: u8) -> Result<()> {
        require!(!self.fail_unstake, CustomErrorCode::NetworkCallFailed);
        self.unstakes.push((*node, amount, slot));
        Ok(())
    }

    fn claim_completed_unstake(&mut self, node: &Pubkey, slot: u8) -> Result<()> {
        require!(
            self.fail_claim_slot != Some(slot),
            CustomErrorCode::NetworkCallFailed
        );
        self.claims.push((*node, slot));
        Ok(())
    }

    fn claim_rewards(&mut self, node: &Pubkey) -> Result<()> {
        self.reward_claims.push(*node);
        Ok(())
    }

    fn current_epoch(&self) -> Result<EpochInfo> {
        Ok(self.epoch)
    }
}

/// Minimal share ledger with the conservation rules of an SPL mint.
#[derive(Default)]
pub struct ShareBook {
    pub balances: HashMap<Pubkey, u64>,
    pub supply: u64,
}

impl ShareBook {
    pub fn balance(&self, owner: &Pubkey) -> u64 {
        self.balances.get(owner).copied().unwrap_or_default()
    }

    pub fn mint(&mut self, to: &Pubkey, amount: u64) {
        *self.balances.entry(*to).or_default() += amount;
        self.supply += amount;
    }

    pub fn burn(&mut self, from: &Pubkey, amount: u64) {
        let balance = self.balances.entry(*from).or_default();
        *balance = balance.checked_sub(amount).expect("burn exceeds balance");
        self.supply -= amount;
    }

    pub fn transfer(&mut self, from: &Pubkey, to: &Pubkey, amount: u64) {
        let balance = self.balances.entry(*from).or_default();
        *balance = balance.checked_sub(amount).expect("transfer exceeds balance");
        *self.balances.entry(*to).or_default() += amount;
    }

    pub fn is_conserved(&self) -> bool {
        self.balances.values().sum::<u64>() == self.supply
    }
}
