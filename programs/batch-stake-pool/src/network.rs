use crate::error::CustomErrorCode;
use anchor_lang::prelude::*;
use anchor_lang::solana_program::epoch_schedule::EpochSchedule;
use anchor_lang::solana_program::hash::hashv;
use anchor_lang::solana_program::instruction::{AccountMeta, Instruction};
use anchor_lang::solana_program::program::invoke_signed;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EpochInfo {
    pub epoch: u64,
    /// True once the epoch's delay period has started.
    pub past_cutoff: bool,
}

impl EpochInfo {
    /// Epoch at which an action taken now takes effect on the network.
    pub fn activation_epoch(&self) -> u64 {
        if self.past_cutoff {
            self.epoch + 2
        } else {
            self.epoch + 1
        }
    }
}

/// Delegation primitives of the validating network. Every call either
/// succeeds or aborts the enclosing instruction.
pub trait StakingNetwork {
    fn stake(&mut self, node: &Pubkey, amount: u64) -> Result<()>;
    fn unstake(&mut self, node: &Pubkey, amount: u64, slot: u8) -> Result<()>;
    fn claim_completed_unstake(&mut self, node: &Pubkey, slot: u8) -> Result<()>;
    fn claim_rewards(&mut self, node: &Pubkey) -> Result<()>;
    fn current_epoch(&self) -> Result<EpochInfo>;
}

pub const VAULT_AUTHORITY_SEED: &[u8] = b"vault_authority";

/// CPI adapter for the configured delegation program. The vault authority PDA
/// signs; the vault token account sends and receives the pooled asset.
pub struct DelegationProgram<'a, 'info> {
    pub program: &'a AccountInfo<'info>,
    pub authority: &'a AccountInfo<'info>,
    pub vault: &'a AccountInfo<'info>,
    pub node_accounts: &'a [AccountInfo<'info>],
    pub authority_bump: u8,
    pub epoch_cutoff_slots: u64,
}

impl<'a, 'info> DelegationProgram<'a, 'info> {
    fn node_account(&self, node: &Pubkey) -> Result<&'a AccountInfo<'info>> {
        self.node_accounts
            .iter()
            .find(|account| account.key == node)
            .ok_or_else(|| error!(CustomErrorCode::MissingNodeAccount))
    }

    fn call(&self, name: &str, node: &Pubkey, args: &[u8]) -> Result<()> {
        let node_account = self.node_account(node)?;

        // Anchor style instruction discriminator
        let preimage = format!("global:{}", name);
        let mut data = hashv(&[preimage.as_bytes()]).to_bytes()[..8].to_vec();
        data.extend_from_slice(args);

        let ix = Instruction {
            program_id: *self.program.key,
            accounts: vec![
                AccountMeta::new_readonly(*self.authority.key, true),
                AccountMeta::new(*self.vault.key, false),
                AccountMeta::new(*node_account.key, false),
            ],
            data,
        };
        let seeds: &[&[u8]] = &[VAULT_AUTHORITY_SEED, &[self.authority_bump]];
        invoke_signed(
            &ix,
            &[
                self.authority.clone(),
                self.vault.clone(),
                node_account.clone(),
                self.program.clone(),
            ],
            &[seeds],
        )
        .map_err(|err| {
            msg!("{} on node {} failed: {:?}", name, node, err);
            error!(CustomErrorCode::NetworkCallFailed)
        })
    }
}

impl StakingNetwork for DelegationProgram<'_, '_> {
    fn stake(&mut self, node: &Pubkey, amount: u64) -> Result<()> {
        self.call("stake", node, &amount.to_le_bytes())
    }

    fn unstake(&mut self, node: &Pubkey, amount: u64, slot: u8) -> Result<()> {
        let mut args = amount.to_le_bytes().to_vec();
        args.push(slot);
        self.call("unstake", node, &args)
    }

    fn claim_completed_unstake(&mut self, node: &Pubkey, slot: u8) -> Result<()> {
        self.call("claim_unstake", node, &[slot])
    }

    fn claim_rewards(&mut self, node: &Pubkey) -> Result<()> {
        self.call("claim_rewards", node, &[])
    }

    fn current_epoch(&self) -> Result<EpochInfo> {
        current_epoch(self.epoch_cutoff_slots)
    }
}

/// Reads the cluster epoch; the last `cutoff_slots` slots of an epoch count
/// as past the cutoff.
pub fn current_epoch(cutoff_slots: u64) -> Result<EpochInfo> {
    let clock = Clock::get()?;
    let schedule = EpochSchedule::get()?;
    let (epoch, slot_index) = schedule.get_epoch_and_slot_index(clock.slot);
    let cutoff = schedule
        .get_slots_in_epoch(epoch)
        .saturating_sub(cutoff_slots);
    Ok(EpochInfo {
        epoch,
        past_cutoff: slot_index >= cutoff,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activation_depends_on_cutoff() {
        let before = EpochInfo {
            epoch: 7,
            past_cutoff: false,
        };
        let after = EpochInfo {
            epoch: 7,
            past_cutoff: true,
        };
        assert_eq!(before.activation_epoch(), 8);
        assert_eq!(after.activation_epoch(), 9);
    }
}
