use crate::error::CustomErrorCode;
use crate::math::{checked_add, checked_sub, mul_div};
use crate::state::*;
use anchor_lang::prelude::*;

impl ManagementFee {
    /// Shares owed to the protocol at `now`, including the unminted snapshot.
    /// Accrual compounds on the virtual shares as well as the minted supply.
    pub fn mintable(&self, share_supply: u64, now: i64) -> Result<u64> {
        let elapsed = now.saturating_sub(self.last_update);
        if elapsed <= 0 || self.bips == 0 {
            return Ok(self.virtual_shares);
        }
        let base = checked_add(share_supply, self.virtual_shares)? as u128;
        let accrued = (self.bips as u128)
            .checked_mul(base)
            .and_then(|v| v.checked_mul(elapsed as u128))
            .ok_or_else(|| error!(CustomErrorCode::MathOverflow))?
            / SECONDS_PER_YEAR as u128
            / BIPS_DENOMINATOR as u128;
        let accrued = u64::try_from(accrued).map_err(|_| error!(CustomErrorCode::MathOverflow))?;
        checked_add(self.virtual_shares, accrued)
    }

    pub fn accrue(&mut self, share_supply: u64, now: i64) -> Result<()> {
        self.virtual_shares = self.mintable(share_supply, now)?;
        // a clock that steps back must not reopen an accrued interval
        if now > self.last_update {
            self.last_update = now;
        }
        Ok(())
    }
}

impl ExitFee {
    pub fn fee_shares(shares: u64, bips: u16) -> Result<u64> {
        mul_div(shares, bips as u64, BIPS_DENOMINATOR)
    }

    pub fn escrow(&mut self, fee_shares: u64) -> Result<()> {
        self.escrow_shares = checked_add(self.escrow_shares, fee_shares)?;
        Ok(())
    }

    pub fn refund(&mut self, fee_shares: u64) -> Result<()> {
        self.escrow_shares = checked_sub(self.escrow_shares, fee_shares)?;
        Ok(())
    }

    /// Moves every escrowed share to the protocol. Irreversible.
    pub fn settle(&mut self) -> Result<u64> {
        let moved = self.escrow_shares;
        self.protocol_shares = checked_add(self.protocol_shares, moved)?;
        self.escrow_shares = 0;
        Ok(moved)
    }
}

impl Pool {
    /// Must run before anything that changes supply, the fee rate, or prices
    /// shares against assets.
    pub fn update_fees(&mut self, share_supply: u64, now: i64) -> Result<()> {
        self.management_fee.accrue(share_supply, now)
    }

    pub fn set_management_fee(&mut self, bips: u16, share_supply: u64, now: i64) -> Result<()> {
        self.update_fees(share_supply, now)?;
        require!(bips <= MAX_MANAGEMENT_FEE_BIPS, CustomErrorCode::FeeTooHigh);
        require!(bips != self.management_fee.bips, CustomErrorCode::FeeUnchanged);
        self.management_fee.bips = bips;
        Ok(())
    }

    pub fn set_exit_fee(&mut self, bips: u16) -> Result<()> {
        require!(bips <= MAX_EXIT_FEE_BIPS, CustomErrorCode::FeeTooHigh);
        require!(bips != self.exit_fee.bips, CustomErrorCode::FeeUnchanged);
        self.exit_fee.bips = bips;
        Ok(())
    }

    /// Zeroes the virtual snapshot; the caller mints the returned amount.
    pub fn claim_management_fees(&mut self, share_supply: u64, now: i64) -> Result<u64> {
        self.update_fees(share_supply, now)?;
        let amount = self.management_fee.virtual_shares;
        require!(amount > 0, CustomErrorCode::NothingToClaim);
        self.management_fee.virtual_shares = 0;
        Ok(amount)
    }

    /// Zeroes the finalized exit fee; the caller moves it out of escrow.
    pub fn claim_exit_fees(&mut self) -> Result<u64> {
        let amount = self.exit_fee.protocol_shares;
        require!(amount > 0, CustomErrorCode::NothingToClaim);
        self.exit_fee.protocol_shares = 0;
        Ok(amount)
    }
}
