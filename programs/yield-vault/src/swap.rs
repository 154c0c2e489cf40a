use std::collections::VecDeque;

use anchor_lang::prelude::*;

use crate::{
    cpi::{
        ensure_leg_scope, find_vault_ata, invoke_leg, token_amount, vault_atas, InstructionData,
        VaultSigner,
    },
    errors::VaultError,
    oracle::{OracleGuard, PricedMint},
};

/// Exchange between two mints through an external router
pub trait SwapRouter {
    /// Swap exactly `amount_in`, failing with `ExcessiveSlippage` when the
    /// realized output is below `min_amount_out`. Returns the realized output.
    fn swap(
        &mut self,
        token_in: &Pubkey,
        token_out: &Pubkey,
        amount_in: u64,
        min_amount_out: u64,
    ) -> Result<u64>;
}

/// Router reached by CPI. Each swap consumes the next leg of accounts, which
/// must contain the vault authority's `token_in` and `token_out` associated
/// accounts and no other account of the vault.
pub struct CpiSwapRouter<'a, 'info> {
    program: Pubkey,
    legs: VecDeque<&'a [AccountInfo<'info>]>,
    signer: VaultSigner<'a, 'info>,
}

impl<'a, 'info> CpiSwapRouter<'a, 'info> {
    pub fn new(
        program: Pubkey,
        legs: Vec<&'a [AccountInfo<'info>]>,
        signer: VaultSigner<'a, 'info>,
    ) -> Self {
        Self {
            program,
            legs: legs.into(),
            signer,
        }
    }
}

impl<'a, 'info> SwapRouter for CpiSwapRouter<'a, 'info> {
    fn swap(
        &mut self,
        token_in: &Pubkey,
        token_out: &Pubkey,
        amount_in: u64,
        min_amount_out: u64,
    ) -> Result<u64> {
        let leg = self.legs.pop_front().ok_or(VaultError::InvalidLegLayout)?;
        let vault = self.signer.key();
        ensure_leg_scope(leg, &vault, &vault_atas(&vault, &[*token_in, *token_out]))?;
        let source = find_vault_ata(leg, token_in, &vault)?;
        let destination = find_vault_ata(leg, token_out, &vault)?;

        let source_before = token_amount(&source)?;
        let balance_before = token_amount(&destination)?;

        let data = InstructionData::new("swap")
            .u64(amount_in)
            .u64(min_amount_out)
            .into_bytes();
        invoke_leg(&self.program, leg, data, &self.signer)?;

        // Slippage is judged on what actually arrived, not on what the router reports
        let balance_after = token_amount(&destination)?;
        let amount_out = balance_after
            .checked_sub(balance_before)
            .ok_or(VaultError::MathOverflow)?;
        let spent = source_before
            .checked_sub(token_amount(&source)?)
            .ok_or(VaultError::InvalidVenueAccount)?;
        require!(spent == amount_in, VaultError::InvalidVenueAccount);

        msg!(
            "Swapped {} {} for {} {} (min {})",
            amount_in,
            token_in,
            amount_out,
            token_out,
            min_amount_out
        );
        require!(amount_out >= min_amount_out, VaultError::ExcessiveSlippage);

        Ok(amount_out)
    }
}

/// Router paired with the oracle guard so every conversion carries a bound
pub struct SwapBridge<'a> {
    pub router: Box<dyn SwapRouter + 'a>,
    pub oracle: OracleGuard<'a>,
    pub slippage_bps: u16,
}

impl<'a> SwapBridge<'a> {
    pub fn new(router: Box<dyn SwapRouter + 'a>, oracle: OracleGuard<'a>, slippage_bps: u16) -> Self {
        Self {
            router,
            oracle,
            slippage_bps,
        }
    }

    /// Convert `amount_in` of `from` into `to` at no worse than the oracle
    /// rate less the slippage factor
    pub fn convert(&mut self, from: &PricedMint, to: &PricedMint, amount_in: u64) -> Result<u64> {
        let bound = self.oracle.bound(from, to, amount_in, self.slippage_bps)?;
        self.router
            .swap(&from.mint, &to.mint, amount_in, bound.min_amount_out)
    }
}
