use anchor_lang::prelude::*;

use crate::{
    errors::VaultError,
    ledger::{AssetCustody, ShareLedger},
    math::{self, Rounding},
    state::VaultState,
    venue::YieldVenue,
};

/// Share accounting over one venue.
///
/// Rounding always favors the vault: shares issued round down, shares burned
/// round up, assets paid out round down, assets pulled in round up.
pub struct VaultEngine<'a> {
    venue: Box<dyn YieldVenue + 'a>,
    shares: Box<dyn ShareLedger + 'a>,
    custody: Box<dyn AssetCustody + 'a>,
}

impl<'a> VaultEngine<'a> {
    pub fn new(
        venue: Box<dyn YieldVenue + 'a>,
        shares: Box<dyn ShareLedger + 'a>,
        custody: Box<dyn AssetCustody + 'a>,
    ) -> Self {
        Self {
            venue,
            shares,
            custody,
        }
    }

    /// Venue's redeemable balance, idle float included
    pub fn total_assets(&self) -> Result<u64> {
        self.venue.venue_balance()
    }

    pub fn balance_of(&self, owner: &Pubkey) -> Result<u64> {
        self.shares.balance_of(owner)
    }

    pub fn convert_to_shares(&self, vault: &VaultState, assets: u64) -> Result<u64> {
        self.shares_for(vault, assets, Rounding::Floor)
    }

    pub fn convert_to_assets(&self, vault: &VaultState, shares: u64) -> Result<u64> {
        self.assets_for(vault, shares, Rounding::Floor)
    }

    pub fn preview_deposit(&self, vault: &VaultState, assets: u64) -> Result<u64> {
        self.shares_for(vault, assets, Rounding::Floor)
    }

    pub fn preview_mint(&self, vault: &VaultState, shares: u64) -> Result<u64> {
        self.assets_for(vault, shares, Rounding::Ceiling)
    }

    pub fn preview_withdraw(&self, vault: &VaultState, assets: u64) -> Result<u64> {
        self.shares_for(vault, assets, Rounding::Ceiling)
    }

    pub fn preview_redeem(&self, vault: &VaultState, shares: u64) -> Result<u64> {
        self.assets_for(vault, shares, Rounding::Floor)
    }

    /// Assets `owner` can withdraw now: their share value, capped by what the
    /// venue can release immediately
    pub fn max_withdraw(&self, vault: &VaultState, owner: &Pubkey) -> Result<u64> {
        if vault.total_shares > 0 && self.total_assets()? == 0 {
            return Ok(0);
        }
        let owned = self.assets_for(vault, self.shares.balance_of(owner)?, Rounding::Floor)?;
        Ok(owned.min(self.venue.available_liquidity()?))
    }

    pub fn max_redeem(&self, vault: &VaultState, owner: &Pubkey) -> Result<u64> {
        let balance = self.shares.balance_of(owner)?;
        if vault.total_shares == 0 || self.total_assets()? == 0 {
            return Ok(0);
        }
        let liquid = self.shares_for(vault, self.venue.available_liquidity()?, Rounding::Floor)?;
        Ok(balance.min(liquid))
    }

    /// Pull `assets` from `caller`, route them to the venue and mint shares to
    /// `receiver`. Returns the shares minted.
    pub fn deposit(
        &mut self,
        vault: &mut VaultState,
        caller: &Pubkey,
        assets: u64,
        receiver: &Pubkey,
    ) -> Result<u64> {
        vault.enter()?;
        let result = self.deposit_locked(vault, caller, assets, receiver);
        vault.exit();
        result
    }

    fn deposit_locked(
        &mut self,
        vault: &mut VaultState,
        caller: &Pubkey,
        assets: u64,
        receiver: &Pubkey,
    ) -> Result<u64> {
        // CHECKS
        vault.ensure_active()?;
        require!(assets > 0, VaultError::ZeroAmount);
        require!(*receiver != Pubkey::default(), VaultError::ZeroAddress);

        require!(
            self.preview_deposit(vault, assets)? > 0,
            VaultError::ZeroShares
        );

        // INTERACTIONS
        let shares = self.enter_venue(vault, caller, assets)?;
        require!(shares > 0, VaultError::ZeroShares);

        // EFFECTS, share mint last
        self.book_issue(vault, shares)?;
        self.shares.mint(receiver, shares)?;
        msg!("Deposited {} for {} shares", assets, shares);
        Ok(shares)
    }

    /// Mint exactly `shares` to `receiver`, pulling the assets they cost.
    /// Returns the assets pulled.
    pub fn mint(
        &mut self,
        vault: &mut VaultState,
        caller: &Pubkey,
        shares: u64,
        receiver: &Pubkey,
    ) -> Result<u64> {
        vault.enter()?;
        let result = self.mint_locked(vault, caller, shares, receiver);
        vault.exit();
        result
    }

    fn mint_locked(
        &mut self,
        vault: &mut VaultState,
        caller: &Pubkey,
        shares: u64,
        receiver: &Pubkey,
    ) -> Result<u64> {
        vault.ensure_active()?;
        require!(shares > 0, VaultError::ZeroShares);
        require!(*receiver != Pubkey::default(), VaultError::ZeroAddress);

        let assets = self.preview_mint(vault, shares)?;
        require!(assets > 0, VaultError::ZeroAmount);

        let issued = self.enter_venue(vault, caller, assets)?;
        require!(issued >= shares, VaultError::ExcessiveSlippage);

        self.book_issue(vault, shares)?;
        self.shares.mint(receiver, shares)?;
        msg!("Minted {} shares for {}", shares, assets);
        Ok(assets)
    }

    /// Burn the shares worth `assets` from `owner` and pay `assets` to
    /// `receiver`. Returns the shares burned.
    pub fn withdraw(
        &mut self,
        vault: &mut VaultState,
        caller: &Pubkey,
        assets: u64,
        receiver: &Pubkey,
        owner: &Pubkey,
    ) -> Result<u64> {
        vault.enter()?;
        let result = self.withdraw_locked(vault, caller, assets, receiver, owner);
        vault.exit();
        result
    }

    fn withdraw_locked(
        &mut self,
        vault: &mut VaultState,
        caller: &Pubkey,
        assets: u64,
        receiver: &Pubkey,
        owner: &Pubkey,
    ) -> Result<u64> {
        // CHECKS
        require!(assets > 0, VaultError::ZeroAmount);
        require!(*receiver != Pubkey::default(), VaultError::ZeroAddress);
        require!(
            assets <= self.max_withdraw(vault, owner)?,
            VaultError::ExceedsMaxWithdraw
        );

        let shares = self.preview_withdraw(vault, assets)?;
        require!(shares > 0, VaultError::ZeroShares);
        self.check_spender(owner, caller, shares)?;

        // EFFECTS
        self.book_retire(vault, shares)?;

        // INTERACTIONS
        self.exit_venue(caller, assets, receiver, owner, shares)?;
        msg!("Withdrew {} for {} shares", assets, shares);
        Ok(shares)
    }

    /// Burn `shares` from `owner` and pay what they are worth to `receiver`.
    /// Returns the assets paid.
    pub fn redeem(
        &mut self,
        vault: &mut VaultState,
        caller: &Pubkey,
        shares: u64,
        receiver: &Pubkey,
        owner: &Pubkey,
    ) -> Result<u64> {
        vault.enter()?;
        let result = self.redeem_locked(vault, caller, shares, receiver, owner);
        vault.exit();
        result
    }

    fn redeem_locked(
        &mut self,
        vault: &mut VaultState,
        caller: &Pubkey,
        shares: u64,
        receiver: &Pubkey,
        owner: &Pubkey,
    ) -> Result<u64> {
        require!(shares > 0, VaultError::ZeroShares);
        require!(*receiver != Pubkey::default(), VaultError::ZeroAddress);
        require!(
            shares <= self.max_redeem(vault, owner)?,
            VaultError::ExceedsMaxRedeem
        );

        let assets = self.preview_redeem(vault, shares)?;
        require!(assets > 0, VaultError::ZeroAmount);
        self.check_spender(owner, caller, shares)?;

        self.book_retire(vault, shares)?;

        self.exit_venue(caller, assets, receiver, owner, shares)?;
        msg!("Redeemed {} shares for {}", shares, assets);
        Ok(assets)
    }

    fn shares_for(&self, vault: &VaultState, assets: u64, rounding: Rounding) -> Result<u64> {
        if vault.total_shares == 0 {
            return Ok(assets);
        }
        math::convert_to_shares(assets, self.total_assets()?, vault.total_shares, rounding)
    }

    fn assets_for(&self, vault: &VaultState, shares: u64, rounding: Rounding) -> Result<u64> {
        if vault.total_shares == 0 {
            return Ok(shares);
        }
        math::convert_to_assets(shares, self.total_assets()?, vault.total_shares, rounding)
    }

    /// Caller must be the owner or hold enough delegated shares
    fn check_spender(&self, owner: &Pubkey, caller: &Pubkey, shares: u64) -> Result<()> {
        if owner == caller {
            return Ok(());
        }
        let allowance = self.shares.allowance(owner, caller)?;
        require!(allowance > 0, VaultError::Unauthorized);
        require!(allowance >= shares, VaultError::InsufficientAllowance);
        Ok(())
    }

    fn book_issue(&self, vault: &mut VaultState, shares: u64) -> Result<()> {
        vault.total_shares = vault
            .total_shares
            .checked_add(shares)
            .ok_or(VaultError::MathOverflow)?;
        Ok(())
    }

    fn book_retire(&self, vault: &mut VaultState, shares: u64) -> Result<()> {
        vault.total_shares = vault
            .total_shares
            .checked_sub(shares)
            .ok_or(VaultError::MathOverflow)?;
        Ok(())
    }

    /// Pull `assets` into the venue and return the shares the realized
    /// increase of `total_assets` is worth at the pre-deposit price. Entry
    /// costs of the venue fall on the depositor, never on existing holders.
    fn enter_venue(&mut self, vault: &VaultState, caller: &Pubkey, assets: u64) -> Result<u64> {
        let before = self.total_assets()?;
        self.custody.pull(caller, assets)?;
        self.venue.deposit_to_venue(assets)?;
        let after = self.total_assets()?;

        let realized = after.saturating_sub(before);
        if realized < assets {
            msg!("Venue entry realized {} of {}", realized, assets);
        }
        if vault.total_shares == 0 {
            return Ok(realized);
        }
        math::convert_to_shares(realized, before, vault.total_shares, Rounding::Floor)
    }

    fn exit_venue(
        &mut self,
        caller: &Pubkey,
        assets: u64,
        receiver: &Pubkey,
        owner: &Pubkey,
        shares: u64,
    ) -> Result<()> {
        self.shares.burn(owner, caller, shares)?;
        self.venue.withdraw_from_venue(assets, receiver)
    }
}
