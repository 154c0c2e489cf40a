use anchor_lang::prelude::*;
use anchor_lang::solana_program::program_option::COption;
use anchor_spl::token::{self, Burn, MintTo, Transfer};

use crate::{
    cpi::{find_token_account, find_vault_ata, read_token_account, token_amount, VaultSigner},
    errors::VaultError,
};

/// Per-holder share balances. Holders are wallets; implementations resolve
/// them to whatever account actually stores the balance.
pub trait ShareLedger {
    fn balance_of(&self, holder: &Pubkey) -> Result<u64>;

    /// Shares `spender` may burn on behalf of `holder`
    fn allowance(&self, holder: &Pubkey, spender: &Pubkey) -> Result<u64>;

    fn mint(&mut self, to: &Pubkey, shares: u64) -> Result<()>;

    /// Burn from `from`, authorized by `spender` (the holder or its delegate)
    fn burn(&mut self, from: &Pubkey, spender: &Pubkey, shares: u64) -> Result<()>;
}

/// Tokens held by the vault authority
pub trait AssetCustody {
    /// Vault balance of `mint`
    fn balance(&self, mint: &Pubkey) -> Result<u64>;

    /// Move deposit asset from `from` into the vault float
    fn pull(&mut self, from: &Pubkey, amount: u64) -> Result<()>;

    /// Pay `amount` of `mint` from the vault to `to`
    fn push(&mut self, mint: &Pubkey, to: &Pubkey, amount: u64) -> Result<()>;
}

/// Shares as an SPL mint whose authority is the vault PDA. An SPL delegate
/// on the holder's share account is the holder's approval.
pub struct SplShareLedger<'a, 'info> {
    token_program: AccountInfo<'info>,
    share_mint: AccountInfo<'info>,
    holder_accounts: Vec<AccountInfo<'info>>,
    spender: AccountInfo<'info>,
    signer: VaultSigner<'a, 'info>,
}

impl<'a, 'info> SplShareLedger<'a, 'info> {
    pub fn new(
        token_program: AccountInfo<'info>,
        share_mint: AccountInfo<'info>,
        holder_accounts: Vec<AccountInfo<'info>>,
        spender: AccountInfo<'info>,
        signer: VaultSigner<'a, 'info>,
    ) -> Self {
        Self {
            token_program,
            share_mint,
            holder_accounts,
            spender,
            signer,
        }
    }

    fn share_account(&self, holder: &Pubkey) -> Result<AccountInfo<'info>> {
        find_token_account(&self.holder_accounts, self.share_mint.key, holder)
            .ok_or(error!(VaultError::InvalidOwner))
    }
}

impl<'a, 'info> ShareLedger for SplShareLedger<'a, 'info> {
    fn balance_of(&self, holder: &Pubkey) -> Result<u64> {
        token_amount(&self.share_account(holder)?)
    }

    fn allowance(&self, holder: &Pubkey, spender: &Pubkey) -> Result<u64> {
        let account = read_token_account(&self.share_account(holder)?)?;
        Ok(match account.delegate {
            COption::Some(delegate) if delegate == *spender => account.delegated_amount,
            _ => 0,
        })
    }

    fn mint(&mut self, to: &Pubkey, shares: u64) -> Result<()> {
        let destination = self.share_account(to)?;
        token::mint_to(
            CpiContext::new_with_signer(
                self.token_program.clone(),
                MintTo {
                    mint: self.share_mint.clone(),
                    to: destination,
                    authority: self.signer.authority.clone(),
                },
                self.signer.seeds,
            ),
            shares,
        )
    }

    fn burn(&mut self, from: &Pubkey, spender: &Pubkey, shares: u64) -> Result<()> {
        require_keys_eq!(*spender, *self.spender.key, VaultError::Unauthorized);
        let source = self.share_account(from)?;
        token::burn(
            CpiContext::new(
                self.token_program.clone(),
                Burn {
                    mint: self.share_mint.clone(),
                    from: source,
                    authority: self.spender.clone(),
                },
            ),
            shares,
        )
    }
}

/// Token accounts owned by the vault authority, plus the outside accounts
/// funds arrive from or are paid to
pub struct SplCustody<'a, 'info> {
    token_program: AccountInfo<'info>,
    asset_mint: Pubkey,
    vault_accounts: Vec<AccountInfo<'info>>,
    holder_accounts: Vec<AccountInfo<'info>>,
    depositor: Option<AccountInfo<'info>>,
    signer: VaultSigner<'a, 'info>,
}

impl<'a, 'info> SplCustody<'a, 'info> {
    pub fn new(
        token_program: AccountInfo<'info>,
        asset_mint: Pubkey,
        vault_accounts: Vec<AccountInfo<'info>>,
        holder_accounts: Vec<AccountInfo<'info>>,
        depositor: Option<AccountInfo<'info>>,
        signer: VaultSigner<'a, 'info>,
    ) -> Self {
        Self {
            token_program,
            asset_mint,
            vault_accounts,
            holder_accounts,
            depositor,
            signer,
        }
    }

    fn vault_account(&self, mint: &Pubkey) -> Result<AccountInfo<'info>> {
        find_vault_ata(&self.vault_accounts, mint, &self.signer.key())
    }

    fn holder_account(&self, mint: &Pubkey, holder: &Pubkey) -> Result<AccountInfo<'info>> {
        find_token_account(&self.holder_accounts, mint, holder)
            .ok_or(error!(VaultError::InvalidOwner))
    }
}

impl<'a, 'info> AssetCustody for SplCustody<'a, 'info> {
    fn balance(&self, mint: &Pubkey) -> Result<u64> {
        token_amount(&self.vault_account(mint)?)
    }

    fn pull(&mut self, from: &Pubkey, amount: u64) -> Result<()> {
        let depositor = self.depositor.clone().ok_or(VaultError::Unauthorized)?;
        require_keys_eq!(*depositor.key, *from, VaultError::Unauthorized);

        let source = self.holder_account(&self.asset_mint, from)?;
        let float = self.vault_account(&self.asset_mint)?;
        token::transfer(
            CpiContext::new(
                self.token_program.clone(),
                Transfer {
                    from: source,
                    to: float,
                    authority: depositor,
                },
            ),
            amount,
        )
    }

    fn push(&mut self, mint: &Pubkey, to: &Pubkey, amount: u64) -> Result<()> {
        let source = self.vault_account(mint)?;
        let destination = self.holder_account(mint, to)?;
        token::transfer(
            CpiContext::new_with_signer(
                self.token_program.clone(),
                Transfer {
                    from: source,
                    to: destination,
                    authority: self.signer.authority.clone(),
                },
                self.signer.seeds,
            ),
            amount,
        )
    }
}
