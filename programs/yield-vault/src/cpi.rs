use anchor_lang::prelude::*;
use anchor_lang::solana_program::{
    instruction::{AccountMeta, Instruction},
    program::{get_return_data, invoke_signed},
};
use solana_sha256_hasher::hash;
use anchor_spl::{associated_token::get_associated_token_address, token::TokenAccount};

use crate::errors::VaultError;

/// Vault authority PDA plus the seeds that let the program sign for it
#[derive(Clone)]
pub struct VaultSigner<'a, 'info> {
    pub authority: AccountInfo<'info>,
    pub seeds: &'a [&'a [&'a [u8]]],
}

impl<'a, 'info> VaultSigner<'a, 'info> {
    pub fn key(&self) -> Pubkey {
        *self.authority.key
    }
}

/// Anchor instruction discriminator: first 8 bytes of sha256("global:<name>")
pub fn sighash(name: &str) -> [u8; 8] {
    let preimage = format!("global:{name}");
    let mut out = [0u8; 8];
    out.copy_from_slice(&hash(preimage.as_bytes()).to_bytes()[..8]);
    out
}

/// Borsh-encoded instruction data for an Anchor-style venue instruction
pub struct InstructionData(Vec<u8>);

impl InstructionData {
    pub fn new(name: &str) -> Self {
        Self(sighash(name).to_vec())
    }

    pub fn u8(mut self, value: u8) -> Self {
        self.0.push(value);
        self
    }

    pub fn u64(mut self, value: u64) -> Self {
        self.0.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn u64_vec(mut self, values: &[u64]) -> Self {
        self.0.extend_from_slice(&(values.len() as u32).to_le_bytes());
        for value in values {
            self.0.extend_from_slice(&value.to_le_bytes());
        }
        self
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

/// Invoke `program_id` with the leg's accounts, signing as the vault authority.
///
/// Account metas mirror the supplied infos in order; the vault authority is
/// marked as signer wherever it appears.
pub fn invoke_leg(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: Vec<u8>,
    signer: &VaultSigner,
) -> Result<()> {
    let metas: Vec<AccountMeta> = accounts
        .iter()
        .map(|acc| {
            let is_signer = acc.is_signer || acc.key == signer.authority.key;
            if acc.is_writable {
                AccountMeta::new(*acc.key, is_signer)
            } else {
                AccountMeta::new_readonly(*acc.key, is_signer)
            }
        })
        .collect();

    let ix = Instruction {
        program_id: *program_id,
        accounts: metas,
        data,
    };

    invoke_signed(&ix, accounts, signer.seeds).map_err(|e| {
        msg!("CPI into {} failed: {:?}", program_id, e);
        error!(VaultError::VenueUnavailable)
    })
}

/// Invoke a view instruction and decode its u64 return data
pub fn invoke_view_u64(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: Vec<u8>,
    signer: &VaultSigner,
) -> Result<u64> {
    invoke_leg(program_id, accounts, data, signer)?;

    let (returning_program, bytes) =
        get_return_data().ok_or(VaultError::VenueUnavailable)?;
    require_keys_eq!(returning_program, *program_id, VaultError::VenueUnavailable);

    let raw: [u8; 8] = bytes
        .get(..8)
        .and_then(|b| b.try_into().ok())
        .ok_or(VaultError::VenueUnavailable)?;
    Ok(u64::from_le_bytes(raw))
}

/// Remaining accounts split into `[venue, oracle, swap_0, swap_1, ...]`
pub struct Legs<'a, 'info> {
    pub venue: &'a [AccountInfo<'info>],
    pub oracle: &'a [AccountInfo<'info>],
    pub swaps: Vec<&'a [AccountInfo<'info>]>,
}

impl<'a, 'info> Legs<'a, 'info> {
    /// Partition `remaining` by the declared leg sizes. Missing trailing
    /// sizes count as empty legs; the sizes must cover every account.
    pub fn split(remaining: &'a [AccountInfo<'info>], sizes: &[u8]) -> Result<Self> {
        let (venue, oracle, swaps) = partition(remaining, sizes)?;
        Ok(Self { venue, oracle, swaps })
    }
}

/// `[venue, oracle, swap_0, ...]` slices of `items` by `sizes`
fn partition<'a, T>(items: &'a [T], sizes: &[u8]) -> Result<(&'a [T], &'a [T], Vec<&'a [T]>)> {
    let total: usize = sizes.iter().map(|s| *s as usize).sum();
    require!(total == items.len(), VaultError::InvalidLegLayout);

    let mut rest = items;
    let mut take = |n: usize| {
        let (head, tail) = rest.split_at(n);
        rest = tail;
        head
    };

    let venue = take(sizes.first().copied().unwrap_or(0) as usize);
    let oracle = take(sizes.get(1).copied().unwrap_or(0) as usize);
    let swaps = sizes.iter().skip(2).map(|n| take(*n as usize)).collect();
    Ok((venue, oracle, swaps))
}

/// Split `remaining` into the accounts the declared legs cover and the
/// trailing accounts after them
pub fn split_declared<'a, T>(remaining: &'a [T], sizes: &[u8]) -> Result<(&'a [T], &'a [T])> {
    let declared: usize = sizes.iter().map(|n| *n as usize).sum();
    require!(declared <= remaining.len(), VaultError::InvalidLegLayout);
    Ok(remaining.split_at(declared))
}

/// Deserialize an SPL token account, checking it belongs to the token program
pub fn read_token_account(info: &AccountInfo) -> Result<TokenAccount> {
    require_keys_eq!(*info.owner, anchor_spl::token::ID, VaultError::InvalidOwner);
    let data = info.try_borrow_data()?;
    TokenAccount::try_deserialize(&mut &data[..])
}

pub fn token_amount(info: &AccountInfo) -> Result<u64> {
    Ok(read_token_account(info)?.amount)
}

/// Locate the token account for `mint` owned by `owner` among `accounts`
pub fn find_token_account<'info>(
    accounts: &[AccountInfo<'info>],
    mint: &Pubkey,
    owner: &Pubkey,
) -> Option<AccountInfo<'info>> {
    accounts
        .iter()
        .find(|acc| {
            *acc.owner == anchor_spl::token::ID
                && read_token_account(acc)
                    .map(|t| t.mint == *mint && t.owner == *owner)
                    .unwrap_or(false)
        })
        .cloned()
}

/// Locate the vault authority's associated token account for `mint` among
/// `accounts`. Any other account holding the same mint is ignored, so a leg
/// cannot substitute its own account for the vault's.
pub fn find_vault_ata<'info>(
    accounts: &[AccountInfo<'info>],
    mint: &Pubkey,
    authority: &Pubkey,
) -> Result<AccountInfo<'info>> {
    let ata = get_associated_token_address(authority, mint);
    let info = find_account(accounts, &ata)?;
    let account = read_token_account(&info)?;
    require_keys_eq!(account.mint, *mint, VaultError::InvalidMint);
    require_keys_eq!(account.owner, *authority, VaultError::InvalidOwner);
    Ok(info)
}

/// The associated token account of the vault authority for each of `mints`
pub fn vault_atas(authority: &Pubkey, mints: &[Pubkey]) -> Vec<Pubkey> {
    mints
        .iter()
        .map(|mint| get_associated_token_address(authority, mint))
        .collect()
}

/// Fail when `leg` carries a token account of the vault authority outside
/// `allowed`. The leg is signed for as the vault, so any such account could be
/// drained by the callee.
pub fn ensure_leg_scope(leg: &[AccountInfo], authority: &Pubkey, allowed: &[Pubkey]) -> Result<()> {
    for acc in leg.iter().filter(|acc| *acc.owner == anchor_spl::token::ID) {
        let vault_owned = read_token_account(acc)
            .map(|t| t.owner == *authority)
            .unwrap_or(false);
        if vault_owned && !allowed.contains(acc.key) {
            msg!("Leg carries unexpected vault account {}", acc.key);
            return err!(VaultError::InvalidVenueAccount);
        }
    }
    Ok(())
}

/// Locate an account by address among `accounts`
pub fn find_account<'info>(
    accounts: &[AccountInfo<'info>],
    key: &Pubkey,
) -> Result<AccountInfo<'info>> {
    accounts
        .iter()
        .find(|acc| acc.key == key)
        .cloned()
        .ok_or(error!(VaultError::InvalidVenueAccount))
}
