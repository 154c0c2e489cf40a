use anchor_lang::prelude::*;

/// Event emitted when a new vault is initialized
#[event]
pub struct VaultInitialized {
    pub vault: Pubkey,
    pub authority: Pubkey,
    pub asset_mint: Pubkey,
    pub share_mint: Pubkey,
    pub venue: String,
    pub slippage_bps: u16,
    pub timestamp: i64,
}

/// Event emitted on deposit and mint
#[event]
pub struct Deposited {
    pub vault: Pubkey,
    pub caller: Pubkey,
    pub receiver: Pubkey,
    pub assets: u64,
    pub shares: u64,
    pub total_assets: u64,
    pub total_shares: u64,
    pub timestamp: i64,
}

/// Event emitted on withdraw and redeem
#[event]
pub struct Withdrawn {
    pub vault: Pubkey,
    pub caller: Pubkey,
    pub receiver: Pubkey,
    pub owner: Pubkey,
    pub assets: u64,
    pub shares: u64,
    pub total_assets: u64,
    pub total_shares: u64,
    pub timestamp: i64,
}

/// Event emitted when rewards were converted and reinvested
#[event]
pub struct HarvestCompleted {
    pub vault: Pubkey,
    pub caller: Pubkey,
    pub reward_mints: Vec<Pubkey>,
    pub reward_amounts: Vec<u64>,
    pub swapped_amounts: Vec<u64>,
    pub assets_reinvested: u64,
    pub total_assets: u64,
    pub timestamp: i64,
}

/// Event emitted when a stray token is rescued
#[event]
pub struct FundsRescued {
    pub vault: Pubkey,
    pub mint: Pubkey,
    pub to: Pubkey,
    pub amount: u64,
    pub timestamp: i64,
}

/// Event emitted per reward token swept by the authority
#[event]
pub struct RewardsRescued {
    pub vault: Pubkey,
    pub mint: Pubkey,
    pub to: Pubkey,
    pub amount: u64,
    pub timestamp: i64,
}

/// Event emitted when the vault is paused or unpaused
#[event]
pub struct VaultPauseChanged {
    pub vault: Pubkey,
    pub paused: bool,
    pub timestamp: i64,
}

/// Event emitted when vault authority moves
#[event]
pub struct AuthorityTransferred {
    pub vault: Pubkey,
    pub previous: Pubkey,
    pub new_authority: Pubkey,
    pub timestamp: i64,
}
