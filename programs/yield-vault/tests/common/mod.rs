//! In-memory stand-ins for the token program, venues, router and oracle.
#![allow(dead_code)]

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use anchor_lang::prelude::*;
use yield_vault::{
    errors::VaultError,
    ledger::{AssetCustody, ShareLedger},
    oracle::{PriceFeed, PriceObservation},
    state::*,
    swap::SwapRouter,
    venue::YieldVenue,
};

pub type Shared = Rc<RefCell<World>>;

/// Token balances plus the external state of one mock venue
#[derive(Clone, Debug, Default)]
pub struct World {
    /// (owner, mint) -> amount
    pub balances: HashMap<(Pubkey, Pubkey), u64>,
    /// (holder, spender) -> delegated shares
    pub allowances: HashMap<(Pubkey, Pubkey), u64>,
    pub vault: Pubkey,
    pub asset_mint: Pubkey,
    pub share_mint: Pubkey,

    /// Deposit asset working inside the venue
    pub venue_position: u64,
    /// Cap on what the venue can pay out immediately
    pub venue_liquidity: Option<u64>,
    pub venue_down: bool,
    /// Share of each deposit the venue loses on entry, in bps
    pub entry_haircut_bps: u64,
    /// Rewards the venue will hand over on the next claim
    pub pending_rewards: Vec<(Pubkey, u64)>,

    /// (token_in, token_out) -> (numerator, denominator) realized by the router
    pub router_rates: HashMap<(Pubkey, Pubkey), (u64, u64)>,
    pub swaps_executed: Vec<(Pubkey, Pubkey, u64, u64)>,

    pub prices: HashMap<[u8; 32], PriceObservation>,
}

impl World {
    pub fn new() -> Shared {
        Rc::new(RefCell::new(World {
            vault: Pubkey::new_unique(),
            asset_mint: Pubkey::new_unique(),
            share_mint: Pubkey::new_unique(),
            ..World::default()
        }))
    }

    pub fn balance(&self, owner: &Pubkey, mint: &Pubkey) -> u64 {
        self.balances.get(&(*owner, *mint)).copied().unwrap_or(0)
    }

    pub fn credit(&mut self, owner: &Pubkey, mint: &Pubkey, amount: u64) {
        *self.balances.entry((*owner, *mint)).or_default() += amount;
    }

    pub fn debit(&mut self, owner: &Pubkey, mint: &Pubkey, amount: u64) -> Result<()> {
        let entry = self.balances.entry((*owner, *mint)).or_default();
        *entry = entry.checked_sub(amount).ok_or(VaultError::MathOverflow)?;
        Ok(())
    }

    pub fn float(&self) -> u64 {
        self.balance(&self.vault, &self.asset_mint)
    }

    pub fn shares_of(&self, holder: &Pubkey) -> u64 {
        self.balance(holder, &self.share_mint)
    }
}

/// Run `f` as a transaction: any error restores the world and the vault
pub fn transact<T>(
    world: &Shared,
    vault: &mut VaultState,
    f: impl FnOnce(&mut VaultState) -> Result<T>,
) -> Result<T> {
    let world_snapshot = world.borrow().clone();
    let vault_snapshot = vault.clone();
    let result = f(vault);
    if result.is_err() {
        *world.borrow_mut() = world_snapshot;
        *vault = vault_snapshot;
    }
    result
}

pub struct MockLedger(pub Shared);

impl ShareLedger for MockLedger {
    fn balance_of(&self, holder: &Pubkey) -> Result<u64> {
        Ok(self.0.borrow().shares_of(holder))
    }

    fn allowance(&self, holder: &Pubkey, spender: &Pubkey) -> Result<u64> {
        Ok(self
            .0
            .borrow()
            .allowances
            .get(&(*holder, *spender))
            .copied()
            .unwrap_or(0))
    }

    fn mint(&mut self, to: &Pubkey, shares: u64) -> Result<()> {
        let mut w = self.0.borrow_mut();
        let mint = w.share_mint;
        w.credit(to, &mint, shares);
        Ok(())
    }

    fn burn(&mut self, from: &Pubkey, spender: &Pubkey, shares: u64) -> Result<()> {
        let mut w = self.0.borrow_mut();
        if from != spender {
            let allowance = w.allowances.entry((*from, *spender)).or_default();
            *allowance = allowance
                .checked_sub(shares)
                .ok_or(VaultError::InsufficientAllowance)?;
        }
        let mint = w.share_mint;
        w.debit(from, &mint, shares)
    }
}

pub struct MockCustody(pub Shared);

impl AssetCustody for MockCustody {
    fn balance(&self, mint: &Pubkey) -> Result<u64> {
        let w = self.0.borrow();
        Ok(w.balance(&w.vault, mint))
    }

    fn pull(&mut self, from: &Pubkey, amount: u64) -> Result<()> {
        let mut w = self.0.borrow_mut();
        let (vault, asset) = (w.vault, w.asset_mint);
        w.debit(from, &asset, amount)?;
        w.credit(&vault, &asset, amount);
        Ok(())
    }

    fn push(&mut self, mint: &Pubkey, to: &Pubkey, amount: u64) -> Result<()> {
        let mut w = self.0.borrow_mut();
        let vault = w.vault;
        w.debit(&vault, mint, amount)?;
        w.credit(to, mint, amount);
        Ok(())
    }
}

/// Venue that holds deposit asset 1:1, less `entry_haircut_bps` on entry,
/// and pays out up to `venue_liquidity`
pub struct MockVenue(pub Shared);

impl YieldVenue for MockVenue {
    fn deposit_to_venue(&mut self, amount: u64) -> Result<()> {
        let mut w = self.0.borrow_mut();
        require!(!w.venue_down, VaultError::VenueUnavailable);
        let (vault, asset) = (w.vault, w.asset_mint);
        w.debit(&vault, &asset, amount)?;
        let haircut = amount * w.entry_haircut_bps / 10_000;
        w.venue_position += amount - haircut;
        Ok(())
    }

    fn withdraw_from_venue(&mut self, amount: u64, recipient: &Pubkey) -> Result<()> {
        let mut w = self.0.borrow_mut();
        let (vault, asset) = (w.vault, w.asset_mint);
        let float = w.float();
        if float < amount {
            let need = amount - float;
            let liquid = w.venue_liquidity.unwrap_or(u64::MAX).min(w.venue_position);
            require!(need <= liquid, VaultError::InsufficientVenueLiquidity);
            w.venue_position -= need;
            if let Some(cap) = w.venue_liquidity.as_mut() {
                *cap -= need;
            }
            w.credit(&vault, &asset, need);
        }
        w.debit(&vault, &asset, amount)?;
        w.credit(recipient, &asset, amount);
        Ok(())
    }

    fn venue_balance(&self) -> Result<u64> {
        let w = self.0.borrow();
        Ok(w.float() + w.venue_position)
    }

    fn available_liquidity(&self) -> Result<u64> {
        let w = self.0.borrow();
        let liquid = w.venue_liquidity.unwrap_or(u64::MAX).min(w.venue_position);
        Ok(w.float() + liquid)
    }

    fn claim_rewards(&mut self) -> Result<()> {
        let mut w = self.0.borrow_mut();
        let vault = w.vault;
        let pending: Vec<_> = w.pending_rewards.drain(..).collect();
        for (mint, amount) in pending {
            w.credit(&vault, &mint, amount);
        }
        Ok(())
    }
}

/// Router that fills at `router_rates` and enforces the caller's minimum
pub struct MockRouter(pub Shared);

impl SwapRouter for MockRouter {
    fn swap(
        &mut self,
        token_in: &Pubkey,
        token_out: &Pubkey,
        amount_in: u64,
        min_amount_out: u64,
    ) -> Result<u64> {
        let mut w = self.0.borrow_mut();
        let (num, den) = *w
            .router_rates
            .get(&(*token_in, *token_out))
            .ok_or(VaultError::VenueUnavailable)?;
        let amount_out = (amount_in as u128 * num as u128 / den as u128) as u64;

        let vault = w.vault;
        w.debit(&vault, token_in, amount_in)?;
        w.credit(&vault, token_out, amount_out);
        w.swaps_executed
            .push((*token_in, *token_out, amount_in, amount_out));

        require!(amount_out >= min_amount_out, VaultError::ExcessiveSlippage);
        Ok(amount_out)
    }
}

pub struct MockFeed(pub Shared);

impl PriceFeed for MockFeed {
    fn observe(&self, feed_id: &[u8; 32]) -> Result<PriceObservation> {
        self.0
            .borrow()
            .prices
            .get(feed_id)
            .copied()
            .ok_or(error!(VaultError::OracleFeedNotFound))
    }
}

/// Fail unless `result` is the given program error
pub fn assert_vault_error<T: std::fmt::Debug>(result: Result<T>, expected: VaultError) {
    match result {
        Err(anchor_lang::error::Error::AnchorError(e)) => {
            assert_eq!(e.error_code_number, u32::from(expected), "got {}", e.error_name)
        }
        other => panic!("expected {:?}, got {:?}", expected, other),
    }
}

/// USD price with 8-decimal exponent, published at `publish_time`
pub fn usd(price: f64, publish_time: i64) -> PriceObservation {
    PriceObservation {
        price: (price * 100_000_000.0).round() as i64,
        conf: 0,
        exponent: -8,
        publish_time,
    }
}

pub fn lending_config() -> VaultConfig {
    VaultConfig {
        venue: VenueConfig::Lending(LendingConfig {
            program: Pubkey::new_unique(),
            reserve: Pubkey::new_unique(),
            receipt_mint: Pubkey::new_unique(),
            liquidity_supply: Pubkey::new_unique(),
            market_bridge: None,
        }),
        swap_program: Pubkey::new_unique(),
        asset_feed: None,
        slippage_bps: 50,
        reward_routes: vec![],
    }
}

pub fn vault_state(world: &Shared, config: VaultConfig) -> VaultState {
    let w = world.borrow();
    VaultState {
        authority: Pubkey::new_unique(),
        asset_mint: w.asset_mint,
        asset_decimals: 6,
        share_mint: w.share_mint,
        vault_token_account: Pubkey::new_unique(),
        vault_id: 0,
        total_shares: 0,
        config,
        paused: false,
        locked: false,
        last_harvest: 0,
        bump: 255,
        share_bump: 255,
        authority_bump: 255,
        _reserved: [0; 64],
    }
}
