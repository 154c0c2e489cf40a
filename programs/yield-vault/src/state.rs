use anchor_lang::prelude::*;

use crate::{constants::*, errors::VaultError};

/// Pyth feed identifier
pub type FeedId = [u8; 32];

/// Vault state: share supply plus the configuration fixed at initialization
///
/// Security considerations:
/// - Authority stored in state (not instruction args)
/// - Config is written once by `initialize` and never mutated
/// - `locked` guards every state-mutating entry point against re-entry
/// - Bumps stored for efficient PDA signing
#[account]
#[derive(InitSpace)]
pub struct VaultState {
    /// Authority that can pause the vault and rescue stray tokens
    pub authority: Pubkey,

    /// Mint of the deposit asset
    pub asset_mint: Pubkey,

    /// Decimals of the deposit asset
    pub asset_decimals: u8,

    /// Mint of the vault share token
    pub share_mint: Pubkey,

    /// Vault authority's token account for the deposit asset (idle float)
    pub vault_token_account: Pubkey,

    /// Distinguishes several vaults over the same deposit asset
    pub vault_id: u64,

    /// Total shares issued to depositors (mirrors share mint supply)
    pub total_shares: u64,

    /// Venue, oracle and router wiring
    pub config: VaultConfig,

    /// Blocks harvest, deposit and mint when set
    pub paused: bool,

    /// Set while an entry point is executing
    pub locked: bool,

    /// Unix timestamp of the last successful harvest
    pub last_harvest: i64,

    pub bump: u8,
    pub share_bump: u8,
    pub authority_bump: u8,

    pub _reserved: [u8; 64],
}

/// Immutable wiring of a vault
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, InitSpace)]
pub struct VaultConfig {
    /// The single venue this vault routes capital into
    pub venue: VenueConfig,

    /// Router program used for reward conversion and asset bridges
    pub swap_program: Pubkey,

    /// USD feed of the deposit asset; `None` treats the asset as a 1 USD stablecoin
    pub asset_feed: Option<[u8; 32]>,

    /// Maximum tolerated deviation from the oracle rate on every swap
    pub slippage_bps: u16,

    /// Reward tokens converted back into the deposit asset on harvest
    #[max_len(4)]
    pub reward_routes: Vec<RewardRoute>,
}

/// A reward token and the USD feed used to bound its conversion
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, InitSpace)]
pub struct RewardRoute {
    pub mint: Pubkey,
    pub decimals: u8,
    pub feed: [u8; 32],
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, InitSpace)]
pub enum VenueConfig {
    Lending(LendingConfig),
    LiquidityGauge(PoolGaugeConfig),
    Staking(StakingConfig),
}

/// Lending market supplying the deposit asset (or a bridged market asset)
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, InitSpace)]
pub struct LendingConfig {
    pub program: Pubkey,
    pub reserve: Pubkey,
    /// Interest-bearing receipt minted by the reserve
    pub receipt_mint: Pubkey,
    /// Reserve token account holding unborrowed liquidity
    pub liquidity_supply: Pubkey,
    /// Set when the market's unit of account differs from the deposit asset
    pub market_bridge: Option<MarketBridge>,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, InitSpace)]
pub struct MarketBridge {
    pub market_mint: Pubkey,
    pub market_decimals: u8,
    pub market_feed: [u8; 32],
}

/// Liquidity pool whose LP token is staked in a reward gauge
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, InitSpace)]
pub struct PoolGaugeConfig {
    pub pool_program: Pubkey,
    pub pool: Pubkey,
    pub lp_mint: Pubkey,
    pub gauge_program: Pubkey,
    pub gauge: Pubkey,
    /// Receipt minted by the gauge for staked LP
    pub gauge_mint: Pubkey,
    /// Pool token account holding the deposit coin
    pub pool_reserve: Pubkey,
    pub coin_count: u8,
    pub coin_index: u8,
}

/// Liquid staking derivative of the (wrapped) native deposit asset
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, InitSpace)]
pub struct StakingConfig {
    pub stake_program: Pubkey,
    pub stake_pool: Pubkey,
    pub derivative_mint: Pubkey,
    pub derivative_decimals: u8,
    /// USD feed of the derivative, crossed with the asset feed for the fair rate
    pub derivative_feed: [u8; 32],
    /// Stable pool token account holding the native side
    pub pool_reserve: Pubkey,
    pub entry: StakingEntry,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, InitSpace)]
pub enum StakingEntry {
    /// Mint the derivative through the stake program
    Wrap,
    /// Buy the derivative from the stable pool at an oracle-bounded rate
    StablePool,
}

impl VaultState {
    /// Space for the account including discriminator
    pub const SPACE: usize = 8 + VaultState::INIT_SPACE;

    pub fn ensure_authority(&self, caller: &Pubkey) -> Result<()> {
        require_keys_eq!(*caller, self.authority, VaultError::Unauthorized);
        Ok(())
    }

    pub fn ensure_active(&self) -> Result<()> {
        require!(!self.paused, VaultError::VaultPaused);
        Ok(())
    }

    /// Take the reentrancy lock
    pub fn enter(&mut self) -> Result<()> {
        require!(!self.locked, VaultError::Reentrancy);
        self.locked = true;
        Ok(())
    }

    /// Release the reentrancy lock
    pub fn exit(&mut self) {
        self.locked = false;
    }

    /// Mints the vault manages and that `rescue_funds` must never move
    pub fn protected_mints(&self) -> Vec<Pubkey> {
        let mut mints = vec![self.asset_mint, self.share_mint];
        mints.extend(self.config.venue.position_mints());
        mints.extend(self.config.reward_routes.iter().map(|r| r.mint));
        mints
    }

    pub fn is_protected(&self, mint: &Pubkey) -> bool {
        self.protected_mints().contains(mint)
    }

    pub fn reward_route(&self, mint: &Pubkey) -> Option<&RewardRoute> {
        self.config.reward_routes.iter().find(|r| r.mint == *mint)
    }
}

impl VenueConfig {
    /// Mints that represent the vault's position at the venue
    pub fn position_mints(&self) -> Vec<Pubkey> {
        match self {
            VenueConfig::Lending(c) => {
                let mut mints = vec![c.receipt_mint];
                if let Some(bridge) = &c.market_bridge {
                    mints.push(bridge.market_mint);
                }
                mints
            }
            VenueConfig::LiquidityGauge(c) => vec![c.lp_mint, c.gauge_mint],
            VenueConfig::Staking(c) => vec![c.derivative_mint],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            VenueConfig::Lending(_) => "lending",
            VenueConfig::LiquidityGauge(_) => "liquidity-gauge",
            VenueConfig::Staking(_) => "staking",
        }
    }
}

impl VaultConfig {
    /// Validate wiring once, before it is frozen into the vault account
    pub fn validate(&self, asset_mint: &Pubkey) -> Result<()> {
        require!(
            self.slippage_bps > 0 && self.slippage_bps <= MAX_SLIPPAGE_BPS,
            VaultError::InvalidConfig
        );
        require!(self.swap_program != Pubkey::default(), VaultError::ZeroAddress);
        require!(
            self.reward_routes.len() <= MAX_REWARD_ROUTES,
            VaultError::InvalidConfig
        );

        for (i, route) in self.reward_routes.iter().enumerate() {
            require!(route.mint != Pubkey::default(), VaultError::ZeroAddress);
            require!(route.mint != *asset_mint, VaultError::InvalidConfig);
            require!(route.decimals <= MAX_TOKEN_DECIMALS, VaultError::InvalidConfig);
            require!(
                !self.reward_routes[..i].iter().any(|r| r.mint == route.mint),
                VaultError::InvalidConfig
            );
        }

        match &self.venue {
            VenueConfig::Lending(c) => {
                for key in [c.program, c.reserve, c.receipt_mint, c.liquidity_supply] {
                    require!(key != Pubkey::default(), VaultError::ZeroAddress);
                }
                if let Some(bridge) = &c.market_bridge {
                    require!(bridge.market_mint != *asset_mint, VaultError::InvalidConfig);
                    require!(
                        bridge.market_decimals <= MAX_TOKEN_DECIMALS,
                        VaultError::InvalidConfig
                    );
                }
            }
            VenueConfig::LiquidityGauge(c) => {
                for key in [
                    c.pool_program,
                    c.pool,
                    c.lp_mint,
                    c.gauge_program,
                    c.gauge,
                    c.gauge_mint,
                    c.pool_reserve,
                ] {
                    require!(key != Pubkey::default(), VaultError::ZeroAddress);
                }
                require!(
                    c.coin_count >= 1 && c.coin_count <= MAX_POOL_COINS,
                    VaultError::InvalidConfig
                );
                require!(c.coin_index < c.coin_count, VaultError::InvalidConfig);
            }
            VenueConfig::Staking(c) => {
                for key in [c.stake_program, c.stake_pool, c.derivative_mint, c.pool_reserve] {
                    require!(key != Pubkey::default(), VaultError::ZeroAddress);
                }
                require!(c.derivative_mint != *asset_mint, VaultError::InvalidConfig);
                require!(
                    c.derivative_decimals <= MAX_TOKEN_DECIMALS,
                    VaultError::InvalidConfig
                );
                // fair derivative rate is derivative/USD crossed with asset/USD
                require!(self.asset_feed.is_some(), VaultError::InvalidConfig);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lending_config() -> VaultConfig {
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
            slippage_bps: 30,
            reward_routes: vec![],
        }
    }

    fn mock_vault(config: VaultConfig) -> VaultState {
        VaultState {
            authority: Pubkey::new_unique(),
            asset_mint: Pubkey::new_unique(),
            asset_decimals: 6,
            share_mint: Pubkey::new_unique(),
            vault_token_account: Pubkey::new_unique(),
            vault_id: 0,
            total_shares: 0,
            config,
            paused: false,
            locked: false,
            last_harvest: 0,
            bump: 0,
            share_bump: 0,
            authority_bump: 0,
            _reserved: [0; 64],
        }
    }

    #[test]
    fn test_valid_lending_config() {
        let asset = Pubkey::new_unique();
        assert!(lending_config().validate(&asset).is_ok());
    }

    #[test]
    fn test_slippage_bounds() {
        let asset = Pubkey::new_unique();
        let mut config = lending_config();
        config.slippage_bps = 0;
        assert!(config.validate(&asset).is_err());
        config.slippage_bps = MAX_SLIPPAGE_BPS + 1;
        assert!(config.validate(&asset).is_err());
        config.slippage_bps = MAX_SLIPPAGE_BPS;
        assert!(config.validate(&asset).is_ok());
    }

    #[test]
    fn test_duplicate_reward_route_rejected() {
        let asset = Pubkey::new_unique();
        let mut config = lending_config();
        let route = RewardRoute {
            mint: Pubkey::new_unique(),
            decimals: 6,
            feed: [1; 32],
        };
        config.reward_routes = vec![route.clone(), route];
        assert!(config.validate(&asset).is_err());
    }

    #[test]
    fn test_reward_cannot_be_deposit_asset() {
        let asset = Pubkey::new_unique();
        let mut config = lending_config();
        config.reward_routes = vec![RewardRoute {
            mint: asset,
            decimals: 6,
            feed: [1; 32],
        }];
        assert!(config.validate(&asset).is_err());
    }

    #[test]
    fn test_staking_requires_asset_feed() {
        let asset = Pubkey::new_unique();
        let mut config = lending_config();
        config.venue = VenueConfig::Staking(StakingConfig {
            stake_program: Pubkey::new_unique(),
            stake_pool: Pubkey::new_unique(),
            derivative_mint: Pubkey::new_unique(),
            derivative_decimals: 9,
            derivative_feed: [2; 32],
            pool_reserve: Pubkey::new_unique(),
            entry: StakingEntry::Wrap,
        });
        assert!(config.validate(&asset).is_err());
        config.asset_feed = Some([3; 32]);
        assert!(config.validate(&asset).is_ok());
    }

    #[test]
    fn test_pool_coin_index_in_range() {
        let asset = Pubkey::new_unique();
        let mut gauge = PoolGaugeConfig {
            pool_program: Pubkey::new_unique(),
            pool: Pubkey::new_unique(),
            lp_mint: Pubkey::new_unique(),
            gauge_program: Pubkey::new_unique(),
            gauge: Pubkey::new_unique(),
            gauge_mint: Pubkey::new_unique(),
            pool_reserve: Pubkey::new_unique(),
            coin_count: 2,
            coin_index: 2,
        };
        let mut config = lending_config();
        config.venue = VenueConfig::LiquidityGauge(gauge.clone());
        assert!(config.validate(&asset).is_err());

        gauge.coin_index = 1;
        config.venue = VenueConfig::LiquidityGauge(gauge);
        assert!(config.validate(&asset).is_ok());
    }

    #[test]
    fn test_protected_mints_cover_position_and_rewards() {
        let reward = Pubkey::new_unique();
        let mut config = lending_config();
        config.reward_routes = vec![RewardRoute {
            mint: reward,
            decimals: 6,
            feed: [1; 32],
        }];
        let vault = mock_vault(config);

        assert!(vault.is_protected(&vault.asset_mint));
        assert!(vault.is_protected(&vault.share_mint));
        assert!(vault.is_protected(&reward));
        if let VenueConfig::Lending(c) = &vault.config.venue {
            assert!(vault.is_protected(&c.receipt_mint));
        }
        assert!(!vault.is_protected(&Pubkey::new_unique()));
    }

    #[test]
    fn test_reentrancy_lock() {
        let mut vault = mock_vault(lending_config());
        vault.enter().unwrap();
        assert!(vault.enter().is_err());
        vault.exit();
        assert!(vault.enter().is_ok());
    }

    #[test]
    fn test_authority_check() {
        let vault = mock_vault(lending_config());
        assert!(vault.ensure_authority(&vault.authority).is_ok());
        assert!(vault.ensure_authority(&Pubkey::new_unique()).is_err());
    }
}
