// Constants for the Yield Vault program

/// Seed for vault state PDA
pub const VAULT_SEED: &[u8] = b"vault";

/// Seed for share mint PDA
pub const SHARE_MINT_SEED: &[u8] = b"shares";

/// Seed for the PDA that owns every vault token account and signs venue CPIs
pub const VAULT_AUTHORITY_SEED: &[u8] = b"vault_authority";

/// Basis point denominator (100%)
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Upper bound accepted for the configured slippage factor (5%)
/// Deployed configurations run between 10 and 50 bps
pub const MAX_SLIPPAGE_BPS: u16 = 500;

/// Maximum number of reward tokens a vault can harvest
pub const MAX_REWARD_ROUTES: usize = 4;

/// Maximum number of coins in a liquidity pool venue
pub const MAX_POOL_COINS: u8 = 4;

/// Oracle observations older than this are rejected
pub const MAX_PRICE_AGE_SECS: i64 = 60;

/// Widest oracle confidence interval accepted, relative to the price
pub const MAX_CONFIDENCE_BPS: u64 = 200;

/// Precision of every price returned by the oracle guard
pub const ORACLE_PRICE_DECIMALS: u8 = 9;

/// Largest decimal count supported for any mint handled by the vault
pub const MAX_TOKEN_DECIMALS: u8 = 18;
