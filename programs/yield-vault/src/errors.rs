use anchor_lang::prelude::*;

/// Custom error codes for the Yield Vault program
///
/// Grouped by failure class. Every error aborts the whole transaction, so a
/// failed call never leaves partial state behind and can simply be retried.
#[error_code]
pub enum VaultError {
    // Input errors
    #[msg("Amount must be greater than zero")]
    ZeroAmount,

    #[msg("Operation would mint or burn zero shares")]
    ZeroShares,

    #[msg("Address must not be the default pubkey")]
    ZeroAddress,

    #[msg("Vault configuration is invalid")]
    InvalidConfig,

    #[msg("Remaining account legs do not match the declared layout")]
    InvalidLegLayout,

    // Authorization errors
    #[msg("Unauthorized - only the vault authority can perform this action")]
    Unauthorized,

    #[msg("Caller is not approved to spend the owner's shares")]
    InsufficientAllowance,

    // Liquidity errors
    #[msg("Withdraw amount exceeds the owner's maximum withdrawable assets")]
    ExceedsMaxWithdraw,

    #[msg("Redeem amount exceeds the owner's maximum redeemable shares")]
    ExceedsMaxRedeem,

    #[msg("Venue cannot supply the requested amount right now")]
    InsufficientVenueLiquidity,

    // Venue errors
    #[msg("Venue rejected the operation or is unavailable")]
    VenueUnavailable,

    #[msg("Account does not match the configured venue")]
    InvalidVenueAccount,

    #[msg("Venue did not credit the vault's position")]
    PositionNotCredited,

    // Oracle errors
    #[msg("Oracle price is older than the allowed window")]
    StaleOraclePrice,

    #[msg("Oracle price is non-positive or unverified")]
    InvalidOraclePrice,

    #[msg("No price update account for the required feed")]
    OracleFeedNotFound,

    #[msg("Oracle confidence interval is too wide")]
    OracleConfidenceTooWide,

    // Slippage errors
    #[msg("Swap output is below the oracle-derived minimum")]
    ExcessiveSlippage,

    // Protected asset errors
    #[msg("Token is managed by the vault and cannot be rescued")]
    ProtectedAsset,

    // Vault state errors
    #[msg("Vault is paused")]
    VaultPaused,

    #[msg("Vault is already executing an operation")]
    Reentrancy,

    #[msg("Invalid token mint - does not match vault configuration")]
    InvalidMint,

    #[msg("Invalid token account owner")]
    InvalidOwner,

    // Math errors
    #[msg("Math overflow occurred during calculation")]
    MathOverflow,

    #[msg("Cannot divide by zero")]
    DivisionByZero,
}
