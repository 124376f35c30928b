use anchor_lang::prelude::*;

#[error_code]
pub enum RiskError {
    // === Authorization Errors ===
    #[msg("Caller is not authorized to perform this action")]
    Unauthorized,

    // === State Errors ===
    #[msg("Market is not listed")]
    MarketNotListed,

    #[msg("Market is already listed")]
    MarketAlreadyListed,

    #[msg("Markets are not governed by the same risk engine")]
    MarketMismatch,

    #[msg("Borrower cannot liquidate their own position")]
    SelfLiquidationNotAllowed,

    #[msg("Action is paused")]
    ActionPaused,

    #[msg("Market is already executing an operation")]
    ReentrantCall,

    #[msg("Account has entered the maximum number of markets")]
    TooManyMarkets,

    #[msg("Account still has debt in this market")]
    NonzeroBorrowBalance,

    #[msg("Source and destination are the same account")]
    SelfTransferNotAllowed,

    #[msg("Market is not eligible for rewards")]
    MarketNotRewardEligible,

    #[msg("Amount must be greater than zero")]
    ZeroAmount,

    #[msg("First deposit does not cover the locked minimum shares")]
    InsufficientInitialDeposit,

    // === Parameter Errors ===
    #[msg("Collateral factor exceeds the maximum")]
    InvalidCollateralFactor,

    #[msg("Close factor outside the allowed range")]
    InvalidCloseFactor,

    #[msg("Liquidation incentive outside the allowed range")]
    InvalidLiquidationIncentive,

    #[msg("Protocol seize share exceeds the maximum")]
    InvalidProtocolSeizeShare,

    #[msg("Reserve factor exceeds the maximum")]
    InvalidReserveFactor,

    #[msg("Initial exchange rate must be greater than zero")]
    InvalidExchangeRate,

    #[msg("Decimal value cannot be represented as a WAD fraction")]
    InvalidDecimal,

    // === Freshness Errors ===
    #[msg("Market interest has not been accrued in the current block")]
    StaleAccrual,

    // === Economic Errors ===
    #[msg("Insufficient collateral")]
    InsufficientCollateral,

    #[msg("Market borrow cap reached")]
    BorrowCapReached,

    #[msg("Market supply cap reached")]
    SupplyCapReached,

    #[msg("Repay amount exceeds the close factor")]
    RepayTooLarge,

    #[msg("Repay amount exceeds outstanding debt")]
    RepayExceedsDebt,

    #[msg("Seize amount exceeds the borrower's collateral")]
    ExcessiveSeize,

    #[msg("Account has no shortfall, cannot liquidate")]
    NoLiquidationAvailable,

    #[msg("Borrower has no debt in the repaid market")]
    InsufficientShortfall,

    #[msg("Oracle price is unavailable")]
    PriceUnavailable,

    #[msg("Insufficient market cash")]
    InsufficientCash,

    #[msg("Insufficient share balance")]
    InsufficientShares,

    #[msg("Insufficient reserves")]
    InsufficientReserves,

    #[msg("Borrow rate exceeds the maximum")]
    RateTooHigh,

    #[msg("Asset transfer failed")]
    TransferFailed,

    // === Math Errors ===
    #[msg("Math overflow")]
    MathOverflow,

    #[msg("Math underflow")]
    MathUnderflow,

    #[msg("Division by zero")]
    DivisionByZero,
}

/// Assert that `result` failed with exactly `expected`
#[cfg(test)]
pub(crate) fn assert_risk_err<T: std::fmt::Debug>(result: Result<T>, expected: RiskError) {
    let err = result.expect_err("operation should have failed");
    assert_eq!(err, anchor_lang::error::Error::from(expected));
}
