use anchor_lang::prelude::*;

#[error_code]
pub enum CustomErrorCode {
    #[msg("Invalid amount")]
    InvalidAmount = 1,
    #[msg("Result is below the caller supplied minimum")]
    BelowMinimum = 2,
    #[msg("Unlock request index out of bounds")]
    InvalidIndex = 3,
    #[msg("Arithmetic overflow")]
    MathOverflow = 4,

    #[msg("Invalid mint provided")]
    InvalidMint = 5,
    #[msg("Invalid vault authority")]
    InvalidVaultAuthority = 6,
    #[msg("Invalid mint authority")]
    InvalidMintAuthority = 7,
    #[msg("Invalid token account owner")]
    InvalidTokenOwner = 8,
    #[msg("Invalid network program")]
    InvalidNetworkProgram = 9,
    #[msg("Invalid fee recipient")]
    InvalidFeeRecipient = 10,

    #[msg("ProgramData account did not match expected PDA.")]
    InvalidProgramData = 11,
    #[msg("Program has no upgrade authority (set to None).")]
    NoUpgradeAuthority = 12,
    #[msg("Signer is not the upgrade authority.")]
    InvalidUpgradeAuthority = 13,

    #[msg("Withdraw delay out of range")]
    InvalidWithdrawDelay = 14,
    #[msg("Epoch cutoff out of range")]
    InvalidEpochCutoff = 15,
    #[msg("Fee rate above maximum")]
    FeeTooHigh = 16,
    #[msg("Fee rate unchanged")]
    FeeUnchanged = 17,
    #[msg("Too many fee exempt accounts")]
    TooManyFeeExempt = 18,

    #[msg("Batch is not the current batch")]
    NotCurrentBatch = 19,
    #[msg("Batch already settled")]
    BatchAlreadySettled = 20,
    #[msg("Batch not settled")]
    BatchNotSettled = 21,
    #[msg("Previous batch has not activated yet")]
    BatchDelayNotElapsed = 22,
    #[msg("Withdraw delay not elapsed")]
    WithdrawDelayNotElapsed = 23,
    #[msg("Batch has no deposits or withdrawals")]
    EmptyBatch = 24,
    #[msg("Unlock request does not belong to this batch")]
    BatchMismatch = 25,
    #[msg("Too many outstanding unlock requests")]
    TooManyUnlockRequests = 26,
    #[msg("Invalid unlock queue owner")]
    InvalidQueueOwner = 27,

    #[msg("Node already registered")]
    NodeAlreadyExists = 28,
    #[msg("Node not found")]
    NodeNotFound = 29,
    #[msg("Node is disabled")]
    NodeDisabled = 30,
    #[msg("Node is not disabled")]
    NodeNotDisabled = 31,
    #[msg("Node still has weight or stake")]
    NodeStillActive = 32,
    #[msg("Node has pending withdrawals")]
    PendingWithdrawals = 33,
    #[msg("Too many nodes")]
    TooManyNodes = 34,
    #[msg("No node carries weight")]
    NoActiveWeight = 35,
    #[msg("All withdraw slots are in use")]
    WithdrawSlotsFull = 36,
    #[msg("Forced withdrawal already pending")]
    ForcedWithdrawPending = 37,
    #[msg("No forced withdrawal pending")]
    NoForcedWithdraw = 38,
    #[msg("Node has nothing staked")]
    NothingStaked = 39,
    #[msg("Nothing to claim")]
    NothingToClaim = 40,

    #[msg("Network call failed")]
    NetworkCallFailed = 41,
    #[msg("Node account missing from remaining accounts")]
    MissingNodeAccount = 42,
    #[msg("Insufficient vault balance")]
    InsufficientVaultBalance = 43,
}
