use crate::card::InstanceId;
use schema::{CardId, UpgradePath};
use thiserror::Error;

/// Main error type for the Star Orbit battle engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Action error: {0}")]
    Action(#[from] ActionError),

    #[error("Upgrade error: {0}")]
    Upgrade(#[from] UpgradeError),
}

/// Rejected player actions. None of these mutate state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("No battle is in progress")]
    NoBattle,

    #[error("The battle is already over")]
    BattleOver,

    #[error("It is not the player's turn")]
    NotPlayerTurn,

    #[error("Card {0} is not in hand")]
    CardNotInHand(InstanceId),

    #[error("Card {0} is already being played")]
    CardInFlight(InstanceId),

    #[error("Not enough energy: need {required}, have {available}")]
    InsufficientEnergy { required: u32, available: u32 },

    #[error("Card template {0} is not in the catalog")]
    UnknownTemplate(CardId),

    #[error("No reward is waiting to be claimed")]
    NoReward,
}

/// Rejected upgrade requests on the collection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpgradeError {
    #[error("Card {0} is not in the collection")]
    UnknownCard(InstanceId),

    #[error("Card {0} has already been upgraded")]
    AlreadyUpgraded(InstanceId),

    #[error("Card template {template} has no {path} upgrade")]
    PathUnavailable { template: CardId, path: UpgradePath },

    #[error("Not enough upgrade points")]
    InsufficientPoints,
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed catalog data: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("Card template not found: {0}")]
    TemplateNotFound(CardId),

    #[error("Duplicate card template id: {0}")]
    DuplicateTemplate(CardId),

    #[error("Catalog contains no templates")]
    Empty,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Type alias for Results using EngineError
pub type EngineResult<T> = Result<T, EngineError>;

/// Type alias for Results using CatalogError
pub type CatalogResult<T> = Result<T, CatalogError>;
