use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// The broad family a card belongs to. Drives the top-level resolver branch.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum CardType {
    Attack,
    Defend,
    Skill,
}

/// Effect kind of a card. Skills branch on it; every kind doubles as the
/// visual-effect trigger handed to presentation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EffectKind {
    Slash,
    Block,
    Heal,
    BuffAura,
    Explosion,
    IceNova,
    Thunder,
    Draw,
    Laser,
    Void,
    Drain,
    SpinSlash,
}

/// One of the three mutually exclusive, permanent upgrade branches.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter,
)]
pub enum UpgradePath {
    Power,
    Speed,
    Special,
}
