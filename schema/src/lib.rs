// Star Orbit Schema - Shared card definitions
// This crate contains the card template types and enums that are shared between
// the battle engine and any tooling that authors or inspects the card catalog.

// Re-export the main types
pub use card_data::*;
pub use card_types::*;

pub mod card_data;
pub mod card_types;
