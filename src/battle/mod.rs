pub mod ai;
pub mod autopilot;
pub mod calculators;
pub mod commands;
pub mod engine;
pub mod piles;
pub mod scheduler;
pub mod session;
pub mod state;

#[cfg(test)]
mod tests;
