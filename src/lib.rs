//! Salvage Hook library
//!
//! A scrap-fishing minigame for a top-down space game: the player parks at a
//! scrap node, a barrier opens around the ship and rotating rings of scrap and
//! obstacles spawn, then the player has three hook charges to reel pieces in
//! against a per-charge countdown.

pub mod barrier;
pub mod collectible;
pub mod config;
pub mod constants;
pub mod error;
pub mod feedback;
pub mod hook;
pub mod minigame;
pub mod rendering;
pub mod scrap_node;
pub mod session;
pub mod ship;
