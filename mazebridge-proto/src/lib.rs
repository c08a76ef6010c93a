//! Shared types for the `MazeBridge` relay: game server commands and the
//! JSON bodies returned to the browser.

pub mod command;
pub mod response;

pub use command::Command;
pub use response::{GameStateResponse, JoinResponse};
