//! `MazeBridge` relay library.
//!
//! Exposes the relay for use in tests and embedding. The relay accepts HTTP
//! requests from the game page and forwards each one as a single command
//! over a fresh TCP connection to the maze game server.

pub mod backend;
pub mod config;
pub mod server;
