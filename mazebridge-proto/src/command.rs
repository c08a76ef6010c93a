//! Commands understood by the maze game server.
//!
//! A [`Command`] is written to the game server as raw ASCII with no length
//! prefix and no terminator. The game server recognizes the command by its
//! exact text, so [`Command::as_str`] is the wire format.

/// A command forwarded to the game server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Join the game as a new player.
    Join,
    /// Fetch the current game state.
    GetGameState,
}

impl Command {
    /// The literal token sent to the game server.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Join => "JOIN",
            Self::GetGameState => "GET_GAME_STATE",
        }
    }

    /// The bytes written to the game server socket.
    #[must_use]
    pub const fn as_bytes(self) -> &'static [u8] {
        self.as_str().as_bytes()
    }
}
