//! JSON bodies returned by the relay's HTTP endpoints.
//!
//! The game server's reply is carried as an opaque string. It is never
//! parsed, so a game server that answers with JSON text still shows up as a
//! JSON *string* in these bodies. A failed relay call is carried as `null`.

use serde::{Deserialize, Serialize};

/// Body of `POST /join`: `{"message": <reply or null>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinResponse {
    /// The game server's reply, or `None` if the relay call failed.
    pub message: Option<String>,
}

/// Body of `GET /gameState`: `{"gameState": <reply or null>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStateResponse {
    /// The game server's reply, or `None` if the relay call failed.
    #[serde(rename = "gameState")]
    pub game_state: Option<String>,
}

impl From<Option<String>> for JoinResponse {
    fn from(message: Option<String>) -> Self {
        Self { message }
    }
}

impl From<Option<String>> for GameStateResponse {
    fn from(game_state: Option<String>) -> Self {
        Self { game_state }
    }
}
