//! Engine hook points and their argument types.

use std::fmt;

use serde::{Deserialize, Serialize};

use modhost_core::types::Handle;

/// Enumeration of every engine extension point that owns a hook chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookPoint {
    /// A client is connecting. Interceptors may refuse the connection.
    ClientConnect,
    /// A connected client entered the game.
    ClientPutInServer,
    /// A client left.
    ClientDisconnect,
    /// A client issued a console command. Results at or above
    /// `PLUGIN_HANDLED` block the command.
    ClientCommand,
    /// The server activated a map.
    ServerActivate,
    /// The server is deactivating the current map.
    ServerDeactivate,
}

impl HookPoint {
    /// Every hook point, in declaration order.
    pub const ALL: [HookPoint; 6] = [
        Self::ClientConnect,
        Self::ClientPutInServer,
        Self::ClientDisconnect,
        Self::ClientCommand,
        Self::ServerActivate,
        Self::ServerDeactivate,
    ];

    /// Returns the string name of this hook point.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClientConnect => "client_connect",
            Self::ClientPutInServer => "client_put_in_server",
            Self::ClientDisconnect => "client_disconnect",
            Self::ClientCommand => "client_command",
            Self::ServerActivate => "server_activate",
            Self::ServerDeactivate => "server_deactivate",
        }
    }
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Arguments of the per-client hook chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientArgs {
    /// Handle of the client object.
    pub client: Handle,
}

/// Arguments of the `client_command` hook chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandArgs {
    /// Handle of the issuing client.
    pub client: Handle,
    /// Full command line.
    pub command: String,
}

/// Arguments of the `server_activate` hook chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerArgs {
    /// Player slots available on the activated map.
    pub max_clients: u32,
}
