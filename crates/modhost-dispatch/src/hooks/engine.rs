//! The set of typed hook chains the host exposes for engine events.

use crate::params::ScriptCell;

use super::chain::HookChainRegistry;
use super::definitions::{ClientArgs, CommandArgs, HookPoint, ServerArgs};

/// One hook chain per engine extension point.
///
/// Created with the host and cleared at shutdown.
#[derive(Debug)]
pub struct EngineHooks {
    /// Returns whether the connection is accepted.
    pub client_connect: HookChainRegistry<ClientArgs, bool>,
    /// Client entered the game.
    pub client_put_in_server: HookChainRegistry<ClientArgs, ()>,
    /// Client left.
    pub client_disconnect: HookChainRegistry<ClientArgs, ()>,
    /// Returns the aggregated plugin result for the command.
    pub client_command: HookChainRegistry<CommandArgs, ScriptCell>,
    /// Map activated.
    pub server_activate: HookChainRegistry<ServerArgs, ()>,
    /// Map deactivating.
    pub server_deactivate: HookChainRegistry<(), ()>,
}

impl EngineHooks {
    /// Creates empty chains for every hook point.
    pub fn new() -> Self {
        Self {
            client_connect: HookChainRegistry::new(HookPoint::ClientConnect.as_str()),
            client_put_in_server: HookChainRegistry::new(HookPoint::ClientPutInServer.as_str()),
            client_disconnect: HookChainRegistry::new(HookPoint::ClientDisconnect.as_str()),
            client_command: HookChainRegistry::new(HookPoint::ClientCommand.as_str()),
            server_activate: HookChainRegistry::new(HookPoint::ServerActivate.as_str()),
            server_deactivate: HookChainRegistry::new(HookPoint::ServerDeactivate.as_str()),
        }
    }

    /// Number of interceptors registered at `point`.
    pub fn handler_count(&self, point: HookPoint) -> usize {
        match point {
            HookPoint::ClientConnect => self.client_connect.len(),
            HookPoint::ClientPutInServer => self.client_put_in_server.len(),
            HookPoint::ClientDisconnect => self.client_disconnect.len(),
            HookPoint::ClientCommand => self.client_command.len(),
            HookPoint::ServerActivate => self.server_activate.len(),
            HookPoint::ServerDeactivate => self.server_deactivate.len(),
        }
    }

    /// Hook points that currently have at least one interceptor.
    pub fn registered_hooks(&self) -> Vec<HookPoint> {
        HookPoint::ALL
            .into_iter()
            .filter(|point| self.handler_count(*point) > 0)
            .collect()
    }

    /// Clears every chain.
    pub fn clear(&self) {
        self.client_connect.clear();
        self.client_put_in_server.clear();
        self.client_disconnect.clear();
        self.client_command.clear();
        self.server_activate.clear();
        self.server_deactivate.clear();
    }
}

impl Default for EngineHooks {
    fn default() -> Self {
        Self::new()
    }
}
