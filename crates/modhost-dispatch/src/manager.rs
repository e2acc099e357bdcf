//! Plugin host: owns the dispatch core and drives the plugin lifecycle.
//!
//! Everything here runs on the server's main thread. Calls into plugins,
//! natives and hook callbacks may re-enter the host arbitrarily deep, so no
//! internal borrow is held across such a call.

use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, trace, warn};

use modhost_core::config::HostConfig;
use modhost_core::config::dispatch::DispatchConfig;
use modhost_core::error::HostError;
use modhost_core::result::HostResult;
use modhost_core::types::{ForwardId, Handle, PluginId};

use crate::clients::ClientTable;
use crate::error::ScriptError;
use crate::forwards::{
    Aggregator, BuiltinForwards, ExecOutcome, ExecPolicy, Forward, ForwardInfo, ForwardRegistry,
    ForwardTarget, PLUGIN_CONTINUE,
};
use crate::hooks::{ClientArgs, CommandArgs, EngineHooks, ServerArgs};
use crate::module::{PublicId, ScriptEnv, ScriptModule};
use crate::natives::builtin::register_builtin_natives;
use crate::natives::resolver::{self, BindReport, UnboundNative};
use crate::natives::{HostNative, NativeBinding, NativeContext, NativeGuard, NativeRegistry};
use crate::params::{ParamType, ParamValue, ScriptCell, check_signature};
use crate::plugin::{LoadedPlugin, PluginInfo, PluginStatus, PluginSummary};
use crate::registry::PluginRegistry;

/// Where the host is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostPhase {
    /// Plugins are loading (pass 1).
    Loading,
    /// `plugin_natives` is running (pass 2).
    Binding,
    /// Natives are bound; registration is closed.
    Running,
    /// Shut down; hook chains and plugin forwards are gone.
    ShutDown,
}

/// The dispatch core of the scripting host.
#[derive(Debug)]
pub struct PluginHost {
    config: DispatchConfig,
    debug_plugins: bool,
    phase: Cell<HostPhase>,
    plugins: PluginRegistry,
    forwards: ForwardRegistry,
    builtins: BuiltinForwards,
    natives: NativeRegistry,
    native_guard: NativeGuard,
    hooks: EngineHooks,
    clients: ClientTable,
}

impl PluginHost {
    /// Creates the host with its built-in forwards and natives.
    pub fn new(config: &HostConfig) -> HostResult<Self> {
        let forwards = ForwardRegistry::new();
        let builtins = BuiltinForwards::create(&forwards)?;
        let natives = NativeRegistry::new();
        register_builtin_natives(&natives)?;

        info!(
            forwards = forwards.len(),
            natives = natives.len(),
            "Dispatch core initialized"
        );

        Ok(Self {
            config: config.dispatch.clone(),
            debug_plugins: config.plugins.debug,
            phase: Cell::new(HostPhase::Loading),
            plugins: PluginRegistry::new(),
            forwards,
            builtins,
            natives,
            native_guard: NativeGuard::new(),
            hooks: EngineHooks::new(),
            clients: ClientTable::new(),
        })
    }

    // ── Plugin loading and native binding ──

    /// Loads one plugin module (pass 1).
    ///
    /// Natives the module exports are registered, then its import slots are
    /// tried against every native registered so far. Unbound slots are
    /// retried by [`bind_natives`](Self::bind_natives).
    pub fn load_plugin(
        &self,
        info: PluginInfo,
        module: Box<dyn ScriptModule>,
    ) -> HostResult<PluginId> {
        if self.phase.get() != HostPhase::Loading {
            return Err(HostError::plugin(format!(
                "Cannot load plugin '{}': natives are already bound",
                info.name
            )));
        }

        let id = self.plugins.next_id();
        let status = if self.debug_plugins {
            PluginStatus::Debug
        } else {
            PluginStatus::Running
        };
        let plugin = Rc::new(LoadedPlugin::new(id, info, module, status));
        self.plugins.register(Rc::clone(&plugin))?;

        for export in plugin.module().exported_natives() {
            if let Err(e) = self.register_plugin_native(id, &export.native, &export.function) {
                warn!(
                    plugin_id = %id,
                    native = %export.native,
                    error = %e,
                    "Exported native not registered"
                );
            }
        }

        let report = resolver::resolve_plugin(&plugin, &self.natives);
        info!(
            plugin_id = %id,
            name = %plugin.name(),
            imports = plugin.import_count(),
            resolved = report.resolved,
            pending = report.unresolved.len(),
            "Plugin loaded"
        );

        Ok(id)
    }

    /// Runs the bind pass (pass 2) once every plugin is loaded.
    ///
    /// Fires `plugin_natives`, retries every unbound import slot, closes
    /// native registration and finally fires `plugins_loaded`.
    pub fn bind_natives(&self) -> HostResult<BindReport> {
        if self.phase.get() != HostPhase::Loading {
            return Err(HostError::protocol("natives are already bound"));
        }

        self.phase.set(HostPhase::Binding);
        self.fire(self.builtins.plugin_natives, Vec::new());

        let mut report = BindReport::default();
        for plugin in self.plugins.all() {
            let resolved = resolver::resolve_plugin(&plugin, &self.natives);
            report.resolved += resolved.resolved;

            for native in resolved.unresolved {
                if self.config.log_unbound_natives {
                    warn!(
                        plugin_id = %plugin.id(),
                        plugin = %plugin.name(),
                        native = %native,
                        "Native left unbound"
                    );
                }
                report.unbound.push(UnboundNative {
                    plugin: plugin.id(),
                    plugin_name: plugin.name().to_string(),
                    native,
                });
            }
        }

        self.natives.seal();
        self.phase.set(HostPhase::Running);

        info!(
            plugins = self.plugins.count(),
            natives = self.natives.len(),
            resolved = report.resolved,
            unbound = report.unbound.len(),
            "Natives bound"
        );

        self.fire(self.builtins.plugins_loaded, Vec::new());
        Ok(report)
    }

    /// Registers a host native.
    pub fn register_native(&self, native: HostNative) -> HostResult<()> {
        self.natives.register_host(native)
    }

    /// Registers `name` as a native served by `provider`'s function `handler`.
    pub fn register_plugin_native(
        &self,
        provider: PluginId,
        name: &str,
        handler: &str,
    ) -> HostResult<()> {
        let plugin = self.plugin(provider)?;
        let public = plugin.find_public(handler).ok_or_else(|| {
            HostError::construction(format!(
                "Plugin '{}' has no function '{handler}' for native \"{name}\"",
                plugin.name()
            ))
        })?;

        self.natives.register_plugin(name, provider, public)?;
        debug!(
            plugin_id = %provider,
            native = %name,
            handler = %handler,
            "Plugin native registered"
        );
        Ok(())
    }

    /// Import slot of `plugin` referencing `name`.
    pub fn import_index(&self, plugin: PluginId, name: &str) -> Option<usize> {
        self.plugins.get(plugin)?.import_index(name)
    }

    /// Calls the native bound to `caller`'s import slot `import`.
    ///
    /// Unbound slots, signature mismatches and re-entered plugin natives
    /// are reported as runtime errors to the calling script.
    pub fn call_native(
        &self,
        caller: PluginId,
        import: usize,
        args: &[ParamValue],
    ) -> Result<ScriptCell, ScriptError> {
        let plugin = self
            .plugins
            .get(caller)
            .ok_or_else(|| ScriptError::Failed(format!("unknown plugin {caller}")))?;
        let (name, binding) = plugin.import(import)?;
        trace!(caller = %caller, native = %name, args = args.len(), "Calling native");

        match binding {
            NativeBinding::Host(native) => {
                if let Some(signature) = native.signature() {
                    check_signature(&name, signature, args)?;
                }
                let ctx = NativeContext::new(self, caller, &name, args);
                native.call(&ctx)
            }
            NativeBinding::Plugin { provider, public } => {
                let _active = self.native_guard.enter(&name, caller)?;

                let provider_plugin = self
                    .plugins
                    .get(provider)
                    .ok_or_else(|| ScriptError::Failed(format!("unknown plugin {provider}")))?;
                if !provider_plugin.is_running() {
                    return Err(ScriptError::PluginNotRunning(provider));
                }

                let mut full = Vec::with_capacity(args.len() + 1);
                full.push(ParamValue::Cell(caller.as_cell()));
                full.extend(args.iter().cloned());

                let env = ScriptEnv::new(self, provider);
                provider_plugin.module().call_public(&env, public, &full)
            }
        }
    }

    // ── Forwards ──

    /// Declares a multi-target forward.
    pub fn create_forward(
        &self,
        name: &str,
        types: Vec<ParamType>,
        policy: ExecPolicy,
    ) -> HostResult<ForwardId> {
        self.forwards.create_multi(name, types, policy)
    }

    /// Declares a forward bound to `function` of one plugin.
    ///
    /// Fails if the plugin does not exist or has no such function.
    pub fn create_single_forward(
        &self,
        plugin: PluginId,
        function: &str,
        types: Vec<ParamType>,
        policy: ExecPolicy,
    ) -> HostResult<ForwardId> {
        let target = self
            .plugins
            .get(plugin)
            .ok_or_else(|| HostError::construction(format!("Plugin {plugin} does not exist")))?;
        let public = target.find_public(function).ok_or_else(|| {
            HostError::construction(format!(
                "Plugin '{}' has no function '{function}'",
                target.name()
            ))
        })?;

        Ok(self
            .forwards
            .insert_single(Forward::single(function, types, policy, plugin, public)))
    }

    /// Gets a forward by id.
    pub fn forward(&self, id: ForwardId) -> HostResult<Rc<Forward>> {
        self.forwards
            .get(id)
            .ok_or_else(|| HostError::not_found(format!("Forward {id} does not exist")))
    }

    /// Fills the next parameter slot of a forward.
    pub fn push(&self, id: ForwardId, value: ParamValue) -> HostResult<()> {
        self.forward(id)?.push(value)
    }

    /// Discards the filled slots of a forward.
    pub fn cancel(&self, id: ForwardId) -> HostResult<()> {
        self.forward(id)?.cancel();
        Ok(())
    }

    /// Executes a forward and returns its aggregated result.
    pub fn exec(&self, id: ForwardId) -> HostResult<ScriptCell> {
        self.exec_detailed(id).map(|outcome| outcome.value)
    }

    /// Executes a forward.
    ///
    /// Fails without invoking anything when fewer slots are filled than
    /// declared. The fill cursor is reset either way. A single-target
    /// forward reports its function's return value unchanged; a
    /// multi-target forward aggregates per its policy and reports
    /// `PLUGIN_CONTINUE` with `invoked == 0` when no plugin matched.
    pub fn exec_detailed(&self, id: ForwardId) -> HostResult<ExecOutcome> {
        let forward = self.forward(id)?;
        let args = forward.take_args()?;

        let outcome = match forward.target() {
            ForwardTarget::Single { plugin, public } => {
                let plugin = self.plugin(plugin)?;
                if plugin.is_running() {
                    let value = self.invoke(&plugin, public, forward.name(), &args);
                    ExecOutcome {
                        value,
                        invoked: 1,
                        stopped: false,
                    }
                } else {
                    debug!(
                        forward_id = %id,
                        plugin = %plugin.name(),
                        "Single-target forward skipped: plugin not running"
                    );
                    ExecOutcome {
                        value: PLUGIN_CONTINUE,
                        invoked: 0,
                        stopped: false,
                    }
                }
            }
            ForwardTarget::Multi => {
                let mut aggregator = Aggregator::new(forward.policy());
                for plugin in self.plugins.all() {
                    if !plugin.is_running() {
                        continue;
                    }
                    let Some(public) = plugin.find_public(forward.name()) else {
                        continue;
                    };

                    let result = self.invoke(&plugin, public, forward.name(), &args);
                    if aggregator.feed(result).is_break() {
                        debug!(
                            forward_id = %id,
                            name = %forward.name(),
                            stopped_by = %plugin.name(),
                            "Broadcast stopped"
                        );
                        break;
                    }
                }
                aggregator.finish()
            }
        };

        trace!(
            forward_id = %id,
            name = %forward.name(),
            value = outcome.value,
            invoked = outcome.invoked,
            "Forward executed"
        );
        Ok(outcome)
    }

    /// Finds a multi-target forward by name.
    pub fn find_forward(&self, name: &str) -> Option<ForwardId> {
        self.forwards.find(name)
    }

    /// Returns whether `id` names a live forward.
    pub fn forward_exists(&self, id: ForwardId) -> bool {
        self.forwards.get(id).is_some()
    }

    /// Removes a forward. Built-in forwards live as long as the host.
    pub fn remove_forward(&self, id: ForwardId) -> HostResult<()> {
        if self.builtins.contains(id) {
            return Err(HostError::protocol(format!(
                "Forward {id} is built in and cannot be removed"
            )));
        }
        self.forwards.remove(id)
    }

    /// Descriptions of every live forward.
    pub fn list_forwards(&self) -> Vec<ForwardInfo> {
        self.forwards.list()
    }

    /// Ids of the built-in forwards.
    pub fn builtins(&self) -> &BuiltinForwards {
        &self.builtins
    }

    /// Runs one plugin function. Runtime errors are logged and degrade to
    /// `PLUGIN_CONTINUE`.
    fn invoke(
        &self,
        plugin: &LoadedPlugin,
        public: PublicId,
        function: &str,
        args: &[ParamValue],
    ) -> ScriptCell {
        let call_args: Vec<ParamValue> = args.iter().map(ParamValue::for_call).collect();
        let env = ScriptEnv::new(self, plugin.id());

        match plugin.module().call_public(&env, public, &call_args) {
            Ok(value) => value,
            Err(e) => {
                if plugin.status() == PluginStatus::Debug {
                    error!(
                        plugin_id = %plugin.id(),
                        plugin = %plugin.name(),
                        function = %function,
                        error = %e,
                        args = ?call_args,
                        "Run time error"
                    );
                } else {
                    warn!(
                        plugin_id = %plugin.id(),
                        plugin = %plugin.name(),
                        function = %function,
                        error = %e,
                        "Run time error"
                    );
                }
                PLUGIN_CONTINUE
            }
        }
    }

    /// Fills and executes a forward on behalf of host glue.
    fn fire(&self, id: ForwardId, args: Vec<ParamValue>) -> ScriptCell {
        let result = self.forward(id).and_then(|forward| {
            for value in args {
                if let Err(e) = forward.push(value) {
                    forward.cancel();
                    return Err(e);
                }
            }
            self.exec(id)
        });

        result.unwrap_or_else(|e| {
            error!(forward_id = %id, error = %e, "Failed to fire forward");
            PLUGIN_CONTINUE
        })
    }

    // ── Engine glue ──

    /// A client connects. Returns its handle, or `None` when an interceptor
    /// refused the connection.
    pub fn client_connect(&self, name: &str) -> Option<Handle> {
        let client = self.clients.connect(name);
        let original = |args: ClientArgs| {
            self.fire(
                self.builtins.client_connect,
                vec![ParamValue::Cell(args.client.as_cell())],
            );
            true
        };

        let accepted = self
            .hooks
            .client_connect
            .call_chain(&original, None, ClientArgs { client });

        if accepted {
            info!(client = %client, name = %name, "Client connected");
            Some(client)
        } else {
            self.clients.disconnect(client);
            info!(name = %name, "Client connection refused");
            None
        }
    }

    /// A connected client entered the game.
    pub fn client_put_in_server(&self, client: Handle) {
        let original = |args: ClientArgs| {
            self.fire(
                self.builtins.client_putinserver,
                vec![ParamValue::Cell(args.client.as_cell())],
            );
        };
        self.hooks
            .client_put_in_server
            .call_chain(&original, None, ClientArgs { client });
    }

    /// A client issued a command. Results at or above `PLUGIN_HANDLED`
    /// mean the command was handled and the engine should not process it.
    pub fn client_command(&self, client: Handle, command: &str) -> ScriptCell {
        let original = |args: CommandArgs| {
            self.fire(
                self.builtins.client_command,
                vec![
                    ParamValue::Cell(args.client.as_cell()),
                    ParamValue::String(args.command),
                ],
            )
        };
        self.hooks.client_command.call_chain(
            &original,
            None,
            CommandArgs {
                client,
                command: command.to_string(),
            },
        )
    }

    /// A client left. Its handle is released afterwards.
    pub fn client_disconnect(&self, client: Handle) {
        let original = |args: ClientArgs| {
            self.fire(
                self.builtins.client_disconnect,
                vec![ParamValue::Cell(args.client.as_cell())],
            );
        };
        self.hooks
            .client_disconnect
            .call_chain(&original, None, ClientArgs { client });

        if self.clients.disconnect(client) {
            info!(client = %client, "Client disconnected");
        }
    }

    /// The server activated a map: fires `plugin_precache`, `plugin_init`
    /// and `plugin_cfg`.
    pub fn server_activate(&self, max_clients: u32) -> HostResult<()> {
        if self.phase.get() != HostPhase::Running {
            return Err(HostError::protocol(
                "server activated before natives were bound",
            ));
        }

        let original = |_: ServerArgs| {
            self.fire(self.builtins.plugin_precache, Vec::new());
            self.fire(self.builtins.plugin_init, Vec::new());
            self.fire(self.builtins.plugin_cfg, Vec::new());
        };
        self.hooks
            .server_activate
            .call_chain(&original, None, ServerArgs { max_clients });

        info!(max_clients, plugins = self.plugins.count(), "Server activated");
        Ok(())
    }

    /// The server is deactivating the map: fires `plugin_end`.
    pub fn server_deactivate(&self) {
        let original = |_: ()| {
            self.fire(self.builtins.plugin_end, Vec::new());
        };
        self.hooks.server_deactivate.call_chain(&original, None, ());
        info!("Server deactivated");
    }

    /// Clears hook chains, clients and plugin-created forwards and stops
    /// every plugin. Built-in forwards stay.
    pub fn shutdown(&self) {
        if self.phase.get() == HostPhase::ShutDown {
            return;
        }

        self.hooks.clear();
        self.clients.clear();
        for forward in self.forwards.list() {
            if !self.builtins.contains(forward.id) {
                if let Err(e) = self.forwards.remove(forward.id) {
                    warn!(forward_id = %forward.id, error = %e, "Failed to remove forward");
                }
            }
        }
        self.plugins.stop_all();
        self.phase.set(HostPhase::ShutDown);

        info!("Plugin host shut down");
    }

    // ── Accessors ──

    /// Current lifecycle phase.
    pub fn phase(&self) -> HostPhase {
        self.phase.get()
    }

    /// Dispatch settings.
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// The plugin registry.
    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    /// Gets a plugin by id.
    pub fn plugin(&self, id: PluginId) -> HostResult<Rc<LoadedPlugin>> {
        self.plugins
            .get(id)
            .ok_or_else(|| HostError::not_found(format!("Plugin {id} not found")))
    }

    /// Summaries of every plugin in load order.
    pub fn list_plugins(&self) -> Vec<PluginSummary> {
        self.plugins.list()
    }

    /// Pauses a plugin: forwards skip it and its natives refuse calls.
    pub fn pause_plugin(&self, id: PluginId) -> HostResult<()> {
        self.plugins.set_status(id, PluginStatus::Paused)
    }

    /// Resumes a paused plugin.
    pub fn unpause_plugin(&self, id: PluginId) -> HostResult<()> {
        let status = if self.debug_plugins {
            PluginStatus::Debug
        } else {
            PluginStatus::Running
        };
        self.plugins.set_status(id, status)
    }

    /// The native registry.
    pub fn natives(&self) -> &NativeRegistry {
        &self.natives
    }

    /// Number of plugin natives currently executing.
    pub fn native_depth(&self) -> usize {
        self.native_guard.depth()
    }

    /// Engine hook chains.
    pub fn hooks(&self) -> &EngineHooks {
        &self.hooks
    }

    /// Connected clients.
    pub fn clients(&self) -> &ClientTable {
        &self.clients
    }
}
