//! ModHost Server: scripting plugin host.
//!
//! Main entry point that boots the dispatch core, runs the two-pass plugin
//! load and drives the server lifecycle forwards.

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use modhost_core::config::HostConfig;
use modhost_core::error::HostError;
use modhost_dispatch::PluginHost;

mod plugins;

/// Name of the plugin list inside the plugin directory.
const PLUGIN_LIST_FILE: &str = "plugins.ini";

/// Command-line options.
#[derive(Debug, Parser)]
#[command(name = "modhost-server", version, about = "Scripting plugin host")]
struct Cli {
    /// Directory holding `default.toml` and `<env>.toml`
    #[arg(long, default_value = "config")]
    config: PathBuf,

    /// Configuration environment overlay
    #[arg(long, default_value = "development")]
    env: String,

    /// Comma-separated plugins to load, overriding the plugin list file
    #[arg(long, value_delimiter = ',')]
    plugins: Option<Vec<String>>,

    /// Player slots announced on server activation
    #[arg(long, default_value_t = 32)]
    max_clients: u32,

    /// Run one client with this name through connect, a command and disconnect
    #[arg(long)]
    demo_client: Option<String>,

    /// Print loaded plugins, forwards and hooked points as JSON before shutting down
    #[arg(long)]
    dump_state: bool,
}

fn main() {
    let cli = Cli::parse();

    let config = match HostConfig::load(&cli.config, &cli.env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(&cli, &config) {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &HostConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
fn run(cli: &Cli, config: &HostConfig) -> Result<(), HostError> {
    tracing::info!("Starting ModHost v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Dispatch core ────────────────────────────────────
    let host = PluginHost::new(config)?;
    install_command_log(&host);

    // ── Step 2: Load plugins (pass 1) ────────────────────────────
    let selected = if cli.plugins.is_none() && !config.plugins.auto_load {
        tracing::info!("Plugin auto-load disabled");
        Vec::new()
    } else {
        plugin_list(cli, config)?
    };

    for name in &selected {
        let Some((info, module)) = plugins::build(name) else {
            tracing::error!(plugin = %name, "Unknown plugin");
            continue;
        };
        if let Err(e) = host.load_plugin(info, module) {
            tracing::error!(plugin = %name, error = %e, "Failed to load plugin");
        }
    }

    // ── Step 3: Bind natives (pass 2) ────────────────────────────
    let report = host.bind_natives()?;
    if !report.is_complete() {
        tracing::warn!(
            unbound = report.unbound.len(),
            "Some natives are unbound; calls to them will fail"
        );
    }

    // ── Step 4: Server lifecycle ─────────────────────────────────
    host.server_activate(cli.max_clients)?;

    if let Some(name) = &cli.demo_client {
        run_demo_client(&host, name);
    }

    host.server_deactivate();

    if cli.dump_state {
        let state = serde_json::json!({
            "plugins": host.list_plugins(),
            "forwards": host.list_forwards(),
            "hooks": host.hooks().registered_hooks(),
            "bind": report,
        });
        println!("{}", serde_json::to_string_pretty(&state)?);
    }

    // ── Step 5: Shutdown ─────────────────────────────────────────
    host.shutdown();
    tracing::info!("ModHost server shut down gracefully");
    Ok(())
}

/// Logs every client command before plugins see it.
fn install_command_log(host: &PluginHost) {
    host.hooks().client_command.register(
        |cursor, args| {
            tracing::debug!(client = %args.client, command = %args.command, "Client command");
            cursor.call_next(args)
        },
        host.config().default_hook_priority,
    );
}

/// Names of the plugins to load, in load order.
fn plugin_list(cli: &Cli, config: &HostConfig) -> Result<Vec<String>, HostError> {
    if let Some(names) = &cli.plugins {
        return Ok(names.clone());
    }

    let path = Path::new(&config.plugins.directory).join(PLUGIN_LIST_FILE);
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No plugin list, loading every built-in plugin");
        return Ok(plugins::BUILTIN.iter().map(|s| s.to_string()).collect());
    }

    let content = std::fs::read_to_string(&path)?;
    Ok(parse_plugin_list(&content))
}

/// One plugin per line; `;` starts a comment.
fn parse_plugin_list(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| line.split(';').next())
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn run_demo_client(host: &PluginHost, name: &str) {
    let Some(client) = host.client_connect(name) else {
        return;
    };
    host.client_put_in_server(client);

    let result = host.client_command(client, "amx_who");
    tracing::info!(client = %client, result, "Demo command finished");

    host.client_disconnect(client);
}
