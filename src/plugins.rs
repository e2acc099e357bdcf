//! Plugins compiled into the server binary.
//!
//! `welcome` is listed before `admin` but imports a native `admin`
//! exports, so it only binds during the second pass.

use modhost_dispatch::{
    ClosureModule, PLUGIN_CONTINUE, PLUGIN_HANDLED, ParamValue, PluginInfo, ScriptCell,
    ScriptEnv, ScriptError, ScriptModule, ScriptString,
};

/// Compiled-in plugins in default load order.
pub const BUILTIN: [&str; 2] = ["welcome", "admin"];

/// Builds a compiled-in plugin by name.
pub fn build(name: &str) -> Option<(PluginInfo, Box<dyn ScriptModule>)> {
    let module: Box<dyn ScriptModule> = match name {
        "admin" => Box::new(admin()),
        "welcome" => Box::new(welcome()),
        _ => return None,
    };
    let info = PluginInfo::new(name, env!("CARGO_PKG_VERSION"), "ModHost Team")
        .with_file(format!("builtin:{name}"));
    Some((info, module))
}

fn client_name(env: &ScriptEnv<'_>, client: ScriptCell) -> Result<String, ScriptError> {
    let buffer = ScriptString::copy_back("");
    env.call_native_by_name(
        "get_client_name",
        &[ParamValue::Cell(client), ParamValue::StringEx(buffer.clone())],
    )?;
    Ok(buffer.get())
}

fn cell_arg(args: &[ParamValue], index: usize) -> Result<ScriptCell, ScriptError> {
    args.get(index)
        .and_then(ParamValue::as_cell)
        .ok_or_else(|| {
            ScriptError::bad_arguments("plugin", format!("argument {index} is not a cell"))
        })
}

/// Grants admin rights by name prefix and blocks `amx_` commands from
/// everyone else.
fn admin() -> ClosureModule {
    ClosureModule::new()
        .with_import("get_client_name")
        .with_export("is_user_admin", "native_is_user_admin")
        .with_public("native_is_user_admin", |env, args| {
            // args[0] is the calling plugin.
            let client = cell_arg(args, 1)?;
            Ok(client_name(env, client)?.starts_with("admin") as ScriptCell)
        })
        .with_public("client_command", |env, args| {
            let client = cell_arg(args, 0)?;
            let command = args
                .get(1)
                .and_then(ParamValue::as_string)
                .unwrap_or_default();
            if !command.starts_with("amx_") {
                return Ok(PLUGIN_CONTINUE);
            }

            let name = client_name(env, client)?;
            if name.starts_with("admin") {
                tracing::info!(client = %name, command = %command, "Admin command");
                Ok(PLUGIN_CONTINUE)
            } else {
                tracing::warn!(client = %name, command = %command, "Admin command refused");
                Ok(PLUGIN_HANDLED)
            }
        })
}

/// Greets clients as they enter the game.
fn welcome() -> ClosureModule {
    ClosureModule::new()
        .with_import("get_client_name")
        .with_import("is_user_admin")
        .with_public("plugin_init", |env, _| {
            tracing::info!(plugin = %env.plugin(), "Welcome plugin ready");
            Ok(PLUGIN_CONTINUE)
        })
        .with_public("client_putinserver", |env, args| {
            let client = cell_arg(args, 0)?;
            let name = client_name(env, client)?;
            let admin = env.call_native_by_name("is_user_admin", &[ParamValue::Cell(client)])?;
            tracing::info!(client = %name, admin = admin != 0, "Welcome");
            Ok(PLUGIN_CONTINUE)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use modhost_core::config::HostConfig;
    use modhost_dispatch::PluginHost;

    fn host_with_builtins() -> PluginHost {
        let host = PluginHost::new(&HostConfig::default()).expect("host");
        for name in BUILTIN {
            let (info, module) = build(name).expect("builtin");
            host.load_plugin(info, module).expect("load");
        }
        host
    }

    #[test]
    fn test_builtins_bind_completely() {
        let host = host_with_builtins();
        let report = host.bind_natives().expect("bind");
        assert!(report.is_complete(), "unbound: {:?}", report.unbound);
    }

    #[test]
    fn test_admin_command_refused_for_regular_client() {
        let host = host_with_builtins();
        host.bind_natives().expect("bind");

        let player = host.client_connect("player").expect("connected");
        assert_eq!(host.client_command(player, "amx_kick bob"), PLUGIN_HANDLED);
        assert_eq!(host.client_command(player, "say hi"), PLUGIN_CONTINUE);

        let admin = host.client_connect("admin_alice").expect("connected");
        assert_eq!(host.client_command(admin, "amx_kick bob"), PLUGIN_CONTINUE);
    }

    #[test]
    fn test_unknown_plugin() {
        assert!(build("missing").is_none());
    }
}
