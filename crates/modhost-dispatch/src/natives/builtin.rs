//! Natives the host provides to every plugin.

use modhost_core::result::HostResult;

use crate::error::ScriptError;
use crate::params::ParamType;

use super::registry::{HostNative, NativeRegistry};

/// `register_native(name[], handler[])`: binds `name` to the caller's
/// public function `handler`. Only accepted until the bind pass completes.
pub const REGISTER_NATIVE: &str = "register_native";
/// `is_client_valid(client)`: 1 if the handle names a connected client.
pub const IS_CLIENT_VALID: &str = "is_client_valid";
/// `get_client_name(client, name[])`: writes the client's name, returns
/// its length. Raises an invalid-handle error for stale handles.
pub const GET_CLIENT_NAME: &str = "get_client_name";
/// `find_forward(name[])`: id of a multi-target forward, or -1.
pub const FIND_FORWARD: &str = "find_forward";
/// `forward_exists(name[])`: 1 if a multi-target forward is declared.
pub const FORWARD_EXISTS: &str = "forward_exists";

/// Registers the built-in host natives.
pub fn register_builtin_natives(natives: &NativeRegistry) -> HostResult<()> {
    natives.register_host(
        HostNative::new(REGISTER_NATIVE, |ctx| {
            let name = ctx.string(0)?;
            let handler = ctx.string(1)?;
            ctx.host()
                .register_plugin_native(ctx.caller(), &name, &handler)
                .map_err(|e| {
                    if ctx.host().natives().is_sealed() {
                        ScriptError::RegistrationClosed
                    } else {
                        ScriptError::Host(e)
                    }
                })?;
            Ok(1)
        })
        .with_signature(vec![ParamType::String, ParamType::String]),
    )?;

    natives.register_host(
        HostNative::new(IS_CLIENT_VALID, |ctx| {
            let valid = ctx
                .handle(0)
                .ok()
                .and_then(|handle| ctx.host().clients().get(handle))
                .is_some();
            Ok(valid as i32)
        })
        .with_signature(vec![ParamType::Cell]),
    )?;

    natives.register_host(
        HostNative::new(GET_CLIENT_NAME, |ctx| {
            let handle = ctx.handle(0)?;
            let client = ctx
                .host()
                .clients()
                .get(handle)
                .ok_or(ScriptError::InvalidHandle(handle.as_cell()))?;
            ctx.set_string(1, client.name())?;
            Ok(client.name().len() as i32)
        })
        .with_signature(vec![ParamType::Cell, ParamType::StringEx]),
    )?;

    natives.register_host(
        HostNative::new(FIND_FORWARD, |ctx| {
            let name = ctx.string(0)?;
            Ok(ctx
                .host()
                .find_forward(&name)
                .map(|id| id.as_cell())
                .unwrap_or(-1))
        })
        .with_signature(vec![ParamType::String]),
    )?;

    natives.register_host(
        HostNative::new(FORWARD_EXISTS, |ctx| {
            let name = ctx.string(0)?;
            Ok(ctx.host().find_forward(&name).is_some() as i32)
        })
        .with_signature(vec![ParamType::String]),
    )?;

    Ok(())
}
