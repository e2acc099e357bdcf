//! Shared test helpers for dispatch integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use modhost_core::config::HostConfig;
use modhost_core::types::PluginId;
use modhost_dispatch::{ClosureModule, PluginHost, PluginInfo, ScriptCell};

/// Shared call log written by test plugins.
#[derive(Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<String>>>);

impl CallLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn push(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    /// Snapshot of every entry so far.
    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

/// Host under test.
pub struct TestHost {
    /// The dispatch core
    pub host: PluginHost,
}

impl TestHost {
    /// Create a host with default configuration.
    pub fn new() -> Self {
        Self {
            host: PluginHost::new(&HostConfig::default())
                .expect("Failed to create host"),
        }
    }

    /// Load a closure-backed plugin.
    pub fn load(&self, name: &str, module: ClosureModule) -> PluginId {
        self.host
            .load_plugin(PluginInfo::new(name, "1.0", "tests"), Box::new(module))
            .expect("Failed to load plugin")
    }

    /// Run the bind pass.
    pub fn bind(&self) {
        self.host.bind_natives().expect("Failed to bind natives");
    }
}

/// A module whose `function` records `tag` in `log` and returns `value`.
pub fn recording(log: &CallLog, function: &str, tag: &str, value: ScriptCell) -> ClosureModule {
    let log = log.clone();
    let tag = tag.to_string();
    ClosureModule::new().with_public(function, move |_, _| {
        log.push(tag.clone());
        Ok(value)
    })
}
