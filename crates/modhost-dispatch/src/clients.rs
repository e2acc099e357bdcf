//! Connected clients, exposed to scripts only through handles.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use chrono::{DateTime, Utc};

use modhost_core::types::Handle;

use crate::handles::HandleTable;

/// A connected client as the host sees it.
#[derive(Debug)]
pub struct Client {
    name: String,
    connected_at: DateTime<Utc>,
}

impl Client {
    /// Player name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Connection timestamp.
    pub fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }
}

/// Owns connected clients and their handle category.
#[derive(Debug, Default)]
pub struct ClientTable {
    handles: RefCell<HandleTable<Client>>,
    live: RefCell<HashMap<Handle, Rc<Client>>>,
}

impl ClientTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a client and returns its handle.
    pub fn connect(&self, name: &str) -> Handle {
        let client = Rc::new(Client {
            name: name.to_string(),
            connected_at: Utc::now(),
        });
        let handle = self.handles.borrow_mut().create(Rc::downgrade(&client));
        self.live.borrow_mut().insert(handle, client);
        handle
    }

    /// The client behind `handle`, if still connected.
    pub fn get(&self, handle: Handle) -> Option<Rc<Client>> {
        self.handles.borrow().get(handle)
    }

    /// Handle currently assigned to `client`.
    pub fn handle_of(&self, client: &Rc<Client>) -> Option<Handle> {
        self.handles.borrow().get_key(&Rc::downgrade(client))
    }

    /// Drops the client and releases its handle.
    ///
    /// Returns whether the handle named a connected client.
    pub fn disconnect(&self, handle: Handle) -> bool {
        let removed = self.live.borrow_mut().remove(&handle);
        self.handles.borrow_mut().free(handle);
        removed.is_some()
    }

    /// Number of connected clients.
    pub fn len(&self) -> usize {
        self.live.borrow().len()
    }

    /// Returns whether no client is connected.
    pub fn is_empty(&self) -> bool {
        self.live.borrow().is_empty()
    }

    /// Drops every client.
    pub fn clear(&self) {
        self.live.borrow_mut().clear();
        self.handles.borrow_mut().clear();
    }
}
