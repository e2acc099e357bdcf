//! Process-wide forward registry.
//!
//! Forward ids are allocated through a [`HandleTable`], so a removed id is
//! reused by the next forward before the table grows. The registry holds
//! the only strong reference to each forward; callers receive clones of
//! the `Rc` for the duration of one operation.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use modhost_core::error::HostError;
use modhost_core::result::HostResult;
use modhost_core::types::{ForwardId, Handle};

use crate::handles::HandleTable;
use crate::params::ParamType;

use super::forward::{Forward, ForwardInfo, ForwardTarget};
use super::policy::ExecPolicy;

/// Registry of every live forward.
#[derive(Debug, Default)]
pub struct ForwardRegistry {
    ids: RefCell<HandleTable<Forward>>,
    owned: RefCell<HashMap<ForwardId, Rc<Forward>>>,
    /// Multi-target forward name → id.
    by_name: RefCell<HashMap<String, ForwardId>>,
}

impl ForwardRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a multi-target forward.
    ///
    /// Re-declaring an existing name with the same signature and policy
    /// returns the existing id; any other re-declaration is a conflict.
    pub fn create_multi(
        &self,
        name: &str,
        types: Vec<ParamType>,
        policy: ExecPolicy,
    ) -> HostResult<ForwardId> {
        if name.is_empty() {
            return Err(HostError::construction("forward name must not be empty"));
        }

        if let Some(id) = self.find(name) {
            let existing = self.get(id).ok_or_else(|| {
                HostError::internal(format!("forward index for '{name}' is stale"))
            })?;
            if existing.signature_matches(&types, policy) {
                return Ok(id);
            }
            return Err(HostError::conflict(format!(
                "forward '{name}' already exists with a different signature"
            )));
        }

        let id = self.insert(Forward::multi(name, types, policy));
        self.by_name.borrow_mut().insert(name.to_string(), id);
        Ok(id)
    }

    /// Stores a single-target forward whose target is already resolved.
    pub fn insert_single(&self, forward: Forward) -> ForwardId {
        self.insert(forward)
    }

    fn insert(&self, forward: Forward) -> ForwardId {
        let forward = Rc::new(forward);
        let handle = self.ids.borrow_mut().create(Rc::downgrade(&forward));
        let id = ForwardId::new(handle.get());

        debug!(
            forward_id = %id,
            name = %forward.name(),
            policy = %forward.policy(),
            single = matches!(forward.target(), ForwardTarget::Single { .. }),
            "Forward created"
        );

        self.owned.borrow_mut().insert(id, forward);
        id
    }

    /// Gets a forward by id.
    pub fn get(&self, id: ForwardId) -> Option<Rc<Forward>> {
        self.ids.borrow().get(Handle::new(id.get()))
    }

    /// Finds a multi-target forward by name.
    pub fn find(&self, name: &str) -> Option<ForwardId> {
        self.by_name.borrow().get(name).copied()
    }

    /// Removes a forward, releasing its id for reuse.
    pub fn remove(&self, id: ForwardId) -> HostResult<()> {
        let forward = self
            .owned
            .borrow_mut()
            .remove(&id)
            .ok_or_else(|| HostError::not_found(format!("forward {id} does not exist")))?;

        let mut by_name = self.by_name.borrow_mut();
        if by_name.get(forward.name()) == Some(&id) {
            by_name.remove(forward.name());
        }
        self.ids.borrow_mut().free(Handle::new(id.get()));

        debug!(forward_id = %id, name = %forward.name(), "Forward removed");
        Ok(())
    }

    /// Descriptions of every live forward, ordered by id.
    pub fn list(&self) -> Vec<ForwardInfo> {
        let mut infos: Vec<ForwardInfo> = self
            .owned
            .borrow()
            .iter()
            .map(|(id, forward)| forward.info(*id))
            .collect();
        infos.sort_by_key(|info| info.id);
        infos
    }

    /// Number of live forwards.
    pub fn len(&self) -> usize {
        self.owned.borrow().len()
    }

    /// Returns whether no forward exists.
    pub fn is_empty(&self) -> bool {
        self.owned.borrow().is_empty()
    }
}
