//! A declared forward: name, typed parameter slots, policy and target.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use modhost_core::result::HostResult;
use modhost_core::types::{ForwardId, PluginId};

use crate::module::PublicId;
use crate::params::{ParamStack, ParamType, ParamValue, ScriptArray, ScriptCell, ScriptString};

use super::policy::ExecPolicy;

/// Who a forward is delivered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardTarget {
    /// One function of one plugin, resolved at construction.
    Single {
        /// Bound plugin.
        plugin: PluginId,
        /// Cached function.
        public: PublicId,
    },
    /// Every running plugin exposing a public function with the forward's
    /// name, matched at execution time.
    Multi,
}

/// A forward and its parameter slots.
#[derive(Debug)]
pub struct Forward {
    name: String,
    policy: ExecPolicy,
    target: ForwardTarget,
    params: RefCell<ParamStack>,
}

impl Forward {
    /// Declares a multi-target forward.
    pub fn multi(name: &str, types: Vec<ParamType>, policy: ExecPolicy) -> Self {
        Self {
            name: name.to_string(),
            policy,
            target: ForwardTarget::Multi,
            params: RefCell::new(ParamStack::new(types)),
        }
    }

    /// Declares a single-target forward bound to an already resolved function.
    pub fn single(
        name: &str,
        types: Vec<ParamType>,
        policy: ExecPolicy,
        plugin: PluginId,
        public: PublicId,
    ) -> Self {
        Self {
            name: name.to_string(),
            policy,
            target: ForwardTarget::Single { plugin, public },
            params: RefCell::new(ParamStack::new(types)),
        }
    }

    /// Function name the forward calls.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Aggregation policy.
    pub fn policy(&self) -> ExecPolicy {
        self.policy
    }

    /// Delivery target.
    pub fn target(&self) -> ForwardTarget {
        self.target
    }

    /// Declared parameter types.
    pub fn param_types(&self) -> Vec<ParamType> {
        self.params.borrow().types().to_vec()
    }

    /// Number of filled slots.
    pub fn filled(&self) -> usize {
        self.params.borrow().filled()
    }

    /// Returns whether a forward with this shape could be shared with `self`.
    pub fn signature_matches(&self, types: &[ParamType], policy: ExecPolicy) -> bool {
        self.policy == policy && self.params.borrow().types() == types
    }

    /// Fills the next slot.
    pub fn push(&self, value: ParamValue) -> HostResult<()> {
        self.params.borrow_mut().push(value)
    }

    /// Pushes a cell by value.
    pub fn push_cell(&self, value: ScriptCell) -> HostResult<()> {
        self.push(ParamValue::Cell(value))
    }

    /// Pushes a cell by reference.
    pub fn push_cell_ref(&self, value: Rc<Cell<ScriptCell>>) -> HostResult<()> {
        self.push(ParamValue::CellRef(value))
    }

    /// Pushes a float by value.
    pub fn push_float(&self, value: f32) -> HostResult<()> {
        self.push(ParamValue::Float(value))
    }

    /// Pushes a float by reference.
    pub fn push_float_ref(&self, value: Rc<Cell<f32>>) -> HostResult<()> {
        self.push(ParamValue::FloatRef(value))
    }

    /// Pushes a cell array.
    pub fn push_array(&self, value: ScriptArray) -> HostResult<()> {
        self.push(ParamValue::Array(value))
    }

    /// Pushes a read-only string.
    pub fn push_string(&self, value: impl Into<String>) -> HostResult<()> {
        self.push(ParamValue::String(value.into()))
    }

    /// Pushes a string with copy-back flags.
    pub fn push_string_ex(&self, value: ScriptString) -> HostResult<()> {
        self.push(ParamValue::StringEx(value))
    }

    /// Discards filled slots.
    pub fn cancel(&self) {
        self.params.borrow_mut().reset();
    }

    /// Takes the filled arguments for one execution, resetting the cursor.
    pub(crate) fn take_args(&self) -> HostResult<Vec<ParamValue>> {
        self.params.borrow_mut().take()
    }

    /// Serializable description.
    pub fn info(&self, id: ForwardId) -> ForwardInfo {
        ForwardInfo {
            id,
            name: self.name.clone(),
            params: self.param_types(),
            policy: self.policy,
            plugin: match self.target {
                ForwardTarget::Single { plugin, .. } => Some(plugin),
                ForwardTarget::Multi => None,
            },
        }
    }
}

/// Serializable description of a forward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardInfo {
    /// Forward id.
    pub id: ForwardId,
    /// Function name.
    pub name: String,
    /// Declared parameter types.
    pub params: Vec<ParamType>,
    /// Aggregation policy.
    pub policy: ExecPolicy,
    /// Bound plugin for single-target forwards.
    pub plugin: Option<PluginId>,
}
