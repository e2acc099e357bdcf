//! Typed, position-checked argument accumulator.
//!
//! A [`ParamStack`] is declared with a fixed sequence of [`ParamType`]
//! tags and filled left to right. A push whose value does not match the
//! next declared tag is rejected without touching the stack.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use modhost_core::error::HostError;
use modhost_core::result::HostResult;

use crate::error::ScriptError;

/// The VM's native word.
pub type ScriptCell = i32;

/// Declared type of one parameter slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    /// Integer cell passed by value.
    Cell,
    /// Integer cell passed by reference.
    CellRef,
    /// Float passed by value.
    Float,
    /// Float passed by reference.
    FloatRef,
    /// Cell array.
    Array,
    /// Read-only string.
    String,
    /// String with copy-back flags.
    StringEx,
}

impl ParamType {
    /// Returns the tag name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cell => "cell",
            Self::CellRef => "cell_ref",
            Self::Float => "float",
            Self::FloatRef => "float_ref",
            Self::Array => "array",
            Self::String => "string",
            Self::StringEx => "string_ex",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A cell array handed to script code.
///
/// With `copy_back` set, writes made by the callee are visible to the
/// caller; otherwise each call works on a private copy.
#[derive(Debug, Clone)]
pub struct ScriptArray {
    data: Rc<RefCell<Vec<ScriptCell>>>,
    copy_back: bool,
}

impl ScriptArray {
    /// Creates an array whose callee writes are discarded.
    pub fn new(data: Vec<ScriptCell>) -> Self {
        Self {
            data: Rc::new(RefCell::new(data)),
            copy_back: false,
        }
    }

    /// Creates an array whose callee writes are copied back.
    pub fn copy_back(data: Vec<ScriptCell>) -> Self {
        Self {
            data: Rc::new(RefCell::new(data)),
            copy_back: true,
        }
    }

    /// Returns a snapshot of the contents.
    pub fn to_vec(&self) -> Vec<ScriptCell> {
        self.data.borrow().clone()
    }

    /// Overwrites the element at `index`; out-of-range writes are ignored.
    pub fn set(&self, index: usize, value: ScriptCell) {
        if let Some(slot) = self.data.borrow_mut().get_mut(index) {
            *slot = value;
        }
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.data.borrow().len()
    }

    /// Returns whether the array holds no cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn for_call(&self) -> Self {
        if self.copy_back {
            self.clone()
        } else {
            Self::new(self.to_vec())
        }
    }
}

/// A writable string handed to script code.
#[derive(Debug, Clone)]
pub struct ScriptString {
    text: Rc<RefCell<String>>,
    copy_back: bool,
}

impl ScriptString {
    /// Creates a string whose callee writes are discarded.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Rc::new(RefCell::new(text.into())),
            copy_back: false,
        }
    }

    /// Creates a string whose callee writes are copied back.
    pub fn copy_back(text: impl Into<String>) -> Self {
        Self {
            text: Rc::new(RefCell::new(text.into())),
            copy_back: true,
        }
    }

    /// Returns the current text.
    pub fn get(&self) -> String {
        self.text.borrow().clone()
    }

    /// Replaces the text.
    pub fn set(&self, text: impl Into<String>) {
        *self.text.borrow_mut() = text.into();
    }

    fn for_call(&self) -> Self {
        if self.copy_back {
            self.clone()
        } else {
            Self::new(self.get())
        }
    }
}

/// A filled parameter value.
#[derive(Debug, Clone)]
pub enum ParamValue {
    /// Integer by value.
    Cell(ScriptCell),
    /// Integer by reference.
    CellRef(Rc<Cell<ScriptCell>>),
    /// Float by value.
    Float(f32),
    /// Float by reference.
    FloatRef(Rc<Cell<f32>>),
    /// Cell array.
    Array(ScriptArray),
    /// Read-only string.
    String(String),
    /// String with copy-back flags.
    StringEx(ScriptString),
}

impl ParamValue {
    /// Returns the tag this value fills.
    pub fn param_type(&self) -> ParamType {
        match self {
            Self::Cell(_) => ParamType::Cell,
            Self::CellRef(_) => ParamType::CellRef,
            Self::Float(_) => ParamType::Float,
            Self::FloatRef(_) => ParamType::FloatRef,
            Self::Array(_) => ParamType::Array,
            Self::String(_) => ParamType::String,
            Self::StringEx(_) => ParamType::StringEx,
        }
    }

    /// Reads the value as a cell, dereferencing by-reference cells.
    pub fn as_cell(&self) -> Option<ScriptCell> {
        match self {
            Self::Cell(v) => Some(*v),
            Self::CellRef(v) => Some(v.get()),
            _ => None,
        }
    }

    /// Reads the value as a float, dereferencing by-reference floats.
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            Self::FloatRef(v) => Some(v.get()),
            _ => None,
        }
    }

    /// Reads the value as text.
    pub fn as_string(&self) -> Option<String> {
        match self {
            Self::String(s) => Some(s.clone()),
            Self::StringEx(s) => Some(s.get()),
            _ => None,
        }
    }

    /// Produces the value one callee receives: non-copy-back arrays and
    /// strings are detached so the callee cannot alter the caller's data.
    pub fn for_call(&self) -> Self {
        match self {
            Self::Array(a) => Self::Array(a.for_call()),
            Self::StringEx(s) => Self::StringEx(s.for_call()),
            other => other.clone(),
        }
    }
}

/// Checks `args` against a declared signature before a native runs.
pub fn check_signature(
    native: &str,
    types: &[ParamType],
    args: &[ParamValue],
) -> Result<(), ScriptError> {
    if types.len() != args.len() {
        return Err(ScriptError::bad_arguments(
            native,
            format!("expected {} arguments, got {}", types.len(), args.len()),
        ));
    }
    for (position, (expected, value)) in types.iter().zip(args).enumerate() {
        let got = value.param_type();
        if *expected != got {
            return Err(ScriptError::bad_arguments(
                native,
                format!("argument {position} expected {expected}, got {got}"),
            ));
        }
    }
    Ok(())
}

/// Fixed-size, left-to-right filled parameter slots.
#[derive(Debug, Clone)]
pub struct ParamStack {
    /// Declared tags, one per slot.
    types: Vec<ParamType>,
    /// Values filled so far.
    values: Vec<ParamValue>,
}

impl ParamStack {
    /// Creates an empty stack for the declared tags.
    pub fn new(types: Vec<ParamType>) -> Self {
        let capacity = types.len();
        Self {
            types,
            values: Vec::with_capacity(capacity),
        }
    }

    /// Fills the next slot if `value` matches its declared tag.
    pub fn push(&mut self, value: ParamValue) -> HostResult<()> {
        let position = self.values.len();
        let Some(expected) = self.types.get(position) else {
            return Err(HostError::protocol(format!(
                "all {} parameters are already filled",
                self.types.len()
            )));
        };

        let got = value.param_type();
        if *expected != got {
            return Err(HostError::protocol(format!(
                "parameter {position} is declared {expected}, got {got}"
            )));
        }

        self.values.push(value);
        Ok(())
    }

    /// Takes the filled values for execution and resets the cursor.
    ///
    /// Fails when fewer slots are filled than declared; the cursor is reset
    /// either way.
    pub fn take(&mut self) -> HostResult<Vec<ParamValue>> {
        let values = std::mem::take(&mut self.values);
        if values.len() < self.types.len() {
            return Err(HostError::protocol(format!(
                "only {} of {} parameters filled",
                values.len(),
                self.types.len()
            )));
        }
        Ok(values)
    }

    /// Discards filled values.
    pub fn reset(&mut self) {
        self.values.clear();
    }

    /// Declared tags.
    pub fn types(&self) -> &[ParamType] {
        &self.types
    }

    /// Number of filled slots.
    pub fn filled(&self) -> usize {
        self.values.len()
    }

    /// Returns whether every slot is filled.
    pub fn is_complete(&self) -> bool {
        self.values.len() == self.types.len()
    }
}
