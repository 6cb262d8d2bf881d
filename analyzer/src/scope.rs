//! Variable scope management.

use std::collections::HashMap;

/// A local variable binding in scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarBinding {
    /// The name of the variable.
    pub name: String,
    /// Whether this variable can be assigned to after definition.
    pub mutable: bool,
}

impl VarBinding {
    /// A `let` binding.
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mutable: true,
        }
    }

    /// A loop variable, fixed for each iteration.
    pub fn loop_var(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mutable: false,
        }
    }
}

/// A scope for variable bindings.
/// Supports nested scopes for blocks and loop bodies.
#[derive(Debug)]
pub struct Scope {
    /// Stack of scope frames. Each frame is a mapping from name to binding.
    frames: Vec<HashMap<String, VarBinding>>,
}

impl Scope {
    /// Create a new scope with a single top-level frame.
    pub fn new() -> Self {
        Self {
            frames: vec![HashMap::new()],
        }
    }

    /// Push a new scope frame.
    pub fn push(&mut self) {
        self.frames.push(HashMap::new());
    }

    /// Pop the current scope frame. The top-level frame is never popped.
    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Define a variable in the current scope.
    /// Returns `false` if the variable is already defined in the current frame.
    pub fn define(&mut self, binding: VarBinding) -> bool {
        let Some(frame) = self.frames.last_mut() else {
            return false;
        };
        if frame.contains_key(&binding.name) {
            return false;
        }
        frame.insert(binding.name.clone(), binding);
        true
    }

    /// Look up a variable by name, searching from innermost to outermost scope.
    pub fn lookup(&self, name: &str) -> Option<&VarBinding> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Get the current depth (number of nested scopes).
    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}
