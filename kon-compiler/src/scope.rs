use std::collections::HashMap;

use crate::types::{EnumType, StaticType, StructType};

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: String,
    pub mutable: bool,
    pub ty: StaticType,
}

impl Binding {
    pub fn new(name: impl Into<String>, mutable: bool, ty: StaticType) -> Self {
        Self {
            name: name.into(),
            mutable,
            ty,
        }
    }
}

#[derive(Debug, Default)]
pub struct Scope {
    variables: HashMap<String, Binding>,
    structs: HashMap<String, StructType>,
    enums: HashMap<String, EnumType>,
}

/// The lexical environment. The first scope is the program scope; every
/// function, loop or block body pushes a child that is popped on exit.
/// Lookups walk from the innermost scope outwards.
#[derive(Debug)]
pub struct ScopeChain {
    scopes: Vec<Scope>,
}

impl Default for ScopeChain {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeChain {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn push_child(&mut self) {
        self.scopes.push(Scope::default());
        tracing::trace!(depth = self.scopes.len(), "pushed scope");
    }

    /// Pops the innermost scope. The program scope is never popped.
    pub fn pop(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
            tracing::trace!(depth = self.scopes.len(), "popped scope");
        }
    }

    fn current(&mut self) -> &mut Scope {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    /// Declares a variable in the innermost scope, replacing any binding of
    /// the same name in that scope.
    pub fn declare_variable(&mut self, binding: Binding) {
        self.current()
            .variables
            .insert(binding.name.clone(), binding);
    }

    pub fn declare_struct(&mut self, definition: StructType) {
        self.current()
            .structs
            .insert(definition.name.clone(), definition);
    }

    pub fn declare_enum(&mut self, definition: EnumType) {
        self.current()
            .enums
            .insert(definition.name.clone(), definition);
    }

    pub fn lookup_variable(&self, name: &str) -> Option<&Binding> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.variables.get(name))
    }

    pub fn lookup_struct(&self, name: &str) -> Option<&StructType> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.structs.get(name))
    }

    pub fn lookup_enum(&self, name: &str) -> Option<&EnumType> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.enums.get(name))
    }
}
