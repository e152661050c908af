use indexmap::IndexMap;
use num_bigint::BigUint;
use std::mem;
use tracing::trace;
use vylir_core::crypto::event_id;
use vylir_core::types::ByteArrayKind;
use vylir_core::{CompileError, IrNode, Position, Result, StorageClass, Type};

/// First memory offset handed out to variables; lower addresses are scratch space.
pub const RESERVED_MEMORY: usize = 320;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Constancy {
    #[default]
    Mutable,
    View,
    Pure,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionInfo {
    pub name: String,
    pub args: Vec<(String, Type)>,
    pub return_type: Option<Type>,
    pub constancy: Constancy,
    /// Private functions receive their arguments in memory, public ones in calldata.
    pub private: bool,
}

impl FunctionInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            return_type: None,
            constancy: Constancy::Mutable,
            private: false,
        }
    }

    pub fn with_arg(mut self, name: impl Into<String>, typ: Type) -> Self {
        self.args.push((name.into(), typ));
        self
    }

    pub fn returns(mut self, typ: Type) -> Self {
        self.return_type = Some(typ);
        self
    }

    pub fn with_constancy(mut self, constancy: Constancy) -> Self {
        self.constancy = constancy;
        self
    }

    pub fn private(mut self) -> Self {
        self.private = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableRecord {
    pub name: String,
    /// Memory or calldata offset for locals, slot number for storage.
    pub pos: usize,
    pub typ: Type,
    pub location: StorageClass,
    pub mutable: bool,
    pub size: usize,
    pub declared_at: Option<Position>,
}

impl VariableRecord {
    /// The located IR node addressing this variable.
    pub fn location_node(&self) -> IrNode {
        let node = IrNode::int(self.pos)
            .with_type(self.typ.clone())
            .located(self.location)
            .annotated(self.name.clone());
        if self.mutable {
            node
        } else {
            node.immutable()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventSignature {
    pub name: String,
    pub signature: String,
    pub event_id: BigUint,
    pub args: Vec<Type>,
    pub indexed: Vec<bool>,
}

impl EventSignature {
    pub fn new(name: impl Into<String>, args: Vec<(Type, bool)>) -> Self {
        let name = name.into();
        let signature = format!(
            "{}({})",
            name,
            args.iter()
                .map(|(t, _)| abi_name(t))
                .collect::<Vec<_>>()
                .join(",")
        );
        let (args, indexed) = args.into_iter().unzip();
        Self {
            event_id: event_id(&signature),
            name,
            signature,
            args,
            indexed,
        }
    }
}

fn abi_name(typ: &Type) -> String {
    match typ {
        Type::Base(b) => b.name.clone(),
        Type::Contract { .. } => "address".to_string(),
        Type::ByteArray {
            kind: ByteArrayKind::Bytes,
            ..
        } => "bytes".to_string(),
        Type::ByteArray {
            kind: ByteArrayKind::String,
            ..
        } => "string".to_string(),
        Type::List { subtype, count } => format!("{}[{}]", abi_name(subtype), count),
        Type::Struct { members, .. } => {
            let inner: Vec<_> = members.values().map(abi_name).collect();
            format!("({})", inner.join(","))
        }
        Type::Tuple { members } => {
            let inner: Vec<_> = members.iter().map(abi_name).collect();
            format!("({})", inner.join(","))
        }
    }
}

/// Per-function lowering state. One instance per function body; never shared.
#[derive(Debug, Clone)]
pub struct CompilationContext {
    function: FunctionInfo,
    scopes: Vec<IndexMap<String, VariableRecord>>,
    globals: IndexMap<String, VariableRecord>,
    events: IndexMap<String, EventSignature>,
    structs: IndexMap<String, Type>,
    memory_cursor: usize,
    internal_counter: usize,
    forvars: Vec<String>,
    locked_lists: Vec<String>,
    in_assertion: bool,
    in_range_expr: bool,
    in_assignment: bool,
}

impl CompilationContext {
    pub fn new(function: FunctionInfo) -> Self {
        let mut ctx = Self {
            function,
            scopes: vec![IndexMap::new()],
            globals: IndexMap::new(),
            events: IndexMap::new(),
            structs: IndexMap::new(),
            memory_cursor: RESERVED_MEMORY,
            internal_counter: 0,
            forvars: Vec::new(),
            locked_lists: Vec::new(),
            in_assertion: false,
            in_range_expr: false,
            in_assignment: false,
        };

        let mut calldata_offset = 4;
        for (name, typ) in ctx.function.args.clone() {
            let size = typ.size_in_words();
            let (pos, location) = if ctx.function.private {
                (ctx.allocate(size * 32), StorageClass::Memory)
            } else {
                let offset = calldata_offset;
                calldata_offset += size * 32;
                (offset, StorageClass::Calldata)
            };
            ctx.scopes[0].insert(
                name.clone(),
                VariableRecord {
                    name,
                    pos,
                    typ,
                    location,
                    mutable: false,
                    size,
                    declared_at: None,
                },
            );
        }
        ctx
    }

    pub fn with_global(mut self, name: impl Into<String>, typ: Type) -> Self {
        let name = name.into();
        let slot = self.globals.len();
        let size = typ.size_in_words();
        self.globals.insert(
            name.clone(),
            VariableRecord {
                name,
                pos: slot,
                typ,
                location: StorageClass::Storage,
                mutable: true,
                size,
                declared_at: None,
            },
        );
        self
    }

    pub fn with_event(mut self, event: EventSignature) -> Self {
        self.events.insert(event.name.clone(), event);
        self
    }

    pub fn with_struct(mut self, name: impl Into<String>, typ: Type) -> Self {
        self.structs.insert(name.into(), typ);
        self
    }

    pub fn function_name(&self) -> &str {
        &self.function.name
    }

    pub fn return_type(&self) -> Option<&Type> {
        self.function.return_type.as_ref()
    }

    pub fn constancy(&self) -> Constancy {
        self.function.constancy
    }

    pub fn is_private(&self) -> bool {
        self.function.private
    }

    pub fn lookup(&self, name: &str) -> Option<&VariableRecord> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    pub fn global(&self, name: &str) -> Option<&VariableRecord> {
        self.globals.get(name)
    }

    pub fn event(&self, name: &str) -> Option<&EventSignature> {
        self.events.get(name)
    }

    pub fn struct_type(&self, name: &str) -> Option<&Type> {
        self.structs.get(name)
    }

    fn allocate(&mut self, bytes: usize) -> usize {
        let pos = self.memory_cursor;
        self.memory_cursor += bytes;
        pos
    }

    pub fn memory_used(&self) -> usize {
        self.memory_cursor
    }

    /// Declares a named local in the innermost scope and reserves memory for it.
    pub fn new_variable(
        &mut self,
        name: &str,
        typ: Type,
        declared_at: Option<Position>,
    ) -> Result<usize> {
        if let Some(existing) = self.lookup(name) {
            let message = match existing.declared_at {
                Some(at) => format!("Variable {} has already been declared at {}", name, at),
                None => format!("Variable {} has already been declared", name),
            };
            return Err(CompileError::variable(message, declared_at));
        }
        Ok(self.register(name.to_string(), typ, declared_at))
    }

    /// Declares a compiler-generated local; the name is mangled so it cannot collide with user
    /// variables.
    pub fn new_internal_variable(&mut self, name: &str, typ: Type) -> usize {
        self.internal_counter += 1;
        let mangled = format!("#internal_{}_{}", self.internal_counter, name);
        self.register(mangled, typ, None)
    }

    fn register(&mut self, name: String, typ: Type, declared_at: Option<Position>) -> usize {
        let size = typ.size_in_words();
        let pos = self.allocate(size * 32);
        trace!(%name, pos, size, "declared variable");
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(
                name.clone(),
                VariableRecord {
                    name,
                    pos,
                    typ,
                    location: StorageClass::Memory,
                    mutable: true,
                    size,
                    declared_at,
                },
            );
        }
        pos
    }

    /// Reserves unnamed scratch memory large enough for `typ`.
    pub fn new_placeholder(&mut self, typ: &Type) -> usize {
        self.allocate(typ.size_in_bytes())
    }

    pub fn is_constant(&self) -> bool {
        self.in_assertion || self.in_range_expr || self.function.constancy != Constancy::Mutable
    }

    /// Describes the innermost reason persistent state may not change here.
    pub fn pp_constancy(&self) -> &'static str {
        if self.in_assertion {
            "an assertion"
        } else if self.in_range_expr {
            "a range expression"
        } else {
            match self.function.constancy {
                Constancy::View => "a view function",
                Constancy::Pure => "a pure function",
                Constancy::Mutable => "a mutating function",
            }
        }
    }

    pub fn in_assignment(&self) -> bool {
        self.in_assignment
    }

    pub fn is_loop_variable(&self, name: &str) -> bool {
        self.forvars.iter().any(|v| v == name)
    }

    pub fn is_list_locked(&self, name: &str) -> bool {
        self.locked_lists.iter().any(|l| l == name)
    }

    pub fn has_locked_lists(&self) -> bool {
        !self.locked_lists.is_empty()
    }

    pub fn with_block_scope<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.scopes.push(IndexMap::new());
        trace!(depth = self.scopes.len(), "enter block scope");
        let result = f(self);
        self.scopes.pop();
        trace!(depth = self.scopes.len(), "exit block scope");
        result
    }

    pub fn with_assignment_scope<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let previous = mem::replace(&mut self.in_assignment, true);
        let result = f(self);
        self.in_assignment = previous;
        result
    }

    pub fn with_assertion_scope<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let previous = mem::replace(&mut self.in_assertion, true);
        let result = f(self);
        self.in_assertion = previous;
        result
    }

    pub fn with_range_scope<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let previous = mem::replace(&mut self.in_range_expr, true);
        let result = f(self);
        self.in_range_expr = previous;
        result
    }

    /// Forbids reassigning `list_name` or its elements while `f` runs.
    pub fn with_locked_list<T>(
        &mut self,
        list_name: impl Into<String>,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.locked_lists.push(list_name.into());
        let result = f(self);
        self.locked_lists.pop();
        result
    }

    /// Marks `name` as the control variable of the loop being lowered by `f`.
    pub fn with_loop_variable<T>(
        &mut self,
        name: impl Into<String>,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.forvars.push(name.into());
        let result = f(self);
        self.forvars.pop();
        result
    }
}
