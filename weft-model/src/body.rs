//! Method bodies
//!
//! A body owns its instruction stream, local variable list, and
//! exception-handler ranges, plus the id allocator for new instructions.

use crate::instr::{InstrId, Instruction, OpCode, Operand};
use crate::refs::TypeRef;

/// A local variable slot.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalVar {
    pub name: Option<String>,
    pub ty: TypeRef,
}

/// An exception-handler range. All boundaries are instruction ids within
/// the owning body.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerRange {
    pub try_start: InstrId,
    pub try_end: InstrId,
    pub handler_start: InstrId,
    pub handler_end: InstrId,
    /// `None` for finally handlers
    pub catch_type: Option<TypeRef>,
}

/// An ordered instruction stream with locals and handler ranges.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodBody {
    pub instructions: Vec<Instruction>,
    pub locals: Vec<LocalVar>,
    pub handlers: Vec<HandlerRange>,
    next_id: u32,
}

impl Default for MethodBody {
    fn default() -> Self {
        Self::new()
    }
}

impl MethodBody {
    /// Create an empty body. Callers must append a terminator before the
    /// body is considered well-formed.
    pub fn new() -> Self {
        Self {
            instructions: Vec::new(),
            locals: Vec::new(),
            handlers: Vec::new(),
            next_id: 0,
        }
    }

    /// Create the minimal well-formed body: a single `ret`.
    pub fn single_return() -> Self {
        let mut body = Self::new();
        body.push(OpCode::Return, Operand::None);
        body
    }

    /// Rebuild a body from decoded parts, restoring the id allocator from
    /// the highest id present.
    pub fn from_parts(
        instructions: Vec<Instruction>,
        locals: Vec<LocalVar>,
        handlers: Vec<HandlerRange>,
    ) -> Self {
        let next_id = instructions
            .iter()
            .map(|i| i.id.0 + 1)
            .max()
            .unwrap_or(0);
        Self {
            instructions,
            locals,
            handlers,
            next_id,
        }
    }

    /// Allocate a fresh instruction id.
    pub fn alloc_id(&mut self) -> InstrId {
        let id = InstrId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Append an instruction, returning its id.
    pub fn push(&mut self, op: OpCode, operand: Operand) -> InstrId {
        let id = self.alloc_id();
        self.instructions.push(Instruction { id, op, operand });
        id
    }

    /// Stream position of an instruction id.
    pub fn position_of(&self, id: InstrId) -> Option<usize> {
        self.instructions.iter().position(|i| i.id == id)
    }

    /// Look up an instruction by id.
    pub fn instr(&self, id: InstrId) -> Option<&Instruction> {
        self.instructions.iter().find(|i| i.id == id)
    }

    /// Id of the first terminator in stream order.
    pub fn first_terminator(&self) -> Option<InstrId> {
        self.instructions
            .iter()
            .find(|i| i.is_terminator())
            .map(|i| i.id)
    }

    /// Whether the stream contains at least one terminator.
    pub fn has_terminator(&self) -> bool {
        self.instructions.iter().any(|i| i.is_terminator())
    }

    /// Number of terminator instructions in the stream.
    pub fn terminator_count(&self) -> usize {
        self.instructions.iter().filter(|i| i.is_terminator()).count()
    }

    /// Splice a sequence of (opcode, operand) pairs immediately before the
    /// instruction with the given id, allocating fresh ids. Returns the ids
    /// of the inserted instructions in order.
    ///
    /// # Panics
    /// Panics if `before` is not in the stream; callers obtain the anchor
    /// from the same body.
    pub fn insert_before(
        &mut self,
        before: InstrId,
        seq: Vec<(OpCode, Operand)>,
    ) -> Vec<InstrId> {
        let pos = self
            .position_of(before)
            .expect("insert anchor must be an instruction of this body");
        let mut ids = Vec::with_capacity(seq.len());
        let mut inserted = Vec::with_capacity(seq.len());
        for (op, operand) in seq {
            let id = self.alloc_id();
            ids.push(id);
            inserted.push(Instruction { id, op, operand });
        }
        self.instructions.splice(pos..pos, inserted);
        ids
    }

    /// Add a local variable slot, returning its index.
    pub fn add_local(&mut self, ty: TypeRef) -> u16 {
        let index = self.locals.len() as u16;
        self.locals.push(LocalVar { name: None, ty });
        index
    }

    /// Whether any instruction reads or writes a field with this name.
    pub fn references_field(&self, field_name: &str) -> bool {
        self.instructions
            .iter()
            .filter_map(|i| i.field_operand())
            .any(|f| f.name == field_name)
    }

    /// Whether any instruction calls the given `declaring::name` target.
    pub fn calls(&self, qualified_name: &str) -> bool {
        self.instructions
            .iter()
            .filter_map(|i| i.method_operand())
            .any(|m| m.qualified_name() == qualified_name)
    }
}
