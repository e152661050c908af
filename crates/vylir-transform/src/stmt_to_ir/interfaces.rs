//! Seams to the subsystems that live outside statement lowering: expression lowering, type
//! annotations, call and event encoding, tuple returns and the builtin function registry.

use super::context::CompilationContext;
use num_bigint::BigUint;
use vylir_core::{BinOp, Call, Expr, IrNode, Position, Result, Type};

pub trait ExprLowering {
    /// Lowers an expression, possibly to a located node that still needs a load.
    fn lower_expr(&mut self, expr: &Expr, ctx: &mut CompilationContext) -> Result<IrNode>;

    /// Lowers an expression to a node that leaves its value on the stack.
    fn lower_value_expr(&mut self, expr: &Expr, ctx: &mut CompilationContext) -> Result<IrNode> {
        Ok(self.lower_expr(expr, ctx)?.unwrap_location())
    }

    /// Lowers an assignment target to a located node.
    fn lower_variable_location(
        &mut self,
        expr: &Expr,
        ctx: &mut CompilationContext,
    ) -> Result<IrNode>;

    /// Combines two already lowered operands with `op`; used by augmented assignment.
    fn lower_arithmetic(
        &mut self,
        left: IrNode,
        op: BinOp,
        right: IrNode,
        ctx: &mut CompilationContext,
        pos: Position,
    ) -> Result<IrNode>;
}

pub trait TypeParser {
    fn parse_type(&self, annotation: &Expr, ctx: &CompilationContext) -> Result<Type>;
}

pub trait CallLowering {
    fn lower_self_call(
        &mut self,
        call: &Call,
        ctx: &mut CompilationContext,
        pos: Position,
    ) -> Result<IrNode>;

    fn lower_external_call(
        &mut self,
        call: &Call,
        ctx: &mut CompilationContext,
        pos: Position,
    ) -> Result<IrNode>;
}

/// Non-indexed event arguments laid out in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedData {
    pub setup: IrNode,
    /// Static byte size of the packed data.
    pub size: usize,
    /// Memory slot holding the dynamic size, when the data contains byte arrays.
    pub size_node: Option<IrNode>,
    pub start: IrNode,
}

pub trait EventPacking {
    fn pack_topics(
        &mut self,
        event_id: &BigUint,
        args: &[Expr],
        expected: &[Type],
        ctx: &mut CompilationContext,
        pos: Position,
    ) -> Result<Vec<IrNode>>;

    fn pack_data(
        &mut self,
        args: &[Expr],
        expected: &[Type],
        ctx: &mut CompilationContext,
        pos: Position,
    ) -> Result<PackedData>;
}

pub trait ReturnEncoding {
    /// ABI-encodes a struct or tuple value and returns it from the function.
    fn encode_tuple_return(
        &mut self,
        value: IrNode,
        ctx: &mut CompilationContext,
        pos: Position,
    ) -> Result<IrNode>;
}

pub trait Builtins {
    /// Builtins that may appear as a bare statement, such as `send` or `selfdestruct`.
    fn is_statement_builtin(&self, name: &str) -> bool;

    /// Builtins that only produce a value.
    fn is_value_builtin(&self, name: &str) -> bool;

    fn lower_builtin_statement(
        &mut self,
        call: &Call,
        ctx: &mut CompilationContext,
        pos: Position,
    ) -> Result<IrNode>;
}

/// Everything statement lowering needs from the rest of the compiler.
pub trait Collaborators:
    ExprLowering + TypeParser + CallLowering + EventPacking + ReturnEncoding + Builtins
{
}

impl<T> Collaborators for T where
    T: ExprLowering + TypeParser + CallLowering + EventPacking + ReturnEncoding + Builtins
{
}
