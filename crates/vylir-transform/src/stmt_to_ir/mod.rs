/*! Lower contract statements to IR.
 *
 * Each statement of a function body becomes one `IrNode`. Expressions, calls, event encoding and
 * type annotations are handled elsewhere and reached through the `Collaborators` seam; this module
 * owns the statement forms themselves and the static checks that guard them: assignment
 * compatibility, constancy, loop-variable and iterated-list protection, and return encoding.
 */

mod assignment;
mod context;
mod control_flow_builder;
mod interfaces;
mod return_builder;
mod setter;
mod structural_transformer;
mod type_resolver;

use tracing::debug;
use vylir_core::{IrNode, Result, Stmt, StmtKind};

use assignment::AssignmentBuilder;
use control_flow_builder::ControlFlowBuilder;
use return_builder::ReturnBuilder;
use structural_transformer::StructuralTransformer;

pub use assignment::constancy_checks;
pub use context::{
    CompilationContext, Constancy, EventSignature, FunctionInfo, VariableRecord, RESERVED_MEMORY,
};
pub use interfaces::{
    Builtins, CallLowering, Collaborators, EventPacking, ExprLowering, PackedData, ReturnEncoding,
    TypeParser,
};
pub use setter::{base_type_conversion, make_byte_array_copier, make_setter, zero_pad};
pub use structural_transformer::{DEBUGGER_NAME, UNREACHABLE_NAME};
pub use type_resolver::TypeResolver;

/// Lowers a single statement.
pub fn lower_statement(
    stmt: &Stmt,
    ctx: &mut CompilationContext,
    env: &mut dyn Collaborators,
) -> Result<IrNode> {
    debug!(kind = stmt.kind.name(), line = stmt.pos.line, "lowering statement");
    let pos = stmt.pos;

    match &stmt.kind {
        StmtKind::Expr(expr) => StructuralTransformer::lower_expr_stmt(expr, pos, ctx, env),
        StmtKind::Pass => Ok(StructuralTransformer::lower_pass(pos)),
        StmtKind::Raise { exc } => StructuralTransformer::lower_raise(exc.as_ref(), pos, ctx, env),
        StmtKind::AnnAssign {
            target,
            annotation,
            value,
        } => AssignmentBuilder::lower_ann_assign(target, annotation, value.as_ref(), pos, ctx, env),
        StmtKind::Assign { target, value } => {
            AssignmentBuilder::lower_assign(target, value, pos, ctx, env)
        }
        StmtKind::If { test, body, orelse } => {
            ControlFlowBuilder::lower_if(test, body, orelse, pos, ctx, env)
        }
        StmtKind::Assert { test, msg } => {
            StructuralTransformer::lower_assert(test, msg.as_ref(), pos, ctx, env)
        }
        StmtKind::For { target, iter, body } => {
            ControlFlowBuilder::lower_for(target, iter, body, pos, ctx, env)
        }
        StmtKind::AugAssign { target, op, value } => {
            AssignmentBuilder::lower_aug_assign(target, *op, value, pos, ctx, env)
        }
        StmtKind::Break => Ok(ControlFlowBuilder::lower_break(pos)),
        StmtKind::Continue => Ok(ControlFlowBuilder::lower_continue(pos)),
        StmtKind::Return { value } => ReturnBuilder::lower_return(value.as_ref(), pos, ctx, env),
        StmtKind::While { .. }
        | StmtKind::Delete { .. }
        | StmtKind::Global(_)
        | StmtKind::Nonlocal(_)
        | StmtKind::Import(_)
        | StmtKind::Try
        | StmtKind::With => Err(vylir_core::CompileError::structure(
            format!("Unsupported statement type: {}", stmt.kind.name()),
            Some(pos),
        )),
    }
}

/// Lowers a statement list to `(seq s1 .. sN pass)`, which never leaves a value behind.
pub fn lower_body(
    body: &[Stmt],
    ctx: &mut CompilationContext,
    env: &mut dyn Collaborators,
) -> Result<IrNode> {
    let mut nodes = Vec::with_capacity(body.len() + 1);
    for stmt in body {
        nodes.push(lower_statement(stmt, ctx, env)?);
    }
    nodes.push(IrNode::pass());
    Ok(IrNode::seq(nodes).at(body.first().map(|s| s.pos)))
}

#[cfg(test)]
mod tests;
