/*! Transform contract statements into stack-machine IR.
 *
 * The host parser hands over a statement AST; the backend wants an `IrNode` tree in which every
 * memory slot, storage access and revert path is explicit. This crate performs that lowering one
 * function body at a time, rejecting programs that break the language's static rules along the way.
 */

pub mod stmt_to_ir;

pub use stmt_to_ir::{
    lower_body, lower_statement, Builtins, CallLowering, Collaborators, CompilationContext,
    Constancy, EventPacking, EventSignature, ExprLowering, FunctionInfo, PackedData,
    ReturnEncoding, TypeParser, VariableRecord,
};
