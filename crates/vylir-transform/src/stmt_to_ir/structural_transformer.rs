use super::context::CompilationContext;
use super::interfaces::Collaborators;
use super::type_resolver::TypeResolver;
use tracing::debug;
use vylir_core::crypto::method_id;
use vylir_core::{
    Call, CompileError, Expr, ExprKind, IrNode, Opcode, Position, Result, Type,
};

/// Bare name that lowers to a debugger trap.
pub const DEBUGGER_NAME: &str = "vdb";
/// Reason constant that lowers to an unconditional invalid-opcode trap.
pub const UNREACHABLE_NAME: &str = "UNREACHABLE";

pub struct StructuralTransformer;

impl StructuralTransformer {
    /// An expression evaluated for its side effects.
    pub fn lower_expr_stmt(
        expr: &Expr,
        pos: Position,
        ctx: &mut CompilationContext,
        env: &mut dyn Collaborators,
    ) -> Result<IrNode> {
        let node = match &expr.kind {
            ExprKind::Call(call) => Self::lower_call(call, expr.pos, ctx, env)?,
            ExprKind::Name(name) => Self::lower_name(name, pos)?,
            other => {
                return Err(CompileError::structure(
                    format!("Unsupported statement type: {}", other.name()),
                    Some(pos),
                ));
            }
        };
        if node.valency == 1 {
            return Ok(IrNode::op(Opcode::Pop, vec![node]).at(Some(pos)));
        }
        Ok(node)
    }

    pub fn lower_pass(pos: Position) -> IrNode {
        IrNode::pass().at(Some(pos))
    }

    pub fn lower_name(name: &str, pos: Position) -> Result<IrNode> {
        if name == DEBUGGER_NAME {
            return Ok(IrNode::op(Opcode::Debugger, Vec::new()).at(Some(pos)));
        }
        Err(CompileError::structure(
            format!("Unsupported statement type: Name '{}'", name),
            Some(pos),
        ))
    }

    pub fn lower_raise(
        exc: Option<&Expr>,
        pos: Position,
        ctx: &mut CompilationContext,
        env: &mut dyn Collaborators,
    ) -> Result<IrNode> {
        let reason =
            exc.ok_or_else(|| CompileError::structure("Raise must have a reason", Some(pos)))?;
        Self::lower_reason(IrNode::int(0), reason, pos, ctx, env)
    }

    pub fn lower_assert(
        test: &Expr,
        msg: Option<&Expr>,
        pos: Position,
        ctx: &mut CompilationContext,
        env: &mut dyn Collaborators,
    ) -> Result<IrNode> {
        let test_node = ctx.with_assertion_scope(|ctx| env.lower_value_expr(test, ctx))?;
        if !TypeResolver::is_bool_expr(&test_node) {
            return Err(CompileError::type_mismatch(
                "Only boolean expressions allowed",
                Some(test.pos),
            ));
        }
        match msg {
            Some(reason) => Self::lower_reason(test_node, reason, pos, ctx, env),
            None => Ok(IrNode::op(Opcode::Assert, vec![test_node]).at(Some(pos))),
        }
    }

    /// Reverts with an ABI-encoded `Error(string)` payload built from a literal reason.
    fn lower_reason(
        test: IrNode,
        reason: &Expr,
        pos: Position,
        ctx: &mut CompilationContext,
        env: &mut dyn Collaborators,
    ) -> Result<IrNode> {
        let text = match &reason.kind {
            ExprKind::Name(name) if name == UNREACHABLE_NAME => {
                return Ok(
                    IrNode::op(Opcode::AssertUnreachable, vec![test]).at(Some(reason.pos))
                );
            }
            ExprKind::Str(text) => text.trim(),
            _ => {
                return Err(CompileError::structure(
                    "Reason parameter of assert needs to be a literal string \
                     (or UNREACHABLE constant).",
                    Some(reason.pos),
                ));
            }
        };
        if text.is_empty() {
            return Err(CompileError::structure(
                "Empty reason string not allowed.",
                Some(pos),
            ));
        }

        let word = Type::base("bytes32");
        let sig_placeholder = ctx.new_placeholder(&word);
        let arg_placeholder = ctx.new_placeholder(&word);
        let reason_type = Type::bytes(text.len());
        let reason_bytes = env.lower_expr(reason, ctx)?;

        let payload_size = 4 + 32 + reason_type.size_in_words() * 32;
        Ok(IrNode::seq(vec![
            IrNode::op(
                Opcode::MStore,
                vec![
                    IrNode::int(sig_placeholder),
                    IrNode::int(method_id("Error(string)")),
                ],
            ),
            IrNode::op(
                Opcode::MStore,
                vec![IrNode::int(arg_placeholder), IrNode::int(32)],
            ),
            reason_bytes,
            IrNode::op(
                Opcode::AssertReason,
                vec![
                    test,
                    IrNode::int(sig_placeholder + 28),
                    IrNode::int(payload_size),
                ],
            ),
        ])
        .at(Some(pos)))
    }

    pub fn lower_call(
        call: &Call,
        pos: Position,
        ctx: &mut CompilationContext,
        env: &mut dyn Collaborators,
    ) -> Result<IrNode> {
        match &call.func.kind {
            ExprKind::Name(name) => {
                if env.is_statement_builtin(name) {
                    debug!(builtin = %name, "lowering builtin statement");
                    env.lower_builtin_statement(call, ctx, pos)
                } else if env.is_value_builtin(name) {
                    Err(CompileError::structure(
                        format!("Function {} can not be called without being used.", name),
                        Some(pos),
                    ))
                } else {
                    Err(CompileError::structure(
                        format!("Unknown function: '{}'.", name),
                        Some(pos),
                    ))
                }
            }
            ExprKind::Attribute { value, attr } if value.is_name("self") => {
                debug!(function = %attr, "lowering internal call");
                env.lower_self_call(call, ctx, pos)
            }
            ExprKind::Attribute { value, attr } if value.is_name("log") => {
                Self::lower_log(attr, call, pos, ctx, env)
            }
            _ => env.lower_external_call(call, ctx, pos),
        }
    }

    fn lower_log(
        event_name: &str,
        call: &Call,
        pos: Position,
        ctx: &mut CompilationContext,
        env: &mut dyn Collaborators,
    ) -> Result<IrNode> {
        let event = ctx
            .event(event_name)
            .cloned()
            .ok_or_else(|| {
                CompileError::event(format!("Event not declared yet: {}", event_name), Some(pos))
            })?;
        if event.indexed.len() != call.args.len() {
            return Err(CompileError::event(
                format!(
                    "{} received {} arguments but expected {}",
                    event.name,
                    call.args.len(),
                    event.indexed.len()
                ),
                Some(pos),
            ));
        }

        let mut topics = (Vec::new(), Vec::new());
        let mut data = (Vec::new(), Vec::new());
        for ((arg, typ), indexed) in call.args.iter().zip(&event.args).zip(&event.indexed) {
            let bucket = if *indexed { &mut topics } else { &mut data };
            bucket.0.push(arg.clone());
            bucket.1.push(typ.clone());
        }
        debug!(event = %event.name, topics = topics.0.len(), "lowering log");

        let topic_nodes = env.pack_topics(&event.event_id, &topics.0, &topics.1, ctx, pos)?;
        let packed = env.pack_data(&data.0, &data.1, ctx, pos)?;

        let size = match packed.size_node {
            Some(node) => IrNode::op(Opcode::MLoad, vec![node]),
            None => IrNode::int(packed.size),
        };
        let topic_count = u8::try_from(topic_nodes.len())
            .map_err(|_| CompileError::event("Too many indexed arguments", Some(pos)))?;

        let mut log_args = vec![packed.start, size];
        log_args.extend(topic_nodes);
        Ok(IrNode::seq(vec![
            packed.setup,
            IrNode::op(Opcode::Log(topic_count), log_args),
        ])
        .at(Some(pos)))
    }
}
