use super::context::CompilationContext;
use super::interfaces::Collaborators;
use super::lower_body;
use super::setter::make_setter;
use super::type_resolver::TypeResolver;
use num_bigint::BigInt;
use num_traits::One;
use tracing::debug;
use vylir_core::{
    BinOp, CompileError, Expr, ExprKind, IrNode, Opcode, Position, Result, Stmt, StorageClass,
    Type,
};

/// Where the elements of an iterated list come from.
enum ListSource {
    /// A local or argument already in memory or calldata.
    Variable(String),
    Literal,
    /// A storage list reached through `self`.
    Storage,
}

pub struct ControlFlowBuilder;

impl ControlFlowBuilder {
    pub fn lower_if(
        test: &Expr,
        body: &[Stmt],
        orelse: &[Stmt],
        pos: Position,
        ctx: &mut CompilationContext,
        env: &mut dyn Collaborators,
    ) -> Result<IrNode> {
        let else_branch = if orelse.is_empty() {
            None
        } else {
            Some(ctx.with_block_scope(|ctx| lower_body(orelse, ctx, env))?)
        };

        ctx.with_block_scope(|ctx| {
            let test_node = env.lower_value_expr(test, ctx)?;
            if !TypeResolver::is_bool_expr(&test_node) {
                return Err(CompileError::type_mismatch(
                    "Only boolean expressions allowed",
                    Some(test.pos),
                ));
            }
            let mut args = vec![test_node, lower_body(body, ctx, env)?];
            args.extend(else_branch);
            Ok(IrNode::op(Opcode::If, args).at(Some(pos)))
        })
    }

    pub fn lower_break(pos: Position) -> IrNode {
        IrNode::op(Opcode::Break, Vec::new()).at(Some(pos))
    }

    pub fn lower_continue(pos: Position) -> IrNode {
        IrNode::op(Opcode::Continue, Vec::new()).at(Some(pos))
    }

    pub fn lower_for(
        target: &Expr,
        iter: &Expr,
        body: &[Stmt],
        pos: Position,
        ctx: &mut CompilationContext,
        env: &mut dyn Collaborators,
    ) -> Result<IrNode> {
        let var_name = target
            .as_name()
            .ok_or_else(|| {
                CompileError::structure("Loop target must be a simple name", Some(target.pos))
            })?
            .to_string();

        if let Some(source) = Self::classify_list(iter, ctx) {
            return Self::lower_for_list(&var_name, iter, source, body, pos, ctx, env);
        }

        let call = match &iter.kind {
            ExprKind::Call(call) => call,
            ExprKind::Subscript { .. } => {
                return Err(CompileError::structure(
                    "Cannot iterate over a nested list",
                    Some(iter.pos),
                ));
            }
            other => {
                return Err(CompileError::structure(
                    format!("Cannot iterate over '{}' object", other.name()),
                    Some(iter.pos),
                ));
            }
        };
        if !call.func.is_name("range") {
            return Err(CompileError::structure(
                "Non-literals cannot be used as loop range",
                Some(call.func.pos),
            ));
        }
        if !(1..=2).contains(&call.args.len()) {
            return Err(CompileError::structure(
                format!(
                    "Range expects between 1 and 2 arguments, got {}",
                    call.args.len()
                ),
                Some(call.func.pos),
            ));
        }

        ctx.with_block_scope(|ctx| {
            let (start, rounds) = Self::range_bounds(&call.args, iter.pos, ctx, env)?;
            if rounds < BigInt::one() {
                return Err(CompileError::structure(
                    format!(
                        "For loop has invalid number of iterations ({}), the value must be \
                         greater than zero",
                        rounds
                    ),
                    Some(iter.pos),
                ));
            }
            debug!(variable = %var_name, %rounds, "lowering range loop");

            let slot = ctx.new_variable(&var_name, Type::base("int128"), Some(pos))?;
            let body_node =
                ctx.with_loop_variable(var_name.clone(), |ctx| lower_body(body, ctx, env))?;
            Ok(IrNode::op(
                Opcode::Repeat,
                vec![
                    IrNode::int(slot),
                    start,
                    IrNode::int(rounds).with_type(Type::base("int128")),
                    body_node,
                ],
            )
            .at(Some(pos)))
        })
    }

    /// Start node and iteration count of a `range(...)` call.
    fn range_bounds(
        args: &[Expr],
        iter_pos: Position,
        ctx: &mut CompilationContext,
        env: &mut dyn Collaborators,
    ) -> Result<(IrNode, BigInt)> {
        let int128 = || Type::base("int128");

        if let [count] = args {
            let rounds = Self::range_constant(count, ctx, env)?;
            return Ok((IrNode::int(0).with_type(int128()), rounds));
        }

        let (first, second) = match args {
            [first, second] => (first, second),
            _ => {
                return Err(CompileError::panic(format!(
                    "range called with {} arguments",
                    args.len()
                )));
            }
        };

        let second_node = ctx.with_range_scope(|ctx| env.lower_value_expr(second, ctx))?;
        if let Some(end) = TypeResolver::range_constant(&second_node) {
            let begin = Self::range_constant(first, ctx, env)?;
            let rounds = &end - &begin;
            return Ok((IrNode::int(begin).with_type(int128()), rounds));
        }

        let (left, delta) = match &second.kind {
            ExprKind::BinOp {
                left,
                op: BinOp::Add,
                right,
            } => (left, right),
            _ => {
                return Err(CompileError::structure(
                    "Two-arg for statements must be of the form `for i in range(start, start + \
                     rounds): ...`",
                    Some(second.pos),
                ));
            }
        };
        if !first.structurally_eq(left) {
            return Err(CompileError::structure(
                "Two-arg for statements of the form `for i in range(x, x + y): ...` must have x \
                 identical in both places",
                Some(iter_pos),
            ));
        }
        let rounds = Self::range_constant(delta, ctx, env)?;
        let start = env.lower_value_expr(first, ctx)?;
        Ok((start, rounds))
    }

    fn range_constant(
        expr: &Expr,
        ctx: &mut CompilationContext,
        env: &mut dyn Collaborators,
    ) -> Result<BigInt> {
        let node = ctx.with_range_scope(|ctx| env.lower_value_expr(expr, ctx))?;
        TypeResolver::range_constant(&node).ok_or_else(|| {
            CompileError::structure(
                "Range only accepts literal (constant) values of type uint256 or int128",
                Some(expr.pos),
            )
        })
    }

    fn classify_list(iter: &Expr, ctx: &CompilationContext) -> Option<ListSource> {
        match &iter.kind {
            ExprKind::List(_) => Some(ListSource::Literal),
            ExprKind::Name(name) => ctx
                .lookup(name)
                .filter(|record| record.typ.is_list_like())
                .map(|_| ListSource::Variable(name.clone())),
            ExprKind::Attribute { attr, .. } => ctx
                .global(attr)
                .filter(|record| record.typ.is_list_like())
                .map(|_| ListSource::Storage),
            _ => None,
        }
    }

    fn lower_for_list(
        var_name: &str,
        iter: &Expr,
        source: ListSource,
        body: &[Stmt],
        pos: Position,
        ctx: &mut CompilationContext,
        env: &mut dyn Collaborators,
    ) -> Result<IrNode> {
        let list = ctx.with_range_scope(|ctx| env.lower_expr(iter, ctx))?;
        let (subtype, count) = match &list.typ {
            Some(Type::List { subtype, count }) if subtype.as_base().is_some() => {
                ((**subtype).clone(), *count)
            }
            _ => {
                return Err(CompileError::structure(
                    "For loops allowed only on basetype lists.",
                    Some(iter.pos),
                ));
            }
        };
        debug!(variable = %var_name, count, "lowering list loop");

        ctx.with_block_scope(|ctx| {
            let value_slot = ctx.new_variable(var_name, subtype.clone(), Some(pos))?;
            let index_slot =
                ctx.new_internal_variable(&format!("_index_for_{}", var_name), Type::base("uint256"));
            let index = IrNode::op(Opcode::MLoad, vec![IrNode::int(index_slot)]);
            let word_offset = || IrNode::op(Opcode::Mul, vec![index.clone(), IrNode::int(32)]);

            let store_element = |element: IrNode| {
                IrNode::op(Opcode::MStore, vec![IrNode::int(value_slot), element])
            };
            let repeat = |body: IrNode| {
                IrNode::op(
                    Opcode::Repeat,
                    vec![IrNode::int(index_slot), IrNode::int(0), IrNode::int(count), body],
                )
                .at(Some(pos))
            };

            ctx.with_loop_variable(var_name.to_string(), |ctx| match source {
                ListSource::Variable(list_name) => {
                    let record = ctx.lookup(&list_name).cloned().ok_or_else(|| {
                        CompileError::panic(format!("Iterated list {} is not bound", list_name))
                    })?;
                    let fetch = match record.location {
                        StorageClass::Calldata => Opcode::CalldataLoad,
                        StorageClass::Memory => Opcode::MLoad,
                        StorageClass::Storage => {
                            return Err(CompileError::panic(format!(
                                "List iteration only supported on in-memory types: {}",
                                list_name
                            )));
                        }
                    };
                    ctx.with_locked_list(list_name, |ctx| {
                        let element = IrNode::op(
                            fetch,
                            vec![IrNode::op(
                                Opcode::Add,
                                vec![IrNode::int(record.pos), word_offset()],
                            )],
                        );
                        let body = IrNode::seq(vec![
                            store_element(element),
                            lower_body(body, ctx, env)?,
                        ]);
                        Ok(repeat(body))
                    })
                }
                ListSource::Literal => {
                    let list_typ = Type::list(subtype.clone(), count);
                    let tmp = ctx.new_placeholder(&list_typ);
                    let tmp_node = IrNode::int(tmp)
                        .with_type(list_typ)
                        .located(StorageClass::Memory);
                    let setter = make_setter(tmp_node, list, ctx, Some(pos))?;
                    let element = IrNode::op(
                        Opcode::MLoad,
                        vec![IrNode::op(Opcode::Add, vec![IrNode::int(tmp), word_offset()])],
                    );
                    let body =
                        IrNode::seq(vec![store_element(element), lower_body(body, ctx, env)?]);
                    Ok(IrNode::seq(vec![setter, repeat(body)]).at(Some(pos)))
                }
                ListSource::Storage => {
                    let list_name = iter
                        .dotted_name()
                        .or_else(|| list.annotation.clone())
                        .unwrap_or_default();
                    ctx.with_locked_list(list_name, |ctx| {
                        let element = IrNode::op(
                            Opcode::SLoad,
                            vec![IrNode::op(
                                Opcode::Add,
                                vec![
                                    IrNode::op(Opcode::Sha3_32, vec![list]),
                                    index.clone(),
                                ],
                            )],
                        );
                        let body = IrNode::seq(vec![
                            store_element(element),
                            lower_body(body, ctx, env)?,
                        ]);
                        Ok(IrNode::seq(vec![repeat(body)]).at(Some(pos)))
                    })
                }
            })
        })
    }
}
