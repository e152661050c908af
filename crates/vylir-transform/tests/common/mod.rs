//! Deterministic stand-ins for the expression, call and encoding subsystems, plus small AST
//! builders.

#![allow(dead_code)]

use num_bigint::{BigInt, BigUint};
use vylir_core::ast::{Call, Expr, ExprKind, Stmt, StmtKind};
use vylir_core::{
    BinOp, CmpOp, CompileError, IrNode, Opcode, Position, Result, SizeLimits, StorageClass, Type,
};
use vylir_transform::{
    lower_statement, Builtins, CallLowering, CompilationContext, EventPacking, ExprLowering,
    FunctionInfo, PackedData, ReturnEncoding, TypeParser,
};

pub const STATEMENT_BUILTINS: &[&str] = &["send", "selfdestruct", "raw_log"];
pub const VALUE_BUILTINS: &[&str] = &["len", "concat", "sha3"];

#[derive(Debug, Default)]
pub struct MockEnv;

fn literal_int_type(value: &BigInt) -> Type {
    if SizeLimits::in_bounds("int128", value) {
        Type::literal("int128")
    } else {
        Type::literal("uint256")
    }
}

fn arithmetic(op: BinOp) -> Opcode {
    match op {
        BinOp::Add => Opcode::Add,
        BinOp::Sub => Opcode::Sub,
        BinOp::Mul => Opcode::Mul,
        BinOp::Div => Opcode::Div,
        BinOp::Mod => Opcode::Mod,
        BinOp::Pow => Opcode::Exp,
        BinOp::BitAnd => Opcode::And,
        BinOp::BitOr => Opcode::Or,
        BinOp::BitXor => Opcode::Xor,
        BinOp::LShift => Opcode::Shl,
        BinOp::RShift => Opcode::Shr,
    }
}

impl MockEnv {
    fn byte_literal(&self, typ: Type, ctx: &mut CompilationContext, pos: Position) -> IrNode {
        let slot = ctx.new_placeholder(&typ);
        IrNode::int(slot)
            .with_type(typ.with_literal(true))
            .located(StorageClass::Memory)
            .at(Some(pos))
    }

    fn element_type(typ: &Option<Type>) -> Type {
        match typ {
            Some(Type::List { subtype, .. }) => (**subtype).clone(),
            _ => Type::base("int128"),
        }
    }
}

impl ExprLowering for MockEnv {
    fn lower_expr(&mut self, expr: &Expr, ctx: &mut CompilationContext) -> Result<IrNode> {
        let pos = Some(expr.pos);
        let node = match &expr.kind {
            ExprKind::Int(v) => IrNode::int(v.clone()).with_type(literal_int_type(v)),
            ExprKind::Bool(b) => IrNode::int(u8::from(*b)).with_type(Type::literal("bool")),
            ExprKind::Str(s) => {
                return Ok(self.byte_literal(Type::string(s.len()), ctx, expr.pos));
            }
            ExprKind::Bytes(b) => {
                return Ok(self.byte_literal(Type::bytes(b.len()), ctx, expr.pos));
            }
            ExprKind::Name(_) | ExprKind::Attribute { .. } | ExprKind::Subscript { .. } => {
                return self.lower_variable_location(expr, ctx);
            }
            ExprKind::List(items) => {
                let args = items
                    .iter()
                    .map(|item| self.lower_value_expr(item, ctx))
                    .collect::<Result<Vec<_>>>()?;
                let subtype = args
                    .first()
                    .and_then(|a| a.typ.clone())
                    .unwrap_or_else(|| Type::base("int128"));
                let count = args.len();
                IrNode::op(Opcode::Multi, args).with_type(Type::list(subtype, count))
            }
            ExprKind::Tuple(items) => {
                let args = items
                    .iter()
                    .map(|item| self.lower_expr(item, ctx))
                    .collect::<Result<Vec<_>>>()?;
                let members = args
                    .iter()
                    .map(|a| a.typ.clone().unwrap_or_else(|| Type::base("int128")))
                    .collect();
                IrNode::op(Opcode::Multi, args).with_type(Type::Tuple { members })
            }
            ExprKind::BinOp { left, op, right } => {
                let left = self.lower_value_expr(left, ctx)?;
                let right = self.lower_value_expr(right, ctx)?;
                self.lower_arithmetic(left, *op, right, ctx, expr.pos)?
            }
            ExprKind::Compare { left, op, right } => {
                let left = self.lower_value_expr(left, ctx)?;
                let right = self.lower_value_expr(right, ctx)?;
                let opcode = match op {
                    CmpOp::Lt => Opcode::Slt,
                    CmpOp::Gt => Opcode::Sgt,
                    _ => Opcode::Eq,
                };
                IrNode::op(opcode, vec![left, right]).with_type(Type::base("bool"))
            }
            ExprKind::Call(call) => {
                let callee = call.func.dotted_name().unwrap_or_default();
                IrNode::op(Opcode::Call, vec![IrNode::var(callee)]).with_type(Type::base("uint256"))
            }
            other => {
                return Err(CompileError::structure(
                    format!("Unsupported expression: {}", other.name()),
                    pos,
                ));
            }
        };
        Ok(node.at(pos))
    }

    fn lower_variable_location(
        &mut self,
        expr: &Expr,
        ctx: &mut CompilationContext,
    ) -> Result<IrNode> {
        let pos = Some(expr.pos);
        match &expr.kind {
            ExprKind::Name(name) => ctx
                .lookup(name)
                .map(|record| record.location_node().at(pos))
                .ok_or_else(|| CompileError::variable(format!("Undeclared variable: {}", name), pos)),
            ExprKind::Attribute { value, attr } if value.is_name("self") => ctx
                .global(attr)
                .map(|record| {
                    record
                        .location_node()
                        .annotated(format!("self.{}", attr))
                        .at(pos)
                })
                .ok_or_else(|| {
                    CompileError::variable(format!("Persistent variable undeclared: {}", attr), pos)
                }),
            ExprKind::Subscript { value, index } => {
                let base = self.lower_variable_location(value, ctx)?;
                let index = self.lower_value_expr(index, ctx)?;
                let element = Self::element_type(&base.typ);
                let location = base.location.unwrap_or(StorageClass::Memory);
                let annotation = base.annotation.clone().unwrap_or_default();
                let mutable = base.mutable;
                let address = match location {
                    StorageClass::Storage => IrNode::op(
                        Opcode::Add,
                        vec![IrNode::op(Opcode::Sha3_32, vec![base]), index],
                    ),
                    _ => IrNode::op(
                        Opcode::Add,
                        vec![base, IrNode::op(Opcode::Mul, vec![index, IrNode::int(32)])],
                    ),
                };
                let node = address
                    .with_type(element)
                    .located(location)
                    .annotated(annotation)
                    .at(pos);
                Ok(if mutable { node } else { node.immutable() })
            }
            other => Err(CompileError::structure(
                format!("Invalid assignment target: {}", other.name()),
                pos,
            )),
        }
    }

    fn lower_arithmetic(
        &mut self,
        left: IrNode,
        op: BinOp,
        right: IrNode,
        _ctx: &mut CompilationContext,
        pos: Position,
    ) -> Result<IrNode> {
        let typ = match (&left.typ, &right.typ) {
            (Some(l), Some(r)) if l.is_literal() => r.clone(),
            (Some(l), _) => l.clone(),
            (None, r) => r.clone().unwrap_or_else(|| Type::base("int128")),
        };
        Ok(IrNode::op(arithmetic(op), vec![left, right])
            .with_type(typ)
            .at(Some(pos)))
    }
}

impl TypeParser for MockEnv {
    fn parse_type(&self, annotation: &Expr, ctx: &CompilationContext) -> Result<Type> {
        match &annotation.kind {
            ExprKind::Name(name) => Ok(ctx
                .struct_type(name)
                .cloned()
                .unwrap_or_else(|| Type::base(name.clone()))),
            ExprKind::Subscript { value, index } => {
                let count = index
                    .int_literal()
                    .and_then(|v| usize::try_from(v.clone()).ok())
                    .ok_or_else(|| {
                        CompileError::structure("Array size must be a literal", Some(index.pos))
                    })?;
                match value.as_name() {
                    Some("bytes") => Ok(Type::bytes(count)),
                    Some("string") => Ok(Type::string(count)),
                    _ => Ok(Type::list(self.parse_type(value, ctx)?, count)),
                }
            }
            other => Err(CompileError::structure(
                format!("Invalid type annotation: {}", other.name()),
                Some(annotation.pos),
            )),
        }
    }
}

impl CallLowering for MockEnv {
    fn lower_self_call(
        &mut self,
        call: &Call,
        _ctx: &mut CompilationContext,
        pos: Position,
    ) -> Result<IrNode> {
        let callee = call.func.dotted_name().unwrap_or_default();
        Ok(IrNode::op(Opcode::Call, vec![IrNode::var(callee)]).at(Some(pos)))
    }

    fn lower_external_call(
        &mut self,
        call: &Call,
        _ctx: &mut CompilationContext,
        pos: Position,
    ) -> Result<IrNode> {
        let callee = call.func.dotted_name().unwrap_or_else(|| "external".to_string());
        Ok(IrNode::op(Opcode::Call, vec![IrNode::var(callee)])
            .zero_valent()
            .at(Some(pos)))
    }
}

impl EventPacking for MockEnv {
    fn pack_topics(
        &mut self,
        event_id: &BigUint,
        args: &[Expr],
        _expected: &[Type],
        ctx: &mut CompilationContext,
        _pos: Position,
    ) -> Result<Vec<IrNode>> {
        let mut topics = vec![IrNode::int(BigInt::from(event_id.clone()))];
        for arg in args {
            topics.push(self.lower_value_expr(arg, ctx)?);
        }
        Ok(topics)
    }

    fn pack_data(
        &mut self,
        args: &[Expr],
        expected: &[Type],
        ctx: &mut CompilationContext,
        _pos: Position,
    ) -> Result<PackedData> {
        let start = ctx.new_placeholder(&Type::Tuple {
            members: expected.to_vec(),
        });
        let mut setup = Vec::with_capacity(args.len() + 1);
        for (i, arg) in args.iter().enumerate() {
            let value = self.lower_value_expr(arg, ctx)?;
            setup.push(IrNode::op(
                Opcode::MStore,
                vec![IrNode::int(start + 32 * i), value],
            ));
        }
        setup.push(IrNode::pass());
        Ok(PackedData {
            setup: IrNode::seq(setup),
            size: 32 * args.len(),
            size_node: None,
            start: IrNode::int(start),
        })
    }
}

impl ReturnEncoding for MockEnv {
    fn encode_tuple_return(
        &mut self,
        value: IrNode,
        _ctx: &mut CompilationContext,
        pos: Position,
    ) -> Result<IrNode> {
        let size = value.typ.as_ref().map_or(0, Type::size_in_bytes);
        Ok(IrNode::op(Opcode::Return, vec![value, IrNode::int(size)]).at(Some(pos)))
    }
}

impl Builtins for MockEnv {
    fn is_statement_builtin(&self, name: &str) -> bool {
        STATEMENT_BUILTINS.contains(&name)
    }

    fn is_value_builtin(&self, name: &str) -> bool {
        VALUE_BUILTINS.contains(&name)
    }

    fn lower_builtin_statement(
        &mut self,
        call: &Call,
        ctx: &mut CompilationContext,
        pos: Position,
    ) -> Result<IrNode> {
        let mut args = vec![IrNode::var(call.func.dotted_name().unwrap_or_default())];
        for arg in &call.args {
            args.push(self.lower_value_expr(arg, ctx)?);
        }
        Ok(IrNode::op(Opcode::Call, args).zero_valent().at(Some(pos)))
    }
}

// AST builders. Every node sits at line 1 unless placed explicitly.

pub fn p() -> Position {
    Position::new(1, 0)
}

pub fn name(id: &str) -> Expr {
    Expr::name(id, p())
}

pub fn int(v: i64) -> Expr {
    Expr::int(v, p())
}

pub fn string(s: &str) -> Expr {
    Expr::new(ExprKind::Str(s.to_string()), p())
}

pub fn bytes(len: usize) -> Expr {
    Expr::new(ExprKind::Bytes(vec![0x61; len]), p())
}

pub fn boolean(b: bool) -> Expr {
    Expr::new(ExprKind::Bool(b), p())
}

pub fn list(items: Vec<Expr>) -> Expr {
    Expr::new(ExprKind::List(items), p())
}

pub fn tuple(items: Vec<Expr>) -> Expr {
    Expr::new(ExprKind::Tuple(items), p())
}

pub fn add(left: Expr, right: Expr) -> Expr {
    Expr::binop(left, BinOp::Add, right, p())
}

pub fn lt(left: Expr, right: Expr) -> Expr {
    Expr::new(
        ExprKind::Compare {
            left: Box::new(left),
            op: CmpOp::Lt,
            right: Box::new(right),
        },
        p(),
    )
}

pub fn self_attr(attr: &str) -> Expr {
    Expr::attribute(name("self"), attr, p())
}

pub fn index(value: Expr, i: Expr) -> Expr {
    Expr::subscript(value, i, p())
}

pub fn call(func: Expr, args: Vec<Expr>) -> Expr {
    Expr::call(func, args, p())
}

pub fn sized(base: &str, n: i64) -> Expr {
    index(name(base), int(n))
}

pub fn stmt(kind: StmtKind) -> Stmt {
    Stmt::new(kind, p())
}

pub fn ann_assign(target: &str, annotation: Expr, value: Expr) -> Stmt {
    stmt(StmtKind::AnnAssign {
        target: name(target),
        annotation,
        value: Some(value),
    })
}

pub fn assign(target: Expr, value: Expr) -> Stmt {
    stmt(StmtKind::Assign { target, value })
}

pub fn aug_assign(target: Expr, op: BinOp, value: Expr) -> Stmt {
    stmt(StmtKind::AugAssign { target, op, value })
}

pub fn for_loop(var: &str, iter: Expr, body: Vec<Stmt>) -> Stmt {
    stmt(StmtKind::For {
        target: name(var),
        iter,
        body,
    })
}

pub fn range(args: Vec<Expr>) -> Expr {
    call(name("range"), args)
}

pub fn ret(value: Option<Expr>) -> Stmt {
    stmt(StmtKind::Return { value })
}

pub fn pass() -> Stmt {
    stmt(StmtKind::Pass)
}

pub fn function(name: &str) -> FunctionInfo {
    FunctionInfo::new(name)
}

pub fn lower(stmt: &Stmt, ctx: &mut CompilationContext) -> Result<IrNode> {
    lower_statement(stmt, ctx, &mut MockEnv)
}
