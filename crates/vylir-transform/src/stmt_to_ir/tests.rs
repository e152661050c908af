use super::*;
use num_bigint::BigUint;
use pretty_assertions::assert_eq;
use vylir_core::{BinOp, Call, CompileError, Expr, Opcode, Position, Type};

/// Fails on every collaborator call, so tests prove which statements lower on their own.
struct NullEnv;

fn unexpected<T>() -> Result<T> {
    Err(CompileError::panic("unexpected collaborator call"))
}

impl ExprLowering for NullEnv {
    fn lower_expr(&mut self, _: &Expr, _: &mut CompilationContext) -> Result<IrNode> {
        unexpected()
    }

    fn lower_variable_location(&mut self, _: &Expr, _: &mut CompilationContext) -> Result<IrNode> {
        unexpected()
    }

    fn lower_arithmetic(
        &mut self,
        _: IrNode,
        _: BinOp,
        _: IrNode,
        _: &mut CompilationContext,
        _: Position,
    ) -> Result<IrNode> {
        unexpected()
    }
}

impl TypeParser for NullEnv {
    fn parse_type(&self, _: &Expr, _: &CompilationContext) -> Result<Type> {
        unexpected()
    }
}

impl CallLowering for NullEnv {
    fn lower_self_call(&mut self, _: &Call, _: &mut CompilationContext, _: Position) -> Result<IrNode> {
        unexpected()
    }

    fn lower_external_call(
        &mut self,
        _: &Call,
        _: &mut CompilationContext,
        _: Position,
    ) -> Result<IrNode> {
        unexpected()
    }
}

impl EventPacking for NullEnv {
    fn pack_topics(
        &mut self,
        _: &BigUint,
        _: &[Expr],
        _: &[Type],
        _: &mut CompilationContext,
        _: Position,
    ) -> Result<Vec<IrNode>> {
        unexpected()
    }

    fn pack_data(
        &mut self,
        _: &[Expr],
        _: &[Type],
        _: &mut CompilationContext,
        _: Position,
    ) -> Result<PackedData> {
        unexpected()
    }
}

impl ReturnEncoding for NullEnv {
    fn encode_tuple_return(
        &mut self,
        _: IrNode,
        _: &mut CompilationContext,
        _: Position,
    ) -> Result<IrNode> {
        unexpected()
    }
}

impl Builtins for NullEnv {
    fn is_statement_builtin(&self, _: &str) -> bool {
        false
    }

    fn is_value_builtin(&self, _: &str) -> bool {
        false
    }

    fn lower_builtin_statement(
        &mut self,
        _: &Call,
        _: &mut CompilationContext,
        _: Position,
    ) -> Result<IrNode> {
        unexpected()
    }
}

fn at(line: u32) -> Position {
    Position::new(line, 4)
}

fn lower(kind: StmtKind) -> Result<IrNode> {
    let mut ctx = CompilationContext::new(FunctionInfo::new("f"));
    lower_statement(&Stmt::new(kind, at(1)), &mut ctx, &mut NullEnv)
}

#[test]
fn test_control_statements_are_zero_valent() {
    for (kind, expected) in [
        (StmtKind::Pass, "pass"),
        (StmtKind::Break, "break"),
        (StmtKind::Continue, "continue"),
    ] {
        let node = lower(kind).unwrap();
        assert_eq!(node.to_string(), expected);
        assert_eq!(node.valency, 0);
        assert_eq!(node.pos, Some(at(1)));
    }
}

#[test]
fn test_debugger_trap() {
    let node = lower(StmtKind::Expr(Expr::name(DEBUGGER_NAME, at(1)))).unwrap();
    assert_eq!(node.opcode(), Some(Opcode::Debugger));
}

#[test]
fn test_other_bare_names_are_rejected() {
    let err = lower(StmtKind::Expr(Expr::name("x", at(1)))).unwrap_err();
    assert_eq!(err.kind_name(), "StructureException");
}

#[test]
fn test_unsupported_statements_name_their_kind() {
    for kind in [
        StmtKind::While {
            test: Expr::name("x", at(1)),
            body: vec![],
        },
        StmtKind::Delete { targets: vec![] },
        StmtKind::Global(vec!["x".into()]),
        StmtKind::Nonlocal(vec![]),
        StmtKind::Import(vec!["os".into()]),
        StmtKind::Try,
        StmtKind::With,
    ] {
        let name = kind.name();
        let err = lower(kind).unwrap_err();
        assert_eq!(err.kind_name(), "StructureException");
        assert!(
            err.to_string().contains(&format!("Unsupported statement type: {}", name)),
            "{}",
            err
        );
        assert_eq!(err.position(), Some((1, 4)));
    }
}

#[test]
fn test_raise_needs_reason() {
    let err = lower(StmtKind::Raise { exc: None }).unwrap_err();
    assert!(err.to_string().contains("Raise must have a reason"));
}

#[test]
fn test_raise_unreachable_never_lowers_expressions() {
    let node = lower(StmtKind::Raise {
        exc: Some(Expr::name(UNREACHABLE_NAME, at(1))),
    })
    .unwrap();
    assert_eq!(node.to_string(), "(assert_unreachable 0)");
}

#[test]
fn test_body_is_terminated_with_pass() {
    let mut ctx = CompilationContext::new(FunctionInfo::new("f"));
    let body = vec![
        Stmt::new(StmtKind::Pass, at(2)),
        Stmt::new(StmtKind::Break, at(3)),
    ];
    let node = lower_body(&body, &mut ctx, &mut NullEnv).unwrap();
    assert_eq!(node.to_string(), "(seq pass break pass)");
    assert_eq!(node.valency, 0);
    assert_eq!(node.pos, Some(at(2)));

    let empty = lower_body(&[], &mut ctx, &mut NullEnv).unwrap();
    assert_eq!(empty.to_string(), "(seq pass)");
    assert_eq!(empty.pos, None);
}

#[test]
fn test_first_error_aborts_body() {
    let mut ctx = CompilationContext::new(FunctionInfo::new("f"));
    let body = vec![
        Stmt::new(StmtKind::Try, at(2)),
        Stmt::new(StmtKind::With, at(3)),
    ];
    let err = lower_body(&body, &mut ctx, &mut NullEnv).unwrap_err();
    assert_eq!(err.position(), Some((2, 4)));
}
