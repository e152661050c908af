mod common;

use common::*;
use num_bigint::BigInt;
use pretty_assertions::assert_eq;
use vylir_core::values::bytes_to_int;
use vylir_core::{BinOp, Opcode, StmtKind, Type};
use vylir_transform::{CompilationContext, Constancy};

fn ctx() -> CompilationContext {
    CompilationContext::new(function("f"))
}

#[test]
fn test_declaration_stores_initializer() {
    let mut ctx = ctx();
    let node = lower(&ann_assign("x", name("int128"), int(5)), &mut ctx).unwrap();
    assert_eq!(node.to_string(), "(mstore 320 5)");
    assert_eq!(node.valency, 0);
    assert_eq!(ctx.lookup("x").unwrap().pos, 320);
}

#[test]
fn test_self_referencing_initializer_is_rejected() {
    let mut ctx = ctx();
    let err = lower(
        &ann_assign("x", name("int128"), add(name("x"), int(1))),
        &mut ctx,
    )
    .unwrap_err();
    assert_eq!(err.kind_name(), "VariableDeclarationException");
    assert!(err
        .to_string()
        .contains("same variable not allowed on LHS and RHS: x"));
    assert!(ctx.lookup("x").is_none());
}

#[test]
fn test_initializer_referencing_other_variable() {
    let mut ctx = ctx();
    lower(&ann_assign("y", name("int128"), int(2)), &mut ctx).unwrap();
    let node = lower(
        &ann_assign("x", name("int128"), add(name("y"), int(1))),
        &mut ctx,
    )
    .unwrap();
    assert_eq!(node.to_string(), "(mstore 352 (add (mload 320) 1))");
}

#[test]
fn test_bytes32_declaration_needs_exactly_32_bytes() {
    for len in [31, 33] {
        let err = lower(&ann_assign("b", name("bytes32"), bytes(len)), &mut ctx()).unwrap_err();
        assert_eq!(err.kind_name(), "TypeMismatch");
        assert!(err.to_string().contains("String is incorrect length"));
    }

    let mut ctx = ctx();
    let node = lower(&ann_assign("b", name("bytes32"), bytes(32)), &mut ctx).unwrap();
    assert_eq!(node.opcode(), Some(Opcode::MStore));
    assert_eq!(
        node.args[1].literal_value(),
        Some(&bytes_to_int(&[0x61; 32]))
    );
    assert_eq!(ctx.lookup("b").unwrap().typ, Type::base("bytes32"));
}

#[test]
fn test_uint256_declaration_from_negative_literal() {
    let err = lower(&ann_assign("u", name("uint256"), int(-1)), &mut ctx()).unwrap_err();
    assert_eq!(err.kind_name(), "InvalidLiteral");
    assert!(err.to_string().contains("not in uint256 range"));

    let node = lower(&ann_assign("u", name("uint256"), int(7)), &mut ctx()).unwrap();
    assert_eq!(node.args[1].typ, Some(Type::base("uint256")));
}

#[test]
fn test_declaration_type_mismatch() {
    let err = lower(&ann_assign("a", name("address"), int(5)), &mut ctx()).unwrap_err();
    assert!(err.to_string().contains("Invalid type int128, expected: address"));

    let err = lower(
        &ann_assign("xs", sized("int128", 2), int(5)),
        &mut ctx(),
    )
    .unwrap_err();
    assert_eq!(err.kind_name(), "TypeMismatch");
}

#[test]
fn test_declaration_target_and_initializer_shape() {
    let field = common::stmt(StmtKind::AnnAssign {
        target: self_attr("x"),
        annotation: name("int128"),
        value: Some(int(1)),
    });
    let err = lower(&field, &mut ctx()).unwrap_err();
    assert!(err.to_string().contains("May not set type for field x"));

    let uninitialised = common::stmt(StmtKind::AnnAssign {
        target: name("x"),
        annotation: name("int128"),
        value: None,
    });
    let err = lower(&uninitialised, &mut ctx()).unwrap_err();
    assert!(err
        .to_string()
        .contains("New variables must be initialized explicitly"));
}

#[test]
fn test_redeclaration_is_rejected() {
    let mut ctx = ctx();
    lower(&ann_assign("x", name("int128"), int(1)), &mut ctx).unwrap();
    let err = lower(&ann_assign("x", name("int128"), int(2)), &mut ctx).unwrap_err();
    assert_eq!(err.kind_name(), "VariableDeclarationException");
}

#[test]
fn test_list_declaration_copies_elements() {
    let mut ctx = ctx();
    let node = lower(
        &ann_assign("xs", sized("int128", 2), list(vec![int(4), int(5)])),
        &mut ctx,
    )
    .unwrap();
    assert_eq!(
        node.to_string(),
        "(with _L 320 (seq (mstore (add _L 0) 4) (mstore (add _L 32) 5)))"
    );
    assert_eq!(ctx.memory_used(), 384);
}

#[test]
fn test_assignment_to_undeclared_name() {
    let err = lower(&assign(name("x"), int(1)), &mut ctx()).unwrap_err();
    assert_eq!(err.kind_name(), "VariableDeclarationException");
    assert!(err.to_string().contains("Variable type not defined"));
}

#[test]
fn test_assignment_does_not_convert_between_base_types() {
    let mut ctx = ctx();
    lower(&ann_assign("x", name("int128"), int(1)), &mut ctx).unwrap();
    lower(&ann_assign("u", name("uint256"), int(1)), &mut ctx).unwrap();

    let err = lower(&assign(name("x"), name("u")), &mut ctx).unwrap_err();
    assert!(err.to_string().contains("Invalid type uint256, expected: int128"));

    let node = lower(&assign(name("x"), int(9)), &mut ctx).unwrap();
    assert_eq!(node.to_string(), "(mstore 320 9)");
}

#[test]
fn test_tuple_to_tuple_assignment_is_rejected() {
    let err = lower(
        &assign(tuple(vec![name("a"), name("b")]), tuple(vec![int(1), int(2)])),
        &mut ctx(),
    )
    .unwrap_err();
    assert_eq!(err.kind_name(), "StructureException");
}

#[test]
fn test_storage_write_depends_on_constancy() {
    let stmt = assign(self_attr("total"), int(1));

    let mut mutating =
        CompilationContext::new(function("set")).with_global("total", Type::base("uint256"));
    assert_eq!(lower(&stmt, &mut mutating).unwrap().to_string(), "(sstore 0 1)");

    for (constancy, description) in [(Constancy::View, "a view function"), (Constancy::Pure, "a pure function")] {
        let mut ctx = CompilationContext::new(function("get").with_constancy(constancy))
            .with_global("total", Type::base("uint256"));
        let err = lower(&stmt, &mut ctx).unwrap_err();
        assert_eq!(err.kind_name(), "ConstancyViolation");
        assert!(err.to_string().contains(&format!(
            "Cannot modify storage inside {}: self.total",
            description
        )));
    }
}

#[test]
fn test_function_arguments_are_immutable() {
    let mut ctx =
        CompilationContext::new(function("f").with_arg("a", Type::base("int128")));
    let err = lower(&assign(name("a"), int(1)), &mut ctx).unwrap_err();
    assert_eq!(err.kind_name(), "ConstancyViolation");
    assert!(err.to_string().contains("Cannot modify function argument: a"));
}

#[test]
fn test_contract_assignment_needs_cast() {
    let mut ctx = CompilationContext::new(function("f").with_arg("who", Type::base("address")))
        .with_global("token", Type::Contract { name: "Token".into() });
    let err = lower(&assign(self_attr("token"), name("who")), &mut ctx).unwrap_err();
    assert!(err
        .to_string()
        .contains("Contract assignment expects casted address: contract Token(<address_var>)"));
}

#[test]
fn test_aug_assign_memory() {
    let mut ctx = ctx();
    lower(&ann_assign("x", name("int128"), int(1)), &mut ctx).unwrap();
    let node = lower(&aug_assign(name("x"), BinOp::Add, int(2)), &mut ctx).unwrap();
    assert_eq!(
        node.to_string(),
        "(with _mloc 320 (mstore _mloc (add (mload _mloc) 2)))"
    );
    assert_eq!(node.valency, 0);
}

#[test]
fn test_aug_assign_storage() {
    let mut ctx = CompilationContext::new(function("f")).with_global("total", Type::base("uint256"));
    let node = lower(&aug_assign(self_attr("total"), BinOp::Mul, int(3)), &mut ctx).unwrap();
    assert_eq!(
        node.to_string(),
        "(with _stloc 0 (sstore _stloc (mul (sload _stloc) 3)))"
    );
}

#[test]
fn test_aug_assign_rejections() {
    let mut ctx = ctx();
    lower(&ann_assign("x", name("int128"), int(1)), &mut ctx).unwrap();
    lower(
        &ann_assign("xs", sized("int128", 2), list(vec![int(1), int(2)])),
        &mut ctx,
    )
    .unwrap();

    let err = lower(&aug_assign(name("x"), BinOp::Pow, int(2)), &mut ctx).unwrap_err();
    assert!(err.to_string().contains("Unsupported operator for augassign"));

    let err = lower(&aug_assign(name("xs"), BinOp::Add, int(2)), &mut ctx).unwrap_err();
    assert!(err
        .to_string()
        .contains("Can only use aug-assign operators with simple types!"));

    let err = lower(&aug_assign(name("nope"), BinOp::Add, int(2)), &mut ctx).unwrap_err();
    assert_eq!(err.kind_name(), "VariableDeclarationException");
}

#[test]
fn test_aug_assign_result_takes_target_type() {
    let mut ctx = ctx();
    lower(&ann_assign("u", name("uint256"), int(1)), &mut ctx).unwrap();
    let node = lower(&aug_assign(name("u"), BinOp::Sub, int(1)), &mut ctx).unwrap();
    assert_eq!(node.args[2].args[1].typ, Some(Type::base("uint256")));
    assert_eq!(
        node.args[2].args[1].args[1].literal_value(),
        Some(&BigInt::from(1))
    );
}
