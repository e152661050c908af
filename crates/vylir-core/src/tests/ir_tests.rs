use crate::ir::{IrNode, Opcode, StorageClass};
use crate::types::Type;
use pretty_assertions::assert_eq;

#[test]
fn test_store_is_zero_valent() {
    let node = IrNode::op(Opcode::MStore, vec![IrNode::int(320), IrNode::int(5)]);
    assert_eq!(node.valency, 0);
    assert_eq!(node.to_string(), "(mstore 320 5)");
}

#[test]
fn test_seq_takes_last_valency() {
    let stmt = IrNode::op(Opcode::SStore, vec![IrNode::int(0), IrNode::int(1)]);
    let value = IrNode::op(Opcode::SLoad, vec![IrNode::int(0)]);
    assert_eq!(IrNode::seq(vec![stmt.clone(), value]).valency, 1);
    assert_eq!(IrNode::seq(vec![stmt]).valency, 0);
    assert_eq!(IrNode::seq(vec![]).valency, 0);
}

#[test]
fn test_if_valency_depends_on_else_branch() {
    let one_armed = IrNode::op(Opcode::If, vec![IrNode::int(1), IrNode::pass()]);
    assert_eq!(one_armed.valency, 0);
    let both = IrNode::op(
        Opcode::If,
        vec![IrNode::int(1), IrNode::int(2), IrNode::int(3)],
    );
    assert_eq!(both.valency, 1);
}

#[test]
fn test_with_takes_body_valency() {
    let node = IrNode::op(
        Opcode::With,
        vec![
            IrNode::var("_x"),
            IrNode::int(4),
            IrNode::op(Opcode::Add, vec![IrNode::var("_x"), IrNode::int(1)]),
        ],
    );
    assert_eq!(node.valency, 1);
    assert_eq!(node.to_string(), "(with _x 4 (add _x 1))");
}

#[test]
fn test_log_opcode_name() {
    assert_eq!(Opcode::Log(3).name(), "log3");
    assert_eq!(Opcode::Sha3_32.to_string(), "sha3_32");
}

#[test]
fn test_unwrap_location_loads_by_class() {
    let slot = IrNode::int(3)
        .located(StorageClass::Storage)
        .with_type(Type::base("uint256"));
    let loaded = slot.unwrap_location();
    assert!(loaded.is_op(Opcode::SLoad));
    assert_eq!(loaded.typ, Some(Type::base("uint256")));
    assert_eq!(loaded.location, None);

    let plain = IrNode::int(7);
    assert_eq!(plain.clone().unwrap_location(), plain);
}

#[test]
fn test_literal_value() {
    assert_eq!(
        IrNode::int(-4).literal_value().map(|v| v.to_string()),
        Some("-4".to_string())
    );
    assert!(IrNode::pass().literal_value().is_none());
}
