use num_bigint::BigInt;
use vylir_core::{CompileError, IrNode, Position, Result, SizeLimits, Type};

pub struct TypeResolver;

impl TypeResolver {
    pub fn is_bool_expr(node: &IrNode) -> bool {
        node.typ.as_ref().map_or(false, |t| t.is_base("bool"))
    }

    /// Checks an initializer against the declared type of a new variable. The rules apply in
    /// order and the first one matching the declared type decides.
    pub fn check_valid_assign(target: &Type, sub: &IrNode, pos: Position) -> Result<()> {
        let pos = Some(pos);
        let mismatch = |message: String| Err(CompileError::type_mismatch(message, pos));

        if target.is_base("bytes32") {
            return match &sub.typ {
                Some(Type::ByteArray { maxlen: 32, .. }) => Ok(()),
                Some(Type::ByteArray { .. }) => {
                    mismatch("Invalid type, expected: bytes32. String is incorrect length.".into())
                }
                Some(t) if t.is_base("bytes32") => Ok(()),
                _ => mismatch("Invalid type, expected: bytes32".into()),
            };
        }

        if target.is_list_like() || target.is_byte_array() {
            return match &sub.typ {
                Some(t) if t.is_list_like() || t.is_byte_array() => Ok(()),
                Some(t) => mismatch(format!("Invalid type, expected: {}, got: {}", target, t)),
                None => mismatch(format!("Invalid type, expected: {}, got: None", target)),
            };
        }

        let Some(source) = &sub.typ else {
            return mismatch(format!("Invalid type, expected {}", target));
        };

        if let Type::Struct { name, .. } = source {
            return match target {
                Type::Struct { name: expected, .. } if expected == name => Ok(()),
                _ => mismatch(format!("Invalid type, expected {}", target)),
            };
        }

        if target.is_base("uint256") && source.is_base("int128") && source.is_literal() {
            return match sub.literal_value() {
                Some(value) if SizeLimits::in_bounds("uint256", value) => Ok(()),
                _ => Err(CompileError::invalid_literal(
                    "Invalid uint256 assignment, value not in uint256 range.",
                    pos,
                )),
            };
        }

        let compatible = match (target, source) {
            (Type::Base(t), Type::Base(s)) => t.name == s.name,
            (t, s) => t.same_as(s),
        };
        if !compatible {
            return mismatch(format!("Invalid type {}, expected: {}", source, target));
        }
        Ok(())
    }

    /// Plain assignment to a declared name never converts between distinct base types unless the
    /// source is a literal.
    pub fn check_implicit_conversion(target: &Type, sub: &IrNode, pos: Position) -> Result<()> {
        if let (Some(t), Some(Type::Base(s))) = (target.as_base(), &sub.typ) {
            if !s.is_literal && s.name != t.name {
                return Err(CompileError::type_mismatch(
                    format!("Invalid type {}, expected: {}", s.name, t.name),
                    Some(pos),
                ));
            }
        }
        Ok(())
    }

    /// The value of a literal `uint256` or `int128` node usable as a range bound.
    pub fn range_constant(node: &IrNode) -> Option<BigInt> {
        let base = node.typ.as_ref()?.as_base()?;
        if !base.is_literal || !matches!(base.name.as_str(), "uint256" | "int128") {
            return None;
        }
        node.literal_value().cloned()
    }
}
