use super::context::CompilationContext;
use super::interfaces::Collaborators;
use super::setter::{make_byte_array_copier, make_return_stmt, make_setter, zero_pad};
use vylir_core::{
    CompileError, Expr, IrNode, IrValue, Opcode, Position, Result, SizeLimits, StorageClass, Type,
};

pub struct ReturnBuilder;

impl ReturnBuilder {
    pub fn lower_return(
        value: Option<&Expr>,
        pos: Position,
        ctx: &mut CompilationContext,
        env: &mut dyn Collaborators,
    ) -> Result<IrNode> {
        let at = Some(pos);
        let Some(return_type) = ctx.return_type().cloned() else {
            if value.is_some() {
                return Err(CompileError::type_mismatch("Not expecting to return a value", at));
            }
            return Ok(make_return_stmt(IrNode::int(0), IrNode::int(0), at));
        };
        let value =
            value.ok_or_else(|| CompileError::type_mismatch("Expecting to return a value", at))?;

        let sub = env.lower_expr(value, ctx)?;
        let sub_typ = sub
            .typ
            .clone()
            .ok_or_else(|| CompileError::type_mismatch("Can't return a value without a type", at))?;

        match &sub_typ {
            Type::Base(_) => Self::return_base(sub.unwrap_location(), &sub_typ, &return_type, value, at),
            Type::ByteArray { .. } => Self::return_byte_array(sub, &sub_typ, &return_type, value, ctx, at),
            Type::List { .. } => Self::return_list(sub, &sub_typ, &return_type, ctx, at),
            Type::Struct { name, .. } => match &return_type {
                Type::Struct { name: expected, .. } if expected == name => {
                    env.encode_tuple_return(sub, ctx, pos)
                }
                _ => Err(CompileError::type_mismatch(
                    format!("Trying to return {}, output expecting {}", sub_typ, return_type),
                    Some(value.pos),
                )),
            },
            Type::Tuple { members } => {
                let Type::Tuple { members: expected } = &return_type else {
                    return Err(CompileError::type_mismatch(
                        format!(
                            "Trying to return tuple type {}, output expecting {}",
                            sub_typ, return_type
                        ),
                        Some(value.pos),
                    ));
                };
                if members.len() != expected.len() {
                    return Err(CompileError::structure("Tuple lengths don't match!", at));
                }
                for (member, expected) in members.iter().zip(expected) {
                    if !member.same_category(expected) {
                        return Err(CompileError::structure(
                            format!(
                                "Tuple return type does not match annotated return. {} != {}",
                                member, expected
                            ),
                            at,
                        ));
                    }
                }
                env.encode_tuple_return(sub, ctx, pos)
            }
            Type::Contract { .. } => Err(CompileError::type_mismatch(
                format!("Can't return type {}", sub_typ),
                at,
            )),
        }
    }

    fn return_word(word: IrNode, at: Option<Position>) -> IrNode {
        IrNode::seq(vec![
            IrNode::op(Opcode::MStore, vec![IrNode::int(0), word]),
            make_return_stmt(IrNode::int(0), IrNode::int(32), None),
        ])
        .at(at)
    }

    fn return_base(
        sub: IrNode,
        sub_typ: &Type,
        return_type: &Type,
        value: &Expr,
        at: Option<Position>,
    ) -> Result<IrNode> {
        let mismatch = || {
            CompileError::type_mismatch(
                format!(
                    "Trying to return base type {}, output expecting {}",
                    sub_typ, return_type
                ),
                Some(value.pos),
            )
        };
        let (Some(from), Some(to)) = (sub_typ.as_base(), return_type.as_base()) else {
            return Err(mismatch());
        };

        if from.is_literal {
            if from.name == to.name || (from.is_integer() && to.is_integer()) {
                if let Some(v) = sub.literal_value() {
                    if SizeLimits::bounds(&to.name).is_some() && !SizeLimits::in_bounds(&to.name, v)
                    {
                        return Err(CompileError::invalid_literal(
                            format!("Number out of range: {}", v),
                            at,
                        ));
                    }
                }
                return Ok(Self::return_word(sub, at));
            }
            return Err(mismatch());
        }

        if from.name == to.name || (from.name == "int128" && to.name == "int256") {
            return Ok(Self::return_word(sub, at));
        }
        Err(CompileError::type_mismatch(
            format!("Unsupported type conversion: {} to {}", sub_typ, return_type),
            Some(value.pos),
        ))
    }

    fn return_byte_array(
        sub: IrNode,
        sub_typ: &Type,
        return_type: &Type,
        value: &Expr,
        ctx: &mut CompilationContext,
        at: Option<Position>,
    ) -> Result<IrNode> {
        if !sub_typ.eq_base(return_type) {
            return Err(CompileError::type_mismatch(
                format!(
                    "Trying to return base type {}, output expecting {}",
                    sub_typ, return_type
                ),
                Some(value.pos),
            ));
        }
        let (Some(maxlen), Some(expected)) =
            (sub_typ.byte_array_maxlen(), return_type.byte_array_maxlen())
        else {
            return Err(CompileError::panic("Byte array return without a max length"));
        };
        if maxlen > expected {
            return Err(CompileError::type_mismatch(
                format!(
                    "Cannot cast from greater max-length {} to shorter max-length {}",
                    maxlen, expected
                ),
                Some(value.pos),
            ));
        }

        // The offset word and the bytes must stay adjacent.
        let len_slot = ctx.new_placeholder(&Type::base("uint256"));
        let bytez_slot = ctx.new_placeholder(sub_typ);

        if sub.location.is_none() {
            return Err(CompileError::panic("Invalid location for byte array return: unlocated value"));
        }

        let dest = IrNode::int(bytez_slot)
            .with_type(sub_typ.clone())
            .located(StorageClass::Memory);
        let size = IrNode::op(
            Opcode::Ceil32,
            vec![IrNode::op(
                Opcode::Add,
                vec![
                    IrNode::op(Opcode::MLoad, vec![IrNode::int(bytez_slot)]),
                    IrNode::int(64),
                ],
            )],
        );
        Ok(IrNode::seq(vec![
            make_byte_array_copier(dest, sub, ctx, at)?,
            zero_pad(bytez_slot),
            IrNode::op(Opcode::MStore, vec![IrNode::int(len_slot), IrNode::int(32)]),
            make_return_stmt(IrNode::int(len_slot), size, None),
        ])
        .at(at))
    }

    fn return_list(
        sub: IrNode,
        sub_typ: &Type,
        return_type: &Type,
        ctx: &mut CompilationContext,
        at: Option<Position>,
    ) -> Result<IrNode> {
        if !sub_typ.same_as(return_type) {
            return Err(CompileError::type_mismatch(
                format!(
                    "List return type {} does not match specified return type, expecting {}",
                    sub_typ, return_type
                ),
                at,
            ));
        }
        let size = IrNode::int(return_type.size_in_bytes());

        let is_multi = matches!(sub.value, IrValue::Op(Opcode::Multi));
        if sub.location == Some(StorageClass::Memory) && !is_multi {
            return Ok(make_return_stmt(sub, size, at));
        }

        let placeholder = ctx.new_placeholder(return_type);
        let target = IrNode::int(placeholder)
            .with_type(return_type.clone())
            .located(StorageClass::Memory);
        let setter = make_setter(target, sub, ctx, at)?;
        Ok(IrNode::seq(vec![
            setter,
            make_return_stmt(IrNode::int(placeholder), size, None),
        ])
        .at(at))
    }
}
