use super::context::CompilationContext;
use vylir_core::{
    CompileError, IrNode, Opcode, Position, Result, SizeLimits, StorageClass, Type,
};

/// Copies `right` into the location described by `left`.
pub fn make_setter(
    left: IrNode,
    right: IrNode,
    ctx: &mut CompilationContext,
    pos: Option<Position>,
) -> Result<IrNode> {
    let left_typ = left
        .typ
        .clone()
        .ok_or_else(|| CompileError::panic("Assignment target has no type"))?;
    let location = left
        .location
        .ok_or_else(|| CompileError::panic(format!("Assignment target {} has no location", left)))?;

    match &left_typ {
        Type::Base(_) | Type::Contract { .. } => {
            let value = base_type_conversion(right.unwrap_location(), &left_typ, pos)?;
            let store = match location {
                StorageClass::Memory => Opcode::MStore,
                StorageClass::Storage => Opcode::SStore,
                StorageClass::Calldata => {
                    return Err(CompileError::panic("Cannot write to calldata"));
                }
            };
            Ok(IrNode::op(store, vec![left, value]).at(pos))
        }
        Type::ByteArray { .. } => make_byte_array_copier(left, right, ctx, pos),
        Type::List { .. } | Type::Struct { .. } | Type::Tuple { .. } => {
            make_aggregate_setter(left, left_typ, location, right, ctx, pos)
        }
    }
}

fn element_types(typ: &Type) -> Vec<Type> {
    match typ {
        Type::List { subtype, count } => vec![(**subtype).clone(); *count],
        Type::Struct { members, .. } => members.values().cloned().collect(),
        Type::Tuple { members } => members.clone(),
        _ => Vec::new(),
    }
}

/// Address of element `index` of the aggregate bound to `alias`.
fn element_location(
    alias: &str,
    element_types: &[Type],
    index: usize,
    location: StorageClass,
) -> IrNode {
    let base = IrNode::var(alias);
    let address = match location {
        StorageClass::Storage => IrNode::op(
            Opcode::Add,
            vec![IrNode::op(Opcode::Sha3_32, vec![base]), IrNode::int(index)],
        ),
        StorageClass::Memory | StorageClass::Calldata => {
            let offset: usize = element_types[..index].iter().map(Type::size_in_bytes).sum();
            IrNode::op(Opcode::Add, vec![base, IrNode::int(offset)])
        }
    };
    address
        .with_type(element_types[index].clone())
        .located(location)
}

fn make_aggregate_setter(
    left: IrNode,
    left_typ: Type,
    location: StorageClass,
    right: IrNode,
    ctx: &mut CompilationContext,
    pos: Option<Position>,
) -> Result<IrNode> {
    let targets = element_types(&left_typ);

    let setters = if right.is_op(Opcode::Multi) {
        if right.args.len() != targets.len() {
            return Err(CompileError::type_mismatch("Mismatched number of elements", pos));
        }
        let mut setters = Vec::with_capacity(targets.len());
        for (index, value) in right.args.into_iter().enumerate() {
            let target = element_location("_L", &targets, index, location);
            setters.push(make_setter(target, value, ctx, pos)?);
        }
        IrNode::seq(setters)
    } else {
        let right_typ = right
            .typ
            .clone()
            .ok_or_else(|| CompileError::type_mismatch("Cannot assign a value without a type", pos))?;
        if !left_typ.same_category(&right_typ) {
            return Err(CompileError::type_mismatch(
                format!(
                    "Setter type mismatch: left side is {}, right side is {}",
                    left_typ, right_typ
                ),
                pos,
            ));
        }
        let sources = element_types(&right_typ);
        if sources.len() != targets.len() {
            return Err(CompileError::type_mismatch("Mismatched number of elements", pos));
        }
        if let (Type::Struct { name: l, .. }, Type::Struct { name: r, .. }) = (&left_typ, &right_typ) {
            if l != r {
                return Err(CompileError::type_mismatch(
                    format!("Cannot assign struct {} to struct {}", r, l),
                    pos,
                ));
            }
        }
        let source_location = right.location.ok_or_else(|| {
            CompileError::panic(format!("Cannot copy unlocated {} value", right_typ))
        })?;

        let mut setters = Vec::with_capacity(targets.len());
        for index in 0..targets.len() {
            let target = element_location("_L", &targets, index, location);
            let source = element_location("_R", &sources, index, source_location);
            setters.push(make_setter(target, source, ctx, pos)?);
        }
        IrNode::op(
            Opcode::With,
            vec![IrNode::var("_R"), right, IrNode::seq(setters)],
        )
    };

    Ok(IrNode::op(Opcode::With, vec![IrNode::var("_L"), left, setters]).at(pos))
}

fn word_address(alias: &str, index_slot: usize, location: StorageClass) -> IrNode {
    let index = IrNode::op(Opcode::MLoad, vec![IrNode::int(index_slot)]);
    match location {
        StorageClass::Storage => IrNode::op(
            Opcode::Add,
            vec![IrNode::op(Opcode::Sha3_32, vec![IrNode::var(alias)]), index],
        ),
        StorageClass::Memory | StorageClass::Calldata => IrNode::op(
            Opcode::Add,
            vec![
                IrNode::var(alias),
                IrNode::op(Opcode::Mul, vec![IrNode::int(32), index]),
            ],
        ),
    }
}

/// Copies a length-prefixed byte array between locations.
pub fn make_byte_array_copier(
    dest: IrNode,
    src: IrNode,
    ctx: &mut CompilationContext,
    pos: Option<Position>,
) -> Result<IrNode> {
    let dest_max = dest
        .typ
        .as_ref()
        .and_then(Type::byte_array_maxlen)
        .ok_or_else(|| CompileError::panic("Byte array copy into a non byte array"))?;
    let src_typ = src
        .typ
        .clone()
        .ok_or_else(|| CompileError::type_mismatch("Cannot copy a value without a type", pos))?;
    let src_max = src_typ.byte_array_maxlen().ok_or_else(|| {
        CompileError::type_mismatch(
            format!("Cannot cast from {} to {}", src_typ, Type::bytes(dest_max)),
            pos,
        )
    })?;
    if src_max > dest_max {
        return Err(CompileError::type_mismatch(
            format!(
                "Cannot cast from greater max-length {} to shorter max-length {}",
                src_max, dest_max
            ),
            pos,
        ));
    }

    let src_location = src
        .location
        .ok_or_else(|| CompileError::panic("Cannot copy byte array from an unlocated value"))?;
    let dest_location = dest
        .location
        .ok_or_else(|| CompileError::panic("Cannot copy byte array to an unlocated target"))?;

    let copy = match (src_location, dest_location) {
        (_, StorageClass::Calldata) => {
            return Err(CompileError::panic("Cannot write to calldata"));
        }
        (StorageClass::Memory, StorageClass::Memory) => IrNode::op(
            Opcode::MCopy,
            vec![
                dest,
                IrNode::var("_src"),
                length_with_prefix(Opcode::MLoad),
            ],
        ),
        (StorageClass::Calldata, StorageClass::Memory) => IrNode::op(
            Opcode::CalldataCopy,
            vec![
                dest,
                IrNode::var("_src"),
                length_with_prefix(Opcode::CalldataLoad),
            ],
        ),
        (StorageClass::Calldata, StorageClass::Storage) => {
            return Err(CompileError::panic(
                "Byte arrays must be copied from calldata to memory before storage",
            ));
        }
        (_, StorageClass::Memory | StorageClass::Storage) => {
            let index_slot = ctx.new_placeholder(&Type::base("uint256"));
            let load = match src_location {
                StorageClass::Storage => Opcode::SLoad,
                _ => Opcode::MLoad,
            };
            let store = match dest_location {
                StorageClass::Storage => Opcode::SStore,
                _ => Opcode::MStore,
            };
            let word = IrNode::op(
                store,
                vec![
                    word_address("_dst", index_slot, dest_location),
                    IrNode::op(load, vec![word_address("_src", index_slot, src_location)]),
                ],
            );
            let rounds = src_typ.size_in_words();
            IrNode::op(
                Opcode::With,
                vec![
                    IrNode::var("_dst"),
                    dest,
                    IrNode::op(
                        Opcode::Repeat,
                        vec![IrNode::int(index_slot), IrNode::int(0), IrNode::int(rounds), word],
                    ),
                ],
            )
        }
    };

    Ok(IrNode::op(Opcode::With, vec![IrNode::var("_src"), src, copy]).at(pos))
}

fn length_with_prefix(load: Opcode) -> IrNode {
    IrNode::op(
        Opcode::Add,
        vec![IrNode::int(32), IrNode::op(load, vec![IrNode::var("_src")])],
    )
}

/// Zeroes the bytes between the end of the byte array at `placeholder` and the next word
/// boundary.
pub fn zero_pad(placeholder: usize) -> IrNode {
    let dst = IrNode::op(
        Opcode::Add,
        vec![
            IrNode::op(Opcode::Add, vec![IrNode::int(placeholder), IrNode::int(32)]),
            IrNode::var("_len"),
        ],
    );
    let padding = IrNode::op(
        Opcode::Sub,
        vec![
            IrNode::op(Opcode::Ceil32, vec![IrNode::var("_len")]),
            IrNode::var("_len"),
        ],
    );
    IrNode::op(
        Opcode::With,
        vec![
            IrNode::var("_len"),
            IrNode::op(Opcode::MLoad, vec![IrNode::int(placeholder)]),
            IrNode::op(
                Opcode::With,
                vec![
                    IrNode::var("_dst"),
                    dst,
                    IrNode::op(
                        Opcode::CalldataCopy,
                        vec![
                            IrNode::var("_dst"),
                            IrNode::op(Opcode::CalldataSize, Vec::new()),
                            padding,
                        ],
                    ),
                ],
            ),
        ],
    )
}

/// Converts a value between base types, checking literal bounds.
pub fn base_type_conversion(node: IrNode, to: &Type, pos: Option<Position>) -> Result<IrNode> {
    let from = node
        .typ
        .clone()
        .ok_or_else(|| CompileError::type_mismatch(format!("Value has no type, expected {}", to), pos))?;

    if let (Some(base), Some(value)) = (from.as_base(), node.literal_value()) {
        if base.is_literal
            && SizeLimits::bounds(&base.name).is_some()
            && !SizeLimits::in_bounds(&base.name, value)
        {
            return Err(CompileError::invalid_literal(
                format!("Number out of range: {}", value),
                pos,
            ));
        }
    }

    match (&from, to) {
        (Type::Contract { .. }, Type::Contract { .. }) => Ok(node.with_type(to.clone())),
        (Type::Contract { .. }, Type::Base(b)) if b.name == "address" => {
            Ok(node.with_type(to.clone()))
        }
        (Type::Base(f), Type::Base(t)) if f.name == t.name => Ok(node.with_type(to.clone())),
        (Type::Base(f), Type::Base(t)) if f.is_literal && f.is_integer() && t.is_integer() => {
            match node.literal_value() {
                Some(value) if SizeLimits::in_bounds(&t.name, value) => {
                    Ok(node.with_type(to.clone()))
                }
                Some(value) => Err(CompileError::invalid_literal(
                    format!("Number out of range: {}", value),
                    pos,
                )),
                None => Ok(node.with_type(to.clone())),
            }
        }
        (Type::Base(f), Type::Base(t)) if f.name == "int128" && t.name == "decimal" => Ok(
            IrNode::op(Opcode::Mul, vec![node, IrNode::int(10_000_000_000u64)])
                .with_type(to.clone())
                .at(pos),
        ),
        (Type::Base(f), Type::Base(t)) => Err(CompileError::type_mismatch(
            format!("Typecasting from base type {} to {} unavailable", f.name, t.name),
            pos,
        )),
        _ => Err(CompileError::type_mismatch(
            format!("Base type conversion from or to non-base type: {} to {}", from, to),
            pos,
        )),
    }
}

pub fn make_return_stmt(start: IrNode, size: IrNode, pos: Option<Position>) -> IrNode {
    IrNode::op(Opcode::Return, vec![start, size]).at(pos)
}
