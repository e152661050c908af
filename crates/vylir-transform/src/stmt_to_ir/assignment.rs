use super::context::CompilationContext;
use super::interfaces::Collaborators;
use super::setter::{base_type_conversion, make_setter};
use super::type_resolver::TypeResolver;
use tracing::debug;
use vylir_core::values::bytes_to_int;
use vylir_core::{
    BinOp, CompileError, Expr, ExprKind, IrNode, Opcode, Position, Result, StorageClass, Type,
};

pub struct AssignmentBuilder;

impl AssignmentBuilder {
    /// `x: T = value`
    pub fn lower_ann_assign(
        target: &Expr,
        annotation: &Expr,
        value: Option<&Expr>,
        pos: Position,
        ctx: &mut CompilationContext,
        env: &mut dyn Collaborators,
    ) -> Result<IrNode> {
        ctx.with_assignment_scope(|ctx| {
            let typ = env.parse_type(annotation, ctx)?;

            let name = match &target.kind {
                ExprKind::Name(name) => name.clone(),
                ExprKind::Attribute { attr, .. } => {
                    return Err(CompileError::type_mismatch(
                        format!("May not set type for field {}", attr),
                        Some(pos),
                    ));
                }
                other => {
                    return Err(CompileError::structure(
                        format!("Invalid declaration target: {}", other.name()),
                        Some(target.pos),
                    ));
                }
            };

            let value = value.ok_or_else(|| {
                CompileError::structure("New variables must be initialized explicitly", Some(pos))
            })?;

            if value.operand_names().contains(&name.as_str()) {
                return Err(CompileError::variable(
                    format!(
                        "Invalid variable assignment, same variable not allowed on LHS and RHS: {}",
                        name
                    ),
                    Some(pos),
                ));
            }

            let mut sub = env.lower_expr(value, ctx)?;
            if let (ExprKind::Bytes(bytes), Some(Type::ByteArray { maxlen: 32, .. })) =
                (&value.kind, &sub.typ)
            {
                if typ.is_base("bytes32") && sub.typ.as_ref().map_or(false, Type::is_literal) {
                    sub = IrNode::int(bytes_to_int(bytes))
                        .with_type(Type::base("bytes32"))
                        .at(Some(pos));
                }
            }

            TypeResolver::check_valid_assign(&typ, &sub, pos)?;

            let slot = ctx.new_variable(&name, typ.clone(), Some(pos))?;
            debug!(variable = %name, slot, %typ, "declared local");
            let location = IrNode::int(slot)
                .with_type(typ)
                .located(StorageClass::Memory)
                .at(Some(pos));
            make_setter(location, sub, ctx, Some(pos))
        })
    }

    /// `target = value`
    pub fn lower_assign(
        target: &Expr,
        value: &Expr,
        pos: Position,
        ctx: &mut CompilationContext,
        env: &mut dyn Collaborators,
    ) -> Result<IrNode> {
        ctx.with_assignment_scope(|ctx| {
            let sub = env.lower_expr(value, ctx)?;

            if let ExprKind::Name(name) = &target.kind {
                let declared = ctx
                    .lookup(name)
                    .map(|record| record.typ.clone())
                    .ok_or_else(|| CompileError::variable("Variable type not defined", Some(pos)))?;
                TypeResolver::check_implicit_conversion(&declared, &sub, pos)?;
            }

            if matches!(target.kind, ExprKind::Tuple(_)) && matches!(value.kind, ExprKind::Tuple(_)) {
                return Err(CompileError::structure(
                    "Tuple to tuple assignment not supported",
                    Some(pos),
                ));
            }

            let target_node = Self::get_target(target, pos, ctx, env)?;
            if let Some(Type::Contract { .. }) = &target_node.typ {
                if !matches!(sub.typ, Some(Type::Contract { .. })) {
                    let expected = target_node.typ.as_ref().map(Type::to_string).unwrap_or_default();
                    return Err(CompileError::type_mismatch(
                        format!(
                            "Contract assignment expects casted address: {}(<address_var>)",
                            expected
                        ),
                        Some(pos),
                    ));
                }
            }
            Ok(make_setter(target_node, sub, ctx, Some(pos))?.at(Some(pos)))
        })
    }

    /// `target op= value`
    pub fn lower_aug_assign(
        target: &Expr,
        op: BinOp,
        value: &Expr,
        pos: Position,
        ctx: &mut CompilationContext,
        env: &mut dyn Collaborators,
    ) -> Result<IrNode> {
        let target_node = Self::get_target(target, pos, ctx, env)?;
        let sub = env.lower_value_expr(value, ctx)?;

        if !matches!(op, BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod) {
            return Err(CompileError::structure(
                "Unsupported operator for augassign",
                Some(pos),
            ));
        }
        let target_typ = match &target_node.typ {
            Some(t @ Type::Base(_)) => t.clone(),
            _ => {
                return Err(CompileError::type_mismatch(
                    "Can only use aug-assign operators with simple types!",
                    Some(target.pos),
                ));
            }
        };

        let (alias, load, store) = match target_node.location {
            Some(StorageClass::Storage) => ("_stloc", Opcode::SLoad, Opcode::SStore),
            Some(StorageClass::Memory) => ("_mloc", Opcode::MLoad, Opcode::MStore),
            other => {
                return Err(CompileError::panic(format!(
                    "Augmented assignment to unsupported location {:?}",
                    other
                )));
            }
        };

        let current = IrNode::op(load, vec![IrNode::var(alias)])
            .with_type(target_typ.clone())
            .at(target_node.pos);
        let combined = env.lower_arithmetic(current, op, sub, ctx, pos)?;
        let converted = base_type_conversion(combined, &target_typ, Some(pos))?;

        Ok(IrNode::op(
            Opcode::With,
            vec![
                IrNode::var(alias),
                target_node,
                IrNode::op(store, vec![IrNode::var(alias), converted]),
            ],
        )
        .at(Some(pos)))
    }

    /// Resolves an assignment target to a location, refusing targets that an enclosing loop
    /// depends on or that the current scope may not modify.
    pub fn get_target(
        target: &Expr,
        pos: Position,
        ctx: &mut CompilationContext,
        env: &mut dyn Collaborators,
    ) -> Result<IrNode> {
        if ctx.has_locked_lists() {
            let list_name = match &target.kind {
                ExprKind::Subscript { value, .. } => value.dotted_name(),
                ExprKind::Name(_) | ExprKind::Attribute { .. } => target.dotted_name(),
                _ => None,
            };
            if let Some(list_name) = list_name.filter(|name| ctx.is_list_locked(name)) {
                return Err(CompileError::structure(
                    format!("Altering list '{}' which is being iterated!", list_name),
                    Some(pos),
                ));
            }
        }

        if let ExprKind::Name(name) = &target.kind {
            if ctx.is_loop_variable(name) {
                return Err(CompileError::structure(
                    format!("Altering iterator '{}' which is in use!", name),
                    Some(pos),
                ));
            }
        }

        if let ExprKind::Tuple(_) = &target.kind {
            let node = env.lower_expr(target, ctx)?;
            for element in &node.args {
                constancy_checks(element, ctx, pos)?;
            }
            return Ok(node);
        }

        let node = env.lower_variable_location(target, ctx)?;
        constancy_checks(&node, ctx, pos)?;
        Ok(node)
    }
}

pub fn constancy_checks(node: &IrNode, ctx: &CompilationContext, pos: Position) -> Result<()> {
    let annotation = node.annotation.as_deref().unwrap_or("<unknown>");
    if node.location == Some(StorageClass::Storage) && ctx.is_constant() {
        return Err(CompileError::constancy(
            format!("Cannot modify storage inside {}: {}", ctx.pp_constancy(), annotation),
            Some(pos),
        ));
    }
    if !node.mutable {
        return Err(CompileError::constancy(
            format!("Cannot modify function argument: {}", annotation),
            Some(pos),
        ));
    }
    Ok(())
}
