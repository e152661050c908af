use crate::config::EmitterConfig;
use crate::emitter::{EmitContext, EmitHelper, EmitResult, Emitter};
use anyhow::Result;
use std::io::Write;
use vylir_core::{IrNode, IrValue, Opcode};

/// Prints IR trees as s-expressions. A node stays on one line when it fits the configured width;
/// otherwise its head opens a block, each argument goes on its own indented line and a lone `)`
/// closes it.
pub struct IrEmitter {
    config: EmitterConfig,
}

impl IrEmitter {
    pub fn new() -> Self {
        Self::with_config(EmitterConfig::default())
    }

    pub fn with_config(config: EmitterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    /// Writes a lowered function body under a `; function <name>` header.
    pub fn emit_function<W: Write>(
        &self,
        name: &str,
        body: &IrNode,
        writer: &mut W,
    ) -> EmitResult {
        let mut context = EmitContext::from_config(&self.config);
        EmitHelper::write_comment(writer, &context, &format!("function {}", name))?;
        self.emit(body, writer, &mut context)
    }

    pub fn to_json(&self, node: &IrNode) -> Result<String> {
        Ok(serde_json::to_string_pretty(node)?)
    }

    fn emit_node<W: Write>(
        &self,
        node: &IrNode,
        writer: &mut W,
        context: &mut EmitContext,
    ) -> EmitResult {
        let fits = node.args.is_empty()
            || context
                .remaining_width()
                .map_or(true, |width| self.render(node, None).chars().count() <= width);
        if fits {
            let line = self.render(node, Some(context));
            return EmitHelper::write_line(writer, context, &line);
        }

        EmitHelper::write_line(writer, context, &format!("({}", self.head(node, Some(context))))?;
        context.indent();
        for arg in &node.args {
            self.emit_node(arg, writer, context)?;
        }
        context.dedent();
        EmitHelper::write_line(writer, context, &format!("){}", self.suffix(node)))
    }

    /// One-line form of `node`; coloured when a context with colours enabled is given.
    fn render(&self, node: &IrNode, context: Option<&EmitContext>) -> String {
        let head = self.head(node, context);
        if node.args.is_empty() {
            return format!("{}{}", head, self.suffix(node));
        }
        let args = node
            .args
            .iter()
            .map(|arg| self.render(arg, context))
            .collect::<Vec<_>>()
            .join(" ");
        format!("({} {}){}", head, args, self.suffix(node))
    }

    fn head(&self, node: &IrNode, context: Option<&EmitContext>) -> String {
        let (text, color) = match &node.value {
            IrValue::Int(v) => (v.to_string(), "cyan"),
            IrValue::Var(name) => (name.clone(), "magenta"),
            IrValue::Op(op) => (op.name(), opcode_color(*op)),
        };
        match context {
            Some(ctx) => EmitHelper::colorize(ctx, &text, color),
            None => text,
        }
    }

    fn suffix(&self, node: &IrNode) -> String {
        let mut suffix = String::new();
        if self.config.include_types {
            if let Some(typ) = &node.typ {
                suffix.push_str(&format!(":{}", typ));
            }
        }
        if self.config.include_positions {
            if let Some(pos) = &node.pos {
                suffix.push_str(&format!("@{}:{}", pos.line, pos.column));
            }
        }
        suffix
    }
}

impl Default for IrEmitter {
    fn default() -> Self {
        Self::new()
    }
}

fn opcode_color(op: Opcode) -> &'static str {
    match op {
        Opcode::Seq
        | Opcode::If
        | Opcode::Repeat
        | Opcode::With
        | Opcode::Pass
        | Opcode::Break
        | Opcode::Continue => "blue",
        Opcode::SLoad | Opcode::SStore => "yellow",
        Opcode::Assert
        | Opcode::AssertReason
        | Opcode::AssertUnreachable
        | Opcode::Return
        | Opcode::Revert
        | Opcode::Debugger => "red",
        Opcode::Log(_) => "green",
        _ => "",
    }
}

impl Emitter for IrEmitter {
    type Item = IrNode;

    fn emit<W: Write>(
        &self,
        item: &IrNode,
        writer: &mut W,
        context: &mut EmitContext,
    ) -> EmitResult {
        self.emit_node(item, writer, context)
    }

    fn emit_to_string(&self, item: &IrNode) -> Result<String> {
        let mut buffer = Vec::new();
        let mut context = EmitContext::from_config(&self.config);
        self.emit(item, &mut buffer, &mut context)?;
        Ok(String::from_utf8(buffer)?)
    }
}
