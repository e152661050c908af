/*! Turn IR trees back into readable text.
 *
 * Lowered function bodies are deeply nested; reading them as one long s-expression is painful when
 * debugging a lowering rule. The emitter breaks wide nodes over indented lines, can annotate nodes
 * with their types and source positions, and offers a JSON dump for tooling.
 */

pub mod config;
pub mod emitter;
pub mod ir_emitter;

pub use config::{EmitterConfig, IndentStyle};
pub use emitter::{EmitContext, EmitHelper, EmitResult, Emitter};
pub use ir_emitter::IrEmitter;
