/*! Single entry point for the vylir front end.
 *
 * Pre-parse raw contract source, lower function bodies to IR, and print the result, all from one
 * import.
 */

pub use vylir_core as core;
pub use vylir_emit as emit;
pub use vylir_parser as parser;
pub use vylir_transform as transform;

pub use vylir_core::{CompileError, IrNode, Opcode, Position, Result, StorageClass, Type};

pub use vylir_emit::{EmitterConfig, IrEmitter};

pub use vylir_parser::{pre_parse, EntityKind, PreParseOutput, PreParserConfig};

pub use vylir_transform::{lower_body, lower_statement, CompilationContext, FunctionInfo};
