/*! Lexical pre-parsing of contract source text.
 *
 * Contract sources are almost, but not quite, host-parseable: they declare `contract` and `struct`
 * entities, carry a `@version` pragma and may list functions in `unlock [...]` directives. The
 * pre-parser tokenizes the source, validates what can be checked at token level, and rewrites the
 * text into a form the host parser accepts, returning the out-of-grammar metadata on the side.
 */

pub mod config;
pub mod pre_parser;
pub mod tokens;

pub use config::{EntityKind, PreParserConfig};
pub use pre_parser::{pre_parse, pre_parse_with_config, validate_version_pragma, PreParseOutput};
pub use tokens::{tokenize, Token, TokenKind};
