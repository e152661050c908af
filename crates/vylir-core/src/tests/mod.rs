/*! Test coverage for the shared front-end vocabulary.
 *
 * Types decide assignment and return compatibility, IR valency decides whether a lowered statement
 * is well formed, and the AST helpers drive loop and self-reference checks. Regressions here show up
 * as confusing failures far downstream, so each piece is pinned down on its own.
 */

#![allow(unused_imports)]

mod ir_tests;
