//! Collaborator boundary traits and their minimal-but-real implementations
//!: the parser, symbol table, type checker, code emitter, and
//! error reporter the driver dispatches through.
//!
//! The real versions of these (a full Onyx grammar, type inference, a
//! WebAssembly backend) are explicitly out of scope; what lives here is
//! just enough behavior that the scheduling core under study runs against
//! real text instead of mocks.

mod diagnostic;
mod emit;
mod parser;
mod symbols;
mod typecheck;

pub use diagnostic::{Diagnostic, ErrorReporter, Severity};
pub use emit::{CodeEmitter, EmittedRecord, ModuleBuilder};
pub use parser::{MinimalParser, Parser};
pub use symbols::{IntroduceOutcome, MinimalSymbolTable, SymbolIntroducer, SymbolResolver};
pub use typecheck::{NoopTypeChecker, TypeChecker};
