//! Console command layer: tokenizing, schema binding, the declarative
//! catalog and the session that dispatches lines into the workflow.

pub mod catalog;
pub mod schema;
pub mod scope;
pub mod session;
pub mod tokenizer;

pub use catalog::{catalog, find, CommandKind, CommandSpec, Render};
pub use schema::{bind, BoundArgs, ParamKind, ParamSpec};
pub use scope::CommandScope;
pub use session::{help, Reply, Session};
pub use tokenizer::tokenize;
