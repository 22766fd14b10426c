/// AST (Abstract Syntax Tree) module
/// Contains all definitions related to the AST structure
///
/// Submodules:
/// - ast: Declarations and the declaration arena
/// - expressions: Expression nodes
/// - statements: Statement nodes, blocks and variables
/// - types: Type descriptors
pub mod ast;
pub mod expressions;
pub mod statements;
pub mod types;
