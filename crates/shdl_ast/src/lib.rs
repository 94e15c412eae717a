//! Lexer, token types, and parser producing the Expanded-SHDL AST.

#![warn(missing_docs)]

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::{
    ComponentDef, ConnectBlock, ConnectItem, Connection, Constant, Expr, GenBodyItem, Generator,
    IndexSpec, Import, InstanceDecl, Item, Module, Port, RangeSpec, SignalRef, TemplatedIdent,
};
pub use lexer::lex;
pub use parser::parse_module;
pub use token::{lookup_keyword, Token, TokenKind};
