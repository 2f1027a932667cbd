//! Abstract syntax tree produced by the [`Parser`](crate::parser::Parser) and
//! consumed by the resolver and the interpreter.
//!
//! Nodes own their data (names are copied out of the borrowed token stream)
//! so a program's functions can outlive the source text they came from, which
//! the interactive prompt relies on.

use std::rc::Rc;

use crate::token::{Token, TokenType};

/// Identity of an expression node that the resolver may annotate.
///
/// Assigned once by the parser from a per‑session counter; two textually
/// identical references at different places get different ids.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ExprId(pub usize);

/// A name as written in the source: variables, properties, parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub line: usize,
}

impl From<&Token<'_>> for Ident {
    fn from(token: &Token<'_>) -> Self {
        Ident {
            name: token.lexeme.to_string(),
            line: token.line,
        }
    }
}

/// An operator token kept for dispatch and error locations.
#[derive(Debug, Clone, PartialEq)]
pub struct Operator {
    pub kind: TokenType,
    pub lexeme: String,
    pub line: usize,
}

impl From<&Token<'_>> for Operator {
    fn from(token: &Token<'_>) -> Self {
        Operator {
            kind: token.token_type.clone(),
            lexeme: token.lexeme.to_string(),
            line: token.line,
        }
    }
}

/// A **literal constant** that appears directly in the source code.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Numeric literal, always an IEEE‑754 `f64`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    True,

    False,

    Null,
}

/// Every kind of *expression*.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal constant: number, string, `true`, `false`, or `null`.
    Literal(LiteralValue),

    /// Prefix `!` or `-`.
    Unary {
        operator: Operator,
        right: Box<Expr>,
    },

    /// Arithmetic, comparison and equality operators.
    Binary {
        left: Box<Expr>,
        operator: Operator,
        right: Box<Expr>,
    },

    /// `&&` / `||`. Both sides are always evaluated.
    Logical {
        left: Box<Expr>,
        operator: Operator,
        right: Box<Expr>,
    },

    /// `condition ? then_branch : else_branch`
    Ternary {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    /// Parenthesised sub‑expression.
    Grouping(Box<Expr>),

    /// Variable access.
    Variable { id: ExprId, name: Ident },

    /// `name = value`
    Assign {
        id: ExprId,
        name: Ident,
        value: Box<Expr>,
    },

    /// `name op= value`, `name++` and `name--` (the latter two carry a
    /// synthesized literal `1` as `value`).
    IncDec {
        id: ExprId,
        name: Ident,
        operator: Operator,
        value: Box<Expr>,
    },

    /// `[a, b, c]`
    ArrayLiteral(Vec<Expr>),

    /// Function, method or constructor call.
    Call {
        callee: Box<Expr>,
        /// Line of the closing `)`, used for runtime error locations.
        paren: usize,
        arguments: Vec<Expr>,
    },

    /// object.property
    Get { object: Box<Expr>, name: Ident },

    /// target[index]
    ArrayGet {
        target: Box<Expr>,
        /// Line of the closing `]`.
        bracket: usize,
        index: Box<Expr>,
    },

    /// object.property = value
    Set {
        object: Box<Expr>,
        name: Ident,
        value: Box<Expr>,
    },

    /// The `this` keyword inside a method.
    This { id: ExprId, line: usize },
}

/// A function or method declaration. Shared between the AST and every
/// function value created from it.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Ident,

    /// Parameter names (arity ≤ 255 is a soft limit enforced by the parser).
    pub params: Vec<Ident>,

    pub body: Vec<Stmt>,
}

/// Every kind of *statement*. A program is a `Vec<Stmt>`.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Stand‑alone expression terminated by a semicolon.
    Expression(Expr),

    /// `print` statement used for output.
    Print(Expr),

    /// `var IDENT ("=" initializer)? ";"`
    Var {
        name: Ident,
        initializer: Option<Expr>,
    },

    /// Braced scope containing zero or more declarations/statements.
    Block(Vec<Stmt>),

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// `while` loop; `for` loops are desugared into this.
    While { condition: Expr, body: Box<Stmt> },

    Function(Rc<FunctionDecl>),

    Class {
        name: Ident,
        methods: Vec<Rc<FunctionDecl>>,
    },

    Return {
        /// Line of the `return` keyword.
        keyword: usize,

        /// Absent ⇒ `null` is returned.
        value: Option<Expr>,
    },
}
