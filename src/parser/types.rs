//! A traversal AST: enough structure to visit every subexpression of a
//! module, without the evaluation detail an interpreter would need. Operator
//! identity in particular is deliberately dropped — chains of binary, boolean
//! and comparison operators collapse into a flat operand list.

use crate::domain::ModuleName;

pub type Ast = Vec<Statement>;

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Expression(Expr),
    /// Covers single, chained (`a = b = v`) and unpacking (`a, b = v`)
    /// assignments; each chained position contributes one target.
    Assign {
        targets: Vec<Expr>,
        value: Expr,
    },
    AugAssign {
        target: Expr,
        value: Expr,
    },
    AnnAssign {
        target: Expr,
        annotation: Expr,
        value: Option<Expr>,
    },
    Import(Vec<ImportItem>),
    FromImport {
        path: ImportPath,
        names: FromImportNames,
    },
    FunctionDef {
        name: String,
        defaults: Vec<Expr>,
        body: Ast,
        decorators: Vec<Expr>,
        is_async: bool,
    },
    ClassDef {
        name: String,
        bases: Vec<Expr>,
        decorators: Vec<Expr>,
        body: Ast,
    },
    If {
        branches: Vec<ConditionalBlock>,
        else_block: Option<Ast>,
    },
    While {
        condition: Expr,
        body: Ast,
        else_block: Option<Ast>,
    },
    For {
        target: Expr,
        iterable: Expr,
        body: Ast,
        else_block: Option<Ast>,
    },
    Try {
        body: Ast,
        handlers: Vec<ExceptHandler>,
        else_block: Option<Ast>,
        finally_block: Option<Ast>,
    },
    With {
        items: Vec<WithItem>,
        body: Ast,
    },
    Return(Option<Expr>),
    Raise {
        exception: Option<Expr>,
        cause: Option<Expr>,
    },
    Delete(Vec<Expr>),
    Assert {
        test: Expr,
        message: Option<Expr>,
    },
    Global(Vec<String>),
    Nonlocal(Vec<String>),
    Pass,
    Break,
    Continue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalBlock {
    pub condition: Expr,
    pub body: Ast,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportItem {
    pub module: ModuleName,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportPath {
    Absolute(ModuleName),
    /// `levels` counts leading dots; the tail may be empty
    /// (`from . import x`).
    Relative(usize, ModuleName),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FromImportNames {
    Star,
    List(Vec<FromImportItem>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FromImportItem {
    pub name: String,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExceptHandler {
    pub exception: Option<Expr>,
    pub body: Ast,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WithItem {
    pub context: Expr,
    pub target: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Name(String),
    None,
    Ellipsis,
    Boolean(bool),
    Number(String),
    StringLiteral(String),
    BytesLiteral(String),
    /// Raw f-string body; embedded expressions stay opaque.
    FString(String),
    Tuple(Vec<Expr>),
    List(Vec<Expr>),
    Set(Vec<Expr>),
    Dict(Vec<DictItem>),
    Attribute {
        object: Box<Expr>,
        attr: String,
    },
    Subscript {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Slice {
        start: Option<Box<Expr>>,
        stop: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        kwargs: Vec<KeywordArg>,
    },
    Unary(Box<Expr>),
    /// A flat chain of operands joined by binary/boolean/comparison
    /// operators; always two or more operands.
    Operation(Vec<Expr>),
    Ternary {
        condition: Box<Expr>,
        if_value: Box<Expr>,
        else_value: Box<Expr>,
    },
    /// Only the body survives parsing; parameter defaults are consumed and
    /// dropped, mirroring how usage is collected.
    Lambda(Box<Expr>),
    ListComprehension {
        body: Box<Expr>,
        clauses: Vec<ForClause>,
    },
    SetComprehension {
        body: Box<Expr>,
        clauses: Vec<ForClause>,
    },
    DictComprehension {
        key_body: Box<Expr>,
        value_body: Box<Expr>,
        clauses: Vec<ForClause>,
    },
    GeneratorComprehension {
        body: Box<Expr>,
        clauses: Vec<ForClause>,
    },
    Starred(Box<Expr>),
    Await(Box<Expr>),
    Yield(Option<Box<Expr>>),
    YieldFrom(Box<Expr>),
    Walrus {
        target: String,
        value: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeywordArg {
    /// `None` for `**kwargs` unpacking.
    pub name: Option<String>,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DictItem {
    Pair(Expr, Expr),
    Unpack(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForClause {
    pub target: Expr,
    pub iterable: Expr,
    pub conditions: Vec<Expr>,
}
