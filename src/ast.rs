//! Abstract Syntax Tree for the monk Scripting Language
//!
//! Every node carries the `Token` that begins the construct it represents,
//! satisfying the `token_literal()` contract used for diagnostics: a node's
//! literal is always the literal of that originating token. Statements and
//! expressions are split into two enums; a `Program` is simply an ordered
//! sequence of statements.

use crate::token::{Token, TokenKind};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub token: Token,
    pub name: String,
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub token: Token,
    pub statements: Vec<Statement>,
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for statement in &self.statements {
            write!(f, "{}", statement)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Let {
        token: Token,
        name: Identifier,
        value: Expression,
    },
    Return {
        token: Token,
        value: Expression,
    },
    Expression {
        token: Token,
        expr: Expression,
    },
    Block(Block),
}

impl Statement {
    pub fn token_literal(&self) -> &str {
        match self {
            Statement::Let { token, .. } => &token.literal,
            Statement::Return { token, .. } => &token.literal,
            Statement::Expression { token, .. } => &token.literal,
            Statement::Block(block) => &block.token.literal,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Statement::Let { token, name, value } => {
                write!(f, "{} {} = {};", token.literal, name, value)
            }
            Statement::Return { token, value } => write!(f, "{} {};", token.literal, value),
            Statement::Expression { expr, .. } => write!(f, "{}", expr),
            Statement::Block(block) => write!(f, "{}", block),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Identifier(Identifier),
    IntegerLiteral {
        token: Token,
        value: i64,
    },
    FloatLiteral {
        token: Token,
        value: f64,
    },
    BooleanLiteral {
        token: Token,
        value: bool,
    },
    StringLiteral {
        token: Token,
        value: String,
    },
    Prefix {
        token: Token,
        operator: String,
        right: Box<Expression>,
    },
    Infix {
        token: Token,
        left: Box<Expression>,
        operator: String,
        right: Box<Expression>,
    },
    If {
        token: Token,
        condition: Box<Expression>,
        consequence: Block,
        alternative: Option<Block>,
    },
    Function {
        token: Token,
        parameters: Vec<Identifier>,
        body: Block,
    },
    Call {
        token: Token,
        function: Box<Expression>,
        arguments: Vec<Expression>,
    },
}

impl Expression {
    pub fn token_literal(&self) -> &str {
        match self {
            Expression::Identifier(ident) => &ident.token.literal,
            Expression::IntegerLiteral { token, .. } => &token.literal,
            Expression::FloatLiteral { token, .. } => &token.literal,
            Expression::BooleanLiteral { token, .. } => &token.literal,
            Expression::StringLiteral { token, .. } => &token.literal,
            Expression::Prefix { token, .. } => &token.literal,
            Expression::Infix { token, .. } => &token.literal,
            Expression::If { token, .. } => &token.literal,
            Expression::Function { token, .. } => &token.literal,
            Expression::Call { token, .. } => &token.literal,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expression::Identifier(ident) => write!(f, "{}", ident),
            Expression::IntegerLiteral { token, .. } => write!(f, "{}", token.literal),
            Expression::FloatLiteral { token, .. } => write!(f, "{}", token.literal),
            Expression::BooleanLiteral { token, .. } => write!(f, "{}", token.literal),
            Expression::StringLiteral { value, .. } => write!(f, "{}", value),
            Expression::Prefix {
                token,
                operator,
                right,
            } => {
                let space = if token.kind == TokenKind::Negation { " " } else { "" };
                write!(f, "({}{}{})", operator, space, right)
            }
            Expression::Infix {
                left,
                operator,
                right,
                ..
            } => write!(f, "({} {} {})", left, operator, right),
            Expression::If {
                condition,
                consequence,
                alternative,
                ..
            } => {
                write!(f, "if{} {}", condition, consequence)?;
                if let Some(alt) = alternative {
                    write!(f, "else {}", alt)?;
                }
                Ok(())
            }
            Expression::Function {
                token,
                parameters,
                body,
            } => {
                let params: Vec<String> = parameters.iter().map(|p| p.name.clone()).collect();
                write!(f, "{}({}) {}", token.literal, params.join(", "), body)
            }
            Expression::Call {
                function,
                arguments,
                ..
            } => {
                let args: Vec<String> = arguments.iter().map(|a| a.to_string()).collect();
                write!(f, "{}({})", function, args.join(", "))
            }
        }
    }
}

/// An ordered sequence of statements. `token_literal()` is the first
/// statement's literal, or empty when the program has no statements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl Program {
    pub fn token_literal(&self) -> &str {
        self.statements
            .first()
            .map(Statement::token_literal)
            .unwrap_or("")
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for statement in &self.statements {
            write!(f, "{}", statement)?;
        }
        Ok(())
    }
}
