//! Pratt Parser for the monk Scripting Language
//!
//! Drives the scanner with one-token lookahead (`current`, `peek`) and
//! dispatches on token kind to prefix/infix parse routines keyed by a
//! precedence table (precedence-climbing / "Pratt" parsing). The parser
//! never aborts on a single syntax error: it records a human-readable
//! message in `errors` and keeps going, guaranteeing termination because
//! every top-level loop iteration advances at least one token.
//!
//! ## Precedence Ladder (lowest to highest)
//!
//! ```text
//! LOWEST < LOGIC (and, or) < EQUALS (==, !=) < LESSGREATER (< <= > >=)
//!        < SUM (+ -) < PRODUCT (* /) < POWER (^) < PREFIX (-x, not x)
//!        < CALL ( f(...) )
//! ```

use crate::ast::{Block, Expression, Identifier, Program, Statement};
use crate::token::TokenKind;
use crate::lexer::Lexer;
use crate::token::Token;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
enum Precedence {
    Lowest,
    Logic,
    Equals,
    LessGreater,
    Sum,
    Product,
    Power,
    Prefix,
    Call,
}

fn precedence_of(kind: TokenKind) -> Precedence {
    use TokenKind::*;
    match kind {
        And | Or => Precedence::Logic,
        Equals | Diff => Precedence::Equals,
        Lt | LtOrEquals | Gt | GtOrEquals => Precedence::LessGreater,
        Plus | Minus => Precedence::Sum,
        Multiplication | Division => Precedence::Product,
        Power => Precedence::Power,
        Lparen => Precedence::Call,
        _ => Precedence::Lowest,
    }
}

type PrefixParseFn = fn(&mut Parser) -> Option<Expression>;
type InfixParseFn = fn(&mut Parser, Expression) -> Option<Expression>;

pub struct Parser {
    lexer: Lexer,
    current: Token,
    peek: Token,
    errors: Vec<String>,
    prefix_parse_fns: HashMap<TokenKind, PrefixParseFn>,
    infix_parse_fns: HashMap<TokenKind, InfixParseFn>,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Self {
        let current = lexer.next_token();
        let peek = lexer.next_token();

        let mut parser = Self {
            lexer,
            current,
            peek,
            errors: Vec::new(),
            prefix_parse_fns: HashMap::new(),
            infix_parse_fns: HashMap::new(),
        };

        use TokenKind::*;
        parser.register_prefix(Ident, Parser::parse_identifier);
        parser.register_prefix(Int, Parser::parse_integer_literal);
        parser.register_prefix(Float, Parser::parse_float_literal);
        parser.register_prefix(Str, Parser::parse_string_literal);
        parser.register_prefix(True, Parser::parse_boolean_literal);
        parser.register_prefix(False, Parser::parse_boolean_literal);
        parser.register_prefix(Lparen, Parser::parse_grouped_expression);
        parser.register_prefix(Negation, Parser::parse_prefix_expression);
        parser.register_prefix(Minus, Parser::parse_prefix_expression);
        parser.register_prefix(If, Parser::parse_if_expression);
        parser.register_prefix(Function, Parser::parse_function_literal);

        for kind in [
            Plus, Minus, Multiplication, Division, Power, Equals, Diff, Lt, LtOrEquals, Gt,
            GtOrEquals, And, Or,
        ] {
            parser.register_infix(kind, Parser::parse_infix_expression);
        }
        parser.register_infix(Lparen, Parser::parse_call_expression);

        parser
    }

    fn register_prefix(&mut self, kind: TokenKind, f: PrefixParseFn) {
        self.prefix_parse_fns.insert(kind, f);
    }

    fn register_infix(&mut self, kind: TokenKind, f: InfixParseFn) {
        self.infix_parse_fns.insert(kind, f);
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    fn advance(&mut self) {
        self.current = std::mem::replace(&mut self.peek, self.lexer.next_token());
    }

    fn current_is(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn peek_is(&self, kind: TokenKind) -> bool {
        self.peek.kind == kind
    }

    fn peek_precedence(&self) -> Precedence {
        precedence_of(self.peek.kind)
    }

    fn current_precedence(&self) -> Precedence {
        precedence_of(self.current.kind)
    }

    /// Consumes `peek` and advances if it matches `kind`; otherwise records
    /// an `expected <KIND> but got <KIND>` error and leaves the cursor in
    /// place for the caller/outer loop to recover from.
    fn expect_peek(&mut self, kind: TokenKind) -> bool {
        if self.peek_is(kind) {
            self.advance();
            true
        } else {
            self.errors.push(format!(
                "expected {} but got {}",
                kind, self.peek.kind
            ));
            false
        }
    }

    pub fn parse_program(&mut self) -> Program {
        let mut statements = Vec::new();

        while !self.current_is(TokenKind::Eof) {
            if let Some(statement) = self.parse_statement() {
                statements.push(statement);
            }
            self.advance();
        }

        Program { statements }
    }

    fn parse_statement(&mut self) -> Option<Statement> {
        match self.current.kind {
            TokenKind::Let => self.parse_let_statement(),
            TokenKind::Return => self.parse_return_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_let_statement(&mut self) -> Option<Statement> {
        let token = self.current.clone();

        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        let name = Identifier {
            token: self.current.clone(),
            name: self.current.literal.clone(),
        };

        if !self.expect_peek(TokenKind::Assign) {
            return None;
        }
        self.advance();

        let value = self.parse_expression(Precedence::Lowest)?;

        if self.peek_is(TokenKind::Semicolon) {
            self.advance();
        }

        Some(Statement::Let { token, name, value })
    }

    fn parse_return_statement(&mut self) -> Option<Statement> {
        let token = self.current.clone();
        self.advance();

        let value = self.parse_expression(Precedence::Lowest)?;

        if self.peek_is(TokenKind::Semicolon) {
            self.advance();
        }

        Some(Statement::Return { token, value })
    }

    fn parse_expression_statement(&mut self) -> Option<Statement> {
        let token = self.current.clone();
        let expr = self.parse_expression(Precedence::Lowest)?;

        if self.peek_is(TokenKind::Semicolon) {
            self.advance();
        }

        Some(Statement::Expression { token, expr })
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expression> {
        let prefix = self.prefix_parse_fns.get(&self.current.kind).copied();
        let mut left = match prefix {
            Some(parse_fn) => parse_fn(self)?,
            None => {
                self.errors.push(format!(
                    "no function found to parse {}",
                    self.current.literal
                ));
                return None;
            }
        };

        while !self.peek_is(TokenKind::Semicolon) && precedence < self.peek_precedence() {
            let infix = self.infix_parse_fns.get(&self.peek.kind).copied();
            let infix = match infix {
                Some(f) => f,
                None => return Some(left),
            };
            self.advance();
            left = infix(self, left)?;
        }

        Some(left)
    }

    fn parse_identifier(&mut self) -> Option<Expression> {
        Some(Expression::Identifier(Identifier {
            token: self.current.clone(),
            name: self.current.literal.clone(),
        }))
    }

    fn parse_integer_literal(&mut self) -> Option<Expression> {
        let token = self.current.clone();
        match token.literal.parse::<i64>() {
            Ok(value) => Some(Expression::IntegerLiteral { token, value }),
            Err(_) => {
                self.errors
                    .push(format!("Could not parse {} as integer", token.literal));
                None
            }
        }
    }

    fn parse_float_literal(&mut self) -> Option<Expression> {
        let token = self.current.clone();
        let normalized = token.literal.replace(',', ".");
        match normalized.parse::<f64>() {
            Ok(value) => Some(Expression::FloatLiteral { token, value }),
            Err(_) => {
                self.errors
                    .push(format!("Could not parse {} as float", token.literal));
                None
            }
        }
    }

    fn parse_string_literal(&mut self) -> Option<Expression> {
        let token = self.current.clone();
        let value = token.literal.clone();
        Some(Expression::StringLiteral { token, value })
    }

    fn parse_boolean_literal(&mut self) -> Option<Expression> {
        let token = self.current.clone();
        let value = self.current_is(TokenKind::True);
        Some(Expression::BooleanLiteral { token, value })
    }

    fn parse_grouped_expression(&mut self) -> Option<Expression> {
        self.advance();
        let expr = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::Rparen) {
            return None;
        }
        Some(expr)
    }

    fn parse_prefix_expression(&mut self) -> Option<Expression> {
        let token = self.current.clone();
        let operator = token.literal.clone();
        self.advance();
        let right = self.parse_expression(Precedence::Prefix)?;
        Some(Expression::Prefix {
            token,
            operator,
            right: Box::new(right),
        })
    }

    fn parse_infix_expression(&mut self, left: Expression) -> Option<Expression> {
        let token = self.current.clone();
        let operator = token.literal.clone();
        let precedence = self.current_precedence();
        self.advance();
        let right = self.parse_expression(precedence)?;
        Some(Expression::Infix {
            token,
            left: Box::new(left),
            operator,
            right: Box::new(right),
        })
    }

    fn parse_if_expression(&mut self) -> Option<Expression> {
        let token = self.current.clone();

        if !self.expect_peek(TokenKind::Lparen) {
            return None;
        }
        self.advance();
        let condition = self.parse_expression(Precedence::Lowest)?;

        if !self.expect_peek(TokenKind::Rparen) {
            return None;
        }
        if !self.expect_peek(TokenKind::Lbrace) {
            return None;
        }
        let consequence = self.parse_block()?;

        let alternative = if self.peek_is(TokenKind::Else) {
            self.advance();
            if !self.expect_peek(TokenKind::Lbrace) {
                return None;
            }
            Some(self.parse_block()?)
        } else {
            None
        };

        Some(Expression::If {
            token,
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    fn parse_block(&mut self) -> Option<Block> {
        let token = self.current.clone();
        let mut statements = Vec::new();
        self.advance();

        while !self.current_is(TokenKind::Rbrace) && !self.current_is(TokenKind::Eof) {
            if let Some(statement) = self.parse_statement() {
                statements.push(statement);
            }
            self.advance();
        }

        Some(Block { token, statements })
    }

    fn parse_function_literal(&mut self) -> Option<Expression> {
        let token = self.current.clone();

        if !self.expect_peek(TokenKind::Lparen) {
            return None;
        }
        // A malformed parameter list still leaves `current`/`peek` at
        // whatever stopped it; fall back to an empty list and keep trying
        // the rest of the literal rather than aborting the whole statement,
        // so one bad parameter list yields one error, not a cascade.
        let parameters = self.parse_function_parameters().unwrap_or_default();

        if !self.expect_peek(TokenKind::Lbrace) {
            return None;
        }
        let body = self.parse_block()?;

        Some(Expression::Function {
            token,
            parameters,
            body,
        })
    }

    fn parse_function_parameters(&mut self) -> Option<Vec<Identifier>> {
        let mut parameters = Vec::new();

        if self.peek_is(TokenKind::Rparen) {
            self.advance();
            return Some(parameters);
        }

        self.advance();
        parameters.push(Identifier {
            token: self.current.clone(),
            name: self.current.literal.clone(),
        });

        while self.peek_is(TokenKind::Comma) {
            self.advance();
            self.advance();
            parameters.push(Identifier {
                token: self.current.clone(),
                name: self.current.literal.clone(),
            });
        }

        if !self.expect_peek(TokenKind::Rparen) {
            return None;
        }

        Some(parameters)
    }

    fn parse_call_expression(&mut self, function: Expression) -> Option<Expression> {
        let token = self.current.clone();
        let arguments = self.parse_call_arguments().unwrap_or_default();
        Some(Expression::Call {
            token,
            function: Box::new(function),
            arguments,
        })
    }

    fn parse_call_arguments(&mut self) -> Option<Vec<Expression>> {
        let mut arguments = Vec::new();

        if self.peek_is(TokenKind::Rparen) {
            self.advance();
            return Some(arguments);
        }

        self.advance();
        arguments.push(self.parse_expression(Precedence::Lowest)?);

        while self.peek_is(TokenKind::Comma) {
            self.advance();
            self.advance();
            arguments.push(self.parse_expression(Precedence::Lowest)?);
        }

        if !self.expect_peek(TokenKind::Rparen) {
            return None;
        }

        Some(arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> (Program, Vec<String>) {
        let mut parser = Parser::new(Lexer::new(source));
        let program = parser.parse_program();
        (program, parser.errors().to_vec())
    }

    #[test]
    fn let_statement_missing_assign_records_one_error() {
        let (_, errors) = parse("let x 5;");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("expected ASSIGN but got INT"), "{:?}", errors);
    }

    #[test]
    fn call_missing_closing_paren_records_one_error() {
        let (_, errors) = parse("def(x, y { x + y; };");
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn call_precedence_pretty_prints() {
        let (program, errors) = parse("sum(a, b, 1, 2 * 3, 4 + 5, sum(6, 7 * 8));");
        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(
            program.to_string(),
            "sum(a, b, 1, (2 * 3), (4 + 5), sum(6, (7 * 8)))"
        );
    }

    #[test]
    fn precedence_pretty_printing_law() {
        let cases = [
            ("-a * b", "((-a) * b)"),
            ("a + b / c", "(a + (b / c))"),
            (
                "not (5 < 2) == not (5 < 3 == 5 > 8)",
                "((not (5 < 2)) == (not ((5 < 3) == (5 > 8))))",
            ),
            ("1 < 2 and 5 < 8", "((1 < 2) and (5 < 8))"),
        ];
        for (input, expected) in cases {
            let (program, errors) = parse(input);
            assert!(errors.is_empty(), "{:?}: {:?}", input, errors);
            assert_eq!(program.to_string(), expected, "input: {}", input);
        }
    }

    #[test]
    fn let_and_return_parse_their_expressions() {
        let (program, errors) = parse("let x = 5; return true;");
        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(program.statements.len(), 2);
        match &program.statements[0] {
            Statement::Let { value, .. } => {
                assert_eq!(value.to_string(), "5");
            }
            other => panic!("expected let statement, got {:?}", other),
        }
        match &program.statements[1] {
            Statement::Return { value, .. } => {
                assert_eq!(value.to_string(), "true");
            }
            other => panic!("expected return statement, got {:?}", other),
        }
    }

    #[test]
    fn parser_is_deterministic() {
        let source = "let x = 1 + 2 * 3; if (x > 5) { x } else { 0 }";
        let (first, first_errors) = parse(source);
        let (second, second_errors) = parse(source);
        assert_eq!(first, second);
        assert_eq!(first_errors, second_errors);
    }
}
