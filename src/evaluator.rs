//! Tree-Walking Evaluator for the monk Scripting Language
//!
//! Recursively reduces AST nodes to runtime `Value`s. Dispatch is by node
//! variant, mirroring the parser's one-function-per-production shape.
//!
//! ## Return Propagation
//!
//! A `return` inside a `Block` yields a `Value::ReturnWrapper` that keeps
//! propagating, wrapped, through nested blocks (so an `if` inside an `if`
//! inside a function body still short-circuits outward) until it reaches
//! the boundary that owns the call — the top-level `Program`, or a
//! function's call site — which unwraps it exactly once.
//!
//! ## Errors
//!
//! Runtime errors are in-band `Value::Error` values, not host exceptions,
//! so they can propagate through block/if/program evaluation the same way
//! a `ReturnWrapper` does: once produced, nothing downstream evaluates
//! further and the error becomes the result of every enclosing construct.

use crate::ast::{Block, Expression, Program, Statement};
use crate::object::{Value, ValueKind, FALSE, NULL, TRUE};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A lexical-scope binding store. `let` statements bind into the current
/// environment; looking up an identifier walks outward through `parent`
/// until a binding is found or the chain is exhausted. Function literals
/// capture their defining environment by `Rc` so calls can create a child
/// scope without cloning the whole chain.
pub struct Environment {
    store: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            store: RefCell::new(HashMap::new()),
            parent: None,
        })
    }

    pub fn enclosed(parent: Rc<Environment>) -> Rc<Self> {
        Rc::new(Self {
            store: RefCell::new(HashMap::new()),
            parent: Some(parent),
        })
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.store.borrow().get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|parent| parent.get(name))
    }

    pub fn set(&self, name: String, value: Value) {
        self.store.borrow_mut().insert(name, value);
    }
}

pub struct Evaluator;

impl Evaluator {
    pub fn new() -> Self {
        Self
    }

    /// Evaluates a whole program. Unlike `eval_block`, a `ReturnWrapper`
    /// produced at this level is unwrapped immediately: no `ReturnWrapper`
    /// ever escapes the top level of a program.
    pub fn eval_program(&self, program: &Program, env: &Rc<Environment>) -> Value {
        let mut result = NULL;
        for statement in &program.statements {
            result = self.eval_statement(statement, env);
            match result {
                Value::ReturnWrapper(inner) => return *inner,
                Value::Error(_) => return result,
                _ => {}
            }
        }
        result
    }

    fn eval_block(&self, block: &Block, env: &Rc<Environment>) -> Value {
        let mut result = NULL;
        for statement in &block.statements {
            result = self.eval_statement(statement, env);
            if matches!(result, Value::ReturnWrapper(_) | Value::Error(_)) {
                return result;
            }
        }
        result
    }

    fn eval_statement(&self, statement: &Statement, env: &Rc<Environment>) -> Value {
        match statement {
            Statement::Let { name, value, .. } => {
                let evaluated = self.eval_expression(value, env);
                if evaluated.is_error() {
                    return evaluated;
                }
                env.set(name.name.clone(), evaluated);
                NULL
            }
            Statement::Return { value, .. } => {
                let evaluated = self.eval_expression(value, env);
                if evaluated.is_error() {
                    return evaluated;
                }
                Value::ReturnWrapper(Box::new(evaluated))
            }
            Statement::Expression { expr, .. } => self.eval_expression(expr, env),
            Statement::Block(block) => self.eval_block(block, env),
        }
    }

    fn eval_expression(&self, expr: &Expression, env: &Rc<Environment>) -> Value {
        match expr {
            Expression::IntegerLiteral { value, .. } => Value::Integer(*value),
            Expression::FloatLiteral { value, .. } => Value::Float(*value),
            Expression::BooleanLiteral { value, .. } => native_bool(*value),
            Expression::StringLiteral { value, .. } => Value::String(value.clone()),
            Expression::Identifier(ident) => match env.get(&ident.name) {
                Some(value) => value,
                None => Value::Error(format!("Identifier not found: {}", ident.name)),
            },
            Expression::Prefix {
                operator, right, ..
            } => {
                let right = self.eval_expression(right, env);
                if right.is_error() {
                    return right;
                }
                eval_prefix(operator, &right)
            }
            Expression::Infix {
                left,
                operator,
                right,
                ..
            } => {
                let left = self.eval_expression(left, env);
                if left.is_error() {
                    return left;
                }
                let right = self.eval_expression(right, env);
                if right.is_error() {
                    return right;
                }
                eval_infix(operator, &left, &right)
            }
            Expression::If {
                condition,
                consequence,
                alternative,
                ..
            } => {
                let condition = self.eval_expression(condition, env);
                if condition.is_error() {
                    return condition;
                }
                if condition.is_truthy() {
                    self.eval_block(consequence, env)
                } else if let Some(alternative) = alternative {
                    self.eval_block(alternative, env)
                } else {
                    NULL
                }
            }
            Expression::Function {
                parameters, body, ..
            } => Value::Function {
                parameters: parameters.clone(),
                body: body.clone(),
                env: Rc::clone(env),
            },
            Expression::Call {
                function,
                arguments,
                ..
            } => {
                let function = self.eval_expression(function, env);
                if function.is_error() {
                    return function;
                }
                let mut args = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    let evaluated = self.eval_expression(argument, env);
                    if evaluated.is_error() {
                        return evaluated;
                    }
                    args.push(evaluated);
                }
                self.apply_function(function, args)
            }
        }
    }

    fn apply_function(&self, function: Value, args: Vec<Value>) -> Value {
        let (parameters, body, captured_env) = match function {
            Value::Function {
                parameters,
                body,
                env,
            } => (parameters, body, env),
            other => return Value::Error(format!("Not a function: {}", other.kind())),
        };

        if parameters.len() != args.len() {
            return Value::Error(format!(
                "Argument count mismatch: expected {}, got {}",
                parameters.len(),
                args.len()
            ));
        }

        let call_env = Environment::enclosed(captured_env);
        for (parameter, argument) in parameters.iter().zip(args) {
            call_env.set(parameter.name.clone(), argument);
        }

        match self.eval_block(&body, &call_env) {
            Value::ReturnWrapper(inner) => *inner,
            other => other,
        }
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

fn native_bool(value: bool) -> Value {
    if value {
        TRUE
    } else {
        FALSE
    }
}

fn is_numeric(value: &Value) -> bool {
    matches!(value, Value::Integer(_) | Value::Float(_))
}

fn to_f64(value: &Value) -> f64 {
    match value {
        Value::Integer(n) => *n as f64,
        Value::Float(n) => *n,
        _ => unreachable!("to_f64 called on a non-numeric value"),
    }
}

/// Narrows a raw floating-point result back to `Integer` when it carries no
/// fractional part (e.g. `50 / 2 == 25.0` becomes `Integer(25)`), otherwise
/// keeps it as `Float` (e.g. `5 / 2 == 2.5`).
fn narrow_float(raw: f64) -> Value {
    if raw.is_finite() && raw.fract() == 0.0 && raw.abs() < i64::MAX as f64 {
        Value::Integer(raw as i64)
    } else {
        Value::Float(raw)
    }
}

fn eval_prefix(operator: &str, right: &Value) -> Value {
    match operator {
        "not" => native_bool(matches!(right, Value::Boolean(false) | Value::Null)),
        "-" => match right {
            Value::Integer(n) => Value::Integer(-n),
            Value::Float(n) => Value::Float(-n),
            other => Value::Error(format!("Unknown operator: -{}", other.kind())),
        },
        other => Value::Error(format!("Unknown operator: {}{}", other, right.kind())),
    }
}

fn eval_infix(operator: &str, left: &Value, right: &Value) -> Value {
    if operator == "and" {
        return native_bool(is_true_singleton(left) && is_true_singleton(right));
    }
    if operator == "or" {
        return native_bool(is_true_singleton(left) || is_true_singleton(right));
    }

    match (is_numeric(left), is_numeric(right)) {
        (true, true) => eval_numeric_infix(operator, left, right),
        (true, false) | (false, true) => Value::Error(format!(
            "Type mismatch: {} {} {}",
            left.kind(),
            operator,
            right.kind()
        )),
        (false, false) => eval_non_numeric_infix(operator, left, right),
    }
}

fn is_true_singleton(value: &Value) -> bool {
    matches!(value, Value::Boolean(true))
}

fn eval_numeric_infix(operator: &str, left: &Value, right: &Value) -> Value {
    match operator {
        "+" | "-" | "*" => {
            if let (Value::Integer(a), Value::Integer(b)) = (left, right) {
                let result = match operator {
                    "+" => a.wrapping_add(*b),
                    "-" => a.wrapping_sub(*b),
                    "*" => a.wrapping_mul(*b),
                    _ => unreachable!(),
                };
                Value::Integer(result)
            } else {
                let (a, b) = (to_f64(left), to_f64(right));
                let raw = match operator {
                    "+" => a + b,
                    "-" => a - b,
                    "*" => a * b,
                    _ => unreachable!(),
                };
                narrow_float(raw)
            }
        }
        "^" => narrow_float(to_f64(left).powf(to_f64(right))),
        "/" => narrow_float(to_f64(left) / to_f64(right)),
        "==" => native_bool(to_f64(left) == to_f64(right)),
        "!=" => native_bool(to_f64(left) != to_f64(right)),
        "<" => native_bool(to_f64(left) < to_f64(right)),
        "<=" => native_bool(to_f64(left) <= to_f64(right)),
        ">" => native_bool(to_f64(left) > to_f64(right)),
        ">=" => native_bool(to_f64(left) >= to_f64(right)),
        other => Value::Error(format!(
            "Unknown operator: {} {} {}",
            left.kind(),
            other,
            right.kind()
        )),
    }
}

fn eval_non_numeric_infix(operator: &str, left: &Value, right: &Value) -> Value {
    match operator {
        "==" => native_bool(values_identical(left, right)),
        "!=" => native_bool(!values_identical(left, right)),
        other => Value::Error(format!(
            "Unknown operator: {} {} {}",
            left.kind(),
            other,
            right.kind()
        )),
    }
}

/// Identity-flavored equality for non-numeric values. `Boolean` and `Null`
/// compare by value against the canonical singletons (equivalent to
/// identity, since those variants carry no hidden state); other kinds fall
/// back to a narrow, implementation-defined notion of sameness rather than
/// structural equality of e.g. two distinct closures.
fn values_identical(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Boolean(a), Value::Boolean(b)) => a == b,
        (Value::Null, Value::Null) => true,
        (Value::String(a), Value::String(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn eval(source: &str) -> Value {
        let mut parser = Parser::new(Lexer::new(source));
        let program = parser.parse_program();
        assert!(parser.errors().is_empty(), "{:?}", parser.errors());
        Evaluator::new().eval_program(&program, &Environment::new())
    }

    #[test]
    fn integer_literal_evaluates_to_itself() {
        assert_eq!(eval("5").inspect(), "5");
    }

    #[test]
    fn power_and_grouping() {
        assert_eq!(eval("(5 + (5 * 8)) ^ 2").inspect(), "2025");
    }

    #[test]
    fn left_to_right_precedence_mix() {
        assert_eq!(eval("50 / 2 * 2 + 10").inspect(), "60");
    }

    #[test]
    fn division_narrows_only_when_exact() {
        assert_eq!(eval("5 / 2").inspect(), "2.5");
        assert_eq!(eval("12 / 10").inspect(), "1.2");
        assert_eq!(eval("50 / 2").inspect(), "25");
    }

    #[test]
    fn if_with_or_condition() {
        assert_eq!(
            eval("if (1 > 2 or 5 < 8) { 10; } else { 20; }").inspect(),
            "10"
        );
    }

    #[test]
    fn nested_if_return_unwraps_at_program_top_level() {
        assert_eq!(
            eval("if (10 > 1) { if (20 > 10) { return 1; } return 0; }").inspect(),
            "1"
        );
    }

    #[test]
    fn type_mismatch_is_a_runtime_error() {
        assert_eq!(
            eval("5 + true;").inspect(),
            "Error: Type mismatch: INTEGER + BOOLEAN"
        );
    }

    #[test]
    fn let_binding_round_trips_through_identifier() {
        assert_eq!(eval("let x = 5; x;").inspect(), "5");
    }

    #[test]
    fn function_call_evaluates_body() {
        assert_eq!(
            eval("let add = def(a, b) { a + b; }; add(2, 3);").inspect(),
            "5"
        );
    }

    #[test]
    fn recursive_function_terminates_via_return() {
        assert_eq!(
            eval(
                "let counter = def(x) { if (x > 5) { return x; } return counter(x + 1); }; counter(0);"
            )
            .inspect(),
            "6"
        );
    }

    #[test]
    fn unbound_identifier_is_an_error() {
        assert_eq!(eval("foobar;").inspect(), "Error: Identifier not found: foobar");
    }

    #[test]
    fn calling_a_non_function_is_an_error() {
        assert_eq!(eval("5(1, 2);").inspect(), "Error: Not a function: INTEGER");
    }

    #[test]
    fn not_treats_only_false_and_null_as_falsy() {
        assert_eq!(eval("not true").inspect(), "false");
        assert_eq!(eval("not false").inspect(), "true");
        assert_eq!(eval("not 0").inspect(), "false");
        assert_eq!(eval("not ''").inspect(), "false");
    }

    #[test]
    fn error_short_circuits_enclosing_block() {
        assert_eq!(
            eval("if (true) { 5 + true; 10; }").inspect(),
            "Error: Type mismatch: INTEGER + BOOLEAN"
        );
    }

    #[test]
    fn closures_capture_their_defining_environment() {
        assert_eq!(
            eval("let make_adder = def(x) { def(y) { x + y; }; }; let add_two = make_adder(2); add_two(3);")
                .inspect(),
            "5"
        );
    }
}
