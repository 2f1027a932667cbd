use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use chrono::Utc;
use log::{debug, info};

use crate::ast::{Expr, ExprId, FunctionDecl, Ident, LiteralValue, Operator, Stmt};
use crate::callable::{Callable, NativeFunction};
use crate::class::{Class, CONSTRUCTOR};
use crate::environment::{EnvRef, Environment};
use crate::error::{Result, ScriptError};
use crate::function::Function;
use crate::token::TokenType;
use crate::value::{format_number, Value};

/// Outcome of executing one statement. `Return` unwinds through enclosing
/// blocks and loops until a call boundary turns it back into a value.
#[derive(Debug, Clone)]
pub enum Flow {
    Normal,
    Return(Value),
}

/// Tree‑walking evaluator. Owns the global scope, the current scope and the
/// resolver's distance table for every program it has been given.
pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    locals: HashMap<ExprId, usize>,
    out: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates a new Interpreter printing to stdout.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Creates a new Interpreter whose `print` output goes to `out`, and
    /// defines the native `clock`.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef = Rc::new(std::cell::RefCell::new(Environment::new()));

        debug!("Defining native function 'clock'");

        globals.borrow_mut().define(
            "clock",
            Value::Callable(Callable::Native(Rc::new(NativeFunction {
                name: "clock".to_string(),
                arity: 0,
                func: |_args: &[Value]| {
                    let micros: i64 = Utc::now().timestamp_micros();
                    Ok(Value::Number(micros as f64 / 1_000_000.0))
                },
            }))),
        );

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            out,
        }
    }

    /// Called by the resolver: `id` refers to a binding `depth` scopes out.
    pub fn resolve(&mut self, id: ExprId, depth: usize) {
        debug!("Noting {:?} at depth {}", id, depth);
        self.locals.insert(id, depth);
    }

    /// Interprets a list of statements (a "program"). Stops at the first
    /// runtime error; output already written stays written.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        let result = statements
            .iter()
            .try_for_each(|stmt| self.execute(stmt).map(|_| ()));

        // A failed call may leave us inside a nested scope.
        self.environment = Rc::clone(&self.globals);

        match &result {
            Ok(()) => info!("Interpretation completed successfully"),
            Err(e) => info!("Interpretation stopped: {}", e),
        }

        self.out.flush()?;

        result
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;
                writeln!(self.out, "{}", value)?;
                debug!("Printed value: {}", value);
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Null,
                };
                self.environment.borrow_mut().define(&name.name, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let scope: EnvRef = Environment::child_of(&self.environment);
                self.execute_block(statements, scope)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::Function(declaration) => {
                self.define_function(declaration);
                Ok(Flow::Normal)
            }

            Stmt::Class { name, methods } => {
                self.execute_class(name, methods)?;
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Null,
                };
                debug!("Returning value: {}", value);
                Ok(Flow::Return(value))
            }
        }
    }

    /// Run `statements` inside `environment`, restoring the previous scope
    /// on every exit path.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: EnvRef) -> Result<Flow> {
        let previous: EnvRef = std::mem::replace(&mut self.environment, environment);

        let mut outcome: Result<Flow> = Ok(Flow::Normal);
        for stmt in statements {
            match self.execute(stmt) {
                Ok(Flow::Normal) => {}
                other => {
                    outcome = other;
                    break;
                }
            }
        }

        self.environment = previous;
        outcome
    }

    #[inline(never)]
    fn define_function(&mut self, declaration: &Rc<FunctionDecl>) {
        debug!("Defining function '{}'", declaration.name.name);
        let function = Function::new(
            Rc::clone(declaration),
            Rc::clone(&self.environment),
            false,
        );
        self.environment.borrow_mut().define(
            &declaration.name.name,
            Value::Callable(Callable::Function(Rc::new(function))),
        );
    }

    #[inline(never)]
    fn execute_class(&mut self, name: &Ident, methods: &[Rc<FunctionDecl>]) -> Result<()> {
        // Bound first so methods may refer to the class by name.
        self.environment
            .borrow_mut()
            .define(&name.name, Value::Null);

        let methods: HashMap<String, Rc<Function>> = methods
            .iter()
            .map(|method| {
                let function = Function::new(
                    Rc::clone(method),
                    Rc::clone(&self.environment),
                    method.name.name == CONSTRUCTOR,
                );
                (method.name.name.clone(), Rc::new(function))
            })
            .collect();

        info!("Class '{}' defined with {} method(s)", name.name, methods.len());

        let class = Class::new(name.name.clone(), methods);
        self.environment.borrow_mut().assign(
            &name.name,
            Value::Callable(Callable::Class(Rc::new(class))),
            name.line,
        )
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────

    /// Evaluates an expression and returns a Value.
    ///
    /// This frame sits on every level of script recursion; keep the arms
    /// here trivial and delegate the rest.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Null => Value::Null,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => {
                let right: Value = self.evaluate(right)?;
                self.evaluate_unary(operator, right)
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => self.evaluate_logical(left, operator, right),

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::This { id, line } => self.look_up_this(*id, *line),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;
                self.assign_variable(*id, name, value.clone())?;
                Ok(value)
            }

            Expr::IncDec {
                id,
                name,
                operator,
                value,
            } => self.evaluate_inc_dec(*id, name, operator, value),

            Expr::ArrayLiteral(elements) => self.evaluate_array(elements),

            Expr::ArrayGet {
                target,
                bracket,
                index,
            } => self.evaluate_index(target, index, *bracket),

            Expr::Call {
                callee,
                paren,
                arguments,
            } => self.evaluate_call(callee, arguments, *paren),

            Expr::Get { object, name } => self.evaluate_get(object, name),

            Expr::Set {
                object,
                name,
                value,
            } => self.evaluate_set(object, name, value),
        }
    }

    #[inline(never)]
    fn evaluate_binary(&mut self, left: &Expr, operator: &Operator, right: &Expr) -> Result<Value> {
        let left: Value = self.evaluate(left)?;
        let right: Value = self.evaluate(right)?;
        binary_op(&operator.kind, operator, left, right)
    }

    /// Both operands are always evaluated.
    #[inline(never)]
    fn evaluate_logical(
        &mut self,
        left: &Expr,
        operator: &Operator,
        right: &Expr,
    ) -> Result<Value> {
        let left: Value = self.evaluate(left)?;
        let right: Value = self.evaluate(right)?;

        match (left, right, &operator.kind) {
            (Value::Bool(a), Value::Bool(b), TokenType::AND) => Ok(Value::Bool(a & b)),
            (Value::Bool(a), Value::Bool(b), TokenType::OR) => Ok(Value::Bool(a | b)),
            _ => Err(logical_error(operator)),
        }
    }

    #[inline(never)]
    fn look_up_this(&self, id: ExprId, line: usize) -> Result<Value> {
        let name = Ident {
            name: "this".to_string(),
            line,
        };
        self.look_up_variable(id, &name)
    }

    /// `x op= v`, `x++` and `x--`. The operand is evaluated before the
    /// variable is read; the expression itself yields `null`.
    #[inline(never)]
    fn evaluate_inc_dec(
        &mut self,
        id: ExprId,
        name: &Ident,
        operator: &Operator,
        value: &Expr,
    ) -> Result<Value> {
        let operand: Value = self.evaluate(value)?;
        let current: Value = self.look_up_variable(id, name)?;

        let op: TokenType = match operator.kind {
            TokenType::PLUS_EQUAL | TokenType::PLUS_PLUS => TokenType::PLUS,
            TokenType::MINUS_EQUAL | TokenType::MINUS_MINUS => TokenType::MINUS,
            TokenType::STAR_EQUAL => TokenType::STAR,
            TokenType::SLASH_EQUAL => TokenType::SLASH,
            _ => TokenType::PERCENT,
        };

        let updated: Value = binary_op(&op, operator, current, operand)?;
        self.assign_variable(id, name, updated)?;
        Ok(Value::Null)
    }

    #[inline(never)]
    fn evaluate_array(&mut self, elements: &[Expr]) -> Result<Value> {
        let values: Vec<Value> = elements
            .iter()
            .map(|element| self.evaluate(element))
            .collect::<Result<_>>()?;
        Ok(Value::array(values))
    }

    /// The index is evaluated before the target.
    #[inline(never)]
    fn evaluate_index(&mut self, target: &Expr, index: &Expr, line: usize) -> Result<Value> {
        let index: Value = self.evaluate(index)?;
        let target: Value = self.evaluate(target)?;
        index_array(target, index, line)
    }

    #[inline(never)]
    fn evaluate_call(&mut self, callee: &Expr, arguments: &[Expr], paren: usize) -> Result<Value> {
        let callee: Value = self.evaluate(callee)?;

        let arguments: Vec<Value> = arguments
            .iter()
            .map(|argument| self.evaluate(argument))
            .collect::<Result<_>>()?;

        let Value::Callable(callable) = callee else {
            return Err(ScriptError::runtime(
                paren,
                "Can only call functions and classes.",
            ));
        };

        if arguments.len() != callable.arity() {
            return Err(ScriptError::runtime(
                paren,
                format!(
                    "Expected {} arguments but got {}.",
                    callable.arity(),
                    arguments.len()
                ),
            ));
        }

        debug!("Calling '{}' with {} argument(s)", callable.name(), arguments.len());

        callable.call(self, arguments, paren)
    }

    #[inline(never)]
    fn evaluate_get(&mut self, object: &Expr, name: &Ident) -> Result<Value> {
        match self.evaluate(object)? {
            Value::Instance(instance) => instance.get(name),
            _ => Err(ScriptError::runtime(
                name.line,
                "Only instances have properties.",
            )),
        }
    }

    #[inline(never)]
    fn evaluate_set(&mut self, object: &Expr, name: &Ident, value: &Expr) -> Result<Value> {
        let Value::Instance(instance) = self.evaluate(object)? else {
            return Err(ScriptError::runtime(name.line, "Only instances have fields."));
        };

        let value: Value = self.evaluate(value)?;
        instance.set(name, value.clone());
        Ok(value)
    }

    fn evaluate_unary(&self, operator: &Operator, right: Value) -> Result<Value> {
        match operator.kind {
            TokenType::MINUS => match right {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(ScriptError::runtime(
                    operator.line,
                    "Operand must be a number.",
                )),
            },

            TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),

            _ => Err(ScriptError::runtime(
                operator.line,
                format!("Invalid unary operator '{}'.", operator.lexeme),
            )),
        }
    }

    /// Resolved references go straight to their scope; the rest are globals.
    fn look_up_variable(&self, id: ExprId, name: &Ident) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&distance) => Ok(Environment::get_at(&self.environment, distance, &name.name)),
            None => self.globals.borrow().get(&name.name, name.line),
        }
    }

    fn assign_variable(&mut self, id: ExprId, name: &Ident, value: Value) -> Result<()> {
        match self.locals.get(&id) {
            Some(&distance) => {
                Environment::assign_at(&self.environment, distance, &name.name, value);
                Ok(())
            }
            None => self
                .globals
                .borrow_mut()
                .assign(&name.name, value, name.line),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Operator helpers
// ─────────────────────────────────────────────────────────────────────────

/// Apply a binary operator. `op` selects the operation; `operator` supplies
/// the line and lexeme for errors (they differ for compound assignment).
fn binary_op(op: &TokenType, operator: &Operator, left: Value, right: Value) -> Result<Value> {
    match op {
        TokenType::PLUS => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (left @ Value::String(_), right) | (left, right @ Value::String(_)) => {
                Ok(Value::String(format!("{}{}", left, right)))
            }
            (left, right) => Err(ScriptError::runtime(
                operator.line,
                format!(
                    "Operands of '{}' must be two numbers or include a string, got {} and {}.",
                    operator.lexeme,
                    left.type_name(),
                    right.type_name()
                ),
            )),
        },

        TokenType::EQUAL_EQUAL => Ok(Value::Bool(left == right)),
        TokenType::BANG_EQUAL => Ok(Value::Bool(left != right)),

        _ => {
            let (a, b) = numbers(operator, &left, &right)?;

            match op {
                TokenType::MINUS => Ok(Value::Number(a - b)),
                TokenType::STAR => Ok(Value::Number(a * b)),
                TokenType::SLASH if b == 0.0 => {
                    Err(ScriptError::runtime(operator.line, "Division by zero."))
                }
                TokenType::SLASH => Ok(Value::Number(a / b)),
                TokenType::PERCENT if b == 0.0 => {
                    Err(ScriptError::runtime(operator.line, "Modulo by zero."))
                }
                TokenType::PERCENT => Ok(Value::Number(a % b)),
                TokenType::GREATER => Ok(Value::Bool(a > b)),
                TokenType::GREATER_EQUAL => Ok(Value::Bool(a >= b)),
                TokenType::LESS => Ok(Value::Bool(a < b)),
                TokenType::LESS_EQUAL => Ok(Value::Bool(a <= b)),
                _ => Err(ScriptError::runtime(
                    operator.line,
                    format!("Invalid binary operator '{}'.", operator.lexeme),
                )),
            }
        }
    }
}

fn numbers(operator: &Operator, left: &Value, right: &Value) -> Result<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(ScriptError::runtime(
            operator.line,
            format!(
                "Operands of '{}' must be numbers, got {} and {}.",
                operator.lexeme,
                left.type_name(),
                right.type_name()
            ),
        )),
    }
}

fn logical_error(operator: &Operator) -> ScriptError {
    ScriptError::runtime(
        operator.line,
        format!("Operands of '{}' must be booleans.", operator.lexeme),
    )
}

/// `target[index]`: the index must be an integral number below the length.
/// Negative positions fail the checked access and report as out of range.
fn index_array(target: Value, index: Value, line: usize) -> Result<Value> {
    let Value::Number(position) = index else {
        return Err(ScriptError::runtime(line, "Array index must be a number."));
    };

    let target_type: &'static str = target.type_name();

    let Value::Array(elements) = target else {
        return Err(ScriptError::runtime(
            line,
            format!("Only arrays can be indexed, got {}.", target_type),
        ));
    };

    let elements = elements.borrow();

    if position >= elements.len() as f64 {
        return Err(ScriptError::runtime(
            line,
            format!(
                "Array index {} out of range for length {}.",
                format_number(position),
                elements.len()
            ),
        ));
    }

    if position.fract() != 0.0 {
        return Err(ScriptError::runtime(
            line,
            format!(
                "Array index must be an integer, got {}.",
                format_number(position)
            ),
        ));
    }

    usize::try_from(position as i64)
        .ok()
        .and_then(|i| elements.get(i).cloned())
        .ok_or_else(|| {
            ScriptError::runtime(
                line,
                format!(
                    "Array index {} out of range for length {}.",
                    format_number(position),
                    elements.len()
                ),
            )
        })
}
