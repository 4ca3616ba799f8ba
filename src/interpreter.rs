//! The Focal interpreter.
//!
//! A stack-based tree walker. The interpreter owns all evaluation state:
//! the scope stack (lexical environment) and the value stack. Each `visit`
//! pushes exactly one value on success; popping an empty stack is an
//! invariant violation and panics.
//!
//! Binary, comparison, and assignment nodes evaluate their right child
//! before their left — deliberately, so a side-effecting right-hand
//! expression runs before the left-hand target resolves for in-place
//! update forms. This order is load-bearing and covered by tests.
//!
//! Failure policy: a runtime error aborts the tree currently being
//! evaluated but not the rest of the forest. Undefined reads are warnings
//! that yield `none`, promoted to hard errors when the reporter is strict.

use std::rc::Rc;

use crate::ast::nodes::{Node, NodeKind};
use crate::ast::operators::{AssignOp, BinaryOp, UnaryOp};
use crate::ast::tokens::Loc;
use crate::dispatch::{self, DispatchError};
use crate::fixup;
use crate::lexer::Lexer;
use crate::parser::{ParseError, Parser};
use crate::report::Reporter;
use crate::symbols::{self, Scope, ScopeRef, ScopeStack};
use crate::value::{Function, Param, SetEntry, Value};

/// Errors that abort the evaluation of one tree.
#[derive(Debug, Clone)]
pub enum RuntimeError {
    /// No dispatch rule for (operator, left kind, right kind).
    Unsupported { error: DispatchError, loc: Loc },
    /// Reference to an undefined name under strict mode (or a call of one).
    Undefined { name: String, loc: Loc },
    /// Call of a non-function value.
    NotCallable {
        name: String,
        kind: &'static str,
        loc: Loc,
    },
    /// Named argument with no matching declared parameter.
    UnknownParameter {
        name: String,
        function: String,
        loc: Loc,
    },
    /// More positional arguments than declared parameters.
    TooManyArguments {
        function: String,
        arity: usize,
        loc: Loc,
    },
    /// Indexing a container with an incompatible key kind.
    BadIndex {
        container: &'static str,
        index: &'static str,
        loc: Loc,
    },
    /// Assigning through an index that does not exist.
    IndexOutOfBounds { index: i64, len: usize, loc: Loc },
    /// Unknown property or method for a value kind.
    NoProperty {
        kind: &'static str,
        name: String,
        loc: Loc,
    },
    /// Assignment to something that is not a storage location.
    BadTarget { what: String, loc: Loc },
    /// Malformed parameter list or argument.
    BadArgument { message: String, loc: Loc },
}

impl RuntimeError {
    pub fn loc(&self) -> Loc {
        match self {
            RuntimeError::Unsupported { loc, .. }
            | RuntimeError::Undefined { loc, .. }
            | RuntimeError::NotCallable { loc, .. }
            | RuntimeError::UnknownParameter { loc, .. }
            | RuntimeError::TooManyArguments { loc, .. }
            | RuntimeError::BadIndex { loc, .. }
            | RuntimeError::IndexOutOfBounds { loc, .. }
            | RuntimeError::NoProperty { loc, .. }
            | RuntimeError::BadTarget { loc, .. }
            | RuntimeError::BadArgument { loc, .. } => *loc,
        }
    }
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeError::Unsupported { error, loc } => write!(f, "{} at {}", error, loc),
            RuntimeError::Undefined { name, loc } => {
                write!(f, "reference to undefined name '{}' at {}", name, loc)
            }
            RuntimeError::NotCallable { name, kind, loc } => {
                write!(f, "'{}' is not callable (found {}) at {}", name, kind, loc)
            }
            RuntimeError::UnknownParameter {
                name,
                function,
                loc,
            } => write!(
                f,
                "unknown parameter '{}' for function '{}' at {}",
                name, function, loc
            ),
            RuntimeError::TooManyArguments {
                function,
                arity,
                loc,
            } => write!(
                f,
                "too many arguments for function '{}' (takes {}) at {}",
                function, arity, loc
            ),
            RuntimeError::BadIndex {
                container,
                index,
                loc,
            } => write!(f, "cannot index {} with {} at {}", container, index, loc),
            RuntimeError::IndexOutOfBounds { index, len, loc } => write!(
                f,
                "index {} out of bounds for length {} at {}",
                index, len, loc
            ),
            RuntimeError::NoProperty { kind, name, loc } => {
                write!(f, "{} has no property '{}' at {}", kind, name, loc)
            }
            RuntimeError::BadTarget { what, loc } => {
                write!(f, "invalid assignment target: {} at {}", what, loc)
            }
            RuntimeError::BadArgument { message, loc } => write!(f, "{} at {}", message, loc),
        }
    }
}

impl std::error::Error for RuntimeError {}

/// Error from the whole run pipeline (parse + evaluate).
#[derive(Debug)]
pub enum RunError {
    Parse(Vec<ParseError>),
    Runtime(RuntimeError),
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunError::Parse(errors) => match errors.first() {
                Some(first) if errors.len() == 1 => write!(f, "{}", first),
                Some(first) => write!(f, "{} (and {} more)", first, errors.len() - 1),
                None => write!(f, "parse failed"),
            },
            RunError::Runtime(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for RunError {}

pub struct Interpreter {
    globals: ScopeRef,
    scopes: ScopeStack,
    stack: Vec<Value>,
    reporter: Reporter,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        let globals = Scope::globals();
        Interpreter {
            scopes: ScopeStack::new(globals.clone()),
            globals,
            stack: Vec::new(),
            reporter: Reporter::default(),
        }
    }

    pub fn with_reporter(reporter: Reporter) -> Self {
        let mut interpreter = Self::new();
        interpreter.reporter = reporter;
        interpreter
    }

    /// The root scope; useful for seeding external values (e.g. series
    /// handles from a data provider) before a run.
    pub fn globals(&self) -> ScopeRef {
        self.globals.clone()
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    pub fn reporter_mut(&mut self) -> &mut Reporter {
        &mut self.reporter
    }

    /// Run the whole pipeline over a source string: lex, parse, fix up,
    /// evaluate. Later statements still parse and evaluate when an earlier
    /// one fails; the first error is returned after the forest finishes.
    pub fn run(&mut self, source: &str) -> Result<Value, RunError> {
        self.reporter.attach_source(source);
        let lexer = Lexer::new(source, self.globals.clone());
        let mut parser = Parser::new(lexer);
        let (forest, parse_errors) = parser.parse_forest();
        for e in &parse_errors {
            self.reporter.error(&e.message, Some(e.loc));
        }
        let forest = fixup::fixup_forest(forest);
        let results = self.eval_forest(&forest);
        if !parse_errors.is_empty() {
            return Err(RunError::Parse(parse_errors));
        }
        let mut last = Value::None;
        for result in results {
            match result {
                Ok(v) => last = v,
                Err(e) => return Err(RunError::Runtime(e)),
            }
        }
        Ok(last)
    }

    /// Evaluate a forest of fixed-up trees, each to completion. An error
    /// aborts its own tree only; the remaining trees still run.
    pub fn eval_forest(&mut self, forest: &[Node]) -> Vec<Result<Value, RuntimeError>> {
        forest
            .iter()
            .map(|tree| {
                let result = self.eval_tree(tree);
                if let Err(e) = &result {
                    self.reporter.error(&e.to_string(), Some(e.loc()));
                }
                result
            })
            .collect()
    }

    /// Evaluate one tree to a single value, restoring the value and scope
    /// stacks on failure.
    pub fn eval_tree(&mut self, tree: &Node) -> Result<Value, RuntimeError> {
        let stack_depth = self.stack.len();
        let scope_depth = self.scopes.depth();
        match self.visit(tree) {
            Ok(()) => Ok(self.pop()),
            Err(e) => {
                self.stack.truncate(stack_depth);
                while self.scopes.depth() > scope_depth {
                    self.scopes.leave();
                }
                Err(e)
            }
        }
    }

    fn pop(&mut self) -> Value {
        self.stack.pop().expect("value stack underflow")
    }

    /// Evaluate one node, pushing exactly one value on success.
    fn visit(&mut self, node: &Node) -> Result<(), RuntimeError> {
        match &node.kind {
            NodeKind::Literal(v) => {
                self.stack.push(v.clone());
                Ok(())
            }

            NodeKind::Read(name) => {
                let value = self.read_name(name, node.loc())?;
                self.stack.push(value);
                Ok(())
            }

            // A bare write reference reads its current value without the
            // undefined-name warning.
            NodeKind::Write(name) => {
                let value = symbols::find(&self.scopes.current(), name, false)
                    .map(|s| s.value)
                    .unwrap_or(Value::None);
                self.stack.push(value);
                Ok(())
            }

            // An apply step outside a flow chain behaves like a read.
            NodeKind::Apply => {
                let value = self.read_name(&node.token.lexeme.clone(), node.loc())?;
                self.stack.push(value);
                Ok(())
            }

            NodeKind::Binary { op, left, right } => {
                self.visit(right)?;
                self.visit(left)?;
                let l = self.pop();
                let r = self.pop();
                let v = dispatch::binary(*op, &l, &r)
                    .map_err(|error| RuntimeError::Unsupported { error, loc: node.loc() })?;
                self.stack.push(v);
                Ok(())
            }

            NodeKind::Unary { op, expr } => match op {
                UnaryOp::Incr => self.bump_storage(expr, BinaryOp::Add, node.loc()),
                UnaryOp::Decr => self.bump_storage(expr, BinaryOp::Sub, node.loc()),
                _ => {
                    self.visit(expr)?;
                    let v = self.pop();
                    let r = dispatch::unary(*op, &v)
                        .map_err(|error| RuntimeError::Unsupported { error, loc: node.loc() })?;
                    self.stack.push(r);
                    Ok(())
                }
            },

            NodeKind::Assign { op, target, value } => {
                // the right side runs before the target resolves
                self.visit(value)?;
                let v = self.pop();
                let assigned = self.assign(*op, target, v, node.loc())?;
                self.stack.push(assigned);
                Ok(())
            }

            // A bare pair evaluates to its value; named contexts (sets,
            // argument lists) look at the node shape instead.
            NodeKind::Pair { value, .. } => self.visit(value),

            NodeKind::If {
                test,
                then,
                otherwise,
            } => {
                self.visit(test)?;
                let cond = self.pop();
                if cond.truthy() {
                    self.visit(then)
                } else if let Some(e) = otherwise {
                    self.visit(e)
                } else {
                    self.stack.push(Value::None);
                    Ok(())
                }
            }

            NodeKind::Block(items) => {
                self.scopes.enter_child("block");
                let result = self.eval_sequence(items);
                self.scopes.leave();
                self.stack.push(result?);
                Ok(())
            }

            NodeKind::SetLit(items) => {
                self.scopes.enter_child("set");
                let result = self.eval_set_entries(items);
                self.scopes.leave();
                self.stack.push(Value::Set(result?));
                Ok(())
            }

            NodeKind::ListLit(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    self.visit(item)?;
                    out.push(self.pop());
                }
                self.stack.push(Value::List(out));
                Ok(())
            }

            NodeKind::Flow(steps) => {
                let mut iter = steps.iter();
                let mut running = match iter.next() {
                    Some(first) => {
                        self.visit(first)?;
                        self.pop()
                    }
                    None => Value::None,
                };
                for step in iter {
                    running = self.flow_step(step, running)?;
                }
                self.stack.push(running);
                Ok(())
            }

            NodeKind::Index { base, index } => {
                self.visit(index)?;
                self.visit(base)?;
                let b = self.pop();
                let i = self.pop();
                let v = self.index_value(&b, &i, node.loc())?;
                self.stack.push(v);
                Ok(())
            }

            NodeKind::Slice { base, start, end } => {
                self.visit(end)?;
                self.visit(start)?;
                self.visit(base)?;
                let b = self.pop();
                let s = self.pop();
                let e = self.pop();
                let v = self.slice_value(&b, &s, &e, node.loc())?;
                self.stack.push(v);
                Ok(())
            }

            NodeKind::IndexSet { base, index, value } => {
                self.visit(value)?;
                let v = self.pop();
                self.visit(index)?;
                let i = self.pop();
                self.store_index(base, i, v.clone(), node.loc())?;
                self.stack.push(v);
                Ok(())
            }

            NodeKind::Property { base, name } => {
                // a named base resolves through the symbol's member
                // namespace; anything else through the value itself
                if let NodeKind::Read(base_name) = &base.kind
                    && let Some(symbol) = symbols::find(&self.scopes.current(), base_name, false)
                    && let Some(members) = &symbol.members
                    && let Some(member) = members.borrow().get_local(name)
                {
                    self.stack.push(member.value);
                    return Ok(());
                }
                self.visit(base)?;
                let b = self.pop();
                let v = self.property_get(&b, name, node.loc())?;
                self.stack.push(v);
                Ok(())
            }

            NodeKind::PropertySet { base, name, value } => {
                self.visit(value)?;
                let v = self.pop();
                self.store_property(base, name, v.clone(), node.loc())?;
                self.stack.push(v);
                Ok(())
            }

            NodeKind::PropertyCall { base, name, args } => {
                self.visit(base)?;
                let b = self.pop();
                let v = self.call_method(&b, name, args, node.loc())?;
                self.stack.push(v);
                Ok(())
            }

            NodeKind::FuncDef { name, params, body } => {
                let function = self.make_function(name, params, body)?;
                symbols::define(
                    &self.scopes.current(),
                    name,
                    function.clone(),
                    false,
                    true,
                    node.loc(),
                );
                self.stack.push(function);
                Ok(())
            }

            NodeKind::FuncCall { callee, args } => {
                let v = self.call_node(callee, Vec::new(), args, node.loc())?;
                self.stack.push(v);
                Ok(())
            }
        }
    }

    /// Resolve a read reference. An undefined name is a warning that
    /// yields `none`, promoted to a hard error under strict mode.
    fn read_name(&mut self, name: &str, loc: Loc) -> Result<Value, RuntimeError> {
        match symbols::find(&self.scopes.current(), name, false) {
            Some(symbol) => Ok(symbol.value),
            None => {
                if self.reporter.is_strict() {
                    Err(RuntimeError::Undefined {
                        name: name.to_string(),
                        loc,
                    })
                } else {
                    self.reporter.warning(
                        &format!("reference to undefined name '{}'", name),
                        Some(loc),
                    );
                    Ok(Value::None)
                }
            }
        }
    }

    /// Evaluate a sequence of statements; the sequence's value is that of
    /// its last element.
    fn eval_sequence(&mut self, items: &[Node]) -> Result<Value, RuntimeError> {
        let mut last = Value::None;
        for item in items {
            self.visit(item)?;
            last = self.pop();
        }
        Ok(last)
    }

    fn eval_set_entries(&mut self, items: &[Node]) -> Result<Vec<SetEntry>, RuntimeError> {
        let mut entries = Vec::with_capacity(items.len());
        for item in items {
            match &item.kind {
                NodeKind::Pair { key, value } => {
                    let name = entry_name(key);
                    self.visit(value)?;
                    let v = self.pop();
                    if let Some(n) = &name {
                        symbols::define(&self.scopes.current(), n, v.clone(), true, true, item.loc());
                    }
                    entries.push(SetEntry { name, value: v });
                }
                _ => {
                    self.visit(item)?;
                    entries.push(SetEntry {
                        name: None,
                        value: self.pop(),
                    });
                }
            }
        }
        Ok(entries)
    }

    fn assign(
        &mut self,
        op: AssignOp,
        target: &Node,
        value: Value,
        loc: Loc,
    ) -> Result<Value, RuntimeError> {
        match op {
            AssignOp::Assign | AssignOp::Define => {
                self.store(target, value.clone(), op == AssignOp::Define, loc)?;
                Ok(value)
            }
            AssignOp::AddAssign | AssignOp::SubAssign => {
                let binop = if op == AssignOp::AddAssign {
                    BinaryOp::Add
                } else {
                    BinaryOp::Sub
                };
                self.visit(target)?;
                let current = self.pop();
                let new = dispatch::binary(binop, &current, &value)
                    .map_err(|error| RuntimeError::Unsupported { error, loc })?;
                self.store(target, new.clone(), false, loc)?;
                Ok(new)
            }
        }
    }

    fn store(
        &mut self,
        target: &Node,
        value: Value,
        update: bool,
        loc: Loc,
    ) -> Result<(), RuntimeError> {
        match &target.kind {
            NodeKind::Write(name) | NodeKind::Read(name) => {
                symbols::define(&self.scopes.current(), name, value, false, update, loc);
                Ok(())
            }
            NodeKind::Index { base, index } => {
                self.visit(index)?;
                let i = self.pop();
                self.store_index(base, i, value, loc)
            }
            NodeKind::Property { base, name } => self.store_property(base, name, value, loc),
            _ => Err(RuntimeError::BadTarget {
                what: "expression is not a storage location".to_string(),
                loc,
            }),
        }
    }

    /// `++`/`--` resolve their target symbol, bump the stored value, write
    /// it back, and push the new value.
    fn bump_storage(
        &mut self,
        target: &Node,
        op: BinaryOp,
        loc: Loc,
    ) -> Result<(), RuntimeError> {
        let name = match &target.kind {
            NodeKind::Read(n) | NodeKind::Write(n) => n.clone(),
            _ => {
                return Err(RuntimeError::BadTarget {
                    what: "'++' and '--' require a named target".to_string(),
                    loc,
                });
            }
        };
        let current = self.read_name(&name, loc)?;
        let new = dispatch::binary(op, &current, &Value::Int(1))
            .map_err(|error| RuntimeError::Unsupported { error, loc })?;
        symbols::define(&self.scopes.current(), &name, new.clone(), false, false, loc);
        self.stack.push(new);
        Ok(())
    }

    fn store_index(
        &mut self,
        base: &Node,
        index: Value,
        value: Value,
        loc: Loc,
    ) -> Result<(), RuntimeError> {
        let name = match &base.kind {
            NodeKind::Read(n) | NodeKind::Write(n) => n.clone(),
            _ => {
                return Err(RuntimeError::BadTarget {
                    what: "indexed assignment requires a named container".to_string(),
                    loc,
                });
            }
        };
        let mut container = self.read_name(&name, loc)?;
        match (&mut container, &index) {
            (Value::List(items), Value::Int(i)) => match normalize_index(*i, items.len()) {
                Some(ix) => items[ix] = value,
                None => {
                    return Err(RuntimeError::IndexOutOfBounds {
                        index: *i,
                        len: items.len(),
                        loc,
                    });
                }
            },
            (Value::Set(entries), Value::Str(key)) => {
                match entries
                    .iter_mut()
                    .find(|e| e.name.as_deref() == Some(key.as_str()))
                {
                    Some(entry) => entry.value = value,
                    None => entries.push(SetEntry {
                        name: Some(key.clone()),
                        value,
                    }),
                }
            }
            _ => {
                return Err(RuntimeError::BadIndex {
                    container: container.kind(),
                    index: index.kind(),
                    loc,
                });
            }
        }
        symbols::define(&self.scopes.current(), &name, container, false, false, loc);
        Ok(())
    }

    fn store_property(
        &mut self,
        base: &Node,
        property: &str,
        value: Value,
        loc: Loc,
    ) -> Result<(), RuntimeError> {
        let name = match &base.kind {
            NodeKind::Read(n) | NodeKind::Write(n) => n.clone(),
            _ => {
                return Err(RuntimeError::BadTarget {
                    what: "property assignment requires a named container".to_string(),
                    loc,
                });
            }
        };
        let mut container = self.read_name(&name, loc)?;
        match &mut container {
            Value::Set(entries) => {
                match entries
                    .iter_mut()
                    .find(|e| e.name.as_deref() == Some(property))
                {
                    Some(entry) => entry.value = value,
                    None => entries.push(SetEntry {
                        name: Some(property.to_string()),
                        value,
                    }),
                }
            }
            other => {
                return Err(RuntimeError::NoProperty {
                    kind: other.kind(),
                    name: property.to_string(),
                    loc,
                });
            }
        }
        symbols::define(&self.scopes.current(), &name, container, false, false, loc);
        Ok(())
    }

    fn index_value(
        &mut self,
        base: &Value,
        index: &Value,
        loc: Loc,
    ) -> Result<Value, RuntimeError> {
        match (base, index) {
            (Value::List(items), Value::Int(n)) => Ok(normalize_index(*n, items.len())
                .and_then(|ix| items.get(ix))
                .cloned()
                .unwrap_or(Value::None)),
            (Value::Str(s), Value::Int(n)) => {
                let chars: Vec<char> = s.chars().collect();
                Ok(normalize_index(*n, chars.len())
                    .and_then(|ix| chars.get(ix))
                    .map(|c| Value::Str(c.to_string()))
                    .unwrap_or(Value::None))
            }
            (Value::Set(entries), Value::Str(key)) => Ok(entries
                .iter()
                .find(|e| e.name.as_deref() == Some(key.as_str()))
                .map(|e| e.value.clone())
                .unwrap_or(Value::None)),
            (Value::Set(entries), Value::Int(n)) => Ok(normalize_index(*n, entries.len())
                .and_then(|ix| entries.get(ix))
                .map(|e| e.value.clone())
                .unwrap_or(Value::None)),
            _ => Err(RuntimeError::BadIndex {
                container: base.kind(),
                index: index.kind(),
                loc,
            }),
        }
    }

    fn slice_value(
        &mut self,
        base: &Value,
        start: &Value,
        end: &Value,
        loc: Loc,
    ) -> Result<Value, RuntimeError> {
        let (from, to) = match (start, end) {
            (Value::Int(a), Value::Int(b)) => (*a, *b),
            _ => {
                return Err(RuntimeError::BadIndex {
                    container: base.kind(),
                    index: start.kind(),
                    loc,
                });
            }
        };
        match base {
            Value::List(items) => {
                let (from, to) = clamp_slice(from, to, items.len());
                Ok(Value::List(items[from..to].to_vec()))
            }
            Value::Str(s) => {
                let chars: Vec<char> = s.chars().collect();
                let (from, to) = clamp_slice(from, to, chars.len());
                Ok(Value::Str(chars[from..to].iter().collect()))
            }
            _ => Err(RuntimeError::BadIndex {
                container: base.kind(),
                index: "range",
                loc,
            }),
        }
    }

    fn property_get(
        &mut self,
        base: &Value,
        name: &str,
        loc: Loc,
    ) -> Result<Value, RuntimeError> {
        match (base, name) {
            (Value::Set(entries), _) => Ok(entries
                .iter()
                .find(|e| e.name.as_deref() == Some(name))
                .map(|e| e.value.clone())
                .unwrap_or(Value::None)),
            // converting a duration to an integer yields whole days
            (Value::Duration(d), "days") => Ok(Value::Int(d.trunc() as i64)),
            (Value::Time(t), "hour") => Ok(Value::Int((t / 3600) as i64)),
            (Value::Time(t), "minute") => Ok(Value::Int((t / 60 % 60) as i64)),
            (Value::Time(t), "second") => Ok(Value::Int((t % 60) as i64)),
            (Value::Percent(p), "fraction") => Ok(Value::Float(*p)),
            (Value::List(items), "length") => Ok(Value::Int(items.len() as i64)),
            (Value::Str(s), "length") => Ok(Value::Int(s.chars().count() as i64)),
            _ => Err(RuntimeError::NoProperty {
                kind: base.kind(),
                name: name.to_string(),
                loc,
            }),
        }
    }

    /// Method dispatch on the built-in value kinds.
    fn call_method(
        &mut self,
        object: &Value,
        method: &str,
        args: &[Node],
        loc: Loc,
    ) -> Result<Value, RuntimeError> {
        if !args.is_empty() {
            return Err(RuntimeError::BadArgument {
                message: format!("method '{}' takes no arguments", method),
                loc,
            });
        }
        match (object, method) {
            (Value::List(items), "length") => Ok(Value::Int(items.len() as i64)),
            (Value::List(items), "first") => Ok(items.first().cloned().unwrap_or(Value::None)),
            (Value::List(items), "last") => Ok(items.last().cloned().unwrap_or(Value::None)),
            (Value::List(items), "reverse") => {
                let mut reversed = items.clone();
                reversed.reverse();
                Ok(Value::List(reversed))
            }
            (Value::List(items), "sum") => {
                let mut iter = items.iter();
                let mut acc = match iter.next() {
                    Some(first) => first.clone(),
                    None => return Ok(Value::Int(0)),
                };
                for item in iter {
                    acc = dispatch::binary(BinaryOp::Add, &acc, item)
                        .map_err(|error| RuntimeError::Unsupported { error, loc })?;
                }
                Ok(acc)
            }
            (Value::List(items), "min") => self.fold_extreme(items, BinaryOp::Lt, loc),
            (Value::List(items), "max") => self.fold_extreme(items, BinaryOp::Gt, loc),
            (Value::Str(s), "upper") => Ok(Value::Str(s.to_uppercase())),
            (Value::Str(s), "lower") => Ok(Value::Str(s.to_lowercase())),
            (Value::Str(s), "trim") => Ok(Value::Str(s.trim().to_string())),
            (Value::Str(s), "length") => Ok(Value::Int(s.chars().count() as i64)),
            (Value::Set(entries), "length") => Ok(Value::Int(entries.len() as i64)),
            (Value::Set(entries), "names") => Ok(Value::List(
                entries
                    .iter()
                    .filter_map(|e| e.name.clone())
                    .map(Value::Str)
                    .collect(),
            )),
            (Value::Set(entries), "values") => Ok(Value::List(
                entries.iter().map(|e| e.value.clone()).collect(),
            )),
            _ => Err(RuntimeError::NoProperty {
                kind: object.kind(),
                name: method.to_string(),
                loc,
            }),
        }
    }

    fn fold_extreme(
        &mut self,
        items: &[Value],
        op: BinaryOp,
        loc: Loc,
    ) -> Result<Value, RuntimeError> {
        let mut iter = items.iter();
        let mut best = match iter.next() {
            Some(first) => first.clone(),
            None => return Ok(Value::None),
        };
        for item in iter {
            let wins = dispatch::binary(op, item, &best)
                .map_err(|error| RuntimeError::Unsupported { error, loc })?;
            if wins.truthy() {
                best = item.clone();
            }
        }
        Ok(best)
    }

    fn make_function(
        &mut self,
        name: &str,
        params: &[Node],
        body: &Node,
    ) -> Result<Value, RuntimeError> {
        let mut declared = Vec::with_capacity(params.len());
        for param in params {
            match &param.kind {
                NodeKind::Read(n) | NodeKind::Write(n) => declared.push(Param {
                    name: n.clone(),
                    default: Value::None,
                }),
                // defaults are evaluated at definition time, in
                // declaration order, in the defining scope
                NodeKind::Pair { key, value } => {
                    let n = match &key.kind {
                        NodeKind::Read(k) | NodeKind::Write(k) => k.clone(),
                        _ => {
                            return Err(RuntimeError::BadArgument {
                                message: "parameter name must be an identifier".to_string(),
                                loc: param.loc(),
                            });
                        }
                    };
                    self.visit(value)?;
                    declared.push(Param {
                        name: n,
                        default: self.pop(),
                    });
                }
                _ => {
                    return Err(RuntimeError::BadArgument {
                        message: "parameter must be a name or 'name: default'".to_string(),
                        loc: param.loc(),
                    });
                }
            }
        }
        Ok(Value::Function(Rc::new(Function {
            name: name.to_string(),
            params: declared,
            body: body.clone(),
            closure: self.scopes.current(),
        })))
    }

    fn call_node(
        &mut self,
        callee: &Node,
        pre: Vec<Value>,
        args: &[Node],
        loc: Loc,
    ) -> Result<Value, RuntimeError> {
        match &callee.kind {
            NodeKind::Read(name) | NodeKind::Write(name) => {
                match symbols::find(&self.scopes.current(), name, false) {
                    Some(symbol) => match symbol.value {
                        Value::Function(f) => self.call_function(&f, pre, args, loc),
                        other => Err(RuntimeError::NotCallable {
                            name: name.clone(),
                            kind: other.kind(),
                            loc,
                        }),
                    },
                    None => Err(RuntimeError::Undefined {
                        name: name.clone(),
                        loc,
                    }),
                }
            }
            _ => {
                self.visit(callee)?;
                let value = self.pop();
                match value {
                    Value::Function(f) => self.call_function(&f, pre, args, loc),
                    other => Err(RuntimeError::NotCallable {
                        name: callee.token.lexeme.clone(),
                        kind: other.kind(),
                        loc,
                    }),
                }
            }
        }
    }

    /// Bind arguments and evaluate the body in a fresh scope chained under
    /// the function's closure. `pre` carries already-evaluated leading
    /// positional values (the running value of a flow chain).
    fn call_function(
        &mut self,
        function: &Rc<Function>,
        pre: Vec<Value>,
        args: &[Node],
        loc: Loc,
    ) -> Result<Value, RuntimeError> {
        let bound = self.reduce_parameters(function, pre, args, loc)?;
        let scope = Scope::new(function.name.clone(), Some(function.closure.clone()));
        self.scopes.enter(scope);
        for (name, value) in bound {
            symbols::define(&self.scopes.current(), &name, value, true, true, loc);
        }
        let result = match self.visit(&function.body) {
            Ok(()) => Ok(self.pop()),
            Err(e) => Err(e),
        };
        self.scopes.leave();
        result
    }

    /// Build the positional/named parameter record: slots seeded with the
    /// declared defaults in declaration order, named arguments overwrite
    /// their slot, positional arguments fill the next unfilled slot.
    fn reduce_parameters(
        &mut self,
        function: &Function,
        pre: Vec<Value>,
        args: &[Node],
        loc: Loc,
    ) -> Result<Vec<(String, Value)>, RuntimeError> {
        let mut slots: Vec<(String, Value)> = function
            .params
            .iter()
            .map(|p| (p.name.clone(), p.default.clone()))
            .collect();
        let mut filled = vec![false; slots.len()];

        for value in pre {
            match filled.iter().position(|f| !f) {
                Some(i) => {
                    slots[i].1 = value;
                    filled[i] = true;
                }
                None => {
                    return Err(RuntimeError::TooManyArguments {
                        function: function.name.clone(),
                        arity: slots.len(),
                        loc,
                    });
                }
            }
        }

        for arg in args {
            match &arg.kind {
                NodeKind::Pair { key, value } => {
                    let name = match &key.kind {
                        NodeKind::Read(n) | NodeKind::Write(n) => n.clone(),
                        NodeKind::Literal(Value::Str(s)) => s.clone(),
                        _ => {
                            return Err(RuntimeError::BadArgument {
                                message: "named argument requires an identifier key".to_string(),
                                loc: arg.loc(),
                            });
                        }
                    };
                    self.visit(value)?;
                    let v = self.pop();
                    match slots.iter().position(|(n, _)| *n == name) {
                        Some(i) => {
                            slots[i].1 = v;
                            filled[i] = true;
                        }
                        None => {
                            return Err(RuntimeError::UnknownParameter {
                                name,
                                function: function.name.clone(),
                                loc: arg.loc(),
                            });
                        }
                    }
                }
                _ => {
                    self.visit(arg)?;
                    let v = self.pop();
                    match filled.iter().position(|f| !f) {
                        Some(i) => {
                            slots[i].1 = v;
                            filled[i] = true;
                        }
                        None => {
                            return Err(RuntimeError::TooManyArguments {
                                function: function.name.clone(),
                                arity: slots.len(),
                                loc: arg.loc(),
                            });
                        }
                    }
                }
            }
        }

        Ok(slots)
    }

    /// One step of a flow chain: pipe the running value into a function
    /// step, assign it through a write step, or replace it with the step's
    /// own value.
    fn flow_step(&mut self, step: &Node, running: Value) -> Result<Value, RuntimeError> {
        let loc = step.loc();
        match &step.kind {
            NodeKind::Apply => {
                let name = step.token.lexeme.clone();
                if let Some(symbol) = symbols::find(&self.scopes.current(), &name, false)
                    && let Value::Function(f) = symbol.value
                {
                    return self.call_function(&f, vec![running], &[], loc);
                }
                symbols::define(&self.scopes.current(), &name, running.clone(), false, false, loc);
                Ok(running)
            }
            NodeKind::Read(name) => {
                if let Some(symbol) = symbols::find(&self.scopes.current(), name, false)
                    && let Value::Function(f) = symbol.value
                {
                    return self.call_function(&f, vec![running], &[], loc);
                }
                self.read_name(name, loc)
            }
            NodeKind::Write(name) => {
                symbols::define(&self.scopes.current(), name, running.clone(), false, false, loc);
                Ok(running)
            }
            NodeKind::FuncCall { callee, args } => self.call_node(callee, vec![running], args, loc),
            _ => {
                self.visit(step)?;
                Ok(self.pop())
            }
        }
    }
}

fn entry_name(key: &Node) -> Option<String> {
    match &key.kind {
        NodeKind::Read(n) | NodeKind::Write(n) => Some(n.clone()),
        NodeKind::Literal(Value::Str(s)) => Some(s.clone()),
        NodeKind::Literal(v) => Some(v.to_string()),
        _ => None,
    }
}

/// Negative indices count from the end.
fn normalize_index(index: i64, len: usize) -> Option<usize> {
    if index < 0 {
        let back = index.unsigned_abs() as usize;
        if back > len { None } else { Some(len - back) }
    } else if (index as usize) < len {
        Some(index as usize)
    } else {
        None
    }
}

fn clamp_slice(start: i64, end: i64, len: usize) -> (usize, usize) {
    let n = len as i64;
    let resolve = |i: i64| -> usize {
        let i = if i < 0 { n + i } else { i };
        i.clamp(0, n) as usize
    };
    let from = resolve(start);
    let to = resolve(end);
    (from, from.max(to))
}
