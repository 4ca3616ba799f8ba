//! Lexical scopes and symbols.
//!
//! A [`Scope`] is an insertion-ordered name→symbol table with an optional
//! parent link; the same structure serves the lexer (keyword interning),
//! the fixup pass, and the interpreter (the runtime environment). The
//! "current scope" is never global state: the interpreter owns a
//! [`ScopeStack`] and threads it through evaluation.

use std::cell::RefCell;
use std::rc::Rc;

use crate::ast::tokens::{Loc, TokenKind};
use crate::value::Value;

pub type ScopeRef = Rc<RefCell<Scope>>;

/// A named binding.
///
/// A symbol is a value holder and, through `members`, optionally a child
/// namespace as well, so structured values can expose sub-members through
/// property syntax. The two roles are composed rather than fused.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub value: Value,
    pub members: Option<ScopeRef>,
    /// Reserved symbols (keywords) make the lexer re-classify identifier
    /// lexemes into keyword/literal tokens.
    pub reserved: bool,
    pub token_kind: Option<TokenKind>,
    /// Location of the defining occurrence, for diagnostics.
    pub loc: Loc,
}

impl Symbol {
    pub fn new(name: impl Into<String>, value: Value, loc: Loc) -> Self {
        let name = name.into();
        let members = namespace_for(&name, &value);
        Symbol {
            name,
            value,
            members,
            reserved: false,
            token_kind: None,
            loc,
        }
    }

    fn keyword(name: &str, kind: TokenKind) -> Self {
        Symbol {
            name: name.to_string(),
            value: Value::None,
            members: None,
            reserved: true,
            token_kind: Some(kind),
            loc: Loc::default(),
        }
    }
}

/// An ordered name→symbol table with a parent link.
#[derive(Debug)]
pub struct Scope {
    pub name: String,
    entries: Vec<Symbol>,
    pub parent: Option<ScopeRef>,
}

impl Scope {
    pub fn new(name: impl Into<String>, parent: Option<ScopeRef>) -> ScopeRef {
        Rc::new(RefCell::new(Scope {
            name: name.into(),
            entries: Vec::new(),
            parent,
        }))
    }

    /// The root scope, pre-seeded with the reserved keyword symbols the
    /// lexer interns identifiers against.
    pub fn globals() -> ScopeRef {
        let scope = Scope::new("globals", None);
        {
            let mut s = scope.borrow_mut();
            for (name, kind) in KEYWORDS {
                s.entries.push(Symbol::keyword(name, *kind));
            }
        }
        scope
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|s| s.name == name)
    }

    /// Look a name up in this scope only.
    pub fn get_local(&self, name: &str) -> Option<Symbol> {
        self.index_of(name).map(|i| self.entries[i].clone())
    }

    /// Insert a symbol, overwriting any existing binding of the same name
    /// in place so the insertion order of the other bindings is preserved.
    pub fn insert(&mut self, symbol: Symbol) {
        match self.index_of(&symbol.name) {
            Some(i) => self.entries[i] = symbol,
            None => self.entries.push(symbol),
        }
    }

    /// Overwrite the stored value of an existing local binding, refreshing
    /// its member namespace.
    fn set_value(&mut self, name: &str, value: Value, loc: Loc) -> bool {
        match self.index_of(name) {
            Some(i) => {
                let mut symbol = Symbol::new(name, value, loc);
                symbol.reserved = self.entries[i].reserved;
                symbol.token_kind = self.entries[i].token_kind;
                self.entries[i] = symbol;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Binding names in insertion order.
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|s| s.name.clone()).collect()
    }
}

/// The child-namespace capability of a symbol: named entries of a
/// set-valued binding become addressable sub-members.
fn namespace_for(name: &str, value: &Value) -> Option<ScopeRef> {
    match value {
        Value::Set(entries) => {
            let scope = Scope::new(name, None);
            {
                let mut s = scope.borrow_mut();
                for entry in entries {
                    if let Some(n) = &entry.name {
                        s.insert(Symbol::new(n.clone(), entry.value.clone(), Loc::default()));
                    }
                }
            }
            Some(scope)
        }
        _ => None,
    }
}

const KEYWORDS: &[(&str, TokenKind)] = &[
    ("if", TokenKind::KwIf),
    ("then", TokenKind::KwThen),
    ("else", TokenKind::KwElse),
    ("var", TokenKind::KwVar),
    ("def", TokenKind::KwDef),
    ("and", TokenKind::KwAnd),
    ("or", TokenKind::KwOr),
    ("not", TokenKind::KwNot),
    ("in", TokenKind::KwIn),
    ("all", TokenKind::KwAll),
    ("any", TokenKind::KwAny),
    ("falls", TokenKind::KwFalls),
    ("rises", TokenKind::KwRises),
    ("true", TokenKind::True),
    ("false", TokenKind::False),
    ("none", TokenKind::NoneLit),
    ("empty", TokenKind::EmptyLit),
];

/// Resolve a name, walking outward from `scope` unless `local` restricts
/// the search to the given scope. The nearest binding wins (lexical
/// shadowing).
pub fn find(scope: &ScopeRef, name: &str, local: bool) -> Option<Symbol> {
    let mut current = Some(scope.clone());
    while let Some(s) = current {
        if let Some(symbol) = s.borrow().get_local(name) {
            return Some(symbol);
        }
        if local {
            return None;
        }
        let parent = s.borrow().parent.clone();
        current = parent;
    }
    None
}

/// The scope that owns the nearest binding of `name`, if any.
pub fn owner_of(scope: &ScopeRef, name: &str, local: bool) -> Option<ScopeRef> {
    let mut current = Some(scope.clone());
    while let Some(s) = current {
        if s.borrow().index_of(name).is_some() {
            return Some(s);
        }
        if local {
            return None;
        }
        let parent = s.borrow().parent.clone();
        current = parent;
    }
    None
}

/// Bind `name` to `value`.
///
/// With `update` unset, an existing binding found by walking outward is
/// overwritten where it lives; otherwise (no binding, or `update`
/// requested) the binding is created in `scope` itself — never in an
/// ancestor. `local` restricts the outward search to `scope`.
pub fn define(scope: &ScopeRef, name: &str, value: Value, local: bool, update: bool, loc: Loc) {
    if !update
        && let Some(owner) = owner_of(scope, name, local)
    {
        owner.borrow_mut().set_value(name, value, loc);
        return;
    }
    scope.borrow_mut().insert(Symbol::new(name, value, loc));
}

/// Fully qualified name of a binding, derived by walking the parent chain.
pub fn qualified_name(scope: &ScopeRef, name: &str) -> String {
    let mut segments = vec![name.to_string()];
    let mut current = Some(scope.clone());
    while let Some(s) = current {
        segments.push(s.borrow().name.clone());
        let parent = s.borrow().parent.clone();
        current = parent;
    }
    segments.reverse();
    segments.join(".")
}

/// The interpreter-owned stack of lexical scopes.
///
/// The innermost scope is the current one; `enter`/`leave` bracket blocks,
/// set aggregates, and function calls. The root scope is never popped.
#[derive(Debug)]
pub struct ScopeStack {
    stack: Vec<ScopeRef>,
}

impl ScopeStack {
    pub fn new(root: ScopeRef) -> Self {
        ScopeStack { stack: vec![root] }
    }

    pub fn current(&self) -> ScopeRef {
        self.stack.last().cloned().expect("scope stack is never empty")
    }

    pub fn enter(&mut self, scope: ScopeRef) {
        self.stack.push(scope);
    }

    /// Enter a fresh scope chained under the current one.
    pub fn enter_child(&mut self, name: &str) -> ScopeRef {
        let child = Scope::new(name, Some(self.current()));
        self.stack.push(child.clone());
        child
    }

    pub fn leave(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}
