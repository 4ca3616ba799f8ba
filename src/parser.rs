//! The Focal parser.
//!
//! Recursive descent with one token of lookahead, consuming the lexer's
//! stream and building one tree per top-level statement until end of file
//! (a forest). Grammar layers from tightest to loosest binding: primary →
//! postfix (call/index/slice) → unary → multiplicative → additive →
//! comparison → equality → logical → key:value → assignment → flow.
//!
//! Two rewrites happen inline here rather than in the fixup pass, because
//! the parser needs the corrected shape to make grammar decisions:
//! call-syntax assignment targets become function definitions (so `=>` can
//! follow a signature), and a flow chain ending in a bare reference gets
//! its terminal step re-tagged into an apply production.
//!
//! On a grammar violation the parser reports "expected X, found Y" with
//! the source location, then synchronizes to the next statement boundary
//! so the remaining top-level statements still get a chance to parse.

use crate::ast::nodes::{Node, NodeKind};
use crate::ast::operators::{AssignOp, BinaryOp, UnaryOp};
use crate::ast::tokens::{Loc, Token, TokenKind};
use crate::lexer::Lexer;
use crate::value::Value;

/// A syntax error with its source location.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub loc: Loc,
}

impl ParseError {
    pub fn new(message: impl Into<String>, loc: Loc) -> Self {
        ParseError {
            message: message.into(),
            loc,
        }
    }

    fn expected(what: &str, found: &Token) -> Self {
        ParseError::new(
            format!("expected {}, found {}", what, found.describe()),
            found.loc,
        )
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}", self.message, self.loc)
    }
}

impl std::error::Error for ParseError {}

pub struct Parser {
    lexer: Lexer,
    current: Token,
    peeked: Option<Token>,
    /// Depth of open `(`/`[` groups; end-of-line tokens are transparent
    /// inside a group and significant at statement level.
    group_depth: usize,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Self {
        lexer.set_skip_eol(false);
        let current = lexer.next_token();
        Parser {
            lexer,
            current,
            peeked: None,
            group_depth: 0,
        }
    }

    fn fetch(&mut self) -> Token {
        loop {
            let token = match self.peeked.take() {
                Some(t) => t,
                None => self.lexer.next_token(),
            };
            if token.kind == TokenKind::Eol && self.group_depth > 0 {
                continue;
            }
            return token;
        }
    }

    /// Consume the current token and pull the next one.
    fn bump(&mut self) -> Token {
        match self.current.kind {
            TokenKind::LParen | TokenKind::LBracket => self.group_depth += 1,
            TokenKind::RParen | TokenKind::RBracket => {
                self.group_depth = self.group_depth.saturating_sub(1)
            }
            _ => {}
        }
        let next = self.fetch();
        std::mem::replace(&mut self.current, next)
    }

    /// Raw one-token lookahead (used for the `none:` quantifier, where the
    /// `none` keyword is ambiguous with the literal).
    fn peek_kind(&mut self) -> TokenKind {
        if self.peeked.is_none() {
            self.peeked = Some(self.lexer.next_token());
        }
        self.peeked.as_ref().map(|t| t.kind).unwrap_or(TokenKind::Eof)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn accept(&mut self, kind: TokenKind) -> Option<Token> {
        if self.check(kind) { Some(self.bump()) } else { None }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.bump())
        } else {
            Err(self.error_here(what))
        }
    }

    fn error_here(&self, what: &str) -> ParseError {
        ParseError::expected(what, &self.current)
    }

    fn at_boundary(&self) -> bool {
        matches!(
            self.current.kind,
            TokenKind::Eol | TokenKind::Semicolon | TokenKind::Eof
        )
    }

    fn skip_separators(&mut self) {
        while matches!(self.current.kind, TokenKind::Eol | TokenKind::Semicolon) {
            self.bump();
        }
    }

    /// Discard tokens until a statement boundary so later statements can
    /// still be attempted.
    fn synchronize(&mut self) {
        loop {
            match self.current.kind {
                TokenKind::Eof => return,
                TokenKind::Semicolon | TokenKind::Eol => {
                    self.bump();
                    return;
                }
                TokenKind::KwVar | TokenKind::KwDef | TokenKind::KwIf => return,
                _ => {
                    self.bump();
                }
            }
        }
    }

    /// Parse every top-level statement. Trees that parsed cleanly are
    /// returned alongside the errors collected from the ones that didn't.
    pub fn parse_forest(&mut self) -> (Vec<Node>, Vec<ParseError>) {
        let mut forest = Vec::new();
        let mut errors = Vec::new();
        loop {
            self.skip_separators();
            if self.check(TokenKind::Eof) {
                break;
            }
            match self.parse_statement() {
                Ok(node) => {
                    forest.push(node);
                    if !self.at_boundary() {
                        errors.push(self.error_here("';' or end of line after the statement"));
                        self.synchronize();
                    }
                }
                Err(e) => {
                    errors.push(e);
                    self.synchronize();
                }
            }
        }
        (forest, errors)
    }

    fn parse_statement(&mut self) -> Result<Node, ParseError> {
        match self.current.kind {
            TokenKind::KwVar => self.parse_var(),
            TokenKind::KwDef => self.parse_def(),
            _ => self.parse_expression(),
        }
    }

    /// `var name` / `var name = expr` — a definition in the current scope.
    fn parse_var(&mut self) -> Result<Node, ParseError> {
        let kw = self.bump();
        let name_tok = self.expect(TokenKind::Identifier, "a variable name after 'var'")?;
        let name = name_tok.lexeme.clone();
        let target = Node::new(name_tok, NodeKind::Read(name));
        let value = if self.accept(TokenKind::Assign).is_some() {
            self.parse_expression()?
        } else {
            Node::literal(kw.retag(TokenKind::NoneLit), Value::None)
        };
        Ok(Node::new(
            kw,
            NodeKind::Assign {
                op: AssignOp::Define,
                target: Box::new(target),
                value: Box::new(value),
            },
        ))
    }

    /// `def f(a, b=1) = expr` or `def f(a) { ... }`.
    fn parse_def(&mut self) -> Result<Node, ParseError> {
        self.bump();
        let name_tok = self.expect(TokenKind::Identifier, "a function name after 'def'")?;
        self.expect(TokenKind::LParen, "'(' after the function name")?;
        let params = self.parse_call_elements()?;
        self.expect(TokenKind::RParen, "')' after the parameter list")?;
        let body = if self.accept(TokenKind::Assign).is_some() {
            self.parse_expression()?
        } else if self.check(TokenKind::LBrace) {
            self.parse_braced()?
        } else {
            return Err(self.error_here("'=' or '{' after the function signature"));
        };
        let name = name_tok.lexeme.clone();
        Ok(Node::new(
            name_tok,
            NodeKind::FuncDef {
                name,
                params,
                body: Box::new(body),
            },
        ))
    }

    pub fn parse_expression(&mut self) -> Result<Node, ParseError> {
        self.parse_flow()
    }

    /// Flow chains bind loosest. A chain ending in a bare read reference
    /// has that terminal step rewritten into an apply production here, on
    /// exit of the chain.
    fn parse_flow(&mut self) -> Result<Node, ParseError> {
        let first = self.parse_assign()?;
        if !matches!(
            self.current.kind,
            TokenKind::Pipe | TokenKind::ChainRight | TokenKind::FlowArrow
        ) {
            return Ok(first);
        }
        let chain_tok = self.current.clone();
        let mut steps = vec![first];
        while matches!(
            self.current.kind,
            TokenKind::Pipe | TokenKind::ChainRight | TokenKind::FlowArrow
        ) {
            self.bump();
            steps.push(self.parse_assign()?);
        }
        if let Some(last) = steps.last_mut()
            && matches!(last.kind, NodeKind::Read(_))
        {
            *last = Node::new(last.token.clone(), NodeKind::Apply);
        }
        Ok(Node::new(chain_tok, NodeKind::Flow(steps)))
    }

    fn parse_assign(&mut self) -> Result<Node, ParseError> {
        let left = self.parse_pair()?;
        if !matches!(
            self.current.kind,
            TokenKind::Assign
                | TokenKind::Define
                | TokenKind::Arrow
                | TokenKind::PlusAssign
                | TokenKind::MinusAssign
        ) {
            return Ok(left);
        }
        let op_tok = self.bump();
        let value = self.parse_assign()?;
        self.build_assignment(op_tok, left, value)
    }

    /// Shape an assignment node. Call syntax on the left is function
    /// definition syntax; the parameter list is hoisted out of the call
    /// right here so subsequent grammar (`=>`) sees a definition.
    fn build_assignment(
        &mut self,
        op_tok: Token,
        target: Node,
        value: Node,
    ) -> Result<Node, ParseError> {
        if matches!(
            op_tok.kind,
            TokenKind::Assign | TokenKind::Define | TokenKind::Arrow
        ) && let NodeKind::FuncCall { callee, args } = &target.kind
            && let NodeKind::Read(name) = &callee.kind
        {
            return Ok(Node::new(
                op_tok,
                NodeKind::FuncDef {
                    name: name.clone(),
                    params: args.clone(),
                    body: Box::new(value),
                },
            ));
        }

        match op_tok.kind {
            TokenKind::Arrow => Err(ParseError::new(
                "function definition requires a parameter list before '=>'",
                op_tok.loc,
            )),
            TokenKind::Assign | TokenKind::Define => match target.kind {
                NodeKind::Index { base, index } => Ok(Node::new(
                    op_tok,
                    NodeKind::IndexSet {
                        base,
                        index,
                        value: Box::new(value),
                    },
                )),
                NodeKind::Property { base, name } => Ok(Node::new(
                    op_tok,
                    NodeKind::PropertySet {
                        base,
                        name,
                        value: Box::new(value),
                    },
                )),
                NodeKind::Read(_) | NodeKind::Write(_) => {
                    let op = if op_tok.kind == TokenKind::Assign {
                        AssignOp::Assign
                    } else {
                        AssignOp::Define
                    };
                    Ok(Node::new(
                        op_tok,
                        NodeKind::Assign {
                            op,
                            target: Box::new(target),
                            value: Box::new(value),
                        },
                    ))
                }
                _ => Err(ParseError::new("invalid assignment target", target.token.loc)),
            },
            TokenKind::PlusAssign | TokenKind::MinusAssign => {
                if !matches!(
                    target.kind,
                    NodeKind::Read(_)
                        | NodeKind::Write(_)
                        | NodeKind::Index { .. }
                        | NodeKind::Property { .. }
                ) {
                    return Err(ParseError::new(
                        "invalid assignment target",
                        target.token.loc,
                    ));
                }
                let op = if op_tok.kind == TokenKind::PlusAssign {
                    AssignOp::AddAssign
                } else {
                    AssignOp::SubAssign
                };
                Ok(Node::new(
                    op_tok,
                    NodeKind::Assign {
                        op,
                        target: Box::new(target),
                        value: Box::new(value),
                    },
                ))
            }
            _ => Err(ParseError::new("invalid assignment operator", op_tok.loc)),
        }
    }

    fn parse_pair(&mut self) -> Result<Node, ParseError> {
        let left = self.parse_logic()?;
        if self.check(TokenKind::Colon) {
            let tok = self.bump();
            let value = self.parse_logic()?;
            return Ok(Node::new(
                tok,
                NodeKind::Pair {
                    key: Box::new(left),
                    value: Box::new(value),
                },
            ));
        }
        Ok(left)
    }

    fn parse_logic(&mut self) -> Result<Node, ParseError> {
        let mut left = self.parse_equality()?;
        loop {
            let op = match self.current.kind {
                TokenKind::KwAnd => BinaryOp::And,
                TokenKind::KwOr => BinaryOp::Or,
                _ => break,
            };
            let tok = self.bump();
            let right = self.parse_equality()?;
            left = Node::new(
                tok,
                NodeKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            );
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Node, ParseError> {
        let left = self.parse_comparison()?;
        let op = match self.current.kind {
            TokenKind::Eq => BinaryOp::Eq,
            TokenKind::Ne => BinaryOp::Ne,
            _ => return Ok(left),
        };
        let tok = self.bump();
        let right = self.parse_comparison()?;
        Ok(Node::new(
            tok,
            NodeKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
        ))
    }

    fn parse_comparison(&mut self) -> Result<Node, ParseError> {
        let left = self.parse_additive()?;
        let op = match self.current.kind {
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::Le => BinaryOp::Le,
            TokenKind::Gt => BinaryOp::Gt,
            TokenKind::Ge => BinaryOp::Ge,
            TokenKind::KwIn => BinaryOp::In,
            TokenKind::KwFalls => BinaryOp::Falls,
            TokenKind::KwRises => BinaryOp::Rises,
            _ => return Ok(left),
        };
        let tok = self.bump();
        let right = self.parse_additive()?;
        Ok(Node::new(
            tok,
            NodeKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
        ))
    }

    fn parse_additive(&mut self) -> Result<Node, ParseError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            // the raw +/- tokens are ambiguous; resolve them here with a
            // fresh token rather than mutating the lexer's
            let (op, kind) = match self.current.kind {
                TokenKind::Plus => (BinaryOp::Add, TokenKind::Add),
                TokenKind::Minus => (BinaryOp::Sub, TokenKind::Subtract),
                _ => break,
            };
            let raw = self.bump();
            let tok = raw.retag(kind);
            let right = self.parse_multiplicative()?;
            left = Node::new(
                tok,
                NodeKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            );
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Node, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Star => Some(BinaryOp::Mul),
                TokenKind::Slash => Some(BinaryOp::Div),
                TokenKind::SlashSlash => Some(BinaryOp::FloorDiv),
                TokenKind::Caret => Some(BinaryOp::Pow),
                TokenKind::Mod => Some(BinaryOp::Mod),
                TokenKind::DotDot => Some(BinaryOp::Range),
                TokenKind::Dot | TokenKind::Bullet => None,
                _ => break,
            };
            match op {
                Some(op) => {
                    let tok = self.bump();
                    let right = self.parse_unary()?;
                    left = Node::new(
                        tok,
                        NodeKind::Binary {
                            op,
                            left: Box::new(left),
                            right: Box::new(right),
                        },
                    );
                }
                None => {
                    self.bump();
                    let name_tok =
                        self.expect(TokenKind::Identifier, "a property name after '.'")?;
                    let name = name_tok.lexeme.clone();
                    if self.check(TokenKind::LParen) {
                        self.bump();
                        let args = self.parse_call_elements()?;
                        self.expect(TokenKind::RParen, "')' after arguments")?;
                        left = Node::new(
                            name_tok,
                            NodeKind::PropertyCall {
                                base: Box::new(left),
                                name,
                                args,
                            },
                        );
                    } else {
                        left = Node::new(
                            name_tok,
                            NodeKind::Property {
                                base: Box::new(left),
                                name,
                            },
                        );
                    }
                }
            }
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Node, ParseError> {
        match self.current.kind {
            TokenKind::KwNot => self.parse_prefix(UnaryOp::Not, None),
            TokenKind::Minus => self.parse_prefix(UnaryOp::Neg, Some(TokenKind::Negate)),
            TokenKind::Plus => self.parse_prefix(UnaryOp::Pos, Some(TokenKind::Positive)),
            TokenKind::PlusPlus => self.parse_prefix(UnaryOp::Incr, None),
            TokenKind::MinusMinus => self.parse_prefix(UnaryOp::Decr, None),
            TokenKind::KwAll => self.parse_quantifier(UnaryOp::All),
            TokenKind::KwAny => self.parse_quantifier(UnaryOp::Any),
            TokenKind::NoneLit => {
                if self.peek_kind() == TokenKind::Colon {
                    self.parse_quantifier(UnaryOp::NoneOf)
                } else {
                    self.parse_postfix()
                }
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_prefix(
        &mut self,
        op: UnaryOp,
        retag: Option<TokenKind>,
    ) -> Result<Node, ParseError> {
        let raw = self.bump();
        let tok = match retag {
            Some(kind) => raw.retag(kind),
            None => raw,
        };
        let expr = self.parse_unary()?;
        Ok(Node::new(
            tok,
            NodeKind::Unary {
                op,
                expr: Box::new(expr),
            },
        ))
    }

    /// `all: xs`, `any: xs`, `none: xs`
    fn parse_quantifier(&mut self, op: UnaryOp) -> Result<Node, ParseError> {
        let tok = self.bump();
        self.expect(TokenKind::Colon, "':' after the quantifier")?;
        let expr = self.parse_unary()?;
        Ok(Node::new(
            tok,
            NodeKind::Unary {
                op,
                expr: Box::new(expr),
            },
        ))
    }

    fn parse_postfix(&mut self) -> Result<Node, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.check(TokenKind::LParen) {
                self.bump();
                let args = self.parse_call_elements()?;
                self.expect(TokenKind::RParen, "')' after arguments")?;
                let tok = expr.token.clone();
                expr = Node::new(
                    tok,
                    NodeKind::FuncCall {
                        callee: Box::new(expr),
                        args,
                    },
                );
            } else if self.check(TokenKind::LBracket) {
                let bracket = self.bump();
                let index = self.parse_expression()?;
                self.expect(TokenKind::RBracket, "']' after the index")?;
                expr = match index.kind {
                    NodeKind::Binary {
                        op: BinaryOp::Range,
                        left,
                        right,
                    } => Node::new(
                        bracket,
                        NodeKind::Slice {
                            base: Box::new(expr),
                            start: left,
                            end: right,
                        },
                    ),
                    _ => Node::new(
                        bracket,
                        NodeKind::Index {
                            base: Box::new(expr),
                            index: Box::new(index),
                        },
                    ),
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Node, ParseError> {
        match self.current.kind {
            TokenKind::Integer
            | TokenKind::Float
            | TokenKind::PercentLit
            | TokenKind::DurationLit
            | TokenKind::TimeLit
            | TokenKind::Str
            | TokenKind::True
            | TokenKind::False
            | TokenKind::NoneLit
            | TokenKind::EmptyLit => {
                let tok = self.bump();
                let value = tok.literal.clone().unwrap_or(Value::None);
                Ok(Node::literal(tok, value))
            }
            TokenKind::Identifier => {
                let tok = self.bump();
                let name = tok.lexeme.clone();
                Ok(Node::new(tok, NodeKind::Read(name)))
            }
            TokenKind::LParen => {
                self.bump();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen, "')' to close the group")?;
                Ok(expr)
            }
            TokenKind::LBracket => {
                let tok = self.bump();
                let mut items = Vec::new();
                if !self.check(TokenKind::RBracket) {
                    loop {
                        items.push(self.parse_assign()?);
                        if self.accept(TokenKind::Comma).is_none() {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RBracket, "']' after the list elements")?;
                Ok(Node::new(tok, NodeKind::ListLit(items)))
            }
            TokenKind::LBrace => self.parse_braced(),
            TokenKind::KwIf => self.parse_if(),
            TokenKind::Error => {
                let message = match &self.current.literal {
                    Some(Value::Str(s)) => s.clone(),
                    _ => "invalid token".to_string(),
                };
                let loc = self.current.loc;
                self.bump();
                Err(ParseError::new(message, loc))
            }
            _ => Err(self.error_here("an expression")),
        }
    }

    fn parse_if(&mut self) -> Result<Node, ParseError> {
        let kw = self.bump();
        let test = self.parse_expression()?;
        self.expect(TokenKind::KwThen, "'then' after the condition")?;
        let then = self.parse_expression()?;
        let otherwise = if self.accept(TokenKind::KwElse).is_some() {
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };
        Ok(Node::new(
            kw,
            NodeKind::If {
                test: Box::new(test),
                then: Box::new(then),
                otherwise,
            },
        ))
    }

    /// Comma-separated argument/parameter elements, ending before `)`.
    fn parse_call_elements(&mut self) -> Result<Vec<Node>, ParseError> {
        let mut items = Vec::new();
        if self.check(TokenKind::RParen) {
            return Ok(items);
        }
        loop {
            items.push(self.parse_assign()?);
            if self.accept(TokenKind::Comma).is_none() {
                break;
            }
        }
        Ok(items)
    }

    /// Braced aggregate, parsed optimistically as an element sequence and
    /// classified at the closing brace: a Set only if every element is a
    /// bare literal/reference or a `key: value` pair with no embedded
    /// executable construct. This cannot be decided from lookahead alone,
    /// so the decision is deferred to end-of-aggregate.
    fn parse_braced(&mut self) -> Result<Node, ParseError> {
        let brace = self.bump();
        let mut items = Vec::new();
        let mut saw_semicolon = false;
        loop {
            while matches!(self.current.kind, TokenKind::Eol | TokenKind::Semicolon) {
                if self.check(TokenKind::Semicolon) {
                    saw_semicolon = true;
                }
                self.bump();
            }
            if self.check(TokenKind::RBrace) || self.check(TokenKind::Eof) {
                break;
            }
            items.push(self.parse_statement()?);
            match self.current.kind {
                TokenKind::Comma => {
                    self.bump();
                }
                TokenKind::Semicolon => {
                    saw_semicolon = true;
                    self.bump();
                }
                TokenKind::Eol => {
                    self.bump();
                }
                TokenKind::RBrace | TokenKind::Eof => {}
                _ => {
                    return Err(self.error_here("',', ';', or '}' between aggregate elements"));
                }
            }
        }
        self.expect(TokenKind::RBrace, "'}' to close the aggregate")?;

        let is_set = !saw_semicolon && items.iter().all(is_set_element);
        let kind = if is_set {
            NodeKind::SetLit(items)
        } else {
            NodeKind::Block(items)
        };
        Ok(Node::new(brace, kind))
    }
}

/// A set element is a bare literal, a bare reference, or a `key: value`
/// pair whose value embeds no executable construct.
fn is_set_element(node: &Node) -> bool {
    match &node.kind {
        NodeKind::Literal(_) | NodeKind::Read(_) => true,
        NodeKind::Pair { key, value } => {
            matches!(key.kind, NodeKind::Read(_) | NodeKind::Literal(_))
                && !contains_executable(value)
        }
        _ => false,
    }
}

fn contains_executable(node: &Node) -> bool {
    match &node.kind {
        NodeKind::Assign { .. }
        | NodeKind::IndexSet { .. }
        | NodeKind::PropertySet { .. }
        | NodeKind::FuncDef { .. }
        | NodeKind::FuncCall { .. }
        | NodeKind::PropertyCall { .. }
        | NodeKind::Block(_)
        | NodeKind::Flow(_)
        | NodeKind::Apply => true,
        NodeKind::Literal(_) | NodeKind::Read(_) | NodeKind::Write(_) => false,
        NodeKind::Binary { left, right, .. } => {
            contains_executable(left) || contains_executable(right)
        }
        NodeKind::Unary { expr, .. } => contains_executable(expr),
        NodeKind::Pair { key, value } => contains_executable(key) || contains_executable(value),
        NodeKind::If {
            test,
            then,
            otherwise,
        } => {
            contains_executable(test)
                || contains_executable(then)
                || otherwise.as_deref().is_some_and(contains_executable)
        }
        NodeKind::Index { base, index } => contains_executable(base) || contains_executable(index),
        NodeKind::Slice { base, start, end } => {
            contains_executable(base) || contains_executable(start) || contains_executable(end)
        }
        NodeKind::Property { base, .. } => contains_executable(base),
        NodeKind::ListLit(items) | NodeKind::SetLit(items) => {
            items.iter().any(contains_executable)
        }
    }
}
