//! The Focal lexer.
//!
//! A deterministic finite-state machine keyed by (state, character class).
//! Each transition either shifts to a successor state, accumulating the
//! lexeme, or emits a completed token, optionally reconsuming the trigger
//! character (and, for `1..3`, rewinding one already-consumed character so
//! the range operator survives the integer scan).
//!
//! Identifier completions are interned through the scope chain: reserved
//! symbols come back as keyword or literal tokens, and names bound to
//! function values come back with [`TokenClass::Function`].

use crate::ast::tokens::{Loc, Token, TokenClass, TokenKind};
use crate::symbols::{self, ScopeRef};
use crate::value::{self, Value};

/// Lexeme length ceiling; longer runs become error tokens.
pub const MAX_LEXEME: usize = 128;

/// Character classes the transition table is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Digit,
    Letter,
    Underscore,
    DQuote,
    Backslash,
    Hash,
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    PercentSign,
    Dot,
    Comma,
    Colon,
    Semicolon,
    Equal,
    Less,
    Greater,
    Bang,
    VBar,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Space,
    Newline,
    /// `•`, extended spelling of the chain dot
    Bullet,
    /// `Ø`, extended spelling of `empty`
    EmptySign,
    Eof,
    Other,
}

fn classify(c: char) -> CharClass {
    match c {
        '0'..='9' => CharClass::Digit,
        'a'..='z' | 'A'..='Z' => CharClass::Letter,
        '_' => CharClass::Underscore,
        '"' => CharClass::DQuote,
        '\\' => CharClass::Backslash,
        '#' => CharClass::Hash,
        '+' => CharClass::Plus,
        '-' => CharClass::Minus,
        '*' => CharClass::Star,
        '/' => CharClass::Slash,
        '^' => CharClass::Caret,
        '%' => CharClass::PercentSign,
        '.' => CharClass::Dot,
        ',' => CharClass::Comma,
        ':' => CharClass::Colon,
        ';' => CharClass::Semicolon,
        '=' => CharClass::Equal,
        '<' => CharClass::Less,
        '>' => CharClass::Greater,
        '!' => CharClass::Bang,
        '|' => CharClass::VBar,
        '(' => CharClass::LParen,
        ')' => CharClass::RParen,
        '[' => CharClass::LBracket,
        ']' => CharClass::RBracket,
        '{' => CharClass::LBrace,
        '}' => CharClass::RBrace,
        ' ' | '\t' | '\r' => CharClass::Space,
        '\n' => CharClass::Newline,
        '•' => CharClass::Bullet,
        'Ø' => CharClass::EmptySign,
        _ => CharClass::Other,
    }
}

/// FSM states. States like `InString` have no accepting transition until
/// closed, so an end-of-file inside them reports as unexpected EOF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    Start,
    Ident,
    Int,
    IntDot,
    Float,
    Unit,
    TimeSep,
    Time,
    TimeSep2,
    Time2,
    InString,
    StrEscape,
    Comment,
    PlusSeen,
    MinusSeen,
    ColonSeen,
    EqualSeen,
    LessSeen,
    GreaterSeen,
    SlashSeen,
    DotSeen,
    BangSeen,
}

/// Outcome of one table step.
enum Action {
    /// Consume the character and continue in the successor state.
    Shift(LexState),
    /// Complete a token. `backup` = 0 consumes the trigger character into
    /// the token, 1 leaves it for the next scan, 2 additionally rewinds one
    /// already-consumed character.
    Emit { kind: TokenKind, backup: u8 },
    /// Complete an error token, same backup semantics.
    Fail {
        message: &'static str,
        backup: u8,
    },
}

use Action::{Emit, Fail, Shift};

fn step(state: LexState, class: CharClass) -> Action {
    use CharClass as C;
    use LexState as S;
    use TokenKind as T;

    match state {
        S::Start => match class {
            C::Space => Shift(S::Start),
            C::Newline => Emit { kind: T::Eol, backup: 0 },
            C::Eof => Emit { kind: T::Eof, backup: 1 },
            C::Digit => Shift(S::Int),
            C::Letter | C::Underscore => Shift(S::Ident),
            C::DQuote => Shift(S::InString),
            C::Hash => Shift(S::Comment),
            C::Plus => Shift(S::PlusSeen),
            C::Minus => Shift(S::MinusSeen),
            C::Star => Emit { kind: T::Star, backup: 0 },
            C::Slash => Shift(S::SlashSeen),
            C::Caret => Emit { kind: T::Caret, backup: 0 },
            C::PercentSign => Emit { kind: T::Mod, backup: 0 },
            C::Dot => Shift(S::DotSeen),
            C::Comma => Emit { kind: T::Comma, backup: 0 },
            C::Colon => Shift(S::ColonSeen),
            C::Semicolon => Emit { kind: T::Semicolon, backup: 0 },
            C::Equal => Shift(S::EqualSeen),
            C::Less => Shift(S::LessSeen),
            C::Greater => Shift(S::GreaterSeen),
            C::Bang => Shift(S::BangSeen),
            C::VBar => Emit { kind: T::Pipe, backup: 0 },
            C::LParen => Emit { kind: T::LParen, backup: 0 },
            C::RParen => Emit { kind: T::RParen, backup: 0 },
            C::LBracket => Emit { kind: T::LBracket, backup: 0 },
            C::RBracket => Emit { kind: T::RBracket, backup: 0 },
            C::LBrace => Emit { kind: T::LBrace, backup: 0 },
            C::RBrace => Emit { kind: T::RBrace, backup: 0 },
            C::Bullet => Emit { kind: T::Bullet, backup: 0 },
            C::EmptySign => Emit { kind: T::EmptyLit, backup: 0 },
            C::Backslash | C::Other => Fail {
                message: "unexpected character",
                backup: 0,
            },
        },

        S::Ident => match class {
            C::Digit | C::Letter | C::Underscore => Shift(S::Ident),
            _ => Emit { kind: T::Identifier, backup: 1 },
        },

        S::Int => match class {
            C::Digit => Shift(S::Int),
            C::Dot => Shift(S::IntDot),
            C::Letter => Shift(S::Unit),
            C::PercentSign => Emit { kind: T::PercentLit, backup: 0 },
            C::Colon => Shift(S::TimeSep),
            _ => Emit { kind: T::Integer, backup: 1 },
        },

        // `1.5` continues as a float; `1..` and `1.x` give the integer
        // back and rescan the dot as an operator.
        S::IntDot => match class {
            C::Digit => Shift(S::Float),
            _ => Emit { kind: T::Integer, backup: 2 },
        },

        S::Float => match class {
            C::Digit => Shift(S::Float),
            C::Letter => Shift(S::Unit),
            C::PercentSign => Emit { kind: T::PercentLit, backup: 0 },
            _ => Emit { kind: T::Float, backup: 1 },
        },

        S::Unit => match class {
            C::Digit | C::Letter => Shift(S::Unit),
            _ => Emit { kind: T::DurationLit, backup: 1 },
        },

        S::TimeSep => match class {
            C::Digit => Shift(S::Time),
            _ => Emit { kind: T::Integer, backup: 2 },
        },

        S::Time => match class {
            C::Digit => Shift(S::Time),
            C::Colon => Shift(S::TimeSep2),
            _ => Emit { kind: T::TimeLit, backup: 1 },
        },

        S::TimeSep2 => match class {
            C::Digit => Shift(S::Time2),
            _ => Emit { kind: T::TimeLit, backup: 2 },
        },

        S::Time2 => match class {
            C::Digit => Shift(S::Time2),
            _ => Emit { kind: T::TimeLit, backup: 1 },
        },

        S::InString => match class {
            C::DQuote => Emit { kind: T::Str, backup: 0 },
            C::Backslash => Shift(S::StrEscape),
            C::Newline => Fail {
                message: "unterminated string literal",
                backup: 1,
            },
            C::Eof => Fail {
                message: "unexpected end of file in string literal",
                backup: 1,
            },
            _ => Shift(S::InString),
        },

        S::StrEscape => match class {
            C::Newline => Fail {
                message: "unterminated string literal",
                backup: 1,
            },
            C::Eof => Fail {
                message: "unexpected end of file in string literal",
                backup: 1,
            },
            _ => Shift(S::InString),
        },

        S::Comment => match class {
            C::Newline => Emit { kind: T::Eol, backup: 0 },
            C::Eof => Emit { kind: T::Eof, backup: 1 },
            _ => Shift(S::Comment),
        },

        S::PlusSeen => match class {
            C::Plus => Emit { kind: T::PlusPlus, backup: 0 },
            C::Equal => Emit { kind: T::PlusAssign, backup: 0 },
            _ => Emit { kind: T::Plus, backup: 1 },
        },

        S::MinusSeen => match class {
            C::Minus => Emit { kind: T::MinusMinus, backup: 0 },
            C::Equal => Emit { kind: T::MinusAssign, backup: 0 },
            C::Greater => Emit { kind: T::FlowArrow, backup: 0 },
            _ => Emit { kind: T::Minus, backup: 1 },
        },

        S::ColonSeen => match class {
            C::Equal => Emit { kind: T::Define, backup: 0 },
            _ => Emit { kind: T::Colon, backup: 1 },
        },

        S::EqualSeen => match class {
            C::Equal => Emit { kind: T::Eq, backup: 0 },
            C::Greater => Emit { kind: T::Arrow, backup: 0 },
            _ => Emit { kind: T::Assign, backup: 1 },
        },

        S::LessSeen => match class {
            C::Equal => Emit { kind: T::Le, backup: 0 },
            _ => Emit { kind: T::Lt, backup: 1 },
        },

        S::GreaterSeen => match class {
            C::Equal => Emit { kind: T::Ge, backup: 0 },
            C::Greater => Emit { kind: T::ChainRight, backup: 0 },
            _ => Emit { kind: T::Gt, backup: 1 },
        },

        S::SlashSeen => match class {
            C::Slash => Emit { kind: T::SlashSlash, backup: 0 },
            _ => Emit { kind: T::Slash, backup: 1 },
        },

        S::DotSeen => match class {
            C::Dot => Emit { kind: T::DotDot, backup: 0 },
            _ => Emit { kind: T::Dot, backup: 1 },
        },

        S::BangSeen => match class {
            C::Equal => Emit { kind: T::Ne, backup: 0 },
            _ => Fail {
                message: "unexpected '!' (did you mean '!='?)",
                backup: 1,
            },
        },
    }
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: u32,
    column: u32,
    token_loc: Loc,
    scope: ScopeRef,
    skip_eol: bool,
}

impl Lexer {
    /// A lexer over `source`, interning identifiers against `scope`.
    pub fn new(source: &str, scope: ScopeRef) -> Self {
        Lexer {
            input: source.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            token_loc: Loc::new(1, 1),
            scope,
            skip_eol: true,
        }
    }

    /// End-of-line tokens are skipped by default; the parser turns this
    /// off because statement boundaries are line-sensitive.
    pub fn set_skip_eol(&mut self, skip: bool) {
        self.skip_eol = skip;
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn advance(&mut self, ch: char) {
        self.position += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }

    /// Rewind one consumed character. Backups never cross a newline.
    fn rewind(&mut self) {
        self.position -= 1;
        self.column -= 1;
    }

    pub fn next_token(&mut self) -> Token {
        loop {
            let token = self.scan_token();
            if self.skip_eol && token.kind == TokenKind::Eol {
                continue;
            }
            return token;
        }
    }

    fn scan_token(&mut self) -> Token {
        let mut state = LexState::Start;
        let mut buffer = String::new();

        loop {
            if state == LexState::Start {
                self.token_loc = Loc::new(self.line, self.column);
            }
            let next = self.peek_char();
            let class = match next {
                Some(c) => classify(c),
                None => CharClass::Eof,
            };

            match step(state, class) {
                Shift(successor) => {
                    let ch = next.expect("shift transitions always consume a character");
                    self.advance(ch);
                    match (state, successor) {
                        // Opening quote and escape backslash stay out of
                        // the lexeme; escapes land decoded.
                        (LexState::Start, LexState::InString) => {}
                        (LexState::InString, LexState::StrEscape) => {}
                        (LexState::StrEscape, LexState::InString) => match ch {
                            'n' => buffer.push('\n'),
                            't' => buffer.push('\t'),
                            'r' => buffer.push('\r'),
                            '"' | '\\' => buffer.push(ch),
                            _ => {
                                return self.error_token(
                                    buffer,
                                    format!("invalid escape sequence '\\{}'", ch),
                                );
                            }
                        },
                        (_, LexState::Comment) => {}
                        (LexState::Start, LexState::Start) => {}
                        _ => buffer.push(ch),
                    }
                    state = successor;

                    if buffer.len() > MAX_LEXEME {
                        self.skip_word();
                        return self.error_token(
                            buffer,
                            format!("token exceeds {} characters", MAX_LEXEME),
                        );
                    }
                }

                Emit { kind, backup } => {
                    match backup {
                        0 => {
                            let ch = next.expect("backup-0 emits always consume a character");
                            self.advance(ch);
                            if kind != TokenKind::Str && kind != TokenKind::Eol {
                                buffer.push(ch);
                            }
                        }
                        1 => {}
                        _ => {
                            self.rewind();
                            buffer.pop();
                        }
                    }
                    return self.make_token(kind, buffer);
                }

                Fail { message, backup } => {
                    match backup {
                        0 => {
                            let ch = next.expect("backup-0 failures always consume a character");
                            self.advance(ch);
                            buffer.push(ch);
                        }
                        1 => {}
                        _ => {
                            self.rewind();
                            buffer.pop();
                        }
                    }
                    return self.error_token(buffer, message.to_string());
                }
            }
        }
    }

    /// Resync after an overlong token: drop the rest of the word.
    fn skip_word(&mut self) {
        while let Some(c) = self.peek_char() {
            if matches!(
                classify(c),
                CharClass::Digit | CharClass::Letter | CharClass::Underscore
            ) {
                self.advance(c);
            } else {
                break;
            }
        }
    }

    fn error_token(&self, lexeme: String, message: String) -> Token {
        Token::new(TokenKind::Error, lexeme, self.token_loc).with_literal(Value::Str(message))
    }

    fn make_token(&mut self, kind: TokenKind, lexeme: String) -> Token {
        let loc = self.token_loc;
        match kind {
            TokenKind::Integer => match lexeme.parse::<i64>() {
                Ok(n) => Token::new(kind, lexeme, loc).with_literal(Value::Int(n)),
                Err(_) => self.error_token(lexeme, "integer literal out of range".to_string()),
            },
            TokenKind::Float => match lexeme.parse::<f64>() {
                Ok(n) => Token::new(kind, lexeme, loc).with_literal(Value::Float(n)),
                Err(_) => self.error_token(lexeme, "malformed number".to_string()),
            },
            TokenKind::PercentLit => {
                let digits = lexeme.trim_end_matches('%');
                match digits.parse::<f64>() {
                    Ok(n) => Token::new(kind, lexeme, loc).with_literal(Value::Percent(n / 100.0)),
                    Err(_) => self.error_token(lexeme, "malformed percent literal".to_string()),
                }
            }
            TokenKind::DurationLit => match value::parse_duration(&lexeme) {
                Some(days) => Token::new(kind, lexeme, loc).with_literal(Value::Duration(days)),
                None => {
                    self.error_token(lexeme.clone(), format!("unknown duration unit in '{}'", lexeme))
                }
            },
            TokenKind::TimeLit => match value::parse_time(&lexeme) {
                Some(secs) => Token::new(kind, lexeme, loc).with_literal(Value::Time(secs)),
                None => self.error_token(lexeme.clone(), format!("invalid time literal '{}'", lexeme)),
            },
            TokenKind::Str => Token::new(kind, lexeme.clone(), loc).with_literal(Value::Str(lexeme)),
            TokenKind::EmptyLit => Token::new(kind, lexeme, loc).with_literal(Value::Empty),
            TokenKind::Identifier => self.intern(lexeme, loc),
            _ => Token::new(kind, lexeme, loc),
        }
    }

    /// Intern an identifier through the scope chain. Reserved symbols come
    /// back as keyword or literal tokens; names bound to functions come
    /// back with the function class. The returned token is always fresh.
    fn intern(&self, lexeme: String, loc: Loc) -> Token {
        if let Some(symbol) = symbols::find(&self.scope, &lexeme, false) {
            if symbol.reserved
                && let Some(kind) = symbol.token_kind
            {
                let token = Token::new(kind, lexeme, loc).reserved();
                return match kind {
                    TokenKind::True => token.with_literal(Value::Bool(true)),
                    TokenKind::False => token.with_literal(Value::Bool(false)),
                    TokenKind::NoneLit => token.with_literal(Value::None),
                    TokenKind::EmptyLit => token.with_literal(Value::Empty),
                    _ => token,
                };
            }
            if symbol.value.is_function() {
                return Token::new(TokenKind::Identifier, lexeme, loc)
                    .with_class(TokenClass::Function);
            }
        }
        Token::new(TokenKind::Identifier, lexeme, loc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::Scope;

    fn lex_kinds(source: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(source, Scope::globals());
        let mut kinds = Vec::new();
        loop {
            let t = lexer.next_token();
            let kind = t.kind;
            kinds.push(kind);
            if kind == TokenKind::Eof {
                return kinds;
            }
        }
    }

    #[test]
    fn test_keywords_intern_through_scope() {
        assert_eq!(
            lex_kinds("if x then y else z"),
            vec![
                TokenKind::KwIf,
                TokenKind::Identifier,
                TokenKind::KwThen,
                TokenKind::Identifier,
                TokenKind::KwElse,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_range_rewind() {
        assert_eq!(
            lex_kinds("1..3"),
            vec![
                TokenKind::Integer,
                TokenKind::DotDot,
                TokenKind::Integer,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_percent_literal_vs_modulo() {
        assert_eq!(
            lex_kinds("5%2"),
            vec![TokenKind::PercentLit, TokenKind::Integer, TokenKind::Eof]
        );
        assert_eq!(
            lex_kinds("5 % 2"),
            vec![
                TokenKind::Integer,
                TokenKind::Mod,
                TokenKind::Integer,
                TokenKind::Eof,
            ]
        );
    }
}
