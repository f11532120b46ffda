/// CQL tokenizer
///
/// Produces a flat token stream with keywords matched case-insensitively and
/// string literals kept intact, so later passes never rewrite text inside
/// quotes.

use crate::{Error, Result};
use std::fmt;

/// Words rendered in uppercase when a statement is re-emitted
const KEYWORDS: &[&str] = &[
    "ADD", "ALLOW", "ALTER", "AND", "APPLY", "AS", "ASC", "BATCH", "BEGIN", "BY",
    "CLUSTERING", "CONTAINS", "CREATE", "CUSTOM", "DELETE", "DESC", "DISTINCT", "DROP",
    "ENTRIES", "EXISTS", "FILTERING", "FROM", "IF", "IGNORE", "IN", "INDEX", "INSERT",
    "INTO", "IS", "JOIN", "KEY", "KEYS", "KEYSPACE", "LIKE", "LIMIT", "NOT", "NULL", "ON",
    "OR", "ORDER", "PER", "PARTITION", "PRIMARY", "REPLACE", "SELECT", "SET", "STATIC",
    "TABLE", "TRUNCATE", "TTL", "UPDATE", "USE", "USING", "VALUES", "WHERE", "WITH",
];

/// Whether a bare word is one of the reserved CQL keywords
pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.iter().any(|k| word.eq_ignore_ascii_case(k))
}

/// Placeholder spelling, normalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
    /// `?` or `%s`
    Positional,
    /// `:name` or `%(name)s`
    Named(String),
}

/// Single CQL token
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Keyword or unquoted identifier, as written
    Word(String),
    /// `"Identifier"` (unescaped contents)
    QuotedIdent(String),
    /// `'literal'` (unescaped contents)
    StringLit(String),
    /// Numeric literal, sign included
    Number(String),
    /// `0xCAFE` blob literal (hex digits only)
    HexBlob(String),
    Placeholder(Placeholder),
    /// Comparison or arithmetic operator (`=`, `<=`, `!=`, `+`, ...)
    Op(String),
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Dot,
    Colon,
    Semicolon,
    Star,
}

impl Token {
    /// Case-insensitive keyword test
    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Token::Word(w) if w.eq_ignore_ascii_case(keyword))
    }

    /// Bare `true` / `false`
    pub fn boolean_literal(&self) -> Option<bool> {
        match self {
            Token::Word(w) if w.eq_ignore_ascii_case("TRUE") => Some(true),
            Token::Word(w) if w.eq_ignore_ascii_case("FALSE") => Some(false),
            _ => None,
        }
    }

    /// Identifier text for words and quoted identifiers
    pub fn identifier(&self) -> Option<&str> {
        match self {
            Token::Word(w) => Some(w),
            Token::QuotedIdent(w) => Some(w),
            _ => None,
        }
    }

    fn is_reserved_word(&self) -> bool {
        match self {
            Token::Word(w) => is_keyword(w),
            _ => false,
        }
    }

    fn ends_operand(&self) -> bool {
        match self {
            Token::Word(_) => !self.is_reserved_word(),
            Token::QuotedIdent(_)
            | Token::StringLit(_)
            | Token::Number(_)
            | Token::HexBlob(_)
            | Token::Placeholder(_)
            | Token::RightParen
            | Token::RightBracket
            | Token::RightBrace => true,
            _ => false,
        }
    }
}

impl fmt::Display for Token {
    /// Engine spelling of the token: keywords in uppercase, placeholders as
    /// `?` / `:name`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(w) if self.is_reserved_word() => write!(f, "{}", w.to_ascii_uppercase()),
            Token::Word(w) => write!(f, "{}", w),
            Token::QuotedIdent(w) => write!(f, "\"{}\"", w.replace('"', "\"\"")),
            Token::StringLit(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Token::Number(n) => write!(f, "{}", n),
            Token::HexBlob(h) => write!(f, "X'{}'", h),
            Token::Placeholder(Placeholder::Positional) => write!(f, "?"),
            Token::Placeholder(Placeholder::Named(name)) => write!(f, ":{}", name),
            Token::Op(op) => write!(f, "{}", op),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::LeftBrace => write!(f, "{{"),
            Token::RightBrace => write!(f, "}}"),
            Token::LeftBracket => write!(f, "["),
            Token::RightBracket => write!(f, "]"),
            Token::Comma => write!(f, ","),
            Token::Dot => write!(f, "."),
            Token::Colon => write!(f, ":"),
            Token::Semicolon => write!(f, ";"),
            Token::Star => write!(f, "*"),
        }
    }
}

/// Render tokens back into statement text with conventional spacing.
/// Bare `true` / `false` in value position (after an operator, or inside a
/// VALUES, IN or tuple list) become 1/0; anywhere else they are names.
pub fn render_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut prev: Option<&Token> = None;
    // one entry per open paren: whether it holds values
    let mut value_lists: Vec<bool> = Vec::new();

    for token in tokens {
        let in_values = value_lists.last().copied().unwrap_or(false);
        let value_position = match prev {
            Some(Token::Op(_)) => true,
            Some(Token::Comma | Token::LeftParen) => in_values,
            _ => false,
        };
        match token {
            Token::LeftParen => {
                let holds_values = match prev {
                    Some(Token::Op(_)) => true,
                    Some(t) if t.is_keyword("VALUES") || t.is_keyword("IN") => true,
                    Some(Token::Comma | Token::LeftParen) => in_values,
                    _ => false,
                };
                value_lists.push(holds_values);
            }
            Token::RightParen => {
                value_lists.pop();
            }
            _ => {}
        }

        let glue = match (prev, token) {
            (None, _) => true,
            (_, Token::Comma | Token::RightParen | Token::Dot | Token::Semicolon) => true,
            (_, Token::RightBracket | Token::Colon) => true,
            (Some(Token::LeftParen | Token::Dot | Token::LeftBracket), _) => true,
            _ => false,
        };
        if !glue {
            out.push(' ');
        }
        match token.boolean_literal() {
            Some(b) if value_position => out.push(if b { '1' } else { '0' }),
            _ => out.push_str(&token.to_string()),
        }
        prev = Some(token);
    }

    out
}

/// Character-level tokenizer
pub struct Lexer {
    input: Vec<char>,
    pos: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
        }
    }

    /// Tokenize a full statement
    pub fn tokenize(input: &str) -> Result<Vec<Token>> {
        let mut lexer = Self::new(input);
        let mut tokens: Vec<Token> = Vec::new();
        loop {
            match lexer.next_token(tokens.last())? {
                Some(token) => tokens.push(token),
                None => break,
            }
        }
        Ok(tokens)
    }

    fn current(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.input.get(self.pos + offset).copied()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match (self.current(), self.peek(1)) {
                (Some(ch), _) if ch.is_whitespace() => self.advance(),
                (Some('-'), Some('-')) | (Some('/'), Some('/')) => {
                    while let Some(ch) = self.current() {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                (Some('/'), Some('*')) => {
                    self.pos += 2;
                    while self.current().is_some()
                        && !(self.current() == Some('*') && self.peek(1) == Some('/'))
                    {
                        self.advance();
                    }
                    self.pos = (self.pos + 2).min(self.input.len());
                }
                _ => break,
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let start = self.pos;
        while let Some(ch) = self.current() {
            if ch.is_alphanumeric() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }
        self.input[start..self.pos].iter().collect()
    }

    /// Read a quoted run; a doubled quote character is an escaped quote
    fn read_quoted(&mut self, quote: char) -> Result<String> {
        self.advance();
        let mut text = String::new();
        loop {
            match self.current() {
                None => {
                    return Err(Error::Syntax(format!("unterminated {} quoted text", quote)));
                }
                Some(ch) if ch == quote => {
                    if self.peek(1) == Some(quote) {
                        text.push(quote);
                        self.pos += 2;
                    } else {
                        self.advance();
                        return Ok(text);
                    }
                }
                Some(ch) => {
                    text.push(ch);
                    self.advance();
                }
            }
        }
    }

    fn read_number(&mut self) -> String {
        let start = self.pos;
        if self.current() == Some('-') {
            self.advance();
        }
        while matches!(self.current(), Some(ch) if ch.is_ascii_digit()) {
            self.advance();
        }
        if self.current() == Some('.') && matches!(self.peek(1), Some(ch) if ch.is_ascii_digit()) {
            self.advance();
            while matches!(self.current(), Some(ch) if ch.is_ascii_digit()) {
                self.advance();
            }
        }
        if matches!(self.current(), Some('e') | Some('E')) {
            let sign = matches!(self.peek(1), Some('+') | Some('-'));
            let digit_at = if sign { 2 } else { 1 };
            if matches!(self.peek(digit_at), Some(ch) if ch.is_ascii_digit()) {
                self.pos += digit_at;
                while matches!(self.current(), Some(ch) if ch.is_ascii_digit()) {
                    self.advance();
                }
            }
        }
        self.input[start..self.pos].iter().collect()
    }

    fn single(&mut self, token: Token) -> Result<Option<Token>> {
        self.advance();
        Ok(Some(token))
    }

    fn next_token(&mut self, prev: Option<&Token>) -> Result<Option<Token>> {
        self.skip_whitespace_and_comments();

        let ch = match self.current() {
            None => return Ok(None),
            Some(ch) => ch,
        };

        match ch {
            '(' => self.single(Token::LeftParen),
            ')' => self.single(Token::RightParen),
            '{' => self.single(Token::LeftBrace),
            '}' => self.single(Token::RightBrace),
            '[' => self.single(Token::LeftBracket),
            ']' => self.single(Token::RightBracket),
            ',' => self.single(Token::Comma),
            '.' => self.single(Token::Dot),
            ';' => self.single(Token::Semicolon),
            '*' => self.single(Token::Star),
            '?' => self.single(Token::Placeholder(Placeholder::Positional)),
            '\'' => Ok(Some(Token::StringLit(self.read_quoted('\'')?))),
            '"' => Ok(Some(Token::QuotedIdent(self.read_quoted('"')?))),
            '=' => self.single(Token::Op("=".into())),
            '<' | '>' | '!' => {
                self.advance();
                let next = self.current();
                let op = match (ch, next) {
                    ('<', Some('=')) => "<=",
                    ('<', Some('>')) => "<>",
                    ('>', Some('=')) => ">=",
                    ('!', Some('=')) => "!=",
                    ('!', _) => return Err(Error::Syntax("unexpected character: !".into())),
                    ('<', _) => return Ok(Some(Token::Op("<".into()))),
                    _ => return Ok(Some(Token::Op(">".into()))),
                };
                self.advance();
                Ok(Some(Token::Op(op.into())))
            }
            ':' => {
                if matches!(self.peek(1), Some(c) if c.is_alphabetic() || c == '_') {
                    self.advance();
                    let name = self.read_identifier();
                    Ok(Some(Token::Placeholder(Placeholder::Named(name))))
                } else {
                    self.single(Token::Colon)
                }
            }
            '%' => self.read_percent_placeholder(),
            '-' if matches!(self.peek(1), Some(c) if c.is_ascii_digit())
                && !prev.map_or(false, Token::ends_operand) =>
            {
                Ok(Some(Token::Number(self.read_number())))
            }
            '+' | '-' | '/' | '|' => {
                self.advance();
                if ch == '|' && self.current() == Some('|') {
                    self.advance();
                    return Ok(Some(Token::Op("||".into())));
                }
                Ok(Some(Token::Op(ch.to_string())))
            }
            '0' if matches!(self.peek(1), Some('x') | Some('X')) => {
                self.pos += 2;
                let start = self.pos;
                while matches!(self.current(), Some(c) if c.is_ascii_hexdigit()) {
                    self.advance();
                }
                Ok(Some(Token::HexBlob(self.input[start..self.pos].iter().collect())))
            }
            'x' | 'X' if self.peek(1) == Some('\'') => {
                self.advance();
                let hex = self.read_quoted('\'')?;
                if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(Error::Syntax(format!("invalid blob literal: X'{}'", hex)));
                }
                Ok(Some(Token::HexBlob(hex)))
            }
            c if c.is_ascii_digit() => Ok(Some(Token::Number(self.read_number()))),
            c if c.is_alphabetic() || c == '_' => Ok(Some(Token::Word(self.read_identifier()))),
            other => Err(Error::Syntax(format!("unexpected character: {}", other))),
        }
    }

    /// `%s` and `%(name)s`, the driver's format-style placeholders; the
    /// trailing type marker is case-insensitive
    fn read_percent_placeholder(&mut self) -> Result<Option<Token>> {
        let is_marker = |c: Option<char>| matches!(c, Some('s') | Some('S'));
        let ends_word = |c: Option<char>| !matches!(c, Some(c) if c.is_alphanumeric() || c == '_');

        if is_marker(self.peek(1)) && ends_word(self.peek(2)) {
            self.pos += 2;
            return Ok(Some(Token::Placeholder(Placeholder::Positional)));
        }

        if self.peek(1) == Some('(') {
            let save = self.pos;
            self.pos += 2;
            let name = self.read_identifier();
            if !name.is_empty()
                && self.current() == Some(')')
                && is_marker(self.peek(1))
                && ends_word(self.peek(2))
            {
                self.pos += 2;
                return Ok(Some(Token::Placeholder(Placeholder::Named(name))));
            }
            self.pos = save;
        }

        self.advance();
        Ok(Some(Token::Op("%".into())))
    }
}

/// Split a script into statements at top-level semicolons.
///
/// Semicolons inside string literals, quoted identifiers and comments do not
/// split. Empty statements are dropped.
pub fn split_statements(script: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut chars = script.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(ch) = chars.next() {
        match quote {
            Some(q) => {
                current.push(ch);
                if ch == q {
                    if chars.peek() == Some(&q) {
                        current.push(q);
                        chars.next();
                    } else {
                        quote = None;
                    }
                }
            }
            None => match ch {
                '\'' | '"' => {
                    quote = Some(ch);
                    current.push(ch);
                }
                '-' if chars.peek() == Some(&'-') => {
                    for c in chars.by_ref() {
                        if c == '\n' {
                            current.push('\n');
                            break;
                        }
                    }
                }
                ';' => {
                    let stmt = current.trim();
                    if !stmt.is_empty() {
                        statements.push(stmt.to_string());
                    }
                    current.clear();
                }
                _ => current.push(ch),
            },
        }
    }

    let stmt = current.trim();
    if !stmt.is_empty() {
        statements.push(stmt.to_string());
    }
    statements
}
