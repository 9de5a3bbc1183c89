//! Script lexer, expression AST, expression parser, and evaluator.
//!
//! Operator precedence (lowest → highest):
//!   or  →  and  →  equality  →  relational  →  additive  →
//!   multiplicative  →  unary  →  postfix (`a[i]`)  →  primary

use super::value::Value;
use crate::error::{ParseError, ScriptError, UndefinedVariable};

// ── EvalContext ───────────────────────────────────────────────────────────────

/// Dependency-injection interface used by the expression evaluator.
///
/// The [`Interpreter`](super::interp::Interpreter) implements this on top of
/// a [`Binding`](crate::Binding); tests use a bare map.
pub trait EvalContext {
    /// Look up a variable.  Undefined names are an error, never a default.
    fn get_var(&self, name: &str) -> Result<Value, UndefinedVariable>;

    /// Invoke a built-in function.
    fn call_fn(&mut self, name: &str, args: Vec<Value>) -> Result<Value, ScriptError>;
}

// ── Token ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),

    // Keywords
    True,
    False,
    Null,
    If,
    Else,
    While,
    Break,
    Return,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Eq, // ==
    Ne, // !=
    Lt,
    Le,
    Gt,
    Ge,
    And, // &&
    Or,  // ||

    // Assignment
    Assign,      // =
    PlusAssign,  // +=
    MinusAssign, // -=

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Semi,
    Newline,
    Eof,
}

/// A token with its 1-based source position.
#[derive(Debug, Clone)]
pub struct Spanned {
    pub tok: Token,
    pub line: usize,
    pub column: usize,
}

// ── Lexer ─────────────────────────────────────────────────────────────────────

struct Lexer {
    src: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    /// Open `(` / `[` count; newlines inside them are not separators.
    nesting: usize,
}

impl Lexer {
    fn new(src: &str) -> Self {
        Lexer {
            src: src.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            nesting: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src.get(self.pos).copied()
    }

    fn peek2(&self) -> Option<char> {
        self.src.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.src.get(self.pos).copied()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error(&self, line: usize, column: usize, message: impl Into<String>) -> ParseError {
        ParseError {
            line,
            column,
            message: message.into(),
        }
    }

    fn skip_ws_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(' ' | '\t' | '\r') => {
                    self.advance();
                }
                Some('\n') if self.nesting > 0 => {
                    self.advance();
                }
                Some('#') => self.skip_line(),
                Some('/') if self.peek2() == Some('/') => self.skip_line(),
                _ => break,
            }
        }
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn read_number(&mut self, first: char, line: usize, column: usize) -> Result<Token, ParseError> {
        let mut s = String::new();
        s.push(first);

        // Hex literal
        if first == '0' && matches!(self.peek(), Some('x' | 'X')) {
            self.advance();
            let mut hex = String::new();
            while let Some(c) = self.peek().filter(char::is_ascii_hexdigit) {
                hex.push(c);
                self.advance();
            }
            return i64::from_str_radix(&hex, 16)
                .map(Token::Int)
                .map_err(|_| self.error(line, column, format!("invalid hex literal '0x{hex}'")));
        }

        let mut is_float = false;
        while let Some(c) = self.peek().filter(char::is_ascii_digit) {
            s.push(c);
            self.advance();
        }
        if self.peek() == Some('.') && self.peek2().is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            s.push('.');
            self.advance();
            while let Some(c) = self.peek().filter(char::is_ascii_digit) {
                s.push(c);
                self.advance();
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            is_float = true;
            s.push('e');
            self.advance();
            if let Some(sign @ ('+' | '-')) = self.peek() {
                s.push(sign);
                self.advance();
            }
            while let Some(c) = self.peek().filter(char::is_ascii_digit) {
                s.push(c);
                self.advance();
            }
        }

        if is_float {
            s.parse()
                .map(Token::Float)
                .map_err(|_| self.error(line, column, format!("invalid number '{s}'")))
        } else {
            s.parse()
                .map(Token::Int)
                .map_err(|_| self.error(line, column, format!("integer literal '{s}' out of range")))
        }
    }

    fn read_string(&mut self, quote: char, line: usize, column: usize) -> Result<Token, ParseError> {
        let mut s = String::new();
        loop {
            match self.advance() {
                None | Some('\n') => {
                    return Err(self.error(line, column, "unterminated string literal"));
                }
                Some('\\') => match self.advance() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some(c) => s.push(c),
                    None => return Err(self.error(line, column, "unterminated string literal")),
                },
                Some(c) if c == quote => break,
                Some(c) => s.push(c),
            }
        }
        Ok(Token::Str(s))
    }

    fn read_ident(&mut self, first: char) -> Token {
        let mut s = String::new();
        s.push(first);
        while let Some(c) = self.peek().filter(|c| c.is_ascii_alphanumeric() || *c == '_') {
            s.push(c);
            self.advance();
        }
        match s.as_str() {
            "true" => Token::True,
            "false" => Token::False,
            "null" => Token::Null,
            "if" => Token::If,
            "else" => Token::Else,
            "while" => Token::While,
            "break" => Token::Break,
            "return" => Token::Return,
            _ => Token::Ident(s),
        }
    }

    fn next_token(&mut self) -> Result<Spanned, ParseError> {
        self.skip_ws_and_comments();
        let (line, column) = (self.line, self.column);
        let ch = match self.advance() {
            None => return Ok(Spanned { tok: Token::Eof, line, column }),
            Some(c) => c,
        };

        let tok = match ch {
            '0'..='9' => self.read_number(ch, line, column)?,
            '"' | '\'' => self.read_string(ch, line, column)?,
            'a'..='z' | 'A'..='Z' | '_' => self.read_ident(ch),
            '\n' => Token::Newline,
            ';' => Token::Semi,
            '+' => {
                if self.eat('=') {
                    Token::PlusAssign
                } else {
                    Token::Plus
                }
            }
            '-' => {
                if self.eat('=') {
                    Token::MinusAssign
                } else {
                    Token::Minus
                }
            }
            '*' => Token::Star,
            '/' => Token::Slash,
            '%' => Token::Percent,
            '!' => {
                if self.eat('=') {
                    Token::Ne
                } else {
                    Token::Bang
                }
            }
            '=' => {
                if self.eat('=') {
                    Token::Eq
                } else {
                    Token::Assign
                }
            }
            '<' => {
                if self.eat('=') {
                    Token::Le
                } else {
                    Token::Lt
                }
            }
            '>' => {
                if self.eat('=') {
                    Token::Ge
                } else {
                    Token::Gt
                }
            }
            '&' if self.eat('&') => Token::And,
            '|' if self.eat('|') => Token::Or,
            '(' => {
                self.nesting += 1;
                Token::LParen
            }
            ')' => {
                self.nesting = self.nesting.saturating_sub(1);
                Token::RParen
            }
            '[' => {
                self.nesting += 1;
                Token::LBracket
            }
            ']' => {
                self.nesting = self.nesting.saturating_sub(1);
                Token::RBracket
            }
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            ',' => Token::Comma,
            c => return Err(self.error(line, column, format!("unexpected character '{c}'"))),
        };
        Ok(Spanned { tok, line, column })
    }
}

/// Split script source into positioned tokens, ending with [`Token::Eof`].
pub fn tokenize(src: &str) -> Result<Vec<Spanned>, ParseError> {
    let mut lexer = Lexer::new(src);
    let mut tokens = Vec::new();
    loop {
        let t = lexer.next_token()?;
        let done = t.tok == Token::Eof;
        tokens.push(t);
        if done {
            break;
        }
    }
    Ok(tokens)
}

// ── AST ───────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Var(String),
    List(Vec<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Index(Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

// ── Parser ────────────────────────────────────────────────────────────────────

/// Deepest nesting of parentheses, lists, unary operators and blocks the
/// parser accepts.
pub const MAX_NESTING: usize = 128;

/// Recursive-descent parser over a token vector.  Statement-level grammar
/// lives in [`stmt`](super::stmt).
pub struct Parser {
    pub(super) tokens: Vec<Spanned>,
    pub(super) pos: usize,
    pub(super) loop_depth: usize,
    depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Spanned>) -> Self {
        Parser {
            tokens,
            pos: 0,
            loop_depth: 0,
            depth: 0,
        }
    }

    /// Run `f` one nesting level deeper, failing past [`MAX_NESTING`].
    pub(super) fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(self.error(format!("nesting deeper than {MAX_NESTING} levels")));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    pub(super) fn peek(&self) -> &Token {
        self.tokens.get(self.pos).map(|t| &t.tok).unwrap_or(&Token::Eof)
    }

    pub(super) fn peek_at(&self, offset: usize) -> &Token {
        self.tokens
            .get(self.pos + offset)
            .map(|t| &t.tok)
            .unwrap_or(&Token::Eof)
    }

    pub(super) fn advance(&mut self) -> Token {
        let t = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    pub(super) fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == expected {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub(super) fn expect(&mut self, expected: &Token, what: &str) -> Result<(), ParseError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected {what}, found {}", describe(self.peek()))))
        }
    }

    /// Error positioned at the current token.
    pub(super) fn error(&self, message: impl Into<String>) -> ParseError {
        let (line, column) = self
            .tokens
            .get(self.pos)
            .or(self.tokens.last())
            .map(|t| (t.line, t.column))
            .unwrap_or((1, 1));
        ParseError {
            line,
            column,
            message: message.into(),
        }
    }

    // ── Grammar ───────────────────────────────────────────────────────────────

    pub fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.nested(Self::parse_or)
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_and()?;
        while self.eat(&Token::Or) {
            let rhs = self.parse_and()?;
            lhs = Expr::Binary(BinOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_equality()?;
        while self.eat(&Token::And) {
            let rhs = self.parse_equality()?;
            lhs = Expr::Binary(BinOp::And, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_relational()?;
        loop {
            let op = match self.peek() {
                Token::Eq => BinOp::Eq,
                Token::Ne => BinOp::Ne,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_relational()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_relational(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Token::Lt => BinOp::Lt,
                Token::Le => BinOp::Le,
                Token::Gt => BinOp::Gt,
                Token::Ge => BinOp::Ge,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_additive()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinOp::Mul,
                Token::Slash => BinOp::Div,
                Token::Percent => BinOp::Rem,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        match self.peek() {
            Token::Minus => {
                self.pos += 1;
                let operand = self.nested(Self::parse_unary)?;
                Ok(Expr::Unary(UnaryOp::Neg, Box::new(operand)))
            }
            Token::Bang => {
                self.pos += 1;
                let operand = self.nested(Self::parse_unary)?;
                Ok(Expr::Unary(UnaryOp::Not, Box::new(operand)))
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        while self.eat(&Token::LBracket) {
            let index = self.parse_expr()?;
            self.expect(&Token::RBracket, "']'")?;
            expr = Expr::Index(Box::new(expr), Box::new(index));
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let start = self.pos;
        match self.advance() {
            Token::Int(n) => Ok(Expr::Literal(Value::Int(n))),
            Token::Float(x) => Ok(Expr::Literal(Value::Float(x))),
            Token::Str(s) => Ok(Expr::Literal(Value::Str(s))),
            Token::True => Ok(Expr::Literal(Value::Bool(true))),
            Token::False => Ok(Expr::Literal(Value::Bool(false))),
            Token::Null => Ok(Expr::Literal(Value::Null)),
            Token::Ident(name) => {
                if self.eat(&Token::LParen) {
                    let args = self.parse_list_items(&Token::RParen, "')'")?;
                    Ok(Expr::Call(name, args))
                } else {
                    Ok(Expr::Var(name))
                }
            }
            Token::LBracket => {
                let items = self.parse_list_items(&Token::RBracket, "']'")?;
                Ok(Expr::List(items))
            }
            Token::LParen => {
                let inner = self.parse_expr()?;
                self.expect(&Token::RParen, "')'")?;
                Ok(inner)
            }
            other => {
                self.pos = start;
                Err(self.error(format!("expected an expression, found {}", describe(&other))))
            }
        }
    }

    /// Comma-separated expressions up to `close`; a trailing comma is allowed.
    fn parse_list_items(&mut self, close: &Token, what: &str) -> Result<Vec<Expr>, ParseError> {
        let mut items = Vec::new();
        while self.peek() != close {
            items.push(self.parse_expr()?);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(close, what)?;
        Ok(items)
    }
}

/// Human-readable token name for error messages.
pub(super) fn describe(tok: &Token) -> String {
    match tok {
        Token::Int(n) => format!("number {n}"),
        Token::Float(x) => format!("number {x}"),
        Token::Str(s) => format!("string \"{s}\""),
        Token::Ident(name) => format!("'{name}'"),
        Token::Newline => "end of line".into(),
        Token::Eof => "end of input".into(),
        other => format!("{other:?}"),
    }
}

/// Parse a standalone expression (the whole input must be one expression).
pub fn parse_expr(src: &str) -> Result<Expr, ParseError> {
    let mut parser = Parser::new(tokenize(src)?);
    let expr = parser.parse_expr()?;
    while parser.eat(&Token::Newline) {}
    if parser.peek() != &Token::Eof {
        return Err(parser.error(format!("unexpected {}", describe(parser.peek()))));
    }
    Ok(expr)
}

// ── Evaluator ─────────────────────────────────────────────────────────────────

/// Evaluate an [`Expr`] AST node against the given context.
pub fn eval_expr(expr: &Expr, ctx: &mut dyn EvalContext) -> Result<Value, ScriptError> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),

        Expr::Var(name) => Ok(ctx.get_var(name)?),

        Expr::List(items) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                values.push(eval_expr(item, ctx)?);
            }
            Ok(Value::List(values))
        }

        Expr::Unary(op, inner) => {
            let v = eval_expr(inner, ctx)?;
            Ok(match op {
                UnaryOp::Neg => v.arith_neg()?,
                UnaryOp::Not => Value::Bool(!v.as_bool()),
            })
        }

        Expr::Binary(op, lhs, rhs) => {
            // Short-circuit for && and ||
            match op {
                BinOp::And => {
                    if !eval_expr(lhs, ctx)?.as_bool() {
                        return Ok(Value::Bool(false));
                    }
                    return Ok(Value::Bool(eval_expr(rhs, ctx)?.as_bool()));
                }
                BinOp::Or => {
                    if eval_expr(lhs, ctx)?.as_bool() {
                        return Ok(Value::Bool(true));
                    }
                    return Ok(Value::Bool(eval_expr(rhs, ctx)?.as_bool()));
                }
                _ => {}
            }
            let l = eval_expr(lhs, ctx)?;
            let r = eval_expr(rhs, ctx)?;
            Ok(eval_binop(*op, &l, &r)?)
        }

        Expr::Index(target, index) => {
            let t = eval_expr(target, ctx)?;
            let i = eval_expr(index, ctx)?;
            Ok(t.index(&i)?)
        }

        Expr::Call(name, arg_exprs) => {
            let mut args = Vec::with_capacity(arg_exprs.len());
            for ae in arg_exprs {
                args.push(eval_expr(ae, ctx)?);
            }
            ctx.call_fn(name, args)
        }
    }
}

/// Apply a non-short-circuit binary operator.
pub fn eval_binop(op: BinOp, l: &Value, r: &Value) -> Result<Value, crate::error::RuntimeError> {
    use std::cmp::Ordering;
    match op {
        BinOp::Add => l.arith_add(r),
        BinOp::Sub => l.arith_sub(r),
        BinOp::Mul => l.arith_mul(r),
        BinOp::Div => l.arith_div(r),
        BinOp::Rem => l.arith_rem(r),
        BinOp::Eq => Ok(Value::Bool(l.loose_eq(r))),
        BinOp::Ne => Ok(Value::Bool(!l.loose_eq(r))),
        BinOp::Lt => Ok(Value::Bool(l.cmp_value(r)? == Ordering::Less)),
        BinOp::Le => Ok(Value::Bool(l.cmp_value(r)? != Ordering::Greater)),
        BinOp::Gt => Ok(Value::Bool(l.cmp_value(r)? == Ordering::Greater)),
        BinOp::Ge => Ok(Value::Bool(l.cmp_value(r)? != Ordering::Less)),
        BinOp::And => Ok(Value::Bool(l.as_bool() && r.as_bool())),
        BinOp::Or => Ok(Value::Bool(l.as_bool() || r.as_bool())),
    }
}

/// Convenience: parse and evaluate an expression string.
pub fn eval_str(src: &str, ctx: &mut dyn EvalContext) -> Result<Value, ScriptError> {
    let expr = parse_expr(src).map_err(|error| crate::error::ResolutionError::Parse {
        name: "<expr>".into(),
        error,
    })?;
    eval_expr(&expr, ctx)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuntimeError;
    use std::collections::HashMap;

    // ── Minimal EvalContext for tests ─────────────────────────────────────────

    struct TestCtx {
        vars: HashMap<String, Value>,
    }

    impl TestCtx {
        fn new() -> Self {
            TestCtx {
                vars: HashMap::new(),
            }
        }
        fn with(mut self, k: &str, v: impl Into<Value>) -> Self {
            self.vars.insert(k.into(), v.into());
            self
        }
    }

    impl EvalContext for TestCtx {
        fn get_var(&self, name: &str) -> Result<Value, UndefinedVariable> {
            self.vars
                .get(name)
                .cloned()
                .ok_or_else(|| UndefinedVariable::new(name))
        }
        fn call_fn(&mut self, name: &str, _args: Vec<Value>) -> Result<Value, ScriptError> {
            Err(RuntimeError::UnknownFunction(name.into()).into())
        }
    }

    fn eval(src: &str) -> Value {
        eval_str(src, &mut TestCtx::new()).expect("eval failed")
    }

    fn eval_ctx(src: &str, ctx: &mut TestCtx) -> Value {
        eval_str(src, ctx).expect("eval failed")
    }

    #[test]
    #[allow(clippy::approx_constant)]
    fn literals() {
        assert_eq!(eval("42"), Value::Int(42));
        assert_eq!(eval("3.14"), Value::Float(3.14));
        assert_eq!(eval("\"hello\""), Value::from("hello"));
        assert_eq!(eval("'single'"), Value::from("single"));
        assert_eq!(eval("true"), Value::Bool(true));
        assert_eq!(eval("null"), Value::Null);
        assert_eq!(eval("0xff"), Value::Int(255));
    }

    #[test]
    fn string_escapes() {
        assert_eq!(eval(r#""a\tb\n\"c\"""#), Value::from("a\tb\n\"c\""));
    }

    #[test]
    fn arithmetic() {
        assert_eq!(eval("2 + 3"), Value::Int(5));
        assert_eq!(eval("10 - 4"), Value::Int(6));
        assert_eq!(eval("3 * 4"), Value::Int(12));
        assert_eq!(eval("10 / 3"), Value::Int(3));
        assert_eq!(eval("10 % 3"), Value::Int(1));
        assert_eq!(eval("1 / 2.0"), Value::Float(0.5));
    }

    #[test]
    fn precedence() {
        assert_eq!(eval("2 + 3 * 4"), Value::Int(14));
        assert_eq!(eval("(2 + 3) * 4"), Value::Int(20));
        assert_eq!(eval("-(3 + 2)"), Value::Int(-5));
        assert_eq!(eval("1 + 2 == 3 && 2 < 3"), Value::Bool(true));
    }

    #[test]
    fn comparison() {
        assert_eq!(eval("3 == 3"), Value::Bool(true));
        assert_eq!(eval("3 != 4"), Value::Bool(true));
        assert_eq!(eval("2 <= 2.0"), Value::Bool(true));
        assert_eq!(eval("'abc' < 'abd'"), Value::Bool(true));
    }

    #[test]
    fn logical_short_circuit() {
        // The right side would fail with an undefined variable if evaluated.
        assert_eq!(eval("false && missing"), Value::Bool(false));
        assert_eq!(eval("true || missing"), Value::Bool(true));
        assert_eq!(eval("!0"), Value::Bool(true));
    }

    #[test]
    fn lists_and_indexing() {
        assert_eq!(eval("[1, 2, 3][1]"), Value::Int(2));
        assert_eq!(eval("[1, 2,]"), Value::List(vec![Value::Int(1), Value::Int(2)]));
        assert_eq!(eval("[[1], [2, 3]][1][0]"), Value::Int(2));
        assert_eq!(eval("[\n 'a',\n 'b'\n]"), Value::from(["a", "b"]));
    }

    #[test]
    fn variable_lookup() {
        let mut ctx = TestCtx::new().with("args", ["Hello", "World"]);
        assert_eq!(
            eval_ctx("args[0] + \" \" + args[1]", &mut ctx),
            Value::from("Hello World")
        );
    }

    #[test]
    fn undefined_variable_is_error() {
        let err = eval_str("nope + 1", &mut TestCtx::new()).unwrap_err();
        assert_eq!(err.undefined_variable(), Some("nope"));
    }

    #[test]
    fn unknown_function_is_error() {
        let err = eval_str("frob(1)", &mut TestCtx::new()).unwrap_err();
        assert!(matches!(
            err,
            ScriptError::Runtime(RuntimeError::UnknownFunction(ref n)) if n == "frob"
        ));
    }

    #[test]
    fn parse_errors_carry_position() {
        let err = parse_expr("1 +\n").unwrap_err();
        assert_eq!(err.line, 1);
        let err = parse_expr("(1 + 2").unwrap_err();
        assert!(err.message.contains("')'"), "{}", err.message);
        let err = parse_expr("'open").unwrap_err();
        assert!(err.message.contains("unterminated"));
        let err = parse_expr("1 $ 2").unwrap_err();
        assert_eq!((err.line, err.column), (1, 3));
    }

    #[test]
    fn moderate_nesting_parses() {
        let src = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(eval(&src), Value::Int(1));
        assert_eq!(eval(&format!("{}7", "-".repeat(100))), Value::Int(7));
        let list = format!("len({}{})", "[".repeat(50), "]".repeat(50));
        assert_eq!(eval(&list), Value::Int(1));
    }

    #[test]
    fn deep_nesting_is_a_parse_error() {
        let parens = format!("{}1{}", "(".repeat(200_000), ")".repeat(200_000));
        let err = parse_expr(&parens).unwrap_err();
        assert!(err.message.contains("nesting"), "{}", err.message);

        let lists = format!("{}{}", "[".repeat(200_000), "]".repeat(200_000));
        assert!(parse_expr(&lists).unwrap_err().message.contains("nesting"));

        let negations = format!("{}1", "-".repeat(200_000));
        assert!(parse_expr(&negations).unwrap_err().message.contains("nesting"));

        let calls = format!("{}1{}", "f(".repeat(200_000), ")".repeat(200_000));
        assert!(parse_expr(&calls).unwrap_err().message.contains("nesting"));
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(eval("(1 + # one\n 0)"), Value::Int(1));
        assert_eq!(eval("2 // two"), Value::Int(2));
    }
}
