//! Statement AST and script-level parser.
//!
//! A script is a sequence of statements separated by newlines or `;`.
//! Blocks are brace-delimited; `else` may sit on the line after the closing
//! brace of its `if`.

use super::expr::{describe, tokenize, Expr, Parser, Token};
use crate::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Set,
    Add,
    Sub,
}

/// A parsed statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// A bare expression; its value becomes the statement's value.
    Expr(Expr),
    /// `name = value`, `name += value`, `name -= value`
    Assign { name: String, op: AssignOp, value: Expr },
    /// `if cond { … } [else { … }]`; `else if` nests another `If` in `else_block`.
    If {
        cond: Expr,
        then_block: Vec<Stmt>,
        else_block: Vec<Stmt>,
    },
    /// `while cond { … }`
    While { cond: Expr, body: Vec<Stmt> },
    /// `break`
    Break,
    /// `return [expr]`
    Return(Option<Expr>),
}

/// Parse a script into a list of statements.
pub fn parse_script(src: &str) -> Result<Vec<Stmt>, ParseError> {
    let mut parser = Parser::new(tokenize(src)?);
    parser.parse_block_until(&Token::Eof)
}

impl Parser {
    fn skip_separators(&mut self) {
        while matches!(self.peek(), Token::Newline | Token::Semi) {
            self.pos += 1;
        }
    }

    /// Statements up to (not including) `end`.
    fn parse_block_until(&mut self, end: &Token) -> Result<Vec<Stmt>, ParseError> {
        let mut stmts = Vec::new();
        loop {
            self.skip_separators();
            if self.peek() == end {
                return Ok(stmts);
            }
            if self.peek() == &Token::Eof {
                return Err(self.error("unexpected end of input, expected '}'"));
            }
            stmts.push(self.parse_stmt()?);
            match self.peek() {
                Token::Newline | Token::Semi => {}
                t if t == end => {}
                other => {
                    return Err(self.error(format!(
                        "expected end of statement, found {}",
                        describe(other)
                    )));
                }
            }
        }
    }

    fn parse_braced_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.expect(&Token::LBrace, "'{'")?;
        let stmts = self.nested(|p| p.parse_block_until(&Token::RBrace))?;
        self.expect(&Token::RBrace, "'}'")?;
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        match self.peek() {
            Token::If => {
                self.pos += 1;
                self.parse_if()
            }
            Token::While => {
                self.pos += 1;
                let cond = self.parse_expr()?;
                self.loop_depth += 1;
                let body = self.parse_braced_block();
                self.loop_depth -= 1;
                Ok(Stmt::While { cond, body: body? })
            }
            Token::Break => {
                if self.loop_depth == 0 {
                    return Err(self.error("'break' outside of a loop"));
                }
                self.pos += 1;
                Ok(Stmt::Break)
            }
            Token::Return => {
                self.pos += 1;
                let value = match self.peek() {
                    Token::Newline | Token::Semi | Token::RBrace | Token::Eof => None,
                    _ => Some(self.parse_expr()?),
                };
                Ok(Stmt::Return(value))
            }
            Token::Ident(name) => {
                let op = match self.peek_at(1) {
                    Token::Assign => Some(AssignOp::Set),
                    Token::PlusAssign => Some(AssignOp::Add),
                    Token::MinusAssign => Some(AssignOp::Sub),
                    _ => None,
                };
                match op {
                    Some(op) => {
                        let name = name.clone();
                        self.pos += 2; // consume ident + assign-op
                        let value = self.parse_expr()?;
                        Ok(Stmt::Assign { name, op, value })
                    }
                    None => Ok(Stmt::Expr(self.parse_expr()?)),
                }
            }
            _ => Ok(Stmt::Expr(self.parse_expr()?)),
        }
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        let cond = self.parse_expr()?;
        let then_block = self.parse_braced_block()?;

        // Allow `else` on the following line.
        let save = self.pos;
        while self.eat(&Token::Newline) {}
        let else_block = if self.eat(&Token::Else) {
            if self.eat(&Token::If) {
                vec![self.nested(Self::parse_if)?]
            } else {
                self.parse_braced_block()?
            }
        } else {
            self.pos = save;
            Vec::new()
        };

        Ok(Stmt::If {
            cond,
            then_block,
            else_block,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::expr::BinOp;
    use crate::script::Value;

    #[test]
    fn assignments_and_expressions() {
        let stmts = parse_script("x = 1\ny += 2; y -= 1\nx").unwrap();
        assert_eq!(stmts.len(), 4);
        assert!(matches!(&stmts[0], Stmt::Assign { name, op: AssignOp::Set, .. } if name == "x"));
        assert!(matches!(&stmts[1], Stmt::Assign { op: AssignOp::Add, .. }));
        assert!(matches!(&stmts[2], Stmt::Assign { op: AssignOp::Sub, .. }));
        assert_eq!(stmts[3], Stmt::Expr(Expr::Var("x".into())));
    }

    #[test]
    fn comparison_is_not_assignment() {
        let stmts = parse_script("x == 1").unwrap();
        assert!(matches!(&stmts[0], Stmt::Expr(Expr::Binary(BinOp::Eq, _, _))));
    }

    #[test]
    fn empty_and_comment_only() {
        assert!(parse_script("").unwrap().is_empty());
        assert!(parse_script("# nothing\n\n// here\n;;").unwrap().is_empty());
    }

    #[test]
    fn if_else_chain() {
        let src = "if x { a = 1 }\nelse if y { a = 2 } else {\n a = 3\n}";
        let stmts = parse_script(src).unwrap();
        assert_eq!(stmts.len(), 1);
        let Stmt::If { else_block, .. } = &stmts[0] else {
            panic!("expected if");
        };
        assert!(matches!(&else_block[..], [Stmt::If { .. }]));
    }

    #[test]
    fn if_without_else_keeps_following_statement() {
        let stmts = parse_script("if x { 1 }\ny").unwrap();
        assert_eq!(stmts.len(), 2);
    }

    #[test]
    fn while_with_break() {
        let stmts = parse_script("while true {\n  break\n}").unwrap();
        assert!(matches!(&stmts[0], Stmt::While { body, .. } if body == &vec![Stmt::Break]));
    }

    #[test]
    fn break_outside_loop_is_error() {
        let err = parse_script("x = 1\nbreak").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.contains("break"));
    }

    #[test]
    fn return_forms() {
        let stmts = parse_script("return\nreturn 5").unwrap();
        assert_eq!(stmts[0], Stmt::Return(None));
        assert_eq!(stmts[1], Stmt::Return(Some(Expr::Literal(Value::Int(5)))));
        let stmts = parse_script("if x { return }").unwrap();
        assert!(matches!(&stmts[0], Stmt::If { then_block, .. } if then_block == &vec![Stmt::Return(None)]));
    }

    #[test]
    fn two_expressions_on_one_line_is_error() {
        let err = parse_script("a b").unwrap_err();
        assert!(err.message.contains("end of statement"), "{}", err.message);
    }

    #[test]
    fn deeply_nested_blocks_are_rejected() {
        let ifs = format!("{}x = 1{}", "if x {\n".repeat(100_000), "\n}".repeat(100_000));
        let err = parse_script(&ifs).unwrap_err();
        assert!(err.message.contains("nesting"), "{}", err.message);

        let shallow = format!("{}x = 1{}", "while x {\n".repeat(20), "\n}".repeat(20));
        assert_eq!(parse_script(&shallow).unwrap().len(), 1);
    }

    #[test]
    fn long_else_if_chain_is_bounded() {
        let mut src = String::from("if a { 0 }");
        for i in 0..50 {
            src.push_str(&format!(" else if a {{ {i} }}"));
        }
        assert_eq!(parse_script(&src).unwrap().len(), 1);

        let mut src = String::from("if a { 0 }");
        for _ in 0..100_000 {
            src.push_str(" else if a { 1 }");
        }
        assert!(parse_script(&src).unwrap_err().message.contains("nesting"));
    }

    #[test]
    fn unclosed_block_is_error() {
        let err = parse_script("while x {\n y = 1\n").unwrap_err();
        assert!(err.message.contains("'}'"), "{}", err.message);
    }
}
