//! Expression lexer, AST, parser, and evaluator.
//!
//! The grammar is the arithmetic/boolean subset of a conventional infix
//! expression language: integer and float literals (including `0x` hex),
//! `True` / `False`, named constants, function calls, and the operators below.
//!
//! Operator precedence (lowest → highest):
//!   or  →  and  →  not  →  comparison (chainable)  →  |  →  ^  →  &  →
//!   shift  →  additive  →  multiplicative  →  unary  →  **  →  primary
//!
//! Parsing and evaluation are separate steps so callers can tell a syntax
//! error ([`parse_expr`]) from a runtime failure ([`eval_expr`]).

use super::builtins;
use super::value::Value;

// ── EvalContext ───────────────────────────────────────────────────────────────

/// Dependency-injection interface used by the evaluator for everything that
/// is not an operator: named constants and function calls.
pub trait EvalContext {
    /// Value of a bare name such as `pi`.
    fn constant(&self, name: &str) -> Option<Value>;

    /// Invoke a function.  `None` if no function has that name.
    fn call_fn(&self, name: &str, args: Vec<Value>) -> Option<Result<Value, String>>;
}

/// The built-in math library as an [`EvalContext`].
#[derive(Debug, Default, Clone, Copy)]
pub struct MathContext;

impl EvalContext for MathContext {
    fn constant(&self, name: &str) -> Option<Value> {
        builtins::constant(name)
    }

    fn call_fn(&self, name: &str, args: Vec<Value>) -> Option<Result<Value, String>> {
        builtins::call_builtin(name, args)
    }
}

// ── Token ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Int(i64),
    Float(f64),
    Ident(String),

    // Operators
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    SlashSlash,
    Percent,
    Tilde,
    Ampersand,
    Pipe,
    Caret,
    ShiftLeft,
    ShiftRight,

    // Comparison
    Eq, // ==
    Ne, // !=
    Lt,
    Le,
    Gt,
    Ge,

    // Misc
    Comma,
    LParen,
    RParen,
    /// Unrecognised input character, reported by the parser.
    Unknown(char),
    Eof,
}

// ── Lexer ─────────────────────────────────────────────────────────────────────

struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Lexer {
            src: src.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.src.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn eat(&mut self, ch: u8) -> bool {
        if self.peek() == Some(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn take_digits(&mut self, s: &mut String) {
        while let Some(d @ b'0'..=b'9') = self.peek() {
            s.push(d as char);
            self.pos += 1;
        }
    }

    fn read_number(&mut self, first: u8) -> Result<Token, String> {
        let mut s = String::new();
        s.push(first as char);

        // Hex literal
        if first == b'0' && matches!(self.peek(), Some(b'x' | b'X')) {
            self.pos += 1;
            let mut hex = String::new();
            while let Some(c) = self.peek().filter(u8::is_ascii_hexdigit) {
                hex.push(c as char);
                self.pos += 1;
            }
            if hex.is_empty() {
                return Err("invalid hexadecimal literal".into());
            }
            return i64::from_str_radix(&hex, 16)
                .map(Token::Int)
                .map_err(|_| format!("hexadecimal literal too large: 0x{hex}"));
        }

        let mut is_float = first == b'.';
        if first != b'.' {
            self.take_digits(&mut s);
            if self.peek() == Some(b'.') {
                is_float = true;
                s.push('.');
                self.pos += 1;
            }
        }
        if is_float {
            self.take_digits(&mut s);
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let save = self.pos;
            let mut exp = String::from("e");
            self.pos += 1;
            if let Some(sign @ (b'+' | b'-')) = self.peek() {
                exp.push(sign as char);
                self.pos += 1;
            }
            let before = exp.len();
            self.take_digits(&mut exp);
            if exp.len() == before {
                // "1e" or "1e+": not an exponent after all.
                self.pos = save;
            } else {
                is_float = true;
                s.push_str(&exp);
            }
        }
        if matches!(self.peek(), Some(c) if c.is_ascii_alphabetic() || c == b'_') {
            return Err(format!("invalid decimal literal: {s}{}", self.peek().unwrap_or(b' ') as char));
        }

        if is_float {
            s.parse::<f64>()
                .map(Token::Float)
                .map_err(|e| format!("invalid float literal {s}: {e}"))
        } else if s.len() > 1 && s.starts_with('0') && s.bytes().any(|b| b != b'0') {
            Err("leading zeros in decimal integer literals are not permitted".into())
        } else {
            s.parse::<i64>()
                .map(Token::Int)
                .map_err(|_| format!("integer literal too large: {s}"))
        }
    }

    fn read_ident(&mut self, first: u8) -> Token {
        let mut s = String::new();
        s.push(first as char);
        while let Some(c @ (b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_')) = self.peek() {
            s.push(c as char);
            self.pos += 1;
        }
        Token::Ident(s)
    }

    fn next_token(&mut self) -> Result<Token, String> {
        self.skip_ws();
        let ch = match self.advance() {
            None => return Ok(Token::Eof),
            Some(c) => c,
        };

        Ok(match ch {
            b'0'..=b'9' => self.read_number(ch)?,
            b'.' if matches!(self.peek(), Some(b'0'..=b'9')) => self.read_number(ch)?,
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.read_ident(ch),
            b'+' => Token::Plus,
            b'-' => Token::Minus,
            b'*' => {
                if self.eat(b'*') {
                    Token::StarStar
                } else {
                    Token::Star
                }
            }
            b'/' => {
                if self.eat(b'/') {
                    Token::SlashSlash
                } else {
                    Token::Slash
                }
            }
            b'%' => Token::Percent,
            b'~' => Token::Tilde,
            b'^' => Token::Caret,
            b'&' => Token::Ampersand,
            b'|' => Token::Pipe,
            b'!' if self.peek() == Some(b'=') => {
                self.pos += 1;
                Token::Ne
            }
            b'=' if self.peek() == Some(b'=') => {
                self.pos += 1;
                Token::Eq
            }
            b'<' => {
                if self.eat(b'<') {
                    Token::ShiftLeft
                } else if self.eat(b'=') {
                    Token::Le
                } else {
                    Token::Lt
                }
            }
            b'>' => {
                if self.eat(b'>') {
                    Token::ShiftRight
                } else if self.eat(b'=') {
                    Token::Ge
                } else {
                    Token::Gt
                }
            }
            b',' => Token::Comma,
            b'(' => Token::LParen,
            b')' => Token::RParen,
            c if c.is_ascii() => Token::Unknown(c as char),
            _ => {
                // Re-decode the multi-byte character for the diagnostic.
                let start = self.pos - 1;
                let rest = std::str::from_utf8(&self.src[start..]).unwrap_or("");
                let c = rest.chars().next().unwrap_or('\u{FFFD}');
                self.pos = start + c.len_utf8().max(1);
                Token::Unknown(c)
            }
        })
    }

    fn tokenize(mut self) -> Result<Vec<Token>, String> {
        let mut tokens = Vec::new();
        loop {
            let t = self.next_token()?;
            let done = matches!(t, Token::Eof);
            tokens.push(t);
            if done {
                break;
            }
        }
        Ok(tokens)
    }
}

// ── AST ───────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Rem,
    Pow,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnaryOp {
    Neg,
    Pos,
    BitNot,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Name(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    /// `a < b <= c`: each link compares adjacent operands.
    Compare(Box<Expr>, Vec<(CmpOp, Expr)>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

const KEYWORDS: &[&str] = &["and", "or", "not", "True", "False"];

// ── Parser ────────────────────────────────────────────────────────────────────

/// Deepest bracket / unary / call nesting the parser descends into.  Each
/// bracket level costs a full trip down the precedence ladder, so this bounds
/// the parser's own recursion.
pub const MAX_NESTING: usize = 100;

/// Deepest AST the parser will build.  [`eval_expr`] and `Drop` both recurse
/// over the tree, so long operator chains are capped here.
pub const MAX_DEPTH: usize = 1000;

fn too_deep() -> String {
    "expression is nested too deeply".into()
}

/// An expression under construction, with the depth of its tree.
struct Node {
    expr: Expr,
    depth: usize,
}

impl Node {
    fn leaf(expr: Expr) -> Node {
        Node { expr, depth: 1 }
    }

    fn build(expr: Expr, child_depth: usize) -> Result<Node, String> {
        let depth = child_depth + 1;
        if depth > MAX_DEPTH {
            return Err(too_deep());
        }
        Ok(Node { expr, depth })
    }

    fn unary(op: UnaryOp, inner: Node) -> Result<Node, String> {
        Node::build(Expr::Unary(op, Box::new(inner.expr)), inner.depth)
    }

    fn binary(op: BinOp, lhs: Node, rhs: Node) -> Result<Node, String> {
        let depth = lhs.depth.max(rhs.depth);
        Node::build(Expr::Binary(op, Box::new(lhs.expr), Box::new(rhs.expr)), depth)
    }

    fn logical(
        make: fn(Box<Expr>, Box<Expr>) -> Expr,
        lhs: Node,
        rhs: Node,
    ) -> Result<Node, String> {
        let depth = lhs.depth.max(rhs.depth);
        Node::build(make(Box::new(lhs.expr), Box::new(rhs.expr)), depth)
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    nesting: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0, nesting: 0 }
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens.get(self.pos).cloned().unwrap_or(Token::Eof);
        self.pos += 1;
        t
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == expected {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, kw: &str) -> bool {
        if matches!(self.peek(), Token::Ident(s) if s == kw) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Run `f` one nesting level down.
    fn nested(&mut self, f: fn(&mut Self) -> Result<Node, String>) -> Result<Node, String> {
        if self.nesting >= MAX_NESTING {
            return Err(too_deep());
        }
        self.nesting += 1;
        let node = f(self);
        self.nesting -= 1;
        node
    }

    // ── Grammar ───────────────────────────────────────────────────────────────

    fn parse_expr(&mut self) -> Result<Node, String> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Node, String> {
        let mut lhs = self.parse_and()?;
        while self.eat_keyword("or") {
            let rhs = self.parse_and()?;
            lhs = Node::logical(Expr::Or, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Node, String> {
        let mut lhs = self.parse_not()?;
        while self.eat_keyword("and") {
            let rhs = self.parse_not()?;
            lhs = Node::logical(Expr::And, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<Node, String> {
        if self.eat_keyword("not") {
            let inner = self.nested(Self::parse_not)?;
            return Node::unary(UnaryOp::Not, inner);
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Node, String> {
        let first = self.parse_bitor()?;
        let mut depth = first.depth;
        let mut links = Vec::new();
        loop {
            let op = match self.peek() {
                Token::Eq => CmpOp::Eq,
                Token::Ne => CmpOp::Ne,
                Token::Lt => CmpOp::Lt,
                Token::Le => CmpOp::Le,
                Token::Gt => CmpOp::Gt,
                Token::Ge => CmpOp::Ge,
                _ => break,
            };
            self.pos += 1;
            let operand = self.parse_bitor()?;
            depth = depth.max(operand.depth);
            links.push((op, operand.expr));
        }
        if links.is_empty() {
            Ok(first)
        } else {
            Node::build(Expr::Compare(Box::new(first.expr), links), depth)
        }
    }

    fn parse_bitor(&mut self) -> Result<Node, String> {
        let mut lhs = self.parse_bitxor()?;
        while self.eat(&Token::Pipe) {
            let rhs = self.parse_bitxor()?;
            lhs = Node::binary(BinOp::BitOr, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn parse_bitxor(&mut self) -> Result<Node, String> {
        let mut lhs = self.parse_bitand()?;
        while self.eat(&Token::Caret) {
            let rhs = self.parse_bitand()?;
            lhs = Node::binary(BinOp::BitXor, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn parse_bitand(&mut self) -> Result<Node, String> {
        let mut lhs = self.parse_shift()?;
        while self.eat(&Token::Ampersand) {
            let rhs = self.parse_shift()?;
            lhs = Node::binary(BinOp::BitAnd, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn parse_shift(&mut self) -> Result<Node, String> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Token::ShiftLeft => BinOp::Shl,
                Token::ShiftRight => BinOp::Shr,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_additive()?;
            lhs = Node::binary(op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Node, String> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_multiplicative()?;
            lhs = Node::binary(op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Node, String> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinOp::Mul,
                Token::Slash => BinOp::Div,
                Token::SlashSlash => BinOp::FloorDiv,
                Token::Percent => BinOp::Rem,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_unary()?;
            lhs = Node::binary(op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Node, String> {
        let op = match self.peek() {
            Token::Minus => UnaryOp::Neg,
            Token::Plus => UnaryOp::Pos,
            Token::Tilde => UnaryOp::BitNot,
            _ => return self.parse_power(),
        };
        self.pos += 1;
        let inner = self.nested(Self::parse_unary)?;
        Node::unary(op, inner)
    }

    /// `**` binds tighter than a unary operator on its left and is right
    /// associative: `-2 ** 2` is `-(2 ** 2)`, `2 ** -1` is allowed.
    fn parse_power(&mut self) -> Result<Node, String> {
        let base = self.parse_primary()?;
        if self.eat(&Token::StarStar) {
            let exp = self.nested(Self::parse_unary)?;
            return Node::binary(BinOp::Pow, base, exp);
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Node, String> {
        let tok = self.advance();
        match tok {
            Token::Int(n) => Ok(Node::leaf(Expr::Literal(Value::Int(n)))),
            Token::Float(x) => Ok(Node::leaf(Expr::Literal(Value::Float(x)))),
            Token::Ident(name) => match name.as_str() {
                "True" => Ok(Node::leaf(Expr::Literal(Value::Bool(true)))),
                "False" => Ok(Node::leaf(Expr::Literal(Value::Bool(false)))),
                kw if KEYWORDS.contains(&kw) => Err(format!("unexpected keyword '{kw}'")),
                _ => {
                    if !self.eat(&Token::LParen) {
                        return Ok(Node::leaf(Expr::Name(name)));
                    }
                    let mut depth = 0;
                    let mut args = Vec::new();
                    if self.peek() != &Token::RParen {
                        loop {
                            let arg = self.nested(Self::parse_expr)?;
                            depth = depth.max(arg.depth);
                            args.push(arg.expr);
                            if !self.eat(&Token::Comma) || self.peek() == &Token::RParen {
                                break; // end of list, or a trailing comma
                            }
                        }
                    }
                    if !self.eat(&Token::RParen) {
                        return Err(format!("expected ')' after args to {name}"));
                    }
                    Node::build(Expr::Call(name, args), depth)
                }
            },
            Token::LParen => {
                let inner = self.nested(Self::parse_expr)?;
                if !self.eat(&Token::RParen) {
                    return Err("'(' was never closed".into());
                }
                Ok(inner)
            }
            Token::Eof => Err("unexpected end of expression".into()),
            Token::Unknown(c) => Err(format!("invalid character '{c}'")),
            other => Err(format!("unexpected token {other:?}")),
        }
    }
}

/// Parse an expression string into an AST.  The whole input must be
/// consumed, and nesting is limited by [`MAX_NESTING`] and [`MAX_DEPTH`].
pub fn parse_expr(src: &str) -> Result<Expr, String> {
    let tokens = Lexer::new(src).tokenize()?;
    let mut parser = Parser::new(tokens);
    let node = parser.parse_expr()?;
    match parser.peek() {
        Token::Eof => Ok(node.expr),
        Token::RParen => Err("unmatched ')'".into()),
        Token::Unknown(c) => Err(format!("invalid character '{c}'")),
        other => Err(format!("unexpected token {other:?}")),
    }
}

// ── Evaluator ─────────────────────────────────────────────────────────────────

/// Evaluate an [`Expr`] AST node against the given context.
pub fn eval_expr(expr: &Expr, ctx: &dyn EvalContext) -> Result<Value, String> {
    match expr {
        Expr::Literal(v) => Ok(*v),

        Expr::Name(name) => ctx
            .constant(name)
            .ok_or_else(|| format!("name '{name}' is not defined")),

        Expr::Unary(op, inner) => {
            let v = eval_expr(inner, ctx)?;
            match op {
                UnaryOp::Neg => v.arith_neg(),
                UnaryOp::Pos => Ok(v.arith_pos()),
                UnaryOp::BitNot => v.bit_not(),
                UnaryOp::Not => Ok(Value::Bool(!v.as_bool())),
            }
        }

        // `and` / `or` short-circuit and yield the deciding operand.
        Expr::And(lhs, rhs) => {
            let l = eval_expr(lhs, ctx)?;
            if !l.as_bool() {
                return Ok(l);
            }
            eval_expr(rhs, ctx)
        }
        Expr::Or(lhs, rhs) => {
            let l = eval_expr(lhs, ctx)?;
            if l.as_bool() {
                return Ok(l);
            }
            eval_expr(rhs, ctx)
        }

        Expr::Binary(op, lhs, rhs) => {
            let l = eval_expr(lhs, ctx)?;
            let r = eval_expr(rhs, ctx)?;
            eval_binop(op, l, r)
        }

        Expr::Compare(first, links) => {
            let mut left = eval_expr(first, ctx)?;
            for (op, operand) in links {
                let right = eval_expr(operand, ctx)?;
                if !compare(op, &left, &right) {
                    return Ok(Value::Bool(false));
                }
                left = right;
            }
            Ok(Value::Bool(true))
        }

        Expr::Call(name, arg_exprs) => {
            let mut args = Vec::with_capacity(arg_exprs.len());
            for ae in arg_exprs {
                args.push(eval_expr(ae, ctx)?);
            }
            ctx.call_fn(name, args)
                .unwrap_or_else(|| Err(format!("name '{name}' is not defined")))
        }
    }
}

fn eval_binop(op: &BinOp, l: Value, r: Value) -> Result<Value, String> {
    match op {
        BinOp::Add => l.arith_add(&r),
        BinOp::Sub => l.arith_sub(&r),
        BinOp::Mul => l.arith_mul(&r),
        BinOp::Div => l.arith_div(&r),
        BinOp::FloorDiv => l.arith_floor_div(&r),
        BinOp::Rem => l.arith_rem(&r),
        BinOp::Pow => l.arith_pow(&r),
        BinOp::BitAnd => l.bit_and(&r),
        BinOp::BitOr => l.bit_or(&r),
        BinOp::BitXor => l.bit_xor(&r),
        BinOp::Shl => l.shl(&r),
        BinOp::Shr => l.shr(&r),
    }
}

fn compare(op: &CmpOp, l: &Value, r: &Value) -> bool {
    use std::cmp::Ordering;
    // NaN compares unequal to everything.
    let Some(ord) = l.cmp_value(r) else {
        return *op == CmpOp::Ne;
    };
    match op {
        CmpOp::Eq => ord == Ordering::Equal,
        CmpOp::Ne => ord != Ordering::Equal,
        CmpOp::Lt => ord == Ordering::Less,
        CmpOp::Le => ord != Ordering::Greater,
        CmpOp::Gt => ord == Ordering::Greater,
        CmpOp::Ge => ord != Ordering::Less,
    }
}

/// Convenience: parse and evaluate an expression string.
pub fn eval_str(src: &str, ctx: &dyn EvalContext) -> Result<Value, String> {
    let expr = parse_expr(src)?;
    eval_expr(&expr, ctx)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(src: &str) -> Value {
        eval_str(src, &MathContext).unwrap_or_else(|e| panic!("{src:?}: {e}"))
    }

    fn parse_err(src: &str) -> String {
        parse_expr(src).expect_err("expected a syntax error")
    }

    #[test]
    fn literals() {
        assert_eq!(eval("17"), Value::Int(17));
        assert_eq!(eval("2.25"), Value::Float(2.25));
        assert_eq!(eval(".5"), Value::Float(0.5));
        assert_eq!(eval("1."), Value::Float(1.0));
        assert_eq!(eval("1e3"), Value::Float(1000.0));
        assert_eq!(eval("True"), Value::Bool(true));
    }

    #[test]
    fn arithmetic() {
        assert_eq!(eval("7 + 8"), Value::Int(15));
        assert_eq!(eval("4 - 10"), Value::Int(-6));
        assert_eq!(eval("6 * 7"), Value::Int(42));
        assert_eq!(eval("10 / 4"), Value::Float(2.5));
        assert_eq!(eval("10 // 3"), Value::Int(3));
        assert_eq!(eval("-7 % 3"), Value::Int(2));
        assert_eq!(eval("2 ** 10"), Value::Int(1024));
    }

    #[test]
    fn precedence() {
        assert_eq!(eval("1 + 2 * 3"), Value::Int(7));
        assert_eq!(eval("(1 + 2) * 3"), Value::Int(9));
        assert_eq!(eval("2 * 5-4"), Value::Int(6));
        assert_eq!(eval("-2 ** 2"), Value::Int(-4));
        assert_eq!(eval("2 ** 3 ** 2"), Value::Int(512));
        assert_eq!(eval("1 + 2 << 3"), Value::Int(24));
    }

    #[test]
    fn hex_literal() {
        assert_eq!(eval("0xFf"), Value::Int(255));
        assert_eq!(eval("0X10"), Value::Int(16));
        assert_eq!(eval("0x0100"), Value::Int(256));
    }

    #[test]
    fn bitwise() {
        assert_eq!(eval("12 & 10"), Value::Int(8));
        assert_eq!(eval("12 | 3"), Value::Int(15));
        assert_eq!(eval("12 ^ 10"), Value::Int(6));
        assert_eq!(eval("3 << 4"), Value::Int(48));
        assert_eq!(eval("-16 >> 2"), Value::Int(-4));
        assert_eq!(eval("~0"), Value::Int(-1));
    }

    #[test]
    fn comparison() {
        assert_eq!(eval("3 == 3"), Value::Bool(true));
        assert_eq!(eval("3 != 4"), Value::Bool(true));
        assert_eq!(eval("2 < 3"), Value::Bool(true));
        assert_eq!(eval("3 >= 4"), Value::Bool(false));
        assert_eq!(eval("1 == 1.0"), Value::Bool(true));
    }

    #[test]
    fn chained_comparison() {
        assert_eq!(eval("1 < 2 < 3"), Value::Bool(true));
        assert_eq!(eval("1 < 3 < 2"), Value::Bool(false));
    }

    #[test]
    fn boolean_logic() {
        assert_eq!(eval("True and not False"), Value::Bool(true));
        assert_eq!(eval("not 1 == 2"), Value::Bool(true));
        assert_eq!(eval("0 or 7"), Value::Int(7));
        assert_eq!(eval("3 and 0"), Value::Int(0));
        assert_eq!(eval("False or False"), Value::Bool(false));
    }

    #[test]
    fn and_short_circuits() {
        // The right side would divide by zero.
        assert_eq!(eval("False and 1 / 0"), Value::Bool(false));
        assert_eq!(eval("True or 1 / 0"), Value::Bool(true));
    }

    #[test]
    fn functions_and_constants() {
        assert_eq!(eval("cos(0)"), Value::Float(1.0));
        assert_eq!(eval("floor(2.7) + 1"), Value::Int(3));
        assert_eq!(eval("pi"), Value::Float(std::f64::consts::PI));
        assert_eq!(eval("atan2(0, 1,)"), Value::Float(0.0));
    }

    fn wrapped(open: &str, n: usize, close: &str) -> String {
        format!("{}1{}", open.repeat(n), close.repeat(n))
    }

    #[test]
    fn nesting_up_to_the_limit() {
        assert_eq!(eval(&wrapped("(", MAX_NESTING, ")")), Value::Int(1));
        assert_eq!(eval(&wrapped("-", MAX_NESTING, "")), Value::Int(1));
        assert_eq!(eval(&wrapped("fabs(", MAX_NESTING, ")")), Value::Float(1.0));
    }

    #[test]
    fn nesting_past_the_limit() {
        let too_deep = "expression is nested too deeply";
        assert_eq!(parse_err(&wrapped("(", MAX_NESTING + 1, ")")), too_deep);
        assert_eq!(parse_err(&wrapped("~", MAX_NESTING + 1, "")), too_deep);
        assert_eq!(parse_err(&wrapped("not ", MAX_NESTING + 1, "")), too_deep);
        assert_eq!(parse_err(&wrapped("cos(", MAX_NESTING + 1, ")")), too_deep);
        assert_eq!(parse_err(&format!("2{}", " ** 2".repeat(MAX_NESTING + 1))), too_deep);
    }

    #[test]
    fn long_chains_are_capped() {
        let chain = |n: usize| format!("1{}", " + 1".repeat(n));
        assert_eq!(eval(&chain(MAX_DEPTH - 2)), Value::Int(MAX_DEPTH as i64 - 1));
        assert_eq!(parse_err(&chain(MAX_DEPTH)), "expression is nested too deeply");
        assert_eq!(parse_err(&chain(100_000)), "expression is nested too deeply");
    }

    #[test]
    fn unknown_names() {
        assert_eq!(
            eval_str("nosuch(1)", &MathContext),
            Err("name 'nosuch' is not defined".into())
        );
        assert_eq!(
            eval_str("x + 1", &MathContext),
            Err("name 'x' is not defined".into())
        );
    }

    #[test]
    fn runtime_errors_are_not_parse_errors() {
        assert!(parse_expr("1 / 0").is_ok());
        assert_eq!(eval_str("1 / 0", &MathContext), Err("division by zero".into()));
    }

    #[test]
    fn syntax_errors() {
        assert_eq!(parse_err("2 +"), "unexpected end of expression");
        assert_eq!(parse_err("(1 + 2"), "'(' was never closed");
        assert_eq!(parse_err("1 + 2)"), "unmatched ')'");
        assert_eq!(parse_err("1 = 2"), "invalid character '='");
        assert_eq!(parse_err("0x"), "invalid hexadecimal literal");
        assert_eq!(parse_err("007"), "leading zeros in decimal integer literals are not permitted");
        assert_eq!(parse_err("and 1"), "unexpected keyword 'and'");
        assert!(parse_expr("1 2").is_err());
        assert!(parse_expr("").is_err());
    }

    #[test]
    fn zero_literals_are_fine() {
        assert_eq!(eval("0"), Value::Int(0));
        assert_eq!(eval("00"), Value::Int(0));
    }

    #[test]
    fn non_ascii_is_rejected() {
        assert_eq!(parse_err("1 × 2"), "invalid character '×'");
    }
}
