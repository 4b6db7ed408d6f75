//! Restricted expression language for parameter declarations.
//!
//! Grammar (statements separated by newlines or `;`, `#` starts a comment):
//!
//! ```text
//! block     := (statement? SEP)*
//! statement := NAME '=' value
//! value     := sequence | expr
//! sequence  := '[' (expr (',' expr)* ','?)? ']'
//!            | '(' expr ',' (expr (',' expr)* ','?)? ')'
//! expr      := term (('+' | '-') term)*
//! term      := unary (('*' | '/') unary)*
//! unary     := ('+' | '-') unary | NUMBER | '(' expr ')'
//! ```
//!
//! Names only ever appear on the left of `=`; nothing is looked up while
//! evaluating a value, so a block can compute numbers and nothing else.
//! Chains of signs and parentheses deeper than [`MAX_NESTING`] are rejected.

use crate::error::HfsError;

/// Deepest chain of unary signs and parentheses accepted in one value.
pub const MAX_NESTING: usize = 256;

/// An evaluated right-hand side.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(f64),
    Sequence(Vec<f64>),
}

/// One `name = value` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub name: String,
    pub value: Value,
    /// 1-based source line of the name.
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Number(f64),
    Name(String),
    Eq,
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Sep,
}

#[derive(Debug, Clone)]
struct Token {
    tok: Tok,
    line: usize,
}

fn err(line: usize, msg: impl AsRef<str>) -> HfsError {
    HfsError::Parameter(format!("line {line}: {}", msg.as_ref()))
}

fn tokenize(text: &str) -> Result<Vec<Token>, HfsError> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = Vec::new();
    let mut i = 0usize;
    let mut line = 1usize;
    // Newlines inside brackets do not end a statement.
    let mut depth = 0usize;

    while i < chars.len() {
        let ch = chars[i];
        match ch {
            '\n' => {
                if depth == 0 {
                    out.push(Token { tok: Tok::Sep, line });
                }
                line += 1;
                i += 1;
            }
            ';' => {
                out.push(Token { tok: Tok::Sep, line });
                i += 1;
            }
            '#' => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            c if c.is_whitespace() => i += 1,
            '=' => {
                out.push(Token { tok: Tok::Eq, line });
                i += 1;
            }
            '+' | '-' | '*' | '/' | ',' => {
                if let Some(tok) = c_op(ch) {
                    out.push(Token { tok, line });
                }
                i += 1;
            }
            '(' | '[' => {
                depth += 1;
                let tok = if ch == '(' { Tok::LParen } else { Tok::LBracket };
                out.push(Token { tok, line });
                i += 1;
            }
            ')' | ']' => {
                depth = depth.saturating_sub(1);
                let tok = if ch == ')' { Tok::RParen } else { Tok::RBracket };
                out.push(Token { tok, line });
                i += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        while j < chars.len() && chars[j].is_ascii_digit() {
                            j += 1;
                        }
                        i = j;
                    }
                }
                let literal: String = chars[start..i].iter().collect();
                let v = literal
                    .parse::<f64>()
                    .map_err(|_| err(line, format!("invalid number literal '{literal}'")))?;
                out.push(Token { tok: Tok::Number(v), line });
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let name: String = chars[start..i].iter().collect();
                out.push(Token { tok: Tok::Name(name), line });
            }
            other => return Err(err(line, format!("unexpected character '{other}'"))),
        }
    }

    if depth != 0 {
        return Err(err(line, "unbalanced brackets"));
    }
    Ok(out)
}

fn c_op(ch: char) -> Option<Tok> {
    match ch {
        '+' => Some(Tok::Plus),
        '-' => Some(Tok::Minus),
        '*' => Some(Tok::Star),
        '/' => Some(Tok::Slash),
        ',' => Some(Tok::Comma),
        _ => None,
    }
}

struct Parser {
    toks: Vec<Token>,
    pos: usize,
    last_line: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos).map(|t| &t.tok)
    }

    fn line(&self) -> usize {
        self.toks.get(self.pos).map(|t| t.line).unwrap_or(self.last_line)
    }

    fn bump(&mut self) -> Option<Tok> {
        let t = self.toks.get(self.pos).map(|t| t.tok.clone());
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn expect(&mut self, want: Tok, what: &str) -> Result<(), HfsError> {
        let line = self.line();
        match self.bump() {
            Some(t) if t == want => Ok(()),
            Some(t) => Err(err(line, format!("expected {what}, found {}", describe(&t)))),
            None => Err(err(line, format!("expected {what}, found end of input"))),
        }
    }

    fn block(&mut self) -> Result<Vec<Assignment>, HfsError> {
        let mut out = Vec::new();
        loop {
            while self.peek() == Some(&Tok::Sep) {
                self.pos += 1;
            }
            if self.peek().is_none() {
                break;
            }
            out.push(self.statement()?);
            match self.peek() {
                None | Some(Tok::Sep) => {}
                Some(t) => {
                    return Err(err(
                        self.line(),
                        format!("unexpected {} after value", describe(t)),
                    ));
                }
            }
        }
        Ok(out)
    }

    fn statement(&mut self) -> Result<Assignment, HfsError> {
        let line = self.line();
        let name = match self.bump() {
            Some(Tok::Name(n)) => n,
            Some(t) => return Err(err(line, format!("expected a parameter name, found {}", describe(&t)))),
            None => return Err(err(line, "expected a parameter name")),
        };
        self.expect(Tok::Eq, "'='")?;
        let value = self.value()?;
        Ok(Assignment { name, value, line })
    }

    fn value(&mut self) -> Result<Value, HfsError> {
        match self.peek() {
            Some(Tok::LBracket) => {
                self.pos += 1;
                let items = self.items(Tok::RBracket)?;
                Ok(Value::Sequence(items))
            }
            Some(Tok::LParen) => {
                // `(x)` is a scalar, `(x,)` / `(x, y)` is a sequence.
                let save = self.pos;
                self.pos += 1;
                let first = self.expr()?;
                if self.peek() == Some(&Tok::Comma) {
                    self.pos += 1;
                    let mut items = vec![first];
                    items.extend(self.items(Tok::RParen)?);
                    return Ok(Value::Sequence(items));
                }
                self.pos = save;
                Ok(Value::Scalar(self.expr()?))
            }
            _ => Ok(Value::Scalar(self.expr()?)),
        }
    }

    /// Comma-separated expressions up to (and consuming) `close`.
    fn items(&mut self, close: Tok) -> Result<Vec<f64>, HfsError> {
        let mut items = Vec::new();
        loop {
            if self.peek() == Some(&close) {
                self.pos += 1;
                return Ok(items);
            }
            if matches!(self.peek(), Some(Tok::LBracket)) {
                return Err(err(self.line(), "nested sequences are not supported"));
            }
            items.push(self.expr()?);
            match self.peek() {
                Some(Tok::Comma) => {
                    self.pos += 1;
                }
                Some(t) if *t == close => {}
                Some(t) => {
                    return Err(err(
                        self.line(),
                        format!("expected ',' or closing bracket, found {}", describe(t)),
                    ));
                }
                None => return Err(err(self.line(), "unterminated sequence")),
            }
        }
    }

    fn expr(&mut self) -> Result<f64, HfsError> {
        let mut acc = self.term()?;
        loop {
            match self.peek() {
                Some(Tok::Plus) => {
                    self.pos += 1;
                    acc += self.term()?;
                }
                Some(Tok::Minus) => {
                    self.pos += 1;
                    acc -= self.term()?;
                }
                _ => return Ok(acc),
            }
        }
    }

    fn term(&mut self) -> Result<f64, HfsError> {
        let mut acc = self.unary()?;
        loop {
            match self.peek() {
                Some(Tok::Star) => {
                    self.pos += 1;
                    acc *= self.unary()?;
                }
                Some(Tok::Slash) => {
                    let line = self.line();
                    self.pos += 1;
                    let rhs = self.unary()?;
                    if rhs == 0.0 {
                        return Err(err(line, "division by zero"));
                    }
                    acc /= rhs;
                }
                _ => return Ok(acc),
            }
        }
    }

    fn enter(&mut self, line: usize) -> Result<(), HfsError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(err(
                line,
                format!("expression nested too deeply (more than {MAX_NESTING} levels)"),
            ));
        }
        Ok(())
    }

    fn unary(&mut self) -> Result<f64, HfsError> {
        let line = self.line();
        match self.bump() {
            Some(Tok::Minus) => {
                self.enter(line)?;
                let v = self.unary()?;
                self.depth -= 1;
                Ok(-v)
            }
            Some(Tok::Plus) => {
                self.enter(line)?;
                let v = self.unary()?;
                self.depth -= 1;
                Ok(v)
            }
            Some(Tok::Number(v)) => Ok(v),
            Some(Tok::LParen) => {
                self.enter(line)?;
                let v = self.expr()?;
                self.expect(Tok::RParen, "')'")?;
                self.depth -= 1;
                Ok(v)
            }
            Some(Tok::Name(n)) => Err(err(line, format!("name '{n}' cannot be used in a value"))),
            Some(t) => Err(err(line, format!("expected a number, found {}", describe(&t)))),
            None => Err(err(line, "expected a number, found end of input")),
        }
    }
}

fn describe(t: &Tok) -> String {
    match t {
        Tok::Number(v) => format!("number {v}"),
        Tok::Name(n) => format!("name '{n}'"),
        Tok::Eq => "'='".to_string(),
        Tok::Plus => "'+'".to_string(),
        Tok::Minus => "'-'".to_string(),
        Tok::Star => "'*'".to_string(),
        Tok::Slash => "'/'".to_string(),
        Tok::LParen => "'('".to_string(),
        Tok::RParen => "')'".to_string(),
        Tok::LBracket => "'['".to_string(),
        Tok::RBracket => "']'".to_string(),
        Tok::Comma => "','".to_string(),
        Tok::Sep => "end of statement".to_string(),
    }
}

/// Parse and evaluate a declaration block into its assignments, in order.
pub fn parse_block(text: &str) -> Result<Vec<Assignment>, HfsError> {
    let toks = tokenize(text)?;
    let last_line = toks.last().map(|t| t.line).unwrap_or(1);
    let mut parser = Parser {
        toks,
        pos: 0,
        last_line,
        depth: 0,
    };
    parser.block()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(text: &str) -> Value {
        let mut a = parse_block(text).unwrap();
        assert_eq!(a.len(), 1);
        a.remove(0).value
    }

    #[test]
    fn scalars_and_arithmetic() {
        assert_eq!(single("x = 1.5"), Value::Scalar(1.5));
        assert_eq!(single("x = -2e3"), Value::Scalar(-2000.0));
        assert_eq!(single("x = 3/2"), Value::Scalar(1.5));
        assert_eq!(single("x = 2 + 3 * 4"), Value::Scalar(14.0));
        assert_eq!(single("x = (2 + 3) * 4"), Value::Scalar(20.0));
        assert_eq!(single("x = .5"), Value::Scalar(0.5));
    }

    #[test]
    fn sequences() {
        assert_eq!(single("J = [0.5, 1.5]"), Value::Sequence(vec![0.5, 1.5]));
        assert_eq!(single("J = (0.5, -1.5,)"), Value::Sequence(vec![0.5, -1.5]));
        assert_eq!(single("J = []"), Value::Sequence(vec![]));
        assert_eq!(single("J = [1/2,\n 3/2]"), Value::Sequence(vec![0.5, 1.5]));
    }

    #[test]
    fn separators_and_comments() {
        let a = parse_block("spin = 1.5; J = [0.5, 0.5]  # levels\n\n# note\nbkg = 7").unwrap();
        let names: Vec<&str> = a.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["spin", "J", "bkg"]);
        assert_eq!(a[2].line, 4);
    }

    #[test]
    fn names_are_never_evaluated() {
        let e = parse_block("scale = spin * 2").unwrap_err();
        assert!(e.to_string().contains("name 'spin'"), "{e}");
        assert!(parse_block("x = __import__").is_err());
    }

    #[test]
    fn malformed_input_is_rejected() {
        assert!(parse_block("x = ").is_err());
        assert!(parse_block("x 1").is_err());
        assert!(parse_block("x = [1, 2").is_err());
        assert!(parse_block("x = [[1], 2]").is_err());
        assert!(parse_block("x = 1 2").is_err());
        assert!(parse_block("x = 1 / 0").is_err());
        assert!(parse_block("x = 'a'").is_err());
    }

    #[test]
    fn deep_nesting_is_an_error_not_a_crash() {
        let signs = format!("scale = {}60", "-".repeat(100_000));
        assert!(matches!(parse_block(&signs), Err(HfsError::Parameter(_))));

        let parens = format!("scale = {}60{}", "(".repeat(100_000), ")".repeat(100_000));
        match parse_block(&parens) {
            Err(HfsError::Parameter(msg)) => assert!(msg.contains("nested too deeply"), "{msg}"),
            other => panic!("expected ParameterError, got {other:?}"),
        }

        let seq = format!("J = [{}1, 2]", "+".repeat(100_000));
        assert!(matches!(parse_block(&seq), Err(HfsError::Parameter(_))));
    }

    #[test]
    fn moderate_nesting_still_evaluates() {
        let depth = MAX_NESTING / 2;
        let text = format!("x = {}7{}", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(single(&text), Value::Scalar(7.0));
        assert_eq!(single("x = --+-5"), Value::Scalar(-5.0));
    }
}
