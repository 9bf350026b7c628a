//! ASCII FBX reader.
//!
//! Grammar, line oriented:
//!
//! ```text
//! ; comment
//! Name: prop, prop, ... {
//!     Child: ...
//!     Array: *3 {
//!         a: 1,2,3
//!     }
//! }
//! ```
//!
//! A property list ends at the end of the line unless the line ends with a
//! comma.

use tracing::debug;

use super::{Document, Node, ParseError, Property, MAX_DEPTH};

pub(super) fn parse(text: &str) -> Result<Document, ParseError> {
    let tokens = tokenize(text)?;
    let mut parser = Parser { tokens, pos: 0 };
    let nodes = parser.nodes(0)?;

    let version = nodes
        .iter()
        .find(|n| n.name == "FBXHeaderExtension")
        .and_then(|h| h.child("FBXVersion"))
        .and_then(|v| v.property(0))
        .and_then(Property::as_i64)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(0);

    debug!("Parsed ASCII FBX v{}: {} top-level nodes", version, nodes.len());
    Ok(Document { version, nodes })
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    /// `Name:`
    Key(String),
    /// Unquoted word that is not a key, e.g. `T` or `Y`.
    Word(String),
    Str(String),
    Number(String),
    /// `*N` array length prefix.
    ArrayLen(usize),
    Comma,
    Open,
    Close,
    Newline,
}

#[derive(Debug)]
struct Spanned {
    token: Token,
    line: usize,
}

fn tokenize(text: &str) -> Result<Vec<Spanned>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();
    let mut line = 1;

    while let Some(&(start, c)) = chars.peek() {
        let token = match c {
            ' ' | '\t' | '\r' => {
                chars.next();
                continue;
            }
            ';' => {
                while chars.peek().is_some_and(|&(_, c)| c != '\n') {
                    chars.next();
                }
                continue;
            }
            '\n' => {
                chars.next();
                let spanned = Spanned {
                    token: Token::Newline,
                    line,
                };
                line += 1;
                tokens.push(spanned);
                continue;
            }
            '{' => {
                chars.next();
                Token::Open
            }
            '}' => {
                chars.next();
                Token::Close
            }
            ',' => {
                chars.next();
                Token::Comma
            }
            '"' => {
                chars.next();
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some((_, '"')) => break,
                        Some((_, '\n')) | None => {
                            return Err(ParseError::Syntax {
                                line,
                                reason: "unterminated string".into(),
                            })
                        }
                        Some((_, c)) => value.push(c),
                    }
                }
                Token::Str(value)
            }
            '*' => {
                chars.next();
                let mut digits = String::new();
                while let Some(&(_, d)) = chars.peek().filter(|(_, d)| d.is_ascii_digit()) {
                    digits.push(d);
                    chars.next();
                }
                let len = digits.parse().map_err(|_| ParseError::Syntax {
                    line,
                    reason: "expected array length after '*'".into(),
                })?;
                Token::ArrayLen(len)
            }
            c if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => {
                let mut end = start;
                while let Some(&(i, d)) = chars.peek() {
                    if d.is_ascii_alphanumeric() || matches!(d, '.' | '-' | '+') {
                        end = i + d.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                Token::Number(text[start..end].to_string())
            }
            _ => {
                let mut end = start;
                while let Some(&(i, d)) = chars.peek() {
                    if d.is_alphanumeric() || matches!(d, '_' | '|' | '.' | '-' | '+') {
                        end = i + d.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                if end == start {
                    return Err(ParseError::Syntax {
                        line,
                        reason: format!("unexpected character '{c}'"),
                    });
                }
                let word = text[start..end].to_string();
                if chars.peek().is_some_and(|&(_, c)| c == ':') {
                    chars.next();
                    Token::Key(word)
                } else {
                    Token::Word(word)
                }
            }
        };
        tokens.push(Spanned { token, line });
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |s| s.line)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|s| s.token.clone());
        self.pos += 1;
        token
    }

    fn skip_newlines(&mut self) {
        while self.peek() == Some(&Token::Newline) {
            self.pos += 1;
        }
    }

    fn error(&self, reason: impl Into<String>) -> ParseError {
        ParseError::Syntax {
            line: self.line(),
            reason: reason.into(),
        }
    }

    /// Node list, either top level (`depth` 0) or inside braces.
    fn nodes(&mut self, depth: usize) -> Result<Vec<Node>, ParseError> {
        let nested = depth > 0;
        let mut nodes = Vec::new();
        loop {
            self.skip_newlines();
            match self.next() {
                None if nested => return Err(self.error("missing '}'")),
                None => break,
                Some(Token::Close) if nested => break,
                Some(Token::Key(name)) => nodes.push(self.node(name, depth)?),
                Some(other) => return Err(self.error(format!("expected a node name, found {other:?}"))),
            }
        }
        Ok(nodes)
    }

    fn node(&mut self, name: String, depth: usize) -> Result<Node, ParseError> {
        let mut node = Node::new(name);

        loop {
            match self.peek() {
                None | Some(Token::Newline) | Some(Token::Close) | Some(Token::Open) => break,
                Some(Token::Comma) => {
                    self.pos += 1;
                    self.skip_newlines();
                }
                Some(_) => {
                    let property = self.property()?;
                    node.properties.push(property);
                }
            }
        }

        if self.peek() == Some(&Token::Open) {
            if depth >= MAX_DEPTH {
                return Err(self.error(format!("nodes nested deeper than {MAX_DEPTH}")));
            }
            self.pos += 1;
            node.children = self.nodes(depth + 1)?;
        }

        Ok(node)
    }

    fn property(&mut self) -> Result<Property, ParseError> {
        match self.next() {
            Some(Token::Str(s)) => Ok(Property::String(s)),
            Some(Token::Word(w)) => Ok(Property::String(w)),
            Some(Token::Number(n)) => self.number(&n),
            Some(Token::ArrayLen(len)) => self.array(len),
            other => Err(self.error(format!("expected a property, found {other:?}"))),
        }
    }

    fn number(&self, text: &str) -> Result<Property, ParseError> {
        if let Ok(v) = text.parse::<i64>() {
            return Ok(Property::I64(v));
        }
        text.parse::<f64>()
            .map(Property::F64)
            .map_err(|_| self.error(format!("invalid number '{text}'")))
    }

    /// `*N { a: v, v, ... }`. Integer-only arrays stay integral.
    fn array(&mut self, len: usize) -> Result<Property, ParseError> {
        self.skip_newlines();
        if self.next() != Some(Token::Open) {
            return Err(self.error("expected '{' after array length"));
        }
        self.skip_newlines();

        let mut raw = Vec::with_capacity(len.min(1 << 16));
        if self.peek() == Some(&Token::Key("a".into())) {
            self.pos += 1;
            loop {
                self.skip_newlines();
                match self.next() {
                    Some(Token::Number(n)) => raw.push(n),
                    Some(Token::Comma) => {}
                    Some(Token::Close) => break,
                    other => return Err(self.error(format!("unexpected {other:?} in array"))),
                }
            }
        } else {
            self.skip_newlines();
            if self.next() != Some(Token::Close) {
                return Err(self.error("expected 'a:' in array"));
            }
        }

        if raw.len() != len {
            return Err(self.error(format!("array declares {len} values, found {}", raw.len())));
        }

        let ints: Option<Vec<i64>> = raw.iter().map(|s| s.parse().ok()).collect();
        if let Some(ints) = ints {
            return Ok(Property::I64Array(ints));
        }
        let floats: Result<Vec<f64>, _> = raw.iter().map(|s| s.parse::<f64>()).collect();
        floats
            .map(Property::F64Array)
            .map_err(|_| self.error("invalid number in array"))
    }
}
