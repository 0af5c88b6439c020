//! Parser for the path expression language used to address AST nodes.
//!
//! The grammar is the small XPath-like dialect the identifier layer emits:
//!
//! ```text
//! expr      := step+
//! step      := ('//' | '/') name predicate*
//! predicate := '[' expr ']' | '[' '@value' '=' '\'' text '\'' ']'
//! ```
//!
//! `//` searches descendants, `/` direct children. A path predicate keeps a
//! node iff the relative expression matches at least one node under it; a
//! value predicate compares the node's normalized text.

use std::fmt;

use crate::error::Error;
use crate::tree::kinds;

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `[expr]`: at least one relative match must exist.
    Exists(PathExpr),
    /// `[@value='text']`: normalized node text must equal `text`.
    Value(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub axis: Axis,
    pub name: String,
    pub predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpr {
    pub steps: Vec<Step>,
}

impl PathExpr {
    pub fn parse(input: &str) -> Result<Self> {
        let mut parser = Parser { input: input.as_bytes(), pos: 0, whole: input };
        let expr = parser.expr()?;
        if parser.pos != parser.input.len() {
            return Err(parser.error("trailing input after expression"));
        }
        Ok(expr)
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            let axis = match step.axis {
                Axis::Child => "/",
                Axis::Descendant => "//",
            };
            write!(f, "{axis}{}", step.name)?;
            for predicate in &step.predicates {
                match predicate {
                    Predicate::Exists(expr) => write!(f, "[{expr}]")?,
                    Predicate::Value(value) => write!(f, "[@value='{value}']")?,
                }
            }
        }
        Ok(())
    }
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    whole: &'a str,
}

impl<'a> Parser<'a> {
    fn error(&self, message: &str) -> Error {
        Error::Parser(format!("{message} at offset {} in `{}`", self.pos, self.whole))
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> Result<PathExpr> {
        let mut steps = Vec::new();
        while self.peek() == Some(b'/') {
            steps.push(self.step()?);
        }
        if steps.is_empty() {
            return Err(self.error("expected `/` or `//`"));
        }
        Ok(PathExpr { steps })
    }

    fn step(&mut self) -> Result<Step> {
        self.eat(b'/');
        let axis = if self.eat(b'/') { Axis::Descendant } else { Axis::Child };
        let name = self.name()?;
        if kinds::grammar_kinds(&name).is_none() {
            return Err(self.error(&format!("unknown node name `{name}`")));
        }
        let mut predicates = Vec::new();
        while self.eat(b'[') {
            predicates.push(self.predicate()?);
            if !self.eat(b']') {
                return Err(self.error("expected `]`"));
            }
        }
        Ok(Step { axis, name, predicates })
    }

    fn name(&mut self) -> Result<String> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_')
        {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("expected a node name"));
        }
        Ok(String::from_utf8_lossy(&self.input[start..self.pos]).into_owned())
    }

    fn predicate(&mut self) -> Result<Predicate> {
        if self.input[self.pos..].starts_with(b"@value=") {
            self.pos += "@value=".len();
            return Ok(Predicate::Value(self.quoted()?));
        }
        Ok(Predicate::Exists(self.expr()?))
    }

    fn quoted(&mut self) -> Result<String> {
        if !self.eat(b'\'') {
            return Err(self.error("expected `'`"));
        }
        let start = self.pos;
        while self.peek().is_some_and(|b| b != b'\'') {
            self.pos += 1;
        }
        if !self.eat(b'\'') {
            return Err(self.error("unterminated string"));
        }
        Ok(String::from_utf8_lossy(&self.input[start..self.pos - 1]).into_owned())
    }
}
