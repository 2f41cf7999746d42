//! Types needed for parsing.

use nom::{error::VerboseError, IResult};
use std::{collections::HashMap, fmt::Display};
use thiserror::Error as ThisError;

/// DecType is the core type of each parse-able item.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum DecType {
    Nodes,
    Node,
    Links,
    Link,
    Routes,
    Route,
}

impl DecType {
    /// The type of declaration that may appear inside a section of this type.
    pub fn child(self) -> Option<DecType> {
        match self {
            DecType::Nodes => Some(DecType::Node),
            DecType::Links => Some(DecType::Link),
            DecType::Routes => Some(DecType::Route),
            _ => None,
        }
    }

    /// The arguments a declaration of this type accepts.
    pub fn arguments(self) -> &'static [&'static str] {
        match self {
            DecType::Node => &["address", "name"],
            DecType::Link => &["a", "b", "bandwidth", "delay", "loss", "corruption"],
            DecType::Route => &["node", "destination", "link"],
            _ => &[],
        }
    }
}

impl Display for DecType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

pub type Res<T, U> = IResult<T, U, VerboseError<T>>;
pub type Params = HashMap<String, String>;

/// A single bracketed declaration and where it was found.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Declaration {
    pub dectype: DecType,
    pub options: Params,
    /// The 1-based line the declaration is on
    pub line: usize,
}

/// Ndl Struct.
/// Used to store the core parsed network description.
///
/// Contains: the [Declaration]s of the nodes, the links, and the routes if a
/// `[Routes]` section was present
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Ndl {
    pub nodes: Vec<Declaration>,
    pub links: Vec<Declaration>,
    pub routes: Option<Vec<Declaration>>,
}

#[derive(Debug, ThisError, PartialEq, Eq, Clone)]
pub enum ParseError {
    #[error("Line {line}: unable to parse '{text}': {reason}")]
    Syntax {
        line: usize,
        text: String,
        reason: String,
    },
    #[error("Line {line}: extra input at '{rest}'")]
    ExtraInput { line: usize, rest: String },
    #[error("Line {line}: expected {expected} tabs and got {found} tabs instead")]
    Indentation {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("Line {line}: expected type {expected} and got type {found} instead")]
    UnexpectedType {
        line: usize,
        expected: DecType,
        found: DecType,
    },
    #[error("Line {line}: cannot declare {dectype} at the top level")]
    NotASection { line: usize, dectype: DecType },
    #[error("Line {line}: the {dectype} section is declared more than once")]
    DuplicateSection { line: usize, dectype: DecType },
    #[error("Line {line}: duplicate argument '{name}'")]
    DuplicateArgument { line: usize, name: String },
    #[error("Line {line}: {dectype} does not take the argument '{name}'")]
    UnknownArgument {
        line: usize,
        dectype: DecType,
        name: String,
    },
    #[error("Line {line}: {dectype} is missing the argument '{name}'")]
    MissingArgument {
        line: usize,
        dectype: DecType,
        name: &'static str,
    },
    #[error("Line {line}: invalid value '{value}' for '{name}'")]
    InvalidValue {
        line: usize,
        name: &'static str,
        value: String,
    },
}
