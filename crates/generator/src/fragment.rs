//! Structured construction fragments
//!
//! The emitter produces these records instead of source text. A renderer
//! turns them into the syntax of the target language.

use cfn_controller_gen_common::TargetType;
use serde::Serialize;

/// One unit of emitted construction logic
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Fragment {
    /// Run `body` only when `condition` holds
    Guard {
        condition: Condition,
        body: Vec<Fragment>,
    },
    /// `target = value`
    Assign { target: String, value: Expr },
    /// Declare `var` as a fresh, empty value of `shape`
    Allocate { var: String, shape: Shape },
    /// Loop over the collection at `source`
    Iterate {
        source: String,
        /// Bound to the map key when iterating a map
        key: Option<String>,
        item: String,
        body: Vec<Fragment>,
    },
    /// Push `value` onto the list variable `list`
    Append { list: String, value: Expr },
    /// `map[key] = value`
    Insert {
        map: String,
        key: String,
        value: Expr,
    },
    /// Decode the JSON text at `source` into the new variable `var`
    Unmarshal { var: String, source: String },
    /// Copy the reference at `source` into `var`, filling a missing scope
    DefaultScope {
        var: String,
        source: String,
        scope: Expr,
    },
    /// Resolve the reference `reference` through the lookup client into `var`
    ResolveReference { var: String, reference: String },
    /// Export the resource attribute `attribute` as the stack output `name`
    Output {
        name: String,
        attribute: String,
        logical_id: String,
    },
}

impl Fragment {
    /// Child fragments of a block, empty for leaf fragments
    pub fn children(&self) -> &[Fragment] {
        match self {
            Fragment::Guard { body, .. } | Fragment::Iterate { body, .. } => body,
            _ => &[],
        }
    }

    /// Visit this fragment and every descendant, depth-first
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Fragment)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }
}

/// Guard conditions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Condition {
    /// String value is not empty
    NotEmpty(String),
    /// String value is empty
    IsEmpty(String),
    /// Numeric value is not zero
    NonZero(String),
    /// Value differs from the zero value of its declared type
    NotDefault { expr: String, ty: TargetType },
    /// List or map has at least one element
    NonEmptyCollection(String),
}

/// Right-hand side of an assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Expr {
    Path(String),
    /// Widen an integer value to a float
    Float(String),
    /// Take the address of a variable
    Address(String),
    /// Name of the owning object
    ObjectName,
    /// Namespace of the owning object
    ObjectNamespace,
}

/// Shape of an allocated value on the construction side
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Shape {
    /// Owner-namespaced nested type (e.g., "Deployment_StageDescription")
    Struct(String),
    /// Built-in tag type
    Tag,
    Scalar(ScalarShape),
    List(Box<Shape>),
    Map(Box<Shape>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScalarShape {
    String,
    Float,
}
