//! Go rendering of construction fragments

use crate::fragment::{Condition, Expr, Fragment, ScalarShape, Shape};
use cfn_controller_gen_common::TargetType;
use serde::Serialize;

/// Renders fragments as Go statements against the goformation package of
/// one API group
pub struct GoRenderer {
    package: String,
}

/// Optional imports needed by a rendered fragment sequence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSet {
    pub json: bool,
    pub reflect: bool,
    pub tags: bool,
}

impl ImportSet {
    pub fn from_fragments(fragments: &[Fragment]) -> Self {
        let mut imports = Self::default();
        for fragment in fragments {
            fragment.walk(&mut |f| match f {
                Fragment::Unmarshal { .. } => imports.json = true,
                Fragment::Guard {
                    condition: Condition::NotDefault { .. },
                    ..
                } => imports.reflect = true,
                Fragment::Allocate { shape, .. } if contains_tag(shape) => imports.tags = true,
                _ => {},
            });
        }
        imports
    }
}

fn push(lines: &mut Vec<String>, level: usize, line: String) {
    lines.push(format!("{}{}", "\t".repeat(level), line));
}

fn contains_tag(shape: &Shape) -> bool {
    match shape {
        Shape::Tag => true,
        Shape::List(item) | Shape::Map(item) => contains_tag(item),
        Shape::Struct(_) | Shape::Scalar(_) => false,
    }
}

impl GoRenderer {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
        }
    }

    /// Render fragments as tab-indented Go, starting at `indent` tabs
    pub fn render(&self, fragments: &[Fragment], indent: usize) -> String {
        let mut lines = Vec::new();
        self.render_block(fragments, indent, &mut lines);
        lines.join("\n")
    }

    /// Go type of a field on the user-facing spec object
    pub fn spec_type(target: &TargetType) -> String {
        match target {
            TargetType::String => "string".to_string(),
            TargetType::Integer => "int".to_string(),
            TargetType::Boolean => "bool".to_string(),
            TargetType::Reference => "metav1alpha1.ObjectReference".to_string(),
            TargetType::Tag => "metav1alpha1.Tag".to_string(),
            TargetType::Named(name) => name.clone(),
            TargetType::List(item) => format!("[]{}", Self::spec_type(item)),
            TargetType::Map(item) => format!("map[string]{}", Self::spec_type(item)),
        }
    }

    /// Go type of a value on the construction side
    pub fn shape_type(&self, shape: &Shape) -> String {
        match shape {
            Shape::Struct(name) => format!("{}.{}", self.package, name),
            Shape::Tag => "tags.Tag".to_string(),
            Shape::Scalar(ScalarShape::String) => "string".to_string(),
            Shape::Scalar(ScalarShape::Float) => "float64".to_string(),
            Shape::List(item) => format!("[]{}", self.shape_type(item)),
            Shape::Map(item) => format!("map[string]{}", self.shape_type(item)),
        }
    }

    fn render_block(&self, fragments: &[Fragment], depth: usize, lines: &mut Vec<String>) {
        for (i, fragment) in fragments.iter().enumerate() {
            self.render_fragment(fragment, depth, lines);

            let is_block = matches!(
                fragment,
                Fragment::Guard { .. }
                    | Fragment::Iterate { .. }
                    | Fragment::DefaultScope { .. }
                    | Fragment::ResolveReference { .. }
            );
            if is_block && i + 1 < fragments.len() {
                lines.push(String::new());
            }
        }
    }

    fn render_fragment(&self, fragment: &Fragment, depth: usize, lines: &mut Vec<String>) {
        match fragment {
            Fragment::Guard { condition, body } => {
                push(lines, depth, format!("if {} {{", self.condition(condition)));
                self.render_block(body, depth + 1, lines);
                push(lines, depth, "}".to_string());
            },
            Fragment::Assign { target, value } => {
                push(lines, depth, format!("{} = {}", target, self.expr(value)));
            },
            Fragment::Allocate { var, shape } => match shape {
                Shape::Scalar(_) => push(lines, depth, format!("var {} {}", var, self.shape_type(shape))),
                _ => push(lines, depth, format!("{} := {}{{}}", var, self.shape_type(shape))),
            },
            Fragment::Iterate {
                source,
                key,
                item,
                body,
            } => {
                let key = key.as_deref().unwrap_or("_");
                push(lines, depth, format!("for {}, {} := range {} {{", key, item, source));
                self.render_block(body, depth + 1, lines);
                push(lines, depth, "}".to_string());
            },
            Fragment::Append { list, value } => {
                push(lines, depth, format!("{} = append({}, {})", list, list, self.expr(value)));
            },
            Fragment::Insert { map, key, value } => {
                push(lines, depth, format!("{}[{}] = {}", map, key, self.expr(value)));
            },
            Fragment::Unmarshal { var, source } => {
                push(lines, depth, format!("{} := make(map[string]interface{{}})", var));
                push(
                    lines,
                    depth,
                    format!(
                        "if err := json.Unmarshal([]byte({}), &{}); err != nil {{",
                        source, var
                    ),
                );
                push(lines, depth + 1, "return \"\", err".to_string());
                push(lines, depth, "}".to_string());
            },
            Fragment::DefaultScope { var, source, scope } => {
                push(lines, depth, format!("{} := {}.DeepCopy()", var, source));
                push(lines, depth, format!("if {}.ObjectRef.Namespace == \"\" {{", var));
                push(
                    lines,
                    depth + 1,
                    format!("{}.ObjectRef.Namespace = {}", var, self.expr(scope)),
                );
                push(lines, depth, "}".to_string());
            },
            Fragment::ResolveReference { var, reference } => {
                push(lines, depth, format!("{}, err := {}.String(client)", var, reference));
                push(lines, depth, "if err != nil {".to_string());
                push(lines, depth + 1, "return \"\", err".to_string());
                push(lines, depth, "}".to_string());
            },
            Fragment::Output {
                name,
                attribute,
                logical_id,
            } => {
                push(lines, depth, format!("\"{}\": map[string]interface{{}}{{", name));
                push(
                    lines,
                    depth + 1,
                    format!(
                        "\"Value\": cloudformation.GetAtt(\"{}\", \"{}\"),",
                        logical_id, attribute
                    ),
                );
                push(lines, depth + 1, "\"Export\": map[string]interface{}{".to_string());
                push(lines, depth + 2, format!("\"Name\": in.Name + \"{}\",", name));
                push(lines, depth + 1, "},".to_string());
                push(lines, depth, "},".to_string());
            },
        }
    }

    fn condition(&self, condition: &Condition) -> String {
        match condition {
            Condition::NotEmpty(expr) => format!("{} != \"\"", expr),
            Condition::IsEmpty(expr) => format!("{} == \"\"", expr),
            Condition::NonZero(expr) => format!("{} != 0", expr),
            Condition::NotDefault { expr, ty } => {
                format!("!reflect.DeepEqual({}, {}{{}})", expr, Self::spec_type(ty))
            },
            Condition::NonEmptyCollection(expr) => format!("len({}) > 0", expr),
        }
    }

    fn expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Path(path) => path.clone(),
            Expr::Float(path) => format!("float64({})", path),
            Expr::Address(var) => format!("&{}", var),
            Expr::ObjectName => "in.Name".to_string(),
            Expr::ObjectNamespace => "in.Namespace".to_string(),
        }
    }
}
