//! Writer for declarations, types and literal values.
//!
//! Output is canonical: [`parse_declarations`](super::parse_declarations),
//! [`parse_type`](super::parse_type) and [`parse_value`](super::parse_value)
//! read back exactly what is written here.

use gridtypes_engine::error::InternalError;
use gridtypes_engine::types::{DataType, DateTimeFormats};
use gridtypes_engine::value::{CellValue, NumberValue};

use super::lexer::escape;
use crate::error::Result;
use crate::registry::{TaggedTypeDefinition, TypeArgExpr, TypeExpr};

/// Joins tokens with single spaces, except directly after an opening
/// bracket and before attached punctuation.
#[derive(Debug, Default)]
pub struct OutputBuilder {
    out: String,
    glue: bool,
}

impl OutputBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A space-separated token.
    pub fn t(&mut self, token: &str) -> &mut Self {
        if !self.out.is_empty() && !self.glue {
            self.out.push(' ');
        }
        self.push(token)
    }

    /// A token written directly after the previous one: `(`, `,`, `)`.
    pub fn attach(&mut self, token: &str) -> &mut Self {
        self.push(token)
    }

    pub fn quoted(&mut self, text: &str) -> &mut Self {
        self.t(&format!("\"{}\"", escape(text)))
    }

    fn push(&mut self, token: &str) -> &mut Self {
        self.out.push_str(token);
        self.glue = token.ends_with(['(', '[', '{', '<']);
        self
    }

    pub fn finish(self) -> String {
        self.out
    }
}

/// `TYPE Name(@TYPEVAR a) TAGGED A(NUMBER) | B`
pub fn write_declaration(definition: &TaggedTypeDefinition) -> String {
    let mut b = OutputBuilder::new();
    b.t("TYPE").t(definition.name().as_str());
    if definition.is_generic() {
        b.attach("(");
        for (idx, var) in definition.type_vars().iter().enumerate() {
            if idx > 0 {
                b.attach(",");
            }
            b.t(&var.to_string());
        }
        b.attach(")");
    }
    b.t("TAGGED");
    for (idx, tag) in definition.tags().iter().enumerate() {
        if idx > 0 {
            b.t("|");
        }
        b.t(&tag.name);
        if let Some(inner) = &tag.inner {
            b.attach("(");
            type_expr(&mut b, inner);
            b.attach(")");
        }
    }
    b.finish()
}

pub fn write_type_expr(expr: &TypeExpr) -> String {
    let mut b = OutputBuilder::new();
    type_expr(&mut b, expr);
    b.finish()
}

pub fn write_type(data_type: &DataType) -> String {
    write_type_expr(&TypeExpr::from_data_type(data_type))
}

fn type_expr(b: &mut OutputBuilder, expr: &TypeExpr) {
    match expr {
        TypeExpr::Number { unit, min_dp } => {
            b.t("NUMBER");
            if *min_dp > 0 {
                b.t(&min_dp.to_string());
            }
            if !unit.is_scalar() {
                b.t("{").t(&unit.to_string()).attach("}");
            }
        }
        TypeExpr::Text => {
            b.t("TEXT");
        }
        TypeExpr::Boolean => {
            b.t("BOOLEAN");
        }
        TypeExpr::DateTime(granularity) => {
            b.t("DATETIME").t(granularity.keyword());
        }
        TypeExpr::Tagged { name, args } => {
            b.t("TAGGED").t(name.as_str());
            if !args.is_empty() {
                b.attach("<");
                for (idx, arg) in args.iter().enumerate() {
                    if idx > 0 {
                        b.attach(",");
                    }
                    match arg {
                        TypeArgExpr::Unit(unit) => {
                            b.t("{").t(&unit.to_string()).attach("}");
                        }
                        TypeArgExpr::Type(ty) => type_expr(b, ty),
                    }
                }
                b.attach(">");
            }
        }
        TypeExpr::Tuple(members) => {
            b.t("(");
            for (idx, member) in members.iter().enumerate() {
                if idx > 0 {
                    b.attach(",");
                }
                type_expr(b, member);
            }
            b.attach(")");
        }
        TypeExpr::Array(element) => {
            b.t("[");
            if let Some(element) = element {
                type_expr(b, element);
            }
            b.attach("]");
        }
        TypeExpr::Function(arg, result) => {
            b.t("FUNCTION").attach("(");
            type_expr(b, arg);
            b.t("->");
            type_expr(b, result);
            b.attach(")");
        }
        TypeExpr::Var(name) => {
            b.t("@TYPEVAR").t(name);
        }
    }
}

/// Write `value` as a literal of `data_type`. Dates use the strict format.
pub fn write_value(data_type: &DataType, value: &CellValue, formats: &DateTimeFormats) -> Result<String> {
    let mut b = OutputBuilder::new();
    literal(&mut b, data_type, value, formats)?;
    Ok(b.finish())
}

fn literal(b: &mut OutputBuilder, data_type: &DataType, value: &CellValue, formats: &DateTimeFormats) -> Result<()> {
    match (data_type, value) {
        (DataType::Number(_), CellValue::Number(n)) => {
            b.t(&number_literal(*n));
        }
        (DataType::Text, CellValue::Text(s)) => {
            b.quoted(s);
        }
        (DataType::Boolean, CellValue::Boolean(v)) => {
            b.t(if *v { "true" } else { "false" });
        }
        (DataType::DateTime(info), CellValue::Temporal(t)) => {
            let text = formats.for_type(info.granularity).format_strict(t)?;
            b.quoted(&text);
        }
        (DataType::Tagged(_), CellValue::Tagged { tag, inner }) => {
            let tags = data_type.tags()?;
            let Some(declared) = tags.get(*tag) else {
                return Err(InternalError::TagOutOfRange {
                    type_name: data_type.to_string(),
                    index: *tag,
                    tag_count: tags.len(),
                }
                .raise()
                .into());
            };
            if is_bare_tag(&declared.name) {
                b.t(&declared.name);
            } else {
                b.quoted(&declared.name);
            }
            match (&declared.inner, inner) {
                (Some(inner_type), Some(inner)) => {
                    b.attach("(");
                    literal(b, inner_type, inner, formats)?;
                    b.attach(")");
                }
                (None, None) => {}
                _ => return Err(shape_mismatch(data_type)),
            }
        }
        (DataType::Tuple(members), CellValue::Tuple(values)) if members.len() == values.len() => {
            b.t("(");
            for (idx, (member, value)) in members.iter().zip(values).enumerate() {
                if idx > 0 {
                    b.attach(",");
                }
                literal(b, member, value, formats)?;
            }
            b.attach(")");
        }
        (DataType::Array(element), CellValue::Array(items)) => {
            b.t("[");
            if !items.is_empty() {
                let Some(element) = element else {
                    return Err(shape_mismatch(data_type));
                };
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        b.attach(",");
                    }
                    literal(b, element, item, formats)?;
                }
            }
            b.attach("]");
        }
        _ => return Err(shape_mismatch(data_type)),
    }
    Ok(())
}

fn shape_mismatch(data_type: &DataType) -> crate::error::GridtypesError {
    InternalError::ShapeMismatch(data_type.to_string()).raise().into()
}

/// Decimals always carry a `.` so they read back as decimals.
fn number_literal(n: NumberValue) -> String {
    let text = n.to_string();
    match n {
        NumberValue::Decimal(_) if !text.contains(['.', 'e', 'E']) => format!("{}.0", text),
        _ => text,
    }
}

fn is_bare_tag(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    starts_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') && name != "true" && name != "false"
}
