use std::fmt;

use crate::types::TemporalValue;

/// A number cell: exact integers where possible, otherwise a float.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NumberValue {
    Integer(i64),
    Decimal(f64),
}

impl NumberValue {
    /// Parse number text. Integers that overflow `i64` fall back to a decimal.
    pub fn parse(text: &str) -> Option<NumberValue> {
        let text = text.trim();
        if let Ok(n) = text.parse::<i64>() {
            return Some(NumberValue::Integer(n));
        }
        match text.parse::<f64>() {
            Ok(f) if f.is_finite() => Some(NumberValue::Decimal(f)),
            _ => None,
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            NumberValue::Integer(n) => n as f64,
            NumberValue::Decimal(f) => f,
        }
    }

    /// Display text padded to at least `min_dp` decimal places.
    pub fn display_with(self, min_dp: u8) -> String {
        let mut text = self.to_string();
        let min_dp = min_dp as usize;
        if min_dp == 0 || text.contains(['e', 'E']) {
            return text;
        }
        let decimals = match text.find('.') {
            Some(dot) => text.len() - dot - 1,
            None => {
                text.push('.');
                0
            }
        };
        for _ in decimals..min_dp {
            text.push('0');
        }
        text
    }
}

impl fmt::Display for NumberValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberValue::Integer(n) => write!(f, "{}", n),
            NumberValue::Decimal(d) => write!(f, "{}", d),
        }
    }
}

impl From<i64> for NumberValue {
    fn from(n: i64) -> Self {
        NumberValue::Integer(n)
    }
}

impl From<f64> for NumberValue {
    fn from(f: f64) -> Self {
        NumberValue::Decimal(f)
    }
}

/// A fully collapsed cell value, shaped like the column's [`DataType`](crate::types::DataType).
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Number(NumberValue),
    Text(String),
    Temporal(TemporalValue),
    Boolean(bool),
    /// `tag` indexes the tagged type's tag list.
    Tagged {
        tag: usize,
        inner: Option<Box<CellValue>>,
    },
    Tuple(Vec<CellValue>),
    Array(Vec<CellValue>),
}

impl CellValue {
    pub fn tagged(tag: usize, inner: Option<CellValue>) -> CellValue {
        CellValue::Tagged {
            tag,
            inner: inner.map(Box::new),
        }
    }

    /// Short name of the variant, for shape-mismatch reports.
    pub fn kind_name(&self) -> &'static str {
        match self {
            CellValue::Number(_) => "number",
            CellValue::Text(_) => "text",
            CellValue::Temporal(_) => "date/time",
            CellValue::Boolean(_) => "boolean",
            CellValue::Tagged { .. } => "tagged value",
            CellValue::Tuple(_) => "tuple",
            CellValue::Array(_) => "array",
        }
    }
}

impl From<NumberValue> for CellValue {
    fn from(n: NumberValue) -> Self {
        CellValue::Number(n)
    }
}
