use std::fmt;
use std::str::FromStr;

use crate::history::date::Date;
use crate::history::object_vector::ObjectVector;

/// Pure-data form of a history: `factory_type_tag` is `"dense <type>"` or
/// `"sparse <type>"`, where `<type>` is `D` (real) or `I` (integer). Round
/// trips through [`HistoryData::to_text`]/[`HistoryData::parse`] as
/// `<type>[<date>,<value>|<date>,<value>|...]`, matching the factory tag's
/// own type letter.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryData {
    pub factory_type_tag: String,
    pub name: String,
    pub dates: Vec<Date>,
    pub values: ObjectVector,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryDataParseError(pub String);

impl fmt::Display for HistoryDataParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid history data text: {}", self.0)
    }
}

impl std::error::Error for HistoryDataParseError {}

impl HistoryData {
    pub fn new_dense_real(name: impl Into<String>, dates: Vec<Date>, values: Vec<f64>) -> Self {
        Self {
            factory_type_tag: "dense D".to_string(),
            name: name.into(),
            dates,
            values: ObjectVector::Real(values),
        }
    }

    pub fn new_dense_integer(name: impl Into<String>, dates: Vec<Date>, values: Vec<i64>) -> Self {
        Self {
            factory_type_tag: "dense I".to_string(),
            name: name.into(),
            dates,
            values: ObjectVector::Integer(values),
        }
    }

    pub fn is_sparse(&self) -> bool {
        self.factory_type_tag.starts_with("sparse")
    }

    pub fn with_sparse_tag(mut self) -> Self {
        if !self.is_sparse() {
            self.factory_type_tag = format!("sparse {}", self.values.type_tag());
        }
        self
    }

    /// Serializes the `(date, value)` events as `<type>[<date>,<value>|...]`,
    /// e.g. `D[2020-01-01,1.5|2020-02-01,2]`. The leading `<type>` echoes the
    /// value column's own tag, independent of the dense/sparse factory tag.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push(self.values.type_tag());
        out.push('[');
        for i in 0..self.dates.len() {
            if i > 0 {
                out.push('|');
            }
            out.push_str(&self.dates[i].to_string());
            out.push(',');
            match &self.values {
                ObjectVector::Real(v) => out.push_str(&v[i].to_string()),
                ObjectVector::Integer(v) => out.push_str(&v[i].to_string()),
            }
        }
        out.push(']');
        out
    }

    /// Parses the text dump produced by [`HistoryData::to_text`] back into
    /// dates and an [`ObjectVector`]; `name` and `factory_type_tag` are
    /// supplied by the caller since the text form carries neither.
    pub fn parse(name: impl Into<String>, factory_type_tag: impl Into<String>, text: &str) -> Result<Self, HistoryDataParseError> {
        let text = text.trim();
        let mut chars = text.chars();
        let type_tag = chars.next().ok_or_else(|| HistoryDataParseError(text.to_string()))?;
        let rest: String = chars.collect();
        let body = rest
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .ok_or_else(|| HistoryDataParseError(text.to_string()))?;

        let mut dates = Vec::new();
        let mut reals = Vec::new();
        let mut ints = Vec::new();
        if !body.is_empty() {
            for entry in body.split('|') {
                let (date_str, value_str) = entry
                    .split_once(',')
                    .ok_or_else(|| HistoryDataParseError(text.to_string()))?;
                let date = Date::from_str(date_str).map_err(|_| HistoryDataParseError(text.to_string()))?;
                dates.push(date);
                match type_tag {
                    'D' => reals.push(value_str.parse::<f64>().map_err(|_| HistoryDataParseError(text.to_string()))?),
                    'I' => ints.push(value_str.parse::<i64>().map_err(|_| HistoryDataParseError(text.to_string()))?),
                    _ => return Err(HistoryDataParseError(text.to_string())),
                }
            }
        }
        let values = match type_tag {
            'D' => ObjectVector::Real(reals),
            'I' => ObjectVector::Integer(ints),
            _ => return Err(HistoryDataParseError(text.to_string())),
        };
        Ok(Self { factory_type_tag: factory_type_tag.into(), name: name.into(), dates, values })
    }
}
