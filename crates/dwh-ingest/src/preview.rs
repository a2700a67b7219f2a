use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Number, Value};

use crate::table::CsvTable;

/// How many leading rows an upload echoes back.
pub const PREVIEW_ROWS: usize = 6;

/// Column-oriented view of the first rows of a file.
///
/// Serialises as `{"col": [v0, v1, …], …}` with columns in header order.
#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    columns: Vec<(String, Vec<Value>)>,
}

/// Type every cell of a column shares, inferred from all of its non-empty cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Integer,
    Float,
    Boolean,
    Text,
}

impl Preview {
    /// Build a preview of the first `limit` rows.
    ///
    /// Typing looks at the whole column so a preview never disagrees with
    /// what the rest of the file contains.
    pub fn from_table(table: &CsvTable, limit: usize) -> Self {
        let columns = table
            .headers()
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let kind = infer_kind(table.column(idx));
                let values = table
                    .column(idx)
                    .take(limit)
                    .map(|raw| to_value(raw, kind))
                    .collect();
                (name.clone(), values)
            })
            .collect();
        Self { columns }
    }

    /// Number of rows shown (the same for every column).
    pub fn row_count(&self) -> usize {
        self.columns.first().map(|(_, v)| v.len()).unwrap_or(0)
    }

    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }
}

impl Serialize for Preview {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, values) in &self.columns {
            map.serialize_entry(name, values)?;
        }
        map.end()
    }
}

fn infer_kind<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnKind {
    let mut int = true;
    let mut float = true;
    let mut boolean = true;
    let mut any = false;

    for raw in cells.filter(|c| !c.is_empty()) {
        any = true;
        int &= raw.parse::<i64>().is_ok();
        float &= parse_float(raw).is_some();
        boolean &= parse_bool(raw).is_some();
        if !(int || float || boolean) {
            return ColumnKind::Text;
        }
    }

    match (any, int, float, boolean) {
        (false, ..) => ColumnKind::Text,
        (_, true, ..) => ColumnKind::Integer,
        (_, _, true, _) => ColumnKind::Float,
        (_, _, _, true) => ColumnKind::Boolean,
        _ => ColumnKind::Text,
    }
}

fn to_value(raw: &str, kind: ColumnKind) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    match kind {
        ColumnKind::Integer => raw
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        ColumnKind::Float => parse_float(raw)
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(raw.to_string())),
        ColumnKind::Boolean => parse_bool(raw)
            .map(Value::Bool)
            .unwrap_or_else(|| Value::String(raw.to_string())),
        ColumnKind::Text => Value::String(raw.to_string()),
    }
}

fn parse_float(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|f| f.is_finite())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "True" | "true" | "TRUE" => Some(true),
        "False" | "false" | "FALSE" => Some(false),
        _ => None,
    }
}
