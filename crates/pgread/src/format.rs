//! Reshaping fetched rows into the caller's requested form.

use crate::aggregate::AggregateMap;
use crate::keyword::{Keyword, impl_into_keyword};
use crate::session::ResultSet;
use crate::value::Value;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Shape of a read's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnType {
    /// Rows as positional cell lists, in server order.
    #[serde(alias = "list")]
    Rows,
    /// Rows keyed by 0-based ordinal, each a column → value record.
    #[default]
    #[serde(alias = "dict")]
    Records,
    /// Column headers plus rows, with aggregated headers relabelled.
    #[serde(alias = "dataframe", alias = "table")]
    Frame,
}

impl Keyword for ReturnType {
    const FIELD: &'static str = "return_type";
    const EXPECTED: &'static str = "list, rows, dict, records, frame, dataframe, table";

    fn from_normalized(s: &str) -> Option<Self> {
        match s {
            "LIST" | "ROWS" => Some(ReturnType::Rows),
            "DICT" | "RECORDS" => Some(ReturnType::Records),
            "FRAME" | "DATAFRAME" | "TABLE" => Some(ReturnType::Frame),
            _ => None,
        }
    }
}

impl_into_keyword!(ReturnType);

/// One row as an insertion-ordered column → value map.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    entries: Vec<(String, Value)>,
}

impl Record {
    /// Insert a cell. A repeated column keeps its first position and takes the new value.
    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        let column = column.into();
        match self.entries.iter_mut().find(|(c, _)| *c == column) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(c, v)| (c.as_str(), v))
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (column, value) in &self.entries {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut record = Record::default();
        for (column, value) in iter {
            record.insert(column, value.into());
        }
        record
    }
}

/// Tabular output: headers plus rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Frame {
    /// Render as a text table.
    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(self.columns.clone());
        for row in &self.rows {
            table.add_row(row.iter().map(ToString::to_string).collect::<Vec<_>>());
        }
        table
    }

    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Value>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().filter_map(move |row| row.get(idx)))
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_table())
    }
}

/// Formatted result of a read or a fetched raw query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryOutput {
    Rows(Vec<Vec<Value>>),
    Records(BTreeMap<usize, Record>),
    Frame(Frame),
}

impl QueryOutput {
    pub fn return_type(&self) -> ReturnType {
        match self {
            QueryOutput::Rows(_) => ReturnType::Rows,
            QueryOutput::Records(_) => ReturnType::Records,
            QueryOutput::Frame(_) => ReturnType::Frame,
        }
    }

    /// Number of rows, whatever the shape.
    pub fn len(&self) -> usize {
        match self {
            QueryOutput::Rows(rows) => rows.len(),
            QueryOutput::Records(records) => records.len(),
            QueryOutput::Frame(frame) => frame.rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_rows(&self) -> Option<&[Vec<Value>]> {
        match self {
            QueryOutput::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn as_records(&self) -> Option<&BTreeMap<usize, Record>> {
        match self {
            QueryOutput::Records(records) => Some(records),
            _ => None,
        }
    }

    pub fn as_frame(&self) -> Option<&Frame> {
        match self {
            QueryOutput::Frame(frame) => Some(frame),
            _ => None,
        }
    }
}

/// Reshape `result` into `return_type`.
///
/// `aggregate` only affects [`ReturnType::Frame`], where an aggregated column's
/// header becomes `"<function>: <column>"`.
pub fn format(result: &ResultSet, return_type: ReturnType, aggregate: &AggregateMap) -> QueryOutput {
    match return_type {
        ReturnType::Rows => QueryOutput::Rows(result.rows.clone()),
        ReturnType::Records => QueryOutput::Records(to_records(result)),
        ReturnType::Frame => QueryOutput::Frame(to_frame(result, aggregate)),
    }
}

fn to_records(result: &ResultSet) -> BTreeMap<usize, Record> {
    result
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let record = result
                .columns
                .iter()
                .zip(row.iter())
                .map(|(c, v)| (c.as_str(), v.clone()))
                .collect();
            (i, record)
        })
        .collect()
}

fn to_frame(result: &ResultSet, aggregate: &AggregateMap) -> Frame {
    let columns = result
        .columns
        .iter()
        .map(|c| match aggregate.get(c) {
            Some(func) => func.header(c),
            None => c.clone(),
        })
        .collect();
    Frame {
        columns,
        rows: result.rows.clone(),
    }
}
