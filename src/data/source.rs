use std::collections::BTreeMap;

/// Borrowed view of a single column of a [ColumnSource]
#[derive(Clone, Copy, Debug)]
pub enum ColumnRef<'a> {
    F64(&'a [f64]),
    F32(&'a [f32]),
    /// Column of a type the sample loader cannot interpret, e.g. integer or boolean
    Unsupported(&'static str),
}

/// Columnar or tree-like store the [crate::Sample] loader reads from
pub trait ColumnSource {
    /// Number of entries per column
    fn n_rows(&self) -> usize;

    fn column(&self, name: &str) -> Option<ColumnRef<'_>>;
}

/// Owned column of [Columns]
#[derive(Clone, Debug, PartialEq)]
pub enum ColumnData {
    F64(Vec<f64>),
    F32(Vec<f32>),
    I64(Vec<i64>),
    Bool(Vec<bool>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            Self::F64(v) => v.len(),
            Self::F32(v) => v.len(),
            Self::I64(v) => v.len(),
            Self::Bool(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn as_column_ref(&self) -> ColumnRef<'_> {
        match self {
            Self::F64(v) => ColumnRef::F64(v),
            Self::F32(v) => ColumnRef::F32(v),
            Self::I64(_) => ColumnRef::Unsupported("i64"),
            Self::Bool(_) => ColumnRef::Unsupported("bool"),
        }
    }
}

impl From<Vec<f64>> for ColumnData {
    fn from(v: Vec<f64>) -> Self {
        Self::F64(v)
    }
}

impl From<Vec<f32>> for ColumnData {
    fn from(v: Vec<f32>) -> Self {
        Self::F32(v)
    }
}

impl From<Vec<i64>> for ColumnData {
    fn from(v: Vec<i64>) -> Self {
        Self::I64(v)
    }
}

impl From<Vec<bool>> for ColumnData {
    fn from(v: Vec<bool>) -> Self {
        Self::Bool(v)
    }
}

/// In-memory named columns
///
/// Columns are not required to have equal lengths here; [crate::Sample::from_source] checks
/// the lengths of the columns it actually reads against [ColumnSource::n_rows], which is the
/// length of the first inserted column.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Columns {
    n_rows: Option<usize>,
    columns: BTreeMap<String, ColumnData>,
}

impl Columns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column(mut self, name: impl Into<String>, data: impl Into<ColumnData>) -> Self {
        self.insert(name, data);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, data: impl Into<ColumnData>) {
        let data = data.into();
        self.n_rows.get_or_insert(data.len());
        self.columns.insert(name.into(), data);
    }
}

impl ColumnSource for Columns {
    fn n_rows(&self) -> usize {
        self.n_rows.unwrap_or(0)
    }

    fn column(&self, name: &str) -> Option<ColumnRef<'_>> {
        self.columns.get(name).map(ColumnData::as_column_ref)
    }
}
