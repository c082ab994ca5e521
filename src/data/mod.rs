mod binning;
pub use binning::Binning;

mod histogram;
pub use histogram::Histogram;

mod sample;
pub use sample::Sample;

mod source;
pub use source::{ColumnData, ColumnRef, ColumnSource, Columns};
