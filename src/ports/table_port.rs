//! Tabular input port.

use crate::domain::error::VolError;
use crate::domain::raw_table::RawTable;

/// Supplies the raw price table for one run.
pub trait TableSource {
    fn load(&self) -> Result<RawTable, VolError>;
}
