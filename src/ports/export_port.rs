//! Result export port.

use crate::domain::error::VolError;
use crate::domain::result_table::ResultTable;

/// Consumes a finished result table, e.g. by writing a spreadsheet.
pub trait ResultSink {
    fn write(&self, table: &ResultTable) -> Result<(), VolError>;
}
