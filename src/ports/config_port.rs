//! Configuration access port.

use crate::domain::error::VolError;

/// Section/key lookups with typed defaults.
///
/// The default applies only to an absent key. A present value that does not
/// parse as the requested type is a `ConfigInvalid` error.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, VolError>;
    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, VolError>;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> Result<bool, VolError>;
}
