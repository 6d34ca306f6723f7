//! Trailing look-back windows and their selection from a return series.

use std::fmt;
use std::str::FromStr;

use crate::domain::error::VolError;
use crate::domain::series::ReturnSeries;

/// Minimum returns a window needs before any estimator runs.
pub const MIN_OBSERVATIONS: usize = 30;

/// Standard windows: 1 to 10 years in half-year steps, as (half-years, trading days).
const STANDARD_WINDOWS: [(u32, usize); 19] = [
    (2, 252),
    (3, 380),
    (4, 509),
    (5, 635),
    (6, 761),
    (7, 880),
    (8, 1000),
    (9, 1125),
    (10, 1250),
    (11, 1375),
    (12, 1500),
    (13, 1625),
    (14, 1750),
    (15, 1875),
    (16, 2000),
    (17, 2125),
    (18, 2250),
    (19, 2375),
    (20, 2500),
];

/// Window label in years, stored as a count of half-years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WindowLabel {
    half_years: u32,
}

impl WindowLabel {
    pub fn from_half_years(half_years: u32) -> Self {
        Self { half_years }
    }

    pub fn years(&self) -> f64 {
        self.half_years as f64 / 2.0
    }
}

impl fmt::Display for WindowLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.half_years % 2 == 0 {
            write!(f, "{}", self.half_years / 2)
        } else {
            write!(f, "{}.5", self.half_years / 2)
        }
    }
}

impl FromStr for WindowLabel {
    type Err = VolError;

    /// Accepts whole or half years: `1`, `1.5`, `2.0`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || VolError::InvalidWindows {
            reason: format!("label '{}' is not a whole or half number of years", s),
        };
        let years: f64 = s.trim().parse().map_err(|_| invalid())?;
        let doubled = years * 2.0;
        if !doubled.is_finite() || doubled <= 0.0 || doubled.fract() != 0.0 || doubled > u32::MAX as f64 {
            return Err(invalid());
        }
        Ok(Self::from_half_years(doubled as u32))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowDef {
    pub label: WindowLabel,
    pub days: usize,
}

/// Ordered, immutable set of windows, ascending by label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSpec {
    windows: Vec<WindowDef>,
}

impl WindowSpec {
    pub fn standard() -> Self {
        Self {
            windows: STANDARD_WINDOWS
                .iter()
                .map(|&(half_years, days)| WindowDef {
                    label: WindowLabel::from_half_years(half_years),
                    days,
                })
                .collect(),
        }
    }

    /// Custom windows. Labels must be strictly ascending and day counts positive.
    pub fn new(windows: Vec<WindowDef>) -> Result<Self, VolError> {
        if windows.is_empty() {
            return Err(VolError::InvalidWindows {
                reason: "at least one window is required".into(),
            });
        }
        if let Some(w) = windows.iter().find(|w| w.days == 0) {
            return Err(VolError::InvalidWindows {
                reason: format!("window {} has zero days", w.label),
            });
        }
        if let Some(pair) = windows.windows(2).find(|p| p[0].label >= p[1].label) {
            return Err(VolError::InvalidWindows {
                reason: format!(
                    "labels must be strictly ascending ({} then {})",
                    pair[0].label, pair[1].label
                ),
            });
        }
        Ok(Self { windows })
    }

    /// Parses `years:days` pairs separated by commas, e.g. `1:252, 1.5:380`.
    pub fn parse(list: &str) -> Result<Self, VolError> {
        let mut windows = Vec::new();
        for item in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (label, days) = item.split_once(':').ok_or_else(|| VolError::InvalidWindows {
                reason: format!("expected years:days, got '{}'", item),
            })?;
            let days: usize = days.trim().parse().map_err(|_| VolError::InvalidWindows {
                reason: format!("invalid day count in '{}'", item),
            })?;
            windows.push(WindowDef {
                label: label.parse()?,
                days,
            });
        }
        Self::new(windows)
    }

    pub fn windows(&self) -> &[WindowDef] {
        &self.windows
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self::standard()
    }
}

/// Returns selected for one window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSlice<'a> {
    pub def: WindowDef,
    pub returns: &'a [f64],
    /// False when fewer than the minimum observations are available.
    pub sufficient: bool,
}

/// Selects the trailing slice for each window with enough history.
///
/// Windows longer than the series are skipped entirely. Windows that fit but
/// hold fewer than `min_observations` returns are kept and flagged.
pub fn select_windows<'a>(
    spec: &WindowSpec,
    returns: &'a ReturnSeries,
    min_observations: usize,
) -> Vec<WindowSlice<'a>> {
    let mut selected = Vec::with_capacity(spec.len());
    for def in spec.windows() {
        match returns.tail(def.days) {
            Some(slice) => selected.push(WindowSlice {
                def: *def,
                returns: slice,
                sufficient: slice.len() >= min_observations,
            }),
            None => log::debug!(
                "skipping {}y window: need {} returns, have {}",
                def.label,
                def.days,
                returns.len()
            ),
        }
    }
    selected
}
