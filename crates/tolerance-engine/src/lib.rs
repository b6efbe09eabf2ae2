//! Tolerance Interval Engine
//!
//! Statistical tolerance intervals for a normal population, from raw data or
//! summary statistics. Two-sided intervals use Howe's method, one-sided
//! bounds use Natrella's method. Each computation returns the bounds, the
//! tolerance factor, a confidence statement, a one-row summary table and a
//! chart descriptor; drawing and file output are left to the caller.
//!
//! ```
//! use tolerance_engine::{SampleSpecification, SpecificationLimits, ToleranceIntervalEngine};
//!
//! let engine = ToleranceIntervalEngine::new();
//! let sample = SampleSpecification::summary(0.0, 1.0, 30);
//! let result = engine
//!     .compute_two_sided(&sample, 0.05, 0.95, &SpecificationLimits::none())
//!     .unwrap();
//! assert!((result.k() - 2.549).abs() < 1e-3);
//! ```

pub mod error;
pub mod interval;
pub mod plot;
pub mod sample;
pub mod table;
pub mod types;

pub use error::*;
pub use interval::ToleranceIntervalEngine;
pub use plot::{Histogram, LegendPosition, LineStyle, Marker, MarkerKind, PlotDescriptor};
pub use sample::{SampleSpecification, SampleStatistics};
pub use table::{SummaryTable, TableCell};
pub use types::*;
