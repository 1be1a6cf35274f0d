//! Report generation port trait.

use std::path::Path;

use crate::domain::error::TradesimError;
use crate::domain::report::SimulationReport;

/// Port for writing simulation reports.
pub trait ReportPort {
    fn write(&self, report: &SimulationReport, output_path: &Path) -> Result<(), TradesimError>;
}
