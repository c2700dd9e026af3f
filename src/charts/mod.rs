//! Charts module - interactive plots and static export

mod export;
mod plotter;

pub use export::StaticChartExporter;
pub use plotter::{ChartPlotter, FALL_COLOR, PRIMARY_COLOR, RISE_COLOR};
