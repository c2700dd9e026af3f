//! Static Chart Export Module
//! Renders the current ranked bar chart to a PNG file via plotters.

use anyhow::{ensure, Context, Result};
use plotters::prelude::*;
use std::path::Path;
use tracing::info;

use crate::stats::StateValue;

const EXPORT_WIDTH: u32 = 1280;
const EXPORT_HEIGHT: u32 = 800;
const BAR_COLOR: RGBColor = RGBColor(52, 152, 219);

/// Writes dashboard charts as static images for sharing.
pub struct StaticChartExporter;

impl StaticChartExporter {
    /// Render a ranked bar chart to `path`. Rows with missing values are
    /// left out of the image; exporting an all-missing selection is an
    /// error the caller shows in the status line.
    pub fn export_bar_chart(
        path: &Path,
        title: &str,
        value_label: &str,
        rows: &[StateValue],
    ) -> Result<()> {
        let present: Vec<(&str, f64)> = rows
            .iter()
            .filter_map(|r| r.value.map(|v| (r.state.as_str(), v)))
            .collect();
        ensure!(!present.is_empty(), "nothing to export: every value is missing");

        let max = present.iter().map(|(_, v)| *v).fold(f64::MIN, f64::max);
        let min = present.iter().map(|(_, v)| *v).fold(f64::MAX, f64::min);
        let y_min = min.min(0.0);
        let y_max = if max > 0.0 { max * 1.08 } else { 1.0 };

        let root = BitMapBackend::new(path, (EXPORT_WIDTH, EXPORT_HEIGHT)).into_drawing_area();
        root.fill(&WHITE).context("fill background")?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 26))
            .margin(18)
            .x_label_area_size(170)
            .y_label_area_size(64)
            .build_cartesian_2d(
                (0..present.len().saturating_sub(1)).into_segmented(),
                y_min..y_max,
            )
            .context("build chart axes")?;

        let labels: Vec<&str> = present.iter().map(|(state, _)| *state).collect();
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(present.len())
            .x_label_formatter(&|seg| match seg {
                SegmentValue::CenterOf(idx) | SegmentValue::Exact(idx) => {
                    labels.get(*idx).map(|s| s.to_string()).unwrap_or_default()
                }
                SegmentValue::Last => String::new(),
            })
            .x_label_style(
                ("sans-serif", 13)
                    .into_font()
                    .transform(FontTransform::Rotate90),
            )
            .y_desc(value_label)
            .draw()
            .context("draw axes")?;

        chart
            .draw_series(present.iter().enumerate().map(|(i, (_, v))| {
                Rectangle::new(
                    [
                        (SegmentValue::Exact(i), 0.0),
                        (SegmentValue::Exact(i + 1), *v),
                    ],
                    BAR_COLOR.filled(),
                )
            }))
            .context("draw bars")?;

        root.present().context("write image")?;
        info!(path = %path.display(), bars = present.len(), "exported chart");
        Ok(())
    }
}
