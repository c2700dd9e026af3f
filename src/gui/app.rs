//! HealthScope Main Application
//! Main window wiring the control panel, the comparator and the viewer.

use crate::charts::StaticChartExporter;
use crate::data::{
    Breakdown, DataLoader, DataSource, DatasetConfig, DatasetSchema, LoaderError,
};
use crate::gui::chart_viewer::{ChartViewer, ComparisonData, DashboardData};
use crate::gui::control_panel::{ControlPanel, ControlPanelAction, Selection};
use crate::stats::{CorrelationBuilder, IndicatorComparator, RankDirection};
use egui::SidePanel;
use polars::prelude::*;
use std::cmp::Ordering;
use std::path::Path;
use std::sync::mpsc::{channel, Receiver};
use std::thread;
use tracing::{info, warn};

const CONFIG_FILE: &str = "healthscope.json";
const PREVIEW_ROWS: usize = 8;

/// Dataset loading result from the background thread
enum LoadResult {
    Complete { df: DataFrame, source: DataSource },
    Error(String),
}

/// Main application window.
pub struct HealthScopeApp {
    loader: DataLoader,
    config: DatasetConfig,
    schema: Option<DatasetSchema>,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,

    // Async dataset loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl HealthScopeApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let config_path = Path::new(CONFIG_FILE);
        let config = if config_path.exists() {
            match DatasetConfig::from_file(config_path) {
                Ok(config) => {
                    info!(path = CONFIG_FILE, "using dataset config override");
                    config
                }
                Err(e) => {
                    warn!(error = %e, "config override unreadable, using defaults");
                    DatasetConfig::default()
                }
            }
        } else {
            DatasetConfig::default()
        };

        Self {
            loader: DataLoader::new(),
            config,
            schema: None,
            control_panel: ControlPanel::new(),
            chart_viewer: ChartViewer::new(),
            load_rx: None,
            is_loading: false,
        }
    }

    /// Kick off a background dataset load.
    fn start_load<F>(&mut self, status: &str, job: F)
    where
        F: FnOnce() -> Result<(DataFrame, DataSource), LoaderError> + Send + 'static,
    {
        if self.is_loading {
            return;
        }
        self.is_loading = true;
        self.chart_viewer.clear();
        self.control_panel.set_progress(10.0, status);

        let (tx, rx) = channel();
        self.load_rx = Some(rx);

        thread::spawn(move || {
            let result = match job() {
                Ok((df, source)) => LoadResult::Complete { df, source },
                Err(e) => LoadResult::Error(e.to_string()),
            };
            let _ = tx.send(result);
        });
    }

    fn handle_fetch_remote(&mut self) {
        let url = self.config.dataset_url.clone();
        self.start_load("Fetching survey data...", move || {
            let df = DataLoader::fetch_csv_url(&url)?;
            Ok((df, DataSource::Url(url)))
        });
    }

    fn handle_browse_csv(&mut self) {
        if self.is_loading {
            return;
        }
        let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        else {
            return;
        };

        self.start_load("Reading CSV file...", move || {
            let df = DataLoader::read_csv_file(&path.to_string_lossy())?;
            Ok((df, DataSource::File(path)))
        });
    }

    /// Check for dataset loading results
    fn check_load_results(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };

        match rx.try_recv() {
            Ok(LoadResult::Complete { df, source }) => {
                self.is_loading = false;
                self.install_dataset(df, source);
            }
            Ok(LoadResult::Error(error)) => {
                self.is_loading = false;
                self.control_panel.set_progress(0.0, &format!("Error: {error}"));
            }
            Err(_) => {
                // Still loading; keep polling next frame
                self.load_rx = Some(rx);
            }
        }
    }

    /// Validate the schema against the loaded frame and refresh pickers.
    fn install_dataset(&mut self, df: DataFrame, source: DataSource) {
        let row_count = df.height();

        match self.config.validate(&df) {
            Ok(schema) => {
                self.loader.set_dataframe(df, source.clone());

                let indicators = self.loader.unique_values(&self.config.indicator_col);
                let round_labels = schema.rounds.iter().map(|r| r.label.clone()).collect();
                let breakdowns: Vec<Breakdown> = Breakdown::ALL
                    .into_iter()
                    .filter(|b| schema.breakdown_available(*b))
                    .collect();

                self.control_panel.update_dataset(
                    source.display_name(),
                    indicators,
                    round_labels,
                    breakdowns,
                    self.config.top_n,
                );
                self.schema = Some(schema);
                self.control_panel
                    .set_progress(100.0, &format!("Loaded {row_count} rows"));
                self.recompute();
            }
            Err(e) => {
                warn!(error = %e, "dataset does not match the configured schema");
                self.schema = None;
                self.loader.set_dataframe(df, source);
                self.control_panel.set_progress(0.0, &format!("Error: {e}"));
            }
        }
    }

    /// One full computation pass for the current selection.
    fn recompute(&mut self) {
        let selection = self.control_panel.selection.clone();
        if selection.indicator.is_empty() {
            return;
        }

        let result = {
            let Some(df) = self.loader.dataframe() else {
                return;
            };
            let Some(schema) = self.schema.as_ref() else {
                return;
            };
            Self::build_dashboard_data(df, schema, &self.config, &selection)
        };

        match result {
            Ok(data) => {
                let states = data.ranked.len();
                self.chart_viewer.set_data(data);
                self.control_panel
                    .set_progress(100.0, &format!("Ready - {states} states"));
            }
            Err(e) => {
                warn!(error = %e, "dashboard computation failed");
                self.chart_viewer.clear();
                self.control_panel.set_progress(0.0, &format!("Error: {e}"));
            }
        }
    }

    /// Filter, rank, diff and correlate for one selection. Pure.
    fn build_dashboard_data(
        df: &DataFrame,
        schema: &DatasetSchema,
        config: &DatasetConfig,
        selection: &Selection,
    ) -> anyhow::Result<DashboardData> {
        let value_col = schema.value_column(selection.round_idx, selection.breakdown)?;
        let round_label = &schema.rounds[selection.round_idx].label;
        let value_label = format!("{round_label}, {}", selection.breakdown.label());

        let subset =
            IndicatorComparator::filter_by_indicator(df, &schema.indicator_col, &selection.indicator)?;
        let rows = IndicatorComparator::state_values(&subset, &schema.state_col, &value_col)?;

        let ranked = IndicatorComparator::rank_by_column(&rows, rows.len(), RankDirection::Top);
        let top = IndicatorComparator::rank_by_column(&rows, selection.top_n, RankDirection::Top);
        let bottom =
            IndicatorComparator::rank_by_column(&rows, selection.top_n, RankDirection::Bottom);
        let national_average = IndicatorComparator::national_average(&rows);

        let comparison =
            Self::build_comparison(&subset, schema, selection).transpose()?;

        let correlation = CorrelationBuilder::build_matrix(
            df,
            &schema.state_col,
            &schema.indicator_col,
            &value_col,
            None,
            config.correlation_min_coverage,
        );

        let (preview_header, preview_rows) = Self::preview_rows(df);

        Ok(DashboardData {
            indicator: selection.indicator.clone(),
            value_label,
            ranked,
            top,
            bottom,
            national_average,
            comparison,
            correlation,
            preview_header,
            preview_rows,
        })
    }

    /// Round-over-round data between the earliest and latest rounds, or
    /// `None` when the selected breakdown lacks a column on either side.
    fn build_comparison(
        subset: &DataFrame,
        schema: &DatasetSchema,
        selection: &Selection,
    ) -> Option<anyhow::Result<ComparisonData>> {
        let last = schema.rounds.len().checked_sub(1)?;
        if last == 0 {
            return None;
        }
        let pair = schema.column_pair(0, last, selection.breakdown).ok()?;

        let built = (|| -> anyhow::Result<ComparisonData> {
            let mut records =
                IndicatorComparator::compute_change(subset, &schema.state_col, &pair)?;

            // Chart reads best on the later round's ordering
            records.sort_by(|a, b| match (a.to_value, b.to_value) {
                (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            });

            let increases =
                IndicatorComparator::rank_by_change(&records, selection.top_n, RankDirection::Top);
            let decreases = IndicatorComparator::rank_by_change(
                &records,
                selection.top_n,
                RankDirection::Bottom,
            );

            Ok(ComparisonData {
                from_label: schema.rounds[0].label.clone(),
                to_label: schema.rounds[last].label.clone(),
                records,
                increases,
                decreases,
            })
        })();

        Some(built)
    }

    /// First rows of the raw frame, stringified for the preview grid.
    fn preview_rows(df: &DataFrame) -> (Vec<String>, Vec<Vec<String>>) {
        let header: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let columns = df.get_columns();
        let count = df.height().min(PREVIEW_ROWS);
        let mut rows = Vec::with_capacity(count);
        for i in 0..count {
            let row: Vec<String> = columns
                .iter()
                .map(|col| match col.get(i) {
                    Ok(value) if !value.is_null() => {
                        value.to_string().trim_matches('"').to_string()
                    }
                    _ => String::new(),
                })
                .collect();
            rows.push(row);
        }

        (header, rows)
    }

    /// Export the current ranked chart as a PNG and reveal it.
    fn handle_export(&mut self) {
        let Some(data) = self.chart_viewer.data() else {
            self.control_panel.set_progress(0.0, "Nothing to export");
            return;
        };

        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG Image", &["png"])
            .set_file_name("healthscope_chart.png")
            .save_file()
        else {
            return;
        };

        let title = format!("{} - {}", data.indicator, data.value_label);
        match StaticChartExporter::export_bar_chart(&path, &title, &data.value_label, &data.ranked)
        {
            Ok(()) => {
                let _ = open::that(&path);
                self.control_panel.set_progress(100.0, "Chart exported");
            }
            Err(e) => {
                self.control_panel.set_progress(0.0, &format!("Error: {e}"));
            }
        }
    }
}

impl eframe::App for HealthScopeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_results();

        if self.is_loading {
            ctx.request_repaint();
        }

        SidePanel::left("control_panel")
            .min_width(300.0)
            .max_width(350.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui);

                    match action {
                        ControlPanelAction::FetchRemote => self.handle_fetch_remote(),
                        ControlPanelAction::BrowseCsv => self.handle_browse_csv(),
                        ControlPanelAction::SelectionChanged => self.recompute(),
                        ControlPanelAction::ExportChart => self.handle_export(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_viewer.show(ui);
        });
    }
}
