//! Chart Viewer Widget
//! Central tabbed panel rendering the computed dashboard views.

use crate::charts::{ChartPlotter, FALL_COLOR, PRIMARY_COLOR, RISE_COLOR};
use crate::stats::{ChangeRecord, CorrelationError, CorrelationMatrix, StateValue};
use egui::{Color32, RichText, ScrollArea};

const CHART_HEIGHT: f32 = 420.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardTab {
    Overview,
    Comparison,
    Map,
    Correlation,
    Data,
}

impl DashboardTab {
    const ALL: [DashboardTab; 5] = [
        DashboardTab::Overview,
        DashboardTab::Comparison,
        DashboardTab::Map,
        DashboardTab::Correlation,
        DashboardTab::Data,
    ];

    fn label(&self) -> &'static str {
        match self {
            DashboardTab::Overview => "Overview",
            DashboardTab::Comparison => "Round Comparison",
            DashboardTab::Map => "Map",
            DashboardTab::Correlation => "Correlation",
            DashboardTab::Data => "Data",
        }
    }
}

/// Round-over-round view, present only when both rounds' columns exist
/// for the selected breakdown.
pub struct ComparisonData {
    pub from_label: String,
    pub to_label: String,
    /// All matching states, sorted by the later round's value.
    pub records: Vec<ChangeRecord>,
    pub increases: Vec<ChangeRecord>,
    pub decreases: Vec<ChangeRecord>,
}

/// Everything the viewer renders for one selection, recomputed fresh on
/// each change and discarded on the next.
pub struct DashboardData {
    pub indicator: String,
    pub value_label: String,
    pub ranked: Vec<StateValue>,
    pub top: Vec<StateValue>,
    pub bottom: Vec<StateValue>,
    pub national_average: Option<f64>,
    pub comparison: Option<ComparisonData>,
    pub correlation: Result<CorrelationMatrix, CorrelationError>,
    pub preview_header: Vec<String>,
    pub preview_rows: Vec<Vec<String>>,
}

/// Central tabbed display area.
pub struct ChartViewer {
    tab: DashboardTab,
    data: Option<DashboardData>,
}

impl Default for ChartViewer {
    fn default() -> Self {
        Self {
            tab: DashboardTab::Overview,
            data: None,
        }
    }
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.data = None;
    }

    pub fn set_data(&mut self, data: DashboardData) {
        self.data = Some(data);
    }

    pub fn data(&self) -> Option<&DashboardData> {
        self.data.as_ref()
    }

    pub fn show(&mut self, ui: &mut egui::Ui) {
        let Some(data) = &self.data else {
            ui.centered_and_justified(|ui| {
                ui.label(
                    RichText::new("No dataset loaded - fetch the survey data to begin")
                        .size(18.0)
                        .color(Color32::GRAY),
                );
            });
            return;
        };

        ui.horizontal(|ui| {
            for tab in DashboardTab::ALL {
                if ui
                    .selectable_label(self.tab == tab, RichText::new(tab.label()).size(14.0))
                    .clicked()
                {
                    self.tab = tab;
                }
            }
        });
        ui.separator();

        ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
            ui.add_space(6.0);
            ui.label(
                RichText::new(format!("{} - {}", data.indicator, data.value_label))
                    .size(17.0)
                    .strong(),
            );
            ui.add_space(8.0);

            match self.tab {
                DashboardTab::Overview => Self::show_overview(ui, data),
                DashboardTab::Comparison => Self::show_comparison(ui, data),
                DashboardTab::Map => Self::show_map(ui, data),
                DashboardTab::Correlation => Self::show_correlation(ui, data),
                DashboardTab::Data => Self::show_preview(ui, data),
            }
        });
    }

    fn show_overview(ui: &mut egui::Ui, data: &DashboardData) {
        if data.ranked.is_empty() {
            empty_note(ui, "No rows match this indicator");
            return;
        }

        ui.horizontal_wrapped(|ui| {
            let average = match data.national_average {
                Some(avg) => format!("{avg:.1}"),
                None => "n/a".to_string(),
            };
            ChartPlotter::draw_value_card(ui, "National average", &average, PRIMARY_COLOR);

            ChartPlotter::draw_value_card(
                ui,
                &format!("Top {}", data.top.len()),
                &joined_states(&data.top),
                RISE_COLOR,
            );
            ChartPlotter::draw_value_card(
                ui,
                &format!("Bottom {}", data.bottom.len()),
                &joined_states(&data.bottom),
                FALL_COLOR,
            );
        });

        ui.add_space(10.0);
        ui.label(RichText::new("States ranked by value").size(13.0).strong());
        ChartPlotter::draw_ranked_bar_chart(
            ui,
            "overview",
            &data.ranked,
            &data.value_label,
            CHART_HEIGHT,
        );
    }

    fn show_comparison(ui: &mut egui::Ui, data: &DashboardData) {
        let Some(comparison) = &data.comparison else {
            empty_note(ui, "Round comparison not available for this breakdown");
            return;
        };
        if comparison.records.is_empty() {
            empty_note(ui, "No rows match this indicator");
            return;
        }

        ChartPlotter::draw_comparison_chart(
            ui,
            "comparison",
            &comparison.records,
            &comparison.from_label,
            &comparison.to_label,
            CHART_HEIGHT,
        );

        ui.add_space(12.0);
        ui.columns(2, |columns| {
            columns[0].label(RichText::new("Largest increases").size(13.0).strong());
            if comparison.increases.is_empty() {
                empty_note(&mut columns[0], "No state has a defined percent change");
            } else {
                ChartPlotter::draw_change_table(
                    &mut columns[0],
                    "increases",
                    &comparison.increases,
                    &comparison.from_label,
                    &comparison.to_label,
                );
            }

            columns[1].label(RichText::new("Largest decreases").size(13.0).strong());
            if comparison.decreases.is_empty() {
                empty_note(&mut columns[1], "No state has a defined percent change");
            } else {
                ChartPlotter::draw_change_table(
                    &mut columns[1],
                    "decreases",
                    &comparison.decreases,
                    &comparison.from_label,
                    &comparison.to_label,
                );
            }
        });
    }

    fn show_map(ui: &mut egui::Ui, data: &DashboardData) {
        if data.ranked.iter().all(|r| r.value.is_none()) {
            empty_note(ui, "No values available for this selection");
            return;
        }

        let unmatched = ChartPlotter::draw_map_chart(ui, "map", &data.ranked, CHART_HEIGHT);
        if !unmatched.is_empty() {
            ui.add_space(4.0);
            ui.label(
                RichText::new(format!("No map position for: {}", unmatched.join(", ")))
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        }
    }

    fn show_correlation(ui: &mut egui::Ui, data: &DashboardData) {
        match &data.correlation {
            Ok(matrix) => {
                ui.label(
                    RichText::new("Pearson correlation across indicators (state-level)")
                        .size(13.0)
                        .strong(),
                );
                ui.add_space(6.0);
                ScrollArea::horizontal().show(ui, |ui| {
                    ChartPlotter::draw_heatmap(ui, matrix);
                });
            }
            Err(CorrelationError::InsufficientColumns { available }) => {
                empty_note(
                    ui,
                    &format!(
                        "Only {available} indicator column(s) have enough coverage - \
                         at least 2 are needed for a correlation matrix"
                    ),
                );
            }
            Err(err) => {
                empty_note(ui, &format!("Correlation not available: {err}"));
            }
        }
    }

    fn show_preview(ui: &mut egui::Ui, data: &DashboardData) {
        if data.preview_rows.is_empty() {
            empty_note(ui, "Dataset is empty");
            return;
        }

        ui.label(
            RichText::new(format!("First {} rows", data.preview_rows.len()))
                .size(13.0)
                .strong(),
        );
        ui.add_space(6.0);

        ScrollArea::horizontal().show(ui, |ui| {
            egui::Frame::none()
                .fill(ui.visuals().widgets.noninteractive.bg_fill)
                .rounding(5.0)
                .inner_margin(8.0)
                .show(ui, |ui| {
                    egui::Grid::new("data_preview")
                        .striped(true)
                        .spacing([12.0, 4.0])
                        .show(ui, |ui| {
                            for header in &data.preview_header {
                                ui.label(RichText::new(header).strong().size(11.0));
                            }
                            ui.end_row();

                            for row in &data.preview_rows {
                                for cell in row {
                                    ui.label(RichText::new(cell).size(11.0));
                                }
                                ui.end_row();
                            }
                        });
                });
        });
    }
}

fn joined_states(rows: &[StateValue]) -> String {
    if rows.is_empty() {
        return "n/a".to_string();
    }
    rows.iter()
        .map(|r| r.state.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn empty_note(ui: &mut egui::Ui, message: &str) {
    egui::Frame::none()
        .fill(ui.visuals().faint_bg_color)
        .rounding(5.0)
        .inner_margin(12.0)
        .show(ui, |ui| {
            ui.label(RichText::new(message).size(13.0).color(Color32::GRAY));
        });
}
