//! Control Panel Widget
//! Left side panel with dataset source and selection controls.

use crate::data::Breakdown;
use egui::{Color32, ComboBox, RichText};

/// Current dashboard selection; every change triggers a recompute.
#[derive(Clone)]
pub struct Selection {
    pub indicator: String,
    pub round_idx: usize,
    pub breakdown: Breakdown,
    pub top_n: usize,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            indicator: String::new(),
            round_idx: 0,
            breakdown: Breakdown::Total,
            top_n: 3,
        }
    }
}

/// Left side control panel with dataset source and filter controls.
pub struct ControlPanel {
    pub selection: Selection,
    pub indicators: Vec<String>,
    pub round_labels: Vec<String>,
    pub breakdowns: Vec<Breakdown>,
    pub dataset_name: Option<String>,
    pub dataset_loaded: bool,
    pub progress: f32,
    pub status: String,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            selection: Selection::default(),
            indicators: Vec::new(),
            round_labels: Vec::new(),
            breakdowns: vec![Breakdown::Total],
            dataset_name: None,
            dataset_loaded: false,
            progress: 0.0,
            status: "Ready".to_string(),
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install picker contents after a dataset load. Keeps the previous
    /// indicator selection when it still exists.
    pub fn update_dataset(
        &mut self,
        dataset_name: String,
        indicators: Vec<String>,
        round_labels: Vec<String>,
        breakdowns: Vec<Breakdown>,
        default_top_n: usize,
    ) {
        if !indicators.contains(&self.selection.indicator) {
            self.selection.indicator = indicators.first().cloned().unwrap_or_default();
        }
        if self.selection.round_idx >= round_labels.len() {
            // Later round is the default view, matching the survey's own framing
            self.selection.round_idx = round_labels.len().saturating_sub(1);
        }
        if !breakdowns.contains(&self.selection.breakdown) {
            self.selection.breakdown = breakdowns.first().copied().unwrap_or(Breakdown::Total);
        }
        if !self.dataset_loaded {
            self.selection.top_n = default_top_n;
        }

        self.indicators = indicators;
        self.round_labels = round_labels;
        self.breakdowns = breakdowns;
        self.dataset_name = Some(dataset_name);
        self.dataset_loaded = true;
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("HealthScope")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("Health Survey Explorer")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                let source_text = self
                    .dataset_name
                    .clone()
                    .unwrap_or_else(|| "No dataset loaded".to_string());
                ui.label(RichText::new(source_text).size(12.0).color(
                    if self.dataset_loaded {
                        Color32::WHITE
                    } else {
                        Color32::GRAY
                    },
                ));

                ui.add_space(5.0);
                ui.horizontal(|ui| {
                    if ui.button("Fetch survey data").clicked() {
                        action = ControlPanelAction::FetchRemote;
                    }
                    if ui.button("Browse CSV").clicked() {
                        action = ControlPanelAction::BrowseCsv;
                    }
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Filters Section =====
        ui.label(RichText::new("Filters").size(14.0).strong());
        ui.add_space(8.0);

        ui.add_enabled_ui(self.dataset_loaded, |ui| {
            ui.label("Indicator:");
            ComboBox::from_id_salt("indicator")
                .width(250.0)
                .selected_text(truncate(&self.selection.indicator, 32))
                .show_ui(ui, |ui| {
                    for indicator in &self.indicators {
                        if ui
                            .selectable_label(self.selection.indicator == *indicator, indicator)
                            .clicked()
                        {
                            self.selection.indicator = indicator.clone();
                            action = ControlPanelAction::SelectionChanged;
                        }
                    }
                });

            ui.add_space(8.0);

            ui.label("Survey round:");
            for (idx, label) in self.round_labels.iter().enumerate() {
                if ui
                    .radio(self.selection.round_idx == idx, label)
                    .clicked()
                    && self.selection.round_idx != idx
                {
                    self.selection.round_idx = idx;
                    action = ControlPanelAction::SelectionChanged;
                }
            }

            ui.add_space(8.0);

            ui.label("Breakdown:");
            ui.horizontal(|ui| {
                for breakdown in self.breakdowns.clone() {
                    if ui
                        .radio(self.selection.breakdown == breakdown, breakdown.label())
                        .clicked()
                        && self.selection.breakdown != breakdown
                    {
                        self.selection.breakdown = breakdown;
                        action = ControlPanelAction::SelectionChanged;
                    }
                }
            });

            ui.add_space(8.0);

            ui.horizontal(|ui| {
                ui.label("Top/bottom N:");
                let mut top_n = self.selection.top_n as u32;
                if ui
                    .add(egui::DragValue::new(&mut top_n).range(1..=10))
                    .changed()
                {
                    self.selection.top_n = top_n as usize;
                    action = ControlPanelAction::SelectionChanged;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Export =====
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(self.dataset_loaded, |ui| {
                let button = egui::Button::new(RichText::new("Export chart PNG").size(14.0))
                    .min_size(egui::vec2(180.0, 30.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::ExportChart;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Progress Section =====
        ui.label(RichText::new("Status").size(14.0).strong());
        ui.add_space(5.0);

        ui.add(
            egui::ProgressBar::new(self.progress / 100.0)
                .show_percentage()
                .animate(self.progress > 0.0 && self.progress < 100.0),
        );

        ui.add_space(5.0);

        let status_color = if self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.contains("Ready") || self.status.contains("Loaded") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }

    /// Set progress and status
    pub fn set_progress(&mut self, progress: f32, status: &str) {
        self.progress = progress;
        self.status = status.to_string();
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars - 3).collect();
        format!("{}...", head.trim_end())
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    FetchRemote,
    BrowseCsv,
    SelectionChanged,
    ExportChart,
}
