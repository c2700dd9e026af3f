//! Chart Plotter Module
//! Interactive dashboard visualizations using egui_plot.

use egui::{Color32, RichText};
use egui_plot::{Bar, BarChart, Legend, Plot, PlotPoints, Points};

use crate::geo;
use crate::stats::{ChangeRecord, CorrelationMatrix, StateValue};

/// Bar color for the selected round
pub const PRIMARY_COLOR: Color32 = Color32::from_rgb(52, 152, 219); // Blue
/// Bar color for the baseline round in comparisons
pub const BASELINE_COLOR: Color32 = Color32::from_rgb(155, 89, 182); // Purple
/// Positive / negative change accents
pub const RISE_COLOR: Color32 = Color32::from_rgb(40, 167, 69);
pub const FALL_COLOR: Color32 = Color32::from_rgb(220, 53, 69);

const HEATMAP_CELL: f32 = 34.0;
const LABEL_CHARS: usize = 26;

/// Creates the dashboard charts using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Sequential yellow-orange-red ramp for map markers, t in [0, 1].
    pub fn sequential_color(t: f64) -> Color32 {
        let t = t.clamp(0.0, 1.0);
        let (from, to, local) = if t < 0.5 {
            ((255.0, 237.0, 160.0), (254.0, 178.0, 76.0), t * 2.0)
        } else {
            ((254.0, 178.0, 76.0), (189.0, 0.0, 38.0), (t - 0.5) * 2.0)
        };
        Color32::from_rgb(
            (from.0 + (to.0 - from.0) * local) as u8,
            (from.1 + (to.1 - from.1) * local) as u8,
            (from.2 + (to.2 - from.2) * local) as u8,
        )
    }

    /// Diverging blue-white-red ramp for correlations, r in [-1, 1].
    pub fn correlation_color(r: f64) -> Color32 {
        let r = r.clamp(-1.0, 1.0);
        let (from, to, local) = if r < 0.0 {
            ((33.0, 102.0, 172.0), (245.0, 245.0, 245.0), r + 1.0)
        } else {
            ((245.0, 245.0, 245.0), (178.0, 24.0, 43.0), r)
        };
        Color32::from_rgb(
            (from.0 + (to.0 - from.0) * local) as u8,
            (from.1 + (to.1 - from.1) * local) as u8,
            (from.2 + (to.2 - from.2) * local) as u8,
        )
    }

    /// Shorten long indicator labels for axes and headers.
    pub fn short_label(label: &str) -> String {
        if label.chars().count() <= LABEL_CHARS {
            label.to_string()
        } else {
            let head: String = label.chars().take(LABEL_CHARS - 3).collect();
            format!("{}...", head.trim_end())
        }
    }

    /// Ranked vertical bar chart, one bar per state. Rows with missing
    /// values get no bar but keep their slot so the axis stays aligned
    /// with the ranking.
    pub fn draw_ranked_bar_chart(
        ui: &mut egui::Ui,
        id: &str,
        rows: &[StateValue],
        value_label: &str,
        height: f32,
    ) {
        let x_labels: Vec<String> = rows.iter().map(|r| r.state.clone()).collect();

        let bars: Vec<Bar> = rows
            .iter()
            .enumerate()
            .filter_map(|(i, row)| {
                row.value.map(|v| {
                    Bar::new(i as f64, v)
                        .width(0.7)
                        .name(&row.state)
                        .fill(PRIMARY_COLOR.gamma_multiply(0.85))
                })
            })
            .collect();

        Plot::new(format!("ranked_{id}"))
            .height(height)
            .allow_scroll(false)
            .y_axis_label(value_label)
            .x_axis_formatter(move |mark, _range| {
                let idx = mark.value.round() as usize;
                if (mark.value - idx as f64).abs() > 0.3 {
                    return String::new();
                }
                x_labels
                    .get(idx)
                    .map(|s| Self::short_label(s))
                    .unwrap_or_default()
            })
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).name(value_label));
            });
    }

    /// Grouped bars per state for two rounds, baseline on the left.
    pub fn draw_comparison_chart(
        ui: &mut egui::Ui,
        id: &str,
        records: &[ChangeRecord],
        from_label: &str,
        to_label: &str,
        height: f32,
    ) {
        let x_labels: Vec<String> = records.iter().map(|r| r.state.clone()).collect();

        let mut from_bars: Vec<Bar> = Vec::new();
        let mut to_bars: Vec<Bar> = Vec::new();
        for (i, record) in records.iter().enumerate() {
            if let Some(v) = record.from_value {
                from_bars.push(
                    Bar::new(i as f64 - 0.18, v)
                        .width(0.34)
                        .name(&record.state)
                        .fill(BASELINE_COLOR.gamma_multiply(0.85)),
                );
            }
            if let Some(v) = record.to_value {
                to_bars.push(
                    Bar::new(i as f64 + 0.18, v)
                        .width(0.34)
                        .name(&record.state)
                        .fill(PRIMARY_COLOR.gamma_multiply(0.85)),
                );
            }
        }

        Plot::new(format!("compare_{id}"))
            .height(height)
            .allow_scroll(false)
            .legend(Legend::default())
            .x_axis_formatter(move |mark, _range| {
                let idx = mark.value.round() as usize;
                if (mark.value - idx as f64).abs() > 0.3 {
                    return String::new();
                }
                x_labels
                    .get(idx)
                    .map(|s| Self::short_label(s))
                    .unwrap_or_default()
            })
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(from_bars).name(from_label));
                plot_ui.bar_chart(BarChart::new(to_bars).name(to_label));
            });
    }

    /// Scatter of state centroids sized and colored by value. Returns the
    /// states that have no centroid so the caller can mention them.
    pub fn draw_map_chart(
        ui: &mut egui::Ui,
        id: &str,
        rows: &[StateValue],
        height: f32,
    ) -> Vec<String> {
        let mut unmatched = Vec::new();
        let mut located: Vec<(String, geo::Centroid, f64)> = Vec::new();

        for row in rows {
            let Some(value) = row.value else { continue };
            match geo::state_centroid(&row.state) {
                Some(centroid) => located.push((row.state.clone(), centroid, value)),
                None => unmatched.push(row.state.clone()),
            }
        }

        let (min, max) = located.iter().fold((f64::MAX, f64::MIN), |(lo, hi), (_, _, v)| {
            (lo.min(*v), hi.max(*v))
        });
        let span = (max - min).max(f64::EPSILON);

        Plot::new(format!("map_{id}"))
            .height(height)
            .data_aspect(1.0)
            .allow_scroll(false)
            .x_axis_label("Longitude")
            .y_axis_label("Latitude")
            .show(ui, |plot_ui| {
                for (state, centroid, value) in &located {
                    let t = (value - min) / span;
                    let points: PlotPoints = vec![[centroid.lon, centroid.lat]].into();
                    plot_ui.points(
                        Points::new(points)
                            .radius(4.0 + (t * 6.0) as f32)
                            .color(Self::sequential_color(t))
                            .name(format!("{state}: {value:.1}")),
                    );
                }
            });

        unmatched
    }

    /// Correlation heatmap as a colored grid with hoverable cells.
    pub fn draw_heatmap(ui: &mut egui::Ui, matrix: &CorrelationMatrix) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                egui::Grid::new(ui.make_persistent_id("correlation_heatmap"))
                    .spacing([2.0, 2.0])
                    .show(ui, |ui| {
                        ui.label("");
                        for name in &matrix.indicators {
                            ui.label(RichText::new(Self::short_label(name)).size(10.0).strong());
                        }
                        ui.end_row();

                        for i in 0..matrix.len() {
                            ui.label(
                                RichText::new(Self::short_label(&matrix.indicators[i]))
                                    .size(10.0)
                                    .strong(),
                            );
                            for j in 0..matrix.len() {
                                Self::heatmap_cell(ui, matrix, i, j);
                            }
                            ui.end_row();
                        }
                    });
            });
    }

    fn heatmap_cell(ui: &mut egui::Ui, matrix: &CorrelationMatrix, i: usize, j: usize) {
        let (rect, response) = ui.allocate_exact_size(
            egui::vec2(HEATMAP_CELL, HEATMAP_CELL),
            egui::Sense::hover(),
        );

        match matrix.get(i, j) {
            Some(r) => {
                let fill = Self::correlation_color(r);
                let text_color = if r.abs() > 0.6 {
                    Color32::WHITE
                } else {
                    Color32::from_rgb(40, 40, 40)
                };
                ui.painter().rect_filled(rect, 2.0, fill);
                ui.painter().text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    format!("{r:.2}"),
                    egui::FontId::proportional(9.0),
                    text_color,
                );
                response.on_hover_text(format!(
                    "{}\nvs {}\nr = {:.3}",
                    matrix.indicators[i], matrix.indicators[j], r
                ));
            }
            None => {
                ui.painter().rect_filled(rect, 2.0, ui.visuals().faint_bg_color);
                ui.painter().text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    "-",
                    egui::FontId::proportional(9.0),
                    Color32::GRAY,
                );
                response.on_hover_text(format!(
                    "{}\nvs {}\nnot enough paired data",
                    matrix.indicators[i], matrix.indicators[j]
                ));
            }
        }
    }

    /// Small framed stat card.
    pub fn draw_value_card(ui: &mut egui::Ui, title: &str, value: &str, accent: Color32) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(8.0)
            .stroke(egui::Stroke::new(1.5, accent))
            .inner_margin(10.0)
            .show(ui, |ui| {
                ui.set_min_width(150.0);
                ui.vertical(|ui| {
                    ui.label(RichText::new(title).size(11.0).color(Color32::GRAY));
                    ui.label(RichText::new(value).size(18.0).strong().color(accent));
                });
            });
    }

    /// Round-over-round table for the ranked change lists.
    pub fn draw_change_table(
        ui: &mut egui::Ui,
        id: &str,
        records: &[ChangeRecord],
        from_label: &str,
        to_label: &str,
    ) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                egui::Grid::new(ui.make_persistent_id(format!("change_table_{id}")))
                    .striped(true)
                    .min_col_width(70.0)
                    .spacing([10.0, 4.0])
                    .show(ui, |ui| {
                        ui.label(RichText::new("State").strong().size(11.0));
                        ui.label(RichText::new(from_label).strong().size(11.0));
                        ui.label(RichText::new(to_label).strong().size(11.0));
                        ui.label(RichText::new("Change").strong().size(11.0));
                        ui.label(RichText::new("Change %").strong().size(11.0));
                        ui.end_row();

                        for record in records {
                            ui.label(RichText::new(&record.state).size(11.0));
                            ui.label(RichText::new(format_value(record.from_value)).size(11.0));
                            ui.label(RichText::new(format_value(record.to_value)).size(11.0));
                            ui.label(RichText::new(format_value(record.absolute_change)).size(11.0));

                            match record.percent_change {
                                Some(pct) => {
                                    let color = if pct >= 0.0 { RISE_COLOR } else { FALL_COLOR };
                                    ui.label(
                                        RichText::new(format!("{pct:+.1}%")).size(11.0).color(color),
                                    );
                                }
                                None => {
                                    ui.label(RichText::new("n/a").size(11.0).color(Color32::GRAY));
                                }
                            }
                            ui.end_row();
                        }
                    });
            });
    }
}

fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.1}"),
        None => "-".to_string(),
    }
}
