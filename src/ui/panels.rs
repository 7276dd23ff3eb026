use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::AppState;

/// A change requested by the filter panel, applied once rendering is done.
enum FilterAction {
    Toggle { column: String, value: String },
    SelectAll(String),
    Clear(String),
    ClearAll,
}

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    if state.dataset().is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    // Clone what we need so we can mutate state inside the loop.
    let columns: Vec<(String, Vec<String>)> = state
        .domains()
        .iter()
        .map(|(c, v)| (c.to_string(), v.to_vec()))
        .collect();

    let mut actions = Vec::new();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Colour-by selector ----
            ui.strong("Color by");
            let current_color_col = state.color_column.clone();
            egui::ComboBox::from_id_salt("color_by")
                .selected_text(current_color_col.as_deref().unwrap_or("(none)"))
                .show_ui(ui, |ui: &mut Ui| {
                    if ui
                        .selectable_label(current_color_col.is_none(), "(none)")
                        .clicked()
                    {
                        state.set_color_column(None);
                    }
                    for (col, _) in &columns {
                        if ui
                            .selectable_label(current_color_col.as_ref() == Some(col), col)
                            .clicked()
                        {
                            state.set_color_column(Some(col.clone()));
                        }
                    }
                });
            ui.separator();

            if ui
                .add_enabled(
                    !state.filters().is_unrestricted(),
                    egui::Button::new("Clear all filters"),
                )
                .clicked()
            {
                actions.push(FilterAction::ClearAll);
            }

            // ---- Per-column filter widgets (collapsible) ----
            for (col, all_values) in &columns {
                let n_selected = state.filters().selection(col).map_or(0, |s| s.len());
                let n_total = all_values.len();
                let missing = state.domains().domain(col).map_or(0, |d| d.missing());
                let header_text = if missing > 0 {
                    format!("{col}  ({n_selected}/{n_total}, {missing} missing)")
                } else {
                    format!("{col}  ({n_selected}/{n_total})")
                };

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(col)
                    .default_open(false)
                    .show(ui, |ui: &mut Ui| {
                        ui.horizontal(|ui: &mut Ui| {
                            if ui.small_button("All").clicked() {
                                actions.push(FilterAction::SelectAll(col.clone()));
                            }
                            if ui.small_button("Clear").clicked() {
                                actions.push(FilterAction::Clear(col.clone()));
                            }
                        });

                        let search = state.option_search.entry(col.clone()).or_default();
                        ui.add(egui::TextEdit::singleline(search).hint_text("Search…"));
                        let needle = search.to_lowercase();

                        for val in all_values {
                            if !needle.is_empty() && !val.to_lowercase().contains(&needle) {
                                continue;
                            }

                            let mut text = if val.is_empty() {
                                RichText::new("(empty)").italics()
                            } else {
                                RichText::new(val)
                            };
                            if state.color_column.as_deref() == Some(col.as_str()) {
                                if let Some(cm) = &state.color_map {
                                    text = text.color(cm.color_for(val));
                                }
                            }

                            let mut checked = state.filters().is_selected(col, val);
                            if ui.checkbox(&mut checked, text).changed() {
                                actions.push(FilterAction::Toggle {
                                    column: col.clone(),
                                    value: val.clone(),
                                });
                            }
                        }
                    });
            }
        });

    for action in actions {
        let result = match action {
            FilterAction::Toggle { column, value } => state.toggle_value(&column, &value),
            FilterAction::SelectAll(column) => state.select_all(&column),
            FilterAction::Clear(column) => state.clear_selection(&column),
            FilterAction::ClearAll => state.clear_all(),
        };
        if let Err(e) = result {
            log::error!("Filter update rejected: {e}");
            state.status_message = Some(format!("Error: {e}"));
        }
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                ui.close_menu();
                open_file_dialog(state);
            }
        });

        ui.separator();

        if let Some(ds) = state.dataset() {
            ui.label(format!(
                "{} rows loaded, {} visible",
                ds.len(),
                state.visible_indices().len()
            ));
            let active = state.filters().active_count();
            if active > 0 {
                ui.separator();
                ui.label(format!("{active} active filters"));
            }
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open tabular data")
        .add_filter(
            "Supported files",
            &["csv", "tsv", "tab", "psv", "txt", "json", "parquet", "pq"],
        )
        .add_filter("Delimited text", &["csv", "tsv", "tab", "psv", "txt"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open_path(&path);
    }
}
