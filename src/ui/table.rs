use eframe::egui::{self, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::state::{AppState, SortOrder};

// ---------------------------------------------------------------------------
// Data table (central panel)
// ---------------------------------------------------------------------------

/// Render the current page of visible rows. Clicking a header cycles the
/// table sort on that column.
pub fn data_table(ui: &mut Ui, state: &mut AppState) {
    if let Some(col) = show_table(ui, state) {
        state.toggle_sort(&col);
    }
}

/// Returns the column whose header was clicked.
fn show_table(ui: &mut Ui, state: &AppState) -> Option<String> {
    let Some(dataset) = state.dataset() else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to view rows  (File → Open…)");
        });
        return None;
    };

    let columns = dataset.column_names();
    if columns.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("The file contains no rows.");
        });
        return None;
    }

    let page = state.page_indices();
    let color_col = state.color_column.as_deref();
    let sort = state.sort();
    let text_height = egui::TextStyle::Body.resolve(ui.style()).size;
    let mut clicked = None;

    egui::ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .column(Column::auto().at_least(40.0))
            .columns(Column::auto().at_least(60.0).clip(true), columns.len())
            .header(24.0, |mut header| {
                header.col(|ui| {
                    ui.label(RichText::new("#").weak());
                });
                for col in columns {
                    header.col(|ui| {
                        let arrow = match sort {
                            Some((c, SortOrder::Ascending)) if c == col.as_str() => " ▲",
                            Some((c, SortOrder::Descending)) if c == col.as_str() => " ▼",
                            _ => "",
                        };
                        let label = format!("{col}{arrow}");
                        let button = egui::Button::new(RichText::new(label).strong()).frame(false);
                        if ui.add(button).on_hover_text("Sort by this column").clicked() {
                            clicked = Some(col.clone());
                        }
                    });
                }
            })
            .body(|body| {
                body.rows(text_height + 8.0, page.len(), |mut row| {
                    let pos = page[row.index()];
                    let record = dataset.row(pos);
                    row.col(|ui| {
                        ui.label(RichText::new((pos + 1).to_string()).weak());
                    });
                    for col in columns {
                        row.col(|ui| {
                            let value = record.and_then(|r| r.get(col)).unwrap_or("");
                            let mut text = RichText::new(value);
                            if color_col == Some(col.as_str()) {
                                if let Some(cm) = &state.color_map {
                                    text = text.color(cm.color_for(value));
                                }
                            }
                            ui.label(text);
                        });
                    }
                });
            });
    });
    clicked
}

// ---------------------------------------------------------------------------
// Pagination bar
// ---------------------------------------------------------------------------

pub fn pagination_bar(ui: &mut Ui, state: &mut AppState) {
    if state.dataset().is_none() {
        return;
    }

    let total = state.visible_indices().len();
    let page = state.page();
    let pages = state.page_count();

    ui.horizontal(|ui: &mut Ui| {
        if ui.add_enabled(page > 0, egui::Button::new("◀ Prev")).clicked() {
            state.set_page(page - 1);
        }
        ui.label(format!("Page {} of {}", page + 1, pages));
        if ui
            .add_enabled(page + 1 < pages, egui::Button::new("Next ▶"))
            .clicked()
        {
            state.set_page(page + 1);
        }

        ui.separator();

        ui.label("Rows per page");
        let current = state.page_size;
        egui::ComboBox::from_id_salt("page_size")
            .selected_text(current.to_string())
            .show_ui(ui, |ui: &mut Ui| {
                for n in state.page_size_options.clone() {
                    if ui.selectable_label(current == n, n.to_string()).clicked() {
                        state.set_page_size(n);
                    }
                }
            });

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui: &mut Ui| {
            let shown = state.page_indices().len();
            let first = if shown == 0 { 0 } else { page * state.page_size + 1 };
            let last = page * state.page_size + shown;
            ui.label(RichText::new(format!("Showing rows {first}-{last} of {total}")).weak());
        });
    });
}
