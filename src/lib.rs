//! Tabular data viewer with per-column value filters.
//!
//! The [`data`] layer is independent of the UI: load a [`data::model::Dataset`],
//! build its [`data::domain::DomainIndex`], and evaluate a
//! [`data::filter::FilterState`] against it. [`state::AppState`] ties these
//! together for the egui front-end in [`app`] and [`ui`].

pub mod app;
pub mod color;
pub mod config;
pub mod data;
pub mod state;
pub mod ui;
