/*
 * This module provides the application logic layer, primarily centered around
 * `MyAppLogic` which acts as the Presenter/Controller. It also includes
 * `MainWindowUiState` for the presentation state of the main window and the
 * `tree_view` projection from the selection model to tree descriptors.
 * Unit tests for `MyAppLogic` are in `handler_tests.rs`.
 */
pub mod handler;
pub mod main_window_ui_state;
pub mod tree_view;
pub mod ui_constants;

#[cfg(test)]
mod handler_tests;

pub use handler::MyAppLogic;
