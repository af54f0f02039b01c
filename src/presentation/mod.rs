// Presentation layer - Operator console
pub mod app_state;
pub mod console;
pub mod render;
