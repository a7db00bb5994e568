pub mod components;
pub mod drawer;

pub use components::{render_delete_confirm, render_help_bar, render_input_popup, render_status_bar};
pub use drawer::render_drawer;
