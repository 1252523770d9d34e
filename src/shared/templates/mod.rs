//! Server-rendered HTML pages.
//!
//! Page templates live in `templates/pages/` and use Jinja2 syntax.

pub mod engine;

pub use engine::{render_error_page, render_page, render_template};
