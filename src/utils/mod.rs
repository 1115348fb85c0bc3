pub mod html;
pub mod logging;

pub use html::to_plain_text;
pub use logging::truncate_text;
