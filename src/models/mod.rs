pub mod analytics;
pub mod content;

pub use analytics::*;
pub use content::*;
