// Booth configuration: JSON file structure and loader.

pub mod store;
pub mod types;
