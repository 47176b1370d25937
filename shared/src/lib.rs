// Data models shared by the engine and whatever renders the dashboard.
pub mod models;
pub mod utils;
