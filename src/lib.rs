pub mod ab;
pub mod admin;
pub mod app;
pub mod auth;
pub mod catalog;
pub mod codes;
pub mod config;
pub mod errors;
pub mod export;
pub mod handlers;
pub mod models;
pub mod onboarding;
pub mod payloads;
pub mod questions;
pub mod schedule;
pub mod scoring;
pub mod state;
pub mod stats;
pub mod storage;
pub mod submission;
pub mod today;
pub mod ui;
pub mod usernames;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use storage::{ensure_parent_dir, load_data, persist_data};
