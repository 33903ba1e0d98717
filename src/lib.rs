pub const APP_NAME: &str = "triage-console";

pub mod analytics;
pub mod bus;
pub mod classify;
pub mod cli;
pub mod config;
pub mod decision;
pub mod keyboard;
pub mod links;
pub mod models;
pub mod nav;
pub mod notices;
pub mod projector;
pub mod session;
pub mod storage;
pub mod viewstate;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
