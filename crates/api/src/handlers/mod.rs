pub mod admin;
pub mod auth;
pub mod files;
pub mod runner;
pub mod samples;
pub mod settings;
