pub mod job;
pub mod sample;
pub mod settings;
pub mod status;
pub mod user;
