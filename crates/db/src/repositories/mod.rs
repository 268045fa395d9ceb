pub mod job_repo;
pub mod sample_repo;
pub mod settings_repo;
pub mod user_repo;

pub use job_repo::JobRepo;
pub use sample_repo::SampleRepo;
pub use settings_repo::SettingsRepo;
pub use user_repo::UserRepo;
