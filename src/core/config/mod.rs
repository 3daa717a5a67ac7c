pub mod defaults;
pub mod paths;
pub mod service;
pub mod settings;
pub mod validation;

pub use paths::AppPaths;
pub use service::{redacted_view, ConfigService};
pub use settings::{ApiKeys, AppConfig, Secret, Settings};
