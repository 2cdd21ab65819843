mod loader;
mod types;

pub use loader::{CONFIG_FILE, load};
pub use types::{
    A11yConfig, ChangelogConfig, Config, FixConfig, GithubConfig, MetricsConfig, ReadmeConfig,
    TocConfig, VersionsConfig, WorkflowsConfig,
};
