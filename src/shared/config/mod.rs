mod model;


pub use model::{
    BuildConfig, LoggingConfig, PlannerConfig, ScanConfig, Settings, load_settings,
    load_settings_from_env,
};
