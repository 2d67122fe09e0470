//! Settings loading and validation (config.toml + env overrides).

pub mod settings;

pub use settings::{
    AutomationSettings, CautionPolicy, PlatformSettings, SessionSettings, Settings,
};
