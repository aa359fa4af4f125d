pub mod user;

pub use user::{config_path, load_user_config, load_user_config_from, UserConfig, CONFIG_ENV};
