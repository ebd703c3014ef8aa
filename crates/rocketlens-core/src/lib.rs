pub mod app_config;
pub mod config;
pub mod estimator;
pub mod format;
pub mod product;
pub mod store;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env, ConfigError};
pub use product::{
    OptionPrice, PriceValidation, ProductKind, ProductMetrics, ProductRecord, ProductState,
    ProductStatus,
};
pub use store::{ProductStore, SubscriberId};
