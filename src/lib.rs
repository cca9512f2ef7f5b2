pub mod aggregation;
pub mod config;
pub mod db;
pub mod sensor;
pub mod simulation;
pub mod store;
pub mod summary;

/// Installs the `env_logger` backend; `RUST_LOG` overrides the `info` default.
pub fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}
