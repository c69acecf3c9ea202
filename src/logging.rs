use env_logger::Env;

/// Install the global logger. `RUST_LOG` overrides the `info` default.
pub fn init() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}
