use env_logger::Env;

/// Default level is `info`; override with RUST_LOG.
pub fn init() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}
