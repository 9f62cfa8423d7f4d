use env_logger::{Builder, Env};
use log::LevelFilter;

/// Sets up `env_logger`. `RUST_LOG` wins; otherwise warnings only, or debug output for
/// this crate with `--verbose`.
pub fn init(verbose: bool) {
    let mut builder = Builder::from_env(Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_module("evlist", LevelFilter::Debug);
    }
    builder.format_timestamp(None).init();
}
