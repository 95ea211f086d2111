use env_logger::{Builder, Env};

/// Install the global logger.
///
/// `RUST_LOG` wins when set; otherwise each `-v` raises the default level
/// from warnings to info, then debug, then trace.
pub(crate) fn initialize(verbosity: u8) {
	let level = match verbosity {
		0 => "warn",
		1 => "info",
		2 => "debug",
		_ => "trace",
	};
	let _ = Builder::from_env(Env::default().default_filter_or(level))
		.format_timestamp(None)
		.try_init();
}
