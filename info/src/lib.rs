pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const REVISION: Option<&str> = option_env!("ROSTER_REVISION");

pub const BUILD_TIMESTAMP: Option<&str> = option_env!("BUILD_TIMESTAMP");
