/// Application name
pub const APP_NAME: &str = "ctl";

/// Framework version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable holding the application environment
pub const ENV_VAR: &str = "APP_ENV";

/// Environment used when neither the process environment nor configuration names one
pub const DEFAULT_ENVIRONMENT: &str = "production";

/// Environment name reported while the test suite runs
pub const TESTING_ENVIRONMENT: &str = "testing";

/// Application code directory
pub const APP_DIR: &str = "app";

/// Configuration directory name
pub const CONFIG_DIR: &str = "config";

/// Storage directory name
pub const STORAGE_DIR: &str = "storage";

/// Database directory name
pub const DATABASE_DIR: &str = "database";

/// Resources directory name
pub const RESOURCES_DIR: &str = "resources";

/// Language files directory, relative to the resources directory
pub const LANG_DIR: &str = "lang";

/// Bootstrap directory name
pub const BOOTSTRAP_DIR: &str = "bootstrap";

/// Exit code of a successful command
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code of a failed command, and of any failure caught by the kernel
pub const EXIT_FAILURE: i32 = 1;

/// Exit code of a command invoked with invalid usage
pub const EXIT_INVALID: i32 = 2;
