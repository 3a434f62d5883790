/// Name used for data and cache directories.
pub const APP_NAME: &str = "boxwright";

/// Length of the truncated plan hash.
pub const OBJ_HASH_PREFIX_LEN: usize = 20;

/// Default manifest file name looked up by the CLI.
pub const DEFAULT_MANIFEST: &str = "build.lua";

/// Directory inside a build root holding boxwright metadata.
pub const META_DIR: &str = ".boxwright";

/// File inside [`META_DIR`] receiving the final run configuration.
pub const IMAGE_CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the build root directory.
pub const ROOT_ENV: &str = "BOXWRIGHT_ROOT";

/// Environment variable overriding the shell used for run steps.
pub const SHELL_ENV: &str = "BOXWRIGHT_SHELL";
