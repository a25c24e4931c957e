use std::path::PathBuf;

/// Environment variable overriding the `.directory` root.
pub const ROOT_ENV: &str = "DIRECTORY_ROOT";

/// Returns the directory holding local configuration.
///
/// Defaults to `.directory` in the working directory; `DIRECTORY_ROOT`
/// points it elsewhere.
pub fn directory_root() -> PathBuf {
    if let Ok(root) = std::env::var(ROOT_ENV) {
        PathBuf::from(root)
    } else {
        PathBuf::from(".directory")
    }
}
