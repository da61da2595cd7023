//! Default configuration file locations.

use std::path::PathBuf;

/// Default configuration file locations, most specific first:
/// the user config directory, the home directory, then the system.
pub fn defaults() -> impl Iterator<Item = PathBuf> {
    let user_config = dirs::config_dir()
        .into_iter()
        .flat_map(|dir| [dir.join("mail-watch/config.yaml"), dir.join("mail-watch.yaml")]);
    let home = dirs::home_dir()
        .into_iter()
        .map(|dir| dir.join(".mail-watch.yaml"));
    let system = std::iter::once_with(|| PathBuf::from("/etc/mail-watch/config.yaml"));

    user_config.chain(home).chain(system)
}

/// The explicit path alone when given, the defaults otherwise.
pub fn resolve(env_path: Option<PathBuf>) -> impl Iterator<Item = PathBuf> {
    let fallback = env_path.is_none().then(defaults).into_iter().flatten();
    env_path.into_iter().chain(fallback)
}
