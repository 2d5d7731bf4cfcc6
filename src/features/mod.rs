//! Built-in feature implementations
//!
//! - `command` - shell snippets for install, update and remove
//! - `symlink` - link a file or directory into place
//! - `env` - export environment variables from the activation hook

mod command;
mod env;
mod symlink;

pub use command::Command;
pub use env::Env;
pub use symlink::Symlink;

use declarative::FeatureRegistry;

/// Registry holding every built-in feature
pub fn registry() -> FeatureRegistry {
    FeatureRegistry::new()
        .with(Command)
        .with(Symlink)
        .with(Env)
}
