// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! Paths in the settings are relative to the home directory given on the command line.

use std::path::{Path, PathBuf};

/// Implement getters which resolve path fields against `self.home_dir()`.
#[macro_export]
macro_rules! home_relative {
    ($($name:ident),+) => {
        $(
        pub fn $name(&self) -> std::path::PathBuf {
            $crate::paths::resolve(self.home_dir(), &self.$name)
        }
        )+
    };
}

/// Absolute paths are kept, `~` stands for the user's home and anything else is under `home_dir`.
pub fn resolve(home_dir: &Path, path: &Path) -> PathBuf {
    match path {
        p if p.is_absolute() => p.to_path_buf(),
        p if p.starts_with("~") => expand_tilde(p),
        p => expand_tilde(home_dir.join(p)),
    }
}

/// Replace a leading `~` component with the user's home directory, if there is one.
pub fn expand_tilde(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
