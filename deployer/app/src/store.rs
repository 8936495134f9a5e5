// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT
//! Persist deployment records as JSON files.

use std::path::Path;

use anyhow::Context;
use serde::{de::DeserializeOwned, Serialize};

/// Write a value as pretty JSON, creating the parent directories as needed.
pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> anyhow::Result<()> {
    let path = path.as_ref();

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create directory {dir:?}"))?;
    }

    let json = serde_json::to_string_pretty(value).context("failed to serialize to JSON")?;

    std::fs::write(path, json).with_context(|| format!("failed to write {path:?}"))?;

    tracing::debug!(?path, "written JSON file");

    Ok(())
}

/// Read back whatever [write_json] wrote.
pub fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> anyhow::Result<T> {
    let path = path.as_ref();

    let json = std::fs::read_to_string(path).with_context(|| format!("failed to read {path:?}"))?;

    serde_json::from_str(&json).with_context(|| format!("failed to parse {path:?}"))
}
