// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! `${VAR}` references to environment variables in configuration values,
//! so secrets such as private keys can stay out of the files.

use std::borrow::Cow;

use config::{ConfigError, Map, Source, Value, ValueKind};
use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    static ref VAR_REF: Regex =
        Regex::new(r"\$\{([^}]+)\}").expect("variable reference pattern is valid");
}

/// A configuration [Source] with the references in its string values replaced from the environment.
///
/// References to unset variables are left as they are.
#[derive(Clone, Debug)]
pub struct EnvInterpol<T>(pub T);

impl<T> Source for EnvInterpol<T>
where
    T: Source + Clone + Send + Sync + 'static,
{
    fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
        Box::new(self.clone())
    }

    fn collect(&self) -> Result<Map<String, Value>, ConfigError> {
        let mut values = self.0.collect()?;
        values.values_mut().for_each(substitute);
        Ok(values)
    }
}

/// Substitute in strings, and recursively in arrays and tables.
fn substitute(value: &mut Value) {
    match &mut value.kind {
        ValueKind::String(s) => {
            let replaced = match substitute_str(s) {
                Cow::Borrowed(_) => None,
                Cow::Owned(r) => Some(r),
            };
            if let Some(r) = replaced {
                *s = r;
            }
        }
        ValueKind::Array(values) => values.iter_mut().for_each(substitute),
        ValueKind::Table(values) => values.values_mut().for_each(substitute),
        _ => {}
    }
}

fn substitute_str(s: &str) -> Cow<'_, str> {
    VAR_REF.replace_all(s, |caps: &Captures| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_owned())
    })
}
