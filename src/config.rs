// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{ingress, workers};
use crate::types::ingress::IngressTemplate;

/// Controller configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of concurrent reconcile workers
    pub workers: usize,
    /// Failed attempts tolerated per key before it is dropped and reported
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
    /// Host placed on the rule of every generated Ingress
    pub ingress_host: String,
    pub ingress_class: String,
    /// Restrict watches to one namespace; all namespaces when unset
    pub watch_namespace: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            workers: workers::DEFAULT_WORKERS,
            max_retries: workers::DEFAULT_MAX_RETRIES,
            backoff_base: Duration::from_millis(workers::DEFAULT_BACKOFF_BASE_MS),
            backoff_max: Duration::from_secs(workers::DEFAULT_BACKOFF_MAX_SECS),
            ingress_host: ingress::DEFAULT_HOST.to_string(),
            ingress_class: ingress::DEFAULT_CLASS.to_string(),
            watch_namespace: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let worker_count = parse_or(&lookup, "WORKERS", defaults.workers)?;
        if worker_count == 0 {
            anyhow::bail!("WORKERS must be at least 1");
        }

        Ok(Config {
            workers: worker_count,
            max_retries: parse_or(&lookup, "MAX_RETRIES", defaults.max_retries)?,
            backoff_base: Duration::from_millis(parse_or(
                &lookup,
                "BACKOFF_BASE_MS",
                workers::DEFAULT_BACKOFF_BASE_MS,
            )?),
            backoff_max: Duration::from_secs(parse_or(
                &lookup,
                "BACKOFF_MAX_SECS",
                workers::DEFAULT_BACKOFF_MAX_SECS,
            )?),
            ingress_host: lookup("INGRESS_HOST").unwrap_or(defaults.ingress_host),
            ingress_class: lookup("INGRESS_CLASS").unwrap_or(defaults.ingress_class),
            watch_namespace: lookup("WATCH_NAMESPACE").filter(|ns| !ns.is_empty()),
        })
    }

    /// The routing shape used for Ingresses created by this controller
    pub fn ingress_template(&self) -> IngressTemplate {
        IngressTemplate {
            host: self.ingress_host.clone(),
            class_name: self.ingress_class.clone(),
        }
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", name, raw)),
        None => Ok(default),
    }
}
