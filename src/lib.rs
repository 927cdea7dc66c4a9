// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Keeps an Ingress in place for every Service annotated with `ingress/http`
//! and removes it when the annotation goes away.
//!
//! Keys that keep failing are retried with exponential backoff up to the
//! configured retry budget, then reported and dropped. They are picked up again
//! on the next change to the Service or a deletion of its Ingress.
pub mod config;
pub mod constants;
pub mod error;
pub mod intake;
pub mod kubernetes;
pub mod queue;
pub mod reconcilers;
pub mod report;
pub mod types;

#[cfg(test)]
pub mod test_utils;
