// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::Ingress;
use kube::runtime::reflector;
use kube::Client;
use std::future::Future;
use std::io;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ingress_manager::config::Config;
use ingress_manager::constants::QUEUE_NAME;
use ingress_manager::intake::{ingress_notification, run_watch, service_notification, EventIntake};
use ingress_manager::kubernetes::{scoped_api, wait_for_ingress_api, KubeStore};
use ingress_manager::queue::{ExponentialBackoff, WorkQueue};
use ingress_manager::reconcilers::{Controller, IngressReconciler};
use ingress_manager::report::LogReporter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting ingress manager");

    let config = Config::from_env()?;
    info!(
        "Configuration loaded: workers={}, max_retries={}, namespace={}",
        config.workers,
        config.max_retries,
        config.watch_namespace.as_deref().unwrap_or("<all>")
    );

    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    info!("Waiting for the Ingress API to become available...");
    wait_for_ingress_api(&client).await?;

    let queue = Arc::new(WorkQueue::new(
        QUEUE_NAME,
        ExponentialBackoff::new(config.backoff_base, config.backoff_max),
    ));
    let intake = EventIntake::new(Arc::clone(&queue));

    let namespace = config.watch_namespace.as_deref();
    let (services, service_writer) = reflector::store::<Service>();
    let (ingresses, ingress_writer) = reflector::store::<Ingress>();

    let service_watch = tokio::spawn(run_watch(
        scoped_api::<Service>(&client, namespace),
        service_writer,
        intake.clone(),
        service_notification,
    ));
    let ingress_watch = tokio::spawn(run_watch(
        scoped_api::<Ingress>(&client, namespace),
        ingress_writer,
        intake,
        ingress_notification,
    ));

    info!("Waiting for caches to sync...");
    services
        .wait_until_ready()
        .await
        .context("Service cache never became ready")?;
    ingresses
        .wait_until_ready()
        .await
        .context("Ingress cache never became ready")?;
    info!("Caches synced");

    let store = KubeStore::new(client, services, ingresses);
    let reconciler = IngressReconciler::new(Arc::new(store), config.ingress_template());
    let controller = Arc::new(Controller::new(
        queue,
        Arc::new(reconciler),
        Arc::new(LogReporter),
        config.max_retries,
    ));

    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_signal(tokio::signal::ctrl_c(), shutdown.clone()));

    controller.run(config.workers, shutdown).await;

    service_watch.abort();
    ingress_watch.abort();
    info!("Ingress manager stopped");
    Ok(())
}

/// Cancel `token` once `signal` fires. A listener failure leaves the token untouched.
async fn cancel_on_signal<F>(signal: F, token: CancellationToken)
where
    F: Future<Output = io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            info!("Shutdown signal received");
            token.cancel();
        }
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_signal_cancels_token() {
        let token = CancellationToken::new();
        cancel_on_signal(async { Ok(()) }, token.clone()).await;
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_failed_signal_listener_keeps_running() {
        let token = CancellationToken::new();
        let failing = async { Err(io::Error::other("no signal handler")) };
        cancel_on_signal(failing, token.clone()).await;
        assert!(!token.is_cancelled());
    }
}
