// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Ingress API availability checking

use crate::constants::discovery::{POLL_INTERVAL_SECS, POLL_MAX_INTERVAL_SECS};
use crate::error::Result;
use kube::{discovery::Discovery, Client};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

const NETWORKING_GROUP: &str = "networking.k8s.io";

/// Wait until the cluster serves `networking.k8s.io/v1` Ingresses.
/// Polls with exponential backoff starting at POLL_INTERVAL_SECS seconds.
pub async fn wait_for_ingress_api(client: &Client) -> Result<()> {
    let mut interval = POLL_INTERVAL_SECS;

    loop {
        match ingress_api_available(client).await {
            Ok(true) => {
                info!("Ingress API ({}/v1) is available", NETWORKING_GROUP);
                return Ok(());
            }
            Ok(false) => {
                info!(
                    "Ingress API ({}/v1) not yet available, waiting {} seconds...",
                    NETWORKING_GROUP, interval
                );
            }
            Err(e) => {
                warn!(
                    "Error checking for Ingress API: {}, retrying in {} seconds...",
                    e, interval
                );
            }
        }

        sleep(Duration::from_secs(interval)).await;
        interval = next_interval(interval);
    }
}

fn next_interval(interval: u64) -> u64 {
    interval.saturating_mul(2).min(POLL_MAX_INTERVAL_SECS)
}

async fn ingress_api_available(client: &Client) -> Result<bool> {
    let discovery = Discovery::new(client.clone())
        .filter(&[NETWORKING_GROUP])
        .run()
        .await?;

    for group in discovery.groups() {
        if group.name() != NETWORKING_GROUP {
            continue;
        }
        for (ar, _caps) in group.recommended_resources() {
            if ar.kind == "Ingress" && ar.version == "v1" {
                return Ok(true);
            }
        }
    }

    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_interval_doubles_up_to_cap() {
        assert_eq!(next_interval(10), 20);
        assert_eq!(next_interval(20), 40);
        assert_eq!(next_interval(40), 60);
        assert_eq!(next_interval(60), 60);
    }
}
