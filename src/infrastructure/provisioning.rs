use std::time::Duration;

use anyhow::{bail, Result};

use crate::domain::repository::{TableAdmin, TableState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self { Self { interval: Duration::from_secs(2), max_attempts: 60 } }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioned {
    AlreadyActive,
    BecameActive,
    Created,
}

/// Makes sure the table exists and is usable before the server starts.
pub async fn provision<A: TableAdmin + ?Sized>(admin: &A, policy: PollPolicy) -> Result<Provisioned> {
    let table = admin.table_name().to_string();
    match admin.describe_table().await? {
        Some(TableState::Active) => {
            tracing::info!(%table, "table already exists");
            Ok(Provisioned::AlreadyActive)
        }
        Some(state) => {
            tracing::info!(%table, ?state, "table exists but is not active yet");
            wait_until_active(admin, policy).await?;
            Ok(Provisioned::BecameActive)
        }
        None => {
            tracing::info!(%table, "creating table");
            admin.create_table().await?;
            tracing::info!(%table, "waiting for table to become active");
            wait_until_active(admin, policy).await?;
            tracing::info!(%table, "table is ready");
            Ok(Provisioned::Created)
        }
    }
}

async fn wait_until_active<A: TableAdmin + ?Sized>(admin: &A, policy: PollPolicy) -> Result<()> {
    for attempt in 1..=policy.max_attempts {
        tokio::time::sleep(policy.interval).await;
        match admin.describe_table().await? {
            Some(TableState::Active) => return Ok(()),
            state => tracing::debug!(attempt, ?state, "table not active yet"),
        }
    }
    bail!("table `{}` did not become active after {} attempts", admin.table_name(), policy.max_attempts)
}
