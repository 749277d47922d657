use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use futures_util::future::join_all;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::context::GovernanceContext;
use crate::core::governance::evaluate_pull_request;
use crate::github::api::{GithubError, InstallationApi};
use crate::utils::pr_info::RepoRef;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub evaluated: usize,
    pub failed: usize,
    pub cancelled: bool,
}

impl SweepStats {
    fn merge(&mut self, other: SweepStats) {
        self.evaluated += other.evaluated;
        self.failed += other.failed;
        self.cancelled |= other.cancelled;
    }
}

/// Handle to the background sweep. Dropping it leaves the loop running.
pub struct ReconcileHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ReconcileHandle {
    /// Stops the loop at the next PR boundary and waits for it to exit.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            log::error!("[ReconcileHandle::stop] Reconciliation task ended abnormally: {:?}", e);
        }
    }
}

/// Starts the sweep loop. The next sweep is scheduled only after the previous
/// one finished, so sweeps never overlap.
pub fn start(ctx: Arc<GovernanceContext>) -> ReconcileHandle {
    let cancel = CancellationToken::new();
    let loop_cancel = cancel.clone();
    let task = tokio::spawn(async move {
        let interval = ctx.config().reconcile_interval();
        log::info!("[reconcile::start] Reconciling every {:?}", interval);
        loop {
            let stats = sweep(&ctx, &loop_cancel).await;
            log::info!(
                "[reconcile::start] Sweep finished: {} evaluated, {} failed",
                stats.evaluated,
                stats.failed
            );
            tokio::select! {
                _ = loop_cancel.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }
        log::info!("[reconcile::start] Reconciliation loop stopped");
    });
    ReconcileHandle { cancel, task }
}

/// One pass over every installation. Installations run concurrently; within
/// an installation repositories and PRs are processed one at a time.
pub async fn sweep(ctx: &GovernanceContext, cancel: &CancellationToken) -> SweepStats {
    let installations = match ctx.app().list_installations().await {
        Ok(installations) => installations,
        Err(e) => {
            log::error!("[sweep] Unable to list installations: {}", e);
            return SweepStats::default();
        }
    };
    let results = join_all(
        installations
            .into_iter()
            .map(|installation_id| sweep_installation(ctx, installation_id, cancel)),
    )
    .await;
    let mut stats = SweepStats::default();
    for result in results {
        stats.merge(result);
    }
    stats
}

async fn sweep_installation(ctx: &GovernanceContext, installation_id: u64, cancel: &CancellationToken) -> SweepStats {
    let mut stats = SweepStats::default();
    let client = match ctx.app().installation(installation_id).await {
        Ok(client) => client,
        Err(e) => {
            log::error!("[sweep_installation] Unable to authenticate installation {}: {}", installation_id, e);
            return stats;
        }
    };
    let repos = match client.list_repos().await {
        Ok(repos) => repos,
        Err(e) => {
            log::error!("[sweep_installation] Unable to list repos for installation {}: {}", installation_id, e);
            return stats;
        }
    };
    for repo in repos {
        if let Err(e) = sweep_repo(ctx, client.as_ref(), &repo, cancel, &mut stats).await {
            log::error!("[sweep_installation] Unable to list open PRs for {}: {}", repo, e);
        }
        if stats.cancelled {
            break;
        }
    }
    stats
}

/// Pages through open PRs until a page yields nothing new, which tolerates
/// listings that never report a total.
async fn sweep_repo(
    ctx: &GovernanceContext,
    client: &dyn InstallationApi,
    repo: &RepoRef,
    cancel: &CancellationToken,
    stats: &mut SweepStats,
) -> Result<(), GithubError> {
    let mut seen: HashSet<u64> = HashSet::new();
    let mut page = 1;
    loop {
        let prs = client.list_open_prs(repo, page).await?;
        let fresh: Vec<_> = prs.into_iter().filter(|pr| seen.insert(pr.number())).collect();
        if fresh.is_empty() {
            return Ok(());
        }
        for pr in fresh {
            match evaluate_pull_request(ctx, client, &pr, Utc::now()).await {
                Ok(_) => stats.evaluated += 1,
                Err(e) => {
                    stats.failed += 1;
                    log::error!("[sweep_repo] Failed to reconcile {}: {}", pr, e);
                }
            }
            if cancel.is_cancelled() {
                log::info!("[sweep_repo] Cancelled after {}", pr);
                stats.cancelled = true;
                return Ok(());
            }
        }
        page += 1;
    }
}
