use chrono::Utc;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};

use super::api::GithubError;
use super::config::{flatten_keyed_pages, get_api_paginated, send_json, GithubConnection, PER_PAGE};
use crate::utils::check_run::{CheckConclusion, CheckRun, CheckRunPayload, CheckStatus};
use crate::utils::pr_info::RepoRef;

#[derive(Deserialize)]
struct RawOutput {
    title: Option<String>,
    summary: Option<String>,
}

#[derive(Deserialize)]
struct RawCheckRun {
    id: u64,
    name: String,
    status: CheckStatus,
    conclusion: Option<CheckConclusion>,
    output: Option<RawOutput>,
}

impl From<RawCheckRun> for CheckRun {
    fn from(raw: RawCheckRun) -> Self {
        let (title, summary) = match raw.output {
            Some(output) => (output.title, output.summary),
            None => (None, None),
        };
        CheckRun::new(raw.id, &raw.name, raw.status, raw.conclusion, title, summary)
    }
}

pub async fn list_check_runs_for_ref(
    conn: &GithubConnection,
    repo: &RepoRef,
    sha: &str,
) -> Result<Vec<CheckRun>, GithubError> {
    let url = conn.url(&format!("/repos/{}/{}/commits/{}/check-runs", repo.owner(), repo.name(), sha));
    let pages = get_api_paginated(conn, &url, &[("per_page", PER_PAGE)]).await?;
    let mut check_runs = Vec::new();
    for run_json in flatten_keyed_pages(pages, "check_runs") {
        match serde_json::from_value::<RawCheckRun>(run_json) {
            Ok(raw) => check_runs.push(CheckRun::from(raw)),
            Err(e) => log::error!("[list_check_runs_for_ref] Skipping undecodable check run on {}@{}: {:?}", repo, sha, e),
        }
    }
    Ok(check_runs)
}

fn payload_body(payload: &CheckRunPayload) -> Value {
    let mut body = json!({
        "name": payload.name(),
        "status": payload.status(),
        "output": {
            "title": payload.title(),
            "summary": payload.summary(),
        },
    });
    if let Some(conclusion) = payload.conclusion() {
        body["conclusion"] = json!(conclusion);
    }
    if payload.status() == CheckStatus::Completed {
        body["completed_at"] = json!(Utc::now().to_rfc3339());
    }
    body
}

pub async fn create_check_run(
    conn: &GithubConnection,
    repo: &RepoRef,
    sha: &str,
    payload: &CheckRunPayload,
) -> Result<(), GithubError> {
    let url = conn.url(&format!("/repos/{}/{}/check-runs", repo.owner(), repo.name()));
    let mut body = payload_body(payload);
    body["head_sha"] = json!(sha);
    send_json(conn, Method::POST, &url, &body).await?;
    log::info!("[create_check_run] Created {} on {}@{}: {}", payload.name(), repo, sha, payload.title());
    Ok(())
}

pub async fn update_check_run(
    conn: &GithubConnection,
    repo: &RepoRef,
    check_run_id: u64,
    payload: &CheckRunPayload,
) -> Result<(), GithubError> {
    let url = conn.url(&format!("/repos/{}/{}/check-runs/{}", repo.owner(), repo.name(), check_run_id));
    let body = payload_body(payload);
    send_json(conn, Method::PATCH, &url, &body).await?;
    log::info!("[update_check_run] Updated {} ({}) on {}: {}", payload.name(), check_run_id, repo, payload.title());
    Ok(())
}
