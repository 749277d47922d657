use reqwest::Method;
use serde_json::{json, Value};

use super::api::{GithubError, RemoveOutcome};
use super::config::{flatten_array_pages, get_api_paginated, send_delete, send_json, GithubConnection, PER_PAGE};
use crate::utils::pr_info::RepoRef;

fn labels_url(conn: &GithubConnection, repo: &RepoRef, number: u64) -> String {
    conn.url(&format!("/repos/{}/{}/issues/{}/labels", repo.owner(), repo.name(), number))
}

pub async fn list_labels(conn: &GithubConnection, repo: &RepoRef, number: u64) -> Result<Vec<String>, GithubError> {
    let url = labels_url(conn, repo, number);
    let pages = get_api_paginated(conn, &url, &[("per_page", PER_PAGE)]).await?;
    let labels = label_names(&flatten_array_pages(pages));
    log::debug!("[list_labels] {}#{} labels = {:?}", repo, number, &labels);
    Ok(labels)
}

pub async fn add_labels(
    conn: &GithubConnection,
    repo: &RepoRef,
    number: u64,
    labels: &[String],
) -> Result<(), GithubError> {
    let url = labels_url(conn, repo, number);
    let body = json!({ "labels": labels });
    send_json(conn, Method::POST, &url, &body).await?;
    log::info!("[add_labels] Added {:?} to {}#{}", labels, repo, number);
    Ok(())
}

pub async fn remove_label(
    conn: &GithubConnection,
    repo: &RepoRef,
    number: u64,
    label: &str,
) -> Result<RemoveOutcome, GithubError> {
    let url = format!("{}/{}", labels_url(conn, repo, number), urlencoding::encode(label));
    match send_delete(conn, &url).await {
        Ok(_) => {
            log::info!("[remove_label] Removed {} from {}#{}", label, repo, number);
            Ok(RemoveOutcome::Removed)
        }
        Err(e) if e.is_not_found() => {
            log::debug!("[remove_label] {} already absent from {}#{}", label, repo, number);
            Ok(RemoveOutcome::NotFound)
        }
        Err(e) => Err(e),
    }
}

pub fn label_names(labels: &[Value]) -> Vec<String> {
    labels
        .iter()
        .filter_map(|label| label["name"].as_str().map(str::to_string))
        .collect()
}
