use super::api::GithubError;
use super::config::{get_json, GithubConnection, PER_PAGE};
use crate::utils::pr_info::{PullRequest, RepoRef};

pub async fn get_pull_request(conn: &GithubConnection, repo: &RepoRef, number: u64) -> Result<PullRequest, GithubError> {
    let url = conn.url(&format!("/repos/{}/{}/pulls/{}", repo.owner(), repo.name(), number));
    let pr: PullRequest = get_json(conn, &url, &[]).await?;
    log::debug!("[get_pull_request] PR info: {:?}", &pr);
    Ok(pr)
}

/// A single page of open PRs. Pages are requested explicitly so callers can
/// stop once a page yields nothing new, whatever the API reports as a total.
pub async fn list_open_prs(
    conn: &GithubConnection,
    repo: &RepoRef,
    page: u32,
) -> Result<Vec<PullRequest>, GithubError> {
    let url = conn.url(&format!("/repos/{}/{}/pulls", repo.owner(), repo.name()));
    let page_str = page.to_string();
    let params = [("state", "open"), ("per_page", PER_PAGE), ("page", page_str.as_str())];
    let prs: Vec<PullRequest> = get_json(conn, &url, &params).await?;
    log::debug!("[list_open_prs] {} page {} has {} open PRs", repo, page, prs.len());
    Ok(prs)
}
