use super::api::GithubError;
use super::config::{flatten_array_pages, flatten_keyed_pages, get_api_paginated, GithubConnection, PER_PAGE};
use crate::utils::pr_info::RepoRef;

/// Repositories visible to the installation token held by `conn`.
pub async fn get_github_app_installed_repos(conn: &GithubConnection) -> Result<Vec<RepoRef>, GithubError> {
    let url = conn.url("/installation/repositories");
    let pages = get_api_paginated(conn, &url, &[("per_page", PER_PAGE)]).await?;
    let repos: Vec<RepoRef> = flatten_keyed_pages(pages, "repositories")
        .iter()
        .filter_map(|repo_json| {
            let owner = repo_json["owner"]["login"].as_str()?;
            let name = repo_json["name"].as_str()?;
            Some(RepoRef::new(owner, name))
        })
        .collect();
    log::debug!("[get_github_app_installed_repos] Fetched {} repositories", repos.len());
    Ok(repos)
}

/// Installations of the app; `conn` must carry the app JWT.
pub async fn list_installations(conn: &GithubConnection) -> Result<Vec<u64>, GithubError> {
    let url = conn.url("/app/installations");
    let pages = get_api_paginated(conn, &url, &[("per_page", PER_PAGE)]).await?;
    let ids = flatten_array_pages(pages)
        .iter()
        .filter_map(|install| install["id"].as_u64())
        .collect();
    Ok(ids)
}
