use super::api::GithubError;
use super::config::{flatten_array_pages, get_api_paginated, GithubConnection, PER_PAGE};

pub async fn list_team_members(conn: &GithubConnection, org: &str, team_slug: &str) -> Result<Vec<String>, GithubError> {
    let url = conn.url(&format!("/orgs/{}/teams/{}/members", org, team_slug));
    let pages = get_api_paginated(conn, &url, &[("per_page", PER_PAGE)]).await?;
    let members: Vec<String> = flatten_array_pages(pages)
        .iter()
        .filter_map(|member| member["login"].as_str().map(str::to_string))
        .collect();
    log::debug!("[list_team_members] {}/{} has {} members", org, team_slug, members.len());
    Ok(members)
}
