use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use super::api::GithubError;
use super::config::{flatten_array_pages, get_api_paginated, send_json, GithubConnection, PER_PAGE};
use crate::utils::pr_info::RepoRef;
use crate::utils::review_event::{ReviewEvent, ReviewState, TimelineEvent};

#[derive(Deserialize)]
struct RawUser {
    login: String,
}

#[derive(Deserialize)]
struct RawReview {
    user: Option<RawUser>,
    body: Option<String>,
    state: ReviewState,
    submitted_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct RawComment {
    user: Option<RawUser>,
    body: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct RawTimelineEvent {
    event: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

pub async fn list_reviews(conn: &GithubConnection, repo: &RepoRef, number: u64) -> Result<Vec<ReviewEvent>, GithubError> {
    let url = conn.url(&format!("/repos/{}/{}/pulls/{}/reviews", repo.owner(), repo.name(), number));
    let pages = get_api_paginated(conn, &url, &[("per_page", PER_PAGE)]).await?;
    let mut reviews = Vec::new();
    for review_json in flatten_array_pages(pages) {
        let raw = match serde_json::from_value::<RawReview>(review_json) {
            Ok(raw) => raw,
            Err(e) => {
                log::error!("[list_reviews] Skipping undecodable review on {}#{}: {:?}", repo, number, e);
                continue;
            }
        };
        // Pending reviews have no submission time; ghost users have no login.
        let (Some(user), Some(submitted_at)) = (raw.user, raw.submitted_at) else {
            continue;
        };
        reviews.push(ReviewEvent::new(
            &user.login,
            raw.body.as_deref().unwrap_or_default(),
            Some(raw.state),
            submitted_at,
        ));
    }
    Ok(reviews)
}

pub async fn list_issue_comments(
    conn: &GithubConnection,
    repo: &RepoRef,
    number: u64,
) -> Result<Vec<ReviewEvent>, GithubError> {
    let url = conn.url(&format!("/repos/{}/{}/issues/{}/comments", repo.owner(), repo.name(), number));
    let pages = get_api_paginated(conn, &url, &[("per_page", PER_PAGE)]).await?;
    let mut comments = Vec::new();
    for comment_json in flatten_array_pages(pages) {
        let raw = match serde_json::from_value::<RawComment>(comment_json) {
            Ok(raw) => raw,
            Err(e) => {
                log::error!("[list_issue_comments] Skipping undecodable comment on {}#{}: {:?}", repo, number, e);
                continue;
            }
        };
        let Some(user) = raw.user else {
            continue;
        };
        comments.push(ReviewEvent::new(
            &user.login,
            raw.body.as_deref().unwrap_or_default(),
            None,
            raw.updated_at.unwrap_or(raw.created_at),
        ));
    }
    Ok(comments)
}

pub async fn create_issue_comment(
    conn: &GithubConnection,
    repo: &RepoRef,
    number: u64,
    body: &str,
) -> Result<(), GithubError> {
    let url = conn.url(&format!("/repos/{}/{}/issues/{}/comments", repo.owner(), repo.name(), number));
    send_json(conn, Method::POST, &url, &json!({ "body": body })).await?;
    log::info!("[create_issue_comment] Commented on {}#{}", repo, number);
    Ok(())
}

pub async fn list_timeline_events(
    conn: &GithubConnection,
    repo: &RepoRef,
    number: u64,
) -> Result<Vec<TimelineEvent>, GithubError> {
    let url = conn.url(&format!("/repos/{}/{}/issues/{}/timeline", repo.owner(), repo.name(), number));
    let pages = get_api_paginated(conn, &url, &[("per_page", PER_PAGE)]).await?;
    let events = flatten_array_pages(pages)
        .into_iter()
        .filter_map(|event_json| serde_json::from_value::<RawTimelineEvent>(event_json).ok())
        .filter_map(|raw| raw.event.map(|event| TimelineEvent::new(&event, raw.created_at)))
        .collect();
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Client;

    #[tokio::test]
    async fn test_list_reviews_skips_pending() {
        let mut server = mockito::Server::new_async().await;
        let body = json!([
            { "user": { "login": "a" }, "body": "API LGTM", "state": "APPROVED", "submitted_at": "2024-03-01T10:00:00Z" },
            { "user": { "login": "b" }, "body": "", "state": "PENDING" },
            { "user": null, "body": "ghost", "state": "COMMENTED", "submitted_at": "2024-03-01T11:00:00Z" }
        ]);
        let _mock = server
            .mock("GET", "/repos/electron/electron/pulls/9/reviews")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;
        let conn = GithubConnection::new(Client::new(), &server.url(), "token");
        let reviews = list_reviews(&conn, &RepoRef::new("electron", "electron"), 9).await.expect("reviews");
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].author(), "a");
        assert_eq!(reviews[0].state(), Some(ReviewState::Approved));
    }

    #[tokio::test]
    async fn test_comments_use_edit_time() {
        let mut server = mockito::Server::new_async().await;
        let body = json!([
            { "user": { "login": "a" }, "body": "API LGTM", "created_at": "2024-03-01T10:00:00Z", "updated_at": "2024-03-03T10:00:00Z" }
        ]);
        let _mock = server
            .mock("GET", "/repos/electron/electron/issues/9/comments")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;
        let conn = GithubConnection::new(Client::new(), &server.url(), "token");
        let comments = list_issue_comments(&conn, &RepoRef::new("electron", "electron"), 9)
            .await
            .expect("comments");
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].submitted_at().to_rfc3339(), "2024-03-03T10:00:00+00:00");
        assert_eq!(comments[0].state(), None);
    }
}
