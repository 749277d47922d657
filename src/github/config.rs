use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK, USER_AGENT};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::api::GithubError;

const USER_AGENT_VALUE: &str = "pr-gate governance bot";
const ACCEPT_VALUE: &str = "application/vnd.github+json";
pub const PER_PAGE: &str = "100";

/// Authenticated handle to the REST API for one principal (app JWT or installation token).
#[derive(Debug, Clone)]
pub struct GithubConnection {
    client: Client,
    base_url: String,
    access_token: String,
}

impl GithubConnection {
    pub fn new(client: Client, base_url: &str, access_token: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn access_token(&self) -> &String {
        &self.access_token
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub fn prepare_headers(access_token: &str) -> Result<HeaderMap, GithubError> {
    let mut headers = HeaderMap::new();
    let auth_header = HeaderValue::from_str(&format!("Bearer {}", access_token)).map_err(|e| {
        log::error!("[prepare_headers] Invalid auth header: {:?}", e);
        GithubError::Auth("access token is not a valid header value".to_string())
    })?;
    headers.insert(AUTHORIZATION, auth_header);
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
    Ok(headers)
}

async fn check_status(url: &str, response: Response) -> Result<Response, GithubError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GithubError::Status {
        url: url.to_string(),
        status: status.as_u16(),
        body,
    })
}

pub async fn get_api_response(
    conn: &GithubConnection,
    url: &str,
    params: &[(&str, &str)],
) -> Result<Response, GithubError> {
    let headers = prepare_headers(conn.access_token())?;
    let response = conn
        .client()
        .get(url)
        .headers(headers)
        .query(params)
        .send()
        .await
        .map_err(|source| GithubError::Transport { url: url.to_string(), source })?;
    check_status(url, response).await
}

pub async fn deserialize_response<T: DeserializeOwned>(url: &str, response: Response) -> Result<T, GithubError> {
    response.json::<T>().await.map_err(|e| {
        log::error!("[deserialize_response] Unable to deserialize response from {}: {:?}", url, e);
        GithubError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        }
    })
}

pub async fn get_json<T: DeserializeOwned>(
    conn: &GithubConnection,
    url: &str,
    params: &[(&str, &str)],
) -> Result<T, GithubError> {
    let response = get_api_response(conn, url, params).await?;
    deserialize_response(url, response).await
}

/// Follows `Link: rel="next"` until exhausted, returning one JSON value per page.
pub async fn get_api_paginated(
    conn: &GithubConnection,
    url: &str,
    params: &[(&str, &str)],
) -> Result<Vec<Value>, GithubError> {
    let mut values = Vec::<Value>::new();
    let mut next_url: Option<String> = None;
    loop {
        let response = match &next_url {
            None => get_api_response(conn, url, params).await?,
            // The next link already carries the query string.
            Some(next) => get_api_response(conn, next, &[]).await?,
        };
        let following = extract_next_url(&response);
        let page: Value = deserialize_response(url, response).await?;
        values.push(page);
        if following.is_none() {
            break;
        }
        next_url = following;
    }
    log::debug!("[get_api_paginated] Fetched {} pages from {}", values.len(), url);
    Ok(values)
}

/// Flattens paginated pages that are plain JSON arrays.
pub fn flatten_array_pages(pages: Vec<Value>) -> Vec<Value> {
    pages
        .into_iter()
        .filter_map(|page| match page {
            Value::Array(items) => Some(items),
            other => {
                log::error!("[flatten_array_pages] Expected array page, got: {:?}", &other);
                None
            }
        })
        .flatten()
        .collect()
}

/// Flattens paginated pages that wrap their items under `key`.
pub fn flatten_keyed_pages(pages: Vec<Value>, key: &str) -> Vec<Value> {
    pages
        .into_iter()
        .filter_map(|mut page| match page.get_mut(key).map(Value::take) {
            Some(Value::Array(items)) => Some(items),
            _ => {
                log::error!("[flatten_keyed_pages] Page has no {} array: {:?}", key, &page);
                None
            }
        })
        .flatten()
        .collect()
}

pub async fn send_json(
    conn: &GithubConnection,
    method: Method,
    url: &str,
    body: &Value,
) -> Result<Response, GithubError> {
    let headers = prepare_headers(conn.access_token())?;
    let response = conn
        .client()
        .request(method, url)
        .headers(headers)
        .json(body)
        .send()
        .await
        .map_err(|source| GithubError::Transport { url: url.to_string(), source })?;
    check_status(url, response).await
}

pub async fn send_delete(conn: &GithubConnection, url: &str) -> Result<Response, GithubError> {
    let headers = prepare_headers(conn.access_token())?;
    let response = conn
        .client()
        .delete(url)
        .headers(headers)
        .send()
        .await
        .map_err(|source| GithubError::Transport { url: url.to_string(), source })?;
    check_status(url, response).await
}

fn extract_next_url(response: &Response) -> Option<String> {
    let link_header = response.headers().get(LINK)?;
    let header_value = link_header.to_str().ok()?;
    let next_url = header_value
        .split(',')
        .find(|part| part.contains(r#"rel="next""#))
        .and_then(|next_link_part| next_link_part.split(';').next())
        .map(|url| url.trim_matches(&[' ', '<', '>', '"'] as &[_]).to_string());
    if next_url.as_deref() == Some("null") {
        return None;
    }
    next_url
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_api_paginated_follows_link_header() {
        let mut server = mockito::Server::new_async().await;
        let next = format!("<{}/items?page=2>; rel=\"next\"", server.url());
        let first = server
            .mock("GET", "/items")
            .match_query(mockito::Matcher::UrlEncoded("per_page".into(), "100".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_header("link", &next)
            .with_body(json!([1, 2]).to_string())
            .create_async()
            .await;
        let second = server
            .mock("GET", "/items")
            .match_query(mockito::Matcher::UrlEncoded("page".into(), "2".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!([3]).to_string())
            .create_async()
            .await;
        let conn = GithubConnection::new(Client::new(), &server.url(), "token");
        let pages = get_api_paginated(&conn, &conn.url("/items"), &[("per_page", PER_PAGE)])
            .await
            .expect("pages");
        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(flatten_array_pages(pages), vec![json!(1), json!(2), json!(3)]);
    }

    #[tokio::test]
    async fn test_error_status_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .with_body("{\"message\":\"Not Found\"}")
            .create_async()
            .await;
        let conn = GithubConnection::new(Client::new(), &server.url(), "token");
        let err = get_api_response(&conn, &conn.url("/missing"), &[]).await.expect_err("404");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_flatten_keyed_pages() {
        let pages = vec![json!({ "total_count": 2, "check_runs": [{ "id": 1 }] }), json!({ "check_runs": [{ "id": 2 }] })];
        let items = flatten_keyed_pages(pages, "check_runs");
        assert_eq!(items.len(), 2);
    }
}
