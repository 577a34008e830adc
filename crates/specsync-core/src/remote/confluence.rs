use super::{decode, send, DocsApi, PageRef, RemoteResult, SpaceInfo};
use crate::config::AtlassianConfig;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;

const SERVICE: &str = "confluence";

/// Blocking client for the Confluence REST API (`/wiki/rest/api`).
#[derive(Debug, Clone)]
pub struct ConfluenceClient {
    base_url: String,
    email: String,
    api_token: String,
    http: Client,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    id: String,
    title: String,
    #[serde(default)]
    version: Option<VersionResponse>,
    #[serde(default, rename = "_links")]
    links: Option<LinksResponse>,
}

#[derive(Deserialize)]
struct VersionResponse {
    number: u32,
}

#[derive(Deserialize)]
struct LinksResponse {
    webui: Option<String>,
}

impl From<ContentResponse> for PageRef {
    fn from(c: ContentResponse) -> Self {
        PageRef {
            id: c.id,
            title: c.title,
            version: c.version.map(|v| v.number).unwrap_or(1),
            web_path: c.links.and_then(|l| l.webui),
        }
    }
}

impl ConfluenceClient {
    /// `site_url` is the Atlassian site root, e.g. `https://acme.atlassian.net`.
    pub fn new(
        site_url: impl AsRef<str>,
        email: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Self {
        Self {
            base_url: format!("{}/wiki/rest/api", site_url.as_ref().trim_end_matches('/')),
            email: email.into(),
            api_token: api_token.into(),
            http: Client::new(),
        }
    }

    pub fn from_config(cfg: &AtlassianConfig) -> Self {
        Self::new(&cfg.url, &cfg.email, &cfg.api_token)
    }

    fn get(&self, path: &str) -> reqwest::blocking::RequestBuilder {
        self.http
            .get(format!("{}{path}", self.base_url))
            .basic_auth(&self.email, Some(&self.api_token))
    }

    fn post(&self, path: &str) -> reqwest::blocking::RequestBuilder {
        self.http
            .post(format!("{}{path}", self.base_url))
            .basic_auth(&self.email, Some(&self.api_token))
    }

    fn put(&self, path: &str) -> reqwest::blocking::RequestBuilder {
        self.http
            .put(format!("{}{path}", self.base_url))
            .basic_auth(&self.email, Some(&self.api_token))
    }
}

impl DocsApi for ConfluenceClient {
    fn get_space(&self, key: &str) -> RemoteResult<SpaceInfo> {
        let response = send(SERVICE, self.get(&format!("/space/{key}")))?;
        decode(SERVICE, response)
    }

    fn find_page(&self, space: &str, title: &str) -> RemoteResult<Option<PageRef>> {
        let request = self.get("/content").query(&[
            ("spaceKey", space),
            ("title", title),
            ("expand", "version"),
        ]);
        let response: SearchResponse = decode(SERVICE, send(SERVICE, request)?)?;
        Ok(response.results.into_iter().next().map(PageRef::from))
    }

    fn create_page(
        &self,
        space: &str,
        title: &str,
        body: &str,
        labels: &[String],
    ) -> RemoteResult<PageRef> {
        let payload = json!({
            "type": "page",
            "title": title,
            "space": { "key": space },
            "body": { "storage": { "value": body, "representation": "storage" } },
            "metadata": {
                "labels": labels.iter().map(|l| json!({ "name": l })).collect::<Vec<_>>()
            }
        });
        let response = send(SERVICE, self.post("/content").json(&payload))?;
        let content: ContentResponse = decode(SERVICE, response)?;
        Ok(content.into())
    }

    fn update_page(
        &self,
        page_id: &str,
        title: &str,
        body: &str,
        current_version: u32,
    ) -> RemoteResult<PageRef> {
        let payload = json!({
            "version": { "number": current_version + 1 },
            "title": title,
            "type": "page",
            "body": { "storage": { "value": body, "representation": "storage" } }
        });
        let response = send(SERVICE, self.put(&format!("/content/{page_id}")).json(&payload))?;
        let content: ContentResponse = decode(SERVICE, response)?;
        Ok(content.into())
    }

    fn add_labels(&self, page_id: &str, labels: &[String]) -> RemoteResult<()> {
        if labels.is_empty() {
            return Ok(());
        }
        let payload: Vec<_> = labels
            .iter()
            .map(|l| json!({ "prefix": "global", "name": l }))
            .collect();
        send(
            SERVICE,
            self.post(&format!("/content/{page_id}/label")).json(&payload),
        )
        .map(|_| ())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
