use super::{decode, send, IssueRef, ProjectInfo, RemoteResult, TrackerApi};
use crate::config::AtlassianConfig;
use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::Value;

const SERVICE: &str = "jira";

/// Maximum issues fetched per search. Features with more stories than this
/// will see older ones treated as absent.
const MAX_RESULTS: &str = "100";

/// Blocking client for the Jira Cloud REST API v3.
#[derive(Debug, Clone)]
pub struct JiraClient {
    base_url: String,
    email: String,
    api_token: String,
    http: Client,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    issues: Vec<IssueResponse>,
}

#[derive(Deserialize)]
struct IssueResponse {
    key: String,
    #[serde(default)]
    fields: Option<IssueFields>,
}

#[derive(Deserialize, Default)]
struct IssueFields {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    labels: Vec<String>,
}

impl From<IssueResponse> for IssueRef {
    fn from(issue: IssueResponse) -> Self {
        let fields = issue.fields.unwrap_or_default();
        IssueRef {
            key: issue.key,
            summary: fields.summary.unwrap_or_default(),
            labels: fields.labels,
        }
    }
}

impl JiraClient {
    pub fn new(
        site_url: impl AsRef<str>,
        email: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Self {
        Self {
            base_url: format!("{}/rest/api/3", site_url.as_ref().trim_end_matches('/')),
            email: email.into(),
            api_token: api_token.into(),
            http: Client::new(),
        }
    }

    pub fn from_config(cfg: &AtlassianConfig) -> Self {
        Self::new(&cfg.url, &cfg.email, &cfg.api_token)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.basic_auth(&self.email, Some(&self.api_token))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl TrackerApi for JiraClient {
    fn get_project(&self, key: &str) -> RemoteResult<ProjectInfo> {
        let request = self.authed(self.http.get(self.url(&format!("/project/{key}"))));
        decode(SERVICE, send(SERVICE, request)?)
    }

    fn search_issues(&self, jql: &str) -> RemoteResult<Vec<IssueRef>> {
        let request = self
            .authed(self.http.get(self.url("/search")))
            .query(&[("jql", jql), ("maxResults", MAX_RESULTS)]);
        let response: SearchResponse = decode(SERVICE, send(SERVICE, request)?)?;
        Ok(response.issues.into_iter().map(IssueRef::from).collect())
    }

    fn create_issue(&self, payload: &Value) -> RemoteResult<IssueRef> {
        let request = self.authed(self.http.post(self.url("/issue"))).json(payload);
        let created: IssueResponse = decode(SERVICE, send(SERVICE, request)?)?;
        let mut issue = IssueRef::from(created);
        // The create response carries only id/key/self.
        if issue.summary.is_empty() {
            if let Some(summary) = payload.pointer("/fields/summary").and_then(Value::as_str) {
                issue.summary = summary.to_string();
            }
        }
        Ok(issue)
    }

    fn update_issue(&self, key: &str, payload: &Value) -> RemoteResult<()> {
        let request = self
            .authed(self.http.put(self.url(&format!("/issue/{key}"))))
            .json(payload);
        send(SERVICE, request).map(|_| ())
    }
}
