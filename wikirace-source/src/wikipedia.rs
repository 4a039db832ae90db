use crate::error::{Result, SourceError};
use crate::limiter::RateLimiter;
use crate::result::{FetchOutcome, normalize_links};
use crate::source::LinkSource;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

pub const DEFAULT_LANG: &str = "uk";
pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 100;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Connection settings for [`WikipediaSource`].
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Language edition, used to build `https://{lang}.wikipedia.org/w/api.php`.
    pub lang: String,
    /// Overrides the endpoint derived from `lang`.
    pub api_url: Option<String>,
    pub requests_per_minute: u32,
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            lang: DEFAULT_LANG.to_string(),
            api_url: None,
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl SourceConfig {
    pub fn endpoint(&self) -> Result<Url> {
        let raw = match &self.api_url {
            Some(url) => url.clone(),
            None => format!("https://{}.wikipedia.org/w/api.php", self.lang),
        };
        Url::parse(&raw).map_err(|e| SourceError::InvalidUrl(format!("{}: {}", raw, e)))
    }
}

/// MediaWiki Action API client returning the article links of a page.
pub struct WikipediaSource {
    client: Client,
    api_url: Url,
    limiter: RateLimiter,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    query: Option<QueryBody>,
    #[serde(rename = "continue", default)]
    continuation: Option<HashMap<String, String>>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    #[serde(default)]
    info: String,
}

#[derive(Debug, Default, Deserialize)]
struct QueryBody {
    #[serde(default)]
    normalized: Vec<TitleMapping>,
    #[serde(default)]
    redirects: Vec<TitleMapping>,
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct TitleMapping {
    to: String,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    #[serde(default)]
    links: Vec<PageLink>,
    #[serde(default)]
    pageprops: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct PageLink {
    title: String,
}

impl WikipediaSource {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent("wikirace/0.1 (https://github.com/trapdoorsec/wikirace)")
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs.div_ceil(2)))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        let api_url = config.endpoint()?;
        info!(
            "Link source at {} ({} requests/min)",
            api_url, config.requests_per_minute
        );

        Ok(Self {
            client,
            api_url,
            limiter: RateLimiter::per_minute(config.requests_per_minute),
        })
    }

    fn query_url(&self, title: &str, continuation: &HashMap<String, String>) -> Url {
        let mut url = self.api_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("action", "query")
                .append_pair("format", "json")
                .append_pair("formatversion", "2")
                .append_pair("prop", "links|pageprops")
                .append_pair("ppprop", "disambiguation")
                .append_pair("plnamespace", "0")
                .append_pair("pllimit", "max")
                .append_pair("redirects", "1")
                .append_pair("titles", title);
            for (key, value) in continuation {
                pairs.append_pair(key, value);
            }
        }
        url
    }

    async fn query(
        &self,
        title: &str,
        continuation: &HashMap<String, String>,
    ) -> Result<QueryResponse> {
        self.limiter.acquire().await;

        let url = self.query_url(title, continuation);
        debug!("Fetching {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                title: title.to_string(),
            });
        }

        let body = response.text().await?;
        let parsed: QueryResponse = serde_json::from_str(&body)
            .map_err(|e| SourceError::ParseError(format!("'{}': {}", title, e)))?;

        if let Some(error) = parsed.error {
            return Err(SourceError::Api {
                code: error.code,
                info: error.info,
            });
        }

        Ok(parsed)
    }

    async fn fetch_links(&self, title: &str, cap: usize) -> Result<FetchOutcome> {
        let mut links: Vec<String> = Vec::new();
        let mut aliases: Vec<String> = Vec::new();
        let mut continuation = HashMap::new();

        loop {
            let response = self.query(title, &continuation).await?;
            let body = response.query.unwrap_or_default();

            aliases.extend(body.normalized.into_iter().map(|m| m.to));
            aliases.extend(body.redirects.into_iter().map(|m| m.to));

            let Some(page) = body.pages.into_iter().next() else {
                return Err(SourceError::ParseError(format!(
                    "'{}': response carries no page",
                    title
                )));
            };

            if page.missing || page.invalid {
                debug!("'{}' does not exist", title);
                return Ok(FetchOutcome::NotFound);
            }
            if page.pageprops.contains_key("disambiguation") {
                debug!("'{}' is a disambiguation page", title);
                return Ok(FetchOutcome::Ambiguous);
            }
            if page.title != title && !aliases.contains(&page.title) {
                aliases.push(page.title);
            }

            links.extend(page.links.into_iter().map(|l| l.title));

            // room for the self-link and aliases that normalization drops
            if links.len() > cap + aliases.len() {
                break;
            }
            match response.continuation {
                Some(next) if next.contains_key("plcontinue") => continuation = next,
                _ => break,
            }
        }

        let alias_refs: Vec<&str> = aliases.iter().map(String::as_str).collect();
        let links = normalize_links(title, &alias_refs, links, cap);
        if links.is_empty() {
            warn!("'{}' has no article links", title);
        }
        Ok(FetchOutcome::Links(links))
    }
}

impl LinkSource for WikipediaSource {
    async fn fetch(&self, title: &str, cap: usize) -> Result<FetchOutcome> {
        self.fetch_links(title, cap).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, query_param},
    };

    fn source_for(server: &MockServer) -> WikipediaSource {
        let config = SourceConfig {
            api_url: Some(format!("{}/w/api.php", server.uri())),
            requests_per_minute: 0,
            ..SourceConfig::default()
        };
        WikipediaSource::new(&config).unwrap()
    }

    fn page_with_links(title: &str, links: &[&str]) -> serde_json::Value {
        json!({
            "batchcomplete": true,
            "query": {
                "pages": [{
                    "pageid": 1,
                    "ns": 0,
                    "title": title,
                    "links": links.iter().map(|l| json!({"ns": 0, "title": l})).collect::<Vec<_>>()
                }]
            }
        })
    }

    #[test]
    fn test_endpoint_from_lang() {
        let config = SourceConfig {
            lang: "en".to_string(),
            ..SourceConfig::default()
        };
        assert_eq!(
            config.endpoint().unwrap().as_str(),
            "https://en.wikipedia.org/w/api.php"
        );
    }

    #[test]
    fn test_endpoint_override_rejects_garbage() {
        let config = SourceConfig {
            api_url: Some("not a url".to_string()),
            ..SourceConfig::default()
        };
        assert!(matches!(config.endpoint(), Err(SourceError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_links_are_normalized_and_capped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("titles", "Дружба"))
            .and(query_param("prop", "links|pageprops"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_with_links(
                "Дружба",
                &["Дружба", "Якопо Понтормо", "Любов", "Повага"],
            )))
            .mount(&server)
            .await;

        let source = source_for(&server);
        let outcome = source.fetch("Дружба", 2).await.unwrap();

        assert_eq!(
            outcome,
            FetchOutcome::Links(vec!["Якопо Понтормо".to_string(), "Любов".to_string()])
        );
    }

    #[tokio::test]
    async fn test_missing_page_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "batchcomplete": true,
                "query": {"pages": [{"ns": 0, "title": "123AAA", "missing": true}]}
            })))
            .mount(&server)
            .await;

        let outcome = source_for(&server).fetch("123AAA", 200).await.unwrap();
        assert_eq!(outcome, FetchOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_disambiguation_page_is_ambiguous() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "batchcomplete": true,
                "query": {"pages": [{
                    "pageid": 7,
                    "ns": 0,
                    "title": "Марка",
                    "pageprops": {"disambiguation": ""},
                    "links": [{"ns": 0, "title": "Марка (грошова одиниця)"}]
                }]}
            })))
            .mount(&server)
            .await;

        let outcome = source_for(&server).fetch("Марка", 200).await.unwrap();
        assert_eq!(outcome, FetchOutcome::Ambiguous);
    }

    #[tokio::test]
    async fn test_redirect_target_counts_as_self_link() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "batchcomplete": true,
                "query": {
                    "redirects": [{"from": "Roma", "to": "Рим"}],
                    "pages": [{
                        "pageid": 3,
                        "ns": 0,
                        "title": "Рим",
                        "links": [{"ns": 0, "title": "Рим"}, {"ns": 0, "title": "Італія"}]
                    }]
                }
            })))
            .mount(&server)
            .await;

        let outcome = source_for(&server).fetch("Roma", 200).await.unwrap();
        assert_eq!(outcome, FetchOutcome::Links(vec!["Італія".to_string()]));
    }

    #[tokio::test]
    async fn test_continuation_is_followed() {
        let server = MockServer::start().await;

        let mut first = page_with_links("Бароко", &["Архітектура", "Живопис"]);
        first["continue"] = json!({"plcontinue": "42|0|Музика", "continue": "||"});

        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("plcontinue", "42|0|Музика"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(page_with_links("Бароко", &["Музика", "Пілястра"])),
            )
            .with_priority(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .respond_with(ResponseTemplate::new(200).set_body_json(first))
            .mount(&server)
            .await;

        let outcome = source_for(&server).fetch("Бароко", 200).await.unwrap();
        assert_eq!(
            outcome.into_links(),
            vec!["Архітектура", "Живопис", "Музика", "Пілястра"]
        );
    }

    #[tokio::test]
    async fn test_server_error_is_transient_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = source_for(&server).fetch("Рим", 200).await.unwrap_err();
        assert!(matches!(err, SourceError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_api_error_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": {"code": "ratelimited", "info": "slow down"}
            })))
            .mount(&server)
            .await;

        let err = source_for(&server).fetch("Рим", 200).await.unwrap_err();
        assert!(matches!(err, SourceError::Api { ref code, .. } if code == "ratelimited"));
    }
}
