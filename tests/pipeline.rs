//! End-to-end tests: a local HTTP server stands in for article sites and for
//! the Gemini endpoint.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use briefly::config::{GeminiConfig, HttpConfig};
use briefly::prompt::{truncate_text, MAX_ARTICLE_CHARS};
use briefly::retry::Sleeper;
use briefly::{
    BackendError, ExtractionError, Extractor, GeminiClient, GenerativeBackend, ModelCandidates,
    Summarizer, SummaryRequest,
};

struct Response {
    status: u16,
    content_type: &'static str,
    body: String,
}

impl Response {
    fn html(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: "text/html; charset=utf-8",
            body: body.into(),
        }
    }

    fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_string(),
        }
    }
}

type Handler = Arc<dyn Fn(&str) -> Response + Send + Sync>;

async fn serve(handler: Handler) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let handler = handler.clone();
            tokio::spawn(handle(stream, handler));
        }
    });
    addr
}

async fn handle(mut stream: TcpStream, handler: Handler) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }

    let path = head.split_whitespace().nth(1).unwrap_or("/").to_string();
    let response = handler(&path);
    let raw = format!(
        "HTTP/1.1 {} X\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        response.status,
        response.content_type,
        response.body.len(),
        response.body
    );
    let _ = stream.write_all(raw.as_bytes()).await;
    let _ = stream.shutdown().await;
}

/// Backend that replays canned responses and records every prompt.
struct FakeBackend {
    responses: Mutex<VecDeque<Result<String, BackendError>>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeBackend {
    fn new(responses: Vec<Result<String, BackendError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeBackend for FakeBackend {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, BackendError> {
        self.calls
            .lock()
            .unwrap()
            .push((model.to_string(), prompt.to_string()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Transport("script exhausted".into())))
    }
}

#[derive(Clone, Default)]
struct RecordingSleeper(Arc<Mutex<Vec<Duration>>>);

impl RecordingSleeper {
    fn slept(&self) -> Vec<Duration> {
        self.0.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.0.lock().unwrap().push(duration);
    }
}

fn gemini_config(base_url: &str) -> GeminiConfig {
    GeminiConfig {
        api_key: "test-key".into(),
        model: None,
        fallback_model: None,
        max_retries: 2,
        base_url: base_url.into(),
    }
}

fn summary_value(url: &str, categories: &[&str]) -> Value {
    let points: Vec<Value> = (0..10)
        .map(|i| {
            if i % 2 == 0 {
                json!({ "heading": format!("Point {i}"), "bullets": ["first", "second"] })
            } else {
                json!({ "heading": format!("Point {i}"), "paragraph": "One short paragraph." })
            }
        })
        .collect();
    json!({
        "author": null,
        "title": "Telescope sees first light",
        "url": url,
        "points": points,
        "categories": categories,
    })
}

fn gemini_reply(text: &str) -> Value {
    json!({ "candidates": [ { "content": { "parts": [ { "text": text } ] } } ] })
}

const SENTENCE: &str = "The observatory team spent the night calibrating mirrors and logging \
    faint signals from distant galaxies. ";

fn article_page(paragraphs: usize) -> String {
    let body: String = (0..paragraphs)
        .map(|_| format!("<p>{}</p>", SENTENCE.repeat(10)))
        .collect();
    format!(
        r#"<html><head><title>New telescope sees first light | Example News</title>
        <meta property="og:image" content="/images/og.jpg"></head>
        <body><nav><a href="/">Home</a><a href="/world">World</a></nav>
        <article><h1>First light</h1>{body}<img src="/images/inline.jpg"></article>
        <footer>Copyright Example News</footer></body></html>"#
    )
}

fn site_handler() -> Handler {
    Arc::new(|path: &str| match path {
        "/long" => Response::html(article_page(40)),
        "/short" => Response::html(article_page(2)),
        "/boilerplate" => Response::html(
            "<html><body><nav><ul><li><a href='/a'>Section A with a long label</a></li>\
             <li><a href='/b'>Section B with a long label</a></li></ul></nav>\
             <div class='sidebar-ad'><a href='/subscribe'>Subscribe now for unlimited access today</a></div>\
             </body></html>",
        ),
        _ => Response {
            status: 404,
            content_type: "text/plain",
            body: "not found".into(),
        },
    })
}

#[tokio::test]
async fn long_article_reaches_the_model_truncated() {
    let addr = serve(site_handler()).await;
    let url = format!("http://{addr}/long");

    let extractor = Extractor::new(&HttpConfig::default()).unwrap();
    let article = extractor.extract(&url).await.unwrap().unwrap();
    assert!(article.text.chars().count() > 2 * MAX_ARTICLE_CHARS);
    assert_eq!(article.title, "New telescope sees first light");
    assert_eq!(
        article.image_url,
        Some(format!("http://{addr}/images/og.jpg"))
    );

    let backend = FakeBackend::new(vec![Ok(
        summary_value(&url, &["astronomy", "Not A Category"]).to_string()
    )]);
    let sleeper = RecordingSleeper::default();
    let summarizer = Summarizer::new(backend.clone(), &gemini_config("http://unused"))
        .with_sleeper(sleeper.clone());

    let request = SummaryRequest::new(article.title.clone(), url.clone(), article.text.clone());
    let summary = summarizer.summarize(&request).await.unwrap();

    assert_eq!(summary.url, url);
    assert_eq!(summary.categories, vec!["Astronomy"]);
    assert_eq!(summary.model_used, "gemini-2.5-flash");
    assert!(sleeper.slept().is_empty());

    let calls = backend.calls();
    assert_eq!(calls.len(), 1);
    let (_, body) = calls[0].1.rsplit_once("Article text:\n").unwrap();
    assert_eq!(body.chars().count(), MAX_ARTICLE_CHARS);
    assert_eq!(body, truncate_text(&article.text));
}

#[tokio::test]
async fn boilerplate_page_yields_no_article() {
    let addr = serve(site_handler()).await;
    let extractor = Extractor::new(&HttpConfig::default()).unwrap();
    let article = extractor
        .extract(&format!("http://{addr}/boilerplate"))
        .await
        .unwrap();
    assert_eq!(article, None);
}

#[tokio::test]
async fn http_error_status_is_a_network_error() {
    let addr = serve(site_handler()).await;
    let extractor = Extractor::new(&HttpConfig::default()).unwrap();
    let err = extractor
        .extract(&format!("http://{addr}/missing"))
        .await
        .unwrap_err();
    match err {
        ExtractionError::Network { url, source } => {
            assert!(url.ends_with("/missing"));
            assert_eq!(source.status().map(|s| s.as_u16()), Some(404));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn gemini_rate_limit_honours_retry_info() {
    let article_url = "https://example.com/story";
    let hits = Arc::new(Mutex::new(Vec::<String>::new()));
    let recorded = hits.clone();
    let handler: Handler = Arc::new(move |path: &str| {
        let mut hits = recorded.lock().unwrap();
        hits.push(path.to_string());
        if hits.len() == 1 {
            Response::json(
                429,
                json!({ "error": {
                    "code": 429,
                    "message": "Resource has been exhausted (e.g. check quota).",
                    "status": "RESOURCE_EXHAUSTED",
                    "details": [ {
                        "@type": "type.googleapis.com/google.rpc.RetryInfo",
                        "retryDelay": "3s"
                    } ]
                } }),
            )
        } else {
            let summary = summary_value(article_url, &["Artificial Intelligence"]).to_string();
            Response::json(200, gemini_reply(&format!("```json\n{summary}\n```")))
        }
    });
    let addr = serve(handler).await;

    let config = gemini_config(&format!("http://{addr}"));
    let sleeper = RecordingSleeper::default();
    let summarizer = Summarizer::new(GeminiClient::new(&config).unwrap(), &config)
        .with_candidates(ModelCandidates::from_names(["primary-model", "backup-model"]))
        .with_sleeper(sleeper.clone());

    let request = SummaryRequest::new("Story", article_url, "Some article text.");
    let summary = summarizer.summarize(&request).await.unwrap();

    assert_eq!(summary.model_used, "primary-model");
    assert_eq!(sleeper.slept(), vec![Duration::from_secs(3)]);
    assert_eq!(
        hits.lock().unwrap().as_slice(),
        [
            "/v1beta/models/primary-model:generateContent",
            "/v1beta/models/primary-model:generateContent",
        ]
    );
}

#[tokio::test]
async fn gemini_not_found_falls_back_without_waiting() {
    let article_url = "https://example.com/story";
    let hits = Arc::new(Mutex::new(Vec::<String>::new()));
    let recorded = hits.clone();
    let handler: Handler = Arc::new(move |path: &str| {
        recorded.lock().unwrap().push(path.to_string());
        if path.contains("primary-model") {
            Response::json(
                404,
                json!({ "error": {
                    "code": 404,
                    "message": "models/primary-model is not found for API version v1beta",
                    "status": "NOT_FOUND"
                } }),
            )
        } else {
            let summary = summary_value(article_url, &[]).to_string();
            Response::json(200, gemini_reply(&summary))
        }
    });
    let addr = serve(handler).await;

    let config = gemini_config(&format!("http://{addr}"));
    let sleeper = RecordingSleeper::default();
    let summarizer = Summarizer::new(GeminiClient::new(&config).unwrap(), &config)
        .with_candidates(ModelCandidates::from_names(["primary-model", "backup-model"]))
        .with_sleeper(sleeper.clone());

    let request = SummaryRequest::new("Story", article_url, "Some article text.");
    let summary = summarizer.summarize(&request).await.unwrap();

    assert_eq!(summary.model_used, "backup-model");
    assert_eq!(summary.categories, vec!["Miscellaneous"]);
    assert!(sleeper.slept().is_empty());
    assert_eq!(hits.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn batch_of_extracted_articles_keeps_input_order() {
    let addr = serve(site_handler()).await;
    let extractor = Extractor::new(&HttpConfig::default()).unwrap();

    let urls = [format!("http://{addr}/short"), format!("http://{addr}/long")];
    let mut requests = Vec::new();
    for url in &urls {
        let article = extractor.extract(url).await.unwrap().unwrap();
        requests.push(SummaryRequest::new(article.title, url.clone(), article.text));
    }

    let reply = Value::Array(
        urls.iter()
            .map(|u| summary_value(u, &["Astronomy"]))
            .collect(),
    )
    .to_string();
    let backend = FakeBackend::new(vec![Ok(reply)]);
    let summarizer = Summarizer::new(backend.clone(), &gemini_config("http://unused"))
        .with_sleeper(RecordingSleeper::default());

    let summaries = summarizer.summarize_batch(&requests).await.unwrap();
    let returned: Vec<&str> = summaries.iter().map(|s| s.url.as_str()).collect();
    assert_eq!(returned, [urls[0].as_str(), urls[1].as_str()]);
    assert!(summaries.iter().all(|s| s.model_used == "gemini-2.5-flash"));

    let calls = backend.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].1.contains("Article #1:"));
    assert!(calls[0].1.contains("Article #2:"));
}
