//! Scripted fakes for the network seams.
//!
//! `MockFetcher` answers registered URLs and records every request;
//! `MockCompletion` replays scripted classifier responses in order. Both are
//! cheap to share across tasks, so tests can drive the whole pipeline
//! without a socket.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::completion::TextCompletion;
use crate::error::{CompletionError, FetchError};
use crate::fetch::{FetchedPage, Fetcher};

#[derive(Clone)]
enum Scripted {
    Page(FetchedPage),
    Timeout,
    Transport,
}

/// A fetcher that serves registered responses and 404s everything else.
#[derive(Clone, Default)]
pub struct MockFetcher {
    responses: Arc<Mutex<HashMap<String, Scripted>>>,
    log: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a 200 HTML page.
    pub fn with_page(self, url: &str, body: &str) -> Self {
        self.register(
            url,
            Scripted::Page(FetchedPage {
                url: url.to_string(),
                status: 200,
                body: body.to_string(),
            }),
        )
    }

    /// Register a 200 JSON payload.
    pub fn with_json(self, url: &str, body: &serde_json::Value) -> Self {
        self.register(
            url,
            Scripted::Page(FetchedPage {
                url: url.to_string(),
                status: 200,
                body: body.to_string(),
            }),
        )
    }

    /// Register a bare status with an empty body.
    pub fn with_status(self, url: &str, status: u16) -> Self {
        self.register(
            url,
            Scripted::Page(FetchedPage {
                url: url.to_string(),
                status,
                body: String::new(),
            }),
        )
    }

    /// Register a response whose final URL differs (a redirect).
    pub fn with_redirect(self, url: &str, final_url: &str, status: u16, body: &str) -> Self {
        self.register(
            url,
            Scripted::Page(FetchedPage {
                url: final_url.to_string(),
                status,
                body: body.to_string(),
            }),
        )
    }

    /// Make a URL time out.
    pub fn with_timeout(self, url: &str) -> Self {
        self.register(url, Scripted::Timeout)
    }

    /// Make a URL fail at the transport level.
    pub fn with_transport_error(self, url: &str) -> Self {
        self.register(url, Scripted::Transport)
    }

    fn register(self, url: &str, scripted: Scripted) -> Self {
        self.responses
            .lock()
            .expect("mock lock")
            .insert(url.to_string(), scripted);
        self
    }

    /// Every URL requested so far, in order.
    pub fn fetched(&self) -> Vec<String> {
        self.log.lock().expect("mock lock").clone()
    }

    fn lookup(&self, url: &str) -> Result<FetchedPage, FetchError> {
        self.log.lock().expect("mock lock").push(url.to_string());
        match self.responses.lock().expect("mock lock").get(url) {
            Some(Scripted::Page(page)) => Ok(page.clone()),
            Some(Scripted::Timeout) => Err(FetchError::Timeout {
                url: url.to_string(),
            }),
            Some(Scripted::Transport) => Err(FetchError::Transport {
                url: url.to_string(),
                source: "connection refused".into(),
            }),
            None => Ok(FetchedPage {
                url: url.to_string(),
                status: 404,
                body: String::new(),
            }),
        }
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn get(&self, url: &str) -> Result<FetchedPage, FetchError> {
        self.lookup(url)
    }

    async fn head(&self, url: &str) -> Result<FetchedPage, FetchError> {
        self.lookup(url).map(|mut page| {
            page.body = String::new();
            page
        })
    }
}

enum ScriptedCompletion {
    Response(String),
    RateLimited,
    Failure(String),
}

/// A completion service replaying scripted responses in push order.
///
/// Panics when called with nothing scripted - that makes "the classifier
/// must not be invoked" assertions implicit in any test that registers no
/// responses.
#[derive(Default)]
pub struct MockCompletion {
    responses: Mutex<VecDeque<ScriptedCompletion>>,
    calls: AtomicUsize,
}

impl MockCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(self, raw: &str) -> Self {
        self.push(ScriptedCompletion::Response(raw.to_string()))
    }

    pub fn push_rate_limited(self) -> Self {
        self.push(ScriptedCompletion::RateLimited)
    }

    pub fn push_failure(self, message: &str) -> Self {
        self.push(ScriptedCompletion::Failure(message.to_string()))
    }

    fn push(self, scripted: ScriptedCompletion) -> Self {
        self.responses.lock().expect("mock lock").push_back(scripted);
        self
    }

    /// Number of completions requested so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextCompletion for MockCompletion {
    async fn complete_json(&self, _system: &str, _user: &str) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.responses.lock().expect("mock lock").pop_front() {
            Some(ScriptedCompletion::Response(raw)) => Ok(raw),
            Some(ScriptedCompletion::RateLimited) => Err(CompletionError::RateLimited),
            Some(ScriptedCompletion::Failure(msg)) => Err(CompletionError::Service(msg.into())),
            None => panic!("complete_json called with no scripted response"),
        }
    }
}
