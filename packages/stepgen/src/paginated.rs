//! Paginated sources exposed as asynchronous generators.
//!
//! The body fetches a page, emits its items one suspension point at a time,
//! then fetches the next page with the returned token, completing once a
//! page arrives without one. Pages are only fetched when the driver asks for
//! more items than are buffered, so a slow consumer applies backpressure.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::asyncgen::{AsyncBodyStep, AsyncGeneratorBody, AsyncGeneratorDefinition};
use crate::value::{Exception, Value};

/// One page of results.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<Value>,
    /// Token for the following page; `None` on the last page.
    pub next: Option<String>,
}

/// An asynchronous page fetch, e.g. a network call.
#[async_trait]
pub trait PageSource: fmt::Debug + Send + Sync {
    async fn fetch(&self, token: &str) -> Result<Page, Exception>;
}

#[derive(Debug)]
pub struct Paginated {
    source: Arc<dyn PageSource>,
    next_token: Option<String>,
    buffer: VecDeque<Value>,
    pages_fetched: usize,
}

impl Paginated {
    pub fn new(source: Arc<dyn PageSource>, start: impl Into<String>) -> Self {
        Paginated {
            source,
            next_token: Some(start.into()),
            buffer: VecDeque::new(),
            pages_fetched: 0,
        }
    }

    pub fn definition(
        name: impl Into<String>,
        source: Arc<dyn PageSource>,
        start: impl Into<String>,
    ) -> AsyncGeneratorDefinition {
        let start = start.into();
        AsyncGeneratorDefinition::new(name, move || Paginated::new(Arc::clone(&source), start.clone()))
    }
}

#[async_trait]
impl AsyncGeneratorBody for Paginated {
    async fn resume(&mut self, _value: Value) -> AsyncBodyStep {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return AsyncBodyStep::Yield(item);
            }
            let Some(token) = self.next_token.take() else {
                log::debug!("pagination finished after {} page(s)", self.pages_fetched);
                return AsyncBodyStep::Return(Value::Undefined);
            };
            match self.source.fetch(&token).await {
                Ok(page) => {
                    self.pages_fetched += 1;
                    log::trace!(
                        "fetched page {token:?}: {} item(s), next {:?}",
                        page.items.len(),
                        page.next
                    );
                    self.buffer.extend(page.items);
                    self.next_token = page.next;
                }
                Err(exception) => return AsyncBodyStep::Throw(exception),
            }
        }
    }

    async fn close(&mut self) -> Result<(), Exception> {
        self.buffer.clear();
        self.next_token = None;
        Ok(())
    }
}

/// In-memory page source with optional per-page latency.
///
/// Tokens are `page-<index>`. Latencies apply round-robin by page index,
/// which lets tests make later pages resolve faster than earlier ones.
#[derive(Debug, Default)]
pub struct InMemoryPages {
    pages: Vec<Vec<Value>>,
    latency: Vec<Duration>,
    fetches: AtomicUsize,
}

impl InMemoryPages {
    pub fn new(pages: Vec<Vec<Value>>) -> Self {
        InMemoryPages {
            pages,
            latency: Vec::new(),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Integers `0..total_items` split into pages of `page_size`.
    pub fn from_range(total_items: usize, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let items: Vec<Value> = (0..total_items as i64).map(Value::Int).collect();
        let mut pages: Vec<Vec<Value>> = items.chunks(page_size).map(<[Value]>::to_vec).collect();
        if pages.is_empty() {
            pages.push(Vec::new());
        }
        Self::new(pages)
    }

    pub fn with_latency(mut self, latency: Vec<Duration>) -> Self {
        self.latency = latency;
        self
    }

    pub fn start_token(&self) -> String {
        Self::token(0)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// How many fetches have been served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn token(index: usize) -> String {
        format!("page-{index}")
    }

    fn parse_token(token: &str) -> Option<usize> {
        token.strip_prefix("page-")?.parse().ok()
    }
}

#[async_trait]
impl PageSource for InMemoryPages {
    async fn fetch(&self, token: &str) -> Result<Page, Exception> {
        let index = Self::parse_token(token)
            .filter(|index| *index < self.pages.len())
            .ok_or_else(|| Exception::new("NotFound", format!("no page for token {token:?}")))?;
        if !self.latency.is_empty() {
            tokio::time::sleep(self.latency[index % self.latency.len()]).await;
        }
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let next = (index + 1 < self.pages.len()).then(|| Self::token(index + 1));
        Ok(Page {
            items: self.pages[index].clone(),
            next,
        })
    }
}
