use super::*;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use test_tag::tag;
use url::Url;

// NOTE: Tests tagged with #[tag(network)] fetch real pages.
// Skip them offline with: cargo test -- --skip "::network::test"

#[derive(Clone, Copy)]
enum Behavior {
    Serve(&'static str),
    Fail,
    Hang,
}

/// Renderer double that counts opened and released sessions
struct FakeRenderer {
    behavior: Behavior,
    opened: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
}

impl FakeRenderer {
    fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            opened: Arc::new(AtomicUsize::new(0)),
            released: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

struct FakeSession {
    behavior: Behavior,
    released: Arc<AtomicUsize>,
}

#[async_trait]
impl PageRenderer for FakeRenderer {
    async fn open_session(&self) -> Result<Box<dyn RenderSession>, ExtractionError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            behavior: self.behavior,
            released: self.released.clone(),
        }))
    }
}

#[async_trait]
impl RenderSession for FakeSession {
    async fn load(&mut self, url: &Url) -> Result<RenderedPage, ExtractionError> {
        match self.behavior {
            Behavior::Serve(html) => Ok(RenderedPage {
                final_url: url.clone(),
                html: html.to_string(),
            }),
            Behavior::Fail => Err(ExtractionError::Navigation("connection reset".to_string())),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(ExtractionError::Navigation("unreachable".to_string()))
            }
        }
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

fn engine(renderer: &Arc<FakeRenderer>, timeout: Duration) -> ExtractionEngine {
    let renderer: Arc<dyn PageRenderer> = renderer.clone();
    ExtractionEngine::new(renderer, timeout)
}

#[tokio::test]
async fn test_extracts_main_content() {
    let renderer = FakeRenderer::new(Behavior::Serve(
        "<html><head><title>Hello</title></head><body><nav>Menu</nav><main>Hello World</main></body></html>",
    ));
    let engine = engine(&renderer, Duration::from_secs(5));

    let document = engine.extract("https://example.com/page").await.unwrap();

    assert_eq!(document.text, "Hello World");
    assert_eq!(document.title, "Hello");
    assert_eq!(renderer.opened(), 1);
    assert_eq!(renderer.released(), 1);
}

#[tokio::test]
async fn test_rejects_unsupported_urls_before_rendering() {
    let renderer = FakeRenderer::new(Behavior::Serve("<main>never</main>"));
    let engine = engine(&renderer, Duration::from_secs(5));

    let result = engine.extract("ftp://example.com/terms.txt").await;
    assert!(matches!(result, Err(ExtractionError::UnsupportedScheme(_))));

    let result = engine.extract("definitely not a url").await;
    assert!(matches!(result, Err(ExtractionError::InvalidUrl { .. })));

    assert_eq!(renderer.opened(), 0);
}

#[tokio::test]
async fn test_session_released_on_navigation_failure() {
    let renderer = FakeRenderer::new(Behavior::Fail);
    let engine = engine(&renderer, Duration::from_secs(5));

    let result = engine.extract("https://example.com").await;

    assert!(matches!(result, Err(ExtractionError::Navigation(_))));
    assert_eq!(renderer.opened(), 1);
    assert_eq!(renderer.released(), 1);
}

#[tokio::test]
async fn test_session_released_on_timeout() {
    let renderer = FakeRenderer::new(Behavior::Hang);
    let engine = engine(&renderer, Duration::from_millis(50));

    let result = engine.extract("https://example.com").await;

    assert!(matches!(result, Err(ExtractionError::Timeout(t)) if t == Duration::from_millis(50)));
    assert_eq!(renderer.released(), 1);
}

#[tokio::test]
async fn test_empty_page_is_not_an_error() {
    let renderer = FakeRenderer::new(Behavior::Serve("<html><body></body></html>"));
    let engine = engine(&renderer, Duration::from_secs(5));

    let document = engine.extract("http://example.com").await.unwrap();
    assert!(document.is_empty());
}

#[tokio::test]
async fn test_concurrent_extractions_use_separate_sessions() {
    let renderer = FakeRenderer::new(Behavior::Serve("<article>Shared terms</article>"));
    let engine = engine(&renderer, Duration::from_secs(5));

    let (first, second) = tokio::join!(
        engine.extract("https://example.com/a"),
        engine.extract("https://example.com/b")
    );

    assert_eq!(first.unwrap().text, "Shared terms");
    assert_eq!(second.unwrap().text, "Shared terms");
    assert_eq!(renderer.opened(), 2);
    assert_eq!(renderer.released(), 2);
}

#[tokio::test]
#[tag(network)]
async fn test_live_http_extraction() {
    let engine = ExtractionEngine::default();
    let document = engine.extract("https://example.com").await.unwrap();

    assert_eq!(document.title, "Example Domain");
    assert!(!document.text.is_empty());
}
