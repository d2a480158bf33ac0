//! Test utilities shared by the pricescrape integration tests

use futures::future::BoxFuture;
use mockito::{Mock, Server};
use parking_lot::Mutex;
use pricescrape::resolver::{RetryPolicy, SoftFailure, Tier, TierError, TierKind};
use pricescrape::{ProductRecord, ResolverConfig};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

#[allow(dead_code)]
pub const LISTING_URL: &str =
    "https://produto.mercadolivre.com.br/MLB-1234567890-fone-de-ouvido-bluetooth-_JM";

/// Marketplace-shaped product page with split price parts
#[allow(dead_code)]
pub fn listing_html(title: &str, fraction: &str, cents: Option<&str>) -> String {
    let cents = cents
        .map(|c| format!(r#"<span class="andes-money-amount__cents">{c}</span>"#))
        .unwrap_or_default();
    format!(
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
    <meta charset="UTF-8">
    <title>{title} | Mercado Livre</title>
    <meta property="og:image" content="https://http2.mlstatic.com/D_NQ_NP_1234-O.webp">
</head>
<body>
    <div class="ui-pdp-header__title-container">
        <h1 class="ui-pdp-title">{title}</h1>
    </div>
    <div class="ui-pdp-price__second-line">
        <span class="andes-money-amount">
            <span class="andes-money-amount__currency-symbol">R$</span>
            <span class="andes-money-amount__fraction">{fraction}</span>
            {cents}
        </span>
    </div>
</body>
</html>"#
    )
}

/// Anti-bot interstitial as served by the marketplace edge
#[allow(dead_code)]
pub fn captcha_html() -> String {
    r#"<!DOCTYPE html>
<html>
<head><title>Mercado Livre</title></head>
<body>
    <h1>Verifique que você não é um robô</h1>
    <form action="/captcha"><button>Continuar</button></form>
</body>
</html>"#
        .to_string()
}

/// Configuration with millisecond backoff so retry tests stay fast
#[allow(dead_code)]
pub fn fast_config(max_attempts: u32) -> ResolverConfig {
    let policy = fast_policy(max_attempts);
    ResolverConfig::builder()
        .retry_policy(TierKind::PrimaryApi, policy.clone())
        .retry_policy(TierKind::RelayApi, policy.clone())
        .retry_policy(TierKind::BrowserAutomation, policy)
        .build()
        .expect("test config is valid")
}

#[allow(dead_code)]
pub fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_delay: Duration::from_millis(1),
        backoff_multiplier: 2.0,
        max_delay: Duration::from_millis(4),
        jitter: false,
    }
}

#[allow(dead_code)]
pub fn record(title: &str, price: f64) -> ProductRecord {
    ProductRecord::new(title, price)
}

/// A tier that replays scripted outcomes and counts its calls.
///
/// The last scripted outcome repeats once the script runs out.
#[allow(dead_code)]
pub struct ScriptedTier {
    kind: TierKind,
    script: Mutex<VecDeque<Result<ProductRecord, TierError>>>,
    last: Mutex<Option<Result<ProductRecord, TierError>>>,
    calls: AtomicU32,
    ready: AtomicBool,
    enabled: AtomicBool,
}

#[allow(dead_code)]
impl ScriptedTier {
    pub fn new(kind: TierKind, script: Vec<Result<ProductRecord, TierError>>) -> Self {
        Self {
            kind,
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            calls: AtomicU32::new(0),
            ready: AtomicBool::new(true),
            enabled: AtomicBool::new(true),
        }
    }

    pub fn succeeding(kind: TierKind, record: ProductRecord) -> Self {
        Self::new(kind, vec![Ok(record)])
    }

    pub fn soft_failing(kind: TierKind) -> Self {
        Self::new(
            kind,
            vec![Err(SoftFailure::Network("connection reset".into()).into())],
        )
    }

    pub fn blocking(kind: TierKind) -> Self {
        Self::new(kind, vec![Err(TierError::blocked("captcha page"))])
    }

    pub fn not_ready(self) -> Self {
        self.ready.store(false, Ordering::SeqCst);
        self
    }

    pub fn disabled(self) -> Self {
        self.enabled.store(false, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_outcome(&self) -> Result<ProductRecord, TierError> {
        let mut script = self.script.lock();
        let mut last = self.last.lock();
        if let Some(outcome) = script.pop_front() {
            *last = Some(outcome.clone());
            return outcome;
        }
        last.clone()
            .unwrap_or_else(|| Err(SoftFailure::Network("no scripted outcome".into()).into()))
    }
}

impl Tier for ScriptedTier {
    fn kind(&self) -> TierKind {
        self.kind
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn prepare(&self) -> BoxFuture<'_, bool> {
        let ready = self.ready.load(Ordering::SeqCst);
        Box::pin(async move { ready })
    }

    fn fetch<'a>(&'a self, _request_url: &'a str) -> BoxFuture<'a, Result<ProductRecord, TierError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self.next_outcome();
        Box::pin(async move { outcome })
    }
}

/// Mock endpoint serving `body` with the given status
#[allow(dead_code)]
pub async fn create_mock(server: &mut Server, path: &str, status: usize, body: &str) -> Mock {
    server
        .mock("GET", path)
        .with_status(status)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(body)
        .create_async()
        .await
}
