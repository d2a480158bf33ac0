//! Browser session tests. These launch a real Chromium and are ignored by
//! default; run with `--ignored` on a machine with Chrome installed.

use anyhow::Result;
use mockito::Server;
use pricescrape::automation::{AutomationSession, SessionState};
use pricescrape::{AutomationConfig, ProductRecord};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

mod common;
use common::{captcha_html, create_mock, listing_html};

fn test_config(cookie_dir: &TempDir) -> AutomationConfig {
    AutomationConfig {
        settle_min: Duration::from_millis(50),
        settle_max: Duration::from_millis(100),
        navigation_timeout: Duration::from_secs(15),
        cookie_file: Some(cookie_dir.path().join("cookies.json")),
        ..AutomationConfig::default()
    }
}

#[tokio::test]
#[ignore = "launches Chromium"]
async fn session_extracts_listing_and_persists_cookies() -> Result<()> {
    let dir = TempDir::new()?;
    let mut server = Server::new_async().await;
    let _page = server
        .mock("GET", "/MLB-1-fone")
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_header("set-cookie", "_d2id=visitor-1; Path=/; Max-Age=3600")
        .with_body(listing_html("Fone de Ouvido Bluetooth", "249", Some("90")))
        .create_async()
        .await;

    let session = AutomationSession::new(test_config(&dir));
    assert!(session.ensure_ready().await);
    assert_eq!(session.state(), SessionState::Ready);

    let record: ProductRecord = session
        .fetch_listing(&format!("{}/MLB-1-fone", server.url()))
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    assert_eq!(record.title, "Fone de Ouvido Bluetooth");
    assert!((record.price - 249.90).abs() < 1e-9);

    let saved = tokio::fs::read_to_string(dir.path().join("cookies.json")).await?;
    assert!(saved.contains("_d2id"));

    session.shutdown().await;
    session.shutdown().await;
    assert_eq!(session.state(), SessionState::Closed);
    Ok(())
}

#[tokio::test]
#[ignore = "launches Chromium"]
async fn captcha_page_is_reported_as_block() -> Result<()> {
    let dir = TempDir::new()?;
    let mut server = Server::new_async().await;
    let _page = create_mock(&mut server, "/MLB-2-blocked", 200, &captcha_html()).await;

    let session = AutomationSession::new(test_config(&dir));
    assert!(session.ensure_ready().await);

    let err = session
        .fetch_listing(&format!("{}/MLB-2-blocked", server.url()))
        .await
        .expect_err("interstitial");
    assert!(err.is_blocked());

    session.shutdown().await;
    Ok(())
}

#[tokio::test]
#[ignore = "launches Chromium"]
async fn concurrent_contexts_do_not_share_cookie_jars() -> Result<()> {
    let dir = TempDir::new()?;
    let mut server = Server::new_async().await;

    let mut mocks = Vec::new();
    // Each page writes a context-local cookie, then renders the jar it sees
    // into the title so the extraction result reveals what was shared.
    for name in ["a", "b"] {
        let body = format!(
            r#"<html><head><title>jar</title></head><body>
            <h1 class="ui-pdp-title" id="t">pending</h1>
            <span class="andes-money-amount"><span class="andes-money-amount__fraction">10</span></span>
            <script>
              document.cookie = "probe_{name}=1; path=/";
              document.getElementById("t").textContent = "jar " + document.cookie;
            </script></body></html>"#
        );
        mocks.push(create_mock(&mut server, &format!("/MLB-{name}"), 200, &body).await);
    }

    let mut config = test_config(&dir);
    config.cookie_file = None;
    config.max_concurrent_contexts = 2;
    let session = Arc::new(AutomationSession::new(config));
    assert!(session.ensure_ready().await);

    let url_a = format!("{}/MLB-a", server.url());
    let url_b = format!("{}/MLB-b", server.url());
    let (a, b) = tokio::join!(session.fetch_listing(&url_a), session.fetch_listing(&url_b));
    let (a, b) = (
        a.map_err(|e| anyhow::anyhow!("{e}"))?,
        b.map_err(|e| anyhow::anyhow!("{e}"))?,
    );

    assert!(a.title.contains("probe_a") && !a.title.contains("probe_b"), "{}", a.title);
    assert!(b.title.contains("probe_b") && !b.title.contains("probe_a"), "{}", b.title);

    session.shutdown().await;
    Ok(())
}
