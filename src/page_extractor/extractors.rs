//! Live-page helpers used by the browser tier before extraction.

use anyhow::{Context, Result};
use chromiumoxide::Page;
use rand::Rng;
use std::time::{Duration, Instant};

/// Poll `document.readyState` until the page reports complete or the wait
/// budget runs out. A timeout here is not an error: extraction still runs on
/// whatever has rendered.
pub async fn wait_for_page_load(page: &Page, max_wait: Duration) -> Result<()> {
    let start = Instant::now();
    let poll_interval = Duration::from_millis(100);

    log::debug!("Waiting for page load (max {:.1}s)", max_wait.as_secs_f64());

    loop {
        if start.elapsed() >= max_wait {
            log::warn!(
                "Timeout waiting for page load after {:.1}s, proceeding anyway",
                max_wait.as_secs_f64()
            );
            break;
        }

        match page
            .evaluate("document.readyState === 'complete' && document.body !== null")
            .await
        {
            Ok(result) => {
                if result.into_value::<bool>().unwrap_or(false) {
                    log::debug!("Page ready after {:.2}s", start.elapsed().as_secs_f64());
                    break;
                }
            }
            Err(e) => {
                log::debug!("Failed to check readyState: {e}, retrying");
            }
        }

        tokio::time::sleep(poll_interval).await;
    }

    Ok(())
}

/// Idle on the page for a random human-like interval, scrolling part of the
/// way down so lazy price widgets render.
pub async fn settle_like_a_visitor(page: &Page, min: Duration, max: Duration) -> Result<()> {
    let (min_ms, max_ms) = (min.as_millis() as u64, max.as_millis() as u64);
    let (first, second, scroll_px) = {
        let mut rng = rand::rng();
        let total = if max_ms > min_ms {
            rng.random_range(min_ms..=max_ms)
        } else {
            min_ms
        };
        let first = total * rng.random_range(30..=60) / 100;
        (first, total - first, rng.random_range(300..=900))
    };

    tokio::time::sleep(Duration::from_millis(first)).await;

    let scroll_js = format!("window.scrollBy({{ top: {scroll_px}, behavior: 'smooth' }})");
    page.evaluate(scroll_js.as_str())
        .await
        .context("Failed to scroll page")?;

    tokio::time::sleep(Duration::from_millis(second)).await;
    Ok(())
}

/// Serialized DOM of the page after scripts ran
pub async fn page_html(page: &Page) -> Result<String> {
    page.content().await.context("Failed to read page content")
}
