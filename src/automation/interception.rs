use anyhow::{Context, Result};
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams, EventRequestPaused, FailRequestParams,
};
use chromiumoxide::cdp::browser_protocol::network::{ErrorReason, ResourceType};
use futures::{Stream, StreamExt};
use std::fmt::Display;
use std::future::Future;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::utils::constants::BLOCKED_TRACKER_HOSTS;

/// Whether a request can be dropped without affecting extraction.
///
/// Documents, scripts and images always load: the product data and the
/// primary image URL depend on them.
#[must_use]
pub fn should_block(resource_type: &ResourceType, url: &str) -> bool {
    match resource_type {
        ResourceType::Document | ResourceType::Image => false,
        ResourceType::Stylesheet | ResourceType::Font | ResourceType::Media | ResourceType::Ping => {
            true
        }
        _ => is_tracker(url),
    }
}

fn is_tracker(url: &str) -> bool {
    let Ok(parsed) = url::Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    BLOCKED_TRACKER_HOSTS
        .iter()
        .any(|blocked| host == *blocked || host.ends_with(&format!(".{blocked}")))
}

/// How a paused request is answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Continue,
    Fail,
}

impl Answer {
    #[must_use]
    pub fn for_request(resource_type: &ResourceType, url: &str) -> Self {
        if should_block(resource_type, url) {
            Self::Fail
        } else {
            Self::Continue
        }
    }
}

/// Counts kept by the answering loop
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InterceptionTally {
    pub continued: usize,
    pub failed: usize,
    pub errors: usize,
}

/// Answer every paused request until the stream ends.
///
/// A request that cannot be answered (cancelled by a redirect, or its frame
/// navigated away) is logged and skipped; later requests are still answered.
pub async fn answer_paused<S, I, F, Fut, E>(mut paused: S, mut send: F) -> InterceptionTally
where
    S: Stream<Item = (I, Answer)> + Unpin,
    F: FnMut(I, Answer) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: Display,
{
    let mut tally = InterceptionTally::default();
    while let Some((id, answer)) = paused.next().await {
        match send(id, answer).await {
            Ok(()) => match answer {
                Answer::Continue => tally.continued += 1,
                Answer::Fail => tally.failed += 1,
            },
            Err(e) => {
                tally.errors += 1;
                debug!("Paused request could not be answered: {e}");
            }
        }
    }
    tally
}

/// Pause every request in `page` and fail the ones [`should_block`] rejects.
///
/// The returned task answers paused requests until the page goes away;
/// abort it when the context closes.
pub async fn enable_resource_blocking(page: &Page) -> Result<JoinHandle<()>> {
    let paused = page
        .event_listener::<EventRequestPaused>()
        .await
        .context("Failed to listen for paused requests")?;

    page.execute(EnableParams::default())
        .await
        .context("Failed to enable request interception")?;

    let page = page.clone();
    let requests = paused.map(|event| {
        let answer = Answer::for_request(&event.resource_type, &event.request.url);
        if answer == Answer::Fail {
            trace!("Blocking {:?} {}", event.resource_type, event.request.url);
        }
        (event.request_id.clone(), answer)
    });

    Ok(tokio::spawn(async move {
        let tally = answer_paused(requests, |request_id, answer| {
            let page = page.clone();
            async move {
                match answer {
                    Answer::Continue => page
                        .execute(ContinueRequestParams::new(request_id))
                        .await
                        .map(|_| ()),
                    Answer::Fail => page
                        .execute(FailRequestParams::new(request_id, ErrorReason::BlockedByClient))
                        .await
                        .map(|_| ()),
                }
            }
        })
        .await;
        debug!(
            "Resource blocking finished ({} continued, {} blocked, {} unanswerable)",
            tally.continued, tally.failed, tally.errors
        );
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_documents_and_images() {
        assert!(!should_block(&ResourceType::Document, "https://produto.mercadolivre.com.br/MLB-1"));
        assert!(!should_block(
            &ResourceType::Image,
            "https://http2.mlstatic.com/D_NQ_NP_123.webp"
        ));
        assert!(!should_block(
            &ResourceType::Script,
            "https://http2.mlstatic.com/frontend-assets/vpp.js"
        ));
    }

    #[test]
    fn drops_cosmetic_resources() {
        for kind in [
            ResourceType::Stylesheet,
            ResourceType::Font,
            ResourceType::Media,
            ResourceType::Ping,
        ] {
            assert!(should_block(&kind, "https://http2.mlstatic.com/asset"));
        }
    }

    #[test]
    fn answer_follows_blocking_rule() {
        assert_eq!(
            Answer::for_request(&ResourceType::Document, "https://www.mercadolivre.com.br/"),
            Answer::Continue
        );
        assert_eq!(
            Answer::for_request(&ResourceType::Font, "https://http2.mlstatic.com/f.woff2"),
            Answer::Fail
        );
    }

    #[tokio::test]
    async fn unanswerable_request_does_not_stop_the_loop() {
        let paused = futures::stream::iter(vec![
            (1u32, Answer::Continue),
            (2, Answer::Fail),
            (3, Answer::Continue),
            (4, Answer::Continue),
        ]);
        let mut answered = Vec::new();

        let tally = answer_paused(paused, |id, _answer| {
            answered.push(id);
            async move {
                if id == 1 {
                    Err("Invalid InterceptionId")
                } else {
                    Ok(())
                }
            }
        })
        .await;

        assert_eq!(answered, vec![1, 2, 3, 4]);
        assert_eq!(
            tally,
            InterceptionTally {
                continued: 2,
                failed: 1,
                errors: 1,
            }
        );
    }

    #[tokio::test]
    async fn every_failure_is_counted_and_skipped() {
        let paused = futures::stream::iter((0..5u32).map(|id| (id, Answer::Continue)));
        let tally = answer_paused(paused, |_, _| async { Err::<(), _>("target closed") }).await;
        assert_eq!(tally.errors, 5);
        assert_eq!(tally.continued, 0);
    }

    #[test]
    fn drops_tracker_scripts_and_beacons() {
        let tracker = format!("https://www.{}/collect", BLOCKED_TRACKER_HOSTS[0]);
        assert!(should_block(&ResourceType::Script, &tracker));
        assert!(should_block(&ResourceType::Xhr, &tracker));
        assert!(!should_block(&ResourceType::Xhr, "https://www.mercadolivre.com.br/api"));
    }
}
