use futures::future::BoxFuture;
use std::sync::Arc;

use crate::automation::{AutomationSession, SessionState};
use crate::page_extractor::ProductRecord;
use crate::resolver::{Tier, TierError, TierKind};

/// Last-resort tier driving a real browser
pub struct BrowserTier {
    session: Arc<AutomationSession>,
}

impl BrowserTier {
    #[must_use]
    pub fn new(session: Arc<AutomationSession>) -> Self {
        Self { session }
    }
}

impl Tier for BrowserTier {
    fn kind(&self) -> TierKind {
        TierKind::BrowserAutomation
    }

    fn is_enabled(&self) -> bool {
        self.session.config().enabled
            && !matches!(self.session.state(), SessionState::Failed | SessionState::Closed)
    }

    fn prepare(&self) -> BoxFuture<'_, bool> {
        Box::pin(self.session.ensure_ready())
    }

    fn fetch<'a>(&'a self, request_url: &'a str) -> BoxFuture<'a, Result<ProductRecord, TierError>> {
        Box::pin(self.session.fetch_listing(request_url))
    }

    fn shutdown(&self) -> BoxFuture<'_, ()> {
        Box::pin(self.session.shutdown())
    }
}
