//! Cursor-paginated feed of claims awaiting the current member's vote.
//!
//! At most one page request is in flight at a time. Each request is stamped
//! with the feed's generation; restarting the feed (direction change,
//! reload) bumps the generation so that responses to superseded requests
//! are discarded on arrival instead of being merged.
//!
//! Votes outlive restarts. A claim whose vote is still unanswered comes back
//! as `Loading` when a new page lists it again, and a confirmed one as
//! `Voted`, so a restart never opens a second submission for the same claim.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use cambiatus_types::{ClaimId, ClaimPage, Cursor, Direction, PageInfo, Symbol, TransportError};

use crate::status::ClaimStatus;
use crate::voting::{CastVote, DeferredVote};
use crate::{ClaimsError, Result};

/// Default number of claims fetched by the first request.
pub const DEFAULT_FIRST_PAGE_SIZE: u32 = 4;

/// Default number of claims fetched by each follow-up request.
pub const DEFAULT_NEXT_PAGE_SIZE: u32 = 1;

/// Page sizes for the feed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    pub first_page_size: u32,
    pub next_page_size: u32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            first_page_size: DEFAULT_FIRST_PAGE_SIZE,
            next_page_size: DEFAULT_NEXT_PAGE_SIZE,
        }
    }
}

/// A claims query the caller must issue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Feed generation this request belongs to.
    pub generation: u64,
    pub community: Symbol,
    pub direction: Direction,
    /// `None` for the first page.
    pub after: Option<Cursor>,
    pub first: u32,
}

impl PageRequest {
    /// True for the request that (re)starts the feed.
    pub fn is_first_page(&self) -> bool {
        self.after.is_none()
    }
}

/// Where the feed as a whole stands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum FeedStatus {
    /// Not started.
    Idle,
    /// First page in flight; nothing to show yet.
    Loading,
    /// Earlier pages shown, another page in flight.
    LoadingMore,
    Loaded,
    /// The latest request failed. Claims from earlier pages stay visible.
    Failed(TransportError),
}

/// The paginated claim feed. Owns the claim list.
#[derive(Clone, Debug)]
pub struct ClaimFeed {
    community: Symbol,
    config: FeedConfig,
    direction: Direction,
    generation: u64,
    pub(crate) claims: Vec<ClaimStatus>,
    page_info: PageInfo,
    status: FeedStatus,
    in_flight: Option<PageRequest>,
    pending_top_ups: u32,
    pub(crate) deferred: Option<DeferredVote>,
    pub(crate) votes: HashMap<ClaimId, CastVote>,
}

impl ClaimFeed {
    /// An idle feed for one community.
    pub fn new(community: Symbol, config: FeedConfig) -> Self {
        Self {
            community,
            config,
            direction: Direction::default(),
            generation: 0,
            claims: Vec::new(),
            page_info: PageInfo::default(),
            status: FeedStatus::Idle,
            in_flight: None,
            pending_top_ups: 0,
            deferred: None,
            votes: HashMap::new(),
        }
    }

    /// Take over the generation and the cast votes of a feed this one
    /// replaces, so that pages requested by the old feed stay stale and
    /// unanswered votes stay locked.
    pub fn inherit(&mut self, previous: ClaimFeed) {
        self.generation = self.generation.max(previous.generation);
        self.votes.extend(previous.votes);
    }

    /// Stop paging and drop every loaded claim. Cast votes are kept so that
    /// late chain answers still settle.
    pub fn retire(&mut self) {
        self.claims.clear();
        self.page_info = PageInfo::default();
        self.status = FeedStatus::Idle;
        self.in_flight = None;
        self.pending_top_ups = 0;
        self.deferred = None;
        debug!(
            generation = self.generation,
            votes = self.votes.len(),
            "claim feed retired"
        );
    }

    /// Drop everything loaded and request the first page in `direction`.
    /// Cast votes are kept.
    pub fn start(&mut self, direction: Direction) -> PageRequest {
        self.generation += 1;
        self.direction = direction;
        self.claims.clear();
        self.page_info = PageInfo::default();
        self.pending_top_ups = 0;
        self.deferred = None;
        self.status = FeedStatus::Loading;

        info!(
            community = %self.community,
            ?direction,
            generation = self.generation,
            "claim feed started"
        );
        self.issue(None, self.config.first_page_size)
    }

    /// Switch sort order. Restarts pagination from scratch; selecting the
    /// current order of an already started feed does nothing.
    pub fn set_direction(&mut self, direction: Direction) -> Option<PageRequest> {
        if direction == self.direction && self.status != FeedStatus::Idle {
            return None;
        }
        Some(self.start(direction))
    }

    /// Flip the sort order and restart.
    pub fn toggle_direction(&mut self) -> PageRequest {
        self.start(self.direction.toggled())
    }

    /// Request the page after the stored cursor. Not issued when the server
    /// reported no further pages or a request is already in flight.
    pub fn fetch_next_page(&mut self) -> Option<PageRequest> {
        if self.in_flight.is_some() {
            debug!("next page skipped: request in flight");
            return None;
        }
        let cursor = self.page_info.next_cursor()?.clone();
        self.status = FeedStatus::LoadingMore;
        Some(self.issue(Some(cursor), self.config.next_page_size))
    }

    /// Apply a page response.
    ///
    /// Returns a follow-up request when top-ups were requested while this
    /// page was in flight.
    ///
    /// # Errors
    ///
    /// - [`ClaimsError::StalePage`] if `request` is not the in-flight
    ///   request; the response is discarded and the feed is unchanged.
    pub fn on_page(
        &mut self,
        request: &PageRequest,
        result: std::result::Result<ClaimPage, TransportError>,
    ) -> Result<Option<PageRequest>> {
        if self.in_flight.as_ref() != Some(request) {
            debug!(
                generation = request.generation,
                current = self.generation,
                "discarding stale claim page"
            );
            return Err(ClaimsError::StalePage {
                generation: request.generation,
                current: self.generation,
            });
        }
        self.in_flight = None;

        match result {
            Ok(page) => {
                if request.is_first_page() {
                    self.claims.clear();
                }
                let received = page.claims.len();
                for claim in page.claims {
                    if self.get(claim.id).is_some() {
                        continue;
                    }
                    let status = match self.votes.get(&claim.id) {
                        Some(vote) => vote.status(claim),
                        None => ClaimStatus::loaded(claim),
                    };
                    self.claims.push(status);
                }
                self.page_info = page.page_info;
                self.status = FeedStatus::Loaded;
                debug!(
                    received,
                    pending = self.pending_count(),
                    has_next_page = self.page_info.has_next_page,
                    "claim page merged"
                );
                Ok(self.issue_top_up())
            }
            Err(err) => {
                warn!(error = %err, "claim page failed");
                self.status = FeedStatus::Failed(err);
                Ok(None)
            }
        }
    }

    /// Ask for one more claim to replace a claim that left the pending pool.
    pub(crate) fn request_top_up(&mut self) -> Option<PageRequest> {
        self.pending_top_ups += 1;
        self.issue_top_up()
    }

    fn issue_top_up(&mut self) -> Option<PageRequest> {
        if self.pending_top_ups == 0 || self.in_flight.is_some() {
            return None;
        }
        let Some(cursor) = self.page_info.next_cursor().cloned() else {
            self.pending_top_ups = 0;
            return None;
        };
        let first = self
            .config
            .next_page_size
            .saturating_mul(self.pending_top_ups);
        self.pending_top_ups = 0;
        self.status = FeedStatus::LoadingMore;
        Some(self.issue(Some(cursor), first))
    }

    fn issue(&mut self, after: Option<Cursor>, first: u32) -> PageRequest {
        let request = PageRequest {
            generation: self.generation,
            community: self.community.clone(),
            direction: self.direction,
            after,
            first,
        };
        self.in_flight = Some(request.clone());
        request
    }

    /// Look up a loaded claim.
    pub fn get(&self, id: ClaimId) -> Option<&ClaimStatus> {
        self.claims.iter().find(|status| status.id() == id)
    }

    pub(crate) fn get_mut(&mut self, id: ClaimId) -> Result<&mut ClaimStatus> {
        self.claims
            .iter_mut()
            .find(|status| status.id() == id)
            .ok_or(ClaimsError::UnknownClaim(id))
    }

    /// Every loaded claim in feed order, voted ones included.
    pub fn claims(&self) -> &[ClaimStatus] {
        &self.claims
    }

    /// Claims still awaiting a successful vote, in feed order.
    pub fn pending(&self) -> impl Iterator<Item = &ClaimStatus> {
        self.claims.iter().filter(|status| status.is_pending())
    }

    pub fn pending_count(&self) -> usize {
        self.pending().count()
    }

    pub fn community(&self) -> &Symbol {
        &self.community
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn page_info(&self) -> &PageInfo {
        &self.page_info
    }

    pub fn status(&self) -> &FeedStatus {
        &self.status
    }

    /// The request currently awaiting a response.
    pub fn in_flight(&self) -> Option<&PageRequest> {
        self.in_flight.as_ref()
    }

    /// The vote waiting for authentication, if any.
    pub fn deferred(&self) -> Option<&DeferredVote> {
        self.deferred.as_ref()
    }
}
