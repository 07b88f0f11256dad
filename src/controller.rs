//! Headless owner of the list state.
//!
//! `ListController` drives the same reducer the terminal app uses, but runs
//! effects inline against a [`CatalogSource`] instead of a task runtime. It is
//! created when the list is mounted (issuing the first page fetch) and
//! consumed by [`ListController::dispose`].

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use crate::action::Action;
use crate::catalog::sorted_entries;
use crate::effect::Effect;
use crate::reducer::reducer;
use crate::source::CatalogSource;
use crate::state::{AppState, ListConfig};

pub struct ListController<S> {
    state: AppState,
    source: Arc<S>,
    pending_settle: Option<Duration>,
}

impl<S: CatalogSource> ListController<S> {
    pub async fn mount(source: Arc<S>, config: ListConfig) -> Self {
        let mut controller = Self {
            state: AppState::new(config),
            source,
            pending_settle: None,
        };
        controller.dispatch(Action::Init).await;
        controller
    }

    /// Read-only view of the current state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn snapshot(&self) -> AppState {
        self.state.clone()
    }

    pub async fn fetch_next_page(&mut self) {
        self.dispatch(Action::PageFetch).await;
    }

    pub async fn search(&mut self, query: &str) {
        self.dispatch(Action::SearchQueryChange(query.to_string()))
            .await;
    }

    pub async fn sort(&mut self) {
        self.dispatch(Action::SortToggle).await;
    }

    /// Returns `false` when another navigation is still in flight.
    pub async fn begin_navigation(&mut self, number: u32) -> bool {
        self.dispatch(Action::NavigateBegin(number)).await
    }

    /// Waits out the settle delay armed by the last accepted navigation,
    /// then reopens the gate.
    pub async fn end_navigation(&mut self) {
        let Some(delay) = self.pending_settle.take() else {
            return;
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.dispatch(Action::NavigationDidSettle).await;
    }

    pub fn dispose(mut self) -> AppState {
        reducer(&mut self.state, Action::Dispose);
        tracing::debug!("list controller disposed");
        self.state
    }

    /// Applies `action`, then runs its effects (and any they produce) to
    /// completion. Returns whether the first action changed state.
    async fn dispatch(&mut self, action: Action) -> bool {
        let result = reducer(&mut self.state, action);
        let changed = result.changed;
        let mut queue: VecDeque<Effect> = result.effects.into_iter().collect();
        while let Some(effect) = queue.pop_front() {
            if let Some(follow_up) = self.run_effect(effect).await {
                let result = reducer(&mut self.state, follow_up);
                queue.extend(result.effects);
            }
        }
        changed
    }

    async fn run_effect(&mut self, effect: Effect) -> Option<Action> {
        match effect {
            Effect::FetchPage {
                request_id,
                limit,
                offset,
            } => {
                tracing::debug!(request_id, limit, offset, "fetching page");
                let action = match self.source.fetch_page(limit, offset).await {
                    Ok(page) => Action::PageDidLoad { request_id, page },
                    Err(error) => {
                        tracing::warn!(request_id, %error, "page fetch failed");
                        Action::PageDidError {
                            request_id,
                            error: error.to_string(),
                        }
                    }
                };
                Some(action)
            }
            Effect::SortEntries { entries, order } => {
                Some(Action::SortDidComplete(sorted_entries(&entries, order)))
            }
            Effect::LoadDetail { name } => {
                let action = match self.source.fetch_info(&name).await {
                    Ok(info) => Action::DetailDidLoad(info),
                    Err(error) => Action::DetailDidError {
                        name,
                        error: error.to_string(),
                    },
                };
                Some(action)
            }
            Effect::SettleNavigation { delay_ms } => {
                self.pending_settle = Some(Duration::from_millis(delay_ms));
                None
            }
        }
    }
}
