// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use crate::error::Result;
use std::cell::Cell;
use std::future::Future;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub page: u32,
    /// Optimistic: true iff the last fetched page was non-empty.
    pub has_more: bool,
    pub items_per_page: usize,
}

#[derive(Debug, PartialEq)]
pub enum LoadOutcome<T> {
    Loaded { page: u32, items: Vec<T> },
    /// A load was already in flight, or no more pages are expected
    Skipped,
    /// The stream was reset while this page was in flight
    Stale,
}

/// Page cursor of the active content stream (category items or search
/// results). All load-more triggers go through [`PaginationController::load_more`],
/// which refuses to start while another page is in flight.
///
/// Methods take `&self` so several triggers on the same event loop can hold
/// the controller at once; it is deliberately not `Sync`.
#[derive(Debug)]
pub struct PaginationController {
    page: Cell<u32>,
    has_more: Cell<bool>,
    loading_more: Cell<bool>,
    generation: Cell<u64>,
    items_per_page: usize,
}

struct LoadingGuard<'a> {
    controller: &'a PaginationController,
    generation: u64,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.controller.generation.get() == self.generation {
            self.controller.loading_more.set(false);
        }
    }
}

impl PaginationController {
    pub fn new(items_per_page: usize) -> Self {
        Self {
            page: Cell::new(1),
            has_more: Cell::new(false),
            loading_more: Cell::new(false),
            generation: Cell::new(0),
            items_per_page,
        }
    }

    pub fn cursor(&self) -> PageCursor {
        PageCursor {
            page: self.page.get(),
            has_more: self.has_more.get(),
            items_per_page: self.items_per_page,
        }
    }

    pub fn has_more(&self) -> bool {
        self.has_more.get()
    }

    pub fn is_loading_more(&self) -> bool {
        self.loading_more.get()
    }

    /// Start a new stream at page 1. Any page still in flight becomes stale.
    pub fn reset(&self) {
        self.generation.set(self.generation.get().wrapping_add(1));
        self.page.set(1);
        self.has_more.set(false);
        self.loading_more.set(false);
    }

    /// Continue a stream from a cursor saved earlier with [`Self::cursor`].
    pub fn restore(&self, cursor: PageCursor) {
        self.reset();
        self.page.set(cursor.page);
        self.has_more.set(cursor.has_more);
    }

    /// Reset, then fetch page 1 and derive `has_more` from it.
    pub async fn load_first<T, F, Fut>(&self, fetch: F) -> Result<Vec<T>>
    where
        F: FnOnce(u32) -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        self.reset();
        let generation = self.generation.get();

        let items = fetch(1).await?;
        if self.generation.get() == generation {
            self.has_more.set(!items.is_empty());
        }
        Ok(items)
    }

    pub async fn load_more<T, F, Fut>(&self, fetch: F) -> Result<LoadOutcome<T>>
    where
        F: FnOnce(u32) -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        if self.loading_more.get() || !self.has_more.get() {
            return Ok(LoadOutcome::Skipped);
        }

        self.loading_more.set(true);
        let generation = self.generation.get();
        let _guard = LoadingGuard {
            controller: self,
            generation,
        };

        let page = self.page.get() + 1;
        self.page.set(page);
        debug!("Loading page {}", page);

        let result = fetch(page).await;

        if self.generation.get() != generation {
            debug!("Discarding stale page {}", page);
            return Ok(LoadOutcome::Stale);
        }

        match result {
            Ok(items) => {
                self.has_more.set(!items.is_empty());
                debug!("Page {} returned {} items", page, items.len());
                Ok(LoadOutcome::Loaded { page, items })
            }
            Err(e) => {
                self.page.set(page - 1);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::rc::Rc;
    use tokio::sync::Notify;

    async fn ready_page(controller: &PaginationController, len: usize) {
        controller
            .load_first(|_| async move { Ok(vec![0u32; len]) })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn first_page_sets_has_more() {
        let controller = PaginationController::new(50);
        ready_page(&controller, 3).await;
        assert_eq!(
            controller.cursor(),
            PageCursor {
                page: 1,
                has_more: true,
                items_per_page: 50
            }
        );

        ready_page(&controller, 0).await;
        assert!(!controller.has_more());
    }

    #[tokio::test]
    async fn concurrent_triggers_issue_one_request() {
        let controller = PaginationController::new(50);
        ready_page(&controller, 2).await;

        let calls = Rc::new(Cell::new(0u32));
        let fetch = |page: u32| {
            let calls = calls.clone();
            async move {
                calls.set(calls.get() + 1);
                tokio::task::yield_now().await;
                Ok(vec![page])
            }
        };

        let (scroll, button, page_scroll) = tokio::join!(
            controller.load_more(fetch),
            controller.load_more(fetch),
            controller.load_more(fetch),
        );

        assert_eq!(calls.get(), 1);
        assert_eq!(
            scroll.unwrap(),
            LoadOutcome::Loaded {
                page: 2,
                items: vec![2]
            }
        );
        assert_eq!(button.unwrap(), LoadOutcome::Skipped);
        assert_eq!(page_scroll.unwrap(), LoadOutcome::Skipped);
        assert_eq!(controller.cursor().page, 2);
        assert!(!controller.is_loading_more());
    }

    #[tokio::test]
    async fn sequential_loads_advance_by_one() {
        let controller = PaginationController::new(50);
        ready_page(&controller, 1).await;

        for expected in 2..=4 {
            let outcome = controller
                .load_more(|page| async move { Ok(vec![page]) })
                .await
                .unwrap();
            assert_eq!(
                outcome,
                LoadOutcome::Loaded {
                    page: expected,
                    items: vec![expected]
                }
            );
        }
        assert_eq!(controller.cursor().page, 4);
    }

    #[tokio::test]
    async fn empty_page_stops_loading() {
        let controller = PaginationController::new(50);
        ready_page(&controller, 1).await;

        controller
            .load_more(|_| async { Ok(Vec::<u32>::new()) })
            .await
            .unwrap();
        assert!(!controller.has_more());

        let outcome = controller
            .load_more(|_| async { Ok(vec![1u32]) })
            .await
            .unwrap();
        assert_eq!(outcome, LoadOutcome::Skipped);
        assert_eq!(controller.cursor().page, 2);
    }

    #[tokio::test]
    async fn failed_load_keeps_page() {
        let controller = PaginationController::new(50);
        ready_page(&controller, 1).await;

        let result = controller
            .load_more(|_| async { Err::<Vec<u32>, _>(Error::transport(Some(500), "boom")) })
            .await;
        assert!(result.is_err());
        assert_eq!(controller.cursor().page, 1);
        assert!(controller.has_more());
        assert!(!controller.is_loading_more());
    }

    #[tokio::test]
    async fn restore_resumes_saved_stream() {
        let controller = PaginationController::new(50);
        ready_page(&controller, 1).await;
        controller
            .load_more(|page| async move { Ok(vec![page]) })
            .await
            .unwrap();
        let saved = controller.cursor();

        ready_page(&controller, 0).await;
        assert!(!controller.has_more());

        controller.restore(saved);
        let outcome = controller
            .load_more(|page| async move { Ok(vec![page]) })
            .await
            .unwrap();
        assert_eq!(
            outcome,
            LoadOutcome::Loaded {
                page: 3,
                items: vec![3]
            }
        );
    }

    #[tokio::test]
    async fn reset_discards_in_flight_page() {
        let controller = PaginationController::new(50);
        ready_page(&controller, 1).await;
        let notify = Notify::new();

        let (outcome, _) = tokio::join!(
            controller.load_more(|page| {
                let notify = &notify;
                async move {
                    notify.notified().await;
                    Ok(vec![page])
                }
            }),
            async {
                controller.reset();
                notify.notify_one();
            }
        );

        assert_eq!(outcome.unwrap(), LoadOutcome::Stale);
        assert_eq!(controller.cursor().page, 1);
        assert!(!controller.has_more());
        assert!(!controller.is_loading_more());
    }
}
