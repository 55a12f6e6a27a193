//! Offset-cursor pagination as a `Stream`.
//!
//! [`PageStream`] turns a page-fetching function into a stream of pages and
//! hides offset handling from callers; [`ItemStream`] flattens it into items.
//!
//! ```rust,ignore
//! use futures_util::StreamExt;
//!
//! let mut consumers = client.items::<Consumer>("/consumers", Some(&ListOpt::new().size(100)));
//! while let Some(consumer) = consumers.next().await {
//!     println!("{:?}", consumer?.username);
//! }
//! ```

use crate::error::{Error, Result};
use crate::pagination::ListOpt;
use futures_core::Stream;
use pin_project_lite::pin_project;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, ready};
use tokio_util::sync::CancellationToken;

pin_project! {
    /// Stream of pages, fetched one at a time as the stream is polled.
    ///
    /// The first page uses the initial options; each later page uses the `next`
    /// options returned with the previous one. The stream ends after a page with
    /// no `next`, or after the first error.
    pub struct PageStream<T, F, Fut>
    where
        F: FnMut(ListOpt) -> Fut,
        Fut: Future<Output = Result<(Vec<T>, Option<ListOpt>)>>,
    {
        next: Option<ListOpt>,
        cancel: Option<CancellationToken>,
        done: bool,
        fetcher: F,
        #[pin]
        in_flight: Option<Fut>,
    }
}

impl<T, F, Fut> PageStream<T, F, Fut>
where
    F: FnMut(ListOpt) -> Fut,
    Fut: Future<Output = Result<(Vec<T>, Option<ListOpt>)>>,
{
    /// Start at `first`. When `cancel` fires, the next page request is not made
    /// and the stream yields [`Error::Cancelled`].
    pub fn new(first: ListOpt, cancel: Option<CancellationToken>, fetcher: F) -> Self {
        Self {
            next: Some(first),
            cancel,
            done: false,
            fetcher,
            in_flight: None,
        }
    }
}

impl<T, F, Fut> Stream for PageStream<T, F, Fut>
where
    F: FnMut(ListOpt) -> Fut,
    Fut: Future<Output = Result<(Vec<T>, Option<ListOpt>)>>,
{
    type Item = Result<Vec<T>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            if *this.done {
                return Poll::Ready(None);
            }

            if let Some(fut) = this.in_flight.as_mut().as_pin_mut() {
                let outcome = ready!(fut.poll(cx));
                this.in_flight.set(None);
                return match outcome {
                    Ok((items, next)) => {
                        *this.done = next.is_none();
                        *this.next = next;
                        Poll::Ready(Some(Ok(items)))
                    }
                    Err(e) => {
                        *this.done = true;
                        Poll::Ready(Some(Err(e)))
                    }
                };
            }

            let Some(opts) = this.next.take() else {
                *this.done = true;
                continue;
            };

            if this.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
                *this.done = true;
                return Poll::Ready(Some(Err(Error::Cancelled)));
            }

            let fut = (this.fetcher)(opts);
            this.in_flight.set(Some(fut));
        }
    }
}

pin_project! {
    /// Items of a page stream, in server order.
    pub struct ItemStream<T, S> {
        #[pin]
        pages: S,
        buffer: VecDeque<T>,
    }
}

impl<T, S> ItemStream<T, S>
where
    S: Stream<Item = Result<Vec<T>>>,
{
    pub fn new(pages: S) -> Self {
        Self {
            pages,
            buffer: VecDeque::new(),
        }
    }
}

impl<T, S> Stream for ItemStream<T, S>
where
    S: Stream<Item = Result<Vec<T>>>,
{
    type Item = Result<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            if let Some(item) = this.buffer.pop_front() {
                return Poll::Ready(Some(Ok(item)));
            }
            match ready!(this.pages.as_mut().poll_next(cx)) {
                Some(Ok(items)) => this.buffer.extend(items),
                Some(Err(e)) => return Poll::Ready(Some(Err(e))),
                None => return Poll::Ready(None),
            }
        }
    }
}
