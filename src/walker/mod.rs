//! Bounded-concurrency crawler
//!
//! The crawl engine and the combinators share one bounded task queue.
//! Every stat/readdir and every user callback occupies a queue slot while
//! it runs, so at most `concurrency` of them are in flight at once.
//!
//! # Architecture
//!
//! ```text
//!                     ┌─────────────────────────┐
//!                     │        Crawler          │
//!                     │  - crawl_all            │
//!                     │  - for_each / map       │
//!                     │  - filter / reduce      │
//!                     └───────────┬─────────────┘
//!                                 │
//!                                 ▼
//!                     ┌─────────────────────────┐
//!                     │       TaskQueue         │
//!                     │  - FIFO pending tasks   │
//!                     │  - running ≤ limit      │
//!                     └───────────┬─────────────┘
//!                                 │
//!       ┌─────────────────────────┼─────────────────────────┐
//!       │                         │                         │
//! ┌─────▼─────┐             ┌─────▼─────┐             ┌─────▼─────┐
//! │  Slot 1   │             │  Slot 2   │             │  Slot N   │
//! │ stat+list │             │ callback  │             │ stat+list │
//! └───────────┘             └───────────┘             └───────────┘
//! ```

mod aggregate;
mod combinators;
pub mod crawl;
pub mod queue;

pub(crate) use combinators::panic_message;
pub use crawl::{CrawlStats, Crawler};
pub use queue::{Completion, QueueStats, TaskQueue, DEFAULT_CONCURRENCY};
