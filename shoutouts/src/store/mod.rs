//! Persistence boundary for shoutout records
//!
//! Handlers are generic over [`ShoutoutStore`]. Two implementations exist:
//! [`MongoShoutoutStore`] backed by a MongoDB collection and
//! [`MemoryShoutoutStore`] kept in process memory.

use std::future::Future;

use crate::error::Result;
use crate::model::{RecipientCount, Shoutout, ShoutoutId};
use crate::query::ShoutoutFilter;

mod memory;
mod mongo;

pub use memory::MemoryShoutoutStore;
pub use mongo::{top_recipients_pipeline, MongoShoutoutStore};

/// Number of entries returned by the top-five ranking
pub const TOP_RECIPIENTS_LIMIT: i64 = 5;

/// Storage operations used by the HTTP resource
///
/// All methods go to the backing store on every call; nothing is cached.
pub trait ShoutoutStore: Send + Sync {
    /// All records matching the filter, in storage order
    fn find(&self, filter: &ShoutoutFilter) -> impl Future<Output = Result<Vec<Shoutout>>> + Send;

    /// The record with this identifier, if any
    fn find_by_id(&self, id: &ShoutoutId) -> impl Future<Output = Result<Option<Shoutout>>> + Send;

    /// Recipients ranked by number of shoutouts received, highest first,
    /// at most `limit` entries
    fn top_recipients(
        &self,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<RecipientCount>>> + Send;

    /// Store a new record and return its freshly assigned identifier
    ///
    /// Any identifier on `shoutout` is ignored.
    fn insert(&self, shoutout: &Shoutout) -> impl Future<Output = Result<ShoutoutId>> + Send;

    /// Remove the record; `false` when it did not exist
    fn delete(&self, id: &ShoutoutId) -> impl Future<Output = Result<bool>> + Send;

    /// Replace the whole record, keeping its identifier; `false` when it did not exist
    fn replace(
        &self,
        id: &ShoutoutId,
        shoutout: &Shoutout,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Check that the backing store is reachable
    fn ping(&self) -> impl Future<Output = Result<()>> + Send;
}
