//! Collaborator traits
//!
//! The pipeline only ever talks to storage and output through these traits,
//! so hosts can plug in their own database or mailer.

use eventlog_protocol::{EventRecord, SiteId};

use crate::Result;

/// Scope of a bulk delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteFilter {
    /// Every site, including global events
    All,
    /// A single site partition
    Site(SiteId),
}

impl SiteFilter {
    /// Whether a record in `site` falls inside this filter
    #[inline]
    pub fn matches(self, site: SiteId) -> bool {
        match self {
            Self::All => true,
            Self::Site(id) => id == site,
        }
    }
}

/// Persistent event storage
///
/// Implementations must be safe to call from the writing thread, the queue
/// worker and the retention thread at the same time.
pub trait Store: Send + Sync {
    /// Persist a record and return its assigned id (never 0)
    fn insert(&self, record: &EventRecord) -> Result<u64>;

    /// Overwrite an already persisted record
    fn update(&self, record: &EventRecord) -> Result<()>;

    /// Delete the oldest records of a site
    ///
    /// Removes at most `cap` records, and never brings the site below
    /// `max_size`. Returns the number of records removed.
    fn delete_oldest(&self, site: SiteId, max_size: u64, cap: u64) -> Result<u64>;

    /// Current number of records stored for a site
    fn count(&self, site: SiteId) -> Result<u64>;

    /// Delete every record matching the filter, returning how many were removed
    fn bulk_delete(&self, filter: SiteFilter) -> Result<u64>;

    /// Whether the store can accept writes right now
    fn is_available(&self) -> bool {
        true
    }
}

/// Visible or durable output for accepted records (file, trace, ...)
pub trait EventSink: Send + Sync {
    /// Short name used in diagnostics
    fn name(&self) -> &str;

    /// Write one record
    fn write(&self, record: &EventRecord) -> Result<()>;
}

/// Receives error events for out-of-band notification (mail, pager)
pub trait NotificationSink: Send + Sync {
    fn notify_error(&self, record: &EventRecord, site_name: Option<&str>) -> Result<()>;
}
