//! Site identification types
//!
//! `SiteId` scopes retention limits and per-site settings.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Site identifier
///
/// Retention ceilings and item counts are tracked independently per site.
/// `SiteId::GLOBAL` (0) holds events that belong to no particular site.
///
/// # Example
///
/// ```
/// use eventlog_protocol::SiteId;
///
/// let site = SiteId::new(5);
/// assert_eq!(site.get(), 5);
/// assert!(!site.is_global());
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SiteId(u32);

impl SiteId {
    /// Events not bound to any site
    pub const GLOBAL: SiteId = SiteId(0);

    /// Create a new site ID
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw numeric ID
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Whether this is the global (no site) scope
    #[inline]
    pub const fn is_global(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "site:{}", self.0)
    }
}

impl From<u32> for SiteId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}
