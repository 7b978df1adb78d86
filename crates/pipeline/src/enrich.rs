//! Record enrichment
//!
//! Fills in what the caller left out: event time, rendered exception text,
//! the acting user and the machine name. Enrichment is idempotent: a record
//! enriched twice ends up identical.

use chrono::{DateTime, Utc};
use eventlog_protocol::EventRecord;

/// Ambient actor lookup (the current request's user)
pub trait ActorContext: Send + Sync {
    /// Id and name of the current user, if any
    fn current_user(&self) -> Option<(u64, String)>;

    /// Name of the original user when the current one is impersonated
    fn impersonated_original_name(&self) -> Option<String> {
        None
    }

    /// Best-effort name when no user is resolved (e.g. a raw login header)
    ///
    /// Only consulted when safe user name resolution is enabled; the value is
    /// sanitized before use.
    fn fallback_user_name(&self) -> Option<String> {
        None
    }
}

/// Actor context with no current user
#[derive(Debug, Default, Clone, Copy)]
pub struct NoActor;

impl ActorContext for NoActor {
    fn current_user(&self) -> Option<(u64, String)> {
        None
    }
}

/// Actor context returning fixed values
#[derive(Debug, Default, Clone)]
pub struct FixedActor {
    pub user: Option<(u64, String)>,
    pub original: Option<String>,
    pub fallback: Option<String>,
}

impl FixedActor {
    pub fn user(id: u64, name: impl Into<String>) -> Self {
        Self {
            user: Some((id, name.into())),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn impersonated_by(mut self, original: impl Into<String>) -> Self {
        self.original = Some(original.into());
        self
    }
}

impl ActorContext for FixedActor {
    fn current_user(&self) -> Option<(u64, String)> {
        self.user.clone()
    }

    fn impersonated_original_name(&self) -> Option<String> {
        self.original.clone()
    }

    fn fallback_user_name(&self) -> Option<String> {
        self.fallback.clone()
    }
}

/// Enrichment settings resolved at construction
#[derive(Debug, Clone, Default)]
pub struct Enricher {
    /// Stamped on records without a machine name
    pub machine_name: Option<String>,

    /// Use the actor's sanitized fallback name when no user is resolved
    pub resolve_safe_user_name: bool,
}

impl Enricher {
    /// Enrich `record` in place
    pub fn enrich(&self, record: &mut EventRecord, actor: &dyn ActorContext, now: DateTime<Utc>) {
        if record.event_time.is_none() {
            record.event_time = Some(now);
        }

        if let Some(exception) = record.exception.as_ref() {
            let rendered = exception.render();
            if !record.description.ends_with(&rendered) {
                record.append_description(&rendered);
            }
        }

        self.resolve_user(record, actor);

        if record.machine_name.is_none()
            && let Some(ref machine) = self.machine_name
        {
            record.machine_name = Some(machine.clone());
        }
    }

    fn resolve_user(&self, record: &mut EventRecord, actor: &dyn ActorContext) {
        if record.user_id.is_none() && record.user_name.is_none() {
            if let Some((id, name)) = actor.current_user() {
                record.user_id = Some(id);
                record.user_name = Some(name);
            } else if self.resolve_safe_user_name
                && let Some(name) = actor.fallback_user_name()
            {
                let safe = sanitize_user_name(&name);
                if !safe.is_empty() {
                    record.user_name = Some(safe);
                }
            }
        }

        let Some(original) = actor.impersonated_original_name() else {
            return;
        };
        if let Some(ref mut name) = record.user_name {
            let suffix = format!(" ({original})");
            if *name != original && !name.ends_with(&suffix) {
                name.push_str(&suffix);
            }
        }
    }
}

/// Keep characters valid in a user name, replacing the rest with `_`
///
/// ```
/// use eventlog_pipeline::sanitize_user_name;
///
/// assert_eq!(sanitize_user_name(" DOMAIN\\jane doe "), "DOMAIN_jane_doe");
/// ```
pub fn sanitize_user_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '_' | '-' | '@') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "enrich_test.rs"]
mod enrich_test;
