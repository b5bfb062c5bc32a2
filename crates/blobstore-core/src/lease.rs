//! Lease state machine for containers and blobs.
//!
//! A lease is the service-side mutual-exclusion lock on a single container
//! or blob. The machine here is the bookkeeping a compliant service keeps
//! per resource; every transition takes an explicit `now` so expiry and
//! break windows can be tested without sleeping.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{Error, Result};

/// Shortest fixed lease duration the service accepts, in seconds.
pub const MIN_LEASE_SECONDS: u32 = 15;

/// Longest fixed lease duration the service accepts, in seconds.
pub const MAX_LEASE_SECONDS: u32 = 60;

/// Lease state as reported on container and blob properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LeaseState {
    #[default]
    Available,
    Leased,
    Expired,
    Breaking,
    Broken,
}

impl LeaseState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaseState::Available => "available",
            LeaseState::Leased => "leased",
            LeaseState::Expired => "expired",
            LeaseState::Breaking => "breaking",
            LeaseState::Broken => "broken",
        }
    }
}

/// Lease status as reported on container and blob properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LeaseStatus {
    #[default]
    Unlocked,
    Locked,
}

impl LeaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaseStatus::Unlocked => "unlocked",
            LeaseStatus::Locked => "locked",
        }
    }
}

/// Requested lease duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaseDuration {
    Infinite,
    Seconds(u32),
}

impl LeaseDuration {
    /// Builds a fixed duration, rejecting values outside the service bounds.
    pub fn fixed(secs: u32) -> Result<Self> {
        if !(MIN_LEASE_SECONDS..=MAX_LEASE_SECONDS).contains(&secs) {
            return Err(Error::Validation(format!(
                "lease duration must be between {} and {} seconds, got {}",
                MIN_LEASE_SECONDS, MAX_LEASE_SECONDS, secs
            )));
        }
        Ok(LeaseDuration::Seconds(secs))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LeaseDuration::Infinite => "infinite",
            LeaseDuration::Seconds(_) => "fixed",
        }
    }
}

/// Per-resource lease bookkeeping.
///
/// The state is never stored directly; it is derived from the recorded
/// instants, so a record read back hours later reports `Expired` or a
/// cleared break without any background task having run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeaseRecord {
    id: Option<String>,
    duration: Option<LeaseDuration>,
    expires_at: Option<DateTime<Utc>>,
    breaks_at: Option<DateTime<Utc>>,
    broken_until: Option<DateTime<Utc>>,
}

impl LeaseRecord {
    /// Derives the lease state at `now`.
    pub fn state(&self, now: DateTime<Utc>) -> LeaseState {
        if let Some(breaks_at) = self.breaks_at {
            if now < breaks_at {
                return LeaseState::Breaking;
            }
            return match self.broken_until {
                Some(until) if now < until => LeaseState::Broken,
                _ => LeaseState::Available,
            };
        }
        match self.id {
            None => LeaseState::Available,
            Some(_) => match self.expires_at {
                Some(at) if now >= at => LeaseState::Expired,
                _ => LeaseState::Leased,
            },
        }
    }

    /// Derives the lock status at `now`. A leased or breaking resource is
    /// locked; everything else is unlocked.
    pub fn status(&self, now: DateTime<Utc>) -> LeaseStatus {
        match self.state(now) {
            LeaseState::Leased | LeaseState::Breaking => LeaseStatus::Locked,
            _ => LeaseStatus::Unlocked,
        }
    }

    /// Duration kind reported on properties while the lock is held.
    pub fn duration(&self, now: DateTime<Utc>) -> Option<LeaseDuration> {
        match self.state(now) {
            LeaseState::Leased | LeaseState::Breaking => self.duration,
            _ => None,
        }
    }

    /// Acquires the lease, returning the active lease id.
    ///
    /// Honors `proposed_id` when given, otherwise generates one. Fails with
    /// `Conflict` while the lease is held (`Leased`) or breaking; a broken
    /// or expired lease can be re-acquired.
    pub fn acquire(
        &mut self,
        now: DateTime<Utc>,
        duration: LeaseDuration,
        proposed_id: Option<&str>,
    ) -> Result<String> {
        if let LeaseDuration::Seconds(secs) = duration {
            LeaseDuration::fixed(secs)?;
        }
        match self.state(now) {
            LeaseState::Leased | LeaseState::Breaking => Err(Error::Conflict(
                "there is already a lease present".to_string(),
            )),
            _ => {
                let id = proposed_id
                    .map(str::to_owned)
                    .unwrap_or_else(|| Uuid::new_v4().to_string());
                self.id = Some(id.clone());
                self.duration = Some(duration);
                self.expires_at = match duration {
                    LeaseDuration::Seconds(secs) => Some(now + Duration::seconds(i64::from(secs))),
                    LeaseDuration::Infinite => None,
                };
                self.breaks_at = None;
                self.broken_until = None;
                debug!(lease_id = %id, duration = duration.as_str(), "lease acquired");
                Ok(id)
            }
        }
    }

    /// Renews the lease, resetting the expiry clock.
    ///
    /// Valid from `Leased` with the matching id, and from `Expired` for as
    /// long as the expired holder's id is still on record (i.e. nobody else
    /// has acquired in between).
    pub fn renew(&mut self, now: DateTime<Utc>, lease_id: &str) -> Result<String> {
        match self.state(now) {
            LeaseState::Leased | LeaseState::Expired => {
                if self.id.as_deref() != Some(lease_id) {
                    return Err(Error::Conflict(
                        "lease id does not match the current holder".to_string(),
                    ));
                }
                if let Some(LeaseDuration::Seconds(secs)) = self.duration {
                    self.expires_at = Some(now + Duration::seconds(i64::from(secs)));
                }
                debug!(lease_id, "lease renewed");
                Ok(lease_id.to_owned())
            }
            _ => Err(Error::Conflict(
                "there is currently no lease to renew".to_string(),
            )),
        }
    }

    /// Swaps the active lease id without releasing the lock.
    pub fn change(
        &mut self,
        now: DateTime<Utc>,
        lease_id: &str,
        proposed_id: &str,
    ) -> Result<String> {
        if self.state(now) != LeaseState::Leased {
            return Err(Error::Conflict(
                "there is currently no lease to change".to_string(),
            ));
        }
        if self.id.as_deref() != Some(lease_id) {
            return Err(Error::Conflict(
                "lease id does not match the current holder".to_string(),
            ));
        }
        self.id = Some(proposed_id.to_owned());
        debug!(old = lease_id, new = proposed_id, "lease id changed");
        Ok(proposed_id.to_owned())
    }

    /// Starts breaking the lease, returning the seconds until the break
    /// completes.
    ///
    /// Fixed leases break after `min(period, remaining)`, defaulting to the
    /// remaining duration; infinite leases break after `period`, defaulting
    /// to immediately. Once broken the lease stays `Broken` until the
    /// original expiry instant passes (immediately for infinite leases),
    /// and only then clears back to `Available`. Breaking an already
    /// breaking lease reports the remaining break time without extending
    /// it.
    pub fn break_lease(&mut self, now: DateTime<Utc>, period: Option<u32>) -> Result<u64> {
        match self.state(now) {
            LeaseState::Leased => {
                let effective = match self.expires_at {
                    Some(expires_at) => {
                        let remaining = (expires_at - now).num_seconds().max(0) as u64;
                        period.map_or(remaining, |p| u64::from(p).min(remaining))
                    }
                    None => period.map_or(0, u64::from),
                };
                let breaks_at = now + Duration::seconds(effective as i64);
                self.broken_until = Some(match self.expires_at {
                    Some(expires_at) => expires_at.max(breaks_at),
                    None => breaks_at,
                });
                self.breaks_at = Some(breaks_at);
                debug!(period = effective, "lease breaking");
                Ok(effective)
            }
            LeaseState::Breaking => {
                let remaining = self
                    .breaks_at
                    .map(|at| (at - now).num_seconds().max(0) as u64)
                    .unwrap_or(0);
                Ok(remaining)
            }
            _ => Err(Error::Conflict(
                "there is currently no lease to break".to_string(),
            )),
        }
    }

    /// Releases the lease, clearing to `Available` immediately.
    pub fn release(&mut self, now: DateTime<Utc>, lease_id: &str) -> Result<()> {
        match self.state(now) {
            LeaseState::Leased | LeaseState::Breaking => {
                if self.id.as_deref() != Some(lease_id) {
                    return Err(Error::Conflict(
                        "lease id does not match the current holder".to_string(),
                    ));
                }
                *self = LeaseRecord::default();
                debug!(lease_id, "lease released");
                Ok(())
            }
            _ => Err(Error::Conflict(
                "there is currently no lease to release".to_string(),
            )),
        }
    }

    /// Gate for mutating operations on the leased resource.
    ///
    /// A leased or breaking resource requires the exact current id; a
    /// broken one rejects all mutation until it clears; an unleased one
    /// rejects any id presented at all.
    pub fn check_write(&self, now: DateTime<Utc>, lease_id: Option<&str>) -> Result<()> {
        match self.state(now) {
            LeaseState::Leased | LeaseState::Breaking => match lease_id {
                Some(id) if self.id.as_deref() == Some(id) => Ok(()),
                Some(_) => Err(Error::Conflict(
                    "lease id does not match the current holder".to_string(),
                )),
                None => Err(Error::Conflict(
                    "resource is leased and no lease id was presented".to_string(),
                )),
            },
            LeaseState::Broken => Err(Error::Conflict(
                "lease is broken; the resource is locked until the lease clears".to_string(),
            )),
            _ => match lease_id {
                Some(_) => Err(Error::Conflict(
                    "a lease id was presented but no lease is active".to_string(),
                )),
                None => Ok(()),
            },
        }
    }

    /// Gate for read operations: an id is only validated when presented.
    pub fn check_read(&self, now: DateTime<Utc>, lease_id: Option<&str>) -> Result<()> {
        let Some(id) = lease_id else {
            return Ok(());
        };
        match self.state(now) {
            LeaseState::Leased | LeaseState::Breaking => {
                if self.id.as_deref() == Some(id) {
                    Ok(())
                } else {
                    Err(Error::Conflict(
                        "lease id does not match the current holder".to_string(),
                    ))
                }
            }
            _ => Err(Error::Conflict(
                "a lease id was presented but no lease is active".to_string(),
            )),
        }
    }
}
