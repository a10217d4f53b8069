use rand::Rng;

use super::jobs::{Job, JobPool};

/// What the player's hand is holding.
///
/// Transitions are driven by gesture signals: an open hand can spawn a
/// job into an empty slot, a pinch resolves a held one. All other
/// combinations are no-ops, which is what makes a held job "steady"
/// while the hand drifts through the dead zone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum JobSlot {
    #[default]
    Empty,
    Held(Job),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpawnOutcome {
    /// A fresh listing was drawn and is now held.
    Presented(Job),
    /// Something is already held; the open hand changes nothing.
    AlreadyHeld,
    /// No listings to draw from.
    PoolEmpty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveOutcome {
    Accepted(Job),
    Rejected(Job),
    /// Pinched on air.
    NothingHeld,
}

impl JobSlot {
    pub fn is_held(&self) -> bool {
        matches!(self, JobSlot::Held(_))
    }

    pub fn held_job(&self) -> Option<&Job> {
        match self {
            JobSlot::Held(job) => Some(job),
            JobSlot::Empty => None,
        }
    }

    pub fn try_spawn<R: Rng + ?Sized>(&mut self, pool: &JobPool, rng: &mut R) -> SpawnOutcome {
        if self.is_held() {
            return SpawnOutcome::AlreadyHeld;
        }
        match pool.sample(rng) {
            Some(job) => {
                *self = JobSlot::Held(job.clone());
                SpawnOutcome::Presented(job.clone())
            }
            None => SpawnOutcome::PoolEmpty,
        }
    }

    pub fn try_resolve(&mut self) -> ResolveOutcome {
        match std::mem::take(self) {
            JobSlot::Empty => ResolveOutcome::NothingHeld,
            JobSlot::Held(job) => {
                if job.is_acceptable() {
                    ResolveOutcome::Accepted(job)
                } else {
                    ResolveOutcome::Rejected(job)
                }
            }
        }
    }
}
