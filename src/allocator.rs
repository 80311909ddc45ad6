//! Short code allocation
//!
//! Candidates are random strings over `[a-zA-Z0-9]`. Each length gets a fixed number
//! of attempts before the allocator moves on to a longer code, so allocation always
//! terminates: either a code is committed, the maximum length is exhausted, or the
//! caller's deadline passes.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::{distr::Alphanumeric, Rng};
use tokio::time::{timeout_at, Instant};

use crate::error::LinkError;
use crate::model::{is_redirectable, is_reserved_code, ShortLink, MAX_CODE_LENGTH};
use crate::store::LinkStore;

/// Tuning knobs for [`CodeAllocator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocatorConfig {
    /// Length of the first candidates tried
    pub default_length: usize,
    /// Longest code the allocator will ever produce
    pub max_length: usize,
    /// Collisions tolerated at one length before growing the code
    pub attempts_per_length: usize,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            default_length: 6,
            max_length: MAX_CODE_LENGTH,
            attempts_per_length: 5,
        }
    }
}

impl AllocatorConfig {
    pub fn validate(&self) -> Result<(), LinkError> {
        if self.max_length > MAX_CODE_LENGTH {
            return Err(LinkError::InvalidInput(format!(
                "max code length {} exceeds {}",
                self.max_length, MAX_CODE_LENGTH
            )));
        }
        if self.default_length == 0 || self.default_length > self.max_length {
            return Err(LinkError::InvalidInput(format!(
                "default code length {} must be between 1 and {}",
                self.default_length, self.max_length
            )));
        }
        if self.attempts_per_length == 0 {
            return Err(LinkError::InvalidInput(
                "attempts per length must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of one pass through the generate/check/insert cycle
#[derive(Debug)]
enum Attempt {
    Committed(ShortLink),
    /// A free candidate was taken by a concurrent insert between check and put
    ConflictRetry,
    Exhausted,
}

/// Produces unique codes and registers them in a [`LinkStore`]
///
/// The allocator owns no mutable state; it can be cloned and shared freely.
#[derive(Clone)]
pub struct CodeAllocator {
    store: Arc<dyn LinkStore>,
    config: AllocatorConfig,
}

impl CodeAllocator {
    pub fn new(store: Arc<dyn LinkStore>, config: AllocatorConfig) -> Result<Self, LinkError> {
        config.validate()?;
        Ok(Self { store, config })
    }

    /// Allocates a code for `target_url` and stores the new link
    ///
    /// Input is validated before any code is generated, so rejected requests leave
    /// the store untouched. Fails with [`LinkError::Timeout`] once `deadline` passes.
    pub async fn allocate(
        &self,
        target_url: &str,
        expires_at: Option<DateTime<Utc>>,
        deadline: Instant,
    ) -> Result<ShortLink, LinkError> {
        if target_url.is_empty() {
            return Err(LinkError::InvalidInput("url must not be empty".to_string()));
        }
        if !is_redirectable(target_url) {
            return Err(LinkError::InvalidInput(
                "url contains characters not allowed in a redirect".to_string(),
            ));
        }
        if let Some(expires_at) = expires_at {
            if expires_at <= Utc::now() {
                return Err(LinkError::InvalidInput(
                    "expiration must be in the future".to_string(),
                ));
            }
        }

        loop {
            match self.attempt(target_url, expires_at, deadline).await? {
                Attempt::Committed(link) => {
                    tracing::debug!(code = %link.code, "short code allocated");
                    return Ok(link);
                }
                Attempt::ConflictRetry => {
                    tracing::debug!("lost insert race, restarting allocation");
                }
                Attempt::Exhausted => {
                    return Err(LinkError::AllocationExhausted {
                        max_length: self.config.max_length,
                    });
                }
            }
        }
    }

    async fn attempt(
        &self,
        target_url: &str,
        expires_at: Option<DateTime<Utc>>,
        deadline: Instant,
    ) -> Result<Attempt, LinkError> {
        for length in self.config.default_length..=self.config.max_length {
            for _ in 0..self.config.attempts_per_length {
                let candidate = generate_code(length);
                if is_reserved_code(&candidate) {
                    continue;
                }

                if within(deadline, self.store.exists(&candidate)).await? {
                    tracing::trace!(%candidate, "candidate collided");
                    continue;
                }

                // A started insert is never cut off; its outcome is always reported
                check_deadline(deadline)?;
                return match self.store.put(&candidate, target_url, expires_at).await {
                    Ok(link) => Ok(Attempt::Committed(link)),
                    Err(LinkError::CodeConflict(_)) => Ok(Attempt::ConflictRetry),
                    Err(err) => Err(err),
                };
            }

            tracing::debug!(length, "all candidates collided, growing code length");
        }

        Ok(Attempt::Exhausted)
    }
}

fn check_deadline(deadline: Instant) -> Result<(), LinkError> {
    if Instant::now() >= deadline {
        return Err(LinkError::Timeout);
    }
    Ok(())
}

/// Runs a read-only store call, giving up once `deadline` has passed
async fn within<T>(
    deadline: Instant,
    op: impl Future<Output = Result<T, LinkError>>,
) -> Result<T, LinkError> {
    check_deadline(deadline)?;
    timeout_at(deadline, op)
        .await
        .map_err(|_| LinkError::Timeout)?
}

/// Random alphanumeric code drawn from the thread-local CSPRNG
pub fn generate_code(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
