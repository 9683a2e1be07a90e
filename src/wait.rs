// This file is part of the terraform-provider-flexibleengine project
//
// Copyright (C) ANEO, 2024-2024. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License")
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Polling of asynchronous cloud operations

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::client::CloudError;

const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Wait for a resource to move from pending states to target states
#[derive(Debug, Clone)]
pub struct StateChangeConf {
    pending: Vec<String>,
    target: Vec<String>,
    timeout: Duration,
    delay: Duration,
    poll_interval: Option<Duration>,
    min_timeout: Duration,
    not_found_checks: u32,
    continuous_target_occurrence: u32,
}

impl StateChangeConf {
    pub fn new(pending: &[&str], target: &[&str], timeout: Duration) -> Self {
        Self {
            pending: pending.iter().map(|s| s.to_string()).collect(),
            target: target.iter().map(|s| s.to_string()).collect(),
            timeout,
            delay: Duration::ZERO,
            poll_interval: None,
            min_timeout: Duration::from_millis(500),
            not_found_checks: 20,
            continuous_target_occurrence: 1,
        }
    }

    /// Time to wait before the first refresh
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fixed time between refreshes, disables the exponential backoff
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Initial time between refreshes of the exponential backoff
    pub fn min_timeout(mut self, min_timeout: Duration) -> Self {
        self.min_timeout = min_timeout;
        self
    }

    pub fn not_found_checks(mut self, checks: u32) -> Self {
        self.not_found_checks = checks;
        self
    }

    pub fn continuous_target_occurrence(mut self, occurrences: u32) -> Self {
        self.continuous_target_occurrence = occurrences.max(1);
        self
    }

    /// Refresh until a target state is reached.
    ///
    /// `refresh` returns `None` when the resource is not found, or the resource with its current state.
    pub async fn wait_for_state<T, F, Fut>(&self, mut refresh: F) -> Result<T, CloudError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<(T, String)>, CloudError>>,
    {
        let mut last_state = String::new();
        match tokio::time::timeout(self.timeout, self.poll(&mut refresh, &mut last_state)).await {
            Ok(result) => result,
            Err(_) => Err(CloudError::Timeout {
                last_state,
                expected: self.target.clone(),
            }),
        }
    }

    async fn poll<T, F, Fut>(&self, refresh: &mut F, last_state: &mut String) -> Result<T, CloudError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<(T, String)>, CloudError>>,
    {
        tokio::time::sleep(self.delay).await;

        let mut not_found = 0;
        let mut target_occurrences = 0;
        let mut backoff = self.min_timeout;
        loop {
            match refresh().await? {
                None => {
                    target_occurrences = 0;
                    not_found += 1;
                    if not_found > self.not_found_checks {
                        return Err(CloudError::ResourceGone);
                    }
                }
                Some((value, state)) => {
                    not_found = 0;
                    debug!(state, pending = ?self.pending, target = ?self.target, "refreshed state");
                    if self.target.contains(&state) {
                        target_occurrences += 1;
                        if target_occurrences >= self.continuous_target_occurrence {
                            return Ok(value);
                        }
                    } else if self.pending.contains(&state) {
                        target_occurrences = 0;
                    } else {
                        return Err(CloudError::UnexpectedState {
                            state,
                            expected: self.target.clone(),
                        });
                    }
                    *last_state = state;
                }
            }

            let wait = match self.poll_interval {
                Some(interval) => interval,
                None => {
                    let wait = backoff;
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                    wait
                }
            };
            tokio::time::sleep(wait).await;
        }
    }
}

/// Run `op` again while it fails with a retryable error, until `timeout` expires
pub async fn retry<T, F, Fut>(timeout: Duration, mut op: F) -> Result<T, CloudError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CloudError>>,
{
    // No deadline when the timeout is too large to be represented
    let deadline = Instant::now().checked_add(timeout);
    let mut backoff = Duration::from_millis(500);
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() => {
                let now = Instant::now();
                if deadline.is_some_and(|deadline| now >= deadline) {
                    return Err(err);
                }
                warn!("retrying after error: {err}");
                let wait = deadline.map_or(backoff, |deadline| backoff.min(deadline - now));
                tokio::time::sleep(wait).await;
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::client::Method;

    fn conflict() -> CloudError {
        CloudError::from_status(409, &[200], Method::Put, "url", String::new())
    }

    #[tokio::test(start_paused = true)]
    async fn reaches_target() {
        let calls = &AtomicU32::new(0);
        let conf = StateChangeConf::new(&["starting"], &["running"], Duration::from_secs(60))
            .delay(Duration::from_secs(5))
            .poll_interval(Duration::from_secs(1));
        let result = conf
            .wait_for_state(|| async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                let state = if n < 3 { "starting" } else { "running" };
                Ok(Some((n, state.to_string())))
            })
            .await
            .unwrap();
        assert_eq!(result, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn continuous_target() {
        let calls = &AtomicU32::new(0);
        let states = &["running", "starting", "running", "running"];
        let conf = StateChangeConf::new(&["starting"], &["running"], Duration::from_secs(60))
            .continuous_target_occurrence(2);
        let result = conf
            .wait_for_state(|| async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) as usize;
                Ok(Some((n, states[n].to_string())))
            })
            .await
            .unwrap();
        assert_eq!(result, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn unexpected_state() {
        let conf = StateChangeConf::new(&["starting"], &["running"], Duration::from_secs(60));
        let err = conf
            .wait_for_state(|| async move { Ok(Some(((), "failed".to_string()))) })
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::UnexpectedState { state, .. } if state == "failed"));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_keeps_last_state() {
        let conf = StateChangeConf::new(&["terminating"], &["terminated"], Duration::from_secs(30))
            .poll_interval(Duration::from_secs(10));
        let err = conf
            .wait_for_state(|| async move { Ok(Some(((), "terminating".to_string()))) })
            .await
            .unwrap_err();
        match err {
            CloudError::Timeout {
                last_state,
                expected,
            } => {
                assert_eq!(last_state, "terminating");
                assert_eq!(expected, vec!["terminated".to_string()]);
            }
            err => panic!("unexpected error {err}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_when_not_found() {
        let calls = &AtomicU32::new(0);
        let conf = StateChangeConf::new(&["creating"], &["active"], Duration::from_secs(3600))
            .not_found_checks(3);
        let err = conf
            .wait_for_state(|| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(None::<((), String)>)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::ResourceGone));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_error_aborts() {
        let conf = StateChangeConf::new(&["creating"], &["active"], Duration::from_secs(60));
        let err = conf
            .wait_for_state(|| async move { Err::<Option<((), String)>, _>(CloudError::Auth("no".into())) })
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::Auth(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_until_success() {
        let calls = &AtomicU32::new(0);
        let result = retry(Duration::from_secs(60), || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(conflict())
            } else {
                Ok("done")
            }
        })
        .await
        .unwrap();
        assert_eq!(result, "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_with_unbounded_timeout() {
        let calls = &AtomicU32::new(0);
        let result = retry(Duration::MAX, || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 1 {
                Err(conflict())
            } else {
                Ok("done")
            }
        })
        .await
        .unwrap();
        assert_eq!(result, "done");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_stops_on_other_errors() {
        let calls = &AtomicU32::new(0);
        let err = retry(Duration::from_secs(60), || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(CloudError::from_status(
                400,
                &[200],
                Method::Put,
                "url",
                String::new(),
            ))
        })
        .await
        .unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_times_out_with_last_error() {
        let err = retry(Duration::from_secs(5), || async move { Err::<(), _>(conflict()) })
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(409));
    }
}
