//! Thin ureq wrapper shared by the live backends.
//!
//! Transient failures get a bounded retry with backoff here, at the adapter
//! layer, so the orchestrator never has to reason about network flakiness.
use anyhow::{Context, Result};
use serde_json::Value;
use std::thread;
use std::time::Duration;

const MAX_ATTEMPTS: usize = 3;
const BACKOFF_BASE_MS: u64 = 250;

/// Retry a fallible call up to three times with doubling backoff.
pub fn with_retry<T>(label: &str, mut call: impl FnMut() -> Result<T>) -> Result<T> {
    let mut last_err = None;
    for attempt in 0..MAX_ATTEMPTS {
        if attempt > 0 {
            thread::sleep(Duration::from_millis(BACKOFF_BASE_MS << (attempt - 1)));
        }
        match call() {
            Ok(value) => return Ok(value),
            Err(err) => {
                tracing::warn!(%label, attempt = attempt + 1, %err, "backend call failed");
                last_err = Some(err);
            }
        }
    }
    Err(last_err.expect("at least one attempt ran")).with_context(|| format!("{label} failed after {MAX_ATTEMPTS} attempts"))
}

/// POST a JSON body with a bearer token, returning the parsed JSON response.
pub fn post_json(url: &str, bearer: Option<&str>, body: &Value) -> Result<Value> {
    with_retry(url, || {
        let mut request = ureq::post(url);
        if let Some(token) = bearer {
            request = request.header("Authorization", &format!("Bearer {token}"));
        }
        let mut response = request.send_json(body).context("send request")?;
        let value: Value = response.body_mut().read_json().context("parse response JSON")?;
        Ok(value)
    })
}

/// GET a JSON resource with a bearer token and query parameters.
pub fn get_json(url: &str, bearer: Option<&str>, query: &[(&str, String)]) -> Result<Value> {
    with_retry(url, || {
        let mut request = ureq::get(url);
        if let Some(token) = bearer {
            request = request.header("Authorization", &format!("Bearer {token}"));
        }
        for (key, value) in query {
            request = request.query(key, value);
        }
        let mut response = request.call().context("send request")?;
        let value: Value = response.body_mut().read_json().context("parse response JSON")?;
        Ok(value)
    })
}

/// POST a raw byte payload (video upload), returning the parsed JSON response.
pub fn post_bytes(
    url: &str,
    bearer: Option<&str>,
    query: &[(&str, String)],
    content_type: &str,
    bytes: &[u8],
) -> Result<Value> {
    with_retry(url, || {
        let mut request = ureq::post(url).header("Content-Type", content_type);
        if let Some(token) = bearer {
            request = request.header("Authorization", &format!("Bearer {token}"));
        }
        for (key, value) in query {
            request = request.query(key, value);
        }
        let mut response = request.send(bytes).context("send request")?;
        let value: Value = response.body_mut().read_json().context("parse response JSON")?;
        Ok(value)
    })
}

/// Fetch a binary resource (rendered video download). Not retried; callers
/// treat a failed download as best-effort.
pub fn get_bytes(url: &str) -> Result<Vec<u8>> {
    let mut response = ureq::get(url).call().context("send request")?;
    let bytes = response
        .body_mut()
        .read_to_vec()
        .context("read response body")?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn with_retry_returns_first_success() {
        let mut calls = 0;
        let result: Result<i32> = with_retry("test", || {
            calls += 1;
            if calls < 2 {
                Err(anyhow!("transient"))
            } else {
                Ok(7)
            }
        });
        assert_eq!(result.expect("retried"), 7);
        assert_eq!(calls, 2);
    }

    #[test]
    fn with_retry_gives_up_after_bound() {
        let mut calls = 0;
        let result: Result<i32> = with_retry("test", || {
            calls += 1;
            Err(anyhow!("always"))
        });
        assert!(result.is_err());
        assert_eq!(calls, 3);
    }
}
