//! Fault jail — scoped error isolation around untrusted/unreliable code
//!
//! Every boundary crossing into module, plugin, report, or post-audit-hook
//! code runs through here so a single bad module cannot take down a scan
//! (spec §7, §9). A caught fault is logged with its label and swallowed;
//! the caller gets `Ok(None)` instead of a hard error.

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::error;

use crate::error::Result;

/// Run `fut` under the jail, converting both a returned `Err` and a panic
/// into a logged, recovered fault. Returns `Ok(None)` on either, `Ok(Some(value))`
/// on success.
pub async fn run<T, F>(label: &str, fut: F) -> Result<Option<T>>
where
    F: Future<Output = Result<T>>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(value)) => Ok(Some(value)),
        Ok(Err(e)) => {
            error!(target: "fault_jail", label, error = %e, "recovered fault");
            Ok(None)
        }
        Err(panic) => {
            let message = panic_message(&panic);
            error!(target: "fault_jail", label, panic = %message, "recovered panic");
            Ok(None)
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuditError;

    #[tokio::test]
    async fn test_run_success() {
        let result = run("test", async { Ok::<_, AuditError>(42) }).await;
        assert_eq!(result.unwrap(), Some(42));
    }

    #[tokio::test]
    async fn test_run_recovers_error() {
        let result = run("test", async {
            Err::<i32, _>(AuditError::ConfigError("boom".to_string()))
        })
        .await;
        assert_eq!(result.unwrap(), None);
    }

    #[tokio::test]
    async fn test_run_recovers_panic() {
        let result: Result<Option<i32>> = run("test", async {
            panic!("module exploded");
            #[allow(unreachable_code)]
            Ok(1)
        })
        .await;
        assert_eq!(result.unwrap(), None);
    }
}
