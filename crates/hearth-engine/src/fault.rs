//! Isolated failure boundary shared by the container teardown and the tick pass.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Runs `f`, turning both a returned error and a panic into a message.
///
/// The caller decides how the fault is reported; execution always continues.
pub(crate) fn isolate<F>(f: F) -> Result<(), String>
where
    F: FnOnce() -> anyhow::Result<()>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(format!("{err:#}")),
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked with a non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_passes_through() {
        assert_eq!(isolate(|| Ok(())), Ok(()));
    }

    #[test]
    fn error_chain_is_rendered() {
        let msg = isolate(|| Err(anyhow::anyhow!("inner").context("outer"))).unwrap_err();
        assert_eq!(msg, "outer: inner");
    }

    #[test]
    fn panic_is_captured() {
        let msg = isolate(|| panic!("boom {}", 7)).unwrap_err();
        assert_eq!(msg, "panicked: boom 7");
    }
}
