//! Audible notification after a screenshot has been processed.

use std::io::Write;

use tracing::trace;

/// Something that tells the player a screenshot was processed.
pub trait Notifier {
    /// Signal that a new screenshot produced output.
    fn notify(&self);
}

/// Rings the terminal bell.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bell;

impl Notifier for Bell {
    fn notify(&self) {
        let mut stderr = std::io::stderr().lock();
        // A bell that cannot be rung is not worth failing over.
        if stderr.write_all(b"\x07").and_then(|()| stderr.flush()).is_err() {
            trace!("Could not write terminal bell");
        }
    }
}

/// Does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl Notifier for Silent {
    fn notify(&self) {}
}

/// Pick the notifier for the `beep` setting.
#[must_use]
pub fn from_config(beep: bool) -> Box<dyn Notifier> {
    if beep {
        Box::new(Bell)
    } else {
        Box::new(Silent)
    }
}
