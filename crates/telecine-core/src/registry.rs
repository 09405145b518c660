//! Process-wide element registry
//!
//! Custom element registration is a one-time side effect; repeated
//! module initialization must not register twice. This is the
//! explicit init-once registry with a query, instead of a shared
//! global binding.

use std::collections::HashSet;
use std::sync::{Mutex, OnceLock};
use tracing::debug;

/// Tag name the video element registers under
pub const ELEMENT_TAG: &str = "telecine-video";

fn registry() -> &'static Mutex<HashSet<String>> {
    static REGISTRY: OnceLock<Mutex<HashSet<String>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashSet::new()))
}

/// Register a tag name; returns false when it was already defined
pub fn define(name: &str) -> bool {
    let mut defined = registry().lock().expect("registry lock poisoned");
    if defined.contains(name) {
        debug!(name, "element already defined, skipping registration");
        return false;
    }
    defined.insert(name.to_string());
    true
}

/// Whether a tag name has been registered in this process
pub fn is_defined(name: &str) -> bool {
    registry()
        .lock()
        .expect("registry lock poisoned")
        .contains(name)
}
