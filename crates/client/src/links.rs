//! Credit links.

/// Open an external page in the default browser.
///
/// Failures are logged and otherwise ignored; losing a credits link is not
/// worth interrupting the scene.
pub fn open(url: &str) {
    tracing::debug!("opening {url}");
    if let Err(e) = webbrowser::open(url) {
        tracing::warn!("failed to open {url}: {e}");
    }
}
