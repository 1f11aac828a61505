//! Build-tool settings discovery.
//!
//! Resolves the local artifact repository the way Maven does: an explicit
//! `<localRepository>` in `~/.m2/settings.xml` wins, otherwise
//! `~/.m2/repository`. Recorded once per invocation on the execution
//! context.

use reweave_core::context::ExecutionContext;
use std::path::PathBuf;
use tracing::debug;

/// Initialize build-tool settings on the context, if not already done.
pub fn initialize_settings(ctx: &mut ExecutionContext) {
    if ctx.local_repository().is_some() {
        return;
    }
    if let Some(repository) = discover_local_repository() {
        debug!("using local artifact repository {}", repository.display());
        ctx.set_local_repository(repository);
    }
}

fn discover_local_repository() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)?;
    let m2 = home.join(".m2");

    if let Ok(xml) = std::fs::read_to_string(m2.join("settings.xml"))
        && let Some(repository) = local_repository_from_settings(&xml)
    {
        return Some(repository);
    }
    Some(m2.join("repository"))
}

/// Extract `<localRepository>` from a settings document.
fn local_repository_from_settings(xml: &str) -> Option<PathBuf> {
    let doc = roxmltree::Document::parse(xml).ok()?;
    doc.root_element()
        .children()
        .find(|n| n.is_element() && n.has_tag_name("localRepository"))
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_repository_from_settings() {
        let xml = r#"<settings>
            <localRepository>/data/maven-repo</localRepository>
        </settings>"#;
        assert_eq!(
            local_repository_from_settings(xml),
            Some(PathBuf::from("/data/maven-repo"))
        );
    }

    #[test]
    fn test_settings_without_local_repository() {
        assert_eq!(local_repository_from_settings("<settings/>"), None);
        assert_eq!(local_repository_from_settings("not xml"), None);
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let mut ctx = ExecutionContext::new();
        ctx.set_local_repository(PathBuf::from("/preset"));
        initialize_settings(&mut ctx);
        assert_eq!(ctx.local_repository(), Some(std::path::Path::new("/preset")));
    }
}
