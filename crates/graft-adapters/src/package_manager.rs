//! Package manager detection.
//!
//! Lock files win: the directories from the project up to the monorepo root
//! are searched, closest first. Without a lock file the user agent the
//! package manager exports to scripts (`npm_config_user_agent`) decides, and
//! npm is the fallback.

use std::path::Path;

use graft_core::domain::PackageManager;
use tracing::debug;

/// Environment variable package managers set for the scripts they run.
pub const USER_AGENT_VAR: &str = "npm_config_user_agent";

/// Package manager whose lock file sits in `dir`.
pub fn from_lockfile(dir: &Path) -> Option<PackageManager> {
    PackageManager::ALL.into_iter().find(|pm| {
        pm.lockfiles()
            .iter()
            .any(|lockfile| dir.join(lockfile).is_file())
    })
}

/// Detect the package manager for a project at `cwd` inside `root`.
pub fn detect(cwd: &Path, root: &Path, user_agent: Option<&str>) -> PackageManager {
    for dir in cwd.ancestors() {
        if let Some(pm) = from_lockfile(dir) {
            debug!(%pm, dir = %dir.display(), "package manager from lock file");
            return pm;
        }
        if dir == root {
            break;
        }
    }
    if let Some(pm) = user_agent.and_then(PackageManager::from_user_agent) {
        debug!(%pm, "package manager from user agent");
        return pm;
    }
    PackageManager::default()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn closest_lockfile_wins() {
        let root = tempfile::tempdir().unwrap();
        let app = root.path().join("apps/web");
        fs::create_dir_all(&app).unwrap();
        fs::write(root.path().join("pnpm-lock.yaml"), "").unwrap();
        assert_eq!(detect(&app, root.path(), Some("yarn/1.22.0")), PackageManager::Pnpm);

        fs::write(app.join("bun.lockb"), "").unwrap();
        assert_eq!(detect(&app, root.path(), None), PackageManager::Bun);
    }

    #[test]
    fn search_stops_at_the_root() {
        let outer = tempfile::tempdir().unwrap();
        let root = outer.path().join("repo");
        fs::create_dir_all(&root).unwrap();
        fs::write(outer.path().join("yarn.lock"), "").unwrap();
        assert_eq!(detect(&root, &root, None), PackageManager::Npm);
    }

    #[test]
    fn user_agent_is_the_second_choice() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            detect(dir.path(), dir.path(), Some("pnpm/9.1.0 npm/? node/v20.11.0")),
            PackageManager::Pnpm
        );
        assert_eq!(detect(dir.path(), dir.path(), Some("garbage")), PackageManager::Npm);
    }
}
