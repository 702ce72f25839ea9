use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathDenied {
    #[error("access denied: cannot resolve {path} ({reason})")]
    Unresolvable { path: String, reason: String },

    #[error("access denied: {path} is outside the allowed directories")]
    OutsideRoots { path: String },
}

/// Root-containment check for caller-supplied paths.
///
/// Both the candidate and every root are canonicalized (absolute, symlinks resolved) before
/// a component-wise containment test, so `..` segments, symlinks pointing out of a root, and
/// sibling directories sharing a name prefix (`/data` vs `/data2`) are all rejected.
///
/// Only a guard built from an empty list is unrestricted: every path is permitted.
/// Operators opt into that by leaving `DEEPSEEK_ALLOWED_ROOTS` unset; startup logs a warning
/// when they do. Malformed entries are dropped, and a non-empty list that leaves no usable
/// root denies everything.
#[derive(Debug, Clone, Default)]
pub struct PathGuard {
    roots: Vec<PathBuf>,
    configured: bool,
}

impl PathGuard {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        let configured = !roots.is_empty();
        let roots = roots
            .into_iter()
            .filter(|root| !root.as_os_str().is_empty())
            .collect();
        Self { roots, configured }
    }

    pub fn is_unrestricted(&self) -> bool {
        !self.configured
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn is_allowed(&self, candidate: &Path) -> bool {
        self.is_unrestricted() || self.check(candidate).is_ok()
    }

    /// Resolve `candidate` and return its real path if it lies inside an allowed root.
    ///
    /// Any resolution failure (missing file, dangling symlink, permission error) is a denial.
    /// With no roots configured the candidate is returned resolved when possible and
    /// unchanged otherwise, leaving existence checks to the loader.
    pub fn check(&self, candidate: &Path) -> Result<PathBuf, PathDenied> {
        let resolved = match candidate.canonicalize() {
            Ok(resolved) => resolved,
            Err(_) if self.is_unrestricted() => return Ok(candidate.to_path_buf()),
            Err(err) => {
                return Err(PathDenied::Unresolvable {
                    path: candidate.display().to_string(),
                    reason: err.to_string(),
                })
            }
        };

        if self.is_unrestricted() {
            return Ok(resolved);
        }

        for root in &self.roots {
            let Ok(root) = root.canonicalize() else {
                log::debug!("Skipping unresolvable allowed root {}", root.display());
                continue;
            };
            // `starts_with` compares whole components; an equal path counts as contained.
            if resolved.starts_with(&root) {
                return Ok(resolved);
            }
        }

        Err(PathDenied::OutsideRoots {
            path: candidate.display().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    struct Fixture {
        _tmp: tempfile::TempDir,
        base: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = tempfile::tempdir().unwrap();
            let base = tmp.path().canonicalize().unwrap();
            fs::create_dir_all(base.join("data/nested")).unwrap();
            fs::create_dir_all(base.join("data2")).unwrap();
            fs::create_dir_all(base.join("secret")).unwrap();
            fs::write(base.join("data/a.txt"), "a").unwrap();
            fs::write(base.join("data/nested/b.txt"), "b").unwrap();
            fs::write(base.join("data2/c.txt"), "c").unwrap();
            fs::write(base.join("secret/file.txt"), "s").unwrap();
            Self { _tmp: tmp, base }
        }

        fn guard(&self, roots: &[&str]) -> PathGuard {
            PathGuard::new(roots.iter().map(|r| self.base.join(r)).collect())
        }
    }

    #[test]
    fn allows_descendants_and_the_root_itself() {
        let fx = Fixture::new();
        let guard = fx.guard(&["data"]);
        assert!(guard.is_allowed(&fx.base.join("data/a.txt")));
        assert!(guard.is_allowed(&fx.base.join("data/nested/b.txt")));
        assert!(guard.is_allowed(&fx.base.join("data")));
    }

    #[test]
    fn rejects_traversal_out_of_root() {
        let fx = Fixture::new();
        let guard = fx.guard(&["data"]);
        let candidate = fx.base.join("data/../secret/file.txt");
        assert!(!guard.is_allowed(&candidate));
        assert!(matches!(
            guard.check(&candidate),
            Err(PathDenied::OutsideRoots { .. })
        ));
    }

    #[test]
    fn rejects_sibling_sharing_a_name_prefix() {
        let fx = Fixture::new();
        let guard = fx.guard(&["data"]);
        assert!(!guard.is_allowed(&fx.base.join("data2/c.txt")));
    }

    #[test]
    fn missing_path_is_denied_not_an_error() {
        let fx = Fixture::new();
        let guard = fx.guard(&["data"]);
        let denied = guard.check(&fx.base.join("data/missing.txt")).unwrap_err();
        assert!(matches!(denied, PathDenied::Unresolvable { .. }));
    }

    #[test]
    fn empty_root_list_permits_everything() {
        let fx = Fixture::new();
        let guard = PathGuard::new(Vec::new());
        assert!(guard.is_unrestricted());
        assert!(guard.is_allowed(&fx.base.join("secret/file.txt")));
        assert!(guard.is_allowed(Path::new("/definitely/not/here")));
    }

    #[test]
    fn malformed_roots_are_skipped() {
        let fx = Fixture::new();
        let guard = PathGuard::new(vec![
            PathBuf::new(),
            fx.base.join("does-not-exist"),
            fx.base.join("data"),
        ]);
        assert_eq!(guard.roots().len(), 2);
        assert!(guard.is_allowed(&fx.base.join("data/a.txt")));
        assert!(!guard.is_allowed(&fx.base.join("secret/file.txt")));
    }

    #[test]
    fn roots_that_are_all_malformed_deny_everything() {
        let fx = Fixture::new();
        let guard = PathGuard::new(vec![PathBuf::new()]);
        assert!(!guard.is_unrestricted());
        assert!(guard.roots().is_empty());
        assert!(!guard.is_allowed(&fx.base.join("secret/file.txt")));
        assert!(matches!(
            guard.check(&fx.base.join("data/a.txt")),
            Err(PathDenied::OutsideRoots { .. })
        ));
        assert!(matches!(
            guard.check(Path::new("/definitely/not/here")),
            Err(PathDenied::Unresolvable { .. })
        ));
    }

    #[test]
    fn any_matching_root_is_enough() {
        let fx = Fixture::new();
        let guard = fx.guard(&["data2", "data"]);
        assert!(guard.is_allowed(&fx.base.join("data/a.txt")));
        assert!(guard.is_allowed(&fx.base.join("data2/c.txt")));
        assert!(!guard.is_allowed(&fx.base.join("secret/file.txt")));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_escaping_the_root_is_rejected() {
        let fx = Fixture::new();
        std::os::unix::fs::symlink(fx.base.join("secret/file.txt"), fx.base.join("data/link.txt"))
            .unwrap();
        let guard = fx.guard(&["data"]);
        assert!(!guard.is_allowed(&fx.base.join("data/link.txt")));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_root_is_resolved_before_comparison() {
        let fx = Fixture::new();
        std::os::unix::fs::symlink(fx.base.join("data"), fx.base.join("alias")).unwrap();
        let guard = fx.guard(&["alias"]);
        assert!(guard.is_allowed(&fx.base.join("data/a.txt")));
        assert!(guard.is_allowed(&fx.base.join("alias/nested/b.txt")));
        assert!(!guard.is_allowed(&fx.base.join("secret/file.txt")));
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_denied() {
        let fx = Fixture::new();
        std::os::unix::fs::symlink(fx.base.join("data/gone.txt"), fx.base.join("data/dangling"))
            .unwrap();
        let guard = fx.guard(&["data"]);
        assert!(!guard.is_allowed(&fx.base.join("data/dangling")));
    }
}
