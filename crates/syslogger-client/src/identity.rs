//! Who is emitting: process id and display name

use std::path::PathBuf;

/// Looks up a short display name for a process
pub trait NameResolver {
    fn resolve(&self, pid: u32) -> Option<String>;
}

/// Reads the name from `/proc/<pid>/status`
#[derive(Debug, Clone)]
pub struct ProcfsNames {
    root: PathBuf,
}

impl ProcfsNames {
    pub fn new() -> Self {
        Self::with_root("/proc")
    }

    /// Resolver over a procfs-like tree rooted somewhere else
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Default for ProcfsNames {
    fn default() -> Self {
        Self::new()
    }
}

impl NameResolver for ProcfsNames {
    fn resolve(&self, pid: u32) -> Option<String> {
        let status = self.root.join(pid.to_string()).join("status");
        let content = std::fs::read_to_string(&status).ok()?;
        parse_status_name(content.lines().next()?)
    }
}

/// Always answers with the same name, or none
#[derive(Debug, Clone, Default)]
pub struct FixedName(pub Option<String>);

impl NameResolver for FixedName {
    fn resolve(&self, _pid: u32) -> Option<String> {
        self.0.clone()
    }
}

/// Extract the name from a `Name:\t<comm>` status line.
pub fn parse_status_name(line: &str) -> Option<String> {
    let (key, value) = line.split_once(':')?;
    if key.trim() != "Name" {
        return None;
    }
    // Names cannot contain whitespace in the framed line
    let name: String = value.split_whitespace().collect();
    if name.is_empty() { None } else { Some(name) }
}

/// Pid and display name a producer frames its lines with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessIdentity {
    pub pid: u32,
    pub name: Option<String>,
}

impl ProcessIdentity {
    pub fn new(pid: u32, name: Option<String>) -> Self {
        Self { pid, name }
    }

    /// Identity of the calling process
    pub fn current(resolver: &dyn NameResolver) -> Self {
        let pid = std::process::id();
        Self {
            pid,
            name: resolver.resolve(pid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parses_status_line() {
        assert_eq!(parse_status_name("Name:\tbash"), Some("bash".into()));
        assert_eq!(parse_status_name("Name:   my prog\n"), Some("myprog".into()));
        assert_eq!(parse_status_name("Name:\t"), None);
        assert_eq!(parse_status_name("Umask:\t0022"), None);
        assert_eq!(parse_status_name("garbage"), None);
    }

    #[test]
    fn procfs_resolver_reads_first_line() {
        let dir = tempdir().unwrap();
        let proc_dir = dir.path().join("4242");
        std::fs::create_dir(&proc_dir).unwrap();
        std::fs::write(proc_dir.join("status"), "Name:\talice\nUmask:\t0022\n").unwrap();

        let resolver = ProcfsNames::with_root(dir.path());
        assert_eq!(resolver.resolve(4242), Some("alice".into()));
        assert_eq!(resolver.resolve(1), None);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn current_process_has_a_name() {
        let identity = ProcessIdentity::current(&ProcfsNames::new());
        assert_eq!(identity.pid, std::process::id());
        assert!(identity.name.is_some());
    }

    #[test]
    fn fixed_resolver() {
        let identity = ProcessIdentity::current(&FixedName(None));
        assert_eq!(identity.name, None);
    }
}
