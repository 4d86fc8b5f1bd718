//! Read-only git plumbing through the `git` executable.

use std::path::{Path, PathBuf};
use std::process::Command;

use super::hunks::parse_hunks;
use super::{ChangeEntry, ChangeKind, DiffError, LineRange, LineRangeEdit};

/// A repository on disk. Every operation shells out to `git` inside it.
#[derive(Debug, Clone)]
pub struct GitRepository {
    root: PathBuf,
}

impl GitRepository {
    /// Open the repository containing `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DiffError> {
        let repo = Self {
            root: path.as_ref().to_path_buf(),
        };
        repo.git(&["rev-parse", "--git-dir"])?;
        Ok(repo)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a revision expression to a full commit id.
    pub fn resolve(&self, rev: &str) -> Result<String, DiffError> {
        let spec = format!("{}^{{commit}}", rev);
        let output = Command::new("git")
            .args(["rev-parse", "--verify", "--quiet", &spec])
            .current_dir(&self.root)
            .output()?;

        if !output.status.success() {
            return Err(DiffError::UnresolvableRevision(rev.to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Entries that differ between two revisions, in git's order, each with
    /// the whitespace-insensitive hunks of its content change.
    pub fn changes(&self, old_rev: &str, new_rev: &str) -> Result<Vec<ChangeEntry>, DiffError> {
        let old = self.resolve(old_rev)?;
        let new = self.resolve(new_rev)?;

        let raw = self.git(&["diff", "--raw", "-z", "--no-abbrev", "-M", "-C", &old, &new])?;
        let entries = parse_raw(&raw)?
            .into_iter()
            .map(|raw| {
                let hunks = self.hunks(&raw)?;
                Ok(ChangeEntry {
                    old_path: raw.old_path,
                    new_path: raw.new_path,
                    kind: raw.kind,
                    hunks,
                })
            })
            .collect::<Result<Vec<_>, DiffError>>()?;

        tracing::debug!(old = %old, new = %new, entries = entries.len(), "listed changes");
        Ok(entries)
    }

    /// Content of `path` as of `rev`.
    pub fn show_file(&self, rev: &str, path: &str) -> Result<String, DiffError> {
        let commit = self.resolve(rev)?;
        self.cat_blob(&format!("{}:{}", commit, path))
    }

    fn hunks(&self, entry: &RawEntry) -> Result<Vec<LineRangeEdit>, DiffError> {
        // a submodule side names a commit, not a blob
        if entry.new_mode == GITLINK_MODE {
            return Ok(Vec::new());
        }
        match entry.kind {
            ChangeKind::Delete => Ok(Vec::new()),
            ChangeKind::Add => self.whole_blob(&entry.new_blob),
            _ if entry.old_mode == GITLINK_MODE => self.whole_blob(&entry.new_blob),
            _ if entry.old_blob == entry.new_blob => Ok(Vec::new()),
            _ => {
                // binary pairs print "Binary files differ" and no hunk headers
                let diff = self.git(&[
                    "diff",
                    "-U0",
                    "--ignore-all-space",
                    "--no-color",
                    "--no-ext-diff",
                    &entry.old_blob,
                    &entry.new_blob,
                ])?;
                parse_hunks(&String::from_utf8_lossy(&diff))
            }
        }
    }

    /// One hunk covering every line of a new text blob.
    fn whole_blob(&self, blob: &str) -> Result<Vec<LineRangeEdit>, DiffError> {
        let content = self.git(&["cat-file", "blob", blob])?;
        if is_binary(&content) {
            return Ok(Vec::new());
        }
        let lines = String::from_utf8_lossy(&content).lines().count();
        if lines == 0 {
            return Ok(Vec::new());
        }
        Ok(vec![LineRangeEdit {
            old: LineRange::from_unified(0, 0),
            new: LineRange::from_unified(1, lines),
        }])
    }

    fn cat_blob(&self, object: &str) -> Result<String, DiffError> {
        let out = self.git(&["cat-file", "blob", object])?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    fn git(&self, args: &[&str]) -> Result<Vec<u8>, DiffError> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()?;

        if !output.status.success() {
            return Err(DiffError::Git {
                command: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}

/// Tree entry mode of a submodule commit.
const GITLINK_MODE: &str = "160000";

/// git looks for a NUL byte in this many leading bytes.
const BINARY_SNIFF_LEN: usize = 8000;

fn is_binary(content: &[u8]) -> bool {
    content.iter().take(BINARY_SNIFF_LEN).any(|&b| b == 0)
}

/// One record of `git diff --raw -z --no-abbrev`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RawEntry {
    kind: ChangeKind,
    old_mode: String,
    new_mode: String,
    old_path: Option<String>,
    new_path: Option<String>,
    old_blob: String,
    new_blob: String,
}

/// Records are `:<mode> <mode> <blob> <blob> <status>\0<path>\0[<path>\0]`,
/// with a second path only for renames and copies.
fn parse_raw(output: &[u8]) -> Result<Vec<RawEntry>, DiffError> {
    let text = String::from_utf8_lossy(output);
    let mut fields = text.split('\0').filter(|f| !f.is_empty());
    let mut entries = Vec::new();

    while let Some(header) = fields.next() {
        let meta = header
            .strip_prefix(':')
            .ok_or_else(|| DiffError::MalformedOutput(format!("expected raw header, got `{}`", header)))?;
        let parts: Vec<&str> = meta.split_whitespace().collect();
        let [old_mode, new_mode, old_blob, new_blob, status] = parts[..] else {
            return Err(DiffError::MalformedOutput(format!("bad raw header `{}`", header)));
        };

        let kind = match status.chars().next() {
            Some('A') => ChangeKind::Add,
            Some('D') => ChangeKind::Delete,
            // type changes (file <-> symlink) are content changes here
            Some('M') | Some('T') => ChangeKind::Modify,
            Some('R') => ChangeKind::Rename,
            Some('C') => ChangeKind::Copy,
            _ => {
                return Err(DiffError::MalformedOutput(format!(
                    "unsupported change status `{}`",
                    status
                )))
            }
        };

        let mut path = || {
            fields
                .next()
                .map(str::to_string)
                .ok_or_else(|| DiffError::MalformedOutput(format!("missing path after `{}`", header)))
        };
        let first = path()?;
        let (old_path, new_path) = match kind {
            ChangeKind::Add => (None, Some(first)),
            ChangeKind::Delete => (Some(first), None),
            ChangeKind::Modify => (Some(first.clone()), Some(first)),
            ChangeKind::Rename | ChangeKind::Copy => (Some(first), Some(path()?)),
        };

        entries.push(RawEntry {
            kind,
            old_mode: old_mode.to_string(),
            new_mode: new_mode.to_string(),
            old_path,
            new_path,
            old_blob: old_blob.to_string(),
            new_blob: new_blob.to_string(),
        });
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const ZERO: &str = "0000000000000000000000000000000000000000";
    const A: &str = "1111111111111111111111111111111111111111";
    const B: &str = "2222222222222222222222222222222222222222";

    #[test]
    fn test_parse_raw_statuses() {
        let raw = format!(
            ":000000 100644 {z} {a} A\0New.java\0\
             :100644 000000 {a} {z} D\0Gone.java\0\
             :100644 100644 {a} {b} M\0Same.java\0\
             :100644 100644 {a} {b} R087\0Old.java\0Renamed.java\0\
             :100644 100644 {a} {a} C100\0Src.java\0Copy.java\0",
            z = ZERO,
            a = A,
            b = B
        );
        let entries = parse_raw(raw.as_bytes()).unwrap();
        let summary: Vec<_> = entries
            .iter()
            .map(|e| (e.kind, e.old_path.as_deref(), e.new_path.as_deref()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (ChangeKind::Add, None, Some("New.java")),
                (ChangeKind::Delete, Some("Gone.java"), None),
                (ChangeKind::Modify, Some("Same.java"), Some("Same.java")),
                (ChangeKind::Rename, Some("Old.java"), Some("Renamed.java")),
                (ChangeKind::Copy, Some("Src.java"), Some("Copy.java")),
            ]
        );
        assert_eq!(entries[0].old_blob, ZERO);
        assert_eq!(entries[2].new_blob, B);
    }

    #[test]
    fn test_parse_raw_paths_with_spaces() {
        let raw = format!(":100644 100644 {} {} M\0dir with space/A B.java\0", A, B);
        let entries = parse_raw(raw.as_bytes()).unwrap();
        assert_eq!(entries[0].new_path.as_deref(), Some("dir with space/A B.java"));
    }

    #[test]
    fn test_parse_raw_keeps_modes() {
        let raw = format!(
            ":000000 160000 {z} {a} A\0lib\0:160000 160000 {a} {b} M\0lib\0",
            z = ZERO,
            a = A,
            b = B
        );
        let entries = parse_raw(raw.as_bytes()).unwrap();
        assert_eq!(entries[0].old_mode, "000000");
        assert_eq!(entries[0].new_mode, GITLINK_MODE);
        assert_eq!(entries[1].old_mode, GITLINK_MODE);
    }

    #[test]
    fn test_binary_detection() {
        assert!(is_binary(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"));
        assert!(!is_binary("class Caf\u{e9} {}\n".as_bytes()));
        let mut late_nul = vec![b'a'; BINARY_SNIFF_LEN];
        late_nul.push(0);
        assert!(!is_binary(&late_nul));
    }

    #[test]
    fn test_parse_raw_rejects_garbage() {
        assert!(matches!(
            parse_raw(b"not raw output\0"),
            Err(DiffError::MalformedOutput(_))
        ));
        let truncated = format!(":100644 100644 {} {} R100\0Old.java\0", A, B);
        assert!(matches!(
            parse_raw(truncated.as_bytes()),
            Err(DiffError::MalformedOutput(_))
        ));
        assert!(parse_raw(b"").unwrap().is_empty());
    }

    fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn git(dir: &Path, args: &[&str]) {
        let output = Command::new("git")
            .args([
                "-c",
                "user.name=Reviewer",
                "-c",
                "user.email=reviewer@example.com",
                "-c",
                "commit.gpgsign=false",
            ])
            .args(args)
            .current_dir(dir)
            .output()
            .unwrap();
        assert!(output.status.success(), "git {:?} failed: {:?}", args, output);
    }

    fn commit_all(dir: &Path, message: &str) {
        git(dir, &["add", "-A"]);
        git(dir, &["commit", "-q", "--allow-empty", "-m", message]);
    }

    fn init_repo() -> TempDir {
        let temp = TempDir::new().unwrap();
        git(temp.path(), &["init", "-q"]);
        temp
    }

    const ORDER: &str = "class Order {
    int total;
    int count;
    void add() {
        total++;
    }
    void clear() {
        total = 0;
    }
}
";

    #[test]
    fn test_self_diff_is_empty() {
        if !git_available() {
            return;
        }
        let temp = init_repo();
        fs::write(temp.path().join("Order.java"), ORDER).unwrap();
        commit_all(temp.path(), "initial");

        let repo = GitRepository::open(temp.path()).unwrap();
        assert!(repo.changes("HEAD", "HEAD").unwrap().is_empty());
    }

    #[test]
    fn test_add_modify_delete() {
        if !git_available() {
            return;
        }
        let temp = init_repo();
        let dir = temp.path();
        fs::write(dir.join("A.java"), ORDER).unwrap();
        fs::write(dir.join("B.java"), "class B {}\n").unwrap();
        commit_all(dir, "initial");

        fs::write(dir.join("A.java"), ORDER.replace("int count;", "long count;")).unwrap();
        fs::remove_file(dir.join("B.java")).unwrap();
        fs::write(dir.join("Shape.java"), "interface Shape {\n    double area();\n}\n").unwrap();
        commit_all(dir, "second");

        let entries = super::super::changes(dir, "HEAD~1", "HEAD").unwrap();
        assert_eq!(entries.len(), 3);

        assert_eq!(entries[0].kind, ChangeKind::Modify);
        assert_eq!(entries[0].path(), "A.java");
        assert_eq!(
            entries[0].hunks,
            vec![LineRangeEdit {
                old: LineRange::new(3, 4),
                new: LineRange::new(3, 4),
            }]
        );

        assert_eq!(entries[1].kind, ChangeKind::Delete);
        assert_eq!(entries[1].old_path.as_deref(), Some("B.java"));
        assert!(entries[1].hunks.is_empty());

        assert_eq!(entries[2].kind, ChangeKind::Add);
        assert_eq!(entries[2].old_path, None);
        assert_eq!(entries[2].new_path.as_deref(), Some("Shape.java"));
        assert_eq!(entries[2].hunks[0].new, LineRange::new(1, 4));
    }

    fn head(dir: &Path) -> String {
        let output = Command::new("git")
            .args(["rev-parse", "HEAD"])
            .current_dir(dir)
            .output()
            .unwrap();
        String::from_utf8(output.stdout).unwrap().trim().to_string()
    }

    /// Point the gitlink `lib` at `commit` without cloning anything.
    fn stage_gitlink(dir: &Path, commit: &str) {
        let info = format!("160000,{},lib", commit);
        git(dir, &["update-index", "--add", "--cacheinfo", &info]);
    }

    #[test]
    fn test_submodule_entries_have_no_hunks() {
        if !git_available() {
            return;
        }
        let temp = init_repo();
        let dir = temp.path();
        fs::write(dir.join("A.java"), ORDER).unwrap();
        commit_all(dir, "initial");
        let first = head(dir);

        fs::write(dir.join("A.java"), ORDER.replace("int count;", "long count;")).unwrap();
        git(dir, &["add", "A.java"]);
        stage_gitlink(dir, &first);
        git(dir, &["commit", "-q", "-m", "add lib"]);
        let second = head(dir);

        let bumped_source = ORDER
            .replace("int count;", "long count;")
            .replace("total = 0;", "total = -1;");
        fs::write(dir.join("A.java"), bumped_source).unwrap();
        git(dir, &["add", "A.java"]);
        stage_gitlink(dir, &second);
        git(dir, &["commit", "-q", "-m", "bump lib"]);

        let repo = GitRepository::open(dir).unwrap();

        let added = repo.changes("HEAD~2", "HEAD~1").unwrap();
        assert_eq!(added.len(), 2);
        assert_eq!(added[0].path(), "A.java");
        assert_eq!(added[0].hunks[0].new, LineRange::new(3, 4));
        assert_eq!(added[1].kind, ChangeKind::Add);
        assert_eq!(added[1].path(), "lib");
        assert!(added[1].hunks.is_empty());

        let bumped = repo.changes("HEAD~1", "HEAD").unwrap();
        assert_eq!(bumped.len(), 2);
        assert_eq!(bumped[0].hunks.len(), 1);
        assert_eq!(bumped[0].hunks[0].new, LineRange::new(8, 9));
        assert_eq!(bumped[1].kind, ChangeKind::Modify);
        assert_eq!(bumped[1].path(), "lib");
        assert!(bumped[1].hunks.is_empty());
    }

    #[test]
    fn test_binary_add_has_no_hunks() {
        if !git_available() {
            return;
        }
        let temp = init_repo();
        let dir = temp.path();
        fs::write(dir.join("Order.java"), ORDER).unwrap();
        commit_all(dir, "initial");

        fs::write(dir.join("logo.png"), b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\nmore\n").unwrap();
        commit_all(dir, "logo");

        let repo = GitRepository::open(dir).unwrap();
        let entries = repo.changes("HEAD~1", "HEAD").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, ChangeKind::Add);
        assert!(entries[0].hunks.is_empty());
    }

    #[test]
    fn test_rename_detection() {
        if !git_available() {
            return;
        }
        let temp = init_repo();
        let dir = temp.path();
        fs::write(dir.join("Order.java"), ORDER).unwrap();
        commit_all(dir, "initial");

        fs::remove_file(dir.join("Order.java")).unwrap();
        fs::write(dir.join("Invoice.java"), ORDER.replace("total = 0;", "total = -1;")).unwrap();
        commit_all(dir, "rename");

        let repo = GitRepository::open(dir).unwrap();
        let entries = repo.changes("HEAD~1", "HEAD").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, ChangeKind::Rename);
        assert_eq!(entries[0].old_path.as_deref(), Some("Order.java"));
        assert_eq!(entries[0].new_path.as_deref(), Some("Invoice.java"));
        assert_eq!(entries[0].hunks.len(), 1);
        assert_eq!(entries[0].hunks[0].new, LineRange::new(8, 9));
    }

    #[test]
    fn test_whitespace_only_change_has_no_hunks() {
        if !git_available() {
            return;
        }
        let temp = init_repo();
        let dir = temp.path();
        fs::write(dir.join("Order.java"), ORDER).unwrap();
        commit_all(dir, "initial");

        fs::write(dir.join("Order.java"), ORDER.replace("    int total;", "\tint   total;")).unwrap();
        commit_all(dir, "reindent");

        let repo = GitRepository::open(dir).unwrap();
        let entries = repo.changes("HEAD~1", "HEAD").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, ChangeKind::Modify);
        assert!(entries[0].hunks.is_empty());
    }

    #[test]
    fn test_unresolvable_revision() {
        if !git_available() {
            return;
        }
        let temp = init_repo();
        fs::write(temp.path().join("Order.java"), ORDER).unwrap();
        commit_all(temp.path(), "initial");

        let repo = GitRepository::open(temp.path()).unwrap();
        let err = repo.changes("HEAD", "no-such-branch").unwrap_err();
        assert!(matches!(err, DiffError::UnresolvableRevision(rev) if rev == "no-such-branch"));
    }

    #[test]
    fn test_show_file() {
        if !git_available() {
            return;
        }
        let temp = init_repo();
        let dir = temp.path();
        fs::write(dir.join("Order.java"), ORDER).unwrap();
        commit_all(dir, "initial");
        fs::write(dir.join("Order.java"), "class Order {}\n").unwrap();
        commit_all(dir, "shrink");

        let repo = GitRepository::open(dir).unwrap();
        assert_eq!(repo.show_file("HEAD~1", "Order.java").unwrap(), ORDER);
        assert_eq!(repo.show_file("HEAD", "Order.java").unwrap(), "class Order {}\n");
        assert!(matches!(
            repo.show_file("HEAD", "Missing.java"),
            Err(DiffError::Git { .. })
        ));
    }
}
