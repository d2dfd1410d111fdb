/// Line counts over a unified diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStats {
    /// Number of `diff --git` sections
    pub files: usize,
    /// Added lines, excluding `+++` headers
    pub additions: usize,
    /// Removed lines, excluding `---` headers
    pub deletions: usize,
}

impl DiffStats {
    /// Count files, additions and deletions in a unified diff.
    ///
    /// Only lines inside a hunk are counted, so `--- a/x` and `+++ b/x`
    /// headers never show up as changes. Malformed input is tolerated:
    /// anything that does not look like a diff counts as zero.
    pub fn from_diff(raw_diff: &str) -> Self {
        let mut stats = DiffStats::default();
        let mut in_hunk = false;

        for line in raw_diff.lines() {
            if line.starts_with("diff --git ") {
                stats.files += 1;
                in_hunk = false;
                continue;
            }
            if line.starts_with("@@") {
                in_hunk = true;
                continue;
            }
            if !in_hunk {
                continue;
            }
            if line.starts_with('+') && !line.starts_with("+++") {
                stats.additions += 1;
            } else if line.starts_with('-') && !line.starts_with("---") {
                stats.deletions += 1;
            }
        }

        stats
    }
}

/// Paths named by diff headers, in first-seen order without duplicates.
///
/// Two header forms are recognised:
///   diff --git a/{path} b/{path}   -> the a/ path
///   +++ b/{path}                   -> the b/ path
///
/// A rename therefore contributes both its old and its new path.
pub fn changed_paths(raw_diff: &str) -> Vec<String> {
    let mut paths: Vec<String> = Vec::new();
    let mut push = |path: &str| {
        if !path.is_empty() && !paths.iter().any(|p| p == path) {
            paths.push(path.to_string());
        }
    };

    for line in raw_diff.lines() {
        if let Some(rest) = line.strip_prefix("diff --git a/") {
            if let Some(end) = rest.find(" b/") {
                push(&rest[..end]);
            }
        }
        if let Some(path) = line.strip_prefix("+++ b/") {
            push(path);
        }
    }

    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_DIFF: &str = r#"diff --git a/src/main.rs b/src/main.rs
index abc1234..def5678 100644
--- a/src/main.rs
+++ b/src/main.rs
@@ -1,5 +1,7 @@
 fn main() {
-    println!("old");
+    println!("new");
+    // Added a comment
 }
"#;

    #[test]
    fn test_stats_single_file_diff() {
        let stats = DiffStats::from_diff(SAMPLE_DIFF);
        assert_eq!(stats.files, 1);
        assert_eq!(stats.additions, 2);
        assert_eq!(stats.deletions, 1);
    }

    #[test]
    fn test_stats_new_and_deleted_files() {
        let diff = r#"diff --git a/new_file.txt b/new_file.txt
new file mode 100644
--- /dev/null
+++ b/new_file.txt
@@ -0,0 +1,2 @@
+hello
+world
diff --git a/old_file.txt b/old_file.txt
deleted file mode 100644
--- a/old_file.txt
+++ /dev/null
@@ -1,2 +0,0 @@
-hello
-world
"#;
        let stats = DiffStats::from_diff(diff);
        assert_eq!(stats.files, 2);
        assert_eq!(stats.additions, 2);
        assert_eq!(stats.deletions, 2);
    }

    #[test]
    fn test_stats_ignores_non_diff_text() {
        assert_eq!(DiffStats::from_diff(""), DiffStats::default());
        assert_eq!(DiffStats::from_diff("+ a bullet\n- another"), DiffStats::default());
    }

    #[test]
    fn test_changed_paths_dedupes_headers() {
        assert_eq!(changed_paths(SAMPLE_DIFF), vec!["src/main.rs"]);
    }

    #[test]
    fn test_changed_paths_rename_keeps_both() {
        let diff = "diff --git a/old/name.rs b/new/name.rs\n--- a/old/name.rs\n+++ b/new/name.rs\n";
        assert_eq!(changed_paths(diff), vec!["old/name.rs", "new/name.rs"]);
    }

    #[test]
    fn test_changed_paths_skips_dev_null() {
        let diff = "diff --git a/gone.txt b/gone.txt\n--- a/gone.txt\n+++ /dev/null\n";
        assert_eq!(changed_paths(diff), vec!["gone.txt"]);
    }

    #[test]
    fn test_changed_paths_crlf_line_endings() {
        let diff = "diff --git a/src/a.rs b/src/a.rs\r\n--- a/src/a.rs\r\n+++ b/src/a.rs\r\n@@ -1 +1 @@\r\n-old\r\n+new\r\n";
        assert_eq!(changed_paths(diff), vec!["src/a.rs"]);
        let stats = DiffStats::from_diff(diff);
        assert_eq!((stats.files, stats.additions, stats.deletions), (1, 1, 1));
    }

    #[test]
    fn test_changed_paths_empty() {
        assert!(changed_paths("").is_empty());
    }
}
