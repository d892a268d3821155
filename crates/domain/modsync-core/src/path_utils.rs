pub struct ModPath;

/// Suffix used for in-flight downloads before they are renamed into place.
pub const PART_SUFFIX: &str = ".part";

impl ModPath {
    /// A listing name must be a single, non-empty path component.
    /// Anything else could escape the local directory when joined onto it.
    pub fn is_plain_name(name: &str) -> bool {
        !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains('/')
            && !name.contains('\\')
            && !name.contains('\0')
    }

    /// Join a remote directory and an entry name with exactly one `/`.
    pub fn remote_file(dir: &str, name: &str) -> String {
        let dir = dir.trim_end_matches('/');
        if dir.is_empty() {
            format!("/{name}")
        } else {
            format!("{dir}/{name}")
        }
    }

    /// Name of the temporary file a download is streamed into.
    pub fn part_name(name: &str) -> String {
        format!("{name}{PART_SUFFIX}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_names_reject_traversal_and_separators() {
        assert!(ModPath::is_plain_name("jei-1.20.jar"));
        assert!(!ModPath::is_plain_name(""));
        assert!(!ModPath::is_plain_name("."));
        assert!(!ModPath::is_plain_name(".."));
        assert!(!ModPath::is_plain_name("../evil.jar"));
        assert!(!ModPath::is_plain_name("sub\\evil.jar"));
    }

    #[test]
    fn remote_file_handles_trailing_slash() {
        assert_eq!(ModPath::remote_file("/mods/", "a.jar"), "/mods/a.jar");
        assert_eq!(ModPath::remote_file("/mods", "a.jar"), "/mods/a.jar");
        assert_eq!(ModPath::remote_file("/", "a.jar"), "/a.jar");
        assert_eq!(ModPath::remote_file("mods", "a.jar"), "mods/a.jar");
    }
}
