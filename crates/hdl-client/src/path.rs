/// Join two path fragments with exactly one `/` between them.
///
/// Trailing slashes of `base` and leading slashes of `tail` are dropped, so
/// `join_path("", "a")` is `/a` and `join_path("/a/", "")` is `/a/`.
pub fn join_path(base: &str, tail: &str) -> String {
    let base = base.trim_end_matches('/');
    let tail = tail.trim_start_matches('/');
    format!("{base}/{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_with_single_separator() {
        assert_eq!(join_path("/abc", "def"), "/abc/def");
        assert_eq!(join_path("/abc/", "/def"), "/abc/def");
        assert_eq!(join_path("/abc///", "///def/"), "/abc/def/");
        assert_eq!(join_path("irods://srv:1247", "/zone/a.txt"), "irods://srv:1247/zone/a.txt");
    }

    #[test]
    fn empty_fragments() {
        assert_eq!(join_path("", "ghi"), "/ghi");
        assert_eq!(join_path("/abc/def///", ""), "/abc/def/");
        assert_eq!(join_path("", ""), "/");
    }
}
