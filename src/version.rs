// Constants written by build.rs
include!(concat!(env!("OUT_DIR"), "/version.rs"));

pub fn release() -> &'static str {
    RELEASE
}

/// Everything `version-info` reports, one field per line.
pub fn describe() -> String {
    format!(
        "lazy-deque {RELEASE}\n  commit:   {COMMIT}\n  built at: {BUILT_AT}\n  package:  {}",
        env!("CARGO_PKG_VERSION")
    )
}

pub fn print_version_info() {
    println!("{}", describe());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_lists_build_fields() {
        let text = describe();
        assert!(text.starts_with(&format!("lazy-deque {}", release())));
        assert!(text.contains(COMMIT));
        assert!(text.contains(BUILT_AT));
        assert_eq!(text.lines().count(), 4);
    }
}
