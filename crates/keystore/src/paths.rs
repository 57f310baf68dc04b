use std::path::PathBuf;

/// Expand a leading `~` to the user's home directory.
pub fn expand_path(path: &str) -> PathBuf {
    if path == "~" {
        return home_dir();
    }
    match path.strip_prefix("~/") {
        Some(rest) => home_dir().join(rest),
        None => PathBuf::from(path),
    }
}

fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// `~/.flowcraft`
pub fn default_config_dir() -> PathBuf {
    home_dir().join(".flowcraft")
}

/// `~/.flowcraft/operator.key`
pub fn default_key_path() -> PathBuf {
    default_config_dir().join("operator.key")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_plain_path_untouched() {
        assert_eq!(expand_path("/etc/flowcraft.key"), PathBuf::from("/etc/flowcraft.key"));
        assert_eq!(expand_path("keys/op.key"), PathBuf::from("keys/op.key"));
    }

    #[test]
    fn test_expand_tilde() {
        let expanded = expand_path("~/keys/op.key");
        assert!(expanded.ends_with("keys/op.key"));
        assert!(!expanded.to_string_lossy().contains('~'));
    }

    #[test]
    fn test_default_key_path_under_config_dir() {
        assert!(default_key_path().starts_with(default_config_dir()));
    }
}
