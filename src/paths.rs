use std::path::{Path, PathBuf};

pub fn resolve_path(raw: &str) -> PathBuf {
    let trimmed = raw.trim();
    if trimmed == "~"
        && let Some(home) = dirs::home_dir()
    {
        return home;
    }
    if let Some(rest) = trimmed.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    Path::new(trimmed).to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_home_prefix() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        assert_eq!(resolve_path("~/bands.md"), home.join("bands.md"));
    }

    #[test]
    fn keeps_plain_paths() {
        assert_eq!(resolve_path(" notes/bands.md "), PathBuf::from("notes/bands.md"));
        assert_eq!(resolve_path("/tmp/x.md"), PathBuf::from("/tmp/x.md"));
    }
}
