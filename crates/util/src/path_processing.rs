use std::path::PathBuf;

use dirs_next::home_dir;

/// Expands a leading `~` to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    let p = path.trim();
    if p == "~" {
        return home_dir().unwrap_or_else(|| PathBuf::from("~"));
    }
    if let Some(rest) = p.strip_prefix("~/") {
        return home_dir().unwrap_or_else(|| PathBuf::from("~")).join(rest);
    }
    if let Some(rest) = p.strip_prefix("~\\") {
        // Windows-style
        return home_dir().unwrap_or_else(|| PathBuf::from("~")).join(rest);
    }
    PathBuf::from(p)
}

#[cfg(test)]
mod tests {
    use super::expand_tilde;
    use std::path::PathBuf;

    #[test]
    fn plain_paths_are_untouched() {
        assert_eq!(expand_tilde(" catalogs/gbif.yaml "), PathBuf::from("catalogs/gbif.yaml"));
    }

    #[test]
    fn tilde_prefix_is_joined_to_home() {
        if let Some(home) = dirs_next::home_dir() {
            assert_eq!(expand_tilde("~/taxonode/nodes.yaml"), home.join("taxonode/nodes.yaml"));
        }
    }
}
