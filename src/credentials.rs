use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// Resolve a secret: a non-blank value from `env_lookup` wins, otherwise the
/// first `<file_key>=value` line of `fallback_file`. A missing or unreadable
/// file resolves to `None`; nothing here returns an error.
pub fn resolve_secret<F>(env_lookup: F, fallback_file: &Path, file_key: &str) -> Option<String>
where
    F: FnOnce() -> Option<String>,
{
    if let Some(value) = env_lookup() {
        let value = value.trim();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }
    read_key_from_file(fallback_file, file_key)
}

/// Service key from `env_lookup` (normally `SUPABASE_SERVICE_KEY`), falling
/// back to `SUPABASE_SERVICE_ROLE_KEY=` in the local env file.
pub fn resolve_service_key<F>(env_lookup: F, fallback_file: &Path) -> Option<String>
where
    F: FnOnce() -> Option<String>,
{
    resolve_secret(env_lookup, fallback_file, crate::constants::LOCAL_SERVICE_KEY_NAME)
}

/// Project URL from `env_lookup` (normally `SUPABASE_URL`), then
/// `NEXT_PUBLIC_SUPABASE_URL=` in the local env file, then `default_url`.
pub fn resolve_supabase_url<F>(env_lookup: F, fallback_file: &Path, default_url: &str) -> String
where
    F: FnOnce() -> Option<String>,
{
    resolve_secret(env_lookup, fallback_file, crate::constants::LOCAL_URL_NAME)
        .unwrap_or_else(|| default_url.to_string())
}

/// Read a variable from the process environment.
pub fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn read_key_from_file(path: &Path, key: &str) -> Option<String> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            debug!("Could not open {}: {}", path.display(), e);
            return None;
        }
    };

    let prefix = format!("{key}=");
    BufReader::new(file)
        .lines()
        .filter_map(|line| line.ok())
        .find(|line| line.starts_with(&prefix))
        .and_then(|line| line.split_once('=').map(|(_, value)| value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_env_value_wins() {
        let file = env_file("SUPABASE_SERVICE_ROLE_KEY=from-file\n");
        let key = resolve_secret(|| Some(" from-env ".into()), file.path(), "SUPABASE_SERVICE_ROLE_KEY");
        assert_eq!(key.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_blank_env_falls_back_to_file() {
        let file = env_file(
            "NEXT_PUBLIC_SUPABASE_URL=https://x.supabase.co\n\
             SUPABASE_SERVICE_ROLE_KEY=  abc=def  \n\
             SUPABASE_SERVICE_ROLE_KEY=second\n",
        );
        let key = resolve_secret(|| Some("   ".into()), file.path(), "SUPABASE_SERVICE_ROLE_KEY");
        assert_eq!(key.as_deref(), Some("abc=def"));
    }

    #[test]
    fn test_prefix_must_match_whole_key() {
        let file = env_file("XSUPABASE_SERVICE_ROLE_KEY=nope\nSUPABASE_SERVICE_ROLE_KEY_OLD=nope\n");
        let key = resolve_secret(|| None, file.path(), "SUPABASE_SERVICE_ROLE_KEY");
        assert_eq!(key, None);
    }

    #[test]
    fn test_missing_file_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let key = resolve_secret(|| None, &dir.path().join(".env.local"), "SUPABASE_SERVICE_ROLE_KEY");
        assert_eq!(key, None);
    }

    #[test]
    fn test_url_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let url = resolve_supabase_url(|| None, &dir.path().join(".env.local"), "https://default.supabase.co");
        assert_eq!(url, "https://default.supabase.co");
    }

    #[test]
    fn test_url_from_env_file_then_env() {
        let file = env_file("NEXT_PUBLIC_SUPABASE_URL= https://local.supabase.co \n");
        let url = resolve_supabase_url(|| None, file.path(), "https://default.supabase.co");
        assert_eq!(url, "https://local.supabase.co");

        let url = resolve_supabase_url(|| Some("https://env.supabase.co".into()), file.path(), "https://default.supabase.co");
        assert_eq!(url, "https://env.supabase.co");
    }

    #[test]
    fn test_service_key_uses_role_key_line() {
        let file = env_file("NEXT_PUBLIC_SUPABASE_URL=https://x.supabase.co\nSUPABASE_SERVICE_ROLE_KEY=role-key\n");
        assert_eq!(resolve_service_key(|| None, file.path()).as_deref(), Some("role-key"));
    }

    #[test]
    fn test_undecodable_line_does_not_hide_later_key() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"COMMENT=caf\xe9\nSUPABASE_SERVICE_ROLE_KEY=after-bad-line\n").unwrap();
        let key = resolve_secret(|| None, file.path(), "SUPABASE_SERVICE_ROLE_KEY");
        assert_eq!(key.as_deref(), Some("after-bad-line"));
    }
}
