use std::env;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_MEDIA_ROOT: &str = "media";
pub const DEFAULT_CONTACTS_DIR_NAME: &str = "contacts_xml";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub media_root: PathBuf,
    pub contacts_dir_name: String,
    pub max_upload_bytes: usize,
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    /// Defaults with the given storage root.
    pub fn new(media_root: impl Into<PathBuf>) -> Self {
        Self {
            port: DEFAULT_PORT,
            media_root: media_root.into(),
            contacts_dir_name: DEFAULT_CONTACTS_DIR_NAME.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            cors_allowed_origins: Vec::new(),
        }
    }

    pub fn from_env() -> Self {
        let media_root = env::var("MEDIA_ROOT").unwrap_or_else(|_| DEFAULT_MEDIA_ROOT.to_string());

        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            contacts_dir_name: env::var("CONTACTS_DIR_NAME")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CONTACTS_DIR_NAME.to_string()),
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|n| n.parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .ok()
                .map(|s| {
                    s.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_else(Vec::new),
            media_root: PathBuf::from(media_root),
        }
    }

    /// Directory holding the canonical document and uploaded files.
    pub fn storage_dir(&self) -> PathBuf {
        self.media_root.join(&self.contacts_dir_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 5] = [
        "PORT",
        "MEDIA_ROOT",
        "CONTACTS_DIR_NAME",
        "MAX_UPLOAD_BYTES",
        "CORS_ALLOWED_ORIGINS",
    ];

    fn clear_env() {
        for var in VARS {
            // SAFETY: tests touching the environment are serialized
            unsafe { env::remove_var(var) };
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = Config::from_env();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.storage_dir(), PathBuf::from("media").join("contacts_xml"));
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert!(config.cors_allowed_origins.is_empty());
    }

    #[test]
    #[serial]
    fn test_overrides_and_fallbacks() {
        clear_env();
        // SAFETY: tests touching the environment are serialized
        unsafe {
            env::set_var("PORT", "not-a-port");
            env::set_var("MEDIA_ROOT", "/var/lib/app");
            env::set_var("MAX_UPLOAD_BYTES", "1024");
            env::set_var("CORS_ALLOWED_ORIGINS", "http://a.test, http://b.test,");
        }

        let config = Config::from_env();
        clear_env();

        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.storage_dir(), PathBuf::from("/var/lib/app/contacts_xml"));
        assert_eq!(config.max_upload_bytes, 1024);
        assert_eq!(config.cors_allowed_origins, vec!["http://a.test", "http://b.test"]);
    }
}
