use crate::document::Scheme;

/// Configuration the builder reads while assembling a document.
pub trait Config {
    /// Base path stripped from route paths, e.g. `/api`.
    fn base_path(&self) -> &str;

    fn host(&self) -> Option<&str> {
        None
    }

    fn title(&self) -> Option<&str> {
        None
    }

    fn version(&self) -> Option<&str> {
        None
    }

    fn schemes(&self) -> &[Scheme] {
        &[]
    }
}

/// Plain configuration value.
#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub base_path: String,
    pub host: Option<String>,
    pub title: Option<String>,
    pub version: Option<String>,
    pub schemes: Vec<Scheme>,
}

impl Default for SwaggerConfig {
    fn default() -> Self {
        Self {
            base_path: "/".to_string(),
            host: None,
            title: None,
            version: None,
            schemes: Vec::new(),
        }
    }
}

impl SwaggerConfig {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            ..Default::default()
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_schemes(mut self, schemes: Vec<Scheme>) -> Self {
        self.schemes = schemes;
        self
    }
}

impl Config for SwaggerConfig {
    fn base_path(&self) -> &str {
        &self.base_path
    }

    fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    fn schemes(&self) -> &[Scheme] {
        &self.schemes
    }
}
