/// Which leading directory to remove from every entry name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum StripRoot {
    /// Keep names unchanged.
    #[default]
    None,
    /// Drop everything up to and including the first `/`.
    FirstSegment,
    /// Drop this exact prefix (e.g. `example.com/m@v1.2.0/`); entries without it
    /// fall back to [`StripRoot::FirstSegment`].
    Prefix(String),
}

#[derive(Clone, Debug)]
pub struct ExtractOptions {
    pub strip:        StripRoot,
    /// Mode for files whose entry carries no unix permissions.
    pub default_mode: u32,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            strip:        StripRoot::None,
            default_mode: 0o644,
        }
    }
}

impl ExtractOptions {
    pub fn new() -> Self { Self::default() }

    /// Options for a module archive rooted at `path@version/`.
    pub fn for_module(path: &str, version: &str) -> Self {
        Self::new().strip(StripRoot::Prefix(format!("{path}@{version}/")))
    }

    pub fn strip(mut self, strip: StripRoot) -> Self {
        self.strip = strip;
        self
    }

    pub fn default_mode(mut self, mode: u32) -> Self {
        self.default_mode = mode;
        self
    }
}
