pub struct Dirs {
    project_dirs: Option<directories::ProjectDirs>,
}

impl Dirs {
    pub fn new() -> Self {
        let project_dirs = directories::ProjectDirs::from("", "", "termchat");
        if project_dirs.is_none() {
            log::debug!("no home directory, skipping the config file lookup");
        }
        Self { project_dirs }
    }

    fn config_dir(&self) -> Option<&std::path::Path> {
        self.project_dirs
            .as_ref()
            .map(directories::ProjectDirs::config_dir)
    }

    /// Only returns paths to files that actually exist.
    pub fn config_file(&self, name: &str) -> Option<std::path::PathBuf> {
        self.config_dir()
            .map(|dir| dir.join(name))
            .filter(|path| path.is_file())
    }
}
