use crate::kodi_repo_error::{KodiRepoError, KodiRepoErrorKind};
use crate::create_kodi_repo_error_result;
use crate::utils::default_git_binary;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GitConfig {
    #[serde(default = "default_git_binary")]
    pub binary: String,
    /// Shallow clone depth, full history when not set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            binary: default_git_binary(),
            depth: None,
            branch: None,
        }
    }
}

impl GitConfig {
    pub fn prepare(&mut self) -> Result<(), KodiRepoError> {
        self.binary = self.binary.trim().to_string();
        if self.binary.is_empty() {
            return create_kodi_repo_error_result!(KodiRepoErrorKind::Config, "git binary can't be empty");
        }
        if self.depth == Some(0) {
            return create_kodi_repo_error_result!(KodiRepoErrorKind::Config, "git depth must be greater than 0");
        }
        self.branch = self.branch.take().map(|b| b.trim().to_string()).filter(|b| !b.is_empty());
        Ok(())
    }
}
