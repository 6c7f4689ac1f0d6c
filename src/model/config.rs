use std::path::{Path, PathBuf};

use log::debug;

use crate::kodi_repo_error::{KodiRepoError, KodiRepoErrorKind};
use crate::model::{AddonSource, GitConfig, LogConfig};
use crate::utils::{default_as_empty_list, file_utils};
use crate::{config_err, create_kodi_repo_error_result};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory the repository is created in, relative to the config file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Add-on sources as `<repository>:<path>`
    #[serde(default = "default_as_empty_list")]
    pub addons: Vec<String>,
    #[serde(default)]
    pub git: GitConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<LogConfig>,
    #[serde(skip)]
    pub t_config_dir: Option<PathBuf>,
    #[serde(skip)]
    pub t_target: Option<PathBuf>,
    #[serde(skip)]
    pub t_sources: Vec<AddonSource>,
}

impl Config {
    pub fn prepare(&mut self) -> Result<(), KodiRepoError> {
        self.git.prepare()?;
        let base_dir = self.t_config_dir.clone().unwrap_or_else(|| PathBuf::from("."));
        self.t_target = self.target.as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| file_utils::resolve_path(&base_dir, t));
        self.t_sources = self.addons.iter()
            .map(|source| source.parse::<AddonSource>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(())
    }

    /// Command line values win over the config file, add-on sources are appended.
    pub fn apply_args(&mut self, target: Option<&str>, addons: &[String]) -> Result<(), KodiRepoError> {
        if let Some(target_dir) = target {
            debug!("target overridden by argument: {target_dir}");
            self.t_target = Some(PathBuf::from(target_dir));
        }
        for source in addons {
            self.t_sources.push(source.parse::<AddonSource>()?);
        }
        Ok(())
    }

    pub fn get_target_dir(&self) -> Result<&Path, KodiRepoError> {
        self.t_target.as_deref().ok_or_else(|| config_err!("No target directory given, use --target or the target config entry"))
    }

    pub fn get_sources(&self) -> Result<&[AddonSource], KodiRepoError> {
        if self.t_sources.is_empty() {
            return create_kodi_repo_error_result!(KodiRepoErrorKind::Config, "No addons given, use --addon or the addons config entry");
        }
        Ok(&self.t_sources)
    }

    pub fn get_log_level(&self) -> Option<&str> {
        self.log.as_ref().and_then(|l| l.log_level.as_deref())
    }
}
