use std::env;
use std::path::Path;
use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use crate::create_kodi_repo_error_result;
use crate::kodi_repo_error::{KodiRepoError, KodiRepoErrorKind};
use crate::model::Config;
use crate::utils::file::env_resolving_reader::EnvResolvingReader;
use crate::utils::file::file_utils;

pub fn read_config(config_file: &Path) -> Result<Config, KodiRepoError> {
    debug!("reading config file {}", config_file.display());
    match file_utils::open_file(config_file) {
        Ok(file) => {
            let reader = EnvResolvingReader::new(file_utils::file_reader(file));
            match serde_yaml::from_reader::<_, Config>(reader) {
                Ok(mut result) => {
                    result.t_config_dir = config_file.parent().map(Path::to_path_buf);
                    result.prepare()?;
                    Ok(result)
                }
                Err(err) => create_kodi_repo_error_result!(KodiRepoErrorKind::Config, "cant read config file {}: {err}", config_file.display()),
            }
        }
        Err(err) => create_kodi_repo_error_result!(KodiRepoErrorKind::Config, "cant open config file {}: {err}", config_file.display()),
    }
}

static ENV_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{env:(?P<var>[a-zA-Z_][a-zA-Z0-9_]*)}").unwrap());

/// Unknown variables stay untouched.
pub fn resolve_env_var(value: &str) -> String {
    ENV_REGEX.replace_all(value, |caps: &regex::Captures| {
        let var_name = &caps["var"];
        env::var(var_name).unwrap_or_else(|_| format!("${{env:{var_name}}}"))
    }).to_string()
}

#[cfg(test)]
mod tests {
    use crate::kodi_repo_error::KodiRepoErrorKind;
    use crate::utils::file::config_reader::{read_config, resolve_env_var};
    use std::fs;

    #[test]
    fn test_resolve() {
        std::env::set_var("KODI_REPO_RESOLVE_TEST", "repo");
        assert_eq!(resolve_env_var("/srv/${env:KODI_REPO_RESOLVE_TEST}/out"), "/srv/repo/out");
        assert_eq!(resolve_env_var("${env:KODI_REPO_UNDEFINED_VAR}"), "${env:KODI_REPO_UNDEFINED_VAR}");
    }

    #[test]
    fn test_read_config() {
        let dir = tempfile::tempdir().unwrap();
        let config_file = dir.path().join("config.yml");
        std::env::set_var("KODI_REPO_CONFIG_TEST_HOST", "git.example.org");
        fs::write(&config_file, "target: repository\naddons:\n  - https://${env:KODI_REPO_CONFIG_TEST_HOST}/addons.git:plugin.a\n").unwrap();

        let cfg = read_config(&config_file).unwrap();
        assert_eq!(cfg.get_target_dir().unwrap(), dir.path().join("repository"));
        assert_eq!(cfg.get_sources().unwrap()[0].repository, "https://git.example.org/addons.git");
    }

    #[test]
    fn test_read_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_config(&dir.path().join("missing.yml")).unwrap_err();
        assert_eq!(err.kind, KodiRepoErrorKind::Config);
    }
}
