use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::process::{Command, Stdio};

use log::{error, warn};
use rayon::prelude::*;

use crate::kodi_repo_error::{KodiRepoError, KodiRepoErrorKind};
use crate::model::{AddonMetadata, AddonSource, GitConfig};
use crate::utils::{debug_if_enabled, file_utils, ADDON_XML_FILE, TEMP_DIR_PREFIX};
use crate::{create_kodi_repo_error, create_kodi_repo_error_result, io_err};

// clones are io bound, one thread per add-on up to this limit
const MAX_FETCH_THREADS: usize = 16;

/// Brings the content of an add-on repository into an existing, empty directory.
pub trait SourceFetcher: Sync {
    fn fetch_repository(&self, repository: &str, dest: &Path) -> Result<(), KodiRepoError>;
}

pub struct GitFetcher {
    config: GitConfig,
}

impl GitFetcher {
    pub fn new(config: &GitConfig) -> Self {
        Self { config: config.clone() }
    }

    fn clone_command(&self, repository: &str, dest: &Path) -> Command {
        let mut cmd = Command::new(&self.config.binary);
        cmd.arg("clone").arg("--quiet");
        if let Some(depth) = self.config.depth {
            cmd.arg("--depth").arg(depth.to_string());
        }
        if let Some(branch) = &self.config.branch {
            cmd.arg("--branch").arg(branch);
        }
        cmd.arg("--").arg(repository).arg(dest);
        // never block on a credential prompt
        cmd.env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null());
        cmd
    }
}

impl SourceFetcher for GitFetcher {
    fn fetch_repository(&self, repository: &str, dest: &Path) -> Result<(), KodiRepoError> {
        let output = self.clone_command(repository, dest).output()
            .map_err(|err| create_kodi_repo_error!(KodiRepoErrorKind::Fetch, "Failed to run {}: {err}", self.config.binary))?;
        if output.status.success() {
            Ok(())
        } else {
            create_kodi_repo_error_result!(KodiRepoErrorKind::Fetch, "git clone failed with {}: {}",
                output.status, String::from_utf8_lossy(&output.stderr).trim())
        }
    }
}

fn read_addon_metadata(addon_dir: &Path) -> Result<AddonMetadata, KodiRepoError> {
    let metadata_path = addon_dir.join(ADDON_XML_FILE);
    let file = file_utils::open_file(&metadata_path)
        .map_err(|err| create_kodi_repo_error!(KodiRepoErrorKind::Metadata, "Cant read {ADDON_XML_FILE}: {err}"))?;
    let metadata = AddonMetadata::from_xml(file_utils::file_reader(file))?;
    metadata.validate()?;
    Ok(metadata)
}

fn fetch_addon_into(fetcher: &dyn SourceFetcher, source: &AddonSource, clone_dir: &Path, working_dir: &Path) -> Result<AddonMetadata, KodiRepoError> {
    fetcher.fetch_repository(&source.repository, clone_dir)?;
    let addon_dir = if source.path.is_empty() { clone_dir.to_path_buf() } else { clone_dir.join(&source.path) };
    let metadata = read_addon_metadata(&addon_dir)?;

    let addon_target = working_dir.join(&metadata.id);
    // claiming the folder first makes concurrent fetches of the same id fail
    match fs::create_dir(&addon_target) {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::AlreadyExists => {
            return create_kodi_repo_error_result!(KodiRepoErrorKind::Metadata, "Duplicate addon ID: {}", metadata.id);
        }
        Err(err) => return Err(io_err!("Cant create {}: {err}", addon_target.display())),
    }
    let count = file_utils::copy_dir_recursive(&addon_dir, &addon_target)
        .map_err(|err| io_err!("Cant copy addon {}: {err}", metadata.id))?;
    debug_if_enabled!("addon {} fetched with {} files", metadata, count);
    Ok(metadata)
}

/// Fetches one add-on and copies it to `<working_dir>/<id>`.
pub fn fetch_addon(fetcher: &dyn SourceFetcher, source: &AddonSource, working_dir: &Path) -> Result<AddonMetadata, KodiRepoError> {
    let clone_dir = tempfile::Builder::new().prefix(TEMP_DIR_PREFIX).tempdir()
        .map_err(|err| io_err!("Cant create temp directory: {err}"))?;
    let result = fetch_addon_into(fetcher, source, clone_dir.path(), working_dir);
    let clone_path = clone_dir.path().to_path_buf();
    if let Err(err) = clone_dir.close() {
        warn!("Cant remove temp directory {}: {err}", clone_path.display());
    }
    result
}

/// Fetches all add-ons in parallel. Results keep the order of `sources`,
/// the first failing source in that order decides the error.
pub fn fetch_addons(fetcher: &dyn SourceFetcher, sources: &[AddonSource], working_dir: &Path) -> Result<Vec<AddonMetadata>, KodiRepoError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(sources.len().clamp(1, MAX_FETCH_THREADS))
        .thread_name(|index| format!("fetch-{index}"))
        .build()
        .map_err(|err| io_err!("Cant create fetch threads: {err}"))?;
    let results: Vec<Result<AddonMetadata, KodiRepoError>> = pool.install(|| {
        sources.par_iter().map(|source| {
            debug_if_enabled!("fetching addon {}", source.sanitized());
            fetch_addon(fetcher, source, working_dir).map_err(|err| {
                error!("Failed to fetch addon {}: {err}", source.sanitized());
                err
            })
        }).collect()
    });
    results.into_iter().collect()
}
