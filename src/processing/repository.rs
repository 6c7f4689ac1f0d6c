use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::kodi_repo_error::{KodiRepoError, KodiRepoErrorKind};
use crate::model::{AddonMetadata, AddonSource};
use crate::processing::addons_xml::write_addons_xml;
use crate::processing::fetch::{fetch_addons, SourceFetcher};
use crate::processing::package::package_addon;
use crate::utils::{StepMeasure, ADDONS_XML_FILE, ADDONS_XML_MD5_FILE, TEMP_DIR_PREFIX};
use crate::{create_kodi_repo_error_result, io_err};

#[derive(Debug)]
pub struct RepositorySummary {
    pub target_dir: PathBuf,
    pub addons: Vec<AddonMetadata>,
}

fn publish_index(working_dir: &Path, target_dir: &Path) -> Result<(), KodiRepoError> {
    fs::create_dir_all(target_dir)
        .map_err(|err| io_err!("Cant create target directory {}: {err}", target_dir.display()))?;
    for file_name in [ADDONS_XML_FILE, ADDONS_XML_MD5_FILE] {
        fs::copy(working_dir.join(file_name), target_dir.join(file_name))
            .map_err(|err| io_err!("Cant copy {file_name} to {}: {err}", target_dir.display()))?;
    }
    Ok(())
}

/// Fetches all add-on sources and writes a Kodi repository to `target_dir`.
/// Nothing is written to the target when fetching fails.
pub fn create_repository(fetcher: &dyn SourceFetcher, sources: &[AddonSource], target_dir: &Path) -> Result<RepositorySummary, KodiRepoError> {
    if sources.is_empty() {
        return create_kodi_repo_error_result!(KodiRepoErrorKind::Config, "No addons to put into the repository");
    }
    let working_dir = tempfile::Builder::new().prefix(TEMP_DIR_PREFIX).tempdir()
        .map_err(|err| io_err!("Cant create working directory: {err}"))?;

    let mut step = StepMeasure::new("fetching addons");
    let addons = fetch_addons(fetcher, sources, working_dir.path())?;
    step.tick("generating addons.xml");
    write_addons_xml(working_dir.path())?;
    step.tick("packaging addons");
    publish_index(working_dir.path(), target_dir)?;
    for addon in &addons {
        let zip_path = package_addon(addon, working_dir.path(), target_dir)?;
        info!("Packaged {addon} to {}", zip_path.display());
    }
    step.stop();

    Ok(RepositorySummary {
        target_dir: target_dir.to_path_buf(),
        addons,
    })
}
