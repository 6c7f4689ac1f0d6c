use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::io_err;
use crate::kodi_repo_error::{to_io_error, KodiRepoError};
use crate::model::AddonMetadata;
use crate::utils::{debug_if_enabled, file_utils, ADDON_ASSET_FILES};

/// Archive entry name `<id>/<relative path>`, always with `/` separators.
fn archive_entry_name(addon_id: &str, relative: &Path) -> String {
    let mut name = String::from(addon_id);
    for component in relative.components() {
        if let Component::Normal(part) = component {
            name.push('/');
            name.push_str(&part.to_string_lossy());
        }
    }
    name
}

#[cfg(unix)]
fn file_options(path: &Path, options: SimpleFileOptions) -> io::Result<SimpleFileOptions> {
    use std::os::unix::fs::PermissionsExt;
    let mode = fs::metadata(path)?.permissions().mode();
    Ok(options.unix_permissions(mode & 0o777))
}

#[cfg(not(unix))]
fn file_options(_path: &Path, options: SimpleFileOptions) -> io::Result<SimpleFileOptions> {
    Ok(options)
}

fn write_addon_zip(addon_id: &str, addon_dir: &Path, zip_path: &Path) -> io::Result<usize> {
    let file = file_utils::create_new_file_for_write(zip_path)?;
    let mut zip = ZipWriter::new(file_utils::file_writer(file));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut count = 0;
    file_utils::traverse_dir(addon_dir, &mut |relative, absolute| {
        zip.start_file(archive_entry_name(addon_id, relative), file_options(absolute, options)?)
            .map_err(to_io_error)?;
        let mut source = file_utils::open_file(absolute)?;
        io::copy(&mut source, &mut zip)?;
        count += 1;
        Ok(())
    })?;
    zip.finish().map_err(to_io_error)?.flush()?;
    Ok(count)
}

/// Publishes a fetched add-on from `<source_dir>/<id>` to `<target_dir>/<id>`:
/// the asset files Kodi shows before installing and the `<id>-<version>.zip` package.
pub fn package_addon(metadata: &AddonMetadata, source_dir: &Path, target_dir: &Path) -> Result<PathBuf, KodiRepoError> {
    let addon_source = source_dir.join(&metadata.id);
    let addon_target = target_dir.join(&metadata.id);
    fs::create_dir_all(&addon_target)
        .map_err(|err| io_err!("Cant create {}: {err}", addon_target.display()))?;

    for asset in ADDON_ASSET_FILES {
        let asset_path = addon_source.join(asset);
        if asset_path.is_file() {
            fs::copy(&asset_path, addon_target.join(asset))
                .map_err(|err| io_err!("Cant copy {asset} of addon {}: {err}", metadata.id))?;
        }
    }

    let zip_path = addon_target.join(metadata.package_name());
    let count = write_addon_zip(&metadata.id, &addon_source, &zip_path)
        .map_err(|err| io_err!("Cant write {}: {err}", zip_path.display()))?;
    debug_if_enabled!("{} packed with {} files", zip_path.display(), count);
    Ok(zip_path)
}

#[cfg(test)]
mod tests {
    use crate::model::AddonMetadata;
    use crate::processing::package::{archive_entry_name, package_addon};
    use crate::processing::test_support::write_addon;
    use std::fs;
    use std::io::Read;
    use std::path::Path;

    #[test]
    fn test_archive_entry_name() {
        assert_eq!(archive_entry_name("plugin.a", Path::new("addon.xml")), "plugin.a/addon.xml");
        assert_eq!(archive_entry_name("plugin.a", Path::new("resources/lib/main.py")), "plugin.a/resources/lib/main.py");
    }

    #[test]
    fn test_package_addon() {
        let source = tempfile::tempdir().unwrap();
        let target = tempfile::tempdir().unwrap();
        write_addon(&source.path().join("plugin.a"), "plugin.a", "1.0.1");
        fs::write(source.path().join("plugin.a/changelog.txt"), "v1.0.1\n- fixes").unwrap();
        let metadata = AddonMetadata { id: "plugin.a".to_string(), version: "1.0.1".to_string() };

        let zip_path = package_addon(&metadata, source.path(), target.path()).unwrap();
        assert_eq!(zip_path, target.path().join("plugin.a/plugin.a-1.0.1.zip"));
        for asset in ["addon.xml", "changelog.txt", "icon.png"] {
            assert!(target.path().join("plugin.a").join(asset).is_file(), "{asset}");
        }
        assert!(!target.path().join("plugin.a/fanart.jpg").exists());
        assert!(!target.path().join("plugin.a/resources").exists());

        let mut archive = zip::ZipArchive::new(fs::File::open(&zip_path).unwrap()).unwrap();
        let mut names = archive.file_names().map(String::from).collect::<Vec<_>>();
        names.sort();
        assert_eq!(names, vec!["plugin.a/addon.xml", "plugin.a/changelog.txt", "plugin.a/icon.png", "plugin.a/resources/lib/main.py"]);
        let mut main_py = String::new();
        archive.by_name("plugin.a/resources/lib/main.py").unwrap().read_to_string(&mut main_py).unwrap();
        assert_eq!(main_py, "import xbmc\n");
    }

    #[test]
    fn test_package_overwrites_existing_zip() {
        let source = tempfile::tempdir().unwrap();
        let target = tempfile::tempdir().unwrap();
        write_addon(&source.path().join("plugin.a"), "plugin.a", "1.0.0");
        fs::create_dir_all(target.path().join("plugin.a")).unwrap();
        fs::write(target.path().join("plugin.a/plugin.a-1.0.0.zip"), "stale").unwrap();
        let metadata = AddonMetadata { id: "plugin.a".to_string(), version: "1.0.0".to_string() };

        let zip_path = package_addon(&metadata, source.path(), target.path()).unwrap();
        let archive = zip::ZipArchive::new(fs::File::open(zip_path).unwrap()).unwrap();
        assert_eq!(archive.len(), 3);
    }
}
