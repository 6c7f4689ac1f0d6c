use std::fs;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use path_clean::PathClean;

use crate::utils::constants::{CONFIG_FILE, CONFIG_PATH, VCS_DIRS};

pub fn file_writer<W>(w: W) -> BufWriter<W>
where
    W: Write,
{
    BufWriter::with_capacity(131_072, w)
}

pub fn file_reader<R>(r: R) -> BufReader<R>
where
    R: Read,
{
    BufReader::with_capacity(131_072, r)
}

pub fn get_exe_path() -> PathBuf {
    let default_path = std::path::PathBuf::from("./");
    let current_exe = std::env::current_exe();
    match current_exe {
        Ok(exe) => {
            match fs::read_link(&exe) {
                Ok(f) => f.parent().map_or(default_path, std::path::Path::to_path_buf),
                Err(_) => exe.parent().map_or(default_path, std::path::Path::to_path_buf)
            }
        }
        Err(_) => default_path
    }
}

/// `config/config.yml` next to the executable, or relative to the current directory.
pub fn get_default_config_file_path() -> Option<PathBuf> {
    let relative = PathBuf::from(CONFIG_PATH).join(CONFIG_FILE);
    let beside_exe = get_exe_path().join(&relative);
    if beside_exe.is_file() {
        Some(beside_exe)
    } else if relative.is_file() {
        Some(relative)
    } else {
        None
    }
}

pub fn resolve_path(base_dir: &Path, path: &str) -> PathBuf {
    let path = PathBuf::from(path);
    if path.is_relative() {
        base_dir.join(&path).clean()
    } else {
        path.clean()
    }
}

#[inline]
pub fn open_file(file_name: &Path) -> Result<File, std::io::Error> {
    File::open(file_name)
}

#[inline]
pub fn create_new_file_for_write(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().write(true).create(true).truncate(true).open(path)
}

pub fn is_vcs_dir(name: &str) -> bool {
    VCS_DIRS.contains(&name)
}

/// Visits every file below `root` in name order, handing out the path relative to `root`
/// and the absolute path. Version control folders are skipped.
pub fn traverse_dir<F>(root: &Path, visit: &mut F) -> std::io::Result<()>
where
    F: FnMut(&Path, &Path) -> std::io::Result<()>,
{
    traverse_dir_relative(root, Path::new(""), visit)
}

fn traverse_dir_relative<F>(root: &Path, relative: &Path, visit: &mut F) -> std::io::Result<()>
where
    F: FnMut(&Path, &Path) -> std::io::Result<()>,
{
    let dir = root.join(relative);
    let mut entries = fs::read_dir(&dir)?.collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(fs::DirEntry::file_name);
    for entry in entries {
        let file_name = entry.file_name();
        if is_vcs_dir(&file_name.to_string_lossy()) {
            continue;
        }
        let entry_path = entry.path();
        let entry_relative = relative.join(&file_name);
        // follows symlinks, the link target is what gets published
        let metadata = fs::metadata(&entry_path)?;
        if metadata.is_dir() {
            traverse_dir_relative(root, &entry_relative, visit)?;
        } else if metadata.is_file() {
            visit(&entry_relative, &entry_path)?;
        }
    }
    Ok(())
}

/// Copies the file tree below `src` into `dest`, returns the number of copied files.
pub fn copy_dir_recursive(src: &Path, dest: &Path) -> std::io::Result<usize> {
    fs::create_dir_all(dest)?;
    let mut count = 0;
    traverse_dir(src, &mut |relative, absolute| {
        let target = dest.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(absolute, &target)?;
        count += 1;
        Ok(())
    })?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use crate::utils::file::file_utils::{copy_dir_recursive, resolve_path, traverse_dir};
    use std::fs;
    use std::path::{Path, PathBuf};

    #[test]
    fn test_resolve_path() {
        assert_eq!(resolve_path(Path::new("/etc/kodi"), "../repo"), PathBuf::from("/etc/repo"));
        assert_eq!(resolve_path(Path::new("/etc/kodi"), "/srv/repo/"), PathBuf::from("/srv/repo"));
    }

    #[test]
    fn test_traverse_skips_vcs() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        fs::create_dir_all(dir.path().join("resources/lib"))?;
        fs::create_dir_all(dir.path().join(".git/objects"))?;
        fs::write(dir.path().join("addon.xml"), "<addon/>")?;
        fs::write(dir.path().join("resources/lib/main.py"), "print()")?;
        fs::write(dir.path().join(".git/HEAD"), "ref")?;

        let mut visited = vec![];
        traverse_dir(dir.path(), &mut |relative, _| {
            visited.push(relative.to_path_buf());
            Ok(())
        })?;
        assert_eq!(visited, vec![PathBuf::from("addon.xml"), PathBuf::from("resources/lib/main.py")]);

        let copy = tempfile::tempdir()?;
        let count = copy_dir_recursive(dir.path(), &copy.path().join("plugin.test"))?;
        assert_eq!(count, 2);
        assert!(copy.path().join("plugin.test/resources/lib/main.py").is_file());
        assert!(!copy.path().join("plugin.test/.git").exists());
        Ok(())
    }
}
