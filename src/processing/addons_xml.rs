use std::fs;
use std::path::{Path, PathBuf};

use log::warn;

use crate::io_err;
use crate::kodi_repo_error::KodiRepoError;
use crate::utils::{debug_if_enabled, file_utils, ADDONS_XML_FILE, ADDONS_XML_MD5_FILE, ADDON_XML_FILE};

const ADDONS_XML_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<addons>\n";
const ADDONS_XML_FOOTER: &str = "\n</addons>\n";

// every line boundary Kodi's python generator splits on
const LINE_BREAKS: &[char] = &['\n', '\r', '\x0b', '\x0c', '\x1c', '\x1d', '\x1e', '\u{85}', '\u{2028}', '\u{2029}'];

/// Splits at all `LINE_BREAKS`, `\r\n` counts as one break. No empty line after a final break.
fn split_lines(content: &str) -> Vec<&str> {
    let mut lines = vec![];
    let mut start = 0;
    let mut chars = content.char_indices().peekable();
    while let Some((index, c)) = chars.next() {
        if LINE_BREAKS.contains(&c) {
            lines.push(&content[start..index]);
            start = index + c.len_utf8();
            if c == '\r' && chars.peek().is_some_and(|(_, next)| *next == '\n') {
                chars.next();
                start += 1;
            }
        }
    }
    if start < content.len() {
        lines.push(&content[start..]);
    }
    lines
}

/// `addon.xml` without its xml declaration and trailing whitespace.
fn addon_xml_block(content: &str) -> String {
    split_lines(content).into_iter()
        .filter(|line| !line.contains("<?xml"))
        .map(str::trim_end)
        .collect::<Vec<&str>>()
        .join("\n")
        .trim_end()
        .to_string()
}

fn list_addon_dirs(dir: &Path) -> Result<Vec<PathBuf>, KodiRepoError> {
    let entries = fs::read_dir(dir)
        .and_then(|entries| entries.collect::<std::io::Result<Vec<_>>>())
        .map_err(|err| io_err!("Cant read directory {}: {err}", dir.display()))?;
    let mut addon_dirs = entries.into_iter()
        .filter(|entry| !file_utils::is_vcs_dir(&entry.file_name().to_string_lossy()))
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect::<Vec<_>>();
    addon_dirs.sort();
    Ok(addon_dirs)
}

/// Builds the repository index from the `addon.xml` of every add-on folder in `dir`.
/// Folders without a readable `addon.xml` are left out.
pub fn generate_addons_xml(dir: &Path) -> Result<String, KodiRepoError> {
    let mut addons_xml = String::from(ADDONS_XML_HEADER);
    for addon_dir in list_addon_dirs(dir)? {
        let addon_xml_path = addon_dir.join(ADDON_XML_FILE);
        match fs::read_to_string(&addon_xml_path) {
            Ok(content) => {
                addons_xml.push_str(&addon_xml_block(&content));
                addons_xml.push_str("\n\n");
            }
            Err(err) => warn!("Excluding {} for {err}", addon_xml_path.display()),
        }
    }
    let mut result = addons_xml.trim().to_string();
    result.push_str(ADDONS_XML_FOOTER);
    Ok(result)
}

pub fn addons_xml_md5(content: &str) -> String {
    format!("{:x}", md5::compute(content.as_bytes()))
}

/// Writes `addons.xml` and `addons.xml.md5` into `dir`.
pub fn write_addons_xml(dir: &Path) -> Result<PathBuf, KodiRepoError> {
    let addons_xml = generate_addons_xml(dir)?;
    let checksum = addons_xml_md5(&addons_xml);
    let addons_xml_path = dir.join(ADDONS_XML_FILE);
    fs::write(&addons_xml_path, &addons_xml)
        .map_err(|err| io_err!("Cant write {}: {err}", addons_xml_path.display()))?;
    let md5_path = dir.join(ADDONS_XML_MD5_FILE);
    fs::write(&md5_path, &checksum)
        .map_err(|err| io_err!("Cant write {}: {err}", md5_path.display()))?;
    debug_if_enabled!("{} written with checksum {}", addons_xml_path.display(), checksum);
    Ok(addons_xml_path)
}

#[cfg(test)]
mod tests {
    use crate::processing::addons_xml::{addons_xml_md5, generate_addons_xml, split_lines, write_addons_xml};
    use crate::processing::test_support::write_addon;
    use std::fs;

    #[test]
    fn test_generate_addons_xml() {
        let dir = tempfile::tempdir().unwrap();
        write_addon(&dir.path().join("script.b"), "script.b", "1.0.0");
        write_addon(&dir.path().join("plugin.a"), "plugin.a", "2.0.0");
        fs::create_dir_all(dir.path().join("broken")).unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/addon.xml"), "<addon id=\"git\"/>").unwrap();

        let addons_xml = generate_addons_xml(dir.path()).unwrap();
        let expected = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<addons>
<addon id="plugin.a" name="plugin.a" version="2.0.0" provider-name="test">
    <extension point="xbmc.python.pluginsource" library="main.py"/>
</addon>

<addon id="script.b" name="script.b" version="1.0.0" provider-name="test">
    <extension point="xbmc.python.pluginsource" library="main.py"/>
</addon>
</addons>
"#;
        assert_eq!(addons_xml, expected);
    }

    #[test]
    fn test_strips_declaration_and_trailing_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("plugin.a")).unwrap();
        fs::write(dir.path().join("plugin.a/addon.xml"), "<?xml version='1.0'?>\r\n<addon id=\"plugin.a\" version=\"1.0.0\">  \r\n</addon>\r\n\r\n").unwrap();

        let addons_xml = generate_addons_xml(dir.path()).unwrap();
        assert!(addons_xml.ends_with("<addons>\n<addon id=\"plugin.a\" version=\"1.0.0\">\n</addon>\n</addons>\n"));
    }

    #[test]
    fn test_split_lines() {
        assert_eq!(split_lines("a\r\nb\rc\nd\u{2028}e\x0c"), vec!["a", "b", "c", "d", "e"]);
        assert_eq!(split_lines("a\n\nb"), vec!["a", "", "b"]);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn test_carriage_return_line_endings() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("plugin.a")).unwrap();
        fs::write(dir.path().join("plugin.a/addon.xml"), "<?xml version=\"1.0\"?>\r<addon id=\"plugin.a\" version=\"1.0.0\">\r</addon>\r").unwrap();

        let addons_xml = generate_addons_xml(dir.path()).unwrap();
        assert_eq!(addons_xml, "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<addons>\n<addon id=\"plugin.a\" version=\"1.0.0\">\n</addon>\n</addons>\n");
    }

    #[test]
    fn test_empty_repository() {
        let dir = tempfile::tempdir().unwrap();
        let addons_xml = generate_addons_xml(dir.path()).unwrap();
        assert_eq!(addons_xml, "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<addons>\n</addons>\n");
    }

    #[test]
    fn test_write_addons_xml() {
        assert_eq!(addons_xml_md5(""), "d41d8cd98f00b204e9800998ecf8427e");

        let dir = tempfile::tempdir().unwrap();
        write_addon(&dir.path().join("plugin.a"), "plugin.a", "1.0.0");
        let path = write_addons_xml(dir.path()).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let checksum = fs::read_to_string(dir.path().join("addons.xml.md5")).unwrap();
        assert_eq!(checksum, addons_xml_md5(&content));
        assert_eq!(checksum.len(), 32);
    }
}
