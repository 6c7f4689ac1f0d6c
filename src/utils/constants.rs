pub const CONFIG_PATH: &str = "config";
pub const CONFIG_FILE: &str = "config.yml";

pub const ENV_LOG_LEVEL: &str = "KODI_REPO_LOG";

pub const ADDON_XML_FILE: &str = "addon.xml";
pub const ADDONS_XML_FILE: &str = "addons.xml";
pub const ADDONS_XML_MD5_FILE: &str = "addons.xml.md5";

/// Files Kodi shows before an add-on is installed, published next to the zip package.
pub const ADDON_ASSET_FILES: &[&str] = &["addon.xml", "changelog.txt", "icon.png", "fanart.jpg", "LICENSE.txt"];

/// Version control folders never end up in the repository.
pub const VCS_DIRS: &[&str] = &[".git", ".svn"];

pub const TEMP_DIR_PREFIX: &str = "repo-";
