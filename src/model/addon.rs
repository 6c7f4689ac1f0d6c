use std::fmt::Display;
use std::io::BufRead;
use std::str::FromStr;
use std::sync::LazyLock;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;

use crate::kodi_repo_error::{KodiRepoError, KodiRepoErrorKind};
use crate::{config_err, create_kodi_repo_error, create_kodi_repo_error_result};

static URL_CREDENTIALS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?P<scheme>[a-zA-Z][a-zA-Z0-9+.-]*://)[^/@]+@").unwrap());
// no leading dot, the id is used as folder name
static ADDON_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z0-9_-][a-z0-9._-]*$").unwrap());
// only the prefix is checked, Kodi allows suffixes like 1.0.0~beta1 or 1.0.0+matrix.1
static ADDON_VERSION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.\d+\.\d+").unwrap());

const ATTRIB_ID: &str = "id";
const ATTRIB_VERSION: &str = "version";

/// Location of an add-on: a git repository and the add-on directory inside it.
/// Written as `<repository>:<path>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddonSource {
    pub repository: String,
    pub path: String,
}

impl FromStr for AddonSource {
    type Err = KodiRepoError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        // the last colon separates the path, repository urls may contain colons themselves
        match value.trim().rsplit_once(':') {
            Some((repository, path)) if !repository.is_empty() => Ok(Self {
                repository: repository.to_string(),
                path: path.trim_matches('/').to_string(),
            }),
            _ => Err(config_err!("Invalid addon source {value}, expected <repository>:<path>")),
        }
    }
}

impl AddonSource {
    /// Source with credentials removed from the repository url, for logging.
    pub fn sanitized(&self) -> String {
        format!("{}:{}", URL_CREDENTIALS.replace(&self.repository, "${scheme}***@"), self.path)
    }
}

impl Display for AddonSource {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}:{}", self.repository, self.path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddonMetadata {
    pub id: String,
    pub version: String,
}

fn get_attribute_value(element: &BytesStart, name: &str) -> Result<Option<String>, KodiRepoError> {
    for attribute in element.attributes() {
        let attribute = attribute.map_err(|err| create_kodi_repo_error!(KodiRepoErrorKind::Metadata, "Invalid addon.xml attribute: {err}"))?;
        if attribute.key.as_ref() == name.as_bytes() {
            let value = attribute.unescape_value()
                .map_err(|err| create_kodi_repo_error!(KodiRepoErrorKind::Metadata, "Invalid addon.xml attribute {name}: {err}"))?;
            return Ok(Some(value.to_string()));
        }
    }
    Ok(None)
}

fn read_root_element(element: &BytesStart, has_root: bool) -> Result<(Option<String>, Option<String>), KodiRepoError> {
    if has_root {
        return create_kodi_repo_error_result!(KodiRepoErrorKind::Metadata, "Failed to parse addon.xml: content after the root element");
    }
    Ok((get_attribute_value(element, ATTRIB_ID)?, get_attribute_value(element, ATTRIB_VERSION)?))
}

impl AddonMetadata {
    /// Reads `id` and `version` from the root element of an `addon.xml` document.
    /// The whole document has to be well-formed.
    pub fn from_xml<R: BufRead>(content: R) -> Result<Self, KodiRepoError> {
        let mut reader = Reader::from_reader(content);
        let mut buf = Vec::<u8>::new();
        let mut root: Option<(Option<String>, Option<String>)> = None;
        let mut depth = 0usize;
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(element)) => {
                    if depth == 0 {
                        root = Some(read_root_element(&element, root.is_some())?);
                    }
                    depth += 1;
                }
                Ok(Event::Empty(element)) => {
                    if depth == 0 {
                        root = Some(read_root_element(&element, root.is_some())?);
                    }
                }
                Ok(Event::End(_)) => {
                    if depth == 0 {
                        return create_kodi_repo_error_result!(KodiRepoErrorKind::Metadata, "Failed to parse addon.xml: unexpected end tag");
                    }
                    depth -= 1;
                }
                Ok(Event::Text(text)) => {
                    if depth == 0 && text.iter().any(|b| !b.is_ascii_whitespace()) {
                        return create_kodi_repo_error_result!(KodiRepoErrorKind::Metadata, "Failed to parse addon.xml: text outside of the root element");
                    }
                }
                Ok(Event::CData(_)) if depth == 0 => {
                    return create_kodi_repo_error_result!(KodiRepoErrorKind::Metadata, "Failed to parse addon.xml: text outside of the root element");
                }
                Ok(Event::Eof) => break,
                Err(err) => return create_kodi_repo_error_result!(KodiRepoErrorKind::Metadata,
                    "Failed to parse addon.xml at position {}: {err}", reader.error_position()),
                _ => {}
            }
            buf.clear();
        }
        if depth > 0 {
            return create_kodi_repo_error_result!(KodiRepoErrorKind::Metadata, "Failed to parse addon.xml: {depth} unclosed elements");
        }
        match root {
            Some((Some(id), Some(version))) => Ok(Self { id, version }),
            Some((None, _)) => create_kodi_repo_error_result!(KodiRepoErrorKind::Metadata, "Invalid addon ID: None"),
            Some((_, None)) => create_kodi_repo_error_result!(KodiRepoErrorKind::Metadata, "Invalid addon version: None"),
            None => create_kodi_repo_error_result!(KodiRepoErrorKind::Metadata, "addon.xml has no root element"),
        }
    }

    pub fn validate(&self) -> Result<(), KodiRepoError> {
        if !ADDON_ID.is_match(&self.id) {
            return create_kodi_repo_error_result!(KodiRepoErrorKind::Metadata, "Invalid addon ID: {}", self.id);
        }
        if !ADDON_VERSION.is_match(&self.version) {
            return create_kodi_repo_error_result!(KodiRepoErrorKind::Metadata, "Invalid addon version: {}", self.version);
        }
        Ok(())
    }

    pub fn package_name(&self) -> String {
        format!("{}-{}.zip", self.id, self.version)
    }
}

impl Display for AddonMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} {}", self.id, self.version)
    }
}
