use std::error::Error;
use std::fmt::{Display, Formatter, Result};

#[macro_export]
macro_rules! create_kodi_repo_error {
     ($kind: expr, $($arg:tt)*) => {
        $crate::kodi_repo_error::KodiRepoError::new($kind, format!($($arg)*))
    }
}

#[macro_export]
macro_rules! create_kodi_repo_error_result {
     ($kind: expr, $($arg:tt)*) => {
        Err($crate::kodi_repo_error::KodiRepoError::new($kind, format!($($arg)*)))
    }
}

#[macro_export]
macro_rules! config_err {
     ($($arg:tt)*) => {
        $crate::kodi_repo_error::KodiRepoError::new($crate::kodi_repo_error::KodiRepoErrorKind::Config, format!($($arg)*))
    }
}

#[macro_export]
macro_rules! io_err {
     ($($arg:tt)*) => {
        $crate::kodi_repo_error::KodiRepoError::new($crate::kodi_repo_error::KodiRepoErrorKind::Io, format!($($arg)*))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum KodiRepoErrorKind {
    /// Invalid command line or config file
    Config,
    /// Cloning an add-on repository failed
    Fetch,
    /// Broken or invalid addon.xml
    Metadata,
    Io,
}

impl Display for KodiRepoErrorKind {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "{}", match self {
            Self::Config => "Config",
            Self::Fetch => "Fetch",
            Self::Metadata => "Metadata",
            Self::Io => "Io",
        })
    }
}

#[derive(Debug)]
pub struct KodiRepoError {
    pub kind: KodiRepoErrorKind,
    pub message: String,
}

impl KodiRepoError {
    pub const fn new(kind: KodiRepoErrorKind, message: String) -> Self {
        Self {
            kind,
            message,
        }
    }
}

impl Display for KodiRepoError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "{} error: {}", self.kind, self.message)
    }
}

impl Error for KodiRepoError {}

pub fn to_io_error<E>(err: E) -> std::io::Error
where
    E: Error,
{
    std::io::Error::new(std::io::ErrorKind::Other, err.to_string())
}
