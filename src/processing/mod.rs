pub mod addons_xml;
pub mod fetch;
pub mod package;
pub mod repository;
