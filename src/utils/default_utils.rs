pub(crate) fn default_git_binary() -> String { String::from("git") }

pub(crate) fn default_as_empty_list<T>() -> Vec<T> { vec![] }
