//! Discovery of definition files across module paths and the active environment.

use derive_more::Constructor;
#[cfg(test)]
use mockall::automock;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Locates physical files for a logical file name.
#[cfg_attr(test, automock)]
pub trait FileLocator {
    /// Returns all existing files with given relative name, most specific first.
    fn locate(&self, file_name: &Path) -> Vec<PathBuf>;
}

/// Looks up files in module directories, given in precedence order. When an environment is
/// active, `<root>/<environment>/<file>` of every root is more specific than any
/// `<root>/<file>`.
#[derive(Clone, Debug, Constructor)]
pub struct ModuleFileLocator {
    roots: Vec<PathBuf>,
    environment: Option<String>,
}

impl ModuleFileLocator {
    fn candidates<'a>(&'a self, file_name: &'a Path) -> impl Iterator<Item = PathBuf> + 'a {
        let environment_candidates = self.environment.iter().flat_map(move |environment| {
            self.roots
                .iter()
                .map(move |root| root.join(environment).join(file_name))
        });

        environment_candidates.chain(self.roots.iter().map(move |root| root.join(file_name)))
    }
}

impl FileLocator for ModuleFileLocator {
    fn locate(&self, file_name: &Path) -> Vec<PathBuf> {
        self.candidates(file_name)
            .filter(|path| {
                let exists = path.is_file();
                trace!(path = %path.display(), exists, "Checking definition file candidate");
                exists
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::locator::{FileLocator, ModuleFileLocator};
    use std::fs;
    use std::path::{Path, PathBuf};

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "{}").unwrap();
    }

    #[test]
    fn should_locate_files_most_specific_first() {
        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("app");
        let core = dir.path().join("core");

        touch(&app.join("dependencies.json"));
        touch(&core.join("dependencies.json"));
        touch(&core.join("dev").join("dependencies.json"));
        touch(&app.join("prod").join("dependencies.json"));

        let locator = ModuleFileLocator::new(vec![app.clone(), core.clone()], Some("dev".to_string()));

        assert_eq!(
            locator.locate(Path::new("dependencies.json")),
            vec![
                core.join("dev").join("dependencies.json"),
                app.join("dependencies.json"),
                core.join("dependencies.json"),
            ]
        );
    }

    #[test]
    fn should_ignore_environment_when_not_set() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("dev").join("dependencies.json"));

        let locator = ModuleFileLocator::new(vec![dir.path().to_path_buf()], None);

        assert_eq!(
            locator.locate(Path::new("dependencies.json")),
            Vec::<PathBuf>::new()
        );
    }
}
