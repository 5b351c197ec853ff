//! Benchmark directory layout and loading.
//!
//! A benchmark root holds one directory per benchmark:
//!
//! ```text
//! <root>/<name>/buggy/<Program>.java
//! <root>/<name>/fixed/<Program>.java     (optional)
//! <root>/<name>/tests/<ProgramTest>.java
//! <root>/<name>/faultloc.json
//! ```

use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::core::{Error, Language, Result, SourceFile};
use crate::faultloc::{FaultLocalization, FaultLocalizationProvider};

/// File name of the fault-localization data inside a benchmark directory.
pub const FAULTLOC_FILE: &str = "faultloc.json";

/// One benchmark's sources and paths.
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    pub name: String,
    /// The benchmark's own directory.
    pub root: PathBuf,
    pub buggy: SourceFile,
    pub fixed: Option<SourceFile>,
    pub tests: SourceFile,
    pub faultloc_path: PathBuf,
}

impl BenchmarkConfig {
    pub fn language(&self) -> Language {
        self.buggy.language
    }
}

/// A benchmark together with its validated fault localization.
#[derive(Debug, Clone)]
pub struct LoadedBenchmark {
    pub config: BenchmarkConfig,
    pub fault_localization: FaultLocalization,
}

/// Loads benchmarks from a root directory.
#[derive(Debug, Clone)]
pub struct BenchmarkLoader {
    root: PathBuf,
}

impl BenchmarkLoader {
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        if !root.exists() {
            return Err(Error::benchmark(format!(
                "benchmark root does not exist: {}",
                root.display()
            )));
        }
        if !root.is_dir() {
            return Err(Error::benchmark(format!(
                "benchmark root must be a directory: {}",
                root.display()
            )));
        }
        Ok(Self {
            root: root.canonicalize()?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load one benchmark by name.
    pub fn load(&self, name: &str) -> Result<BenchmarkConfig> {
        if name.trim().is_empty() {
            return Err(Error::benchmark("benchmark name cannot be empty"));
        }
        let relative = Path::new(name);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(Error::benchmark(format!(
                "benchmark path traversal detected: {name}"
            )));
        }

        let dir = self.root.join(relative);
        if !dir.is_dir() {
            return Err(Error::benchmark(format!(
                "benchmark does not exist: {}",
                dir.display()
            )));
        }
        let dir = dir.canonicalize()?;
        if !dir.starts_with(&self.root) {
            return Err(Error::benchmark(format!(
                "benchmark path traversal detected: {}",
                dir.display()
            )));
        }

        let buggy = single_source(&dir.join("buggy"), "buggy", None)?;
        let language = buggy.language;
        let fixed = if dir.join("fixed").is_dir() {
            Some(single_source(&dir.join("fixed"), "fixed", Some(language))?)
        } else {
            None
        };
        let tests = single_source(&dir.join("tests"), "tests", Some(language))?;

        let faultloc_path = dir.join(FAULTLOC_FILE);
        if !faultloc_path.is_file() {
            return Err(Error::benchmark(format!(
                "fault localization file does not exist: {}",
                faultloc_path.display()
            )));
        }

        tracing::debug!("Loaded benchmark {} ({})", name, language);

        Ok(BenchmarkConfig {
            name: name.to_string(),
            root: dir,
            buggy,
            fixed,
            tests,
            faultloc_path,
        })
    }

    /// Load a benchmark and its fault localization through `provider`.
    pub fn load_with(
        &self,
        name: &str,
        provider: &dyn FaultLocalizationProvider,
    ) -> Result<LoadedBenchmark> {
        let config = self.load(name)?;
        let fault_localization = provider.load_for(&config)?;
        Ok(LoadedBenchmark {
            config,
            fault_localization,
        })
    }

    /// Names of all directories under the root that contain a `buggy/` directory.
    pub fn list_available(&self) -> Vec<String> {
        let mut names: Vec<String> = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir() && e.path().join("buggy").is_dir())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// The single supported source file in `dir`.
fn single_source(dir: &Path, label: &str, expected: Option<Language>) -> Result<SourceFile> {
    if !dir.is_dir() {
        return Err(Error::benchmark(format!(
            "{label} directory does not exist: {}",
            dir.display()
        )));
    }

    let files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| match (Language::detect(p), expected) {
            (Some(lang), Some(want)) => lang == want,
            (Some(_), None) => true,
            (None, _) => false,
        })
        .collect();

    let [path] = files.as_slice() else {
        return Err(Error::benchmark(format!(
            "expected exactly one {label} source file in {}, found {}",
            dir.display(),
            files.len()
        )));
    };

    let file = SourceFile::load(path)?;
    if file.is_blank() {
        return Err(Error::benchmark(format!(
            "{label} file is empty: {}",
            path.display()
        )));
    }
    Ok(file)
}
