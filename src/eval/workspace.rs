//! Throwaway Maven projects, one per candidate.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::benchmark::BenchmarkConfig;
use crate::core::{Error, Result};

/// Every sandbox directory name starts with this marker.
pub const WORKSPACE_PREFIX: &str = "apr-";

const POM_XML: &str = r#"<project xmlns="http://maven.apache.org/POM/4.0.0"
         xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
         xsi:schemaLocation="http://maven.apache.org/POM/4.0.0 http://maven.apache.org/xsd/maven-4.0.0.xsd">
    <modelVersion>4.0.0</modelVersion>
    <groupId>mend.workspace</groupId>
    <artifactId>workspace</artifactId>
    <version>1.0-SNAPSHOT</version>
    <properties>
        <maven.compiler.release>17</maven.compiler.release>
        <project.build.sourceEncoding>UTF-8</project.build.sourceEncoding>
    </properties>
    <dependencies>
        <dependency>
            <groupId>org.junit.jupiter</groupId>
            <artifactId>junit-jupiter</artifactId>
            <version>5.14.1</version>
            <scope>test</scope>
        </dependency>
    </dependencies>
    <build>
        <plugins>
            <plugin>
                <groupId>org.apache.maven.plugins</groupId>
                <artifactId>maven-surefire-plugin</artifactId>
                <version>3.5.4</version>
                <configuration>
                    <includes>
                        <include>**/*Test.java</include>
                    </includes>
                </configuration>
            </plugin>
        </plugins>
    </build>
</project>
"#;

/// Lays out a candidate and the benchmark's test suite as a Maven project.
#[derive(Debug, Clone)]
pub struct WorkspaceBuilder {
    base: PathBuf,
}

impl Default for WorkspaceBuilder {
    fn default() -> Self {
        Self {
            base: std::env::temp_dir(),
        }
    }
}

impl WorkspaceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `<tmp>/apr-<benchmark>-XXXX` holding `pom.xml`, the candidate
    /// under `src/main/java` and the test suite under `src/test/java`.
    ///
    /// The directory is not removed on drop; hand it to
    /// [`WorkspaceCleaner::delete_recursively`] when done.
    pub fn build(&self, benchmark: &BenchmarkConfig, candidate: &str) -> Result<PathBuf> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("{WORKSPACE_PREFIX}{}-", benchmark.name))
            .tempdir_in(&self.base)?
            .keep();

        let result = Self::populate(&dir, benchmark, candidate);
        if let Err(e) = result {
            WorkspaceCleaner::delete_quietly(&dir);
            return Err(e);
        }
        Ok(dir)
    }

    fn populate(dir: &Path, benchmark: &BenchmarkConfig, candidate: &str) -> Result<()> {
        fs::write(dir.join("pom.xml"), POM_XML)?;

        let main = dir.join("src/main/java");
        fs::create_dir_all(&main)?;
        fs::write(main.join(benchmark.buggy.file_name()), candidate)?;

        let test = dir.join("src/test/java");
        fs::create_dir_all(&test)?;
        fs::write(test.join(benchmark.tests.file_name()), &benchmark.tests.content)?;
        Ok(())
    }
}

/// Guarded recursive deletion of sandbox directories.
pub struct WorkspaceCleaner;

impl WorkspaceCleaner {
    /// Delete `root` depth-first.
    ///
    /// Refuses unless the directory name carries [`WORKSPACE_PREFIX`] and the
    /// path lies under the process temp directory. A missing path is fine.
    pub fn delete_recursively(root: &Path) -> Result<()> {
        if !root.exists() {
            return Ok(());
        }

        let marked = root
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(WORKSPACE_PREFIX));
        if !marked {
            return Err(Error::workspace(format!(
                "refusing to delete directory not starting with '{WORKSPACE_PREFIX}': {}",
                root.display()
            )));
        }

        let tmp = std::env::temp_dir()
            .canonicalize()
            .unwrap_or_else(|_| std::env::temp_dir());
        let abs = root.canonicalize()?;
        if !abs.starts_with(&tmp) || abs == tmp {
            return Err(Error::workspace(format!(
                "refusing to delete directory outside of temp dir: {}",
                root.display()
            )));
        }

        for entry in WalkDir::new(&abs).contents_first(true) {
            let entry = entry.map_err(|e| Error::workspace(e.to_string()))?;
            if entry.file_type().is_dir() {
                fs::remove_dir(entry.path())?;
            } else {
                fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }

    /// Delete and log instead of failing.
    pub fn delete_quietly(root: &Path) {
        if let Err(e) = Self::delete_recursively(root) {
            tracing::warn!("Failed to delete workspace {}: {}", root.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Language, SourceFile};

    fn benchmark() -> BenchmarkConfig {
        BenchmarkConfig {
            name: "clamp".to_string(),
            root: PathBuf::from("bm/clamp"),
            buggy: SourceFile::from_content(
                "bm/clamp/buggy/Clamp.java",
                Language::Java,
                "class Clamp {}\n",
            ),
            fixed: None,
            tests: SourceFile::from_content(
                "bm/clamp/tests/ClampTest.java",
                Language::Java,
                "class ClampTest {}\n",
            ),
            faultloc_path: PathBuf::from("bm/clamp/faultloc.json"),
        }
    }

    #[test]
    fn test_build_lays_out_maven_project() {
        let dir = WorkspaceBuilder::new()
            .build(&benchmark(), "class Clamp { int x; }\n")
            .unwrap();

        let name = dir.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("apr-clamp-"));
        assert!(dir.join("pom.xml").is_file());
        assert_eq!(
            fs::read_to_string(dir.join("src/main/java/Clamp.java")).unwrap(),
            "class Clamp { int x; }\n"
        );
        assert_eq!(
            fs::read_to_string(dir.join("src/test/java/ClampTest.java")).unwrap(),
            "class ClampTest {}\n"
        );

        WorkspaceCleaner::delete_recursively(&dir).unwrap();
        assert!(!dir.exists());
    }

    #[test]
    fn test_cleaner_refuses_unmarked_directory() {
        let dir = tempfile::Builder::new().prefix("keep-").tempdir().unwrap();
        fs::write(dir.path().join("f.txt"), "x").unwrap();

        let err = WorkspaceCleaner::delete_recursively(dir.path()).unwrap_err();
        assert!(matches!(err, Error::Workspace(_)));
        assert!(dir.path().join("f.txt").exists());
    }

    #[test]
    fn test_cleaner_refuses_outside_temp_dir() {
        let cwd = std::env::current_dir().unwrap();
        let outside = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(&cwd)
            .unwrap();

        let tmp = std::env::temp_dir().canonicalize().unwrap();
        if cwd.canonicalize().unwrap().starts_with(&tmp) {
            return;
        }
        let err = WorkspaceCleaner::delete_recursively(outside.path()).unwrap_err();
        assert!(matches!(err, Error::Workspace(_)));
        assert!(outside.path().exists());
    }

    #[test]
    fn test_cleaner_ignores_missing_path() {
        let missing = std::env::temp_dir().join("apr-does-not-exist-7f3a");
        assert!(WorkspaceCleaner::delete_recursively(&missing).is_ok());
    }
}
