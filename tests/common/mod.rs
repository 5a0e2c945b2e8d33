#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Writes raw bytes, for inputs that are deliberately not valid text.
    pub fn write_bytes(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents).expect("write temp file contents");
        path
    }
}

/// Reads one member of a ZIP archive into a UTF-8 string.
pub fn read_zip_member(archive_path: &Path, member: &str) -> String {
    use std::io::Read;

    let file = File::open(archive_path).expect("open archive");
    let mut archive = zip::ZipArchive::new(file).expect("read archive");
    let mut entry = archive.by_name(member).expect("archive member");
    let mut contents = String::new();
    entry.read_to_string(&mut contents).expect("member text");
    contents
}

/// Lists the member names of a ZIP archive, sorted.
pub fn zip_member_names(archive_path: &Path) -> Vec<String> {
    let file = File::open(archive_path).expect("open archive");
    let archive = zip::ZipArchive::new(file).expect("read archive");
    let mut names: Vec<String> = archive.file_names().map(|n| n.to_string()).collect();
    names.sort();
    names
}
