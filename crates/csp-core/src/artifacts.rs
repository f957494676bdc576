//! The on-disk run directory: fixed layout, atomic JSON writes, and the
//! append-only event log.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tempfile::NamedTempFile;

use crate::domain::error::{Result, WorkflowError};
use crate::domain::event::Event;
use crate::domain::manifest::RunManifest;
use crate::domain::validation::ValidationReport;

/// Handle onto `<workspace>/runs/<run_id>/`. Every read/write goes through
/// this so the fixed layout lives in one place.
pub struct RunDir {
    root: PathBuf,
}

impl RunDir {
    pub fn new(workspace: &Path, run_id: &str) -> Self {
        Self {
            root: workspace.join("runs").join(run_id),
        }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn exists(&self) -> bool {
        self.manifest_path().is_file()
    }

    fn manifest_path(&self) -> PathBuf {
        self.root.join("run_manifest.json")
    }

    fn constraints_path(&self) -> PathBuf {
        self.root.join("constraints.json")
    }

    fn events_path(&self) -> PathBuf {
        self.root.join("events.jsonl")
    }

    fn candidates_dir(&self) -> PathBuf {
        self.root.join("candidates")
    }

    fn candidate_path(&self, candidate_id: &str) -> PathBuf {
        self.candidates_dir().join(format!("{candidate_id}.cif"))
    }

    fn validation_dir(&self) -> PathBuf {
        self.root.join("validation")
    }

    fn report_path(&self, candidate_id: &str) -> PathBuf {
        self.validation_dir()
            .join(format!("report_{candidate_id}.json"))
    }

    fn summary_path(&self) -> PathBuf {
        self.validation_dir().join("summary.json")
    }

    fn iteration_path(&self, n: u32) -> PathBuf {
        self.root.join(format!("iteration_{n}.json"))
    }

    fn exports_dir(&self) -> PathBuf {
        self.root.join("exports")
    }

    fn export_path(&self, candidate_id: &str, format: &str) -> PathBuf {
        self.exports_dir().join(format!("{candidate_id}.{format}"))
    }

    /// Writes `value` as pretty-printed JSON at `path`, via write-to-tempfile
    /// then rename so readers never observe a partial file.
    fn write_json_atomic<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let dir = path.parent().expect("artifact paths always have a parent");
        fs::create_dir_all(dir)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        let pretty = serde_json::to_vec_pretty(value)?;
        tmp.write_all(&pretty)?;
        tmp.persist(path).map_err(|e| WorkflowError::Io(e.error))?;
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn write_manifest(&self, manifest: &RunManifest) -> Result<()> {
        self.write_json_atomic(&self.manifest_path(), manifest)
    }

    pub fn read_manifest(&self) -> Result<RunManifest> {
        if !self.exists() {
            return Err(WorkflowError::RunNotFound(
                self.root
                    .file_name()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default(),
            ));
        }
        self.read_json(&self.manifest_path())
    }

    pub fn write_constraints<T: Serialize>(&self, constraints: &T) -> Result<()> {
        self.write_json_atomic(&self.constraints_path(), constraints)
    }

    pub fn read_constraints<T: DeserializeOwned>(&self) -> Result<T> {
        self.read_json(&self.constraints_path())
    }

    pub fn append_event(&self, event: &Event) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.events_path())?;
        let line = event.to_jsonl_line()?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    pub fn write_candidate_file(&self, candidate_id: &str, content: &str) -> Result<()> {
        let dir = self.candidates_dir();
        fs::create_dir_all(&dir)?;
        fs::write(self.candidate_path(candidate_id), content)?;
        Ok(())
    }

    pub fn read_candidate_file(&self, candidate_id: &str) -> Result<String> {
        Ok(fs::read_to_string(self.candidate_path(candidate_id))?)
    }

    /// Candidate ids present on disk, derived from `candidates/*.cif`
    /// filenames sorted ascending.
    pub fn list_candidate_ids(&self) -> Result<Vec<String>> {
        let dir = self.candidates_dir();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut ids: Vec<String> = fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                entry
                    .path()
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
            })
            .collect();
        ids.sort();
        Ok(ids)
    }

    pub fn write_report(&self, report: &ValidationReport) -> Result<()> {
        self.write_json_atomic(&self.report_path(&report.candidate_id), report)
    }

    pub fn write_summary<T: Serialize>(&self, summary: &T) -> Result<()> {
        self.write_json_atomic(&self.summary_path(), summary)
    }

    pub fn read_summary<T: DeserializeOwned>(&self) -> Result<T> {
        self.read_json(&self.summary_path())
    }

    pub fn write_iteration_record<T: Serialize>(&self, n: u32, record: &T) -> Result<()> {
        self.write_json_atomic(&self.iteration_path(n), record)
    }

    pub fn write_export(&self, candidate_id: &str, format: &str, content: &str) -> Result<()> {
        let dir = self.exports_dir();
        fs::create_dir_all(&dir)?;
        fs::write(self.export_path(candidate_id, format), content)?;
        Ok(())
    }
}
