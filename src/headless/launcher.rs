use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;

use crate::config::HeadlessSettings;
use crate::model::RowId;

use super::{HeadlessError, Result, ResultImage};

pub const OUTPUT_SUFFIX: &str = "_result";
const OUTPUT_FORMAT: &str = "tif";
const STAGING_DIR: &str = "staged-inputs";

/// Result images of one headless run, keyed by the row that supplied the input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HeadlessOutcome {
    pub outputs: BTreeMap<RowId, ResultImage>,
    pub missing: Vec<RowId>,
}

/// Runs a trained ilastik project in headless mode over a batch of images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessLauncher {
    executable: PathBuf,
    project: PathBuf,
    threads: i32,
    max_ram_mb: i64,
}

impl HeadlessLauncher {
    pub fn new(executable: impl Into<PathBuf>, project: impl Into<PathBuf>) -> Self {
        let defaults = HeadlessSettings::default();
        Self {
            executable: executable.into(),
            project: project.into(),
            threads: defaults.threads,
            max_ram_mb: defaults.max_ram_mb,
        }
    }

    pub fn from_settings(settings: &HeadlessSettings) -> Result<Self> {
        let executable = settings
            .executable
            .clone()
            .ok_or(HeadlessError::MissingExecutable)?;
        let project = settings
            .project
            .clone()
            .ok_or(HeadlessError::MissingProject)?;
        Ok(Self::new(executable, project).with_limits(settings.threads, settings.max_ram_mb))
    }

    pub fn with_limits(mut self, threads: i32, max_ram_mb: i64) -> Self {
        self.threads = threads;
        self.max_ram_mb = max_ram_mb;
        self
    }

    pub fn project(&self) -> &Path {
        &self.project
    }

    /// Binary actually started. On macOS an application bundle resolves to the
    /// launcher inside it.
    pub fn executable(&self) -> PathBuf {
        if cfg!(target_os = "macos") {
            bundle_binary(&self.executable)
        } else {
            self.executable.clone()
        }
    }

    pub fn build_command(&self, inputs: &[PathBuf], out_dir: &Path) -> Command {
        let mut command = Command::new(self.executable());
        command
            .arg("--headless")
            .arg(prefixed("--project=", &self.project))
            .arg(format!("--output_format={OUTPUT_FORMAT}"))
            .arg(prefixed(
                "--output_filename_format=",
                &out_dir.join(format!("{{nickname}}{OUTPUT_SUFFIX}")),
            ))
            .args(inputs);
        if self.threads > 0 {
            command.env("LAZYFLOW_THREADS", self.threads.to_string());
        }
        if self.max_ram_mb > 0 {
            command.env("LAZYFLOW_TOTAL_RAM_MB", self.max_ram_mb.to_string());
        }
        command
    }

    /// Classifies every input and reads back `<out_dir>/<row>_result.tif` per row.
    ///
    /// Inputs are copied under `out_dir` with the row key as file stem so the
    /// results can be matched back to their rows. Rows whose result image was not
    /// produced are reported in `missing`.
    pub fn run(&self, inputs: &[(RowId, PathBuf)], out_dir: &Path) -> Result<HeadlessOutcome> {
        if let Some((_, path)) = inputs.iter().find(|(_, path)| !path.is_file()) {
            return Err(HeadlessError::MissingInput(path.clone()));
        }
        fs::create_dir_all(out_dir)?;
        let staging = out_dir.join(STAGING_DIR);
        fs::create_dir_all(&staging)?;

        let result = self.run_staged(inputs, out_dir, &staging);
        if let Err(error) = fs::remove_dir_all(&staging) {
            tracing::warn!(path = %staging.display(), %error, "staged inputs not removed");
        }
        result
    }

    fn run_staged(
        &self,
        inputs: &[(RowId, PathBuf)],
        out_dir: &Path,
        staging: &Path,
    ) -> Result<HeadlessOutcome> {
        let mut staged = Vec::with_capacity(inputs.len());
        for (row, source) in inputs {
            let mut name = OsString::from(file_stem(row));
            if let Some(extension) = source.extension() {
                name.push(".");
                name.push(extension);
            }
            let target = staging.join(name);
            fs::copy(source, &target)?;
            staged.push(target);
        }

        let mut command = self.build_command(&staged, out_dir);
        tracing::info!(
            executable = %self.executable().display(),
            project = %self.project.display(),
            inputs = staged.len(),
            "starting headless ilastik"
        );
        let output = command.output()?;
        for line in String::from_utf8_lossy(&output.stdout).lines() {
            tracing::debug!(stream = "stdout", "{line}");
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines() {
            tracing::debug!(stream = "stderr", "{line}");
        }
        if !output.status.success() {
            return Err(HeadlessError::Failed {
                status: output.status,
                stderr: stderr.trim().to_string(),
            });
        }

        let mut outcome = HeadlessOutcome::default();
        for (row, _) in inputs {
            let result = out_dir.join(format!("{}{OUTPUT_SUFFIX}.{OUTPUT_FORMAT}", file_stem(row)));
            if result.is_file() {
                outcome
                    .outputs
                    .insert(row.clone(), ResultImage::inspect(&result)?);
            } else {
                tracing::warn!(row = %row, "headless run produced no result");
                outcome.missing.push(row.clone());
            }
        }
        Ok(outcome)
    }
}

fn prefixed(flag: &str, path: &Path) -> OsString {
    let mut argument = OsString::from(flag);
    argument.push(path.as_os_str());
    argument
}

pub(super) fn bundle_binary(path: &Path) -> PathBuf {
    if path.extension().is_some_and(|ext| ext == "app") {
        path.join("Contents").join("MacOS").join("ilastik")
    } else {
        path.to_path_buf()
    }
}

/// Row key as a file stem; separators and other awkward characters become `_`.
pub(super) fn file_stem(row: &RowId) -> String {
    row.as_str()
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.') {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

