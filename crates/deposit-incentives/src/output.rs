// Copyright 2026 Boundless Foundation, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Atomic JSON output.

use std::{
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::errors::IncentivesError;

/// A JSON document fully written to a temporary file beside its destination.
///
/// Nothing is visible at the destination until [StagedJson::commit]. Dropping a staged document
/// removes the temporary file.
#[derive(Debug)]
pub struct StagedJson {
    tmp: NamedTempFile,
    path: PathBuf,
}

impl StagedJson {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Renames the temporary file over the destination.
    pub fn commit(self) -> Result<(), IncentivesError> {
        let Self { tmp, path } = self;
        tmp.persist(&path).map_err(|e| IncentivesError::io(&path, e.error))?;
        tracing::info!("Wrote {}", path.display());
        Ok(())
    }
}

/// Serializes `value` as pretty JSON into a temporary file in `path`'s directory.
pub fn stage_json<T: Serialize>(path: &Path, value: &T) -> Result<StagedJson, IncentivesError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(dir).map_err(|e| IncentivesError::io(dir, e))?;

    let mut writer = BufWriter::new(tmp.as_file());
    serde_json::to_writer_pretty(&mut writer, value).map_err(|e| IncentivesError::json(path, e))?;
    writer.write_all(b"\n").map_err(|e| IncentivesError::io(path, e))?;
    writer.flush().map_err(|e| IncentivesError::io(path, e))?;
    drop(writer);

    Ok(StagedJson { tmp, path: path.to_path_buf() })
}

/// Writes `value` as pretty JSON to `path`.
///
/// `path` either holds the full document afterwards or is left untouched.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), IncentivesError> {
    stage_json(path, value)?.commit()
}

/// Commits documents in order. Stage all of them first: a failure while staging then leaves every
/// destination untouched.
pub fn commit_all(staged: Vec<StagedJson>) -> Result<(), IncentivesError> {
    staged.into_iter().try_for_each(StagedJson::commit)
}
