//! On-disk layout for sample inputs and result archives.
//!
//! Each sample owns a directory `<DATA_PATH>/<sample_id>/` holding
//! `input.h5`, `input.csv` and, once a job succeeds, one zip per
//! [`ResultTier`].
//!
//! New uploads are written to `<DATA_PATH>/.staging/<uuid>/` first and
//! renamed into place once the sample has an id, so the database rows
//! locked by a submission are never held across a large write.

use std::io;
use std::path::{Path, PathBuf};

use axum::body::Bytes;
use predictcr_core::results::ResultTier;
use predictcr_core::types::DbId;
use uuid::Uuid;

const STAGING_DIR: &str = ".staging";

/// Which uploaded input file to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFile {
    H5,
    Csv,
}

impl InputFile {
    pub fn file_name(self) -> &'static str {
        match self {
            InputFile::H5 => "input.h5",
            InputFile::Csv => "input.csv",
        }
    }
}

/// Input files written to disk but not yet assigned to a sample.
#[derive(Debug)]
pub struct StagedInputs {
    dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct SampleStorage {
    root: PathBuf,
}

impl SampleStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sample_dir(&self, sample_id: DbId) -> PathBuf {
        self.root.join(sample_id.to_string())
    }

    pub fn input_path(&self, sample_id: DbId, input: InputFile) -> PathBuf {
        self.sample_dir(sample_id).join(input.file_name())
    }

    pub fn result_path(&self, sample_id: DbId, tier: ResultTier) -> PathBuf {
        self.sample_dir(sample_id).join(tier.file_name())
    }

    /// Write both input files of a new submission to a staging directory.
    pub async fn stage_inputs(&self, h5: &[u8], csv: &[u8]) -> io::Result<StagedInputs> {
        let dir = self.root.join(STAGING_DIR).join(Uuid::new_v4().to_string());
        tokio::fs::create_dir_all(&dir).await?;
        let staged = StagedInputs { dir };
        let written: io::Result<()> = async {
            tokio::fs::write(staged.dir.join(InputFile::H5.file_name()), h5).await?;
            tokio::fs::write(staged.dir.join(InputFile::Csv.file_name()), csv).await
        }
        .await;
        if let Err(e) = written {
            self.discard_staged(staged).await;
            return Err(e);
        }
        Ok(staged)
    }

    /// Move staged inputs into the directory of `sample_id`.
    pub async fn commit_staged(&self, staged: &StagedInputs, sample_id: DbId) -> io::Result<()> {
        tokio::fs::rename(&staged.dir, self.sample_dir(sample_id)).await
    }

    /// Remove staged inputs that will not become a sample.
    pub async fn discard_staged(&self, staged: StagedInputs) {
        if let Err(e) = tokio::fs::remove_dir_all(&staged.dir).await {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(dir = %staged.dir.display(), error = %e, "Failed to remove staged upload");
            }
        }
    }

    /// Store the result archives of a successful job, replacing earlier ones.
    pub async fn write_results(
        &self,
        sample_id: DbId,
        artifacts: &[(ResultTier, Bytes)],
    ) -> io::Result<()> {
        tokio::fs::create_dir_all(self.sample_dir(sample_id)).await?;
        for (tier, data) in artifacts {
            tokio::fs::write(self.result_path(sample_id, *tier), data).await?;
        }
        Ok(())
    }

    /// Remove any stored result archives. Missing files are not an error.
    pub async fn delete_results(&self, sample_id: DbId) -> io::Result<()> {
        for tier in ResultTier::ALL {
            match tokio::fs::remove_file(self.result_path(sample_id, tier)).await {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Remove a sample's directory entirely, e.g. after a failed submission.
    pub async fn delete_sample(&self, sample_id: DbId) -> io::Result<()> {
        match tokio::fs::remove_dir_all(self.sample_dir(sample_id)).await {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn inputs_and_results_live_in_the_sample_dir() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SampleStorage::new(dir.path());

        let staged = storage.stage_inputs(b"h5", b"a,b\n").await.unwrap();
        storage.commit_staged(&staged, 3).await.unwrap();
        let artifacts: Vec<_> = ResultTier::ALL
            .into_iter()
            .map(|t| (t, Bytes::from_static(b"zip")))
            .collect();
        storage.write_results(3, &artifacts).await.unwrap();

        assert_eq!(
            tokio::fs::read(dir.path().join("3/input.csv")).await.unwrap(),
            b"a,b\n"
        );
        assert!(dir.path().join("3/admin_results.zip").exists());

        storage.delete_results(3).await.unwrap();
        assert!(!storage.result_path(3, ResultTier::User).exists());
        assert!(storage.input_path(3, InputFile::H5).exists());

        // Deleting again is a no-op.
        storage.delete_results(3).await.unwrap();
        storage.delete_sample(3).await.unwrap();
        assert!(!storage.sample_dir(3).exists());
        storage.delete_sample(3).await.unwrap();
    }

    #[tokio::test]
    async fn discarded_uploads_leave_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SampleStorage::new(dir.path());

        let staged = storage.stage_inputs(b"h5", b"csv").await.unwrap();
        assert!(staged.dir.join("input.h5").exists());
        storage.discard_staged(staged).await;

        let staging = dir.path().join(STAGING_DIR);
        assert_eq!(std::fs::read_dir(staging).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn commit_refuses_an_existing_sample_dir() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SampleStorage::new(dir.path());
        std::fs::create_dir_all(storage.sample_dir(5).join("other")).unwrap();

        let staged = storage.stage_inputs(b"h5", b"csv").await.unwrap();
        assert!(storage.commit_staged(&staged, 5).await.is_err());
        assert!(!storage.input_path(5, InputFile::H5).exists());
    }
}
