//! FileForwarder - sentences appended to a log file

use std::path::{Path, PathBuf};

use contracts::{ContractError, Forwarder};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};

pub struct FileForwarder {
    name: String,
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl FileForwarder {
    /// Open `path`, creating missing parent directories.
    ///
    /// With `append` unset an existing file is truncated.
    #[instrument(name = "file_forwarder_open", skip(path), fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>, append: bool) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(&path)
            .await?;
        debug!(append, "log file opened");

        Ok(Self {
            name: format!("file:{}", path.display()),
            path,
            writer: Some(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn writer(&mut self) -> Result<&mut BufWriter<File>, ContractError> {
        match self.writer.as_mut() {
            Some(writer) => Ok(writer),
            None => Err(ContractError::forwarder_write(&self.name, "file closed")),
        }
    }
}

impl Forwarder for FileForwarder {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&mut self, line: &[u8]) -> Result<(), ContractError> {
        let name = self.name.clone();
        self.writer()?
            .write_all(line)
            .await
            .map_err(|e| ContractError::forwarder_write(name, e.to_string()))
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        let name = self.name.clone();
        match self.writer.as_mut() {
            Some(writer) => writer
                .flush()
                .await
                .map_err(|e| ContractError::forwarder_write(name, e.to_string())),
            None => Ok(()),
        }
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        self.flush().await?;
        if self.writer.take().is_some() {
            debug!(forwarder = %self.name, "log file closed");
        }
        Ok(())
    }
}
