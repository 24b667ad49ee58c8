//! File transfer client for publishing artifacts.
//!
//! Thin wrapper over a synchronous [`suppaftp::FtpStream`]; the pipeline
//! drives it through `spawn_blocking`, one connect/upload.../disconnect
//! session per publish step. Intermediate remote directories are created
//! recursively on demand.

use suppaftp::{types::FileType, FtpStream};

use super::*;

/// An open FTP session.
pub struct FtpClient {
  /// The underlying control connection
  stream: FtpStream,
}

/// Splits a remote path into its parent directory and final component.
fn split_remote(path: &str) -> (&str, &str) {
  match path.rfind('/') {
    Some(0) => ("/", &path[1..]),
    Some(pos) => (&path[..pos], &path[pos + 1..]),
    None => ("", path),
  }
}

impl FtpClient {
  /// Connects and logs in. The host may carry an explicit port; port 21 is
  /// assumed otherwise. Transfers are binary.
  pub fn connect(config: &FtpConfig) -> Result<Self, DigestError> {
    let addr = if config.host.contains(':') {
      config.host.clone()
    } else {
      format!("{}:21", config.host)
    };
    let mut stream = FtpStream::connect(addr)?;
    stream.login(&config.user, &config.password)?;
    stream.transfer_type(FileType::Binary)?;
    Ok(Self { stream })
  }

  /// Uploads a local file to the given remote path, creating intermediate
  /// remote directories as needed.
  pub fn upload(&mut self, local: &Path, remote: &str) -> Result<(), DigestError> {
    debug!("uploading {} to {remote}", local.display());
    let (dir, _) = split_remote(remote);
    if !dir.is_empty() {
      self.ensure_directory(dir)?;
    }
    let mut file = std::fs::File::open(local)?;
    self.stream.put_file(remote, &mut file)?;
    Ok(())
  }

  /// Recursively creates (and changes into) the given remote directory.
  fn ensure_directory(&mut self, path: &str) -> Result<(), DigestError> {
    if self.stream.cwd(path).is_ok() {
      return Ok(());
    }
    let (parent, dir) = split_remote(path);
    if !parent.is_empty() && parent != "/" {
      self.ensure_directory(parent)?;
    } else if parent == "/" {
      self.stream.cwd("/")?;
    }
    self.stream.mkdir(dir)?;
    self.stream.cwd(dir)?;
    Ok(())
  }

  /// Closes the session. A failed QUIT is logged, not propagated.
  pub fn disconnect(mut self) {
    if let Err(e) = self.stream.quit() {
      warn!("FTP disconnect failed: {e}");
    }
  }
}

/// Uploads a batch of `(local, remote)` pairs in one session.
///
/// Scoped acquisition: the session is always closed, even when uploads
/// fail. A single file's failure is logged and does not stop the rest of
/// the batch; only a failed connect propagates.
pub fn upload_batch(config: &FtpConfig, files: &[(PathBuf, String)]) -> Result<(), DigestError> {
  let mut client = FtpClient::connect(config)?;
  for (local, remote) in files {
    if let Err(e) = client.upload(local, remote) {
      warn!("upload of {} to {remote} failed: {e}", local.display());
    }
  }
  client.disconnect();
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_split_remote() {
    assert_eq!(split_remote("/AI/paper/2024-09-02/digest.md"), (
      "/AI/paper/2024-09-02",
      "digest.md"
    ));
    assert_eq!(split_remote("/digest.md"), ("/", "digest.md"));
    assert_eq!(split_remote("digest.md"), ("", "digest.md"));
  }
}
