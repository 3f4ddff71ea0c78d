//! Streaming multi-digest file hashing.

use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind, Read};
use std::path::Path;

use digest::Digest;
use md5::Md5;
use sha1::Sha1;

use dirlisthash_core::{DEFAULT_CHUNK_SIZE, Digests, EntryError, HashAlgorithm, to_hex};

/// Running state for one requested algorithm.
enum RunningDigest {
    Sha1(Sha1),
    Md5(Md5),
}

impl RunningDigest {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Sha1 => Self::Sha1(Sha1::new()),
            HashAlgorithm::Md5 => Self::Md5(Md5::new()),
        }
    }

    fn update(&mut self, chunk: &[u8]) {
        match self {
            Self::Sha1(h) => h.update(chunk),
            Self::Md5(h) => h.update(chunk),
        }
    }

    fn finish(self) -> (HashAlgorithm, String) {
        match self {
            Self::Sha1(h) => (HashAlgorithm::Sha1, to_hex(&h.finalize())),
            Self::Md5(h) => (HashAlgorithm::Md5, to_hex(&h.finalize())),
        }
    }
}

/// Computes SHA1 and/or MD5 digests of a file in one sequential pass.
///
/// The file is read in chunks of at most `chunk_size` bytes and every chunk
/// is fed to each requested digest, so memory use is bounded by the chunk
/// size no matter how large the file is.
#[derive(Debug, Clone, Copy)]
pub struct HashEngine {
    chunk_size: usize,
}

impl HashEngine {
    /// Create an engine with the given read chunk size.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// Read chunk size in bytes.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Read buffer length for a file of `file_len` bytes.
    ///
    /// Never larger than the chunk size; small files get just enough room
    /// to read their contents and observe end of file in one pass.
    pub fn buffer_len(&self, file_len: u64) -> usize {
        usize::try_from(file_len.saturating_add(1))
            .unwrap_or(usize::MAX)
            .min(self.chunk_size)
    }

    /// Compute the requested digests for a file.
    ///
    /// An empty algorithm set returns empty digests without touching the file.
    pub fn compute(&self, path: &Path, algorithms: &[HashAlgorithm]) -> Result<Digests, EntryError> {
        if algorithms.is_empty() {
            return Ok(Digests::default());
        }

        let hash_err = |source| EntryError::Hash {
            path: path.to_path_buf(),
            source,
        };

        let (mut file, file_len) = open_regular(path).map_err(hash_err)?;
        let mut buffer = vec![0u8; self.buffer_len(file_len)];

        let mut running: Vec<RunningDigest> =
            algorithms.iter().map(|a| RunningDigest::new(*a)).collect();

        loop {
            let bytes_read = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(hash_err(e)),
            };
            for digest in &mut running {
                digest.update(&buffer[..bytes_read]);
            }
        }

        let mut digests = Digests::default();
        for digest in running {
            let (algorithm, hex) = digest.finish();
            digests.set(algorithm, hex);
        }
        Ok(digests)
    }
}

/// Open `path` for reading, refusing anything that is not a regular file
/// once opened. The entry may have been replaced since it was stat'ed.
fn open_regular(path: &Path) -> io::Result<(File, u64)> {
    let mut options = OpenOptions::new();
    options.read(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.custom_flags(libc::O_NONBLOCK);
    }

    let file = options.open(path)?;
    let metadata = file.metadata()?;
    if !metadata.is_file() {
        return Err(io::Error::other("not a regular file"));
    }
    Ok((file, metadata.len()))
}

impl Default for HashEngine {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}
