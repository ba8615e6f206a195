//! Fixed-size chunked copy of an object body into a writer.

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Default read buffer size for object bodies (64 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Side of the copy that failed.
#[derive(Debug, Error)]
pub enum CopyError {
    /// Reading from the source stream failed.
    #[error("read failed: {0}")]
    Read(#[source] std::io::Error),

    /// Writing to or flushing the destination failed.
    #[error("write failed: {0}")]
    Write(#[source] std::io::Error),
}

/// Copies `reader` into `writer` one chunk at a time until end-of-stream.
///
/// Each read fills at most `chunk_size` bytes and the bytes read are written
/// verbatim before the next read. The writer is flushed before returning.
/// Returns the number of bytes copied.
///
/// # Errors
///
/// Returns [`CopyError::Read`] or [`CopyError::Write`] on the first failure.
pub async fn copy_in_chunks<R, W>(
    reader: &mut R,
    writer: &mut W,
    chunk_size: usize,
) -> Result<u64, CopyError>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut copied: u64 = 0;

    loop {
        let n = reader.read(&mut buf).await.map_err(CopyError::Read)?;
        if n == 0 {
            break;
        }
        writer
            .write_all(&buf[..n])
            .await
            .map_err(CopyError::Write)?;
        copied += n as u64;
    }

    writer.flush().await.map_err(CopyError::Write)?;
    Ok(copied)
}
