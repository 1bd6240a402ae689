//! Chunked sitemap writer
//!
//! Every file is written to a temporary file in the output directory and then renamed
//! into place, so a reader never observes a half-written chunk.

use crate::sitemap::xml::{render_index, render_urlset, IndexEntry};
use crate::state::PageRecord;
use crate::url::is_fetchable;
use chrono::{DateTime, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Hard ceiling of `<url>` entries per sitemap file
pub const MAX_URLS_PER_FILE: usize = 50_000;

/// Uncompressed size sitemaps.org allows per file; logged, not enforced
pub const MAX_UNCOMPRESSED_BYTES: usize = 50 * 1024 * 1024;

pub const INDEX_FILE_NAME: &str = "sitemap-index.xml";

/// Sitemap writing errors
///
/// Every I/O variant names the file or chunk that failed.
#[derive(Debug, Error)]
pub enum WriterError {
    #[error("No pages to write")]
    EmptyPages,

    #[error("Output directory must not be empty")]
    EmptyOutputDir,

    #[error("None of the {0} pages has a valid URL")]
    NoValidPages(usize),

    #[error("Cannot create output directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("Output directory {path} is not writable: {source}")]
    NotWritable { path: PathBuf, source: io::Error },

    #[error("Failed to write sitemap chunk {index} ({path}): {source}")]
    Chunk {
        index: usize,
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to write sitemap index {path}: {source}")]
    Index { path: PathBuf, source: io::Error },

    #[error("Failed to remove stale sitemap file {path}: {source}")]
    Cleanup { path: PathBuf, source: io::Error },
}

/// Writes pages as chunked sitemaps plus a sitemap index
///
/// # Output
///
/// - `sitemap-{n}.xml` and `sitemap-{n}.xml.gz` per chunk, `n` starting at 1
/// - `sitemap-index.xml` listing the `.gz` chunks
///
/// `max_per_file` is clamped to `1..=MAX_URLS_PER_FILE`. Pages whose URL is not a
/// valid HTTP(S) URL are dropped. Chunk files left by an earlier run with more
/// chunks are removed.
///
/// # Returns
///
/// The `.gz` chunk paths in order, followed by the index path.
///
/// # Example
///
/// ```no_run
/// use sitewave::sitemap::write_sitemaps;
/// use sitewave::PageRecord;
/// use std::path::Path;
///
/// let pages = vec![PageRecord::new("https://example.com/", 200, None)];
/// let files = write_sitemaps(&pages, Path::new("./public"), 50_000, Some("https://example.com")).unwrap();
/// assert_eq!(files.len(), 2);
/// ```
pub fn write_sitemaps(
    pages: &[PageRecord],
    output_dir: &Path,
    max_per_file: usize,
    public_base: Option<&str>,
) -> Result<Vec<PathBuf>, WriterError> {
    if pages.is_empty() {
        return Err(WriterError::EmptyPages);
    }
    if output_dir.as_os_str().is_empty() {
        return Err(WriterError::EmptyOutputDir);
    }

    prepare_output_dir(output_dir)?;

    let max_per_file = max_per_file.clamp(1, MAX_URLS_PER_FILE);

    let valid: Vec<&PageRecord> = pages.iter().filter(|page| is_fetchable(&page.url)).collect();
    if valid.is_empty() {
        return Err(WriterError::NoValidPages(pages.len()));
    }
    if valid.len() < pages.len() {
        debug!(dropped = pages.len() - valid.len(), "Dropped pages with invalid URLs");
    }

    let mut files = Vec::new();
    let mut index_entries = Vec::new();

    for (i, chunk) in valid.chunks(max_per_file).enumerate() {
        let index = i + 1;
        let gz_path = write_chunk(output_dir, index, chunk)?;

        let file_name = chunk_file_name(index, true);
        let loc = match public_base {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), file_name),
            None => file_name,
        };

        index_entries.push(IndexEntry {
            loc,
            lastmod: modified_date(&gz_path),
        });
        files.push(gz_path);
    }

    remove_stale_chunks(output_dir, files.len() + 1)?;

    let index_path = output_dir.join(INDEX_FILE_NAME);
    write_atomic(output_dir, &index_path, render_index(&index_entries).as_bytes()).map_err(
        |source| WriterError::Index {
            path: index_path.clone(),
            source,
        },
    )?;

    info!(
        chunks = index_entries.len(),
        urls = valid.len(),
        dir = %output_dir.display(),
        "Sitemaps written"
    );

    files.push(index_path);
    Ok(files)
}

fn prepare_output_dir(output_dir: &Path) -> Result<(), WriterError> {
    fs::create_dir_all(output_dir).map_err(|source| WriterError::CreateDir {
        path: output_dir.to_path_buf(),
        source,
    })?;

    // Creating (and dropping) a temp file proves the directory accepts writes
    tempfile::tempfile_in(output_dir).map_err(|source| WriterError::NotWritable {
        path: output_dir.to_path_buf(),
        source,
    })?;

    Ok(())
}

/// Writes one chunk's `.xml` and `.xml.gz`, returning the `.gz` path
fn write_chunk(
    output_dir: &Path,
    index: usize,
    pages: &[&PageRecord],
) -> Result<PathBuf, WriterError> {
    let xml_path = output_dir.join(chunk_file_name(index, false));
    let gz_path = output_dir.join(chunk_file_name(index, true));

    let chunk_error = |path: &Path, source: io::Error| WriterError::Chunk {
        index,
        path: path.to_path_buf(),
        source,
    };

    let xml = render_urlset(pages);
    if xml.len() > MAX_UNCOMPRESSED_BYTES {
        warn!(
            chunk = index,
            bytes = xml.len(),
            "Sitemap chunk exceeds the 50MB uncompressed limit"
        );
    }

    // Both temp files are complete before either is renamed into place
    let xml_temp = temp_with_contents(output_dir, xml.as_bytes()).map_err(|e| chunk_error(&xml_path, e))?;
    let gz_temp = temp_gzip(output_dir, xml.as_bytes()).map_err(|e| chunk_error(&gz_path, e))?;

    xml_temp
        .persist(&xml_path)
        .map_err(|e| chunk_error(&xml_path, e.error))?;

    if let Err(e) = gz_temp.persist(&gz_path) {
        let _ = fs::remove_file(&xml_path);
        return Err(chunk_error(&gz_path, e.error));
    }

    debug!(chunk = index, urls = pages.len(), path = %gz_path.display(), "Wrote sitemap chunk");
    Ok(gz_path)
}

fn temp_with_contents(dir: &Path, contents: &[u8]) -> io::Result<NamedTempFile> {
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(contents)?;
    temp.flush()?;
    Ok(temp)
}

fn temp_gzip(dir: &Path, contents: &[u8]) -> io::Result<NamedTempFile> {
    let temp = NamedTempFile::new_in(dir)?;
    let mut encoder = GzEncoder::new(temp, Compression::best());
    encoder.write_all(contents)?;
    encoder.finish()
}

fn write_atomic(dir: &Path, path: &Path, contents: &[u8]) -> io::Result<()> {
    temp_with_contents(dir, contents)?
        .persist(path)
        .map(|_| ())
        .map_err(|e| e.error)
}

/// Removes `sitemap-{n}.xml[.gz]` for `n >= first`, stopping at the first gap
fn remove_stale_chunks(output_dir: &Path, first: usize) -> Result<(), WriterError> {
    let mut index = first;

    loop {
        let mut removed = false;

        for gz in [false, true] {
            let path = output_dir.join(chunk_file_name(index, gz));
            match fs::remove_file(&path) {
                Ok(()) => removed = true,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(source) => return Err(WriterError::Cleanup { path, source }),
            }
        }

        if !removed {
            return Ok(());
        }

        debug!(chunk = index, "Removed stale sitemap chunk");
        index += 1;
    }
}

fn chunk_file_name(index: usize, gz: bool) -> String {
    if gz {
        format!("sitemap-{}.xml.gz", index)
    } else {
        format!("sitemap-{}.xml", index)
    }
}

/// File modification date as `YYYY-MM-DD`, today when unavailable
fn modified_date(path: &Path) -> String {
    let modified: DateTime<Utc> = fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now());

    modified.format("%Y-%m-%d").to_string()
}
