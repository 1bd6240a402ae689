//! Sitemap output module
//!
//! Serializes the crawl result into sitemaps.org 0.9 files:
//! - `sitemap-{n}.xml` chunks of at most 50,000 URLs, each with a gzip sibling
//! - `sitemap-index.xml` listing the compressed chunks

mod writer;
mod xml;

pub use writer::{
    write_sitemaps, WriterError, INDEX_FILE_NAME, MAX_UNCOMPRESSED_BYTES, MAX_URLS_PER_FILE,
};
pub use xml::{render_index, render_urlset, IndexEntry, SITEMAP_NAMESPACE};
