//! Integration tests for the sitemap writer

use flate2::read::GzDecoder;
use sitewave::sitemap::{write_sitemaps, WriterError, MAX_URLS_PER_FILE};
use sitewave::PageRecord;
use std::fs;
use std::io::Read;
use std::path::Path;
use tempfile::TempDir;

fn pages(n: usize) -> Vec<PageRecord> {
    (0..n)
        .map(|i| PageRecord::new(format!("https://example.com/page/{}", i), 200, None))
        .collect()
}

fn read_gz(path: &Path) -> String {
    let mut decoder = GzDecoder::new(fs::File::open(path).unwrap());
    let mut xml = String::new();
    decoder.read_to_string(&mut xml).unwrap();
    xml
}

fn url_count(xml: &str) -> usize {
    xml.matches("<url>").count()
}

#[test]
fn test_chunk_count_and_last_chunk_size() {
    let dir = TempDir::new().unwrap();
    let files = write_sitemaps(&pages(7), dir.path(), 3, None).unwrap();

    // 3 chunks + index
    assert_eq!(files.len(), 4);
    let counts: Vec<usize> = files[..3].iter().map(|f| url_count(&read_gz(f))).collect();
    assert_eq!(counts, vec![3, 3, 1]);

    for n in 1..=3 {
        assert!(dir.path().join(format!("sitemap-{}.xml", n)).exists());
    }
}

#[test]
fn test_evenly_divisible_chunks() {
    let dir = TempDir::new().unwrap();
    let files = write_sitemaps(&pages(6), dir.path(), 3, None).unwrap();

    assert_eq!(files.len(), 3);
    assert_eq!(url_count(&read_gz(&files[1])), 3);
}

#[test]
fn test_gzip_matches_plain_xml() {
    let dir = TempDir::new().unwrap();
    let files = write_sitemaps(&pages(2), dir.path(), 10, None).unwrap();

    let plain = fs::read_to_string(dir.path().join("sitemap-1.xml")).unwrap();
    assert_eq!(read_gz(&files[0]), plain);
    assert!(plain.contains(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#));
}

#[test]
fn test_rerun_overwrites() {
    let dir = TempDir::new().unwrap();
    write_sitemaps(&pages(4), dir.path(), 10, None).unwrap();
    let files = write_sitemaps(&pages(4), dir.path(), 10, None).unwrap();

    assert_eq!(files.len(), 2);
    assert_eq!(url_count(&read_gz(&files[0])), 4);
    let plain = fs::read_to_string(dir.path().join("sitemap-1.xml")).unwrap();
    assert_eq!(url_count(&plain), 4);
}

#[test]
fn test_large_set_uses_hard_ceiling() {
    let dir = TempDir::new().unwrap();
    let files = write_sitemaps(&pages(120_000), dir.path(), 50_000, None).unwrap();

    assert_eq!(files.len(), 4);
    let counts: Vec<usize> = files[..3].iter().map(|f| url_count(&read_gz(f))).collect();
    assert_eq!(counts, vec![50_000, 50_000, 20_000]);
}

#[test]
fn test_max_per_file_clamped() {
    let dir = TempDir::new().unwrap();

    let files = write_sitemaps(&pages(MAX_URLS_PER_FILE + 1), dir.path(), 1_000_000, None).unwrap();
    assert_eq!(files.len(), 3);

    let dir = TempDir::new().unwrap();
    let files = write_sitemaps(&pages(2), dir.path(), 0, None).unwrap();
    assert_eq!(files.len(), 3);
}

#[test]
fn test_index_lists_compressed_chunks() {
    let dir = TempDir::new().unwrap();
    let files = write_sitemaps(&pages(3), dir.path(), 2, None).unwrap();

    let index_path = files.last().unwrap();
    assert!(index_path.ends_with("sitemap-index.xml"));

    let index = fs::read_to_string(index_path).unwrap();
    assert!(index.contains(r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#));
    assert!(index.contains("<loc>sitemap-1.xml.gz</loc>"));
    assert!(index.contains("<loc>sitemap-2.xml.gz</loc>"));
    assert_eq!(index.matches("<lastmod>").count(), 2);
}

#[test]
fn test_index_uses_public_base() {
    let dir = TempDir::new().unwrap();
    let files = write_sitemaps(&pages(1), dir.path(), 10, Some("https://cdn.example.com/maps/")).unwrap();

    let index = fs::read_to_string(files.last().unwrap()).unwrap();
    assert!(index.contains("<loc>https://cdn.example.com/maps/sitemap-1.xml.gz</loc>"));
}

#[test]
fn test_lastmod_written_when_valid() {
    let dir = TempDir::new().unwrap();
    let pages = vec![
        PageRecord::new("https://example.com/", 200, Some("2024-02-29".to_string())),
        PageRecord::new("https://example.com/a", 200, Some("soon".to_string())),
    ];
    let files = write_sitemaps(&pages, dir.path(), 10, None).unwrap();

    let xml = read_gz(&files[0]);
    assert!(xml.contains("<lastmod>2024-02-29</lastmod>"));
    assert_eq!(xml.matches("<lastmod>").count(), 1);
}

#[test]
fn test_invalid_urls_dropped() {
    let dir = TempDir::new().unwrap();
    let pages = vec![
        PageRecord::new("https://example.com/", 200, None),
        PageRecord::new("not a url", 200, None),
        PageRecord::new("ftp://example.com/file", 200, None),
    ];
    let files = write_sitemaps(&pages, dir.path(), 10, None).unwrap();

    let xml = read_gz(&files[0]);
    assert_eq!(url_count(&xml), 1);
    assert!(!xml.contains("not a url"));
}

#[test]
fn test_all_invalid_rejected() {
    let dir = TempDir::new().unwrap();
    let pages = vec![PageRecord::new("nope", 200, None)];

    let result = write_sitemaps(&pages, dir.path(), 10, None);
    assert!(matches!(result, Err(WriterError::NoValidPages(1))));
}

#[test]
fn test_creates_missing_directory() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("a").join("b");

    let files = write_sitemaps(&pages(1), &nested, 10, None).unwrap();
    assert!(files.iter().all(|f| f.starts_with(&nested) && f.exists()));
}

#[test]
fn test_failed_chunk_leaves_no_orphan_xml() {
    let dir = TempDir::new().unwrap();
    // A directory squatting on the second chunk's .gz name makes its rename fail
    fs::create_dir(dir.path().join("sitemap-2.xml.gz")).unwrap();

    let result = write_sitemaps(&pages(3), dir.path(), 2, None);
    match result {
        Err(WriterError::Chunk { index, path, .. }) => {
            assert_eq!(index, 2);
            assert!(path.ends_with("sitemap-2.xml.gz"));
        }
        other => panic!("expected a chunk error, got {:?}", other),
    }

    assert!(!dir.path().join("sitemap-2.xml").exists());
    assert!(!dir.path().join("sitemap-index.xml").exists());

    let mut names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["sitemap-1.xml", "sitemap-1.xml.gz", "sitemap-2.xml.gz"]);
}
