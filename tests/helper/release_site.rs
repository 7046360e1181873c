//! Fake release CDN built on mockito
//!
//! Mocks are returned unregistered so both sync and async tests can finish
//! them with `create()` or `create_async()`.

use std::io::{Cursor, Write};

use mockito::{Mock, ServerGuard};
use sha2::{Digest, Sha256};
use zip::write::SimpleFileOptions;

pub const PRODUCT: &str = "terraform";

/// Captured index page listing 1.6.0 and its pre-releases, 1.5.7, 1.5.6, 0.12.31, 0.11.15
pub const INDEX_FIXTURE: &str = include_str!("../fixtures/terraform_index.html");

/// Minimal index page listing `versions`
pub fn index_page(versions: &[&str]) -> String {
    let items: String = versions
        .iter()
        .map(|v| format!("<li><a href=\"/{PRODUCT}/{v}/\">{PRODUCT}_{v}</a></li>\n"))
        .collect();
    format!("<html><body><ul>\n{items}</ul></body></html>\n")
}

pub fn index_mock(server: &mut ServerGuard, body: &str) -> Mock {
    server
        .mock("GET", format!("/{PRODUCT}/").as_str())
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(body)
}

/// Release archive holding a shell script named after the product
pub fn release_archive(script: &str) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file(PRODUCT, SimpleFileOptions::default().unix_permissions(0o755))
        .unwrap();
    writer.write_all(script.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

pub fn archive_name(version: &str, platform: &str) -> String {
    format!("{PRODUCT}_{version}_{platform}.zip")
}

/// Archive and SHA256SUMS mocks for one release on one platform
pub struct ReleaseMocks {
    pub archive: Mock,
    pub sums: Mock,
}

pub fn release_mocks(
    server: &mut ServerGuard,
    version: &str,
    platform: &str,
    script: &str,
) -> ReleaseMocks {
    let bytes = release_archive(script);
    let name = archive_name(version, platform);
    let sums = format!(
        "{}  {}\n{}  {}\n",
        hex::encode(Sha256::digest(&bytes)),
        name,
        "f".repeat(64),
        archive_name(version, "solaris_amd64"),
    );

    let archive = server
        .mock("GET", format!("/{PRODUCT}/{version}/{name}").as_str())
        .with_status(200)
        .with_body(bytes);
    let sums = server
        .mock(
            "GET",
            format!("/{PRODUCT}/{version}/{PRODUCT}_{version}_SHA256SUMS").as_str(),
        )
        .with_status(200)
        .with_body(sums);

    ReleaseMocks { archive, sums }
}
