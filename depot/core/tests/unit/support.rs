//! Shared fixtures for the unit suite.

#![allow(dead_code)]

use depot_core::adapters::AdapterRegistry;
use depot_core::blob::{BlobStore, LocalBlobStore};
use depot_core::credentials::passwords::hash_password;
use depot_core::db::Database;
use depot_core::db::models::User;
use depot_core::db::users::NewUser;
use depot_core::engine::{RegistryEngine, UploadRequest};
use depot_core::settings::SettingsService;
use std::io::Write;
use std::sync::Arc;
use tempfile::TempDir;

pub struct TestRegistry {
    pub engine: RegistryEngine,
    pub db: Database,
    pub blob_root: TempDir,
}

pub async fn test_registry() -> TestRegistry {
    let blob_root = TempDir::new().unwrap();
    let db = test_db().await;
    SettingsService::new(db.clone())
        .bootstrap_defaults()
        .await
        .unwrap();
    let blobs: Arc<dyn BlobStore> = Arc::new(LocalBlobStore::new(blob_root.path()));
    let engine = RegistryEngine::new(db.clone(), blobs, AdapterRegistry::with_defaults());
    TestRegistry {
        engine,
        db,
        blob_root,
    }
}

pub async fn test_db() -> Database {
    let db = Database::in_memory().await.unwrap();
    db.init_schema().await.unwrap();
    db
}

pub async fn create_user(db: &Database, username: &str, is_admin: bool) -> User {
    db.create_user(NewUser {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password_hash: hash_password("password123", 4).unwrap(),
        is_admin,
    })
    .await
    .unwrap()
}

pub fn upload(registry: &str, name: &str, version: &str, content: Vec<u8>) -> UploadRequest {
    UploadRequest {
        registry: registry.to_string(),
        name: name.to_string(),
        version: version.to_string(),
        content,
        content_type: None,
        metadata: None,
    }
}

pub async fn read_all(mut file: tokio::fs::File) -> Vec<u8> {
    use tokio::io::AsyncReadExt;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).await.unwrap();
    buf
}

// ---------------------------------------------------------------------------
// Archive builders
// ---------------------------------------------------------------------------

pub fn tar_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (path, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, path, *data).unwrap();
    }
    builder.into_inner().unwrap()
}

pub fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

/// Gzipped npm tarball holding a single `package/package.json`.
pub fn npm_tarball(name: &str, version: &str) -> Vec<u8> {
    let manifest = serde_json::json!({
        "name": name,
        "version": version,
        "description": "test package",
        "keywords": ["test", "fixture"],
    })
    .to_string();
    gzip(&tar_archive(&[(
        "package/package.json",
        manifest.as_bytes(),
    )]))
}

/// Minimal `.nupkg`: a zip with a nuspec plus any extra entries.
pub fn nupkg(id: &str, version: &str, extra_entries: &[(&str, &[u8])]) -> Vec<u8> {
    let nuspec = format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<package xmlns="http://schemas.microsoft.com/packaging/2013/05/nuspec.xsd">
  <metadata>
    <id>{id}</id>
    <version>{version}</version>
    <authors>depot tests</authors>
    <description>test package</description>
    <tags>tools test</tags>
    <dependencies>
      <group targetFramework="net8.0">
        <dependency id="Newtonsoft.Json" version="13.0.1" />
      </group>
    </dependencies>
  </metadata>
</package>
"#
    );

    let cursor = std::io::Cursor::new(Vec::new());
    let mut writer = zip::ZipWriter::new(cursor);
    let options = zip::write::SimpleFileOptions::default();
    writer
        .start_file(format!("{id}.nuspec"), options)
        .unwrap();
    writer.write_all(nuspec.as_bytes()).unwrap();
    for (path, data) in extra_entries {
        writer.start_file(path.to_string(), options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Gzipped chart archive holding `<name>/Chart.yaml`.
pub fn helm_chart(name: &str, version: &str) -> Vec<u8> {
    let chart_yaml = format!(
        "apiVersion: v2\nname: {name}\nversion: {version}\ndescription: test chart\nkeywords:\n  - test\n"
    );
    gzip(&tar_archive(&[(
        &format!("{name}/Chart.yaml"),
        chart_yaml.as_bytes(),
    )]))
}

/// Plain-tar gem with a gzipped gemspec under `metadata.gz`.
pub fn gem(name: &str, version: &str) -> Vec<u8> {
    let gemspec = format!(
        "--- !ruby/object:Gem::Specification\nname: {name}\nversion: !ruby/object:Gem::Version\n  version: {version}\nsummary: test gem\nauthors:\n- depot tests\n"
    );
    let metadata_gz = gzip(gemspec.as_bytes());
    tar_archive(&[("metadata.gz", &metadata_gz)])
}

/// Module zip with a go.mod member.
pub fn go_module_zip(module: &str, version: &str) -> Vec<u8> {
    let cursor = std::io::Cursor::new(Vec::new());
    let mut writer = zip::ZipWriter::new(cursor);
    let options = zip::write::SimpleFileOptions::default();
    writer
        .start_file(format!("{module}@{version}/go.mod"), options)
        .unwrap();
    writer
        .write_all(format!("module {module}\n\ngo 1.22\n").as_bytes())
        .unwrap();
    writer.finish().unwrap().into_inner()
}
