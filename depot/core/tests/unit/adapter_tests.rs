use crate::support::{gem, go_module_zip, gzip, helm_chart, npm_tarball, nupkg, tar_archive};
use chrono::Utc;
use depot_core::adapters::{
    AdapterRegistry, ArtifactMetadata, CargoAdapter, FormatAdapter, GoAdapter, HelmAdapter,
    MavenAdapter, NpmAdapter, NuGetAdapter, OciAdapter, OpaAdapter, RubyGemsAdapter,
};
use depot_core::db::models::Artifact;

fn artifact(registry: &str, name: &str, version: &str) -> Artifact {
    let now = Utc::now();
    Artifact {
        id: "test".to_string(),
        name: name.to_string(),
        version: version.to_string(),
        registry: registry.to_string(),
        content_type: String::new(),
        size: 0,
        sha256: String::new(),
        storage_path: String::new(),
        metadata: ArtifactMetadata::None,
        downloads: 0,
        published_by: "u".to_string(),
        is_public: false,
        created_at: now,
        updated_at: now,
        publisher: None,
    }
}

// ---------------------------------------------------------------------------
// Registry resolution
// ---------------------------------------------------------------------------

#[test]
fn registry_resolves_all_nine_formats() {
    let registry = AdapterRegistry::with_defaults();
    for tag in [
        "npm", "nuget", "maven", "go", "helm", "oci", "cargo", "rubygems", "opa",
    ] {
        assert!(registry.get(tag).is_ok(), "missing adapter for {tag}");
    }
    assert!(registry.get("apt").is_err());
}

// ---------------------------------------------------------------------------
// npm
// ---------------------------------------------------------------------------

#[test]
fn npm_accepts_name_at_length_limit_and_rejects_longer() {
    let max = "a".repeat(214);
    let over = "a".repeat(215);
    assert!(depot_core::adapters::npm::is_valid_package_name(&max));
    assert!(!depot_core::adapters::npm::is_valid_package_name(&over));
}

#[test]
fn npm_scoped_names_and_case() {
    use depot_core::adapters::npm::is_valid_package_name;
    assert!(is_valid_package_name("left-pad"));
    assert!(is_valid_package_name("@scope/pkg"));
    assert!(!is_valid_package_name("UpperCase"));
    assert!(!is_valid_package_name(""));
}

#[test]
fn npm_validate_cross_checks_embedded_manifest() {
    let adapter = NpmAdapter;
    let content = npm_tarball("left-pad", "1.0.0");

    let ok = artifact("npm", "left-pad", "1.0.0");
    assert!(adapter.validate(&ok, &content).is_ok());

    let wrong_version = artifact("npm", "left-pad", "2.0.0");
    assert!(adapter.validate(&wrong_version, &content).is_err());

    let wrong_name = artifact("npm", "right-pad", "1.0.0");
    assert!(adapter.validate(&wrong_name, &content).is_err());
}

#[test]
fn npm_synthesizes_latest_dist_tag_for_release_versions() {
    let adapter = NpmAdapter;
    let meta = adapter.extract_metadata(&npm_tarball("left-pad", "1.0.0")).unwrap();
    let ArtifactMetadata::Npm(meta) = meta else {
        panic!("expected npm metadata");
    };
    assert_eq!(meta.dist_tags.get("latest"), Some(&"1.0.0".to_string()));
    assert!(meta.time.contains_key("created"));
    assert!(meta.time.contains_key("modified"));
    assert!(meta.time.contains_key("1.0.0"));
}

#[test]
fn npm_prerelease_does_not_become_latest() {
    let adapter = NpmAdapter;
    let meta = adapter
        .extract_metadata(&npm_tarball("left-pad", "1.0.0-beta.1"))
        .unwrap();
    let ArtifactMetadata::Npm(meta) = meta else {
        panic!("expected npm metadata");
    };
    assert!(meta.dist_tags.is_empty());
}

#[test]
fn npm_storage_path_encodes_scope_slash() {
    let adapter = NpmAdapter;
    assert_eq!(adapter.storage_path("left-pad", "1.0.0"), "npm/left-pad/1.0.0.tgz");
    assert_eq!(
        adapter.storage_path("@scope/pkg", "2.1.0"),
        "npm/@scope%2fpkg/2.1.0.tgz"
    );
}

// ---------------------------------------------------------------------------
// NuGet
// ---------------------------------------------------------------------------

#[test]
fn nuget_rejects_names_with_leading_punctuation() {
    use depot_core::adapters::nuget::is_valid_package_id;
    assert!(is_valid_package_id("Newtonsoft.Json"));
    assert!(!is_valid_package_id(".hidden"));
    assert!(!is_valid_package_id("-dash"));
    assert!(!is_valid_package_id("_under"));
}

#[test]
fn nuget_nuspec_extraction_and_case_insensitive_id() {
    let adapter = NuGetAdapter;
    let content = nupkg("Newtonsoft.Json", "13.0.1", &[]);

    // Identity check against the lowercased (sanitized) name passes.
    let ok = artifact("nuget", "newtonsoft.json", "13.0.1");
    assert!(adapter.validate(&ok, &content).is_ok());

    let meta = adapter.extract_metadata(&content).unwrap();
    let ArtifactMetadata::Nuget(meta) = meta else {
        panic!("expected nuget metadata");
    };
    assert_eq!(meta.id, "Newtonsoft.Json");
    assert_eq!(meta.tags, vec!["tools", "test"]);
    let deps = meta.dependencies.expect("grouped dependencies");
    assert_eq!(deps["groups"][0]["targetFramework"], "net8.0");
}

#[test]
fn nuget_symbol_package_requires_debug_entries() {
    let adapter = NuGetAdapter;
    // Flagged as a symbol push via content type but carrying no .pdb/.mdb.
    let content = nupkg("lib", "1.0.0", &[("lib.dll", b"MZ")]);
    let mut symbol = artifact("nuget", "lib", "1.0.0");
    symbol.content_type = depot_core::adapters::nuget::SYMBOL_CONTENT_TYPE.to_string();
    let err = adapter.validate(&symbol, &content).unwrap_err();
    assert!(err.to_string().contains("symbol package"));

    let with_pdb = nupkg("lib", "1.0.0", &[("lib.pdb", b"pdb-bytes")]);
    assert!(adapter.validate(&symbol, &with_pdb).is_ok());
}

#[test]
fn nuget_storage_paths_are_lowercased() {
    let adapter = NuGetAdapter;
    assert_eq!(
        adapter.storage_path("Newtonsoft.Json", "13.0.1"),
        "nuget/newtonsoft.json/13.0.1/newtonsoft.json.13.0.1.nupkg"
    );
    assert_eq!(
        depot_core::adapters::nuget::symbol_storage_path("Lib", "1.0.0"),
        "nuget/symbols/lib/1.0.0/lib.1.0.0.snupkg"
    );
}

// ---------------------------------------------------------------------------
// Maven
// ---------------------------------------------------------------------------

#[test]
fn maven_requires_exactly_two_coordinate_parts() {
    let adapter = MavenAdapter;
    let jar = b"PK\x03\x04fake".to_vec();

    assert!(adapter
        .validate(&artifact("maven", "com.example:lib", "1.0.0"), &jar)
        .is_ok());
    assert!(adapter
        .validate(&artifact("maven", "noseparator", "1.0.0"), &jar)
        .is_err());
    assert!(adapter
        .validate(&artifact("maven", "a:b:c", "1.0.0"), &jar)
        .is_err());
}

#[test]
fn maven_version_grammar_allows_single_character() {
    use depot_core::adapters::maven::is_valid_version;
    assert!(is_valid_version("1"));
    assert!(is_valid_version("1.0.0-SNAPSHOT"));
    assert!(!is_valid_version(""));
    assert!(!is_valid_version(".1"));
    assert!(!is_valid_version("1."));
}

#[test]
fn maven_storage_path_expands_group_dots() {
    let adapter = MavenAdapter;
    assert_eq!(
        adapter.storage_path("com.example:lib", "1.0.0"),
        "maven/com/example/lib/1.0.0/lib-1.0.0.jar"
    );
}

// ---------------------------------------------------------------------------
// Go
// ---------------------------------------------------------------------------

#[test]
fn go_module_first_segment_needs_a_dot() {
    use depot_core::adapters::gomod::is_valid_module_path;
    assert!(is_valid_module_path("github.com/user/repo"));
    assert!(is_valid_module_path("example.org/mod"));
    assert!(!is_valid_module_path("github/user/repo"));
    assert!(!is_valid_module_path("UPPER.com/mod"));
}

#[test]
fn go_module_zip_roundtrip() {
    let adapter = GoAdapter;
    let content = go_module_zip("example.com/mod", "v1.2.3");
    let art = artifact("go", "example.com/mod", "v1.2.3");
    assert!(adapter.validate(&art, &content).is_ok());

    let ArtifactMetadata::Go(meta) = adapter.extract_metadata(&content).unwrap() else {
        panic!("expected go metadata");
    };
    assert_eq!(meta.module_path.as_deref(), Some("example.com/mod"));

    let bad_version = artifact("go", "example.com/mod", "1.2.3");
    assert!(adapter.validate(&bad_version, &content).is_err());
}

// ---------------------------------------------------------------------------
// Helm
// ---------------------------------------------------------------------------

#[test]
fn helm_chart_yaml_is_authoritative() {
    let adapter = HelmAdapter;
    let content = helm_chart("mychart", "0.1.0");
    assert!(adapter
        .validate(&artifact("helm", "mychart", "0.1.0"), &content)
        .is_ok());
    assert!(adapter
        .validate(&artifact("helm", "mychart", "0.2.0"), &content)
        .is_err());

    let ArtifactMetadata::Helm(meta) = adapter.extract_metadata(&content).unwrap() else {
        panic!("expected helm metadata");
    };
    assert_eq!(meta.api_version.as_deref(), Some("v2"));
    assert_eq!(meta.keywords, vec!["test"]);
}

#[test]
fn helm_name_grammar_is_dns_label() {
    use depot_core::adapters::helm::is_valid_chart_name;
    assert!(is_valid_chart_name("nginx-ingress"));
    assert!(!is_valid_chart_name("-leading"));
    assert!(!is_valid_chart_name("trailing-"));
    assert!(!is_valid_chart_name(&"a".repeat(64)));
}

// ---------------------------------------------------------------------------
// OCI
// ---------------------------------------------------------------------------

#[test]
fn oci_reference_grammar() {
    use depot_core::adapters::oci::{is_digest, is_valid_reference, is_valid_repository};
    assert!(is_valid_repository("lib/app"));
    assert!(is_valid_repository("my-org/my_app"));
    assert!(!is_valid_repository("Lib/App"));
    assert!(is_valid_reference("v1.0"));
    assert!(is_valid_reference(&format!("sha256:{}", "a".repeat(64))));
    assert!(!is_digest("sha256:short"));
}

#[test]
fn oci_manifest_requires_schema_version_two() {
    let adapter = OciAdapter;
    let v2 = serde_json::json!({"schemaVersion": 2, "layers": [{}, {}]}).to_string();
    let v1 = serde_json::json!({"schemaVersion": 1}).to_string();

    let art = artifact("oci", "lib/app", "latest");
    assert!(adapter.validate(&art, v2.as_bytes()).is_ok());
    assert!(adapter.validate(&art, v1.as_bytes()).is_err());

    let ArtifactMetadata::Oci(meta) = adapter.extract_metadata(v2.as_bytes()).unwrap() else {
        panic!("expected oci metadata");
    };
    assert_eq!(meta.layer_count, 2);
    assert_eq!(
        meta.digest.as_deref(),
        Some(depot_core::adapters::oci::compute_digest(v2.as_bytes()).as_str())
    );
}

#[test]
fn oci_storage_path_splits_on_reference_kind() {
    let adapter = OciAdapter;
    assert_eq!(
        adapter.storage_path("lib/app", "latest"),
        "oci/lib/app/manifests/latest"
    );
    let digest = format!("sha256:{}", "b".repeat(64));
    assert_eq!(
        adapter.storage_path("lib/app", &digest),
        format!("oci/lib/app/blobs/sha256/{}", "b".repeat(64))
    );
}

// ---------------------------------------------------------------------------
// Cargo / RubyGems / OPA
// ---------------------------------------------------------------------------

#[test]
fn cargo_name_and_content_checks() {
    let adapter = CargoAdapter;
    let crate_bytes = gzip(&tar_archive(&[("pkg-1.0.0/Cargo.toml", b"[package]")]));

    assert!(adapter
        .validate(&artifact("cargo", "serde", "1.0.0"), &crate_bytes)
        .is_ok());
    assert!(adapter
        .validate(&artifact("cargo", "1starts-with-digit", "1.0.0"), &crate_bytes)
        .is_err());
    assert!(adapter
        .validate(&artifact("cargo", "serde", "1.0.0"), b"plainbytes")
        .is_err());
}

#[test]
fn rubygems_extracts_nested_gem_version() {
    let content = gem("rails", "7.1.0");
    let (name, version) = depot_core::adapters::rubygems::gem_identity(&content).unwrap();
    assert_eq!(name, "rails");
    assert_eq!(version, "7.1.0");

    let adapter = RubyGemsAdapter;
    let ArtifactMetadata::Rubygems(meta) = adapter.extract_metadata(&content).unwrap() else {
        panic!("expected gem metadata");
    };
    assert_eq!(meta.summary.as_deref(), Some("test gem"));
    assert_eq!(meta.authors, vec!["depot tests"]);
}

#[test]
fn opa_bundle_manifest_is_optional() {
    let adapter = OpaAdapter;
    let plain = gzip(&tar_archive(&[("policy.rego", b"package x")]));
    assert!(adapter
        .validate(&artifact("opa", "authz", "v1"), &plain)
        .is_ok());

    let manifest = serde_json::json!({"revision": "abc", "roots": ["authz"]}).to_string();
    let with_manifest = gzip(&tar_archive(&[(".manifest", manifest.as_bytes())]));
    let ArtifactMetadata::Opa(meta) = adapter.extract_metadata(&with_manifest).unwrap() else {
        panic!("expected opa metadata");
    };
    assert_eq!(meta.revision.as_deref(), Some("abc"));
    assert_eq!(meta.roots, vec!["authz"]);
}

// ---------------------------------------------------------------------------
// Path purity
// ---------------------------------------------------------------------------

#[test]
fn storage_paths_are_pure_functions() {
    let registry = AdapterRegistry::with_defaults();
    for tag in registry.tags() {
        let adapter = registry.get(tag).unwrap();
        let name = if tag == "maven" { "com.example:lib" } else { "pkg" };
        let first = adapter.storage_path(name, "1.0.0");
        let second = adapter.storage_path(name, "1.0.0");
        assert_eq!(first, second, "storage path for {tag} is not deterministic");
    }
}
