use depot_core::credentials::{generate_api_key, hash_api_key, is_valid_key_format};

#[test]
fn generated_keys_have_six_segments_and_hex24() {
    for _ in 0..32 {
        let key = generate_api_key();
        let segments: Vec<&str> = key.split('-').collect();
        assert_eq!(segments.len(), 6, "bad segment count in {key}");

        let hex = segments[4];
        assert_eq!(hex.len(), 24);
        assert!(
            hex.bytes().all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b)),
            "segment 5 is not uppercase hex: {hex}"
        );
    }
}

#[test]
fn generated_keys_parse_and_are_unique() {
    let first = generate_api_key();
    let second = generate_api_key();
    assert!(is_valid_key_format(&first));
    assert!(is_valid_key_format(&second));
    assert_ne!(first, second);
}

#[test]
fn legacy_hex_format_is_accepted() {
    let legacy = "a".repeat(64);
    assert!(is_valid_key_format(&legacy));

    // Uppercase or wrong length is not legacy.
    assert!(!is_valid_key_format(&"A".repeat(64)));
    assert!(!is_valid_key_format(&"a".repeat(63)));
}

#[test]
fn parser_rejects_deviations() {
    assert!(!is_valid_key_format(""));
    assert!(!is_valid_key_format("depot-amber-anvil-bold-DEADBEEF-key"));
    assert!(!is_valid_key_format("nope-amber-anvil-bold-0123456789ABCDEF01234567-key"));
    assert!(!is_valid_key_format("depot-notaword-anvil-bold-0123456789ABCDEF01234567-key"));
    assert!(!is_valid_key_format("depot-amber-anvil-bold-0123456789abcdef01234567-key"));

    let valid = generate_api_key();
    let truncated = valid.rsplit_once('-').unwrap().0;
    assert!(!is_valid_key_format(truncated));
}

#[test]
fn both_formats_hash_identically_to_sha256_hex() {
    let key = generate_api_key();
    let hash = hash_api_key(&key);
    assert_eq!(hash.len(), 64);
    assert!(hash.bytes().all(|b| b.is_ascii_hexdigit()));
    assert_eq!(hash, hash_api_key(&key));

    // Known vector: sha256("abc")
    assert_eq!(
        hash_api_key("abc"),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}
