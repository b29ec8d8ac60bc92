//! Tests for the substrates
//!
//! These tests verify:
//! - get/set/remove/clear semantics for the memory substrate
//! - File substrate persistence across reopen
//! - Atomic replace leaves no temp file behind
//! - Unreadable files surface as substrate failures

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use prefdb::substrate::{FileSubstrate, MemorySubstrate, Substrate};
use prefdb::PrefDbError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_file() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("prefs.json");
    (temp_dir, path)
}

/// Contract shared by every substrate
fn exercise_contract(substrate: &dyn Substrate) {
    assert_eq!(substrate.get("missing").unwrap(), None);

    substrate.set("a", "1").unwrap();
    substrate.set("b", "2").unwrap();
    assert_eq!(substrate.get("a").unwrap(), Some("1".to_string()));

    substrate.set("a", "updated").unwrap();
    assert_eq!(substrate.get("a").unwrap(), Some("updated".to_string()));

    substrate.remove("a").unwrap();
    assert_eq!(substrate.get("a").unwrap(), None);

    // Removing an absent key is fine
    substrate.remove("a").unwrap();

    substrate.clear().unwrap();
    assert_eq!(substrate.get("b").unwrap(), None);
}

// =============================================================================
// Memory Substrate Tests
// =============================================================================

#[test]
fn test_memory_contract() {
    let substrate = MemorySubstrate::new();

    exercise_contract(&substrate);
    assert!(substrate.is_empty());
}

#[test]
fn test_memory_keys_sorted() {
    let substrate = MemorySubstrate::new();
    substrate.set("b", "2").unwrap();
    substrate.set("a", "1").unwrap();

    assert_eq!(substrate.keys(), vec!["a", "b"]);
    assert_eq!(substrate.len(), 2);
    assert!(substrate.contains_key("a"));
}

#[test]
fn test_arc_substrate_shares_state() {
    let substrate = Arc::new(MemorySubstrate::new());
    let other = Arc::clone(&substrate);

    Substrate::set(&other, "k", "v").unwrap();

    assert_eq!(Substrate::get(&substrate, "k").unwrap(), Some("v".to_string()));
}

// =============================================================================
// File Substrate Tests
// =============================================================================

#[test]
fn test_file_contract() {
    let (_temp, path) = setup_temp_file();
    let substrate = FileSubstrate::open(&path).unwrap();

    exercise_contract(&substrate);
    assert!(substrate.is_empty());
}

#[test]
fn test_file_open_missing_is_empty() {
    let (_temp, path) = setup_temp_file();

    let substrate = FileSubstrate::open(&path).unwrap();

    assert!(substrate.is_empty());
    assert!(!path.exists());
}

#[test]
fn test_file_creates_parent_directories() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("dir").join("prefs.json");

    let substrate = FileSubstrate::open(&path).unwrap();
    substrate.set("k", "v").unwrap();

    assert!(path.exists());
}

#[test]
fn test_file_persists_across_reopen() {
    let (_temp, path) = setup_temp_file();

    {
        let substrate = FileSubstrate::open(&path).unwrap();
        substrate.set("default.test_keys", r#"["a"]"#).unwrap();
        substrate.set("default.test.a", r#"{"x":1}"#).unwrap();
        substrate.set("gone", "soon").unwrap();
        substrate.remove("gone").unwrap();
    }

    let reopened = FileSubstrate::open(&path).unwrap();
    assert_eq!(reopened.len(), 2);
    assert_eq!(
        reopened.get("default.test.a").unwrap(),
        Some(r#"{"x":1}"#.to_string())
    );
    assert_eq!(reopened.get("gone").unwrap(), None);
}

#[test]
fn test_file_clear_persists() {
    let (_temp, path) = setup_temp_file();

    {
        let substrate = FileSubstrate::open(&path).unwrap();
        substrate.set("a", "1").unwrap();
        substrate.clear().unwrap();
    }

    let reopened = FileSubstrate::open(&path).unwrap();
    assert!(reopened.is_empty());
}

#[test]
fn test_file_leaves_no_temp_file() {
    let (temp, path) = setup_temp_file();
    let substrate = FileSubstrate::open(&path).unwrap();

    substrate.set("a", "1").unwrap();

    let entries: Vec<_> = fs::read_dir(temp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(entries, vec![std::ffi::OsString::from("prefs.json")]);
}

#[test]
fn test_file_corrupt_contents() {
    let (_temp, path) = setup_temp_file();
    fs::write(&path, b"{ not json").unwrap();

    let result = FileSubstrate::open(&path);

    assert!(matches!(result, Err(PrefDbError::Substrate(_))));
}

#[test]
fn test_file_empty_contents_is_empty_map() {
    let (_temp, path) = setup_temp_file();
    fs::write(&path, b"").unwrap();

    let substrate = FileSubstrate::open(&path).unwrap();

    assert!(substrate.is_empty());
}
