// src/tests/helpers_tests.rs

//! tests for `readers/helpers.rs` and `debug/helpers.rs`

#![allow(non_snake_case)]

use crate::common::{FPath, FileSz};
use crate::debug::helpers::{
    create_temp_file,
    create_temp_file_bytes,
    ntf_fpath,
};
use crate::readers::helpers::{
    fpath_to_path,
    path_filesz,
    path_to_fpath,
};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn test_path_to_fpath_round_trip() {
    let ntf = create_temp_file("");
    let fpath: FPath = path_to_fpath(ntf.path());
    assert_eq!(fpath_to_path(&fpath), ntf.path());
}

#[test]
fn test_ntf_fpath() {
    let ntf = create_temp_file("abc");
    let fpath: FPath = ntf_fpath(&ntf);
    assert!(!fpath.is_empty());
    assert_eq!(fpath_to_path(&fpath), ntf.path());
}

#[test]
fn test_path_filesz() {
    let ntf = create_temp_file_bytes(&[0; 33]);
    let fpath: FPath = ntf_fpath(&ntf);
    assert_eq!(path_filesz(fpath_to_path(&fpath)), Some(33 as FileSz));
}

#[test]
fn test_path_filesz_missing_file() {
    let path = std::path::Path::new("THIS/PATH_DOES/NOT///EXIST!!!");
    assert_eq!(path_filesz(path), None);
}
