//! Property tests for the virtual filesystem.
//!
//! Enumeration must follow insertion order exactly once per handle, failed
//! removals must leave the tree untouched, seeded file contents must read
//! back byte-exact through either read path, path normalization must be
//! idempotent, and descriptors must never be reused within a scope.

use std::collections::BTreeSet;

use proptest::prelude::*;

use guestbox_rs::vos::errno::Errno;
use guestbox_rs::vos::fs::{normalize, VirtualFs};

fn leaf_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z]{1,8}", 1..12).prop_map(|names| {
        let mut seen = BTreeSet::new();
        names
            .into_iter()
            .filter(|name| seen.insert(name.clone()))
            .collect()
    })
}

// Arbitrary file contents, newline-dense enough to form several lines.
// Covers NUL, 0xFF, invalid UTF-8, and unterminated final lines.
fn blob_bytes() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop_oneof![4 => any::<u8>(), 1 => Just(b'\n')], 0..256)
}

fn list(fs: &mut VirtualFs, path: &str) -> Vec<String> {
    let fd = fs.open_dir(path).expect("open dir");
    let mut entries = Vec::new();
    while let Some(name) = fs.read_dir(fd).expect("read dir") {
        entries.push(name);
    }
    fs.close_dir(fd).expect("close dir");
    entries
}

proptest! {
    #[test]
    fn enumeration_follows_insertion_order(names in leaf_names()) {
        let mut fs = VirtualFs::new();
        fs.add_dir("/d").unwrap();
        for name in &names {
            fs.add_file(&format!("/d/{name}"), Vec::new()).unwrap();
        }
        prop_assert_eq!(list(&mut fs, "/d"), names);
    }

    #[test]
    fn each_handle_enumerates_exactly_once(names in leaf_names()) {
        let mut fs = VirtualFs::new();
        fs.add_dir("/d").unwrap();
        for name in &names {
            fs.add_file(&format!("/d/{name}"), Vec::new()).unwrap();
        }
        let fd = fs.open_dir("/d").unwrap();
        let mut count = 0usize;
        while fs.read_dir(fd).unwrap().is_some() {
            count += 1;
        }
        prop_assert_eq!(count, names.len());
        // Drained handles keep reporting the end, not a fresh pass.
        prop_assert_eq!(fs.read_dir(fd).unwrap(), None);
        prop_assert_eq!(fs.read_dir(fd).unwrap(), None);
    }

    #[test]
    fn failed_removal_changes_nothing(names in leaf_names()) {
        let mut fs = VirtualFs::new();
        fs.add_dir("/d").unwrap();
        for name in &names {
            fs.add_file(&format!("/d/{name}"), Vec::new()).unwrap();
        }
        let before = list(&mut fs, "/d");
        prop_assert_eq!(fs.remove_dir("/d"), Err(Errno::Notempty));
        prop_assert!(fs.is_dir("/d"));
        prop_assert_eq!(list(&mut fs, "/d"), before);
    }

    #[test]
    fn create_then_remove_restores_the_parent_listing(names in leaf_names()) {
        let mut fs = VirtualFs::new();
        fs.add_dir("/d").unwrap();
        let before = list(&mut fs, "/d");
        for name in &names {
            fs.create_dir(&format!("/d/{name}"), 0o755).unwrap();
        }
        for name in &names {
            fs.remove_dir(&format!("/d/{name}")).unwrap();
        }
        prop_assert_eq!(list(&mut fs, "/d"), before);
    }

    #[test]
    fn file_contents_round_trip_byte_by_byte(contents in blob_bytes()) {
        let mut fs = VirtualFs::new();
        fs.add_file("/blob", contents.clone()).unwrap();
        let fd = fs.open_file("/blob").unwrap();
        let mut read = Vec::new();
        while let Some(byte) = fs.read_byte(fd).unwrap() {
            read.push(byte);
        }
        // End of file repeats; it never wraps around.
        prop_assert_eq!(fs.read_byte(fd).unwrap(), None);
        prop_assert_eq!(fs.read_byte(fd).unwrap(), None);
        fs.close_file(fd).unwrap();
        prop_assert_eq!(read, contents);
    }

    #[test]
    fn line_reads_partition_the_exact_contents(contents in blob_bytes()) {
        let mut fs = VirtualFs::new();
        fs.add_file("/blob", contents.clone()).unwrap();
        let fd = fs.open_file("/blob").unwrap();
        let mut lines = Vec::new();
        while let Some(line) = fs.read_line(fd).unwrap() {
            lines.push(line);
        }
        prop_assert_eq!(fs.read_line(fd).unwrap(), None);
        fs.close_file(fd).unwrap();

        for (idx, line) in lines.iter().enumerate() {
            prop_assert!(!line.is_empty());
            let newline_at = line.iter().position(|&b| b == b'\n');
            if idx + 1 < lines.len() {
                // Every line but the last ends at its newline.
                prop_assert_eq!(newline_at, Some(line.len() - 1));
            } else {
                prop_assert!(newline_at.is_none() || newline_at == Some(line.len() - 1));
            }
        }
        prop_assert_eq!(lines.concat(), contents);
    }

    #[test]
    fn normalization_is_idempotent_and_canonical(raw in "[a-z./]{0,24}") {
        let once = normalize(&raw);
        prop_assert!(once.starts_with('/'));
        prop_assert_eq!(normalize(&once), once.clone());
        prop_assert!(once == "/" || !once.ends_with('/'));
        if once != "/" {
            prop_assert!(!once.contains("//"));
            for component in once[1..].split('/') {
                prop_assert!(!component.is_empty());
                prop_assert!(component != "." && component != "..");
            }
        }
    }

    #[test]
    fn descriptors_are_never_reused(cycles in 1usize..32) {
        let mut fs = VirtualFs::new();
        fs.add_dir("/d").unwrap();
        let mut seen = BTreeSet::new();
        for _ in 0..cycles {
            let fd = fs.open_dir("/d").unwrap();
            prop_assert!(seen.insert(fd.0), "descriptor {} reused", fd.0);
            fs.close_dir(fd).unwrap();
        }
    }
}
