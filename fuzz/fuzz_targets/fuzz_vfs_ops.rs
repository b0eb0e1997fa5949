#![no_main]

use libfuzzer_sys::fuzz_target;

use guestbox_rs::vos::fs::{DirFd, FileFd, VirtualFs};

// Small path universe so operations collide often enough to hit every
// errno path: existing/missing parents, files where directories are
// expected, nested removal targets.
const PATHS: &[&str] = &[
    "/",
    "/a",
    "/a/b",
    "/a/b/c",
    "/a/x.txt",
    "/b",
    "/b/y.txt",
    "/missing/child",
];

fn run_ops(data: &[u8]) -> Vec<String> {
    let mut fs = VirtualFs::new();
    let mut log = Vec::new();
    let mut dir_fds: Vec<DirFd> = Vec::new();
    let mut file_fds: Vec<FileFd> = Vec::new();

    let mut bytes = data.iter().copied();
    while let (Some(op), Some(sel)) = (bytes.next(), bytes.next()) {
        let path = PATHS[sel as usize % PATHS.len()];
        match op % 9 {
            0 => log.push(format!("create {:?}", fs.create_dir(path, 0o755))),
            1 => log.push(format!("remove {:?}", fs.remove_dir(path))),
            2 => match fs.open_dir(path) {
                Ok(fd) => {
                    dir_fds.push(fd);
                    log.push(format!("opendir {}", fd.0));
                }
                Err(err) => log.push(format!("opendir {err:?}")),
            },
            3 => {
                if !dir_fds.is_empty() {
                    let fd = dir_fds[sel as usize % dir_fds.len()];
                    log.push(format!("readdir {:?}", fs.read_dir(fd)));
                }
            }
            4 => {
                if let Some(fd) = dir_fds.pop() {
                    log.push(format!("closedir {:?}", fs.close_dir(fd)));
                    // Retired handles must stay rejected, not resurrect.
                    log.push(format!("stale {:?}", fs.read_dir(fd)));
                }
            }
            5 => log.push(format!(
                "seed {:?}",
                fs.add_file(path, vec![sel; sel as usize % 4])
            )),
            6 => match fs.open_file(path) {
                Ok(fd) => {
                    file_fds.push(fd);
                    log.push(format!("openfile {}", fd.0));
                }
                Err(err) => log.push(format!("openfile {err:?}")),
            },
            7 => {
                if !file_fds.is_empty() {
                    let fd = file_fds[sel as usize % file_fds.len()];
                    log.push(format!("readbyte {:?}", fs.read_byte(fd)));
                }
            }
            _ => {
                if let Some(fd) = file_fds.pop() {
                    log.push(format!("closefile {:?}", fs.close_file(fd)));
                }
            }
        }
    }

    // The root can never be removed or shadowed.
    assert!(fs.is_dir("/"));
    log
}

fuzz_target!(|data: &[u8]| {
    // Determinism: the same op stream observes the same results on a
    // fresh filesystem, every time.
    let first = run_ops(data);
    let second = run_ops(data);
    assert_eq!(first, second);
});
