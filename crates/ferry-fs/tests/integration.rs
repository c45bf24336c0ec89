//! Staging, commit, rollback and confinement against a real directory.

use ferry_fs::{Error, UploadRoot};
use ferry_stream::{Chunk, LimitedSource, Source, copy};
use tempfile::TempDir;

fn root() -> (TempDir, UploadRoot) {
    let dir = tempfile::tempdir().unwrap();
    let root = UploadRoot::open(dir.path().join("files")).unwrap();
    (dir, root)
}

fn entries(root: &UploadRoot) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(root.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn staged_file_is_hidden_until_commit() {
    let (_dir, root) = root();
    let mut staged = root.stage("../report.txt").await.unwrap();

    let staging_name = staged.staging_path().file_name().unwrap().to_string_lossy().into_owned();
    assert!(staging_name.starts_with(".report.txt."));
    assert!(staging_name.ends_with(".tmp"));

    let mut src: &[u8] = b"quarterly numbers";
    copy(&mut src, staged.sink(), &mut [0u8; 4]).await.unwrap();
    assert_eq!(staged.sink().written(), 17);
    assert!(!root.path().join("report.txt").exists());

    let placed = staged.commit().await.unwrap();
    assert_eq!(placed, root.path().join("report.txt"));
    assert_eq!(std::fs::read(&placed).unwrap(), b"quarterly numbers");
    assert_eq!(entries(&root), vec!["report.txt"]);
}

#[tokio::test]
async fn dropping_an_uncommitted_stage_removes_it() {
    let (_dir, root) = root();
    {
        let mut staged = root.stage("partial.bin").await.unwrap();
        let mut src: &[u8] = &[1u8; 1000];
        copy(&mut src, staged.sink(), &mut [0u8; 100]).await.unwrap();
        assert!(staged.staging_path().exists());
    }
    assert!(entries(&root).is_empty());
}

#[tokio::test]
async fn commit_replaces_existing_file() {
    let (_dir, root) = root();
    std::fs::write(root.path().join("data.txt"), b"old contents").unwrap();

    let mut staged = root.stage("data.txt").await.unwrap();
    let mut src: &[u8] = b"new";
    copy(&mut src, staged.sink(), &mut [0u8; 8]).await.unwrap();
    staged.commit().await.unwrap();

    assert_eq!(std::fs::read(root.path().join("data.txt")).unwrap(), b"new");
    assert_eq!(entries(&root), vec!["data.txt"]);
}

#[tokio::test]
async fn open_existing_reports_missing_and_invalid_names() {
    let (_dir, root) = root();
    assert!(matches!(root.open_existing("nope.txt").await, Err(Error::NotFound(_))));
    assert!(matches!(root.open_existing("..").await, Err(Error::InvalidName(_))));
}

#[tokio::test]
async fn region_reads_from_offset() {
    let (_dir, root) = root();
    let data: Vec<u8> = (0..1000u32).map(|i| (i % 256) as u8).collect();
    std::fs::write(root.path().join("blob"), &data).unwrap();

    let stored = root.open_existing("blob").await.unwrap();
    assert_eq!(stored.len(), 1000);
    assert_eq!(stored.name(), "blob");
    assert!(stored.modified().is_some());

    let region = stored.into_region(100).await.unwrap();
    let mut src = LimitedSource::new(region, 50);
    let mut out = Vec::new();
    copy(&mut src, &mut out, &mut [0u8; 16]).await.unwrap();
    assert_eq!(out, &data[100..150]);
}

#[tokio::test]
async fn region_past_end_is_empty() {
    let (_dir, root) = root();
    std::fs::write(root.path().join("small"), b"abc").unwrap();

    let mut region = root.open_existing("small").await.unwrap().into_region(10).await.unwrap();
    assert_eq!(region.read(&mut [0u8; 8]).await.unwrap(), Chunk::End);
    assert_eq!(region.read(&mut [0u8; 8]).await.unwrap(), Chunk::End);
}

#[cfg(unix)]
#[tokio::test]
async fn symlink_out_of_root_is_an_escape() {
    let (dir, root) = root();
    let secret = dir.path().join("secret.txt");
    std::fs::write(&secret, b"top secret").unwrap();
    std::os::unix::fs::symlink(&secret, root.path().join("link.txt")).unwrap();

    assert!(matches!(root.open_existing("link.txt").await, Err(Error::Escape { .. })));
}

#[tokio::test]
async fn directories_are_not_served() {
    let (_dir, root) = root();
    std::fs::create_dir(root.path().join("sub")).unwrap();
    assert!(root.open_existing("sub").await.is_err());
}

#[tokio::test]
async fn rollback_tolerates_a_vanished_staging_file() {
    let (_dir, root) = root();
    std::fs::write(root.path().join("keep.txt"), b"original").unwrap();

    let staged = root.stage("keep.txt").await.unwrap();
    std::fs::remove_file(staged.staging_path()).unwrap();
    drop(staged);

    assert_eq!(entries(&root), vec!["keep.txt"]);
    assert_eq!(std::fs::read(root.path().join("keep.txt")).unwrap(), b"original");
}
