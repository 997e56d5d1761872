// Output persistence tests

use docsmith::application::persistence::{OutputStore, PersistError};
use docsmith::domain::output::CodeOutput;
use tempfile::TempDir;

fn output(code: &str, filename: &str) -> CodeOutput {
    CodeOutput {
        code: code.into(),
        description: String::new(),
        filename: filename.into(),
    }
}

#[tokio::test]
async fn creates_directory_and_writes_exact_code() {
    let dir = TempDir::new().expect("tempdir");
    let root = dir.path().join("nested").join("output");
    let store = OutputStore::new(&root);

    let path = store.save(&output("print(1)", "foo.py")).await.expect("save");

    assert_eq!(path, root.join("foo.py"));
    assert_eq!(std::fs::read_to_string(&path).expect("read"), "print(1)");
}

#[tokio::test]
async fn overwrites_existing_file() {
    let dir = TempDir::new().expect("tempdir");
    let store = OutputStore::new(dir.path());

    store.save(&output("old", "main.rs")).await.expect("first save");
    store.save(&output("new", "main.rs")).await.expect("second save");

    assert_eq!(
        std::fs::read_to_string(dir.path().join("main.rs")).expect("read"),
        "new"
    );
}

#[tokio::test]
async fn traversal_is_rejected_before_touching_disk() {
    let dir = TempDir::new().expect("tempdir");
    let root = dir.path().join("output");
    let store = OutputStore::new(&root);

    let err = store
        .save(&output("x", "../outside.py"))
        .await
        .expect_err("unsafe name");

    assert!(matches!(err, PersistError::UnsafeFilename { .. }));
    assert!(!root.exists());
    assert!(!dir.path().join("outside.py").exists());
}

#[tokio::test]
async fn absolute_path_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let target = dir.path().join("abs.py");
    let store = OutputStore::new(dir.path().join("output"));

    let err = store
        .save(&output("x", &target.display().to_string()))
        .await
        .expect_err("absolute path");

    assert!(matches!(err, PersistError::UnsafeFilename { .. }));
    assert!(!target.exists());
}
