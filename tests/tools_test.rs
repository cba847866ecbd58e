use recollect::tools::{ToolOutcome, ToolRegistry};
use serde_json::json;
use tempfile::TempDir;

fn registry() -> (TempDir, ToolRegistry) {
    let tmp = TempDir::new().unwrap();
    let registry = ToolRegistry::builtin(tmp.path());
    (tmp, registry)
}

#[test]
fn registry_advertises_every_file_tool() {
    let (_tmp, registry) = registry();
    let mut names: Vec<String> = registry.schemas().into_iter().map(|s| s.name).collect();
    names.sort();
    assert_eq!(
        names,
        [
            "append_to_file",
            "create_file",
            "delete_file",
            "list_directory",
            "move_file",
            "read_file",
            "write_file"
        ]
    );
    for schema in registry.schemas() {
        assert_eq!(schema.parameters["type"], "object", "{}", schema.name);
    }
}

#[test]
fn create_then_read_round_trips_content() {
    let (_tmp, registry) = registry();
    let created = registry.execute(
        "create_file",
        json!({"filepath": "notes/a.txt", "content": "hello"}),
    );
    assert_eq!(created, ToolOutcome::success("File 'notes/a.txt' successfully created."));

    let read = registry.execute("read_file", json!({"filepath": "notes/a.txt"}));
    assert_eq!(read.status(), "success");
    assert_eq!(read.data(), Some(&json!("hello")));
}

#[test]
fn create_refuses_to_clobber_without_overwrite() {
    let (tmp, registry) = registry();
    std::fs::write(tmp.path().join("a.txt"), "original").unwrap();

    let again = registry.execute("create_file", json!({"filepath": "a.txt", "content": "new"}));
    assert_eq!(again.status(), "warning");
    assert_eq!(again.message(), "File 'a.txt' already exists. File not modified.");
    assert_eq!(std::fs::read_to_string(tmp.path().join("a.txt")).unwrap(), "original");

    let forced = registry.execute(
        "create_file",
        json!({"filepath": "a.txt", "content": "new", "overwrite": true}),
    );
    assert_eq!(forced.status(), "success");
    assert_eq!(std::fs::read_to_string(tmp.path().join("a.txt")).unwrap(), "new");
}

#[test]
fn write_and_append_modify_files() {
    let (tmp, registry) = registry();
    let written = registry.execute("write_file", json!({"filepath": "log.txt", "content": "one"}));
    assert_eq!(written.message(), "File 'log.txt' successfully written.");

    let appended = registry.execute("append_to_file", json!({"filepath": "log.txt", "content": "\ntwo"}));
    assert_eq!(appended.status(), "success");

    let plain = registry.execute(
        "write_file",
        json!({"filepath": "plain.txt", "content": "x", "safe_write": false}),
    );
    assert_eq!(plain.status(), "success");

    assert_eq!(std::fs::read_to_string(tmp.path().join("log.txt")).unwrap(), "one\ntwo");
    assert_eq!(std::fs::read_to_string(tmp.path().join("plain.txt")).unwrap(), "x");
}

#[test]
fn delete_moves_to_trash_by_default() {
    let (tmp, registry) = registry();
    std::fs::write(tmp.path().join("old.md"), "bye").unwrap();

    let deleted = registry.execute("delete_file", json!({"filepath": "old.md"}));
    assert_eq!(deleted.message(), "File 'old.md' moved to trash.");
    assert!(!tmp.path().join("old.md").exists());

    let trashed: Vec<_> = std::fs::read_dir(tmp.path().join(".trash"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(trashed.len(), 1);
    assert!(trashed[0].starts_with("old_") && trashed[0].ends_with(".md"));

    let missing = registry.execute("delete_file", json!({"filepath": "old.md"}));
    assert_eq!(missing.status(), "warning");
}

#[test]
fn permanent_delete_removes_the_file() {
    let (tmp, registry) = registry();
    std::fs::write(tmp.path().join("tmp.txt"), "x").unwrap();

    let deleted = registry.execute("delete_file", json!({"filepath": "tmp.txt", "safe_delete": false}));
    assert_eq!(deleted.message(), "File 'tmp.txt' permanently deleted.");
    assert!(!tmp.path().join("tmp.txt").exists());
    assert!(!tmp.path().join(".trash").exists());
}

#[test]
fn list_directory_filters_and_recurses() {
    let (tmp, registry) = registry();
    std::fs::create_dir_all(tmp.path().join("docs/deep")).unwrap();
    std::fs::write(tmp.path().join("docs/a.txt"), "").unwrap();
    std::fs::write(tmp.path().join("docs/b.MD"), "").unwrap();
    std::fs::write(tmp.path().join("docs/deep/c.txt"), "").unwrap();

    let flat = registry.execute("list_directory", json!({"dirpath": "docs"}));
    assert_eq!(flat.message(), "Listed 3 item(s) in directory 'docs'.");
    assert_eq!(flat.data().unwrap()["items"], json!(["a.txt", "b.MD", "deep"]));

    let files = registry.execute(
        "list_directory",
        json!({"dirpath": "docs", "only_files": true, "recursive": true, "filter_ext": [".txt"]}),
    );
    assert_eq!(files.data().unwrap()["items"], json!(["a.txt", "deep/c.txt"]));

    let md = registry.execute("list_directory", json!({"dirpath": "docs", "filter_ext": ["md"]}));
    assert_eq!(md.data().unwrap()["count"], 1);

    let missing = registry.execute("list_directory", json!({"dirpath": "nope"}));
    assert!(missing.is_error());
}

#[test]
fn move_into_directory_keeps_file_name() {
    let (tmp, registry) = registry();
    std::fs::write(tmp.path().join("a.txt"), "payload").unwrap();
    std::fs::create_dir(tmp.path().join("archive")).unwrap();

    let moved = registry.execute("move_file", json!({"src": "a.txt", "dst": "archive"}));
    assert_eq!(moved.status(), "success");
    assert_eq!(
        std::fs::read_to_string(tmp.path().join("archive/a.txt")).unwrap(),
        "payload"
    );

    let missing = registry.execute("move_file", json!({"src": "a.txt", "dst": "b.txt"}));
    assert_eq!(missing.message(), "Source file 'a.txt' not found.");
}

#[test]
fn move_respects_existing_destination() {
    let (tmp, registry) = registry();
    std::fs::write(tmp.path().join("a.txt"), "new").unwrap();
    std::fs::write(tmp.path().join("b.txt"), "old").unwrap();

    let blocked = registry.execute("move_file", json!({"src": "a.txt", "dst": "b.txt"}));
    assert_eq!(blocked.message(), "File 'b.txt' already exists. Use overwrite=true to overwrite.");
    assert!(tmp.path().join("a.txt").exists());

    let forced = registry.execute("move_file", json!({"src": "a.txt", "dst": "b.txt", "overwrite": true}));
    assert_eq!(forced.status(), "success");
    assert_eq!(std::fs::read_to_string(tmp.path().join("b.txt")).unwrap(), "new");
}

#[test]
fn paths_outside_the_workspace_are_errors() {
    let (_tmp, registry) = registry();
    for path in ["../escape.txt", "/etc/passwd", ""] {
        let outcome = registry.execute("read_file", json!({"filepath": path}));
        assert!(outcome.is_error(), "{path:?} should be rejected");
        assert_eq!(outcome.data().unwrap()["tool"], "read_file");
    }
}

#[test]
fn malformed_calls_become_error_envelopes() {
    let (_tmp, registry) = registry();

    let unknown = registry.execute("format_disk", json!({}));
    assert_eq!(unknown.message(), "Tool 'format_disk' not found or not implemented.");

    let bad_json = registry.execute_call("read_file", "{not json");
    assert!(bad_json.message().starts_with("Invalid JSON arguments"));

    let missing_field = registry.execute("read_file", json!({}));
    assert!(missing_field.message().starts_with("Invalid arguments"));

    let encoded: serde_json::Value = serde_json::from_str(&missing_field.to_json_string()).unwrap();
    assert_eq!(encoded["status"], "error");
}
