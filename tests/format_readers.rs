use rfile::{FileError, FormatToken, LocalSession, MemorySession, RemoteFs};
use serde::Deserialize;
use std::sync::Arc;
use tempfile::TempDir;

#[derive(Debug, Default, Deserialize, PartialEq)]
struct Item {
    n: i64,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
struct User {
    name: String,
    age: i64,
}

async fn fs_with(path: &str, content: &str) -> RemoteFs<MemorySession> {
    let session = MemorySession::new();
    session.insert(path, content).await;
    RemoteFs::new(Arc::new(session))
}

#[tokio::test]
async fn test_text_lines_in_order() {
    let fs = fs_with("/data.csv", "a,b\nc,d").await;
    let mut file = fs.open("/data.csv").await.unwrap();
    let mut reader = file.read_all().await.unwrap();
    assert_eq!(reader.format(), FormatToken::Text);

    let mut line = String::new();
    assert!(reader.next().await);
    reader.scan(&mut line).await.unwrap();
    assert_eq!(line, "a,b");

    assert!(reader.next().await);
    reader.scan(&mut line).await.unwrap();
    assert_eq!(line, "c,d");

    assert!(!reader.next().await);
}

#[tokio::test]
async fn test_json_array_elements() {
    let fs = fs_with("/items.json", r#"[{"n":1},{"n":2}]"#).await;
    let mut file = fs.open("/items.json").await.unwrap();
    let mut reader = file.read_all().await.unwrap();
    assert_eq!(reader.format(), FormatToken::Array);

    let mut item = Item::default();
    assert!(reader.next().await);
    reader.scan(&mut item).await.unwrap();
    assert_eq!(item.n, 1);

    assert!(reader.next().await);
    reader.scan(&mut item).await.unwrap();
    assert_eq!(item.n, 2);

    assert!(!reader.next().await);
}

#[tokio::test]
async fn test_json_single_object() {
    let fs = fs_with("/item.json", r#"{"n":1}"#).await;
    let mut file = fs.open("/item.json").await.unwrap();
    let mut reader = file.read_all().await.unwrap();
    assert_eq!(reader.format(), FormatToken::Object);

    let mut item = Item::default();
    assert!(reader.next().await);
    reader.scan(&mut item).await.unwrap();
    assert_eq!(item.n, 1);
    assert!(!reader.next().await);
}

#[tokio::test]
async fn test_object_strategy_rereads_from_start() {
    // The handle sits past the leading whitespace; the object reader still
    // sees the whole document.
    let fs = fs_with("/user.json", r#"   {"name": "Sam", "age": 123}"#).await;
    let mut file = fs.open("/user.json").await.unwrap();
    file.seek(2, 0).await.unwrap();

    let mut reader = file.read_all().await.unwrap();
    assert_eq!(file.offset(), 0);

    let mut user = User::default();
    reader.scan(&mut user).await.unwrap();
    assert_eq!(
        user,
        User {
            name: "Sam".to_string(),
            age: 123
        }
    );
}

#[tokio::test]
async fn test_line_reader_rejects_non_string_target() {
    let fs = fs_with("/data.csv", "Name,Age,Email").await;
    let mut file = fs.open("/data.csv").await.unwrap();
    let mut reader = file.read_all().await.unwrap();

    assert!(reader.next().await);
    let mut item = Item { n: 99 };
    let err = reader.scan(&mut item).await.unwrap_err();
    assert!(matches!(err, FileError::InvalidArgument(_)));
    assert_eq!(item, Item { n: 99 });

    // The line is still there for a correctly typed target
    let mut line = String::new();
    reader.scan(&mut line).await.unwrap();
    assert_eq!(line, "Name,Age,Email");
}

#[tokio::test]
async fn test_invalid_json_fails_at_open() {
    let fs = fs_with("/bad.json", "!@#$%^&*").await;
    let mut file = fs.open("/bad.json").await.unwrap();

    match file.read_all().await {
        Err(FileError::Decode(e)) => assert!(e.is_syntax()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected a decode error"),
    }
}

#[tokio::test]
async fn test_write_then_read_back_over_local_session() {
    let temp_dir = TempDir::new().unwrap();
    let fs = RemoteFs::new(Arc::new(LocalSession::new(temp_dir.path())));

    let csv = "Name,Age,Email\n\
               John Doe,30,johndoe@example.com\n\
               Jane Smith,25,janesmith@example.com";
    let mut file = fs.create("/temp.csv").await.unwrap();
    assert_eq!(file.write(csv.as_bytes()).await.unwrap(), csv.len());
    file.close().await.unwrap();

    let mut file = fs.open("/temp.csv").await.unwrap();
    let mut reader = file.read_all().await.unwrap();
    let mut lines = Vec::new();
    while reader.next().await {
        let mut line = String::new();
        reader.scan(&mut line).await.unwrap();
        lines.push(line);
    }
    assert_eq!(lines.join("\n"), csv);

    let json = r#"[{"name": "Sam", "age": 123},
{"name": "Jane", "age": 456},
{"name": "John", "age": 789}]"#;
    let mut file = fs.create("/temp.json").await.unwrap();
    file.write(json.as_bytes()).await.unwrap();

    let mut file = fs.open("/temp.json").await.unwrap();
    let mut reader = file.read_all().await.unwrap();
    let mut users = Vec::new();
    while reader.next().await {
        let mut user = User::default();
        reader.scan(&mut user).await.unwrap();
        users.push((user.name, user.age));
    }
    assert_eq!(
        users,
        vec![
            ("Sam".to_string(), 123),
            ("Jane".to_string(), 456),
            ("John".to_string(), 789)
        ]
    );
}
