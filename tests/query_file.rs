mod common;

use common::temp_file;
use kvlink::query::{load_queries, Query, QueryFileError};

#[test]
fn loads_queries_and_reports_skipped_lines() {
    let (_dir, path) = temp_file(
        "queries.txt",
        "\
# id,op,key[,value]
1,SET,user:1,alice
2,GET,user:1
bogus line
3,DELETE,user:1
",
    );

    let parsed = load_queries(&path).unwrap();
    assert_eq!(
        parsed.queries,
        vec![
            Query::set(1, "user:1", "alice"),
            Query::get(2, "user:1"),
            Query::delete(3, "user:1"),
        ]
    );
    assert_eq!(parsed.skipped.len(), 1);
    assert_eq!(parsed.skipped[0].line, 4);
}

#[test]
fn missing_query_file_is_an_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("nope.txt");
    let err = load_queries(&path).unwrap_err();
    let QueryFileError::Read { path: reported, .. } = err;
    assert_eq!(reported, path);
}
