use chrono::{TimeZone, Utc};
use dirlisthash_core::{Digests, OutputTarget, Record, RunConfig, Timestamps};
use dirlisthash_sink::{COLUMNS, CompositeSink, RecordSink, SinkError, open_sink};
use rusqlite::Connection;
use tempfile::TempDir;

fn sample_records() -> Vec<Record> {
    let modified = Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap();
    let timestamps = Timestamps {
        created: None,
        modified: Some(modified),
        accessed: Some(modified),
    };

    vec![
        Record::new_file(
            "/data/a.txt",
            "a.txt",
            2,
            Digests {
                sha1: Some("c22b5f9178342609428d6f51b2c5af4c0bde6a42".into()),
                md5: Some("49f68a5c8493ec2c0bf489821c21fc3b".into()),
            },
            timestamps,
        ),
        Record::new_directory("/data/sub", "sub", timestamps),
        Record::new_file(
            "/data/sub/b, \"quoted\".bin",
            "b, \"quoted\".bin",
            1_048_577,
            Digests::default(),
            timestamps,
        ),
    ]
}

fn write_all(sink: &mut dyn RecordSink, records: &[Record]) {
    for record in records {
        sink.write(record).unwrap();
    }
    sink.close().unwrap();
}

#[test]
fn test_tabular_read_back() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("out.csv");
    let config = RunConfig::new("/data");

    let mut sink = open_sink(&OutputTarget::tabular(&path), &config).unwrap();
    write_all(sink.as_mut(), &sample_records());

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(headers, COLUMNS);

    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r.len() == 9));

    assert_eq!(&rows[0][0], "File");
    assert_eq!(&rows[0][4], "c22b5f9178342609428d6f51b2c5af4c0bde6a42");
    assert_eq!(&rows[0][6], "");
    assert_eq!(&rows[0][7], "2023-11-14T22:13:20Z");

    assert_eq!(&rows[1][0], "Directory");
    assert_eq!(&rows[1][3], "0");
    assert_eq!(&rows[1][4], "");
    assert_eq!(&rows[1][5], "");

    assert_eq!(&rows[2][1], "/data/sub/b, \"quoted\".bin");
    assert_eq!(&rows[2][3], "1048577");
}

#[test]
fn test_tabular_custom_delimiter() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("out.txt");
    let mut config = RunConfig::new("/data");
    config.delimiter = b';';

    let mut sink = open_sink(&OutputTarget::tabular(&path), &config).unwrap();
    write_all(sink.as_mut(), &sample_records()[..1]);

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("type;full_path;name;"));
}

#[test]
fn test_database_read_back() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("out.db");
    let mut config = RunConfig::new("/data");
    config.batch_size = 2;

    let mut sink = open_sink(&OutputTarget::database(&path), &config).unwrap();
    write_all(sink.as_mut(), &sample_records());

    let conn = Connection::open(&path).unwrap();
    let mut stmt = conn
        .prepare(
            "SELECT \"type\", full_path, size_bytes, sha1, md5, created_at, modified_at \
             FROM directory_contents ORDER BY full_path",
        )
        .unwrap();
    let rows: Vec<(String, String, i64, Option<String>, Option<String>, Option<String>, String)> =
        stmt.query_map([], |r| {
            Ok((
                r.get(0)?,
                r.get(1)?,
                r.get(2)?,
                r.get(3)?,
                r.get(4)?,
                r.get(5)?,
                r.get(6)?,
            ))
        })
        .unwrap()
        .map(Result::unwrap)
        .collect();

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].0, "File");
    assert_eq!(rows[0].1, "/data/a.txt");
    assert_eq!(rows[0].2, 2);
    assert_eq!(rows[0].4.as_deref(), Some("49f68a5c8493ec2c0bf489821c21fc3b"));
    assert!(rows[0].5.is_none());
    assert_eq!(rows[0].6, "2023-11-14T22:13:20Z");

    assert_eq!(rows[1].0, "Directory");
    assert!(rows[1].3.is_none());
    assert!(rows[1].4.is_none());

    assert_eq!(rows[2].2, 1_048_577);
}

#[test]
fn test_composite_with_one_invalid_destination() {
    let temp = TempDir::new().unwrap();
    let good = temp.path().join("out.csv");
    let bad = temp.path().join("no/such/dir/out.db");
    let config = RunConfig::new("/data");

    let targets = [OutputTarget::tabular(&good), OutputTarget::database(&bad)];
    let mut composite = CompositeSink::open(&targets, &config).unwrap();

    assert_eq!(composite.len(), 1);
    assert_eq!(composite.open_failures().len(), 1);
    assert_eq!(
        composite.open_failures()[0].destination(),
        Some(bad.as_path())
    );

    write_all(&mut composite, &sample_records());

    let mut reader = csv::Reader::from_path(&good).unwrap();
    assert_eq!(reader.records().count(), 3);
    assert!(!bad.exists());
}

#[test]
fn test_composite_all_invalid() {
    let temp = TempDir::new().unwrap();
    let config = RunConfig::new("/data");
    let targets = [
        OutputTarget::tabular(temp.path().join("x/out.csv")),
        OutputTarget::database(temp.path().join("y/out.db")),
    ];

    let err = CompositeSink::open(&targets, &config).err().unwrap();
    match err {
        SinkError::Multiple(failures) => {
            assert_eq!(failures.len(), 2);
            assert!(failures.iter().all(SinkError::is_unavailable));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_both_formats_hold_same_rows() {
    let temp = TempDir::new().unwrap();
    let csv_path = temp.path().join("out.csv");
    let db_path = temp.path().join("out.db");
    let config = RunConfig::new("/data");

    let targets = [
        OutputTarget::tabular(&csv_path),
        OutputTarget::database(&db_path),
    ];
    let mut composite = CompositeSink::open(&targets, &config).unwrap();
    assert!(composite.open_failures().is_empty());
    write_all(&mut composite, &sample_records());

    let mut reader = csv::Reader::from_path(&csv_path).unwrap();
    let mut csv_paths: Vec<String> = reader
        .records()
        .map(|r| r.unwrap()[1].to_string())
        .collect();
    csv_paths.sort();

    let conn = Connection::open(&db_path).unwrap();
    let mut stmt = conn
        .prepare("SELECT full_path FROM directory_contents ORDER BY full_path")
        .unwrap();
    let db_paths: Vec<String> = stmt
        .query_map([], |r| r.get(0))
        .unwrap()
        .map(Result::unwrap)
        .collect();

    assert_eq!(csv_paths, db_paths);
}
