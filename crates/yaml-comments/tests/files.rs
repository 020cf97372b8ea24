#![allow(clippy::unwrap_used)]

use std::fs;

use pretty_assertions::assert_eq;
use yaml_comments::{CommentOptions, CommentType, Commentable, Error, YamlDocument};

const CONFIG: &str = "\
# Application settings

# Log verbosity
level: info # one of debug, info, warn
plugins:
- auth
- cache # optional
";

#[test]
fn load_edit_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yml");
    fs::write(&path, CONFIG).unwrap();

    let mut doc = YamlDocument::new(CommentOptions::default()).unwrap();
    doc.load(&path).unwrap();
    doc.set("level", "debug").unwrap();
    doc.set_comment("plugins[0]", Some("required"), CommentType::Side)
        .unwrap();
    doc.save(&path).unwrap();

    let saved = fs::read_to_string(&path).unwrap();
    assert_eq!(
        saved,
        "# Application settings\n\n# Log verbosity\nlevel: debug # one of debug, info, warn\nplugins:\n- auth # required\n- cache # optional\n"
    );

    let mut reloaded = YamlDocument::default();
    reloaded.load(&path).unwrap();
    assert_eq!(
        reloaded
            .comment("plugins[0]", CommentType::Side)
            .unwrap()
            .as_deref(),
        Some("required")
    );
}

#[test]
fn unchanged_file_is_saved_byte_for_byte() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("in.yml");
    let target = dir.path().join("out.yml");
    fs::write(&source, CONFIG).unwrap();

    let mut doc = YamlDocument::default();
    doc.load(&source).unwrap();
    doc.save(&target).unwrap();
    assert_eq!(fs::read_to_string(&target).unwrap(), CONFIG);
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.yml");
    let mut doc = YamlDocument::default();
    let err = doc.load(&path).unwrap_err();
    match err {
        Error::Io { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("expected an I/O error, got {other:?}"),
    }
}

#[test]
fn streaming_write_matches_string_output() {
    let mut doc = YamlDocument::parse(CONFIG).unwrap();
    doc.set("plugins[2]", "metrics").unwrap();
    doc.set_comment("plugins[-1]", Some("new"), CommentType::Block)
        .unwrap();

    let mut streamed = Vec::new();
    doc.write_to(&mut streamed).unwrap();
    assert_eq!(
        String::from_utf8(streamed).unwrap(),
        doc.to_yaml_string().unwrap()
    );
}
