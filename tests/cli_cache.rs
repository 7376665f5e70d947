use assert_cmd::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn page_command_uses_the_wiki_cache_without_network() {
    let dir = tempdir().unwrap();

    // provide a .wiki cache so the tool does not try to hit the network.
    // cache layout: ./cache/wiki/{title with underscores}.wiki
    let wiki_path = dir
        .path()
        .join("cache")
        .join("wiki")
        .join("Test_Page.wiki");
    fs::create_dir_all(wiki_path.parent().unwrap()).unwrap();
    fs::write(
        &wiki_path,
        "== Test Page ==\nSome '''bold''' text.\n* a bullet\n",
    )
    .unwrap();

    let mut cmd = cargo_bin_cmd!("wiki2txt");
    cmd.current_dir(dir.path()).arg("page").arg("Test Page");

    cmd.assert().success().stdout(
        predicate::str::contains("Test Page")
            .and(predicate::str::contains("Some bold text."))
            .and(predicate::str::contains("  - a bullet"))
            .and(predicate::str::contains("'''").not()),
    );
}

#[test]
fn page_command_honors_width_override() {
    let dir = tempdir().unwrap();

    let wiki_path = dir
        .path()
        .join("cache")
        .join("wiki")
        .join("Wide.wiki");
    fs::create_dir_all(wiki_path.parent().unwrap()).unwrap();
    let words = ["word"; 20].join(" ");
    fs::write(&wiki_path, format!("{words}\n")).unwrap();

    let mut cmd = cargo_bin_cmd!("wiki2txt");
    cmd.current_dir(dir.path())
        .arg("page")
        .arg("Wide")
        .arg("--width")
        .arg("20");

    let output = cmd.assert().success().get_output().stdout.clone();
    let stdout = String::from_utf8(output).unwrap();
    for line in stdout.lines() {
        assert!(line.chars().count() <= 20, "overlong line: {line:?}");
    }
}

#[test]
fn regen_builds_the_header_from_cached_pages() {
    let dir = tempdir().unwrap();

    let cache = dir.path().join("cache").join("wiki");
    fs::create_dir_all(&cache).unwrap();
    fs::write(cache.join("Controls.wiki"), "== Controls ==\nGrip to grab.\n").unwrap();
    fs::write(cache.join("How_To_Play.wiki"), "Insert a cartridge.\n").unwrap();

    let output = dir.path().join("wiki_data.h");

    let mut cmd = cargo_bin_cmd!("wiki2txt");
    cmd.current_dir(dir.path())
        .arg("regen")
        .arg("--cache")
        .arg("cache/wiki")
        .arg("--output")
        .arg("wiki_data.h");

    cmd.assert().success();

    let header = fs::read_to_string(&output).unwrap();
    assert!(header.starts_with("/* AUTO-GENERATED"));
    assert!(header.contains("#define WIKI_PAGE_COUNT 2"));
    // walk order is sorted by path, underscores become spaces in titles.
    assert!(header.contains("/* Page 0: Controls */"));
    assert!(header.contains("/* Page 1: How To Play */"));
    assert!(header.contains("{\"Controls\", 1},"));
    assert!(header.contains("{\"Insert a cartridge.\", 0},"));
    assert!(header.contains("{\"How To Play\", page_1_lines, 1},"));
    assert!(header.ends_with("#endif /* WIKI_DATA_H */\n"));
}

#[test]
fn regen_with_missing_cache_dir_fails_cleanly() {
    let dir = tempdir().unwrap();

    let mut cmd = cargo_bin_cmd!("wiki2txt");
    cmd.current_dir(dir.path())
        .arg("regen")
        .arg("--cache")
        .arg("no/such/dir")
        .arg("--output")
        .arg("wiki_data.h");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("cache directory not found"));
}

#[test]
fn empty_cached_page_becomes_the_placeholder() {
    let dir = tempdir().unwrap();

    let cache = dir.path().join("cache").join("wiki");
    fs::create_dir_all(&cache).unwrap();
    fs::write(cache.join("Empty.wiki"), "").unwrap();

    let mut cmd = cargo_bin_cmd!("wiki2txt");
    cmd.current_dir(dir.path())
        .arg("regen")
        .arg("--cache")
        .arg("cache/wiki")
        .arg("--output")
        .arg("out.h");

    cmd.assert().success();

    let header = fs::read_to_string(dir.path().join("out.h")).unwrap();
    assert!(header.contains("{\"(Page content unavailable)\", 0},"));
}

#[test]
fn config_file_overrides_the_cache_location() {
    let dir = tempdir().unwrap();

    fs::write(
        dir.path().join("wiki2txt.yaml"),
        "cache_dir: store\nline_width: 30\n",
    )
    .unwrap();

    let cache = dir.path().join("store");
    fs::create_dir_all(&cache).unwrap();
    fs::write(cache.join("Thing.wiki"), "short page\n").unwrap();

    let mut cmd = cargo_bin_cmd!("wiki2txt");
    cmd.current_dir(dir.path()).arg("page").arg("Thing");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("short page"));
}
