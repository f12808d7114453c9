mod common;
use common::TestEnv;

fn ids(out: &[u8]) -> Vec<u64> {
    serde_json::from_slice(out).unwrap()
}

#[test]
fn first_twenty_come_from_pages_one_and_two() {
    let t = TestEnv::new();
    let out = t
        .bin()
        .args(["select-first", "20", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(ids(&out), (1..=20).collect::<Vec<_>>());
}

#[test]
fn limit_above_total_selects_everything() {
    let t = TestEnv::new();
    let out = t
        .bin()
        .args(["select-first", "1000", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v = ids(&out);
    assert_eq!(v.len(), 120);
    assert_eq!(v.first(), Some(&1));
    assert_eq!(v.last(), Some(&120));
}

#[test]
fn plain_output_is_one_id_per_line() {
    let t = TestEnv::new();
    let out = t
        .bin()
        .args(["select-first", "3"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(String::from_utf8(out).unwrap(), "1\n2\n3\n");
}

#[test]
fn invalid_limits_never_reach_the_network() {
    let t = TestEnv::new();
    // nothing listens here; any fetch would fail the command
    for limit in ["abc", "0", "-5"] {
        let out = t
            .raw()
            .args(["--api-url", "http://127.0.0.1:9/api/v1", "select-first", limit, "--json"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        assert_eq!(String::from_utf8(out).unwrap().trim(), "[]", "limit {limit}");
    }
}
