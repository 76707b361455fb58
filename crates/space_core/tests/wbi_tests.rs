use space_core::{filter_value, mixin_key, sign_params, SignedParams, MIXIN_KEY_ENC_TAB};

const IMG_KEY: &str = "7cd084941338484aae1ad9425b84077c";
const SUB_KEY: &str = "4932caff0ff746eab6f01bf08b70ac45";
const MIXIN_KEY: &str = "ea1db124af3c7062474693fa704f4ff8";

fn is_lower_hex_32(value: &str) -> bool {
    value.len() == 32 && value.chars().all(|ch| matches!(ch, '0'..='9' | 'a'..='f'))
}

#[test]
fn mixin_key_matches_published_reference() {
    assert_eq!(mixin_key(IMG_KEY, SUB_KEY), MIXIN_KEY);
}

#[test]
fn enc_tab_is_a_permutation_of_0_to_63() {
    let mut sorted = MIXIN_KEY_ENC_TAB;
    sorted.sort_unstable();
    assert_eq!(sorted.to_vec(), (0..64).collect::<Vec<usize>>());
    assert_eq!(&MIXIN_KEY_ENC_TAB[..4], &[46, 47, 18, 2]);
}

#[test]
fn mixin_key_is_empty_for_short_fragments() {
    assert_eq!(mixin_key("", ""), "");
    assert_eq!(mixin_key(IMG_KEY, "abc"), "");
}

#[test]
fn sign_params_matches_documented_vector() {
    let params = [("foo", "114"), ("bar", "514"), ("zab", "1919810")];
    let signed = sign_params(params, MIXIN_KEY, 1702204169);

    assert_eq!(signed.w_rid(), Some("8f6f2b5b3d485fe1886cec6a0be8c5d4"));
    assert_eq!(signed.wts(), Some(1702204169));
    assert_eq!(
        signed.to_query_string(),
        "bar=514&foo=114&wts=1702204169&zab=1919810&w_rid=8f6f2b5b3d485fe1886cec6a0be8c5d4"
    );
}

#[test]
fn sign_params_space_search_params() {
    let params = [
        ("mid", "486272".to_string()),
        ("ps", "50".to_string()),
        ("pn", "1".to_string()),
        ("order", "pubdate".to_string()),
    ];
    let signed = sign_params(params, MIXIN_KEY, 1700000000);

    assert!(signed.is_signed());
    assert_eq!(signed.get("w_rid"), Some("6e56f338d5e480ca15290761691d2395"));
    assert_eq!(signed.get("mid"), Some("486272"));
    assert_eq!(signed.len(), 6);
}

#[test]
fn sign_params_always_adds_wts_and_w_rid() {
    let cases: Vec<Vec<(&str, &str)>> = vec![
        vec![],
        vec![("mid", "486272"), ("pn", "1"), ("ps", "50")],
        vec![("keyword", "中文 (测试)!"), ("x", "'*'")],
        vec![("wts", "1"), ("a", "")],
    ];
    for (index, params) in cases.into_iter().enumerate() {
        let signed = sign_params(params, MIXIN_KEY, 1_700_000_000 + index as i64);
        assert!(signed.get("wts").is_some());
        let w_rid = signed.w_rid().expect("w_rid");
        assert!(is_lower_hex_32(w_rid), "bad w_rid {w_rid}");
    }
}

#[test]
fn caller_wts_is_overwritten_by_signing_time() {
    let signed = sign_params([("wts", "1")], MIXIN_KEY, 1700000000);
    assert_eq!(signed.wts(), Some(1700000000));
}

#[test]
fn sign_params_filters_values_and_encodes_like_the_web_client() {
    let signed = sign_params([("keyword", "a (b)~c!*")], MIXIN_KEY, 1700000000);

    assert_eq!(signed.get("keyword"), Some("a b~c"));
    assert_eq!(
        signed.to_query_string(),
        "keyword=a%20b~c&wts=1700000000&w_rid=0ae511fc1a8575cea5612792be73fc4a"
    );
}

#[test]
fn filter_value_removes_exactly_the_reserved_five() {
    assert_eq!(filter_value("!'()*"), "");
    assert_eq!(filter_value("it's (a) test*!"), "its a test");
    let untouched = "abc XYZ 0123 -_.~ %&=+/?:#[]@$,;\"<>{}|\\^` 中文";
    assert_eq!(filter_value(untouched), untouched);
}

#[test]
fn empty_mixin_key_leaves_params_unsigned() {
    let signed = sign_params([("mid", "1"), ("note", "(kept)")], "", 1700000000);

    assert!(!signed.is_signed());
    assert_eq!(signed.w_rid(), None);
    assert_eq!(signed.wts(), None);
    assert_eq!(signed.get("note"), Some("(kept)"));
    assert_eq!(
        signed,
        SignedParams::unsigned([("note", "(kept)"), ("mid", "1")])
    );
}
