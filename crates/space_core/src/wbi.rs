use std::collections::BTreeMap;
use std::fmt::Display;

use md5::{Digest, Md5};

pub const MIXIN_KEY_ENC_TAB: [usize; 64] = [
    46, 47, 18, 2, 53, 8, 23, 32, 15, 50, 10, 31, 58, 3, 45, 35, 27, 43, 5, 49, 33, 9, 42, 19, 29,
    28, 14, 39, 12, 38, 41, 13, 37, 48, 7, 16, 24, 55, 40, 61, 26, 17, 0, 1, 60, 51, 30, 4, 22, 25,
    54, 21, 56, 59, 6, 63, 57, 62, 11, 36, 20, 34, 44, 52,
];

pub const MIXIN_KEY_LEN: usize = 32;

/// Characters the web client drops from every value before hashing.
pub const FILTERED_CHARS: [char; 5] = ['!', '\'', '(', ')', '*'];

// Short fragments give an empty key, i.e. signing unavailable.
pub fn mixin_key(img_key: &str, sub_key: &str) -> String {
    let source: Vec<char> = img_key.chars().chain(sub_key.chars()).collect();
    if source.len() < MIXIN_KEY_ENC_TAB.len() {
        return String::new();
    }
    MIXIN_KEY_ENC_TAB
        .iter()
        .take(MIXIN_KEY_LEN)
        .map(|&index| source[index])
        .collect()
}

pub fn filter_value(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !FILTERED_CHARS.contains(ch))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedParams {
    params: BTreeMap<String, String>,
    w_rid: Option<String>,
}

impl SignedParams {
    pub fn unsigned<K, V, I>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Display,
    {
        Self {
            params: params
                .into_iter()
                .map(|(key, value)| (key.into(), value.to_string()))
                .collect(),
            w_rid: None,
        }
    }

    pub fn is_signed(&self) -> bool {
        self.w_rid.is_some()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        if key == "w_rid" {
            return self.w_rid.as_deref();
        }
        self.params.get(key).map(String::as_str)
    }

    pub fn w_rid(&self) -> Option<&str> {
        self.w_rid.as_deref()
    }

    pub fn wts(&self) -> Option<i64> {
        self.params.get("wts").and_then(|value| value.parse().ok())
    }

    pub fn len(&self) -> usize {
        self.params.len() + usize::from(self.w_rid.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The prefix before `&w_rid=` is byte-identical to the string that was hashed.
    pub fn to_query_string(&self) -> String {
        let mut query = encode_query(&self.params);
        if let Some(w_rid) = &self.w_rid {
            if !query.is_empty() {
                query.push('&');
            }
            query.push_str("w_rid=");
            query.push_str(w_rid);
        }
        query
    }
}

pub fn sign_params<K, V, I>(params: I, mixin_key: &str, wts: i64) -> SignedParams
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Display,
{
    if mixin_key.is_empty() {
        return SignedParams::unsigned(params);
    }

    let mut sorted: BTreeMap<String, String> = params
        .into_iter()
        .map(|(key, value)| (key.into(), filter_value(&value.to_string())))
        .collect();
    sorted.insert("wts".to_string(), wts.to_string());

    let query = encode_query(&sorted);
    let mut hasher = Md5::new();
    hasher.update(query.as_bytes());
    hasher.update(mixin_key.as_bytes());
    let w_rid = hex::encode(hasher.finalize());

    SignedParams {
        params: sorted,
        w_rid: Some(w_rid),
    }
}

fn encode_query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}
