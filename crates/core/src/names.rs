use once_cell::sync::Lazy;
use regex::Regex;

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([1-9][0-9]{7}_[0-9]{6})").expect("failed to compile token regex")
});

static IMG_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^IMG[-_]([1-9][0-9]{7}_[0-9]{6})").expect("failed to compile IMG regex")
});

static MARKED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z]_").expect("failed to compile marker regex"));

const MARKER_LEN: usize = 2;
const IMG_PREFIX_LEN: usize = 4;

/// ファイル名の分類結果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tier {
    /// 既に `YYYYMMDD_HHMMSS` で始まっている
    Canonical { token: String },
    /// `IMG_`/`IMG-` を外すだけで正規名になる
    ImgPrefixed { new_name: String },
    NeedsDerivation,
}

pub fn classify(unmarked_name: &str, name: &str) -> Tier {
    if let Some(token) = leading_token(unmarked_name) {
        return Tier::Canonical {
            token: token.to_string(),
        };
    }
    if let Some(new_name) = strip_img_prefix(name) {
        return Tier::ImgPrefixed {
            new_name: new_name.to_string(),
        };
    }
    Tier::NeedsDerivation
}

pub fn leading_token(name: &str) -> Option<&str> {
    TOKEN_RE
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

pub fn is_marked(name: &str) -> bool {
    MARKED_RE.is_match(name)
}

pub fn strip_marker(name: &str) -> &str {
    if is_marked(name) {
        &name[MARKER_LEN..]
    } else {
        name
    }
}

pub fn mark_name(mark: char, name: &str) -> String {
    format!("{mark}_{name}")
}

pub fn is_valid_mark(mark: char) -> bool {
    mark.is_ascii_lowercase()
}

pub fn is_img_prefixed(name: &str) -> bool {
    IMG_TOKEN_RE.is_match(name)
}

pub fn strip_img_prefix(name: &str) -> Option<&str> {
    if is_img_prefixed(name) {
        Some(&name[IMG_PREFIX_LEN..])
    } else {
        None
    }
}

pub fn derived_name(token: &str, name: &str) -> String {
    format!("{token}-{name}")
}
