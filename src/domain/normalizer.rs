//! Parkiet 文本归一化管道
//!
//! Parkiet 模型期望的输入：全小写、数字写成文字、无缩写/URL，
//! 并以说话人标签（如 `[S1]`）开头。管道按固定顺序执行，
//! 说话人标签先被提取为占位符，结束时还原，保证中间变换
//! 不会破坏标签。

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::numerals::digits_to_words;

// 预编译正则（管道顺序敏感）
static RE_SPEAKER_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[S\d\]").unwrap());
static RE_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)https?://\S+").unwrap());
static RE_EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+@\S+\.\S+").unwrap());
static RE_ABBREV: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([A-Z]{2,})\b").unwrap());
static RE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d+([.,]\d+)?\b").unwrap());
static RE_SPECIAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s.,!?;:'\-()…]").unwrap());
static RE_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// 荷兰语字母读音表，用于拼读大写缩写
const LETTER_NAMES: [(&str, &str); 26] = [
    ("A", "aa"),
    ("B", "bee"),
    ("C", "cee"),
    ("D", "dee"),
    ("E", "ee"),
    ("F", "ef"),
    ("G", "gee"),
    ("H", "haa"),
    ("I", "ie"),
    ("J", "jee"),
    ("K", "kaa"),
    ("L", "el"),
    ("M", "em"),
    ("N", "en"),
    ("O", "oo"),
    ("P", "pee"),
    ("Q", "kuu"),
    ("R", "er"),
    ("S", "es"),
    ("T", "tee"),
    ("U", "uu"),
    ("V", "vee"),
    ("W", "wee"),
    ("X", "iks"),
    ("Y", "ij"),
    ("Z", "zet"),
];

fn letter_name(ch: char) -> String {
    let upper = ch.to_string();
    LETTER_NAMES
        .iter()
        .find(|(l, _)| *l == upper)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| ch.to_lowercase().to_string())
}

/// 拼读大写缩写：PZC -> pee zet cee
fn expand_abbreviation(caps: &Captures) -> String {
    caps[1]
        .chars()
        .map(letter_name)
        .collect::<Vec<_>>()
        .join(" ")
}

/// 数字转荷兰语文字，失败时保留原始数字
fn number_to_dutch(caps: &Captures) -> String {
    let raw = &caps[0];
    digits_to_words(raw).unwrap_or_else(|| raw.to_string())
}

/// 为 Parkiet 归一化文本
///
/// 管道顺序（顺序不可调换）：
/// 1. 提取说话人标签为占位符
/// 2. URL / 邮箱替换为固定读法
/// 3. 拼读大写缩写（必须在 lowercase 之前，匹配是大小写敏感的）
/// 4. 数字转荷兰语文字
/// 5. 全小写
/// 6. 删除允许列表之外的字符（emoji 等）
/// 7. 折叠连续空白
/// 8. 还原说话人标签
pub fn normalize_for_parkiet(text: &str) -> String {
    let mut tags: Vec<String> = Vec::new();
    let mut text = RE_SPEAKER_TAG
        .replace_all(text, |caps: &Captures| {
            tags.push(caps[0].to_string());
            format!("__tag{}__", tags.len() - 1)
        })
        .into_owned();

    text = RE_URL.replace_all(&text, "link").into_owned();
    text = RE_EMAIL.replace_all(&text, "e-mailadres").into_owned();
    text = RE_ABBREV.replace_all(&text, expand_abbreviation).into_owned();
    text = RE_NUMBER.replace_all(&text, number_to_dutch).into_owned();

    text = text.to_lowercase();
    text = RE_SPECIAL.replace_all(&text, "").into_owned();
    text = RE_SPACES.replace_all(&text, " ").trim().to_string();

    for (i, tag) in tags.iter().enumerate() {
        text = text.replace(&format!("__tag{}__", i), tag);
    }

    text
}

/// 文本是否已以说话人标签开头
pub fn starts_with_speaker_tag(text: &str) -> bool {
    text.trim_start().starts_with("[S")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idempotent_on_plain_text() {
        // 已归一化的文本只做空白折叠
        let text = "hallo wereld, dit is een test.";
        assert_eq!(normalize_for_parkiet(text), text);
    }

    #[test]
    fn test_whitespace_collapsed() {
        assert_eq!(normalize_for_parkiet("  hallo   wereld  "), "hallo wereld");
    }

    #[test]
    fn test_abbreviation_expanded() {
        let result = normalize_for_parkiet("zie PZC voor info");
        assert!(result.contains("pee zet cee"), "got: {}", result);
        assert!(!result.contains("PZC"));
    }

    #[test]
    fn test_speaker_tag_preserved() {
        let result = normalize_for_parkiet("[S1] Hallo PZC");
        assert!(result.starts_with("[S1]"), "got: {}", result);
        assert!(result.contains("pee zet cee"));
    }

    #[test]
    fn test_url_and_email_replaced() {
        let result = normalize_for_parkiet("kijk op https://pzc.nl of mail info@pzc.nl dus");
        assert!(result.contains("link"));
        assert!(result.contains("e-mailadres"));
        assert!(!result.contains("https"));
    }

    #[test]
    fn test_numbers_to_dutch_words() {
        let result = normalize_for_parkiet("het jaar 2026");
        assert_eq!(result, "het jaar tweeduizend zesentwintig");
    }

    #[test]
    fn test_phone_number_digits() {
        // 电话号码作为一个整数读出（与原始数字语义一致即可，不得崩溃）
        let result = normalize_for_parkiet("Bel 06 nu");
        assert_eq!(result, "bel zes nu");
    }

    #[test]
    fn test_decimal_comma() {
        let result = normalize_for_parkiet("temperatuur 12,5 graden");
        assert_eq!(result, "temperatuur twaalf komma vijf graden");
    }

    #[test]
    fn test_overflow_left_unchanged() {
        // 超出范围的数字保持原样（不得 panic）
        let result = normalize_for_parkiet("code 99999999999999999999 einde");
        assert!(result.contains("99999999999999999999"));
    }

    #[test]
    fn test_emoji_stripped() {
        let result = normalize_for_parkiet("hallo 🎉 wereld");
        assert_eq!(result, "hallo wereld");
    }

    #[test]
    fn test_lowercased() {
        assert_eq!(normalize_for_parkiet("Hallo Wereld"), "hallo wereld");
    }

    #[test]
    fn test_starts_with_speaker_tag() {
        assert!(starts_with_speaker_tag("[S1] hallo"));
        assert!(starts_with_speaker_tag("  [S2] hallo"));
        assert!(!starts_with_speaker_tag("hallo [S1]"));
    }
}
