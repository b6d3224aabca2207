//! 荷兰语数字转文字
//!
//! 将整数和小数（逗号为小数分隔符）转换为荷兰语读法，
//! 供 Parkiet 文本归一化管道使用。
//!
//! 荷兰语组合规则：个位在前，十位在后，中间加 "en"
//! （元音冲突时写作 "ën"）：21 -> eenentwintig, 22 -> tweeëntwintig
//! 2026 -> tweeduizend zesentwintig

/// 支持的最大数值（千亿级，超出返回 None，调用方保留原始数字）
const MAX_SUPPORTED: i64 = 999_999_999_999;

const UNITS: [&str; 20] = [
    "nul", "een", "twee", "drie", "vier", "vijf", "zes", "zeven", "acht", "negen", "tien", "elf",
    "twaalf", "dertien", "veertien", "vijftien", "zestien", "zeventien", "achttien", "negentien",
];

const TENS: [&str; 10] = [
    "", "", "twintig", "dertig", "veertig", "vijftig", "zestig", "zeventig", "tachtig", "negentig",
];

/// 个位词以元音结尾时，"en" 需要写成 "ën"（twee + en -> tweeën）
fn ends_with_vowel(word: &str) -> bool {
    matches!(word.chars().last(), Some('a' | 'e' | 'i' | 'o' | 'u'))
}

/// 0-99 的读法
fn under_hundred(n: i64) -> String {
    debug_assert!((0..100).contains(&n));
    if n < 20 {
        return UNITS[n as usize].to_string();
    }
    let tens = TENS[(n / 10) as usize];
    let unit = n % 10;
    if unit == 0 {
        tens.to_string()
    } else {
        let unit_word = UNITS[unit as usize];
        let joiner = if ends_with_vowel(unit_word) { "ën" } else { "en" };
        format!("{}{}{}", unit_word, joiner, tens)
    }
}

/// 0-999 的读法
fn under_thousand(n: i64) -> String {
    debug_assert!((0..1000).contains(&n));
    if n < 100 {
        return under_hundred(n);
    }
    let hundreds = n / 100;
    let rest = n % 100;
    // "honderd" 前省略 "een"（100 -> honderd, 200 -> tweehonderd）
    let prefix = if hundreds == 1 {
        "honderd".to_string()
    } else {
        format!("{}honderd", UNITS[hundreds as usize])
    };
    if rest == 0 {
        prefix
    } else {
        format!("{}{}", prefix, under_hundred(rest))
    }
}

/// 将整数转换为荷兰语文字
///
/// 超出支持范围时返回 None。
pub fn number_to_words(n: i64) -> Option<String> {
    if !(-MAX_SUPPORTED..=MAX_SUPPORTED).contains(&n) {
        return None;
    }
    if n < 0 {
        return Some(format!("min {}", number_to_words(-n)?));
    }
    if n < 1000 {
        return Some(under_thousand(n));
    }

    let mut parts: Vec<String> = Vec::new();
    let billions = n / 1_000_000_000;
    let millions = (n / 1_000_000) % 1000;
    let thousands = (n / 1000) % 1000;
    let rest = n % 1000;

    if billions > 0 {
        // "miljard" 前保留 "een"（een miljard）
        parts.push(format!("{} miljard", under_thousand(billions)));
    }
    if millions > 0 {
        parts.push(format!("{} miljoen", under_thousand(millions)));
    }
    if thousands > 0 {
        // "duizend" 前省略 "een"（1000 -> duizend, 2000 -> tweeduizend）
        if thousands == 1 {
            parts.push("duizend".to_string());
        } else {
            parts.push(format!("{}duizend", under_thousand(thousands)));
        }
    }
    if rest > 0 {
        parts.push(under_thousand(rest));
    }

    Some(parts.join(" "))
}

/// 将数字字符串（整数或逗号小数）转换为荷兰语文字
///
/// 小数部分逐位读出："12,5" -> "twaalf komma vijf"。
/// 解析失败（溢出、格式错误）返回 None，调用方保留原始数字。
pub fn digits_to_words(raw: &str) -> Option<String> {
    let (int_part, frac_part) = match raw.split_once(&[',', '.'][..]) {
        Some((i, f)) => (i, Some(f)),
        None => (raw, None),
    };

    let n: i64 = int_part.parse().ok()?;
    let mut words = number_to_words(n)?;

    if let Some(frac) = frac_part {
        if frac.is_empty() || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        words.push_str(" komma");
        for digit in frac.bytes() {
            words.push(' ');
            words.push_str(UNITS[(digit - b'0') as usize]);
        }
    }

    Some(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_and_teens() {
        assert_eq!(number_to_words(0).unwrap(), "nul");
        assert_eq!(number_to_words(1).unwrap(), "een");
        assert_eq!(number_to_words(12).unwrap(), "twaalf");
        assert_eq!(number_to_words(19).unwrap(), "negentien");
    }

    #[test]
    fn test_compound_tens() {
        // 个位在前 + en + 十位
        assert_eq!(number_to_words(21).unwrap(), "eenentwintig");
        assert_eq!(number_to_words(47).unwrap(), "zevenenveertig");
        // 元音冲突用 ë
        assert_eq!(number_to_words(22).unwrap(), "tweeëntwintig");
        assert_eq!(number_to_words(33).unwrap(), "drieëndertig");
    }

    #[test]
    fn test_hundreds() {
        assert_eq!(number_to_words(100).unwrap(), "honderd");
        assert_eq!(number_to_words(101).unwrap(), "honderdeen");
        assert_eq!(number_to_words(250).unwrap(), "tweehonderdvijftig");
    }

    #[test]
    fn test_thousands() {
        assert_eq!(number_to_words(1000).unwrap(), "duizend");
        assert_eq!(number_to_words(2026).unwrap(), "tweeduizend zesentwintig");
        assert_eq!(
            number_to_words(12345).unwrap(),
            "twaalfduizend driehonderdvijfenveertig"
        );
    }

    #[test]
    fn test_millions_and_negative() {
        assert_eq!(number_to_words(1_000_000).unwrap(), "een miljoen");
        assert_eq!(number_to_words(-8).unwrap(), "min acht");
    }

    #[test]
    fn test_out_of_range() {
        assert!(number_to_words(i64::MAX).is_none());
    }

    #[test]
    fn test_decimal_with_comma() {
        assert_eq!(digits_to_words("12,5").unwrap(), "twaalf komma vijf");
        assert_eq!(digits_to_words("0,25").unwrap(), "nul komma twee vijf");
    }

    #[test]
    fn test_malformed_digits() {
        assert!(digits_to_words("12,").is_none());
        assert!(digits_to_words("99999999999999999999").is_none());
    }
}
