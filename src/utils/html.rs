//! 题库文本清洗
//!
//! 题库返回的题干和选项是未经处理的 HTML 片段。终端只能显示纯文本，
//! 所以这里去掉标签、解码实体，并删除控制字符（防止 ANSI 转义序列进入终端）。

use regex::{Captures, Regex};
use std::sync::OnceLock;

/// 常见命名实体
static NAMED_ENTITIES: phf::Map<&'static str, char> = phf::phf_map! {
    "amp" => '&',
    "lt" => '<',
    "gt" => '>',
    "quot" => '"',
    "apos" => '\'',
    "nbsp" => '\u{a0}',
    "shy" => '\u{ad}',
    "hellip" => '…',
    "ndash" => '–',
    "mdash" => '—',
    "lsquo" => '‘',
    "rsquo" => '’',
    "ldquo" => '“',
    "rdquo" => '”',
    "laquo" => '«',
    "raquo" => '»',
    "deg" => '°',
    "copy" => '©',
    "reg" => '®',
    "trade" => '™',
    "eacute" => 'é',
    "Eacute" => 'É',
    "egrave" => 'è',
    "ecirc" => 'ê',
    "aacute" => 'á',
    "agrave" => 'à',
    "acirc" => 'â',
    "auml" => 'ä',
    "Auml" => 'Ä',
    "aring" => 'å',
    "iacute" => 'í',
    "oacute" => 'ó',
    "ouml" => 'ö',
    "Ouml" => 'Ö',
    "uacute" => 'ú',
    "uuml" => 'ü',
    "Uuml" => 'Ü',
    "ntilde" => 'ñ',
    "ccedil" => 'ç',
    "szlig" => 'ß',
    "oslash" => 'ø',
    "pi" => 'π',
    "times" => '×',
    "divide" => '÷',
    "sup2" => '²',
    "sup3" => '³',
    "frac12" => '½',
    "micro" => 'µ',
    "euro" => '€',
    "pound" => '£',
};

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag regex is valid"))
}

fn entity_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"&(#[xX][0-9a-fA-F]{1,6}|#[0-9]{1,7}|[A-Za-z][A-Za-z0-9]{1,31});")
            .expect("entity regex is valid")
    })
}

/// 将题库 HTML 文本转换为可以安全显示在终端的纯文本
///
/// 先去标签再解码实体，这样 `&lt;script&gt;` 会变成字面文本而不会被当作标签。
pub fn to_plain_text(raw: &str) -> String {
    let without_tags = tag_regex().replace_all(raw, "");
    let decoded = decode_entities(&without_tags);
    decoded
        .chars()
        .filter(|c| !c.is_control() || *c == '\n')
        .collect()
}

/// 解码命名实体与数字实体，无法识别的原样保留
pub fn decode_entities(text: &str) -> String {
    entity_regex()
        .replace_all(text, |caps: &Captures| {
            let body = &caps[1];
            decode_entity(body).map_or_else(|| caps[0].to_string(), |c| c.to_string())
        })
        .into_owned()
}

fn decode_entity(body: &str) -> Option<char> {
    if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
        return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
    }
    if let Some(dec) = body.strip_prefix('#') {
        return dec.parse::<u32>().ok().and_then(char::from_u32);
    }
    NAMED_ENTITIES.get(body).copied()
}
