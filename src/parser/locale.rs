// ==========================================
// 期刊文章导入 - 语言区域解析
// ==========================================
// 输入: 元数据中的 xml:lang / Language 属性（如 "en"、"FR"、"fr_FR"）
// 输出: 目标系统的 locale（如 "en_US"）
// 规则: 合法 locale 原样使用；否则小写后换算 ISO-639-3，
//       与期刊主语言同语种时取主语言，否则取该语种的第一个 locale；
//       空值或无法识别时取期刊主语言
// ==========================================

/// (locale, ISO-639-1, ISO-639-3)
const LOCALES: &[(&str, &str, &str)] = &[
    ("ar_IQ", "ar", "ara"),
    ("ca_ES", "ca", "cat"),
    ("cs_CZ", "cs", "ces"),
    ("da_DK", "da", "dan"),
    ("de_DE", "de", "deu"),
    ("el_GR", "el", "ell"),
    ("en_US", "en", "eng"),
    ("es_ES", "es", "spa"),
    ("eu_ES", "eu", "eus"),
    ("fa_IR", "fa", "fas"),
    ("fi_FI", "fi", "fin"),
    ("fr_CA", "fr", "fra"),
    ("fr_FR", "fr", "fra"),
    ("gl_ES", "gl", "glg"),
    ("he_IL", "he", "heb"),
    ("hr_HR", "hr", "hrv"),
    ("hu_HU", "hu", "hun"),
    ("id_ID", "id", "ind"),
    ("it_IT", "it", "ita"),
    ("ja_JP", "ja", "jpn"),
    ("ka_GE", "ka", "kat"),
    ("ko_KR", "ko", "kor"),
    ("ms_MY", "ms", "msa"),
    ("nb_NO", "nb", "nob"),
    ("nl_NL", "nl", "nld"),
    ("pl_PL", "pl", "pol"),
    ("pt_BR", "pt", "por"),
    ("pt_PT", "pt", "por"),
    ("ro_RO", "ro", "ron"),
    ("ru_RU", "ru", "rus"),
    ("sl_SI", "sl", "slv"),
    ("sv_SE", "sv", "swe"),
    ("tr_TR", "tr", "tur"),
    ("uk_UA", "uk", "ukr"),
    ("vi_VN", "vi", "vie"),
    ("zh_CN", "zh", "zho"),
];

pub fn is_valid_locale(locale: &str) -> bool {
    LOCALES.iter().any(|(code, _, _)| *code == locale)
}

fn iso3_from_iso1(iso1: &str) -> Option<&'static str> {
    LOCALES
        .iter()
        .find(|(_, code, _)| *code == iso1)
        .map(|(_, _, iso3)| *iso3)
}

/// 取 locale 的语言部分（前两个字符）换算 ISO-639-3
fn iso3_from_locale(locale: &str) -> Option<&'static str> {
    let language = locale.get(..2)?.to_lowercase();
    iso3_from_iso1(&language)
}

fn locale_from_iso3(iso3: &str) -> Option<&'static str> {
    LOCALES
        .iter()
        .find(|(_, _, code)| *code == iso3)
        .map(|(locale, _, _)| *locale)
}

/// locale 对应的 ISO-639-1 语言代码
pub fn iso1_from_locale(locale: &str) -> Option<&'static str> {
    LOCALES
        .iter()
        .find(|(code, _, _)| *code == locale)
        .map(|(_, iso1, _)| *iso1)
}

/// 解析元数据中的语言标记
///
/// # 参数
/// - raw: 原始属性值（None/空 → 主语言）
/// - primary: 期刊主语言
pub fn resolve_locale(raw: Option<&str>, primary: &str) -> String {
    let raw = match raw.map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => raw,
        None => return primary.to_string(),
    };
    if is_valid_locale(raw) {
        return raw.to_string();
    }

    let lowered = raw.to_lowercase();
    let iso3 = iso3_from_iso1(&lowered).or_else(|| iso3_from_locale(&lowered));
    match iso3 {
        Some(iso3) if iso3_from_locale(primary) == Some(iso3) => primary.to_string(),
        Some(iso3) => locale_from_iso3(iso3).unwrap_or(primary).to_string(),
        None => primary.to_string(),
    }
}
