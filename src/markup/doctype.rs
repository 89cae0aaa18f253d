//! `!!!` declarations

const XHTML_TRANSITIONAL: &str = r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Transitional//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd">"#;
const XHTML_STRICT: &str = r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Strict//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd">"#;
const XHTML_FRAMESET: &str = r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Frameset//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-frameset.dtd">"#;
const HTML5: &str = "<!DOCTYPE html>";
const XHTML_11: &str = r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.1//EN" "http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd">"#;
const XHTML_BASIC: &str = r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML Basic 1.1//EN" "http://www.w3.org/TR/xhtml-basic/xhtml-basic11.dtd">"#;
const XHTML_MOBILE: &str = r#"<!DOCTYPE html PUBLIC "-//WAPFORUM//DTD XHTML Mobile 1.2//EN" "http://www.openmobilealliance.org/tech/DTD/xhtml-mobile12.dtd">"#;
const XML_UTF8: &str = "<?xml version='1.0' encoding='utf-8' ?>";
const XML_LATIN1: &str = "<?xml version='1.0' encoding='iso-8859-1' ?>";

/// Declaration for a doctype keyword, matched case-insensitively
pub fn declaration(keyword: &str) -> Option<&'static str> {
    let declaration = match keyword.trim().to_ascii_lowercase().as_str() {
        "" => XHTML_TRANSITIONAL,
        "strict" | "1.0" => XHTML_STRICT,
        "frameset" => XHTML_FRAMESET,
        "5" => HTML5,
        "1.1" => XHTML_11,
        "basic" => XHTML_BASIC,
        "mobile" => XHTML_MOBILE,
        "xml" => XML_UTF8,
        "xml iso-8859-1" => XML_LATIN1,
        _ => return None,
    };
    Some(declaration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_keywords() {
        assert_eq!(declaration("5"), Some("<!DOCTYPE html>"));
        assert_eq!(declaration("XML"), Some("<?xml version='1.0' encoding='utf-8' ?>"));
        assert_eq!(declaration("1.0"), declaration("Strict"));
        assert!(declaration("").unwrap().contains("Transitional"));
    }

    #[test]
    fn test_unknown_keyword() {
        assert_eq!(declaration("html6"), None);
    }
}
