/// Shortens long identifiers to `first8...last9`; texts of ten characters or
/// fewer are returned as is.
pub fn abbr_center(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= 10 {
        return text.to_owned();
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 9..].iter().collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::abbr_center;

    #[test]
    fn short_text_untouched() {
        assert_eq!(abbr_center(""), "");
        assert_eq!(abbr_center("0123456789"), "0123456789");
    }

    #[test]
    fn address_is_abbreviated() {
        assert_eq!(
            abbr_center("0x52908400098527886E0F7030069857D2E4169EE7"),
            "0x529084...2E4169EE7"
        );
    }
}
