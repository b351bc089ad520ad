pub(crate) fn normalize_playlist_name(name: &str) -> String {
    let unified = name
        .to_lowercase()
        .chars()
        .map(|ch| match ch {
            '\u{2013}' | '\u{2014}' | '\u{2212}' => '-',
            '\u{2019}' => '\'',
            other => other,
        })
        .collect::<String>();
    let collapsed = unified.split_whitespace().collect::<Vec<_>>().join(" ");

    collapsed
        .split('-')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(" - ")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dash_glyphs_and_case_compare_equal() {
        assert_eq!(
            normalize_playlist_name("Foo — Bar"),
            normalize_playlist_name("foo - bar")
        );
        assert_eq!(normalize_playlist_name("Foo–Bar"), "foo - bar");
        assert_eq!(normalize_playlist_name("Foo \u{2212}  Bar"), "foo - bar");
    }

    #[test]
    fn collapses_whitespace_and_quotes() {
        assert_eq!(
            normalize_playlist_name("  Rock\tList   -  Top 5 je Band "),
            "rock list - top 5 je band"
        );
        assert_eq!(normalize_playlist_name("Guns N’ Roses"), "guns n' roses");
    }

    #[test]
    fn is_idempotent() {
        for raw in ["Metal — Top 5 je Band", "a-b-c", "x -", "- lead", "plain"] {
            let once = normalize_playlist_name(raw);
            assert_eq!(normalize_playlist_name(&once), once, "input: {raw}");
        }
    }
}
