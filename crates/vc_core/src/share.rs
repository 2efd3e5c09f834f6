//! Links a recipient hands out so others can confess to them.

use url::Url;

/// `<base>/confess/<recipient_id>`, with the display name as a `name` query
/// parameter when given.
pub fn confess_link(
    base_url: &str,
    recipient_id: &str,
    display_name: Option<&str>,
) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(base_url)?;
    url.path_segments_mut()
        .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .pop_if_empty()
        .extend(["confess", recipient_id]);
    if let Some(name) = display_name.map(str::trim).filter(|n| !n.is_empty()) {
        url.query_pairs_mut().append_pair("name", name);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_link() {
        let url = confess_link("https://confess.example", "u123", None).unwrap();
        assert_eq!(url.as_str(), "https://confess.example/confess/u123");
    }

    #[test]
    fn trailing_slash_and_name() {
        let url = confess_link("https://confess.example/app/", "u123", Some("Ada L")).unwrap();
        assert_eq!(url.as_str(), "https://confess.example/app/confess/u123?name=Ada+L");
    }

    #[test]
    fn recipient_id_is_escaped() {
        let url = confess_link("https://confess.example", "a/b", Some("  ")).unwrap();
        assert_eq!(url.as_str(), "https://confess.example/confess/a%2Fb");
    }

    #[test]
    fn rejects_non_url_base() {
        assert!(confess_link("not a url", "u123", None).is_err());
        assert!(confess_link("mailto:someone@example.com", "u123", None).is_err());
    }
}
