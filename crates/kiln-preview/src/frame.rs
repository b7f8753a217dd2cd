/// Scripts may run; same-origin, forms, popups and top navigation stay off.
pub const SANDBOX_FLAGS: &str = "allow-scripts";

/// Header form of the same restriction, for serving the document directly.
pub const CSP_SANDBOX: &str = "sandbox allow-scripts";

/// Wrap a preview document in a sandboxed inline frame.
pub fn sandbox_frame(document: &str) -> String {
    format!(
        r#"<iframe title="Component Preview" sandbox="{SANDBOX_FLAGS}" style="width:100%;height:100%;border:0" srcdoc="{}"></iframe>"#,
        escape_attr(document)
    )
}

fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + s.len() / 8);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn srcdoc_is_escaped_and_sandboxed() {
        let frame = sandbox_frame(r#"<p class="x">a & b</p>"#);
        assert!(frame.contains(r#"sandbox="allow-scripts""#));
        assert!(!frame.contains("allow-same-origin"));
        assert!(frame.contains("srcdoc=\"&lt;p class=&quot;x&quot;&gt;a &amp; b&lt;/p&gt;\""));
    }
}
