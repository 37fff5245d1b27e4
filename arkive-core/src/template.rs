//! Lightweight `{name}` placeholder substitution.
//!
//! Used for the invitation email body, the mailing-list payload, and the
//! default collection description. Unknown placeholders are left untouched.

/// Substitute `{name}` placeholders in `template` with the given values.
pub fn render_placeholders(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in vars {
        out = out.replace(&format!("{{{name}}}"), value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_named_placeholders() {
        let rendered = render_placeholders(
            "Hi {name}, visit {host}/register?invite={invite}",
            &[("name", "Alice"), ("host", "example.org"), ("invite", "abc")],
        );
        assert_eq!(rendered, "Hi Alice, visit example.org/register?invite=abc");
    }

    #[test]
    fn leaves_unknown_placeholders_alone() {
        let rendered = render_placeholders("{known} {unknown}", &[("known", "x")]);
        assert_eq!(rendered, "x {unknown}");
    }

    #[test]
    fn handles_repeated_placeholders() {
        let rendered =
            render_placeholders("{email} / {email}", &[("email", "a@b.com")]);
        assert_eq!(rendered, "a@b.com / a@b.com");
    }
}
