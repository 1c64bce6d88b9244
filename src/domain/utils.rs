/// Renders symbol names as a Python list literal, e.g. `["a", "b"]`. The
/// output doubles as JSON, which keeps suggestion lines machine-readable.
pub fn format_symbol_list<S: AsRef<str>>(names: &[S]) -> String {
    let quoted = names
        .iter()
        .map(|n| format!("{:?}", n.as_ref()))
        .collect::<Vec<_>>();
    format!("[{}]", quoted.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_list_is_python_syntax() {
        assert_eq!(format_symbol_list(&["a", "b"]), r#"["a", "b"]"#);
        assert_eq!(format_symbol_list::<&str>(&[]), "[]");
    }

    #[test]
    fn symbol_list_escapes_quotes() {
        assert_eq!(format_symbol_list(&[r#"we"ird"#]), r#"["we\"ird"]"#);
    }
}
