// src/common/csv.rs
//
// Helpers mínimos para os exports administrativos em CSV.

/// Escapa um campo conforme o RFC 4180: aspas duplas em volta quando o valor
/// contém vírgula, aspas ou quebra de linha.
pub fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Acrescenta uma linha ao buffer, já escapada e terminada em CRLF.
pub fn push_row(buf: &mut String, fields: &[&str]) {
    let row: Vec<String> = fields.iter().map(|f| escape(f)).collect();
    buf.push_str(&row.join(","));
    buf.push_str("\r\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_fields_pass_through() {
        assert_eq!(escape("abc"), "abc");
        assert_eq!(escape(""), "");
    }

    #[test]
    fn special_chars_are_quoted() {
        assert_eq!(escape("a,b"), "\"a,b\"");
        assert_eq!(escape("a\"b"), "\"a\"\"b\"");
        assert_eq!(escape("a\nb"), "\"a\nb\"");
    }

    #[test]
    fn rows_end_with_crlf() {
        let mut buf = String::new();
        push_row(&mut buf, &["uid", "customer, name"]);
        assert_eq!(buf, "uid,\"customer, name\"\r\n");
    }
}
