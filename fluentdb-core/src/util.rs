use convert_case::{Case, Casing};

/// Table and column naming convention: `OrderItem` becomes `order_item`, `UserID` becomes `user_id`.
pub fn to_snake_case(name: &str) -> String {
    name.to_case(Case::Snake)
}

/// Is a bare or dotted identifier (`name`, `users.id`) rather than an SQL expression.
pub fn is_identifier(value: &str) -> bool {
    !value.is_empty()
        && value.split('.').all(|part| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

/// First 497 bytes of a query for logs, cut on a char boundary.
#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {{
        let query: &str = &$query;
        let mut end = ::std::cmp::min(query.len(), 497);
        while !query.is_char_boundary(end) {
            end -= 1;
        }
        format!(
            "{}{}",
            query[..end].trim_end(),
            if query.len() > end { "..." } else { "" },
        )
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_case_names() {
        assert_eq!(to_snake_case("User"), "user");
        assert_eq!(to_snake_case("OrderItem"), "order_item");
        assert_eq!(to_snake_case("UserID"), "user_id");
        assert_eq!(to_snake_case("created_at"), "created_at");
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("age"));
        assert!(is_identifier("users.id"));
        assert!(is_identifier("_hidden"));
        assert!(!is_identifier("COUNT(*)"));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier("a b"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn truncated() {
        let long = "é".repeat(300);
        let short = truncate_long!(long);
        assert!(short.ends_with("..."));
        assert_eq!(short.len(), 496 + 3);
        assert_eq!(truncate_long!("SELECT 1 "), "SELECT 1");
    }
}
