//! SQL identifier quoting for `_qualified_table`.

use std::borrow::Cow;

/// Keywords that force quoting (reserved, column-name and type/function-name
/// categories). Sorted for binary search.
const QUOTED_KEYWORDS: &[&str] = &[
    "all", "analyse", "analyze", "and", "any", "array", "as", "asc", "asymmetric",
    "authorization", "between", "bigint", "binary", "bit", "boolean", "both", "case", "cast",
    "char", "character", "check", "coalesce", "collate", "collation", "column", "concurrently",
    "constraint", "create", "cross", "current_catalog", "current_date", "current_role",
    "current_schema", "current_time", "current_timestamp", "current_user", "dec", "decimal",
    "default", "deferrable", "desc", "distinct", "do", "else", "end", "except", "exists",
    "extract", "false", "fetch", "float", "for", "foreign", "freeze", "from", "full", "grant",
    "greatest", "group", "grouping", "having", "ilike", "in", "initially", "inner", "inout",
    "int", "integer", "intersect", "interval", "into", "is", "isnull", "join", "json_array",
    "json_arrayagg", "json_exists", "json_object", "json_objectagg", "json_query",
    "json_scalar", "json_serialize", "json_table", "json_value", "lateral", "leading", "least",
    "left", "like", "limit", "localtime", "localtimestamp", "merge_action", "national",
    "natural", "nchar", "none", "normalize", "not", "notnull", "null", "nullif", "numeric",
    "offset", "on", "only", "or", "order", "out", "outer", "overlaps", "overlay", "placing",
    "position", "precision", "primary", "real", "references", "returning", "right", "row",
    "select", "session_user", "setof", "similar", "smallint", "some", "substring", "symmetric",
    "system_user", "table", "tablesample", "then", "time", "timestamp", "to", "trailing",
    "treat", "trim", "true", "union", "unique", "user", "using", "values", "varchar",
    "variadic", "verbose", "when", "where", "window", "with", "xmlattributes", "xmlconcat",
    "xmlelement", "xmlexists", "xmlforest", "xmlnamespaces", "xmlparse", "xmlpi", "xmlroot",
    "xmlserialize", "xmltable",
];

fn is_safe_ident(ident: &str) -> bool {
    let mut bytes = ident.bytes();
    let starts_ok = matches!(bytes.next(), Some(b'a'..=b'z' | b'_'));
    starts_ok
        && bytes.all(|b| matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'_'))
        && QUOTED_KEYWORDS.binary_search(&ident).is_err()
}

/// Quote an identifier only when it would not survive unquoted: upper-case
/// or special characters, a leading digit, or a keyword.
pub fn quote_identifier(ident: &str) -> Cow<'_, str> {
    if is_safe_ident(ident) {
        Cow::Borrowed(ident)
    } else {
        Cow::Owned(format!("\"{}\"", ident.replace('"', "\"\"")))
    }
}

/// Quote a schema-qualified name, e.g. `public.orders` or `"Sales"."Q1"`.
pub fn quote_qualified_identifier(schema: &str, name: &str) -> String {
    format!("{}.{}", quote_identifier(schema), quote_identifier(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_sorted() {
        assert!(QUOTED_KEYWORDS.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_plain_identifiers_unquoted() {
        assert_eq!(quote_identifier("orders"), "orders");
        assert_eq!(quote_identifier("_private"), "_private");
        assert_eq!(quote_identifier("t1"), "t1");
    }

    #[test]
    fn test_identifiers_needing_quotes() {
        assert_eq!(quote_identifier("Orders"), "\"Orders\"");
        assert_eq!(quote_identifier("1st"), "\"1st\"");
        assert_eq!(quote_identifier("my table"), "\"my table\"");
        assert_eq!(quote_identifier(""), "\"\"");
        assert_eq!(quote_identifier("my\"table"), "\"my\"\"table\"");
    }

    #[test]
    fn test_keywords_quoted() {
        assert_eq!(quote_identifier("user"), "\"user\"");
        assert_eq!(quote_identifier("select"), "\"select\"");
        assert_eq!(quote_identifier("order"), "\"order\"");
        assert_eq!(quote_identifier("orders"), "orders");
    }

    #[test]
    fn test_sql_json_keywords_quoted() {
        for kw in ["json_array", "json_object", "json_table", "json_value", "merge_action"] {
            assert_eq!(quote_identifier(kw), format!("\"{kw}\""));
        }
        assert_eq!(quote_identifier("json"), "json");
        assert_eq!(quote_identifier("json_data"), "json_data");
    }

    #[test]
    fn test_quote_qualified() {
        assert_eq!(quote_qualified_identifier("public", "orders"), "public.orders");
        assert_eq!(
            quote_qualified_identifier("Sales", "user"),
            "\"Sales\".\"user\""
        );
    }
}
