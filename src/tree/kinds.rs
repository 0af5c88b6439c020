//! Mapping between TypeScript compiler-API node names (the vocabulary the
//! path expressions are written in) and tree-sitter grammar kinds.
//!
//! Everything that names a grammar kind lives here; the rest of the crate
//! speaks compiler-API names or consults these predicates.

/// Grammar kinds a compiler-API node name resolves to, or `None` for an
/// unknown name.
pub fn grammar_kinds(name: &str) -> Option<&'static [&'static str]> {
    let kinds: &'static [&'static str] = match name {
        "SourceFile" => &["program"],
        "FunctionDeclaration" => &["function_declaration"],
        "MethodDeclaration" => &["method_definition"],
        "ClassDeclaration" => &["class_declaration"],
        // `namespace N {}` and `module N {}`; kind names drifted across
        // grammar releases, so match the whole family.
        "ModuleDeclaration" => &["internal_module", "module", "namespace_declaration", "module_declaration"],
        "ModuleBlock" => &["statement_block"],
        "CallExpression" => &["call_expression"],
        "PropertyAccessExpression" => &["member_expression"],
        "Identifier" => &["identifier", "property_identifier", "type_identifier"],
        "StringLiteral" => &["string"],
        "ImportDeclaration" => &["import_statement"],
        "Parameter" => &["required_parameter", "optional_parameter"],
        "OpenParenToken" => &["("],
        "CloseParenToken" => &[")"],
        "ExportKeyword" => &["export"],
        _ => return None,
    };
    Some(kinds)
}

pub fn matches(name: &str, grammar_kind: &str) -> bool {
    grammar_kinds(name).is_some_and(|kinds| kinds.contains(&grammar_kind))
}

/// Wrapper kinds that are flattened away on the child axis so that the paren
/// tokens of a parameter list or argument list read as direct children of
/// the declaration or call, the way the compiler API presents them.
pub fn is_transparent(grammar_kind: &str) -> bool {
    matches!(grammar_kind, "formal_parameters" | "arguments")
}

pub fn is_function_declaration(grammar_kind: &str) -> bool {
    grammar_kind == "function_declaration"
}

pub fn is_method_declaration(grammar_kind: &str) -> bool {
    grammar_kind == "method_definition"
}

pub fn is_callable_declaration(grammar_kind: &str) -> bool {
    is_function_declaration(grammar_kind) || is_method_declaration(grammar_kind)
}

pub fn is_class_declaration(grammar_kind: &str) -> bool {
    grammar_kind == "class_declaration"
}

pub fn is_module_declaration(grammar_kind: &str) -> bool {
    matches("ModuleDeclaration", grammar_kind)
}

pub fn is_export_statement(grammar_kind: &str) -> bool {
    grammar_kind == "export_statement"
}

pub fn is_accessibility_modifier(grammar_kind: &str) -> bool {
    grammar_kind == "accessibility_modifier"
}

pub fn is_identifier(grammar_kind: &str) -> bool {
    matches("Identifier", grammar_kind)
}

pub fn is_parameter(grammar_kind: &str) -> bool {
    matches("Parameter", grammar_kind)
}

pub fn is_type_annotation(grammar_kind: &str) -> bool {
    grammar_kind == "type_annotation"
}

pub fn is_parameter_list(grammar_kind: &str) -> bool {
    grammar_kind == "formal_parameters"
}

pub fn is_property_access(grammar_kind: &str) -> bool {
    grammar_kind == "member_expression"
}

/// Normalized `@value` text for a node: string literals compare without their
/// quotes, property accesses compare whitespace-stripped, everything else
/// compares verbatim.
pub fn normalized_value(grammar_kind: &str, text: &str) -> String {
    match grammar_kind {
        "string" => text
            .trim_matches(|c| c == '"' || c == '\'' || c == '`')
            .to_string(),
        "member_expression" => text.chars().filter(|c| !c.is_whitespace()).collect(),
        _ => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_family_covers_type_and_property_positions() {
        assert!(matches("Identifier", "identifier"));
        assert!(matches("Identifier", "property_identifier"));
        assert!(matches("Identifier", "type_identifier"));
        assert!(!matches("Identifier", "string"));
    }

    #[test]
    fn unknown_names_do_not_resolve() {
        assert!(grammar_kinds("SpreadElement").is_none());
    }

    #[test]
    fn string_values_drop_quotes() {
        assert_eq!(normalized_value("string", "\"@scope/pkg\""), "@scope/pkg");
        assert_eq!(normalized_value("string", "'x'"), "x");
    }

    #[test]
    fn property_access_values_ignore_whitespace() {
        assert_eq!(normalized_value("member_expression", "Classy . thinger"), "Classy.thinger");
    }
}
