use super::{parse_path, Locator, Strategy, TextMatch};

const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";

pub(super) fn compile(locator: &Locator, scoped: bool) -> String {
    let axis = if scoped { ".//" } else { "//" };
    match locator.strategy {
        Strategy::Structure => {
            let steps: Vec<String> = parse_path(locator.pattern)
                .iter()
                .map(|step| {
                    let mut expr = node_test(&step.tag);
                    for class in &step.classes {
                        expr.push_str(&format!(
                            "[contains(concat(' ', normalize-space(@class), ' '), {})]",
                            literal(&format!(" {class} "))
                        ));
                    }
                    expr
                })
                .collect();
            format!("{axis}{}", steps.join("//"))
        }
        Strategy::Attribute(name) => format!(
            "{axis}{}[contains(@{name}, {})]",
            node_test(locator.tag),
            literal(locator.pattern)
        ),
        Strategy::Text(how) => {
            let own = "normalize-space(text())";
            let folded = format!("translate({own}, '{UPPER}', '{LOWER}')");
            let lowered = locator.pattern.to_ascii_lowercase();
            let predicate = match how {
                TextMatch::Exact => format!("{own}={}", literal(locator.pattern)),
                TextMatch::ExactIgnoreCase => format!("{folded}={}", literal(&lowered)),
                TextMatch::Contains => format!("contains({own}, {})", literal(locator.pattern)),
                TextMatch::ContainsIgnoreCase => {
                    format!("contains({folded}, {})", literal(&lowered))
                }
            };
            format!("{axis}{}[{predicate}]", node_test(locator.tag))
        }
    }
}

/// `"*"`, `"a"` or `"*[self::a or self::button]"` for `"a|button"`.
fn node_test(tag: &str) -> String {
    if !tag.contains('|') {
        return tag.to_string();
    }
    let alternatives: Vec<String> = tag.split('|').map(|t| format!("self::{t}")).collect();
    format!("*[{}]", alternatives.join(" or "))
}

/// Quotes `value` as an `XPath` string literal. `XPath` 1.0 has no escape
/// sequences, so values holding both quote kinds go through `concat()`.
fn literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{value}'");
    }
    if !value.contains('"') {
        return format!("\"{value}\"");
    }
    let parts: Vec<String> = value
        .split('\'')
        .map(|part| format!("'{part}'"))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}
