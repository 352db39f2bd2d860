//! Title translation with `{placeholder}` substitution

/// Turns a title template into display text
pub trait Translator {
    fn translate(&self, template: &str, replacements: &[(&str, &str)]) -> String;
}

/// Keeps templates as written, substituting placeholders only
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultTranslator;

impl Translator for DefaultTranslator {
    fn translate(&self, template: &str, replacements: &[(&str, &str)]) -> String {
        substitute(template, replacements)
    }
}

/// Replace every `{key}` with its value; unknown placeholders stay verbatim
pub fn substitute(template: &str, replacements: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        match after.find('}') {
            Some(close) => {
                let key = &after[..close];
                match replacements.iter().find(|(name, _)| *name == key) {
                    Some((_, value)) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}
