use chrono::{DateTime, FixedOffset};
use log::debug;

use super::{
    form::{ContractFormData, FieldName},
    functions::{self, Function},
};

/// Скомпилированный шаблон договора.
///
/// Шаблон это обычный текст с плейсхолдерами:
///  - `{{ tenant1_name }}` значение поля формы;
///  - `{{ special_terms:"Nothing." }}` значение поля или текст по-умолчанию, если поле пустое;
///  - `{{ contract_id() }}` результат функции.
///
/// Все имена проверяются при компиляции, поэтому отрисовка не может упасть.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Variable {
        name: FieldName,
        default: Option<String>,
    },
    Function(Function),
}

impl TryFrom<Token> for Segment {
    type Error = Error;

    fn try_from(token: Token) -> Result<Self> {
        let segment = match token {
            Token::Text(text) => Segment::Text(text),
            Token::Variable { name, default } => Segment::Variable {
                name: name
                    .parse()
                    .map_err(|_| Error::UnknownVariable(name.clone()))?,
                default,
            },
            Token::Function { name } => Segment::Function(name.parse()?),
        };

        Ok(segment)
    }
}

impl Template {
    /// Разбирает текст шаблона и проверяет все плейсхолдеры.
    pub fn compile(text: &str) -> Result<Self> {
        let tokens = template::template(text)?;

        debug!("Parsed {} template tokens", tokens.len());

        let segments = tokens
            .into_iter()
            .map(Segment::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { segments })
    }

    /// Поля формы, которые используются в шаблоне.
    /// Без повторов, в порядке первого появления.
    pub fn fields(&self) -> Vec<FieldName> {
        let mut fields = Vec::new();

        for s in self.segments.iter() {
            if let Segment::Variable { name, default: _ } = s {
                if !fields.contains(name) {
                    fields.push(*name);
                }
            }
        }

        fields
    }

    /// Подставляет значения за один проход.
    /// Значения попадают в документ дословно и повторно не разбираются.
    pub fn render(&self, form: &ContractFormData, now: &DateTime<FixedOffset>) -> String {
        let mut out = String::new();

        for s in self.segments.iter() {
            match s {
                Segment::Text(text) => out.push_str(text),
                Segment::Variable { name, default } => {
                    let value = form.value(*name);
                    match default {
                        Some(d) if value.is_empty() => out.push_str(d),
                        _ => out.push_str(value),
                    }
                }
                Segment::Function(f) => out.push_str(&f.execute(now)),
            }
        }

        out
    }
}

/// Элемент шаблона после разбора, но до проверки имён.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Text(String),
    Variable {
        name: String,
        default: Option<String>,
    },
    Function {
        name: String,
    },
}

peg::parser! {
    grammar template() for str {
        pub rule template() -> Vec<Token>
            = t:(placeholder() / text())* { t }

        rule placeholder() -> Token
            = "{{" space()* p:(function() / variable()) space()* "}}" { p }

        rule text() -> Token
            = t:$((!"{{" [_])+) { Token::Text(t.to_owned()) }

        rule function() -> Token
            = f:ident() space()* function_arguments() {
                Token::Function { name: f.to_owned() }
            }

        rule variable() -> Token
            = v:ident() d:variable_default()? {
                Token::Variable { name: v.to_owned(), default: d }
            }

        rule variable_default() -> String
            = space()* ":" space()* "\"" s:$((!"\"" [_])*) "\"" { s.to_owned() }

        rule ident() -> &'input str
            = $(['a'..='z' | 'A'..='Z'] ['a'..='z' | 'A'..='Z' | '0'..='9' | '_']*)

        rule function_arguments() = "()"

        rule space() = [' ' | '\t']
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("parse template")]
    Parse(#[from] peg::error::ParseError<peg::str::LineCol>),

    #[error("unknown variable \"{0}\"")]
    UnknownVariable(String),

    #[error(transparent)]
    Function(#[from] functions::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-06-15T12:34:56.789Z").unwrap()
    }

    #[test]
    fn tokens() {
        assert_eq!(
            template::template(
                r#"Party {{ tenant1_name }}, terms {{special_terms:"none."}}, id {{ contract_id() }} end"#
            ),
            Ok(vec![
                Token::Text("Party ".to_owned()),
                Token::Variable {
                    name: "tenant1_name".to_owned(),
                    default: None,
                },
                Token::Text(", terms ".to_owned()),
                Token::Variable {
                    name: "special_terms".to_owned(),
                    default: Some("none.".to_owned()),
                },
                Token::Text(", id ".to_owned()),
                Token::Function {
                    name: "contract_id".to_owned(),
                },
                Token::Text(" end".to_owned()),
            ])
        );
    }

    #[test]
    fn single_braces_are_text() {
        assert_eq!(
            template::template("a { b } c"),
            Ok(vec![Token::Text("a { b } c".to_owned())])
        );
    }

    #[test]
    fn unterminated_placeholder() {
        assert!(matches!(
            Template::compile("Name: {{ tenant1_name"),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn unknown_variable() {
        assert!(matches!(
            Template::compile("{{ landlord_name }}"),
            Err(Error::UnknownVariable(name)) if name == "landlord_name"
        ));
    }

    #[test]
    fn unknown_function() {
        assert!(matches!(
            Template::compile("{{ now() }}"),
            Err(Error::Function(functions::Error::UnknownFunction(name))) if name == "now"
        ));
    }

    #[test]
    fn fields_are_unique_in_order() {
        let tmpl = Template::compile(
            "{{ tenant2_name }} {{ tenant1_name }} {{ tenant2_name }} {{ today() }}",
        )
        .unwrap();

        assert_eq!(
            vec![FieldName::Tenant2Name, FieldName::Tenant1Name],
            tmpl.fields()
        );
    }

    #[test]
    fn render_uses_default_only_for_empty_value() {
        let tmpl = Template::compile(r#"[{{ special_terms:"No terms." }}]"#).unwrap();

        let mut form = ContractFormData::default();
        assert_eq!("[No terms.]", tmpl.render(&form, &now()));

        form.special_terms = "Pets allowed".to_owned();
        assert_eq!("[Pets allowed]", tmpl.render(&form, &now()));
    }

    #[test]
    fn render_inserts_values_verbatim() {
        let tmpl = Template::compile("A: {{ tenant1_name }} B: {{ tenant2_name }}").unwrap();

        let form = ContractFormData {
            tenant1_name: "{{ tenant2_name }} $1".to_owned(),
            tenant2_name: "Bob".to_owned(),
            ..Default::default()
        };

        assert_eq!("A: {{ tenant2_name }} $1 B: Bob", tmpl.render(&form, &now()));
    }

    #[test]
    fn render_functions_share_one_instant() {
        let tmpl = Template::compile("{{ contract_id() }}/{{ contract_id() }} {{ today() }}").unwrap();

        assert_eq!(
            "FS-896789/FS-896789 15/06/2024",
            tmpl.render(&ContractFormData::default(), &now())
        );
    }
}
