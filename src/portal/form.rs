use reqwest::Method;
use scraper::{ElementRef, Html};
use url::Url;

use crate::error::{Error, Result};
use crate::query::Node;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Kind {
    /// Text, hidden, textarea, select
    Value,
    /// Checkbox or radio
    Choice { checked: bool },
    /// Submit button, only the first one is sent
    Submit,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Field {
    name: String,
    value: String,
    kind: Kind,
}

/// HTML form, ready to be filled and submitted
#[derive(Clone, Debug)]
pub struct Form {
    /// Absolute target of the form
    pub action: Url,
    pub method: Method,
    fields: Vec<Field>,
}

impl Form {
    /// Find the first form matching `selector` in a page
    pub fn find(document: &Html, selector: &str, page_url: &Url) -> Result<Self> {
        document
            .root_element()
            .query_first(selector)
            .map(|form| Self::from_element(&form, page_url))
            .transpose()?
            .ok_or_else(|| Error::FormNotFound {
                selector: selector.to_owned(),
                url: page_url.to_string(),
            })
    }

    /// Collect the form's fields
    pub fn from_element(form: &ElementRef, page_url: &Url) -> Result<Self> {
        let action = match form.attribute("action") {
            Some(action) if !action.trim().is_empty() => page_url.join(action.trim())?,
            _ => page_url.clone(),
        };

        let method = match form.attribute("method") {
            Some(m) if m.eq_ignore_ascii_case("post") => Method::POST,
            _ => Method::GET,
        };

        let mut fields = vec![];
        for element in form.query("input, textarea, select") {
            let Some(name) = element.attribute("name") else {
                continue;
            };

            match element.value().name() {
                "textarea" => fields.push(Field {
                    name,
                    value: element.text_content(),
                    kind: Kind::Value,
                }),
                "select" => {
                    let option = element
                        .query_first("option[selected]")
                        .or_else(|| element.query_first("option"));
                    if let Some(option) = option {
                        let value = option
                            .attribute("value")
                            .unwrap_or_else(|| option.text_content().trim().to_owned());
                        fields.push(Field {
                            name,
                            value,
                            kind: Kind::Value,
                        });
                    }
                }
                _ => {
                    let kind_attr = element
                        .attribute("type")
                        .unwrap_or_default()
                        .to_ascii_lowercase();
                    let value = element.attribute("value").unwrap_or_default();
                    let kind = match kind_attr.as_str() {
                        "checkbox" | "radio" => Kind::Choice {
                            checked: element.attribute("checked").is_some(),
                        },
                        "submit" | "image" => Kind::Submit,
                        "reset" | "button" | "file" => continue,
                        _ => Kind::Value,
                    };
                    fields.push(Field { name, value, kind });
                }
            }
        }

        Ok(Self {
            action,
            method,
            fields,
        })
    }

    /// Fill a field, checking the matching choice for radios and checkboxes
    pub fn set(&mut self, name: &str, value: &str) {
        let mut found = false;

        for field in self.fields.iter_mut().filter(|f| f.name == name) {
            match &mut field.kind {
                Kind::Choice { checked } => {
                    *checked = field.value == value;
                    found = true;
                }
                Kind::Value => {
                    field.value = value.to_owned();
                    found = true;
                }
                Kind::Submit => (),
            }
        }

        if !found {
            self.fields.push(Field {
                name: name.to_owned(),
                value: value.to_owned(),
                kind: Kind::Value,
            });
        }
    }

    /// Name/value pairs sent on submission
    pub fn pairs(&self) -> Vec<(String, String)> {
        let mut submitted = false;

        self.fields
            .iter()
            .filter(|field| match field.kind {
                Kind::Value => true,
                Kind::Choice { checked } => checked,
                Kind::Submit => !std::mem::replace(&mut submitted, true),
            })
            .map(|field| (field.name.clone(), field.value.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pairs(list: &[(&str, &str)]) -> Vec<(String, String)> {
        list.iter()
            .map(|(n, v)| ((*n).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn page_url() -> Url {
        Url::parse("https://lms.example.com/user/").unwrap()
    }

    const LOGIN: &str = r#"<html><body>
        <form action="search.aspx"><input name="q"></form>
        <form action="./" method="post">
            <input type="hidden" name="__VIEWSTATE" value="abc">
            <input name="tbLogin">
            <input type="password" name="tbPassword">
            <input type="submit" name="btnLogin" value="Login">
            <input type="submit" name="btnForgot" value="Forgot">
            <input type="reset" name="clear">
        </form></body></html>"#;

    #[test]
    fn find_login_form() {
        let document = Html::parse_document(LOGIN);
        let mut form = Form::find(&document, r#"form[action="./"]"#, &page_url()).unwrap();

        assert_eq!(form.action.as_str(), "https://lms.example.com/user/");
        assert_eq!(form.method, Method::POST);

        form.set("tbLogin", "jan");
        form.set("tbPassword", "secret");
        assert_eq!(
            form.pairs(),
            pairs(&[
                ("__VIEWSTATE", "abc"),
                ("tbLogin", "jan"),
                ("tbPassword", "secret"),
                ("btnLogin", "Login"),
            ])
        );
    }

    #[test]
    fn missing_form() {
        let document = Html::parse_document("<p>nothing</p>");
        let err = Form::find(&document, "#form1", &page_url()).unwrap_err();
        assert!(matches!(err, Error::FormNotFound { .. }));
    }

    #[test]
    fn radios_select_by_value() {
        let document = Html::parse_document(
            r#"<form action="test/default1.aspx?name=A">
                <input type="radio" name="q1" value="a" checked>
                <input type="radio" name="q1" value="b">
                <input type="checkbox" name="agree" value="on">
                <textarea name="note">hello</textarea>
                <select name="lang"><option value="cz">cz</option><option value="en" selected>en</option></select>
            </form>"#,
        );
        let mut form = Form::find(&document, "form", &page_url()).unwrap();

        assert_eq!(form.method, Method::GET);
        assert_eq!(
            form.action.as_str(),
            "https://lms.example.com/user/test/default1.aspx?name=A"
        );
        assert_eq!(
            form.pairs(),
            pairs(&[("q1", "a"), ("note", "hello"), ("lang", "en")])
        );

        form.set("q1", "b");
        form.set("agree", "on");
        form.set("extra", "1");
        assert_eq!(
            form.pairs(),
            pairs(&[
                ("q1", "b"),
                ("agree", "on"),
                ("note", "hello"),
                ("lang", "en"),
                ("extra", "1"),
            ])
        );
    }
}
