//! Contact modal: ask the member for a channel other members can reach them
//! on, validate it locally and save it through the API.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use cambiatus_types::TransportError;

use crate::context::Context;
use crate::effect::Effect;

const MIN_PHONE_DIGITS: usize = 8;
const MAX_PHONE_DIGITS: usize = 15;

/// Reachable channel types.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContactKind {
    Phone,
    #[default]
    Whatsapp,
    Telegram,
    Instagram,
    Email,
}

/// Validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContactError {
    #[error("contact cannot be empty")]
    Empty,

    #[error("phone numbers need 8 to 15 digits")]
    InvalidPhone,

    #[error("invalid email address")]
    InvalidEmail,

    #[error("invalid {0:?} username")]
    InvalidUsername(ContactKind),
}

/// What the member is typing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContactForm {
    pub kind: ContactKind,
    pub value: String,
}

/// A validated, normalised contact.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(rename = "type")]
    pub kind: ContactKind,
    pub value: String,
}

impl Contact {
    /// Validate and normalise a form.
    pub fn parse(form: &ContactForm) -> Result<Self, ContactError> {
        let raw = form.value.trim();
        if raw.is_empty() {
            return Err(ContactError::Empty);
        }
        let value = match form.kind {
            ContactKind::Phone | ContactKind::Whatsapp => normalize_phone(raw)?,
            ContactKind::Email => normalize_email(raw)?,
            ContactKind::Telegram => normalize_username(
                raw,
                &["https://t.me/", "t.me/"],
                5..=32,
                |c| c.is_ascii_alphanumeric() || c == '_',
            )
            .ok_or(ContactError::InvalidUsername(form.kind))?,
            ContactKind::Instagram => normalize_username(
                raw,
                &["https://instagram.com/", "https://www.instagram.com/", "instagram.com/"],
                1..=30,
                |c| c.is_ascii_alphanumeric() || c == '_' || c == '.',
            )
            .ok_or(ContactError::InvalidUsername(form.kind))?,
        };
        Ok(Self {
            kind: form.kind,
            value,
        })
    }

    /// Link that opens the channel.
    pub fn url(&self) -> String {
        match self.kind {
            ContactKind::Phone => format!("tel:{}", self.value),
            ContactKind::Whatsapp => format!(
                "https://api.whatsapp.com/send?phone={}",
                self.value.trim_start_matches('+')
            ),
            ContactKind::Telegram => format!("https://t.me/{}", self.value),
            ContactKind::Instagram => format!("https://instagram.com/{}", self.value),
            ContactKind::Email => format!("mailto:{}", self.value),
        }
    }
}

fn normalize_phone(raw: &str) -> Result<String, ContactError> {
    let (plus, rest) = match raw.strip_prefix('+') {
        Some(rest) => ("+", rest),
        None => ("", raw),
    };
    let mut digits = String::with_capacity(rest.len());
    for c in rest.chars() {
        match c {
            '0'..='9' => digits.push(c),
            ' ' | '-' | '(' | ')' | '.' => {}
            _ => return Err(ContactError::InvalidPhone),
        }
    }
    if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits.len()) {
        return Err(ContactError::InvalidPhone);
    }
    Ok(format!("{plus}{digits}"))
}

fn normalize_email(raw: &str) -> Result<String, ContactError> {
    let (local, domain) = raw.split_once('@').ok_or(ContactError::InvalidEmail)?;
    let domain_ok = domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains('@');
    if local.is_empty() || !domain_ok || raw.chars().any(char::is_whitespace) {
        return Err(ContactError::InvalidEmail);
    }
    Ok(raw.to_ascii_lowercase())
}

fn normalize_username(
    raw: &str,
    prefixes: &[&str],
    length: std::ops::RangeInclusive<usize>,
    allowed: impl Fn(char) -> bool,
) -> Option<String> {
    let stripped = prefixes
        .iter()
        .find_map(|prefix| raw.strip_prefix(prefix))
        .unwrap_or(raw);
    let name = stripped.trim_start_matches('@').trim_end_matches('/');
    (length.contains(&name.len()) && name.chars().all(allowed)).then(|| name.to_string())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContactMsg {
    Open,
    SelectKind(ContactKind),
    Input(String),
    Submit,
    /// Contact mutation answered.
    Saved(Result<(), TransportError>),
    Close,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ContactModal {
    #[default]
    Closed,
    Editing {
        form: ContactForm,
        error: Option<ContactError>,
    },
    Submitting {
        form: ContactForm,
        contact: Contact,
    },
    Saved(Contact),
    Failed {
        form: ContactForm,
        message: String,
    },
}

impl ContactModal {
    /// Apply one contact message.
    pub fn update(&mut self, msg: ContactMsg, ctx: &Context) -> Vec<Effect> {
        match msg {
            ContactMsg::Open => {
                if matches!(self, Self::Closed | Self::Saved(_)) {
                    *self = Self::Editing {
                        form: ContactForm::default(),
                        error: None,
                    };
                }
                Vec::new()
            }
            ContactMsg::SelectKind(kind) => {
                if let Some(form) = self.editable_form() {
                    form.kind = kind;
                }
                Vec::new()
            }
            ContactMsg::Input(value) => {
                if let Some(form) = self.editable_form() {
                    form.value = value;
                }
                Vec::new()
            }
            ContactMsg::Submit => {
                let Some(form) = self.editable_form().cloned() else {
                    debug!("contact submit ignored");
                    return Vec::new();
                };
                match Contact::parse(&form) {
                    Ok(contact) => {
                        *self = Self::Submitting {
                            form,
                            contact: contact.clone(),
                        };
                        vec![Effect::SaveContact {
                            contact,
                            auth: ctx.auth(),
                        }]
                    }
                    Err(err) => {
                        *self = Self::Editing {
                            form,
                            error: Some(err),
                        };
                        Vec::new()
                    }
                }
            }
            ContactMsg::Saved(result) => {
                let Self::Submitting { form, contact } = self else {
                    debug!("contact response ignored");
                    return Vec::new();
                };
                *self = match result {
                    Ok(()) => Self::Saved(contact.clone()),
                    Err(err) => {
                        warn!(error = %err, "saving contact failed");
                        Self::Failed {
                            form: form.clone(),
                            message: err.to_string(),
                        }
                    }
                };
                Vec::new()
            }
            ContactMsg::Close => {
                *self = Self::Closed;
                Vec::new()
            }
        }
    }

    /// The form when it may be edited or (re)submitted. A failed save
    /// returns to editing.
    fn editable_form(&mut self) -> Option<&mut ContactForm> {
        if let Self::Failed { form, .. } = self {
            *self = Self::Editing {
                form: std::mem::take(form),
                error: None,
            };
        }
        match self {
            Self::Editing { form, .. } => Some(form),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::context;
    use cambiatus_claims::Credentials;

    fn form(kind: ContactKind, value: &str) -> ContactForm {
        ContactForm {
            kind,
            value: value.to_string(),
        }
    }

    #[test]
    fn test_phone_normalisation() {
        let contact = Contact::parse(&form(ContactKind::Whatsapp, "+55 (11) 99999-9999"))
            .expect("valid");
        assert_eq!(contact.value, "+5511999999999");
        assert_eq!(
            contact.url(),
            "https://api.whatsapp.com/send?phone=5511999999999"
        );
        assert_eq!(
            Contact::parse(&form(ContactKind::Phone, "123")),
            Err(ContactError::InvalidPhone)
        );
        assert_eq!(
            Contact::parse(&form(ContactKind::Phone, "12345678a")),
            Err(ContactError::InvalidPhone)
        );
    }

    #[test]
    fn test_usernames() {
        let telegram =
            Contact::parse(&form(ContactKind::Telegram, "https://t.me/cambiatus")).expect("valid");
        assert_eq!(telegram.value, "cambiatus");
        assert_eq!(telegram.url(), "https://t.me/cambiatus");

        let instagram = Contact::parse(&form(ContactKind::Instagram, "@cambi.atus")).expect("valid");
        assert_eq!(instagram.value, "cambi.atus");

        assert_eq!(
            Contact::parse(&form(ContactKind::Telegram, "abc")),
            Err(ContactError::InvalidUsername(ContactKind::Telegram))
        );
    }

    #[test]
    fn test_email() {
        let email = Contact::parse(&form(ContactKind::Email, " Member@Example.org ")).expect("valid");
        assert_eq!(email.value, "member@example.org");
        assert_eq!(
            Contact::parse(&form(ContactKind::Email, "member@example")),
            Err(ContactError::InvalidEmail)
        );
        assert_eq!(
            Contact::parse(&form(ContactKind::Email, "   ")),
            Err(ContactError::Empty)
        );
    }

    #[test]
    fn test_submit_flow() {
        let ctx = context(Credentials::Cached);
        let mut modal = ContactModal::default();
        modal.update(ContactMsg::Open, &ctx);
        modal.update(ContactMsg::SelectKind(ContactKind::Email), &ctx);
        modal.update(ContactMsg::Input("bad".to_string()), &ctx);
        assert!(modal.update(ContactMsg::Submit, &ctx).is_empty());
        assert!(matches!(
            modal,
            ContactModal::Editing {
                error: Some(ContactError::InvalidEmail),
                ..
            }
        ));

        modal.update(ContactMsg::Input("me@example.org".to_string()), &ctx);
        let effects = modal.update(ContactMsg::Submit, &ctx);
        assert!(matches!(effects.as_slice(), [Effect::SaveContact { .. }]));
        assert!(modal.update(ContactMsg::Submit, &ctx).is_empty(), "in flight");

        modal.update(ContactMsg::Saved(Ok(())), &ctx);
        assert!(matches!(modal, ContactModal::Saved(_)));
    }

    #[test]
    fn test_failed_save_can_be_edited_again() {
        let ctx = context(Credentials::Cached);
        let mut modal = ContactModal::default();
        modal.update(ContactMsg::Open, &ctx);
        modal.update(ContactMsg::Input("+5511999999999".to_string()), &ctx);
        modal.update(ContactMsg::Submit, &ctx);
        modal.update(
            ContactMsg::Saved(Err(TransportError::Network {
                message: "offline".to_string(),
            })),
            &ctx,
        );
        assert!(matches!(modal, ContactModal::Failed { .. }));

        let effects = modal.update(ContactMsg::Submit, &ctx);
        assert!(matches!(effects.as_slice(), [Effect::SaveContact { .. }]));
    }
}
