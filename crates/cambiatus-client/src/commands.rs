//! Line commands read from stdin.
//!
//! ```text
//! vote <id> approve|reject   reopen <id>     more
//! sort asc|desc|toggle       invite | copy | close-invite
//! contact <kind> <value>     dismiss <n>     auth | cancel
//! reload                     quit
//! ```

use cambiatus_dashboard::{ContactKind, ContactMsg, InviteMsg, Msg};
use cambiatus_types::{ClaimId, Direction};

/// Errors parsing a command line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}'")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("'{0}' is not a number")]
    InvalidNumber(String),
}

/// What a line asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Messages to apply in order.
    Apply(Vec<Msg>),
    Quit,
}

impl Command {
    fn one(msg: Msg) -> Self {
        Self::Apply(vec![msg])
    }
}

/// Parse one input line.
pub fn parse(line: &str) -> Result<Command, CommandError> {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Err(CommandError::Empty);
    };
    let args: Vec<&str> = words.collect();

    let command = match (name, args.as_slice()) {
        ("vote", [id, verdict]) => {
            let approve = match *verdict {
                "approve" | "yes" => true,
                "reject" | "no" => false,
                _ => return Err(CommandError::Usage("vote <id> approve|reject")),
            };
            Command::one(Msg::VoteClicked {
                claim_id: claim_id(id)?,
                approve,
            })
        }
        ("vote", _) => return Err(CommandError::Usage("vote <id> approve|reject")),
        ("reopen", [id]) => Command::one(Msg::ReopenClaim(claim_id(id)?)),
        ("reopen", _) => return Err(CommandError::Usage("reopen <id>")),
        ("more", []) => Command::one(Msg::LoadMoreClaims),
        ("sort", ["asc"]) => Command::one(Msg::DirectionSelected(Direction::Asc)),
        ("sort", ["desc"]) => Command::one(Msg::DirectionSelected(Direction::Desc)),
        ("sort", ["toggle"]) => Command::one(Msg::DirectionToggled),
        ("sort", _) => return Err(CommandError::Usage("sort asc|desc|toggle")),
        ("invite", []) => Command::one(Msg::Invite(InviteMsg::Open)),
        ("copy", []) => Command::one(Msg::Invite(InviteMsg::Copy)),
        ("close-invite", []) => Command::one(Msg::Invite(InviteMsg::Close)),
        ("contact", [kind, value @ ..]) if !value.is_empty() => Command::Apply(vec![
            Msg::Contact(ContactMsg::Open),
            Msg::Contact(ContactMsg::SelectKind(contact_kind(kind)?)),
            Msg::Contact(ContactMsg::Input(value.join(" "))),
            Msg::Contact(ContactMsg::Submit),
        ]),
        ("contact", _) => {
            return Err(CommandError::Usage(
                "contact phone|whatsapp|telegram|instagram|email <value>",
            ))
        }
        ("dismiss", [index]) => Command::one(Msg::DismissNotice(
            index
                .parse()
                .map_err(|_| CommandError::InvalidNumber(index.to_string()))?,
        )),
        ("auth", []) => Command::one(Msg::AuthenticationCompleted),
        ("cancel", []) => Command::one(Msg::AuthenticationCancelled),
        ("reload", []) => Command::one(Msg::Reload),
        ("quit" | "exit", []) => Command::Quit,
        (other, _) => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(command)
}

fn claim_id(raw: &str) -> Result<ClaimId, CommandError> {
    raw.parse()
        .map(ClaimId)
        .map_err(|_| CommandError::InvalidNumber(raw.to_string()))
}

fn contact_kind(raw: &str) -> Result<ContactKind, CommandError> {
    Ok(match raw.to_ascii_lowercase().as_str() {
        "phone" => ContactKind::Phone,
        "whatsapp" => ContactKind::Whatsapp,
        "telegram" => ContactKind::Telegram,
        "instagram" => ContactKind::Instagram,
        "email" => ContactKind::Email,
        _ => {
            return Err(CommandError::Usage(
                "contact phone|whatsapp|telegram|instagram|email <value>",
            ))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_commands() {
        assert_eq!(
            parse("vote 42 approve"),
            Ok(Command::one(Msg::VoteClicked {
                claim_id: ClaimId(42),
                approve: true
            }))
        );
        assert_eq!(
            parse("  vote 7   reject "),
            Ok(Command::one(Msg::VoteClicked {
                claim_id: ClaimId(7),
                approve: false
            }))
        );
        assert_eq!(
            parse("vote x approve"),
            Err(CommandError::InvalidNumber("x".to_string()))
        );
        assert!(matches!(parse("vote 1"), Err(CommandError::Usage(_))));
    }

    #[test]
    fn test_sort_and_paging() {
        assert_eq!(parse("sort toggle"), Ok(Command::one(Msg::DirectionToggled)));
        assert_eq!(
            parse("sort asc"),
            Ok(Command::one(Msg::DirectionSelected(Direction::Asc)))
        );
        assert_eq!(parse("more"), Ok(Command::one(Msg::LoadMoreClaims)));
        assert!(matches!(parse("sort up"), Err(CommandError::Usage(_))));
    }

    #[test]
    fn test_contact_expands_to_form_messages() {
        let Ok(Command::Apply(msgs)) = parse("contact email me@example.org") else {
            unreachable!("contact should parse");
        };
        assert_eq!(msgs.len(), 4);
        assert_eq!(
            msgs[1],
            Msg::Contact(ContactMsg::SelectKind(ContactKind::Email))
        );
        assert_eq!(
            msgs[2],
            Msg::Contact(ContactMsg::Input("me@example.org".to_string()))
        );
    }

    #[test]
    fn test_misc() {
        assert_eq!(parse(""), Err(CommandError::Empty));
        assert_eq!(parse("quit"), Ok(Command::Quit));
        assert_eq!(parse("reload"), Ok(Command::one(Msg::Reload)));
        assert_eq!(
            parse("fly"),
            Err(CommandError::Unknown("fly".to_string()))
        );
    }
}
