//! Wire types of the line protocol.
//!
//! Every client frame carries exactly one command. The first
//! whitespace-separated token selects the command; anything that is not a
//! protocol keyword is raw UCI text destined for the engine.

use crate::auth::CommandClass;
use std::fmt;

/// Answer to `whoareyou`.
pub const IDENTITY: &str = "iam chesshook-intermediaryv1";

/// A parsed client line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCommand<'a> {
    WhoAreYou,
    WhatEngine,
    /// `auth` with its key, if one was given
    Auth(Option<&'a str>),
    Subscribe,
    Unsubscribe,
    Lock,
    Unlock,
    /// Raw text forwarded to the engine
    Engine(&'a str),
}

impl<'a> ClientCommand<'a> {
    /// Parses a trimmed line. Returns `None` for an empty line.
    pub fn parse(line: &'a str) -> Option<Self> {
        let line = line.trim();
        let mut parts = line.split_whitespace();
        let command = parts.next()?;

        Some(match command {
            "whoareyou" => Self::WhoAreYou,
            "whatengine" => Self::WhatEngine,
            "auth" => Self::Auth(parts.next()),
            "sub" => Self::Subscribe,
            "unsub" => Self::Unsubscribe,
            "lock" => Self::Lock,
            "unlock" => Self::Unlock,
            _ => Self::Engine(line),
        })
    }

    /// Authorization class required to run the command.
    pub fn class(&self) -> CommandClass {
        match self {
            Self::WhoAreYou | Self::Auth(_) => CommandClass::Open,
            Self::WhatEngine | Self::Subscribe | Self::Unsubscribe => CommandClass::Read,
            Self::Lock | Self::Unlock | Self::Engine(_) => CommandClass::Write,
        }
    }
}

/// A synchronous reply to a client command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Identity,
    EngineName(String),
    AuthOk,
    AuthErr,
    SubOk,
    SubErr,
    UnsubOk,
    UnsubErr,
    LockOk,
    LockErr,
    UnlockOk,
    UnlockErr,
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Identity => f.write_str(IDENTITY),
            Reply::EngineName(name) => write!(f, "engine {}", name),
            Reply::AuthOk => f.write_str("authok"),
            Reply::AuthErr => f.write_str("autherr"),
            Reply::SubOk => f.write_str("subok"),
            Reply::SubErr => f.write_str("suberr"),
            Reply::UnsubOk => f.write_str("unsubok"),
            Reply::UnsubErr => f.write_str("unsuberr"),
            Reply::LockOk => f.write_str("lockok"),
            Reply::LockErr => f.write_str("lockerr"),
            Reply::UnlockOk => f.write_str("unlockok"),
            Reply::UnlockErr => f.write_str("unlockerr"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keywords() {
        assert_eq!(ClientCommand::parse("whoareyou"), Some(ClientCommand::WhoAreYou));
        assert_eq!(ClientCommand::parse("  sub \n"), Some(ClientCommand::Subscribe));
        assert_eq!(ClientCommand::parse("auth abc123"), Some(ClientCommand::Auth(Some("abc123"))));
        assert_eq!(ClientCommand::parse("auth"), Some(ClientCommand::Auth(None)));
        assert_eq!(ClientCommand::parse("   "), None);
    }

    #[test]
    fn test_unknown_text_is_forwarded_trimmed() {
        assert_eq!(
            ClientCommand::parse(" position startpos moves e2e4 "),
            Some(ClientCommand::Engine("position startpos moves e2e4"))
        );
        // Keywords only match as whole tokens.
        assert_eq!(ClientCommand::parse("subscribe"), Some(ClientCommand::Engine("subscribe")));
    }

    #[test]
    fn test_command_classes() {
        assert_eq!(ClientCommand::WhoAreYou.class(), CommandClass::Open);
        assert_eq!(ClientCommand::Auth(None).class(), CommandClass::Open);
        assert_eq!(ClientCommand::WhatEngine.class(), CommandClass::Read);
        assert_eq!(ClientCommand::Unsubscribe.class(), CommandClass::Read);
        assert_eq!(ClientCommand::Unlock.class(), CommandClass::Write);
        assert_eq!(ClientCommand::Engine("go").class(), CommandClass::Write);
    }

    #[test]
    fn test_reply_tokens() {
        assert_eq!(Reply::Identity.to_string(), "iam chesshook-intermediaryv1");
        assert_eq!(Reply::EngineName("Stockfish 16".into()).to_string(), "engine Stockfish 16");
        assert_eq!(Reply::UnsubErr.to_string(), "unsuberr");
        assert_eq!(Reply::LockOk.to_string(), "lockok");
    }
}
