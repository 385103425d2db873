use std::path::PathBuf;
use uuid::Uuid;

/// A stored chat named by id or by its position in the last `/history` listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRef {
    Id(Uuid),
    /// 1-based
    Index(usize),
}

impl ChatRef {
    fn parse(arg: &str) -> Option<Self> {
        if let Ok(id) = Uuid::parse_str(arg) {
            return Some(Self::Id(id));
        }
        arg.parse::<usize>()
            .ok()
            .filter(|i| *i > 0)
            .map(Self::Index)
    }

    /// Resolve against the ids of the last listing
    pub fn resolve(self, listed: &[Uuid]) -> Option<Uuid> {
        match self {
            Self::Id(id) => Some(id),
            Self::Index(i) => listed.get(i - 1).copied(),
        }
    }
}

/// One line of REPL input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    New,
    History,
    Open(ChatRef),
    Delete(ChatRef),
    Save(PathBuf),
    Attach(PathBuf),
    Probe,
    Help,
    Quit,
    Message(String),
    /// Unknown command or bad argument, with a hint for the user
    Invalid(String),
}

pub const HELP: &str = "\
Commands:
  /new            start a new chat
  /history        list recent chats
  /open <n|id>    open a chat from the history
  /delete <n|id>  delete a chat
  /save [path]    save the transcript (default looka-chat.txt)
  /attach <path>  attach a file to the next message
  /probe          check the API key and connection
  /quit           exit
Ctrl-C stops a response in progress.";

impl Command {
    /// `None` for blank input
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if !line.starts_with('/') {
            return Some(Self::Message(line.to_string()));
        }

        let (name, arg) = match line.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (line, ""),
        };

        let command = match name {
            "/new" => Self::New,
            "/history" => Self::History,
            "/probe" => Self::Probe,
            "/help" => Self::Help,
            "/quit" | "/exit" => Self::Quit,
            "/open" => ChatRef::parse(arg)
                .map(Self::Open)
                .unwrap_or_else(|| Self::Invalid("usage: /open <n|id>".to_string())),
            "/delete" => ChatRef::parse(arg)
                .map(Self::Delete)
                .unwrap_or_else(|| Self::Invalid("usage: /delete <n|id>".to_string())),
            "/save" if arg.is_empty() => {
                Self::Save(PathBuf::from(crate::transcript::TRANSCRIPT_FILE_NAME))
            }
            "/save" => Self::Save(PathBuf::from(arg)),
            "/attach" if arg.is_empty() => Self::Invalid("usage: /attach <path>".to_string()),
            "/attach" => Self::Attach(PathBuf::from(arg)),
            other => Self::Invalid(format!("unknown command {}; try /help", other)),
        };

        Some(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_a_message() {
        assert_eq!(Command::parse("   "), None);
        assert_eq!(
            Command::parse("  hello there "),
            Some(Command::Message("hello there".to_string()))
        );
    }

    #[test]
    fn test_commands() {
        assert_eq!(Command::parse("/new"), Some(Command::New));
        assert_eq!(Command::parse("/quit"), Some(Command::Quit));
        assert_eq!(Command::parse("/open 2"), Some(Command::Open(ChatRef::Index(2))));
        assert_eq!(
            Command::parse("/attach ./my notes.txt"),
            Some(Command::Attach(PathBuf::from("./my notes.txt")))
        );
        assert_eq!(
            Command::parse("/save"),
            Some(Command::Save(PathBuf::from("looka-chat.txt")))
        );
    }

    #[test]
    fn test_chat_ref() {
        let id = Uuid::new_v4();
        let parsed = Command::parse(&format!("/delete {}", id));
        assert_eq!(parsed, Some(Command::Delete(ChatRef::Id(id))));

        assert_eq!(ChatRef::Index(1).resolve(&[id]), Some(id));
        assert_eq!(ChatRef::Index(2).resolve(&[id]), None);
        assert!(matches!(Command::parse("/open 0"), Some(Command::Invalid(_))));
        assert!(matches!(Command::parse("/open"), Some(Command::Invalid(_))));
        assert!(matches!(Command::parse("/frobnicate"), Some(Command::Invalid(_))));
    }
}
