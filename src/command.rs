/// Commands the bot understands. Several keywords can map to one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Analyse,
    Help,
    Enable,
    Disable,
    Answer,
    Prefix,
}

impl CommandKind {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "analyse" | "analyze" => Some(Self::Analyse),
            "help" => Some(Self::Help),
            "enable" => Some(Self::Enable),
            "disable" => Some(Self::Disable),
            "answer" => Some(Self::Answer),
            "prefix" => Some(Self::Prefix),
            _ => None,
        }
    }
}

/// A parsed `<prefix>!<command>[!<sub-arg>...] [args...]` message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub kind: CommandKind,
    pub keyword: String,
    /// `!`-separated arguments attached to the command token, e.g. a language code.
    pub sub_args: Vec<String>,
    /// Whitespace-separated words after the command token.
    pub args: Vec<String>,
}

impl Invocation {
    /// Arguments joined back into a single phrase.
    pub fn phrase(&self) -> String {
        self.args.join(" ")
    }
}

/// Parses `raw` against the bot prefix. Returns `None` for ordinary chatter
/// and for unknown commands.
pub fn parse(raw: &str, prefix: &str) -> Option<Invocation> {
    let mut words = raw.split_whitespace();
    let token = words.next()?;
    let rest = token.strip_prefix(prefix)?.strip_prefix('!')?;
    let mut parts = rest.split('!');
    let keyword = parts.next()?;
    let kind = CommandKind::from_keyword(keyword)?;
    Some(Invocation {
        kind,
        keyword: keyword.to_string(),
        sub_args: parts
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect(),
        args: words.map(str::to_string).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_and_arguments() {
        let inv = parse("jpn!analyse 今日は 日本語", "jpn").unwrap();
        assert_eq!(inv.kind, CommandKind::Analyse);
        assert_eq!(inv.args, vec!["今日は", "日本語"]);
        assert_eq!(inv.phrase(), "今日は 日本語");
        assert!(inv.sub_args.is_empty());
    }

    #[test]
    fn american_spelling_is_an_alias() {
        assert_eq!(parse("jpn!analyze x", "jpn").unwrap().kind, CommandKind::Analyse);
    }

    #[test]
    fn sub_arguments_follow_the_command() {
        let inv = parse("jpn!analyse!spa 3", "jpn").unwrap();
        assert_eq!(inv.sub_args, vec!["spa"]);
        assert_eq!(inv.args, vec!["3"]);
    }

    #[test]
    fn ignores_chatter_and_unknown_commands() {
        assert!(parse("hello there", "jpn").is_none());
        assert!(parse("jpn!dance", "jpn").is_none());
        assert!(parse("jpnanalyse", "jpn").is_none());
        assert!(parse("bot!analyse x", "jpn").is_none());
        assert!(parse("", "jpn").is_none());
    }

    #[test]
    fn leading_whitespace_is_ignored() {
        let inv = parse("   jpn!help", "jpn").unwrap();
        assert_eq!(inv.kind, CommandKind::Help);
        assert!(inv.args.is_empty());
    }
}
