#[cfg(test)]
#[path = "slash_commands_test.rs"]
mod tests;

pub struct SlashCommand {
    command: String,
    pub args: Vec<String>,
}

impl SlashCommand {
    pub fn parse(text: &str) -> Option<SlashCommand> {
        let mut args = text
            .split_whitespace()
            .map(|e| return e.to_string())
            .collect::<Vec<String>>();
        if args.is_empty() {
            return None;
        }
        let prefix = args.remove(0);

        let cmd = SlashCommand {
            command: prefix,
            args,
        };
        if cmd.is_quit()
            || cmd.is_topic()
            || cmd.is_new_chat()
            || cmd.is_history()
            || cmd.is_like()
            || cmd.is_dislike()
            || cmd.is_help()
        {
            return Some(cmd);
        }

        return None;
    }

    pub fn is_quit(&self) -> bool {
        return ["/q", "/quit", "/exit"].contains(&self.command.as_str());
    }

    pub fn is_topic(&self) -> bool {
        return ["/t", "/topic"].contains(&self.command.as_str());
    }

    pub fn is_new_chat(&self) -> bool {
        return ["/n", "/new"].contains(&self.command.as_str());
    }

    pub fn is_history(&self) -> bool {
        return ["/hi", "/history"].contains(&self.command.as_str());
    }

    pub fn is_like(&self) -> bool {
        return ["/l", "/like"].contains(&self.command.as_str());
    }

    pub fn is_dislike(&self) -> bool {
        return ["/d", "/dislike"].contains(&self.command.as_str());
    }

    pub fn is_help(&self) -> bool {
        return ["/h", "/help"].contains(&self.command.as_str());
    }

    pub fn number_arg(&self) -> Option<u32> {
        return self.args.first()?.parse::<u32>().ok();
    }

    pub fn text_arg(&self) -> String {
        return self.args.join(" ");
    }
}

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /topic (/t) [TOPIC_NAME,TOPIC_NUMBER] - Starts a new session on a topic. You can pass either the topic name, or its number from the sidebar.
- /new (/n) - Ends the current conversation and returns to topic selection.
- /history (/hi) [HISTORY_NUMBER] - Reopens a previous conversation from the sidebar.
- /like (/l) [MESSAGE_NUMBER] - Marks a reply as helpful. The number is shown at the top of each reply.
- /dislike (/d) [MESSAGE_NUMBER] - Marks a reply as unhelpful.
- /quit /exit (/q) - Exit the client.
- /help (/h) - Toggles this help menu.

HOTKEYS:
- Up arrow / Down arrow - Scroll the conversation
- Page Up / Page Down, CTRL+U / CTRL+D - Scroll a page at a time
- CTRL+Home / CTRL+End - Jump to the start or the latest reply
- Esc - Close this help menu
- CTRL+C - Exit.
        "#;

    return text.trim().to_string();
}
