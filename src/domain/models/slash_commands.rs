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
            || cmd.is_help()
            || cmd.is_new_session()
            || cmd.is_list_sessions()
            || cmd.is_switch_session()
            || cmd.is_rename_session()
            || cmd.is_delete_session()
            || cmd.is_clear()
            || cmd.is_model_list()
            || cmd.is_attach()
            || cmd.is_run_code()
            || cmd.is_copy_code()
            || cmd.is_export()
            || cmd.is_scroll_up()
            || cmd.is_scroll_down()
            || cmd.is_retry()
        {
            return Some(cmd);
        }

        return None;
    }

    /// First argument read as a 1-based position, converted to an index.
    pub fn index(&self) -> Option<usize> {
        let position = self.args.first()?.parse::<usize>().ok()?;
        return position.checked_sub(1);
    }

    /// All arguments joined back together, for names and paths.
    pub fn rest(&self) -> String {
        return self.args.join(" ");
    }

    pub fn is_quit(&self) -> bool {
        return ["/q", "/quit", "/exit"].contains(&self.command.as_str());
    }

    pub fn is_help(&self) -> bool {
        return ["/h", "/help"].contains(&self.command.as_str());
    }

    pub fn is_new_session(&self) -> bool {
        return ["/n", "/new"].contains(&self.command.as_str());
    }

    pub fn is_list_sessions(&self) -> bool {
        return ["/s", "/sessions"].contains(&self.command.as_str());
    }

    pub fn is_switch_session(&self) -> bool {
        return ["/sw", "/switch"].contains(&self.command.as_str()) && !self.args.is_empty();
    }

    pub fn is_rename_session(&self) -> bool {
        return self.command == "/rename" && !self.args.is_empty();
    }

    pub fn is_delete_session(&self) -> bool {
        return self.command == "/delete";
    }

    pub fn is_clear(&self) -> bool {
        return self.command == "/clear";
    }

    pub fn is_model_list(&self) -> bool {
        return ["/ml", "/models"].contains(&self.command.as_str());
    }

    pub fn is_attach(&self) -> bool {
        return ["/a", "/attach"].contains(&self.command.as_str());
    }

    pub fn is_run_code(&self) -> bool {
        return ["/r", "/run"].contains(&self.command.as_str());
    }

    pub fn is_copy_code(&self) -> bool {
        return ["/c", "/copy"].contains(&self.command.as_str());
    }

    pub fn is_export(&self) -> bool {
        return self.command == "/export" && !self.args.is_empty();
    }

    pub fn is_scroll_up(&self) -> bool {
        return self.command == "/up";
    }

    pub fn is_scroll_down(&self) -> bool {
        return self.command == "/down";
    }

    pub fn is_retry(&self) -> bool {
        return self.command == "/retry";
    }
}
