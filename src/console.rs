use crate::engine::Command;

pub const HELP: &str = "commands: /<text> search, / clear search, s sort, p <n> page, q quit";

// a parsed operator line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Command(Command),

    Help,

    Quit,
}

// None for lines that mean nothing
pub fn parse(line: &str) -> Option<Input> {
    let line = line.trim_end_matches(['\r', '\n']);
    if let Some(term) = line.strip_prefix('/') {
        return Some(Input::Command(Command::Search(term.trim().to_string())));
    }
    let line = line.trim();
    let mut words = line.split_whitespace();
    let head = words.next()?;
    let input = match head.to_ascii_lowercase().as_str() {
        "s" | "sort" => Input::Command(Command::ToggleSort),

        "p" | "page" => {
            let page = words.next()?.parse().ok()?;
            Input::Command(Command::GoToPage(page))
        },

        "q" | "quit" | "exit" => Input::Quit,

        "h" | "help" | "?" => Input::Help,

        other => Input::Command(Command::GoToPage(other.parse().ok()?)),
    };
    Some(input)
}
