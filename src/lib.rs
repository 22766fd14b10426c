#![allow(clippy::module_inception)]

use std::rc::Rc;

use crate::errors::errors::{Error, ErrorTip};

pub mod ast;
pub mod config;
pub mod errors;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod type_checker;

extern crate regex;

/// Source location of a token: 1-based row and column plus the file it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub row: u32,
    pub column: u32,
    pub file: Rc<String>,
}

impl Position {
    pub fn new(row: u32, column: u32, file: Rc<String>) -> Self {
        Position { row, column, file }
    }

    pub fn null() -> Self {
        Position {
            row: 0,
            column: 0,
            file: Rc::new(String::from("<null>")),
        }
    }

    /// Directory part of the file path, used for same-directory visibility.
    pub fn dir(&self) -> &str {
        match self.file.rfind(['/', '\\']) {
            Some(idx) => &self.file[..idx],
            None => "",
        }
    }
}

pub fn get_line_at_position(source: &str, row: u32) -> Option<&str> {
    if row == 0 {
        return None;
    }

    source.lines().nth((row - 1) as usize)
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use crate::Position;

    #[test]
    fn test_get_line_at_position() {
        let source = "Hello, world!\nsecond\n\nTesting { }\n";

        assert_eq!(super::get_line_at_position(source, 1), Some("Hello, world!"));
        assert_eq!(super::get_line_at_position(source, 4), Some("Testing { }"));
        assert_eq!(super::get_line_at_position(source, 9), None);
        assert_eq!(super::get_line_at_position(source, 0), None);
    }

    #[test]
    fn test_position_dir() {
        let pos = Position::new(1, 1, Rc::new(String::from("src/app/main.jn")));
        assert_eq!(pos.dir(), "src/app");

        let pos = Position::new(1, 1, Rc::new(String::from("main.jn")));
        assert_eq!(pos.dir(), "");
    }
}

pub fn display_error(error: &Error, source: &str) -> String {
    /*
        Error: key (tip)
        -> final.jn
           |
        20 | let a = #
           | --------^
    */

    let position = error.get_position();
    let line_string = position.row.to_string();
    let padding = line_string.len() + 2;
    let mut out = String::new();

    if let ErrorTip::None = error.get_tip() {
        out.push_str(&format!("Error: {}\n", error.get_error_name()));
    } else {
        out.push_str(&format!(
            "Error: {} ({})\n",
            error.get_error_name(),
            error.get_tip()
        ));
    }
    out.push_str(&format!("-> {}:{}:{}\n", position.file, position.row, position.column));

    if let Some(line_text) = get_line_at_position(source, position.row) {
        out.push_str(&format!("{:>padding$}\n", "|"));

        let (line_text_removed, removed_whitespace) = remove_starting_whitespace(line_text);
        out.push_str(&format!("{} | {}\n", line_string, line_text_removed.trim_end()));

        let arrows = (position.column as usize)
            .saturating_sub(removed_whitespace)
            .max(1);
        out.push_str(&format!("{:>padding$} {:->arrows$}\n", "|", "^"));
    }

    out
}

/// Writes every diagnostic to stderr, rendered against `source`.
pub fn print_diagnostics<'a>(errors: impl IntoIterator<Item = &'a Error>, source: &str) {
    for error in errors {
        eprint!("{}", display_error(error, source));
    }
}

fn remove_starting_whitespace(string: &str) -> (String, usize) {
    let mut start = 0;
    for c in string.chars() {
        if c == ' ' || c == '\t' {
            start += 1;
        } else {
            break;
        }
    }

    (String::from(&string[start..]), start)
}
