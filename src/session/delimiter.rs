use crate::console::{LINE_ENDING, TabPolicy};

/// Statement terminator the interpreter waits for before evaluating
pub const STATEMENT_TERMINATOR: &str = ";;";

/// Make `text` ready to write to the interpreter.
///
/// With `add_delimiter`, trailing whitespace is trimmed and the statement is
/// closed with exactly one `;;` followed by a line ending. Tabs are expanded
/// when the policy converts them.
pub fn final_text(text: &str, add_delimiter: bool, tabs: TabPolicy) -> String {
    let mut out = if add_delimiter {
        terminate(text)
    } else {
        text.to_string()
    };
    if tabs.convert_to_spaces {
        out = out.replace('\t', &tabs.text());
    }
    out
}

fn terminate(text: &str) -> String {
    let body = text.trim_end();
    let mut out = String::with_capacity(body.len() + STATEMENT_TERMINATOR.len() + LINE_ENDING.len());
    out.push_str(body);
    if !body.ends_with(STATEMENT_TERMINATOR) {
        if body.ends_with(';') {
            out.push(';');
        } else {
            out.push_str(STATEMENT_TERMINATOR);
        }
    }
    out.push_str(LINE_ENDING);
    out
}
